//! RDF graphs for the schema (`schema.*`) and the full graph (`full_graph.*`).

use crate::{CC0_LICENSE_IRI, DCTERMS_NS, OWL_NS, RDFS_NS, RDF_NS, SCHEMA_NS};
use kgforge_kg::KnowledgeGraph;
use kgforge_schema::{ClassSchema, RelationProperty, RelationSchema};
use std::collections::BTreeSet;
use std::fmt::Display;

/// `[subject, predicate, object]`, all absolute IRIs.
pub type Statement = [String; 3];

/// A set of IRI statements. Duplicates collapse, as in any RDF graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RdfDocument {
    statements: BTreeSet<Statement>,
}

fn sc(local: impl Display) -> String {
    format!("{SCHEMA_NS}{local}")
}

fn rdf(local: &str) -> String {
    format!("{RDF_NS}{local}")
}

fn rdfs(local: &str) -> String {
    format!("{RDFS_NS}{local}")
}

fn owl(local: &str) -> String {
    format!("{OWL_NS}{local}")
}

impl RdfDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ontology header, classes and object properties.
    pub fn schema(classes: &ClassSchema, relations: &RelationSchema) -> Self {
        let mut doc = Self::new();
        doc.add(SCHEMA_NS, rdf("type"), owl("Ontology"));
        doc.add(SCHEMA_NS, format!("{DCTERMS_NS}license"), CC0_LICENSE_IRI);
        doc.add_classes(classes);
        doc.add_relations(relations);
        doc
    }

    /// Schema statements plus every instance triple and the most-specific
    /// types of each endpoint.
    pub fn full_graph(classes: &ClassSchema, relations: &RelationSchema, kg: &KnowledgeGraph) -> Self {
        let mut doc = Self::schema(classes, relations);
        doc.add_instances(kg);
        doc
    }

    pub fn add(&mut self, subject: impl Into<String>, predicate: impl Into<String>, object: impl Into<String>) {
        self.statements
            .insert([subject.into(), predicate.into(), object.into()]);
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Statement> {
        self.statements.iter()
    }

    pub fn contains(&self, subject: &str, predicate: &str, object: &str) -> bool {
        self.statements.contains(&[
            subject.to_string(),
            predicate.to_string(),
            object.to_string(),
        ])
    }

    fn add_classes(&mut self, classes: &ClassSchema) {
        for &class in &classes.classes {
            let iri = sc(class);
            self.add(iri.clone(), rdf("type"), owl("Class"));
            let parent = classes.parent(class).map_or_else(|| owl("Thing"), sc);
            self.add(iri.clone(), rdfs("subClassOf"), parent);
            for other in classes.class2disjoints.get(&class).into_iter().flatten() {
                self.add(iri.clone(), owl("disjointWith"), sc(other));
            }
        }
    }

    fn add_relations(&mut self, relations: &RelationSchema) {
        for relation in relations.iter() {
            let iri = sc(relation.id);
            self.add(iri.clone(), rdf("type"), owl("ObjectProperty"));
            for property in relation.properties.iter() {
                self.add(iri.clone(), rdf("type"), owl(property.owl_class()));
            }
            if !relation.has(RelationProperty::Reflexive) {
                if let Some(domain) = relation.domain {
                    self.add(iri.clone(), rdfs("domain"), sc(domain));
                }
                if let Some(range) = relation.range {
                    self.add(iri.clone(), rdfs("range"), sc(range));
                }
            }
            if let Some(inverse) = relation.inverse {
                self.add(iri.clone(), owl("inverseOf"), sc(inverse));
            }
            if let Some(parent) = relation.super_relation {
                self.add(iri, rdfs("subPropertyOf"), sc(parent));
            }
        }
    }

    fn add_instances(&mut self, kg: &KnowledgeGraph) {
        for triple in kg.triples.iter() {
            self.add(sc(triple.head), sc(triple.relation), sc(triple.tail));
            for entity in [triple.head, triple.tail] {
                for class in kg.typing.specific(entity) {
                    self.add(sc(entity), rdf("type"), sc(class));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgforge_schema::{
        ClassHierarchyGenerator, ClassHierarchyParams, ClassId, GenRng, PropertySet, Relation,
        RelationId, RelationStatistics,
    };

    fn classes() -> ClassSchema {
        ClassHierarchyGenerator::new(ClassHierarchyParams {
            num_classes: 8,
            max_depth: 3,
            avg_depth: 2.0,
            inheritance_ratio: 1.5,
            avg_disjointness: 0.2,
        })
        .unwrap()
        .generate(&mut GenRng::seed_from_u64(4))
        .unwrap()
    }

    fn relations(domain: ClassId) -> RelationSchema {
        let mut r1 = Relation::new(RelationId(1));
        r1.properties = [RelationProperty::Functional, RelationProperty::Irreflexive]
            .into_iter()
            .collect::<PropertySet>();
        r1.domain = Some(domain);
        r1.inverse = Some(RelationId(2));
        let mut r2 = Relation::new(RelationId(2));
        r2.inverse = Some(RelationId(1));
        r2.super_relation = Some(RelationId(3));
        let mut r3 = Relation::new(RelationId(3));
        r3.properties = [RelationProperty::Reflexive].into_iter().collect::<PropertySet>();
        r3.domain = Some(domain);
        RelationSchema {
            statistics: RelationStatistics::default(),
            relations: vec![r1, r2, r3],
        }
    }

    #[test]
    fn classes_hang_off_owl_thing() {
        let classes = classes();
        let doc = RdfDocument::schema(&classes, &relations(ClassId(1)));
        for class in classes.classes_in_layer(1) {
            assert!(doc.contains(&sc(class), &rdfs("subClassOf"), &owl("Thing")));
        }
        for class in classes.classes_in_layer(2) {
            let parent = classes.parent(*class).unwrap();
            assert!(doc.contains(&sc(class), &rdfs("subClassOf"), &sc(parent)));
        }
        assert!(doc.contains(SCHEMA_NS, &rdf("type"), &owl("Ontology")));
    }

    #[test]
    fn disjointness_is_stated_both_ways() {
        let classes = classes();
        let doc = RdfDocument::schema(&classes, &relations(ClassId(1)));
        for pair in &classes.class2disjoints_symmetric {
            let (a, b) = pair.members();
            if classes.class2disjoints.get(&a).is_some_and(|d| d.contains(&b)) {
                assert!(doc.contains(&sc(a), &owl("disjointWith"), &sc(b)));
                assert!(doc.contains(&sc(b), &owl("disjointWith"), &sc(a)));
            }
        }
    }

    #[test]
    fn relation_axioms() {
        let classes = classes();
        let doc = RdfDocument::schema(&classes, &relations(ClassId(1)));
        let r1 = sc("R1");
        assert!(doc.contains(&r1, &rdf("type"), &owl("ObjectProperty")));
        assert!(doc.contains(&r1, &rdf("type"), &owl("FunctionalProperty")));
        assert!(doc.contains(&r1, &rdf("type"), &owl("IrreflexiveProperty")));
        assert!(doc.contains(&r1, &rdfs("domain"), &sc("C1")));
        assert!(doc.contains(&r1, &owl("inverseOf"), &sc("R2")));
        assert!(doc.contains(&sc("R2"), &rdfs("subPropertyOf"), &sc("R3")));
        // Reflexive relations never carry a domain.
        assert!(!doc.contains(&sc("R3"), &rdfs("domain"), &sc("C1")));
    }
}
