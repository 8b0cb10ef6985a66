//! Post-generation repair passes.
//!
//! Sampling checks each candidate against the triples accepted so far, which
//! lets a few violations through (oversampling adds more). The passes below
//! run once, in order, over the whole set and are never skipped.

use crate::entity::EntityTyping;
use crate::triples::{Triple, TripleSet};
use kgforge_schema::{ClassId, ClassSchema, Relation, RelationProperty, RelationSchema};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Triples removed by each pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairReport {
    pub asymmetric_mirrors: usize,
    pub inverse_duplicates: usize,
    pub domain_range: usize,
    pub inverse_domain_range: usize,
}

impl RepairReport {
    pub fn total(&self) -> usize {
        self.asymmetric_mirrors + self.inverse_duplicates + self.domain_range + self.inverse_domain_range
    }
}

pub struct Repairer<'a> {
    classes: &'a ClassSchema,
    relations: &'a RelationSchema,
    typing: &'a EntityTyping,
}

impl<'a> Repairer<'a> {
    pub fn new(classes: &'a ClassSchema, relations: &'a RelationSchema, typing: &'a EntityTyping) -> Self {
        Self {
            classes,
            relations,
            typing,
        }
    }

    pub fn run(&self, triples: &mut TripleSet) -> RepairReport {
        let report = RepairReport {
            asymmetric_mirrors: self.asymmetric_mirrors(triples),
            inverse_duplicates: self.inverse_duplicates(triples),
            domain_range: self.domain_range(triples),
            inverse_domain_range: self.inverse_domain_range(triples),
        };
        debug!(?report, "repair passes done");
        report
    }

    /// Drop self-loops and one member of each mirrored pair on asymmetric
    /// relations. The member with the greater head goes.
    fn asymmetric_mirrors(&self, triples: &mut TripleSet) -> usize {
        let mut doomed = Vec::new();
        for relation in self.relations.iter().filter(|r| r.has(RelationProperty::Asymmetric)) {
            for t in triples.by_relation(relation.id) {
                if t.head == t.tail || (t.head > t.tail && triples.contains(&t.mirrored())) {
                    doomed.push(*t);
                }
            }
        }
        triples.remove_all(&doomed)
    }

    /// For inverse pairs with an asymmetric side, an `(h, t)` pair may not
    /// appear under both relations; the lower-numbered relation loses it.
    fn inverse_duplicates(&self, triples: &mut TripleSet) -> usize {
        let mut doomed = Vec::new();
        for (low, high) in self.inverse_pairs() {
            if !low.has(RelationProperty::Asymmetric) && !high.has(RelationProperty::Asymmetric) {
                continue;
            }
            for t in triples.by_relation(low.id) {
                if triples.contains(&Triple::new(t.head, high.id, t.tail)) {
                    doomed.push(*t);
                }
            }
        }
        triples.remove_all(&doomed)
    }

    fn domain_range(&self, triples: &mut TripleSet) -> usize {
        let current: &TripleSet = triples;
        let doomed: Vec<Triple> = self
            .relations
            .iter()
            .flat_map(|relation| {
                current
                    .by_relation(relation.id)
                    .filter(move |t| !self.endpoints_fit(t, relation.domain, relation.range))
            })
            .copied()
            .collect();
        triples.remove_all(&doomed)
    }

    /// Domain/range check through the inverse: on `r1 inverseOf r2`, heads
    /// of `r1` must fit `range(r2)` and tails must fit `domain(r2)`.
    fn inverse_domain_range(&self, triples: &mut TripleSet) -> usize {
        let mut doomed = Vec::new();
        for relation in self.relations.iter() {
            let Some(inverse) = relation.inverse.and_then(|id| self.relations.get(id)) else {
                continue;
            };
            doomed.extend(
                triples
                    .by_relation(relation.id)
                    .filter(|t| !self.endpoints_fit(t, inverse.range, inverse.domain))
                    .copied(),
            );
        }
        triples.remove_all(&doomed)
    }

    fn endpoints_fit(
        &self,
        triple: &Triple,
        head_class: Option<ClassId>,
        tail_class: Option<ClassId>,
    ) -> bool {
        let fits = |entity, class: Option<ClassId>| {
            class.map_or(true, |c| self.typing.compatible_with(entity, c, self.classes))
        };
        fits(triple.head, head_class) && fits(triple.tail, tail_class)
    }

    /// Each declared inverse pair once, lower identifier first.
    fn inverse_pairs(&self) -> impl Iterator<Item = (&'a Relation, &'a Relation)> + '_ {
        self.relations.iter().filter_map(move |low| {
            let high = self.relations.get(low.inverse?)?;
            (low.id < high.id).then_some((low, high))
        })
    }
}
