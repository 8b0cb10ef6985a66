//! Knowledge graph generation: typing, sampling, oversampling, repair.

use crate::entity::{EntityId, EntityTyper, EntityTyping, FastThreshold, TypingParams};
use crate::inference::oversample;
use crate::repair::{RepairReport, Repairer};
use crate::triples::{Triple, TripleSet};
use crate::weights::RelationWeights;
use crate::{check_ratio, KgError};
use ahash::AHashMap;
use kgforge_schema::{
    round2, ClassId, ClassSchema, GenRng, LoopOutcome, RelationId, RelationSchema, StallGuard,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::ControlFlow;
use tracing::{debug, info, warn};

/// Consecutive rejected candidates before triple sampling gives up.
const SAMPLING_ATTEMPTS: usize = 10;
/// Draws from a class's full population when its unseen pool misses.
const ENDPOINT_RETRIES: usize = 10;

// ============================================================================
// Parameters
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KgParams {
    pub num_entities: u32,
    pub num_triples: u32,
    pub relation_balance_ratio: f64,
    pub prop_untyped_entities: f64,
    pub avg_depth_specific_class: f64,
    pub multityping: bool,
    pub avg_multityping: f64,
    pub fast_gen: bool,
    pub oversample: bool,
    #[serde(default = "FastThreshold::defaults")]
    pub fast_thresholds: Vec<FastThreshold>,
}

impl Default for KgParams {
    fn default() -> Self {
        Self {
            num_entities: 1000,
            num_triples: 2000,
            relation_balance_ratio: 0.9,
            prop_untyped_entities: 0.0,
            avg_depth_specific_class: 2.5,
            multityping: true,
            avg_multityping: 2.0,
            fast_gen: false,
            oversample: false,
            fast_thresholds: FastThreshold::defaults(),
        }
    }
}

impl KgParams {
    pub fn validate(&self) -> Result<(), KgError> {
        check_ratio("relation_balance_ratio", self.relation_balance_ratio)?;
        check_ratio("prop_untyped_entities", self.prop_untyped_entities)?;
        if self.avg_depth_specific_class.is_nan() || self.avg_depth_specific_class <= 0.0 {
            return Err(KgError::NonPositiveDepth(self.avg_depth_specific_class));
        }
        if self.multityping && (self.avg_multityping.is_nan() || self.avg_multityping < 1.0) {
            return Err(KgError::MultitypingBelowOne(self.avg_multityping));
        }
        if self.fast_thresholds.iter().any(|t| t.ratio == 0) {
            return Err(KgError::ZeroFastRatio);
        }
        Ok(())
    }

    /// Multityping target actually pursued; `1.0` when multityping is off.
    pub fn effective_avg_multityping(&self) -> f64 {
        if self.multityping {
            self.avg_multityping
        } else {
            1.0
        }
    }

    pub fn fast_ratio(&self) -> u32 {
        if self.fast_gen {
            FastThreshold::ratio_for(&self.fast_thresholds, self.num_entities)
        } else {
            1
        }
    }
}

// ============================================================================
// Output record
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KgStatistics {
    /// Entities appearing in at least one triple.
    pub num_entities: usize,
    pub num_instantiated_relations: usize,
    pub num_triples: usize,
    /// Share of untyped entities among the observed ones.
    pub prop_untyped_entities: f64,
    pub avg_depth_specific_class: f64,
    pub avg_multityping: f64,
    pub sampling: LoopOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oversampling: Option<LoopOutcome>,
    pub repairs: RepairReport,
}

/// `kg_info.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KgInfo {
    pub user_parameters: KgParams,
    pub statistics: KgStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    pub info: KgInfo,
    pub typing: EntityTyping,
    pub triples: TripleSet,
}

impl KnowledgeGraph {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// ============================================================================
// Generator
// ============================================================================

pub struct KnowledgeGraphGenerator<'a> {
    classes: &'a ClassSchema,
    relations: &'a RelationSchema,
    params: KgParams,
}

impl<'a> KnowledgeGraphGenerator<'a> {
    pub fn new(
        classes: &'a ClassSchema,
        relations: &'a RelationSchema,
        mut params: KgParams,
    ) -> Result<Self, KgError> {
        params.validate()?;
        for relation in relations.iter() {
            for class in [relation.domain, relation.range].into_iter().flatten() {
                if classes.layer(class).is_none() {
                    return Err(KgError::UnknownClass {
                        relation: relation.id,
                        class,
                    });
                }
            }
        }

        let depth = f64::from(classes.depth());
        if depth > 0.0 && params.avg_depth_specific_class > depth {
            warn!(
                requested = params.avg_depth_specific_class,
                depth, "avg_depth_specific_class exceeds the hierarchy depth, clamping"
            );
            params.avg_depth_specific_class = depth;
        }
        if !params.multityping {
            params.avg_multityping = 1.0;
        }

        Ok(Self {
            classes,
            relations,
            params,
        })
    }

    pub fn generate(self, rng: &mut GenRng) -> KnowledgeGraph {
        let typing = EntityTyper::new(
            self.classes,
            TypingParams {
                num_entities: self.params.num_entities,
                prop_untyped: self.params.prop_untyped_entities,
                avg_specific_depth: self.params.avg_depth_specific_class,
                avg_multityping: self.params.effective_avg_multityping(),
                fast_ratio: self.params.fast_ratio(),
            },
        )
        .assign(rng);
        info!(
            entities = typing.num_entities,
            typed = typing.typed_count(),
            "typed entity population"
        );

        let target = self.params.num_triples as usize;
        let ids: Vec<RelationId> = self.relations.iter().map(|r| r.id).collect();
        let mut weights = RelationWeights::new(
            &ids,
            self.params.num_triples,
            self.params.relation_balance_ratio,
            rng,
        );

        let mut sampler = TripleSampler::new(self.classes, self.relations, &typing, rng);
        let sampling = sampler.run(&mut weights, target, rng);
        let mut triples = sampler.triples;
        if let LoopOutcome::Stalled { attempts } = sampling {
            warn!(
                sampled = triples.len(),
                target, attempts, "triple sampling stopped before reaching the target"
            );
        }

        let oversampling = self
            .params
            .oversample
            .then(|| oversample(&mut triples, self.relations, target, rng));

        let repairs = Repairer::new(self.classes, self.relations, &typing).run(&mut triples);

        let statistics = self.statistics(&triples, &typing, sampling, oversampling, repairs);
        info!(
            triples = statistics.num_triples,
            entities = statistics.num_entities,
            relations = statistics.num_instantiated_relations,
            removed = repairs.total(),
            "knowledge graph generated"
        );

        KnowledgeGraph {
            info: KgInfo {
                user_parameters: self.params,
                statistics,
            },
            typing,
            triples,
        }
    }

    fn statistics(
        &self,
        triples: &TripleSet,
        typing: &EntityTyping,
        sampling: LoopOutcome,
        oversampling: Option<LoopOutcome>,
        repairs: RepairReport,
    ) -> KgStatistics {
        let observed: BTreeSet<EntityId> = triples.iter().flat_map(|t| [t.head, t.tail]).collect();
        let typed_observed = observed.iter().filter(|e| typing.is_typed(**e)).count();
        let relations: BTreeSet<RelationId> = triples.iter().map(|t| t.relation).collect();
        let prop_untyped = if observed.is_empty() {
            0.0
        } else {
            1.0 - typed_observed as f64 / observed.len() as f64
        };

        KgStatistics {
            num_entities: observed.len(),
            num_instantiated_relations: relations.len(),
            num_triples: triples.len(),
            prop_untyped_entities: round2(prop_untyped),
            avg_depth_specific_class: round2(typing.avg_specific_depth(self.classes)),
            avg_multityping: round2(typing.avg_multityping()),
            sampling,
            oversampling,
            repairs,
        }
    }
}

// ============================================================================
// Sampling
// ============================================================================

/// Uniform draws with O(1) removal.
#[derive(Debug, Clone, Default)]
struct SamplingPool {
    items: Vec<EntityId>,
    slots: AHashMap<EntityId, usize>,
}

impl SamplingPool {
    fn new(items: Vec<EntityId>) -> Self {
        let slots = items.iter().enumerate().map(|(i, e)| (*e, i)).collect();
        Self { items, slots }
    }

    fn choose(&self, rng: &mut GenRng) -> Option<EntityId> {
        rng.choose(&self.items).copied()
    }

    fn remove(&mut self, entity: EntityId) {
        let Some(slot) = self.slots.remove(&entity) else {
            return;
        };
        self.items.swap_remove(slot);
        if let Some(moved) = self.items.get(slot) {
            self.slots.insert(*moved, slot);
        }
    }
}

struct TripleSampler<'a> {
    classes: &'a ClassSchema,
    relations: &'a RelationSchema,
    typing: &'a EntityTyping,
    class_entities: BTreeMap<ClassId, Vec<EntityId>>,
    /// Per class, entities not yet used as an endpoint where that class was expected.
    unseen: BTreeMap<ClassId, SamplingPool>,
    untyped_priority: Vec<EntityId>,
    untyped: Vec<EntityId>,
    typed: Vec<EntityId>,
    triples: TripleSet,
}

impl<'a> TripleSampler<'a> {
    fn new(
        classes: &'a ClassSchema,
        relations: &'a RelationSchema,
        typing: &'a EntityTyping,
        rng: &mut GenRng,
    ) -> Self {
        let mut class_entities: BTreeMap<ClassId, Vec<EntityId>> = BTreeMap::new();
        for (entity, closure) in &typing.ent2classes_transitive {
            for class in closure {
                class_entities.entry(*class).or_default().push(*entity);
            }
        }
        let unseen = class_entities
            .iter()
            .map(|(c, entities)| (*c, SamplingPool::new(entities.clone())))
            .collect();

        let untyped = typing.untyped();
        let mut untyped_priority = untyped.clone();
        rng.shuffle(&mut untyped_priority);

        Self {
            classes,
            relations,
            typing,
            class_entities,
            unseen,
            untyped_priority,
            untyped,
            typed: typing.ent2classes_specific.keys().copied().collect(),
            triples: TripleSet::new(),
        }
    }

    fn run(&mut self, weights: &mut RelationWeights, target: usize, rng: &mut GenRng) -> LoopOutcome {
        let relations = self.relations;
        let mut guard = StallGuard::new(SAMPLING_ATTEMPTS);
        let mut placed: AHashMap<RelationId, usize> = AHashMap::new();
        while self.triples.len() < target {
            let Some(relation) = weights.sample(rng).and_then(|id| relations.get(id)) else {
                return LoopOutcome::Stalled { attempts: 0 };
            };
            let head = self.endpoint(relation.domain, rng);
            let tail = self.endpoint(relation.range, rng);

            let accepted = match (head, tail) {
                (Some(head), Some(tail)) => {
                    let triple = Triple::new(head, relation.id, tail);
                    let ok = self.triples.admits(relation, &triple) && self.triples.insert(triple);
                    if ok {
                        self.mark_seen(relation.domain, head);
                        self.mark_seen(relation.range, tail);
                        let count = placed.entry(relation.id).or_default();
                        *count += 1;
                        if weights.quota(relation.id).is_some_and(|quota| *count >= quota) {
                            weights.exhaust(relation.id);
                        }
                    }
                    ok
                }
                _ => false,
            };
            if let ControlFlow::Break(outcome) = guard.record(accepted) {
                return outcome;
            }
        }
        debug!(triples = self.triples.len(), "sampling reached target");
        LoopOutcome::Reached
    }

    /// Draw an endpoint for a slot expecting `class`.
    ///
    /// Profiled slots prefer the class's unseen entities, then retry against
    /// its full population. Unprofiled slots take untyped entities first
    /// (each once, then at random) and fall back to any typed entity.
    fn endpoint(&mut self, class: Option<ClassId>, rng: &mut GenRng) -> Option<EntityId> {
        let Some(class) = class else {
            if self.untyped.is_empty() {
                return rng.choose(&self.typed).copied();
            }
            return self
                .untyped_priority
                .pop()
                .or_else(|| rng.choose(&self.untyped).copied());
        };

        let fits = |e: EntityId| self.typing.compatible_with(e, class, self.classes);
        if let Some(e) = self.unseen.get(&class).and_then(|pool| pool.choose(rng)) {
            if fits(e) {
                return Some(e);
            }
        }
        let population = self.class_entities.get(&class)?;
        (0..ENDPOINT_RETRIES)
            .filter_map(|_| rng.choose(population).copied())
            .find(|e| fits(*e))
    }

    fn mark_seen(&mut self, class: Option<ClassId>, entity: EntityId) {
        if let Some(pool) = class.and_then(|c| self.unseen.get_mut(&c)) {
            pool.remove(entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgforge_schema::{
        ClassHierarchyGenerator, ClassHierarchyParams, PropertySet, PropertyTables, Relation,
        RelationProperty, RelationStatistics,
    };

    fn class_schema(seed: u64) -> ClassSchema {
        let params = ClassHierarchyParams {
            num_classes: 20,
            max_depth: 3,
            avg_depth: 2.0,
            inheritance_ratio: 2.0,
            avg_disjointness: 0.2,
        };
        ClassHierarchyGenerator::new(params)
            .unwrap()
            .generate(&mut GenRng::seed_from_u64(seed))
            .unwrap()
    }

    /// Sibling classes C1 and C2 under `owl:Thing`, declared disjoint.
    fn disjoint_siblings() -> ClassSchema {
        let json = r#"{
            "statistics": {"num_classes": 2, "hierarchy_depth": 1, "avg_class_depth": 1.0,
                           "class_inheritance_ratio": 0.0, "avg_class_disjointness": 0.25},
            "classes": ["C1", "C2"],
            "class2superclass_direct": {"C1": null, "C2": null},
            "class2subclasses_direct": {},
            "class2superclasses_transitive": {"C1": [], "C2": []},
            "class2subclasses_transitive": {"C1": [], "C2": []},
            "layer2classes": {"1": ["C1", "C2"]},
            "class2layer": {"C1": 1, "C2": 1},
            "class2disjoints": {"C1": ["C2"], "C2": ["C1"]},
            "class2disjoints_symmetric": ["C1-C2"],
            "class2disjoints_extended": {"C1": ["C2"], "C2": ["C1"]}
        }"#;
        ClassSchema::from_json(json).unwrap()
    }

    fn relation_schema(relations: Vec<Relation>) -> RelationSchema {
        RelationSchema {
            statistics: RelationStatistics::default(),
            relations,
        }
    }

    fn params(num_entities: u32, num_triples: u32) -> KgParams {
        KgParams {
            num_entities,
            num_triples,
            avg_depth_specific_class: 1.5,
            multityping: false,
            ..KgParams::default()
        }
    }

    #[test]
    fn sampling_pool_removal_keeps_slots_consistent() {
        let mut pool = SamplingPool::new((1..=5).map(EntityId).collect());
        pool.remove(EntityId(2));
        pool.remove(EntityId(5));
        pool.remove(EntityId(9));
        let mut left = pool.items.clone();
        left.sort();
        assert_eq!(left, vec![EntityId(1), EntityId(3), EntityId(4)]);
        for (i, e) in pool.items.iter().enumerate() {
            assert_eq!(pool.slots[e], i);
        }
    }

    #[test]
    fn irreflexive_relation_never_loops() {
        let classes = class_schema(1);
        let target_class = classes.classes_in_layer(1)[0];
        let mut r1 = Relation::new(RelationId(1));
        r1.properties = [RelationProperty::Irreflexive].into_iter().collect::<PropertySet>();
        r1.domain = Some(target_class);
        r1.range = Some(target_class);
        let relations = relation_schema(vec![r1]);

        let kg = KnowledgeGraphGenerator::new(&classes, &relations, params(100, 300))
            .unwrap()
            .generate(&mut GenRng::seed_from_u64(11));

        assert!(kg.triples.iter().all(|t| t.head != t.tail));
        for t in kg.triples.iter() {
            assert!(kg.typing.closure(t.head).unwrap().contains(&target_class));
            assert!(kg.typing.closure(t.tail).unwrap().contains(&target_class));
        }
    }

    #[test]
    fn inverse_pair_respects_both_profiles() {
        let classes = disjoint_siblings();
        let mut r1 = Relation::new(RelationId(1));
        let mut r2 = Relation::new(RelationId(2));
        r1.inverse = Some(RelationId(2));
        r2.inverse = Some(RelationId(1));
        r1.domain = Some(ClassId(1));
        r1.range = Some(ClassId(2));
        r2.domain = Some(ClassId(2));
        r2.range = Some(ClassId(1));
        let relations = relation_schema(vec![r1, r2]);

        let kg = KnowledgeGraphGenerator::new(
            &classes,
            &relations,
            KgParams {
                oversample: true,
                ..params(100, 400)
            },
        )
        .unwrap()
        .generate(&mut GenRng::seed_from_u64(12));

        assert!(!kg.triples.is_empty());
        for t in kg.triples.by_relation(RelationId(1)) {
            assert!(kg.typing.closure(t.head).unwrap().contains(&ClassId(1)));
            assert!(kg.typing.closure(t.tail).unwrap().contains(&ClassId(2)));
        }
        assert!(kg.info.statistics.oversampling.is_some());
    }

    #[test]
    fn functional_and_inverse_functional_hold() {
        let classes = class_schema(2);
        let mut r1 = Relation::new(RelationId(1));
        r1.properties = [RelationProperty::Functional].into_iter().collect::<PropertySet>();
        let mut r2 = Relation::new(RelationId(2));
        r2.properties = [RelationProperty::InverseFunctional, RelationProperty::Asymmetric]
            .into_iter()
            .collect::<PropertySet>();
        let relations = relation_schema(vec![r1, r2]);

        let kg = KnowledgeGraphGenerator::new(&classes, &relations, params(50, 200))
            .unwrap()
            .generate(&mut GenRng::seed_from_u64(13));

        let heads: Vec<EntityId> = kg.triples.by_relation(RelationId(1)).map(|t| t.head).collect();
        let unique: BTreeSet<EntityId> = heads.iter().copied().collect();
        assert_eq!(heads.len(), unique.len());

        let tails: Vec<EntityId> = kg.triples.by_relation(RelationId(2)).map(|t| t.tail).collect();
        let unique: BTreeSet<EntityId> = tails.iter().copied().collect();
        assert_eq!(tails.len(), unique.len());
        for t in kg.triples.by_relation(RelationId(2)) {
            assert!(!kg.triples.contains(&t.mirrored()));
        }
    }

    #[test]
    fn full_pipeline_is_deterministic() {
        let classes = class_schema(3);
        let tables = PropertyTables::builtin().unwrap();
        let relations = kgforge_schema::RelationSchemaGenerator::new(
            &classes,
            &tables,
            kgforge_schema::RelationSchemaParams {
                num_relations: 10,
                relation_specificity: 1.5,
                profiled_ratio: 0.8,
                profile_side: kgforge_schema::ProfileSide::Partial,
                targets: kgforge_schema::PropertyTargets {
                    asymmetric: 0.3,
                    symmetric: 0.2,
                    inverse_of: 0.2,
                    ..Default::default()
                },
            },
        )
        .unwrap()
        .generate(&mut GenRng::seed_from_u64(3))
        .unwrap();

        let run = |seed| {
            KnowledgeGraphGenerator::new(&classes, &relations, params(200, 500))
                .unwrap()
                .generate(&mut GenRng::seed_from_u64(seed))
                .to_json_pretty()
                .unwrap()
        };
        assert_eq!(run(21), run(21));
    }

    #[test]
    fn statistics_describe_the_output() {
        let classes = class_schema(4);
        let relations = relation_schema(vec![Relation::new(RelationId(1)), Relation::new(RelationId(2))]);
        let kg = KnowledgeGraphGenerator::new(
            &classes,
            &relations,
            KgParams {
                prop_untyped_entities: 0.5,
                ..params(100, 50)
            },
        )
        .unwrap()
        .generate(&mut GenRng::seed_from_u64(14));

        let stats = &kg.info.statistics;
        assert_eq!(stats.num_triples, kg.triples.len());
        assert!(stats.num_triples <= 50);
        assert!(stats.num_instantiated_relations <= 2);
        assert!((0.0..=1.0).contains(&stats.prop_untyped_entities));
        assert_eq!(stats.avg_multityping, 1.0);
        assert!(kg.info.statistics.oversampling.is_none());
    }

    #[test]
    fn fewer_triples_than_relations() {
        let classes = class_schema(5);
        let relations = relation_schema((1..=5).map(|i| Relation::new(RelationId(i))).collect());
        for seed in 0..40 {
            let kg = KnowledgeGraphGenerator::new(&classes, &relations, params(30, 3))
                .unwrap()
                .generate(&mut GenRng::seed_from_u64(seed));
            assert!(kg.triples.len() <= 3);
            assert!(kg.triples.iter().all(|t| t.relation <= RelationId(3)));
            for relation in relations.iter() {
                assert!(
                    kg.triples.by_relation(relation.id).count() <= 1,
                    "seed {seed}: {} holds more than one triple",
                    relation.id
                );
            }
        }
    }

    #[test]
    fn relation_order_does_not_matter() {
        let classes = disjoint_siblings();
        let mut r1 = Relation::new(RelationId(1));
        let mut r2 = Relation::new(RelationId(2));
        r1.inverse = Some(RelationId(2));
        r2.inverse = Some(RelationId(1));
        r1.domain = Some(ClassId(1));
        r1.range = Some(ClassId(2));
        r2.domain = Some(ClassId(2));
        r2.range = Some(ClassId(1));
        let relations = relation_schema(vec![r2, r1]);

        let kg = KnowledgeGraphGenerator::new(&classes, &relations, params(50, 40))
            .unwrap()
            .generate(&mut GenRng::seed_from_u64(18));
        assert!(!kg.triples.is_empty());
        assert!(kg.info.statistics.sampling.is_reached());
        for t in kg.triples.by_relation(RelationId(2)) {
            assert!(kg.typing.closure(t.head).unwrap().contains(&ClassId(2)));
            assert!(kg.typing.closure(t.tail).unwrap().contains(&ClassId(1)));
        }
    }

    #[test]
    fn rejects_bad_parameters() {
        let classes = class_schema(6);
        let relations = relation_schema(vec![]);
        let bad = KgParams {
            prop_untyped_entities: 1.5,
            ..KgParams::default()
        };
        assert!(matches!(
            KnowledgeGraphGenerator::new(&classes, &relations, bad),
            Err(KgError::RatioOutOfRange { .. })
        ));

        let bad = KgParams {
            multityping: true,
            avg_multityping: 0.5,
            ..KgParams::default()
        };
        assert!(matches!(
            KnowledgeGraphGenerator::new(&classes, &relations, bad),
            Err(KgError::MultitypingBelowOne(_))
        ));

        let mut r1 = Relation::new(RelationId(1));
        r1.domain = Some(ClassId(999));
        let relations = relation_schema(vec![r1]);
        assert!(matches!(
            KnowledgeGraphGenerator::new(&classes, &relations, KgParams::default()),
            Err(KgError::UnknownClass { .. })
        ));
    }

    #[test]
    fn deep_specific_depth_is_clamped() {
        let classes = class_schema(7);
        let relations = relation_schema(vec![Relation::new(RelationId(1))]);
        let kg = KnowledgeGraphGenerator::new(
            &classes,
            &relations,
            KgParams {
                avg_depth_specific_class: 9.0,
                ..params(50, 10)
            },
        )
        .unwrap()
        .generate(&mut GenRng::seed_from_u64(16));
        assert_eq!(kg.info.user_parameters.avg_depth_specific_class, f64::from(classes.depth()));
        assert!(kg.info.statistics.avg_depth_specific_class <= f64::from(classes.depth()));
    }

    #[test]
    fn kg_record_round_trips() {
        let classes = class_schema(8);
        let relations = relation_schema(vec![Relation::new(RelationId(1))]);
        let kg = KnowledgeGraphGenerator::new(&classes, &relations, params(20, 15))
            .unwrap()
            .generate(&mut GenRng::seed_from_u64(17));
        let back = KnowledgeGraph::from_json(&kg.to_json_pretty().unwrap()).unwrap();
        assert_eq!(back.triples, kg.triples);
        assert_eq!(back.typing, kg.typing);
        assert!(back.triples.len() <= 15);
    }
}
