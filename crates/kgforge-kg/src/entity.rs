//! Entity population and typing.
//!
//! A typed entity receives one or more *most-specific* classes drawn from a
//! single hierarchy layer, plus the transitive closure of those classes. The
//! closure of an entity never contains two disjoint classes once
//! [`EntityTyper::assign`] returns.

use kgforge_schema::{ClassId, ClassSchema, GenRng, StallGuard};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

kgforge_schema::prefixed_id!(
    /// A generated entity. Numbering starts at 1.
    EntityId,
    "E"
);

/// Consecutive unproductive picks tolerated while adding extra types.
const MULTITYPING_ATTEMPTS: usize = 10;

// ============================================================================
// Large-population replication
// ============================================================================

/// Above `min_entities`, only `1 / ratio` of the population is profiled and
/// its typing is replicated over the remaining batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FastThreshold {
    pub min_entities: u32,
    pub ratio: u32,
}

impl FastThreshold {
    pub fn defaults() -> Vec<FastThreshold> {
        [(1_000_000, 15), (500_000, 10), (50_000, 5), (30_000, 3)]
            .into_iter()
            .map(|(min_entities, ratio)| FastThreshold {
                min_entities,
                ratio,
            })
            .collect()
    }

    /// Replication ratio for a population size; `1` when no threshold applies.
    pub fn ratio_for(thresholds: &[FastThreshold], num_entities: u32) -> u32 {
        thresholds
            .iter()
            .filter(|t| num_entities >= t.min_entities)
            .map(|t| t.ratio)
            .max()
            .unwrap_or(1)
    }
}

// ============================================================================
// Typing record
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityTyping {
    /// Entities are `E1..=num_entities`.
    pub num_entities: u32,
    pub ent2classes_specific: BTreeMap<EntityId, Vec<ClassId>>,
    pub ent2classes_transitive: BTreeMap<EntityId, BTreeSet<ClassId>>,
}

impl EntityTyping {
    pub fn entities(&self) -> impl Iterator<Item = EntityId> {
        (1..=self.num_entities).map(EntityId)
    }

    pub fn is_typed(&self, entity: EntityId) -> bool {
        self.ent2classes_specific.contains_key(&entity)
    }

    pub fn typed_count(&self) -> usize {
        self.ent2classes_specific.len()
    }

    pub fn specific(&self, entity: EntityId) -> &[ClassId] {
        self.ent2classes_specific
            .get(&entity)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn closure(&self, entity: EntityId) -> Option<&BTreeSet<ClassId>> {
        self.ent2classes_transitive.get(&entity)
    }

    pub fn untyped(&self) -> Vec<EntityId> {
        self.entities().filter(|e| !self.is_typed(*e)).collect()
    }

    /// Mean number of most-specific classes per typed entity.
    pub fn avg_multityping(&self) -> f64 {
        if self.ent2classes_specific.is_empty() {
            return 0.0;
        }
        let total: usize = self.ent2classes_specific.values().map(Vec::len).sum();
        total as f64 / self.ent2classes_specific.len() as f64
    }

    /// Mean layer of the typed entities' most-specific classes.
    pub fn avg_specific_depth(&self, classes: &ClassSchema) -> f64 {
        let layers: Vec<u32> = self
            .ent2classes_specific
            .values()
            .filter_map(|specific| specific.first())
            .filter_map(|c| classes.layer(*c))
            .collect();
        if layers.is_empty() {
            return 0.0;
        }
        layers.iter().map(|l| f64::from(*l)).sum::<f64>() / layers.len() as f64
    }

    /// Whether `entity` may stand where `class` is expected.
    ///
    /// An untyped entity is compatible with every class; a typed one is
    /// compatible unless its closure meets the extended disjointness of
    /// `class` or of one of its superclasses.
    pub fn compatible_with(&self, entity: EntityId, class: ClassId, classes: &ClassSchema) -> bool {
        let Some(closure) = self.closure(entity) else {
            return true;
        };
        classes.with_ancestors(class).all(|c| {
            classes
                .disjoints_extended(c)
                .map_or(true, |disjoint| disjoint.is_disjoint(closure))
        })
    }
}

// ============================================================================
// Typing procedure
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct TypingParams {
    pub num_entities: u32,
    pub prop_untyped: f64,
    pub avg_specific_depth: f64,
    /// `1.0` disables multityping.
    pub avg_multityping: f64,
    pub fast_ratio: u32,
}

pub struct EntityTyper<'a> {
    classes: &'a ClassSchema,
    params: TypingParams,
}

impl<'a> EntityTyper<'a> {
    pub fn new(classes: &'a ClassSchema, params: TypingParams) -> Self {
        Self { classes, params }
    }

    /// Type the population. With a fast ratio above 1, the population is
    /// `ratio` batches of `num_entities / ratio` entities sharing one typing
    /// profile.
    pub fn assign(&self, rng: &mut GenRng) -> EntityTyping {
        let ratio = self.params.fast_ratio.max(1);
        let batch = self.params.num_entities / ratio;

        let mut sample: Vec<EntityId> = (1..=batch).map(EntityId).collect();
        let typed = self.split_typed(&mut sample, rng);

        let mut typing = EntityTyping {
            num_entities: batch,
            ..EntityTyping::default()
        };
        if self.classes.depth() == 0 || typed.is_empty() {
            typing.num_entities = batch * ratio;
            return typing;
        }

        let layers = self.draw_layers(typed.len(), rng);
        let mut ent2layer = BTreeMap::new();
        for (&entity, layer) in typed.iter().zip(layers) {
            if let Some(&class) = rng.choose(self.classes.classes_in_layer(layer)) {
                typing.ent2classes_specific.insert(entity, vec![class]);
                ent2layer.insert(entity, layer);
            }
        }
        let typed: Vec<EntityId> = ent2layer.keys().copied().collect();

        if self.params.avg_multityping > 1.0 {
            self.add_types(&typed, &ent2layer, &mut typing, rng);
        }

        typing.ent2classes_transitive = typing
            .ent2classes_specific
            .iter()
            .map(|(e, specific)| (*e, self.closure_of(specific)))
            .collect();

        let repaired = self.repair_disjoint_closures(&mut typing, rng);
        if repaired > 0 {
            debug!(repaired, "collapsed entities with disjoint types");
        }

        if ratio > 1 {
            self.replicate(&mut typing, batch, ratio, rng);
        }
        typing.num_entities = batch * ratio;
        typing
    }

    /// Shuffle `entities` and return the leading typed share.
    fn split_typed(&self, entities: &mut [EntityId], rng: &mut GenRng) -> Vec<EntityId> {
        rng.shuffle(entities);
        let threshold = (entities.len() as f64 * (1.0 - self.params.prop_untyped)).floor() as usize;
        entities[..threshold.min(entities.len())].to_vec()
    }

    /// Power-law layers rescaled so their mean approaches the target depth.
    fn draw_layers(&self, count: usize, rng: &mut GenRng) -> Vec<u32> {
        let depth = self.classes.depth();
        let d = f64::from(depth + 1);
        let shape = d / (d - 1.0);
        let draws: Vec<f64> = (0..count).map(|_| rng.power(shape)).collect();
        let mean = draws.iter().sum::<f64>() / count.max(1) as f64;

        draws
            .into_iter()
            .map(|x| {
                let scaled = if mean > 0.0 {
                    x / mean * self.params.avg_specific_depth
                } else {
                    1.0
                };
                (scaled.floor() as i64).clamp(1, i64::from(depth)) as u32
            })
            .collect()
    }

    fn add_types(
        &self,
        typed: &[EntityId],
        ent2layer: &BTreeMap<EntityId, u32>,
        typing: &mut EntityTyping,
        rng: &mut GenRng,
    ) {
        let mut total: usize = typing.ent2classes_specific.values().map(Vec::len).sum();
        let mut guard = StallGuard::new(MULTITYPING_ATTEMPTS);

        while (total as f64 / typed.len() as f64) < self.params.avg_multityping {
            let Some(&entity) = rng.choose(typed) else {
                break;
            };
            let layer = ent2layer.get(&entity).copied().unwrap_or(1);
            let Some(held) = typing.ent2classes_specific.get_mut(&entity) else {
                break;
            };
            let candidates: Vec<ClassId> = self
                .classes
                .classes_in_layer(layer)
                .iter()
                .copied()
                .filter(|c| !held.contains(c))
                .filter(|c| held.iter().all(|h| !self.classes.are_disjoint(*h, *c)))
                .collect();

            let progress = match rng.choose(&candidates) {
                Some(&class) => {
                    held.push(class);
                    total += 1;
                    true
                }
                None => false,
            };
            if guard.record(progress).is_break() {
                debug!(
                    reached = total as f64 / typed.len() as f64,
                    target = self.params.avg_multityping,
                    "multityping stalled"
                );
                break;
            }
        }
    }

    fn closure_of(&self, specific: &[ClassId]) -> BTreeSet<ClassId> {
        specific
            .iter()
            .flat_map(|c| self.classes.with_ancestors(*c))
            .collect()
    }

    fn has_disjoint_pair(&self, closure: &BTreeSet<ClassId>) -> bool {
        closure.iter().any(|c| {
            self.classes
                .disjoints_extended(*c)
                .is_some_and(|disjoint| !disjoint.is_disjoint(closure))
        })
    }

    /// Collapse every entity whose closure holds a disjoint pair to one
    /// randomly kept most-specific class.
    fn repair_disjoint_closures(&self, typing: &mut EntityTyping, rng: &mut GenRng) -> usize {
        let mut repaired = 0;
        for (entity, closure) in typing.ent2classes_transitive.iter_mut() {
            if !self.has_disjoint_pair(closure) {
                continue;
            }
            let Some(specific) = typing.ent2classes_specific.get_mut(entity) else {
                continue;
            };
            let Some(&keep) = rng.choose(specific) else {
                continue;
            };
            *specific = vec![keep];
            *closure = self.closure_of(specific);
            repaired += 1;
        }
        repaired
    }

    fn replicate(&self, typing: &mut EntityTyping, batch: u32, ratio: u32, rng: &mut GenRng) {
        let profiles: Vec<(Vec<ClassId>, BTreeSet<ClassId>)> = typing
            .ent2classes_specific
            .iter()
            .filter_map(|(e, specific)| {
                let closure = typing.ent2classes_transitive.get(e)?;
                Some((specific.clone(), closure.clone()))
            })
            .collect();

        for round in 1..ratio {
            let first = round * batch + 1;
            let mut entities: Vec<EntityId> = (first..first + batch).map(EntityId).collect();
            let typed = self.split_typed(&mut entities, rng);
            for (entity, (specific, closure)) in typed.into_iter().zip(&profiles) {
                typing.ent2classes_specific.insert(entity, specific.clone());
                typing.ent2classes_transitive.insert(entity, closure.clone());
            }
        }
        debug!(batch, ratio, "replicated typing profile");
    }
}
