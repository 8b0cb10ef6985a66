//! Relation schema generation.
//!
//! Relations receive property flags (always an admissible combination),
//! inverse-of pairs, domain/range profiles steered toward a target
//! specificity, and subproperty links, in that order.

use crate::budget::StallGuard;
use crate::class_hierarchy::ClassSchema;
use crate::ids::{ClassId, RelationId};
use crate::properties::{PropertySet, PropertyTables, RelationProperty};
use crate::random::GenRng;
use crate::{check_ratio, round2, SchemaError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::ops::ControlFlow;

/// Consecutive rejected inverse-of candidates before the target is relaxed.
const INVERSE_ATTEMPTS: usize = 1000;
/// Amount the inverse-of target drops after each exhausted budget.
const INVERSE_RELAXATION_STEP: f64 = 0.005;
/// Chance of drawing a profile class from the opposite specificity pool.
const PROFILE_NOISE: f64 = 0.1;

// ============================================================================
// Parameters
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileSide {
    /// Domain and range are assigned together.
    Both,
    /// One side per step.
    #[default]
    Partial,
}

/// Target proportions of relations carrying each property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyTargets {
    pub reflexive: f64,
    pub irreflexive: f64,
    pub symmetric: f64,
    pub asymmetric: f64,
    pub transitive: f64,
    pub functional: f64,
    pub inverse_functional: f64,
    pub inverse_of: f64,
    pub subproperty: f64,
}

impl PropertyTargets {
    pub fn validate(&self) -> Result<(), SchemaError> {
        for (name, value) in [
            ("prop_reflexive_relations", self.reflexive),
            ("prop_irreflexive_relations", self.irreflexive),
            ("prop_symmetric_relations", self.symmetric),
            ("prop_asymmetric_relations", self.asymmetric),
            ("prop_transitive_relations", self.transitive),
            ("prop_functional_relations", self.functional),
            ("prop_inverse_functional_relations", self.inverse_functional),
            ("prop_inverse_relations", self.inverse_of),
            ("prop_subproperties", self.subproperty),
        ] {
            check_ratio(name, value)?;
        }
        if self.symmetric + self.asymmetric > 1.0 {
            return Err(SchemaError::ConflictingRatios {
                first: "prop_symmetric_relations",
                second: "prop_asymmetric_relations",
                sum: self.symmetric + self.asymmetric,
            });
        }
        if self.reflexive + self.irreflexive > 1.0 {
            return Err(SchemaError::ConflictingRatios {
                first: "prop_reflexive_relations",
                second: "prop_irreflexive_relations",
                sum: self.reflexive + self.irreflexive,
            });
        }
        if self.subproperty > 0.0 && self.functional > 0.0 && self.inverse_functional > 0.0 {
            return Err(SchemaError::SubpropertyWithFunctional);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelationSchemaParams {
    pub num_relations: u32,
    /// Target mean layer of domain/range classes.
    pub relation_specificity: f64,
    pub profiled_ratio: f64,
    pub profile_side: ProfileSide,
    pub targets: PropertyTargets,
}

impl RelationSchemaParams {
    pub fn validate(&self) -> Result<(), SchemaError> {
        if !(self.relation_specificity.is_finite() && self.relation_specificity >= 0.0) {
            return Err(SchemaError::RatioOutOfRange {
                name: "relation_specificity",
                value: self.relation_specificity,
            });
        }
        check_ratio("prop_profiled_relations", self.profiled_ratio)?;
        self.targets.validate()
    }
}

// ============================================================================
// Schema record
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub id: RelationId,
    pub properties: PropertySet,
    pub domain: Option<ClassId>,
    pub range: Option<ClassId>,
    pub inverse: Option<RelationId>,
    pub super_relation: Option<RelationId>,
}

impl Relation {
    pub fn new(id: RelationId) -> Self {
        Self {
            id,
            properties: PropertySet::EMPTY,
            domain: None,
            range: None,
            inverse: None,
            super_relation: None,
        }
    }

    pub fn has(&self, property: RelationProperty) -> bool {
        self.properties.contains(property)
    }

    pub fn is_profiled(&self) -> bool {
        self.domain.is_some() || self.range.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationStatistics {
    pub num_relations: usize,
    pub prop_reflexive: f64,
    pub prop_irreflexive: f64,
    pub prop_functional: f64,
    pub prop_inversefunctional: f64,
    pub prop_symmetric: f64,
    pub prop_asymmetric: f64,
    pub prop_transitive: f64,
    pub prop_inverseof: f64,
    pub prop_subpropertyof: f64,
    pub prop_profiled_relations: f64,
    pub relation_specificity: f64,
    /// Inverse-of target actually pursued, when it had to be lowered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverseof_target_relaxed_to: Option<f64>,
}

/// The generated relation schema (`relation_info.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationSchema {
    pub statistics: RelationStatistics,
    /// Ordered by identifier, `R1` first.
    pub relations: Vec<Relation>,
}

impl RelationSchema {
    /// Relation `id`, wherever it sits in the list.
    pub fn get(&self, id: RelationId) -> Option<&Relation> {
        let positional = (id.index() as usize)
            .checked_sub(1)
            .and_then(|idx| self.relations.get(idx))
            .filter(|r| r.id == id);
        positional.or_else(|| self.relations.iter().find(|r| r.id == id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relation> {
        self.relations.iter()
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    pub fn with_property(&self, property: RelationProperty) -> Vec<RelationId> {
        self.relations
            .iter()
            .filter(|r| r.has(property))
            .map(|r| r.id)
            .collect()
    }

    pub fn inverse_of(&self, id: RelationId) -> Option<RelationId> {
        self.get(id).and_then(|r| r.inverse)
    }

    pub fn super_of(&self, id: RelationId) -> Option<RelationId> {
        self.get(id).and_then(|r| r.super_relation)
    }

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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Domain,
    Range,
}

pub struct RelationSchemaGenerator<'a> {
    classes: &'a ClassSchema,
    tables: &'a PropertyTables,
    params: RelationSchemaParams,
    relations: Vec<Relation>,
    paired: usize,
    inverse_target: f64,
    inverse_relaxed: bool,
}

impl<'a> RelationSchemaGenerator<'a> {
    pub fn new(
        classes: &'a ClassSchema,
        tables: &'a PropertyTables,
        params: RelationSchemaParams,
    ) -> Result<Self, SchemaError> {
        params.validate()?;
        Ok(Self {
            classes,
            tables,
            relations: (1..=params.num_relations)
                .map(|i| Relation::new(RelationId(i)))
                .collect(),
            paired: 0,
            inverse_target: params.targets.inverse_of,
            inverse_relaxed: false,
            params,
        })
    }

    pub fn generate(mut self, rng: &mut GenRng) -> Result<RelationSchema, SchemaError> {
        self.assign_properties(rng);
        self.pair_inverses(rng);
        self.profile(rng)?;
        self.link_subproperties();

        let statistics = self.statistics();
        tracing::info!(
            relations = statistics.num_relations,
            inverseof = statistics.prop_inverseof,
            profiled = statistics.prop_profiled_relations,
            specificity = statistics.relation_specificity,
            subproperties = statistics.prop_subpropertyof,
            "relation schema generated"
        );
        Ok(RelationSchema {
            statistics,
            relations: self.relations,
        })
    }

    fn rel(&self, id: RelationId) -> &Relation {
        &self.relations[id.index() as usize - 1]
    }

    fn rel_mut(&mut self, id: RelationId) -> &mut Relation {
        &mut self.relations[id.index() as usize - 1]
    }

    fn ids(&self) -> Vec<RelationId> {
        self.relations.iter().map(|r| r.id).collect()
    }

    fn target_count(&self, ratio: f64) -> usize {
        (self.relations.len() as f64 * ratio).floor() as usize
    }

    // ------------------------------------------------------------------
    // Property flags
    // ------------------------------------------------------------------

    fn assign_properties(&mut self, rng: &mut GenRng) {
        let targets = self.params.targets;
        let ids = self.ids();

        let reflexive = rng.sample(&ids, self.target_count(targets.reflexive));
        for &id in &reflexive {
            self.rel_mut(id).properties.insert(RelationProperty::Reflexive);
        }
        let rest: Vec<RelationId> = ids
            .iter()
            .copied()
            .filter(|id| !reflexive.contains(id))
            .collect();
        for id in rng.sample(&rest, self.target_count(targets.irreflexive)) {
            self.rel_mut(id).properties.insert(RelationProperty::Irreflexive);
        }

        for (property, ratio) in [
            (RelationProperty::Symmetric, targets.symmetric),
            (RelationProperty::Asymmetric, targets.asymmetric),
            (RelationProperty::Transitive, targets.transitive),
            (RelationProperty::Functional, targets.functional),
            (RelationProperty::InverseFunctional, targets.inverse_functional),
        ] {
            let pool: Vec<RelationId> = self
                .relations
                .iter()
                .filter(|r| !r.has(property) && self.tables.admits(r.properties, property))
                .map(|r| r.id)
                .collect();
            let wanted = self.target_count(ratio);
            if wanted > pool.len() {
                tracing::debug!(%property, wanted, available = pool.len(), "property pool capped");
            }
            for id in rng.sample(&pool, wanted) {
                self.rel_mut(id).properties.insert(property);
            }
        }
    }

    // ------------------------------------------------------------------
    // Inverse-of pairing
    // ------------------------------------------------------------------

    fn inverse_ratio(&self) -> f64 {
        if self.relations.is_empty() {
            return 0.0;
        }
        self.paired as f64 / self.relations.len() as f64
    }

    fn pair(&mut self, a: RelationId, b: RelationId) {
        self.rel_mut(a).inverse = Some(b);
        self.rel_mut(b).inverse = Some(a);
        self.paired += 2;
    }

    fn can_pair(&self, a: RelationId, b: RelationId) -> bool {
        let (ra, rb) = (self.rel(a), self.rel(b));
        let excluded = |r: &Relation| {
            r.inverse.is_some()
                || r.has(RelationProperty::Reflexive)
                || r.has(RelationProperty::Irreflexive)
                || r.has(RelationProperty::Symmetric)
        };
        a != b
            && !excluded(ra)
            && !excluded(rb)
            && !(ra.has(RelationProperty::Asymmetric) && rb.has(RelationProperty::Asymmetric))
    }

    fn pair_inverses(&mut self, rng: &mut GenRng) {
        // Flagless relations first, two at a time.
        let mut flagless: Vec<RelationId> = self
            .relations
            .iter()
            .filter(|r| r.properties.is_empty())
            .map(|r| r.id)
            .collect();
        if flagless.len() % 2 == 1 {
            flagless.pop();
        }
        while self.inverse_ratio() < self.inverse_target && flagless.len() >= 2 {
            if let (Some(a), Some(b)) = (flagless.pop(), flagless.pop()) {
                self.pair(a, b);
            }
        }

        let mut buckets: BTreeMap<PropertySet, Vec<RelationId>> = BTreeMap::new();
        for r in &self.relations {
            buckets.entry(r.properties).or_default().push(r.id);
        }
        let observed: Vec<PropertySet> = buckets.keys().copied().collect();

        let mut guard = StallGuard::new(INVERSE_ATTEMPTS);
        while self.inverse_ratio() < self.inverse_target {
            let candidate = self.draw_inverse_candidate(rng, &observed, &buckets);
            let accepted = match candidate {
                Some((a, b)) if self.can_pair(a, b) => {
                    self.pair(a, b);
                    true
                }
                _ => false,
            };
            if let ControlFlow::Break(_) = guard.record(accepted) {
                self.inverse_target -= INVERSE_RELAXATION_STEP;
                self.inverse_relaxed = true;
                guard.reset();
            }
        }

        if self.inverse_relaxed {
            tracing::warn!(
                requested = self.params.targets.inverse_of,
                relaxed_to = round2(self.inverse_target.max(0.0)),
                "proportion of inverse relations reduced due to incompatibilities with other properties"
            );
        }
    }

    fn draw_inverse_candidate(
        &self,
        rng: &mut GenRng,
        observed: &[PropertySet],
        buckets: &BTreeMap<PropertySet, Vec<RelationId>>,
    ) -> Option<(RelationId, RelationId)> {
        let first = *rng.choose(observed)?;
        let partners: Vec<PropertySet> = self
            .tables
            .inverse_partners(first)
            .iter()
            .copied()
            .filter(|p| buckets.contains_key(p))
            .collect();
        let second = *rng.choose(&partners)?;
        let a = *rng.choose(buckets.get(&first)?)?;
        let b = *rng.choose(buckets.get(&second)?)?;
        Some((a, b))
    }

    // ------------------------------------------------------------------
    // Domain / range profiles
    // ------------------------------------------------------------------

    fn profile(&mut self, rng: &mut GenRng) -> Result<(), SchemaError> {
        let eligible: Vec<RelationId> = self
            .relations
            .iter()
            .filter(|r| !r.has(RelationProperty::Reflexive))
            .map(|r| r.id)
            .collect();
        if eligible.is_empty() || self.params.profiled_ratio <= 0.0 {
            return Ok(());
        }
        if self.classes.classes.is_empty() {
            return Err(SchemaError::EmptyClassSchema);
        }

        let mut both: VecDeque<RelationId> = eligible.iter().copied().collect();
        let mut domains = both.clone();
        let mut ranges = both.clone();

        while self.profiled_ratio() < self.params.profiled_ratio {
            let progressed = match self.params.profile_side {
                ProfileSide::Both => self.profile_both(rng, &mut both),
                ProfileSide::Partial => self.profile_partial(rng, &mut domains, &mut ranges),
            };
            if !progressed {
                tracing::warn!(
                    reached = round2(self.profiled_ratio()),
                    requested = self.params.profiled_ratio,
                    "no relation left to profile"
                );
                break;
            }
        }
        tracing::debug!(profiled = self.profiled_ratio(), "relation profiles assigned");
        Ok(())
    }

    fn profiled_ratio(&self) -> f64 {
        let eligible = self
            .relations
            .iter()
            .filter(|r| !r.has(RelationProperty::Reflexive))
            .count();
        if eligible == 0 {
            return 0.0;
        }
        let sides: usize = self
            .relations
            .iter()
            .map(|r| usize::from(r.domain.is_some()) + usize::from(r.range.is_some()))
            .sum();
        sides as f64 / (2 * eligible) as f64
    }

    /// Mean layer over all assigned domain and range classes.
    fn specificity(&self) -> Option<f64> {
        let layers: Vec<u32> = self
            .relations
            .iter()
            .flat_map(|r| [r.domain, r.range])
            .flatten()
            .filter_map(|c| self.classes.layer(c))
            .collect();
        if layers.is_empty() {
            return None;
        }
        Some(layers.iter().map(|&l| f64::from(l)).sum::<f64>() / layers.len() as f64)
    }

    fn needs_equal_sides(&self, id: RelationId) -> bool {
        let symmetric_like = |r: &Relation| {
            r.has(RelationProperty::Transitive) || r.has(RelationProperty::Symmetric)
        };
        let rel = self.rel(id);
        symmetric_like(rel) || rel.inverse.is_some_and(|inv| symmetric_like(self.rel(inv)))
    }

    fn profile_both(&mut self, rng: &mut GenRng, queue: &mut VecDeque<RelationId>) -> bool {
        let Some(id) = pop_unassigned(queue, |id| self.rel(id).is_profiled()) else {
            return false;
        };
        let Some(domain) = self.sample_class(rng) else {
            return false;
        };
        self.rel_mut(id).domain = Some(domain);
        let range = if self.needs_equal_sides(id) {
            domain
        } else {
            self.sample_class_compatible(rng, domain)
        };
        self.rel_mut(id).range = Some(range);
        self.propagate_to_inverse(id);
        true
    }

    fn profile_partial(
        &mut self,
        rng: &mut GenRng,
        domains: &mut VecDeque<RelationId>,
        ranges: &mut VecDeque<RelationId>,
    ) -> bool {
        let first = if rng.chance(0.5) {
            Side::Domain
        } else {
            Side::Range
        };
        let second = match first {
            Side::Domain => Side::Range,
            Side::Range => Side::Domain,
        };

        let mut picked = None;
        for side in [first, second] {
            let queue = match side {
                Side::Domain => &mut *domains,
                Side::Range => &mut *ranges,
            };
            let assigned = |id: RelationId| match side {
                Side::Domain => self.rel(id).domain.is_some(),
                Side::Range => self.rel(id).range.is_some(),
            };
            if let Some(id) = pop_unassigned(queue, assigned) {
                picked = Some((id, side));
                break;
            }
        }
        let Some((id, side)) = picked else {
            return false;
        };

        let other = match side {
            Side::Domain => self.rel(id).range,
            Side::Range => self.rel(id).domain,
        };
        let class = match other {
            Some(other) => self.sample_class_compatible(rng, other),
            None => match self.sample_class(rng) {
                Some(class) => class,
                None => return false,
            },
        };

        let equal = self.needs_equal_sides(id);
        let rel = self.rel_mut(id);
        match side {
            Side::Domain => rel.domain = Some(class),
            Side::Range => rel.range = Some(class),
        }
        if equal {
            rel.domain = Some(class);
            rel.range = Some(class);
        }
        self.propagate_to_inverse(id);
        true
    }

    /// The inverse sees this relation's range as its domain and vice versa.
    fn propagate_to_inverse(&mut self, id: RelationId) {
        let Relation {
            domain,
            range,
            inverse,
            ..
        } = self.rel(id).clone();
        if let Some(inv) = inverse {
            let inv = self.rel_mut(inv);
            if range.is_some() {
                inv.domain = range;
            }
            if domain.is_some() {
                inv.range = domain;
            }
        }
    }

    /// Classes on the side of the specificity threshold the running mean
    /// should move toward (or, with small probability, the opposite side).
    fn specificity_pool(&self, rng: &mut GenRng) -> Vec<ClassId> {
        let target = self.params.relation_specificity;
        let threshold = target.floor();
        let prefer_deep = self.specificity().is_some_and(|current| current < target);
        let prefer_deep = if rng.chance(PROFILE_NOISE) {
            !prefer_deep
        } else {
            prefer_deep
        };

        let mut deep = Vec::new();
        let mut shallow = Vec::new();
        for (&layer, members) in &self.classes.layer2classes {
            if f64::from(layer) > threshold {
                deep.extend(members);
            } else {
                shallow.extend(members);
            }
        }
        let (preferred, fallback) = if prefer_deep {
            (deep, shallow)
        } else {
            (shallow, deep)
        };
        if preferred.is_empty() {
            fallback
        } else {
            preferred
        }
    }

    fn sample_class(&self, rng: &mut GenRng) -> Option<ClassId> {
        let pool = self.specificity_pool(rng);
        rng.choose(&pool).copied()
    }

    /// A class not disjoint with `other`. Widens to every class and finally
    /// to `other` itself when the specificity pool has no compatible class.
    fn sample_class_compatible(&self, rng: &mut GenRng, other: ClassId) -> ClassId {
        let empty = BTreeSet::new();
        let disjoint = self.classes.disjoints_extended(other).unwrap_or(&empty);
        let compatible = |pool: Vec<ClassId>| -> Vec<ClassId> {
            pool.into_iter().filter(|c| !disjoint.contains(c)).collect()
        };

        let preferred = compatible(self.specificity_pool(rng));
        if let Some(&class) = rng.choose(&preferred) {
            return class;
        }
        let everything = compatible(self.classes.classes.clone());
        rng.choose(&everything).copied().unwrap_or(other)
    }

    // ------------------------------------------------------------------
    // Subproperties
    // ------------------------------------------------------------------

    fn link_subproperties(&mut self) {
        let n = self.relations.len() as f64;
        let target = self.params.targets.subproperty;
        let ids = self.ids();
        let mut links = 0usize;

        for &r1 in &ids {
            if 2.0 * links as f64 >= target * n {
                break;
            }
            for &r2 in &ids {
                if self.is_superproperty_candidate(r1, r2) {
                    self.rel_mut(r1).super_relation = Some(r2);
                    links += 1;
                    break;
                }
            }
        }
        tracing::debug!(links, "subproperty links assigned");
    }

    fn is_superproperty_candidate(&self, sub: RelationId, sup: RelationId) -> bool {
        let (a, b) = (self.rel(sub), self.rel(sup));
        if sub == sup
            || a.super_relation.is_some()
            || b.super_relation.is_some()
            || a.inverse == Some(sup)
            || b.inverse == Some(sub)
            || a.properties != b.properties
        {
            return false;
        }

        if !a.is_profiled() && !b.is_profiled() {
            return true;
        }
        let (Some(dom_a), Some(range_a), Some(dom_b), Some(range_b)) =
            (a.domain, a.range, b.domain, b.range)
        else {
            return false;
        };
        let within = |narrow: ClassId, wide: ClassId| self.classes.is_ancestor(wide, narrow);

        (dom_a == dom_b && range_a == range_b)
            || (dom_a == dom_b && within(range_a, range_b))
            || (range_a == range_b && within(dom_a, dom_b))
            || (within(dom_a, dom_b) && within(range_a, range_b))
    }

    // ------------------------------------------------------------------
    // Statistics
    // ------------------------------------------------------------------

    fn statistics(&self) -> RelationStatistics {
        let n = self.relations.len();
        let share = |count: usize| {
            if n == 0 {
                0.0
            } else {
                round2(count as f64 / n as f64)
            }
        };
        let with = |p: RelationProperty| self.relations.iter().filter(|r| r.has(p)).count();
        let inverse = self.relations.iter().filter(|r| r.inverse.is_some()).count();
        let subs = self
            .relations
            .iter()
            .filter(|r| r.super_relation.is_some())
            .count();

        RelationStatistics {
            num_relations: n,
            prop_reflexive: share(with(RelationProperty::Reflexive)),
            prop_irreflexive: share(with(RelationProperty::Irreflexive)),
            prop_functional: share(with(RelationProperty::Functional)),
            prop_inversefunctional: share(with(RelationProperty::InverseFunctional)),
            prop_symmetric: share(with(RelationProperty::Symmetric)),
            prop_asymmetric: share(with(RelationProperty::Asymmetric)),
            prop_transitive: share(with(RelationProperty::Transitive)),
            prop_inverseof: share(inverse),
            prop_subpropertyof: share(2 * subs),
            prop_profiled_relations: round2(self.profiled_ratio()),
            relation_specificity: round2(self.specificity().unwrap_or(0.0)),
            inverseof_target_relaxed_to: self
                .inverse_relaxed
                .then(|| round2(self.inverse_target.max(0.0))),
        }
    }
}

/// Pop from the front until an entry that `assigned` rejects.
fn pop_unassigned(
    queue: &mut VecDeque<RelationId>,
    assigned: impl Fn(RelationId) -> bool,
) -> Option<RelationId> {
    while let Some(id) = queue.pop_front() {
        if !assigned(id) {
            return Some(id);
        }
    }
    None
}
