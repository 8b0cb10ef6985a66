//! Class hierarchy generation.
//!
//! Builds a single-inheritance taxonomy under `owl:Thing` whose shape is
//! steered toward a target average depth and inheritance ratio, then draws
//! disjointness declarations between unrelated classes and propagates them
//! to descendants.

use crate::ids::{canonical_pair, ClassId};
use crate::random::GenRng;
use crate::{check_ratio, round2, SchemaError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::str::FromStr;

/// Probability of a noisy (middle-layer) placement while noise is enabled.
const NOISE_PROBABILITY: f64 = 0.35;

// ============================================================================
// Parameters
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassHierarchyParams {
    pub num_classes: u32,
    pub max_depth: u32,
    pub avg_depth: f64,
    pub inheritance_ratio: f64,
    pub avg_disjointness: f64,
}

impl ClassHierarchyParams {
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.max_depth == 0 {
            return Err(SchemaError::ZeroDepth);
        }
        if self.num_classes < self.max_depth {
            return Err(SchemaError::TooFewClasses {
                num_classes: self.num_classes,
                max_depth: self.max_depth,
            });
        }
        if !(self.avg_depth.is_finite() && self.avg_depth < f64::from(self.max_depth)) {
            return Err(SchemaError::AverageDepthTooLarge {
                avg_depth: self.avg_depth,
                max_depth: self.max_depth,
            });
        }
        // Non-trivial children per parent; may exceed 1.
        if !(self.inheritance_ratio.is_finite() && self.inheritance_ratio >= 0.0) {
            return Err(SchemaError::RatioOutOfRange {
                name: "class_inheritance_ratio",
                value: self.inheritance_ratio,
            });
        }
        check_ratio("avg_disjointness", self.avg_disjointness)
    }
}

// ============================================================================
// Schema record
// ============================================================================

/// Canonical unordered disjoint pair, smaller identifier first.
///
/// Serialized as `"Ca-Cb"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisjointPair(ClassId, ClassId);

impl DisjointPair {
    pub fn new(a: ClassId, b: ClassId) -> Self {
        let (lo, hi) = canonical_pair(a, b);
        DisjointPair(lo, hi)
    }

    pub fn members(self) -> (ClassId, ClassId) {
        (self.0, self.1)
    }
}

impl fmt::Display for DisjointPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.0, self.1)
    }
}

impl TryFrom<String> for DisjointPair {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let (a, b) = value
            .split_once('-')
            .ok_or_else(|| format!("invalid disjoint pair `{value}`"))?;
        let a = ClassId::from_str(a).map_err(|e| e.to_string())?;
        let b = ClassId::from_str(b).map_err(|e| e.to_string())?;
        Ok(DisjointPair::new(a, b))
    }
}

impl From<DisjointPair> for String {
    fn from(pair: DisjointPair) -> String {
        pair.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassStatistics {
    pub num_classes: usize,
    pub hierarchy_depth: u32,
    pub avg_class_depth: f64,
    pub class_inheritance_ratio: f64,
    pub avg_class_disjointness: f64,
}

/// The generated class schema (`class_info.json`).
///
/// A `None` direct superclass stands for `owl:Thing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSchema {
    pub statistics: ClassStatistics,
    pub classes: Vec<ClassId>,
    pub class2superclass_direct: BTreeMap<ClassId, Option<ClassId>>,
    pub class2subclasses_direct: BTreeMap<ClassId, Vec<ClassId>>,
    /// Nearest ancestor first.
    pub class2superclasses_transitive: BTreeMap<ClassId, Vec<ClassId>>,
    pub class2subclasses_transitive: BTreeMap<ClassId, Vec<ClassId>>,
    pub layer2classes: BTreeMap<u32, Vec<ClassId>>,
    pub class2layer: BTreeMap<ClassId, u32>,
    pub class2disjoints: BTreeMap<ClassId, BTreeSet<ClassId>>,
    pub class2disjoints_symmetric: BTreeSet<DisjointPair>,
    pub class2disjoints_extended: BTreeMap<ClassId, BTreeSet<ClassId>>,
}

impl ClassSchema {
    pub fn depth(&self) -> u32 {
        self.layer2classes.keys().next_back().copied().unwrap_or(0)
    }

    pub fn layer(&self, class: ClassId) -> Option<u32> {
        self.class2layer.get(&class).copied()
    }

    pub fn classes_in_layer(&self, layer: u32) -> &[ClassId] {
        self.layer2classes
            .get(&layer)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn parent(&self, class: ClassId) -> Option<ClassId> {
        self.class2superclass_direct.get(&class).copied().flatten()
    }

    pub fn ancestors(&self, class: ClassId) -> &[ClassId] {
        self.class2superclasses_transitive
            .get(&class)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn descendants(&self, class: ClassId) -> &[ClassId] {
        self.class2subclasses_transitive
            .get(&class)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_ancestor(&self, ancestor: ClassId, class: ClassId) -> bool {
        self.ancestors(class).contains(&ancestor)
    }

    /// Disjoint in the extended map.
    pub fn are_disjoint(&self, a: ClassId, b: ClassId) -> bool {
        self.class2disjoints_extended
            .get(&a)
            .is_some_and(|set| set.contains(&b))
    }

    pub fn disjoints_extended(&self, class: ClassId) -> Option<&BTreeSet<ClassId>> {
        self.class2disjoints_extended.get(&class)
    }

    /// `class` together with all its transitive superclasses.
    pub fn with_ancestors(&self, class: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        std::iter::once(class).chain(self.ancestors(class).iter().copied())
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

pub struct ClassHierarchyGenerator {
    params: ClassHierarchyParams,
    parent: BTreeMap<ClassId, Option<ClassId>>,
    children: BTreeMap<ClassId, Vec<ClassId>>,
    layers: BTreeMap<u32, Vec<ClassId>>,
    class_layer: BTreeMap<ClassId, u32>,
    non_trivial: usize,
    depth_sum: u64,
}

impl ClassHierarchyGenerator {
    pub fn new(params: ClassHierarchyParams) -> Result<Self, SchemaError> {
        params.validate()?;
        Ok(Self {
            params,
            parent: BTreeMap::new(),
            children: BTreeMap::new(),
            layers: BTreeMap::new(),
            class_layer: BTreeMap::new(),
            non_trivial: 0,
            depth_sum: 0,
        })
    }

    pub fn generate(mut self, rng: &mut GenRng) -> Result<ClassSchema, SchemaError> {
        self.build_hierarchy(rng);
        let (ancestors, descendants) = self.transitive_maps();
        let disjointness = self.build_disjointness(rng, &ancestors, &descendants)?;

        let num_classes = self.parent.len();
        let statistics = ClassStatistics {
            num_classes,
            hierarchy_depth: self.layers.keys().next_back().copied().unwrap_or(0),
            avg_class_depth: round2(self.avg_depth()),
            class_inheritance_ratio: round2(self.inheritance_ratio()),
            avg_class_disjointness: round2(disjointness.ratio(num_classes)),
        };
        tracing::info!(
            classes = statistics.num_classes,
            depth = statistics.hierarchy_depth,
            avg_depth = statistics.avg_class_depth,
            inheritance_ratio = statistics.class_inheritance_ratio,
            disjointness = statistics.avg_class_disjointness,
            "class hierarchy generated"
        );

        Ok(ClassSchema {
            statistics,
            classes: (1..=self.params.num_classes).map(ClassId).collect(),
            class2superclass_direct: self.parent,
            class2subclasses_direct: self.children,
            class2superclasses_transitive: ancestors,
            class2subclasses_transitive: descendants,
            class2layer: self.class_layer,
            layer2classes: self.layers,
            class2disjoints: disjointness.direct,
            class2disjoints_symmetric: disjointness.pairs,
            class2disjoints_extended: disjointness.extended,
        })
    }

    // ------------------------------------------------------------------
    // Hierarchy
    // ------------------------------------------------------------------

    fn build_hierarchy(&mut self, rng: &mut GenRng) {
        let max_depth = self.params.max_depth;
        let mut unplaced: Vec<ClassId> = (1..=self.params.num_classes).map(ClassId).collect();

        // Seed chain reaching the full requested depth.
        let mut previous = None;
        for layer in 1..=max_depth {
            let Some(class) = unplaced.pop() else { break };
            self.link(class, previous, layer);
            previous = Some(class);
        }

        let noise_until = unplaced.len() / 2;
        while let Some(class) = unplaced.pop() {
            let noisy = rng.chance(NOISE_PROBABILITY);
            if noisy && unplaced.len() >= noise_until && max_depth > 3 {
                self.noisy_placement(class, rng);
            } else {
                self.smart_placement(class, rng);
            }
        }
        tracing::debug!(
            classes = self.parent.len(),
            layers = self.layers.len(),
            "class hierarchy placed"
        );
    }

    fn link(&mut self, child: ClassId, parent: Option<ClassId>, layer: u32) {
        if let Some(parent) = parent {
            self.children.entry(parent).or_default().push(child);
            self.non_trivial += 1;
        }
        self.parent.insert(child, parent);
        self.layers.entry(layer).or_default().push(child);
        self.class_layer.insert(child, layer);
        self.depth_sum += u64::from(layer);
    }

    fn avg_depth(&self) -> f64 {
        if self.parent.is_empty() {
            return 0.0;
        }
        self.depth_sum as f64 / self.parent.len() as f64
    }

    /// Non-trivial children per class that has children.
    fn inheritance_ratio(&self) -> f64 {
        if self.children.is_empty() {
            return 0.0;
        }
        self.non_trivial as f64 / self.children.len() as f64
    }

    /// Attach under a random class of a middle layer.
    fn noisy_placement(&mut self, class: ClassId, rng: &mut GenRng) {
        let last = self.params.max_depth - 1;
        let focus: Vec<u32> = self
            .layers
            .keys()
            .map(|layer| layer - 1)
            .filter(|layer| *layer > 1 && *layer != last)
            .collect();
        let Some(&layer) = rng.choose(&focus) else {
            self.smart_placement(class, rng);
            return;
        };
        let members = self.layers.get(&layer).map(Vec::as_slice).unwrap_or(&[]);
        match rng.choose(members).copied() {
            Some(parent) => self.link(class, Some(parent), layer + 1),
            None => self.smart_placement(class, rng),
        }
    }

    fn smart_placement(&mut self, class: ClassId, rng: &mut GenRng) {
        let shallow = self.avg_depth() > self.params.avg_depth;
        let dense = self.inheritance_ratio() > self.params.inheritance_ratio;
        match (shallow, dense) {
            (false, false) => self.place_deep(class, true, rng),
            (false, true) => self.place_deep(class, false, rng),
            (true, false) => self.place_shallow_leaf(class, rng),
            (true, true) => self.link(class, None, 1),
        }
    }

    /// Attach at or below the target depth, under an existing parent
    /// (`under_parent`) or under an existing leaf. Walks upward until a
    /// suitable class exists; the top concept always qualifies.
    fn place_deep(&mut self, class: ClassId, under_parent: bool, rng: &mut GenRng) {
        let target = self.params.avg_depth;
        let deep_layers: Vec<u32> = self
            .layers
            .iter()
            .filter(|(layer, members)| !members.is_empty() && f64::from(**layer) >= target)
            .map(|(layer, _)| layer - 1)
            .collect();
        let mut layer = rng.choose(&deep_layers).copied().unwrap_or(0);

        while layer >= 1 {
            let candidates: Vec<ClassId> = self
                .layers
                .get(&layer)
                .into_iter()
                .flatten()
                .copied()
                .filter(|c| self.children.contains_key(c) == under_parent)
                .collect();
            if let Some(&parent) = rng.choose(&candidates) {
                self.link(class, Some(parent), layer + 1);
                return;
            }
            layer -= 1;
        }
        self.link(class, None, 1);
    }

    fn place_shallow_leaf(&mut self, class: ClassId, rng: &mut GenRng) {
        if self.params.max_depth < 2 {
            self.link(class, None, 1);
            return;
        }
        match rng.choose(self.layers.get(&1).map(Vec::as_slice).unwrap_or(&[])).copied() {
            Some(parent) => self.link(class, Some(parent), 2),
            None => self.link(class, None, 1),
        }
    }

    /// Transitive superclass and subclass maps, built iteratively.
    fn transitive_maps(
        &self,
    ) -> (
        BTreeMap<ClassId, Vec<ClassId>>,
        BTreeMap<ClassId, Vec<ClassId>>,
    ) {
        let bound = self.parent.len();
        let mut ancestors = BTreeMap::new();
        for &class in self.parent.keys() {
            let mut chain = Vec::new();
            let mut cursor = self.parent.get(&class).copied().flatten();
            while let Some(parent) = cursor {
                if chain.len() > bound {
                    break;
                }
                chain.push(parent);
                cursor = self.parent.get(&parent).copied().flatten();
            }
            ancestors.insert(class, chain);
        }

        let mut descendants = BTreeMap::new();
        for (&class, kids) in &self.children {
            let mut found = Vec::new();
            let mut queue: VecDeque<ClassId> = kids.iter().copied().collect();
            while let Some(next) = queue.pop_front() {
                if found.len() > bound {
                    break;
                }
                found.push(next);
                if let Some(grandchildren) = self.children.get(&next) {
                    queue.extend(grandchildren.iter().copied());
                }
            }
            found.sort_unstable();
            descendants.insert(class, found);
        }
        (ancestors, descendants)
    }

    // ------------------------------------------------------------------
    // Disjointness
    // ------------------------------------------------------------------

    fn build_disjointness(
        &self,
        rng: &mut GenRng,
        ancestors: &BTreeMap<ClassId, Vec<ClassId>>,
        descendants: &BTreeMap<ClassId, Vec<ClassId>>,
    ) -> Result<Disjointness, SchemaError> {
        let classes: Vec<ClassId> = self.parent.keys().copied().collect();
        let n = classes.len();
        let target = self.params.avg_disjointness;
        let mut state = Disjointness::default();

        let required = Disjointness::pairs_needed(target, n);
        let total_pairs = n * n.saturating_sub(1) / 2;
        let ancestral_pairs: usize = ancestors.values().map(Vec::len).sum();
        let available = total_pairs - ancestral_pairs;
        if required > available {
            return Err(SchemaError::UnreachableDisjointness {
                target,
                required,
                available,
            });
        }

        let related = |a: ClassId, b: ClassId| {
            ancestors.get(&a).is_some_and(|anc| anc.contains(&b))
                || ancestors.get(&b).is_some_and(|anc| anc.contains(&a))
        };

        // Classes that may still have an undeclared partner. A class drawn
        // without any valid partner never regains one, so it is retired.
        let mut open = classes.clone();
        while state.ratio(n) < target {
            let Some(&a) = rng.choose(&open) else { break };
            let partners: Vec<ClassId> = classes
                .iter()
                .copied()
                .filter(|&b| b != a && !related(a, b) && !state.declared(a, b))
                .collect();
            match rng.choose(&partners).copied() {
                Some(b) => state.declare(a, b, descendants),
                None => open.retain(|c| *c != a),
            }
        }
        tracing::debug!(
            declared = state.declared_pairs.len(),
            extended = state.pairs.len(),
            "class disjointness generated"
        );
        Ok(state)
    }
}

#[derive(Debug, Default)]
struct Disjointness {
    direct: BTreeMap<ClassId, BTreeSet<ClassId>>,
    declared_pairs: BTreeSet<DisjointPair>,
    extended: BTreeMap<ClassId, BTreeSet<ClassId>>,
    pairs: BTreeSet<DisjointPair>,
}

impl Disjointness {
    /// Smallest number of declared pairs whose ratio meets `target`.
    fn pairs_needed(target: f64, num_classes: usize) -> usize {
        let denom = 2.0 * num_classes as f64;
        let mut needed = (target * denom).ceil().max(0.0) as usize;
        while needed > 0 && (needed - 1) as f64 / denom >= target {
            needed -= 1;
        }
        needed
    }

    fn ratio(&self, num_classes: usize) -> f64 {
        if num_classes == 0 {
            return 0.0;
        }
        self.declared_pairs.len() as f64 / (2.0 * num_classes as f64)
    }

    fn declared(&self, a: ClassId, b: ClassId) -> bool {
        self.declared_pairs.contains(&DisjointPair::new(a, b))
    }

    fn declare(&mut self, a: ClassId, b: ClassId, descendants: &BTreeMap<ClassId, Vec<ClassId>>) {
        self.direct.entry(a).or_default().insert(b);
        self.direct.entry(b).or_default().insert(a);
        self.declared_pairs.insert(DisjointPair::new(a, b));
        self.extend(a, b);

        let side = |c: ClassId| match descendants.get(&c) {
            Some(desc) if !desc.is_empty() => desc.clone(),
            _ => vec![c],
        };
        let side_a = side(a);
        let side_b = side(b);
        for &x in &side_a {
            for &y in &side_b {
                self.extend(x, y);
            }
        }
    }

    fn extend(&mut self, a: ClassId, b: ClassId) {
        self.extended.entry(a).or_default().insert(b);
        self.extended.entry(b).or_default().insert(a);
        self.pairs.insert(DisjointPair::new(a, b));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn params(num_classes: u32, max_depth: u32) -> ClassHierarchyParams {
        ClassHierarchyParams {
            num_classes,
            max_depth,
            avg_depth: (f64::from(max_depth) / 2.0).min(f64::from(max_depth) - 0.5),
            inheritance_ratio: 2.0,
            avg_disjointness: 0.2,
        }
    }

    fn generate(p: ClassHierarchyParams, seed: u64) -> ClassSchema {
        let mut rng = GenRng::seed_from_u64(seed);
        ClassHierarchyGenerator::new(p)
            .unwrap()
            .generate(&mut rng)
            .unwrap()
    }

    #[test]
    fn three_classes_depth_two_yield_layers_one_and_two() {
        for seed in 0..20 {
            let schema = generate(
                ClassHierarchyParams {
                    num_classes: 3,
                    max_depth: 2,
                    avg_depth: 1.5,
                    inheritance_ratio: 1.0,
                    avg_disjointness: 0.0,
                },
                seed,
            );
            // Seed chain: C3 under the top, C2 under C3.
            assert_eq!(schema.parent(ClassId(3)), None);
            assert_eq!(schema.parent(ClassId(2)), Some(ClassId(3)));
            assert_eq!(schema.layer(ClassId(2)), Some(2));
            let layers: Vec<u32> = schema.layer2classes.keys().copied().collect();
            assert_eq!(layers, vec![1, 2]);
            assert_eq!(schema.classes.len(), 3);
        }
    }

    #[test]
    fn every_class_has_one_parent_and_contiguous_layers() {
        let schema = generate(params(60, 5), 42);
        assert_eq!(schema.class2superclass_direct.len(), 60);
        assert_eq!(schema.depth(), 5);
        assert_eq!(schema.statistics.hierarchy_depth, 5);
        let layers: Vec<u32> = schema.layer2classes.keys().copied().collect();
        assert_eq!(layers, (1..=5).collect::<Vec<_>>());
        for (&class, &parent) in &schema.class2superclass_direct {
            let layer = schema.layer(class).unwrap();
            match parent {
                None => assert_eq!(layer, 1),
                Some(p) => assert_eq!(schema.layer(p).unwrap() + 1, layer),
            }
        }
    }

    #[test]
    fn children_accumulate_instead_of_overwriting() {
        let schema = generate(params(80, 4), 9);
        let linked: usize = schema.class2subclasses_direct.values().map(Vec::len).sum();
        let non_trivial = schema
            .class2superclass_direct
            .values()
            .filter(|p| p.is_some())
            .count();
        assert_eq!(linked, non_trivial);
    }

    #[test]
    fn disjointness_is_symmetric_and_never_ancestral() {
        let schema = generate(params(50, 4), 3);
        for map in [&schema.class2disjoints, &schema.class2disjoints_extended] {
            for (&a, partners) in map.iter() {
                for &b in partners {
                    assert!(map[&b].contains(&a), "{a} / {b} not symmetric");
                    assert!(!schema.is_ancestor(a, b) && !schema.is_ancestor(b, a));
                    assert_ne!(a, b);
                }
            }
        }
    }

    #[test]
    fn disjointness_propagates_to_descendants() {
        let schema = generate(params(40, 4), 17);
        for (&a, partners) in &schema.class2disjoints {
            for &b in partners {
                for &da in schema.descendants(a) {
                    for &db in schema.descendants(b) {
                        assert!(schema.are_disjoint(da, db), "{da} / {db} missing");
                    }
                }
            }
        }
    }

    #[test]
    fn disjointness_reaches_target() {
        let schema = generate(params(50, 4), 5);
        assert!(schema.statistics.avg_class_disjointness >= 0.2);
        let declared: BTreeSet<DisjointPair> = schema
            .class2disjoints
            .iter()
            .flat_map(|(&a, bs)| bs.iter().map(move |&b| DisjointPair::new(a, b)))
            .collect();
        assert_relative_eq!(declared.len() as f64 / 100.0, 0.2, epsilon = 0.011);
    }

    #[test]
    fn same_seed_same_schema() {
        let a = generate(params(70, 5), 1234);
        let b = generate(params(70, 5), 1234);
        assert_eq!(a.to_json_pretty().unwrap(), b.to_json_pretty().unwrap());
    }

    #[test]
    fn schema_round_trips_through_json() {
        let schema = generate(params(20, 3), 8);
        let json = schema.to_json_pretty().unwrap();
        assert_eq!(ClassSchema::from_json(&json).unwrap(), schema);
        assert!(json.contains("\"class2disjoints_symmetric\""));
    }

    #[test]
    fn unreachable_disjointness_is_rejected() {
        // A pure chain: every pair is ancestral.
        let p = ClassHierarchyParams {
            num_classes: 3,
            max_depth: 3,
            avg_depth: 2.0,
            inheritance_ratio: 1.0,
            avg_disjointness: 0.5,
        };
        let mut rng = GenRng::seed_from_u64(0);
        let err = ClassHierarchyGenerator::new(p)
            .unwrap()
            .generate(&mut rng)
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnreachableDisjointness { available: 0, .. }));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let mut p = params(10, 4);
        p.avg_depth = 4.0;
        assert!(matches!(p.validate(), Err(SchemaError::AverageDepthTooLarge { .. })));
        assert!(matches!(params(3, 4).validate(), Err(SchemaError::TooFewClasses { .. })));
        let mut p = params(10, 4);
        p.max_depth = 0;
        assert_eq!(p.validate(), Err(SchemaError::ZeroDepth));
    }

    #[test]
    fn pairs_needed_is_exact_at_boundaries() {
        assert_eq!(Disjointness::pairs_needed(0.3, 50), 30);
        assert_eq!(Disjointness::pairs_needed(0.0, 50), 0);
        assert_eq!(Disjointness::pairs_needed(0.01, 50), 1);
    }

    #[test]
    fn disjoint_pair_key_is_canonical() {
        let pair = DisjointPair::new(ClassId(12), ClassId(3));
        assert_eq!(pair.to_string(), "C3-C12");
        assert_eq!(DisjointPair::try_from("C12-C3".to_string()).unwrap(), pair);
    }
}
