//! The triple set and its per-candidate consistency check.

use crate::entity::EntityId;
use ahash::AHashMap;
use kgforge_schema::{Relation, RelationId, RelationProperty};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A `(head, relation, tail)` fact.
///
/// Ordered by relation first so that all triples of one relation form a
/// contiguous range of a [`TripleSet`]. Serialized as `[head, relation, tail]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(
    from = "(EntityId, RelationId, EntityId)",
    into = "(EntityId, RelationId, EntityId)"
)]
pub struct Triple {
    pub relation: RelationId,
    pub head: EntityId,
    pub tail: EntityId,
}

impl Triple {
    pub fn new(head: EntityId, relation: RelationId, tail: EntityId) -> Self {
        Self {
            relation,
            head,
            tail,
        }
    }

    /// `(tail, relation, head)`.
    pub fn mirrored(self) -> Self {
        Triple::new(self.tail, self.relation, self.head)
    }
}

impl From<(EntityId, RelationId, EntityId)> for Triple {
    fn from((head, relation, tail): (EntityId, RelationId, EntityId)) -> Self {
        Triple::new(head, relation, tail)
    }
}

impl From<Triple> for (EntityId, RelationId, EntityId) {
    fn from(t: Triple) -> Self {
        (t.head, t.relation, t.tail)
    }
}

/// Set of triples with `(head, relation)` and `(relation, tail)` counts for
/// the functional checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Triple>", into = "Vec<Triple>")]
pub struct TripleSet {
    triples: BTreeSet<Triple>,
    heads: AHashMap<(EntityId, RelationId), usize>,
    tails: AHashMap<(RelationId, EntityId), usize>,
}

impl TripleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.triples.contains(triple)
    }

    /// Returns `false` when the triple was already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        if !self.triples.insert(triple) {
            return false;
        }
        *self.heads.entry((triple.head, triple.relation)).or_insert(0) += 1;
        *self.tails.entry((triple.relation, triple.tail)).or_insert(0) += 1;
        true
    }

    pub fn remove(&mut self, triple: &Triple) -> bool {
        if !self.triples.remove(triple) {
            return false;
        }
        decrement(&mut self.heads, (triple.head, triple.relation));
        decrement(&mut self.tails, (triple.relation, triple.tail));
        true
    }

    /// Remove every listed triple, returning how many were present.
    pub fn remove_all<'a>(&mut self, triples: impl IntoIterator<Item = &'a Triple>) -> usize {
        triples.into_iter().filter(|t| self.remove(t)).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    pub fn by_relation(&self, relation: RelationId) -> impl Iterator<Item = &Triple> {
        let lo = Triple::new(EntityId(0), relation, EntityId(0));
        let hi = Triple::new(EntityId(u32::MAX), relation, EntityId(u32::MAX));
        self.triples.range(lo..=hi)
    }

    pub fn has_head(&self, head: EntityId, relation: RelationId) -> bool {
        self.heads.get(&(head, relation)).is_some_and(|n| *n > 0)
    }

    pub fn has_tail(&self, relation: RelationId, tail: EntityId) -> bool {
        self.tails.get(&(relation, tail)).is_some_and(|n| *n > 0)
    }

    /// Whether `triple` can join the set without breaking the relation's
    /// irreflexive, asymmetric, functional or inverse-functional semantics.
    pub fn admits(&self, relation: &Relation, triple: &Triple) -> bool {
        let (h, r, t) = (triple.head, triple.relation, triple.tail);
        if relation.has(RelationProperty::Irreflexive) && h == t {
            return false;
        }
        if relation.has(RelationProperty::Asymmetric)
            && (h == t || self.contains(&triple.mirrored()))
        {
            return false;
        }
        if relation.has(RelationProperty::Functional) && self.has_head(h, r) {
            return false;
        }
        if relation.has(RelationProperty::InverseFunctional) && self.has_tail(r, t) {
            return false;
        }
        true
    }
}

fn decrement<K: std::hash::Hash + Eq>(counts: &mut AHashMap<K, usize>, key: K) {
    if let Some(n) = counts.get_mut(&key) {
        *n -= 1;
        if *n == 0 {
            counts.remove(&key);
        }
    }
}

impl From<Vec<Triple>> for TripleSet {
    fn from(value: Vec<Triple>) -> Self {
        value.into_iter().collect()
    }
}

impl From<TripleSet> for Vec<Triple> {
    fn from(value: TripleSet) -> Self {
        value.triples.into_iter().collect()
    }
}

impl FromIterator<Triple> for TripleSet {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        let mut set = TripleSet::new();
        for t in iter {
            set.insert(t);
        }
        set
    }
}
