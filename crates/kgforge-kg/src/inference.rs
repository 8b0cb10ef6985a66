//! Closure-based oversampling.
//!
//! Grows the triple set toward its target without adding entities, by
//! applying the schema's inverse-of, symmetric and subproperty axioms to the
//! triples already present. Each relation is expanded at most once per run.

use crate::triples::{Triple, TripleSet};
use kgforge_schema::{GenRng, LoopOutcome, RelationId, RelationProperty, RelationSchema, StallGuard};
use std::collections::BTreeSet;
use std::ops::ControlFlow;
use tracing::debug;

/// Consecutive picks of an exhausted pattern tolerated before giving up.
pub const OVERSAMPLE_ATTEMPTS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pattern {
    /// `(h, r, t)` entails `(t, inverse(r), h)`.
    Inverse,
    /// `(h, r, t)` entails `(t, r, h)`.
    Symmetric,
    /// `(h, r, t)` entails `(h, super(r), t)`.
    Subproperty,
}

impl Pattern {
    const ALL: [Pattern; 3] = [Pattern::Inverse, Pattern::Symmetric, Pattern::Subproperty];

    fn relations(self, schema: &RelationSchema) -> Vec<RelationId> {
        schema
            .iter()
            .filter(|r| match self {
                Pattern::Inverse => r.inverse.is_some(),
                Pattern::Symmetric => r.has(RelationProperty::Symmetric),
                Pattern::Subproperty => r.super_relation.is_some(),
            })
            .map(|r| r.id)
            .collect()
    }

    fn infer(self, schema: &RelationSchema, source: &Triple) -> Option<Triple> {
        match self {
            Pattern::Inverse => {
                let inverse = schema.inverse_of(source.relation)?;
                Some(Triple::new(source.tail, inverse, source.head))
            }
            Pattern::Symmetric => Some(source.mirrored()),
            Pattern::Subproperty => {
                let parent = schema.super_of(source.relation)?;
                Some(Triple::new(source.head, parent, source.tail))
            }
        }
    }
}

/// Add entailed triples until `target` is reached or the patterns run dry.
///
/// Every inferred triple passes the same consistency check as a sampled
/// one before it is admitted.
pub fn oversample(
    triples: &mut TripleSet,
    schema: &RelationSchema,
    target: usize,
    rng: &mut GenRng,
) -> LoopOutcome {
    let pools: Vec<(Pattern, Vec<RelationId>)> = Pattern::ALL
        .into_iter()
        .map(|p| (p, p.relations(schema)))
        .collect();
    let mut used: BTreeSet<RelationId> = BTreeSet::new();
    let mut guard = StallGuard::new(OVERSAMPLE_ATTEMPTS);

    while triples.len() < target {
        let (pattern, pool) = &pools[rng.below(pools.len())];
        let progress = match rng.choose(pool) {
            Some(&relation) if used.insert(relation) => {
                let added = expand(triples, schema, *pattern, relation, target);
                debug!(?pattern, %relation, added, "oversampled");
                true
            }
            _ => false,
        };
        if let ControlFlow::Break(outcome) = guard.record(progress) {
            return outcome;
        }
    }
    LoopOutcome::Reached
}

fn expand(
    triples: &mut TripleSet,
    schema: &RelationSchema,
    pattern: Pattern,
    relation: RelationId,
    target: usize,
) -> usize {
    let inferred: Vec<Triple> = triples
        .by_relation(relation)
        .filter_map(|t| pattern.infer(schema, t))
        .collect();

    let mut added = 0;
    for triple in inferred {
        if triples.len() >= target {
            break;
        }
        let Some(entailed) = schema.get(triple.relation) else {
            continue;
        };
        if triples.admits(entailed, &triple) && triples.insert(triple) {
            added += 1;
        }
    }
    added
}
