//! Knowledge graph instantiation over a generated schema.
//!
//! Given a [`ClassSchema`](kgforge_schema::ClassSchema) and a
//! [`RelationSchema`](kgforge_schema::RelationSchema), the
//! [`KnowledgeGraphGenerator`] types a population of entities, samples
//! triples that respect every relation's declared semantics, runs the
//! mandatory repair passes and returns an immutable [`KnowledgeGraph`].
//!
//! The consistency guarantees hold over the final triple set:
//!
//! - functional relations have at most one triple per `(head, relation)`
//! - inverse-functional relations have at most one triple per `(relation, tail)`
//! - asymmetric relations never hold both `(h, r, t)` and `(t, r, h)`
//! - irreflexive relations never hold `(h, r, h)`
//! - typed endpoints are never disjoint with the relation's domain/range

pub mod entity;
pub mod generator;
pub mod inference;
pub mod repair;
pub mod triples;
pub mod weights;

pub use entity::{EntityId, EntityTyper, EntityTyping, FastThreshold, TypingParams};
pub use generator::{KgInfo, KgParams, KgStatistics, KnowledgeGraph, KnowledgeGraphGenerator};
pub use repair::RepairReport;
pub use triples::{Triple, TripleSet};
pub use weights::RelationWeights;

use kgforge_schema::{ClassId, RelationId};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KgError {
    #[error("`{name}` must lie in [0, 1], got {value}")]
    RatioOutOfRange { name: &'static str, value: f64 },

    #[error("`avg_multityping` must be at least 1 when multityping is enabled, got {0}")]
    MultitypingBelowOne(f64),

    #[error("`avg_depth_specific_class` must be positive, got {0}")]
    NonPositiveDepth(f64),

    #[error("relation {relation} references class {class} which is not in the class schema")]
    UnknownClass { relation: RelationId, class: ClassId },

    #[error("fast generation thresholds need a replication ratio of at least 1")]
    ZeroFastRatio,
}

pub(crate) fn check_ratio(name: &'static str, value: f64) -> Result<(), KgError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(KgError::RatioOutOfRange { name, value })
    }
}
