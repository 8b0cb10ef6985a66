//! Schema generation for synthetic knowledge graphs.
//!
//! This crate builds the two schema records that every later stage consumes:
//!
//! - a [`ClassSchema`]: a single-inheritance class taxonomy rooted at
//!   `owl:Thing`, layered by depth, with a disjointness relation that is
//!   propagated to descendants
//! - a [`RelationSchema`]: relations carrying logically admissible property
//!   flags, domain/range profiles, inverse-of pairs and subproperty links
//!
//! Both records serialize to JSON (`class_info.json`, `relation_info.json`)
//! and are the interchange format between schema generation and knowledge
//! graph generation.
//!
//! All randomness flows through one [`GenRng`], so a fixed seed reproduces a
//! run exactly.

pub mod budget;
pub mod class_hierarchy;
pub mod ids;
pub mod properties;
pub mod random;
pub mod relation_schema;

pub use budget::{LoopOutcome, StallGuard};
pub use class_hierarchy::{
    ClassHierarchyGenerator, ClassHierarchyParams, ClassSchema, ClassStatistics, DisjointPair,
};
pub use ids::{canonical_pair, ClassId, IdParseError, RelationId};
pub use properties::{PropertySet, PropertyTables, RelationProperty};
pub use random::GenRng;
pub use relation_schema::{
    ProfileSide, PropertyTargets, Relation, RelationSchema, RelationSchemaGenerator,
    RelationSchemaParams, RelationStatistics,
};

/// Round a statistic to two decimals, the precision of every info record.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("`{name}` must lie in [0, 1], got {value}")]
    RatioOutOfRange { name: &'static str, value: f64 },

    #[error("`max_hierarchy_depth` must be at least 1")]
    ZeroDepth,

    #[error("`num_classes` ({num_classes}) must be at least `max_hierarchy_depth` ({max_depth})")]
    TooFewClasses { num_classes: u32, max_depth: u32 },

    #[error("`avg_class_depth` ({avg_depth}) must be below `max_hierarchy_depth` ({max_depth})")]
    AverageDepthTooLarge { avg_depth: f64, max_depth: u32 },

    #[error("`{first}` + `{second}` must not exceed 1 (got {sum})")]
    ConflictingRatios {
        first: &'static str,
        second: &'static str,
        sum: f64,
    },

    #[error(
        "subproperty chains cannot be combined with both functional and inverse-functional relations"
    )]
    SubpropertyWithFunctional,

    #[error(
        "disjointness target {target} needs {required} disjoint class pairs but only {available} exist"
    )]
    UnreachableDisjointness {
        target: f64,
        required: usize,
        available: usize,
    },

    #[error("relation profiling needs at least one class")]
    EmptyClassSchema,

    #[error("invalid property table: {0}")]
    PropertyTable(String),
}

/// Reject a ratio parameter outside `[0, 1]` (NaN included).
pub(crate) fn check_ratio(name: &'static str, value: f64) -> Result<(), SchemaError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SchemaError::RatioOutOfRange { name, value })
    }
}
