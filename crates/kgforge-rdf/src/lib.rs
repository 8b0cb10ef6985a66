//! Ontology and knowledge graph documents for kgforge.
//!
//! Builds RDF graphs from the schema and KG records and serializes them with
//! Sophia:
//! - Turtle (`ttl`)
//! - N-Triples (`nt`)
//! - RDF/XML (`xml`, written with the `.rdf` extension)
//!
//! All resources live in one namespace, [`SCHEMA_NS`], bound to the `sc`
//! prefix.

pub mod document;
pub mod syntax;

pub use document::{RdfDocument, Statement};
pub use syntax::RdfSyntax;

pub const SCHEMA_NS: &str = "http://kgforge.org/schema/";
pub const SCHEMA_PREFIX: &str = "sc";

pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const OWL_NS: &str = "http://www.w3.org/2002/07/owl#";
pub const DCTERMS_NS: &str = "http://purl.org/dc/terms/";

pub const CC0_LICENSE_IRI: &str = "https://creativecommons.org/publicdomain/zero/1.0/";

#[derive(Debug, thiserror::Error)]
pub enum RdfError {
    #[error("unknown output format `{0}` (expected xml, ttl or nt)")]
    UnknownSyntax(String),

    #[error("failed to serialize {syntax} document: {message}")]
    Serialize { syntax: RdfSyntax, message: String },

    #[error("serializer produced invalid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
