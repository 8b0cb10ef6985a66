//! Document syntaxes and their Sophia serializers.

use crate::document::RdfDocument;
use crate::{RdfError, DCTERMS_NS, OWL_NS, RDFS_NS, RDF_NS, SCHEMA_NS, SCHEMA_PREFIX};
use serde::{Deserialize, Serialize};
use sophia::api::prefix::Prefix;
use sophia::api::serializer::TripleSerializer;
use sophia::iri::Iri;
use sophia::turtle::serializer::nt::NtSerializer;
use sophia::turtle::serializer::turtle::{TurtleConfig, TurtleSerializer};
use sophia::xml::serializer::RdfXmlSerializer;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RdfSyntax {
    #[default]
    #[serde(rename = "xml")]
    RdfXml,
    #[serde(rename = "ttl")]
    Turtle,
    #[serde(rename = "nt")]
    NTriples,
}

impl RdfSyntax {
    /// File extension for documents in this syntax.
    pub fn extension(self) -> &'static str {
        match self {
            RdfSyntax::RdfXml => "rdf",
            RdfSyntax::Turtle => "ttl",
            RdfSyntax::NTriples => "nt",
        }
    }

    /// `<dir>/<stem>.<extension>`.
    pub fn file_in(self, dir: &Path, stem: &str) -> PathBuf {
        dir.join(format!("{stem}.{}", self.extension()))
    }

    pub fn serialize(self, doc: &RdfDocument) -> Result<String, RdfError> {
        let graph: Vec<[Iri<String>; 3]> = doc
            .iter()
            .map(|[s, p, o]| {
                [
                    Iri::new_unchecked(s.clone()),
                    Iri::new_unchecked(p.clone()),
                    Iri::new_unchecked(o.clone()),
                ]
            })
            .collect();

        let mut buf: Vec<u8> = Vec::new();
        let result = match self {
            RdfSyntax::NTriples => NtSerializer::new(&mut buf)
                .serialize_graph(&graph)
                .map(|_| ())
                .map_err(|e| e.to_string()),
            RdfSyntax::Turtle => {
                let config = TurtleConfig::new()
                    .with_pretty(true)
                    .with_own_prefix_map(prefix_map());
                TurtleSerializer::new_with_config(&mut buf, config)
                    .serialize_graph(&graph)
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            }
            RdfSyntax::RdfXml => RdfXmlSerializer::new(&mut buf)
                .serialize_graph(&graph)
                .map(|_| ())
                .map_err(|e| e.to_string()),
        };
        result.map_err(|message| RdfError::Serialize {
            syntax: self,
            message,
        })?;
        Ok(String::from_utf8(buf)?)
    }

    /// Serialize `doc` to `<dir>/<stem>.<extension>` and return the path.
    pub fn write(self, doc: &RdfDocument, dir: &Path, stem: &str) -> Result<PathBuf, RdfError> {
        let path = self.file_in(dir, stem);
        std::fs::write(&path, self.serialize(doc)?)?;
        debug!(path = %path.display(), statements = doc.len(), "wrote RDF document");
        Ok(path)
    }
}

fn prefix_map() -> Vec<(Prefix<Box<str>>, Iri<Box<str>>)> {
    [
        ("rdf", RDF_NS),
        ("rdfs", RDFS_NS),
        ("owl", OWL_NS),
        ("dcterms", DCTERMS_NS),
        (SCHEMA_PREFIX, SCHEMA_NS),
    ]
    .into_iter()
    .map(|(prefix, ns)| (Prefix::new_unchecked(Box::from(prefix)), Iri::new_unchecked(Box::from(ns))))
    .collect()
}

impl fmt::Display for RdfSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RdfSyntax::RdfXml => "xml",
            RdfSyntax::Turtle => "ttl",
            RdfSyntax::NTriples => "nt",
        })
    }
}

impl FromStr for RdfSyntax {
    type Err = RdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xml" | "rdf" => Ok(RdfSyntax::RdfXml),
            "ttl" | "turtle" => Ok(RdfSyntax::Turtle),
            "nt" | "ntriples" | "n-triples" => Ok(RdfSyntax::NTriples),
            other => Err(RdfError::UnknownSyntax(other.to_string())),
        }
    }
}
