//! Run configuration.
//!
//! One flat record holds every knob of a run. It is read from JSON or YAML
//! (chosen by file extension), missing keys fall back to the template
//! defaults, and the typed parameter structs of the schema and KG crates are
//! derived from it.

use kgforge_kg::{KgError, KgParams};
use kgforge_rdf::RdfSyntax;
use kgforge_schema::{
    ClassHierarchyParams, ProfileSide, PropertyTargets, RelationSchemaParams, SchemaError,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unsupported configuration file `{0}` (expected .json, .yaml or .yml)")]
    UnsupportedExtension(PathBuf),

    #[error("failed to read `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Kg(#[from] KgError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ConfigFormat {
    Json,
    #[value(alias = "yml")]
    Yaml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(ConfigFormat::Json),
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            _ => Err(ConfigError::UnsupportedExtension(path.to_path_buf())),
        }
    }

    /// File name used by `kgforge template`.
    pub fn template_file(self) -> &'static str {
        match self {
            ConfigFormat::Json => "template.json",
            ConfigFormat::Yaml => "template.yml",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Output folder name; a timestamp when absent.
    pub schema_name: Option<String>,
    pub format: RdfSyntax,
    /// Replay seed; drawn from OS entropy when absent.
    pub seed: Option<u64>,

    pub num_classes: u32,
    pub max_hierarchy_depth: u32,
    pub avg_class_depth: f64,
    pub class_inheritance_ratio: f64,
    pub avg_disjointness: f64,

    pub num_relations: u32,
    pub relation_specificity: f64,
    pub prop_profiled_relations: f64,
    pub profile_side: ProfileSide,
    pub prop_symmetric_relations: f64,
    pub prop_inverse_relations: f64,
    pub prop_transitive_relations: f64,
    pub prop_asymmetric_relations: f64,
    pub prop_reflexive_relations: f64,
    pub prop_irreflexive_relations: f64,
    pub prop_functional_relations: f64,
    pub prop_inverse_functional_relations: f64,
    pub prop_subproperties: f64,

    pub num_entities: u32,
    pub num_triples: u32,
    pub relation_balance_ratio: f64,
    pub prop_untyped_entities: f64,
    pub avg_depth_specific_class: f64,
    pub multityping: bool,
    pub avg_multityping: f64,
    pub fast_gen: bool,
    pub oversample: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let kg = KgParams::default();
        Self {
            schema_name: None,
            format: RdfSyntax::RdfXml,
            seed: None,

            num_classes: 50,
            max_hierarchy_depth: 4,
            avg_class_depth: 2.5,
            class_inheritance_ratio: 2.5,
            avg_disjointness: 0.3,

            num_relations: 50,
            relation_specificity: 2.5,
            prop_profiled_relations: 0.9,
            profile_side: ProfileSide::Partial,
            prop_symmetric_relations: 0.3,
            prop_inverse_relations: 0.3,
            prop_transitive_relations: 0.1,
            prop_asymmetric_relations: 0.5,
            prop_reflexive_relations: 0.3,
            prop_irreflexive_relations: 0.3,
            prop_functional_relations: 0.15,
            prop_inverse_functional_relations: 0.0,
            prop_subproperties: 0.3,

            num_entities: kg.num_entities,
            num_triples: kg.num_triples,
            relation_balance_ratio: kg.relation_balance_ratio,
            prop_untyped_entities: kg.prop_untyped_entities,
            avg_depth_specific_class: kg.avg_depth_specific_class,
            multityping: kg.multityping,
            avg_multityping: kg.avg_multityping,
            fast_gen: kg.fast_gen,
            oversample: kg.oversample,
        }
    }
}

impl GeneratorConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let format = ConfigFormat::from_path(path)?;
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, format)
    }

    pub fn parse(text: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        let mut config: Self = match format {
            ConfigFormat::Json => serde_json::from_str(text)?,
            ConfigFormat::Yaml => serde_yaml::from_str(text)?,
        };
        if !config.multityping {
            config.avg_multityping = 1.0;
        }
        Ok(config)
    }

    pub fn render(&self, format: ConfigFormat) -> Result<String, ConfigError> {
        Ok(match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Yaml => serde_yaml::to_string(self)?,
        })
    }

    pub fn class_params(&self) -> ClassHierarchyParams {
        ClassHierarchyParams {
            num_classes: self.num_classes,
            max_depth: self.max_hierarchy_depth,
            avg_depth: self.avg_class_depth,
            inheritance_ratio: self.class_inheritance_ratio,
            avg_disjointness: self.avg_disjointness,
        }
    }

    pub fn relation_params(&self) -> RelationSchemaParams {
        RelationSchemaParams {
            num_relations: self.num_relations,
            relation_specificity: self.relation_specificity,
            profiled_ratio: self.prop_profiled_relations,
            profile_side: self.profile_side,
            targets: PropertyTargets {
                reflexive: self.prop_reflexive_relations,
                irreflexive: self.prop_irreflexive_relations,
                symmetric: self.prop_symmetric_relations,
                asymmetric: self.prop_asymmetric_relations,
                transitive: self.prop_transitive_relations,
                functional: self.prop_functional_relations,
                inverse_functional: self.prop_inverse_functional_relations,
                inverse_of: self.prop_inverse_relations,
                subproperty: self.prop_subproperties,
            },
        }
    }

    pub fn kg_params(&self) -> KgParams {
        KgParams {
            num_entities: self.num_entities,
            num_triples: self.num_triples,
            relation_balance_ratio: self.relation_balance_ratio,
            prop_untyped_entities: self.prop_untyped_entities,
            avg_depth_specific_class: self.avg_depth_specific_class,
            multityping: self.multityping,
            avg_multityping: self.avg_multityping,
            fast_gen: self.fast_gen,
            oversample: self.oversample,
            ..KgParams::default()
        }
    }

    /// Fatal schema misconfigurations, reported before any generation work.
    pub fn validate_schema(&self) -> Result<(), ConfigError> {
        self.class_params().validate()?;
        self.relation_params().validate()?;
        Ok(())
    }

    pub fn validate_kg(&self) -> Result<(), ConfigError> {
        self.kg_params().validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("a/run.json")).unwrap(), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("run.yml")).unwrap(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("run.yaml")).unwrap(), ConfigFormat::Yaml);
        assert!(matches!(
            ConfigFormat::from_path(Path::new("run.toml")),
            Err(ConfigError::UnsupportedExtension(_))
        ));
    }

    #[test]
    fn missing_keys_take_template_defaults() {
        let config = GeneratorConfig::parse(r#"{"num_classes": 12, "format": "ttl"}"#, ConfigFormat::Json).unwrap();
        assert_eq!(config.num_classes, 12);
        assert_eq!(config.format, RdfSyntax::Turtle);
        assert_eq!(config.max_hierarchy_depth, 4);
        assert_eq!(config.num_triples, 2000);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn yaml_keys_map_onto_parameters() {
        let text = "schema_name: demo\nseed: 7\nprofile_side: both\nprop_inverse_functional_relations: 0.1\nprop_subproperties: 0.0\n";
        let config = GeneratorConfig::parse(text, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.schema_name.as_deref(), Some("demo"));
        assert_eq!(config.seed, Some(7));
        let relations = config.relation_params();
        assert_eq!(relations.profile_side, ProfileSide::Both);
        assert_eq!(relations.targets.inverse_functional, 0.1);
        config.validate_schema().unwrap();
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(GeneratorConfig::parse("num_clases: 3\n", ConfigFormat::Yaml).is_err());
    }

    #[test]
    fn disabling_multityping_forces_single_types() {
        let config =
            GeneratorConfig::parse(r#"{"multityping": false, "avg_multityping": 3.0}"#, ConfigFormat::Json).unwrap();
        assert_eq!(config.avg_multityping, 1.0);
        assert_eq!(config.kg_params().avg_multityping, 1.0);
    }

    #[test]
    fn fatal_combinations_are_reported() {
        let mut config = GeneratorConfig {
            prop_symmetric_relations: 0.6,
            prop_asymmetric_relations: 0.5,
            ..GeneratorConfig::default()
        };
        assert!(matches!(
            config.validate_schema(),
            Err(ConfigError::Schema(SchemaError::ConflictingRatios { .. }))
        ));

        config = GeneratorConfig {
            avg_class_depth: 4.0,
            ..GeneratorConfig::default()
        };
        assert!(matches!(
            config.validate_schema(),
            Err(ConfigError::Schema(SchemaError::AverageDepthTooLarge { .. }))
        ));

        config = GeneratorConfig {
            prop_subproperties: 0.2,
            prop_functional_relations: 0.1,
            prop_inverse_functional_relations: 0.1,
            ..GeneratorConfig::default()
        };
        assert!(matches!(
            config.validate_schema(),
            Err(ConfigError::Schema(SchemaError::SubpropertyWithFunctional))
        ));

        config = GeneratorConfig {
            prop_untyped_entities: 1.5,
            ..GeneratorConfig::default()
        };
        assert!(config.validate_kg().is_err());
    }

    #[test]
    fn templates_parse_back_to_the_defaults() {
        let defaults = GeneratorConfig::default();
        defaults.validate_schema().unwrap();
        defaults.validate_kg().unwrap();
        for format in [ConfigFormat::Json, ConfigFormat::Yaml] {
            let text = defaults.render(format).unwrap();
            assert_eq!(GeneratorConfig::parse(&text, format).unwrap(), defaults);
        }
    }
}
