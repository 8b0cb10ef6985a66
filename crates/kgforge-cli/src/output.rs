//! Output folders: `<output-dir>/<schema_name>/`.

use anyhow::{anyhow, Context, Result};
use kgforge_kg::KnowledgeGraph;
use kgforge_rdf::{RdfDocument, RdfSyntax};
use kgforge_schema::{ClassSchema, RelationSchema};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

pub const CLASS_INFO_FILE: &str = "class_info.json";
pub const RELATION_INFO_FILE: &str = "relation_info.json";
pub const KG_INFO_FILE: &str = "kg_info.json";
pub const KG_FILE: &str = "kg.json";
pub const SCHEMA_STEM: &str = "schema";
pub const FULL_GRAPH_STEM: &str = "full_graph";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

#[derive(Debug, Clone)]
pub struct OutputRoot {
    root: PathBuf,
}

impl OutputRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create (or reuse) the folder for a schema run. Without a name the
    /// folder is named after the current local time.
    pub fn create(&self, name: Option<&str>) -> Result<SchemaFolder> {
        let name = match name {
            Some(name) => name.to_string(),
            None => chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
        };
        let path = self.root.join(&name);
        fs::create_dir_all(&path)
            .with_context(|| format!("failed to create output folder {}", path.display()))?;
        Ok(SchemaFolder { name, path })
    }

    /// An existing schema folder, or the most recently modified one when no
    /// name is given.
    pub fn open(&self, name: Option<&str>) -> Result<SchemaFolder> {
        let name = match name {
            Some(name) => name.to_string(),
            None => self.most_recent()?.ok_or_else(|| {
                anyhow!(
                    "no schema folder under {}; run `kgforge schema` first",
                    self.root.display()
                )
            })?,
        };
        let path = self.root.join(&name);
        if !path.is_dir() {
            return Err(anyhow!("schema folder {} does not exist", path.display()));
        }
        Ok(SchemaFolder { name, path })
    }

    pub fn most_recent(&self) -> Result<Option<String>> {
        if !self.root.is_dir() {
            return Ok(None);
        }
        let mut newest: Option<(SystemTime, String)> = None;
        for entry in fs::read_dir(&self.root)
            .with_context(|| format!("failed to list {}", self.root.display()))?
        {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if !metadata.is_dir() {
                continue;
            }
            let modified = metadata.modified()?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if newest.as_ref().map_or(true, |best| (modified, &name) > (best.0, &best.1)) {
                newest = Some((modified, name));
            }
        }
        Ok(newest.map(|(_, name)| name))
    }
}

#[derive(Debug, Clone)]
pub struct SchemaFolder {
    name: String,
    path: PathBuf,
}

impl SchemaFolder {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `class_info.json`, `relation_info.json` and `schema.<ext>`.
    pub fn write_schema(
        &self,
        classes: &ClassSchema,
        relations: &RelationSchema,
        syntax: RdfSyntax,
    ) -> Result<Vec<PathBuf>> {
        let class_info = self.write_text(CLASS_INFO_FILE, &classes.to_json_pretty()?)?;
        let relation_info = self.write_text(RELATION_INFO_FILE, &relations.to_json_pretty()?)?;
        let document = RdfDocument::schema(classes, relations);
        let schema = syntax
            .write(&document, &self.path, SCHEMA_STEM)
            .with_context(|| format!("failed to write the {syntax} schema document"))?;
        Ok(vec![class_info, relation_info, schema])
    }

    pub fn read_schema(&self) -> Result<(ClassSchema, RelationSchema)> {
        let classes = ClassSchema::from_json(&self.read_text(CLASS_INFO_FILE)?)
            .with_context(|| format!("malformed {CLASS_INFO_FILE} in {}", self.path.display()))?;
        let relations = RelationSchema::from_json(&self.read_text(RELATION_INFO_FILE)?)
            .with_context(|| format!("malformed {RELATION_INFO_FILE} in {}", self.path.display()))?;
        Ok((classes, relations))
    }

    /// `kg_info.json`, `kg.json` and `full_graph.<ext>`.
    pub fn write_kg(
        &self,
        classes: &ClassSchema,
        relations: &RelationSchema,
        kg: &KnowledgeGraph,
        syntax: RdfSyntax,
    ) -> Result<Vec<PathBuf>> {
        let info = self.write_text(KG_INFO_FILE, &serde_json::to_string_pretty(&kg.info)?)?;
        let graph = self.write_text(KG_FILE, &kg.to_json_pretty()?)?;
        let document = RdfDocument::full_graph(classes, relations, kg);
        let full_graph = syntax
            .write(&document, &self.path, FULL_GRAPH_STEM)
            .with_context(|| format!("failed to write the {syntax} full graph document"))?;
        Ok(vec![info, graph, full_graph])
    }

    fn write_text(&self, file: &str, text: &str) -> Result<PathBuf> {
        let path = self.path.join(file);
        fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))?;
        debug!(path = %path.display(), bytes = text.len(), "wrote file");
        Ok(path)
    }

    fn read_text(&self, file: &str) -> Result<String> {
        let path = self.path.join(file);
        fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_folders_are_created_and_reopened() {
        let dir = tempfile::tempdir().unwrap();
        let root = OutputRoot::new(dir.path());
        let folder = root.create(Some("demo")).unwrap();
        assert_eq!(folder.name(), "demo");
        assert!(dir.path().join("demo").is_dir());

        let reopened = root.open(Some("demo")).unwrap();
        assert_eq!(reopened.path(), folder.path());
        assert!(root.open(Some("missing")).is_err());
    }

    #[test]
    fn unnamed_folders_are_timestamped() {
        let dir = tempfile::tempdir().unwrap();
        let folder = OutputRoot::new(dir.path()).create(None).unwrap();
        let name = folder.name();
        assert_eq!(name.len(), "2024-01-31_12-00-00".len());
        assert!(chrono::NaiveDateTime::parse_from_str(name, TIMESTAMP_FORMAT).is_ok());
    }

    #[test]
    fn most_recent_ignores_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = OutputRoot::new(dir.path());
        assert_eq!(root.most_recent().unwrap(), None);
        assert!(root.open(None).is_err());

        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        root.create(Some("only")).unwrap();
        assert_eq!(root.most_recent().unwrap().as_deref(), Some("only"));
        assert_eq!(root.open(None).unwrap().name(), "only");
    }

    #[test]
    fn missing_root_has_no_recent_folder() {
        let dir = tempfile::tempdir().unwrap();
        let root = OutputRoot::new(dir.path().join("absent"));
        assert_eq!(root.most_recent().unwrap(), None);
    }
}
