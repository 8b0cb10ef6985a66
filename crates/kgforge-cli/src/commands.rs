//! The `template`, `schema`, `kg` and `generate` commands.

use crate::config::{ConfigFormat, GeneratorConfig};
use crate::output::{OutputRoot, SchemaFolder};
use crate::report;
use anyhow::{Context, Result};
use colored::Colorize;
use kgforge_kg::{KnowledgeGraph, KnowledgeGraphGenerator};
use kgforge_schema::{
    ClassHierarchyGenerator, ClassSchema, GenRng, PropertyTables, RelationSchema,
    RelationSchemaGenerator,
};
use std::path::{Path, PathBuf};
use tracing::info;

/// Options shared by every generating command.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config: PathBuf,
    pub output_dir: PathBuf,
    pub seed: Option<u64>,
    /// Suppress the summary tables.
    pub quiet: bool,
}

impl RunOptions {
    fn load(&self) -> Result<(GeneratorConfig, GenRng)> {
        let config = GeneratorConfig::load(&self.config)
            .with_context(|| format!("failed to load configuration {}", self.config.display()))?;
        let rng = match self.seed.or(config.seed) {
            Some(seed) => GenRng::seed_from_u64(seed),
            None => GenRng::from_entropy(),
        };
        info!(seed = rng.seed(), "random generator seeded");
        Ok((config, rng))
    }
}

pub fn cmd_template(format: ConfigFormat, out: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(out).with_context(|| format!("failed to create {}", out.display()))?;
    let path = out.join(format.template_file());
    let text = GeneratorConfig::default().render(format)?;
    std::fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))?;
    println!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
    Ok(path)
}

pub fn cmd_schema(options: &RunOptions) -> Result<SchemaFolder> {
    let (config, mut rng) = options.load()?;
    config.validate_schema()?;
    generate_schema(&config, &options.output_dir, &mut rng, options.quiet)
        .map(|(folder, _, _)| folder)
}

pub fn cmd_kg(options: &RunOptions, schema_name: Option<&str>) -> Result<SchemaFolder> {
    let (config, mut rng) = options.load()?;
    config.validate_kg()?;
    let name = schema_name.or(config.schema_name.as_deref());
    let folder = OutputRoot::new(&options.output_dir).open(name)?;
    let (classes, relations) = folder.read_schema()?;
    generate_kg(&config, &folder, &classes, &relations, &mut rng, options.quiet)?;
    Ok(folder)
}

/// Schema and KG in one run, sharing one random generator.
pub fn cmd_generate(options: &RunOptions) -> Result<SchemaFolder> {
    let (config, mut rng) = options.load()?;
    config.validate_schema()?;
    config.validate_kg()?;
    let (folder, classes, relations) =
        generate_schema(&config, &options.output_dir, &mut rng, options.quiet)?;
    generate_kg(&config, &folder, &classes, &relations, &mut rng, options.quiet)?;
    Ok(folder)
}

/// Generate both schema halves, then create the folder and write them.
///
/// Nothing touches the output directory until generation has succeeded.
fn generate_schema(
    config: &GeneratorConfig,
    output_dir: &Path,
    rng: &mut GenRng,
    quiet: bool,
) -> Result<(SchemaFolder, ClassSchema, RelationSchema)> {
    println!(
        "{} schema {}",
        "Generating".green().bold(),
        config.schema_name.as_deref().unwrap_or("(timestamped)").bold()
    );

    let class_params = config.class_params();
    let classes = ClassHierarchyGenerator::new(class_params)?.generate(rng)?;

    let tables = PropertyTables::builtin()?;
    let relation_params = config.relation_params();
    let relations = RelationSchemaGenerator::new(&classes, &tables, relation_params)?.generate(rng)?;

    let folder = OutputRoot::new(output_dir).create(config.schema_name.as_deref())?;
    for path in folder.write_schema(&classes, &relations, config.format)? {
        println!("  {} {}", "→".cyan(), path.display());
    }
    info!(
        folder = %folder.path().display(),
        classes = classes.classes.len(),
        relations = relations.len(),
        "schema written"
    );
    if !quiet {
        report::class_table(&classes.statistics, &class_params).print();
        report::relation_table(&relations.statistics, &relation_params).print();
    }
    Ok((folder, classes, relations))
}

fn generate_kg(
    config: &GeneratorConfig,
    folder: &SchemaFolder,
    classes: &ClassSchema,
    relations: &RelationSchema,
    rng: &mut GenRng,
    quiet: bool,
) -> Result<KnowledgeGraph> {
    println!(
        "{} knowledge graph for {}",
        "Generating".green().bold(),
        folder.name().bold()
    );

    let kg = KnowledgeGraphGenerator::new(classes, relations, config.kg_params())?.generate(rng);

    for path in folder.write_kg(classes, relations, &kg, config.format)? {
        println!("  {} {}", "→".cyan(), path.display());
    }
    info!(folder = %folder.path().display(), triples = kg.triples.len(), "knowledge graph written");
    if !kg.info.statistics.sampling.is_reached() {
        println!(
            "  {} sampling stopped early with {} triples",
            "→".yellow(),
            kg.info.statistics.num_triples
        );
    }
    if !quiet {
        report::kg_table(&kg.info).print();
    }
    Ok(kg)
}
