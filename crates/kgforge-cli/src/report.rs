//! Console summaries: observed statistics next to the requested values.

use colored::Colorize;
use kgforge_kg::KgInfo;
use kgforge_schema::{ClassHierarchyParams, ClassStatistics, LoopOutcome, RelationSchemaParams, RelationStatistics};

#[derive(Debug, Default)]
pub struct Table {
    title: String,
    rows: Vec<[String; 3]>,
}

impl Table {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, metric: &str, value: impl ToString, specified: impl ToString) -> Self {
        self.rows
            .push([metric.to_string(), value.to_string(), specified.to_string()]);
        self
    }

    /// Rows with padded columns, header first.
    pub fn lines(&self) -> Vec<String> {
        let header = ["Metric".to_string(), "Value".to_string(), "Specified".to_string()];
        let mut widths = [0usize; 3];
        for row in std::iter::once(&header).chain(&self.rows) {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }
        std::iter::once(&header)
            .chain(&self.rows)
            .map(|[metric, value, specified]| {
                format!(
                    "{metric:<w0$}  {value:>w1$}  {specified:>w2$}",
                    w0 = widths[0],
                    w1 = widths[1],
                    w2 = widths[2]
                )
                .trim_end()
                .to_string()
            })
            .collect()
    }

    pub fn print(&self) {
        println!("{}", self.title.green().bold());
        for (i, line) in self.lines().into_iter().enumerate() {
            if i == 0 {
                println!("  {}", line.bold());
            } else {
                println!("  {line}");
            }
        }
        println!();
    }
}

pub fn class_table(stats: &ClassStatistics, params: &ClassHierarchyParams) -> Table {
    Table::new("Class hierarchy")
        .row("num_classes", stats.num_classes, params.num_classes)
        .row("hierarchy_depth", stats.hierarchy_depth, params.max_depth)
        .row("avg_class_depth", stats.avg_class_depth, params.avg_depth)
        .row("class_inheritance_ratio", stats.class_inheritance_ratio, params.inheritance_ratio)
        .row("avg_class_disjointness", stats.avg_class_disjointness, params.avg_disjointness)
}

pub fn relation_table(stats: &RelationStatistics, params: &RelationSchemaParams) -> Table {
    let targets = &params.targets;
    let inverse_target = match stats.inverseof_target_relaxed_to {
        Some(relaxed) => format!("{} (relaxed to {relaxed})", targets.inverse_of),
        None => targets.inverse_of.to_string(),
    };
    Table::new("Relations")
        .row("num_relations", stats.num_relations, params.num_relations)
        .row("prop_reflexive", stats.prop_reflexive, targets.reflexive)
        .row("prop_irreflexive", stats.prop_irreflexive, targets.irreflexive)
        .row("prop_functional", stats.prop_functional, targets.functional)
        .row("prop_inversefunctional", stats.prop_inversefunctional, targets.inverse_functional)
        .row("prop_symmetric", stats.prop_symmetric, targets.symmetric)
        .row("prop_asymmetric", stats.prop_asymmetric, targets.asymmetric)
        .row("prop_transitive", stats.prop_transitive, targets.transitive)
        .row("prop_inverseof", stats.prop_inverseof, inverse_target)
        .row("prop_subpropertyof", stats.prop_subpropertyof, targets.subproperty)
        .row("prop_profiled_relations", stats.prop_profiled_relations, params.profiled_ratio)
        .row("relation_specificity", stats.relation_specificity, params.relation_specificity)
}

fn outcome(outcome: LoopOutcome) -> String {
    match outcome {
        LoopOutcome::Reached => "reached".to_string(),
        LoopOutcome::Stalled { attempts } => format!("stalled after {attempts} attempts"),
    }
}

pub fn kg_table(info: &KgInfo) -> Table {
    let params = &info.user_parameters;
    let stats = &info.statistics;
    let mut table = Table::new("Knowledge graph")
        .row("num_entities", stats.num_entities, params.num_entities)
        .row("num_instantiated_relations", stats.num_instantiated_relations, "-")
        .row("num_triples", stats.num_triples, params.num_triples)
        .row("prop_untyped_entities", stats.prop_untyped_entities, params.prop_untyped_entities)
        .row("avg_depth_specific_class", stats.avg_depth_specific_class, params.avg_depth_specific_class)
        .row("avg_multityping", stats.avg_multityping, params.avg_multityping)
        .row("sampling", outcome(stats.sampling), "-");
    if let Some(oversampling) = stats.oversampling {
        table = table.row("oversampling", outcome(oversampling), "-");
    }
    table.row("repaired_triples", stats.repairs.total(), "-")
}
