//! deseq_report: differential expression reporting in Rust
//!
//! Turns a long-format expression table, a two-group sample split, an
//! external per-gene statistics table and a gene annotation table into
//! filtered, annotated and ranked gene lists.
//!
//! # Example
//!
//! ```ignore
//! use deseq_report::prelude::*;
//!
//! let records = read_expression_records("expression.tsv", &config.value_column)?;
//! let annotation = read_annotation_table("annotation.tsv")?;
//! let engine = PrecomputedEngine::from_path("deseq2_results.tsv")?;
//!
//! let analysis = run_pipeline(&config, &records, &annotation, &engine)?;
//! let paths = write_reports(&analysis, &config, "results")?;
//! println!("{}", analysis.summary(&config));
//! ```

use std::path::{Path, PathBuf};

pub mod annotation;
pub mod cli;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod filter;
pub mod io;
pub mod normalization;
pub mod rank;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::annotation::{join_annotations, AnnotatedResult, AnnotationTable, GeneAnnotation};
    pub use crate::config::{AnalysisConfig, Thresholds};
    pub use crate::data::{
        assign_groups, ExpressionMatrix, ExpressionRecord, GeneSelector, Group, GroupAssignment,
        MatrixBuilder, RowKey,
    };
    pub use crate::engine::{DeEngine, GeneStatResult, PrecomputedEngine};
    pub use crate::error::{ReportError, Result};
    pub use crate::filter::{CutoffCount, FilterSummary, FilteredViews, ResultFilter, ViewKind};
    pub use crate::io::{
        read_annotation_table, read_expression_records, read_stats_table, write_matrix,
        ReportWriter,
    };
    pub use crate::normalization::{average_cpm, cpm, normalized_values, NormalizationMethod};
    pub use crate::rank::{rank_entries, RankEntry};
    pub use crate::{run_pipeline, write_reports, Analysis};
}

use prelude::*;

/// Everything computed for one comparison
///
/// Views and summary are projections of `results` and are recomputed on
/// demand rather than stored.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub matrix: ExpressionMatrix,
    pub groups: GroupAssignment,
    pub results: Vec<AnnotatedResult>,
    pub ranks: Vec<RankEntry>,
}

impl Analysis {
    /// The four filtered views under `config`'s thresholds
    pub fn views(&self, config: &AnalysisConfig) -> FilteredViews<'_> {
        ResultFilter::new(config.thresholds).apply(&self.results)
    }

    pub fn summary(&self, config: &AnalysisConfig) -> FilterSummary {
        self.views(config).summary()
    }
}

/// Run the complete reporting pipeline for one comparison
///
/// matrix -> groups -> engine -> annotation join -> rank list.
/// Each stage validates its input before the next one runs.
pub fn run_pipeline(
    config: &AnalysisConfig,
    records: &[ExpressionRecord],
    annotation: &AnnotationTable,
    engine: &dyn DeEngine,
) -> Result<Analysis> {
    config.validate()?;

    let matrix = MatrixBuilder::new().row_key(config.row_key).build(records)?;
    log::info!(
        "Built matrix from {} records: {} genes, {} samples",
        records.len(),
        matrix.n_genes(),
        matrix.n_samples()
    );

    let groups = assign_groups(
        matrix.sample_ids(),
        &config.group_a_samples,
        &config.group_a_label,
        &config.group_b_label,
    )?;
    log::info!(
        "Comparing {} ({} samples) vs {} ({} samples)",
        groups.label_a(),
        groups.group_a().len(),
        groups.label_b(),
        groups.group_b().len()
    );

    log::info!("Collecting statistics from {} engine", engine.name());
    let stats = engine.test(&matrix, &groups)?;
    if stats.len() != matrix.n_genes() {
        return Err(ReportError::DimensionMismatch {
            expected: format!("{} gene results", matrix.n_genes()),
            got: format!("{} gene results", stats.len()),
        });
    }

    let results = join_annotations(&stats, annotation, &matrix, config.normalization)?;
    let ranks = rank_entries(&results, &config.biotype);
    log::info!("{} {} genes in rank list", ranks.len(), config.biotype);

    Ok(Analysis {
        matrix,
        groups,
        results,
        ranks,
    })
}

/// Write every artifact of `analysis` into `outdir`
pub fn write_reports<P: AsRef<Path>>(
    analysis: &Analysis,
    config: &AnalysisConfig,
    outdir: P,
) -> Result<Vec<PathBuf>> {
    let views = analysis.views(config);
    let summary = views.summary();
    ReportWriter::new(outdir, &config.comparison_name()).write_all(
        &views,
        analysis.matrix.sample_ids(),
        &analysis.ranks,
        &summary,
        &config.thresholds,
    )
}
