//! deseq_report command-line interface

use std::collections::BTreeSet;

use clap::Parser;
use log::{info, LevelFilter};

use deseq_report::cli::{Cli, Commands};
use deseq_report::io::write_atomic;
use deseq_report::prelude::*;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let args: Vec<String> = std::env::args().collect();

    // Find the first non-flag argument (potential subcommand)
    let first_positional = args.iter().skip(1).find(|a| !a.starts_with('-'));
    let subcommands = ["run", "matrix", "lookup", "help"];
    let has_subcommand = first_positional.map_or(false, |a| subcommands.contains(&a.as_str()));

    if !has_subcommand {
        if args.iter().any(|a| a == "-h" || a == "--help") {
            print_help();
        } else if args.iter().any(|a| a == "-V" || a == "--version") {
            println!("deseq_report {}", VERSION);
        } else {
            print_no_args();
        }
        return;
    }

    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Some(Commands::Run {
            expression,
            annotation,
            stats,
            config,
            group_a,
            label_a,
            label_b,
            value_column,
            row_key,
            padj,
            log2fc,
            abundance,
            biotype,
            normalization,
            outdir,
            threads,
        }) => {
            let overrides = RunOverrides {
                group_a,
                label_a,
                label_b,
                value_column,
                row_key,
                padj,
                log2fc,
                abundance,
                biotype,
                normalization,
            };
            run_report(
                &expression,
                &annotation,
                &stats,
                config.as_deref(),
                overrides,
                &outdir,
                threads,
            )
        }
        Some(Commands::Matrix {
            expression,
            value_column,
            row_key,
            output,
        }) => run_matrix(&expression, &value_column, &row_key, &output),
        Some(Commands::Lookup {
            expression,
            annotation,
            gene,
            group_a,
            label_a,
            label_b,
            value_column,
            normalization,
        }) => run_lookup(
            &expression,
            annotation.as_deref(),
            &gene,
            &group_a,
            &label_a,
            &label_b,
            &value_column,
            &normalization,
        ),
        None => {
            print_no_args();
            return;
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// Custom help output
// ---------------------------------------------------------------------------

fn print_no_args() {
    println!("deseq_report v{}", VERSION);
    println!("Run `deseq_report --help` for usage.");
}

fn print_help() {
    println!("deseq_report v{}", VERSION);
    println!("Annotate, filter, rank and export differential expression results");
    println!();
    println!("Usage: deseq_report <COMMAND> [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  run     Build filtered views, rank file and summary for one comparison");
    println!("  matrix  Reshape a long expression table into a gene x sample matrix");
    println!("  lookup  Show one gene's values per sample and group");
    println!();
    println!("Global Options:");
    println!("  -v, --verbose    Enable verbose output");
    println!("  -h, --help       Print help");
    println!("  -V, --version    Print version");
    println!();
    println!("Run `deseq_report <COMMAND> --help` for command-specific options.");
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

/// Command-line values that override a loaded configuration
struct RunOverrides {
    group_a: Vec<String>,
    label_a: Option<String>,
    label_b: Option<String>,
    value_column: Option<String>,
    row_key: Option<String>,
    padj: Option<f64>,
    log2fc: Option<f64>,
    abundance: Option<f64>,
    biotype: Option<String>,
    normalization: Option<String>,
}

impl RunOverrides {
    fn apply(self, mut config: AnalysisConfig) -> Result<AnalysisConfig> {
        if !self.group_a.is_empty() {
            config.group_a_samples = self.group_a.into_iter().collect();
        }
        if let Some(label) = self.label_a {
            config.group_a_label = label;
        }
        if let Some(label) = self.label_b {
            config.group_b_label = label;
        }
        if let Some(column) = self.value_column {
            config.value_column = column;
        }
        if let Some(key) = self.row_key {
            config.row_key = key.parse()?;
        }
        if let Some(padj) = self.padj {
            config.thresholds.padj_cutoff = padj;
        }
        if let Some(lfc) = self.log2fc {
            config.thresholds.log2_cutoff = lfc;
        }
        if let Some(abundance) = self.abundance {
            config.thresholds.abundance_cutoff = abundance;
        }
        if let Some(biotype) = self.biotype {
            config.biotype = biotype;
        }
        if let Some(method) = self.normalization {
            config.normalization = method.parse()?;
        }
        Ok(config)
    }
}

fn run_report(
    expression_path: &str,
    annotation_path: &str,
    stats_path: &str,
    config_path: Option<&str>,
    overrides: RunOverrides,
    outdir: &str,
    threads: usize,
) -> Result<()> {
    if threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .ok();
    }

    let base = match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path);
            AnalysisConfig::from_json_file(path)?
        }
        None => AnalysisConfig::default(),
    };
    let config = overrides.apply(base)?;
    config.validate()?;

    info!("Loading expression table from: {}", expression_path);
    let records = read_expression_records(expression_path, &config.value_column)?;
    info!(
        "  {} records (column '{}')",
        records.len(),
        config.value_column
    );

    info!("Loading annotation from: {}", annotation_path);
    let annotation = read_annotation_table(annotation_path)?;
    info!("  {} annotated genes", annotation.len());

    info!("Loading statistics from: {}", stats_path);
    let engine = PrecomputedEngine::from_path(stats_path)?;
    info!("  {} genes with statistics", engine.n_genes());

    let analysis = run_pipeline(&config, &records, &annotation, &engine)?;

    info!("Writing reports to: {}", outdir);
    write_reports(&analysis, &config, outdir)?;

    print!("{}", analysis.summary(&config));
    Ok(())
}

fn run_matrix(
    expression_path: &str,
    value_column: &str,
    row_key: &str,
    output_path: &str,
) -> Result<()> {
    info!("Loading expression table from: {}", expression_path);
    let records = read_expression_records(expression_path, value_column)?;

    let matrix = MatrixBuilder::new().row_key(row_key.parse()?).build(&records)?;
    info!("  {} genes, {} samples", matrix.n_genes(), matrix.n_samples());

    info!("Writing matrix to: {}", output_path);
    write_atomic(std::path::Path::new(output_path), |w| write_matrix(w, &matrix))?;
    info!("Done!");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_lookup(
    expression_path: &str,
    annotation_path: Option<&str>,
    gene: &str,
    group_a: &[String],
    label_a: &str,
    label_b: &str,
    value_column: &str,
    normalization: &str,
) -> Result<()> {
    let selector: GeneSelector = gene.parse()?;
    let method: NormalizationMethod = normalization.parse()?;

    let records = read_expression_records(expression_path, value_column)?;
    let matrix = MatrixBuilder::new().build(&records)?;
    let annotation = annotation_path.map(read_annotation_table).transpose()?;

    let gene_id = selector.resolve(&matrix, annotation.as_ref())?;
    info!("{} resolved to {}", selector, gene_id);

    let group_a: BTreeSet<String> = group_a.iter().cloned().collect();
    let groups = if group_a.is_empty() {
        None
    } else {
        Some(assign_groups(matrix.sample_ids(), &group_a, label_a, label_b)?)
    };

    let normalized = normalized_values(matrix.values(), method)?;
    let row = matrix.gene_index(&gene_id).ok_or_else(|| ReportError::InvalidParameter {
        reason: format!("Gene identifier '{}' not found", gene_id),
    })?;

    println!("sample\tgroup\t{}\tnormalized", value_column);
    for (j, sample) in matrix.sample_ids().iter().enumerate() {
        let group = groups
            .as_ref()
            .and_then(|g| g.label_of(sample))
            .unwrap_or("NA");
        println!(
            "{}\t{}\t{}\t{}",
            sample,
            group,
            deseq_report::io::format_float(matrix.values()[[row, j]]),
            deseq_report::io::format_float(normalized[[row, j]])
        );
    }
    Ok(())
}
