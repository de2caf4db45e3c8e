//! Command-line interface for deseq_report

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "deseq_report")]
#[command(version)]
#[command(about = "Annotate, filter, rank and export differential expression results")]
#[command(disable_help_flag = true)]
#[command(disable_version_flag = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build reports for one two-group comparison
    #[command(
        about = "Build reports for one two-group comparison",
        long_about = "Build reports for one two-group comparison\n\n\
            Reshapes the long expression table into a gene x sample matrix, splits\n\
            samples into group A (listed) and group B (the rest), joins the external\n\
            statistics with gene annotation and average CPM, then writes the\n\
            padj/log2fc/CPM filtered views, the full table, a rank file and a summary.",
        after_long_help = "\
Examples:
  # Knockout vs wild type, default cutoffs
  deseq_report run -e expression.tsv -a annotation.tsv -s deseq2_results.tsv \\
    --group-a ko1,ko2,ko3 --label-a KO --label-b WT -o results

  # Stricter cutoffs, thresholds and groups from a JSON config
  deseq_report run -e expression.tsv -a annotation.tsv -s deseq2_results.tsv \\
    --config ko_vs_wt.json --padj 0.01 --log2fc 2"
    )]
    Run {
        /// Long-format expression table
        #[arg(short, long,
            long_help = "Long-format expression table (tab or comma delimited).\n\
                One row per (gene, sample) with columns gene_id, gene_name,\n\
                sample and the value column named by --value-column.")]
        expression: String,

        /// Gene annotation table
        #[arg(short, long,
            long_help = "Gene annotation table with columns gene_id (or ensembl_gene_id),\n\
                a display name (gene_name / external_gene_name) and a biotype\n\
                (biotype / gene_biotype). Genes without an entry are kept.")]
        annotation: String,

        /// Per-gene statistics from the DE engine
        #[arg(short, long,
            long_help = "Per-gene statistics for the group A vs group B contrast.\n\
                Required columns: gene_id, log2FoldChange, pvalue, padj.\n\
                NA, NaN and empty fields are treated as undefined.")]
        stats: String,

        /// JSON configuration file
        #[arg(short, long,
            long_help = "JSON file with any AnalysisConfig fields (group labels, group_a_samples,\n\
                thresholds, value_column, row_key, biotype, normalization).\n\
                Command-line flags override values from the file.")]
        config: Option<String>,

        /// Samples in group A (repeatable or comma-separated)
        #[arg(long, value_name = "SAMPLE", value_delimiter = ',')]
        group_a: Vec<String>,

        /// Label of group A
        #[arg(long)]
        label_a: Option<String>,

        /// Label of group B
        #[arg(long)]
        label_b: Option<String>,

        /// Expression column used for the matrix [default: count]
        #[arg(long)]
        value_column: Option<String>,

        /// Row key: gene-id or gene-name [default: gene-id]
        #[arg(long)]
        row_key: Option<String>,

        /// Adjusted p-value cutoff (strict <) [default: 0.05]
        #[arg(long)]
        padj: Option<f64>,

        /// Absolute log2 fold-change cutoff (strict >) [default: 1]
        #[arg(long)]
        log2fc: Option<f64>,

        /// Average CPM cutoff (strict >) [default: 1]
        #[arg(long)]
        abundance: Option<f64>,

        /// Biotype kept in the rank file [default: protein_coding]
        #[arg(long)]
        biotype: Option<String>,

        /// Per-sample normalization: ratio, poscounts or cpm [default: ratio]
        #[arg(long)]
        normalization: Option<String>,

        /// Output directory [default: .]
        #[arg(short, long, default_value = ".")]
        outdir: String,

        /// Number of threads (0 = auto) [default: 0]
        #[arg(short = 't', long, default_value = "0")]
        threads: usize,
    },

    /// Reshape a long expression table into a gene x sample matrix
    #[command(
        long_about = "Reshape a long expression table into a wide gene x sample matrix.\n\n\
            Fails if any (gene, sample) cell is missing or has conflicting values.",
        after_long_help = "\
Examples:
  deseq_report matrix -e expression.tsv --value-column count -o counts.tsv"
    )]
    Matrix {
        /// Long-format expression table
        #[arg(short, long)]
        expression: String,

        /// Expression column used for the matrix
        #[arg(long, default_value = "count")]
        value_column: String,

        /// Row key: gene-id or gene-name
        #[arg(long, default_value = "gene-id")]
        row_key: String,

        /// Output file path
        #[arg(short, long)]
        output: String,
    },

    /// Show one gene's values per sample and group
    #[command(
        long_about = "Show one gene's values per sample, labelled with its group.\n\n\
            Selectors: index:<n> (zero-based row), name:<display name>, id:<accession>.",
        after_long_help = "\
Examples:
  deseq_report lookup -e expression.tsv --gene name:Gapdh --group-a ko1,ko2
  deseq_report lookup -e expression.tsv -a annotation.tsv --gene id:ENSMUSG00000057666"
    )]
    Lookup {
        /// Long-format expression table
        #[arg(short, long)]
        expression: String,

        /// Gene annotation table (used for name lookup)
        #[arg(short, long)]
        annotation: Option<String>,

        /// Gene selector
        #[arg(short, long)]
        gene: String,

        /// Samples in group A
        #[arg(long, value_name = "SAMPLE", value_delimiter = ',')]
        group_a: Vec<String>,

        /// Label of group A
        #[arg(long, default_value = "groupA")]
        label_a: String,

        /// Label of group B
        #[arg(long, default_value = "groupB")]
        label_b: String,

        /// Expression column used for the matrix
        #[arg(long, default_value = "count")]
        value_column: String,

        /// Per-sample normalization: ratio, poscounts or cpm
        #[arg(long, default_value = "ratio")]
        normalization: String,
    },
}
