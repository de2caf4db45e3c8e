//! Serialization of report views, rank file and summary
//!
//! Every artifact is written to a temporary file in the output directory
//! and renamed into place, so a failed write never leaves a partial file.
//! A failure on one artifact does not stop the others from being written.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::annotation::AnnotatedResult;
use crate::config::Thresholds;
use crate::error::{ReportError, Result};
use crate::filter::{FilterSummary, FilteredViews, ViewKind};
use crate::rank::RankEntry;

/// Column headers preceding the per-sample values in a view
pub const VIEW_COLUMNS: [&str; 6] = [
    "gene_id",
    "display_name",
    "biotype",
    "log2FoldChange",
    "padj",
    "avg_cpm",
];

const NA: &str = "NA";

/// Shortest round-trip text for a float; scientific notation for very small or large magnitudes
pub fn format_float(v: f64) -> String {
    if v.is_nan() {
        return NA.to_string();
    }
    let magnitude = v.abs();
    if magnitude != 0.0 && (magnitude < 1e-4 || magnitude >= 1e15) {
        format!("{:e}", v)
    } else {
        format!("{}", v)
    }
}

fn format_optional(v: Option<f64>) -> String {
    v.map(format_float).unwrap_or_else(|| NA.to_string())
}

/// Machine-readable summary of one comparison
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRecord<'a> {
    pub comparison: &'a str,
    pub thresholds: &'a Thresholds,
    #[serde(flatten)]
    pub summary: &'a FilterSummary,
}

/// Writes the artifacts of one comparison into an output directory
#[derive(Debug, Clone)]
pub struct ReportWriter {
    outdir: PathBuf,
    comparison: String,
}

impl ReportWriter {
    /// `comparison` is the `<A>_vs_<B>` filename prefix
    pub fn new<P: AsRef<Path>>(outdir: P, comparison: &str) -> Self {
        Self {
            outdir: outdir.as_ref().to_path_buf(),
            comparison: comparison.to_string(),
        }
    }

    /// Path of the artifact with the given suffix and extension
    pub fn artifact_path(&self, suffix: &str, extension: &str) -> PathBuf {
        self.outdir
            .join(format!("{}_{}.{}", self.comparison, suffix, extension))
    }

    /// Write all four views, the rank file and the summary
    ///
    /// Returns the written paths in a fixed order. If any artifact fails,
    /// the others are still attempted and the error lists every failure.
    pub fn write_all(
        &self,
        views: &FilteredViews<'_>,
        sample_ids: &[String],
        ranks: &[RankEntry],
        summary: &FilterSummary,
        thresholds: &Thresholds,
    ) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.outdir)?;

        let mut written = Vec::new();
        let mut failed = Vec::new();
        let mut record = |path: PathBuf, outcome: Result<()>| match outcome {
            Ok(()) => {
                log::info!("Wrote {}", path.display());
                written.push(path);
            }
            Err(e) => {
                log::warn!("Failed to write {}: {}", path.display(), e);
                failed.push((path.display().to_string(), e.to_string()));
            }
        };

        for kind in ViewKind::ALL {
            let path = self.artifact_path(kind.suffix(), "tsv");
            let outcome = write_atomic(&path, |w| write_view(w, views.view(kind), sample_ids));
            record(path, outcome);
        }

        let path = self.artifact_path("rank", "rnk");
        let outcome = write_atomic(&path, |w| write_rank(w, ranks));
        record(path, outcome);

        let path = self.artifact_path("summary", "tsv");
        let outcome = write_atomic(&path, |w| write_summary(w, summary));
        record(path, outcome);

        let path = self.artifact_path("summary", "json");
        let json = SummaryRecord {
            comparison: &self.comparison,
            thresholds,
            summary,
        };
        let outcome = write_atomic(&path, |w| {
            serde_json::to_writer_pretty(&mut *w, &json)?;
            writeln!(w)?;
            Ok(())
        });
        record(path, outcome);

        if failed.is_empty() {
            Ok(written)
        } else {
            Err(ReportError::ArtifactWrite { failed })
        }
    }
}

/// Write through a temporary file in the destination directory, then rename
pub fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut buffered = BufWriter::new(tmp.as_file_mut());
        write(&mut buffered)?;
        buffered.flush()?;
    }
    // Temp files are created 0600; artifacts get the usual 0644
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file().set_permissions(fs::Permissions::from_mode(0o644))?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn tsv_writer(w: &mut dyn Write) -> csv::Writer<&mut dyn Write> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(w)
}

/// One view: fixed columns, then one normalized value per sample
pub fn write_view(
    w: &mut dyn Write,
    rows: &[&AnnotatedResult],
    sample_ids: &[String],
) -> Result<()> {
    let mut out = tsv_writer(w);

    let header: Vec<&str> = VIEW_COLUMNS
        .iter()
        .copied()
        .chain(sample_ids.iter().map(|s| s.as_str()))
        .collect();
    out.write_record(&header)?;

    for r in rows {
        if r.normalized_values.len() != sample_ids.len() {
            return Err(ReportError::DimensionMismatch {
                expected: format!(
                    "{} sample values for gene '{}'",
                    sample_ids.len(),
                    r.gene_id
                ),
                got: format!("{}", r.normalized_values.len()),
            });
        }
        let mut fields = vec![
            r.gene_id.clone(),
            r.display_name.clone().unwrap_or_else(|| NA.to_string()),
            r.biotype.clone().unwrap_or_else(|| NA.to_string()),
            format_optional(r.log2_fold_change),
            format_optional(r.adjusted_pvalue),
            format_float(r.average_abundance),
        ];
        fields.extend(r.normalized_values.iter().map(|&v| format_float(v)));
        out.write_record(&fields)?;
    }

    out.flush()?;
    Ok(())
}

/// Header-less two-column rank file
pub fn write_rank(w: &mut dyn Write, ranks: &[RankEntry]) -> Result<()> {
    let mut out = tsv_writer(w);
    for entry in ranks {
        out.write_record([
            entry.display_name.as_str(),
            format_float(entry.log2_fold_change).as_str(),
        ])?;
    }
    out.flush()?;
    Ok(())
}

/// Summary table: cutoff name, cutoff value, matched gene count
pub fn write_summary(w: &mut dyn Write, summary: &FilterSummary) -> Result<()> {
    let mut out = tsv_writer(w);
    out.write_record(["cutoff_name", "cutoff_value", "signif_genes"])?;
    for e in &summary.entries {
        out.write_record([
            e.cutoff_name.clone(),
            format_float(e.cutoff_value),
            e.signif_genes.to_string(),
        ])?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Thresholds;
    use crate::filter::ResultFilter;

    fn row(id: &str, name: Option<&str>, lfc: Option<f64>, padj: Option<f64>) -> AnnotatedResult {
        AnnotatedResult {
            gene_id: id.to_string(),
            display_name: name.map(str::to_string),
            biotype: name.map(|_| "protein_coding".to_string()),
            log2_fold_change: lfc,
            stat: None,
            raw_pvalue: padj,
            adjusted_pvalue: padj,
            average_abundance: 12.5,
            normalized_values: vec![1.0, 2.5],
        }
    }

    fn samples() -> Vec<String> {
        vec!["s1".to_string(), "s2".to_string()]
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(2.0), "2");
        assert_eq!(format_float(-1.5), "-1.5");
        assert_eq!(format_float(0.0), "0");
        assert_eq!(format_float(0.001), "0.001");
        assert_eq!(format_float(5e-5), "5e-5");
        assert_eq!(format_float(f64::NAN), "NA");
    }

    #[test]
    fn test_write_view() {
        let a = row("G1", Some("Actb"), Some(2.0), Some(1e-4));
        let b = row("G4", None, None, None);
        let mut buf: Vec<u8> = Vec::new();
        write_view(&mut buf, &[&a, &b], &samples()).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "gene_id\tdisplay_name\tbiotype\tlog2FoldChange\tpadj\tavg_cpm\ts1\ts2"
        );
        assert_eq!(
            lines[1],
            "G1\tActb\tprotein_coding\t2\t0.0001\t12.5\t1\t2.5"
        );
        assert_eq!(lines[2], "G4\tNA\tNA\tNA\tNA\t12.5\t1\t2.5");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_write_rank_has_no_header() {
        let ranks = vec![
            RankEntry {
                display_name: "GAPDH".into(),
                log2_fold_change: 2.5,
            },
            RankEntry {
                display_name: "ACTB".into(),
                log2_fold_change: -0.5,
            },
        ];
        let mut buf: Vec<u8> = Vec::new();
        write_rank(&mut buf, &ranks).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "GAPDH\t2.5\nACTB\t-0.5\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_artifacts_are_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("KO_vs_WT_rank.rnk");
        write_atomic(&path, |w| write_rank(w, &[])).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_write_all_creates_every_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let results = vec![row("G1", Some("Actb"), Some(2.0), Some(1e-4))];
        let thresholds = Thresholds::default();
        let views = ResultFilter::new(thresholds).apply(&results);
        let summary = views.summary();

        let writer = ReportWriter::new(dir.path(), "KO_vs_WT");
        let paths = writer
            .write_all(&views, &samples(), &[], &summary, &thresholds)
            .unwrap();

        assert_eq!(paths.len(), 7);
        for suffix in ["padj_cutoff", "log2f_cutoff", "cpm_cutoff", "allgenes"] {
            assert!(dir.path().join(format!("KO_vs_WT_{}.tsv", suffix)).exists());
        }
        assert!(dir.path().join("KO_vs_WT_rank.rnk").exists());

        let summary_text = fs::read_to_string(dir.path().join("KO_vs_WT_summary.tsv")).unwrap();
        assert_eq!(
            summary_text,
            "cutoff_name\tcutoff_value\tsignif_genes\npadj\t0.05\t1\nlog2fc\t1\t1\navg_cpm\t1\t1\n"
        );

        let json: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("KO_vs_WT_summary.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(json["comparison"], "KO_vs_WT");
        assert_eq!(json["entries"][0]["signif_genes"], 1);
    }

    #[test]
    fn test_failed_artifact_does_not_suppress_others() {
        let dir = tempfile::tempdir().unwrap();
        // A directory squatting on one artifact's path makes that rename fail
        fs::create_dir(dir.path().join("KO_vs_WT_rank.rnk")).unwrap();
        fs::write(dir.path().join("KO_vs_WT_rank.rnk").join("keep"), "x").unwrap();

        let results = vec![row("G1", Some("Actb"), Some(2.0), Some(1e-4))];
        let thresholds = Thresholds::default();
        let views = ResultFilter::new(thresholds).apply(&results);
        let summary = views.summary();

        let err = ReportWriter::new(dir.path(), "KO_vs_WT")
            .write_all(&views, &samples(), &[], &summary, &thresholds)
            .unwrap_err();
        match err {
            ReportError::ArtifactWrite { failed } => {
                assert_eq!(failed.len(), 1);
                assert!(failed[0].0.ends_with("KO_vs_WT_rank.rnk"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(dir.path().join("KO_vs_WT_allgenes.tsv").exists());
        assert!(dir.path().join("KO_vs_WT_summary.json").exists());
    }
}
