//! Immutable analysis configuration
//!
//! Every threshold and the group-A sample list are explicit fields passed
//! into each pipeline invocation. A configuration can be loaded from JSON;
//! missing fields take the defaults below.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::RowKey;
use crate::error::{ReportError, Result};
use crate::normalization::NormalizationMethod;

/// Cutoffs applied by the result filter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Keep genes with adjusted p-value strictly below this
    pub padj_cutoff: f64,
    /// Keep genes with |log2 fold change| strictly above this
    pub log2_cutoff: f64,
    /// Keep genes with average CPM strictly above this
    pub abundance_cutoff: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            padj_cutoff: 0.05,
            log2_cutoff: 1.0,
            abundance_cutoff: 1.0,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<()> {
        if !(self.padj_cutoff > 0.0 && self.padj_cutoff <= 1.0) {
            return Err(ReportError::InvalidParameter {
                reason: format!("padj cutoff must be in (0, 1], got {}", self.padj_cutoff),
            });
        }
        for (name, value) in [
            ("log2 fold-change", self.log2_cutoff),
            ("abundance", self.abundance_cutoff),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ReportError::InvalidParameter {
                    reason: format!("{} cutoff must be finite and >= 0, got {}", name, value),
                });
            }
        }
        Ok(())
    }
}

/// Everything one comparison run needs besides its input tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Label of the listed samples (numerator of the fold change)
    pub group_a_label: String,
    /// Label of every other sample
    pub group_b_label: String,
    pub group_a_samples: BTreeSet<String>,
    /// Expression-table column the matrix is built from
    pub value_column: String,
    pub row_key: RowKey,
    /// Biotype kept in the rank file
    pub biotype: String,
    pub normalization: NormalizationMethod,
    pub thresholds: Thresholds,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            group_a_label: "groupA".to_string(),
            group_b_label: "groupB".to_string(),
            group_a_samples: BTreeSet::new(),
            value_column: "count".to_string(),
            row_key: RowKey::GeneId,
            biotype: "protein_coding".to_string(),
            normalization: NormalizationMethod::Ratio,
            thresholds: Thresholds::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: AnalysisConfig = serde_json::from_reader(reader)?;
        Ok(config)
    }

    /// `<A>_vs_<B>`, the prefix of every artifact of this comparison
    pub fn comparison_name(&self) -> String {
        format!("{}_vs_{}", self.group_a_label, self.group_b_label)
    }

    pub fn validate(&self) -> Result<()> {
        for label in [&self.group_a_label, &self.group_b_label] {
            if label.trim().is_empty() {
                return Err(ReportError::InvalidParameter {
                    reason: "Group labels must not be empty".to_string(),
                });
            }
            if label.contains('/') || label.contains('\\') {
                return Err(ReportError::InvalidParameter {
                    reason: format!("Group label '{}' must not contain path separators", label),
                });
            }
        }
        if self.group_a_label == self.group_b_label {
            return Err(ReportError::InvalidParameter {
                reason: format!("Both groups are labelled '{}'", self.group_a_label),
            });
        }
        if self.group_a_samples.is_empty() {
            return Err(ReportError::InvalidParameter {
                reason: "No samples listed for group A".to_string(),
            });
        }
        if self.value_column.trim().is_empty() {
            return Err(ReportError::InvalidParameter {
                reason: "Value column name must not be empty".to_string(),
            });
        }
        self.thresholds.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config() -> AnalysisConfig {
        AnalysisConfig {
            group_a_label: "KO".into(),
            group_b_label: "WT".into(),
            group_a_samples: ["s1".to_string(), "s2".to_string()].into_iter().collect(),
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn test_comparison_name() {
        assert_eq!(config().comparison_name(), "KO_vs_WT");
    }

    #[test]
    fn test_validate() {
        assert!(config().validate().is_ok());

        let mut same = config();
        same.group_b_label = "KO".into();
        assert!(same.validate().is_err());

        let mut no_samples = config();
        no_samples.group_a_samples.clear();
        assert!(no_samples.validate().is_err());

        let mut bad_padj = config();
        bad_padj.thresholds.padj_cutoff = 0.0;
        assert!(matches!(bad_padj.validate(), Err(ReportError::InvalidParameter { .. })));

        let mut bad_lfc = config();
        bad_lfc.thresholds.log2_cutoff = f64::NAN;
        assert!(bad_lfc.validate().is_err());
    }

    #[test]
    fn test_json_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"group_a_label": "KO", "group_b_label": "WT",
                "group_a_samples": ["s2", "s1"],
                "thresholds": {{"padj_cutoff": 0.001}}}}"#
        )
        .unwrap();

        let loaded = AnalysisConfig::from_json_file(file.path()).unwrap();
        assert_eq!(loaded.thresholds.padj_cutoff, 0.001);
        assert_eq!(loaded.thresholds.log2_cutoff, 1.0);
        assert_eq!(loaded.value_column, "count");
        assert_eq!(loaded.row_key, RowKey::GeneId);
        assert_eq!(loaded, config_with_padj(0.001));
    }

    fn config_with_padj(padj: f64) -> AnalysisConfig {
        let mut c = config();
        c.thresholds.padj_cutoff = padj;
        c
    }
}
