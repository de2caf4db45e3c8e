//! Long-format expression records

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

/// One (gene, sample) observation from a quantified expression table
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionRecord {
    /// Stable gene accession (e.g. an Ensembl gene ID)
    pub gene_id: String,
    /// Display gene name, possibly shared by distinct genes
    pub gene_name: String,
    /// Sample identifier
    pub sample_id: String,
    /// Value of the selected expression column
    pub value: f64,
}

impl ExpressionRecord {
    pub fn new(gene_id: &str, gene_name: &str, sample_id: &str, value: f64) -> Self {
        Self {
            gene_id: gene_id.to_string(),
            gene_name: gene_name.to_string(),
            sample_id: sample_id.to_string(),
            value,
        }
    }

    /// Value of the chosen row key for this record
    pub fn key(&self, row_key: RowKey) -> &str {
        match row_key {
            RowKey::GeneId => &self.gene_id,
            RowKey::GeneName => &self.gene_name,
        }
    }

    /// The identifier on the other side of the key (name for id, id for name)
    pub fn counterpart(&self, row_key: RowKey) -> &str {
        match row_key {
            RowKey::GeneId => &self.gene_name,
            RowKey::GeneName => &self.gene_id,
        }
    }
}

/// Field used as the matrix row key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RowKey {
    /// Stable accession; the safe choice
    #[default]
    GeneId,
    /// Display name; fails when a name covers several accessions
    GeneName,
}

impl FromStr for RowKey {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gene-id" | "gene_id" | "id" => Ok(RowKey::GeneId),
            "gene-name" | "gene_name" | "name" => Ok(RowKey::GeneName),
            other => Err(ReportError::InvalidParameter {
                reason: format!("Unknown row key '{}'. Use 'gene-id' or 'gene-name'.", other),
            }),
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::GeneId => write!(f, "gene-id"),
            RowKey::GeneName => write!(f, "gene-name"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_key_parsing() {
        assert_eq!("gene-id".parse::<RowKey>().unwrap(), RowKey::GeneId);
        assert_eq!("gene_name".parse::<RowKey>().unwrap(), RowKey::GeneName);
        assert!(matches!(
            "symbol".parse::<RowKey>(),
            Err(ReportError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_key_and_counterpart() {
        let rec = ExpressionRecord::new("ENSG1", "TP53", "s1", 4.0);
        assert_eq!(rec.key(RowKey::GeneId), "ENSG1");
        assert_eq!(rec.counterpart(RowKey::GeneId), "TP53");
        assert_eq!(rec.key(RowKey::GeneName), "TP53");
        assert_eq!(rec.counterpart(RowKey::GeneName), "ENSG1");
    }
}
