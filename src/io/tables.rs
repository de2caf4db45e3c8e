//! Shared helpers for delimited input tables

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use csv::StringRecord;

use crate::error::{ReportError, Result};

/// Tab if the header line contains one, comma otherwise
pub(crate) fn sniff_delimiter(path: &Path) -> Result<u8> {
    let mut header_line = String::new();
    BufReader::new(File::open(path)?).read_line(&mut header_line)?;
    if header_line.trim().is_empty() {
        return Err(ReportError::EmptyData {
            reason: format!("Empty table: {}", path.display()),
        });
    }
    Ok(if header_line.contains('\t') { b'\t' } else { b',' })
}

/// Open a headed table with a sniffed delimiter
pub(crate) fn open_table(path: &Path) -> Result<csv::Reader<File>> {
    let delimiter = sniff_delimiter(path)?;
    let reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    Ok(reader)
}

/// Position of the first header matching any alias (case-insensitive)
pub(crate) fn column_index(headers: &StringRecord, aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|alias| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(alias))
    })
}

/// Like [`column_index`] but a missing column is a schema error
pub(crate) fn require_column(
    headers: &StringRecord,
    aliases: &[&str],
    table: &str,
) -> Result<usize> {
    column_index(headers, aliases).ok_or_else(|| ReportError::Schema {
        reason: format!(
            "{} table has no '{}' column (accepted names: {}; found: {})",
            table,
            aliases[0],
            aliases.join(", "),
            headers.iter().collect::<Vec<_>>().join(", ")
        ),
    })
}

/// Parse a statistic where `NA`, `NaN` or an empty field mean undefined
pub(crate) fn parse_optional_f64(field: &str) -> std::result::Result<Option<f64>, String> {
    let field = field.trim();
    if field.is_empty() || field.eq_ignore_ascii_case("na") || field.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    field
        .parse::<f64>()
        .map(|v| if v.is_nan() { None } else { Some(v) })
        .map_err(|_| format!("'{}' is not a number", field))
}

/// Empty field or `NA` as null
pub(crate) fn optional_text(field: &str) -> Option<String> {
    let field = field.trim();
    if field.is_empty() || field == "NA" {
        None
    } else {
        Some(field.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_optional_f64() {
        assert_eq!(parse_optional_f64("0.5"), Ok(Some(0.5)));
        assert_eq!(parse_optional_f64("1e-300"), Ok(Some(1e-300)));
        assert_eq!(parse_optional_f64("NA"), Ok(None));
        assert_eq!(parse_optional_f64("NaN"), Ok(None));
        assert_eq!(parse_optional_f64(""), Ok(None));
        assert!(parse_optional_f64("abc").is_err());
    }

    #[test]
    fn test_sniff_delimiter() {
        let mut tsv = NamedTempFile::new().unwrap();
        writeln!(tsv, "a\tb").unwrap();
        assert_eq!(sniff_delimiter(tsv.path()).unwrap(), b'\t');

        let mut csv_file = NamedTempFile::new().unwrap();
        writeln!(csv_file, "a,b").unwrap();
        assert_eq!(sniff_delimiter(csv_file.path()).unwrap(), b',');
    }

    #[test]
    fn test_column_aliases() {
        let headers = StringRecord::from(vec!["Ensembl_Gene_ID", "external_gene_name"]);
        assert_eq!(
            column_index(&headers, &["gene_id", "ensembl_gene_id"]),
            Some(0)
        );
        assert!(require_column(&headers, &["biotype"], "Annotation").is_err());
    }
}
