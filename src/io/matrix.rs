//! Wide-format export of an expression matrix

use std::io::Write;

use super::report::format_float;
use crate::data::ExpressionMatrix;
use crate::error::Result;

/// Write `gene_id`, `gene_name` and one column per sample
pub fn write_matrix(w: &mut dyn Write, matrix: &ExpressionMatrix) -> Result<()> {
    let mut out = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(w);

    let mut header = vec!["gene_id".to_string(), "gene_name".to_string()];
    header.extend(matrix.sample_ids().iter().cloned());
    out.write_record(&header)?;

    for (i, (id, name)) in matrix.gene_ids().iter().zip(matrix.gene_names()).enumerate() {
        let mut fields = vec![id.clone(), name.clone()];
        fields.extend(matrix.gene_values(i).iter().map(|&v| format_float(v)));
        out.write_record(&fields)?;
    }

    out.flush()?;
    Ok(())
}
