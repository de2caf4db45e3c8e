//! Input tables and output artifacts

mod matrix;
mod readers;
mod report;
mod tables;

pub use matrix::write_matrix;
pub use readers::{read_annotation_table, read_expression_records, read_stats_table};
pub use report::{
    format_float, write_atomic, write_rank, write_summary, write_view, ReportWriter,
    SummaryRecord, VIEW_COLUMNS,
};
