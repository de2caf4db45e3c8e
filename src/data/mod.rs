//! Data structures for expression reporting

mod expression_matrix;
mod groups;
mod matrix_builder;
mod records;
mod selector;

pub use expression_matrix::ExpressionMatrix;
pub use groups::{assign_groups, Group, GroupAssignment};
pub use matrix_builder::MatrixBuilder;
pub use records::{ExpressionRecord, RowKey};
pub use selector::GeneSelector;
