//! Cutoff filtering of annotated results

mod cutoffs;

pub(crate) use cutoffs::{defined, descending};
pub use cutoffs::{CutoffCount, FilterSummary, FilteredViews, ResultFilter, ViewKind};
