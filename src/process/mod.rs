//! Raw tables → unified long-form dataset.
//!
//! `normalize` turns each bound table into long-form records, `flu_split`
//! apportions the combined influenza count to subtypes A and B, and `merge`
//! joins everything into the published, sorted shape.

pub mod cells;
pub mod flu_split;
pub mod labels;
pub mod merge;
pub mod normalize;
pub mod raw_table;

pub use flu_split::{apply_flu_split, split_cases};
pub use merge::{merge_frames, UnifiedRecord};
pub use normalize::{normalize_table, NormalizedRecord};
pub use raw_table::RawTable;
