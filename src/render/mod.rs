//! Output rendering (summaries, mapping tables, previews)

pub mod summary;
pub mod table;

pub use summary::{render_summary_json, render_summary_text, write_summary};
pub use table::{render_mapping_table, render_preview};
