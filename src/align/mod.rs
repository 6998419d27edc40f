//! Header resolution and schema alignment.

pub mod convert;
pub mod header;
pub mod mapping;
pub mod project;
pub mod schema;

pub use convert::{can_convert, coerce_records, convert};
pub use header::{has_headers, looks_numeric, placeholder_headers, resolve};
pub use mapping::{build_initial, duplicate_targets, parse_override, set_mapping};
pub use project::project;
pub use schema::discover;
