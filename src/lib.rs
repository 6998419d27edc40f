//! csv-upsert: align CSV/XLSX uploads against a collection schema and upsert
//! them into a document store.
//!
//! The pipeline is parse ([`tabular`]) → resolve headers, map and project
//! ([`align`]) → idempotent upsert ([`reconcile`]) against a [`store`].

pub mod align;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod reconcile;
pub mod render;
pub mod store;
pub mod tabular;
