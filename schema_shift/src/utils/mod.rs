//! Utilities for SchemaShift
//!
//! This module provides utility functions used across the library.

pub mod logging;
pub mod naming;

// Re-export key utility functions
pub use naming::{
    closest_match, foreign_key_column, get_foreign_key_name, get_index_name, get_table_name, join_table_name,
    normalize_identifier, pluralize, singularize,
};
