//! Database access for rv-api
//!
//! Schema creation lives in `rv_common::db`; this module holds the queries.

pub mod recipes;

pub use recipes::{RecipeFilter, RecipeScope, StoreError};
