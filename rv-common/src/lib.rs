//! # Recipe Vault Common Library
//!
//! Shared code for the Recipe Vault services:
//! - Error type
//! - Configuration resolution
//! - Database bootstrap and schema synchronization
//! - Recipe model types
//! - Localization lookup

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod i18n;
pub mod models;

pub use error::{Error, Result};
pub use i18n::Language;
pub use models::{Field, Recipe, RecipeDraft, RecipePatch};
