//! Test Helper Utilities
//!
//! Shared utilities for testing rv-api

#![allow(dead_code)]

pub mod db_utils;
pub mod fake_scraper;

pub use db_utils::{count_recipes, create_test_db};
pub use fake_scraper::{pasta_draft, FakeScraper};
