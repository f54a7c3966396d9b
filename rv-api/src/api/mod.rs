//! HTTP API handlers for rv-api

pub mod error;
pub mod health;
pub mod lang;
pub mod recipes;

pub use error::ApiError;
pub use health::health_routes;
pub use lang::RequestLanguage;
pub use recipes::recipe_routes;
