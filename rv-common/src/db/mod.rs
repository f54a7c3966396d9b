//! Database bootstrap and schema management

pub mod init;
pub mod migrations;
pub mod schema_sync;
pub mod table_schemas;

pub use init::*;
pub use migrations::run_migrations;
pub use schema_sync::{ColumnDefinition, SchemaSync, TableSchema};
pub use table_schemas::{sync_all_table_schemas, RecipesTableSchema};
