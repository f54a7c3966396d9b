//! Declarative schema synchronization
//!
//! Tables declare the columns they expect through [`TableSchema`]. On startup
//! the actual columns are read with `PRAGMA table_info`, compared, and any
//! missing column is added with `ALTER TABLE ... ADD COLUMN`.
//!
//! Startup order:
//! 1. `CREATE TABLE IF NOT EXISTS` for every table
//! 2. Column sync (this module)
//! 3. Versioned migrations for anything column sync cannot express
//!
//! Only missing columns are repaired. Type and constraint drift is reported
//! with a warning and left for a migration, since SQLite cannot alter either
//! without rebuilding the table.

use crate::Result;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, warn};

/// Expected column with the constraints it is declared with
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    /// SQL type, e.g. `TEXT`, `INTEGER`, `TIMESTAMP`
    pub sql_type: String,
    pub not_null: bool,
    pub primary_key: bool,
    pub unique: bool,
    /// SQL literal or expression used as DEFAULT
    pub default_value: Option<String>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            not_null: false,
            primary_key: false,
            unique: false,
            default_value: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Default that SQLite evaluates per row (`CURRENT_TIMESTAMP`, `(expr)`).
    ///
    /// `ALTER TABLE ADD COLUMN` rejects these on a table that has rows.
    fn volatile_default(&self) -> Option<&str> {
        let default = self.default_value.as_deref()?.trim();
        let upper = default.to_ascii_uppercase();
        let volatile = matches!(
            upper.as_str(),
            "CURRENT_TIMESTAMP" | "CURRENT_DATE" | "CURRENT_TIME"
        ) || default.starts_with('(');
        volatile.then_some(default)
    }

    /// Column clause for `ALTER TABLE ADD COLUMN`.
    ///
    /// SQLite refuses PRIMARY KEY and UNIQUE here, NOT NULL without a
    /// default, and non-constant defaults; those parts are dropped with a
    /// warning. Existing rows get a volatile default through a backfill
    /// in [`SchemaSync`] instead.
    fn add_column_clause(&self, table: &str) -> String {
        let mut clause = format!("{} {}", self.name, self.sql_type);

        if self.primary_key || self.unique {
            warn!(
                "Column {}.{} is added without its PRIMARY KEY/UNIQUE constraint",
                table, self.name
            );
        }

        if self.volatile_default().is_some() {
            warn!(
                "Column {}.{} has a non-constant DEFAULT and is added as nullable with a backfill",
                table, self.name
            );
            return clause;
        }

        match (&self.default_value, self.not_null) {
            (Some(default), true) => clause.push_str(&format!(" NOT NULL DEFAULT {}", default)),
            (Some(default), false) => clause.push_str(&format!(" DEFAULT {}", default)),
            (None, true) => warn!(
                "Column {}.{} has no DEFAULT and is added as nullable",
                table, self.name
            ),
            (None, false) => {}
        }

        clause
    }
}

/// Column as reported by `PRAGMA table_info`
#[derive(Debug, Clone)]
pub struct ActualColumn {
    pub cid: i32,
    pub name: String,
    pub type_name: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub pk: bool,
}

/// Difference between expected and actual schema
#[derive(Debug, Clone)]
pub enum SchemaDrift {
    MissingColumn {
        table: String,
        column: ColumnDefinition,
    },
    TypeMismatch {
        table: String,
        column: String,
        expected: String,
        actual: String,
    },
    ConstraintMismatch {
        table: String,
        column: String,
        constraint: &'static str,
    },
}

/// Expected schema of one table
pub trait TableSchema {
    fn table_name() -> &'static str;

    /// Expected columns, in creation order
    fn expected_columns() -> Vec<ColumnDefinition>;
}

/// Read the live schema
pub struct SchemaIntrospector;

impl SchemaIntrospector {
    /// Columns of `table_name`, ordered by cid
    pub async fn introspect_table(pool: &SqlitePool, table_name: &str) -> Result<Vec<ActualColumn>> {
        let rows = sqlx::query(&format!("PRAGMA table_info({})", table_name))
            .fetch_all(pool)
            .await?;

        let mut columns: Vec<ActualColumn> = rows
            .iter()
            .map(|row| ActualColumn {
                cid: row.get("cid"),
                name: row.get("name"),
                type_name: row.get("type"),
                not_null: row.get::<i32, _>("notnull") != 0,
                default_value: row.get("dflt_value"),
                pk: row.get::<i32, _>("pk") != 0,
            })
            .collect();

        columns.sort_by_key(|c| c.cid);
        Ok(columns)
    }

    pub async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
        )
        .bind(table_name)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }
}

/// Compare expected and actual columns
pub struct SchemaDiff;

impl SchemaDiff {
    pub fn compare(
        table_name: &str,
        expected: &[ColumnDefinition],
        actual: &[ActualColumn],
    ) -> Vec<SchemaDrift> {
        let mut drift = Vec::new();

        for column in expected {
            let Some(live) = actual.iter().find(|c| c.name == column.name) else {
                drift.push(SchemaDrift::MissingColumn {
                    table: table_name.to_string(),
                    column: column.clone(),
                });
                continue;
            };

            if !Self::types_compatible(&column.sql_type, &live.type_name) {
                drift.push(SchemaDrift::TypeMismatch {
                    table: table_name.to_string(),
                    column: column.name.clone(),
                    expected: column.sql_type.clone(),
                    actual: live.type_name.clone(),
                });
            }

            // SQLite reports INTEGER PRIMARY KEY columns as nullable
            if column.not_null && !live.not_null && !live.pk {
                drift.push(SchemaDrift::ConstraintMismatch {
                    table: table_name.to_string(),
                    column: column.name.clone(),
                    constraint: "NOT NULL",
                });
            }

            if column.primary_key && !live.pk {
                drift.push(SchemaDrift::ConstraintMismatch {
                    table: table_name.to_string(),
                    column: column.name.clone(),
                    constraint: "PRIMARY KEY",
                });
            }
        }

        drift
    }

    /// Compare by SQLite type affinity rather than spelling
    fn types_compatible(expected: &str, actual: &str) -> bool {
        Self::affinity(expected) == Self::affinity(actual)
    }

    fn affinity(type_name: &str) -> &'static str {
        let t = type_name.to_uppercase();
        if t.contains("INT") {
            "INTEGER"
        } else if t.contains("CHAR") || t.contains("CLOB") || t.contains("TEXT") {
            "TEXT"
        } else if t.contains("REAL") || t.contains("FLOA") || t.contains("DOUB") {
            "REAL"
        } else if t.is_empty() || t.contains("BLOB") {
            "BLOB"
        } else {
            // NUMERIC affinity; TIMESTAMP lands here
            "NUMERIC"
        }
    }
}

/// Apply column additions
pub struct SchemaSync;

impl SchemaSync {
    /// Bring one table's columns up to date; returns the number of columns added
    pub async fn sync_table<T: TableSchema>(pool: &SqlitePool) -> Result<usize> {
        let table_name = T::table_name();

        if !SchemaIntrospector::table_exists(pool, table_name).await? {
            warn!("Schema sync: table '{}' does not exist yet", table_name);
            return Ok(0);
        }

        let actual = SchemaIntrospector::introspect_table(pool, table_name).await?;
        let drift = SchemaDiff::compare(table_name, &T::expected_columns(), &actual);

        if drift.is_empty() {
            debug!("Schema sync: '{}' is up to date", table_name);
            return Ok(0);
        }

        let mut added = 0;
        for change in drift {
            match change {
                SchemaDrift::MissingColumn { table, column } => {
                    if Self::add_column(pool, &table, &column).await? {
                        added += 1;
                    }
                }
                SchemaDrift::TypeMismatch { table, column, expected, actual } => {
                    warn!(
                        "Type mismatch in {}.{}: expected '{}', found '{}'",
                        table, column, expected, actual
                    );
                }
                SchemaDrift::ConstraintMismatch { table, column, constraint } => {
                    warn!("Constraint mismatch in {}.{}: missing {}", table, column, constraint);
                }
            }
        }

        Ok(added)
    }

    /// Returns `false` when another connection added the column first
    async fn add_column(pool: &SqlitePool, table: &str, column: &ColumnDefinition) -> Result<bool> {
        let sql = format!("ALTER TABLE {} ADD COLUMN {}", table, column.add_column_clause(table));

        match sqlx::query(&sql).execute(pool).await {
            Ok(_) => {
                info!("Added column {}.{} ({})", table, column.name, column.sql_type);
                if let Some(default) = column.volatile_default() {
                    let filled = sqlx::query(&format!(
                        "UPDATE {} SET {} = {} WHERE {} IS NULL",
                        table, column.name, default, column.name
                    ))
                    .execute(pool)
                    .await?
                    .rows_affected();
                    debug!("Backfilled {} rows of {}.{}", filled, table, column.name);
                }
                Ok(true)
            }
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("duplicate column") => {
                debug!("Column {}.{} already present", table, column.name);
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}
