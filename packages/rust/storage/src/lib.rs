//! libSQL brief store.
//!
//! [`BriefStore`] is an explicit handle injected into the orchestrator at
//! construction time — there is no module-level connection. It accepts one
//! write per generated brief and answers reads by primary key or
//! "most recent N". Retention is the store's concern; this core never
//! mutates or deletes records.

mod migrations;

use std::path::Path;

use chrono::{DateTime, Utc};
use libsql::{Connection, Database, params};

use researchbrief_shared::{Brief, BriefError, BriefRecord, BriefSummary, Result, StoredSource};

/// Storage handle wrapping a local libSQL database.
pub struct BriefStore {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl BriefStore {
    /// Open or create a database at `path` and run pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| BriefError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| BriefError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| BriefError::Storage(e.to_string()))?;

        let store = Self { db, conn };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    BriefError::Storage(format!("migration v{} failed: {e}", migration.version))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Probe connectivity with a trivial query.
    pub async fn ping(&self) -> Result<()> {
        self.conn
            .query("SELECT 1", params![])
            .await
            .map(|_| ())
            .map_err(|e| BriefError::Storage(e.to_string()))
    }

    // -----------------------------------------------------------------------
    // Brief operations
    // -----------------------------------------------------------------------

    /// Insert a brief record. The five payload fields are JSON-encoded text;
    /// returns the newly assigned identifier.
    pub async fn insert_brief(
        &self,
        title: &str,
        urls_json: &str,
        brief_json: &str,
        sources_json: &str,
        tags_json: &str,
    ) -> Result<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO briefs (title, urls, brief, sources, tags, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![title, urls_json, brief_json, sources_json, tags_json, now.as_str()],
            )
            .await
            .map_err(|e| BriefError::Storage(e.to_string()))?;

        Ok(self.conn.last_insert_rowid())
    }

    /// List the most recent briefs, newest first.
    pub async fn list_recent(&self, limit: u32) -> Result<Vec<BriefSummary>> {
        let mut rows = self
            .conn
            .query(
                // id tiebreak keeps same-second inserts in insertion order.
                "SELECT id, title, urls, tags, created_at FROM briefs
                 ORDER BY created_at DESC, id DESC LIMIT ?1",
                params![limit as i64],
            )
            .await
            .map_err(|e| BriefError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(BriefSummary {
                id: get_i64(&row, 0)?,
                title: get_string(&row, 1)?,
                urls: parse_json_column(&get_string(&row, 2)?, "urls")?,
                tags: parse_json_column(&get_string(&row, 3)?, "tags")?,
                created_at: parse_timestamp(&get_string(&row, 4)?)?,
            });
        }
        Ok(results)
    }

    /// Get a full brief record by id.
    pub async fn get_brief(&self, id: i64) -> Result<Option<BriefRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, title, urls, brief, sources, tags, created_at
                 FROM briefs WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(|e| BriefError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let brief: Brief = parse_json_column(&get_string(&row, 3)?, "brief")?;
                let sources: Vec<StoredSource> =
                    parse_json_column(&get_string(&row, 4)?, "sources")?;
                Ok(Some(BriefRecord {
                    id: get_i64(&row, 0)?,
                    title: get_string(&row, 1)?,
                    urls: parse_json_column(&get_string(&row, 2)?, "urls")?,
                    brief,
                    sources,
                    tags: parse_json_column(&get_string(&row, 5)?, "tags")?,
                    created_at: parse_timestamp(&get_string(&row, 6)?)?,
                }))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(BriefError::Storage(e.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Row helpers
// ---------------------------------------------------------------------------

fn get_string(row: &libsql::Row, idx: i32) -> Result<String> {
    row.get::<String>(idx)
        .map_err(|e| BriefError::Storage(e.to_string()))
}

fn get_i64(row: &libsql::Row, idx: i32) -> Result<i64> {
    row.get::<i64>(idx)
        .map_err(|e| BriefError::Storage(e.to_string()))
}

fn parse_json_column<T: serde::de::DeserializeOwned>(raw: &str, column: &str) -> Result<T> {
    serde_json::from_str(raw)
        .map_err(|e| BriefError::Storage(format!("corrupt {column} column: {e}")))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| BriefError::Storage(format!("invalid date: {e}")))
}
