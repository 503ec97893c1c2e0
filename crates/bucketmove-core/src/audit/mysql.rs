//! MySQL-backed audit sink.
//!
//! Rows go to `<table> (file_key, status, message, moved_at)`; see
//! `sql/document_logs.sql` for the expected schema.

use async_trait::async_trait;
use eyre::{bail, Result, WrapErr};
use mysql_async::prelude::*;
use mysql_async::Pool;

use super::{AuditRecord, AuditSink};

pub const DEFAULT_AUDIT_TABLE: &str = "document_logs";

/// Table names are interpolated into SQL, so only plain identifiers pass.
pub fn is_valid_table_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub struct MySqlAuditSink {
    pool: Pool,
    table: String,
    insert_sql: String,
}

impl MySqlAuditSink {
    /// Create the connection pool. No connection is opened until `check` or `append`.
    pub fn connect(url: &str, table: &str) -> Result<Self> {
        if !is_valid_table_name(table) {
            bail!("invalid audit table name '{table}' (letters, digits and '_' only)");
        }
        let pool = Pool::from_url(url).wrap_err("invalid audit store connection string")?;
        Ok(Self {
            pool,
            table: table.to_string(),
            insert_sql: format!(
                "INSERT INTO `{table}` (file_key, status, message, moved_at) VALUES (?, ?, ?, ?)"
            ),
        })
    }

    /// Startup probe: ping, report the server version, and confirm the audit
    /// table exists in the connected schema.
    pub async fn check(&self) -> Result<String> {
        let mut conn = self
            .pool
            .get_conn()
            .await
            .wrap_err("connecting to audit store")?;

        conn.ping().await.wrap_err("audit store ping failed")?;

        let version: Option<String> = conn
            .query_first("SELECT VERSION()")
            .await
            .wrap_err("audit store version query failed")?;

        let tables: Option<i64> = conn
            .exec_first(
                "SELECT COUNT(*) FROM information_schema.tables \
                 WHERE table_schema = DATABASE() AND table_name = ?",
                (self.table.as_str(),),
            )
            .await
            .wrap_err("audit table check failed")?;

        if tables.unwrap_or(0) == 0 {
            bail!("audit table '{}' does not exist", self.table);
        }

        Ok(version.unwrap_or_else(|| "unknown".to_string()))
    }

    pub async fn disconnect(self) -> Result<()> {
        self.pool
            .disconnect()
            .await
            .wrap_err("closing audit store pool")
    }
}

#[async_trait]
impl AuditSink for MySqlAuditSink {
    async fn append(&self, record: &AuditRecord) -> Result<()> {
        let mut conn = self
            .pool
            .get_conn()
            .await
            .wrap_err("connecting to audit store")?;

        conn.exec_drop(
            self.insert_sql.as_str(),
            (
                record.key.as_str(),
                record.status.as_str(),
                record.message.as_str(),
                record.timestamp.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
            ),
        )
        .await
        .wrap_err_with(|| format!("audit insert failed for key {}", record.key))?;
        Ok(())
    }
}
