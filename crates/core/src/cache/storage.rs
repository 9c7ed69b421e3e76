//! Store-set operations: open-or-create, enumerate, delete.

use super::connection::CacheDb;
use super::store::CacheStore;
use crate::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// A store name with its entry count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StoreSummary {
    pub name: String,
    pub entries: u64,
    pub created_at: String,
}

impl CacheDb {
    /// Open the named store, creating it if absent.
    ///
    /// # Errors
    ///
    /// Returns `Error::StoreOpen` if the store row cannot be created.
    pub async fn open_store(&self, name: &str) -> Result<CacheStore, Error> {
        let owned = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
                    params![owned, now],
                )?;
                Ok(())
            })
            .await
            .map_err(|e| Error::StoreOpen(format!("{name}: {}", Error::from(e))))?;

        Ok(CacheStore::new(self.clone(), name))
    }

    /// All store names, in creation order.
    pub async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM stores ORDER BY rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a store and all of its entries.
    ///
    /// Returns `true` if a store was deleted, `false` if none existed.
    pub async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM stores WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Every store with its entry count, in creation order.
    pub async fn store_summaries(&self) -> Result<Vec<StoreSummary>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<StoreSummary>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT s.name, s.created_at, COUNT(e.key_hash)
                     FROM stores s LEFT JOIN entries e ON e.store_name = s.name
                     GROUP BY s.name
                     ORDER BY s.rowid ASC",
                )?;
                let summaries = stmt
                    .query_map([], |row| {
                        Ok(StoreSummary {
                            name: row.get(0)?,
                            created_at: row.get(1)?,
                            entries: row.get::<_, i64>(2)? as u64,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(summaries)
            })
            .await
            .map_err(Error::from)
    }
}
