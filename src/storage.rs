//! Persistent store boundary for canonical transactions.

use crate::error::Result;
use crate::types::{CanonicalTransaction, StoredTransaction, TransactionKey};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Tabular store for canonical transactions. Row ids are store-assigned
/// integers; all reads return rows in stable storage order.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Equality-filtered read on the full logical key.
    async fn find_matching(&self, key: &TransactionKey) -> Result<Vec<StoredTransaction>>;

    /// Inserts a row and returns its assigned id.
    async fn insert(&self, transaction: &CanonicalTransaction) -> Result<i64>;

    /// Paginated range-read over the whole table.
    async fn fetch_page(&self, offset: u64, limit: u64) -> Result<Vec<StoredTransaction>>;

    async fn delete_by_id(&self, id: i64) -> Result<()>;

    async fn update_type_by_id(&self, id: i64, transaction_type: &str) -> Result<()>;
}

/// In-memory store for development and testing.
pub struct InMemoryStore {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    rows: Vec<StoredTransaction>,
    next_id: i64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                rows: Vec::new(),
                next_id: 1,
            })),
        }
    }

    pub fn row_count(&self) -> usize {
        self.inner.lock().unwrap().rows.len()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionStore for InMemoryStore {
    async fn find_matching(&self, key: &TransactionKey) -> Result<Vec<StoredTransaction>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .rows
            .iter()
            .filter(|row| row.transaction.logical_key() == *key)
            .cloned()
            .collect())
    }

    async fn insert(&self, transaction: &CanonicalTransaction) -> Result<i64> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.rows.push(StoredTransaction {
            id,
            transaction: transaction.clone(),
        });
        debug!("Inserted transaction {} for {}", id, transaction.owner);
        Ok(id)
    }

    async fn fetch_page(&self, offset: u64, limit: u64) -> Result<Vec<StoredTransaction>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .rows
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.rows.retain(|row| row.id != id);
        debug!("Deleted transaction {}", id);
        Ok(())
    }

    async fn update_type_by_id(&self, id: i64, transaction_type: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(row) = inner.rows.iter_mut().find(|row| row.id == id) {
            row.transaction.transaction_type = transaction_type.to_string();
        }
        Ok(())
    }
}

#[cfg(feature = "db")]
pub use libsql_store::LibsqlStore;

#[cfg(feature = "db")]
mod libsql_store {
    use super::*;
    use crate::constants::TRANSACTIONS_TABLE;
    use crate::error::ScraperError;
    use libsql::{Builder, Connection, Database};
    use std::env;
    use tracing::info;

    /// Turso/libSQL-backed store. Credentials come from the environment;
    /// the client is constructed once per process run and passed in
    /// explicitly, never held as a global.
    pub struct LibsqlStore {
        db: Database,
    }

    impl LibsqlStore {
        pub async fn new() -> Result<Self> {
            let url = env::var("LIBSQL_URL").map_err(|_| ScraperError::Store {
                message: "LIBSQL_URL environment variable not set".to_string(),
            })?;

            let auth_token = env::var("LIBSQL_AUTH_TOKEN").map_err(|_| ScraperError::Store {
                message: "LIBSQL_AUTH_TOKEN environment variable not set".to_string(),
            })?;

            info!("Connecting to Turso database at {}", url);

            let db = Builder::new_remote(url, auth_token)
                .build()
                .await
                .map_err(|e| ScraperError::Store {
                    message: format!("Failed to connect to database: {e}"),
                })?;

            Ok(Self { db })
        }

        fn connection(&self) -> Result<Connection> {
            self.db.connect().map_err(|e| ScraperError::Store {
                message: format!("Failed to get database connection: {e}"),
            })
        }

        pub async fn run_migrations(&self) -> Result<()> {
            info!("Running database migrations...");

            let conn = self.connection()?;
            let migration_sql = include_str!("../migrations/001_create_transactions.sql");

            conn.execute_batch(migration_sql)
                .await
                .map_err(|e| ScraperError::Store {
                    message: format!("Failed to run migrations: {e}"),
                })?;

            info!("Database migrations completed successfully");
            Ok(())
        }

        fn row_to_stored(row: &libsql::Row) -> Result<StoredTransaction> {
            let get_text = |idx: i32| -> Result<String> {
                row.get::<String>(idx).map_err(|e| ScraperError::Store {
                    message: format!("Failed to read column {idx}: {e}"),
                })
            };

            let id: i64 = row.get(0).map_err(|e| ScraperError::Store {
                message: format!("Failed to read id: {e}"),
            })?;

            Ok(StoredTransaction {
                id,
                transaction: CanonicalTransaction {
                    owner: get_text(1)?,
                    ticker: get_text(2)?,
                    asset_name: get_text(3)?,
                    transaction_type: get_text(4)?,
                    transaction_date: get_text(5)?,
                    amount: get_text(6)?,
                },
            })
        }

        async fn collect_rows(mut rows: libsql::Rows) -> Result<Vec<StoredTransaction>> {
            let mut results = Vec::new();
            while let Some(row) = rows.next().await.map_err(|e| ScraperError::Store {
                message: format!("Failed to read row: {e}"),
            })? {
                results.push(Self::row_to_stored(&row)?);
            }
            Ok(results)
        }
    }

    #[async_trait]
    impl TransactionStore for LibsqlStore {
        async fn find_matching(&self, key: &TransactionKey) -> Result<Vec<StoredTransaction>> {
            let conn = self.connection()?;
            let rows = conn
                .query(
                    &format!(
                        "SELECT id, owner, ticker, asset_name, transaction_type, transaction_date, amount \
                         FROM {TRANSACTIONS_TABLE} \
                         WHERE owner = ? AND ticker = ? AND transaction_type = ? \
                           AND transaction_date = ? AND amount = ?"
                    ),
                    libsql::params![
                        key.owner.clone(),
                        key.ticker.clone(),
                        key.transaction_type.clone(),
                        key.transaction_date.clone(),
                        key.amount.clone()
                    ],
                )
                .await
                .map_err(|e| ScraperError::Store {
                    message: format!("Failed to query transactions: {e}"),
                })?;

            Self::collect_rows(rows).await
        }

        async fn insert(&self, transaction: &CanonicalTransaction) -> Result<i64> {
            let conn = self.connection()?;
            conn.execute(
                &format!(
                    "INSERT INTO {TRANSACTIONS_TABLE} \
                     (owner, ticker, asset_name, transaction_type, transaction_date, amount) \
                     VALUES (?, ?, ?, ?, ?, ?)"
                ),
                libsql::params![
                    transaction.owner.clone(),
                    transaction.ticker.clone(),
                    transaction.asset_name.clone(),
                    transaction.transaction_type.clone(),
                    transaction.transaction_date.clone(),
                    transaction.amount.clone()
                ],
            )
            .await
            .map_err(|e| ScraperError::Store {
                message: format!("Failed to insert transaction: {e}"),
            })?;

            Ok(conn.last_insert_rowid())
        }

        async fn fetch_page(&self, offset: u64, limit: u64) -> Result<Vec<StoredTransaction>> {
            let conn = self.connection()?;
            let rows = conn
                .query(
                    &format!(
                        "SELECT id, owner, ticker, asset_name, transaction_type, transaction_date, amount \
                         FROM {TRANSACTIONS_TABLE} ORDER BY id LIMIT ? OFFSET ?"
                    ),
                    libsql::params![limit as i64, offset as i64],
                )
                .await
                .map_err(|e| ScraperError::Store {
                    message: format!("Failed to page transactions: {e}"),
                })?;

            Self::collect_rows(rows).await
        }

        async fn delete_by_id(&self, id: i64) -> Result<()> {
            let conn = self.connection()?;
            conn.execute(
                &format!("DELETE FROM {TRANSACTIONS_TABLE} WHERE id = ?"),
                libsql::params![id],
            )
            .await
            .map_err(|e| ScraperError::Store {
                message: format!("Failed to delete transaction {id}: {e}"),
            })?;
            Ok(())
        }

        async fn update_type_by_id(&self, id: i64, transaction_type: &str) -> Result<()> {
            let conn = self.connection()?;
            conn.execute(
                &format!("UPDATE {TRANSACTIONS_TABLE} SET transaction_type = ? WHERE id = ?"),
                libsql::params![transaction_type.to_string(), id],
            )
            .await
            .map_err(|e| ScraperError::Store {
                message: format!("Failed to update transaction {id}: {e}"),
            })?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(owner: &str, ticker: &str) -> CanonicalTransaction {
        CanonicalTransaction {
            owner: owner.to_string(),
            ticker: ticker.to_string(),
            asset_name: "Example Corp".to_string(),
            transaction_type: "buy".to_string(),
            transaction_date: "2023-01-15".to_string(),
            amount: "1001 - 15000".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = InMemoryStore::new();
        let a = store.insert(&sample("Jane Doe", "ABC")).await.unwrap();
        let b = store.insert(&sample("Jane Doe", "XYZ")).await.unwrap();
        assert!(b > a);
        assert_eq!(store.row_count(), 2);
    }

    #[tokio::test]
    async fn test_find_matching_uses_full_key() {
        let store = InMemoryStore::new();
        store.insert(&sample("Jane Doe", "ABC")).await.unwrap();

        let mut key = sample("Jane Doe", "ABC").logical_key();
        assert_eq!(store.find_matching(&key).await.unwrap().len(), 1);

        key.transaction_type = "sell".to_string();
        assert!(store.find_matching(&key).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_page_preserves_insertion_order() {
        let store = InMemoryStore::new();
        for ticker in ["A", "B", "C"] {
            store.insert(&sample("Jane Doe", ticker)).await.unwrap();
        }
        let page = store.fetch_page(1, 2).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].transaction.ticker, "B");
        assert_eq!(page[1].transaction.ticker, "C");
    }

    #[tokio::test]
    async fn test_delete_and_update() {
        let store = InMemoryStore::new();
        let id = store.insert(&sample("Jane Doe", "ABC")).await.unwrap();
        store.update_type_by_id(id, "sell").await.unwrap();
        let page = store.fetch_page(0, 10).await.unwrap();
        assert_eq!(page[0].transaction.transaction_type, "sell");

        store.delete_by_id(id).await.unwrap();
        assert_eq!(store.row_count(), 0);
    }
}
