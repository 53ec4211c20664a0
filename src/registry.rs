//! Spent address registry backends
//!
//! The registry is an append-only set of [`AddressHash`] values. Export reads
//! the whole set once, merge adds into it one address at a time. Callers pass a
//! registry handle explicitly into every operation.

use crate::address::AddressHash;
use crate::error::SpentError;
use parking_lot::RwLock;
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Result of adding an address to a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Inserted,
    Duplicate,
}

/// Abstraction for spent address stores. Enumeration order must be stable for
/// as long as no address is added.
pub trait SpentAddressRegistry: Send + Sync {
    fn all_addresses(&self) -> Result<Vec<AddressHash>, SpentError>;
    fn save_address(&self, hash: &AddressHash) -> Result<AddOutcome, SpentError>;
    fn contains(&self, hash: &AddressHash) -> Result<bool, SpentError>;
    fn len(&self) -> Result<usize, SpentError>;

    fn is_empty(&self) -> Result<bool, SpentError> {
        Ok(self.len()? == 0)
    }
}

/// SQLite-backed registry
pub struct SqliteRegistry {
    conn: Mutex<Connection>,
}

impl SqliteRegistry {
    pub fn open(path: &str) -> Result<Self, SpentError> {
        let conn = Connection::open(path)
            .map_err(|e| SpentError::DatabaseError(format!("Failed to open database: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS spent_addresses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                address TEXT NOT NULL UNIQUE
            )",
            [],
        )
        .map_err(|e| {
            SpentError::DatabaseError(format!("Failed to create spent_addresses table: {}", e))
        })?;

        Ok(SqliteRegistry {
            conn: Mutex::new(conn),
        })
    }

    /// Open a throwaway registry that lives only as long as the handle
    pub fn in_memory() -> Result<Self, SpentError> {
        Self::open(":memory:")
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SpentError> {
        self.conn
            .lock()
            .map_err(|_| SpentError::DatabaseError("Mutex poisoned".to_string()))
    }
}

impl SpentAddressRegistry for SqliteRegistry {
    fn all_addresses(&self) -> Result<Vec<AddressHash>, SpentError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT address FROM spent_addresses ORDER BY id ASC")
            .map_err(|e| SpentError::DatabaseError(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| {
                SpentError::DatabaseError(format!("Failed to query spent addresses: {}", e))
            })?;

        let mut addresses = Vec::new();
        for row in rows {
            let raw = row
                .map_err(|e| SpentError::DatabaseError(format!("Failed to read row: {}", e)))?;
            let hash = AddressHash::parse(&raw).map_err(|e| {
                SpentError::DatabaseError(format!("Corrupt address in database: {}", e))
            })?;
            addresses.push(hash);
        }

        Ok(addresses)
    }

    fn save_address(&self, hash: &AddressHash) -> Result<AddOutcome, SpentError> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "INSERT OR IGNORE INTO spent_addresses (address) VALUES (?1)",
                params![hash.as_str()],
            )
            .map_err(|e| SpentError::AddressAddFailure(format!("{}: {}", hash, e)))?;

        Ok(if changed == 0 {
            AddOutcome::Duplicate
        } else {
            AddOutcome::Inserted
        })
    }

    fn contains(&self, hash: &AddressHash) -> Result<bool, SpentError> {
        let conn = self.lock()?;
        let found: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM spent_addresses WHERE address = ?1",
                params![hash.as_str()],
                |row| row.get(0),
            )
            .map_err(|e| SpentError::DatabaseError(format!("Failed to look up address: {}", e)))?;
        Ok(found > 0)
    }

    fn len(&self) -> Result<usize, SpentError> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM spent_addresses", [], |row| row.get(0))
            .map_err(|e| SpentError::DatabaseError(format!("Failed to count addresses: {}", e)))?;
        Ok(count as usize)
    }
}

/// In-memory registry useful for tests and ephemeral runs. Enumerates in
/// insertion order.
#[derive(Clone, Default)]
pub struct InMemoryRegistry {
    inner: Arc<RwLock<InMemoryInner>>,
}

#[derive(Default)]
struct InMemoryInner {
    ordered: Vec<AddressHash>,
    members: HashSet<AddressHash>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_addresses<I>(addresses: I) -> Self
    where
        I: IntoIterator<Item = AddressHash>,
    {
        let registry = Self::new();
        {
            let mut inner = registry.inner.write();
            for hash in addresses {
                if inner.members.insert(hash.clone()) {
                    inner.ordered.push(hash);
                }
            }
        }
        registry
    }

    pub fn snapshot(&self) -> HashSet<AddressHash> {
        self.inner.read().members.clone()
    }
}

impl SpentAddressRegistry for InMemoryRegistry {
    fn all_addresses(&self) -> Result<Vec<AddressHash>, SpentError> {
        Ok(self.inner.read().ordered.clone())
    }

    fn save_address(&self, hash: &AddressHash) -> Result<AddOutcome, SpentError> {
        let mut inner = self.inner.write();
        if !inner.members.insert(hash.clone()) {
            return Ok(AddOutcome::Duplicate);
        }
        inner.ordered.push(hash.clone());
        Ok(AddOutcome::Inserted)
    }

    fn contains(&self, hash: &AddressHash) -> Result<bool, SpentError> {
        Ok(self.inner.read().members.contains(hash))
    }

    fn len(&self) -> Result<usize, SpentError> {
        Ok(self.inner.read().ordered.len())
    }
}
