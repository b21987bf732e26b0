use crate::config;
use crate::error::StorageError;
use rusqlite::{params, Connection};
use std::path::Path;
use tokio::sync::{mpsc, oneshot};

type Reply<T> = oneshot::Sender<Result<T, StorageError>>;

pub enum StoreRequest {
    Get {
        key: String,
        reply: Reply<Option<String>>,
    },
    Set {
        key: String,
        value: String,
        reply: Reply<()>,
    },
    Remove {
        key: String,
        reply: Reply<()>,
    },
}

/// Asynchronous key-value store. Every clone talks to the same actor thread,
/// which applies requests one at a time; there is no cross-request
/// serialization, so read-modify-write cycles from two holders race and the
/// last write wins.
#[derive(Clone)]
pub struct Store {
    tx: mpsc::UnboundedSender<StoreRequest>,
}

impl Store {
    pub fn open_default() -> Result<Self, StorageError> {
        let data_dir = config::get_config_dir();
        std::fs::create_dir_all(&data_dir)?;
        Self::open(data_dir.join("local.db"))
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        // Open synchronously so a broken database fails at startup.
        let conn = Connection::open(path.as_ref())?;
        Self::spawn(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::spawn(Connection::open_in_memory()?)
    }

    fn spawn(conn: Connection) -> Result<Self, StorageError> {
        let mut actor = StoreInternal::new(conn)?;
        let (tx, rx) = mpsc::unbounded_channel();

        std::thread::spawn(move || {
            actor.run(rx);
        });

        Ok(Self { tx })
    }

    /// A store whose actor is already gone; every call fails with
    /// `StorageError::Unavailable`.
    #[cfg(test)]
    pub fn disconnected() -> Self {
        let (tx, _rx) = mpsc::unbounded_channel();
        Self { tx }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> StoreRequest,
    ) -> Result<T, StorageError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .map_err(|_| StorageError::Unavailable)?;
        rx.await.map_err(|_| StorageError::Unavailable)?
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let key = key.to_string();
        self.request(|reply| StoreRequest::Get { key, reply }).await
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let key = key.to_string();
        let value = value.to_string();
        self.request(|reply| StoreRequest::Set { key, value, reply })
            .await
    }

    pub async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let key = key.to_string();
        self.request(|reply| StoreRequest::Remove { key, reply })
            .await
    }
}

// Synchronous internal implementation
struct StoreInternal {
    conn: Connection,
}

impl StoreInternal {
    fn new(conn: Connection) -> Result<Self, StorageError> {
        let internal = Self { conn };
        internal.create_tables()?;
        Ok(internal)
    }

    fn create_tables(&self) -> Result<(), StorageError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT
            );",
            [],
        )?;
        Ok(())
    }

    fn run(&mut self, mut rx: mpsc::UnboundedReceiver<StoreRequest>) {
        while let Some(req) = rx.blocking_recv() {
            match req {
                StoreRequest::Get { key, reply } => {
                    let _ = reply.send(self.get(&key));
                }
                StoreRequest::Set { key, value, reply } => {
                    let _ = reply.send(self.set(&key, &value));
                }
                StoreRequest::Remove { key, reply } => {
                    let _ = reply.send(self.remove(&key));
                }
            }
        }
        log::debug!("store actor stopped");
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let res: Result<String, rusqlite::Error> = self.conn.query_row(
            "SELECT value FROM kv_store WHERE key = ?1",
            params![key],
            |row| row.get(0),
        );

        match res {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv_store (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }
}
