//! Key-value persistence for library state.
//!
//! The library persists through a small [`StateStore`] seam: four state
//! keys plus one snapshot entry per saved paper. The default backend keeps
//! one JSON file per key in the storage directory, file names derived from
//! the md5 of the key:
//!
//! ```text
//! ~/.config/paper-trail/library/
//!   <hash>.json
//! ```
//!
//! Writes go through a [`WriteBehind`] worker thread: fire-and-forget, no
//! retry, failures logged and dropped. Nothing may assume a write is
//! durable before the process's next read of that key.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// Storage seam for library state.
pub trait StateStore: Send + Sync + std::fmt::Debug {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: &str) -> io::Result<()>;
}

/// In-memory store used by tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<std::collections::HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn put(&self, key: &str, value: &str) -> io::Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// File-per-key store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created lazily on
    /// first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory this store writes into.
    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let digest = md5::compute(key.as_bytes());
        self.dir.join(format!("{:x}.json", digest))
    }
}

impl StateStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn put(&self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)
    }
}

enum Job {
    Put { key: String, value: String },
    Flush(mpsc::SyncSender<()>),
}

/// Background writer draining library persistence jobs.
///
/// Failed writes are logged at WARN and dropped; in-memory state is allowed
/// to run ahead of disk.
#[derive(Debug)]
pub struct WriteBehind {
    tx: Option<mpsc::Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl WriteBehind {
    /// Spawn the writer thread over the given store.
    pub fn spawn(store: Arc<dyn StateStore>) -> Self {
        let (tx, rx) = mpsc::channel::<Job>();

        let handle = std::thread::Builder::new()
            .name("library-writer".to_string())
            .spawn(move || {
                for job in rx {
                    match job {
                        Job::Put { key, value } => {
                            if let Err(e) = store.put(&key, &value) {
                                tracing::warn!(key = %key, error = %e, "dropping failed library write");
                            }
                        }
                        Job::Flush(ack) => {
                            let _ = ack.send(());
                        }
                    }
                }
            })
            .expect("Failed to spawn library writer thread");

        Self {
            tx: Some(tx),
            handle: Some(handle),
        }
    }

    /// Enqueue a write. Never blocks on I/O.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(Job::Put {
                key: key.into(),
                value: value.into(),
            });
        }
    }

    /// Block until every previously enqueued write has been attempted.
    pub fn flush(&self) {
        if let Some(tx) = &self.tx {
            let (ack_tx, ack_rx) = mpsc::sync_channel(0);
            if tx.send(Job::Flush(ack_tx)).is_ok() {
                let _ = ack_rx.recv();
            }
        }
    }
}

impl Drop for WriteBehind {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain what is queued and exit.
        drop(self.tx.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
