//! The persistent paper library: favorites, seen-state, and folders.
//!
//! All library bookkeeping is keyed by a paper's stable id. Favoriting a
//! paper marks it seen, and filing a paper into a folder favorites it.
//! Those couplings are deliberate product behavior, spelled out in the
//! operation names ([`LibraryStore::favorite_and_mark_seen`],
//! [`LibraryStore::add_to_folder_and_favorite`]) rather than buried as
//! side effects.
//!
//! Mutations are synchronous and atomic under one lock; persistence happens
//! behind the mutation on a writer thread and is best-effort. A write that
//! fails is logged and dropped, leaving in-memory state ahead of disk.

pub mod storage;

pub use storage::{FileStore, MemoryStore, StateStore, WriteBehind};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::models::{Paper, PaperSnapshot};

/// Name of the folder that always exists and cannot be removed or renamed.
pub const DEFAULT_FOLDER_NAME: &str = "Saved Papers";

const KEY_FAVORITES: &str = "favorite_ids";
const KEY_SEEN: &str = "seen_ids";
const KEY_FOLDERS: &str = "folders";
const KEY_SELECTED: &str = "selected_folder";

fn snapshot_key(stable_id: &str) -> String {
    format!("paper:{}", stable_id)
}

/// A user-defined, ordered collection of papers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperFolder {
    /// Assigned at creation, immutable afterwards
    pub id: Uuid,

    /// Unique among folders
    pub name: String,

    /// Member stable ids in insertion order, no duplicates
    pub paper_ids: Vec<String>,
}

impl PaperFolder {
    /// Create an empty folder with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            paper_ids: Vec::new(),
        }
    }
}

#[derive(Debug)]
struct LibraryState {
    favorites: HashSet<String>,
    seen: HashSet<String>,
    folders: Vec<PaperFolder>,
    selected: Uuid,
    default_id: Uuid,
}

/// The library: favorites, seen-state, folders, and paper snapshots.
///
/// One instance per running process, constructed at the composition root
/// and shared by reference.
#[derive(Debug)]
pub struct LibraryStore {
    state: Mutex<LibraryState>,
    store: Arc<dyn StateStore>,
    writer: WriteBehind,
}

impl LibraryStore {
    /// Load the library from storage, falling back per key to defaults
    /// when a key is missing or fails to parse.
    ///
    /// The default folder is ensured to exist; a persisted selection that
    /// no longer resolves against the folder list is replaced by it.
    pub fn open(store: Arc<dyn StateStore>) -> Self {
        let favorites: HashSet<String> = load_json(&*store, KEY_FAVORITES).unwrap_or_default();
        let seen: HashSet<String> = load_json(&*store, KEY_SEEN).unwrap_or_default();

        let mut folders: Vec<PaperFolder> = load_json(&*store, KEY_FOLDERS).unwrap_or_default();
        if !folders.iter().any(|f| f.name == DEFAULT_FOLDER_NAME) {
            folders.insert(0, PaperFolder::new(DEFAULT_FOLDER_NAME));
        }
        let default_id = folders
            .iter()
            .find(|f| f.name == DEFAULT_FOLDER_NAME)
            .map(|f| f.id)
            .expect("default folder was just ensured");

        let selected = load_json::<Uuid>(&*store, KEY_SELECTED)
            .filter(|id| folders.iter().any(|f| f.id == *id))
            .unwrap_or(default_id);

        let writer = WriteBehind::spawn(store.clone());

        Self {
            state: Mutex::new(LibraryState {
                favorites,
                seen,
                folders,
                selected,
                default_id,
            }),
            store,
            writer,
        }
    }

    // ========== FAVORITES ==========

    /// Whether the given stable id is favorited.
    pub fn is_favorite(&self, stable_id: &str) -> bool {
        self.state.lock().unwrap().favorites.contains(stable_id)
    }

    /// Favorite a paper. Idempotent.
    ///
    /// Favoriting marks the paper seen and stores its snapshot so it
    /// survives outside live search results.
    pub fn favorite_and_mark_seen(&self, paper: &Paper) {
        let id = paper.stable_id();
        {
            let mut state = self.state.lock().unwrap();
            state.favorites.insert(id.clone());
            state.seen.insert(id.clone());
            self.persist(&state);
        }
        self.save_snapshot(&id, paper);
    }

    /// Remove a paper from favorites. Idempotent; seen-state and folder
    /// membership are untouched.
    pub fn unfavorite(&self, stable_id: &str) {
        let mut state = self.state.lock().unwrap();
        state.favorites.remove(stable_id);
        self.persist(&state);
    }

    /// Currently favorited stable ids.
    pub fn favorite_ids(&self) -> HashSet<String> {
        self.state.lock().unwrap().favorites.clone()
    }

    // ========== SEEN ==========

    /// Whether the given stable id has ever been shown to the user.
    pub fn has_seen(&self, stable_id: &str) -> bool {
        self.state.lock().unwrap().seen.contains(stable_id)
    }

    /// Record that a paper was shown. Idempotent; never reverts.
    pub fn mark_seen(&self, paper: &Paper) {
        let id = paper.stable_id();
        let mut state = self.state.lock().unwrap();
        if state.seen.insert(id) {
            self.persist(&state);
        }
    }

    /// Stable ids of every paper ever shown.
    pub fn seen_ids(&self) -> HashSet<String> {
        self.state.lock().unwrap().seen.clone()
    }

    // ========== FOLDERS ==========

    /// Create a folder, or return the existing one with the exact same
    /// name (case-sensitive).
    pub fn add_folder(&self, name: &str) -> Uuid {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state.folders.iter().find(|f| f.name == name) {
            return existing.id;
        }

        let folder = PaperFolder::new(name);
        let id = folder.id;
        state.folders.push(folder);
        self.persist(&state);
        id
    }

    /// File a paper into a folder.
    ///
    /// Membership is added at most once. Filing always favorites the paper,
    /// marks it seen, and stores its snapshot. Returns `false` without any
    /// effect when the folder id does not resolve.
    pub fn add_to_folder_and_favorite(&self, paper: &Paper, folder_id: Uuid) -> bool {
        let id = paper.stable_id();
        {
            let mut state = self.state.lock().unwrap();
            let Some(idx) = state.folders.iter().position(|f| f.id == folder_id) else {
                return false;
            };

            if !state.folders[idx].paper_ids.contains(&id) {
                state.folders[idx].paper_ids.push(id.clone());
            }
            state.favorites.insert(id.clone());
            state.seen.insert(id.clone());
            self.persist(&state);
        }
        self.save_snapshot(&id, paper);
        true
    }

    /// Remember a folder as the target for [`Self::add_to_selected_folder`].
    ///
    /// Only the id is remembered; it is re-resolved on every use.
    pub fn select_folder(&self, folder_id: Uuid) {
        let mut state = self.state.lock().unwrap();
        state.selected = folder_id;
        self.persist(&state);
    }

    /// File a paper into the currently selected folder.
    ///
    /// When the remembered id no longer resolves, the selection reverts to
    /// the default folder and this particular add is dropped. The caller
    /// hears about it through the `false` return; there is no retry.
    pub fn add_to_selected_folder(&self, paper: &Paper) -> bool {
        let target = {
            let mut state = self.state.lock().unwrap();
            if state.folders.iter().any(|f| f.id == state.selected) {
                Some(state.selected)
            } else {
                tracing::warn!("selected folder no longer exists; reverting to the default folder");
                state.selected = state.default_id;
                self.persist(&state);
                None
            }
        };

        match target {
            Some(folder_id) => self.add_to_folder_and_favorite(paper, folder_id),
            None => false,
        }
    }

    /// Rename a folder. No-op when the id is the default folder, the id
    /// does not resolve, or the name is already taken.
    pub fn rename_folder(&self, folder_id: Uuid, new_name: &str) -> bool {
        let mut state = self.state.lock().unwrap();
        if folder_id == state.default_id {
            return false;
        }
        if state.folders.iter().any(|f| f.name == new_name) {
            return false;
        }
        let Some(folder) = state.folders.iter_mut().find(|f| f.id == folder_id) else {
            return false;
        };

        folder.name = new_name.to_string();
        self.persist(&state);
        true
    }

    /// Remove a folder. The default folder is refused. Members keep their
    /// favorite and seen status; removing the selected folder moves the
    /// selection to the default folder.
    pub fn remove_folder(&self, folder_id: Uuid) -> bool {
        let mut state = self.state.lock().unwrap();
        if folder_id == state.default_id {
            return false;
        }
        let Some(idx) = state.folders.iter().position(|f| f.id == folder_id) else {
            return false;
        };

        state.folders.remove(idx);
        if state.selected == folder_id {
            state.selected = state.default_id;
        }
        self.persist(&state);
        true
    }

    /// All folders in creation order.
    pub fn folders(&self) -> Vec<PaperFolder> {
        self.state.lock().unwrap().folders.clone()
    }

    /// Look up a folder by exact name.
    pub fn folder_by_name(&self, name: &str) -> Option<PaperFolder> {
        self.state
            .lock()
            .unwrap()
            .folders
            .iter()
            .find(|f| f.name == name)
            .cloned()
    }

    /// Id of the default folder.
    pub fn default_folder_id(&self) -> Uuid {
        self.state.lock().unwrap().default_id
    }

    /// The currently selected folder, resolved at call time; falls back to
    /// the default folder when the remembered id is stale.
    pub fn selected_folder(&self) -> PaperFolder {
        let state = self.state.lock().unwrap();
        state
            .folders
            .iter()
            .find(|f| f.id == state.selected)
            .or_else(|| state.folders.iter().find(|f| f.id == state.default_id))
            .cloned()
            .expect("default folder always exists")
    }

    // ========== SNAPSHOTS ==========

    /// Store a paper's snapshot under its stable id.
    pub fn save_paper(&self, paper: &Paper) {
        self.save_snapshot(&paper.stable_id(), paper);
    }

    /// Load a paper back from its snapshot. `None` when no snapshot exists
    /// or it fails to parse.
    pub fn load_paper(&self, stable_id: &str) -> Option<Paper> {
        let raw = self.store.get(&snapshot_key(stable_id))?;
        match serde_json::from_str::<PaperSnapshot>(&raw) {
            Ok(snapshot) => Some(snapshot.to_paper()),
            Err(e) => {
                tracing::warn!(stable_id = %stable_id, error = %e, "unreadable paper snapshot");
                None
            }
        }
    }

    /// A folder's papers, loaded from snapshots in member order. Members
    /// without a readable snapshot are skipped.
    pub fn papers_in_folder(&self, folder_id: Uuid) -> Vec<Paper> {
        let member_ids = {
            let state = self.state.lock().unwrap();
            match state.folders.iter().find(|f| f.id == folder_id) {
                Some(folder) => folder.paper_ids.clone(),
                None => return Vec::new(),
            }
        };

        member_ids
            .iter()
            .filter_map(|id| self.load_paper(id))
            .collect()
    }

    // ========== PERSISTENCE ==========

    /// Block until every enqueued write has been attempted.
    pub fn flush(&self) {
        self.writer.flush();
    }

    fn persist(&self, state: &LibraryState) {
        self.enqueue_json(KEY_FAVORITES, &state.favorites);
        self.enqueue_json(KEY_SEEN, &state.seen);
        self.enqueue_json(KEY_FOLDERS, &state.folders);
        self.enqueue_json(KEY_SELECTED, &state.selected);
    }

    fn save_snapshot(&self, stable_id: &str, paper: &Paper) {
        self.enqueue_json(&snapshot_key(stable_id), &PaperSnapshot::from(paper));
    }

    fn enqueue_json<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.writer.put(key, json),
            Err(e) => tracing::warn!(key = %key, error = %e, "failed to serialize library state"),
        }
    }
}

fn load_json<T: serde::de::DeserializeOwned>(store: &dyn StateStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "corrupted library state, using defaults");
            None
        }
    }
}
