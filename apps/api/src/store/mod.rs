//! Record Store: flat-file JSON collections shared by every session.
//!
//! Each collection is one JSON object keyed by username. Reads fail soft: a
//! missing, empty or malformed file is an empty collection. Writes go through
//! [`atomic::write_json_atomic`] so a crash mid-save never truncates a file.
//!
//! Loaded collections are cached; every save attempt on a collection drops its
//! cached read so the next load goes back to disk. Each save also bumps the
//! collection's generation, and a load only fills the cache if no save landed
//! while it was reading.

pub mod atomic;

use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

pub use atomic::write_atomic;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The persisted collections. All of them are keyed by username.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Profiles,
    ProfilePictures,
    History,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Users,
        Collection::Profiles,
        Collection::ProfilePictures,
        Collection::History,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Collection::Users => "users.json",
            Collection::Profiles => "profile.json",
            Collection::ProfilePictures => "profile_pics.json",
            Collection::History => "history.json",
        }
    }
}

pub type Records = Map<String, Value>;

/// A value that was written through the store, plus the warning raised if the
/// write failed. The value stands either way; a warning means it may be lost
/// on restart.
#[derive(Debug, Clone)]
pub struct Persisted<T> {
    pub value: T,
    pub warning: Option<String>,
}

impl<T> Persisted<T> {
    pub fn new(value: T, saved: Result<(), StoreError>) -> Self {
        Self {
            value,
            warning: saved.err().map(|e| format!("File save error: {e}")),
        }
    }

    pub fn clean(value: T) -> Self {
        Self {
            value,
            warning: None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Persisted<U> {
        Persisted {
            value: f(self.value),
            warning: self.warning,
        }
    }
}

#[derive(Default)]
struct Cache {
    records: HashMap<Collection, Records>,
    generations: HashMap<Collection, u64>,
}

impl Cache {
    fn generation(&self, collection: Collection) -> u64 {
        self.generations.get(&collection).copied().unwrap_or(0)
    }
}

pub struct RecordStore {
    dir: PathBuf,
    cache: Mutex<Cache>,
    write_locks: HashMap<Collection, Mutex<()>>,
}

impl RecordStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: Mutex::new(Cache::default()),
            write_locks: Collection::ALL
                .iter()
                .map(|c| (*c, Mutex::new(())))
                .collect(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, collection: Collection) -> PathBuf {
        self.dir.join(collection.file_name())
    }

    /// Returns the raw keyed collection, or an empty mapping on first run or
    /// unreadable content.
    pub fn load(&self, collection: Collection) -> Records {
        let generation = {
            let cache = self.cache.lock();
            if let Some(cached) = cache.records.get(&collection) {
                debug!("cache hit for {}", collection.file_name());
                return cached.clone();
            }
            cache.generation(collection)
        };

        let records = read_records(&self.path_of(collection));
        self.fill_cache(collection, generation, &records);
        records
    }

    /// Caches `records` read at `generation`, unless a save has happened since.
    fn fill_cache(&self, collection: Collection, generation: u64, records: &Records) {
        let mut cache = self.cache.lock();
        if cache.generation(collection) == generation {
            cache.records.insert(collection, records.clone());
        } else {
            debug!("discarding stale read of {}", collection.file_name());
        }
    }

    /// Typed view of a collection. Entries that do not deserialize into `V`
    /// are skipped rather than failing the whole collection.
    pub fn load_keyed<V: DeserializeOwned>(&self, collection: Collection) -> BTreeMap<String, V> {
        self.load(collection)
            .into_iter()
            .filter_map(|(key, value)| match serde_json::from_value::<V>(value) {
                Ok(v) => Some((key, v)),
                Err(e) => {
                    warn!(
                        "skipping malformed record '{key}' in {}: {e}",
                        collection.file_name()
                    );
                    None
                }
            })
            .collect()
    }

    /// Looks up a single typed record.
    pub fn get<V: DeserializeOwned>(&self, collection: Collection, key: &str) -> Option<V> {
        let value = self.load(collection).remove(key)?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(
                    "malformed record '{key}' in {}: {e}",
                    collection.file_name()
                );
                None
            }
        }
    }

    /// Atomically replaces the collection file. Failures are returned to the
    /// caller, who treats them as warnings.
    pub fn save<T: Serialize + ?Sized>(
        &self,
        collection: Collection,
        data: &T,
    ) -> Result<(), StoreError> {
        let result = atomic::write_json_atomic(&self.path_of(collection), data);
        {
            let mut cache = self.cache.lock();
            cache.records.remove(&collection);
            *cache.generations.entry(collection).or_insert(0) += 1;
        }
        if let Err(e) = &result {
            warn!("failed to save {}: {e}", collection.file_name());
        }
        result
    }

    /// Load, mutate, save while holding the collection's write lock, so two
    /// requests in this process cannot interleave their read-modify-write.
    /// Writers in other processes are not covered and remain last-writer-wins.
    pub fn modify<R>(
        &self,
        collection: Collection,
        f: impl FnOnce(&mut Records) -> R,
    ) -> Persisted<R> {
        match self.try_modify(collection, |records| Ok::<R, Infallible>(f(records))) {
            Ok(persisted) => persisted,
            Err(never) => match never {},
        }
    }

    /// Like [`RecordStore::modify`], but nothing is written when `f` rejects
    /// the change.
    pub fn try_modify<R, E>(
        &self,
        collection: Collection,
        f: impl FnOnce(&mut Records) -> Result<R, E>,
    ) -> Result<Persisted<R>, E> {
        let _guard = self.write_locks.get(&collection).map(|l| l.lock());
        let mut records = self.load(collection);
        let out = f(&mut records)?;
        let saved = self.save(collection, &records);
        Ok(Persisted::new(out, saved))
    }
}

fn read_records(path: &Path) -> Records {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("could not read {}: {e}", path.display());
            }
            return Records::new();
        }
    };

    let content = content.trim();
    if content.is_empty() {
        return Records::new();
    }

    match serde_json::from_str::<Value>(content) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            warn!("{} is not a JSON object, treating as empty", path.display());
            Records::new()
        }
        Err(e) => {
            warn!("{} is malformed ({e}), treating as empty", path.display());
            Records::new()
        }
    }
}
