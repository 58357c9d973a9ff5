//! Per-station append-only measurement histories, persisted as one
//! JSON-lines file per station.
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{error::Error, telemetry::MeteoRecord};

/// A [MeteoRecord] stamped with its arrival time, the payload itself
/// carries none.
#[derive(Debug, Copy, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MeteoEntry {
    /// Arrival time [UNIX s]
    pub time: i64,
    pub meteo: MeteoRecord,
}

struct Store<T> {
    loaded: HashMap<u16, Vec<T>>,
}

/// Append-only per-station history of `T`, durable as JSON-lines
/// keyed by station id. Entries are loaded lazily on first access;
/// appends are serialized by the internal lock, which also preserves
/// per-station append order.
pub struct History<T> {
    dir: PathBuf,
    prefix: &'static str,
    store: Mutex<Store<T>>,
}

impl<T> History<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    pub fn new<P: AsRef<Path>>(dir: P, prefix: &'static str) -> Result<Self, Error> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
            prefix,
            store: Mutex::new(Store {
                loaded: HashMap::new(),
            }),
        })
    }

    fn file_of(&self, station_id: u16) -> PathBuf {
        self.dir.join(format!("{}_ST{}.jsonl", self.prefix, station_id))
    }

    fn load(&self, station_id: u16) -> Vec<T> {
        let path = self.file_of(station_id);
        let Ok(content) = std::fs::read_to_string(&path) else {
            return Vec::new();
        };

        let mut entries = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<T>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("skipping corrupt entry in {}: {}", path.display(), e),
            }
        }
        entries
    }

    /// Appends measurements to one station history, in memory and on
    /// disk.
    pub fn append(&self, station_id: u16, entries: &[T]) -> Result<(), Error> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut lines = String::new();
        for entry in entries {
            lines.push_str(&serde_json::to_string(entry)?);
            lines.push('\n');
        }

        let mut store = self.lock();
        if !store.loaded.contains_key(&station_id) {
            let existing = self.load(station_id);
            store.loaded.insert(station_id, existing);
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.file_of(station_id))?;
        file.write_all(lines.as_bytes())?;

        if let Some(history) = store.loaded.get_mut(&station_id) {
            history.extend_from_slice(entries);
        }
        Ok(())
    }

    /// Full history of one station, oldest first.
    pub fn of_station(&self, station_id: u16) -> Vec<T> {
        let mut store = self.lock();
        if let Some(history) = store.loaded.get(&station_id) {
            return history.clone();
        }
        let loaded = self.load(station_id);
        store.loaded.insert(station_id, loaded.clone());
        loaded
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Store<T>> {
        match self.store.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
