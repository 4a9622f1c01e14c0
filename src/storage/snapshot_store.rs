//! File-backed persistence of the timer snapshot

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::{error::FocusError, state::TimerState};

/// Fixed namespace key of the focus snapshot
pub const SNAPSHOT_KEY: &str = "ch.focus.v1";

/// Stores the complete timer snapshot as one JSON file.
///
/// The store remembers the bytes it last wrote or read, which is how it tells
/// its own writes apart from writes made by another instance sharing the file.
#[derive(Debug)]
pub struct SnapshotStore {
    path: PathBuf,
    last_seen: Mutex<Option<Vec<u8>>>,
}

impl SnapshotStore {
    /// Create a store for the snapshot file inside `dir`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{SNAPSHOT_KEY}.json")),
            last_seen: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot, falling back to defaults on any problem
    pub fn load(&self) -> TimerState {
        match fs::read(&self.path) {
            Ok(bytes) => {
                let state = TimerState::from_json_slice(&bytes);
                self.remember(Some(bytes));
                info!("Loaded focus snapshot from {}", self.path.display());
                state
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No focus snapshot at {}, starting fresh", self.path.display());
                TimerState::new()
            }
            Err(e) => {
                warn!("Failed to read focus snapshot {}: {}", self.path.display(), e);
                TimerState::new()
            }
        }
    }

    /// Write the whole snapshot atomically
    pub fn save(&self, state: &TimerState) -> Result<(), FocusError> {
        let bytes = serde_json::to_vec(state)?;
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        // One temp file per write; instances sharing the directory never share a temp name
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!("Persisted focus snapshot ({} bytes)", bytes.len());
        self.remember(Some(bytes));
        Ok(())
    }

    /// Check the file for a snapshot this store did not produce.
    ///
    /// Returns the decoded state only when the file content differs from what
    /// this store last wrote or read.
    pub fn poll_external(&self) -> Result<Option<TimerState>, FocusError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut last_seen = self
            .last_seen
            .lock()
            .map_err(|_| FocusError::LockPoisoned("snapshot store"))?;
        if last_seen.as_deref() == Some(bytes.as_slice()) {
            return Ok(None);
        }

        let state = TimerState::from_json_slice(&bytes);
        *last_seen = Some(bytes);
        Ok(Some(state))
    }

    fn remember(&self, bytes: Option<Vec<u8>>) {
        match self.last_seen.lock() {
            Ok(mut last_seen) => *last_seen = bytes,
            Err(e) => warn!("Failed to record snapshot contents: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ActivePhase, FocusEngine, Phase};
    use std::thread;
    use tempfile::tempdir;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        assert_eq!(store.load(), TimerState::new());
    }

    #[test]
    fn saved_state_reloads_equal() {
        let dir = tempdir().unwrap();
        let mut engine = FocusEngine::default();
        engine.set_preset(45, 15);
        engine.start(1_000);
        engine.skip();
        engine.set_auto_start_next(true);

        SnapshotStore::new(dir.path()).save(engine.state()).unwrap();
        assert_eq!(&SnapshotStore::new(dir.path()).load(), engine.state());
    }

    #[test]
    fn snapshot_file_uses_fixed_key() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        store.save(&TimerState::new()).unwrap();
        assert_eq!(store.path(), dir.path().join("ch.focus.v1.json"));
        assert!(store.path().exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn corrupted_file_loads_defaults() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("ch.focus.v1.json"), b"{\"phase\": \"WO").unwrap();
        assert_eq!(SnapshotStore::new(dir.path()).load(), TimerState::new());
    }

    #[test]
    fn own_writes_are_not_reported_as_external() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        store.save(&TimerState::new()).unwrap();
        assert!(store.poll_external().unwrap().is_none());
    }

    #[test]
    fn poll_without_file_reports_nothing() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        assert!(store.poll_external().unwrap().is_none());
    }

    #[test]
    fn other_instance_writes_are_detected_once() {
        let dir = tempdir().unwrap();
        let mine = SnapshotStore::new(dir.path());
        let theirs = SnapshotStore::new(dir.path());
        mine.save(&TimerState::new()).unwrap();

        let mut engine = FocusEngine::default();
        engine.set_phase(ActivePhase::Break);
        theirs.save(engine.state()).unwrap();

        let seen = mine.poll_external().unwrap().unwrap();
        assert_eq!(seen.phase, Phase::Break);
        assert!(mine.poll_external().unwrap().is_none());
    }

    #[test]
    fn concurrent_writers_never_lose_a_save() {
        let dir = tempdir().unwrap();
        let work = {
            let mut engine = FocusEngine::default();
            engine.set_phase(ActivePhase::Work);
            engine.state().clone()
        };
        let rest = {
            let mut engine = FocusEngine::default();
            engine.set_phase(ActivePhase::Break);
            engine.state().clone()
        };

        let writers: Vec<_> = [work.clone(), rest.clone()]
            .into_iter()
            .map(|state| {
                let store = SnapshotStore::new(dir.path());
                thread::spawn(move || {
                    (0..500).filter(|_| store.save(&state).is_err()).count()
                })
            })
            .collect();

        let reader = SnapshotStore::new(dir.path());
        for _ in 0..200 {
            if let Ok(bytes) = fs::read(reader.path()) {
                let state = TimerState::from_json_slice(&bytes);
                assert!(state == work || state == rest);
            }
        }

        for writer in writers {
            assert_eq!(writer.join().unwrap(), 0);
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
