use std::fs;
use std::io::{Read as _, Seek, SeekFrom, Write as _};
use std::path::{Path, PathBuf};

use super::snapshot::{HistorySnapshot, RunRecord};
use crate::error::CoreError;

const HISTORY_FILE: &str = "history.json";

/// JSON file of recent run records, guarded by `fs2` file locks.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    retain_runs: usize,
}

/// Held for the duration of a run so two runs never race on the same history.
#[derive(Debug)]
pub struct RunGuard {
    file: fs::File,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>, retain_runs: usize) -> Self {
        Self {
            path: path.into(),
            retain_runs: retain_runs.max(1),
        }
    }

    /// `<data dir>/radar/history.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("radar").join(HISTORY_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn ensure_parent(&self) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    /// Take the run-level lock. Blocks while another run holds it.
    pub fn lock_run(&self) -> Result<RunGuard, CoreError> {
        self.ensure_parent()?;
        let file = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())?;
        fs2::FileExt::lock_exclusive(&file).map_err(CoreError::Io)?;
        Ok(RunGuard { file })
    }

    /// Load the snapshot under a shared lock. A missing file is an empty history.
    pub fn load(&self) -> Result<HistorySnapshot, CoreError> {
        let file = match fs::OpenOptions::new().read(true).open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(HistorySnapshot::empty())
            }
            Err(e) => return Err(CoreError::Io(e)),
        };
        fs2::FileExt::lock_shared(&file).map_err(CoreError::Io)?;
        let mut data = String::new();
        let read = (&file).read_to_string(&mut data);
        fs2::FileExt::unlock(&file).map_err(CoreError::Io)?;
        read?;
        parse_snapshot(&data)
    }

    /// Append a run record under an exclusive lock and trim to `retain_runs`.
    pub fn append(&self, record: RunRecord) -> Result<HistorySnapshot, CoreError> {
        self.ensure_parent()?;
        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;
        fs2::FileExt::lock_exclusive(&file).map_err(CoreError::Io)?;

        let result = (|| -> Result<HistorySnapshot, CoreError> {
            // Re-read under lock to get latest state
            let mut data = String::new();
            (&file).read_to_string(&mut data)?;
            let mut snapshot = parse_snapshot(&data)?;

            if snapshot.runs.iter().any(|r| r.run_id == record.run_id) {
                return Err(CoreError::History(format!(
                    "run {} is already recorded",
                    record.run_id
                )));
            }
            snapshot.runs.push(record);
            let excess = snapshot.runs.len().saturating_sub(self.retain_runs);
            snapshot.runs.drain(..excess);

            let json = serde_json::to_string_pretty(&snapshot)?;
            file.set_len(0)?;
            (&file).seek(SeekFrom::Start(0))?;
            (&file).write_all(json.as_bytes())?;
            Ok(snapshot)
        })();

        fs2::FileExt::unlock(&file).map_err(CoreError::Io)?;
        result
    }
}

fn parse_snapshot(data: &str) -> Result<HistorySnapshot, CoreError> {
    if data.trim().is_empty() {
        return Ok(HistorySnapshot::empty());
    }
    serde_json::from_str(data)
        .map_err(|e| CoreError::History(format!("unreadable history file: {e}")))
}
