//! On-disk board: `.lanes/board.json`, its lock file and the change outbox.
//!
//! ```text
//! .lanes/
//!   config.toml    board columns and sync options
//!   board.json     {"version": 1, "items": [...]}
//!   lock           advisory lock guarding load-modify-save
//!   outbox.jsonl   one line per published change set
//! ```

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use lanes_core::config::{self, LANES_DIR, ProjectConfig};
use lanes_core::lock::{BoardLock, LockKind, lock_board};
use lanes_core::{
    Board, BoardError, ChangeSink, ErrorCode, ItemChange, ItemId, StatusKey, StatusSet, WorkItem,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const BOARD_FORMAT_VERSION: u32 = 1;
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("no board found at {path}")]
    NotInitialized { path: PathBuf },

    #[error("{path} is not a valid board file: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{path} has format version {found}, expected {}", BOARD_FORMAT_VERSION)]
    UnsupportedVersion { path: PathBuf, found: u32 },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("{path} has gaps or ties in column positions ({}); refusing to save over it", statuses.join(", "))]
    NotDense { path: PathBuf, statuses: Vec<String> },
}

impl RepoError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized { .. } => ErrorCode::NotInitialized,
            Self::Corrupt { .. } | Self::UnsupportedVersion { .. } => ErrorCode::CorruptBoardFile,
            Self::Write { .. } => ErrorCode::BoardWriteFailed,
            Self::NotDense { .. } => ErrorCode::DensityViolation,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct BoardFile {
    version: u32,
    items: Vec<WorkItem>,
}

/// A directory holding an initialized `.lanes/` board.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    config: ProjectConfig,
}

impl Project {
    /// Open the board rooted at `root`.
    ///
    /// # Errors
    ///
    /// [`RepoError::NotInitialized`] if `.lanes/` is missing, or a config
    /// load failure.
    pub fn open(root: &Path) -> Result<Self> {
        let dir = root.join(LANES_DIR);
        if !dir.is_dir() {
            return Err(RepoError::NotInitialized { path: dir }.into());
        }
        let config = config::load_project_config(root)?;
        Ok(Self {
            root: root.to_path_buf(),
            config,
        })
    }

    #[must_use]
    pub fn lanes_dir(&self) -> PathBuf {
        self.root.join(LANES_DIR)
    }

    #[must_use]
    pub fn board_path(&self) -> PathBuf {
        self.lanes_dir().join("board.json")
    }

    #[must_use]
    pub fn outbox_path(&self) -> PathBuf {
        self.lanes_dir().join("outbox.jsonl")
    }

    fn lock_path(&self) -> PathBuf {
        self.lanes_dir().join("lock")
    }

    /// # Errors
    ///
    /// Returns an error if the configured status list is invalid.
    pub fn statuses(&self) -> Result<StatusSet> {
        Ok(self.config.board.status_set()?)
    }

    /// Take the board lock; held until the returned guard drops.
    ///
    /// # Errors
    ///
    /// [`lanes_core::lock::LockError`] if `.lanes/lock` cannot be opened or another
    /// process keeps a conflicting lock past the timeout.
    pub fn lock(&self, kind: LockKind) -> Result<BoardLock> {
        Ok(lock_board(&self.lock_path(), kind, LOCK_TIMEOUT)?)
    }

    /// Load the board for a command that saves it afterwards.
    ///
    /// # Errors
    ///
    /// [`RepoError::NotDense`] if the file needs renumbering first, plus
    /// everything [`Project::load_board_repairing`] reports.
    pub fn load_board(&self) -> Result<Board> {
        let (board, repairs) = self.load_board_repairing()?;
        match self.not_dense(&repairs, None) {
            Some(err) => Err(err.into()),
            None => Ok(board),
        }
    }

    /// [`RepoError::NotDense`] naming the columns `repairs` renumbered,
    /// leaving out `except`; `None` if no other column needed it.
    #[must_use]
    pub fn not_dense(
        &self,
        repairs: &[ItemChange],
        except: Option<&StatusKey>,
    ) -> Option<RepoError> {
        let mut statuses: Vec<String> = Vec::new();
        for to in repairs.iter().filter_map(|c| c.to.as_ref()) {
            if Some(&to.status) != except && !statuses.iter().any(|s| s == to.status.as_str()) {
                statuses.push(to.status.to_string());
            }
        }
        (!statuses.is_empty()).then(|| RepoError::NotDense {
            path: self.board_path(),
            statuses,
        })
    }

    /// Load the board, renumbering non-dense columns in memory.
    ///
    /// Returns the renumbering as changes against the file; nothing is
    /// published or saved. The outbox sink is attached when sync is enabled.
    ///
    /// # Errors
    ///
    /// Fails for an unreadable board file or items the config rejects.
    pub fn load_board_repairing(&self) -> Result<(Board, Vec<ItemChange>)> {
        let items = read_board_file(&self.board_path())?;
        let mut board = Board::new(self.statuses()?);
        if self.config.sync.outbox {
            board = board.with_sink(Box::new(OutboxSink::new(self.outbox_path())));
        }
        let repairs = board
            .restore(items)
            .with_context(|| format!("loading {}", self.board_path().display()))?;
        Ok((board, repairs))
    }

    /// # Errors
    ///
    /// [`RepoError::Write`] if the board file cannot be replaced.
    pub fn save(&self, board: &Board) -> Result<()> {
        Ok(write_board_file(&self.board_path(), &board.items())?)
    }
}

/// Read the items stored at `path`; a missing file is an empty board.
///
/// # Errors
///
/// [`RepoError::Corrupt`] or [`RepoError::UnsupportedVersion`].
pub fn read_board_file(path: &Path) -> Result<Vec<WorkItem>> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err).with_context(|| format!("reading {}", path.display())),
    };
    let file: BoardFile = serde_json::from_slice(&raw).map_err(|source| RepoError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;
    if file.version != BOARD_FORMAT_VERSION {
        return Err(RepoError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: file.version,
        }
        .into());
    }
    debug!(path = %path.display(), items = file.items.len(), "board loaded");
    Ok(file.items)
}

/// Replace the board file atomically: write a sibling temp file, then rename.
///
/// # Errors
///
/// [`RepoError::Write`] on any I/O failure.
pub fn write_board_file(path: &Path, items: &[WorkItem]) -> Result<(), RepoError> {
    let write_err = |source| RepoError::Write {
        path: path.to_path_buf(),
        source,
    };
    let file = BoardFile {
        version: BOARD_FORMAT_VERSION,
        items: items.to_vec(),
    };
    let mut body = serde_json::to_vec_pretty(&file).map_err(io::Error::from).map_err(write_err)?;
    body.push(b'\n');

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &body).map_err(write_err)?;
    fs::rename(&tmp, path).map_err(write_err)?;
    debug!(path = %path.display(), items = items.len(), "board saved");
    Ok(())
}

/// Next free `t-N` id.
#[must_use]
pub fn next_item_id(items: &[WorkItem]) -> ItemId {
    let next = items
        .iter()
        .filter_map(|i| i.id.as_str().strip_prefix("t-")?.parse::<u64>().ok())
        .max()
        .map_or(1, |n| n + 1);
    ItemId::from(format!("t-{next}"))
}

/// Match a user-typed status against the configured columns, ignoring case.
///
/// # Errors
///
/// [`BoardError::InvalidStatus`] if nothing matches.
pub fn resolve_status(statuses: &StatusSet, raw: &str) -> Result<StatusKey, BoardError> {
    statuses
        .resolve(raw)
        .cloned()
        .ok_or_else(|| BoardError::InvalidStatus {
            status: StatusKey::from(raw.trim()),
        })
}

/// Appends each published change set to a JSON-lines file.
#[derive(Debug)]
pub struct OutboxSink {
    path: PathBuf,
}

#[derive(Serialize)]
struct OutboxEntry<'a> {
    ts: String,
    changes: &'a [ItemChange],
}

impl OutboxSink {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ChangeSink for OutboxSink {
    fn publish(&self, changes: &[ItemChange]) -> Result<()> {
        let entry = OutboxEntry {
            ts: Utc::now().to_rfc3339(),
            changes,
        };
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))?;
        file.write_all(line.as_bytes())?;
        debug!(changes = changes.len(), "changes appended to outbox");
        Ok(())
    }
}
