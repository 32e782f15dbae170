//! Advisory lock on `.lanes/lock`.
//!
//! Mutating commands take [`LockKind::Exclusive`] for their whole
//! load-modify-save cycle; readers take [`LockKind::Shared`]. The lock sits on
//! its own file, so `board.json` can be replaced by rename while it is held.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;
use tracing::debug;

use crate::error::ErrorCode;

const FIRST_BACKOFF: Duration = Duration::from_millis(5);
const MAX_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockKind {
    /// Any number of readers.
    Shared,
    /// One writer, no readers.
    Exclusive,
}

impl fmt::Display for LockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Shared => "shared",
            Self::Exclusive => "exclusive",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("board is busy: no {kind} lock on {} after {waited:?}", path.display())]
    Busy {
        path: PathBuf,
        kind: LockKind,
        waited: Duration,
    },

    #[error("cannot open lock file {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },
}

impl LockError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Busy { .. } => ErrorCode::LockContention,
            Self::Open { .. } => ErrorCode::BoardWriteFailed,
        }
    }

    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

/// A held board lock; released on drop.
#[derive(Debug)]
pub struct BoardLock {
    file: File,
    kind: LockKind,
}

impl BoardLock {
    #[must_use]
    pub const fn kind(&self) -> LockKind {
        self.kind
    }
}

impl Drop for BoardLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn try_lock(file: &File, kind: LockKind) -> io::Result<()> {
    match kind {
        LockKind::Shared => FileExt::try_lock_shared(file),
        LockKind::Exclusive => FileExt::try_lock_exclusive(file),
    }
}

/// Take `kind` on the lock file at `path`, retrying with backoff until
/// `timeout` has passed. The file is created if missing; its directory is not.
///
/// # Errors
///
/// - [`LockError::Open`] if the lock file cannot be opened.
/// - [`LockError::Busy`] if another process still holds a conflicting lock
///   when `timeout` runs out.
pub fn lock_board(
    path: &Path,
    kind: LockKind,
    timeout: Duration,
) -> Result<BoardLock, LockError> {
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(path)
        .map_err(|source| LockError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let started = Instant::now();
    let mut backoff = FIRST_BACKOFF;
    while try_lock(&file, kind).is_err() {
        let waited = started.elapsed();
        if waited >= timeout {
            return Err(LockError::Busy {
                path: path.to_path_buf(),
                kind,
                waited,
            });
        }
        thread::sleep(backoff.min(timeout.saturating_sub(waited)));
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }

    debug!(path = %path.display(), %kind, waited = ?started.elapsed(), "board lock taken");
    Ok(BoardLock { file, kind })
}
