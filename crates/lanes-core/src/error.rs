use std::fmt;

use crate::model::{ItemId, StatusKey};

/// Machine-readable error codes for front ends and scripted callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    InvalidStatusSet,
    ItemNotFound,
    InvalidStatus,
    DuplicateItem,
    DensityViolation,
    CorruptBoardFile,
    BoardWriteFailed,
    LockContention,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::InvalidStatusSet => "E1003",
            Self::ItemNotFound => "E2001",
            Self::InvalidStatus => "E2002",
            Self::DuplicateItem => "E2003",
            Self::DensityViolation => "E3001",
            Self::CorruptBoardFile => "E3002",
            Self::BoardWriteFailed => "E5001",
            Self::LockContention => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Board not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidStatusSet => "Invalid status configuration",
            Self::ItemNotFound => "Item not found",
            Self::InvalidStatus => "Status is not a configured column",
            Self::DuplicateItem => "Item ID already exists",
            Self::DensityViolation => "Positions are not dense within a status",
            Self::CorruptBoardFile => "Board file is corrupt",
            Self::BoardWriteFailed => "Board file write failed",
            Self::LockContention => "Board is locked by another lanes process",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `lanes init` to create a board in this directory."),
            Self::ConfigParseError => Some("Fix syntax in .lanes/config.toml and retry."),
            Self::InvalidStatusSet => {
                Some("List at least one status in [board] statuses, without duplicates.")
            }
            Self::ItemNotFound => Some("Run `lanes show` to list item IDs."),
            Self::InvalidStatus => Some("Use one of the statuses configured in .lanes/config.toml."),
            Self::DuplicateItem => None,
            Self::DensityViolation => Some("Run `lanes compact` to renumber positions."),
            Self::CorruptBoardFile => Some("Restore .lanes/board.json from version control."),
            Self::BoardWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => {
                Some("Retry once the other `lanes` command exits; it holds `.lanes/lock`.")
            }
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// A proposed item set breaks a store invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The same item ID appears more than once.
    #[error("duplicate item id {id}")]
    DuplicateId { id: ItemId },

    /// Positions within a status are not exactly `0..n`.
    #[error("positions in status {status} are not dense: {positions:?}")]
    NotDense {
        status: StatusKey,
        /// Sorted positions found for the status.
        positions: Vec<usize>,
    },
}

/// Errors surfaced by board operations.
///
/// Every variant leaves the store unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("item {id} not found")]
    NotFound { id: ItemId },

    #[error("status {status} is not a configured column")]
    InvalidStatus { status: StatusKey },

    #[error("item {id} already exists")]
    DuplicateId { id: ItemId },

    #[error("invalid board state: {0}")]
    Validation(#[from] ValidationError),
}

impl BoardError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::ItemNotFound,
            Self::InvalidStatus { .. } => ErrorCode::InvalidStatus,
            Self::DuplicateId { .. } | Self::Validation(ValidationError::DuplicateId { .. }) => {
                ErrorCode::DuplicateItem
            }
            Self::Validation(ValidationError::NotDense { .. }) => ErrorCode::DensityViolation,
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

/// Errors loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("status set must not be empty")]
    EmptyStatusSet,

    #[error("status {0} is listed more than once")]
    DuplicateStatus(String),

    #[error("status names must not be blank")]
    BlankStatus,
}

impl ConfigError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } | Self::Parse { .. } => ErrorCode::ConfigParseError,
            Self::EmptyStatusSet | Self::DuplicateStatus(_) | Self::BlankStatus => {
                ErrorCode::InvalidStatusSet
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::NotInitialized,
            ErrorCode::ConfigParseError,
            ErrorCode::InvalidStatusSet,
            ErrorCode::ItemNotFound,
            ErrorCode::InvalidStatus,
            ErrorCode::DuplicateItem,
            ErrorCode::DensityViolation,
            ErrorCode::CorruptBoardFile,
            ErrorCode::BoardWriteFailed,
            ErrorCode::LockContention,
            ErrorCode::InternalUnexpected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::InvalidStatus.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn board_errors_map_to_codes() {
        let not_found = BoardError::NotFound { id: "t-9".into() };
        assert_eq!(not_found.code(), ErrorCode::ItemNotFound);
        assert!(not_found.hint().is_some());

        let gap = BoardError::from(ValidationError::NotDense {
            status: "TODO".into(),
            positions: vec![0, 2],
        });
        assert_eq!(gap.code(), ErrorCode::DensityViolation);

        let dup = BoardError::from(ValidationError::DuplicateId { id: "t-1".into() });
        assert_eq!(dup.code(), ErrorCode::DuplicateItem);
    }

    #[test]
    fn display_names_the_offending_value() {
        let err = BoardError::InvalidStatus {
            status: "BLOCKED".into(),
        };
        assert_eq!(err.to_string(), "status BLOCKED is not a configured column");
    }
}
