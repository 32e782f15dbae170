use std::io::Write;
use std::path::Path;

use anyhow::Result;
use clap::Args;
use lanes_core::ItemChange;
use lanes_core::lock::LockKind;
use serde::Serialize;
use tracing::info;

use crate::output::{OutputMode, render_mode};
use crate::repo::{Project, resolve_status};

#[derive(Args, Debug)]
pub struct CompactArgs {
    /// Column to renumber. Omit to renumber every column.
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
struct CompactOutput {
    changed: bool,
    changes: Vec<ItemChange>,
}

/// Execute `lanes compact`: renumber positions to `0..n` without changing
/// relative order.
///
/// The board is renumbered while it loads, so the change list is what that
/// renumbering did to the file. It is saved and published like any other
/// commit. With a column argument, gaps in any other column are refused.
///
/// # Errors
///
/// Unknown status, gaps outside the requested column, or a load/save failure.
pub fn run_compact(args: &CompactArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let project = Project::open(project_root)?;
    let _lock = project.lock(LockKind::Exclusive)?;
    let (board, changes) = project.load_board_repairing()?;

    if let Some(raw) = &args.status {
        let status = resolve_status(board.statuses(), raw)?;
        if let Some(refused) = project.not_dense(&changes, Some(&status)) {
            return Err(refused.into());
        }
    }

    if !changes.is_empty() {
        project.save(&board)?;
        board.publish(&changes);
        info!(changes = changes.len(), "board compacted");
    }

    render_mode(
        output,
        &CompactOutput {
            changed: !changes.is_empty(),
            changes,
        },
        |v, w| writeln!(w, "changes={}", v.changes.len()),
        |v, w| {
            if v.changed {
                writeln!(w, "✓ Renumbered {} cards", v.changes.len())
            } else {
                writeln!(w, "Positions already dense; nothing changed")
            }
        },
    )
}
