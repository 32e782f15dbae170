use std::path::Path;

use anyhow::{Context as _, Result};
use clap::Args;
use lanes_core::lock::LockKind;
use lanes_core::{ItemId, MoveInstruction};

use super::{MoveOutput, render_move};
use crate::output::OutputMode;
use crate::repo::{Project, resolve_status};

#[derive(Args, Debug)]
pub struct MvArgs {
    /// Id of the card to move.
    pub id: String,

    /// Destination column.
    pub status: String,

    /// Zero-based slot in the destination column. Omit to append;
    /// values past the end also append.
    #[arg(short, long)]
    pub index: Option<usize>,
}

/// Execute `lanes mv`.
///
/// # Errors
///
/// Unknown id or status, or a load/save failure. Nothing is written on
/// error.
pub fn run_mv(args: &MvArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let project = Project::open(project_root)?;
    let _lock = project.lock(LockKind::Exclusive)?;
    let board = project.load_board()?;

    let id = ItemId::from(args.id.trim());
    let status = resolve_status(board.statuses(), &args.status)?;
    let instruction = MoveInstruction::new(id.clone(), status, args.index.unwrap_or(usize::MAX));

    let report = board
        .move_item(&instruction)
        .with_context(|| format!("moving {id}"))?;
    if !report.is_noop() {
        project.save(&board)?;
    }

    render_move(output, &MoveOutput::from_report(&id, report))
}
