use std::io::Write;
use std::path::Path;

use anyhow::Result;
use clap::Args;
use lanes_core::ItemId;
use lanes_core::lock::LockKind;

use crate::output::{OutputMode, render};
use crate::repo::Project;

#[derive(Args, Debug)]
pub struct RmArgs {
    /// Id of the card to remove.
    pub id: String,
}

/// Execute `lanes rm`. Cards below the removed one shift up by one.
///
/// # Errors
///
/// [`lanes_core::BoardError::NotFound`] for an unknown id, or a load/save
/// failure.
pub fn run_rm(args: &RmArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let project = Project::open(project_root)?;
    let _lock = project.lock(LockKind::Exclusive)?;
    let board = project.load_board()?;

    let removed = board.remove_item(&ItemId::from(args.id.trim()))?;
    project.save(&board)?;

    render(output, &removed, |v, w| {
        writeln!(w, "removed {} from {}", v.id, v.status)
    })
}
