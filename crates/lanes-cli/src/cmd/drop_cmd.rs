use std::io::Write;
use std::path::Path;

use anyhow::{Context as _, Result};
use clap::{ArgGroup, Args};
use lanes_core::lock::LockKind;
use lanes_core::{DropTarget, ItemId};
use serde::Serialize;
use tracing::debug;

use super::{MoveOutput, render_move};
use crate::output::{OutputMode, render_mode};
use crate::repo::{Project, resolve_status};

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["on", "column", "miss"])))]
pub struct DropArgs {
    /// Id of the dragged card.
    pub id: String,

    /// Drop onto this card; the dragged card lands just before it.
    #[arg(long, value_name = "ID")]
    pub on: Option<String>,

    /// Drop onto a column's empty area; the card lands at its tail.
    #[arg(long, value_name = "STATUS")]
    pub column: Option<String>,

    /// Release outside any target.
    #[arg(long)]
    pub miss: bool,
}

impl DropArgs {
    fn target(&self, project: &Project) -> Result<DropTarget> {
        if let Some(on) = &self.on {
            return Ok(DropTarget::Item(ItemId::from(on.trim())));
        }
        if let Some(column) = &self.column {
            let status = resolve_status(&project.statuses()?, column)?;
            return Ok(DropTarget::EmptyColumn(status));
        }
        Ok(DropTarget::Miss)
    }
}

#[derive(Debug, Serialize)]
struct Discarded<'a> {
    id: &'a ItemId,
    changed: bool,
    discarded: bool,
}

/// Execute `lanes drop`: resolve a drag gesture against the current board
/// and apply the resulting move.
///
/// # Errors
///
/// Unknown dragged id or status, or a load/save failure.
pub fn run_drop(args: &DropArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let project = Project::open(project_root)?;
    let _lock = project.lock(LockKind::Exclusive)?;
    let board = project.load_board()?;

    let id = ItemId::from(args.id.trim());
    let target = args.target(&project)?;
    debug!(%id, ?target, "resolving drop");

    let Some(report) = board
        .drop_item(&id, &target)
        .with_context(|| format!("dropping {id}"))?
    else {
        let out = Discarded {
            id: &id,
            changed: false,
            discarded: true,
        };
        return render_mode(
            output,
            &out,
            |v, w| writeln!(w, "discarded {}", v.id),
            |v, w| writeln!(w, "Drop of {} missed every target; nothing changed", v.id),
        );
    };

    if !report.is_noop() {
        project.save(&board)?;
    }
    render_move(output, &MoveOutput::from_report(&id, report))
}
