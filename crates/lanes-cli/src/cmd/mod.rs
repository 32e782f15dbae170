pub mod add;
pub mod compact;
pub mod completions;
pub mod drop_cmd;
pub mod init;
pub mod mv;
pub mod rm;
pub mod show;
pub mod sim;

use std::io::Write;

use anyhow::Result;
use lanes_core::{ItemChange, ItemId, MoveReport, WorkItem};
use serde::Serialize;

use crate::output::{OutputMode, render_mode};

/// JSON shape shared by `mv` and `drop`.
#[derive(Debug, Serialize)]
pub struct MoveOutput {
    pub item: Option<WorkItem>,
    pub changed: bool,
    pub changes: Vec<ItemChange>,
}

impl MoveOutput {
    pub fn from_report(id: &ItemId, report: MoveReport) -> Self {
        let item = report.items.iter().find(|i| &i.id == id).cloned();
        Self {
            item,
            changed: !report.is_noop(),
            changes: report.changes,
        }
    }
}

pub fn render_move(output: OutputMode, out: &MoveOutput) -> Result<()> {
    render_mode(
        output,
        out,
        |v, w| {
            if let Some(item) = &v.item {
                writeln!(w, "{}\t{}\t{}", item.id, item.status, item.position)?;
            }
            writeln!(w, "changes={}", v.changes.len())
        },
        |v, w| {
            let Some(item) = &v.item else {
                return Ok(());
            };
            if v.changed {
                writeln!(
                    w,
                    "✓ Moved {} to {} at position {} ({} placements changed)",
                    item.id,
                    item.status,
                    item.position,
                    v.changes.len()
                )
            } else {
                writeln!(
                    w,
                    "{} is already at {}[{}]; nothing changed",
                    item.id, item.status, item.position
                )
            }
        },
    )
}
