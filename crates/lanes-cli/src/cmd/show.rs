use std::io::Write;
use std::path::Path;

use anyhow::Result;
use clap::Args;
use lanes_core::lock::LockKind;
use lanes_core::partition::Column;
use serde::Serialize;

use crate::output::{OutputMode, pretty_section, render_mode};
use crate::repo::{Project, resolve_status};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Only show this column.
    #[arg(short, long)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
struct ShowOutput {
    columns: Vec<Column>,
}

/// Execute `lanes show`: every column, cards in position order.
///
/// # Errors
///
/// Unknown status filter, or a load failure.
pub fn run_show(args: &ShowArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let project = Project::open(project_root)?;
    let board = {
        let _lock = project.lock(LockKind::Shared)?;
        project.load_board_repairing()?.0
    };
    let view = board.view();

    let columns = match &args.status {
        Some(raw) => {
            let status = resolve_status(board.statuses(), raw)?;
            vec![Column {
                items: view.by_status(&status),
                status,
            }]
        }
        None => view.columns(),
    };

    render_mode(
        output,
        &ShowOutput { columns },
        |v, w| {
            for column in &v.columns {
                for item in &column.items {
                    writeln!(w, "{}\t{}\t{}\t{}", column.status, item.position, item.id, item.title)?;
                }
            }
            Ok(())
        },
        |v, w| {
            for (n, column) in v.columns.iter().enumerate() {
                if n > 0 {
                    writeln!(w)?;
                }
                pretty_section(w, &format!("{} ({})", column.status, column.items.len()))?;
                if column.items.is_empty() {
                    writeln!(w, "  (empty)")?;
                }
                for item in &column.items {
                    write!(w, "{:>3}  {:<8} {}", item.position, item.id, item.title)?;
                    if let Some(assignee) = &item.assignee {
                        write!(w, "  @{assignee}")?;
                    }
                    if !item.labels.is_empty() {
                        write!(w, "  [{}]", item.labels.join(", "))?;
                    }
                    writeln!(w)?;
                }
            }
            Ok(())
        },
    )
}
