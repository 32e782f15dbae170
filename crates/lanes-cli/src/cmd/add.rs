use std::io::Write;
use std::path::Path;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use clap::Args;
use lanes_core::NewItem;
use lanes_core::lock::LockKind;

use crate::output::{OutputMode, pretty_kv, render_mode};
use crate::repo::{Project, next_item_id, resolve_status};

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Card title.
    #[arg(short, long)]
    pub title: String,

    /// Column to add to (defaults to the first configured column).
    #[arg(short, long)]
    pub status: Option<String>,

    /// Label to attach. Repeatable.
    #[arg(short, long = "label", value_name = "LABEL")]
    pub labels: Vec<String>,

    /// Person responsible for the card.
    #[arg(long)]
    pub assignee: Option<String>,

    /// Due date (YYYY-MM-DD).
    #[arg(long = "due", value_name = "DATE")]
    pub due_date: Option<NaiveDate>,
}

/// Execute `lanes add`. The new card goes to the tail of its column.
///
/// # Errors
///
/// Fails for a blank title, an unknown status, or any load/save failure.
pub fn run_add(args: &AddArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let title = args.title.trim();
    if title.is_empty() {
        bail!("title must not be empty");
    }

    let project = Project::open(project_root)?;
    let _lock = project.lock(LockKind::Exclusive)?;
    let board = project.load_board()?;

    let status = match &args.status {
        Some(raw) => resolve_status(board.statuses(), raw)?,
        None => board.statuses().first().clone(),
    };

    let mut new = NewItem::new(next_item_id(&board.items()), title, status);
    new.labels.clone_from(&args.labels);
    new.assignee.clone_from(&args.assignee);
    new.due_date = args.due_date;

    let item = board.add_item(new)?;
    project.save(&board)?;

    render_mode(
        output,
        &item,
        |v, w| writeln!(w, "{}\t{}\t{}\t{}", v.id, v.status, v.position, v.title),
        |v, w| {
            writeln!(w, "✓ Added {}", v.id)?;
            pretty_kv(w, "Title", &v.title)?;
            pretty_kv(w, "Column", format!("{} (position {})", v.status, v.position))?;
            if !v.labels.is_empty() {
                pretty_kv(w, "Labels", v.labels.join(", "))?;
            }
            if let Some(assignee) = &v.assignee {
                pretty_kv(w, "Assignee", assignee)?;
            }
            if let Some(due) = v.due_date {
                pretty_kv(w, "Due", due.to_string())?;
            }
            Ok(())
        },
    )
}
