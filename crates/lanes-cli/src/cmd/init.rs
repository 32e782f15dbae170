use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context as _, Result};
use clap::Args;
use lanes_core::StatusSet;
use lanes_core::config::{BoardConfig, LANES_DIR, ProjectConfig, project_config_path};
use serde::Serialize;
use tracing::info;

use crate::output::{OutputMode, render_mode};
use crate::repo::write_board_file;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Replace an existing board, discarding its items.
    #[arg(long)]
    pub force: bool,

    /// Column name, in display order. Repeat once per column.
    #[arg(long = "status", value_name = "STATUS")]
    pub statuses: Vec<String>,
}

const GITIGNORE: &str = "lock\noutbox.jsonl\n";

#[derive(Debug, Serialize)]
struct InitOutput {
    ok: bool,
    path: String,
    statuses: Vec<String>,
}

/// Execute `lanes init`:
///
/// ```text
/// .lanes/
///   config.toml   ([board] statuses, [sync] outbox)
///   board.json    (empty board)
///   .gitignore    (lock, outbox.jsonl)
/// ```
///
/// # Errors
///
/// Fails if `.lanes/` exists without `--force`, the status list is invalid,
/// or a file cannot be written.
pub fn run_init(args: &InitArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let lanes_dir = project_root.join(LANES_DIR);
    if lanes_dir.exists() && !args.force {
        anyhow::bail!(".lanes/ already exists. Use `lanes init --force` to start over.");
    }

    let statuses = if args.statuses.is_empty() {
        StatusSet::default()
    } else {
        StatusSet::new(args.statuses.iter().cloned())?
    };
    let names: Vec<String> = statuses.iter().map(ToString::to_string).collect();

    fs::create_dir_all(&lanes_dir)
        .with_context(|| format!("Failed to create {}", lanes_dir.display()))?;

    let config = ProjectConfig {
        board: BoardConfig {
            statuses: names.clone(),
        },
        ..ProjectConfig::default()
    };
    let config_path = project_config_path(project_root);
    fs::write(&config_path, toml::to_string_pretty(&config)?)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    write_board_file(&lanes_dir.join("board.json"), &[])?;

    let gitignore = lanes_dir.join(".gitignore");
    fs::write(&gitignore, GITIGNORE)
        .with_context(|| format!("Failed to write {}", gitignore.display()))?;

    info!(path = %lanes_dir.display(), columns = names.len(), "board initialized");

    let out = InitOutput {
        ok: true,
        path: lanes_dir.display().to_string(),
        statuses: names,
    };
    render_mode(
        output,
        &out,
        |v, w| writeln!(w, "initialized {} statuses={}", v.path, v.statuses.join(",")),
        |v, w| {
            writeln!(w, "✓ Initialized .lanes/ board.")?;
            writeln!(w)?;
            writeln!(w, "  Columns: {}", v.statuses.join(" → "))?;
            writeln!(w, "  Config:  .lanes/config.toml")?;
            writeln!(w)?;
            writeln!(w, "Next steps:")?;
            writeln!(w, "  lanes add --title \"My first card\"")
        },
    )
}
