#![forbid(unsafe_code)]

mod cmd;
mod output;
mod repo;

use std::env;
use std::path::Path;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "lanes: a Kanban board with drag-and-drop ordering",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format; overrides `--json`, `FORMAT` and user config.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self, project_root: &Path) -> OutputMode {
        resolve_output_mode(self.format, self.json, project_root)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Lifecycle",
        about = "Initialize a board",
        long_about = "Create .lanes/ in the current directory with a config and an empty board.",
        after_help = "EXAMPLES:\n    # Default columns (TODO, DOING, REVIEW, DONE)\n    lanes init\n\n    # Custom columns, in order\n    lanes init --status Backlog --status Now --status Shipped"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Add a card",
        long_about = "Add a card at the tail of a column.",
        after_help = "EXAMPLES:\n    # Add to the first column\n    lanes add --title \"Fix login timeout\"\n\n    # Add with metadata\n    lanes add --title \"Ship v2\" --status doing --label release --assignee sam --due 2026-11-01\n\n    # Emit machine-readable output\n    lanes add --title \"Fix login timeout\" --json"
    )]
    Add(cmd::add::AddArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Remove a card",
        long_about = "Remove a card and close the gap it leaves in its column.",
        after_help = "EXAMPLES:\n    # Remove a card\n    lanes rm t-3"
    )]
    Rm(cmd::rm::RmArgs),

    #[command(
        next_help_heading = "Ordering",
        about = "Move a card to a column and slot",
        long_about = "Move a card to a zero-based slot in a column. Both the source and the\n\
                      destination column are renumbered densely.",
        after_help = "EXAMPLES:\n    # Move to the top of DOING\n    lanes mv t-3 doing --index 0\n\n    # Append to DONE\n    lanes mv t-3 done\n\n    # Emit the change list\n    lanes mv t-3 review --index 1 --json"
    )]
    Mv(cmd::mv::MvArgs),

    #[command(
        next_help_heading = "Ordering",
        about = "Apply a drag-and-drop gesture",
        long_about = "Resolve where a dragged card was released and move it there. Dropping\n\
                      on a card places the dragged card just before it; dropping on a column\n\
                      appends; a miss changes nothing.",
        after_help = "EXAMPLES:\n    # Drop t-3 onto t-1\n    lanes drop t-3 --on t-1\n\n    # Drop t-3 into the empty area of REVIEW\n    lanes drop t-3 --column review\n\n    # Released outside the board\n    lanes drop t-3 --miss"
    )]
    Drop(cmd::drop_cmd::DropArgs),

    #[command(
        next_help_heading = "Ordering",
        about = "Renumber positions densely",
        long_about = "Renumber positions to 0..n in one or every column, keeping relative order.",
        after_help = "EXAMPLES:\n    # Every column\n    lanes compact\n\n    # One column\n    lanes compact review"
    )]
    Compact(cmd::compact::CompactArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show the board",
        long_about = "Show every column with its cards in position order.",
        after_help = "EXAMPLES:\n    # Whole board\n    lanes show\n\n    # One column\n    lanes show --status doing\n\n    # Emit machine-readable output\n    lanes show --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Developer",
        about = "Deterministic gesture simulation",
        long_about = "Run or replay seeded drag-and-drop campaigns against an in-memory board."
    )]
    Sim(cmd::sim::SimArgs),

    #[command(
        next_help_heading = "Developer",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    # Bash\n    lanes completions bash > ~/.local/share/bash-completion/completions/lanes"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LANES_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "lanes=debug,info"
        } else {
            "lanes=info,warn"
        })
    });

    let format = env::var("LANES_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose && !cli.quiet {
        info!("Verbose mode enabled");
    }

    let project_root = env::current_dir()?;
    let output = cli.output_mode(&project_root);

    let command_result = match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, output, &project_root),
        Commands::Add(args) => cmd::add::run_add(args, output, &project_root),
        Commands::Rm(args) => cmd::rm::run_rm(args, output, &project_root),
        Commands::Mv(args) => cmd::mv::run_mv(args, output, &project_root),
        Commands::Drop(args) => cmd::drop_cmd::run_drop(args, output, &project_root),
        Commands::Compact(args) => cmd::compact::run_compact(args, output, &project_root),
        Commands::Show(args) => cmd::show::run_show(args, output, &project_root),
        Commands::Sim(args) => cmd::sim::run_sim(args, output),
        Commands::Completions(args) => {
            cmd::completions::run_completions(args.shell, &mut Cli::command())
        }
    };

    if let Err(err) = command_result {
        render_error(output, &CliError::from(&err))?;
        std::process::exit(1);
    }
    Ok(())
}
