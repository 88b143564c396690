use clap::{Parser, Subcommand};
use csvgrid::cli;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "csvgrid")]
#[command(about = "Load a CSV file as a grid, edit cells and rows, export it back to CSV.")]
#[command(long_about = "csvgrid - edit CSV files as a grid

COMMANDS:
  show     - Print a CSV file as an aligned grid
  inspect  - Report rows whose width differs from the header
  edit     - Apply cell/row edits and export the result

EXAMPLES:
  csvgrid show people.csv
  csvgrid inspect people.csv
  csvgrid edit people.csv -c 'set 1 1 26' -c add-row -c 'remove-row 0'
  csvgrid edit people.csv -c add-row -o people_v2.csv

Set RUST_LOG=csvgrid=debug (or pass --verbose) for edit tracing on stderr.")]
#[command(version)]
struct Cli {
    /// Log grid operations to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a CSV file as an aligned grid
    Show {
        /// Path to CSV file
        file: PathBuf,

        /// Print the parsed header and rows as JSON instead
        #[arg(long)]
        json: bool,
    },

    /// Report rows whose width differs from the header
    Inspect {
        /// Path to CSV file
        file: PathBuf,
    },

    #[command(long_about = "Load a CSV file, apply edit commands in order, export.

Row and column indices are zero-based and count data rows only (the
header is not row 0). Rows shorter than the header are padded with empty
cells on load; longer rows are truncated.

EDIT COMMANDS:
  set <row> <col> <value>   Replace one cell (value may contain spaces)
  add-row                   Append a row of empty cells
  remove-row <row>          Delete a row; later rows move up

All commands are applied as one unit: if any fails, nothing is written.

EXAMPLES:
  csvgrid edit people.csv -c 'set 1 1 26' -c add-row -c 'remove-row 0'
  csvgrid edit people.csv -c add-row --dry-run")]
    /// Apply cell/row edits and export the result
    Edit {
        /// Path to CSV file
        file: PathBuf,

        /// Edit command, repeatable (applied in order)
        #[arg(short, long = "command", value_name = "COMMAND")]
        commands: Vec<String>,

        /// Output file (default: edited.csv next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the resulting CSV to stdout instead of writing a file
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "csvgrid=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Show { file, json } => cli::show(file, json),

        Commands::Inspect { file } => cli::inspect(file),

        Commands::Edit {
            file,
            commands,
            output,
            dry_run,
        } => cli::edit(file, commands, output, dry_run),
    };

    Ok(result?)
}
