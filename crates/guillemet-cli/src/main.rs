mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gm")]
#[command(version, about = "Guillemet - render markup templates against JSON data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template file against a JSON data file
    Render {
        /// Template file to render
        template: PathBuf,

        /// JSON file holding the data context (an object)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Directory of partial templates (.html files, keyed by file stem)
        #[arg(short, long)]
        templates: Option<PathBuf>,

        /// Rename substitute table tags (t, th, tb, trow, tcell) after expansion
        #[arg(long)]
        tables: bool,

        /// Write output to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Check a template for directive problems without rendering it
    Check {
        /// Template file to check
        template: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Render {
            template,
            data,
            templates,
            tables,
            out,
        } => commands::render::run(
            &template,
            data.as_deref(),
            templates.as_deref(),
            tables,
            out.as_deref(),
        ),
        Commands::Check { template } => commands::check::run(&template),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
