//! nbdoc CLI - Main entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "nbdoc")]
#[command(version)]
#[command(about = "Build documentation sites from Jupyter notebooks", long_about = None)]
struct Cli {
    /// Settings file (defaults to the nearest nbdoc.yml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert the project's notebooks to HTML documentation pages
    BuildDocs {
        /// Glob selecting the notebooks to convert (defaults to all notebooks)
        #[arg(long)]
        fname: Option<String>,

        /// Rebuild pages that are already up to date
        #[arg(long)]
        force_all: bool,

        /// Number of worker threads (0 or 1 converts sequentially)
        #[arg(long)]
        n_workers: Option<usize>,

        /// Upper bound of the random delay before each parallel conversion, in seconds
        #[arg(long, default_value_t = 1.0)]
        max_jitter: f64,

        /// Write pages to DIR instead of the configured doc_path
        #[arg(long)]
        dest: Option<PathBuf>,

        /// Render without running show_doc cells
        #[arg(long)]
        no_execute: bool,
    },

    /// Convert one notebook to a Markdown page
    ConvertMd {
        /// Notebook to convert
        fname: PathBuf,

        /// Directory the page is written to
        #[arg(long, default_value = ".")]
        dest: PathBuf,

        /// Image directory relative to DEST (empty: <notebook>_files/)
        #[arg(long)]
        img_path: Option<String>,

        /// Write plain Markdown without Jekyll front matter and includes
        #[arg(long)]
        no_jekyll: bool,
    },

    /// Move pasted cell attachments out of a notebook into image files
    Detach {
        /// Notebook to process
        path: PathBuf,

        /// Directory for the images (defaults to <notebook>_files)
        #[arg(long)]
        dest: Option<PathBuf>,

        /// Print the updated notebook instead of rewriting the file
        #[arg(long)]
        stdout: bool,
    },

    /// Write the site boilerplate files that do not exist yet
    InitTemplates,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose {
        "nbdoc=debug,nbdoc_core=debug"
    } else {
        "nbdoc=info,nbdoc_core=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = cli.config.as_deref();
    match cli.command {
        Commands::BuildDocs {
            fname,
            force_all,
            n_workers,
            max_jitter,
            dest,
            no_execute,
        } => commands::build_docs::execute(commands::build_docs::BuildDocsArgs {
            config,
            fname,
            force_all,
            n_workers,
            max_jitter,
            dest,
            no_execute,
        }),
        Commands::ConvertMd {
            fname,
            dest,
            img_path,
            no_jekyll,
        } => commands::convert_md::execute(commands::convert_md::ConvertMdArgs {
            config,
            fname,
            dest,
            img_path,
            jekyll: !no_jekyll,
        }),
        Commands::Detach { path, dest, stdout } => {
            commands::detach::execute(&path, dest.as_deref(), stdout)
        }
        Commands::InitTemplates => commands::init_templates::execute(config),
    }
}
