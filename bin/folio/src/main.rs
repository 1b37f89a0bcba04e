//! Folio CLI
//!
//! Static portfolio site generator driven by Markdown and YAML.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use clap::Parser;
use color_eyre::eyre::Result;
use folio::cmd::build::BuildOverrides;

/// Command-line interface for Folio.
#[derive(Parser)]
#[command(
    name = "folio",
    version,
    about = "A static portfolio site generator"
)]
struct Cli {
    /// Path to build settings file (defaults to folio.toml if present)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Build the site into the output directory
    Build {
        /// Content directory (markdown files and config.yaml)
        #[arg(long)]
        content: Option<std::path::PathBuf>,
        /// Templates directory
        #[arg(long)]
        templates: Option<std::path::PathBuf>,
        /// Output directory (removed and recreated)
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
        /// Static assets directory
        #[arg(long = "static")]
        static_dir: Option<std::path::PathBuf>,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    folio::init_tracing(cli.verbose);

    match cli.command {
        Commands::Build {
            content,
            templates,
            output,
            static_dir,
        } => {
            let overrides = BuildOverrides {
                content,
                templates,
                output,
                static_dir,
            };
            folio::cmd::build::run(cli.config.as_deref(), &overrides)?;
        }
    }

    Ok(())
}
