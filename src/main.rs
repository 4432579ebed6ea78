use anyhow::Result;
use clap::{Parser, Subcommand};
use sitesmith::build::build_site;
use sitesmith::config::{find_project_file, Config, PROJECT_FILE};
use std::path::PathBuf;
use tracing::warn;

#[derive(Parser)]
#[command(name = "sitesmith")]
#[command(about = "Builds a static website from markdown content and templates")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the site into the destination directory
    Build {
        /// The project directory; `site.yaml` is searched for here and in
        /// its ancestors
        #[arg(long, default_value = ".")]
        project: PathBuf,

        /// Override the configured source directory
        #[arg(long)]
        source: Option<PathBuf>,

        /// Override the configured destination directory
        #[arg(long)]
        destination: Option<PathBuf>,
    },
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match verbose {
        0 => "sitesmith=info",
        1 => "sitesmith=debug",
        _ => "sitesmith=trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    fmt().with_env_filter(env_filter).with_target(false).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Build {
            project,
            source,
            destination,
        } => {
            let project = project.canonicalize().unwrap_or(project);
            let mut config = match find_project_file(&project) {
                Some(path) => Config::from_project_file(&path)?,
                None => {
                    warn!("no `{}` found; using defaults", PROJECT_FILE);
                    Config::with_root(&project)
                }
            };
            if let Some(source) = source {
                config.source = source;
            }
            if let Some(destination) = destination {
                config.destination = destination;
            }

            let summary = build_site(&config)?;
            println!(
                "Wrote {} files to {}",
                summary.files.len(),
                config.destination.display()
            );
        }
    }
    Ok(())
}
