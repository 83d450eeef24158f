use clap::{Parser, Subcommand};
use rowpress::{config, output, pipeline, splice};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rowpress")]
#[command(about = "Turn CSV rows into AI-written blog posts for a static site")]
#[command(long_about = "\
Turn CSV rows into AI-written blog posts for a static site

Every row of the input table that hasn't been published yet becomes a post:
generated Markdown prose and a hero image, rendered to posts/, with a card
added to the listing page. Published rows are recorded in a ledger so
re-running is safe.

Site layout (all paths configurable in rowpress.toml):

  site/
  ├── rowpress.toml          # Optional config
  ├── blog.csv               # Input: Platform, Text, Hyperlink, images
  ├── blog.html              # Listing page, must contain the marker once
  ├── processed_posts.txt    # Ledger of published row fingerprints
  ├── posts/                 # Generated post pages
  └── images/                # Generated hero images

Environment:
  GOOGLE_API_KEY      API key for the generation services (required for run)
  GITHUB_REPO_OWNER   Owner part of https://{owner}.github.io/{repo}
  GITHUB_REPO_NAME    Repository part of the public URL
  RUST_LOG            Log filter (default: info)

Run 'rowpress gen-config' to generate a documented rowpress.toml.")]
#[command(version)]
struct Cli {
    /// Site root directory
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Config file (default: rowpress.toml in the site root)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Publish every pending row
    Run,
    /// Show what a run would do, without generating or writing anything
    Check,
    /// Print a stock rowpress.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging();

    match cli.command {
        Command::Run => {
            let site_config = load_site_config(&cli)?;
            let report = pipeline::run(&site_config, &cli.root)?;
            output::print_run_report(&report);
        }
        Command::Check => {
            let site_config = load_site_config(&cli)?;
            let plan = pipeline::plan(&site_config, &cli.root)?;
            output::print_plan(&plan, &cli.root);
            match plan.marker_count {
                1 => {}
                0 => return Err(splice::SpliceError::MarkerMissing.into()),
                count => return Err(splice::SpliceError::MarkerAmbiguous { count }.into()),
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Structured logs go to stderr so stdout stays the report.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// File config (if any) merged over defaults, then the environment on top.
fn load_site_config(cli: &Cli) -> Result<config::SiteConfig, config::ConfigError> {
    if let Some(path) = &cli.config
        && !path.exists()
    {
        return Err(config::ConfigError::Validation(format!(
            "config file not found: {}",
            path.display()
        )));
    }
    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.root.join(config::CONFIG_FILENAME));
    let mut site_config = config::load_config(&path)?;
    site_config.apply_env(|key| std::env::var(key).ok());
    Ok(site_config)
}
