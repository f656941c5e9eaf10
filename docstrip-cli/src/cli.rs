use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, ValueEnum};

use docstrip::{DEFAULT_EXTENSION, StripConfig, StripReport, default_jobs, output, strip_tree};

use crate::logging;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Remove `///` documentation comment lines from every matching file under a directory.
#[derive(Parser, Debug)]
#[command(name = "docstrip", version, about, long_about = None)]
pub struct Cli {
    /// Root directory to scan
    pub root: PathBuf,

    /// File extension to process (with or without the leading dot)
    #[arg(short, long, default_value = DEFAULT_EXTENSION)]
    pub ext: String,

    /// Number of files rewritten concurrently [default: available parallelism]
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: Option<u16>,

    /// Exclude files or directories matching this glob (repeatable)
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Follow symbolic links while walking
    #[arg(long)]
    pub follow_links: bool,

    /// Maximum directory depth to descend into [default: unlimited]
    #[arg(long, value_name = "DEPTH")]
    pub max_depth: Option<usize>,

    /// Leave files larger than this many bytes untouched
    #[arg(long, value_name = "BYTES", default_value_t = 10_485_760)]
    pub max_file_size: u64,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    /// Exit with status 1 if any file or the walk failed
    #[arg(long)]
    pub fail_on_error: bool,

    /// Verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Map the command line onto a library config.
    pub fn to_config(&self) -> StripConfig {
        let mut config = StripConfig::new(&self.root);
        config.extension.clone_from(&self.ext);
        config.jobs = self.jobs.map_or_else(default_jobs, usize::from);
        config.exclude.clone_from(&self.exclude);
        config.follow_links = self.follow_links;
        config.max_depth = self.max_depth;
        config.max_file_size = self.max_file_size;
        config
    }
}

pub async fn run() -> Result<()> {
    // Help, version and argument mistakes all print and exit successfully.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            e.print()?;
            return Ok(());
        }
    };

    logging::init(cli.verbose, cli.quiet);

    let config = cli.to_config();
    tracing::debug!(
        root = %config.root.display(),
        extension = config.normalized_extension(),
        jobs = config.jobs,
        follow_links = config.follow_links,
        "starting strip run"
    );
    let report = strip_tree(&config).await?;

    let stdout = std::io::stdout();
    finish(&cli, &report, &mut stdout.lock())
}

/// Print the report and apply the exit policy.
fn finish(cli: &Cli, report: &StripReport, out: &mut dyn Write) -> Result<()> {
    match cli.format {
        OutputFormat::Human => output::write_human(report, out)?,
        OutputFormat::Json => output::write_json(report, out)?,
    }

    if !report.ok {
        tracing::warn!(errors = report.errors_count(), "run finished with errors");
        if cli.fail_on_error {
            anyhow::bail!("{} error(s) during run", report.errors_count());
        }
    }
    Ok(())
}
