//! relaunch CLI
//!
//! Entry point for the `relaunch` command-line tool. With no arguments it
//! builds the project in the current directory if needed and runs it.

use clap::Parser;
use std::path::PathBuf;
use std::process;

use relaunch::logging::{self, Verbosity};
use relaunch::{HostOs, OpenForWriteProbe, Pipeline, PipelineOptions, ProjectConfig, SystemRunner};

#[derive(Parser, Debug)]
#[command(name = "relaunch")]
#[command(about = "Rebuild a C++ project when its sources change, then launch it", version)]
struct Cli {
    /// Project root (default: current directory)
    #[arg(long, short = 'C', default_value = ".")]
    project_root: PathBuf,

    /// Path to project config file (default: <project root>/relaunch.toml)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Compiler to use instead of the configured one
    #[arg(long)]
    compiler: Option<String>,

    /// Rebuild even when the artifact is up to date
    #[arg(long)]
    force: bool,

    /// Never terminate running instances holding the artifact
    #[arg(long)]
    no_recovery: bool,

    /// Print the build plan without building or running
    #[arg(long)]
    dry_run: bool,

    /// Output the dry-run plan as JSON
    #[arg(long, requires = "dry_run")]
    json: bool,

    /// Build if needed but do not launch
    #[arg(long)]
    no_run: bool,

    /// Show debug output
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Only show errors
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// CLI layer of the configuration merge
    fn overrides(&self) -> Option<serde_json::Value> {
        let mut layer = serde_json::Map::new();
        if let Some(ref compiler) = self.compiler {
            layer.insert(
                "toolchain".to_string(),
                serde_json::json!({ "compiler": compiler }),
            );
        }
        if self.no_recovery {
            layer.insert(
                "recovery".to_string(),
                serde_json::json!({ "enabled": false }),
            );
        }
        (!layer.is_empty()).then_some(serde_json::Value::Object(layer))
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(Verbosity::from_flags(cli.verbose, cli.quiet));
    tracing::debug!("arguments: {:?}", cli);

    let config = match ProjectConfig::load(&cli.project_root, cli.config.as_deref(), cli.overrides()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };
    if let Some(ref file) = config.source_file {
        tracing::debug!(file = %file.display(), "loaded project config");
    }

    let options = PipelineOptions {
        force: cli.force,
        dry_run: cli.dry_run,
        no_run: cli.no_run,
    };
    let mut pipeline = Pipeline::new(
        config,
        HostOs::current(),
        options,
        SystemRunner::new(),
        OpenForWriteProbe,
    );

    let report = match pipeline.run() {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(e.exit_code());
        }
    };

    if cli.dry_run {
        if cli.json {
            match report.plan.to_json() {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error serializing plan: {}", e);
                    process::exit(1);
                }
            }
        } else {
            print!("{}", report.plan.to_human());
        }
    }

    if report.recovery.attempted() {
        tracing::debug!(
            succeeded = report.recovery.succeeded(),
            "lock recovery attempted"
        );
    }

    process::exit(report.exit_code());
}
