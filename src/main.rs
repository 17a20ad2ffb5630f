use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use schemadiff::presentation::cli_summary::{print_perf_summary, print_summary};
use schemadiff::presentation::writers::{all_writers, write_to_file, writer_for};
use schemadiff::{AppConfig, ComparisonReport, KeylessPolicy, LogLevel, Outcome, ScopeSelector, Side};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "schemadiff",
    version,
    about = "Compare the structure of two SQL databases."
)]
struct Cli {
    /// Config file (default: ./schemadiff.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Show every catalog query
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare database A with database B
    Compare {
        /// Print the summary without writing report files
        #[arg(long)]
        dry_run: bool,

        /// Report format: all, json or html
        #[arg(short, long, default_value = "all")]
        format: String,

        /// Compare two snapshot files instead of live databases
        #[arg(long, requires = "snapshot_b")]
        snapshot_a: Option<String>,

        #[arg(long, requires = "snapshot_a")]
        snapshot_b: Option<String>,
    },
    /// Capture the structure of one database as JSON
    Snapshot {
        #[arg(long, value_enum)]
        side: SideArg,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Check that the configured databases are reachable
    TestConnection {
        /// Only test this side (default: both)
        #[arg(long, value_enum)]
        side: Option<SideArg>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SideArg {
    A,
    B,
}

impl From<SideArg> for Side {
    fn from(s: SideArg) -> Self {
        match s {
            SideArg::A => Side::A,
            SideArg::B => Side::B,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LogLevel::Debug
    } else if cli.quiet {
        LogLevel::Error
    } else {
        LogLevel::Info
    };
    schemadiff::init_tracing(level);

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let outcome: Outcome<()> = Outcome::failure(&err);
            println!(
                "{}",
                serde_json::to_string_pretty(&outcome).unwrap_or_else(|_| format!("{err:#}"))
            );
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Compare {
            dry_run,
            format,
            snapshot_a: Some(a),
            snapshot_b: Some(b),
        } => {
            // Offline: the config file is optional and only supplies scope,
            // keyless policy and output dir.
            let cfg = match &cli.config {
                Some(path) => Some(AppConfig::load(Some(path.as_str()))?),
                None => None,
            };
            let scope = cfg.as_ref().map_or_else(ScopeSelector::everything, |c| c.scope);
            let keyless = cfg.as_ref().map_or(KeylessPolicy::default(), |c| c.compare.keyless);
            let dir = cfg.as_ref().map_or("./output".to_string(), |c| c.output.dir.clone());

            let report = schemadiff::compare_snapshot_files(&a, &b, &scope, keyless)?;
            emit(&report, dry_run, &format, &dir)
        }
        Command::Compare {
            dry_run, format, ..
        } => {
            let cfg = AppConfig::load(cli.config.as_deref())?;
            let (report, perf) = schemadiff::run_with_timing(&cfg).await?;
            emit(&report.with_perf(perf), dry_run, &format, &cfg.output.dir)
        }
        Command::Snapshot { side, output } => {
            let cfg = AppConfig::load(cli.config.as_deref())?;
            let snapshot = schemadiff::snapshot(&cfg, side.into()).await?;
            let json = serde_json::to_string_pretty(&snapshot)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write snapshot to {path}"))?;
                    eprintln!("Snapshot written to {path}");
                }
                None => println!("{json}"),
            }
            Ok(())
        }
        Command::TestConnection { side } => {
            let cfg = AppConfig::load(cli.config.as_deref())?;
            let sides = match side {
                Some(s) => vec![Side::from(s)],
                None => vec![Side::A, Side::B],
            };
            for side in &sides {
                schemadiff::test_connection(&cfg, *side).await?;
            }
            let outcome = Outcome::ok("Connection test successful", ());
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
    }
}

fn emit(report: &ComparisonReport, dry_run: bool, format: &str, dir: &str) -> Result<()> {
    print_summary(report);
    if let Some(perf) = &report.perf {
        print_perf_summary(perf);
    }

    if dry_run {
        return Ok(());
    }

    let writers = match format {
        "all" => all_writers(),
        fmt => vec![writer_for(fmt).ok_or_else(|| anyhow::anyhow!("Unknown format: {}", fmt))?],
    };
    for writer in writers {
        let path = write_to_file(writer.as_ref(), report, dir)?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}
