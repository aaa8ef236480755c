use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use feeledger_core::{time, FeeRule, Student};
use feeledger_ingest::parse_fee_rules_csv;
use feeledger_recon::expected::enrolment_rules;
use feeledger_recon::{expected_fees, reconcile, reconcile_parent, FeedSource, ReconcileContext};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod feed;
mod report;
mod state;

use config::{Config, OutputFormat};
use feed::{build_feed, AnyFeed};

#[derive(Parser, Debug)]
#[command(
    name = "feeledger",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("FEELEDGER_BUILD_SHA"), ")"),
    about = "Reconcile school fee records into per-student summaries"
)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Read a document export from this directory instead of the configured feed
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// School id (overrides [school] id)
    #[arg(long, global = true)]
    school: Option<String>,

    /// Print JSON instead of a table
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    /// Judge overdue entries against this day (YYYY-MM-DD) instead of today
    #[arg(long, global = true)]
    today: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fee summary per student (every student of the school when no --student is given)
    Reconcile {
        /// Student id, studentId or uid; repeatable
        #[arg(long = "student")]
        students: Vec<String>,
    },

    /// Fee overview across all children of one parent
    Parent {
        /// Parent id or parent email
        #[arg(long)]
        parent: String,
    },

    /// Print the fee-rule catalog
    Rules {
        /// Read the catalog from a CSV export instead of the feed
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Only rules charged to this class, plus its expected yearly total
        #[arg(long)]
        class: Option<String>,
    },

    /// Write a default ~/.feeledger/config.toml
    InitConfig,
}

fn init_logging(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_env("FEELEDGER_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Effective settings after CLI overrides
struct Run {
    cfg: Config,
    ctx: ReconcileContext,
    format: OutputFormat,
}

impl Run {
    fn new(cli: &Cli, cfg: Config) -> Result<Self> {
        let today = match cli.today.as_deref() {
            Some(s) => time::parse_day(s).with_context(|| format!("invalid --today: {s}"))?,
            None => time::today_in(&cfg.school.timezone)?,
        };
        let school_id = cli.school.clone().unwrap_or_else(|| cfg.school.id.clone());
        let ctx = ReconcileContext::new(school_id, today).with_legacy_fees(cfg.legacy_fees.clone());
        let format = if cli.json { OutputFormat::Json } else { cfg.output.format };
        Ok(Self { cfg, ctx, format })
    }

    fn feed(&self, data: Option<PathBuf>) -> Result<AnyFeed> {
        build_feed(&self.cfg, data)
    }

    fn print<T: Serialize>(&self, value: &T, table: impl FnOnce() -> String) -> Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Table => print!("{}", table()),
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Command::InitConfig = cli.command {
        return config::init_config();
    }

    let run = Run::new(&cli, config::load_config()?)?;
    info!(school = %run.ctx.school_id, today = %run.ctx.today, "starting");

    match &cli.command {
        Command::Reconcile { students } => {
            let feeds = run.feed(cli.data.clone())?;
            let roster = select_students(&feeds, &run.ctx.school_id, students).await?;
            let summaries = reconcile(&feeds, &run.ctx, &roster).await;
            run.print(&summaries, || {
                summaries
                    .iter()
                    .map(report::render_summary)
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }

        Command::Parent { parent } => {
            let feeds = run.feed(cli.data.clone())?;
            let summary = reconcile_parent(&feeds, &run.ctx, parent).await;
            if summary.children.is_empty() {
                warn!(parent = %parent, "no students found for parent");
            }
            run.print(&summary, || report::render_parent(parent, &summary))?;
        }

        Command::Rules { csv, class } => {
            let rules = load_rules(&run, cli.data.clone(), csv.as_ref()).await?;
            match class {
                Some(class) => {
                    let enrolment: Vec<&FeeRule> = enrolment_rules(&rules).collect();
                    let charged: Vec<FeeRule> = rules
                        .iter()
                        .filter(|r| r.is_active && (r.applies_to(class) || enrolment.contains(r)))
                        .cloned()
                        .collect();
                    let fees = expected_fees(&rules, class, &[], &run.ctx.legacy_fees)
                        .with_context(|| format!("expected fees for class {class}"))?;
                    run.print(&fees, || {
                        format!(
                            "{}\n{}",
                            report::render_rules(&charged),
                            report::render_expected(class, &fees)
                        )
                    })?;
                }
                None => run.print(&rules, || report::render_rules(&rules))?,
            }
        }

        Command::InitConfig => unreachable!("handled above"),
    }

    Ok(())
}

/// School roster narrowed to the requested ids (any of id, studentId, uid)
async fn select_students(
    feeds: &AnyFeed,
    school_id: &str,
    wanted: &[String],
) -> Result<Vec<Student>> {
    let roster = feeds
        .school_roster(school_id)
        .await
        .with_context(|| format!("loading roster of school {school_id}"))?;
    if wanted.is_empty() {
        return Ok(roster);
    }

    let wanted: BTreeSet<&str> = wanted.iter().map(|s| s.trim()).collect();
    let picked: Vec<Student> = roster
        .into_iter()
        .filter(|s| s.identifiers().any(|id| wanted.contains(id)))
        .collect();

    for id in &wanted {
        if !picked.iter().any(|s| s.identifiers().any(|known| known == *id)) {
            warn!(student = %id, "not on the school roster");
        }
    }
    if picked.is_empty() {
        bail!("none of the requested students are on the roster of school {school_id}");
    }
    Ok(picked)
}

async fn load_rules(
    run: &Run,
    data: Option<PathBuf>,
    csv: Option<&PathBuf>,
) -> Result<Vec<FeeRule>> {
    if let Some(path) = csv {
        return parse_fee_rules_csv(path).with_context(|| format!("parsing {}", path.display()));
    }
    let feeds = run.feed(data)?;
    feeds
        .fee_rule_catalog(&run.ctx.school_id)
        .await
        .context("loading fee-rule catalog")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_cli_parses_global_overrides() {
        let cli = Cli::try_parse_from([
            "feeledger",
            "reconcile",
            "--student",
            "d1",
            "--student",
            "d2",
            "--json",
            "--today",
            "2026-03-10",
            "-vv",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Reconcile { students } => assert_eq!(students, vec!["d1", "d2"]),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_run_applies_overrides() {
        let cli = Cli::try_parse_from([
            "feeledger",
            "--school",
            "sch-9",
            "--today",
            "2026-03-10",
            "--json",
            "parent",
            "--parent",
            "p-1",
        ])
        .unwrap();
        let run = Run::new(&cli, Config::default()).unwrap();
        assert_eq!(run.ctx.school_id, "sch-9");
        assert_eq!(run.ctx.today, NaiveDate::from_ymd_opt(2026, 3, 10).unwrap());
        assert_eq!(run.format, OutputFormat::Json);
    }

    #[test]
    fn test_bad_today_is_rejected() {
        let cli = Cli::try_parse_from(["feeledger", "--today", "someday", "rules"]).unwrap();
        assert!(Run::new(&cli, Config::default()).is_err());
    }
}
