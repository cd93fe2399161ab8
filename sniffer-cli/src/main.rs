use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use sniffer_core::time::today_in;
use sniffer_core::{WeekLabelResolver, WeekPoint, week_containing};
use sniffer_finance::{MappingStore, RulesDocument, SummaryView, categorize_missing};
use sniffer_ingest::{SummaryFeed, dedupe, parse_bank_csv};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

mod config;
mod report;
mod state;

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("SNIFFER_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(
    name = "sniffer",
    version,
    long_version = LONG_VERSION,
    about = "Week lookups and super-category rollups for bank statements"
)]
struct Cli {
    /// Data directory (default: $HOME/.sniffer)
    #[arg(long, global = true, env = "SNIFFER_HOME")]
    home: Option<PathBuf>,

    /// Log level for sniffer crates; RUST_LOG overrides it when set
    #[arg(long, global = true, default_value = "warn")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a chart week label into its date range (default: the current week)
    Week {
        /// e.g. 2024-W05, "W5 2024", 2024-03-04, 04/03/2024
        label: Option<String>,

        /// Explicit range start; used with --end, overrides the label
        #[arg(long, requires = "end")]
        start: Option<String>,

        #[arg(long, requires = "start")]
        end: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Roll spend up into super-categories
    Rollup {
        #[command(flatten)]
        input: Input,

        #[command(flatten)]
        resources: Resources,

        #[arg(long)]
        json: bool,
    },

    /// List the categories a picker would offer
    Categories {
        /// Include categories seen in this statement
        #[arg(long)]
        csv: Option<PathBuf>,

        #[command(flatten)]
        resources: Resources,
    },

    /// Remember a manual recategorisation as a rule
    Learn {
        /// Transaction description, e.g. "BUNNINGS WAREHOUSE ALBANY"
        description: String,

        category: String,

        /// Rules JSON to update (overrides config.toml); created if missing
        #[arg(long)]
        rules: Option<PathBuf>,
    },

    /// Manage $SNIFFER_HOME/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct Input {
    /// Bank CSV export
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Upstream summary feed (JSON)
    #[arg(long)]
    feed: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct Resources {
    /// Category-mapping JSON (overrides config.toml)
    #[arg(long)]
    mapping: Option<PathBuf>,

    /// Categorisation rules JSON (overrides config.toml)
    #[arg(long)]
    rules: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config.toml if none exists
    Init,
    /// Print the effective configuration
    Show,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.log_level);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    debug!("{cli:?}");
    let home = state::sniffer_home(cli.home.as_deref())?;
    let cfg = config::load_config(&home)?;

    match cli.command {
        Command::Week {
            label,
            start,
            end,
            json,
        } => {
            let resolver = WeekLabelResolver::new()?;
            let point = start.zip(end).map(|(start, end)| {
                WeekPoint::labelled(label.clone().unwrap_or_default()).with_bounds(start, end)
            });

            let outcome = match (label.as_deref(), point.as_ref()) {
                (None, None) => Ok(week_containing(today_in(&cfg.timezone)?)),
                (label, point) => resolver.resolve(label, point),
            };

            match outcome {
                Ok(range) if json => println!("{}", serde_json::to_string_pretty(&range)?),
                Ok(range) => println!("{}", report::range_line(&range)),
                Err(unresolved) => {
                    eprintln!("warning: {unresolved}");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }

        Command::Rollup {
            input,
            resources,
            json,
        } => {
            let mapping = mapping_store(&resources, &cfg).current();
            let rules = RulesDocument::load_or_default(rules_path(&resources, &cfg));
            let view = load_view(&input, &mapping, &rules)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                if view.rollup.is_empty() {
                    println!("(no spend in input)");
                } else {
                    println!("{}", report::totals_table(&view.rollup));
                }
                println!("\nAll super-categories:\n{}", report::totals_table(&view.axis));
            }
        }

        Command::Categories { csv, resources } => {
            let mapping = mapping_store(&resources, &cfg).current();
            let rules = RulesDocument::load_or_default(rules_path(&resources, &cfg));

            let mut known = rules.categories();
            if let Some(csv) = csv {
                let input = Input {
                    csv: Some(csv),
                    feed: None,
                };
                known.extend(load_view(&input, &mapping, &rules)?.category_options);
            }

            for category in mapping.category_options(known) {
                println!("{category}");
            }
        }

        Command::Learn {
            description,
            category,
            rules,
        } => {
            let Some(path) = rules.or_else(|| cfg.rules_path.clone()) else {
                bail!("no rules file: pass --rules or set rules_path in config.toml");
            };
            let mut doc = if path.exists() {
                RulesDocument::load(&path)?
            } else {
                RulesDocument::default()
            };

            match doc.learn(&description, &category) {
                Some(phrase) => {
                    doc.save(&path)?;
                    println!("Learned '{phrase}' -> {category} ({})", path.display());
                }
                None => println!("No new rule for {description:?}"),
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => {
                let home = state::ensure_sniffer_home(Some(home.as_path()))?;
                config::init_config(&home)?;
            }
            ConfigCommand::Show => {
                println!("# {}", config::config_path(&home).display());
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },
    }

    Ok(ExitCode::SUCCESS)
}

fn mapping_store(resources: &Resources, cfg: &config::Config) -> MappingStore {
    MappingStore::open(resources.mapping.clone().or_else(|| cfg.mapping_path.clone()))
}

fn rules_path<'a>(resources: &'a Resources, cfg: &'a config::Config) -> Option<&'a Path> {
    resources
        .rules
        .as_deref()
        .or(cfg.rules_path.as_deref())
}

fn load_view(
    input: &Input,
    mapping: &sniffer_core::CategoryMappingConfig,
    rules: &RulesDocument,
) -> Result<SummaryView> {
    if let Some(csv) = &input.csv {
        let mut txns = dedupe(parse_bank_csv(csv)?);
        let filled = categorize_missing(rules, &mut txns);
        debug!(filled, total = txns.len(), "categorised statement rows");
        return Ok(SummaryView::from_transactions(&txns, mapping));
    }

    if let Some(feed_path) = &input.feed {
        let text = fs::read_to_string(feed_path)
            .with_context(|| format!("read {}", feed_path.display()))?;
        let feed: SummaryFeed = serde_json::from_str(&text)
            .with_context(|| format!("parse {}", feed_path.display()))?;
        let normalized = feed.normalize();
        if normalized.skipped > 0 {
            warn!(skipped = normalized.skipped, "feed records could not be read");
        }
        return Ok(SummaryView::build(&normalized, mapping));
    }

    bail!("pass --csv <file> or --feed <file>")
}

fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        // RUST_LOG exists; use it.
        Some(_) => EnvFilter::from_default_env(),
        None => EnvFilter::new(format!(
            "sniffer_core={level},sniffer_ingest={level},sniffer_finance={level},{}={level}",
            env!("CARGO_CRATE_NAME"),
        )),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
