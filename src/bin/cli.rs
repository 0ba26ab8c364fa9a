//! Micerace CLI - race statistics, lane reports and training datasets

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use micerace::data::{load_mice, load_races, DatasetBuilder};
use micerace::stats::LaneShare;
use micerace::{
    Config, HistoricalRaceLedger, MouseRecord, MouseSnapshot, RaceLedger, RaceSystem, RawRace,
    Snapshot, SnapshotBuilder,
};

/// Default feed locations (relative to the working directory)
const DEFAULT_RACES: &str = "data/races.json";
const DEFAULT_MICE: &str = "data/mice.json";

#[derive(Parser)]
#[command(name = "micerace")]
#[command(author, version, about = "Mouse race statistics CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the race feed dump
    #[arg(long, global = true, default_value = DEFAULT_RACES)]
    races: PathBuf,

    /// Path to the leaderboard dump
    #[arg(long, global = true, default_value = DEFAULT_MICE)]
    mice: PathBuf,

    /// Optional JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Leaderboard statistics over the full race history
    Stats {
        /// Only these mice (repeatable)
        #[arg(short, long)]
        mouse: Vec<String>,

        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,

        /// Write the JSON snapshot to a file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of leaderboard rows to show
        #[arg(long, default_value = "20")]
        top: usize,
    },

    /// Share of races won from each lane
    Lanes,

    /// Replay the history and export a training CSV
    Dataset {
        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,

        /// Races ingested before the first example
        #[arg(long, default_value = "100")]
        primer: usize,

        /// Maximum number of examples
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Step through the history interactively
    Replay {
        /// Races ingested before the first step
        #[arg(long, default_value = "100")]
        primer: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Stats {
            mouse,
            json,
            output,
            top,
        } => {
            run_stats(&cli.races, &cli.mice, &config, &mouse, json, output, top)?;
        }
        Commands::Lanes => {
            run_lanes(&cli.races, &cli.mice, &config)?;
        }
        Commands::Dataset {
            output,
            primer,
            limit,
        } => {
            run_dataset(&cli.races, &cli.mice, &config, &output, primer, limit)?;
        }
        Commands::Replay { primer } => {
            run_replay(&cli.races, &cli.mice, &config, primer)?;
        }
    }

    Ok(())
}

fn load_feeds(races_path: &Path, mice_path: &Path) -> Result<(Vec<MouseRecord>, Vec<RawRace>)> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Loading feeds...");

    let mice = load_mice(mice_path)
        .with_context(|| format!("Failed to load mice from {:?}", mice_path))?;
    let races = load_races(races_path)
        .with_context(|| format!("Failed to load races from {:?}", races_path))?;

    pb.finish_and_clear();
    Ok((mice, races))
}

fn load_ledger(races_path: &Path, mice_path: &Path, config: &Config) -> Result<RaceLedger> {
    let (mice, races) = load_feeds(races_path, mice_path)?;
    RaceLedger::new(&mice, &races, config.ledger.clone()).context("Failed to build race ledger")
}

fn run_stats(
    races_path: &Path,
    mice_path: &Path,
    config: &Config,
    targets: &[String],
    json: bool,
    output: Option<PathBuf>,
    top: usize,
) -> Result<()> {
    let ledger = load_ledger(races_path, mice_path, config)?;
    let builder = SnapshotBuilder::new(config.snapshot.clone());
    let snapshot = builder
        .build(&ledger, (!targets.is_empty()).then_some(targets))
        .context("Failed to build snapshot")?;

    if let Some(path) = output {
        let body = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(&path, body).with_context(|| format!("Failed to write {:?}", path))?;
        println!(
            "{} {} records to {:?}",
            "Wrote".green(),
            snapshot.records.len(),
            path
        );
    } else if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    print_ledger_summary(&ledger);
    print_leaderboard(&snapshot, top);
    if targets.len() == 1 {
        if let Some(record) = snapshot.records.first() {
            print_mouse_detail(record);
        }
    }
    Ok(())
}

fn run_lanes(races_path: &Path, mice_path: &Path, config: &Config) -> Result<()> {
    let ledger = load_ledger(races_path, mice_path, config)?;
    let shares = SnapshotBuilder::new(config.snapshot.clone()).global_lane_distribution(&ledger);

    print_ledger_summary(&ledger);
    print_lane_shares(&shares);
    Ok(())
}

fn run_dataset(
    races_path: &Path,
    mice_path: &Path,
    config: &Config,
    output: &Path,
    primer: usize,
    limit: Option<usize>,
) -> Result<()> {
    let (mice, races) = load_feeds(races_path, mice_path)?;
    let mut ledger = HistoricalRaceLedger::new(&mice, &races, config.ledger.clone(), primer)
        .context("Failed to prepare replay")?;

    println!(
        "{}: {} races primed, {} to replay, {} rejected records",
        "Dataset".green().bold(),
        ledger.current_offset(),
        ledger.remaining(),
        ledger.rejected()
    );

    let pb = ProgressBar::new(ledger.remaining() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let builder = DatasetBuilder::new(SnapshotBuilder::new(config.snapshot.clone()));
    let set = builder
        .generate_with(&mut ledger, limit, |race| {
            pb.set_message(race.id.clone());
            pb.inc(1);
        })
        .context("Failed to generate examples")?;
    pb.finish_and_clear();

    set.write_csv(output)
        .with_context(|| format!("Failed to write CSV to {:?}", output))?;

    println!();
    println!("{}", "Dataset Summary:".yellow().bold());
    println!("{}", "-".repeat(40));
    println!("{:<24} {:>12}", "Examples", set.len());
    println!("{:<24} {:>12}", "Skipped races", set.skipped);
    println!("{:<24} {:>12}", "Features per example", set.feature_names.len());
    println!("{:<24} {:>12}", "Races left unreplayed", ledger.remaining());
    println!("{:<24} {:>12}", "Output", output.display());
    Ok(())
}

fn run_replay(races_path: &Path, mice_path: &Path, config: &Config, primer: usize) -> Result<()> {
    let (mice, races) = load_feeds(races_path, mice_path)?;
    let mut ledger = HistoricalRaceLedger::new(&mice, &races, config.ledger.clone(), primer)
        .context("Failed to prepare replay")?;
    let builder = SnapshotBuilder::new(config.snapshot.clone());

    println!("{}", "Replay mode".green().bold());
    println!(
        "{} races primed, {} pending.\n",
        ledger.current_offset(),
        ledger.remaining()
    );

    let theme = ColorfulTheme::default();

    loop {
        let options = vec![
            "Ingest next race",
            "Ingest several races",
            "Show leaderboard",
            "Show mouse",
            "Show lanes",
            "Quit",
        ];

        let selection = Select::with_theme(&theme)
            .with_prompt(format!(
                "Offset {} ({} remaining)",
                ledger.current_offset(),
                ledger.remaining()
            ))
            .items(&options)
            .default(0)
            .interact()?;

        match selection {
            0 | 1 => {
                let steps: usize = if selection == 0 {
                    1
                } else {
                    Input::with_theme(&theme)
                        .with_prompt("Number of races")
                        .default(10)
                        .interact_text()?
                };

                for _ in 0..steps {
                    match ledger.ingest_next()? {
                        Some(race) => {
                            println!(
                                "  {} {} won by {} ({})",
                                "Ingested".green(),
                                race.id,
                                race.winner_name.as_deref().unwrap_or("-").bold(),
                                race.lanes.join(" / ")
                            );
                        }
                        None => {
                            println!("{}", "Replay exhausted.".yellow());
                            break;
                        }
                    }
                }
                println!();
            }
            2 => {
                let snapshot = builder.build(&ledger, None)?;
                print_leaderboard(&snapshot, 20);
                println!();
            }
            3 => {
                let name: String = Input::with_theme(&theme)
                    .with_prompt("Mouse name")
                    .interact_text()?;

                let snapshot = builder.build(&ledger, Some(std::slice::from_ref(&name)))?;
                match snapshot.records.first() {
                    Some(record) => print_mouse_detail(record),
                    None => println!("{} {}", "No statistics for".yellow(), name),
                }
                println!();
            }
            4 => {
                print_lane_shares(&builder.global_lane_distribution(&ledger));
                println!();
            }
            5 => {
                println!("Goodbye!");
                break;
            }
            _ => {}
        }
    }

    Ok(())
}

fn print_ledger_summary(ledger: &RaceLedger) {
    println!(
        "{}: {} races, {} mice, {} unregistered names, {} rejected records",
        "Ledger".green().bold(),
        ledger.races().len(),
        ledger.registry().len(),
        ledger.unregistered().len(),
        ledger.rejected()
    );
    if let Some(race) = ledger.latest_race() {
        println!(
            "Latest race {} at {}",
            race.id,
            race.reference_time()
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }
    println!();
}

fn print_leaderboard(snapshot: &Snapshot, top: usize) {
    println!("{}", "Leaderboard:".yellow().bold());
    println!(
        "{:<18} {:>8} {:>6} {:>5} {:>5} {:>7} {:>7} {:>7} {:>8}",
        "Name", "Rating", "Races", "W", "L", "Ratio", "Lane", "Streak", "Last 10"
    );
    println!("{}", "-".repeat(80));

    for record in snapshot.records.iter().take(top) {
        let last_ten = record
            .last_races
            .iter()
            .find(|w| w.races == 10)
            .or_else(|| record.last_races.first())
            .map(|w| format!("{}-{}", w.wins, w.losses))
            .unwrap_or_else(|| "-".to_string());

        let ratio = format!("{:.3}", record.lifetime_win_ratio);
        let ratio = if record.lifetime_win_ratio >= 0.3 {
            ratio.green()
        } else {
            ratio.normal()
        };

        println!(
            "{:<18} {:>8.1} {:>6} {:>5} {:>5} {:>7} {:>7} {:>7} {:>8}",
            truncate_name(&record.name, 18),
            record.site_rating,
            record.race_count,
            record.wins,
            record.losses,
            ratio,
            record.current_lane_label,
            record.repeat_wins.current,
            last_ten
        );
    }

    if !snapshot.skipped.is_empty() {
        println!(
            "\n{} {}",
            "No history:".yellow(),
            snapshot.skipped.join(", ")
        );
    }
}

fn print_mouse_detail(record: &MouseSnapshot) {
    println!();
    println!(
        "{} {} (family {}, {}, {} days)",
        "Mouse".yellow().bold(),
        record.name.bold(),
        record.family_id,
        record.color,
        record.age_days.unwrap_or(0)
    );
    println!(
        "Current lane {} wins {:.1}% of its wins there; record {}-{}",
        record.current_lane_label,
        record.current_lane_win_share * 100.0,
        record.current_lane_record.wins,
        record.current_lane_record.losses
    );
    println!(
        "Repeat wins: current {}, average {:.2}, median {:.1}, max {}",
        record.repeat_wins.current,
        record.repeat_wins.average,
        record.repeat_wins.median,
        record.repeat_wins.max
    );
    println!();

    println!(
        "{:<6} {:>5} {:>5} {:>7} {:>9} {:>8} {:>10}",
        "Window", "W", "L", "Ratio", "Lane W-L", "Streak", "Mean time"
    );
    println!("{}", "-".repeat(56));

    for entry in &record.intervals {
        let stats = &entry.stats;
        let mean_time = stats
            .win_times
            .as_ref()
            .map(|t| format!("{:.2}s", t.summary.mean))
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:<6} {:>5} {:>5} {:>7.3} {:>9} {:>8.2} {:>10}",
            entry.label,
            stats.wins,
            stats.losses,
            stats.win_ratio,
            format!("{}-{}", stats.current_lane.wins, stats.current_lane.losses),
            stats.average_repeat_wins,
            mean_time
        );
    }
}

fn print_lane_shares(shares: &[LaneShare]) {
    println!("{}", "Lane Win Distribution:".yellow().bold());
    println!("{:<10} {:>8}  {}", "Lane", "Share", "");
    println!("{}", "-".repeat(50));

    for share in shares {
        let bar = "#".repeat((share.ratio * 30.0).round() as usize);
        println!(
            "{:<10} {:>7.1}%  {}",
            share.label,
            share.ratio * 100.0,
            bar.cyan()
        );
    }
}

/// Truncate name to fit display width
fn truncate_name(name: &str, max_len: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_len {
        name.to_string()
    } else {
        chars[..max_len - 1].iter().collect::<String>() + "…"
    }
}
