//! TripPlan - itinerary scheduling CLI
//!
//! Each editing command loads the trip, applies one operation, waits for the
//! affected legs to be annotated and saves.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info};

use docstore::Store;
use tripplan::cli::{Cli, Command};
use tripplan::config::Config;
use tripplan::directions::create_provider;
use tripplan::domain::{OccurrenceId, hhmm};
use tripplan::itinerary::ScheduleEditor;
use tripplan::persistence::{self, LoadedTrip, TripFixture};
use tripplan::routes::{LegDuration, LegKey};
use tripplan::session::PlanningSession;

fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tripplan")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let log_file = fs::File::create(log_dir.join("tripplan.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    Ok(())
}

fn open_store(config: &Config) -> Result<Store> {
    let dir = &config.storage.store_dir;
    Store::open(dir).context(format!("Failed to open store at {}", dir.display()))
}

fn require_trip(trip: Option<String>) -> Result<String> {
    trip.ok_or_else(|| eyre::eyre!("No trip selected. Pass --trip <ID>"))
}

fn resolve(editor: &ScheduleEditor, date: NaiveDate, raw: &str) -> Result<OccurrenceId> {
    editor
        .itinerary()
        .resolve_id(date, raw)
        .ok_or_else(|| eyre::eyre!("No occurrence '{}' on {}", raw, date))
}

fn format_leg(duration: Option<LegDuration>) -> ColoredString {
    match duration {
        Some(LegDuration::Minutes(m)) => format!("{} min", m).green(),
        Some(LegDuration::Unavailable) => "no route".red(),
        None => "computing".yellow(),
    }
}

fn format_times(arrival: Option<chrono::NaiveTime>, departure: Option<chrono::NaiveTime>) -> String {
    let show = |t: Option<chrono::NaiveTime>| t.map(|t| hhmm::format(&t)).unwrap_or_else(|| "--:--".to_string());
    format!("{}–{}", show(arrival), show(departure))
}

fn print_itinerary(loaded: &LoadedTrip, only: Option<NaiveDate>, lists: bool) {
    let trip = &loaded.trip;
    println!(
        "{} ({} → {})",
        trip.name.bold(),
        trip.start_date,
        trip.end_date
    );

    for (date, day) in loaded.itinerary.days() {
        if only.is_some_and(|d| d != date) {
            continue;
        }
        println!("{}", date.to_string().cyan());
        if day.is_empty() {
            println!("  {}", "(empty)".dimmed());
        }
        for (index, occ) in day.iter().enumerate() {
            if index > 0 {
                let key = LegKey::new(day[index - 1].id().clone(), occ.id().clone());
                match loaded.routes.get(date, &key) {
                    Some(leg) => println!("     ↓ {} {}", leg.mode, format_leg(leg.duration)),
                    None => println!("     ↓ {}", "not computed".dimmed()),
                }
            }
            println!(
                "  {}. {} {} {}",
                index,
                occ.title(),
                format!("[{}]", occ.id()).dimmed(),
                format_times(occ.arrival(), occ.departure())
            );
        }
    }

    if lists {
        for list in loaded.catalog.lists() {
            println!("{} {}", "list".dimmed(), list.id.cyan());
            for (index, place) in list.places.iter().enumerate() {
                let marker = if loaded.itinerary.contains_origin(&place.id) {
                    "✓".green()
                } else {
                    " ".normal()
                };
                println!("  {} {}. {} {}", marker, index, place.details.title, format!("[{}]", place.id).dimmed());
            }
        }
    }
}

fn cmd_import(config: &Config, fixture: &Path) -> Result<()> {
    let fixture = TripFixture::from_file(fixture).context(format!("Failed to read fixture {}", fixture.display()))?;
    let mut store = open_store(config)?;
    let written = persistence::import(&mut store, &fixture)?;
    println!(
        "{} Imported trip {} ({} documents)",
        "✓".green(),
        fixture.trip.id.cyan(),
        written
    );
    Ok(())
}

fn cmd_show(config: &Config, user: &str, trip: &str, date: Option<NaiveDate>, lists: bool) -> Result<()> {
    let store = open_store(config)?;
    let loaded = persistence::load(&store, user, trip, config.directions.default_mode)?;
    print_itinerary(&loaded, date, lists);
    Ok(())
}

async fn cmd_edit(config: &Config, user: &str, trip: &str, command: Command) -> Result<()> {
    config.validate()?;
    let provider = create_provider(&config.directions)?;
    let store = open_store(config)?;
    let mut session = PlanningSession::new(store, provider, &config.directions, user, trip);
    session.load()?;

    let editor = session.editor_mut()?;
    let message = match command {
        Command::Move {
            source,
            source_index,
            dest,
            dest_index,
        } => {
            let id = editor.move_item(&source, source_index, &dest, dest_index)?;
            format!("Moved {} to {}", id, dest)
        }
        Command::Remove { date, occurrence } => {
            let id = resolve(editor, date, &occurrence)?;
            let removed = editor.remove_from_day(date, &id)?;
            format!("Removed {} from {}", removed.title(), date)
        }
        Command::Time {
            date,
            occurrence,
            field,
            value,
        } => {
            let id = resolve(editor, date, &occurrence)?;
            let time = match value.as_deref() {
                None | Some("-") => None,
                Some(raw) => Some(hhmm::parse(raw).ok_or_else(|| eyre::eyre!("Invalid time '{}', expected HH:MM", raw))?),
            };
            editor.set_time(date, &id, field, time)?;
            match time {
                Some(time) => format!("Set {} of {} to {}", field, id, hhmm::format(&time)),
                None => format!("Cleared {} of {}", field, id),
            }
        }
        Command::Mode { date, from, to, mode } => {
            let from = resolve(editor, date, &from)?;
            let to = resolve(editor, date, &to)?;
            editor.set_mode(date, &from, &to, mode)?;
            format!("Set {} → {} to {}", from, to, mode)
        }
        Command::Import { .. } | Command::Show { .. } => eyre::bail!("Not an editing command"),
    };

    let settled = editor.settle_routes().await;
    debug!(settled, "cmd_edit: routes settled");
    session.save()?;
    println!("{} {}", "✓".green(), message);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!(
        "TripPlan loaded config: provider={}, store={}",
        config.directions.provider,
        config.storage.store_dir.display()
    );

    let Cli { user, trip, command, .. } = cli;
    match command {
        Command::Import { fixture } => cmd_import(&config, &fixture),
        Command::Show { date, lists } => cmd_show(&config, &user, &require_trip(trip)?, date, lists),
        edit => cmd_edit(&config, &user, &require_trip(trip)?, edit).await,
    }
}
