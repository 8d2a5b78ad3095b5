//! `slots` CLI — compute business-hours availability and manage a slot ledger.
//!
//! ## Usage
//!
//! ```sh
//! # Free intervals for the default booking horizon (busy periods from a JSON file)
//! slots free --busy busy.json
//!
//! # Free intervals for an explicit window, as JSON
//! slots free --busy busy.json --from 2026-03-16T08:00:00+01:00 --to 2026-03-16T22:00:00+01:00 --json
//!
//! # Recompute the ledger from fresh busy data
//! slots refresh --busy busy.json --ledger slots.ledger
//!
//! # Show what is still bookable
//! slots list --ledger slots.ledger
//!
//! # Remove a slot that was booked elsewhere
//! slots consume --ledger slots.ledger "2026-03-16 09"
//!
//! # Book the first ledger slot the other party offers
//! slots book --ledger slots.ledger --offer 2026-03-16T12:00:00+01:00 --offer 2026-03-16T13:00:00+01:00
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use slot_engine::freebusy::merge_busy;
use slot_engine::{
    BusinessHoursPolicy, CalendarSource, EngineConfig, FileStore, FreeInterval, JsonFileSource,
    OfferListConsumer, Scheduler, Slot, SlotLedger, TimeWindow,
};

#[derive(Parser)]
#[command(
    name = "slots",
    version,
    about = "Business-hours availability and slot ledger CLI"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file (timezone, business hours, slot length, horizon)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print free business-hours intervals
    Free {
        /// Busy-period JSON file
        #[arg(long)]
        busy: String,
        /// Window start (RFC 3339); requires --to
        #[arg(long, requires = "to")]
        from: Option<String>,
        /// Window end (RFC 3339); requires --from
        #[arg(long, requires = "from")]
        to: Option<String>,
        /// Reference time for the booking horizon (defaults to now)
        #[arg(long, conflicts_with = "from")]
        now: Option<String>,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Recompute available slots and replace the ledger
    Refresh {
        /// Busy-period JSON file
        #[arg(long)]
        busy: String,
        /// Ledger file
        #[arg(long)]
        ledger: String,
        /// Reference time for the booking horizon (defaults to now)
        #[arg(long)]
        now: Option<String>,
    },
    /// List the slots still available in the ledger
    List {
        /// Ledger file
        #[arg(long)]
        ledger: String,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Remove one slot from the ledger
    Consume {
        /// Ledger file
        #[arg(long)]
        ledger: String,
        /// Slot start: RFC 3339, or "YYYY-MM-DD HH" in the configured timezone
        slot: String,
    },
    /// Book the first ledger slot that appears among the offered start times
    Book {
        /// Ledger file
        #[arg(long)]
        ledger: String,
        /// A start time the other party offers (repeatable)
        #[arg(long = "offer", required = true)]
        offers: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_writer(std::io::stderr)
        .init();

    let config = match cli.config.as_deref() {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path))?,
        None => EngineConfig::default(),
    };
    let scheduler = Scheduler::from_config(&config).context("Invalid configuration")?;
    let policy = *scheduler.policy();
    let tz = policy.timezone();
    debug!(timezone = %tz, slot_minutes = config.slot_minutes, "configuration loaded");

    match cli.command {
        Commands::Free {
            busy,
            from,
            to,
            now,
            json,
        } => {
            let query = match (from.as_deref(), to.as_deref()) {
                (Some(from), Some(to)) => TimeWindow::try_new(
                    resolve_instant(from, &policy)?,
                    resolve_instant(to, &policy)?,
                )
                .context("Invalid --from/--to window")?,
                _ => scheduler.horizon(&reference_time(now.as_deref(), &policy)?),
            };

            let source = JsonFileSource::new(&busy, tz);
            let busy = source
                .fetch_busy(&query)
                .context("Failed to read busy periods")?;
            let plan = scheduler.plan(&query, &busy)?;

            if json {
                let busy_blocks: Vec<_> = merge_busy(&query, &busy, tz)
                    .iter()
                    .map(|w| json!({ "start": rfc3339(w.start()), "end": rfc3339(w.end()) }))
                    .collect();
                let out = json!({
                    "timezone": tz.name(),
                    "time_min": rfc3339(query.start()),
                    "time_max": rfc3339(query.end()),
                    "free_slots": plan.free,
                    "busy_slots": busy_blocks,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!(
                    "Free slots in {} ({}-{}):",
                    tz.name(),
                    policy.day_start().format("%H:%M"),
                    policy.day_end().format("%H:%M")
                );
                for interval in &plan.free {
                    println!("{}", describe_interval(interval));
                }
            }
        }
        Commands::Refresh { busy, ledger, now } => {
            let now = reference_time(now.as_deref(), &policy)?;
            let store = FileStore::new(&ledger, tz);
            let slot_ledger = load_ledger(&store)?;

            let report = scheduler
                .refresh(&slot_ledger, &JsonFileSource::new(&busy, tz), &now)
                .context("Refresh failed; ledger left unchanged")?;
            save_ledger(&slot_ledger, &store)?;

            println!(
                "Window {}: {} free intervals, {} slots saved to {}",
                report.window,
                report.free.len(),
                report.slots.len(),
                ledger
            );
        }
        Commands::List { ledger, json } => {
            let store = FileStore::new(&ledger, tz);
            let slot_ledger = load_ledger(&store)?;
            let snapshot = slot_ledger.peek_ordered();
            let duration = scheduler.slot_duration();

            if json {
                let slots: Vec<_> = snapshot
                    .iter()
                    .map(|slot| {
                        json!({
                            "start": rfc3339(slot.start),
                            "end": rfc3339(slot.end(duration)),
                            "duration_minutes": duration.num_minutes(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&slots)?);
            } else if snapshot.is_empty() {
                println!("No available slots.");
            } else {
                println!("{} available slots:", snapshot.len());
                for slot in &snapshot {
                    println!("- {}", describe_slot(slot, duration));
                }
            }
        }
        Commands::Consume { ledger, slot } => {
            let key = resolve_instant(&slot, &policy)?;
            let store = FileStore::new(&ledger, tz);
            let slot_ledger = load_ledger(&store)?;

            if slot_ledger.consume(key) {
                save_ledger(&slot_ledger, &store)?;
                println!("consumed {}", Slot::new(key));
            } else {
                println!("not present {}", Slot::new(key));
            }
        }
        Commands::Book { ledger, offers } => {
            let offered = offers
                .iter()
                .map(|raw| resolve_instant(raw, &policy))
                .collect::<Result<Vec<_>>>()?;
            let store = FileStore::new(&ledger, tz);
            let slot_ledger = load_ledger(&store)?;

            let mut consumer = OfferListConsumer::new(offered);
            match scheduler.book_next(&slot_ledger, &mut consumer)? {
                Some(slot) => {
                    save_ledger(&slot_ledger, &store)?;
                    println!("booked {}", slot);
                }
                None => {
                    anyhow::bail!(
                        "None of the {} available slots were offered",
                        slot_ledger.len()
                    );
                }
            }
        }
    }

    Ok(())
}

/// Parse an instant given on the command line.
///
/// Accepts RFC 3339 (any offset) or the short `YYYY-MM-DD HH` form, which is read
/// as wall-clock time in the policy timezone.
fn resolve_instant(raw: &str, policy: &BusinessHoursPolicy) -> Result<DateTime<Tz>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&policy.timezone()));
    }
    let naive = NaiveDateTime::parse_from_str(&format!("{}:00", raw), "%Y-%m-%d %H:%M")
        .with_context(|| {
            format!(
                "Invalid time '{}': expected RFC 3339 or 'YYYY-MM-DD HH'",
                raw
            )
        })?;
    Ok(policy.localize(naive))
}

fn load_ledger(store: &FileStore) -> Result<SlotLedger> {
    SlotLedger::load_from(store)
        .with_context(|| format!("Failed to load ledger: {}", store.path().display()))
}

fn save_ledger(ledger: &SlotLedger, store: &FileStore) -> Result<()> {
    ledger
        .save_to(store)
        .with_context(|| format!("Failed to save ledger: {}", store.path().display()))
}

fn reference_time(now: Option<&str>, policy: &BusinessHoursPolicy) -> Result<DateTime<Tz>> {
    match now {
        Some(raw) => resolve_instant(raw, policy),
        None => Ok(Utc::now().with_timezone(&policy.timezone())),
    }
}

fn rfc3339(at: DateTime<Tz>) -> String {
    at.fixed_offset().to_rfc3339()
}

fn describe_interval(interval: &FreeInterval) -> String {
    format!(
        "{} to {} ({} minutes)",
        interval.start.format("%Y-%m-%d %H:%M"),
        interval.end.format("%Y-%m-%d %H:%M"),
        interval.duration_minutes
    )
}

fn describe_slot(slot: &Slot, duration: chrono::Duration) -> String {
    format!(
        "{} to {}",
        slot.start.format("%Y-%m-%d %H:%M"),
        slot.end(duration).format("%H:%M")
    )
}
