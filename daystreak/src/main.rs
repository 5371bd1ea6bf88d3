//! daystreak - daily task-completion streaks from the command line
//!
//! Commands:
//! - `record`: fold today's task counts into the statistics
//! - `show`: print the streak, weekly series and time-of-day tally
//! - `sync`: reconcile with the remote tier and push the current snapshot
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/daystreak/daystreak.db (~/.local/share/daystreak/daystreak.db)
//! - Config: $XDG_CONFIG_HOME/daystreak/config.toml (~/.config/daystreak/config.toml)
//! - Logs: $XDG_STATE_HOME/daystreak/ (~/.local/state/daystreak/)

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use daystreak_core::stats::NO_PRODUCTIVE_DAY;
use daystreak_core::types::DayPart;
use daystreak_core::{
    Config, Database, DrainOutcome, FixedTasks, PersistOutcome, StaticSession, StatisticsClient,
    TaskStatus, Tracker,
};

type CliTracker = Tracker<Database, Option<StatisticsClient>, StaticSession, FixedTasks>;

#[derive(Parser)]
#[command(name = "daystreak")]
#[command(about = "Track daily task-completion streaks")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record today's task counts
    Record {
        /// Tasks completed
        #[arg(short, long)]
        completed: u32,

        /// Tasks on the list (defaults to the completed count)
        #[arg(short, long)]
        total: Option<u32>,

        /// Local time of the activity (YYYY-MM-DDTHH:MM, default: now)
        #[arg(long)]
        at: Option<String>,
    },

    /// Show streak and weekly statistics
    Show {
        /// Day to compute the weekly series for (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Reconcile with the remote tier and push the current snapshot
    Sync,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    Config::ensure_xdg_env();

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard =
        daystreak_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let mut tracker = open_tracker(&config)?;
    let source = tracker.initialize().await;
    tracing::debug!(?source, "Tracker ready");

    match args.command {
        Command::Record {
            completed,
            total,
            at,
        } => cmd_record(&mut tracker, completed, total, at.as_deref()).await,
        Command::Show { date, json } => cmd_show(&mut tracker, date.as_deref(), json),
        Command::Sync => cmd_sync(&mut tracker, &config).await,
    }
}

fn open_tracker(config: &Config) -> Result<CliTracker> {
    let db_path = Config::database_path();
    let db = Database::open(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;
    db.migrate().context("failed to run database migrations")?;

    let remote =
        StatisticsClient::from_config(&config.remote).context("failed to create remote client")?;
    let session = StaticSession::new(remote.is_some());

    Ok(Tracker::new(
        db,
        remote,
        session,
        FixedTasks::default(),
        config.sync.clone(),
    ))
}

fn parse_datetime(raw: Option<&str>) -> Result<NaiveDateTime> {
    match raw {
        Some(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
            .with_context(|| format!("invalid time {s:?}, expected YYYY-MM-DDTHH:MM")),
        None => Ok(Local::now().naive_local()),
    }
}

fn parse_date(raw: Option<&str>) -> Result<NaiveDate> {
    match raw {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid date {s:?}, expected YYYY-MM-DD")),
        None => Ok(Local::now().date_naive()),
    }
}

async fn cmd_record(
    tracker: &mut CliTracker,
    completed: u32,
    total: Option<u32>,
    at: Option<&str>,
) -> Result<()> {
    let total = total.unwrap_or(completed);
    if completed > total {
        anyhow::bail!("completed ({completed}) cannot exceed total ({total})");
    }
    let now = parse_datetime(at)?;

    let tasks: Vec<TaskStatus> = (0..total)
        .map(|i| {
            if i < completed {
                TaskStatus::done()
            } else {
                TaskStatus::open()
            }
        })
        .collect();

    let Some(recorded) = tracker
        .record_daily_activity(now, completed > 0, &tasks)
        .await
    else {
        println!("No completed tasks; nothing recorded.");
        return Ok(());
    };

    if recorded.persisted == PersistOutcome::Queued {
        match tracker.process_sync_queue().await {
            DrainOutcome::Synced => tracing::info!("Queued statistics delivered on retry"),
            outcome => println!("Remote sync failed ({outcome:?}); saved locally."),
        }
    }

    let streak = tracker.streak();
    println!(
        "Recorded {completed}/{total} on {} ({}).",
        now.date(),
        recorded.day_part
    );
    println!(
        "Current streak: {} day(s), longest: {}",
        streak.current_streak, streak.longest_streak
    );
    Ok(())
}

fn cmd_show(tracker: &mut CliTracker, date: Option<&str>, json: bool) -> Result<()> {
    let today = parse_date(date)?;
    let summary = tracker.summary(today);
    let streak = tracker.streak().clone();
    let tally = tracker.time_of_day().clone();

    if json {
        let value = serde_json::json!({
            "today": today.to_string(),
            "streak": {
                "current": streak.current_as_of(today),
                "stored": streak.current_streak,
                "longest": streak.longest_streak,
                "lastActiveDate": streak.last_active_date.map(|d| d.to_string()),
            },
            "weeklyProgress": summary.weekly_progress,
            "previousWeekTotal": summary.previous_week_total,
            "weekOverWeekChange": summary.week_over_week_change,
            "mostProductiveDay": summary.most_productive_day.unwrap_or(NO_PRODUCTIVE_DAY),
            "timeOfDayStats": tally.entries(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Streak");
    println!("======");
    println!("Current:          {}", streak.current_as_of(today));
    println!("Longest:          {}", streak.longest_streak);
    println!(
        "Last active:      {}",
        streak
            .last_active_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "<never>".to_string())
    );
    println!();

    println!("Last 7 days");
    println!("===========");
    for item in &summary.weekly_progress {
        println!("{:<4} {:>3} {}", item.day, item.completed, bar(item.completed));
    }
    println!();
    println!("This week:        {}", summary.this_week_total());
    println!("Previous week:    {}", summary.previous_week_total);
    println!("Change:           {:+}%", summary.week_over_week_change);
    println!(
        "Most productive:  {}",
        summary.most_productive_day.unwrap_or(NO_PRODUCTIVE_DAY)
    );
    println!();

    println!("Time of day");
    println!("===========");
    for part in DayPart::ALL {
        println!("{:<10} {:>5}", part.as_str(), tally.count(part));
    }
    if let Some(busiest) = tally.busiest() {
        println!("Busiest:   {busiest}");
    }
    Ok(())
}

async fn cmd_sync(tracker: &mut CliTracker, config: &Config) -> Result<()> {
    if !config.remote.is_ready() {
        println!("Remote sync is disabled. Enable it in config.toml:");
        println!();
        println!("  [remote]");
        println!("  enabled = true");
        println!("  server_url = \"https://tasks.example.com\"");
        println!("  api_key = \"xxxxxxxxxxxx\"");
        return Ok(());
    }

    if let Some(client) = tracker.sync().remote() {
        println!("Endpoint:  {}", client.endpoint());
    }
    println!("Loaded:    {:?}", tracker.sync().state());

    // Full-snapshot overwrite, so pushing again after startup is harmless
    let outcome = tracker.push_snapshot().await;
    tracing::debug!(?outcome, "Pushed statistics snapshot");
    match outcome {
        PersistOutcome::Synced => println!("Remote:    up to date"),
        _ => println!("Remote:    unreachable, will retry on the next run"),
    }
    println!("Streak:    {}", tracker.streak().current_streak);
    Ok(())
}

fn bar(count: u32) -> String {
    "#".repeat(count.min(40) as usize)
}
