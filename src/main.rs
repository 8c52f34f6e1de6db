/// `rivermon` daemon.
///
/// Runs a monitoring session on a timer and logs every alert it raises.
///
/// Usage:
///   rivermon              run until `quit` or until stdin closes
///   rivermon --ticks N    run N scheduled ticks, print the health report, exit
///
/// While running, stdin accepts `refresh`, `health`, `alerts`, `stale`,
/// `snapshot` and `quit`.

use std::io::{self, BufRead};
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;

use rivermon::alert::notifier::LogNotifier;
use rivermon::config::MonitorConfig;
use rivermon::logging::{self, Component};
use rivermon::scheduler::{Scheduler, ThreadScheduler};
use rivermon::session::{MonitoringSession, TickOutcome};

#[derive(Parser, Debug)]
#[command(version, about = "Simulated river monitoring daemon", long_about = None)]
struct Args {
    /// Stop after this many scheduled ticks and print the health report.
    #[arg(long)]
    ticks: Option<u64>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match MonitorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("rivermon: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let init = config.logging.log_level().map_err(|e| e.to_string()).and_then(|level| {
        logging::init_logger(level, config.logging.file.as_deref(), config.logging.timestamps)
            .map_err(|e| e.to_string())
    });
    if let Err(message) = init {
        eprintln!("rivermon: {}", message);
        return ExitCode::FAILURE;
    }

    let session = Arc::new(MonitoringSession::new(&config, Arc::new(LogNotifier), Utc::now()));
    let interval = config.simulation.tick_interval();

    let result = match args.ticks {
        Some(limit) => run_bounded(&session, interval, limit),
        None => run_interactive(&session, interval),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            logging::error(Component::System, None, &message);
            ExitCode::FAILURE
        }
    }
}

fn start_ticking(
    session: &Arc<MonitoringSession>,
    interval: Duration,
) -> Result<ThreadScheduler, String> {
    let ticking = Arc::clone(session);
    let mut scheduler = ThreadScheduler::new();
    scheduler
        .start(
            interval,
            Box::new(move || {
                if let TickOutcome::Skipped = ticking.tick(Utc::now()) {
                    logging::debug(Component::Scheduler, None, "Tick skipped");
                }
            }),
        )
        .map_err(|e| e.to_string())?;
    Ok(scheduler)
}

fn run_bounded(session: &Arc<MonitoringSession>, interval: Duration, limit: u64) -> Result<(), String> {
    let mut scheduler = start_ticking(session, interval)?;
    while session.current_tick() < limit {
        thread::sleep(interval / 4);
    }
    scheduler.stop();
    print_health(session)
}

fn run_interactive(session: &Arc<MonitoringSession>, interval: Duration) -> Result<(), String> {
    let mut scheduler = start_ticking(session, interval)?;
    logging::info(
        Component::System,
        None,
        "Commands: refresh, health, alerts, stale, snapshot, quit",
    );

    for line in io::stdin().lock().lines() {
        let line = line.map_err(|e| e.to_string())?;
        match line.trim() {
            "" => {}
            "refresh" => {
                let summary = session.refresh(Utc::now());
                println!(
                    "tick {}: {} alert(s), {} cleared",
                    summary.tick,
                    summary.emitted.len(),
                    summary.cleared.len()
                );
            }
            "health" => print_health(session)?,
            "alerts" => {
                let alerts = session.alert_state();
                println!("{}", serde_json::to_string_pretty(&alerts).map_err(|e| e.to_string())?);
            }
            "stale" => println!("{:?}", session.stale_sensors(Utc::now())),
            "snapshot" => println!("{}", session.snapshot_json().map_err(|e| e.to_string())?),
            "quit" | "exit" => {
                scheduler.stop();
                return Ok(());
            }
            other => println!("unknown command '{}'", other),
        }
    }

    // Detached stdin: keep ticking until the process is killed.
    loop {
        thread::park();
    }
}

fn print_health(session: &MonitoringSession) -> Result<(), String> {
    let health = session.health();
    println!("{}", serde_json::to_string_pretty(&health).map_err(|e| e.to_string())?);
    Ok(())
}
