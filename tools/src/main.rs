//! desk-runner: headless runner for the complaint desk.
//!
//! Usage:
//!   desk-runner --db desk.db --demo --seed 7
//!   desk-runner --db desk.db --user tenant-nbc-admin
//!   desk-runner --db desk.db --history NBC-2025-00012
//!   desk-runner --db desk.db --line-mode < requests.jsonl

use anyhow::{Context, Result};
use complaintdesk_core::{
    clock::{Clock, FixedClock, SystemClock},
    config::DeskConfig,
    demo::{seed_demo, DemoPlan},
    history::HistoryRecorder,
    notify::Notifier,
    stats::StatisticsService,
    store::DeskStore,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Request {
    Dashboard {
        user_id: String,
        #[serde(default)]
        tenant_id: Option<String>,
    },
    History {
        target: String,
    },
    Notifications {
        user_id: String,
    },
    Quit,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let data_dir = flag_value(&args, "--data-dir").unwrap_or("./data");
    let seed = parse_arg(&args, "--seed", 42u64);
    let per_tenant = parse_arg(&args, "--complaints", DemoPlan::default().complaints_per_tenant);
    let demo = args.iter().any(|a| a == "--demo");
    let line_mode = args.iter().any(|a| a == "--line-mode");

    let config = DeskConfig::load_or_default(data_dir)?;
    let store = DeskStore::open(db).with_context(|| format!("opening {db}"))?;
    store.migrate()?;

    // One instant for the whole run, so a seeded desk and the dashboards
    // computed over it agree on "now".
    let clock = FixedClock::new(SystemClock.now());

    if demo {
        let plan = DemoPlan {
            seed,
            complaints_per_tenant: per_tenant,
            ..DemoPlan::default()
        };
        let summary = seed_demo(&store, &clock, &config, &plan)?;
        if !line_mode {
            println!("=== DEMO SEEDED ===");
            println!("  db:          {db}");
            println!("  seed:        {seed}");
            println!("  tenants:     {}", summary.tenants);
            println!("  users:       {}", summary.users);
            println!("  complaints:  {}", summary.complaints);
            println!("  assigned:    {}", summary.assigned);
            println!("  resolved:    {}", summary.resolved);
            println!("  comments:    {}", summary.comments);
            println!();
        }
    }

    if line_mode {
        return run_line_loop(&store, &clock, &config);
    }
    if let Some(user_id) = flag_value(&args, "--user") {
        let tenant = flag_value(&args, "--tenant");
        println!("{}", dashboard_json(&store, &clock, &config, user_id, tenant)?);
    }
    if let Some(target) = flag_value(&args, "--history") {
        println!("{}", history_json(&store, target)?);
    }
    Ok(())
}

/// One JSON request per stdin line, one JSON response per stdout line.
fn run_line_loop(store: &DeskStore, clock: &dyn Clock, config: &DeskConfig) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Request>(&line) {
            Ok(Request::Quit) => break,
            Ok(request) => handle_request(store, clock, config, request)
                .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string()),
            Err(e) => serde_json::json!({ "error": e.to_string() }).to_string(),
        };
        writeln!(stdout, "{response}")?;
        stdout.flush()?;
    }
    Ok(())
}

fn handle_request(store: &DeskStore, clock: &dyn Clock, config: &DeskConfig, request: Request) -> Result<String> {
    match request {
        Request::Dashboard { user_id, tenant_id } => {
            dashboard_json(store, clock, config, &user_id, tenant_id.as_deref())
        }
        Request::History { target } => history_json(store, &target),
        Request::Notifications { user_id } => {
            let unread = Notifier::new(store, clock).unread(&user_id)?;
            Ok(serde_json::to_string(&unread)?)
        }
        Request::Quit => Ok(String::new()),
    }
}

fn dashboard_json(
    store: &DeskStore,
    clock: &dyn Clock,
    config: &DeskConfig,
    user_id: &str,
    tenant_id: Option<&str>,
) -> Result<String> {
    let user = store.get_user(user_id)?;
    let dashboard = StatisticsService::new(store, clock, config).dashboard_in(&user, tenant_id)?;
    Ok(serde_json::to_string_pretty(&dashboard)?)
}

/// History by complaint id, falling back to the reference (which also
/// covers deleted complaints).
fn history_json(store: &DeskStore, target: &str) -> Result<String> {
    let recorder = HistoryRecorder::new(store);
    let mut entries = recorder.for_complaint(target)?;
    if entries.is_empty() {
        entries = recorder.for_reference(target)?;
    }
    if entries.is_empty() {
        log::warn!("no history found for {target}");
    }
    Ok(serde_json::to_string_pretty(&entries)?)
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
