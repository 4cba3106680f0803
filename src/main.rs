use shadow_monarch::build_info;
use shadow_monarch::core::{
    now_ms, GameConfig, GameContext, GameError, GameResult, PersistenceError,
};
use shadow_monarch::persistence::SaveExport;
use shadow_monarch::simulator::{run_simulation, SimConfig};
use shadow_monarch::army::MissionType;
use shadow_monarch::character::StatType;
use shadow_monarch::items::Difficulty;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("status");

    let result = match command {
        "status" => run_status(&args[2.min(args.len())..]),
        "simulate" => run_simulate(&args[2.min(args.len())..]),
        "export" => run_export(args.get(2)),
        "import" => run_import(args.get(2)),
        "--version" | "-v" => {
            println!("{}", build_info::version_string());
            Ok(())
        }
        "--help" | "-h" | "help" => {
            print_help();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}\n", other);
            print_help();
            std::process::exit(2);
        }
    };

    if let Err(e) = result {
        tracing::error!(error = %e, kind = ?e.kind(), "command failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn open_game(now: i64) -> GameResult<GameContext> {
    let ctx = GameContext::builder()
        .config(GameConfig::load())
        .file_storage()?
        .build(now)?;
    for warning in ctx.load_warnings() {
        let recovery = if warning.restored_backup {
            "restored from backup"
        } else {
            "started fresh"
        };
        eprintln!("Warning: {} save unreadable ({}), {}", warning.key, warning.error, recovery);
        if let Some(path) = &warning.preserved_as {
            eprintln!("  Original kept at {}", path);
        }
    }
    Ok(ctx)
}

fn require_path(path: Option<&String>) -> GameResult<&String> {
    path.ok_or_else(|| GameError::InvalidState("expected a file path".to_string()))
}

fn run_export(path: Option<&String>) -> GameResult<()> {
    let path = require_path(path)?;
    let now = now_ms();
    let json = open_game(now)?.export_save(now)?.to_json()?;
    std::fs::write(path, json).map_err(PersistenceError::from)?;
    println!("Save exported to: {}", path);
    Ok(())
}

fn run_import(path: Option<&String>) -> GameResult<()> {
    let path = require_path(path)?;
    let json = std::fs::read_to_string(path).map_err(PersistenceError::from)?;
    let export = SaveExport::from_json(&json)?;
    let now = now_ms();
    let mut ctx = open_game(now)?;
    ctx.import_save(&export, now)?;
    ctx.save_all(now)?;
    println!("Save imported from: {}", path);
    Ok(())
}

fn run_status(args: &[String]) -> GameResult<()> {
    let now = now_ms();
    let ctx = open_game(now)?;
    let snapshot = ctx.snapshot();

    if args.iter().any(|a| a == "--json") {
        println!(
            "{}",
            serde_json::to_string_pretty(&snapshot).unwrap_or_else(|_| "{}".to_string())
        );
        return Ok(());
    }

    let p = &snapshot.progression;
    println!("Rank {}  Level {}  ({}/{} exp)", p.rank, p.level, p.exp, p.exp_to_next);
    let stats: Vec<String> = StatType::all()
        .iter()
        .map(|stat| format!("{} {}", stat.abbrev(), p.effective_stats.get(*stat)))
        .collect();
    println!("{}  ({} points free)", stats.join("  "), p.available_points);

    let a = &snapshot.army;
    println!(
        "Army {}/{} ({} active)  Formation {}  Power {:.0}",
        a.soldier_count,
        a.max_capacity,
        a.active_count,
        a.formation.name(),
        a.power
    );
    for mission in &a.missions {
        let minutes = (mission.end_time - now).max(0) / 60_000;
        println!(
            "  Mission #{} {} with {} soldiers, {} min left",
            mission.id,
            mission.mission_type.name(),
            mission.soldier_ids.len(),
            minutes
        );
    }

    let inv = &snapshot.inventory;
    println!(
        "Gold {}  Bag {}/{}  Overflow {}",
        inv.gold,
        inv.stacks.len(),
        inv.capacity,
        inv.overflow
    );

    let q = &snapshot.quests;
    println!(
        "Quests: {} active, {} completed, {} dailies offered",
        q.active.len(),
        q.completed,
        q.daily.len()
    );
    for quest in &q.active {
        let progress: Vec<String> = quest
            .objectives
            .iter()
            .map(|o| format!("{} {}/{}", o.kind.name(), o.current, o.required))
            .collect();
        println!("  {} [{}]", quest.title, progress.join(", "));
    }
    Ok(())
}

fn run_simulate(args: &[String]) -> GameResult<()> {
    let (config, json) = parse_sim_args(args);

    println!("Configuration:");
    println!("  Runs:       {}", config.num_runs);
    println!("  Hours:      {}", config.hours);
    println!("  Kills/min:  {}", config.kills_per_minute);
    println!("  Difficulty: {}", config.difficulty.name());
    if config.send_missions {
        println!("  Missions:   {}", config.mission_type.name());
    }
    if let Some(seed) = config.seed {
        println!("  Seed:       {}", seed);
    }
    println!();

    let report = run_simulation(&config)?;
    println!("{}", report.to_text());

    if json {
        let filename = format!(
            "sim_report_{}.json",
            chrono::Utc::now().format("%Y%m%d_%H%M%S")
        );
        match std::fs::write(&filename, report.to_json()) {
            Ok(()) => println!("JSON report saved to: {}", filename),
            Err(e) => eprintln!("Failed to write {}: {}", filename, e),
        }
    }
    Ok(())
}

fn parse_sim_args(args: &[String]) -> (SimConfig, bool) {
    let mut config = SimConfig::default();
    let mut json = false;

    let mut i = 0;
    while i < args.len() {
        let value = args.get(i + 1);
        match args[i].as_str() {
            "-n" | "--runs" => {
                if let Some(v) = value {
                    config.num_runs = v.parse().unwrap_or(config.num_runs);
                    i += 1;
                }
            }
            "-s" | "--seed" => {
                if let Some(v) = value {
                    config.seed = v.parse().ok();
                    i += 1;
                }
            }
            "-H" | "--hours" => {
                if let Some(v) = value {
                    config.hours = v.parse().unwrap_or(config.hours);
                    i += 1;
                }
            }
            "-k" | "--kills" => {
                if let Some(v) = value {
                    config.kills_per_minute = v.parse().unwrap_or(config.kills_per_minute);
                    i += 1;
                }
            }
            "-d" | "--difficulty" => {
                if let Some(v) = value {
                    config.difficulty = Difficulty::from_name(v);
                    i += 1;
                }
            }
            "-m" | "--missions" => {
                if let Some(v) = value {
                    config.mission_type = MissionType::from_name(v);
                    i += 1;
                }
            }
            "--no-missions" => config.send_missions = false,
            "--quick" => config = SimConfig::quick(),
            "--long" => config = SimConfig::long_session(),
            "-v" | "--verbose" => config.verbosity = 2,
            "--json" => json = true,
            _ => {}
        }
        i += 1;
    }

    (config, json)
}

fn print_help() {
    println!("Shadow Monarch - progression and shadow army core\n");
    println!("USAGE:");
    println!("    shadow-monarch [COMMAND] [OPTIONS]\n");
    println!("COMMANDS:");
    println!("    status [--json]     Load the save, settle due timers, print a summary (default)");
    println!("    simulate [OPTIONS]  Run headless balance sessions");
    println!("    export <FILE>       Write the whole save to one JSON file");
    println!("    import <FILE>       Replace the save with an exported one");
    println!("    -v, --version       Show version information");
    println!("    -h, --help          Show this help\n");
    println!("SIMULATE OPTIONS:");
    println!("    -n, --runs <N>          Number of sessions (default: 100)");
    println!("    -s, --seed <S>          Random seed for reproducibility");
    println!("    -H, --hours <H>         Session length in hours (default: 8)");
    println!("    -k, --kills <K>         Enemies defeated per minute (default: 2)");
    println!("    -d, --difficulty <D>    normal, hard, hell or real");
    println!("    -m, --missions <M>      short, medium, long or overnight");
    println!("    --no-missions           Keep soldiers at home");
    println!("    --quick                 20 two-hour sessions");
    println!("    --long                  20 day-long sessions");
    println!("    -v, --verbose           Print every run");
    println!("    --json                  Save a JSON report\n");
    println!("ENVIRONMENT:");
    println!("    RUST_LOG                Log filter, e.g. RUST_LOG=shadow_monarch=debug");
}
