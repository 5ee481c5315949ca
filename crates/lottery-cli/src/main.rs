use clap::{Parser, Subcommand};
use colored::Colorize;
use lottery_core::{
    executor::RequestResult, parse_requests, Config, Error, Executor, InMemoryLedger,
    ScenarioReport,
};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::{fmt, EnvFilter};

/// Exit codes: 0 = success, 1 = a scenario step failed, 2 = error
const EXIT_OK: i32 = 0;
const EXIT_FAILED: i32 = 1;
const EXIT_ERROR: i32 = 2;

const STARTER_SCENARIO: &str = r#"[
  { "action": "enter", "from": 1, "value": "0.02 ether" },
  { "action": "enter", "from": 2, "value": "0.02 ether" },
  { "action": "enter", "from": 3, "value": "0.02 ether" },
  { "action": "getPlayers" },
  { "action": "pickWinner", "from": 0 },
  { "action": "getPlayers" }
]
"#;

/// Lottery — run lottery contract scenarios on a local in-memory chain
#[derive(Parser)]
#[command(name = "lottery", version, about, long_about = None)]
struct Cli {
    /// Suppress all stdout output
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a fresh lottery and run a scenario file against it
    Run {
        /// Path to scenario .json file
        file: PathBuf,
        /// Output the full report as JSON
        #[arg(long)]
        json: bool,
        /// Path to a TOML config file
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
        /// Seed for winner selection (overrides the config)
        #[arg(long, value_name = "N")]
        seed: Option<u64>,
    },

    /// List the simulator accounts and their balances
    Accounts {
        /// Path to a TOML config file
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Scaffold a starter scenario file
    Init {
        /// Scenario name (file is written as <name>.json)
        name: Option<String>,
    },

    /// Show version information
    Version,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let quiet = cli.quiet;

    let exit_code = match cli.command {
        Commands::Run {
            file,
            json,
            config,
            seed,
        } => cmd_run(&file, json, config.as_deref(), seed, quiet),
        Commands::Accounts { config, json } => cmd_accounts(config.as_deref(), json, quiet),
        Commands::Init { name } => cmd_init(name.as_deref().unwrap_or("scenario"), quiet),
        Commands::Version => {
            if !quiet {
                println!(
                    "lottery {} (lottery-core {})",
                    env!("CARGO_PKG_VERSION"),
                    env!("CARGO_PKG_VERSION")
                );
            }
            EXIT_OK
        }
    };

    process::exit(exit_code);
}

/// Logs go to stderr so JSON on stdout stays parseable
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn report_error(err: &Error) -> i32 {
    eprintln!("{} {}", "error:".red().bold(), err);
    EXIT_ERROR
}

fn load_config(path: Option<&Path>) -> Result<Config, Error> {
    match path {
        Some(p) => Config::load(p),
        None => Ok(Config::default()),
    }
}

// ── Commands ──────────────────────────────────────────────

fn cmd_run(file: &Path, json: bool, config: Option<&Path>, seed: Option<u64>, quiet: bool) -> i32 {
    let source = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!(
                "{} cannot read {}: {}",
                "error:".red().bold(),
                file.display(),
                e
            );
            return EXIT_ERROR;
        }
    };

    let mut config = match load_config(config) {
        Ok(c) => c,
        Err(e) => return report_error(&e),
    };
    if let Some(seed) = seed {
        config = config.with_rng_seed(seed);
    }

    let requests = match parse_requests(&source) {
        Ok(r) => r,
        Err(e) => return report_error(&e),
    };
    let executor = match Executor::deploy(&config) {
        Ok(x) => x,
        Err(e) => return report_error(&e),
    };
    let report = executor.run(&requests);

    if !quiet {
        if json {
            match serde_json::to_string_pretty(&report) {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    eprintln!("{} {}", "error:".red().bold(), e);
                    return EXIT_ERROR;
                }
            }
        } else {
            print_report(&report);
        }
    }

    if let Some(err) = &report.error {
        if !json {
            eprintln!("{} {}", "error:".red().bold(), err);
        }
        EXIT_FAILED
    } else {
        EXIT_OK
    }
}

fn cmd_accounts(config: Option<&Path>, json: bool, quiet: bool) -> i32 {
    let config = match load_config(config) {
        Ok(c) => c,
        Err(e) => return report_error(&e),
    };
    let ledger = InMemoryLedger::new(&config.ledger);
    if quiet {
        return EXIT_OK;
    }

    if json {
        let accounts: Vec<serde_json::Value> = ledger
            .accounts()
            .iter()
            .enumerate()
            .map(|(i, a)| {
                serde_json::json!({
                    "index": i,
                    "address": a.to_string(),
                    "balance": ledger.balance_of(a).to_string(),
                })
            })
            .collect();
        println!("{}", serde_json::Value::Array(accounts));
    } else {
        for (i, account) in ledger.accounts().iter().enumerate() {
            let role = if i == config.ledger.deployer {
                " (manager)".cyan().to_string()
            } else {
                String::new()
            };
            println!("[{}] {}  {}{}", i, account, ledger.balance_of(account), role);
        }
    }
    EXIT_OK
}

fn cmd_init(name: &str, quiet: bool) -> i32 {
    let path = PathBuf::from(format!("{}.json", name));
    if path.exists() {
        eprintln!(
            "{} {} already exists",
            "error:".red().bold(),
            path.display()
        );
        return EXIT_ERROR;
    }
    if let Err(e) = std::fs::write(&path, STARTER_SCENARIO) {
        eprintln!(
            "{} cannot write {}: {}",
            "error:".red().bold(),
            path.display(),
            e
        );
        return EXIT_ERROR;
    }
    if !quiet {
        println!("{} {}", "Created".green().bold(), path.display());
    }
    EXIT_OK
}

// ── Output ────────────────────────────────────────────────

fn print_report(report: &ScenarioReport) {
    println!("{} {}", "Contract".bold(), report.contract);
    println!("{}  {}", "Manager".bold(), report.manager);
    println!();

    for result in &report.results {
        println!("{}", describe(result));
    }

    println!();
    println!("Players: {}", report.players.len());
    for player in &report.players {
        println!("  {}", player);
    }
    println!("Contract balance: {}", report.contract_balance);

    if report.success {
        println!("{}", "✓ scenario completed".green().bold());
    } else {
        println!("{}", "✗ scenario stopped at a failed step".red().bold());
    }
}

fn describe(result: &RequestResult) -> String {
    let marker = if result.success {
        "✓".green()
    } else {
        "✗".red()
    };
    let mut line = format!("{} {}", marker, result.action);
    if let Some(from) = &result.from {
        line.push_str(&format!(" from {}", from));
    }
    if let Some(players) = &result.players {
        line.push_str(&format!(" → {} player(s)", players.len()));
    }
    if let Some(manager) = &result.manager {
        line.push_str(&format!(" → {}", manager));
    }
    if let (Some(winner), Some(prize)) = (&result.winner, &result.prize) {
        line.push_str(&format!(" → {} won {}", winner, prize));
    }
    if let Some(kind) = &result.error_kind {
        line.push_str(&format!(" ({})", kind.yellow()));
    }
    line
}
