mod runtime;

use std::fs::File;
use std::path::PathBuf;

use chordy_core::config::Config;
use chordy_core::midi::{MidiInputManager, MidiOutputManager};

struct Args {
    verbose: bool,
    list_ports: bool,
    config: Option<PathBuf>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args {
        verbose: false,
        list_ports: false,
        config: None,
    };
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--verbose" | "-v" => parsed.verbose = true,
            "--list-ports" => parsed.list_ports = true,
            "--config" => {
                i += 1;
                parsed.config = Some(args.get(i).map(PathBuf::from).unwrap_or_else(|| {
                    eprintln!("--config requires a path");
                    std::process::exit(1);
                }));
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }
    parsed
}

fn print_usage() {
    println!("Usage: chordy [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --config <PATH>   Config file merged over the defaults");
    println!("                    (default: <config dir>/chordy/config.toml)");
    println!("  --list-ports      List MIDI ports and exit");
    println!("  --verbose, -v     Debug logging");
    println!("  --help, -h        Show this help");
    println!();
    println!("While running, Ctrl-C (or q and Enter) releases all notes and exits.");
}

fn init_logging(verbose: bool) {
    use simplelog::*;

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };

    let log_path = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chordy")
        .join("chordy.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        log_level,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];
    match File::create(&log_path).or_else(|_| File::create(std::env::temp_dir().join("chordy.log"))) {
        Ok(file) => loggers.push(WriteLogger::new(log_level, simplelog::Config::default(), file)),
        Err(e) => eprintln!("log file unavailable: {e}"),
    }

    if let Err(e) = CombinedLogger::init(loggers) {
        eprintln!("Failed to initialize logger: {e}");
    }

    log::info!("chordy starting (log level: {:?})", log_level);
}

fn list_ports(config: &Config) {
    let client = config.client_name();
    match MidiInputManager::new(&client).list_ports() {
        Ok(ports) => {
            println!("Inputs:");
            for port in ports {
                println!("  {}: {}", port.index, port.name);
            }
        }
        Err(e) => eprintln!("{e}"),
    }
    match MidiOutputManager::new(&client).list_ports() {
        Ok(ports) => {
            println!("Outputs:");
            for port in ports {
                println!("  {}: {}", port.index, port.name);
            }
        }
        Err(e) => eprintln!("{e}"),
    }
}

fn main() {
    let args = parse_args();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    if args.list_ports {
        list_ports(&config);
        return;
    }

    if let Err(e) = runtime::run(&config) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
