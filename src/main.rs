//! Tabula - a spreadsheet compute engine driven by line-oriented scripts

mod command;
mod config;
mod error;

use anyhow::{Context, Result};
use std::env;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use command::Session;
use config::Config;

fn print_usage() {
    eprintln!("Usage: tabula [OPTIONS] [SCRIPT]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [SCRIPT]                  Script file to run (default: stdin)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --command <CMD>       Run a command and exit (can be repeated)");
    eprintln!("  --config <FILE>           Load configuration from FILE");
    eprintln!("  --no-config               Do not load any configuration file");
    eprintln!("  -h, --help                Print help");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  set <A1> [text]           Set cell text (=formula, 'literal)");
    eprintln!("  clear <A1>                Clear a cell");
    eprintln!("  get <A1>                  Print text and value");
    eprintln!("  value <A1> | text <A1>    Print value or text");
    eprintln!("  refs <A1>                 Print the cells a formula reads");
    eprintln!("  size                      Print printable rows and columns");
    eprintln!("  print [values|texts]      Print the sheet as tab-separated rows");
}

fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .try_init()
        .ok();
}

/// Run every line from `input`. Returns whether all commands succeeded.
fn run_script<R: BufRead>(session: &mut Session, input: R, config: &Config) -> Result<bool> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut ok = true;

    for (index, line) in input.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", index + 1))?;
        let line = line.strip_suffix('\r').unwrap_or(&line);
        if let Err(e) = session.run_line(line, &mut out) {
            tracing::debug!(line = index + 1, error = %e, "command failed");
            eprintln!("Error: {}", e);
            ok = false;
            if config.output.stop_on_error {
                break;
            }
        }
    }

    out.flush()?;
    Ok(ok)
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut script_path: Option<PathBuf> = None;
    let mut commands: Vec<String> = Vec::new();
    let mut config_file: Option<PathBuf> = None;
    let mut no_config = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "-c" | "--command" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --command requires a command");
                    std::process::exit(1);
                }
                commands.push(args[i].to_string());
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a file path");
                    std::process::exit(1);
                }
                config_file = Some(PathBuf::from(&args[i]));
            }
            "--no-config" => no_config = true,
            arg if arg.starts_with('-') && arg != "-" => {
                eprintln!("Error: Unknown option: {}", arg);
                print_usage();
                std::process::exit(1);
            }
            _ => {
                if script_path.is_none() {
                    script_path = Some(PathBuf::from(&args[i]));
                } else {
                    eprintln!("Error: Unexpected argument: {}", args[i]);
                    print_usage();
                    std::process::exit(1);
                }
            }
        }
        i += 1;
    }

    let (config, warnings) = config::load_config(config_file.as_deref(), no_config);
    init_logging(&config.log_level);
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }

    let mut session = Session::new(config.output.print);
    let result = if !commands.is_empty() {
        if script_path.is_some() {
            eprintln!("Error: --command cannot be combined with a script file");
            std::process::exit(1);
        }
        run_script(&mut session, io::Cursor::new(commands.join("\n")), &config)
    } else {
        match script_path.filter(|p| p.as_os_str() != "-") {
            Some(path) => std::fs::File::open(&path)
                .with_context(|| format!("cannot open {}", path.display()))
                .and_then(|file| run_script(&mut session, BufReader::new(file), &config)),
            None => run_script(&mut session, io::stdin().lock(), &config),
        }
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
