//! Command-line driver: explores an external target program.
//!
//! **Usage**:
//! ```bash
//! dse -f config.properties
//! dse -f config.properties -D dse.explore=bfs -D random.seed=42
//! dse -D dse.executor=./target.sh --log-level debug
//! ```

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{eyre, WrapErr};

use dse::config::{parse_properties, Config};
use dse::dse::{Context, Dse};
use dse::executor::ProcessExecutor;

#[derive(Debug, Parser)]
#[command(name = "dse")]
#[command(about = "Dynamic symbolic execution of an external target program", long_about = None)]
struct Cli {
    /// Properties file with the run configuration
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    file: Option<PathBuf>,

    /// Override a property: -D key=value
    #[arg(short = 'D', value_name = "KEY=VALUE")]
    defines: Vec<String>,

    /// Logging verbosity
    #[arg(long, default_value = "info")]
    log_level: simplelog::LevelFilter,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    simplelog::TermLogger::init(
        args.log_level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let mut properties = match &args.file {
        Some(path) => {
            let text = fs::read_to_string(path)
                .wrap_err_with(|| format!("Could not read properties file {}", path.display()))?;
            parse_properties(&text)
        }
        None => Default::default(),
    };
    for define in &args.defines {
        let (key, value) = define
            .split_once('=')
            .ok_or_else(|| eyre!("Expected -D key=value, got {:?}", define))?;
        properties.insert(key.trim().to_string(), value.trim().to_string());
    }

    let config = Config::from_map(&properties)?;
    let executor = ProcessExecutor::from_config(&config)?;
    let dot = config.dot.clone();

    let ctx = Context::new(config);

    let mut dse = Dse::from_context(&ctx, executor)?;
    let analysis = dse.run()?;

    if let Some(path) = dot {
        let text = dse.explorer().tree().to_dot()?;
        fs::write(&path, text).wrap_err_with(|| format!("Could not write {}", path.display()))?;
    }

    println!("{}", analysis);
    println!("[END OF OUTPUT]");
    Ok(())
}
