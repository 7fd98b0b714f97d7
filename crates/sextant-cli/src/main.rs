mod config;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use sextant_core::{FavouritesStore, Units};
use sextant_math::{Dispatcher, ExtractedParameters, MathOperation};
use sextant_store::JsonFavouritesStore;
use sextant_weather::WeatherClient;

use config::{Config, LogConfig};

#[derive(Parser)]
#[command(
    name = "sextant",
    version,
    about = "Natural-language math commands and weather lookups"
)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the favourite cities JSON file
    #[arg(long, global = true)]
    favourites: Option<PathBuf>,

    /// More stderr logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a math command written in plain words
    ///
    /// Flags go before the words: everything from the first word on is read
    /// as the command, so `-x**2` and `-1` stay part of it.
    Math {
        /// The command, e.g. "solve x**2 - 4" or "convert 10 meters to feet"
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true, trailing_var_arg = true)]
        words: Vec<String>,

        /// Operation to run instead of guessing from keywords
        #[arg(long)]
        op: Option<CliOperation>,
    },

    /// Show what would be extracted from a command (flags go before the words)
    Parse {
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true, trailing_var_arg = true)]
        words: Vec<String>,
    },

    /// Weather lookups
    Weather {
        #[command(subcommand)]
        command: WeatherCommands,
    },

    /// Favourite cities
    Favourites {
        #[command(subcommand)]
        command: FavouritesCommands,
    },

    /// Show active configuration
    Config,
}

#[derive(Subcommand)]
enum WeatherCommands {
    /// Current temperature and conditions
    Current {
        #[arg(required = true, num_args = 1..)]
        city: Vec<String>,

        /// Temperature units (default from config)
        #[arg(short, long)]
        units: Option<CliUnits>,
    },

    /// One reading per day for the next five days
    Forecast {
        #[arg(required = true, num_args = 1..)]
        city: Vec<String>,
    },

    /// Active weather alerts at a location
    Alerts {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
}

#[derive(Subcommand)]
enum FavouritesCommands {
    /// Save a city (ignored if already saved)
    Add {
        #[arg(required = true, num_args = 1..)]
        city: Vec<String>,
    },

    /// List saved cities
    List,
}

#[derive(Clone, ValueEnum)]
enum CliOperation {
    Arithmetic,
    Solve,
    Trig,
    Differentiate,
    Integrate,
    Factorial,
    Fibonacci,
    Matrix,
    Complex,
    Stats,
    Convert,
    Plot,
}

impl From<CliOperation> for MathOperation {
    fn from(val: CliOperation) -> Self {
        match val {
            CliOperation::Arithmetic => MathOperation::Arithmetic,
            CliOperation::Solve => MathOperation::Solve,
            CliOperation::Trig => MathOperation::Trigonometry,
            CliOperation::Differentiate => MathOperation::Differentiate,
            CliOperation::Integrate => MathOperation::Integrate,
            CliOperation::Factorial => MathOperation::Factorial,
            CliOperation::Fibonacci => MathOperation::Fibonacci,
            CliOperation::Matrix => MathOperation::Matrix,
            CliOperation::Complex => MathOperation::Complex,
            CliOperation::Stats => MathOperation::Statistics,
            CliOperation::Convert => MathOperation::Convert,
            CliOperation::Plot => MathOperation::Plot,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum CliUnits {
    Metric,
    Imperial,
    Kelvin,
}

impl From<CliUnits> for Units {
    fn from(val: CliUnits) -> Self {
        match val {
            CliUnits::Metric => Units::Metric,
            CliUnits::Imperial => Units::Imperial,
            CliUnits::Kelvin => Units::Kelvin,
        }
    }
}

fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("dev", "sextant", "sextant")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// `--flag`, then the config value, then `name` under the data dir.
fn resolve_path(flag: Option<PathBuf>, configured: Option<&str>, name: &str) -> PathBuf {
    flag.or_else(|| configured.map(PathBuf::from))
        .unwrap_or_else(|| data_dir().join(name))
}

/// Stderr logging filtered by `-v`/`RUST_LOG`, plus timestamped plain-text
/// lines in the log file. The returned guard flushes the file on drop.
fn init_logging(cfg: &LogConfig, verbose: u8) -> Option<WorkerGuard> {
    let stderr_filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(stderr_filter);

    let log_path = resolve_path(None, cfg.path.as_deref(), "weather_info.log");
    let file_filter = EnvFilter::try_new(&cfg.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let (file_layer, guard, file_error) = match open_log_file(&log_path) {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(file_filter);
            (Some(layer), Some(guard), None)
        }
        Err(e) => (None, None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    if let Some(e) = file_error {
        tracing::warn!("file logging disabled: {e:#}");
    }
    guard
}

fn open_log_file(path: &Path) -> Result<RollingFileAppender> {
    let dir = path.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let name = path
        .file_name()
        .ok_or_else(|| anyhow!("log path {} has no file name", path.display()))?;
    std::fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name.to_string_lossy())
        .build(dir)
        .with_context(|| format!("cannot open {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(cli.config.as_deref())?;
    let _log_guard = init_logging(&cfg.log, cli.verbose);

    match cli.command {
        Commands::Math { words, op } => {
            let plot_dir = resolve_path(None, cfg.plot.output_dir.as_deref(), "plots");
            cmd_math(&words.join(" "), op.map(Into::into), plot_dir)
        }
        Commands::Parse { words } => cmd_parse(&words.join(" ")),
        Commands::Weather { command } => {
            let env_key = std::env::var(config::API_KEY_ENV).ok();
            let client = WeatherClient::new(cfg.weather.client_config(env_key));
            match command {
                WeatherCommands::Current { city, units } => {
                    let units = units.map(Into::into).unwrap_or(cfg.weather.units);
                    cmd_weather_current(&client, &city.join(" "), units)
                }
                WeatherCommands::Forecast { city } => cmd_weather_forecast(&client, &city.join(" ")),
                WeatherCommands::Alerts { lat, lon } => cmd_weather_alerts(&client, lat, lon),
            }
        }
        Commands::Favourites { command } => {
            let path = resolve_path(
                cli.favourites,
                cfg.favourites.path.as_deref(),
                "favourite_cities.json",
            );
            let store = JsonFavouritesStore::new(path);
            match command {
                FavouritesCommands::Add { city } => cmd_favourites_add(&store, &city.join(" ")),
                FavouritesCommands::List => cmd_favourites_list(&store),
            }
        }
        Commands::Config => cmd_config(&cfg, cli.config.as_deref()),
    }
}

fn cmd_math(command: &str, op: Option<MathOperation>, plot_dir: PathBuf) -> Result<()> {
    let op = op.or_else(|| MathOperation::infer(command)).ok_or_else(|| {
        anyhow!("could not tell which operation \"{command}\" asks for; pass --op")
    })?;
    let output = Dispatcher::new(plot_dir).dispatch(op, command)?;
    println!("{output}");
    Ok(())
}

fn cmd_parse(command: &str) -> Result<()> {
    println!("{}", ExtractedParameters::from_command(command));
    match MathOperation::infer(command) {
        Some(op) => println!("dispatch:       {op}"),
        None => println!("dispatch:       - (pass --op to `sextant math`)"),
    }
    Ok(())
}

fn cmd_weather_current(client: &WeatherClient, city: &str, units: Units) -> Result<()> {
    let weather = client.get_weather(city, units)?;
    println!("{weather}");
    Ok(())
}

fn cmd_weather_forecast(client: &WeatherClient, city: &str) -> Result<()> {
    let days = client.get_weather_forecast(city)?;
    if days.is_empty() {
        println!("No forecast data for {city}.");
        return Ok(());
    }
    for day in &days {
        println!("{day}");
    }
    Ok(())
}

fn cmd_weather_alerts(client: &WeatherClient, lat: f64, lon: f64) -> Result<()> {
    let alerts = client.get_weather_alerts(lat, lon)?;
    println!("{alerts}");
    Ok(())
}

fn cmd_favourites_add(store: &dyn FavouritesStore, city: &str) -> Result<()> {
    let outcome = store.save(city).context("failed to save favourite city")?;
    println!("{outcome}");
    Ok(())
}

fn cmd_favourites_list(store: &dyn FavouritesStore) -> Result<()> {
    let cities = store.list().context("failed to read favourite cities")?;
    println!("{cities}");
    Ok(())
}

fn cmd_config(cfg: &Config, explicit: Option<&Path>) -> Result<()> {
    println!("Config: {}", config::show_config_path(explicit));
    println!();
    println!("[weather]");
    println!(
        "  api_key = {}",
        if cfg.weather.api_key.is_some() { "(set)" } else { "(unset)" }
    );
    println!("  base_url = {}", cfg.weather.base_url);
    println!("  forecast_url = {}", cfg.weather.forecast_url);
    println!("  one_call_url = {}", cfg.weather.one_call_url);
    println!("  units = {}", cfg.weather.units);
    println!("  timeout_secs = {}", cfg.weather.timeout_secs);
    println!("  retries = {}", cfg.weather.retries);
    println!("  retry_delay_ms = {}", cfg.weather.retry_delay_ms);
    println!();
    println!("[favourites]");
    println!(
        "  path = {}",
        cfg.favourites
            .path
            .as_deref()
            .unwrap_or("(default platform path)")
    );
    println!();
    println!("[log]");
    println!(
        "  path = {}",
        cfg.log.path.as_deref().unwrap_or("(default platform path)")
    );
    println!("  level = {}", cfg.log.level);
    println!();
    println!("[plot]");
    println!(
        "  output_dir = {}",
        cfg.plot
            .output_dir
            .as_deref()
            .unwrap_or("(default platform path)")
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_math_words_keep_negative_numbers() {
        let cli = Cli::try_parse_from(["sextant", "math", "factorial", "of", "-1"]).unwrap();
        let Commands::Math { words, op } = cli.command else {
            panic!("expected math command");
        };
        assert_eq!(words.join(" "), "factorial of -1");
        assert!(op.is_none());
    }

    #[test]
    fn test_math_flags_go_before_the_words() {
        let cli =
            Cli::try_parse_from(["sextant", "-v", "math", "--op", "arithmetic", "add", "2", "and", "3"])
                .unwrap();
        assert_eq!(cli.verbose, 1);
        let Commands::Math { words, op } = cli.command else {
            panic!("expected math command");
        };
        assert_eq!(words.join(" "), "add 2 and 3");
        assert!(matches!(op.map(MathOperation::from), Some(MathOperation::Arithmetic)));

        // after the first word, flags are part of the command text
        let cli = Cli::try_parse_from(["sextant", "math", "solve", "-x**2", "+", "4", "--op", "solve"])
            .unwrap();
        let Commands::Math { words, op } = cli.command else {
            panic!("expected math command");
        };
        assert_eq!(words.join(" "), "solve -x**2 + 4 --op solve");
        assert!(op.is_none());
    }

    #[test]
    fn test_multi_word_city_and_units() {
        let cli =
            Cli::try_parse_from(["sextant", "weather", "current", "New", "York", "--units", "kelvin"])
                .unwrap();
        let Commands::Weather {
            command: WeatherCommands::Current { city, units },
        } = cli.command
        else {
            panic!("expected weather current");
        };
        assert_eq!(city.join(" "), "New York");
        assert!(matches!(units.map(Units::from), Some(Units::Kelvin)));
    }

    #[test]
    fn test_resolve_path_precedence() {
        let flag = Some(PathBuf::from("/flag.json"));
        assert_eq!(
            resolve_path(flag, Some("/cfg.json"), "favourite_cities.json"),
            PathBuf::from("/flag.json")
        );
        assert_eq!(
            resolve_path(None, Some("/cfg.json"), "favourite_cities.json"),
            PathBuf::from("/cfg.json")
        );
        assert!(resolve_path(None, None, "favourite_cities.json").ends_with("favourite_cities.json"));
    }

    #[test]
    fn test_favourites_commands_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFavouritesStore::new(dir.path().join("favs.json"));
        cmd_favourites_add(&store, "Paris").unwrap();
        cmd_favourites_add(&store, "Paris").unwrap();
        assert_eq!(store.list().unwrap().cities(), ["Paris".to_string()]);
    }
}
