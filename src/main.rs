//! `autoweather` command-line entry point.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;

use autoweather_service::alert::{self, Locale};
use autoweather_service::config::{self, Catalogs, Config};
use autoweather_service::dev_mode::{self, SimulationMode};
use autoweather_service::device::{self, DeviceConfigRequest};
use autoweather_service::events::{self, EventData, EventLog, EventType};
use autoweather_service::ingest::{news_api, snapshot};
use autoweather_service::logging::{self, DataSource};
use autoweather_service::model::{AudienceTarget, WxError};
use autoweather_service::news::NewsCatalog;

#[derive(Parser)]
#[command(name = "autoweather")]
#[command(about = "Weather station dashboard tools: alerts, simulation, device setup, news and event logs")]
struct Cli {
    /// TOML file overriding the station table and component catalog
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify every station in a feed snapshot
    Classify {
        snapshot: PathBuf,
        /// Message language (en or tl)
        #[arg(long, default_value = "en")]
        lang: String,
    },
    /// Print simulated update documents
    Simulate {
        /// Feed snapshot whose stations to simulate; defaults to the station table
        #[arg(long)]
        snapshot: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
        /// Number of cycles; 0 runs until interrupted
        #[arg(long, default_value_t = 1)]
        cycles: usize,
    },
    /// Write the firmware sketch and credentials for a device
    DeviceConfig {
        #[arg(long)]
        station: Option<String>,
        /// Display name override
        #[arg(long)]
        name: Option<String>,
        /// Extra sensor to enable; repeatable. Defaults to the station's set
        #[arg(long = "sensor")]
        sensors: Vec<String>,
        /// Enable no extra sensors
        #[arg(long, conflicts_with = "sensors")]
        no_sensors: bool,
        #[arg(long)]
        rainfall: Option<String>,
        #[arg(long)]
        wind_speed: Option<String>,
        #[arg(long, default_value = "students")]
        audience: String,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Show regional news
    News {
        #[arg(long)]
        region: Option<String>,
        #[arg(long, default_value = "students")]
        audience: String,
        /// Also fetch live articles (needs NEWS_API_KEY)
        #[arg(long)]
        live: bool,
    },
    /// Record a manual event for a station
    LogEvent {
        #[arg(long)]
        station: String,
        /// manual_observation, maintenance, calibration, alert or other
        #[arg(long)]
        kind: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        temperature: Option<f64>,
        #[arg(long)]
        humidity: Option<f64>,
        #[arg(long)]
        rainfall: Option<f64>,
        #[arg(long)]
        wind_speed: Option<f64>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long, default_value = "events.jsonl")]
        file: PathBuf,
    },
    /// List recent events for a station
    Events {
        #[arg(long)]
        station: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long, default_value = "events.jsonl")]
        file: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = config::load_from_env()?;
    logging::init_logger(config.log_level, config.log_file.as_deref(), false);
    config.log_config();

    let catalogs = match &cli.config {
        Some(path) => {
            logging::info(
                DataSource::System,
                None,
                &format!("Loading catalogs from {}", path.display()),
            );
            Catalogs::load(path)?
        }
        None => Catalogs::default(),
    };

    match cli.command {
        Command::Classify { snapshot, lang } => classify(&snapshot, &lang),
        Command::Simulate {
            snapshot,
            seed,
            cycles,
        } => simulate(&catalogs, snapshot.as_deref(), seed, cycles),
        Command::DeviceConfig {
            station,
            name,
            sensors,
            no_sensors,
            rainfall,
            wind_speed,
            audience,
            out_dir,
        } => {
            let selected = if no_sensors {
                Some(Vec::new())
            } else if sensors.is_empty() {
                None
            } else {
                Some(sensors)
            };
            let request = DeviceConfigRequest {
                station_profile_key: station,
                station_name: name,
                selected_sensor_kinds: selected,
                rainfall_component_id: rainfall,
                wind_speed_component_id: wind_speed,
                audience_target: parse_audience(&audience)?,
            };
            write_device_artifact(&catalogs, &config, &request, &out_dir)
        }
        Command::News {
            region,
            audience,
            live,
        } => show_news(&config, region.as_deref(), &audience, live),
        Command::LogEvent {
            station,
            kind,
            description,
            temperature,
            humidity,
            rainfall,
            wind_speed,
            notes,
            file,
        } => {
            let event_type = EventType::from_id(&kind)
                .ok_or_else(|| WxError::Config(format!("Unknown event type: {}", kind)))?;
            let data = EventData {
                description,
                temperature,
                humidity,
                rainfall,
                wind_speed,
                notes,
            };
            log_event(&station, event_type, data, &file)
        }
        Command::Events {
            station,
            limit,
            file,
        } => list_events(&station, limit, &file),
    }
}

fn parse_audience(id: &str) -> Result<AudienceTarget, WxError> {
    AudienceTarget::from_id(id).ok_or_else(|| WxError::Config(format!("Unknown audience: {}", id)))
}

fn read_file(path: &Path, source: DataSource) -> Result<String, WxError> {
    fs::read_to_string(path).map_err(|e| {
        let err = WxError::Io(e.to_string());
        logging::log_io_failure(source, &path.display().to_string(), "Read", &err);
        err
    })
}

fn classify(path: &Path, lang: &str) -> Result<(), Box<dyn Error>> {
    let locale = Locale::from_code(lang)
        .ok_or_else(|| WxError::Config(format!("Unknown language: {}", lang)))?;
    let body = read_file(path, DataSource::Feed)?;
    let readings = snapshot::parse_snapshot(&body)?;

    logging::info(
        DataSource::Feed,
        None,
        &format!("{} stations in snapshot", readings.len()),
    );

    for reading in &readings {
        let icon = alert::icon_for(reading.temperature, reading.humidity, reading.rainfall);
        match alert::classify(reading) {
            Some(verdict) => println!(
                "{} {} ({}): [{}] {}",
                icon.emoji(),
                reading.station_name,
                reading.station_id,
                verdict.severity,
                verdict.message(locale)
            ),
            None => println!(
                "{} {} ({}): no alert",
                icon.emoji(),
                reading.station_name,
                reading.station_id
            ),
        }
    }
    Ok(())
}

fn simulate(
    catalogs: &Catalogs,
    snapshot_path: Option<&Path>,
    seed: Option<u64>,
    cycles: usize,
) -> Result<(), Box<dyn Error>> {
    let stations = match snapshot_path {
        Some(path) => {
            let readings = snapshot::parse_snapshot(&read_file(path, DataSource::Simulation)?)?;
            dev_mode::stations_from_readings(&readings)
        }
        None => Vec::new(),
    };
    let stations = if stations.is_empty() {
        dev_mode::stations_from_table(&catalogs.stations)
    } else {
        stations
    };

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };
    let max_cycles = (cycles > 0).then_some(cycles);

    SimulationMode::new().run(&stations, &mut rng, max_cycles, |cycle| {
        println!("{}", serde_json::to_string_pretty(&cycle.document)?);
        Ok(())
    })?;
    Ok(())
}

fn write_device_artifact(
    catalogs: &Catalogs,
    config: &Config,
    request: &DeviceConfigRequest,
    out_dir: &Path,
) -> Result<(), Box<dyn Error>> {
    let artifact = device::render_device_artifact(
        request,
        &catalogs.components,
        &catalogs.stations,
        &config.store,
    );

    fs::create_dir_all(out_dir)?;
    for (name, contents) in [
        (artifact.firmware_file_name(), artifact.firmware.clone()),
        (artifact.credentials_file_name(), artifact.credentials.to_json_pretty()),
    ] {
        let path = out_dir.join(&name);
        fs::write(&path, contents).map_err(|e| {
            let err = WxError::Io(e.to_string());
            logging::log_io_failure(DataSource::Device, &path.display().to_string(), "Write", &err);
            err
        })?;
        println!("{}", path.display());
    }

    logging::info(
        DataSource::Device,
        Some(&artifact.station_key),
        &format!("Device files written for {} audience", artifact.audience_target),
    );
    Ok(())
}

fn show_news(
    config: &Config,
    region: Option<&str>,
    audience: &str,
    live: bool,
) -> Result<(), Box<dyn Error>> {
    let audience = parse_audience(audience)?;
    let catalog = NewsCatalog::builtin();

    let items = catalog.items_for(region, audience);
    if items.is_empty() {
        println!("No regional news for this selection.");
    }
    for item in items {
        println!("{} [{}] {}", item.emoji, item.category, item.title);
        println!("    {}", item.description);
    }

    if !live {
        return Ok(());
    }
    let client = reqwest::blocking::Client::new();
    // Failures are already logged; the static list above still stands.
    if let Some(region) = region {
        if let Ok(articles) = news_api::fetch_live_news(&client, &config.news_api_key, region, audience) {
            print_articles(&articles);
        }
    }
    if let Ok(headlines) = news_api::fetch_headlines(&client, &config.news_api_key) {
        print_articles(&headlines);
    }
    Ok(())
}

fn print_articles(articles: &[news_api::LiveNewsItem]) {
    for article in articles {
        println!("📰 {} ({})", article.title, article.source);
        println!("    {}", article.url);
    }
}

fn log_event(
    station: &str,
    event_type: EventType,
    data: EventData,
    file: &Path,
) -> Result<(), Box<dyn Error>> {
    let mut log = EventLog::load_jsonl(file)?;
    let id = log.log(station, event_type, data);
    if let Some(event) = log.all().into_iter().find(|e| e.id == id) {
        events::append_jsonl(file, event)?;
    }
    println!("{}", id);
    Ok(())
}

fn list_events(station: &str, limit: usize, file: &Path) -> Result<(), Box<dyn Error>> {
    let log = EventLog::load_jsonl(file)?;
    let recent = log.recent(station, limit);
    if recent.is_empty() {
        println!("No events for {}", station);
    }
    for event in recent {
        println!(
            "{}  {:<18} {}",
            event.formatted_time, event.event_type, event.description
        );
        if let Some(notes) = &event.notes {
            println!("    {}", notes);
        }
    }
    Ok(())
}
