use std::sync::Arc;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use inquire::{Confirm, CustomType, Password, Select};
use nearcast_core::{
    CacheStore, Config, Coordinate, FileStore, FixedLocationSource, LocationProvider, Screen,
    Session, UnitSystem, Workflow, present, present::clock_time, provider::client_from_config,
};

use crate::terminal::{TerminalPlatform, TerminalScreen};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "nearcast", version, about = "Current weather where you are")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API key, unit system and an optional default location.
    Configure,

    /// Show the cached snapshot, then fetch current weather and show it.
    Show {
        /// Latitude to use instead of the configured location.
        #[arg(long, allow_hyphen_values = true, requires = "lon")]
        lat: Option<f64>,

        /// Longitude to use instead of the configured location.
        #[arg(long, allow_hyphen_values = true, requires = "lat")]
        lon: Option<f64>,

        /// Locale for the temperature suffix, e.g. "en_US".
        #[arg(long)]
        locale: Option<String>,

        /// Allow location use without asking.
        #[arg(short, long)]
        yes: bool,

        /// Print display fields as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the last successfully fetched weather without going online.
    Cached {
        #[arg(long)]
        locale: Option<String>,

        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { lat, lon, locale, yes, json } => {
                let config = Config::load()?;
                let coordinate = match (lat, lon) {
                    (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
                    _ => config.coordinate(),
                };
                show(&config, coordinate, resolve_locale(locale, &config), yes, json).await
            }
            Command::Cached { locale, json } => {
                let config = Config::load()?;
                cached(&resolve_locale(locale, &config), json)
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_help_message("Leave empty to keep the current key")
        .prompt()?;
    if !api_key.trim().is_empty() {
        config.set_api_key(api_key.trim().to_string());
    }

    let units = Select::new("Units:", UnitSystem::all().to_vec()).prompt()?;
    config.units = units;

    let set_location = Confirm::new("Set a default location?")
        .with_default(config.location.is_some())
        .prompt()?;
    if set_location {
        let latitude = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please enter a number")
            .prompt()?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please enter a number")
            .prompt()?;
        config.set_location(Some(Coordinate::new(latitude, longitude)));
    } else {
        config.set_location(None);
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(
    config: &Config,
    coordinate: Option<Coordinate>,
    locale: String,
    assume_yes: bool,
    json: bool,
) -> anyhow::Result<()> {
    let cache = open_cache()?;
    let screen = Arc::new(TerminalScreen::new(json));
    update(config, coordinate, locale, assume_yes, cache, screen).await
}

/// One launch: cached snapshot, then a fresh cycle. A cycle that ends in a
/// weather error is still `Ok`; the screen has already been told.
async fn update(
    config: &Config,
    coordinate: Option<Coordinate>,
    locale: String,
    assume_yes: bool,
    cache: CacheStore,
    screen: Arc<dyn Screen>,
) -> anyhow::Result<()> {
    let setup = client_from_config(config).and_then(|client| {
        Ok((client, TerminalPlatform::new(assume_yes, &config.endpoint)?))
    });
    let (client, platform) = match setup {
        Ok(parts) => parts,
        Err(e) => {
            if let Some(record) = cache.get() {
                screen.render(&present(&record, &locale));
            }
            return Err(e);
        }
    };
    let source = Arc::new(FixedLocationSource::new(coordinate));

    let workflow = Workflow::new(
        LocationProvider::new(source),
        client,
        cache,
        Arc::new(platform),
        screen,
        locale,
    );

    let mut session = Session::new(workflow);
    session.launch();

    let report = session
        .wait()
        .await
        .ok_or_else(|| anyhow!("Weather update was interrupted"))?;

    if let Err(e) = report.outcome {
        tracing::debug!(error = %e, "no new weather this run");
    }
    Ok(())
}

fn cached(locale: &str, json: bool) -> anyhow::Result<()> {
    let cache = open_cache()?;
    let Some(record) = cache.get() else {
        println!("No cached weather yet. Run `nearcast show` first.");
        return Ok(());
    };

    let screen = TerminalScreen::new(json);
    screen.render(&present(&record, locale));

    if let Some(dt) = record.dt.filter(|_| !json) {
        println!("Observed at  {}", clock_time(dt, &chrono::Local));
    }
    Ok(())
}

fn open_cache() -> anyhow::Result<CacheStore> {
    let dir = Config::cache_dir()?;
    Ok(CacheStore::new(Arc::new(FileStore::new(dir))))
}

/// Explicit flag, then config, then the usual locale environment variables.
fn resolve_locale(flag: Option<String>, config: &Config) -> String {
    flag.or_else(|| config.locale.clone())
        .or_else(|| {
            ["LC_ALL", "LC_MESSAGES", "LANG"]
                .iter()
                .filter_map(|var| std::env::var(var).ok())
                .find(|v| !v.is_empty())
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use nearcast_core::{DisplayModel, MemoryStore, WeatherRecord};
    use parking_lot::Mutex;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Default)]
    struct RecordingScreen {
        rendered: Mutex<Vec<DisplayModel>>,
        notices: Mutex<Vec<String>>,
    }

    impl Screen for RecordingScreen {
        fn render(&self, model: &DisplayModel) {
            self.rendered.lock().push(model.clone());
        }

        fn notify(&self, message: &str) {
            self.notices.lock().push(message.to_string());
        }
    }

    const SNAPSHOT: &str = r#"{
        "weather": [{"main": "Clouds", "description": "broken clouds", "icon": "04d"}],
        "main": {"temp": 11.0, "temp_min": 9.5, "temp_max": 12.0, "humidity": 81},
        "wind": {"speed": 4.1},
        "name": "Monrovia",
        "sys": {"country": "LR", "sunrise": 1700000000, "sunset": 1700040000}
    }"#;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn show_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from(["nearcast", "show", "--lat", "6.3", "--lon", "-10.8"]).unwrap();
        match cli.command {
            Command::Show { lat, lon, .. } => {
                assert_eq!(lat, Some(6.3));
                assert_eq!(lon, Some(-10.8));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn lat_without_lon_is_rejected() {
        assert!(Cli::try_parse_from(["nearcast", "show", "--lat", "6.3"]).is_err());
    }

    #[test]
    fn locale_flag_beats_config() {
        let config = Config { locale: Some("en_GB".into()), ..Config::default() };

        assert_eq!(resolve_locale(Some("my_MM".into()), &config), "my_MM");
        assert_eq!(resolve_locale(None, &config), "en_GB");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn malformed_response_ends_quietly() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = Config {
            api_key: Some("test_key".into()),
            endpoint: format!("{}/data/2.5/weather", mock_server.uri()),
            ..Config::default()
        };
        let cache = CacheStore::new(Arc::new(MemoryStore::new()));
        let screen = Arc::new(RecordingScreen::default());

        let result = update(
            &config,
            Some(Coordinate::new(6.3, -10.8)),
            "en_LR".into(),
            true,
            cache.clone(),
            screen.clone(),
        )
        .await;

        assert!(result.is_ok(), "{result:?}");
        assert!(screen.notices.lock().is_empty());
        assert!(screen.rendered.lock().is_empty());
        assert!(cache.get().is_none());
    }

    #[tokio::test]
    async fn missing_api_key_still_shows_snapshot() {
        let config = Config { api_key: None, ..Config::default() };
        let cache = CacheStore::new(Arc::new(MemoryStore::new()));
        cache.put(&WeatherRecord::from_json(SNAPSHOT).unwrap()).unwrap();
        let screen = Arc::new(RecordingScreen::default());

        let result = update(&config, None, "en_LR".into(), true, cache, screen.clone()).await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("No API key configured"));
        let rendered = screen.rendered.lock();
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].location_name, "Monrovia");
        assert_eq!(rendered[0].temperature, "11.0°F");
    }
}
