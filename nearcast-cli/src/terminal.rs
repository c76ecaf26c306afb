//! Terminal stand-ins for the platform services and the weather screen.

use std::net::ToSocketAddrs;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use inquire::{Confirm, InquireError};
use nearcast_core::{
    Config, DisplayModel, IconCategory, Permission, PermissionReport, PermissionState, Platform,
    RationaleChoice, Screen,
};
use parking_lot::Mutex;
use url::Url;

#[derive(Debug)]
pub struct TerminalPlatform {
    assume_yes: bool,
    host: String,
    port: u16,
}

impl TerminalPlatform {
    pub fn new(assume_yes: bool, endpoint: &str) -> anyhow::Result<Self> {
        let url = Url::parse(endpoint)
            .with_context(|| format!("Invalid weather endpoint: {endpoint}"))?;
        let host = url
            .host_str()
            .ok_or_else(|| anyhow!("Weather endpoint has no host: {endpoint}"))?
            .to_string();
        let port = url.port_or_known_default().unwrap_or(443);

        Ok(Self { assume_yes, host, port })
    }
}

fn uniform(permissions: &[Permission], state: PermissionState) -> PermissionReport {
    PermissionReport::Checked(permissions.iter().map(|p| (*p, state)).collect())
}

/// Skipping the question (Esc) or having no terminal to ask on calls for
/// the rationale rather than a plain denial.
fn permission_report(
    permissions: &[Permission],
    answer: Result<bool, InquireError>,
) -> PermissionReport {
    match answer {
        Ok(true) => uniform(permissions, PermissionState::Granted),
        Ok(false) => uniform(permissions, PermissionState::Denied),
        Err(InquireError::NotTTY | InquireError::OperationCanceled) => {
            PermissionReport::RationaleRequired
        }
        Err(e) => {
            tracing::debug!(error = %e, "location prompt aborted");
            uniform(permissions, PermissionState::Denied)
        }
    }
}

fn rationale_choice(answer: Result<bool, InquireError>) -> RationaleChoice {
    match answer {
        Ok(true) => RationaleChoice::OpenSettings,
        Ok(false) => RationaleChoice::Dismiss,
        Err(InquireError::NotTTY) => {
            eprintln!("Run nearcast in a terminal to answer, or pass --yes to allow it up front.");
            RationaleChoice::Dismiss
        }
        Err(e) => {
            tracing::debug!(error = %e, "rationale prompt aborted");
            RationaleChoice::Dismiss
        }
    }
}

#[async_trait]
impl Platform for TerminalPlatform {
    async fn request_permissions(&self, permissions: &[Permission]) -> PermissionReport {
        if self.assume_yes {
            return uniform(permissions, PermissionState::Granted);
        }

        let answer = tokio::task::spawn_blocking(|| {
            Confirm::new("Allow nearcast to use your location?")
                .with_default(true)
                .prompt()
        })
        .await;

        match answer {
            Ok(answer) => permission_report(permissions, answer),
            Err(e) => {
                tracing::warn!(error = %e, "location prompt task failed");
                uniform(permissions, PermissionState::Denied)
            }
        }
    }

    async fn show_permission_rationale(&self) -> RationaleChoice {
        eprintln!("nearcast needs your location to look up the weather there.");

        let answer = tokio::task::spawn_blocking(|| {
            Confirm::new("Show where nearcast keeps its settings?")
                .with_default(false)
                .prompt()
        })
        .await;

        match answer {
            Ok(answer) => rationale_choice(answer),
            Err(e) => {
                tracing::warn!(error = %e, "rationale prompt task failed");
                RationaleChoice::Dismiss
            }
        }
    }

    fn is_network_available(&self) -> bool {
        let target = (self.host.as_str(), self.port);
        tokio::task::block_in_place(|| {
            target
                .to_socket_addrs()
                .map(|mut addrs| addrs.next().is_some())
                .unwrap_or(false)
        })
    }

    fn open_location_settings(&self) {
        eprintln!(
            "Hint: pass --lat and --lon, or run `nearcast configure` to set a default location."
        );
    }

    fn open_app_settings(&self) {
        match Config::config_file_path() {
            Ok(path) => eprintln!("Settings live in {}", path.display()),
            Err(e) => tracing::warn!(error = %e, "no config directory"),
        }
    }
}

/// Prints the display model; keeps the last icon across renders.
#[derive(Debug)]
pub struct TerminalScreen {
    json: bool,
    icon: Mutex<Option<IconCategory>>,
}

impl TerminalScreen {
    pub fn new(json: bool) -> Self {
        Self { json, icon: Mutex::new(None) }
    }
}

impl Screen for TerminalScreen {
    fn render(&self, model: &DisplayModel) {
        let icon = {
            let mut current = self.icon.lock();
            *current = model.resolve_icon(*current);
            *current
        };

        if self.json {
            let shown = DisplayModel { icon, ..model.clone() };
            match serde_json::to_string_pretty(&shown) {
                Ok(s) => println!("{s}"),
                Err(e) => tracing::error!(error = %e, "failed to encode display model"),
            }
            return;
        }

        let icon = icon.map(|i| format!(" [{}]", i.as_str())).unwrap_or_default();
        println!("{}, {}{}", model.location_name, model.country, icon);
        println!("{} ({})", model.main, model.description);
        println!("Temperature  {}  ({} / {})", model.temperature, model.min, model.max);
        println!("Humidity     {}", model.humidity);
        println!("Wind         {}", model.wind_speed);
        println!("Sunrise      {}", model.sunrise);
        println!("Sunset       {}", model.sunset);
        println!();
    }

    fn notify(&self, message: &str) {
        eprintln!("! {message}");
    }
}
