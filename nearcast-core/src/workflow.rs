//! Location → weather → cache → screen, one cycle at a time.

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::{
    cache::CacheStore,
    error::WeatherError,
    location::LocationProvider,
    platform::{Permission, PermissionReport, Platform, RationaleChoice, Screen},
    present::{DisplayModel, present},
    provider::WeatherClient,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    CheckingLocationService,
    RequestingPermissions,
    AwaitingFix,
    Fetching,
    Done { success: bool },
}

/// What one fetch cycle went through and how it ended.
#[derive(Debug)]
pub struct CycleReport {
    pub stages: Vec<Stage>,
    pub outcome: Result<DisplayModel, WeatherError>,
}

impl CycleReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn final_stage(&self) -> Option<Stage> {
        self.stages.last().copied()
    }
}

#[derive(Debug)]
pub struct Workflow {
    location: LocationProvider,
    client: Box<dyn WeatherClient>,
    cache: CacheStore,
    platform: Arc<dyn Platform>,
    screen: Arc<dyn Screen>,
    locale: String,
}

impl Workflow {
    pub fn new(
        location: LocationProvider,
        client: Box<dyn WeatherClient>,
        cache: CacheStore,
        platform: Arc<dyn Platform>,
        screen: Arc<dyn Screen>,
        locale: impl Into<String>,
    ) -> Self {
        Self {
            location,
            client,
            cache,
            platform,
            screen,
            locale: locale.into(),
        }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Render the last snapshot, if there is a readable one.
    pub fn show_cached(&self) -> Option<DisplayModel> {
        let record = self.cache.get()?;
        let model = present(&record, &self.locale);
        self.screen.render(&model);
        Some(model)
    }

    /// Run one cycle to completion. Never retries.
    pub async fn run_cycle(&self) -> CycleReport {
        let mut stages = vec![Stage::Idle];
        let outcome = self.drive(&mut stages).await;
        enter(&mut stages, Stage::Done { success: outcome.is_ok() });

        match &outcome {
            Ok(model) => tracing::info!(location = %model.location_name, "weather updated"),
            Err(e) => tracing::warn!(error = %e, "weather cycle failed"),
        }

        CycleReport { stages, outcome }
    }

    async fn drive(&self, stages: &mut Vec<Stage>) -> Result<DisplayModel, WeatherError> {
        enter(stages, Stage::CheckingLocationService);
        if !self.location.is_service_enabled() {
            self.platform.open_location_settings();
            return Err(self.surface(WeatherError::ServiceDisabled));
        }

        enter(stages, Stage::RequestingPermissions);
        let report = self.platform.request_permissions(&Permission::LOCATION).await;
        if report == PermissionReport::RationaleRequired {
            // The dialog is the user-facing message here; no extra notice.
            if self.platform.show_permission_rationale().await == RationaleChoice::OpenSettings {
                self.platform.open_app_settings();
            }
            return Err(WeatherError::PermissionDenied);
        }
        if report.any_permanently_denied() {
            return Err(self.surface(WeatherError::PermissionPermanentlyDenied));
        }
        if !report.all_granted() {
            return Err(self.surface(WeatherError::PermissionDenied));
        }

        enter(stages, Stage::AwaitingFix);
        let coord = match self.location.request_once().await {
            Ok(coord) => coord,
            Err(e) => {
                tracing::warn!(error = %e, "no location fix");
                self.platform.open_location_settings();
                return Err(self.surface(WeatherError::ServiceDisabled));
            }
        };

        enter(stages, Stage::Fetching);
        if !self.platform.is_network_available() {
            return Err(self.surface(WeatherError::NoConnectivity));
        }

        let record = self.client.fetch(coord).await.map_err(|e| self.surface(e))?;

        if let Err(e) = self.cache.put(&record) {
            tracing::error!(error = %format!("{e:#}"), "failed to write weather snapshot");
        }

        let model = present(&record, &self.locale);
        self.screen.render(&model);
        Ok(model)
    }

    fn surface(&self, err: WeatherError) -> WeatherError {
        if !err.is_silent() {
            self.screen.notify(&err.user_message());
        }
        err
    }
}

fn enter(stages: &mut Vec<Stage>, stage: Stage) {
    tracing::debug!(?stage, "workflow stage");
    stages.push(stage);
}

/// Owns the workflow and the at-most-one cycle in flight.
///
/// A refresh while a cycle is still running aborts that cycle and starts
/// a fresh one. Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct Session {
    workflow: Arc<Workflow>,
    in_flight: Option<JoinHandle<CycleReport>>,
}

impl Session {
    pub fn new(workflow: Workflow) -> Self {
        Self { workflow: Arc::new(workflow), in_flight: None }
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    /// Show the cached snapshot, then start the first cycle.
    pub fn launch(&mut self) -> Option<DisplayModel> {
        let cached = self.workflow.show_cached();
        self.refresh();
        cached
    }

    /// Start a new cycle. Returns true if an unfinished one was cancelled.
    pub fn refresh(&mut self) -> bool {
        let cancelled = match self.in_flight.take() {
            Some(handle) if !handle.is_finished() => {
                tracing::info!("cancelling in-flight weather cycle");
                handle.abort();
                true
            }
            _ => false,
        };

        let workflow = Arc::clone(&self.workflow);
        self.in_flight = Some(tokio::spawn(async move { workflow.run_cycle().await }));
        cancelled
    }

    /// Wait for the current cycle. `None` if nothing was started or it was
    /// aborted.
    pub async fn wait(&mut self) -> Option<CycleReport> {
        let handle = self.in_flight.take()?;
        match handle.await {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::warn!(error = %e, "weather cycle did not complete");
                None
            }
        }
    }
}
