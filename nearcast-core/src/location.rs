//! Single-shot location fixes on top of a subscription-style location source.

use parking_lot::Mutex;
use std::{
    collections::HashMap,
    fmt::Debug,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::sync::mpsc;

use crate::model::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    #[default]
    HighAccuracy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocationRequest {
    pub priority: Priority,
}

#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location service unavailable")]
    Unavailable,
}

/// Platform location subsystem.
///
/// A source pushes fixes into the sender handed to `start_updates` until
/// `stop_updates` is called for that subscription.
pub trait LocationSource: Send + Sync + Debug {
    /// Whether the location subsystem is switched on system-wide.
    fn is_enabled(&self) -> bool;

    fn start_updates(
        &self,
        request: LocationRequest,
        updates: mpsc::UnboundedSender<Coordinate>,
    ) -> Result<SubscriptionId, LocationError>;

    fn stop_updates(&self, id: SubscriptionId);
}

/// Releases a subscription if the fix request is dropped before completing.
struct Subscription<'a> {
    source: &'a dyn LocationSource,
    id: Option<SubscriptionId>,
}

impl Subscription<'_> {
    fn cancel(mut self) {
        if let Some(id) = self.id.take() {
            self.source.stop_updates(id);
        }
    }
}

impl Drop for Subscription<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            tracing::debug!(?id, "location request dropped before first fix");
            self.source.stop_updates(id);
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocationProvider {
    source: Arc<dyn LocationSource>,
}

impl LocationProvider {
    pub fn new(source: Arc<dyn LocationSource>) -> Self {
        Self { source }
    }

    pub fn is_service_enabled(&self) -> bool {
        self.source.is_enabled()
    }

    /// Wait for exactly one high-accuracy fix, then unsubscribe.
    pub async fn request_once(&self) -> Result<Coordinate, LocationError> {
        if !self.source.is_enabled() {
            return Err(LocationError::Unavailable);
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let request = LocationRequest { priority: Priority::HighAccuracy };
        let id = self.source.start_updates(request, tx)?;
        let subscription = Subscription { source: self.source.as_ref(), id: Some(id) };

        let fix = rx.recv().await;
        subscription.cancel();

        let coord = fix.ok_or(LocationError::Unavailable)?;
        tracing::info!(latitude = coord.latitude, longitude = coord.longitude, "location fix");
        Ok(coord)
    }
}

/// A source that reports one configured position, or is disabled when
/// there is none.
#[derive(Debug, Default)]
pub struct FixedLocationSource {
    fix: Option<Coordinate>,
    next_id: AtomicU64,
    active: Mutex<HashMap<SubscriptionId, mpsc::UnboundedSender<Coordinate>>>,
}

impl FixedLocationSource {
    pub fn new(fix: Option<Coordinate>) -> Self {
        Self { fix, ..Self::default() }
    }

    pub fn active_subscriptions(&self) -> usize {
        self.active.lock().len()
    }
}

impl LocationSource for FixedLocationSource {
    fn is_enabled(&self) -> bool {
        self.fix.is_some()
    }

    fn start_updates(
        &self,
        _request: LocationRequest,
        updates: mpsc::UnboundedSender<Coordinate>,
    ) -> Result<SubscriptionId, LocationError> {
        let fix = self.fix.ok_or(LocationError::Unavailable)?;
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));

        // Receiver gone means the caller already lost interest.
        let _ = updates.send(fix);
        self.active.lock().insert(id, updates);
        Ok(id)
    }

    fn stop_updates(&self, id: SubscriptionId) {
        self.active.lock().remove(&id);
    }
}
