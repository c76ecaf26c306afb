//! Collaborators the workflow calls into but does not implement.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::present::DisplayModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    FineLocation,
    CoarseLocation,
}

impl Permission {
    pub const LOCATION: [Permission; 2] = [Permission::FineLocation, Permission::CoarseLocation];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    PermanentlyDenied,
}

/// What the platform answered to a permission request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionReport {
    /// The user was asked (or had answered before); one state per permission.
    Checked(Vec<(Permission, PermissionState)>),
    /// The platform wants an explanation shown before asking again.
    RationaleRequired,
}

impl PermissionReport {
    pub fn all_granted(&self) -> bool {
        match self {
            Self::Checked(states) => {
                !states.is_empty()
                    && states.iter().all(|(_, s)| *s == PermissionState::Granted)
            }
            Self::RationaleRequired => false,
        }
    }

    pub fn any_permanently_denied(&self) -> bool {
        match self {
            Self::Checked(states) => {
                states.iter().any(|(_, s)| *s == PermissionState::PermanentlyDenied)
            }
            Self::RationaleRequired => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RationaleChoice {
    OpenSettings,
    Dismiss,
}

/// Platform services: permissions, connectivity and settings screens.
#[async_trait]
pub trait Platform: Send + Sync + Debug {
    async fn request_permissions(&self, permissions: &[Permission]) -> PermissionReport;

    /// Explain why location access is needed; resolves with the user's choice.
    async fn show_permission_rationale(&self) -> RationaleChoice;

    fn is_network_available(&self) -> bool;

    fn open_location_settings(&self);

    fn open_app_settings(&self);
}

/// The single weather screen.
pub trait Screen: Send + Sync + Debug {
    fn render(&self, model: &DisplayModel);

    /// Transient, non-blocking message to the user.
    fn notify(&self, message: &str);
}
