//! Core library for the `nearcast` weather client.
//!
//! This crate defines:
//! - The location → weather → cache → screen workflow
//! - An OpenWeather-compatible client behind a trait
//! - The single-slot snapshot cache
//! - Presentation of a record into display strings
//! - Configuration & credentials handling
//!
//! Platform concerns (permissions, connectivity, settings screens, the
//! screen itself) are traits in [`platform`], implemented by the front end.

pub mod cache;
pub mod config;
pub mod error;
pub mod location;
pub mod model;
pub mod platform;
pub mod present;
pub mod provider;
pub mod workflow;

pub use cache::{CacheStore, FileStore, KeyValueStore, MemoryStore};
pub use config::Config;
pub use error::WeatherError;
pub use location::{FixedLocationSource, LocationError, LocationProvider, LocationSource};
pub use model::{Coordinate, UnitSystem, WeatherRecord};
pub use platform::{Permission, PermissionReport, PermissionState, Platform, RationaleChoice, Screen};
pub use present::{DisplayModel, IconCategory, present};
pub use provider::{OpenWeatherClient, WeatherClient};
pub use workflow::{CycleReport, Session, Stage, Workflow};
