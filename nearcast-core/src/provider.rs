use crate::{Config, Coordinate, WeatherRecord, error::WeatherError};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// Fetches current conditions for one coordinate. One attempt per call.
#[async_trait]
pub trait WeatherClient: Send + Sync + Debug {
    async fn fetch(&self, coord: Coordinate) -> Result<WeatherRecord, WeatherError>;
}

/// Construct the weather client described by the config.
pub fn client_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherClient>> {
    let api_key = config.api_key()?;

    let client = OpenWeatherClient::new(
        api_key.to_owned(),
        config.units,
        config.endpoint.clone(),
        config.request_timeout(),
    )?;

    Ok(Box::new(client))
}
