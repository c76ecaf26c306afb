use serde::{Deserialize, Serialize};

use crate::error::WeatherError;

/// A single resolved geographic position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Unit system requested from the upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }

    pub const fn all() -> &'static [UnitSystem] {
        &[UnitSystem::Metric, UnitSystem::Imperial]
    }
}

impl std::fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UnitSystem {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "metric" => Ok(UnitSystem::Metric),
            "imperial" => Ok(UnitSystem::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported: metric, imperial."
            )),
        }
    }
}

/// One entry of the `weather` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Readings {
    pub temp: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feels_like: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sun {
    pub country: String,
    /// Epoch seconds.
    pub sunrise: i64,
    /// Epoch seconds.
    pub sunset: i64,
}

/// Current conditions at one place, in the shape the upstream API returns it.
///
/// The same shape is what gets written to the snapshot slot, so a cached
/// record reads back exactly like a fresh response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coord: Option<Coordinate>,
    pub weather: Vec<Condition>,
    pub main: Readings,
    pub wind: Wind,
    pub name: String,
    pub sys: Sun,
    /// Observation time, epoch seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dt: Option<i64>,
    /// Shift from UTC in seconds at the observed location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<i32>,
}

impl WeatherRecord {
    /// Decode and validate a JSON body. Any missing required field or an
    /// empty condition list rejects the whole record.
    pub fn from_json(body: &str) -> Result<Self, WeatherError> {
        let record: WeatherRecord =
            serde_json::from_str(body).map_err(|e| WeatherError::DecodeFailure(e.to_string()))?;
        record.validate()
    }

    pub fn validate(self) -> Result<Self, WeatherError> {
        if self.weather.is_empty() {
            return Err(WeatherError::DecodeFailure(
                "response contained no weather conditions".to_string(),
            ));
        }
        Ok(self)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn decodes_upstream_body_and_ignores_unknown_fields() {
        let record = WeatherRecord::from_json(LONDON_JSON).expect("valid body");

        assert_eq!(record.weather.len(), 1);
        assert_eq!(record.weather[0].icon, "04d");
        assert_eq!(record.main.humidity, 81);
        assert_eq!(record.main.pressure, Some(1012.0));
        assert_eq!(record.sys.country, "GB");
        assert_eq!(record.coord, Some(Coordinate::new(51.5085, -0.1257)));
    }

    #[test]
    fn missing_required_field_rejects_whole_record() {
        let body = LONDON_JSON.replace(r#""name": "London","#, "");
        let err = WeatherRecord::from_json(&body).unwrap_err();
        assert!(matches!(err, WeatherError::DecodeFailure(_)));
    }

    #[test]
    fn empty_condition_list_is_invalid() {
        let err = record(vec![]).validate().unwrap_err();
        assert!(matches!(err, WeatherError::DecodeFailure(_)));
    }

    #[test]
    fn unit_system_parses_case_insensitively() {
        for units in UnitSystem::all() {
            let upper = units.as_str().to_uppercase();
            assert_eq!(UnitSystem::try_from(upper.as_str()).unwrap(), *units);
        }
        assert!(UnitSystem::try_from("kelvin").is_err());
    }
}
