//! Turns a weather record into the strings and icon a screen shows.

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::model::WeatherRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconCategory {
    Clear,
    Cloud,
    Rain,
    Storm,
    Snow,
    Mist,
}

impl IconCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Cloud => "cloud",
            Self::Rain => "rain",
            Self::Storm => "storm",
            Self::Snow => "snow",
            Self::Mist => "mist",
        }
    }
}

/// Upstream icon code → category. Codes not listed here get no icon.
static ICON_TABLE: &[(&str, IconCategory)] = &[
    ("01d", IconCategory::Clear),
    ("02d", IconCategory::Cloud),
    ("03d", IconCategory::Cloud),
    ("04d", IconCategory::Cloud),
    ("10d", IconCategory::Rain),
    ("11d", IconCategory::Storm),
    ("13d", IconCategory::Snow),
    ("50d", IconCategory::Mist),
    ("01n", IconCategory::Cloud),
    ("02n", IconCategory::Cloud),
    ("03n", IconCategory::Cloud),
    ("04n", IconCategory::Cloud),
    ("10n", IconCategory::Cloud),
    ("11n", IconCategory::Storm),
    ("13n", IconCategory::Snow),
    ("50n", IconCategory::Mist),
];

pub fn icon_for_code(code: &str) -> Option<IconCategory> {
    ICON_TABLE
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, category)| *category)
}

/// Regions that read temperatures in Fahrenheit.
const FAHRENHEIT_REGIONS: [&str; 3] = ["US", "LR", "MM"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn for_region(region: Option<&str>) -> Self {
        match region {
            Some(r) if FAHRENHEIT_REGIONS.contains(&r) => Self::Fahrenheit,
            _ => Self::Celsius,
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }
}

/// Extract the region from "en_US.UTF-8", "en-US", "sr_RS@latin" or a bare
/// "US". Returns `None` for language-only locales like "en".
pub fn region_from_locale(locale: &str) -> Option<String> {
    let base = locale
        .split(['.', '@'])
        .next()
        .unwrap_or_default()
        .trim();

    let mut parts = base.split(['_', '-']).filter(|p| !p.is_empty());
    let first = parts.next()?;

    let region = match parts.find(|p| is_region_subtag(p)) {
        Some(region) => region,
        None if first.len() == 2 && first.chars().all(|c| c.is_ascii_uppercase()) => first,
        None => return None,
    };

    Some(region.to_ascii_uppercase())
}

fn is_region_subtag(part: &str) -> bool {
    (part.len() == 2 && part.chars().all(|c| c.is_ascii_alphabetic()))
        || (part.len() == 3 && part.chars().all(|c| c.is_ascii_digit()))
}

/// `HH:mm` in the given zone; empty when the timestamp is out of range.
pub fn clock_time<Tz: TimeZone>(epoch_secs: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    DateTime::from_timestamp(epoch_secs, 0)
        .map(|utc| utc.with_timezone(tz).format("%H:%M").to_string())
        .unwrap_or_default()
}

/// Everything a screen binds to.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplayModel {
    pub main: String,
    pub description: String,
    pub temperature: String,
    pub humidity: String,
    pub min: String,
    pub max: String,
    pub wind_speed: String,
    pub location_name: String,
    pub country: String,
    pub sunrise: String,
    pub sunset: String,
    pub icon: Option<IconCategory>,
}

impl DisplayModel {
    /// Icon to show given what is already on screen.
    pub fn resolve_icon(&self, prior: Option<IconCategory>) -> Option<IconCategory> {
        self.icon.or(prior)
    }
}

/// Map a record for display, with times in the device's zone.
pub fn present(record: &WeatherRecord, locale: &str) -> DisplayModel {
    present_in(record, locale, &Local)
}

/// Map a record for display with times in `tz`.
///
/// Every condition entry is written in order into the same single-slot
/// fields, so with several entries the last one wins. An entry whose icon
/// code is unknown leaves the icon from an earlier entry in place.
pub fn present_in<Tz: TimeZone>(record: &WeatherRecord, locale: &str, tz: &Tz) -> DisplayModel
where
    Tz::Offset: std::fmt::Display,
{
    let unit = TemperatureUnit::for_region(region_from_locale(locale).as_deref());
    let mut model = DisplayModel::default();

    for condition in &record.weather {
        model.main = condition.main.clone();
        model.description = condition.description.clone();
        model.temperature = format!("{}{}", reading(record.main.temp), unit.suffix());
        model.humidity = format!("{} per cent", record.main.humidity);
        model.min = format!("{} min", reading(record.main.temp_min));
        model.max = format!("{} max", reading(record.main.temp_max));
        model.wind_speed = reading(record.wind.speed);
        model.location_name = record.name.clone();
        model.country = record.sys.country.clone();
        model.sunrise = clock_time(record.sys.sunrise, tz);
        model.sunset = clock_time(record.sys.sunset, tz);

        if let Some(icon) = icon_for_code(&condition.icon) {
            model.icon = Some(icon);
        }
    }

    model
}

/// Decimal reading with at least one fractional digit: `21.0`, `21.5`.
fn reading(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}
