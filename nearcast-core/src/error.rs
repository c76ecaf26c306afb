use thiserror::Error;

/// Everything that can end a fetch cycle early.
///
/// None of these are retried automatically; each one is terminal for the
/// cycle in which it occurs.
#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("Location service is disabled")]
    ServiceDisabled,

    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location permission permanently denied")]
    PermissionPermanentlyDenied,

    #[error("No network connectivity")]
    NoConnectivity,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream error (status {status}): {body}")]
    UpstreamError { status: u16, body: String },

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("Failed to decode weather data: {0}")]
    DecodeFailure(String),

    #[error("Cached snapshot is corrupt: {0}")]
    CacheCorrupt(String),
}

impl WeatherError {
    /// Short text for a transient notice.
    pub fn user_message(&self) -> String {
        match self {
            Self::ServiceDisabled => {
                "Your location provider is turned off. Please turn it on.".to_string()
            }
            Self::PermissionDenied => "Location permission is required to show weather.".to_string(),
            Self::PermissionPermanentlyDenied => {
                "You have denied location permission. Please enable it in settings.".to_string()
            }
            Self::NoConnectivity => "No internet connection available".to_string(),
            Self::BadRequest(_) => "The weather service rejected the request.".to_string(),
            Self::NotFound(_) => "No weather data found for this location.".to_string(),
            Self::UpstreamError { status, .. } => {
                format!("The weather service returned an error ({status}).")
            }
            Self::NetworkFailure(_) => "Network error. Check your connection.".to_string(),
            Self::DecodeFailure(_) => "Weather data could not be read.".to_string(),
            Self::CacheCorrupt(_) => "Saved weather data could not be read.".to_string(),
        }
    }

    /// Errors that degrade to "no data" without alerting the user.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::DecodeFailure(_) | Self::CacheCorrupt(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_and_cache_errors_are_silent() {
        assert!(WeatherError::DecodeFailure("x".into()).is_silent());
        assert!(WeatherError::CacheCorrupt("x".into()).is_silent());

        assert!(!WeatherError::ServiceDisabled.is_silent());
        assert!(!WeatherError::NoConnectivity.is_silent());
        assert!(!WeatherError::NotFound("x".into()).is_silent());
        assert!(!WeatherError::UpstreamError { status: 500, body: String::new() }.is_silent());
    }

    #[test]
    fn user_messages() {
        assert!(WeatherError::NoConnectivity.user_message().contains("internet"));
        assert!(WeatherError::ServiceDisabled.user_message().contains("turned off"));

        let err = WeatherError::UpstreamError { status: 503, body: "down".into() };
        assert!(err.user_message().contains("503"));
    }
}
