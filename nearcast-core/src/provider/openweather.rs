use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::{
    error::WeatherError,
    model::{Coordinate, UnitSystem, WeatherRecord},
};

use super::WeatherClient;

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    units: UnitSystem,
    endpoint: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(
        api_key: String,
        units: UnitSystem,
        endpoint: String,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self { api_key, units, endpoint, http })
    }
}

#[async_trait]
impl WeatherClient for OpenWeatherClient {
    async fn fetch(&self, coord: Coordinate) -> Result<WeatherRecord, WeatherError> {
        let lat = coord.latitude.to_string();
        let lon = coord.longitude.to_string();

        let res = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("units", self.units.as_str()),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(classify_status(status, &body));
        }

        let record = WeatherRecord::from_json(&body)?;
        tracing::debug!(location = %record.name, "decoded current conditions");
        Ok(record)
    }
}

fn classify_status(status: StatusCode, body: &str) -> WeatherError {
    let body = truncate_body(body);
    match status {
        StatusCode::BAD_REQUEST => {
            tracing::warn!(%status, "weather request rejected as bad request");
            WeatherError::BadRequest(body)
        }
        StatusCode::NOT_FOUND => {
            tracing::warn!(%status, "weather request returned not found");
            WeatherError::NotFound(body)
        }
        _ => {
            tracing::warn!(%status, "weather request failed upstream");
            WeatherError::UpstreamError { status: status.as_u16(), body }
        }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::LONDON_JSON;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, units: UnitSystem) -> OpenWeatherClient {
        OpenWeatherClient::new(
            "test_key".to_string(),
            units,
            format!("{}/data/2.5/weather", server.uri()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn fetch_sends_coordinate_units_and_credential() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("lat", "51.5085"))
            .and(query_param("lon", "-0.1257"))
            .and(query_param("units", "imperial"))
            .and(query_param("appid", "test_key"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LONDON_JSON))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, UnitSystem::Imperial);
        let record = client.fetch(Coordinate::new(51.5085, -0.1257)).await.unwrap();

        assert_eq!(record.name, "London");
        assert_eq!(record.weather[0].main, "Clouds");
    }

    #[tokio::test]
    async fn status_400_maps_to_bad_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string(r#"{"cod":"400","message":"wrong latitude"}"#),
            )
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, UnitSystem::Metric);
        let err = client.fetch(Coordinate::new(999.0, 0.0)).await.unwrap_err();

        match err {
            WeatherError::BadRequest(body) => assert!(body.contains("wrong latitude")),
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn status_404_maps_to_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, UnitSystem::Metric);
        let err = client.fetch(Coordinate::new(0.0, 0.0)).await.unwrap_err();

        assert!(matches!(err, WeatherError::NotFound(_)));
    }

    #[tokio::test]
    async fn other_status_maps_to_upstream_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, UnitSystem::Metric);
        let err = client.fetch(Coordinate::new(0.0, 0.0)).await.unwrap_err();

        assert!(matches!(err, WeatherError::UpstreamError { status: 401, .. }));
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_decode_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "weather": [],
                "name": "Nowhere"
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, UnitSystem::Metric);
        let err = client.fetch(Coordinate::new(0.0, 0.0)).await.unwrap_err();

        assert!(matches!(err, WeatherError::DecodeFailure(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_network_failure() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = OpenWeatherClient::new(
            "test_key".to_string(),
            UnitSystem::Metric,
            format!("http://127.0.0.1:{port}/data/2.5/weather"),
            Duration::from_secs(5),
        )
        .unwrap();

        let err = client.fetch(Coordinate::new(0.0, 0.0)).await.unwrap_err();
        assert!(matches!(err, WeatherError::NetworkFailure(_)));
    }

    #[test]
    fn truncate_body_caps_long_bodies() {
        let long = "x".repeat(500);
        let truncated = truncate_body(&long);
        assert_eq!(truncated.len(), 203);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncate_body("short"), "short");
    }
}
