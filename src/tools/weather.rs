//! Weather lookup tool backed by the Open-Meteo API.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{Tool, ToolContext};

/// Get the current weather for a city.
///
/// Resolves the city with the geocoding API, then reads current conditions
/// from the forecast API. Failures are reported in the returned text.
pub struct GetWeather {
    ctx: ToolContext,
}

impl GetWeather {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    /// Look up the weather. Never fails: errors are rendered as text.
    pub async fn lookup(&self, city: &str) -> String {
        match self.try_lookup(city).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(city = %city, error = %e, "Weather lookup failed");
                format!("Error fetching weather: {}", e)
            }
        }
    }

    async fn try_lookup(&self, city: &str) -> anyhow::Result<String> {
        let geo_url = format!(
            "{}/v1/search?name={}&count=1&language=en&format=json",
            self.ctx.geocoding_url,
            urlencoding::encode(city)
        );
        let geo = self.ctx.fetcher.get_json(&geo_url).await?;

        let Some(location) = geo
            .get("results")
            .and_then(|r| r.as_array())
            .and_then(|r| r.first())
        else {
            return Ok(format!("Could not find coordinates for {}.", city));
        };

        let lat = coordinate(location, "latitude")?;
        let lon = coordinate(location, "longitude")?;
        let name = location
            .get("name")
            .and_then(|n| n.as_str())
            .unwrap_or(city);

        let weather_url = format!(
            "{}/v1/forecast?latitude={}&longitude={}&current=temperature_2m,weather_code&temperature_unit=fahrenheit",
            self.ctx.forecast_url, lat, lon
        );
        let weather = self.ctx.fetcher.get_json(&weather_url).await?;

        let current = weather.get("current");
        let temp = current.and_then(|c| c.get("temperature_2m"));
        let code = current
            .and_then(|c| c.get("weather_code"))
            .and_then(weather_code);

        Ok(format!(
            "Current weather in {}: {}°F, {}.",
            name,
            format_temperature(temp),
            weather_condition(code)
        ))
    }
}

#[async_trait]
impl Tool for GetWeather {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get the current weather for a given city using Open-Meteo API."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "Name of the city, e.g. 'Paris'"
                }
            },
            "required": ["city"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let city = args["city"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'city' argument"))?;

        Ok(self.lookup(city).await)
    }
}

/// Map an Open-Meteo WMO weather code to a condition label.
pub fn weather_condition(code: Option<i64>) -> &'static str {
    match code {
        Some(0) => "Clear sky",
        Some(1..=3) => "Partly cloudy",
        Some(45 | 48) => "Foggy",
        Some(51 | 53 | 55) => "Drizzle",
        Some(61 | 63 | 65) => "Rain",
        Some(71 | 73 | 75) => "Snow",
        Some(95 | 96 | 99) => "Thunderstorm",
        _ => "Unknown",
    }
}

/// Read a weather code, accepting integral floats such as `61.0`.
fn weather_code(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.is_finite())
            .map(|f| f as i64)
    })
}

fn coordinate(location: &Value, key: &str) -> anyhow::Result<f64> {
    location
        .get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| anyhow::anyhow!("missing '{}' in geocoding result", key))
}

fn format_temperature(temp: Option<&Value>) -> String {
    match temp {
        None | Some(Value::Null) => "None".to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::tools::testing::{context, CannedFetcher};

    const LABELS: [&str; 8] = [
        "Clear sky",
        "Partly cloudy",
        "Foggy",
        "Drizzle",
        "Rain",
        "Snow",
        "Thunderstorm",
        "Unknown",
    ];

    fn berlin_fetcher(code: Value) -> CannedFetcher {
        CannedFetcher::new()
            .route(
                "https://geo.test/v1/search",
                json!({
                    "results": [{
                        "name": "Berlin",
                        "latitude": 52.52,
                        "longitude": 13.41,
                        "country": "Germany"
                    }]
                }),
            )
            .route(
                "https://forecast.test/v1/forecast",
                json!({
                    "current": {
                        "time": "2024-05-01T12:00",
                        "temperature_2m": 64.4,
                        "weather_code": code
                    }
                }),
            )
    }

    #[test]
    fn condition_labels() {
        assert_eq!(weather_condition(Some(0)), "Clear sky");
        assert_eq!(weather_condition(Some(2)), "Partly cloudy");
        assert_eq!(weather_condition(Some(48)), "Foggy");
        assert_eq!(weather_condition(Some(55)), "Drizzle");
        assert_eq!(weather_condition(Some(61)), "Rain");
        assert_eq!(weather_condition(Some(73)), "Snow");
        assert_eq!(weather_condition(Some(99)), "Thunderstorm");
        assert_eq!(weather_condition(Some(999)), "Unknown");
        assert_eq!(weather_condition(Some(62)), "Unknown");
        assert_eq!(weather_condition(None), "Unknown");
    }

    #[test]
    fn integral_float_codes_are_accepted() {
        assert_eq!(weather_code(&json!(61.0)), Some(61));
        assert_eq!(weather_code(&json!(3)), Some(3));
        assert_eq!(weather_code(&json!(61.5)), None);
        assert_eq!(weather_code(&json!("61")), None);
    }

    #[tokio::test]
    async fn float_code_from_forecast_maps_to_label() {
        let fetcher = Arc::new(berlin_fetcher(json!(61.0)));
        let tool = GetWeather::new(context(fetcher));

        let report = tool.lookup("Berlin").await;

        assert_eq!(report, "Current weather in Berlin: 64.4°F, Rain.");
    }

    #[tokio::test]
    async fn known_city_reports_name_and_condition() {
        let fetcher = Arc::new(berlin_fetcher(json!(61)));
        let tool = GetWeather::new(context(fetcher.clone()));

        let report = tool.lookup("berlin").await;

        assert_eq!(report, "Current weather in Berlin: 64.4°F, Rain.");
        assert!(LABELS.iter().any(|label| report.contains(label)));

        let requested = fetcher.requested.lock().unwrap();
        assert_eq!(requested.len(), 2);
        assert!(requested[1].contains("latitude=52.52&longitude=13.41"));
        assert!(requested[1].ends_with("temperature_unit=fahrenheit"));
    }

    #[tokio::test]
    async fn city_name_is_url_encoded() {
        let fetcher = Arc::new(berlin_fetcher(json!(0)));
        let tool = GetWeather::new(context(fetcher.clone()));

        tool.lookup("São Paulo").await;

        let requested = fetcher.requested.lock().unwrap();
        assert!(requested[0]
            .starts_with("https://geo.test/v1/search?name=S%C3%A3o%20Paulo&count=1"));
    }

    #[tokio::test]
    async fn unknown_city_is_reported_not_raised() {
        let fetcher = Arc::new(CannedFetcher::new().route(
            "https://geo.test/v1/search",
            json!({"generationtime_ms": 0.5}),
        ));
        let tool = GetWeather::new(context(fetcher));

        let report = tokio_test::assert_ok!(tool.execute(json!({"city": "Atlantis"})).await);
        assert_eq!(report, "Could not find coordinates for Atlantis.");
    }

    #[tokio::test]
    async fn empty_results_count_as_not_found() {
        let fetcher = Arc::new(
            CannedFetcher::new().route("https://geo.test/v1/search", json!({"results": []})),
        );
        let tool = GetWeather::new(context(fetcher));
        assert_eq!(
            tool.lookup("Nowhere").await,
            "Could not find coordinates for Nowhere."
        );
    }

    #[tokio::test]
    async fn network_failure_becomes_text() {
        let fetcher = Arc::new(
            CannedFetcher::new()
                .route(
                    "https://geo.test/v1/search",
                    json!({"results": [{"name": "Oslo", "latitude": 59.9, "longitude": 10.7}]}),
                )
                .fail("https://forecast.test", "connection refused"),
        );
        let tool = GetWeather::new(context(fetcher));

        let report = tokio_test::assert_ok!(tool.execute(json!({"city": "Oslo"})).await);
        assert_eq!(report, "Error fetching weather: connection refused");
    }

    #[tokio::test]
    async fn missing_current_block_renders_unknown() {
        let fetcher = Arc::new(
            CannedFetcher::new()
                .route(
                    "https://geo.test/v1/search",
                    json!({"results": [{"name": "Oslo", "latitude": 59.9, "longitude": 10.7}]}),
                )
                .route("https://forecast.test", json!({})),
        );
        let tool = GetWeather::new(context(fetcher));
        assert_eq!(
            tool.lookup("Oslo").await,
            "Current weather in Oslo: None°F, Unknown."
        );
    }

    #[tokio::test]
    async fn missing_city_argument_is_an_error() {
        let tool = GetWeather::new(context(Arc::new(CannedFetcher::new())));
        tokio_test::assert_err!(tool.execute(json!({})).await);
    }
}
