use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One geocoding candidate.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Place {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub admin1: Option<String>, // state
    #[serde(default)]
    pub admin2: Option<String>, // district
}

impl Place {
    pub fn label(&self) -> String {
        match &self.admin1 {
            Some(state) if !state.eq_ignore_ascii_case(&self.name) => {
                format!("{}, {}", self.name, state)
            }
            _ => self.name.clone(),
        }
    }
}

/// Current conditions, in the shape the dashboard consumes.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    #[serde(with = "time::serde::rfc3339")]
    pub fetched_at: OffsetDateTime,
    pub time: Option<String>,
    pub temperature_c: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
    pub humidity_percent: Option<f64>,
    pub rain_probability_percent: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ResolvedLocation {
    pub label: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize)]
pub struct WeatherResponse {
    pub location: ResolvedLocation,
    pub weather: WeatherSnapshot,
}

// --- Open-Meteo wire types ---

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodingResponse {
    #[serde(default)]
    pub results: Vec<Place>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ForecastCurrent {
    pub time: Option<String>,
    pub temperature_2m: Option<f64>,
    pub wind_speed_10m: Option<f64>,
    pub relative_humidity_2m: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ForecastHourly {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub precipitation_probability: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ForecastResponse {
    #[serde(default)]
    pub current: ForecastCurrent,
    #[serde(default)]
    pub hourly: ForecastHourly,
}
