use std::time::Duration;

use anyhow::Context;
use axum::async_trait;
use time::OffsetDateTime;
use tracing::{debug, instrument, warn};

use super::dto::{
    ForecastResponse, GeocodingResponse, Place, ResolvedLocation, WeatherResponse,
    WeatherSnapshot,
};
use crate::{config::WeatherConfig, error::AppError};

/// External geocoding + current-conditions service.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn geocode(&self, query: &str) -> anyhow::Result<Vec<Place>>;
    async fn current(&self, lat: f64, lng: f64) -> anyhow::Result<WeatherSnapshot>;
}

pub struct OpenMeteo {
    client: reqwest::Client,
    geocoding_url: String,
    forecast_url: String,
}

impl OpenMeteo {
    pub fn new(cfg: &WeatherConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .user_agent(concat!("farmlink/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build weather http client")?;
        Ok(Self {
            client,
            geocoding_url: cfg.geocoding_url.clone(),
            forecast_url: cfg.forecast_url.clone(),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteo {
    #[instrument(skip(self))]
    async fn geocode(&self, query: &str) -> anyhow::Result<Vec<Place>> {
        let resp: GeocodingResponse = self
            .client
            .get(&self.geocoding_url)
            .query(&[
                ("name", query),
                ("count", "10"),
                ("language", "en"),
                ("format", "json"),
            ])
            .send()
            .await
            .context("geocoding request")?
            .error_for_status()
            .context("geocoding status")?
            .json()
            .await
            .context("parse geocoding response")?;
        debug!(candidates = resp.results.len(), "geocoded");
        Ok(resp.results)
    }

    #[instrument(skip(self))]
    async fn current(&self, lat: f64, lng: f64) -> anyhow::Result<WeatherSnapshot> {
        let resp: ForecastResponse = self
            .client
            .get(&self.forecast_url)
            .query(&[
                ("latitude", lat.to_string()),
                ("longitude", lng.to_string()),
                (
                    "current",
                    "temperature_2m,wind_speed_10m,relative_humidity_2m".to_string(),
                ),
                ("hourly", "precipitation_probability".to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await
            .context("forecast request")?
            .error_for_status()
            .context("forecast status")?
            .json()
            .await
            .context("parse forecast response")?;
        Ok(snapshot_from(resp, OffsetDateTime::now_utc()))
    }
}

fn snapshot_from(resp: ForecastResponse, fetched_at: OffsetDateTime) -> WeatherSnapshot {
    let ForecastResponse { current, hourly } = resp;
    // current.time is quarter-hourly, hourly slots are on the hour
    let rain_probability_percent = current.time.as_deref().and_then(|now| {
        let hour = now.get(..13)?;
        let idx = hourly.time.iter().position(|t| t.starts_with(hour))?;
        hourly.precipitation_probability.get(idx).copied().flatten()
    });
    WeatherSnapshot {
        fetched_at,
        time: current.time,
        temperature_c: current.temperature_2m,
        wind_speed_kmh: current.wind_speed_10m,
        humidity_percent: current.relative_humidity_2m,
        rain_probability_percent,
    }
}

/// Lowercase, punctuation to spaces, single spaces.
pub fn normalize_text(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .flat_map(char::to_lowercase)
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn similarity(candidate: Option<&str>, wanted: &str) -> i32 {
    let Some(candidate) = candidate.map(normalize_text).filter(|c| !c.is_empty()) else {
        return 0;
    };
    if candidate == wanted {
        2
    } else if candidate.contains(wanted) || wanted.contains(&candidate) {
        1
    } else {
        0
    }
}

/// Higher is better; 0 means nothing about the candidate matched.
pub fn score(place: &Place, target: &str, state: Option<&str>) -> i32 {
    let target = normalize_text(target);
    let mut score = 0;
    if !target.is_empty() {
        score += 3 * similarity(Some(place.name.as_str()), &target)
            .max(similarity(place.admin2.as_deref(), &target));
    }
    if let Some(state) = state.map(normalize_text).filter(|s| !s.is_empty()) {
        score += 2 * similarity(place.admin1.as_deref(), &state);
    }
    if place
        .country_code
        .as_deref()
        .is_some_and(|c| c.eq_ignore_ascii_case("IN"))
    {
        score += 1;
    }
    score
}

/// Highest-scoring candidate; ties keep the provider's order.
pub fn best_match<'a>(places: &'a [Place], target: &str, state: Option<&str>) -> Option<&'a Place> {
    let mut best: Option<(&Place, i32)> = None;
    for place in places {
        let s = score(place, target, state);
        if s > 0 && best.map_or(true, |(_, b)| s > b) {
            best = Some((place, s));
        }
    }
    best.map(|(p, _)| p)
}

fn non_blank(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|s| !s.is_empty())
}

/// Resolves a stored district/state to a place and fetches its current weather.
pub async fn weather_near(
    provider: &dyn WeatherProvider,
    district: Option<&str>,
    state: Option<&str>,
) -> Result<WeatherResponse, AppError> {
    let district = non_blank(district);
    let state = non_blank(state);

    let queries: Vec<&str> = [district, state].into_iter().flatten().collect();
    if queries.is_empty() {
        return Err(AppError::NotFound("No location saved on this profile".into()));
    }

    let mut resolved = None;
    for query in queries {
        let places = provider.geocode(query).await.map_err(|e| {
            warn!(error = ?e, query, "geocoding failed");
            AppError::Upstream("geocoding service unavailable".into())
        })?;
        if let Some(place) = best_match(&places, query, state) {
            resolved = Some(place.clone());
            break;
        }
    }
    let place = resolved.ok_or_else(|| {
        AppError::NotFound("Could not find coordinates for the saved location".into())
    })?;

    let weather = provider
        .current(place.latitude, place.longitude)
        .await
        .map_err(|e| {
            warn!(error = ?e, "weather lookup failed");
            AppError::Upstream("weather service unavailable".into())
        })?;

    Ok(WeatherResponse {
        location: ResolvedLocation {
            label: place.label(),
            lat: place.latitude,
            lng: place.longitude,
        },
        weather,
    })
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::collections::HashMap;

    /// Canned provider keyed by exact query string.
    #[derive(Default)]
    pub struct FakeWeather {
        pub places: HashMap<String, Vec<Place>>,
        pub fail: bool,
    }

    pub fn place(name: &str, admin1: &str, admin2: Option<&str>, cc: &str) -> Place {
        Place {
            name: name.into(),
            latitude: 12.5,
            longitude: 76.9,
            country_code: Some(cc.into()),
            admin1: Some(admin1.into()),
            admin2: admin2.map(Into::into),
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeWeather {
        async fn geocode(&self, query: &str) -> anyhow::Result<Vec<Place>> {
            if self.fail {
                anyhow::bail!("connection reset");
            }
            Ok(self.places.get(query).cloned().unwrap_or_default())
        }

        async fn current(&self, _lat: f64, _lng: f64) -> anyhow::Result<WeatherSnapshot> {
            Ok(WeatherSnapshot {
                fetched_at: OffsetDateTime::UNIX_EPOCH,
                time: Some("2026-06-01T10:15".into()),
                temperature_c: Some(29.5),
                wind_speed_kmh: Some(11.0),
                humidity_percent: Some(70.0),
                rain_probability_percent: Some(40.0),
            })
        }
    }
}
