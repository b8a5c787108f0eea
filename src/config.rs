use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig {
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherConfig {
    pub geocoding_url: String,
    pub forecast_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database_url: String,
    pub db: DbConfig,
    pub jwt: JwtConfig,
    pub weather: WeatherConfig,
}

/// Longest session a token may grant: 30 days.
pub const MAX_TTL_MINUTES: i64 = 30 * 24 * 60;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn jwt_ttl_minutes() -> i64 {
    env_or("JWT_TTL_MINUTES", 60i64).clamp(1, MAX_TTL_MINUTES)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let server = ServerConfig {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("APP_PORT", 8000),
        };
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let db = DbConfig {
            max_connections: env_or("DB_MAX_CONNECTIONS", 10),
            connect_timeout_secs: env_or("DB_CONNECT_TIMEOUT_SECS", 5),
        };
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "farmlink".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "farmlink-users".into()),
            ttl_minutes: jwt_ttl_minutes(),
        };
        let weather = WeatherConfig {
            geocoding_url: std::env::var("GEOCODING_URL")
                .unwrap_or_else(|_| "https://geocoding-api.open-meteo.com/v1/search".into()),
            forecast_url: std::env::var("FORECAST_URL")
                .unwrap_or_else(|_| "https://api.open-meteo.com/v1/forecast".into()),
            timeout_secs: env_or("WEATHER_TIMEOUT_SECS", 10),
        };
        Ok(Self {
            server,
            database_url,
            db,
            jwt,
            weather,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_falls_back_on_missing_or_garbage() {
        assert_eq!(env_or("FARMLINK_TEST_SURELY_UNSET", 42u32), 42);
        std::env::set_var("FARMLINK_TEST_GARBAGE", "not-a-number");
        assert_eq!(env_or("FARMLINK_TEST_GARBAGE", 7u64), 7);
        std::env::set_var("FARMLINK_TEST_NUMBER", "15");
        assert_eq!(env_or("FARMLINK_TEST_NUMBER", 7i64), 15);
    }

    #[test]
    fn jwt_ttl_is_clamped_to_a_sane_range() {
        std::env::set_var("JWT_TTL_MINUTES", "9223372036854775807");
        assert_eq!(jwt_ttl_minutes(), MAX_TTL_MINUTES);
        std::env::set_var("JWT_TTL_MINUTES", "-5");
        assert_eq!(jwt_ttl_minutes(), 1);
        std::env::remove_var("JWT_TTL_MINUTES");
        assert_eq!(jwt_ttl_minutes(), 60);
    }
}
