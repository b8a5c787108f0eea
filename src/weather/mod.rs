mod dto;
pub mod handlers;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use services::{OpenMeteo, WeatherProvider};

pub fn router() -> Router<AppState> {
    handlers::weather_routes()
}
