mod client;
mod error;
mod response;

pub use client::{ClientConfig, WeatherClient};
pub use error::{WeatherError, WeatherResult};
pub use response::{parse_alerts, parse_current, parse_forecast};
