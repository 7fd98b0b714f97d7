use std::time::Duration;

use sextant_core::{Alerts, CurrentWeather, ForecastEntry, Units};
use tracing::{debug, error, info, warn};

use crate::error::{WeatherError, WeatherResult};
use crate::response::{parse_alerts, parse_current, parse_forecast};

pub const DEFAULT_BASE_URL: &str = "http://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_FORECAST_URL: &str = "http://api.openweathermap.org/data/2.5/forecast";
pub const DEFAULT_ONE_CALL_URL: &str = "http://api.openweathermap.org/data/2.5/onecall";

/// Everything the client needs; built by the caller, never read from globals.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub forecast_url: String,
    pub one_call_url: String,
    pub timeout: Duration,
    /// Extra attempts after a transport failure or a 5xx reply.
    pub retries: u32,
    pub retry_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.into(),
            forecast_url: DEFAULT_FORECAST_URL.into(),
            one_call_url: DEFAULT_ONE_CALL_URL.into(),
            timeout: Duration::from_secs(10),
            retries: 2,
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// Blocking OpenWeatherMap client.
pub struct WeatherClient {
    config: ClientConfig,
    agent: ureq::Agent,
}

impl WeatherClient {
    pub fn new(config: ClientConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self { config, agent }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn current_url(&self, city: &str, units: Units) -> String {
        format!(
            "{}?q={}&units={}&appid={}",
            self.config.base_url,
            urlencoding::encode(city),
            units.as_query(),
            urlencoding::encode(&self.config.api_key)
        )
    }

    pub fn forecast_url(&self, city: &str) -> String {
        format!(
            "{}?q={}&appid={}&units=metric",
            self.config.forecast_url,
            urlencoding::encode(city),
            urlencoding::encode(&self.config.api_key)
        )
    }

    pub fn alerts_url(&self, lat: f64, lon: f64) -> String {
        format!(
            "{}?lat={lat}&lon={lon}&appid={}",
            self.config.one_call_url,
            urlencoding::encode(&self.config.api_key)
        )
    }

    /// Current conditions for `city`. Each call logs its outcome.
    pub fn get_weather(&self, city: &str, units: Units) -> WeatherResult<CurrentWeather> {
        let (status, body) = self.fetch(&self.current_url(city, units))?;
        if status == 200 {
            info!("Successfully fetched weather for {city}");
        } else {
            error!("Failed to fetch weather for {city}: {status} {body}");
        }
        parse_current(status, &body, city, units)
    }

    /// One metric reading per day for the next five days.
    pub fn get_weather_forecast(&self, city: &str) -> WeatherResult<Vec<ForecastEntry>> {
        let (status, body) = self.fetch(&self.forecast_url(city))?;
        parse_forecast(status, &body, city)
    }

    pub fn get_weather_alerts(&self, lat: f64, lon: f64) -> WeatherResult<Alerts> {
        let (status, body) = self.fetch(&self.alerts_url(lat, lon))?;
        parse_alerts(status, &body)
    }

    /// GET `url`, returning the status and body of whatever reply arrives.
    /// Transport failures and 5xx replies are retried.
    fn fetch(&self, url: &str) -> WeatherResult<(u16, String)> {
        let mut attempt = 0;
        loop {
            let outcome = match self.agent.get(url).call() {
                Ok(resp) => Ok((resp.status(), resp)),
                Err(ureq::Error::Status(code, resp)) => Ok((code, resp)),
                Err(ureq::Error::Transport(t)) => Err(t.to_string()),
            };

            let retryable = match &outcome {
                Ok((status, _)) => *status >= 500,
                Err(_) => true,
            };
            if retryable && attempt < self.config.retries {
                attempt += 1;
                match &outcome {
                    Ok((status, _)) => warn!(status, attempt, "server error, retrying"),
                    Err(e) => warn!(error = %e, attempt, "request failed, retrying"),
                }
                std::thread::sleep(self.config.retry_delay);
                continue;
            }

            return match outcome {
                Ok((status, resp)) => {
                    let body = resp
                        .into_string()
                        .map_err(|e| WeatherError::Transport(e.to_string()))?;
                    debug!(status, bytes = body.len(), "weather response");
                    Ok((status, body))
                }
                Err(e) => {
                    error!("Request failed: {e}");
                    Err(WeatherError::Transport(e))
                }
            };
        }
    }
}
