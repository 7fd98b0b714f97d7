use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("City not found. Please check the city name.")]
    CityNotFound(String),

    /// Any other non-success reply; `message` comes from the response body.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Unable to fetch data. {0}")]
    Transport(String),

    #[error("unexpected response from weather service: {0}")]
    InvalidResponse(String),
}

impl From<serde_json::Error> for WeatherError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidResponse(e.to_string())
    }
}

pub type WeatherResult<T> = Result<T, WeatherError>;
