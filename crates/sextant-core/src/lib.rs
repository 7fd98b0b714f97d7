pub mod error;
pub mod favourites;
pub mod weather;

pub use error::{SextantError, SextantResult};
pub use favourites::{FavouriteCities, FavouritesStore, SaveOutcome};
pub use weather::{Alerts, CurrentWeather, ForecastEntry, Units, WeatherAlert};
