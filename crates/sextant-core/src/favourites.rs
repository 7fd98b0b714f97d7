use std::fmt;

use crate::error::SextantResult;

pub trait FavouritesStore {
    /// Append `city` unless an identical name is already stored.
    fn save(&self, city: &str) -> SextantResult<SaveOutcome>;
    fn list(&self) -> SextantResult<FavouriteCities>;
}

/// What a save did to the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The store did not exist yet and was created holding this city.
    Created,
    Added,
    AlreadyPresent,
}

impl fmt::Display for SaveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "Favourites file created and city added"),
            Self::Added => write!(f, "City added to favourites"),
            Self::AlreadyPresent => write!(f, "City already in favourites"),
        }
    }
}

/// Stored favourites. A store that was never written is `NoneSaved`, which is
/// distinct from one holding an empty list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavouriteCities {
    NoneSaved,
    Saved(Vec<String>),
}

impl FavouriteCities {
    pub fn cities(&self) -> &[String] {
        match self {
            Self::NoneSaved => &[],
            Self::Saved(cities) => cities,
        }
    }
}

impl fmt::Display for FavouriteCities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoneSaved => write!(f, "No favourite cities saved"),
            Self::Saved(cities) if cities.is_empty() => write!(f, "Favourites list is empty"),
            Self::Saved(cities) => write!(f, "{}", cities.join("\n")),
        }
    }
}
