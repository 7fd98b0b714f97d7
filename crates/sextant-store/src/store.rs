use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use sextant_core::{FavouriteCities, FavouritesStore, SaveOutcome, SextantError, SextantResult};

/// Favourite cities kept as a JSON array of strings in a single file.
///
/// The read-modify-write in [`FavouritesStore::save`] is not locked, so two
/// processes saving at once can lose one of the writes. Each write replaces
/// the file through a rename, so readers never see a half-written array.
pub struct JsonFavouritesStore {
    path: PathBuf,
}

impl JsonFavouritesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` when the file does not exist yet.
    fn read(&self) -> SextantResult<Option<Vec<String>>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SextantError::Storage(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )))
            }
        };
        let cities: Vec<String> = serde_json::from_str(&content)?;
        Ok(Some(cities))
    }

    fn write(&self, cities: &[String]) -> SextantResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                SextantError::Storage(format!("cannot create favourites directory: {e}"))
            })?;
        }

        let json = serde_json::to_string(cities)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .map_err(|e| SextantError::Storage(format!("cannot write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            SextantError::Storage(format!("cannot replace {}: {e}", self.path.display()))
        })?;
        Ok(())
    }
}

impl FavouritesStore for JsonFavouritesStore {
    fn save(&self, city: &str) -> SextantResult<SaveOutcome> {
        match self.read()? {
            None => {
                self.write(&[city.to_string()])?;
                debug!("created {} with {city}", self.path.display());
                Ok(SaveOutcome::Created)
            }
            Some(cities) if cities.iter().any(|c| c == city) => Ok(SaveOutcome::AlreadyPresent),
            Some(mut cities) => {
                cities.push(city.to_string());
                self.write(&cities)?;
                Ok(SaveOutcome::Added)
            }
        }
    }

    fn list(&self) -> SextantResult<FavouriteCities> {
        Ok(match self.read()? {
            Some(cities) => FavouriteCities::Saved(cities),
            None => FavouriteCities::NoneSaved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store(dir: &tempfile::TempDir) -> JsonFavouritesStore {
        JsonFavouritesStore::new(dir.path().join("favourite_cities.json"))
    }

    #[test]
    fn test_list_before_first_save() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);
        assert_eq!(store.list().unwrap(), FavouriteCities::NoneSaved);
    }

    #[test]
    fn test_first_save_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);
        assert_eq!(store.save("Paris").unwrap(), SaveOutcome::Created);
        assert!(store.path().exists());

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, r#"["Paris"]"#);
    }

    #[test]
    fn test_save_twice_keeps_one() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);
        store.save("Paris").unwrap();
        assert_eq!(store.save("Paris").unwrap(), SaveOutcome::AlreadyPresent);

        let cities = store.list().unwrap();
        assert_eq!(cities.cities().iter().filter(|c| *c == "Paris").count(), 1);
    }

    #[test]
    fn test_names_round_trip_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);
        for name in ["Paris", "paris", " São Paulo ", "Zürich"] {
            store.save(name).unwrap();
        }
        assert_eq!(
            store.list().unwrap(),
            FavouriteCities::Saved(vec![
                "Paris".into(),
                "paris".into(),
                " São Paulo ".into(),
                "Zürich".into(),
            ])
        );
    }

    #[test]
    fn test_append_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);
        store.save("Oslo").unwrap();
        assert_eq!(store.save("Lima").unwrap(), SaveOutcome::Added);
        assert_eq!(store.list().unwrap().cities(), ["Oslo", "Lima"]);
    }

    #[test]
    fn test_creates_missing_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFavouritesStore::new(dir.path().join("nested/deeper/favs.json"));
        assert_eq!(store.save("Rome").unwrap(), SaveOutcome::Created);
        assert!(!dir.path().join("nested/deeper/favs.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);
        std::fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.list(), Err(SextantError::Serialization(_))));
        assert!(matches!(store.save("Paris"), Err(SextantError::Serialization(_))));
    }
}
