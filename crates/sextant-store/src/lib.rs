mod store;

pub use store::JsonFavouritesStore;
