pub use super::geocache::Entity as Geocache;
