pub mod lookup_service;
pub mod lookup_service_impl;

pub use lookup_service::{
    LookupError, LookupResult, LookupService, MIN_QUERY_CHARS, validate_query,
};
pub use lookup_service_impl::SeaOrmLookupService;
