pub mod service;

pub use service::{Provenance, ServiceType};
