use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upstream capability a query targets. Part of the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Geocode,
    Suggest,
}

impl ServiceType {
    pub const ALL: [Self; 2] = [Self::Geocode, Self::Suggest];

    /// Tag stored in the `service_type` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Geocode => "geocode",
            Self::Suggest => "suggest",
        }
    }

    /// Human name used in "service unavailable" messages.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Geocode => "Geocoding",
            Self::Suggest => "Suggest",
        }
    }

    /// Name of the upstream API, used when describing transport failures.
    #[must_use]
    pub const fn upstream_name(self) -> &'static str {
        match self {
            Self::Geocode => "Yandex Geocode",
            Self::Suggest => "Yandex Suggest",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "geocode" => Ok(Self::Geocode),
            "suggest" => Ok(Self::Suggest),
            other => Err(format!(
                "Unknown service type: {other}. Expected 'geocode' or 'suggest'"
            )),
        }
    }
}

/// Where a returned payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Cache,
    Upstream,
}

impl Provenance {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Upstream => "upstream",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_type_parse() {
        assert_eq!("geocode".parse::<ServiceType>(), Ok(ServiceType::Geocode));
        assert_eq!("suggest".parse::<ServiceType>(), Ok(ServiceType::Suggest));
        assert!("Geocode".parse::<ServiceType>().is_err());
        assert!("reverse".parse::<ServiceType>().is_err());
    }

    #[test]
    fn test_serialized_tags() {
        assert_eq!(
            serde_json::to_string(&ServiceType::Suggest).unwrap(),
            "\"suggest\""
        );
        assert_eq!(
            serde_json::to_string(&Provenance::Upstream).unwrap(),
            "\"upstream\""
        );
        assert_eq!(Provenance::Cache.as_str(), "cache");
    }
}
