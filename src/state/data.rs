/// Shared data structures for the customer location log
///
/// These structs represent the data model that flows between
/// the database layer, the capture flow and the map layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::assets::AssetPath;
use crate::error::ValidationError;
use crate::geo::Coordinate;

/// Database-assigned identity of a stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub i64);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Business relationship with the customer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomerType {
    Prospect,
    Existing,
    Vip,
    Repeat,
    /// A value written by a newer or older client that this build does not know
    Unknown(String),
}

impl CustomerType {
    /// The closed set a capture form may choose from
    pub const KNOWN: [CustomerType; 4] = [
        CustomerType::Prospect,
        CustomerType::Existing,
        CustomerType::Vip,
        CustomerType::Repeat,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            CustomerType::Prospect => "Prospect",
            CustomerType::Existing => "Existing",
            CustomerType::Vip => "VIP",
            CustomerType::Repeat => "Repeat",
            CustomerType::Unknown(raw) => raw,
        }
    }

    /// Map a stored value back to a type. Never fails, so rows written
    /// with a type this build doesn't know still load.
    pub fn from_stored(raw: &str) -> Self {
        raw.parse()
            .unwrap_or_else(|_| CustomerType::Unknown(raw.to_string()))
    }
}

impl std::fmt::Display for CustomerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CustomerType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "prospect" => Ok(CustomerType::Prospect),
            "existing" => Ok(CustomerType::Existing),
            "vip" => Ok(CustomerType::Vip),
            "repeat" => Ok(CustomerType::Repeat),
            _ => Err(ValidationError::UnknownCustomerType(s.to_string())),
        }
    }
}

/// A record as submitted by the capture form, before the repository
/// assigns an id and a creation time
#[derive(Debug, Clone, PartialEq)]
pub struct DraftRecord {
    pub name: String,
    pub phone: String,
    pub customer_type: CustomerType,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub coordinate: Coordinate,
    pub image_path: Option<AssetPath>,
}

impl DraftRecord {
    /// Check required fields and coordinate bounds.
    /// Whitespace-only names and phones count as missing.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if self.phone.trim().is_empty() {
            return Err(ValidationError::MissingField("phone"));
        }
        if let CustomerType::Unknown(raw) = &self.customer_type {
            return Err(ValidationError::UnknownCustomerType(raw.clone()));
        }
        self.coordinate.validate()
    }
}

/// A stored customer visit. Immutable once written.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationRecord {
    /// Unique database ID, strictly increasing in insertion order
    pub id: RecordId,
    pub name: String,
    pub phone: String,
    pub customer_type: CustomerType,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub coordinate: Coordinate,
    /// Weak reference into the asset store; may point at a missing file
    pub image_path: Option<AssetPath>,
    /// Set once by the repository at insert time
    pub created_at: DateTime<Utc>,
}

/// How visit timestamps are shown to people
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

impl LocationRecord {
    pub fn last_visit(&self) -> String {
        self.created_at.format(TIMESTAMP_FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> DraftRecord {
        DraftRecord {
            name: "Ana".to_string(),
            phone: "012".to_string(),
            customer_type: CustomerType::Vip,
            address: None,
            notes: None,
            coordinate: Coordinate { lat: 11.55, lon: 104.91 },
            image_path: None,
        }
    }

    #[test]
    fn test_parse_customer_type() {
        assert_eq!("VIP".parse::<CustomerType>(), Ok(CustomerType::Vip));
        assert_eq!(" prospect ".parse::<CustomerType>(), Ok(CustomerType::Prospect));
        assert!("Gold".parse::<CustomerType>().is_err());
    }

    #[test]
    fn test_stored_type_falls_back_to_unknown() {
        assert_eq!(CustomerType::from_stored("Repeat"), CustomerType::Repeat);
        assert_eq!(
            CustomerType::from_stored("Wholesale"),
            CustomerType::Unknown("Wholesale".to_string())
        );
        assert_eq!(CustomerType::from_stored("Wholesale").to_string(), "Wholesale");
    }

    #[test]
    fn test_display_matches_stored_form() {
        for ty in CustomerType::KNOWN {
            assert_eq!(CustomerType::from_stored(&ty.to_string()), ty);
        }
    }

    #[test]
    fn test_validate_required_fields() {
        assert!(draft().validate().is_ok());

        let mut missing_name = draft();
        missing_name.name = "   ".to_string();
        assert_eq!(missing_name.validate(), Err(ValidationError::MissingField("name")));

        let mut missing_phone = draft();
        missing_phone.phone.clear();
        assert_eq!(missing_phone.validate(), Err(ValidationError::MissingField("phone")));
    }

    #[test]
    fn test_validate_rejects_unknown_type_and_bad_coordinates() {
        let mut unknown = draft();
        unknown.customer_type = CustomerType::Unknown("Gold".to_string());
        assert!(matches!(unknown.validate(), Err(ValidationError::UnknownCustomerType(_))));

        let mut bad_lat = draft();
        bad_lat.coordinate.lat = -91.0;
        assert_eq!(bad_lat.validate(), Err(ValidationError::LatitudeOutOfRange(-91.0)));
    }

    #[test]
    fn test_last_visit_is_labelled_utc() {
        use chrono::TimeZone;

        let record = LocationRecord {
            id: RecordId(1),
            name: "Ana".to_string(),
            phone: "012".to_string(),
            customer_type: CustomerType::Vip,
            address: None,
            notes: None,
            coordinate: Coordinate { lat: 11.55, lon: 104.91 },
            image_path: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
        };

        assert_eq!(record.last_visit(), "2025-01-02 03:04:05 UTC");
    }
}
