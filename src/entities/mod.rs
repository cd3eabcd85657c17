// Owner Entities
// "The name is a VALUE (spelled many ways), the OwnerRef is IDENTITY"
//
// Each resolved owner has:
// - A lightweight reference (kind + index) that outputs point at
// - An immutable-after-creation payload (Person or Company)
// - Provenance: the parcel that created it and the raw spelling first seen

pub mod company;
pub mod person;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use company::Company;
pub use person::Person;

// ============================================================================
// OWNER KIND / OWNER REF
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    Person,
    Company,
}

impl OwnerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerKind::Person => "person",
            OwnerKind::Company => "company",
        }
    }
}

/// Pointer into the entity store. Never embeds the payload.
///
/// Indices are positions within the per-kind entity list, so `person:0`
/// and `company:0` are different entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OwnerRef {
    #[serde(rename = "type")]
    pub kind: OwnerKind,
    pub index: usize,
}

impl OwnerRef {
    pub fn person(index: usize) -> Self {
        OwnerRef { kind: OwnerKind::Person, index }
    }

    pub fn company(index: usize) -> Self {
        OwnerRef { kind: OwnerKind::Company, index }
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind.as_str(), self.index)
    }
}

// ============================================================================
// OWNER PAYLOAD
// ============================================================================

/// What a classified name turned out to be.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OwnerPayload {
    Person(Person),
    Company(Company),
}

impl OwnerPayload {
    pub fn kind(&self) -> OwnerKind {
        match self {
            OwnerPayload::Person(_) => OwnerKind::Person,
            OwnerPayload::Company(_) => OwnerKind::Company,
        }
    }

    /// Human-readable spelling, used when no raw string is available
    pub fn display_name(&self) -> String {
        match self {
            OwnerPayload::Person(person) => person.display_name(),
            OwnerPayload::Company(company) => company.name.clone(),
        }
    }

    pub fn as_person(&self) -> Option<&Person> {
        match self {
            OwnerPayload::Person(person) => Some(person),
            OwnerPayload::Company(_) => None,
        }
    }
}

// ============================================================================
// STORED ENTITY (output shape)
// ============================================================================

/// An entity as handed to the persisting collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredEntity {
    #[serde(rename = "ref")]
    pub owner_ref: OwnerRef,

    /// Deterministic UUID (v5) - stable across re-runs on identical input
    pub id: String,

    /// Parcel whose processing created this entity
    pub source_parcel: String,

    /// Raw spelling that caused the entity to be created
    pub first_seen: String,

    pub payload: OwnerPayload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_ref_serialization() {
        let json = serde_json::to_value(OwnerRef::person(3)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "person", "index": 3}));

        let back: OwnerRef = serde_json::from_value(json).unwrap();
        assert_eq!(back, OwnerRef::person(3));
    }

    #[test]
    fn test_owner_ref_display_and_order() {
        assert_eq!(OwnerRef::company(2).to_string(), "company_2");
        // Persons sort before companies, then by index
        assert!(OwnerRef::person(9) < OwnerRef::company(0));
        assert!(OwnerRef::person(1) < OwnerRef::person(2));
    }

    #[test]
    fn test_payload_tagging() {
        let payload = OwnerPayload::Company(Company::new("acme  holdings llc"));
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["type"], "company");
        assert_eq!(json["name"], "ACME HOLDINGS LLC");
        assert_eq!(payload.kind(), OwnerKind::Company);
    }
}
