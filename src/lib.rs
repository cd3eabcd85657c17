// Owner Resolution - Core Library
// Turns messy property-record owner strings into deduplicated Person/Company
// entities and links them to date snapshots and sales.

pub mod vocabulary;    // Static keyword tables, config-extended
pub mod normalizer;    // Noise removal + compound owner splitting
pub mod classifier;    // Person vs Company, name parts, ownership fractions
pub mod canonical;     // Order-insensitive canonical keys
pub mod variants;      // Surface-form variant index
pub mod entities;      // Person, Company, OwnerRef
pub mod store;         // Append-only entity store + final sweep
pub mod temporal;      // Date buckets, sales, buyer fallback chain
pub mod resolver;      // Per-record run + output
pub mod data_quality;  // Invalid owner report
pub mod rules;         // Classification override rules
pub mod config;
pub mod error;

// Re-export commonly used types
pub use canonical::{CanonicalKey, CanonicalKeyBuilder};
pub use classifier::{CandidateGroup, ClassifiedOwner, CompanySignal, NameContext, OwnerClassifier};
pub use config::ResolverConfig;
pub use data_quality::{InvalidOwner, InvalidOwnerReport, InvalidReason};
pub use entities::{Company, OwnerKind, OwnerPayload, OwnerRef, Person, StoredEntity};
pub use error::ResolveError;
pub use normalizer::NameNormalizer;
pub use resolver::{resolve_record, PropertyRecord, ResolutionOutput, ResolvedOwner, Resolver, RunSummary};
pub use rules::{OverrideRule, OverrideRules};
pub use store::{EntityStore, ParcelContext, RefRemap, Resolution, ResolutionOutcome};
pub use temporal::{
    load_sales_csv, BuyerSource, DateKey, LinkResult, LinkSite, OwnerDescriptor, OwnersByDate,
    OwnersByDateRefs, OwnershipInterest, SaleBuyerLink, SaleRecord, StructuredOwner, TemporalLinker,
};
pub use variants::VariantIndex;
pub use vocabulary::Vocabulary;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
