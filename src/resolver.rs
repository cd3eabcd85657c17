// 🧩 Resolver - One property record, start to finish
//
// All mutable state for a run lives here and is dropped with it:
// classifier tables, entity store (key map + variant index), invalid-owner report.
// Two records never share a Resolver.
//
// Pipeline:
// raw strings → NameNormalizer → OwnerClassifier → key / variant lookup
//             → EntityStore → TemporalLinker → sweep → ResolutionOutput

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::canonical::CanonicalKeyBuilder;
use crate::classifier::{NameContext, OwnerClassifier};
use crate::config::ResolverConfig;
use crate::data_quality::{InvalidOwner, InvalidOwnerReport, InvalidReason};
use crate::entities::{Company, OwnerPayload, OwnerRef, Person, StoredEntity};
use crate::error::ResolveError;
use crate::store::{EntityStore, ParcelContext, RefRemap, ResolutionOutcome};
use crate::temporal::{
    OwnerDescriptor, OwnersByDate, OwnersByDateRefs, OwnershipInterest, SaleBuyerLink, SaleRecord,
    StructuredOwner, TemporalLinker,
};
use crate::vocabulary::Vocabulary;

// ============================================================================
// INPUT
// ============================================================================

/// Everything known about one parcel's ownership
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub parcel_identifier: String,

    #[serde(default)]
    pub owners_by_date: OwnersByDate,

    #[serde(default)]
    pub sales: Vec<SaleRecord>,

    #[serde(default)]
    pub mailing_address_owners: Vec<OwnerDescriptor>,
}

impl PropertyRecord {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read property record: {:?}", path.as_ref()))?;

        serde_json::from_str(&content).context("Failed to parse property record JSON")
    }
}

// ============================================================================
// OUTPUT
// ============================================================================

/// One resolved owner plus the ownership share read next to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOwner {
    pub owner_ref: OwnerRef,
    pub interest: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub persons: usize,
    pub companies: usize,
    pub swept: usize,
    pub invalid_owners: usize,
    pub key_matches: usize,
    pub variant_matches: usize,
    pub created: usize,
    /// Sale count per buyer source label
    pub buyer_sources: BTreeMap<String, usize>,
}

impl RunSummary {
    pub fn summary(&self) -> String {
        format!(
            "Entities: {} persons, {} companies ({} swept), invalid owners: {}",
            self.persons, self.companies, self.swept, self.invalid_owners
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionOutput {
    pub parcel_identifier: String,
    pub entities: Vec<StoredEntity>,
    pub owners_by_date_refs: OwnersByDateRefs,
    pub sale_buyer_links: Vec<SaleBuyerLink>,
    pub mailing_address_refs: Vec<OwnerRef>,
    pub interests: Vec<OwnershipInterest>,
    pub invalid_owners: Vec<InvalidOwner>,
    pub summary: RunSummary,
    /// SHA-256 over entities and links; equal inputs give equal fingerprints
    pub fingerprint: String,
}

impl ResolutionOutput {
    fn compute_fingerprint(&self) -> String {
        let body = serde_json::to_vec(&(
            &self.parcel_identifier,
            &self.entities,
            &self.owners_by_date_refs,
            &self.sale_buyer_links,
            &self.mailing_address_refs,
            &self.interests,
            &self.invalid_owners,
        ))
        .unwrap_or_default();

        let mut hasher = Sha256::new();
        hasher.update(&body);
        format!("{:x}", hasher.finalize())
    }

    pub fn entity(&self, owner_ref: OwnerRef) -> Option<&StoredEntity> {
        self.entities.iter().find(|e| e.owner_ref == owner_ref)
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
struct OutcomeCounts {
    key_matches: usize,
    variant_matches: usize,
    created: usize,
}

#[derive(Debug, Clone)]
pub struct Resolver {
    classifier: OwnerClassifier,
    store: EntityStore,
    invalid: InvalidOwnerReport,
    outcomes: OutcomeCounts,
}

impl Resolver {
    pub fn new(parcel: ParcelContext, config: &ResolverConfig) -> Result<Self, ResolveError> {
        let vocabulary = Arc::new(Vocabulary::from_config(config));
        let classifier = OwnerClassifier::from_config(config, Arc::clone(&vocabulary))?;
        let store = EntityStore::new(parcel, CanonicalKeyBuilder::new(vocabulary))
            .with_backfill(config.backfill_middle_names);

        Ok(Resolver {
            classifier,
            store,
            invalid: InvalidOwnerReport::new(),
            outcomes: OutcomeCounts::default(),
        })
    }

    /// Split, classify and resolve a compound owner string.
    ///
    /// Sentinels yield nothing; unclassifiable candidates are reported and skipped.
    pub fn resolve_raw(&mut self, raw: &str, context: NameContext) -> Vec<ResolvedOwner> {
        let group = self.classifier.classify_group(raw, context);

        for rejected in &group.rejected {
            self.invalid.record(rejected, InvalidReason::Unclassified);
        }

        group
            .owners
            .into_iter()
            .map(|owner| ResolvedOwner {
                owner_ref: self.resolve_payload(&owner.raw, &owner.payload),
                interest: owner.interest,
            })
            .collect()
    }

    /// Resolve one descriptor; structured descriptors skip string parsing.
    pub fn resolve_descriptor(&mut self, descriptor: &OwnerDescriptor, context: NameContext) -> Vec<ResolvedOwner> {
        let structured = match descriptor {
            OwnerDescriptor::Raw(raw) => return self.resolve_raw(raw, context),
            OwnerDescriptor::Structured(structured) => structured,
        };

        let Some(payload) = structured_payload(structured) else {
            let raw = serde_json::to_string(structured).unwrap_or_default();
            self.invalid.record(&raw, InvalidReason::IncompleteDescriptor);
            return Vec::new();
        };

        let owner_ref = self.resolve_payload(&payload.display_name(), &payload);
        vec![ResolvedOwner {
            owner_ref,
            interest: None,
        }]
    }

    pub(crate) fn sweep_unused(&mut self, used: &BTreeSet<OwnerRef>) -> RefRemap {
        self.store.sweep_unused(used)
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn classifier(&self) -> &OwnerClassifier {
        &self.classifier
    }

    pub fn invalid_owners(&self) -> &[InvalidOwner] {
        self.invalid.entries()
    }

    /// Link the whole record, sweep, and package the result.
    pub fn run(mut self, record: &PropertyRecord) -> ResolutionOutput {
        let linked = TemporalLinker::new().link(&mut self, record);

        let mut buyer_sources = BTreeMap::new();
        for link in &linked.sale_buyer_links {
            *buyer_sources.entry(link.source.label().to_string()).or_insert(0) += 1;
        }

        let summary = RunSummary {
            persons: self.store.person_count(),
            companies: self.store.company_count(),
            swept: linked.swept,
            invalid_owners: self.invalid.len(),
            key_matches: self.outcomes.key_matches,
            variant_matches: self.outcomes.variant_matches,
            created: self.outcomes.created,
            buyer_sources,
        };

        info!(parcel = %record.parcel_identifier, "{}", summary.summary());

        let mut output = ResolutionOutput {
            parcel_identifier: record.parcel_identifier.clone(),
            entities: self.store.entities(),
            owners_by_date_refs: linked.owners_by_date_refs,
            sale_buyer_links: linked.sale_buyer_links,
            mailing_address_refs: linked.mailing_address_refs,
            interests: linked.interests,
            invalid_owners: self.invalid.into_entries(),
            summary,
            fingerprint: String::new(),
        };
        output.fingerprint = output.compute_fingerprint();

        output
    }

    fn resolve_payload(&mut self, raw: &str, payload: &OwnerPayload) -> OwnerRef {
        let resolution = self.store.resolve(raw, payload);
        match resolution.outcome {
            ResolutionOutcome::KeyMatch => self.outcomes.key_matches += 1,
            ResolutionOutcome::VariantMatch => self.outcomes.variant_matches += 1,
            ResolutionOutcome::Created => self.outcomes.created += 1,
        }
        resolution.owner_ref
    }
}

/// Resolve one property record from a clean state.
pub fn resolve_record(record: &PropertyRecord, config: &ResolverConfig) -> Result<ResolutionOutput, ResolveError> {
    let parcel = ParcelContext::new(record.parcel_identifier.clone());
    let resolver = Resolver::new(parcel, config)?;
    debug!(parcel = %record.parcel_identifier, buckets = record.owners_by_date.len(), sales = record.sales.len(), "resolving record");
    Ok(resolver.run(record))
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn structured_payload(structured: &StructuredOwner) -> Option<OwnerPayload> {
    match structured {
        StructuredOwner::Person {
            first_name,
            middle_name,
            last_name,
            prefix_name,
            suffix_name,
        } => {
            let person = Person::new(non_blank(first_name)?, non_blank(last_name)?)
                .with_middle(middle_name.clone())
                .with_prefix(prefix_name.clone())
                .with_suffix(suffix_name.clone());
            Some(OwnerPayload::Person(person))
        }
        StructuredOwner::Company { name } => {
            let company = Company::new(non_blank(name)?);
            (!company.name.is_empty()).then_some(OwnerPayload::Company(company))
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
