// 🗄️ Entity Store - Append-only Person/Company registry for one property record
//
// Resolution order for every classified candidate:
// 1. Canonical key exact match
// 2. Variant match on any full-name surface form
// 3. Create a new entity, bind its key and variants
//
// Nothing is deleted mid-run. `sweep_unused` runs once at the very end and
// compacts the survivors, returning the old → new reference mapping.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::canonical::{CanonicalKey, CanonicalKeyBuilder};
use crate::entities::{Company, OwnerKind, OwnerPayload, OwnerRef, Person, StoredEntity};
use crate::variants::VariantIndex;

// ============================================================================
// PARCEL CONTEXT
// ============================================================================

/// Identifies the property record being processed; stamped on new entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParcelContext {
    pub parcel_identifier: String,
}

impl ParcelContext {
    pub fn new(parcel_identifier: impl Into<String>) -> Self {
        ParcelContext {
            parcel_identifier: parcel_identifier.into(),
        }
    }
}

// ============================================================================
// RESOLUTION RESULT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionOutcome {
    KeyMatch,
    VariantMatch,
    Created,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub owner_ref: OwnerRef,
    pub outcome: ResolutionOutcome,
    /// A missing middle name was filled in on the matched person
    pub backfilled: bool,
}

// ============================================================================
// REF REMAP
// ============================================================================

/// Old → new references produced by the sweep
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefRemap {
    map: BTreeMap<OwnerRef, OwnerRef>,
    removed: Vec<OwnerRef>,
}

impl RefRemap {
    /// New reference for a surviving entity, `None` if it was swept
    pub fn apply(&self, owner_ref: OwnerRef) -> Option<OwnerRef> {
        self.map.get(&owner_ref).copied()
    }

    /// Rewrite a list, dropping swept references
    pub fn apply_all(&self, refs: &[OwnerRef]) -> Vec<OwnerRef> {
        refs.iter().filter_map(|r| self.apply(*r)).collect()
    }

    pub fn removed(&self) -> &[OwnerRef] {
        &self.removed
    }
}

// ============================================================================
// ENTITY STORE
// ============================================================================

#[derive(Debug, Clone)]
struct EntityRecord<T> {
    id: Uuid,
    first_seen: String,
    value: T,
}

#[derive(Debug, Clone)]
pub struct EntityStore {
    parcel: ParcelContext,
    persons: Vec<EntityRecord<Person>>,
    companies: Vec<EntityRecord<Company>>,
    keys: HashMap<CanonicalKey, OwnerRef>,
    variants: VariantIndex,
    key_builder: CanonicalKeyBuilder,
    backfill_middle_names: bool,
    created: usize,
}

impl EntityStore {
    pub fn new(parcel: ParcelContext, key_builder: CanonicalKeyBuilder) -> Self {
        EntityStore {
            parcel,
            persons: Vec::new(),
            companies: Vec::new(),
            keys: HashMap::new(),
            variants: VariantIndex::new(),
            key_builder,
            backfill_middle_names: true,
            created: 0,
        }
    }

    pub fn with_backfill(mut self, backfill_middle_names: bool) -> Self {
        self.backfill_middle_names = backfill_middle_names;
        self
    }

    pub fn parcel(&self) -> &ParcelContext {
        &self.parcel
    }

    /// Resolve a classified candidate to an existing or new entity.
    ///
    /// `raw` is the candidate spelling used for the canonical key; for
    /// structured input pass the payload's display name.
    pub fn resolve(&mut self, raw: &str, payload: &OwnerPayload) -> Resolution {
        let key = self
            .key_builder
            .build_key(raw)
            .or_else(|| self.key_builder.build_key(&payload.display_name()));

        // 1. Canonical key
        if let Some(owner_ref) = key.as_ref().and_then(|k| self.keys.get(k)).copied() {
            let backfilled = self.absorb(owner_ref, payload);
            debug!(raw, key = %display_key(&key), %owner_ref, "canonical key match");
            return Resolution {
                owner_ref,
                outcome: ResolutionOutcome::KeyMatch,
                backfilled,
            };
        }

        // 2. Variants
        let hit = self
            .variants
            .probe(raw, payload)
            .into_iter()
            .find(|(_, candidate)| self.compatible(*candidate, payload));

        if let Some((form, owner_ref)) = hit {
            if let Some(key) = key {
                self.bind_key(key, owner_ref);
            }
            let backfilled = self.absorb(owner_ref, payload);
            debug!(raw, form = %form, %owner_ref, "variant match");
            return Resolution {
                owner_ref,
                outcome: ResolutionOutcome::VariantMatch,
                backfilled,
            };
        }

        // 3. New entity
        let owner_ref = self.append(raw, payload, key.as_ref());
        if let Some(key) = key {
            self.bind_key(key, owner_ref);
        }
        self.variants.register_variants(owner_ref, payload);
        debug!(raw, %owner_ref, "created entity");

        Resolution {
            owner_ref,
            outcome: ResolutionOutcome::Created,
            backfilled: false,
        }
    }

    /// Remove every entity not in `used`, compacting indices per kind in
    /// creation order. Key and variant bindings follow their entities.
    pub fn sweep_unused(&mut self, used: &BTreeSet<OwnerRef>) -> RefRemap {
        let mut remap = RefRemap::default();

        self.persons = sweep_kind(
            std::mem::take(&mut self.persons),
            OwnerKind::Person,
            used,
            &mut remap,
        );
        self.companies = sweep_kind(
            std::mem::take(&mut self.companies),
            OwnerKind::Company,
            used,
            &mut remap,
        );

        self.keys = self
            .keys
            .drain()
            .filter_map(|(key, owner_ref)| remap.apply(owner_ref).map(|r| (key, r)))
            .collect();
        self.variants.remap(&remap);

        info!(
            parcel = %self.parcel.parcel_identifier,
            removed = remap.removed.len(),
            persons = self.persons.len(),
            companies = self.companies.len(),
            "swept unused entities"
        );

        remap
    }

    pub fn get(&self, owner_ref: OwnerRef) -> Option<OwnerPayload> {
        match owner_ref.kind {
            OwnerKind::Person => self
                .persons
                .get(owner_ref.index)
                .map(|r| OwnerPayload::Person(r.value.clone())),
            OwnerKind::Company => self
                .companies
                .get(owner_ref.index)
                .map(|r| OwnerPayload::Company(r.value.clone())),
        }
    }

    pub fn person(&self, index: usize) -> Option<&Person> {
        self.persons.get(index).map(|r| &r.value)
    }

    pub fn company(&self, index: usize) -> Option<&Company> {
        self.companies.get(index).map(|r| &r.value)
    }

    /// Entity bound to a canonical key
    pub fn key_owner(&self, key: &CanonicalKey) -> Option<OwnerRef> {
        self.keys.get(key).copied()
    }

    pub fn variants(&self) -> &VariantIndex {
        &self.variants
    }

    /// All entities, persons first, each kind in index order
    pub fn entities(&self) -> Vec<StoredEntity> {
        let persons = self.persons.iter().enumerate().map(|(i, r)| {
            self.stored(OwnerRef::person(i), r.id, &r.first_seen, OwnerPayload::Person(r.value.clone()))
        });
        let companies = self.companies.iter().enumerate().map(|(i, r)| {
            self.stored(OwnerRef::company(i), r.id, &r.first_seen, OwnerPayload::Company(r.value.clone()))
        });
        persons.chain(companies).collect()
    }

    pub fn person_count(&self) -> usize {
        self.persons.len()
    }

    pub fn company_count(&self) -> usize {
        self.companies.len()
    }

    pub fn len(&self) -> usize {
        self.persons.len() + self.companies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ========================================================================
    // INTERNALS
    // ========================================================================

    /// First-writer-wins: an already bound key keeps its entity
    fn bind_key(&mut self, key: CanonicalKey, owner_ref: OwnerRef) {
        if let Some(existing) = self.keys.get(&key) {
            if *existing != owner_ref {
                debug!(key = %key, %existing, rejected = %owner_ref, "canonical key already bound");
            }
            return;
        }
        self.keys.insert(key, owner_ref);
    }

    /// Register the new spelling's variants and backfill a middle name.
    fn absorb(&mut self, owner_ref: OwnerRef, payload: &OwnerPayload) -> bool {
        let backfilled = self.backfill(owner_ref, payload);
        // Register after backfill so the fuller forms point at the same entity
        self.variants.register_variants(owner_ref, payload);
        backfilled
    }

    fn backfill(&mut self, owner_ref: OwnerRef, payload: &OwnerPayload) -> bool {
        if !self.backfill_middle_names || owner_ref.kind != OwnerKind::Person {
            return false;
        }
        let Some(middle) = payload.as_person().and_then(|p| p.middle_name.as_deref()) else {
            return false;
        };
        let Some(record) = self.persons.get_mut(owner_ref.index) else {
            return false;
        };

        let filled = record.value.backfill_middle(middle);
        if filled {
            debug!(%owner_ref, middle, "backfilled middle name");
        }
        filled
    }

    /// A variant hit on a person whose middle initial disagrees is not a match
    fn compatible(&self, owner_ref: OwnerRef, payload: &OwnerPayload) -> bool {
        match (owner_ref.kind, payload.as_person()) {
            (OwnerKind::Person, Some(candidate)) => self
                .persons
                .get(owner_ref.index)
                .map_or(false, |r| !r.value.middle_conflicts(candidate)),
            _ => true,
        }
    }

    fn append(&mut self, raw: &str, payload: &OwnerPayload, key: Option<&CanonicalKey>) -> OwnerRef {
        let seed = format!(
            "{}|{}|{}|{}",
            self.parcel.parcel_identifier,
            payload.kind().as_str(),
            self.created,
            key.map_or_else(|| payload.display_name(), |k| k.to_string())
        );
        let id = Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes());
        self.created += 1;

        match payload {
            OwnerPayload::Person(person) => {
                self.persons.push(EntityRecord {
                    id,
                    first_seen: raw.to_string(),
                    value: person.clone(),
                });
                OwnerRef::person(self.persons.len() - 1)
            }
            OwnerPayload::Company(company) => {
                self.companies.push(EntityRecord {
                    id,
                    first_seen: raw.to_string(),
                    value: company.clone(),
                });
                OwnerRef::company(self.companies.len() - 1)
            }
        }
    }

    fn stored(&self, owner_ref: OwnerRef, id: Uuid, first_seen: &str, payload: OwnerPayload) -> StoredEntity {
        StoredEntity {
            owner_ref,
            id: id.to_string(),
            source_parcel: self.parcel.parcel_identifier.clone(),
            first_seen: first_seen.to_string(),
            payload,
        }
    }
}

fn sweep_kind<T>(
    records: Vec<EntityRecord<T>>,
    kind: OwnerKind,
    used: &BTreeSet<OwnerRef>,
    remap: &mut RefRemap,
) -> Vec<EntityRecord<T>> {
    let mut kept = Vec::with_capacity(records.len());

    for (index, record) in records.into_iter().enumerate() {
        let old = OwnerRef { kind, index };
        if used.contains(&old) {
            remap.map.insert(old, OwnerRef { kind, index: kept.len() });
            kept.push(record);
        } else {
            remap.removed.push(old);
        }
    }

    kept
}

fn display_key(key: &Option<CanonicalKey>) -> String {
    key.as_ref().map_or_else(|| "-".to_string(), |k| k.to_string())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{NameContext, OwnerClassifier};

    fn store() -> EntityStore {
        EntityStore::new(ParcelContext::new("P-100"), CanonicalKeyBuilder::default())
    }

    fn resolve(store: &mut EntityStore, raw: &str) -> Resolution {
        let payload = OwnerClassifier::default()
            .classify(raw, NameContext::Sale)
            .unwrap_or_else(|| panic!("{raw} should classify"));
        store.resolve(raw, &payload)
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut store = store();

        let first = resolve(&mut store, "John Smith");
        let second = resolve(&mut store, "John Smith");

        assert_eq!(first.outcome, ResolutionOutcome::Created);
        assert_eq!(second.outcome, ResolutionOutcome::KeyMatch);
        assert_eq!(first.owner_ref, second.owner_ref);
        assert_eq!(store.person_count(), 1);
    }

    #[test]
    fn test_order_insensitive_dedup() {
        let mut store = store();

        let a = resolve(&mut store, "John Smith");
        let b = resolve(&mut store, "Smith John");

        assert_eq!(a.owner_ref, b.owner_ref);
        assert_eq!(store.person_count(), 1);
    }

    #[test]
    fn test_variant_match_and_backfill() {
        let mut store = store();

        let short = resolve(&mut store, "John Smith");
        let full = resolve(&mut store, "John Alan Smith");

        assert_eq!(full.outcome, ResolutionOutcome::VariantMatch);
        assert_eq!(full.owner_ref, short.owner_ref);
        assert!(full.backfilled);
        assert_eq!(store.person(0).unwrap().middle_name.as_deref(), Some("Alan"));

        // The fuller key is now bound too
        let again = resolve(&mut store, "Alan John Smith");
        assert_eq!(again.outcome, ResolutionOutcome::KeyMatch);
        assert_eq!(again.owner_ref, short.owner_ref);
    }

    #[test]
    fn test_backfill_happens_at_most_once() {
        let mut store = store();

        resolve(&mut store, "John Smith");
        assert!(resolve(&mut store, "John Alan Smith").backfilled);
        let other = resolve(&mut store, "John A Smith");

        assert!(!other.backfilled);
        assert_eq!(store.person(0).unwrap().middle_name.as_deref(), Some("Alan"));
    }

    #[test]
    fn test_backfill_can_be_disabled() {
        let mut store = store().with_backfill(false);

        resolve(&mut store, "John Smith");
        let full = resolve(&mut store, "John Alan Smith");

        assert!(!full.backfilled);
        assert_eq!(store.person(0).unwrap().middle_name, None);
    }

    #[test]
    fn test_conflicting_middle_initial_creates_new_entity() {
        let mut store = store();

        let alan = resolve(&mut store, "John Alan Smith");
        let bert = resolve(&mut store, "John Bert Smith");

        assert_ne!(alan.owner_ref, bert.owner_ref);
        assert_eq!(store.person_count(), 2);
    }

    #[test]
    fn test_trustee_spelling_matches_person_by_key() {
        let mut store = store();

        let person = resolve(&mut store, "John A Smith");
        let trustee = resolve(&mut store, "Smith John A Trustee");

        assert_eq!(trustee.outcome, ResolutionOutcome::KeyMatch);
        assert_eq!(trustee.owner_ref, person.owner_ref);
        assert_eq!(store.company_count(), 0);
    }

    #[test]
    fn test_first_writer_wins_on_key_collision() {
        let mut store = store();

        // "A" is an article, so both reduce to JOHN|SMITH
        let first = resolve(&mut store, "John Smith");
        let collided = resolve(&mut store, "John A Smith");

        assert_eq!(collided.owner_ref, first.owner_ref);
        assert_eq!(
            store.key_owner(&CanonicalKeyBuilder::default().build_key("SMITH JOHN").unwrap()),
            Some(first.owner_ref)
        );
    }

    #[test]
    fn test_companies_and_persons_indexed_separately() {
        let mut store = store();

        let person = resolve(&mut store, "Jane Doe");
        let company = resolve(&mut store, "Acme Holdings LLC");

        assert_eq!(person.owner_ref, OwnerRef::person(0));
        assert_eq!(company.owner_ref, OwnerRef::company(0));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_sweep_compacts_and_remaps() {
        let mut store = store();

        let a = resolve(&mut store, "Jane Doe").owner_ref;
        let orphan = resolve(&mut store, "Richard Roe").owner_ref;
        let c = resolve(&mut store, "Mary Major").owner_ref;

        let used: BTreeSet<OwnerRef> = [a, c].into_iter().collect();
        let remap = store.sweep_unused(&used);

        assert_eq!(store.person_count(), 2);
        assert_eq!(remap.apply(a), Some(OwnerRef::person(0)));
        assert_eq!(remap.apply(c), Some(OwnerRef::person(1)));
        assert_eq!(remap.apply(orphan), None);
        assert_eq!(remap.removed(), &[orphan]);

        // Bindings follow the survivors
        assert_eq!(store.variants().lookup("MARY MAJOR"), Some(OwnerRef::person(1)));
        assert_eq!(store.variants().lookup("RICHARD ROE"), None);
    }

    #[test]
    fn test_entities_are_stamped_deterministically() {
        let build = || {
            let mut store = store();
            resolve(&mut store, "Jane Doe");
            resolve(&mut store, "Acme Holdings LLC");
            store.entities()
        };

        let first = build();
        let second = build();

        assert_eq!(first, second);
        assert_eq!(first[0].source_parcel, "P-100");
        assert_eq!(first[0].first_seen, "Jane Doe");
        assert_eq!(first[1].owner_ref, OwnerRef::company(0));
        assert_ne!(first[0].id, first[1].id);
    }
}
