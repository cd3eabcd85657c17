// ⏰ Temporal Linker - Owner snapshots by date, buyers by sale
//
// Two views of who owned a parcel:
// 1. Date buckets: ISO date (or "current") → owners of record on that date
// 2. Sales: grantor → grantee transfers in document order
//
// Each sale's buyers come from the matching date bucket when one exists
// ("current" for the most recent sale). Otherwise a fixed fallback chain
// reads the buyers off the sale records themselves:
//   own grantee → next sale's grantor → previous sale's grantor → own grantor
//
// Bucket order and sale order are both load-bearing. Earlier spellings win
// canonical-key and variant collisions.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, info};

use crate::classifier::NameContext;
use crate::entities::OwnerRef;
use crate::error::ResolveError;
use crate::resolver::{PropertyRecord, ResolvedOwner, Resolver};
use crate::store::RefRemap;

pub const CURRENT_KEY: &str = "current";

// ============================================================================
// DATE KEY
// ============================================================================

/// Key of one owner snapshot: an ISO date or the "current" owners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DateKey {
    Current,
    Date(NaiveDate),
}

impl FromStr for DateKey {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case(CURRENT_KEY) {
            return Ok(DateKey::Current);
        }
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map(DateKey::Date)
            .map_err(|_| ResolveError::InvalidDateKey {
                value: s.to_string(),
            })
    }
}

impl TryFrom<String> for DateKey {
    type Error = ResolveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DateKey> for String {
    fn from(key: DateKey) -> Self {
        key.to_string()
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateKey::Current => f.write_str(CURRENT_KEY),
            DateKey::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

// ============================================================================
// INPUT: DESCRIPTORS, SNAPSHOTS, SALES
// ============================================================================

/// One owner as it appears in a snapshot: a raw string or pre-parsed fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OwnerDescriptor {
    Raw(String),
    Structured(StructuredOwner),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StructuredOwner {
    Person {
        #[serde(default)]
        first_name: Option<String>,
        #[serde(default)]
        middle_name: Option<String>,
        #[serde(default)]
        last_name: Option<String>,
        #[serde(default)]
        prefix_name: Option<String>,
        #[serde(default)]
        suffix_name: Option<String>,
    },
    Company {
        #[serde(default)]
        name: Option<String>,
    },
}

/// Date-keyed owner snapshots in document order.
///
/// Deserializes from a JSON object; keys must be unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OwnersByDate {
    buckets: Vec<(DateKey, Vec<OwnerDescriptor>)>,
}

impl OwnersByDate {
    pub fn new() -> Self {
        OwnersByDate::default()
    }

    pub fn push(&mut self, key: DateKey, owners: Vec<OwnerDescriptor>) -> Result<(), ResolveError> {
        if self.buckets.iter().any(|(existing, _)| *existing == key) {
            return Err(ResolveError::DuplicateBucket {
                key: key.to_string(),
            });
        }
        self.buckets.push((key, owners));
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DateKey, &[OwnerDescriptor])> {
        self.buckets.iter().map(|(key, owners)| (key, owners.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl Serialize for OwnersByDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.buckets.len()))?;
        for (key, owners) in &self.buckets {
            map.serialize_entry(key, owners)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for OwnersByDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OwnersByDateVisitor;

        impl<'de> Visitor<'de> for OwnersByDateVisitor {
            type Value = OwnersByDate;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of ISO date or \"current\" to owner descriptors")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut owners = OwnersByDate::new();
                while let Some((key, descriptors)) =
                    access.next_entry::<DateKey, Vec<OwnerDescriptor>>()?
                {
                    owners.push(key, descriptors).map_err(de::Error::custom)?;
                }
                Ok(owners)
            }
        }

        deserializer.deserialize_map(OwnersByDateVisitor)
    }
}

/// One recorded transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub sale_index: usize,
    #[serde(default)]
    pub transfer_date: Option<NaiveDate>,
    #[serde(default, alias = "grantor")]
    pub grantor_raw: Option<String>,
    #[serde(default, alias = "grantee")]
    pub grantee_raw: Option<String>,
}

/// Load a sales history table (sale_index, transfer_date, grantor, grantee)
pub fn load_sales_csv(csv_path: &Path) -> Result<Vec<SaleRecord>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open sales CSV: {:?}", csv_path))?;

    let mut sales = Vec::new();
    for (row, result) in rdr.deserialize().enumerate() {
        let sale: SaleRecord =
            result.with_context(|| format!("Failed to deserialize sale on row {}", row + 1))?;
        sales.push(sale);
    }

    Ok(sales)
}

// ============================================================================
// OUTPUT
// ============================================================================

/// Where a sale's buyers were taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuyerSource {
    Snapshot { bucket: DateKey },
    OwnGrantee,
    NextGrantor,
    PreviousGrantor,
    OwnGrantor,
    #[serde(rename = "none")]
    Unresolved,
}

impl BuyerSource {
    pub fn label(&self) -> &'static str {
        match self {
            BuyerSource::Snapshot { .. } => "snapshot",
            BuyerSource::OwnGrantee => "own_grantee",
            BuyerSource::NextGrantor => "next_grantor",
            BuyerSource::PreviousGrantor => "previous_grantor",
            BuyerSource::OwnGrantor => "own_grantor",
            BuyerSource::Unresolved => "none",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleBuyerLink {
    pub sale_index: usize,
    pub buyer_refs: Vec<OwnerRef>,
    pub source: BuyerSource,
}

/// Resolved snapshots, same order as the input; serialized as a JSON object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OwnersByDateRefs {
    buckets: Vec<(DateKey, Vec<OwnerRef>)>,
}

impl OwnersByDateRefs {
    pub fn get(&self, key: &DateKey) -> Option<&[OwnerRef]> {
        self.buckets
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, refs)| refs.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DateKey, &[OwnerRef])> {
        self.buckets.iter().map(|(key, refs)| (key, refs.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    fn remap(&mut self, remap: &RefRemap) {
        for (_, refs) in &mut self.buckets {
            *refs = remap.apply_all(refs);
        }
    }
}

impl Serialize for OwnersByDateRefs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.buckets.len()))?;
        for (key, refs) in &self.buckets {
            map.serialize_entry(key, refs)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkSite {
    Bucket(DateKey),
    Sale(usize),
}

/// An ownership fraction ("1/2 INT") tied to the owner and place it was read
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnershipInterest {
    pub site: LinkSite,
    pub owner: OwnerRef,
    pub share: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkResult {
    pub owners_by_date_refs: OwnersByDateRefs,
    pub sale_buyer_links: Vec<SaleBuyerLink>,
    pub mailing_address_refs: Vec<OwnerRef>,
    pub interests: Vec<OwnershipInterest>,
    /// Entities removed by the final sweep
    pub swept: usize,
}

// ============================================================================
// TEMPORAL LINKER
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct TemporalLinker;

impl TemporalLinker {
    pub fn new() -> Self {
        TemporalLinker
    }

    /// Resolve buckets, sales and mailing owners, then sweep and remap.
    pub fn link(&self, resolver: &mut Resolver, record: &PropertyRecord) -> LinkResult {
        let mut result = LinkResult::default();

        // 1. Date buckets, document order
        for (key, descriptors) in record.owners_by_date.iter() {
            let mut refs = Vec::new();
            for descriptor in descriptors {
                let resolved = resolver.resolve_descriptor(descriptor, NameContext::Owner);
                collect(&mut refs, &mut result.interests, LinkSite::Bucket(*key), resolved);
            }
            debug!(bucket = %key, owners = refs.len(), "resolved date bucket");
            result.owners_by_date_refs.buckets.push((*key, refs));
        }

        // 2. Sales, document order
        let most_recent = most_recent_sale(&record.sales);
        for position in 0..record.sales.len() {
            let link = self.link_sale(
                resolver,
                &record.sales,
                position,
                most_recent == Some(position),
                &result.owners_by_date_refs,
                &mut result.interests,
            );
            debug!(
                sale = link.sale_index,
                source = link.source.label(),
                buyers = link.buyer_refs.len(),
                "linked sale buyers"
            );
            result.sale_buyer_links.push(link);
        }

        // 3. Mailing-address owners
        for descriptor in &record.mailing_address_owners {
            let resolved = resolver.resolve_descriptor(descriptor, NameContext::Owner);
            for owner in resolved {
                if !result.mailing_address_refs.contains(&owner.owner_ref) {
                    result.mailing_address_refs.push(owner.owner_ref);
                }
            }
        }

        // 4. Sweep everything nothing points at
        let used = used_refs(&result);
        let remap = resolver.sweep_unused(&used);
        result.swept = remap.removed().len();
        apply_remap(&mut result, &remap);

        info!(
            buckets = result.owners_by_date_refs.len(),
            sales = result.sale_buyer_links.len(),
            swept = result.swept,
            "linked owners over time"
        );

        result
    }

    fn link_sale(
        &self,
        resolver: &mut Resolver,
        sales: &[SaleRecord],
        position: usize,
        is_most_recent: bool,
        snapshots: &OwnersByDateRefs,
        interests: &mut Vec<OwnershipInterest>,
    ) -> SaleBuyerLink {
        let sale = &sales[position];

        if let Some((bucket, refs)) = snapshot_for(sale, is_most_recent, snapshots) {
            return SaleBuyerLink {
                sale_index: sale.sale_index,
                buyer_refs: refs.to_vec(),
                source: BuyerSource::Snapshot { bucket },
            };
        }

        let next = sales.get(position + 1);
        let previous = position.checked_sub(1).and_then(|p| sales.get(p));
        let chain = [
            (BuyerSource::OwnGrantee, sale.grantee_raw.as_deref()),
            (BuyerSource::NextGrantor, next.and_then(|s| s.grantor_raw.as_deref())),
            (BuyerSource::PreviousGrantor, previous.and_then(|s| s.grantor_raw.as_deref())),
            (BuyerSource::OwnGrantor, sale.grantor_raw.as_deref()),
        ];

        for (source, raw) in chain {
            let Some(raw) = raw else {
                continue;
            };
            let resolved = resolver.resolve_raw(raw, NameContext::Sale);
            if resolved.is_empty() {
                continue;
            }

            let mut buyer_refs = Vec::new();
            collect(&mut buyer_refs, interests, LinkSite::Sale(sale.sale_index), resolved);
            return SaleBuyerLink {
                sale_index: sale.sale_index,
                buyer_refs,
                source,
            };
        }

        SaleBuyerLink {
            sale_index: sale.sale_index,
            buyer_refs: Vec::new(),
            source: BuyerSource::Unresolved,
        }
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// First sale in document order carrying the latest transfer date
fn most_recent_sale(sales: &[SaleRecord]) -> Option<usize> {
    let mut best: Option<(usize, NaiveDate)> = None;
    for (position, sale) in sales.iter().enumerate() {
        let Some(date) = sale.transfer_date else {
            continue;
        };
        if best.map_or(true, |(_, best_date)| date > best_date) {
            best = Some((position, date));
        }
    }
    best.map(|(position, _)| position)
}

/// Non-empty snapshot for a sale: "current" for the most recent sale when
/// present, otherwise the bucket dated on the transfer date.
fn snapshot_for<'a>(
    sale: &SaleRecord,
    is_most_recent: bool,
    snapshots: &'a OwnersByDateRefs,
) -> Option<(DateKey, &'a [OwnerRef])> {
    let key = match (is_most_recent, snapshots.get(&DateKey::Current)) {
        (true, Some(_)) => DateKey::Current,
        _ => DateKey::Date(sale.transfer_date?),
    };

    snapshots
        .get(&key)
        .filter(|refs| !refs.is_empty())
        .map(|refs| (key, refs))
}

fn collect(
    refs: &mut Vec<OwnerRef>,
    interests: &mut Vec<OwnershipInterest>,
    site: LinkSite,
    resolved: Vec<ResolvedOwner>,
) {
    for owner in resolved {
        if let Some(share) = owner.interest {
            interests.push(OwnershipInterest {
                site,
                owner: owner.owner_ref,
                share,
            });
        }
        if !refs.contains(&owner.owner_ref) {
            refs.push(owner.owner_ref);
        }
    }
}

fn used_refs(result: &LinkResult) -> BTreeSet<OwnerRef> {
    let buckets = result.owners_by_date_refs.iter().flat_map(|(_, refs)| refs.iter());
    let sales = result.sale_buyer_links.iter().flat_map(|link| link.buyer_refs.iter());

    buckets
        .chain(sales)
        .chain(result.mailing_address_refs.iter())
        .copied()
        .collect()
}

fn apply_remap(result: &mut LinkResult, remap: &RefRemap) {
    result.owners_by_date_refs.remap(remap);
    for link in &mut result.sale_buyer_links {
        link.buyer_refs = remap.apply_all(&link.buyer_refs);
    }
    result.mailing_address_refs = remap.apply_all(&result.mailing_address_refs);
    result.interests = result
        .interests
        .drain(..)
        .filter_map(|interest| {
            remap.apply(interest.owner).map(|owner| OwnershipInterest { owner, ..interest })
        })
        .collect();
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolverConfig;
    use crate::entities::OwnerPayload;
    use crate::store::ParcelContext;
    use std::io::Write;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sale(index: usize, transfer: Option<&str>, grantor: Option<&str>, grantee: Option<&str>) -> SaleRecord {
        SaleRecord {
            sale_index: index,
            transfer_date: transfer.map(date),
            grantor_raw: grantor.map(str::to_string),
            grantee_raw: grantee.map(str::to_string),
        }
    }

    fn record(owners: serde_json::Value, sales: Vec<SaleRecord>) -> PropertyRecord {
        PropertyRecord {
            parcel_identifier: "P-200".to_string(),
            owners_by_date: serde_json::from_value(owners).unwrap(),
            sales,
            mailing_address_owners: Vec::new(),
        }
    }

    fn run(record: &PropertyRecord) -> (Resolver, LinkResult) {
        let mut resolver =
            Resolver::new(ParcelContext::new(&record.parcel_identifier), &ResolverConfig::default()).unwrap();
        let result = TemporalLinker::new().link(&mut resolver, record);
        (resolver, result)
    }

    fn person_name(resolver: &Resolver, owner_ref: OwnerRef) -> (String, String) {
        match resolver.store().get(owner_ref) {
            Some(OwnerPayload::Person(p)) => (p.first_name, p.last_name),
            other => panic!("expected person, got {:?}", other),
        }
    }

    #[test]
    fn test_date_key_parsing() {
        assert_eq!("current".parse::<DateKey>(), Ok(DateKey::Current));
        assert_eq!("CURRENT".parse::<DateKey>(), Ok(DateKey::Current));
        assert_eq!("2020-03-01".parse::<DateKey>(), Ok(DateKey::Date(date("2020-03-01"))));
        assert!(matches!(
            "03/01/2020".parse::<DateKey>(),
            Err(ResolveError::InvalidDateKey { .. })
        ));
        assert_eq!(DateKey::Date(date("2020-03-01")).to_string(), "2020-03-01");
    }

    #[test]
    fn test_owners_by_date_keeps_document_order() {
        let owners: OwnersByDate = serde_json::from_str(
            r#"{"current": ["SMITH JOHN"], "2015-06-01": ["DOE JANE"], "2010-01-01": []}"#,
        )
        .unwrap();

        let keys: Vec<String> = owners.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["current", "2015-06-01", "2010-01-01"]);
    }

    #[test]
    fn test_owners_by_date_rejects_duplicates_and_bad_keys() {
        let dup = serde_json::from_str::<OwnersByDate>(r#"{"current": [], "current": []}"#);
        assert!(dup.unwrap_err().to_string().contains("more than once"));

        let bad = serde_json::from_str::<OwnersByDate>(r#"{"last year": []}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_structured_descriptor_deserialization() {
        let descriptors: Vec<OwnerDescriptor> = serde_json::from_str(
            r#"["SMITH JOHN", {"type": "person", "first_name": "Jane", "last_name": "Doe"}, {"type": "company", "name": "Acme LLC"}]"#,
        )
        .unwrap();

        assert_eq!(descriptors[0], OwnerDescriptor::Raw("SMITH JOHN".to_string()));
        assert!(matches!(
            &descriptors[1],
            OwnerDescriptor::Structured(StructuredOwner::Person { first_name: Some(f), .. }) if f == "Jane"
        ));
        assert!(matches!(
            &descriptors[2],
            OwnerDescriptor::Structured(StructuredOwner::Company { name: Some(_) })
        ));
    }

    #[test]
    fn test_most_recent_sale() {
        let sales = vec![
            sale(0, Some("2010-01-01"), None, None),
            sale(1, None, None, None),
            sale(2, Some("2018-05-05"), None, None),
            sale(3, Some("2018-05-05"), None, None),
        ];
        assert_eq!(most_recent_sale(&sales), Some(2));
        assert_eq!(most_recent_sale(&[sale(0, None, None, None)]), None);
    }

    #[test]
    fn test_buckets_deduplicate_and_keep_order() {
        let record = record(
            serde_json::json!({"2019-01-01": ["SMITH JOHN & DOE JANE", "JOHN SMITH", "NONE"]}),
            Vec::new(),
        );
        let (resolver, result) = run(&record);

        let refs = result
            .owners_by_date_refs
            .get(&DateKey::Date(date("2019-01-01")))
            .unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(person_name(&resolver, refs[0]), ("John".to_string(), "Smith".to_string()));
        assert_eq!(person_name(&resolver, refs[1]), ("Jane".to_string(), "Doe".to_string()));
    }

    #[test]
    fn test_sale_uses_dated_snapshot() {
        let record = record(
            serde_json::json!({"2015-06-01": ["DOE JANE"]}),
            vec![sale(0, Some("2015-06-01"), Some("Roe, Richard"), Some("Someone Else"))],
        );
        let (_, result) = run(&record);

        let link = &result.sale_buyer_links[0];
        assert_eq!(
            link.source,
            BuyerSource::Snapshot {
                bucket: DateKey::Date(date("2015-06-01"))
            }
        );
        assert_eq!(link.buyer_refs, vec![OwnerRef::person(0)]);
    }

    #[test]
    fn test_most_recent_sale_uses_current_bucket() {
        let record = record(
            serde_json::json!({"current": ["SMITH JOHN"], "2015-06-01": ["DOE JANE"]}),
            vec![
                sale(0, Some("2010-01-01"), None, Some("Nobody Known")),
                sale(1, Some("2015-06-01"), None, None),
            ],
        );
        let (resolver, result) = run(&record);

        let link = &result.sale_buyer_links[1];
        assert_eq!(link.source, BuyerSource::Snapshot { bucket: DateKey::Current });
        assert_eq!(
            person_name(&resolver, link.buyer_refs[0]),
            ("John".to_string(), "Smith".to_string())
        );
    }

    #[test]
    fn test_fallback_to_next_sale_grantor() {
        let record = record(
            serde_json::json!({}),
            vec![
                sale(0, Some("2001-01-01"), None, None),
                sale(1, Some("2005-01-01"), Some("Doe, John"), None),
            ],
        );
        let (resolver, result) = run(&record);

        let link = &result.sale_buyer_links[0];
        assert_eq!(link.source, BuyerSource::NextGrantor);
        assert_eq!(link.buyer_refs.len(), 1);
        assert_eq!(
            person_name(&resolver, link.buyer_refs[0]),
            ("John".to_string(), "Doe".to_string())
        );
    }

    #[test]
    fn test_fallback_chain_order() {
        let record = record(
            serde_json::json!({}),
            vec![
                sale(0, None, Some("Roe, Richard"), None),
                sale(1, None, Some("###"), Some("Major, Mary")),
                sale(2, None, Some("Doe, Jane"), None),
                sale(3, None, None, None),
            ],
        );
        let (resolver, result) = run(&record);

        let sources: Vec<&str> = result.sale_buyer_links.iter().map(|l| l.source.label()).collect();
        // sale 1's grantor is garbage, so neighbours skip past it
        assert_eq!(
            sources,
            vec!["own_grantor", "own_grantee", "own_grantor", "previous_grantor"]
        );
        assert_eq!(resolver.invalid_owners().len(), 1);
    }

    #[test]
    fn test_empty_snapshot_falls_back() {
        let record = record(
            serde_json::json!({"2015-06-01": ["NONE"]}),
            vec![sale(0, Some("2015-06-01"), None, Some("Doe, Jane"))],
        );
        let (_, result) = run(&record);

        assert_eq!(result.sale_buyer_links[0].source, BuyerSource::OwnGrantee);
    }

    #[test]
    fn test_unresolvable_sale_has_no_buyers() {
        let record = record(serde_json::json!({}), vec![sale(7, None, None, Some("###"))]);
        let (resolver, result) = run(&record);

        let link = &result.sale_buyer_links[0];
        assert_eq!(link.sale_index, 7);
        assert_eq!(link.source, BuyerSource::Unresolved);
        assert!(link.buyer_refs.is_empty());
        assert_eq!(resolver.invalid_owners().len(), 1);
    }

    #[test]
    fn test_interests_are_attached_to_site() {
        let record = record(
            serde_json::json!({"current": ["SMITH JOHN 1/2 INT & DOE JANE 1/2 INT"]}),
            Vec::new(),
        );
        let (_, result) = run(&record);

        assert_eq!(result.interests.len(), 2);
        assert_eq!(result.interests[0].site, LinkSite::Bucket(DateKey::Current));
        assert_eq!(result.interests[0].share, "1/2 INT");
        assert_eq!(result.interests[1].owner, OwnerRef::person(1));
    }

    #[test]
    fn test_load_sales_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sale_index,transfer_date,grantor,grantee").unwrap();
        writeln!(file, "0,2001-02-03,\"Roe, Richard\",\"Doe, Jane\"").unwrap();
        writeln!(file, "1,,,").unwrap();

        let sales = load_sales_csv(file.path()).unwrap();

        assert_eq!(sales.len(), 2);
        assert_eq!(sales[0].transfer_date, Some(date("2001-02-03")));
        assert_eq!(sales[0].grantor_raw.as_deref(), Some("Roe, Richard"));
        assert_eq!(sales[1].transfer_date, None);
        assert_eq!(sales[1].grantee_raw, None);
    }

    #[test]
    fn test_load_sales_csv_missing_file() {
        let err = load_sales_csv(Path::new("/nonexistent/sales.csv")).unwrap_err();
        assert!(err.to_string().contains("Failed to open sales CSV"));
    }
}
