// 🔀 Variant Index - Surface spellings → already-resolved owner
//
// Problem solved:
// - "JOHN SMITH" seen after "JOHN ALAN SMITH" → same person (first-last form)
// - "SMITH JOHN A" seen after "John Alan Smith" → same person (last-first-initial form)
//
// Registration is first-writer-wins: a form already bound to an owner is
// never rebound, even if a different owner generates the same form later.

use std::collections::HashMap;

use crate::canonical::surface_form;
use crate::entities::{Company, OwnerPayload, OwnerRef, Person};
use crate::store::RefRemap;

#[derive(Debug, Clone, Default)]
pub struct VariantIndex {
    forms: HashMap<String, OwnerRef>,
}

impl VariantIndex {
    pub fn new() -> Self {
        VariantIndex::default()
    }

    /// Bind one surface form. Returns true if this call created the binding.
    pub fn register(&mut self, owner_ref: OwnerRef, raw_form: &str) -> bool {
        let form = surface_form(raw_form);
        if form.is_empty() || self.forms.contains_key(&form) {
            return false;
        }
        self.forms.insert(form, owner_ref);
        true
    }

    /// Bind every generated variant of `payload`. Returns how many were new.
    pub fn register_variants(&mut self, owner_ref: OwnerRef, payload: &OwnerPayload) -> usize {
        variants_of(payload)
            .iter()
            .filter(|form| self.register(owner_ref, form))
            .count()
    }

    /// Exact (case/whitespace-insensitive) lookup of a raw spelling.
    pub fn lookup(&self, raw: &str) -> Option<OwnerRef> {
        self.forms.get(&surface_form(raw)).copied()
    }

    /// Look up a candidate by its full-name forms, in probing order.
    ///
    /// Every hit is returned (in order) so the caller can skip hits that
    /// fail a compatibility check. Forms that lack either the first or the
    /// last name are never probed.
    pub fn probe(&self, raw: &str, payload: &OwnerPayload) -> Vec<(String, OwnerRef)> {
        let mut forms = vec![surface_form(raw)];
        forms.extend(probe_forms_of(payload));

        let mut seen = Vec::new();
        let mut hits = Vec::new();
        for form in forms {
            if form.is_empty() || seen.contains(&form) {
                continue;
            }
            if let Some(owner_ref) = self.forms.get(&form) {
                hits.push((form.clone(), *owner_ref));
            }
            seen.push(form);
        }
        hits
    }

    /// Drop forms that point at swept entities and rewrite the rest.
    pub(crate) fn remap(&mut self, remap: &RefRemap) {
        self.forms = self
            .forms
            .drain()
            .filter_map(|(form, owner_ref)| remap.apply(owner_ref).map(|r| (form, r)))
            .collect();
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

// ============================================================================
// VARIANT GENERATION
// ============================================================================

/// Every surface form registered for an owner, normalized, without repeats.
pub fn variants_of(payload: &OwnerPayload) -> Vec<String> {
    match payload {
        OwnerPayload::Person(person) => person_variants(person),
        OwnerPayload::Company(company) => company_variants(company),
    }
}

/// Person forms:
/// first last, last first, first middle last, first middle-initial last,
/// last first middle, last first middle-initial, first, last, first middle
pub fn person_variants(person: &Person) -> Vec<String> {
    let first = person.first_name.as_str();
    let last = person.last_name.as_str();

    let mut forms = vec![
        format!("{first} {last}"),
        format!("{last} {first}"),
    ];

    if let Some(middle) = person.middle_name.as_deref() {
        let initial = initial_of(middle);
        forms.push(format!("{first} {middle} {last}"));
        forms.push(format!("{first} {initial} {last}"));
        forms.push(format!("{last} {first} {middle}"));
        forms.push(format!("{last} {first} {initial}"));
    }

    forms.push(first.to_string());
    forms.push(last.to_string());

    if let Some(middle) = person.middle_name.as_deref() {
        forms.push(format!("{first} {middle}"));
    }

    dedup_forms(forms)
}

pub fn company_variants(company: &Company) -> Vec<String> {
    dedup_forms(vec![company.name.clone()])
}

/// Forms used when probing the index on behalf of a new candidate:
/// only those carrying both first and last name, fullest first.
fn probe_forms_of(payload: &OwnerPayload) -> Vec<String> {
    let person = match payload {
        OwnerPayload::Person(person) => person,
        OwnerPayload::Company(company) => return company_variants(company),
    };

    let first = person.first_name.as_str();
    let last = person.last_name.as_str();
    let mut forms = Vec::new();

    if let Some(middle) = person.middle_name.as_deref() {
        let initial = initial_of(middle);
        forms.push(format!("{first} {middle} {last}"));
        forms.push(format!("{last} {first} {middle}"));
        forms.push(format!("{first} {initial} {last}"));
        forms.push(format!("{last} {first} {initial}"));
    }
    forms.push(format!("{first} {last}"));
    forms.push(format!("{last} {first}"));

    dedup_forms(forms)
}

fn initial_of(middle: &str) -> String {
    middle
        .chars()
        .find(|c| c.is_alphanumeric())
        .map(|c| c.to_uppercase().to_string())
        .unwrap_or_default()
}

fn dedup_forms(forms: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(forms.len());
    for form in forms.iter().map(|f| surface_form(f)) {
        if !form.is_empty() && !out.contains(&form) {
            out.push(form);
        }
    }
    out
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn john_alan_smith() -> OwnerPayload {
        OwnerPayload::Person(Person::new("John", "Smith").with_middle(Some("Alan".to_string())))
    }

    #[test]
    fn test_person_variants() {
        let forms = variants_of(&john_alan_smith());

        assert_eq!(
            forms,
            vec![
                "JOHN SMITH",
                "SMITH JOHN",
                "JOHN ALAN SMITH",
                "JOHN A SMITH",
                "SMITH JOHN ALAN",
                "SMITH JOHN A",
                "JOHN",
                "SMITH",
                "JOHN ALAN",
            ]
        );
    }

    #[test]
    fn test_person_variants_without_middle() {
        let forms = variants_of(&OwnerPayload::Person(Person::new("Jane", "Doe")));
        assert_eq!(forms, vec!["JANE DOE", "DOE JANE", "JANE", "DOE"]);
    }

    #[test]
    fn test_company_single_variant() {
        let forms = variants_of(&OwnerPayload::Company(Company::new("Smith Family LLC")));
        assert_eq!(forms, vec!["SMITH FAMILY LLC"]);
    }

    #[test]
    fn test_lookup_is_case_and_whitespace_insensitive() {
        let mut index = VariantIndex::new();
        index.register_variants(OwnerRef::person(0), &john_alan_smith());

        assert_eq!(index.lookup("smith,  john a."), Some(OwnerRef::person(0)));
        assert_eq!(index.lookup("John Alan Smith"), Some(OwnerRef::person(0)));
        assert_eq!(index.lookup("John Smith Trustee"), None);
    }

    #[test]
    fn test_first_writer_wins() {
        let mut index = VariantIndex::new();

        assert_eq!(index.register_variants(OwnerRef::person(0), &john_alan_smith()), 9);

        // Different person sharing first name: "JOHN" stays bound to person 0
        let john_doe = OwnerPayload::Person(Person::new("John", "Doe"));
        assert_eq!(index.register_variants(OwnerRef::person(1), &john_doe), 3);

        assert_eq!(index.lookup("JOHN"), Some(OwnerRef::person(0)));
        assert_eq!(index.lookup("DOE JOHN"), Some(OwnerRef::person(1)));
    }

    #[test]
    fn test_probe_never_uses_single_name_forms() {
        let mut index = VariantIndex::new();
        index.register_variants(OwnerRef::person(0), &john_alan_smith());

        let jane = OwnerPayload::Person(Person::new("Jane", "Smith"));
        assert!(index.probe("JANE SMITH", &jane).is_empty());

        let john = OwnerPayload::Person(Person::new("John", "Smith"));
        let hits = index.probe("SMITH JOHN", &john);
        assert_eq!(hits[0], ("SMITH JOHN".to_string(), OwnerRef::person(0)));
    }
}
