// 🧭 Owner Classifier - Person or Company, and the parts of a person's name
//
// Rule order is fixed and deterministic:
// 1. Override rules (configured)
// 2. Company signals: entity keyword → leading numeric token → any digit
// 3. Person parsing: "LAST, FIRST MIDDLE" → assessor "LAST FIRST MIDDLE" → natural "FIRST MIDDLE LAST"
//
// Ownership fractions ("1/2 INT", "50/50", "25%") are lifted out of the
// name before any of this runs and attached to the owner they follow.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::canonical::tokenize;
use crate::config::ResolverConfig;
use crate::entities::{Company, OwnerKind, OwnerPayload, Person};
use crate::error::ResolveError;
use crate::normalizer::{normalize, strip_qualifier_phrases, NameNormalizer};
use crate::rules::OverrideRules;
use crate::vocabulary::Vocabulary;

lazy_static! {
    static ref OWNERSHIP_INTEREST: Regex = Regex::new(
        r"(?i)\b\d+(?:\.\d+)?\s*(?:/\s*\d+(?:\.\d+)?|%)(?:\s+(?:UND(?:IVIDED)?\s+)?INT(?:EREST)?\b)?"
    )
    .expect("ownership interest regex");
}

// ============================================================================
// TYPES
// ============================================================================

/// Where a name came from. Decides the word-order convention for
/// fully upper-case names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameContext {
    /// Owner-of-record fields (date buckets, mailing address)
    Owner,
    /// Grantor/grantee fields on a sale
    Sale,
}

/// Which company signal fired
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "signal", content = "value", rename_all = "snake_case")]
pub enum CompanySignal {
    OverrideRule(String),
    Keyword(String),
    LeadingNumeric,
    ContainsDigit,
}

/// One successfully classified candidate
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedOwner {
    /// Candidate text the payload was parsed from (fractions removed)
    pub raw: String,
    pub payload: OwnerPayload,
    /// Ownership share annotation, e.g. "1/2 INT"
    pub interest: Option<String>,
}

impl ClassifiedOwner {
    fn add_interest(&mut self, interest: &str) {
        self.interest = Some(match self.interest.take() {
            Some(existing) => format!("{existing}, {interest}"),
            None => interest.to_string(),
        });
    }
}

/// Result of classifying every candidate in one compound owner string
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateGroup {
    pub owners: Vec<ClassifiedOwner>,
    /// Candidates that could not be classified
    pub rejected: Vec<String>,
}

// ============================================================================
// OWNER CLASSIFIER
// ============================================================================

#[derive(Debug, Clone)]
pub struct OwnerClassifier {
    normalizer: NameNormalizer,
    vocabulary: Arc<Vocabulary>,
    rules: OverrideRules,
    assessor_order_for_owners: bool,
    assessor_order_for_sales: bool,
}

impl OwnerClassifier {
    pub fn new(vocabulary: Arc<Vocabulary>, rules: OverrideRules) -> Self {
        let defaults = ResolverConfig::default();
        OwnerClassifier {
            normalizer: NameNormalizer::new(Arc::clone(&vocabulary)),
            vocabulary,
            rules,
            assessor_order_for_owners: defaults.assessor_order_for_owners,
            assessor_order_for_sales: defaults.assessor_order_for_sales,
        }
    }

    pub fn from_config(config: &ResolverConfig, vocabulary: Arc<Vocabulary>) -> Result<Self, ResolveError> {
        let mut classifier = OwnerClassifier::new(vocabulary, config.override_rules()?);
        classifier.assessor_order_for_owners = config.assessor_order_for_owners;
        classifier.assessor_order_for_sales = config.assessor_order_for_sales;
        Ok(classifier)
    }

    pub fn normalizer(&self) -> &NameNormalizer {
        &self.normalizer
    }

    /// Classify a single candidate. `None` means unclassifiable.
    pub fn classify(&self, candidate: &str, context: NameContext) -> Option<OwnerPayload> {
        let cleaned = clean_candidate(candidate);
        if cleaned.is_empty() || self.vocabulary.is_sentinel(&cleaned) {
            return None;
        }
        if self.is_stop_words_only(&cleaned) {
            debug!(candidate = %cleaned, "no name tokens besides stop words");
            return None;
        }

        if let Some(signal) = self.company_signal(&cleaned) {
            debug!(candidate = %cleaned, ?signal, "classified as company");
            return Some(OwnerPayload::Company(Company::new(&cleaned)));
        }

        self.parse_person(&cleaned, context).map(OwnerPayload::Person)
    }

    /// The company signal that fires for `candidate`, if any.
    ///
    /// An override rule forcing `person` suppresses every other signal.
    pub fn company_signal(&self, candidate: &str) -> Option<CompanySignal> {
        let upper = normalize(candidate).to_uppercase();

        if let Some(rule) = self.rules.matching(&upper) {
            debug!(candidate = %upper, rule = %rule.id, kind = ?rule.kind, "override rule: {}", rule.label());
            return match rule.kind {
                OwnerKind::Company => Some(CompanySignal::OverrideRule(rule.id.clone())),
                OwnerKind::Person => None,
            };
        }

        let tokens = tokenize(&upper);
        if let Some(keyword) = self.vocabulary.company_keyword(&tokens) {
            return Some(CompanySignal::Keyword(keyword.to_string()));
        }
        if tokens.first().is_some_and(|t| t.chars().all(|c| c.is_ascii_digit())) {
            return Some(CompanySignal::LeadingNumeric);
        }
        if upper.chars().any(|c| c.is_ascii_digit()) {
            return Some(CompanySignal::ContainsDigit);
        }

        None
    }

    /// Split, strip fractions, classify, and share surnames across one
    /// compound owner string ("SMITH JOHN & JANE 1/2 INT").
    pub fn classify_group(&self, raw: &str, context: NameContext) -> CandidateGroup {
        let mut pieces: Vec<(String, Vec<String>)> = self
            .normalizer
            .split(raw)
            .iter()
            .map(|candidate| extract_interests(candidate))
            .collect();

        let mut parsed: Vec<Option<OwnerPayload>> = pieces
            .iter()
            .map(|(name, _)| {
                if name.is_empty() {
                    None
                } else {
                    self.classify(name, context)
                }
            })
            .collect();

        let donor = parsed
            .iter()
            .position(|payload| payload.as_ref().is_some_and(|p| p.as_person().is_some()));

        // "JOHN & JANE SMITH": a donor after the lone given names reads FIRST ... LAST
        if let Some(d) = donor {
            let trails_lone_names = (0..d).any(|i| parsed[i].is_none() && self.can_borrow_surname(&pieces[i].0));
            if trails_lone_names && !pieces[d].0.contains(',') {
                if let Some(person) = self.parse_person_in_order(&pieces[d].0, false) {
                    parsed[d] = Some(OwnerPayload::Person(person));
                }
            }
        }

        // "SMITH JOHN & JANE": the lone given name borrows the group's surname
        let donor_last = donor
            .and_then(|d| parsed[d].as_ref())
            .and_then(|payload| payload.as_person().map(|p| p.last_name.clone()));

        if let Some(last) = donor_last {
            for (i, (name, _)) in pieces.iter_mut().enumerate() {
                if parsed[i].is_some() || !self.can_borrow_surname(name) {
                    continue;
                }
                let borrowed = format!("{}, {}", last.to_uppercase(), name);
                if let Some(person) = self.parse_person(&borrowed, context) {
                    debug!(candidate = %name, surname = %last, "borrowed surname within group");
                    parsed[i] = Some(OwnerPayload::Person(person));
                    *name = borrowed;
                }
            }
        }

        let mut group = CandidateGroup::default();
        for ((name, interests), payload) in pieces.into_iter().zip(parsed) {
            let interest = (!interests.is_empty()).then(|| interests.join(", "));

            match payload {
                Some(payload) => group.owners.push(ClassifiedOwner {
                    raw: name,
                    payload,
                    interest,
                }),
                None => {
                    if !name.is_empty() {
                        group.rejected.push(name);
                    }
                    if let Some(interest) = interest {
                        match group.owners.last_mut() {
                            Some(previous) => previous.add_interest(&interest),
                            None => debug!(%interest, "ownership fraction with no preceding owner discarded"),
                        }
                    }
                }
            }
        }

        group
    }

    fn assessor_order(&self, context: NameContext) -> bool {
        match context {
            NameContext::Owner => self.assessor_order_for_owners,
            NameContext::Sale => self.assessor_order_for_sales,
        }
    }

    fn is_stop_words_only(&self, cleaned: &str) -> bool {
        tokenize(cleaned).iter().all(|t| self.vocabulary.is_stop_word(t))
    }

    fn can_borrow_surname(&self, name: &str) -> bool {
        is_lone_given_name(name) && !self.is_stop_words_only(name)
    }

    fn parse_person(&self, cleaned: &str, context: NameContext) -> Option<Person> {
        let assessor = self.assessor_order(context) && is_fully_upper(cleaned);
        self.parse_person_in_order(cleaned, assessor)
    }

    /// `assessor` reads comma-less names as `LAST FIRST MIDDLE`.
    fn parse_person_in_order(&self, cleaned: &str, assessor: bool) -> Option<Person> {
        if let Some((before, after)) = cleaned.split_once(',') {
            let last_part = person_tokens(before);
            let rest = person_tokens(after);

            if !last_part.names.is_empty() && !rest.names.is_empty() {
                return Some(build_person(
                    &rest.names[0],
                    &rest.names[1..],
                    &last_part.names,
                    rest.prefix.or(last_part.prefix),
                    rest.suffix.or(last_part.suffix),
                ));
            }

            // "SMITH JOHN, JR": only honorifics after the comma
            return person_from_tokens(person_tokens(&format!("{before} {after}")), assessor);
        }

        person_from_tokens(person_tokens(cleaned), assessor)
    }
}

impl Default for OwnerClassifier {
    fn default() -> Self {
        Self::new(Arc::new(Vocabulary::standard()), OverrideRules::new())
    }
}

// ============================================================================
// OWNERSHIP INTERESTS
// ============================================================================

/// Split "SMITH JOHN 1/2 INT" into ("SMITH JOHN", ["1/2 INT"]).
pub fn extract_interests(candidate: &str) -> (String, Vec<String>) {
    let interests: Vec<String> = OWNERSHIP_INTEREST
        .find_iter(candidate)
        .map(|m| normalize(m.as_str()).to_uppercase())
        .collect();

    if interests.is_empty() {
        return (clean_candidate(candidate), interests);
    }

    let remainder = OWNERSHIP_INTEREST.replace_all(candidate, " ");
    (clean_candidate(&remainder), interests)
}

// ============================================================================
// PERSON PARSING HELPERS
// ============================================================================

#[derive(Debug, Default)]
struct PersonTokens {
    names: Vec<String>,
    prefix: Option<&'static str>,
    suffix: Option<&'static str>,
}

/// Upper-cased name tokens with honorifics peeled off and noise dropped.
fn person_tokens(segment: &str) -> PersonTokens {
    let mut tokens = PersonTokens::default();
    let stripped = strip_qualifier_phrases(segment);

    for word in stripped.split_whitespace() {
        let token = word
            .chars()
            .filter(|c| *c != '.')
            .collect::<String>()
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_uppercase();

        if token.is_empty() || Vocabulary::is_person_qualifier(&token) {
            continue;
        }
        if tokens.prefix.is_none() {
            if let Some(prefix) = Vocabulary::prefix(&token) {
                tokens.prefix = Some(prefix);
                continue;
            }
        }
        if tokens.suffix.is_none() {
            if let Some(suffix) = Vocabulary::suffix(&token) {
                tokens.suffix = Some(suffix);
                continue;
            }
        }
        // Numeric and mixed tokens are annotations, not names
        if is_name_token(&token) {
            tokens.names.push(token);
        }
    }

    tokens
}

fn person_from_tokens(tokens: PersonTokens, assessor: bool) -> Option<Person> {
    let names = &tokens.names;
    let n = names.len();
    if n < 2 {
        return None;
    }

    let person = if assessor {
        // LAST FIRST [MIDDLE...], "VAN DYKE JOHN" keeps the particle
        let last_len = if n >= 3 && Vocabulary::is_surname_particle(&names[0]) { 2 } else { 1 };
        build_person(
            &names[last_len],
            &names[last_len + 1..],
            &names[..last_len],
            tokens.prefix,
            tokens.suffix,
        )
    } else {
        // FIRST [MIDDLE...] LAST
        let last_len = if n >= 3 && Vocabulary::is_surname_particle(&names[n - 2]) { 2 } else { 1 };
        build_person(
            &names[0],
            &names[1..n - last_len],
            &names[n - last_len..],
            tokens.prefix,
            tokens.suffix,
        )
    };

    Some(person)
}

fn build_person(
    first: &str,
    middles: &[String],
    last: &[String],
    prefix: Option<&'static str>,
    suffix: Option<&'static str>,
) -> Person {
    let middle = (!middles.is_empty()).then(|| {
        middles
            .iter()
            .map(|m| title_case(m))
            .collect::<Vec<_>>()
            .join(" ")
    });
    let last = last.iter().map(|l| title_case(l)).collect::<Vec<_>>().join(" ");

    Person::new(title_case(first), last)
        .with_middle(middle)
        .with_prefix(prefix.map(str::to_string))
        .with_suffix(suffix.map(str::to_string))
}

fn is_name_token(token: &str) -> bool {
    token.chars().any(|c| c.is_alphabetic())
        && token
            .chars()
            .all(|c| c.is_alphabetic() || c == '-' || c == '\'')
}

/// A single alphabetic word that is not an honorific or qualifier
fn is_lone_given_name(candidate: &str) -> bool {
    let mut words = candidate.split_whitespace();
    let (Some(word), None) = (words.next(), words.next()) else {
        return false;
    };
    let tokens = person_tokens(word);
    tokens.names.len() == 1 && tokens.prefix.is_none() && tokens.suffix.is_none()
}

fn is_fully_upper(s: &str) -> bool {
    s.chars().any(|c| c.is_alphabetic()) && !s.chars().any(|c| c.is_lowercase())
}

fn clean_candidate(candidate: &str) -> String {
    normalize(candidate)
        .trim_matches(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .to_string()
}

/// "O'BRIEN-SMITH" → "O'Brien-Smith"
pub fn title_case(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut start_of_word = true;

    for c in word.chars() {
        if start_of_word {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        start_of_word = !c.is_alphabetic();
    }

    out
}

// ============================================================================
// TESTS
// ============================================================================
