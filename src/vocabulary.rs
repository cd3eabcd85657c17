// 📚 Vocabulary - Heuristic keyword tables as data
// Company signals, stop-words, sentinels, honorifics and suffixes
//
// Every heuristic that decides "is this a company?" or "is this token noise?"
// reads from these tables, never from inline conditionals. The tables can be
// extended per run through `ResolverConfig` without touching control flow.

use std::collections::HashSet;

use crate::config::ResolverConfig;

// ============================================================================
// STATIC TABLES
// ============================================================================

/// Entity keywords that mark a candidate as a company.
///
/// ORDER MATTERS: the first keyword found in the candidate is reported as the
/// signal that fired, so more specific entity forms come first.
pub const COMPANY_KEYWORDS: &[&str] = &[
    // Legal entity suffixes
    "LLC", "PLLC", "LLP", "LP", "INC", "INCORPORATED", "CORP", "CORPORATION",
    "CO", "COMPANY", "LTD", "LIMITED",
    // Trusts and estates
    "TRUST", "TRUSTEE", "TRUSTEES", "TR", "TRS", "TRST", "TTEE", "ESTATE",
    // Finance
    "BANK", "MORTGAGE", "FINANCIAL", "CREDIT", "LENDING", "FUND", "CAPITAL",
    "INSURANCE", "FEDERAL", "NATIONAL",
    // Religious and civic bodies
    "CHURCH", "MINISTRIES", "MINISTRY", "FOUNDATION", "ASSOCIATION", "ASSN",
    "ASSOC", "HOA", "CONDOMINIUM", "CONDO", "UNIVERSITY", "COLLEGE", "SCHOOL",
    // Government
    "COUNTY", "CITY", "STATE", "TOWN", "TOWNSHIP", "VILLAGE", "DISTRICT",
    "AUTHORITY", "DEPARTMENT", "DEPT", "COMMISSION", "GOVERNMENT", "SECRETARY",
    "HOUSING",
    // Real estate and holding vehicles
    "HOLDINGS", "PROPERTIES", "PROPERTY", "INVESTMENTS", "INVESTMENT", "REALTY",
    "PARTNERS", "PARTNERSHIP", "GROUP", "ENTERPRISES", "VENTURES", "DEVELOPMENT",
    "MANAGEMENT", "SERVICES", "APARTMENTS", "HOMES", "BUILDERS", "CONSTRUCTION",
];

/// Tokens dropped by the canonical key builder.
///
/// Articles, conjunctions, corporate suffixes and trust/estate/marital-status
/// qualifiers. Honorifics and generational suffixes are NOT stop-words:
/// "JOHN SMITH JR" and "JOHN SMITH" stay distinct keys.
pub const STOP_WORDS: &[&str] = &[
    // Articles and conjunctions
    "A", "AN", "THE", "AND", "OR", "OF",
    // Corporate suffixes
    "LLC", "PLLC", "LLP", "LP", "INC", "INCORPORATED", "CORP", "CORPORATION",
    "CO", "COMPANY", "LTD", "LIMITED",
    // Trust and estate qualifiers
    "TRUST", "TRUSTEE", "TRUSTEES", "TR", "TRS", "TRST", "TTEE", "ESTATE", "EST",
    "REVOCABLE", "IRREVOCABLE", "LIVING", "DECEASED", "DECD", "DEC",
    // Marital status and tenancy qualifiers
    "ETAL", "ETUX", "ETVIR", "HW", "JTRS", "JTWROS", "TIC", "TEN", "ENT", "COM",
];

/// Whole-string values that mean "no owner recorded".
pub const SENTINELS: &[&str] = &["NONE", "N/A", "UNKNOWN", "NULL"];

/// Tenancy/marital tokens that never belong to a person's name.
pub const PERSON_QUALIFIERS: &[&str] = &[
    "ETAL", "ETUX", "ETVIR", "HW", "JTRS", "JTWROS", "TIC", "TEN", "ENT",
];

/// Honorific prefixes: (token as it appears upper-cased, display form).
pub const PREFIXES: &[(&str, &str)] = &[
    ("MR", "Mr."),
    ("MRS", "Mrs."),
    ("MS", "Ms."),
    ("MISS", "Miss"),
    ("DR", "Dr."),
    ("REV", "Rev."),
    ("HON", "Hon."),
    ("PROF", "Prof."),
    ("CAPT", "Capt."),
    ("SGT", "Sgt."),
];

/// Generational and professional suffixes: (token, display form).
///
/// No bare "V": it reads as a middle initial.
pub const SUFFIXES: &[(&str, &str)] = &[
    ("JR", "Jr."),
    ("SR", "Sr."),
    ("II", "II"),
    ("III", "III"),
    ("IV", "IV"),
    ("PHD", "PhD"),
    ("MD", "MD"),
    ("DDS", "DDS"),
    ("ESQ", "Esq."),
    ("CPA", "CPA"),
];

/// Surname particles that bind to the following token ("VAN DYKE").
pub const SURNAME_PARTICLES: &[&str] = &[
    "VAN", "VON", "DE", "DA", "DEL", "DELLA", "DI", "DU", "LA", "ST",
];

// ============================================================================
// VOCABULARY
// ============================================================================

/// Runtime view of the keyword tables, optionally extended by configuration.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    company_keywords: Vec<String>,
    stop_words: HashSet<String>,
    sentinels: HashSet<String>,
}

impl Vocabulary {
    /// The built-in tables with no extensions
    pub fn standard() -> Self {
        Vocabulary {
            company_keywords: COMPANY_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            stop_words: STOP_WORDS.iter().map(|w| w.to_string()).collect(),
            sentinels: SENTINELS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Built-in tables plus the extra keywords declared in the config.
    /// Extra company keywords are checked after the built-in ones.
    pub fn from_config(config: &ResolverConfig) -> Self {
        let mut vocabulary = Vocabulary::standard();

        for keyword in &config.extra_company_keywords {
            let keyword = keyword.trim().to_uppercase();
            if !keyword.is_empty() && !vocabulary.company_keywords.contains(&keyword) {
                vocabulary.company_keywords.push(keyword);
            }
        }
        vocabulary.stop_words.extend(upper_set(&config.extra_stop_words));
        vocabulary.sentinels.extend(upper_set(&config.extra_sentinels));

        vocabulary
    }

    /// First company keyword (in table order) present among `tokens`.
    pub fn company_keyword(&self, tokens: &[String]) -> Option<&str> {
        self.company_keywords
            .iter()
            .find(|keyword| tokens.iter().any(|token| token == *keyword))
            .map(String::as_str)
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }

    /// Case-insensitive whole-string sentinel check
    pub fn is_sentinel(&self, value: &str) -> bool {
        self.sentinels.contains(&value.trim().to_uppercase())
    }

    pub fn is_person_qualifier(token: &str) -> bool {
        PERSON_QUALIFIERS.contains(&token)
    }

    pub fn prefix(token: &str) -> Option<&'static str> {
        PREFIXES
            .iter()
            .find(|(raw, _)| *raw == token)
            .map(|(_, display)| *display)
    }

    pub fn suffix(token: &str) -> Option<&'static str> {
        SUFFIXES
            .iter()
            .find(|(raw, _)| *raw == token)
            .map(|(_, display)| *display)
    }

    pub fn is_surname_particle(token: &str) -> bool {
        SURNAME_PARTICLES.contains(&token)
    }

    pub fn company_keyword_count(&self) -> usize {
        self.company_keywords.len()
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::standard()
    }
}

fn upper_set(values: &[String]) -> impl Iterator<Item = String> + '_ {
    values
        .iter()
        .map(|v| v.trim().to_uppercase())
        .filter(|v| !v.is_empty())
}

// ============================================================================
// TESTS
// ============================================================================
