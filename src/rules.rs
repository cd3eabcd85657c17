// 🏷️ Override Rules - Classification overrides as data
// Force a known raw spelling to Person or Company before any heuristic runs
//
// Example: "DOLLAR JOHN" is a person despite containing no comma, while
// "SUNRISE MANOR" is an HOA that carries no entity keyword at all.

use serde::{Deserialize, Serialize};

use crate::entities::OwnerKind;
use crate::error::ResolveError;

// ============================================================================
// RULE DEFINITION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRule {
    /// Rule ID for tracking
    pub id: String,

    /// Pattern to match (supports wildcards with *)
    pub pattern: String,

    /// Kind the matching candidate is forced to
    pub kind: OwnerKind,

    /// Description/notes about this rule
    #[serde(default)]
    pub description: Option<String>,

    /// Priority (higher = applied first)
    #[serde(default = "default_priority")]
    pub priority: i32,
}

fn default_priority() -> i32 {
    0
}

impl OverrideRule {
    pub fn new(id: &str, pattern: &str, kind: OwnerKind) -> Self {
        OverrideRule {
            id: id.to_string(),
            pattern: pattern.to_string(),
            kind,
            description: None,
            priority: default_priority(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Description when present, else the rule id
    pub fn label(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.id)
    }

    /// Check if pattern matches the given text (case-insensitive)
    ///
    /// Without `*` the pattern must equal the whole text; with `*` the pieces
    /// must appear in order, anchored at both ends.
    pub fn matches(&self, text: &str) -> bool {
        let pattern = self.pattern.trim().to_uppercase();
        let text = text.trim().to_uppercase();

        if !pattern.contains('*') {
            return text == pattern;
        }

        let parts: Vec<&str> = pattern.split('*').collect();
        let first = parts[0];
        let last = parts[parts.len() - 1];

        if !text.starts_with(first) || !text.ends_with(last) {
            return false;
        }
        if first.len() + last.len() > text.len() {
            return false;
        }

        // Middle parts appear in order between the anchors
        let mut cursor = first.len();
        let end = text.len() - last.len();
        for part in &parts[1..parts.len() - 1] {
            if part.is_empty() {
                continue;
            }
            match text[cursor..end].find(part) {
                Some(pos) => cursor += pos + part.len(),
                None => return false,
            }
        }

        true
    }

    pub fn validate(&self) -> Result<(), ResolveError> {
        if self.id.trim().is_empty() {
            return Err(ResolveError::InvalidOverrideRule {
                id: self.id.clone(),
                reason: "rule id is empty".to_string(),
            });
        }
        if self.pattern.trim().is_empty() || self.pattern.chars().all(|c| c == '*' || c.is_whitespace()) {
            return Err(ResolveError::InvalidOverrideRule {
                id: self.id.clone(),
                reason: "pattern must contain at least one literal character".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// OVERRIDE RULES
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct OverrideRules {
    rules: Vec<OverrideRule>,
}

impl OverrideRules {
    pub fn new() -> Self {
        OverrideRules { rules: Vec::new() }
    }

    /// Validate and order rules (higher priority first, ties keep input order)
    pub fn from_rules(mut rules: Vec<OverrideRule>) -> Result<Self, ResolveError> {
        for rule in &rules {
            rule.validate()?;
        }
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(OverrideRules { rules })
    }

    /// First matching rule (already sorted by priority)
    pub fn matching(&self, text: &str) -> Option<&OverrideRule> {
        self.rules.iter().find(|rule| rule.matches(text))
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

// ============================================================================
// TESTS
// ============================================================================
