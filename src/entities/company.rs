// 🏢 Company Entity
//
// Company identity is its normalized, upper-cased name.
// "Smith Family LLC" and "SMITH  FAMILY LLC" are the same company.

use serde::{Deserialize, Serialize};

use crate::normalizer::normalize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
}

impl Company {
    /// Normalizes the name: whitespace collapsed, trailing commas dropped, upper-cased
    pub fn new(name: &str) -> Self {
        let name = normalize(name)
            .trim_matches(|c: char| c == ',' || c == ';')
            .trim()
            .to_uppercase();

        Company { name }
    }
}
