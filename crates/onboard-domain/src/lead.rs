//! CRM lead name derivation.

/// First/last name pair derived from a single display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadName {
    pub first: String,
    pub last: String,
}

impl LeadName {
    /// Split on whitespace: the first token is the first name, the remaining tokens joined
    /// by single spaces form the last name. A single-token name is used for both.
    pub fn split(full_name: &str) -> Self {
        let mut tokens = full_name.split_whitespace();
        let first = tokens.next().unwrap_or_default().to_owned();
        let rest: Vec<&str> = tokens.collect();
        let last = if rest.is_empty() {
            first.clone()
        } else {
            rest.join(" ")
        };
        Self { first, last }
    }
}
