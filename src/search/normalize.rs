//! Cleanup of free-text label collections before they are stored or queried

use std::collections::HashSet;

/// Trim, lower-case and deduplicate tags, keeping first-seen order
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    dedupe(tags.into_iter().map(|tag| tag.as_ref().trim().to_lowercase()))
}

/// Trim and deduplicate framework names; case is preserved, so
/// `PCI-DSS` and `pci-dss` stay distinct
pub fn normalize_compliance_frameworks<I, S>(frameworks: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    dedupe(frameworks.into_iter().map(|f| f.as_ref().trim().to_string()))
}

fn dedupe(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|value| !value.is_empty())
        .filter(|value| seen.insert(value.clone()))
        .collect()
}
