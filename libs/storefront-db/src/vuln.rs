//! Vulnerability flags attached to request fields.
//!
//! A [`VulnerableField`] says which attack classes an input field is deliberately
//! left open to, and whether each of them is *blind* (the user gets no error
//! output and has to infer results through side channels). The connection only
//! looks at the [`SQL`] class.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attack class name checked by the connection adapter.
pub const SQL: &str = "SQL";

/// Settings of one vulnerability class on one field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vulnerability {
    #[serde(default)]
    pub blind: bool,
}

impl Vulnerability {
    /// Vulnerability whose errors are suppressed.
    #[must_use]
    pub fn blind() -> Self {
        Self { blind: true }
    }

    /// Vulnerability whose errors are shown to the user.
    #[must_use]
    pub fn visible() -> Self {
        Self { blind: false }
    }

    #[must_use]
    pub fn is_blind(&self) -> bool {
        self.blind
    }
}

/// An input field and the vulnerability classes it is exposed to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VulnerableField {
    name: String,
    vulnerabilities: BTreeMap<String, Vulnerability>,
}

impl VulnerableField {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vulnerabilities: BTreeMap::new(),
        }
    }

    /// Add (or replace) a vulnerability class on this field.
    #[must_use]
    pub fn with(mut self, class: impl Into<String>, vulnerability: Vulnerability) -> Self {
        self.vulnerabilities.insert(class.into(), vulnerability);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Class names compare case-sensitively.
    #[must_use]
    pub fn is_vulnerable_to(&self, class: &str) -> bool {
        self.vulnerabilities.contains_key(class)
    }

    #[must_use]
    pub fn vulnerability(&self, class: &str) -> Option<&Vulnerability> {
        self.vulnerabilities.get(class)
    }
}

/// Normalised list of fields handed to blindness evaluation.
///
/// Built from a single field or from any collection of fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VulnFields(Vec<VulnerableField>);

impl VulnFields {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VulnerableField> {
        self.0.iter()
    }
}

impl From<VulnerableField> for VulnFields {
    fn from(field: VulnerableField) -> Self {
        Self(vec![field])
    }
}

impl From<Vec<VulnerableField>> for VulnFields {
    fn from(fields: Vec<VulnerableField>) -> Self {
        Self(fields)
    }
}

impl From<&[VulnerableField]> for VulnFields {
    fn from(fields: &[VulnerableField]) -> Self {
        Self(fields.to_vec())
    }
}

impl From<Option<VulnerableField>> for VulnFields {
    fn from(field: Option<VulnerableField>) -> Self {
        Self(field.into_iter().collect())
    }
}

impl FromIterator<VulnerableField> for VulnFields {
    fn from_iter<I: IntoIterator<Item = VulnerableField>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a VulnFields {
    type Item = &'a VulnerableField;
    type IntoIter = std::slice::Iter<'a, VulnerableField>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Vulnerability settings of the current controller: field name to classes.
///
/// Deserialises from configuration shaped like:
///
/// ```yaml
/// vulnerabilities:
///   id:
///     SQL: { blind: true }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VulnSettings {
    fields: BTreeMap<String, BTreeMap<String, Vulnerability>>,
}

impl VulnSettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a field, replacing any previous entry with the same name.
    pub fn insert(&mut self, field: VulnerableField) {
        self.fields.insert(field.name, field.vulnerabilities);
    }

    #[must_use]
    pub fn with_field(mut self, field: VulnerableField) -> Self {
        self.insert(field);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<VulnerableField> {
        self.fields.get(name).map(|classes| VulnerableField {
            name: name.to_owned(),
            vulnerabilities: classes.clone(),
        })
    }

    /// Collect the configured fields among `names`, in order, without duplicates.
    pub fn fields_for<'a, I>(&self, names: I) -> VulnFields
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = Vec::new();
        names
            .into_iter()
            .filter(|name| {
                if seen.contains(name) {
                    false
                } else {
                    seen.push(*name);
                    true
                }
            })
            .filter_map(|name| self.field(name))
            .collect()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn class_lookup_is_case_sensitive() {
        let field = VulnerableField::new("id").with(SQL, Vulnerability::blind());
        assert!(field.is_vulnerable_to("SQL"));
        assert!(!field.is_vulnerable_to("sql"));
        assert!(field.vulnerability(SQL).unwrap().is_blind());
    }

    #[test]
    fn single_field_normalises_to_list() {
        let fields: VulnFields = VulnerableField::new("q").into();
        assert_eq!(fields.len(), 1);
        assert!(VulnFields::from(None).is_empty());
    }

    #[test]
    fn settings_deserialize_from_nested_map() {
        let settings: VulnSettings = serde_json::from_value(serde_json::json!({
            "id": { "SQL": { "blind": true } },
            "search": { "XSS": {} }
        }))
        .unwrap();

        let id = settings.field("id").unwrap();
        assert!(id.vulnerability(SQL).unwrap().is_blind());
        let search = settings.field("search").unwrap();
        assert!(!search.is_vulnerable_to(SQL));
        assert!(settings.field("other").is_none());
    }

    #[test]
    fn fields_for_dedups_and_skips_unknown() {
        let settings = VulnSettings::new()
            .with_field(VulnerableField::new("id").with(SQL, Vulnerability::visible()));
        let fields = settings.fields_for(["id", "name", "id"]);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.iter().next().unwrap().name(), "id");
    }
}
