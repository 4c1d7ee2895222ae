//! Statement parameters.

use crate::value::Value;
use crate::vuln::VulnFields;

/// Name of the reserved parameter entry carrying vulnerability flags.
///
/// It is never bound to the statement: [`crate::Connection::execute`] strips it
/// and uses it for blindness evaluation instead.
pub const VULN_FIELDS_KEY: &str = "vuln_fields";

/// Positional bind values plus the reserved `vuln_fields` entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    binds: Vec<Value>,
    vuln_fields: Option<VulnFields>,
}

impl Params {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional bind value.
    #[must_use]
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.binds.push(value.into());
        self
    }

    pub fn push(&mut self, value: impl Into<Value>) {
        self.binds.push(value.into());
    }

    /// Set the `vuln_fields` entry from one field or a collection of fields.
    #[must_use]
    pub fn with_vuln_fields(mut self, fields: impl Into<VulnFields>) -> Self {
        self.vuln_fields = Some(fields.into());
        self
    }

    /// Remove and return the `vuln_fields` entry.
    pub fn take_vuln_fields(&mut self) -> Option<VulnFields> {
        self.vuln_fields.take()
    }

    #[must_use]
    pub fn vuln_fields(&self) -> Option<&VulnFields> {
        self.vuln_fields.as_ref()
    }

    #[must_use]
    pub fn binds(&self) -> &[Value] {
        &self.binds
    }

    #[must_use]
    pub fn into_binds(self) -> Vec<Value> {
        self.binds
    }
}

impl From<Vec<Value>> for Params {
    fn from(binds: Vec<Value>) -> Self {
        Self {
            binds,
            vuln_fields: None,
        }
    }
}

impl FromIterator<Value> for Params {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::vuln::VulnerableField;

    #[test]
    fn take_vuln_fields_strips_the_entry() {
        let mut params = Params::new()
            .bind(7)
            .with_vuln_fields(VulnerableField::new("id"));
        assert!(params.take_vuln_fields().is_some());
        assert!(params.take_vuln_fields().is_none());
        assert_eq!(params.binds(), [Value::Int(7)]);
    }
}
