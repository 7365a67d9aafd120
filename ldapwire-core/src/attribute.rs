//! LDAP attribute and modification model

use serde::{Deserialize, Serialize};

/// An attribute description with its values
///
/// The name may carry options (`userCertificate;binary`). Values keep the
/// order they arrived in on the wire. An attribute without values is legal:
/// servers return them for "attributes only" searches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    name: String,
    values: Vec<Vec<u8>>,
}

impl Attribute {
    /// Create an attribute without values
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    /// Create an attribute with binary values
    pub fn with_values<I, V>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Vec<u8>>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Create an attribute with UTF-8 string values
    pub fn with_string_values<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_values(name, values.into_iter().map(|v| v.as_ref().as_bytes().to_vec()))
    }

    /// Full attribute description including options
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute type without options
    pub fn base_name(&self) -> &str {
        match self.name.find(';') {
            Some(pos) => &self.name[..pos],
            None => &self.name,
        }
    }

    /// Options following the base name, in wire order
    pub fn options(&self) -> Vec<&str> {
        self.name.split(';').skip(1).filter(|o| !o.is_empty()).collect()
    }

    /// Case-insensitive comparison of base names
    ///
    /// Options are ignored on both sides, so `cn;lang-en` matches `CN`.
    pub fn matches_name(&self, name: &str) -> bool {
        let other = name.split(';').next().unwrap_or(name);
        self.base_name().eq_ignore_ascii_case(other)
    }

    pub fn values(&self) -> &[Vec<u8>] {
        &self.values
    }

    /// Values decoded as UTF-8, replacing invalid sequences
    pub fn string_values(&self) -> Vec<String> {
        self.values
            .iter()
            .map(|v| String::from_utf8_lossy(v).into_owned())
            .collect()
    }

    pub fn add_value(&mut self, value: impl Into<Vec<u8>>) {
        self.values.push(value.into());
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Modify operation kind (RFC 4511 §4.6, RFC 4525 for increment)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModificationType {
    Add = 0,
    Delete = 1,
    Replace = 2,
    Increment = 3,
}

impl ModificationType {
    pub fn code(self) -> i64 {
        self as i64
    }
}

/// A single change inside a modify request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modification {
    pub operation: ModificationType,
    pub attribute: Attribute,
}

impl Modification {
    pub fn new(operation: ModificationType, attribute: Attribute) -> Self {
        Self {
            operation,
            attribute,
        }
    }

    pub fn add(attribute: Attribute) -> Self {
        Self::new(ModificationType::Add, attribute)
    }

    pub fn delete(attribute: Attribute) -> Self {
        Self::new(ModificationType::Delete, attribute)
    }

    pub fn replace(attribute: Attribute) -> Self {
        Self::new(ModificationType::Replace, attribute)
    }

    pub fn increment(attribute: Attribute) -> Self {
        Self::new(ModificationType::Increment, attribute)
    }
}
