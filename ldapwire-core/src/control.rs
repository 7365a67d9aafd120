//! Generic LDAP control value

use serde::{Deserialize, Serialize};

/// An (OID, criticality, opaque value) triple
///
/// ```text
/// Control ::= SEQUENCE {
///     controlType             LDAPOID,
///     criticality             BOOLEAN DEFAULT FALSE,
///     controlValue            OCTET STRING OPTIONAL }
/// ```
///
/// Request controls are encoded from this shape without inspecting the
/// value; response controls the registry does not know stay in this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    pub oid: String,
    pub critical: bool,
    #[serde(with = "serde_bytes")]
    pub value: Option<Vec<u8>>,
}

impl Control {
    pub fn new(oid: impl Into<String>, critical: bool, value: Option<Vec<u8>>) -> Self {
        Self {
            oid: oid.into(),
            critical,
            value,
        }
    }

    /// Control without a value
    pub fn flag(oid: impl Into<String>, critical: bool) -> Self {
        Self::new(oid, critical, None)
    }

    pub fn value(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }
}
