//! Compare operation
//!
//! ```text
//! CompareRequest ::= [APPLICATION 14] SEQUENCE {
//!      entry           LDAPDN,
//!      ava             AttributeValueAssertion }
//!
//! CompareResponse ::= [APPLICATION 15] LDAPResult
//! ```

use crate::message::Request;
use crate::result::{result_response, ResultMessage};
use ldapwire_asn1::{ConstructedType, DerEncoder, OctetStringType, Tag};
use ldapwire_core::{Control, LdapError, LdapResult, ResultCode};

const COMPARE_REQUEST_OP: u32 = 14;

/// Test whether an entry holds a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareRequest {
    dn: String,
    attribute: String,
    value: Vec<u8>,
    controls: Vec<Control>,
}

impl CompareRequest {
    /// # Errors
    /// `InvalidRequest` when the DN or the attribute name is empty.
    pub fn new(
        dn: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<Vec<u8>>,
    ) -> LdapResult<Self> {
        let dn = dn.into();
        let attribute = attribute.into();
        if dn.is_empty() {
            return Err(LdapError::invalid_request("compare requires an entry DN"));
        }
        if attribute.is_empty() {
            return Err(LdapError::invalid_request("compare requires an attribute name"));
        }
        Ok(Self {
            dn,
            attribute,
            value: value.into(),
            controls: Vec::new(),
        })
    }

    pub fn with_control(mut self, control: impl Into<Control>) -> Self {
        self.controls.push(control.into());
        self
    }

    pub fn dn(&self) -> &str {
        &self.dn
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }
}

impl Request for CompareRequest {
    fn protocol_op(&self) -> Box<dyn DerEncoder> {
        Box::new(
            ConstructedType::new(Tag::application(true, COMPARE_REQUEST_OP))
                .with(OctetStringType::text(&self.dn))
                .with(
                    ConstructedType::sequence()
                        .with(OctetStringType::text(&self.attribute))
                        .with(OctetStringType::new(self.value.clone())),
                ),
        )
    }

    fn controls(&self) -> &[Control] {
        &self.controls
    }
}

result_response!(
    /// Result of a compare; `compareTrue`/`compareFalse` on success
    CompareResponse,
    15
);

impl CompareResponse {
    pub fn is_true(&self) -> bool {
        self.result_code() == ResultCode::CompareTrue
    }
}
