//! Delete operation
//!
//! ```text
//! DelRequest ::= [APPLICATION 10] LDAPDN
//! DelResponse ::= [APPLICATION 11] LDAPResult
//! ```

use crate::message::Request;
use crate::result::result_response;
use ldapwire_asn1::{DerEncoder, OctetStringType, Tag};
use ldapwire_core::{Control, LdapError, LdapResult};

const DELETE_REQUEST_OP: u32 = 10;

/// Remove a leaf entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    dn: String,
    controls: Vec<Control>,
}

impl DeleteRequest {
    pub fn new(dn: impl Into<String>) -> LdapResult<Self> {
        let dn = dn.into();
        if dn.is_empty() {
            return Err(LdapError::invalid_request("delete requires an entry DN"));
        }
        Ok(Self {
            dn,
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
}

impl Request for DeleteRequest {
    fn protocol_op(&self) -> Box<dyn DerEncoder> {
        // The DN is the primitive value of the application tag itself
        Box::new(OctetStringType::with_tag(
            Tag::application(false, DELETE_REQUEST_OP),
            self.dn.as_bytes(),
        ))
    }

    fn controls(&self) -> &[Control] {
        &self.controls
    }
}

result_response!(
    /// Result of a delete
    DeleteResponse,
    11
);
