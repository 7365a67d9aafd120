//! Modify DN operation
//!
//! ```text
//! ModifyDNRequest ::= [APPLICATION 12] SEQUENCE {
//!      entry           LDAPDN,
//!      newrdn          RelativeLDAPDN,
//!      deleteoldrdn    BOOLEAN,
//!      newSuperior     [0] LDAPDN OPTIONAL }
//!
//! ModifyDNResponse ::= [APPLICATION 13] LDAPResult
//! ```

use crate::message::Request;
use crate::result::result_response;
use ldapwire_asn1::{BooleanType, ConstructedType, DerEncoder, OctetStringType, Tag};
use ldapwire_core::{Control, LdapError, LdapResult};

const MODIFY_DN_REQUEST_OP: u32 = 12;

/// Rename an entry or move it below a new parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyDnRequest {
    dn: String,
    new_rdn: String,
    delete_old_rdn: bool,
    new_superior: Option<String>,
    controls: Vec<Control>,
}

impl ModifyDnRequest {
    pub fn builder(dn: impl Into<String>, new_rdn: impl Into<String>) -> ModifyDnRequestBuilder {
        ModifyDnRequestBuilder {
            dn: dn.into(),
            new_rdn: new_rdn.into(),
            delete_old_rdn: true,
            new_superior: None,
            controls: Vec::new(),
        }
    }

    pub fn dn(&self) -> &str {
        &self.dn
    }

    pub fn new_rdn(&self) -> &str {
        &self.new_rdn
    }

    pub fn delete_old_rdn(&self) -> bool {
        self.delete_old_rdn
    }

    pub fn new_superior(&self) -> Option<&str> {
        self.new_superior.as_deref()
    }
}

impl Request for ModifyDnRequest {
    fn protocol_op(&self) -> Box<dyn DerEncoder> {
        let mut op = ConstructedType::new(Tag::application(true, MODIFY_DN_REQUEST_OP))
            .with(OctetStringType::text(&self.dn))
            .with(OctetStringType::text(&self.new_rdn))
            .with(BooleanType::new(self.delete_old_rdn));
        if let Some(superior) = &self.new_superior {
            op.push(OctetStringType::with_tag(
                Tag::context(false, 0),
                superior.as_bytes(),
            ));
        }
        Box::new(op)
    }

    fn controls(&self) -> &[Control] {
        &self.controls
    }
}

/// Builder for [`ModifyDnRequest`]; the old RDN is deleted by default
#[derive(Debug, Clone)]
pub struct ModifyDnRequestBuilder {
    dn: String,
    new_rdn: String,
    delete_old_rdn: bool,
    new_superior: Option<String>,
    controls: Vec<Control>,
}

impl ModifyDnRequestBuilder {
    pub fn delete_old_rdn(mut self, delete_old_rdn: bool) -> Self {
        self.delete_old_rdn = delete_old_rdn;
        self
    }

    pub fn new_superior(mut self, new_superior: impl Into<String>) -> Self {
        self.new_superior = Some(new_superior.into());
        self
    }

    pub fn control(mut self, control: impl Into<Control>) -> Self {
        self.controls.push(control.into());
        self
    }

    pub fn build(self) -> LdapResult<ModifyDnRequest> {
        if self.dn.is_empty() {
            return Err(LdapError::invalid_request("modify DN requires an entry DN"));
        }
        if self.new_rdn.is_empty() {
            return Err(LdapError::invalid_request("modify DN requires a new RDN"));
        }
        Ok(ModifyDnRequest {
            dn: self.dn,
            new_rdn: self.new_rdn,
            delete_old_rdn: self.delete_old_rdn,
            new_superior: self.new_superior,
            controls: self.controls,
        })
    }
}

result_response!(
    /// Result of a modify DN
    ModifyDnResponse,
    13
);
