//! Add operation
//!
//! ```text
//! AddRequest ::= [APPLICATION 8] SEQUENCE {
//!      entry           LDAPDN,
//!      attributes      AttributeList }
//!
//! AttributeList ::= SEQUENCE OF attribute Attribute
//!
//! AddResponse ::= [APPLICATION 9] LDAPResult
//! ```

use crate::message::Request;
use crate::result::result_response;
use ldapwire_asn1::{ConstructedType, DerEncoder, OctetStringType, Tag};
use ldapwire_core::{Attribute, Control, LdapError, LdapResult};

const ADD_REQUEST_OP: u32 = 8;

/// `SEQUENCE { type, SET OF value }`, shared with the modify request
pub(crate) fn attribute_encoder(attribute: &Attribute) -> ConstructedType {
    let mut values = ConstructedType::set();
    for value in attribute.values() {
        values.push(OctetStringType::new(value.clone()));
    }
    ConstructedType::sequence()
        .with(OctetStringType::text(attribute.name()))
        .with(values)
}

/// Create a new entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddRequest {
    dn: String,
    attributes: Vec<Attribute>,
    controls: Vec<Control>,
}

impl AddRequest {
    pub fn builder(dn: impl Into<String>) -> AddRequestBuilder {
        AddRequestBuilder {
            dn: dn.into(),
            attributes: Vec::new(),
            controls: Vec::new(),
        }
    }

    pub fn dn(&self) -> &str {
        &self.dn
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }
}

impl Request for AddRequest {
    fn protocol_op(&self) -> Box<dyn DerEncoder> {
        let mut attributes = ConstructedType::sequence();
        for attribute in &self.attributes {
            attributes.push(attribute_encoder(attribute));
        }
        Box::new(
            ConstructedType::new(Tag::application(true, ADD_REQUEST_OP))
                .with(OctetStringType::text(&self.dn))
                .with(attributes),
        )
    }

    fn controls(&self) -> &[Control] {
        &self.controls
    }
}

/// Builder for [`AddRequest`]
#[derive(Debug, Clone)]
pub struct AddRequestBuilder {
    dn: String,
    attributes: Vec<Attribute>,
    controls: Vec<Control>,
}

impl AddRequestBuilder {
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn control(mut self, control: impl Into<Control>) -> Self {
        self.controls.push(control.into());
        self
    }

    /// Build the request
    ///
    /// # Errors
    /// `InvalidRequest` for an empty DN, no attributes, or an attribute
    /// without values.
    pub fn build(self) -> LdapResult<AddRequest> {
        if self.dn.is_empty() {
            return Err(LdapError::invalid_request("add requires an entry DN"));
        }
        if self.attributes.is_empty() {
            return Err(LdapError::invalid_request("add requires at least one attribute"));
        }
        if let Some(empty) = self.attributes.iter().find(|a| a.is_empty()) {
            return Err(LdapError::InvalidRequest(format!(
                "attribute '{}' has no values",
                empty.name()
            )));
        }
        Ok(AddRequest {
            dn: self.dn,
            attributes: self.attributes,
            controls: self.controls,
        })
    }
}

result_response!(
    /// Result of an add
    AddResponse,
    9
);
