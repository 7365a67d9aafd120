//! Modify operation
//!
//! ```text
//! ModifyRequest ::= [APPLICATION 6] SEQUENCE {
//!      object          LDAPDN,
//!      changes         SEQUENCE OF change SEQUENCE {
//!           operation       ENUMERATED { add(0), delete(1), replace(2), increment(3), ... },
//!           modification    PartialAttribute } }
//!
//! ModifyResponse ::= [APPLICATION 7] LDAPResult
//! ```

use crate::add::attribute_encoder;
use crate::message::Request;
use crate::result::result_response;
use ldapwire_asn1::{ConstructedType, DerEncoder, IntegerType, OctetStringType, Tag};
use ldapwire_core::{Attribute, Control, LdapError, LdapResult, Modification, ModificationType};

const MODIFY_REQUEST_OP: u32 = 6;

/// Change the attributes of an existing entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyRequest {
    dn: String,
    modifications: Vec<Modification>,
    controls: Vec<Control>,
}

impl ModifyRequest {
    pub fn builder(dn: impl Into<String>) -> ModifyRequestBuilder {
        ModifyRequestBuilder {
            dn: dn.into(),
            modifications: Vec::new(),
            controls: Vec::new(),
        }
    }

    pub fn dn(&self) -> &str {
        &self.dn
    }

    pub fn modifications(&self) -> &[Modification] {
        &self.modifications
    }
}

impl Request for ModifyRequest {
    fn protocol_op(&self) -> Box<dyn DerEncoder> {
        let mut changes = ConstructedType::sequence();
        for modification in &self.modifications {
            changes.push(
                ConstructedType::sequence()
                    .with(IntegerType::enumerated(modification.operation.code()))
                    .with(attribute_encoder(&modification.attribute)),
            );
        }
        Box::new(
            ConstructedType::new(Tag::application(true, MODIFY_REQUEST_OP))
                .with(OctetStringType::text(&self.dn))
                .with(changes),
        )
    }

    fn controls(&self) -> &[Control] {
        &self.controls
    }
}

/// Builder for [`ModifyRequest`]; changes are applied in the order added
#[derive(Debug, Clone)]
pub struct ModifyRequestBuilder {
    dn: String,
    modifications: Vec<Modification>,
    controls: Vec<Control>,
}

impl ModifyRequestBuilder {
    pub fn modification(mut self, modification: Modification) -> Self {
        self.modifications.push(modification);
        self
    }

    pub fn add(self, attribute: Attribute) -> Self {
        self.modification(Modification::add(attribute))
    }

    /// Remove the listed values, or the whole attribute when none are listed
    pub fn delete(self, attribute: Attribute) -> Self {
        self.modification(Modification::delete(attribute))
    }

    pub fn replace(self, attribute: Attribute) -> Self {
        self.modification(Modification::replace(attribute))
    }

    pub fn increment(self, attribute: Attribute) -> Self {
        self.modification(Modification::increment(attribute))
    }

    pub fn control(mut self, control: impl Into<Control>) -> Self {
        self.controls.push(control.into());
        self
    }

    /// Build the request
    ///
    /// # Errors
    /// `InvalidRequest` for an empty DN, no modifications, an add without
    /// values, or an increment that does not carry exactly one value.
    pub fn build(self) -> LdapResult<ModifyRequest> {
        if self.dn.is_empty() {
            return Err(LdapError::invalid_request("modify requires an entry DN"));
        }
        if self.modifications.is_empty() {
            return Err(LdapError::invalid_request("modify requires at least one modification"));
        }
        for modification in &self.modifications {
            let attribute = &modification.attribute;
            match modification.operation {
                ModificationType::Add if attribute.is_empty() => {
                    return Err(LdapError::InvalidRequest(format!(
                        "add of '{}' has no values",
                        attribute.name()
                    )));
                }
                ModificationType::Increment if attribute.len() != 1 => {
                    return Err(LdapError::InvalidRequest(format!(
                        "increment of '{}' needs exactly one value",
                        attribute.name()
                    )));
                }
                _ => {}
            }
        }
        Ok(ModifyRequest {
            dn: self.dn,
            modifications: self.modifications,
            controls: self.controls,
        })
    }
}

result_response!(
    /// Result of a modify
    ModifyResponse,
    7
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Message, Response};
    use crate::result::ResultMessage;
    use ldapwire_core::ResultCode;

    #[test]
    fn test_modify_request_encoding() {
        let request = ModifyRequest::builder("o=x")
            .replace(Attribute::with_string_values("sn", ["a"]))
            .delete(Attribute::new("cn"))
            .build()
            .unwrap();
        let bytes = request.encode(2).unwrap();
        let expected = [
            0x30, 0x29, 0x02, 0x01, 0x02, // envelope
            0x66, 0x24, // [APPLICATION 6]
            0x04, 0x03, b'o', b'=', b'x', // object
            0x30, 0x1D, // changes
            0x30, 0x0E, 0x0A, 0x01, 0x02, // replace
            0x30, 0x09, 0x04, 0x02, b's', b'n', 0x31, 0x03, 0x04, 0x01, b'a',
            0x30, 0x0B, 0x0A, 0x01, 0x01, // delete
            0x30, 0x06, 0x04, 0x02, b'c', b'n', 0x31, 0x00,
        ];
        assert_eq!(bytes.as_ref(), &expected[..]);
    }

    #[test]
    fn test_modify_request_validation() {
        assert!(ModifyRequest::builder("o=x").build().is_err());
        assert!(ModifyRequest::builder("")
            .replace(Attribute::new("cn"))
            .build()
            .is_err());
        assert!(ModifyRequest::builder("o=x")
            .add(Attribute::new("cn"))
            .build()
            .is_err());
        assert!(ModifyRequest::builder("o=x")
            .increment(Attribute::with_string_values("n", ["1", "2"]))
            .build()
            .is_err());
        assert!(ModifyRequest::builder("o=x")
            .increment(Attribute::with_string_values("n", ["1"]))
            .build()
            .is_ok());
    }

    #[test]
    fn test_decode_modify_response() {
        let data = [
            0x30, 0x0C, 0x02, 0x01, 0x02, 0x67, 0x07, 0x0A, 0x01, 0x00, 0x04, 0x00, 0x04, 0x00,
        ];
        let response = ModifyResponse::decode(&data).unwrap();
        assert_eq!(response.message_id(), 2);
        assert_eq!(response.result_code(), ResultCode::Success);
    }
}
