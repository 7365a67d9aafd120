//! Abandon operation
//!
//! ```text
//! AbandonRequest ::= [APPLICATION 16] MessageID
//! ```
//!
//! The server sends no response.

use crate::message::Request;
use ldapwire_asn1::{DerEncoder, IntegerType, Tag};
use ldapwire_core::{Control, LdapError, LdapResult};

const ABANDON_REQUEST_OP: u32 = 16;

/// Ask the server to drop an outstanding operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbandonRequest {
    message_id: i32,
    controls: Vec<Control>,
}

impl AbandonRequest {
    /// Abandon the operation started with `message_id`
    pub fn new(message_id: i32) -> LdapResult<Self> {
        if message_id <= 0 {
            return Err(LdapError::InvalidRequest(format!(
                "cannot abandon message ID {}",
                message_id
            )));
        }
        Ok(Self {
            message_id,
            controls: Vec::new(),
        })
    }

    pub fn with_control(mut self, control: impl Into<Control>) -> Self {
        self.controls.push(control.into());
        self
    }

    /// ID of the operation being abandoned
    pub fn abandoned_id(&self) -> i32 {
        self.message_id
    }
}

impl Request for AbandonRequest {
    fn protocol_op(&self) -> Box<dyn DerEncoder> {
        Box::new(IntegerType::with_tag(
            Tag::application(false, ABANDON_REQUEST_OP),
            self.message_id as i64,
        ))
    }

    fn controls(&self) -> &[Control] {
        &self.controls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abandon_encoding() {
        let bytes = AbandonRequest::new(5).unwrap().encode(6).unwrap();
        assert_eq!(
            bytes.as_ref(),
            &[0x30, 0x06, 0x02, 0x01, 0x06, 0x50, 0x01, 0x05]
        );
        assert!(AbandonRequest::new(0).is_err());
    }
}
