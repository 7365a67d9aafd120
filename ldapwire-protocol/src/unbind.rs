//! Unbind operation
//!
//! ```text
//! UnbindRequest ::= [APPLICATION 2] NULL
//! ```

use crate::message::Request;
use ldapwire_asn1::{DerEncoder, NullType, Tag};
use ldapwire_core::Control;

const UNBIND_REQUEST_OP: u32 = 2;

/// Close the session; the server answers by closing the connection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnbindRequest {
    controls: Vec<Control>,
}

impl UnbindRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_control(mut self, control: impl Into<Control>) -> Self {
        self.controls.push(control.into());
        self
    }
}

impl Request for UnbindRequest {
    fn protocol_op(&self) -> Box<dyn DerEncoder> {
        Box::new(NullType::with_tag(Tag::application(false, UNBIND_REQUEST_OP)))
    }

    fn controls(&self) -> &[Control] {
        &self.controls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbind_encoding() {
        assert_eq!(
            UnbindRequest::new().encode(9).unwrap().as_ref(),
            &[0x30, 0x05, 0x02, 0x01, 0x09, 0x42, 0x00]
        );
    }
}
