//! LDAPResult fields shared by result-bearing responses
//!
//! ```text
//! LDAPResult ::= SEQUENCE {
//!      resultCode         ENUMERATED,
//!      matchedDN          LDAPDN,
//!      diagnosticMessage  LDAPString,
//!      referral           [3] Referral OPTIONAL }
//! ```

use crate::message::{
    expect_operation, message_parser, operation_path, DecodeContext, DecodeState, Message,
    MessageHeader, ResultState,
};
use ldapwire_asn1::{DerBuffer, DerParser, PathNode, Tag};
use ldapwire_core::{LdapError, LdapResult, ResultCode};

/// Outcome of an operation as reported by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationResult {
    pub result_code: ResultCode,
    /// Empty when the server sent an empty matchedDN
    pub matched_dn: String,
    pub diagnostic_message: String,
    pub referral_urls: Vec<String>,
}

impl OperationResult {
    pub fn new(result_code: ResultCode) -> Self {
        Self {
            result_code,
            matched_dn: String::new(),
            diagnostic_message: String::new(),
            referral_urls: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result_code.is_success()
    }
}

/// Capability of responses carrying an LDAPResult
pub trait ResultMessage: Message {
    fn result(&self) -> &OperationResult;

    fn result_code(&self) -> ResultCode {
        self.result().result_code
    }

    fn matched_dn(&self) -> &str {
        &self.result().matched_dn
    }

    fn diagnostic_message(&self) -> &str {
        &self.result().diagnostic_message
    }

    fn referral_urls(&self) -> &[String] {
        &self.result().referral_urls
    }
}

impl ResultState {
    /// Require a resultCode and fill absent strings with ""
    pub(crate) fn finish(self) -> LdapResult<OperationResult> {
        let code = self
            .result_code
            .ok_or_else(|| LdapError::decode("LDAPResult without resultCode"))?;
        Ok(OperationResult {
            result_code: ResultCode::from_code(code)?,
            matched_dn: self.matched_dn.unwrap_or_default(),
            diagnostic_message: self.diagnostic_message.unwrap_or_default(),
            referral_urls: self.referral_urls,
        })
    }
}

fn read_result_code<E>(state: &mut DecodeState<E>, buffer: &mut DerBuffer<'_>) -> LdapResult<()> {
    state.result.result_code = Some(buffer.read_integer_value()?);
    Ok(())
}

fn read_matched_dn<E>(state: &mut DecodeState<E>, buffer: &mut DerBuffer<'_>) -> LdapResult<()> {
    state.result.matched_dn = Some(buffer.read_string_value()?);
    Ok(())
}

fn read_diagnostic_message<E>(
    state: &mut DecodeState<E>,
    buffer: &mut DerBuffer<'_>,
) -> LdapResult<()> {
    state.result.diagnostic_message = Some(buffer.read_string_value()?);
    Ok(())
}

fn read_referral<E>(state: &mut DecodeState<E>, buffer: &mut DerBuffer<'_>) -> LdapResult<()> {
    state.result.referral_urls.push(buffer.read_string_value()?);
    Ok(())
}

/// Register the LDAPResult component paths under `/SEQ/APP(op)`
pub(crate) fn register_result<E>(parser: &mut DerParser<DecodeState<E>>, op: u32) {
    let base = operation_path(op);
    parser
        .register(base.child(PathNode::new(Tag::ENUM).at(0)), read_result_code::<E>)
        .register(base.child(PathNode::new(Tag::OCTSTR).at(0)), read_matched_dn::<E>)
        .register(
            base.child(PathNode::new(Tag::OCTSTR).at(1)),
            read_diagnostic_message::<E>,
        )
        .register(
            base.child(PathNode::context(3)).child(PathNode::new(Tag::OCTSTR)),
            read_referral::<E>,
        );
}

/// Decode a response whose protocolOp is a bare LDAPResult
pub(crate) fn decode_result(
    buffer: &mut DerBuffer<'_>,
    context: &DecodeContext<'_>,
    op: u32,
) -> LdapResult<(MessageHeader, OperationResult)> {
    expect_operation(buffer, op)?;
    let mut parser = message_parser::<()>(context);
    register_result(&mut parser, op);
    let mut state = DecodeState::default();
    parser.parse(buffer, &mut state)?;
    Ok((state.header.finish(context)?, state.result.finish()?))
}

/// Define a response type that carries nothing but an LDAPResult
macro_rules! result_response {
    ($(#[$meta:meta])* $name:ident, $op:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            header: $crate::message::MessageHeader,
            result: $crate::result::OperationResult,
        }

        impl $name {
            pub fn new(
                header: $crate::message::MessageHeader,
                result: $crate::result::OperationResult,
            ) -> Self {
                Self { header, result }
            }
        }

        impl $crate::message::Message for $name {
            fn header(&self) -> &$crate::message::MessageHeader {
                &self.header
            }
        }

        impl $crate::result::ResultMessage for $name {
            fn result(&self) -> &$crate::result::OperationResult {
                &self.result
            }
        }

        impl $crate::message::Response for $name {
            const PROTOCOL_OP: u32 = $op;

            fn decode_with(
                buffer: &mut ldapwire_asn1::DerBuffer<'_>,
                context: &$crate::message::DecodeContext<'_>,
            ) -> ldapwire_core::LdapResult<Self> {
                let (header, result) =
                    $crate::result::decode_result(buffer, context, Self::PROTOCOL_OP)?;
                Ok(Self { header, result })
            }
        }
    };
}

pub(crate) use result_response;

#[cfg(test)]
mod tests {
    use super::*;

    // SEQ { INT 3, APP(7) { ENUM 32, OCTSTR "dc=x", OCTSTR "gone", CTX(3) { OCTSTR "ldap://a" } } }
    const MODIFY_RESPONSE: [u8; 34] = [
        0x30, 0x20, 0x02, 0x01, 0x03, 0x67, 0x1B, 0x0A, 0x01, 0x20, 0x04, 0x04, b'd', b'c', b'=',
        b'x', 0x04, 0x04, b'g', b'o', b'n', b'e', 0xA3, 0x0A, 0x04, 0x08, b'l', b'd', b'a', b'p',
        b':', b'/', b'/', b'a',
    ];

    #[test]
    fn test_decode_full_result() {
        let (header, result) = decode_result(
            &mut DerBuffer::new(&MODIFY_RESPONSE),
            &DecodeContext::default(),
            7,
        )
        .unwrap();
        assert_eq!(header.message_id, 3);
        assert!(header.controls.is_empty());
        assert_eq!(result.result_code, ResultCode::NoSuchObject);
        assert_eq!(result.matched_dn, "dc=x");
        assert_eq!(result.diagnostic_message, "gone");
        assert_eq!(result.referral_urls, vec!["ldap://a"]);
    }

    #[test]
    fn test_wrong_operation_rejected() {
        let result = decode_result(
            &mut DerBuffer::new(&MODIFY_RESPONSE),
            &DecodeContext::default(),
            9,
        );
        assert!(matches!(result, Err(LdapError::Decode(_))));
    }

    #[test]
    fn test_missing_result_code_is_error() {
        // APP(7) { OCTSTR "", OCTSTR "" }
        let data = [0x30, 0x09, 0x02, 0x01, 0x01, 0x67, 0x04, 0x04, 0x00, 0x04, 0x00];
        let result = decode_result(&mut DerBuffer::new(&data), &DecodeContext::default(), 7);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_result_code_is_error() {
        let data = [
            0x30, 0x0C, 0x02, 0x01, 0x01, 0x67, 0x07, 0x0A, 0x01, 0x09, 0x04, 0x00, 0x04, 0x00,
        ];
        let result = decode_result(&mut DerBuffer::new(&data), &DecodeContext::default(), 7);
        assert!(matches!(result, Err(LdapError::UnknownResultCode(9))));
    }

    #[test]
    fn test_truncated_result_fails() {
        for k in 0..MODIFY_RESPONSE.len() {
            let result = decode_result(
                &mut DerBuffer::new(&MODIFY_RESPONSE[..k]),
                &DecodeContext::default(),
                7,
            );
            assert!(result.is_err(), "truncation at {} decoded", k);
        }
    }
}
