//! Extended operations, intermediate responses and unsolicited notifications
//!
//! ```text
//! ExtendedRequest ::= [APPLICATION 23] SEQUENCE {
//!      requestName      [0] LDAPOID,
//!      requestValue     [1] OCTET STRING OPTIONAL }
//!
//! ExtendedResponse ::= [APPLICATION 24] SEQUENCE {
//!      COMPONENTS OF LDAPResult,
//!      responseName     [10] LDAPOID OPTIONAL,
//!      responseValue    [11] OCTET STRING OPTIONAL }
//!
//! IntermediateResponse ::= [APPLICATION 25] SEQUENCE {
//!      responseName     [0] LDAPOID OPTIONAL,
//!      responseValue    [1] OCTET STRING OPTIONAL }
//! ```
//!
//! Application tag 24 is shared by ordinary extended responses and by
//! server-initiated notifications; the latter are told apart by their
//! responseName and always carry message ID 0.

use crate::message::{
    expect_operation, message_parser, operation_path, DecodeContext, DecodeState, Message,
    MessageHeader, Request, Response, UNSOLICITED_MESSAGE_ID,
};
use crate::result::{register_result, OperationResult, ResultMessage};
use ldapwire_asn1::{
    ConstructedType, DerBuffer, DerEncoder, IntegerType, OctetStringType, PathNode, Tag,
};
use ldapwire_core::{Control, LdapError, LdapResult};
use once_cell::sync::Lazy;
use regex::Regex;

/// Notice of disconnection (RFC 4511 §4.4.1)
pub const NOTICE_OF_DISCONNECTION_OID: &str = "1.3.6.1.4.1.1466.20036";
/// StartTLS (RFC 4511 §4.14)
pub const START_TLS_OID: &str = "1.3.6.1.4.1.1466.20037";
/// "Who am I?" (RFC 4532)
pub const WHO_AM_I_OID: &str = "1.3.6.1.4.1.4203.1.11.3";
/// Cancel (RFC 3909)
pub const CANCEL_OID: &str = "1.3.6.1.1.8";

const EXTENDED_REQUEST_OP: u32 = 23;

static NUMERIC_OID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-2](\.(0|[1-9][0-9]*))+$").expect("numeric OID pattern is a valid regex")
});

/// Whether `oid` is in dotted-decimal form
pub fn is_numeric_oid(oid: &str) -> bool {
    NUMERIC_OID.is_match(oid)
}

fn extended_op(name: &str, value: Option<&[u8]>) -> ConstructedType {
    let mut op = ConstructedType::new(Tag::application(true, EXTENDED_REQUEST_OP))
        .with(OctetStringType::with_tag(Tag::context(false, 0), name.as_bytes()));
    if let Some(value) = value {
        op.push(OctetStringType::with_tag(Tag::context(false, 1), value));
    }
    op
}

/// Generic extended request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedRequest {
    name: String,
    value: Option<Vec<u8>>,
    controls: Vec<Control>,
}

impl ExtendedRequest {
    pub fn builder(name: impl Into<String>) -> ExtendedRequestBuilder {
        ExtendedRequestBuilder {
            name: name.into(),
            value: None,
            controls: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }
}

impl Request for ExtendedRequest {
    fn protocol_op(&self) -> Box<dyn DerEncoder> {
        Box::new(extended_op(&self.name, self.value.as_deref()))
    }

    fn controls(&self) -> &[Control] {
        &self.controls
    }
}

/// Builder for [`ExtendedRequest`]
#[derive(Debug, Clone)]
pub struct ExtendedRequestBuilder {
    name: String,
    value: Option<Vec<u8>>,
    controls: Vec<Control>,
}

impl ExtendedRequestBuilder {
    pub fn value(mut self, value: impl Into<Vec<u8>>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn control(mut self, control: impl Into<Control>) -> Self {
        self.controls.push(control.into());
        self
    }

    /// Build the request
    ///
    /// # Errors
    /// `InvalidRequest` unless the request name is a numeric OID.
    pub fn build(self) -> LdapResult<ExtendedRequest> {
        if !is_numeric_oid(&self.name) {
            return Err(LdapError::InvalidRequest(format!(
                "'{}' is not a numeric OID",
                self.name
            )));
        }
        Ok(ExtendedRequest {
            name: self.name,
            value: self.value,
            controls: self.controls,
        })
    }
}

/// "Who am I?" request; the response value is the authorization identity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhoAmIRequest {
    controls: Vec<Control>,
}

impl WhoAmIRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_control(mut self, control: impl Into<Control>) -> Self {
        self.controls.push(control.into());
        self
    }

    /// Authorization identity carried by the matching response
    ///
    /// `None` when the server returned no value.
    pub fn authz_id(response: &ExtendedResponse) -> LdapResult<Option<String>> {
        response.value_as_string()
    }
}

impl Request for WhoAmIRequest {
    fn protocol_op(&self) -> Box<dyn DerEncoder> {
        Box::new(extended_op(WHO_AM_I_OID, None))
    }

    fn controls(&self) -> &[Control] {
        &self.controls
    }
}

/// StartTLS request; TLS negotiation itself happens outside the codec
///
/// The response carries [`START_TLS_OID`] as its name, which is also the
/// default entry of `CodecConfig::unsolicited_notification_oids`. With that
/// default, [`ResponseParser`](crate::dispatcher::ResponseParser) turns the
/// answer into an `UnsolicitedNotification` with message ID 0. Clients that
/// send this request should remove the OID from the list so the response
/// keeps its message ID and decodes as an `ExtendedResponse`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartTlsRequest {
    controls: Vec<Control>,
}

impl StartTlsRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_control(mut self, control: impl Into<Control>) -> Self {
        self.controls.push(control.into());
        self
    }
}

impl Request for StartTlsRequest {
    fn protocol_op(&self) -> Box<dyn DerEncoder> {
        Box::new(extended_op(START_TLS_OID, None))
    }

    fn controls(&self) -> &[Control] {
        &self.controls
    }
}

/// Cancel an outstanding operation and get a response for it
///
/// ```text
/// cancelRequestValue ::= SEQUENCE { cancelID MessageID }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelRequest {
    cancel_id: i32,
    controls: Vec<Control>,
}

impl CancelRequest {
    pub fn new(cancel_id: i32) -> LdapResult<Self> {
        if cancel_id <= 0 {
            return Err(LdapError::InvalidRequest(format!(
                "cannot cancel message ID {}",
                cancel_id
            )));
        }
        Ok(Self {
            cancel_id,
            controls: Vec::new(),
        })
    }

    pub fn with_control(mut self, control: impl Into<Control>) -> Self {
        self.controls.push(control.into());
        self
    }

    pub fn cancel_id(&self) -> i32 {
        self.cancel_id
    }
}

impl Request for CancelRequest {
    fn protocol_op(&self) -> Box<dyn DerEncoder> {
        let value = ConstructedType::sequence()
            .with(IntegerType::new(self.cancel_id as i64))
            .encode();
        Box::new(extended_op(CANCEL_OID, Some(&value)))
    }

    fn controls(&self) -> &[Control] {
        &self.controls
    }
}

#[derive(Debug, Default)]
struct NamedValue {
    name: Option<String>,
    value: Option<Vec<u8>>,
}

fn read_name(state: &mut DecodeState<NamedValue>, buffer: &mut DerBuffer<'_>) -> LdapResult<()> {
    state.extra.name = Some(buffer.read_string_value()?);
    Ok(())
}

fn read_value(state: &mut DecodeState<NamedValue>, buffer: &mut DerBuffer<'_>) -> LdapResult<()> {
    state.extra.value = Some(buffer.read_octets_value());
    Ok(())
}

/// Response to an extended request
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedResponse {
    header: MessageHeader,
    result: OperationResult,
    response_name: Option<String>,
    response_value: Option<Vec<u8>>,
}

impl ExtendedResponse {
    pub fn new(
        header: MessageHeader,
        result: OperationResult,
        response_name: Option<String>,
        response_value: Option<Vec<u8>>,
    ) -> Self {
        Self {
            header,
            result,
            response_name,
            response_value,
        }
    }

    pub fn response_name(&self) -> Option<&str> {
        self.response_name.as_deref()
    }

    pub fn response_value(&self) -> Option<&[u8]> {
        self.response_value.as_deref()
    }

    /// Response value decoded as UTF-8
    pub fn value_as_string(&self) -> LdapResult<Option<String>> {
        self.response_value
            .as_ref()
            .map(|v| String::from_utf8(v.clone()).map_err(LdapError::from))
            .transpose()
    }
}

impl Message for ExtendedResponse {
    fn header(&self) -> &MessageHeader {
        &self.header
    }
}

impl ResultMessage for ExtendedResponse {
    fn result(&self) -> &OperationResult {
        &self.result
    }
}

impl Response for ExtendedResponse {
    const PROTOCOL_OP: u32 = 24;

    fn decode_with(buffer: &mut DerBuffer<'_>, context: &DecodeContext<'_>) -> LdapResult<Self> {
        expect_operation(buffer, Self::PROTOCOL_OP)?;
        let op = operation_path(Self::PROTOCOL_OP);
        let mut parser = message_parser::<NamedValue>(context);
        register_result(&mut parser, Self::PROTOCOL_OP);
        parser
            .register(op.child(PathNode::context(10)), read_name)
            .register(op.child(PathNode::context(11)), read_value);
        let mut state = DecodeState::default();
        parser.parse(buffer, &mut state)?;
        Ok(Self {
            header: state.header.finish(context)?,
            result: state.result.finish()?,
            response_name: state.extra.name,
            response_value: state.extra.value,
        })
    }
}

/// Progress message sent before the final response of some operations
#[derive(Debug, Clone, PartialEq)]
pub struct IntermediateResponse {
    header: MessageHeader,
    response_name: Option<String>,
    response_value: Option<Vec<u8>>,
}

impl IntermediateResponse {
    pub fn response_name(&self) -> Option<&str> {
        self.response_name.as_deref()
    }

    pub fn response_value(&self) -> Option<&[u8]> {
        self.response_value.as_deref()
    }
}

impl Message for IntermediateResponse {
    fn header(&self) -> &MessageHeader {
        &self.header
    }
}

impl Response for IntermediateResponse {
    const PROTOCOL_OP: u32 = 25;

    fn decode_with(buffer: &mut DerBuffer<'_>, context: &DecodeContext<'_>) -> LdapResult<Self> {
        expect_operation(buffer, Self::PROTOCOL_OP)?;
        let op = operation_path(Self::PROTOCOL_OP);
        let mut parser = message_parser::<NamedValue>(context);
        parser
            .register(op.child(PathNode::context(0)), read_name)
            .register(op.child(PathNode::context(1)), read_value);
        let mut state = DecodeState::default();
        parser.parse(buffer, &mut state)?;
        Ok(Self {
            header: state.header.finish(context)?,
            response_name: state.extra.name,
            response_value: state.extra.value,
        })
    }
}

/// Rewrite the message ID of a server-initiated notification to 0
fn force_unsolicited(mut response: ExtendedResponse) -> ExtendedResponse {
    if response.header.message_id != UNSOLICITED_MESSAGE_ID {
        log::warn!(
            "unsolicited notification {} carried messageID {}",
            response.response_name().unwrap_or("<none>"),
            response.header.message_id
        );
        response.header.message_id = UNSOLICITED_MESSAGE_ID;
    }
    response
}

/// Server is closing the connection; no further responses will arrive
#[derive(Debug, Clone, PartialEq)]
pub struct NoticeOfDisconnection {
    response: ExtendedResponse,
}

impl NoticeOfDisconnection {
    pub fn extended(&self) -> &ExtendedResponse {
        &self.response
    }

    pub fn into_extended(self) -> ExtendedResponse {
        self.response
    }
}

impl Message for NoticeOfDisconnection {
    fn header(&self) -> &MessageHeader {
        &self.response.header
    }
}

impl ResultMessage for NoticeOfDisconnection {
    fn result(&self) -> &OperationResult {
        &self.response.result
    }
}

impl Response for NoticeOfDisconnection {
    const PROTOCOL_OP: u32 = 24;

    fn decode_with(buffer: &mut DerBuffer<'_>, context: &DecodeContext<'_>) -> LdapResult<Self> {
        let response = ExtendedResponse::decode_with(buffer, context)?;
        if response.response_name() != Some(NOTICE_OF_DISCONNECTION_OID) {
            return Err(LdapError::Decode(format!(
                "extended response {:?} is not a notice of disconnection",
                response.response_name()
            )));
        }
        Ok(Self {
            response: force_unsolicited(response),
        })
    }
}

/// Any other server-initiated extended response
#[derive(Debug, Clone, PartialEq)]
pub struct UnsolicitedNotification {
    response: ExtendedResponse,
}

impl UnsolicitedNotification {
    pub fn extended(&self) -> &ExtendedResponse {
        &self.response
    }

    pub fn response_name(&self) -> Option<&str> {
        self.response.response_name()
    }

    pub fn response_value(&self) -> Option<&[u8]> {
        self.response.response_value()
    }
}

impl Message for UnsolicitedNotification {
    fn header(&self) -> &MessageHeader {
        &self.response.header
    }
}

impl ResultMessage for UnsolicitedNotification {
    fn result(&self) -> &OperationResult {
        &self.response.result
    }
}

impl Response for UnsolicitedNotification {
    const PROTOCOL_OP: u32 = 24;

    fn decode_with(buffer: &mut DerBuffer<'_>, context: &DecodeContext<'_>) -> LdapResult<Self> {
        let response = ExtendedResponse::decode_with(buffer, context)?;
        Ok(Self {
            response: force_unsolicited(response),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldapwire_core::ResultCode;

    /// SEQ { INT id, APP(24) { ENUM code, "", "", [10] name, [11] value? } }
    fn extended_response_bytes(
        id: u8,
        code: u8,
        name: &str,
        value: Option<&[u8]>,
    ) -> Vec<u8> {
        let mut op = vec![0x0A, 0x01, code, 0x04, 0x00, 0x04, 0x00, 0x8A, name.len() as u8];
        op.extend_from_slice(name.as_bytes());
        if let Some(value) = value {
            op.extend_from_slice(&[0x8B, value.len() as u8]);
            op.extend_from_slice(value);
        }
        let mut message = vec![0x02, 0x01, id, 0x78, op.len() as u8];
        message.extend(op);
        let mut data = vec![0x30, message.len() as u8];
        data.extend(message);
        data
    }

    #[test]
    fn test_numeric_oid() {
        assert!(is_numeric_oid("1.3.6.1.4.1.4203.1.11.3"));
        assert!(is_numeric_oid("2.0"));
        assert!(!is_numeric_oid("1"));
        assert!(!is_numeric_oid("1.03"));
        assert!(!is_numeric_oid("3.1"));
        assert!(!is_numeric_oid("whoami"));
        assert!(!is_numeric_oid("1.2."));
    }

    #[test]
    fn test_extended_request_encoding() {
        let request = ExtendedRequest::builder("1.2.3").value(vec![0x01]).build().unwrap();
        assert_eq!(
            request.encode(1).unwrap().as_ref(),
            &[
                0x30, 0x0F, 0x02, 0x01, 0x01, 0x77, 0x0A, 0x80, 0x05, b'1', b'.', b'2', b'.',
                b'3', 0x81, 0x01, 0x01,
            ]
        );
        assert!(ExtendedRequest::builder("not-an-oid").build().is_err());
    }

    #[test]
    fn test_who_am_i_encoding() {
        let bytes = WhoAmIRequest::new().encode(2).unwrap();
        let mut expected = vec![0x30, 0x1E, 0x02, 0x01, 0x02, 0x77, 0x19, 0x80, 0x17];
        expected.extend_from_slice(WHO_AM_I_OID.as_bytes());
        assert_eq!(bytes.as_ref(), expected.as_slice());
    }

    #[test]
    fn test_cancel_encoding() {
        let bytes = CancelRequest::new(7).unwrap().encode(8).unwrap();
        assert_eq!(
            &bytes[bytes.len() - 7..],
            &[0x81, 0x05, 0x30, 0x03, 0x02, 0x01, 0x07]
        );
        assert!(CancelRequest::new(0).is_err());
    }

    #[test]
    fn test_start_tls_encoding() {
        let bytes = StartTlsRequest::new().encode(1).unwrap();
        assert!(bytes.ends_with(START_TLS_OID.as_bytes()));
    }

    #[test]
    fn test_decode_extended_response() {
        let data = extended_response_bytes(2, 0, WHO_AM_I_OID, Some(b"dn:cn=me"));
        let response = ExtendedResponse::decode(&data).unwrap();
        assert_eq!(response.message_id(), 2);
        assert_eq!(response.result_code(), ResultCode::Success);
        assert_eq!(response.response_name(), Some(WHO_AM_I_OID));
        assert_eq!(
            WhoAmIRequest::authz_id(&response).unwrap().as_deref(),
            Some("dn:cn=me")
        );
    }

    #[test]
    fn test_notice_of_disconnection_forces_zero_id() {
        let data = extended_response_bytes(9, 52, NOTICE_OF_DISCONNECTION_OID, None);
        let notice = NoticeOfDisconnection::decode(&data).unwrap();
        assert_eq!(notice.message_id(), 0);
        assert!(notice.is_unsolicited());
        assert_eq!(notice.result_code(), ResultCode::Unavailable);

        let other = extended_response_bytes(9, 0, WHO_AM_I_OID, None);
        assert!(NoticeOfDisconnection::decode(&other).is_err());
    }

    #[test]
    fn test_decode_intermediate_response() {
        // APP(25) { [0] "1.2", [1] 0xAA }
        let data = [
            0x30, 0x0D, 0x02, 0x01, 0x04, 0x79, 0x08, 0x80, 0x03, b'1', b'.', b'2', 0x81, 0x01,
            0xAA,
        ];
        let response = IntermediateResponse::decode(&data).unwrap();
        assert_eq!(response.message_id(), 4);
        assert_eq!(response.response_name(), Some("1.2"));
        assert_eq!(response.response_value(), Some(&[0xAA][..]));
    }
}
