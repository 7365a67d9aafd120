//! LDAPMessage envelope
//!
//! ```text
//! LDAPMessage ::= SEQUENCE {
//!      messageID       MessageID,
//!      protocolOp      CHOICE { ... },
//!      controls       [0] Controls OPTIONAL }
//! ```
//!
//! Every request renders through [`encode_message`]; every response decode
//! builds its own [`DerParser`] over a decode state and registers the
//! shared messageID and controls paths next to its own fields.

use crate::control::{ControlRegistry, ResponseControl};
use bytes::Bytes;
use ldapwire_asn1::{
    peek_operation_tag, BooleanType, ConstructedType, DerBuffer, DerEncoder, DerParser, DerPath,
    IntegerType, OctetStringType, PathNode, Tag, TagClass,
};
use ldapwire_core::{Control, LdapError, LdapResult};
use once_cell::sync::Lazy;

/// Message ID carried by every unsolicited notification
pub const UNSOLICITED_MESSAGE_ID: i32 = 0;

static MESSAGE_ID_PATH: Lazy<DerPath> = Lazy::new(|| {
    DerPath::new()
        .child(PathNode::new(Tag::SEQ).at(0))
        .child(PathNode::new(Tag::INT).at(0))
});

static CONTROL_PATH: Lazy<DerPath> = Lazy::new(|| {
    DerPath::new()
        .child(PathNode::new(Tag::SEQ).at(0))
        .child(PathNode::context(0))
        .child(PathNode::new(Tag::SEQ))
});

/// Fields shared by every server message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageHeader {
    pub message_id: i32,
    pub controls: Vec<ResponseControl>,
}

impl MessageHeader {
    pub fn new(message_id: i32) -> Self {
        Self {
            message_id,
            controls: Vec::new(),
        }
    }
}

/// Capability shared by all decoded server messages
pub trait Message {
    fn header(&self) -> &MessageHeader;

    fn message_id(&self) -> i32 {
        self.header().message_id
    }

    fn controls(&self) -> &[ResponseControl] {
        &self.header().controls
    }

    /// First attached control with the given OID
    fn control(&self, oid: &str) -> Option<&ResponseControl> {
        self.controls().iter().find(|c| c.oid() == oid)
    }

    /// Whether the server sent this message without a matching request
    fn is_unsolicited(&self) -> bool {
        self.message_id() == UNSOLICITED_MESSAGE_ID
    }
}

/// Client-originated operation that can be rendered to the wire
pub trait Request {
    /// Encoder for the application-tagged protocolOp element
    fn protocol_op(&self) -> Box<dyn DerEncoder>;

    /// Controls attached to this request
    fn controls(&self) -> &[Control];

    /// Render the complete LDAPMessage
    ///
    /// # Errors
    /// Fails when `message_id` is not positive.
    fn encode(&self, message_id: i32) -> LdapResult<Bytes> {
        encode_message(message_id, self.protocol_op(), self.controls())
    }
}

/// What a response decode needs besides the bytes themselves
#[derive(Debug, Clone, Copy)]
pub struct DecodeContext<'a> {
    pub registry: &'a ControlRegistry,
    pub max_depth: usize,
}

impl Default for DecodeContext<'static> {
    fn default() -> Self {
        Self {
            registry: ControlRegistry::global(),
            max_depth: DerParser::<()>::DEFAULT_MAX_DEPTH,
        }
    }
}

/// Server message decodable from a complete LDAPMessage buffer
pub trait Response: Message + Sized {
    /// Application tag number of the protocolOp
    const PROTOCOL_OP: u32;

    /// Decode from `buffer`, interpreting controls through `context`
    fn decode_with(buffer: &mut DerBuffer<'_>, context: &DecodeContext<'_>) -> LdapResult<Self>;

    /// Decode using the default control registry and limits
    fn decode(data: &[u8]) -> LdapResult<Self> {
        Self::decode_with(&mut DerBuffer::new(data), &DecodeContext::default())
    }
}

/// Render `(message_id, protocol_op, controls)` as an LDAPMessage
///
/// Message ID 0 belongs to unsolicited notifications, so client requests
/// must use a positive ID.
pub fn encode_message(
    message_id: i32,
    protocol_op: Box<dyn DerEncoder>,
    controls: &[Control],
) -> LdapResult<Bytes> {
    if message_id <= UNSOLICITED_MESSAGE_ID {
        return Err(LdapError::InvalidRequest(format!(
            "message ID must be positive, got {}",
            message_id
        )));
    }
    let mut message = ConstructedType::sequence()
        .with(IntegerType::new(message_id as i64))
        .with(protocol_op);
    if !controls.is_empty() {
        let mut list = ConstructedType::new(Tag::context(true, 0));
        for control in controls {
            list.push(control_encoder(control));
        }
        message.push(list);
    }
    Ok(message.encode())
}

/// Generic Control SEQUENCE; criticality is omitted when false
pub fn control_encoder(control: &Control) -> ConstructedType {
    let mut seq = ConstructedType::sequence().with(OctetStringType::text(&control.oid));
    if control.critical {
        seq.push(BooleanType::new(true));
    }
    if let Some(value) = &control.value {
        seq.push(OctetStringType::new(value.clone()));
    }
    seq
}

#[derive(Debug, Default)]
struct ControlState {
    oid: Option<String>,
    critical: bool,
    value: Option<Vec<u8>>,
}

fn read_control_oid(state: &mut ControlState, buffer: &mut DerBuffer<'_>) -> LdapResult<()> {
    state.oid = Some(buffer.read_string_value()?);
    Ok(())
}

fn read_control_criticality(state: &mut ControlState, buffer: &mut DerBuffer<'_>) -> LdapResult<()> {
    state.critical = buffer.read_boolean_value()?;
    Ok(())
}

fn read_control_value(state: &mut ControlState, buffer: &mut DerBuffer<'_>) -> LdapResult<()> {
    state.value = Some(buffer.read_octets_value());
    Ok(())
}

static CONTROL_PARSER: Lazy<DerParser<ControlState>> = Lazy::new(|| {
    let mut parser = DerParser::new();
    parser
        .register(DerPath::new().child(PathNode::new(Tag::OCTSTR).at(0)), read_control_oid)
        .register(DerPath::new().child(PathNode::new(Tag::BOOL).at(0)), read_control_criticality)
        .register(DerPath::new().child(PathNode::new(Tag::OCTSTR).at(1)), read_control_value);
    parser
});

/// Decode the content of one Control SEQUENCE
pub fn decode_control(buffer: &mut DerBuffer<'_>) -> LdapResult<Control> {
    let mut state = ControlState::default();
    CONTROL_PARSER.parse(buffer, &mut state)?;
    let oid = state
        .oid
        .ok_or_else(|| LdapError::decode("control without controlType"))?;
    Ok(Control::new(oid, state.critical, state.value))
}

/// Envelope fields collected during a parse pass
#[derive(Debug, Default)]
pub(crate) struct HeaderState {
    message_id: Option<i32>,
    controls: Vec<Control>,
}

impl HeaderState {
    /// Resolve the collected controls and require a messageID
    pub(crate) fn finish(self, context: &DecodeContext<'_>) -> LdapResult<MessageHeader> {
        let message_id = self
            .message_id
            .ok_or_else(|| LdapError::decode("LDAPMessage without messageID"))?;
        let controls = self
            .controls
            .into_iter()
            .map(|control| context.registry.decode(control))
            .collect();
        Ok(MessageHeader {
            message_id,
            controls,
        })
    }
}

/// Result fields collected during a parse pass
#[derive(Debug, Default)]
pub(crate) struct ResultState {
    pub(crate) result_code: Option<i64>,
    pub(crate) matched_dn: Option<String>,
    pub(crate) diagnostic_message: Option<String>,
    pub(crate) referral_urls: Vec<String>,
}

/// Parse state of one response decode: envelope, result and
/// operation-specific fields
#[derive(Debug, Default)]
pub(crate) struct DecodeState<E> {
    pub(crate) header: HeaderState,
    pub(crate) result: ResultState,
    pub(crate) extra: E,
}

fn read_message_id<E>(state: &mut DecodeState<E>, buffer: &mut DerBuffer<'_>) -> LdapResult<()> {
    let id = buffer.read_int32_value()?;
    if id < 0 {
        return Err(LdapError::Decode(format!("negative messageID {}", id)));
    }
    state.header.message_id = Some(id);
    Ok(())
}

fn read_control<E>(state: &mut DecodeState<E>, buffer: &mut DerBuffer<'_>) -> LdapResult<()> {
    let control = decode_control(buffer)?;
    state.header.controls.push(control);
    Ok(())
}

/// Parser with the messageID and controls paths already registered
pub(crate) fn message_parser<E>(context: &DecodeContext<'_>) -> DerParser<DecodeState<E>> {
    let mut parser = DerParser::new().with_max_depth(context.max_depth);
    parser
        .register(MESSAGE_ID_PATH.clone(), read_message_id::<E>)
        .register(CONTROL_PATH.clone(), read_control::<E>);
    parser
}

/// `/SEQ[0]/APP(op)`
pub(crate) fn operation_path(op: u32) -> DerPath {
    DerPath::new()
        .child(PathNode::new(Tag::SEQ).at(0))
        .child(PathNode::application(op))
}

/// Fail unless the buffer holds exactly one LDAPMessage and nothing after it
pub(crate) fn expect_single_message(buffer: &DerBuffer<'_>) -> LdapResult<()> {
    let mut whole = *buffer;
    whole.rewind();
    whole.read_tlv()?;
    if whole.has_remaining() {
        return Err(LdapError::Decode(format!(
            "{} trailing bytes after LDAPMessage",
            whole.remaining()
        )));
    }
    Ok(())
}

/// Fail unless the buffer is a single LDAPMessage whose protocolOp carries
/// application tag `op`
pub(crate) fn expect_operation(buffer: &DerBuffer<'_>, op: u32) -> LdapResult<()> {
    expect_single_message(buffer)?;
    let tag = peek_operation_tag(buffer)?;
    if tag.class() != TagClass::Application || tag.number() != op {
        return Err(LdapError::Decode(format!(
            "expected protocolOp APP({}), found {}",
            op, tag
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldapwire_asn1::NullType;

    #[test]
    fn test_encode_message_rejects_reserved_ids() {
        let op = || Box::new(NullType::with_tag(Tag::application(false, 2))) as Box<dyn DerEncoder>;
        assert!(matches!(
            encode_message(0, op(), &[]),
            Err(LdapError::InvalidRequest(_))
        ));
        assert!(encode_message(-5, op(), &[]).is_err());
        assert_eq!(
            encode_message(1, op(), &[]).unwrap().as_ref(),
            &[0x30, 0x05, 0x02, 0x01, 0x01, 0x42, 0x00]
        );
    }

    #[test]
    fn test_encode_message_with_controls() {
        let op = Box::new(NullType::with_tag(Tag::application(false, 2)));
        let controls = [Control::new("1.2.3", true, Some(vec![0xAB]))];
        let bytes = encode_message(2, op, &controls).unwrap();
        assert_eq!(
            bytes.as_ref(),
            &[
                0x30, 0x16, 0x02, 0x01, 0x02, 0x42, 0x00, // id, unbind
                0xA0, 0x0F, 0x30, 0x0D, // controls, control
                0x04, 0x05, b'1', b'.', b'2', b'.', b'3', // controlType
                0x01, 0x01, 0xFF, // criticality
                0x04, 0x01, 0xAB, // controlValue
            ]
        );
    }

    #[test]
    fn test_non_critical_control_omits_boolean() {
        let bytes = control_encoder(&Control::flag("1.2", false)).encode();
        assert_eq!(bytes.as_ref(), &[0x30, 0x05, 0x04, 0x03, b'1', b'.', b'2']);
    }

    #[test]
    fn test_decode_control() {
        let data = [0x04, 0x03, b'1', b'.', b'2', 0x01, 0x01, 0xFF, 0x04, 0x00];
        let control = decode_control(&mut DerBuffer::new(&data)).unwrap();
        assert_eq!(control, Control::new("1.2", true, Some(Vec::new())));

        let data = [0x04, 0x03, b'1', b'.', b'2'];
        let control = decode_control(&mut DerBuffer::new(&data)).unwrap();
        assert!(!control.critical);
        assert_eq!(control.value, None);

        assert!(decode_control(&mut DerBuffer::new(&[0x01, 0x01, 0xFF])).is_err());
    }

    #[test]
    fn test_expect_operation() {
        let data = [0x30, 0x05, 0x02, 0x01, 0x01, 0x42, 0x00];
        let buffer = DerBuffer::new(&data);
        assert!(expect_operation(&buffer, 2).is_ok());
        assert!(expect_operation(&buffer, 1).is_err());

        let mut trailing = data.to_vec();
        trailing.extend_from_slice(&[0x04, 0x00]);
        assert!(expect_single_message(&DerBuffer::new(&trailing)).is_err());
        assert!(expect_operation(&DerBuffer::new(&trailing), 2).is_err());
    }
}
