//! BER encode engine
//!
//! Encoders compose bottom-up: a [`ConstructedType`] owns its children and
//! reports its length as the sum of their encoded lengths, so every header
//! can be written before its content in a single top-down pass.
//!
//! ```rust,no_run
//! use ldapwire_asn1::{ConstructedType, DerEncoder, IntegerType, OctetStringType, Tag};
//!
//! let mut seq = ConstructedType::new(Tag::SEQ);
//! seq.push(IntegerType::new(1));
//! seq.push(OctetStringType::text("cn=test"));
//! let bytes = seq.encode();
//! ```

use crate::ber::types::{Length, Tag};
use bytes::{BufMut, Bytes, BytesMut};
use ldapwire_core::{LdapError, LdapResult};

/// Anything that can render itself as a complete TLV
pub trait DerEncoder {
    /// Size of the full TLV including tag and length octets
    fn encoded_length(&self) -> usize;

    /// Append the full TLV to `out`
    fn write(&self, out: &mut BytesMut);

    fn encode(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(self.encoded_length());
        self.write(&mut out);
        out.freeze()
    }
}

impl<T: DerEncoder + ?Sized> DerEncoder for Box<T> {
    fn encoded_length(&self) -> usize {
        (**self).encoded_length()
    }

    fn write(&self, out: &mut BytesMut) {
        (**self).write(out)
    }
}

fn header_length(tag: &Tag, value_length: usize) -> usize {
    tag.encoded_len() + Length::new(value_length).encoded_len()
}

fn write_header(out: &mut BytesMut, tag: &Tag, value_length: usize) {
    tag.write(out);
    Length::new(value_length).write(out);
}

/// Minimal two's complement representation of `value`, big-endian
///
/// 127 encodes as `7F`, 128 as `00 80`, -1 as `FF`, -129 as `FF 7F`.
pub fn integer_value_bytes(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    // Drop a leading octet while the next one still carries the sign
    while start < bytes.len() - 1 {
        let (lead, next) = (bytes[start], bytes[start + 1]);
        let redundant = (lead == 0x00 && next & 0x80 == 0) || (lead == 0xFF && next & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}

/// INTEGER (or ENUMERATED, or an implicitly tagged integer)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegerType {
    tag: Tag,
    value: Vec<u8>,
}

impl IntegerType {
    pub fn new(value: i64) -> Self {
        Self::with_tag(Tag::INT, value)
    }

    pub fn enumerated(value: i64) -> Self {
        Self::with_tag(Tag::ENUM, value)
    }

    pub fn with_tag(tag: Tag, value: i64) -> Self {
        Self {
            tag,
            value: integer_value_bytes(value),
        }
    }
}

impl DerEncoder for IntegerType {
    fn encoded_length(&self) -> usize {
        header_length(&self.tag, self.value.len()) + self.value.len()
    }

    fn write(&self, out: &mut BytesMut) {
        write_header(out, &self.tag, self.value.len());
        out.put_slice(&self.value);
    }
}

/// BOOLEAN, encoded as a single `00`/`FF` octet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BooleanType {
    tag: Tag,
    value: bool,
}

impl BooleanType {
    pub fn new(value: bool) -> Self {
        Self::with_tag(Tag::BOOL, value)
    }

    pub fn with_tag(tag: Tag, value: bool) -> Self {
        Self { tag, value }
    }
}

impl DerEncoder for BooleanType {
    fn encoded_length(&self) -> usize {
        header_length(&self.tag, 1) + 1
    }

    fn write(&self, out: &mut BytesMut) {
        write_header(out, &self.tag, 1);
        out.put_u8(if self.value { 0xFF } else { 0x00 });
    }
}

/// OCTET STRING; bytes are written verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OctetStringType {
    tag: Tag,
    value: Vec<u8>,
}

impl OctetStringType {
    pub fn new(value: impl Into<Vec<u8>>) -> Self {
        Self::with_tag(Tag::OCTSTR, value)
    }

    /// UTF-8 bytes of `value`
    pub fn text(value: &str) -> Self {
        Self::new(value.as_bytes())
    }

    pub fn with_tag(tag: Tag, value: impl Into<Vec<u8>>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }
}

impl DerEncoder for OctetStringType {
    fn encoded_length(&self) -> usize {
        header_length(&self.tag, self.value.len()) + self.value.len()
    }

    fn write(&self, out: &mut BytesMut) {
        write_header(out, &self.tag, self.value.len());
        out.put_slice(&self.value);
    }
}

/// NULL, or any element with an empty value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NullType {
    tag: Tag,
}

impl NullType {
    pub fn new() -> Self {
        Self::with_tag(Tag::NULL)
    }

    pub fn with_tag(tag: Tag) -> Self {
        Self { tag }
    }
}

impl Default for NullType {
    fn default() -> Self {
        Self::new()
    }
}

impl DerEncoder for NullType {
    fn encoded_length(&self) -> usize {
        header_length(&self.tag, 0)
    }

    fn write(&self, out: &mut BytesMut) {
        write_header(out, &self.tag, 0);
    }
}

/// SEQUENCE, SET or any constructed element built from child encoders
pub struct ConstructedType {
    tag: Tag,
    children: Vec<Box<dyn DerEncoder>>,
}

impl ConstructedType {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            children: Vec::new(),
        }
    }

    pub fn sequence() -> Self {
        Self::new(Tag::SEQ)
    }

    pub fn set() -> Self {
        Self::new(Tag::SET)
    }

    pub fn push(&mut self, child: impl DerEncoder + 'static) -> &mut Self {
        self.children.push(Box::new(child));
        self
    }

    /// Chaining form of [`ConstructedType::push`]
    pub fn with(mut self, child: impl DerEncoder + 'static) -> Self {
        self.push(child);
        self
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn value_length(&self) -> usize {
        self.children.iter().map(|c| c.encoded_length()).sum()
    }
}

impl Default for ConstructedType {
    fn default() -> Self {
        Self::sequence()
    }
}

impl DerEncoder for ConstructedType {
    fn encoded_length(&self) -> usize {
        let value_length = self.value_length();
        header_length(&self.tag(), value_length) + value_length
    }

    fn write(&self, out: &mut BytesMut) {
        write_header(out, &self.tag(), self.value_length());
        for child in &self.children {
            child.write(out);
        }
    }
}

/// A pre-rendered TLV written verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawType {
    bytes: Bytes,
}

impl RawType {
    /// Wrap `bytes`, checking they hold exactly one well-formed TLV header
    /// whose length covers the rest of the input
    pub fn new(bytes: impl Into<Bytes>) -> LdapResult<Self> {
        let bytes = bytes.into();
        let mut buffer = crate::ber::decoder::DerBuffer::new(&bytes);
        buffer.read_tlv()?;
        if buffer.has_remaining() {
            return Err(LdapError::Encode(format!(
                "{} trailing bytes after pre-rendered element",
                buffer.remaining()
            )));
        }
        Ok(Self { bytes })
    }

    /// Tag of the wrapped element
    pub fn tag(&self) -> LdapResult<Tag> {
        Tag::decode(&self.bytes).map(|(tag, _)| tag)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl DerEncoder for RawType {
    fn encoded_length(&self) -> usize {
        self.bytes.len()
    }

    fn write(&self, out: &mut BytesMut) {
        out.put_slice(&self.bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_minimal_encoding() {
        assert_eq!(integer_value_bytes(0), vec![0x00]);
        assert_eq!(integer_value_bytes(1), vec![0x01]);
        assert_eq!(integer_value_bytes(127), vec![0x7F]);
        assert_eq!(integer_value_bytes(128), vec![0x00, 0x80]);
        assert_eq!(integer_value_bytes(256), vec![0x01, 0x00]);
        assert_eq!(integer_value_bytes(-1), vec![0xFF]);
        assert_eq!(integer_value_bytes(-128), vec![0x80]);
        assert_eq!(integer_value_bytes(-129), vec![0xFF, 0x7F]);
        assert_eq!(
            integer_value_bytes(i32::MAX as i64),
            vec![0x7F, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn test_encode_integer() {
        assert_eq!(IntegerType::new(3).encode().as_ref(), &[0x02, 0x01, 0x03]);
        assert_eq!(IntegerType::enumerated(6).encode().as_ref(), &[0x0A, 0x01, 0x06]);
        assert_eq!(
            IntegerType::with_tag(Tag::application(false, 16), 5).encode().as_ref(),
            &[0x50, 0x01, 0x05]
        );
    }

    #[test]
    fn test_encode_boolean() {
        assert_eq!(BooleanType::new(true).encode().as_ref(), &[0x01, 0x01, 0xFF]);
        assert_eq!(BooleanType::new(false).encode().as_ref(), &[0x01, 0x01, 0x00]);
    }

    #[test]
    fn test_encode_octet_string() {
        let bytes = OctetStringType::text("Hello").encode();
        assert_eq!(bytes.as_ref(), &[0x04, 0x05, b'H', b'e', b'l', b'l', b'o']);
        let bytes = OctetStringType::with_tag(Tag::context(false, 0), b"pw".to_vec()).encode();
        assert_eq!(bytes.as_ref(), &[0x80, 0x02, b'p', b'w']);
    }

    #[test]
    fn test_encode_null() {
        assert_eq!(NullType::new().encode().as_ref(), &[0x05, 0x00]);
        assert_eq!(
            NullType::with_tag(Tag::application(false, 2)).encode().as_ref(),
            &[0x42, 0x00]
        );
    }

    #[test]
    fn test_constructed_length_is_sum_of_children() {
        let seq = ConstructedType::sequence()
            .with(IntegerType::new(1))
            .with(ConstructedType::set().with(OctetStringType::text("a")));
        assert_eq!(seq.encoded_length(), 10);
        assert_eq!(
            seq.encode().as_ref(),
            &[0x30, 0x08, 0x02, 0x01, 0x01, 0x31, 0x03, 0x04, 0x01, b'a']
        );
    }

    #[test]
    fn test_constructed_long_form_length() {
        let seq = ConstructedType::sequence().with(OctetStringType::new(vec![0u8; 200]));
        let bytes = seq.encode();
        assert_eq!(seq.encoded_length(), bytes.len());
        assert_eq!(&bytes[..6], &[0x30, 0x81, 0xCB, 0x04, 0x81, 0xC8]);
    }

    #[test]
    fn test_raw_type() {
        let raw = RawType::new(vec![0x87, 0x02, b'c', b'n']).unwrap();
        assert_eq!(raw.tag().unwrap(), Tag::context(false, 7));
        assert_eq!(raw.encode().as_ref(), &[0x87, 0x02, b'c', b'n']);
        assert!(RawType::new(vec![0x87, 0x05, b'c']).is_err());
        assert!(RawType::new(vec![0x87, 0x00, 0x00]).is_err());
    }
}
