//! Bounded buffer view and primitive value decoding
//!
//! A [`DerBuffer`] is a view over a byte slice with a read position. Views
//! handed to parse handlers cover exactly one element's value bytes, so a
//! handler can never read into a sibling.

use crate::ber::types::{Length, Tag};
use ldapwire_core::{LdapError, LdapResult};

/// Read-only view over BER bytes with a position pointer
#[derive(Debug, Clone, Copy)]
pub struct DerBuffer<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> DerBuffer<'a> {
    /// Create a view over `data`, positioned at its first byte
    ///
    /// # Arguments
    /// * `data` - Bytes to read; the view never reads past their end
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Current read position, relative to the start of the view
    pub fn position(&self) -> usize {
        self.position
    }

    /// Total length of the view
    pub fn limit(&self) -> usize {
        self.data.len()
    }

    /// Bytes left between the position and the end of the view
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Whether any bytes are left to read
    pub fn has_remaining(&self) -> bool {
        self.position < self.data.len()
    }

    /// Move the position back to the start of the view
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// Bytes between the position and the end of the view, without consuming
    pub fn as_slice(&self) -> &'a [u8] {
        &self.data[self.position.min(self.data.len())..]
    }

    /// Read a single byte
    ///
    /// # Error Handling
    /// Returns error if the view is exhausted.
    pub fn read_u8(&mut self) -> LdapResult<u8> {
        let byte = *self
            .data
            .get(self.position)
            .ok_or_else(|| LdapError::decode("buffer exhausted while reading byte"))?;
        self.position += 1;
        Ok(byte)
    }

    /// Read `count` bytes and advance past them
    ///
    /// # Arguments
    /// * `count` - Number of bytes to read
    ///
    /// # Returns
    /// A borrow of the underlying data, no copy is made.
    ///
    /// # Error Handling
    /// Returns error if fewer than `count` bytes remain; the position is
    /// left unchanged in that case.
    pub fn read_bytes(&mut self, count: usize) -> LdapResult<&'a [u8]> {
        if count > self.remaining() {
            return Err(LdapError::Decode(format!(
                "buffer exhausted: need {} bytes, have {}",
                count,
                self.remaining()
            )));
        }
        let start = self.position;
        self.position += count;
        Ok(&self.data[start..start + count])
    }

    /// Advance past `count` bytes
    pub fn skip(&mut self, count: usize) -> LdapResult<()> {
        self.read_bytes(count).map(|_| ())
    }

    /// Consume everything up to the end of the view
    pub fn remaining_bytes(&mut self) -> &'a [u8] {
        let rest = self.as_slice();
        self.position = self.data.len();
        rest
    }

    /// A new view over the next `length` bytes; the position is not moved
    ///
    /// # Error Handling
    /// Returns error if `length` runs past the end of this view.
    pub fn slice(&self, length: usize) -> LdapResult<DerBuffer<'a>> {
        if length > self.remaining() {
            return Err(LdapError::Decode(format!(
                "element length {} exceeds remaining {} bytes",
                length,
                self.remaining()
            )));
        }
        Ok(DerBuffer::new(&self.data[self.position..self.position + length]))
    }

    /// Read the identifier octets at the position
    ///
    /// # Error Handling
    /// Returns error if the view ends inside the tag.
    pub fn read_tag(&mut self) -> LdapResult<Tag> {
        let (tag, consumed) = Tag::decode(self.as_slice())?;
        self.position += consumed;
        Ok(tag)
    }

    /// Read a length and check it fits in the rest of the view
    ///
    /// # Returns
    /// The content length in bytes.
    ///
    /// # Error Handling
    /// Returns error on the indefinite form, on oversized length fields, and
    /// when the declared length exceeds the bytes left after the length
    /// octets.
    pub fn read_length(&mut self) -> LdapResult<usize> {
        let (length, consumed) = Length::decode(self.as_slice())?;
        self.position += consumed;
        let length = length.value();
        if length > self.remaining() {
            return Err(LdapError::Decode(format!(
                "declared length {} exceeds remaining {} bytes",
                length,
                self.remaining()
            )));
        }
        Ok(length)
    }

    /// Decode a complete TLV, returning the tag and a view over its value
    ///
    /// The position moves past the whole element, so repeated calls walk
    /// siblings. The returned view starts at its own position 0.
    ///
    /// # Error Handling
    /// Returns error if the tag or length is malformed or the value is
    /// truncated.
    pub fn read_tlv(&mut self) -> LdapResult<(Tag, DerBuffer<'a>)> {
        let tag = self.read_tag()?;
        let length = self.read_length()?;
        let value = self.slice(length)?;
        self.position += length;
        Ok((tag, value))
    }

    /// Decode the rest of the view as a two's complement INTEGER/ENUMERATED value
    pub fn read_integer_value(&mut self) -> LdapResult<i64> {
        let bytes = self.remaining_bytes();
        if bytes.is_empty() {
            return Err(LdapError::decode("empty integer encoding"));
        }
        if bytes.len() > 8 {
            return Err(LdapError::Decode(format!(
                "integer too large: {} bytes (max 8)",
                bytes.len()
            )));
        }
        let value = bytes.iter().fold(0i64, |acc, b| (acc << 8) | *b as i64);
        // Sign extend from the top bit of the first octet
        let shift = 64 - bytes.len() * 8;
        Ok((value << shift) >> shift)
    }

    /// Decode the rest of the view as an INTEGER that must fit in `i32`
    pub fn read_int32_value(&mut self) -> LdapResult<i32> {
        let value = self.read_integer_value()?;
        i32::try_from(value)
            .map_err(|_| LdapError::Decode(format!("integer {} out of range", value)))
    }

    /// Decode the rest of the view as a BOOLEAN; any nonzero octet is true
    pub fn read_boolean_value(&mut self) -> LdapResult<bool> {
        let bytes = self.remaining_bytes();
        match bytes {
            [b] => Ok(*b != 0),
            _ => Err(LdapError::Decode(format!(
                "boolean value must be 1 byte, got {}",
                bytes.len()
            ))),
        }
    }

    /// Copy the rest of the view as an OCTET STRING value
    pub fn read_octets_value(&mut self) -> Vec<u8> {
        self.remaining_bytes().to_vec()
    }

    /// Decode the rest of the view as a UTF-8 LDAPString
    pub fn read_string_value(&mut self) -> LdapResult<String> {
        Ok(String::from_utf8(self.read_octets_value())?)
    }
}

/// Find the protocolOp tag of an LDAPMessage without consuming the caller's view
///
/// Reads the outer SEQUENCE, skips the messageID INTEGER and returns the
/// tag of the following element.
pub fn peek_operation_tag(buffer: &DerBuffer<'_>) -> LdapResult<Tag> {
    let mut view = *buffer;
    view.rewind();
    let (outer, mut content) = view.read_tlv()?;
    if outer != Tag::SEQ {
        return Err(LdapError::Decode(format!(
            "expected LDAPMessage SEQUENCE, got {}",
            outer
        )));
    }
    let (id_tag, _) = content.read_tlv()?;
    if id_tag != Tag::INT {
        return Err(LdapError::Decode(format!(
            "expected messageID INTEGER, got {}",
            id_tag
        )));
    }
    content.read_tag()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_integer_value() {
        assert_eq!(DerBuffer::new(&[0x01]).read_integer_value().unwrap(), 1);
        assert_eq!(DerBuffer::new(&[0x00, 0x80]).read_integer_value().unwrap(), 128);
        assert_eq!(DerBuffer::new(&[0xFF]).read_integer_value().unwrap(), -1);
        assert_eq!(DerBuffer::new(&[0xFF, 0x7F]).read_integer_value().unwrap(), -129);
        assert_eq!(
            DerBuffer::new(&[0x7F, 0xFF, 0xFF, 0xFF]).read_integer_value().unwrap(),
            i32::MAX as i64
        );
        assert!(DerBuffer::new(&[]).read_integer_value().is_err());
        assert!(DerBuffer::new(&[0; 9]).read_integer_value().is_err());
    }

    #[test]
    fn test_read_int32_range() {
        let data = [0x01, 0x00, 0x00, 0x00, 0x00];
        assert!(DerBuffer::new(&data).read_int32_value().is_err());
    }

    #[test]
    fn test_read_boolean_value() {
        assert!(DerBuffer::new(&[0xFF]).read_boolean_value().unwrap());
        assert!(DerBuffer::new(&[0x01]).read_boolean_value().unwrap());
        assert!(!DerBuffer::new(&[0x00]).read_boolean_value().unwrap());
        assert!(DerBuffer::new(&[0x00, 0x00]).read_boolean_value().is_err());
    }

    #[test]
    fn test_read_tlv_and_slice_bounds() {
        let data = [0x04, 0x02, b'h', b'i', 0x02, 0x01, 0x05];
        let mut buffer = DerBuffer::new(&data);
        let (tag, mut value) = buffer.read_tlv().unwrap();
        assert_eq!(tag, Tag::OCTSTR);
        assert_eq!(value.read_string_value().unwrap(), "hi");
        let (tag, mut value) = buffer.read_tlv().unwrap();
        assert_eq!(tag, Tag::INT);
        assert_eq!(value.read_integer_value().unwrap(), 5);
        assert!(!buffer.has_remaining());
    }

    #[test]
    fn test_length_past_end_is_error() {
        let data = [0x04, 0x05, b'a', b'b'];
        assert!(DerBuffer::new(&data).read_tlv().is_err());
    }

    #[test]
    fn test_rewind() {
        let data = [0x05, 0x00];
        let mut buffer = DerBuffer::new(&data);
        buffer.read_tlv().unwrap();
        assert_eq!(buffer.remaining(), 0);
        buffer.rewind();
        assert_eq!(buffer.remaining(), 2);
    }

    #[test]
    fn test_invalid_utf8_string() {
        assert!(DerBuffer::new(&[0xC3, 0x28]).read_string_value().is_err());
    }

    #[test]
    fn test_peek_operation_tag() {
        // SEQ { INT 1, APP(1) { ... } }
        let data = [
            0x30, 0x0C, 0x02, 0x01, 0x01, 0x61, 0x07, 0x0A, 0x01, 0x00, 0x04, 0x00, 0x04, 0x00,
        ];
        let buffer = DerBuffer::new(&data);
        assert_eq!(
            peek_operation_tag(&buffer).unwrap(),
            Tag::application(true, 1)
        );
        assert_eq!(buffer.position(), 0);
        assert!(peek_operation_tag(&DerBuffer::new(&data[..5])).is_err());
    }
}
