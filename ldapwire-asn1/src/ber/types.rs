//! BER encoding types (Tag, Length)

use bytes::{BufMut, BytesMut};
use ldapwire_core::{LdapError, LdapResult};
use std::fmt;

/// BER Tag Class
///
/// LDAP uses Universal tags for the basic types, Application tags for the
/// protocol operations and Context-specific tags for optional and CHOICE
/// fields. Private tags never appear in LDAP but are decoded so that
/// unknown elements can still be skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagClass {
    /// Universal class (00)
    Universal = 0,
    /// Application class (01)
    Application = 1,
    /// Context-specific class (10)
    Context = 2,
    /// Private class (11)
    Private = 3,
}

impl TagClass {
    /// Get tag class from bits 8-7 of the identifier octet
    pub fn from_bits(bits: u8) -> Self {
        match (bits >> 6) & 0x03 {
            0 => TagClass::Universal,
            1 => TagClass::Application,
            2 => TagClass::Context,
            _ => TagClass::Private,
        }
    }

    /// Convert tag class to identifier octet bits
    pub fn to_bits(self) -> u8 {
        (self as u8) << 6
    }
}

/// BER Tag
///
/// Immutable triple of class, number and primitive/constructed form. Two
/// tags are equal iff all three fields match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
    class: TagClass,
    constructed: bool,
    number: u32,
}

impl Tag {
    /// BOOLEAN
    pub const BOOL: Tag = Tag::new(TagClass::Universal, false, 1);
    /// INTEGER
    pub const INT: Tag = Tag::new(TagClass::Universal, false, 2);
    /// OCTET STRING
    pub const OCTSTR: Tag = Tag::new(TagClass::Universal, false, 4);
    /// NULL
    pub const NULL: Tag = Tag::new(TagClass::Universal, false, 5);
    /// ENUMERATED
    pub const ENUM: Tag = Tag::new(TagClass::Universal, false, 10);
    /// SEQUENCE / SEQUENCE OF
    pub const SEQ: Tag = Tag::new(TagClass::Universal, true, 16);
    /// SET / SET OF
    pub const SET: Tag = Tag::new(TagClass::Universal, true, 17);

    /// Create a tag
    ///
    /// # Arguments
    /// * `class` - Tag class
    /// * `constructed` - `true` for the constructed form (bit 6 set)
    /// * `number` - Tag number; values above 30 use the multi-byte form
    pub const fn new(class: TagClass, constructed: bool, number: u32) -> Self {
        Self {
            class,
            constructed,
            number,
        }
    }

    /// Create a universal-class tag
    pub const fn universal(constructed: bool, number: u32) -> Self {
        Self::new(TagClass::Universal, constructed, number)
    }

    /// Create an application-class tag
    ///
    /// LDAP protocol operations are application tags: requests and
    /// responses with a body are constructed, `UnbindRequest`,
    /// `DelRequest` and `AbandonRequest` are primitive.
    pub const fn application(constructed: bool, number: u32) -> Self {
        Self::new(TagClass::Application, constructed, number)
    }

    /// Create a context-specific tag, as used for implicitly tagged fields
    pub const fn context(constructed: bool, number: u32) -> Self {
        Self::new(TagClass::Context, constructed, number)
    }

    /// Tag class
    pub fn class(&self) -> TagClass {
        self.class
    }

    /// Whether the constructed bit is set
    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    /// Tag number within its class
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Exact triple equality
    pub fn matches(&self, candidate: &Tag) -> bool {
        self == candidate
    }

    /// Number of identifier octets this tag encodes to
    pub fn encoded_len(&self) -> usize {
        if self.number <= 30 {
            1
        } else {
            let bits = 32 - self.number.leading_zeros() as usize;
            1 + bits.div_ceil(7)
        }
    }

    /// Append the identifier octets to `out`
    ///
    /// Numbers up to 30 fit the single-octet form; larger numbers use
    /// `0x1F` followed by base-128 continuation octets.
    pub fn write(&self, out: &mut BytesMut) {
        let leading = self.class.to_bits() | if self.constructed { 0x20 } else { 0x00 };
        if self.number <= 30 {
            out.put_u8(leading | self.number as u8);
            return;
        }
        out.put_u8(leading | 0x1F);
        let count = self.encoded_len() - 1;
        for i in (0..count).rev() {
            let septet = ((self.number >> (i * 7)) & 0x7F) as u8;
            out.put_u8(if i > 0 { septet | 0x80 } else { septet });
        }
    }

    /// Encode the identifier octets into a new vector
    /// Encode the length octets into a new vector
    pub fn encode(&self) -> Vec<u8> {
        let mut out = BytesMut::with_capacity(self.encoded_len());
        self.write(&mut out);
        out.to_vec()
    }

    /// Decode tag from bytes
    ///
    /// # Arguments
    /// * `data` - Bytes starting at the identifier octet
    ///
    /// # Returns
    /// The tag and the number of bytes consumed.
    ///
    /// # Error Handling
    /// Returns error if the buffer ends inside the tag or the tag number
    /// does not fit in 32 bits.
    pub fn decode(data: &[u8]) -> LdapResult<(Self, usize)> {
        let first = *data
            .first()
            .ok_or_else(|| LdapError::decode("buffer exhausted while reading tag"))?;
        let class = TagClass::from_bits(first);
        let constructed = (first & 0x20) != 0;
        let low = first & 0x1F;
        if low < 0x1F {
            return Ok((Self::new(class, constructed, low as u32), 1));
        }

        let mut number = 0u32;
        let mut pos = 1;
        loop {
            let byte = *data
                .get(pos)
                .ok_or_else(|| LdapError::decode("incomplete multi-byte tag"))?;
            pos += 1;
            if pos > 5 {
                return Err(LdapError::decode("tag number too large"));
            }
            number = (number << 7) | (byte & 0x7F) as u32;
            if byte & 0x80 == 0 {
                break;
            }
        }
        Ok((Self::new(class, constructed, number), pos))
    }
}

impl fmt::Display for Tag {
    /// Renders the tag in path notation, e.g. `SEQ`, `APP(4)`, `CTX(0)`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class {
            TagClass::Universal => match (self.number, self.constructed) {
                (1, false) => write!(f, "BOOL"),
                (2, false) => write!(f, "INT"),
                (4, false) => write!(f, "OCTSTR"),
                (5, false) => write!(f, "NULL"),
                (10, false) => write!(f, "ENUM"),
                (16, true) => write!(f, "SEQ"),
                (17, true) => write!(f, "SET"),
                (n, _) => write!(f, "UNIV({})", n),
            },
            TagClass::Application => write!(f, "APP({})", self.number),
            TagClass::Context => write!(f, "CTX({})", self.number),
            TagClass::Private => write!(f, "PRIV({})", self.number),
        }
    }
}

/// BER Length encoding
///
/// Short form for lengths 0-127, long form with up to four length octets
/// otherwise. The indefinite form is never produced and is rejected on
/// decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Length {
    /// Short form: length 0-127
    Short(u8),
    /// Long form: length > 127, encoded with length-of-length
    Long(usize),
}

impl Length {
    /// Most length octets accepted in the long form
    pub const MAX_LENGTH_OCTETS: usize = 4;

    /// Choose short or long form for `length`
    pub fn new(length: usize) -> Self {
        if length < 128 {
            Length::Short(length as u8)
        } else {
            Length::Long(length)
        }
    }

    /// Content length in bytes, whichever form carries it
    pub fn value(&self) -> usize {
        match self {
            Length::Short(l) => *l as usize,
            Length::Long(l) => *l,
        }
    }

    fn long_octets(length: usize) -> usize {
        let bits = usize::BITS as usize - length.leading_zeros() as usize;
        bits.div_ceil(8).max(1)
    }

    /// Number of octets this length encodes to
    pub fn encoded_len(&self) -> usize {
        match self {
            Length::Short(_) => 1,
            Length::Long(length) => 1 + Self::long_octets(*length),
        }
    }

    /// Append the length octets to `out`
    ///
    /// The long form always uses the fewest octets that hold the value.
    pub fn write(&self, out: &mut BytesMut) {
        match self {
            Length::Short(length) => out.put_u8(*length),
            Length::Long(length) => {
                let count = Self::long_octets(*length);
                out.put_u8(0x80 | count as u8);
                for i in (0..count).rev() {
                    out.put_u8(((*length >> (i * 8)) & 0xFF) as u8);
                }
            }
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = BytesMut::with_capacity(self.encoded_len());
        self.write(&mut out);
        out.to_vec()
    }

    /// Decode length from bytes
    ///
    /// # Arguments
    /// * `data` - Bytes starting at the first length octet
    ///
    /// # Returns
    /// The length and the number of bytes consumed.
    ///
    /// # Error Handling
    /// Returns error on the indefinite form, on more than
    /// [`Length::MAX_LENGTH_OCTETS`] length octets, or if `data` ends early.
    pub fn decode(data: &[u8]) -> LdapResult<(Self, usize)> {
        let first = *data
            .first()
            .ok_or_else(|| LdapError::decode("buffer exhausted while reading length"))?;
        if first & 0x80 == 0 {
            return Ok((Length::Short(first), 1));
        }

        let count = (first & 0x7F) as usize;
        if count == 0 {
            return Err(LdapError::decode("indefinite length encoding not supported"));
        }
        if count > Self::MAX_LENGTH_OCTETS {
            return Err(LdapError::Decode(format!(
                "length encoding too large: {} octets (max {})",
                count,
                Self::MAX_LENGTH_OCTETS
            )));
        }
        if data.len() < 1 + count {
            return Err(LdapError::Decode(format!(
                "buffer too short for long form length: need {} bytes, got {}",
                1 + count,
                data.len()
            )));
        }
        let length = data[1..=count]
            .iter()
            .fold(0usize, |acc, b| (acc << 8) | *b as usize);
        Ok((Length::Long(length), 1 + count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_short_form() {
        assert_eq!(Tag::INT.encode(), vec![0x02]);
        assert_eq!(Tag::SEQ.encode(), vec![0x30]);
        assert_eq!(Tag::application(true, 0).encode(), vec![0x60]);
        assert_eq!(Tag::application(true, 24).encode(), vec![0x78]);
        assert_eq!(Tag::context(false, 7).encode(), vec![0x87]);
        assert_eq!(Tag::context(true, 3).encode(), vec![0xA3]);
    }

    #[test]
    fn test_tag_multi_byte() {
        let tag = Tag::context(false, 201);
        let encoded = tag.encode();
        assert_eq!(encoded, vec![0x9F, 0x81, 0x49]);
        assert_eq!(tag.encoded_len(), 3);
        assert_eq!(Tag::decode(&encoded).unwrap(), (tag, 3));
    }

    #[test]
    fn test_tag_decode() {
        let (tag, consumed) = Tag::decode(&[0x64, 0x00]).unwrap();
        assert_eq!(consumed, 1);
        assert_eq!(tag.class(), TagClass::Application);
        assert!(tag.is_constructed());
        assert_eq!(tag.number(), 4);
    }

    #[test]
    fn test_tag_decode_truncated() {
        assert!(Tag::decode(&[]).is_err());
        assert!(Tag::decode(&[0x1F, 0x81]).is_err());
    }

    #[test]
    fn test_tag_matches_exact_triple() {
        assert!(Tag::SEQ.matches(&Tag::universal(true, 16)));
        assert!(!Tag::SEQ.matches(&Tag::universal(false, 16)));
        assert!(!Tag::context(false, 0).matches(&Tag::application(false, 0)));
    }

    #[test]
    fn test_tag_display() {
        assert_eq!(Tag::OCTSTR.to_string(), "OCTSTR");
        assert_eq!(Tag::application(true, 4).to_string(), "APP(4)");
        assert_eq!(Tag::context(false, 7).to_string(), "CTX(7)");
        assert_eq!(Tag::universal(false, 6).to_string(), "UNIV(6)");
    }

    #[test]
    fn test_length_short() {
        assert_eq!(Length::new(100).encode(), vec![100]);
        assert_eq!(Length::decode(&[100]).unwrap(), (Length::Short(100), 1));
    }

    #[test]
    fn test_length_long() {
        assert_eq!(Length::new(128).encode(), vec![0x81, 0x80]);
        assert_eq!(Length::new(1000).encode(), vec![0x82, 0x03, 0xE8]);
        assert_eq!(Length::new(1000).encoded_len(), 3);
        let (length, consumed) = Length::decode(&[0x82, 0x03, 0xE8]).unwrap();
        assert_eq!(length.value(), 1000);
        assert_eq!(consumed, 3);
    }

    #[test]
    fn test_length_rejects_indefinite_and_oversized() {
        assert!(Length::decode(&[0x80]).is_err());
        assert!(Length::decode(&[0x85, 1, 2, 3, 4, 5]).is_err());
        assert!(Length::decode(&[0x82, 0x01]).is_err());
        assert!(Length::decode(&[]).is_err());
    }
}
