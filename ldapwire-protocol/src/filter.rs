//! Search filters
//!
//! A [`SearchFilter`] is an already-rendered `Filter` CHOICE element. The
//! codec only writes it verbatim; the constructors here cover the common
//! filter shapes, anything else can be supplied as BER through
//! [`SearchFilter::from_ber`].
//!
//! ```text
//! Filter ::= CHOICE {
//!      and             [0] SET SIZE (1..MAX) OF filter Filter,
//!      or              [1] SET SIZE (1..MAX) OF filter Filter,
//!      not             [2] Filter,
//!      equalityMatch   [3] AttributeValueAssertion,
//!      substrings      [4] SubstringFilter,
//!      greaterOrEqual  [5] AttributeValueAssertion,
//!      lessOrEqual     [6] AttributeValueAssertion,
//!      present         [7] AttributeDescription,
//!      approxMatch     [8] AttributeValueAssertion,
//!      extensibleMatch [9] MatchingRuleAssertion,
//!      ...  }
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use ldapwire_asn1::{ConstructedType, DerEncoder, OctetStringType, RawType, Tag, TagClass};
use ldapwire_core::{LdapError, LdapResult};

const FILTER_AND: u32 = 0;
const FILTER_OR: u32 = 1;
const FILTER_NOT: u32 = 2;
const FILTER_EQUALITY: u32 = 3;
const FILTER_GREATER_OR_EQUAL: u32 = 5;
const FILTER_LESS_OR_EQUAL: u32 = 6;
const FILTER_PRESENT: u32 = 7;
const FILTER_APPROX: u32 = 8;
const FILTER_EXTENSIBLE: u32 = 9;

/// Pre-rendered search filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    encoded: Bytes,
}

impl SearchFilter {
    /// Wrap a BER-encoded filter
    ///
    /// The bytes must hold exactly one context-specific element with a
    /// `Filter` alternative tag (0 to 9).
    pub fn from_ber(bytes: impl Into<Bytes>) -> LdapResult<Self> {
        let raw = RawType::new(bytes)?;
        let tag = raw.tag()?;
        if tag.class() != TagClass::Context || tag.number() > FILTER_EXTENSIBLE {
            return Err(LdapError::InvalidRequest(format!(
                "{} is not a search filter element",
                tag
            )));
        }
        Ok(Self {
            encoded: Bytes::copy_from_slice(raw.as_bytes()),
        })
    }

    fn render(encoder: &impl DerEncoder) -> Self {
        Self {
            encoded: encoder.encode(),
        }
    }

    /// `(attribute=*)`
    pub fn present(attribute: &str) -> Self {
        Self::render(&OctetStringType::with_tag(
            Tag::context(false, FILTER_PRESENT),
            attribute.as_bytes(),
        ))
    }

    fn assertion(choice: u32, attribute: &str, value: impl Into<Vec<u8>>) -> Self {
        Self::render(
            &ConstructedType::new(Tag::context(true, choice))
                .with(OctetStringType::text(attribute))
                .with(OctetStringType::new(value)),
        )
    }

    /// `(attribute=value)`
    pub fn equality(attribute: &str, value: impl Into<Vec<u8>>) -> Self {
        Self::assertion(FILTER_EQUALITY, attribute, value)
    }

    /// `(attribute>=value)`
    pub fn greater_or_equal(attribute: &str, value: impl Into<Vec<u8>>) -> Self {
        Self::assertion(FILTER_GREATER_OR_EQUAL, attribute, value)
    }

    /// `(attribute<=value)`
    pub fn less_or_equal(attribute: &str, value: impl Into<Vec<u8>>) -> Self {
        Self::assertion(FILTER_LESS_OR_EQUAL, attribute, value)
    }

    /// `(attribute~=value)`
    pub fn approx(attribute: &str, value: impl Into<Vec<u8>>) -> Self {
        Self::assertion(FILTER_APPROX, attribute, value)
    }

    fn set(choice: u32, filters: impl IntoIterator<Item = SearchFilter>) -> LdapResult<Self> {
        let mut set = ConstructedType::new(Tag::context(true, choice));
        for filter in filters {
            set.push(filter);
        }
        if set.is_empty() {
            return Err(LdapError::invalid_request(
                "and/or filter requires at least one component",
            ));
        }
        Ok(Self::render(&set))
    }

    /// `(&...)`
    pub fn and(filters: impl IntoIterator<Item = SearchFilter>) -> LdapResult<Self> {
        Self::set(FILTER_AND, filters)
    }

    /// `(|...)`
    pub fn or(filters: impl IntoIterator<Item = SearchFilter>) -> LdapResult<Self> {
        Self::set(FILTER_OR, filters)
    }

    /// `(!filter)`
    pub fn not(filter: SearchFilter) -> Self {
        Self::render(&ConstructedType::new(Tag::context(true, FILTER_NOT)).with(filter))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.encoded
    }
}

impl Default for SearchFilter {
    /// `(objectClass=*)`
    fn default() -> Self {
        Self::present("objectClass")
    }
}

impl DerEncoder for SearchFilter {
    fn encoded_length(&self) -> usize {
        self.encoded.len()
    }

    fn write(&self, out: &mut BytesMut) {
        out.put_slice(&self.encoded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_object_class_present() {
        let mut expected = vec![0x87, 0x0B];
        expected.extend_from_slice(b"objectClass");
        assert_eq!(SearchFilter::default().as_bytes(), expected.as_slice());
    }

    #[test]
    fn test_equality() {
        assert_eq!(
            SearchFilter::equality("cn", "x").as_bytes(),
            &[0xA3, 0x07, 0x04, 0x02, b'c', b'n', 0x04, 0x01, b'x']
        );
    }

    #[test]
    fn test_composites() {
        let filter = SearchFilter::and([SearchFilter::present("a"), SearchFilter::present("b")])
            .unwrap();
        assert_eq!(
            filter.as_bytes(),
            &[0xA0, 0x06, 0x87, 0x01, b'a', 0x87, 0x01, b'b']
        );
        let filter = SearchFilter::not(SearchFilter::present("a"));
        assert_eq!(filter.as_bytes(), &[0xA2, 0x03, 0x87, 0x01, b'a']);
        assert!(SearchFilter::or(Vec::new()).is_err());
    }

    #[test]
    fn test_from_ber() {
        let filter = SearchFilter::from_ber(vec![0x87, 0x02, b'c', b'n']).unwrap();
        assert_eq!(filter, SearchFilter::present("cn"));
        // Universal OCTET STRING is not a filter
        assert!(SearchFilter::from_ber(vec![0x04, 0x00]).is_err());
        // Trailing garbage
        assert!(SearchFilter::from_ber(vec![0x87, 0x00, 0x00]).is_err());
        // [10] is outside the Filter CHOICE
        assert!(SearchFilter::from_ber(vec![0x8A, 0x00]).is_err());
    }
}
