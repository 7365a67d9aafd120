//! Simple paged results control (RFC 2696)
//!
//! ```text
//! realSearchControlValue ::= SEQUENCE {
//!         size            INTEGER (0..maxInt),
//!         cookie          OCTET STRING }
//! ```
//!
//! The same value shape is used in both directions: the client sends the
//! requested page size and the cookie from the previous page, the server
//! answers with an estimated total and the cookie for the next page.

use super::{control_error, required_value, ResponseControl};
use ldapwire_asn1::{
    ConstructedType, DerBuffer, DerEncoder, DerParser, DerPath, IntegerType, OctetStringType,
    PathNode, Tag,
};
use ldapwire_core::{Control, LdapError, LdapResult};
use once_cell::sync::Lazy;

pub const PAGED_RESULTS_OID: &str = "1.2.840.113556.1.4.319";

#[derive(Debug, Default)]
struct PagedState {
    size: Option<i32>,
    cookie: Option<Vec<u8>>,
}

fn read_size(state: &mut PagedState, buffer: &mut DerBuffer<'_>) -> LdapResult<()> {
    state.size = Some(buffer.read_int32_value()?);
    Ok(())
}

fn read_cookie(state: &mut PagedState, buffer: &mut DerBuffer<'_>) -> LdapResult<()> {
    state.cookie = Some(buffer.read_octets_value());
    Ok(())
}

static PAGED_PARSER: Lazy<DerParser<PagedState>> = Lazy::new(|| {
    let value = DerPath::new().child(PathNode::new(Tag::SEQ));
    let mut parser = DerParser::new();
    parser
        .register(value.child(PathNode::new(Tag::INT)), read_size)
        .register(value.child(PathNode::new(Tag::OCTSTR)), read_cookie);
    parser
});

/// Page size (request) or result-size estimate (response) plus cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagedResultsControl {
    pub size: i32,
    /// Empty on the first request and on the last page
    pub cookie: Vec<u8>,
    pub critical: bool,
}

impl PagedResultsControl {
    /// Request the first page of at most `size` entries
    pub fn new(size: i32) -> LdapResult<Self> {
        Self::with_cookie(size, Vec::new())
    }

    /// Request the page following the one that returned `cookie`
    pub fn with_cookie(size: i32, cookie: Vec<u8>) -> LdapResult<Self> {
        if size < 0 {
            return Err(LdapError::InvalidRequest(format!(
                "page size must not be negative, got {}",
                size
            )));
        }
        Ok(Self {
            size,
            cookie,
            critical: false,
        })
    }

    pub fn critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }

    /// Whether the server has no further pages
    pub fn is_last_page(&self) -> bool {
        self.cookie.is_empty()
    }

    fn value(&self) -> Vec<u8> {
        ConstructedType::sequence()
            .with(IntegerType::new(self.size as i64))
            .with(OctetStringType::new(self.cookie.clone()))
            .encode()
            .to_vec()
    }

    /// Registry decoder for [`PAGED_RESULTS_OID`]
    pub fn decode(control: &Control) -> LdapResult<ResponseControl> {
        let mut state = PagedState::default();
        PAGED_PARSER.parse(&mut DerBuffer::new(required_value(control)?), &mut state)?;
        let size = state
            .size
            .ok_or_else(|| control_error(PAGED_RESULTS_OID, "missing size"))?;
        let cookie = state
            .cookie
            .ok_or_else(|| control_error(PAGED_RESULTS_OID, "missing cookie"))?;
        Ok(ResponseControl::PagedResults(Self {
            size,
            cookie,
            critical: control.critical,
        }))
    }
}

impl From<PagedResultsControl> for Control {
    fn from(paged: PagedResultsControl) -> Self {
        Control::new(PAGED_RESULTS_OID, paged.critical, Some(paged.value()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_value() {
        let control: Control = PagedResultsControl::new(100).unwrap().into();
        assert_eq!(control.oid, PAGED_RESULTS_OID);
        assert!(!control.critical);
        assert_eq!(control.value(), Some(&[0x30, 0x05, 0x02, 0x01, 0x64, 0x04, 0x00][..]));
    }

    #[test]
    fn test_negative_size_rejected() {
        assert!(PagedResultsControl::new(-1).is_err());
    }

    #[test]
    fn test_decode_response() {
        let value = vec![0x30, 0x08, 0x02, 0x02, 0x01, 0xF4, 0x04, 0x02, 0xCA, 0xFE];
        let control = Control::new(PAGED_RESULTS_OID, false, Some(value));
        match PagedResultsControl::decode(&control).unwrap() {
            ResponseControl::PagedResults(paged) => {
                assert_eq!(paged.size, 500);
                assert_eq!(paged.cookie, vec![0xCA, 0xFE]);
                assert!(!paged.is_last_page());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_decode_requires_value() {
        let control = Control::flag(PAGED_RESULTS_OID, false);
        assert!(matches!(
            PagedResultsControl::decode(&control),
            Err(LdapError::Control { .. })
        ));
    }
}
