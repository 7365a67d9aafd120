//! Server-side sort response control (RFC 2891)
//!
//! ```text
//! SortResult ::= SEQUENCE {
//!    sortResult  ENUMERATED { ... },
//!    attributeType [0] AttributeDescription OPTIONAL }
//! ```

use super::{control_error, required_value, ResponseControl};
use ldapwire_asn1::{DerBuffer, DerParser, DerPath, PathNode, Tag};
use ldapwire_core::{Control, LdapResult, ResultCode};
use once_cell::sync::Lazy;

pub const SORT_RESPONSE_OID: &str = "1.2.840.113556.1.4.474";

#[derive(Debug, Default)]
struct SortState {
    result: Option<i64>,
    attribute_type: Option<String>,
}

fn read_sort_result(state: &mut SortState, buffer: &mut DerBuffer<'_>) -> LdapResult<()> {
    state.result = Some(buffer.read_integer_value()?);
    Ok(())
}

fn read_attribute_type(state: &mut SortState, buffer: &mut DerBuffer<'_>) -> LdapResult<()> {
    state.attribute_type = Some(buffer.read_string_value()?);
    Ok(())
}

static SORT_PARSER: Lazy<DerParser<SortState>> = Lazy::new(|| {
    let value = DerPath::new().child(PathNode::new(Tag::SEQ));
    let mut parser = DerParser::new();
    parser
        .register(value.child(PathNode::new(Tag::ENUM)), read_sort_result)
        .register(value.child(PathNode::context(0)), read_attribute_type);
    parser
});

/// Outcome of a server-side sort
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortResponseControl {
    pub result: ResultCode,
    /// Attribute that caused the sort to fail, when the server names one
    pub attribute_type: Option<String>,
    pub critical: bool,
}

impl SortResponseControl {
    /// Registry decoder for [`SORT_RESPONSE_OID`]
    pub fn decode(control: &Control) -> LdapResult<ResponseControl> {
        let mut state = SortState::default();
        SORT_PARSER.parse(&mut DerBuffer::new(required_value(control)?), &mut state)?;
        let code = state
            .result
            .ok_or_else(|| control_error(SORT_RESPONSE_OID, "missing sortResult"))?;
        Ok(ResponseControl::SortResponse(Self {
            result: ResultCode::from_code(code)?,
            attribute_type: state.attribute_type,
            critical: control.critical,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_success() {
        let control = Control::new(SORT_RESPONSE_OID, false, Some(vec![0x30, 0x03, 0x0A, 0x01, 0x00]));
        assert_eq!(
            SortResponseControl::decode(&control).unwrap(),
            ResponseControl::SortResponse(SortResponseControl {
                result: ResultCode::Success,
                attribute_type: None,
                critical: false,
            })
        );
    }

    #[test]
    fn test_decode_with_attribute_type() {
        // SEQ { ENUM 16, [0] "sn" }
        let value = vec![0x30, 0x07, 0x0A, 0x01, 0x10, 0x80, 0x02, b's', b'n'];
        let control = Control::new(SORT_RESPONSE_OID, false, Some(value));
        let ResponseControl::SortResponse(sort) = SortResponseControl::decode(&control).unwrap()
        else {
            panic!("expected sort response");
        };
        assert_eq!(sort.result, ResultCode::NoSuchAttribute);
        assert_eq!(sort.attribute_type.as_deref(), Some("sn"));
    }

    #[test]
    fn test_missing_result_is_error() {
        let control = Control::new(SORT_RESPONSE_OID, false, Some(vec![0x30, 0x00]));
        assert!(SortResponseControl::decode(&control).is_err());
    }
}
