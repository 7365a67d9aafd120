//! ldapwire - LDAPv3 client wire-protocol codec
//!
//! Encodes client requests to BER and decodes server responses back into
//! typed messages. Transport, framing and connection management are left to
//! the caller; every call works on one complete LDAPMessage.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `ldapwire-core`: error type, result codes, attributes, controls, configuration
//! - `ldapwire-asn1`: BER tags, path matcher, path-driven parser, encoders
//! - `ldapwire-protocol`: requests, responses, control registry, dispatcher
//!
//! # Usage
//!
//! ```no_run
//! use ldapwire::protocol::{Request, ResponseParser, SearchFilter, SearchRequest};
//!
//! # fn run(incoming: &[u8]) -> ldapwire::LdapResult<()> {
//! let request = SearchRequest::builder("dc=example,dc=com")
//!     .filter(SearchFilter::equality("uid", "jdoe"))
//!     .attribute("cn")
//!     .build()?;
//! let bytes = request.encode(1)?;
//!
//! let parser = ResponseParser::new();
//! if let Some(message) = parser.parse(incoming)? {
//!     println!("message {} final={}", message.message_id(), message.is_final());
//! }
//! # Ok(())
//! # }
//! ```

// Re-export core types
pub use ldapwire_core::{
    Attribute, CodecConfig, Control, LdapError, LdapResult, Modification, ModificationType,
    ResultCode,
};

// Re-export the BER engine
pub mod asn1 {
    pub use ldapwire_asn1::*;
}

// Re-export the message model
pub mod protocol {
    pub use ldapwire_protocol::*;
}

#[cfg(test)]
mod tests {
    use super::asn1::{ConstructedType, DerEncoder, IntegerType, OctetStringType, Tag};
    use super::protocol::control::PagedResultsControl;
    use super::protocol::message::control_encoder;
    use super::protocol::{
        ExternalMechanism, Message, Request, ResponseControl, ResponseMessage, ResponseParser,
        ResultMessage, SaslBindSession, SearchFilter, SearchRequest,
    };
    use super::*;

    fn message(id: i64, op: ConstructedType, controls: &[Control]) -> Vec<u8> {
        let mut seq = ConstructedType::sequence().with(IntegerType::new(id)).with(op);
        if !controls.is_empty() {
            let mut list = ConstructedType::new(Tag::context(true, 0));
            for control in controls {
                list.push(control_encoder(control));
            }
            seq.push(list);
        }
        seq.encode().to_vec()
    }

    fn result_op(op: u32, code: i64) -> ConstructedType {
        ConstructedType::new(Tag::application(true, op))
            .with(IntegerType::enumerated(code))
            .with(OctetStringType::text(""))
            .with(OctetStringType::text(""))
    }

    #[test]
    fn test_paged_search_exchange() {
        let request = SearchRequest::builder("dc=example,dc=com")
            .filter(SearchFilter::present("uid"))
            .attribute("cn")
            .control(PagedResultsControl::new(2).unwrap())
            .build()
            .unwrap();
        let encoded = request.encode(5).unwrap();
        assert_eq!(encoded[0], 0x30);

        let entry = ConstructedType::new(Tag::application(true, 4))
            .with(OctetStringType::text("uid=a,dc=example,dc=com"))
            .with(
                ConstructedType::sequence().with(
                    ConstructedType::sequence()
                        .with(OctetStringType::text("cn"))
                        .with(ConstructedType::set().with(OctetStringType::text("Alice"))),
                ),
            );
        let cookie: Control = PagedResultsControl::with_cookie(0, b"next".to_vec())
            .unwrap()
            .into();

        let parser = ResponseParser::new();
        let first = parser.parse(&message(5, entry, &[])).unwrap().unwrap();
        let ResponseMessage::SearchEntry(entry) = &first else {
            panic!("expected entry, got {:?}", first);
        };
        assert_eq!(entry.dn(), "uid=a,dc=example,dc=com");
        assert_eq!(
            entry.attribute("CN").map(|a| a.string_values()),
            Some(vec!["Alice".to_string()])
        );
        assert!(!first.is_final());

        let done = parser
            .parse(&message(5, result_op(5, 0), &[cookie]))
            .unwrap()
            .unwrap();
        assert!(done.is_final());
        assert_eq!(done.result().map(|r| r.result_code), Some(ResultCode::Success));
        let Some(ResponseControl::PagedResults(paged)) = done.controls().first() else {
            panic!("expected paged results control, got {:?}", done.controls());
        };
        assert!(!paged.is_last_page());
    }

    #[test]
    fn test_sasl_external_exchange() {
        let mut session = SaslBindSession::new(ExternalMechanism::new());
        let request = session.start().unwrap();
        assert!(request.encode(1).is_ok());

        let bytes = message(1, result_op(1, 0), &[]);
        let Some(ResponseMessage::Bind(response)) = ResponseParser::new().parse(&bytes).unwrap()
        else {
            panic!("expected bind response");
        };
        assert_eq!(response.message_id(), 1);
        assert!(session.step(&response).unwrap().is_none());
        assert!(session.is_complete());
    }

    #[test]
    fn test_failed_sasl_bind_reports_code() {
        let mut session = SaslBindSession::new(ExternalMechanism::new());
        session.start().unwrap();
        let bytes = message(1, result_op(1, 49), &[]);
        let Some(ResponseMessage::Bind(response)) = ResponseParser::new().parse(&bytes).unwrap()
        else {
            panic!("expected bind response");
        };
        assert_eq!(response.result_code(), ResultCode::InvalidCredentials);
        assert!(matches!(
            session.step(&response),
            Err(LdapError::SaslBind {
                code: ResultCode::InvalidCredentials,
                ..
            })
        ));
    }
}
