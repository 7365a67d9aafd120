//! ASN.1 BER processing for the LDAP wire protocol
//!
//! This crate provides the tag model, the path matcher, the path-driven
//! parse engine and the encode engine used by `ldapwire-protocol`.
//!
//! ```rust,no_run
//! use ldapwire_asn1::{DerBuffer, DerParser, DerPath};
//!
//! fn message_id(state: &mut i64, buffer: &mut DerBuffer<'_>) -> ldapwire_core::LdapResult<()> {
//!     *state = buffer.read_integer_value()?;
//!     Ok(())
//! }
//!
//! # fn run(data: &[u8]) -> ldapwire_core::LdapResult<()> {
//! let mut parser = DerParser::new();
//! parser.register(DerPath::parse("/SEQ/INT[0]")?, message_id);
//! let mut id = 0;
//! parser.parse(&mut DerBuffer::new(data), &mut id)?;
//! # Ok(())
//! # }
//! ```

pub mod ber;

pub use ber::{
    peek_operation_tag, BooleanType, ConstructedType, DerBuffer, DerEncoder, DerParser, DerPath,
    Handler, IntegerType, Length, NullType, OctetStringType, PathNode, RawType, Tag, TagClass,
};
pub use ldapwire_core::{LdapError, LdapResult};
