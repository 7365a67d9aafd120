//! BER (Basic Encoding Rules) engine for LDAP messages
//!
//! Every LDAP message is a tree of TLV (Tag-Length-Value) triplets:
//!
//! ```text
//! [Tag] [Length] [Value]
//! ```
//!
//! ## Tag Encoding
//!
//! ```text
//! Bits: 8 7 6 5 4 3 2 1
//!       C C P T T T T T
//! ```
//! - CC = Class (00=Universal, 01=Application, 10=Context, 11=Private)
//! - P = Primitive (0) or Constructed (1)
//! - TTTTT = Tag number (0-30), or 11111 for the multi-byte form
//!
//! ## Length Encoding
//!
//! - **Short form**: one byte, bit 8 clear, lengths 0-127
//! - **Long form**: `0x80 | n` followed by n big-endian length bytes
//!
//! LDAP forbids the indefinite form (RFC 4511 §5.1), so `0x80` alone is
//! rejected.
//!
//! ## Modules
//!
//! - [`types`]: tag and length codecs
//! - [`decoder`]: bounded buffer view and primitive value decoding
//! - [`path`]: textual and programmatic path matchers
//! - [`parser`]: depth-first parse engine dispatching to registered handlers
//! - [`encoder`]: composable TLV encoders

pub mod decoder;
pub mod encoder;
pub mod parser;
pub mod path;
pub mod types;

pub use decoder::{peek_operation_tag, DerBuffer};
pub use encoder::{
    BooleanType, ConstructedType, DerEncoder, IntegerType, NullType, OctetStringType, RawType,
};
pub use parser::{DerParser, Handler};
pub use path::{DerPath, PathNode};
pub use types::{Length, Tag, TagClass};
