//! Core types and utilities for the ldapwire LDAP codec
//!
//! This crate provides the error type, the LDAP result-code enumeration,
//! the attribute/modification model and the codec configuration shared by
//! every other ldapwire crate.

pub mod attribute;
pub mod config;
pub mod control;
pub mod error;
pub mod result_code;

pub use attribute::{Attribute, Modification, ModificationType};
pub use config::CodecConfig;
pub use control::Control;
pub use error::{LdapError, LdapResult};
pub use result_code::ResultCode;
