//! Control extension point
//!
//! Response controls arrive as generic `(OID, criticality, value)` triples
//! and are handed to a [`ControlRegistry`], which maps the OID to a decoder
//! producing a typed [`ResponseControl`]. An OID without a decoder, or a
//! decoder that fails, leaves the control in its generic form; the
//! surrounding message still decodes.
//!
//! Request-side controls are plain [`Control`] values. The typed builders
//! in this module only know how to render their own value bytes.

pub mod authz_id;
pub mod manage_dsa_it;
pub mod paged_results;
pub mod sort;

pub use authz_id::{
    AuthorizationIdentityRequestControl, AuthorizationIdentityResponseControl,
    AUTHZ_ID_REQUEST_OID, AUTHZ_ID_RESPONSE_OID,
};
pub use manage_dsa_it::{ManageDsaItControl, MANAGE_DSA_IT_OID};
pub use paged_results::{PagedResultsControl, PAGED_RESULTS_OID};
pub use sort::{SortResponseControl, SORT_RESPONSE_OID};

use ldapwire_core::{Control, LdapError, LdapResult};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Turns a generic control into its typed form
pub type ControlDecoder = fn(&Control) -> LdapResult<ResponseControl>;

static DEFAULT_REGISTRY: Lazy<ControlRegistry> = Lazy::new(ControlRegistry::default);

/// A response control after registry lookup
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseControl {
    PagedResults(PagedResultsControl),
    SortResponse(SortResponseControl),
    AuthorizationIdentity(AuthorizationIdentityResponseControl),
    /// Uninterpreted control, value bytes kept as received
    Generic(Control),
}

impl ResponseControl {
    pub fn oid(&self) -> &str {
        match self {
            ResponseControl::PagedResults(_) => PAGED_RESULTS_OID,
            ResponseControl::SortResponse(_) => SORT_RESPONSE_OID,
            ResponseControl::AuthorizationIdentity(_) => AUTHZ_ID_RESPONSE_OID,
            ResponseControl::Generic(control) => &control.oid,
        }
    }

    pub fn is_critical(&self) -> bool {
        match self {
            ResponseControl::PagedResults(c) => c.critical,
            ResponseControl::SortResponse(c) => c.critical,
            ResponseControl::AuthorizationIdentity(c) => c.critical,
            ResponseControl::Generic(c) => c.critical,
        }
    }

    pub fn as_generic(&self) -> Option<&Control> {
        match self {
            ResponseControl::Generic(control) => Some(control),
            _ => None,
        }
    }
}

/// Map from control OID to decoder
#[derive(Debug, Clone)]
pub struct ControlRegistry {
    decoders: HashMap<String, ControlDecoder>,
}

impl ControlRegistry {
    /// Registry without any decoder; every control stays generic
    pub fn empty() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Shared registry with the built-in decoders
    pub fn global() -> &'static ControlRegistry {
        &DEFAULT_REGISTRY
    }

    /// Install `decoder` for `oid`, returning the one it replaces
    ///
    /// # Arguments
    /// * `oid` - Control type OID, matched exactly
    /// * `decoder` - Function turning the generic control into a typed one
    pub fn register(&mut self, oid: impl Into<String>, decoder: ControlDecoder) -> Option<ControlDecoder> {
        self.decoders.insert(oid.into(), decoder)
    }

    /// Remove the decoder for `oid`; its controls decode as generic afterwards
    pub fn unregister(&mut self, oid: &str) -> Option<ControlDecoder> {
        self.decoders.remove(oid)
    }

    /// Whether a decoder is installed for `oid`
    pub fn contains(&self, oid: &str) -> bool {
        self.decoders.contains_key(oid)
    }

    /// Number of installed decoders
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Interpret `control`; never fails
    ///
    /// # Arguments
    /// * `control` - Control as read from the message envelope
    ///
    /// # Returns
    /// The typed control when a decoder is registered for its OID and
    /// accepts the value, otherwise [`ResponseControl::Generic`].
    ///
    /// # Error Handling
    /// Decoder failures are logged at `warn` and the control is kept
    /// generic, so a bad control value never fails the message.
    pub fn decode(&self, control: Control) -> ResponseControl {
        let Some(decoder) = self.decoders.get(&control.oid) else {
            return ResponseControl::Generic(control);
        };
        match decoder(&control) {
            Ok(typed) => typed,
            Err(e) => {
                log::warn!("keeping control {} generic: {}", control.oid, e);
                ResponseControl::Generic(control)
            }
        }
    }
}

/// Registry with the paged results, sort response and authorization
/// identity decoders installed
impl Default for ControlRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(PAGED_RESULTS_OID, PagedResultsControl::decode);
        registry.register(SORT_RESPONSE_OID, SortResponseControl::decode);
        registry.register(AUTHZ_ID_RESPONSE_OID, AuthorizationIdentityResponseControl::decode);
        registry
    }
}

/// Value bytes of `control`, which its OID requires
pub(crate) fn required_value(control: &Control) -> LdapResult<&[u8]> {
    control.value().ok_or_else(|| LdapError::Control {
        oid: control.oid.clone(),
        message: "missing control value".to_string(),
    })
}

pub(crate) fn control_error(oid: &str, message: impl Into<String>) -> LdapError {
    LdapError::Control {
        oid: oid.to_string(),
        message: message.into(),
    }
}
