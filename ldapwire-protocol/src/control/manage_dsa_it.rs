//! ManageDsaIT control (RFC 3296)

use ldapwire_core::Control;

pub const MANAGE_DSA_IT_OID: &str = "2.16.840.1.113730.3.4.2";

/// Treat referral and other special objects as ordinary entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManageDsaItControl {
    pub critical: bool,
}

impl ManageDsaItControl {
    pub fn new(critical: bool) -> Self {
        Self { critical }
    }
}

impl From<ManageDsaItControl> for Control {
    fn from(control: ManageDsaItControl) -> Self {
        Control::flag(MANAGE_DSA_IT_OID, control.critical)
    }
}
