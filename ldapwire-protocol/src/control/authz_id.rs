//! Authorization identity controls (RFC 3829)

use super::ResponseControl;
use ldapwire_core::{Control, LdapResult};

pub const AUTHZ_ID_REQUEST_OID: &str = "2.16.840.1.113730.3.4.16";
pub const AUTHZ_ID_RESPONSE_OID: &str = "2.16.840.1.113730.3.4.15";

/// Ask the server to return the authorization identity with a bind response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthorizationIdentityRequestControl {
    pub critical: bool,
}

impl AuthorizationIdentityRequestControl {
    pub fn new() -> Self {
        Self::default()
    }
}

impl From<AuthorizationIdentityRequestControl> for Control {
    fn from(control: AuthorizationIdentityRequestControl) -> Self {
        Control::flag(AUTHZ_ID_REQUEST_OID, control.critical)
    }
}

/// Authorization identity established by a bind, e.g. `dn:uid=jdoe,dc=example,dc=com`
///
/// An empty identity means the anonymous identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationIdentityResponseControl {
    pub authz_id: String,
    pub critical: bool,
}

impl AuthorizationIdentityResponseControl {
    pub fn is_anonymous(&self) -> bool {
        self.authz_id.is_empty()
    }

    /// Registry decoder for [`AUTHZ_ID_RESPONSE_OID`]
    pub fn decode(control: &Control) -> LdapResult<ResponseControl> {
        let authz_id = match control.value() {
            Some(value) => String::from_utf8(value.to_vec())?,
            None => String::new(),
        };
        Ok(ResponseControl::AuthorizationIdentity(Self {
            authz_id,
            critical: control.critical,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_has_no_value() {
        let control: Control = AuthorizationIdentityRequestControl::new().into();
        assert_eq!(control, Control::flag(AUTHZ_ID_REQUEST_OID, false));
    }

    #[test]
    fn test_decode_response() {
        let control = Control::new(AUTHZ_ID_RESPONSE_OID, false, Some(b"dn:cn=admin".to_vec()));
        let ResponseControl::AuthorizationIdentity(authz) =
            AuthorizationIdentityResponseControl::decode(&control).unwrap()
        else {
            panic!("expected authorization identity");
        };
        assert_eq!(authz.authz_id, "dn:cn=admin");
        assert!(!authz.is_anonymous());

        let control = Control::flag(AUTHZ_ID_RESPONSE_OID, false);
        let decoded = AuthorizationIdentityResponseControl::decode(&control).unwrap();
        assert!(matches!(
            decoded,
            ResponseControl::AuthorizationIdentity(ref a) if a.is_anonymous()
        ));
    }

    #[test]
    fn test_invalid_utf8_is_error() {
        let control = Control::new(AUTHZ_ID_RESPONSE_OID, false, Some(vec![0xFF, 0xFE]));
        assert!(AuthorizationIdentityResponseControl::decode(&control).is_err());
    }
}
