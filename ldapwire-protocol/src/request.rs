//! Closed set of client requests
//!
//! [`LdapRequest`] lets callers queue or pass around heterogeneous
//! operations while still rendering each through its own [`Request`] impl.

use crate::abandon::AbandonRequest;
use crate::add::AddRequest;
use crate::bind::{AnonymousBindRequest, SimpleBindRequest};
use crate::compare::CompareRequest;
use crate::delete::DeleteRequest;
use crate::extended::{CancelRequest, ExtendedRequest, StartTlsRequest, WhoAmIRequest};
use crate::message::Request;
use crate::modify::ModifyRequest;
use crate::modify_dn::ModifyDnRequest;
use crate::sasl::SaslBindRequest;
use crate::search::SearchRequest;
use crate::unbind::UnbindRequest;
use ldapwire_asn1::DerEncoder;
use ldapwire_core::Control;

/// Any client-originated LDAP operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LdapRequest {
    SimpleBind(SimpleBindRequest),
    AnonymousBind(AnonymousBindRequest),
    SaslBind(SaslBindRequest),
    Search(SearchRequest),
    Modify(ModifyRequest),
    Add(AddRequest),
    Delete(DeleteRequest),
    ModifyDn(ModifyDnRequest),
    Compare(CompareRequest),
    Abandon(AbandonRequest),
    Unbind(UnbindRequest),
    Extended(ExtendedRequest),
    WhoAmI(WhoAmIRequest),
    StartTls(StartTlsRequest),
    Cancel(CancelRequest),
}

impl LdapRequest {
    fn inner(&self) -> &dyn Request {
        match self {
            LdapRequest::SimpleBind(r) => r,
            LdapRequest::AnonymousBind(r) => r,
            LdapRequest::SaslBind(r) => r,
            LdapRequest::Search(r) => r,
            LdapRequest::Modify(r) => r,
            LdapRequest::Add(r) => r,
            LdapRequest::Delete(r) => r,
            LdapRequest::ModifyDn(r) => r,
            LdapRequest::Compare(r) => r,
            LdapRequest::Abandon(r) => r,
            LdapRequest::Unbind(r) => r,
            LdapRequest::Extended(r) => r,
            LdapRequest::WhoAmI(r) => r,
            LdapRequest::StartTls(r) => r,
            LdapRequest::Cancel(r) => r,
        }
    }

    /// Whether the server sends no response to this operation
    pub fn expects_response(&self) -> bool {
        !matches!(self, LdapRequest::Abandon(_) | LdapRequest::Unbind(_))
    }
}

impl Request for LdapRequest {
    fn protocol_op(&self) -> Box<dyn DerEncoder> {
        self.inner().protocol_op()
    }

    fn controls(&self) -> &[Control] {
        self.inner().controls()
    }
}

macro_rules! impl_from_request {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for LdapRequest {
                fn from(request: $ty) -> Self {
                    LdapRequest::$variant(request)
                }
            }
        )*
    };
}

impl_from_request!(
    SimpleBind(SimpleBindRequest),
    AnonymousBind(AnonymousBindRequest),
    SaslBind(SaslBindRequest),
    Search(SearchRequest),
    Modify(ModifyRequest),
    Add(AddRequest),
    Delete(DeleteRequest),
    ModifyDn(ModifyDnRequest),
    Compare(CompareRequest),
    Abandon(AbandonRequest),
    Unbind(UnbindRequest),
    Extended(ExtendedRequest),
    WhoAmI(WhoAmIRequest),
    StartTls(StartTlsRequest),
    Cancel(CancelRequest),
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delegates_encoding() {
        let delete = DeleteRequest::new("o=x").unwrap();
        let expected = delete.encode(3).unwrap();
        let request = LdapRequest::from(delete);
        assert_eq!(request.encode(3).unwrap(), expected);
        assert!(request.expects_response());
    }

    #[test]
    fn test_requests_without_response() {
        let requests: Vec<LdapRequest> = vec![
            AbandonRequest::new(5).unwrap().into(),
            UnbindRequest::new().into(),
        ];
        for request in &requests {
            assert!(!request.expects_response());
            assert!(request.encode(6).is_ok());
        }
    }
}
