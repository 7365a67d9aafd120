//! LDAPv3 message model for ldapwire
//!
//! This crate provides:
//! - Request types with validating builders, rendered through [`Request`]
//! - Response types decoded through [`Response`] on top of the
//!   `ldapwire-asn1` path parser
//! - A pluggable [`ControlRegistry`] for response controls
//! - [`ResponseParser`], which picks the response type from the protocolOp tag
//!
//! Framing, connections and the DN/filter string syntaxes live outside this
//! crate; everything here works on one complete LDAPMessage at a time.

pub mod abandon;
pub mod add;
pub mod bind;
pub mod compare;
pub mod control;
pub mod delete;
pub mod dispatcher;
pub mod extended;
pub mod filter;
pub mod message;
pub mod modify;
pub mod modify_dn;
pub mod request;
pub mod result;
pub mod sasl;
pub mod search;
pub mod unbind;

pub use abandon::AbandonRequest;
pub use add::{AddRequest, AddRequestBuilder, AddResponse};
pub use bind::{AnonymousBindRequest, BindResponse, SimpleBindRequest, SimpleBindRequestBuilder};
pub use compare::{CompareRequest, CompareResponse};
pub use control::{ControlDecoder, ControlRegistry, ResponseControl};
pub use delete::{DeleteRequest, DeleteResponse};
pub use dispatcher::{ResponseMessage, ResponseParser};
pub use extended::{
    CancelRequest, ExtendedRequest, ExtendedRequestBuilder, ExtendedResponse,
    IntermediateResponse, NoticeOfDisconnection, StartTlsRequest, UnsolicitedNotification,
    WhoAmIRequest,
};
pub use filter::SearchFilter;
pub use message::{
    encode_message, DecodeContext, Message, MessageHeader, Request, Response,
    UNSOLICITED_MESSAGE_ID,
};
pub use modify::{ModifyRequest, ModifyRequestBuilder, ModifyResponse};
pub use modify_dn::{ModifyDnRequest, ModifyDnRequestBuilder, ModifyDnResponse};
pub use request::LdapRequest;
pub use result::{OperationResult, ResultMessage};
pub use sasl::{
    ExternalMechanism, Mechanism, SaslBindRequest, SaslBindRequestBuilder, SaslBindSession,
    SaslClient,
};
pub use search::{
    DerefAliases, SearchRequest, SearchRequestBuilder, SearchResultDone, SearchResultEntry,
    SearchResultReference, SearchScope,
};
pub use unbind::UnbindRequest;
