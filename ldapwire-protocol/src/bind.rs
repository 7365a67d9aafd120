//! Bind operation
//!
//! ```text
//! BindRequest ::= [APPLICATION 0] SEQUENCE {
//!      version                 INTEGER (1 ..  127),
//!      name                    LDAPDN,
//!      authentication          AuthenticationChoice }
//!
//! AuthenticationChoice ::= CHOICE {
//!      simple                  [0] OCTET STRING,
//!      sasl                    [3] SaslCredentials,
//!      ...  }
//!
//! BindResponse ::= [APPLICATION 1] SEQUENCE {
//!      COMPONENTS OF LDAPResult,
//!      serverSaslCreds    [7] OCTET STRING OPTIONAL }
//! ```
//!
//! SASL binds live in [`crate::sasl`]; they share the envelope and the
//! response type defined here.

use crate::message::{
    expect_operation, message_parser, operation_path, DecodeContext, DecodeState, Message,
    MessageHeader, Request, Response,
};
use crate::result::{register_result, OperationResult, ResultMessage};
use ldapwire_asn1::{
    ConstructedType, DerBuffer, DerEncoder, IntegerType, OctetStringType, PathNode, Tag,
};
use ldapwire_core::{Control, LdapError, LdapResult};
use std::fmt;

/// Protocol version sent in every bind request
pub const LDAP_VERSION: i64 = 3;

pub(crate) const BIND_REQUEST_OP: u32 = 0;

/// `[APPLICATION 0] { version, name, <authentication> }`
pub(crate) fn bind_envelope(dn: &str, authentication: impl DerEncoder + 'static) -> ConstructedType {
    ConstructedType::new(Tag::application(true, BIND_REQUEST_OP))
        .with(IntegerType::new(LDAP_VERSION))
        .with(OctetStringType::text(dn))
        .with(authentication)
}

/// Simple (DN and password) bind
#[derive(Clone, PartialEq, Eq)]
pub struct SimpleBindRequest {
    dn: String,
    password: Vec<u8>,
    controls: Vec<Control>,
}

impl SimpleBindRequest {
    pub fn builder() -> SimpleBindRequestBuilder {
        SimpleBindRequestBuilder::default()
    }

    pub fn dn(&self) -> &str {
        &self.dn
    }

    pub fn password(&self) -> &[u8] {
        &self.password
    }
}

impl fmt::Debug for SimpleBindRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleBindRequest")
            .field("dn", &self.dn)
            .field("password", &"<redacted>")
            .field("controls", &self.controls)
            .finish()
    }
}

impl Request for SimpleBindRequest {
    fn protocol_op(&self) -> Box<dyn DerEncoder> {
        Box::new(bind_envelope(
            &self.dn,
            OctetStringType::with_tag(Tag::context(false, 0), self.password.clone()),
        ))
    }

    fn controls(&self) -> &[Control] {
        &self.controls
    }
}

/// Builder for [`SimpleBindRequest`]
#[derive(Default)]
pub struct SimpleBindRequestBuilder {
    dn: Option<String>,
    password: Option<Vec<u8>>,
    controls: Vec<Control>,
}

impl SimpleBindRequestBuilder {
    pub fn dn(mut self, dn: impl Into<String>) -> Self {
        self.dn = Some(dn.into());
        self
    }

    pub fn password(mut self, password: impl Into<Vec<u8>>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn control(mut self, control: impl Into<Control>) -> Self {
        self.controls.push(control.into());
        self
    }

    /// Build the request
    ///
    /// # Errors
    /// Returns `InvalidRequest` when the DN or the password is missing or
    /// empty. An empty password would turn the bind into an
    /// unauthenticated one; use [`AnonymousBindRequest`] for that.
    pub fn build(self) -> LdapResult<SimpleBindRequest> {
        let dn = self
            .dn
            .filter(|dn| !dn.is_empty())
            .ok_or_else(|| LdapError::invalid_request("simple bind requires a DN"))?;
        let password = self
            .password
            .filter(|password| !password.is_empty())
            .ok_or_else(|| LdapError::invalid_request("simple bind requires a password"))?;
        Ok(SimpleBindRequest {
            dn,
            password,
            controls: self.controls,
        })
    }
}

/// Anonymous simple bind: empty name and empty password
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnonymousBindRequest {
    controls: Vec<Control>,
}

impl AnonymousBindRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_control(mut self, control: impl Into<Control>) -> Self {
        self.controls.push(control.into());
        self
    }
}

impl Request for AnonymousBindRequest {
    fn protocol_op(&self) -> Box<dyn DerEncoder> {
        Box::new(bind_envelope(
            "",
            OctetStringType::with_tag(Tag::context(false, 0), Vec::new()),
        ))
    }

    fn controls(&self) -> &[Control] {
        &self.controls
    }
}

/// Result of a simple or SASL bind
#[derive(Debug, Clone, PartialEq)]
pub struct BindResponse {
    header: MessageHeader,
    result: OperationResult,
    server_sasl_credentials: Option<Vec<u8>>,
}

impl BindResponse {
    pub fn new(
        header: MessageHeader,
        result: OperationResult,
        server_sasl_credentials: Option<Vec<u8>>,
    ) -> Self {
        Self {
            header,
            result,
            server_sasl_credentials,
        }
    }

    /// `serverSaslCreds`; `Some(empty)` when the server sent an empty value
    pub fn server_sasl_credentials(&self) -> Option<&[u8]> {
        self.server_sasl_credentials.as_deref()
    }
}

impl Message for BindResponse {
    fn header(&self) -> &MessageHeader {
        &self.header
    }
}

impl ResultMessage for BindResponse {
    fn result(&self) -> &OperationResult {
        &self.result
    }
}

fn read_server_credentials(
    state: &mut DecodeState<Option<Vec<u8>>>,
    buffer: &mut DerBuffer<'_>,
) -> LdapResult<()> {
    state.extra = Some(buffer.read_octets_value());
    Ok(())
}

impl Response for BindResponse {
    const PROTOCOL_OP: u32 = 1;

    fn decode_with(buffer: &mut DerBuffer<'_>, context: &DecodeContext<'_>) -> LdapResult<Self> {
        expect_operation(buffer, Self::PROTOCOL_OP)?;
        let mut parser = message_parser::<Option<Vec<u8>>>(context);
        register_result(&mut parser, Self::PROTOCOL_OP);
        parser.register(
            operation_path(Self::PROTOCOL_OP).child(PathNode::context(7)),
            read_server_credentials,
        );
        let mut state = DecodeState::default();
        parser.parse(buffer, &mut state)?;
        Ok(Self {
            header: state.header.finish(context)?,
            result: state.result.finish()?,
            server_sasl_credentials: state.extra,
        })
    }
}
