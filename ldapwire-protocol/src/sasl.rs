//! SASL bind framing
//!
//! ```text
//! SaslCredentials ::= SEQUENCE {
//!      mechanism               LDAPString,
//!      credentials             OCTET STRING OPTIONAL }
//! ```
//!
//! The codec never looks inside credential bytes. A mechanism implements
//! [`SaslClient`]; [`SaslBindSession`] drives it, producing one
//! [`SaslBindRequest`] per round and feeding each response's
//! `serverSaslCreds` back into the mechanism until the server answers with
//! something other than `saslBindInProgress`.

use crate::bind::{bind_envelope, BindResponse};
use crate::message::Request;
use crate::result::ResultMessage;
use ldapwire_asn1::{ConstructedType, DerEncoder, OctetStringType, Tag};
use ldapwire_core::{Control, LdapError, LdapResult, ResultCode};
use std::fmt;

/// Registered SASL mechanism names
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Mechanism {
    External,
    Plain,
    DigestMd5,
    CramMd5,
    Gssapi,
    ScramSha1,
    ScramSha256,
    ScramSha512,
    Other(String),
}

impl Mechanism {
    pub fn name(&self) -> &str {
        match self {
            Mechanism::External => "EXTERNAL",
            Mechanism::Plain => "PLAIN",
            Mechanism::DigestMd5 => "DIGEST-MD5",
            Mechanism::CramMd5 => "CRAM-MD5",
            Mechanism::Gssapi => "GSSAPI",
            Mechanism::ScramSha1 => "SCRAM-SHA-1",
            Mechanism::ScramSha256 => "SCRAM-SHA-256",
            Mechanism::ScramSha512 => "SCRAM-SHA-512",
            Mechanism::Other(name) => name,
        }
    }

    /// Look up a mechanism by name, case-insensitively
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "EXTERNAL" => Mechanism::External,
            "PLAIN" => Mechanism::Plain,
            "DIGEST-MD5" => Mechanism::DigestMd5,
            "CRAM-MD5" => Mechanism::CramMd5,
            "GSSAPI" => Mechanism::Gssapi,
            "SCRAM-SHA-1" => Mechanism::ScramSha1,
            "SCRAM-SHA-256" => Mechanism::ScramSha256,
            "SCRAM-SHA-512" => Mechanism::ScramSha512,
            _ => Mechanism::Other(name.to_string()),
        }
    }
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One round of a SASL bind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaslBindRequest {
    dn: String,
    mechanism: Mechanism,
    credentials: Option<Vec<u8>>,
    controls: Vec<Control>,
}

impl SaslBindRequest {
    pub fn builder(mechanism: Mechanism) -> SaslBindRequestBuilder {
        SaslBindRequestBuilder {
            dn: String::new(),
            mechanism,
            credentials: None,
            controls: Vec::new(),
        }
    }

    pub fn dn(&self) -> &str {
        &self.dn
    }

    pub fn mechanism(&self) -> &Mechanism {
        &self.mechanism
    }

    pub fn credentials(&self) -> Option<&[u8]> {
        self.credentials.as_deref()
    }
}

impl Request for SaslBindRequest {
    fn protocol_op(&self) -> Box<dyn DerEncoder> {
        let mut sasl = ConstructedType::new(Tag::context(true, 3))
            .with(OctetStringType::text(self.mechanism.name()));
        if let Some(credentials) = &self.credentials {
            sasl.push(OctetStringType::new(credentials.clone()));
        }
        Box::new(bind_envelope(&self.dn, sasl))
    }

    fn controls(&self) -> &[Control] {
        &self.controls
    }
}

/// Builder for [`SaslBindRequest`]
#[derive(Debug, Clone)]
pub struct SaslBindRequestBuilder {
    dn: String,
    mechanism: Mechanism,
    credentials: Option<Vec<u8>>,
    controls: Vec<Control>,
}

impl SaslBindRequestBuilder {
    /// Bind name; normally empty since the mechanism carries the identity
    pub fn dn(mut self, dn: impl Into<String>) -> Self {
        self.dn = dn.into();
        self
    }

    pub fn credentials(mut self, credentials: impl Into<Vec<u8>>) -> Self {
        self.credentials = Some(credentials.into());
        self
    }

    pub fn maybe_credentials(mut self, credentials: Option<Vec<u8>>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn control(mut self, control: impl Into<Control>) -> Self {
        self.controls.push(control.into());
        self
    }

    pub fn controls(mut self, controls: impl IntoIterator<Item = Control>) -> Self {
        self.controls.extend(controls);
        self
    }

    pub fn build(self) -> LdapResult<SaslBindRequest> {
        if self.mechanism.name().is_empty() {
            return Err(LdapError::invalid_request("SASL bind requires a mechanism name"));
        }
        Ok(SaslBindRequest {
            dn: self.dn,
            mechanism: self.mechanism,
            credentials: self.credentials,
            controls: self.controls,
        })
    }
}

/// Client half of a SASL mechanism
///
/// `None` means "send no credentials field", which differs from an empty
/// credentials value on the wire.
pub trait SaslClient {
    fn mechanism(&self) -> Mechanism;

    /// Credentials for the first bind request
    fn initial_response(&mut self) -> LdapResult<Option<Vec<u8>>>;

    /// Answer a server challenge
    ///
    /// Also called with the final `serverSaslCreds` of a successful bind so
    /// the mechanism can verify the server; its return value is then
    /// ignored.
    fn evaluate_challenge(&mut self, challenge: Option<&[u8]>) -> LdapResult<Option<Vec<u8>>>;
}

/// EXTERNAL mechanism (RFC 4422 appendix A)
///
/// The identity comes from outside the bind, typically a TLS client
/// certificate. An authorization identity may be requested explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalMechanism {
    authz_id: Option<String>,
}

impl ExternalMechanism {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_authz_id(authz_id: impl Into<String>) -> Self {
        Self {
            authz_id: Some(authz_id.into()),
        }
    }
}

impl SaslClient for ExternalMechanism {
    fn mechanism(&self) -> Mechanism {
        Mechanism::External
    }

    fn initial_response(&mut self) -> LdapResult<Option<Vec<u8>>> {
        Ok(self.authz_id.as_ref().map(|id| id.as_bytes().to_vec()))
    }

    fn evaluate_challenge(&mut self, challenge: Option<&[u8]>) -> LdapResult<Option<Vec<u8>>> {
        match challenge {
            Some(bytes) if !bytes.is_empty() => Err(LdapError::invalid_request(
                "EXTERNAL does not accept server challenges",
            )),
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Initial,
    InProgress,
    Complete,
}

/// Drives a [`SaslClient`] through the bind request/response loop
#[derive(Debug)]
pub struct SaslBindSession<C: SaslClient> {
    client: C,
    dn: String,
    controls: Vec<Control>,
    state: SessionState,
    rounds: usize,
}

impl<C: SaslClient> SaslBindSession<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            dn: String::new(),
            controls: Vec::new(),
            state: SessionState::Initial,
            rounds: 0,
        }
    }

    pub fn with_dn(mut self, dn: impl Into<String>) -> Self {
        self.dn = dn.into();
        self
    }

    /// Attach `control` to every request of the session
    pub fn with_control(mut self, control: impl Into<Control>) -> Self {
        self.controls.push(control.into());
        self
    }

    pub fn is_complete(&self) -> bool {
        self.state == SessionState::Complete
    }

    /// Number of requests produced so far
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn request(&mut self, credentials: Option<Vec<u8>>) -> LdapResult<SaslBindRequest> {
        self.rounds += 1;
        SaslBindRequest::builder(self.client.mechanism())
            .dn(self.dn.clone())
            .maybe_credentials(credentials)
            .controls(self.controls.iter().cloned())
            .build()
    }

    /// The opening bind request
    pub fn start(&mut self) -> LdapResult<SaslBindRequest> {
        if self.state != SessionState::Initial {
            return Err(LdapError::invalid_request("SASL bind session already started"));
        }
        let credentials = self.client.initial_response()?;
        self.state = SessionState::InProgress;
        self.request(credentials)
    }

    /// Consume a bind response
    ///
    /// Returns the next request while the server answers
    /// `saslBindInProgress` and `None` once the bind succeeded.
    ///
    /// # Errors
    /// `SaslBind` for any other result code; the session is then complete.
    pub fn step(&mut self, response: &BindResponse) -> LdapResult<Option<SaslBindRequest>> {
        if self.state != SessionState::InProgress {
            return Err(LdapError::invalid_request("SASL bind session is not in progress"));
        }
        match response.result_code() {
            ResultCode::SaslBindInProgress => {
                log::debug!(
                    "{} round {}: server challenge",
                    self.client.mechanism(),
                    self.rounds
                );
                let credentials = self
                    .client
                    .evaluate_challenge(response.server_sasl_credentials())?;
                self.request(credentials).map(Some)
            }
            ResultCode::Success => {
                self.state = SessionState::Complete;
                if let Some(final_credentials) = response.server_sasl_credentials() {
                    self.client.evaluate_challenge(Some(final_credentials))?;
                }
                Ok(None)
            }
            code => {
                self.state = SessionState::Complete;
                Err(LdapError::SaslBind {
                    code,
                    message: response.diagnostic_message().to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageHeader;
    use crate::result::OperationResult;

    fn response(code: ResultCode, credentials: Option<&[u8]>) -> BindResponse {
        BindResponse::new(
            MessageHeader::new(1),
            OperationResult::new(code),
            credentials.map(|c| c.to_vec()),
        )
    }

    /// Echoes each challenge back with a round counter
    struct EchoMechanism {
        seen: Vec<Vec<u8>>,
    }

    impl SaslClient for EchoMechanism {
        fn mechanism(&self) -> Mechanism {
            Mechanism::Other("X-ECHO".to_string())
        }

        fn initial_response(&mut self) -> LdapResult<Option<Vec<u8>>> {
            Ok(Some(b"hello".to_vec()))
        }

        fn evaluate_challenge(&mut self, challenge: Option<&[u8]>) -> LdapResult<Option<Vec<u8>>> {
            let challenge = challenge.unwrap_or_default().to_vec();
            self.seen.push(challenge.clone());
            Ok(Some(challenge))
        }
    }

    #[test]
    fn test_mechanism_names() {
        assert_eq!(Mechanism::from_name("scram-sha-256"), Mechanism::ScramSha256);
        assert_eq!(Mechanism::DigestMd5.name(), "DIGEST-MD5");
        assert_eq!(
            Mechanism::from_name("X-CUSTOM"),
            Mechanism::Other("X-CUSTOM".to_string())
        );
    }

    #[test]
    fn test_sasl_bind_encoding() {
        let request = SaslBindRequest::builder(Mechanism::External).build().unwrap();
        assert_eq!(
            request.encode(1).unwrap().as_ref(),
            &[
                0x30, 0x16, 0x02, 0x01, 0x01, 0x60, 0x11, 0x02, 0x01, 0x03, 0x04, 0x00, 0xA3,
                0x0A, 0x04, 0x08, b'E', b'X', b'T', b'E', b'R', b'N', b'A', b'L',
            ]
        );

        let request = SaslBindRequest::builder(Mechanism::Plain)
            .credentials(b"\0u\0p".to_vec())
            .build()
            .unwrap();
        let bytes = request.encode(2).unwrap();
        assert_eq!(&bytes[bytes.len() - 6..], &[0x04, 0x04, 0x00, b'u', 0x00, b'p']);
    }

    #[test]
    fn test_empty_mechanism_rejected() {
        let result = SaslBindRequest::builder(Mechanism::Other(String::new())).build();
        assert!(matches!(result, Err(LdapError::InvalidRequest(_))));
    }

    #[test]
    fn test_session_loop() {
        let mut session = SaslBindSession::new(EchoMechanism { seen: Vec::new() });
        let first = session.start().unwrap();
        assert_eq!(first.credentials(), Some(&b"hello"[..]));
        assert!(session.start().is_err());

        let next = session
            .step(&response(ResultCode::SaslBindInProgress, Some(b"c1")))
            .unwrap()
            .unwrap();
        assert_eq!(next.credentials(), Some(&b"c1"[..]));
        assert_eq!(session.rounds(), 2);

        assert!(session
            .step(&response(ResultCode::Success, Some(b"final")))
            .unwrap()
            .is_none());
        assert!(session.is_complete());
        assert_eq!(session.client().seen, vec![b"c1".to_vec(), b"final".to_vec()]);
        assert!(session.step(&response(ResultCode::Success, None)).is_err());
    }

    #[test]
    fn test_session_failure() {
        let mut session = SaslBindSession::new(ExternalMechanism::new());
        let first = session.start().unwrap();
        assert_eq!(first.credentials(), None);
        let err = session
            .step(&response(ResultCode::InvalidCredentials, None))
            .unwrap_err();
        assert!(matches!(
            err,
            LdapError::SaslBind {
                code: ResultCode::InvalidCredentials,
                ..
            }
        ));
        assert!(session.is_complete());
    }

    #[test]
    fn test_external_with_authz_id() {
        let mut session = SaslBindSession::new(ExternalMechanism::with_authz_id("dn:cn=proxy"));
        let first = session.start().unwrap();
        assert_eq!(first.credentials(), Some(&b"dn:cn=proxy"[..]));
    }
}
