//! Response dispatcher
//!
//! Picks the response type from the protocolOp tag of a complete
//! LDAPMessage and decodes it. Extended responses are looked at twice: once
//! to read their responseName, then again as a notice of disconnection or
//! unsolicited notification when the name says so.

use crate::add::AddResponse;
use crate::bind::BindResponse;
use crate::compare::CompareResponse;
use crate::control::{ControlRegistry, ResponseControl};
use crate::delete::DeleteResponse;
use crate::extended::{
    ExtendedResponse, IntermediateResponse, NoticeOfDisconnection, UnsolicitedNotification,
    NOTICE_OF_DISCONNECTION_OID,
};
use crate::message::{expect_single_message, DecodeContext, Message, MessageHeader, Response};
use crate::modify::ModifyResponse;
use crate::modify_dn::ModifyDnResponse;
use crate::result::{OperationResult, ResultMessage};
use crate::search::{SearchResultDone, SearchResultEntry, SearchResultReference};
use ldapwire_asn1::{peek_operation_tag, DerBuffer, TagClass};
use ldapwire_core::{CodecConfig, LdapError, LdapResult};

/// Any decoded server message
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseMessage {
    Bind(BindResponse),
    SearchEntry(SearchResultEntry),
    SearchDone(SearchResultDone),
    SearchReference(SearchResultReference),
    Modify(ModifyResponse),
    Add(AddResponse),
    Delete(DeleteResponse),
    ModifyDn(ModifyDnResponse),
    Compare(CompareResponse),
    Extended(ExtendedResponse),
    Intermediate(IntermediateResponse),
    NoticeOfDisconnection(NoticeOfDisconnection),
    UnsolicitedNotification(UnsolicitedNotification),
}

impl ResponseMessage {
    fn inner(&self) -> &dyn Message {
        match self {
            ResponseMessage::Bind(m) => m,
            ResponseMessage::SearchEntry(m) => m,
            ResponseMessage::SearchDone(m) => m,
            ResponseMessage::SearchReference(m) => m,
            ResponseMessage::Modify(m) => m,
            ResponseMessage::Add(m) => m,
            ResponseMessage::Delete(m) => m,
            ResponseMessage::ModifyDn(m) => m,
            ResponseMessage::Compare(m) => m,
            ResponseMessage::Extended(m) => m,
            ResponseMessage::Intermediate(m) => m,
            ResponseMessage::NoticeOfDisconnection(m) => m,
            ResponseMessage::UnsolicitedNotification(m) => m,
        }
    }

    pub fn header(&self) -> &MessageHeader {
        self.inner().header()
    }

    pub fn message_id(&self) -> i32 {
        self.header().message_id
    }

    pub fn controls(&self) -> &[ResponseControl] {
        &self.header().controls
    }

    pub fn is_unsolicited(&self) -> bool {
        self.inner().is_unsolicited()
    }

    /// LDAPResult of the message; search entries, references and
    /// intermediate responses carry none
    pub fn result(&self) -> Option<&OperationResult> {
        match self {
            ResponseMessage::Bind(m) => Some(m.result()),
            ResponseMessage::SearchDone(m) => Some(m.result()),
            ResponseMessage::Modify(m) => Some(m.result()),
            ResponseMessage::Add(m) => Some(m.result()),
            ResponseMessage::Delete(m) => Some(m.result()),
            ResponseMessage::ModifyDn(m) => Some(m.result()),
            ResponseMessage::Compare(m) => Some(m.result()),
            ResponseMessage::Extended(m) => Some(m.result()),
            ResponseMessage::NoticeOfDisconnection(m) => Some(m.result()),
            ResponseMessage::UnsolicitedNotification(m) => Some(m.result()),
            ResponseMessage::SearchEntry(_)
            | ResponseMessage::SearchReference(_)
            | ResponseMessage::Intermediate(_) => None,
        }
    }

    /// Whether this message ends the operation it answers
    pub fn is_final(&self) -> bool {
        !matches!(
            self,
            ResponseMessage::SearchEntry(_)
                | ResponseMessage::SearchReference(_)
                | ResponseMessage::Intermediate(_)
        )
    }
}

/// Decodes complete LDAPMessage buffers into [`ResponseMessage`]s
#[derive(Debug, Clone)]
pub struct ResponseParser {
    config: CodecConfig,
    registry: ControlRegistry,
}

impl ResponseParser {
    pub fn new() -> Self {
        Self {
            config: CodecConfig::default(),
            registry: ControlRegistry::default(),
        }
    }

    /// Parser with custom limits
    ///
    /// # Errors
    /// `Config` when the configuration does not validate.
    pub fn with_config(config: CodecConfig) -> LdapResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            registry: ControlRegistry::default(),
        })
    }

    pub fn with_registry(mut self, registry: ControlRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn registry(&self) -> &ControlRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ControlRegistry {
        &mut self.registry
    }

    fn context(&self) -> DecodeContext<'_> {
        DecodeContext {
            registry: &self.registry,
            max_depth: self.config.max_depth,
        }
    }

    /// Decode one message
    ///
    /// Returns `Ok(None)` for a well-formed envelope whose protocolOp is not
    /// a server message this codec knows.
    ///
    /// # Errors
    /// Oversized input, a malformed envelope, bytes after the envelope, or
    /// a malformed known response.
    pub fn parse(&self, data: &[u8]) -> LdapResult<Option<ResponseMessage>> {
        if data.len() > self.config.max_message_size {
            return Err(LdapError::Decode(format!(
                "message of {} bytes exceeds the {} byte limit",
                data.len(),
                self.config.max_message_size
            )));
        }
        let mut buffer = DerBuffer::new(data);
        expect_single_message(&buffer)?;
        let tag = peek_operation_tag(&buffer)?;
        if tag.class() != TagClass::Application {
            log::debug!("ignoring message with non-application protocolOp {}", tag);
            return Ok(None);
        }
        let context = self.context();
        let buffer = &mut buffer;
        let message = match tag.number() {
            1 => ResponseMessage::Bind(BindResponse::decode_with(buffer, &context)?),
            4 => ResponseMessage::SearchEntry(SearchResultEntry::decode_with(buffer, &context)?),
            5 => ResponseMessage::SearchDone(SearchResultDone::decode_with(buffer, &context)?),
            7 => ResponseMessage::Modify(ModifyResponse::decode_with(buffer, &context)?),
            9 => ResponseMessage::Add(AddResponse::decode_with(buffer, &context)?),
            11 => ResponseMessage::Delete(DeleteResponse::decode_with(buffer, &context)?),
            13 => ResponseMessage::ModifyDn(ModifyDnResponse::decode_with(buffer, &context)?),
            15 => ResponseMessage::Compare(CompareResponse::decode_with(buffer, &context)?),
            19 => ResponseMessage::SearchReference(SearchResultReference::decode_with(
                buffer, &context,
            )?),
            24 => self.dispatch_extended(buffer, &context)?,
            25 => ResponseMessage::Intermediate(IntermediateResponse::decode_with(buffer, &context)?),
            other => {
                log::debug!("ignoring message with unknown protocolOp [APPLICATION {}]", other);
                return Ok(None);
            }
        };
        log::trace!("decoded message {}", message.message_id());
        Ok(Some(message))
    }

    fn dispatch_extended(
        &self,
        buffer: &mut DerBuffer<'_>,
        context: &DecodeContext<'_>,
    ) -> LdapResult<ResponseMessage> {
        let response = ExtendedResponse::decode_with(buffer, context)?;
        let Some(name) = response.response_name() else {
            return Ok(ResponseMessage::Extended(response));
        };
        if name == NOTICE_OF_DISCONNECTION_OID {
            buffer.rewind();
            let notice = NoticeOfDisconnection::decode_with(buffer, context)?;
            log::info!(
                "server sent notice of disconnection: {}",
                notice.result_code()
            );
            return Ok(ResponseMessage::NoticeOfDisconnection(notice));
        }
        if self.config.is_unsolicited_notification(name) {
            buffer.rewind();
            return Ok(ResponseMessage::UnsolicitedNotification(
                UnsolicitedNotification::decode_with(buffer, context)?,
            ));
        }
        Ok(ResponseMessage::Extended(response))
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}
