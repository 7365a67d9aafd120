//! Search operation
//!
//! ```text
//! SearchRequest ::= [APPLICATION 3] SEQUENCE {
//!      baseObject      LDAPDN,
//!      scope           ENUMERATED { baseObject(0), singleLevel(1), wholeSubtree(2), ... },
//!      derefAliases    ENUMERATED { neverDerefAliases(0), derefInSearching(1),
//!                                   derefFindingBaseObj(2), derefAlways(3) },
//!      sizeLimit       INTEGER (0 ..  maxInt),
//!      timeLimit       INTEGER (0 ..  maxInt),
//!      typesOnly       BOOLEAN,
//!      filter          Filter,
//!      attributes      AttributeSelection }
//!
//! SearchResultEntry ::= [APPLICATION 4] SEQUENCE {
//!      objectName      LDAPDN,
//!      attributes      PartialAttributeList }
//!
//! SearchResultDone ::= [APPLICATION 5] LDAPResult
//!
//! SearchResultReference ::= [APPLICATION 19] SEQUENCE SIZE (1..MAX) OF uri URI
//! ```
//!
//! A search yields any number of entries and references followed by one
//! done message. Collecting them is left to the caller.

use crate::filter::SearchFilter;
use crate::message::{
    expect_operation, message_parser, operation_path, DecodeContext, DecodeState, Message,
    MessageHeader, Request, Response,
};
use crate::result::result_response;
use ldapwire_asn1::{
    BooleanType, ConstructedType, DerBuffer, DerEncoder, DerParser, DerPath, IntegerType,
    OctetStringType, PathNode, Tag,
};
use ldapwire_core::{Attribute, Control, LdapError, LdapResult};
use once_cell::sync::Lazy;

const SEARCH_REQUEST_OP: u32 = 3;

/// How far below the base object a search reaches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SearchScope {
    Base = 0,
    OneLevel = 1,
    #[default]
    Subtree = 2,
    /// Subordinate subtree (draft-sermersheim-ldap-subordinate-scope)
    Subordinates = 3,
}

/// When aliases are dereferenced during a search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DerefAliases {
    #[default]
    Never = 0,
    InSearching = 1,
    FindingBaseObject = 2,
    Always = 3,
}

/// Search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    base_dn: String,
    scope: SearchScope,
    deref_aliases: DerefAliases,
    size_limit: i32,
    time_limit: i32,
    types_only: bool,
    filter: SearchFilter,
    attributes: Vec<String>,
    controls: Vec<Control>,
}

impl SearchRequest {
    pub fn builder(base_dn: impl Into<String>) -> SearchRequestBuilder {
        SearchRequestBuilder {
            base_dn: base_dn.into(),
            scope: SearchScope::default(),
            deref_aliases: DerefAliases::default(),
            size_limit: 0,
            time_limit: 0,
            types_only: false,
            filter: SearchFilter::default(),
            attributes: Vec::new(),
            controls: Vec::new(),
        }
    }

    pub fn base_dn(&self) -> &str {
        &self.base_dn
    }

    pub fn scope(&self) -> SearchScope {
        self.scope
    }

    pub fn deref_aliases(&self) -> DerefAliases {
        self.deref_aliases
    }

    pub fn size_limit(&self) -> i32 {
        self.size_limit
    }

    pub fn time_limit(&self) -> i32 {
        self.time_limit
    }

    pub fn types_only(&self) -> bool {
        self.types_only
    }

    pub fn filter(&self) -> &SearchFilter {
        &self.filter
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }
}

impl Request for SearchRequest {
    fn protocol_op(&self) -> Box<dyn DerEncoder> {
        let mut attributes = ConstructedType::sequence();
        for name in &self.attributes {
            attributes.push(OctetStringType::text(name));
        }
        Box::new(
            ConstructedType::new(Tag::application(true, SEARCH_REQUEST_OP))
                .with(OctetStringType::text(&self.base_dn))
                .with(IntegerType::enumerated(self.scope as i64))
                .with(IntegerType::enumerated(self.deref_aliases as i64))
                .with(IntegerType::new(self.size_limit as i64))
                .with(IntegerType::new(self.time_limit as i64))
                .with(BooleanType::new(self.types_only))
                .with(self.filter.clone())
                .with(attributes),
        )
    }

    fn controls(&self) -> &[Control] {
        &self.controls
    }
}

/// Builder for [`SearchRequest`]
///
/// Defaults: subtree scope, never dereference aliases, no limits,
/// `(objectClass=*)`, all user attributes.
#[derive(Debug, Clone)]
pub struct SearchRequestBuilder {
    base_dn: String,
    scope: SearchScope,
    deref_aliases: DerefAliases,
    size_limit: i32,
    time_limit: i32,
    types_only: bool,
    filter: SearchFilter,
    attributes: Vec<String>,
    controls: Vec<Control>,
}

impl SearchRequestBuilder {
    pub fn scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn deref_aliases(mut self, deref_aliases: DerefAliases) -> Self {
        self.deref_aliases = deref_aliases;
        self
    }

    /// Maximum number of entries; 0 means no client-requested limit
    pub fn size_limit(mut self, size_limit: i32) -> Self {
        self.size_limit = size_limit;
        self
    }

    /// Maximum time in seconds; 0 means no client-requested limit
    pub fn time_limit(mut self, time_limit: i32) -> Self {
        self.time_limit = time_limit;
        self
    }

    pub fn types_only(mut self, types_only: bool) -> Self {
        self.types_only = types_only;
        self
    }

    pub fn filter(mut self, filter: SearchFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(name.into());
        self
    }

    pub fn attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn control(mut self, control: impl Into<Control>) -> Self {
        self.controls.push(control.into());
        self
    }

    /// Build the request
    ///
    /// # Errors
    /// `InvalidRequest` when a limit is negative or a requested attribute
    /// name is empty.
    pub fn build(self) -> LdapResult<SearchRequest> {
        if self.size_limit < 0 {
            return Err(LdapError::InvalidRequest(format!(
                "size limit must not be negative, got {}",
                self.size_limit
            )));
        }
        if self.time_limit < 0 {
            return Err(LdapError::InvalidRequest(format!(
                "time limit must not be negative, got {}",
                self.time_limit
            )));
        }
        if self.attributes.iter().any(|a| a.is_empty()) {
            return Err(LdapError::invalid_request("empty attribute name in selection"));
        }
        Ok(SearchRequest {
            base_dn: self.base_dn,
            scope: self.scope,
            deref_aliases: self.deref_aliases,
            size_limit: self.size_limit,
            time_limit: self.time_limit,
            types_only: self.types_only,
            filter: self.filter,
            attributes: self.attributes,
            controls: self.controls,
        })
    }
}

/// One entry returned by a search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResultEntry {
    header: MessageHeader,
    dn: String,
    attributes: Vec<Attribute>,
}

impl SearchResultEntry {
    pub fn new(header: MessageHeader, dn: String, attributes: Vec<Attribute>) -> Self {
        Self {
            header,
            dn,
            attributes,
        }
    }

    pub fn dn(&self) -> &str {
        &self.dn
    }

    /// Attributes in the order the server sent them
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// First attribute whose base name matches `name`, ignoring case and options
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.matches_name(name))
    }

    pub fn into_attributes(self) -> Vec<Attribute> {
        self.attributes
    }
}

impl Message for SearchResultEntry {
    fn header(&self) -> &MessageHeader {
        &self.header
    }
}

#[derive(Debug, Default)]
struct EntryFields {
    dn: Option<String>,
    attributes: Vec<Attribute>,
}

#[derive(Debug, Default)]
struct PartialAttribute {
    name: Option<String>,
    values: Vec<Vec<u8>>,
}

fn read_attribute_name(state: &mut PartialAttribute, buffer: &mut DerBuffer<'_>) -> LdapResult<()> {
    state.name = Some(buffer.read_string_value()?);
    Ok(())
}

fn read_attribute_value(state: &mut PartialAttribute, buffer: &mut DerBuffer<'_>) -> LdapResult<()> {
    state.values.push(buffer.read_octets_value());
    Ok(())
}

static PARTIAL_ATTRIBUTE_PARSER: Lazy<DerParser<PartialAttribute>> = Lazy::new(|| {
    let mut parser = DerParser::new();
    parser
        .register(DerPath::new().child(PathNode::new(Tag::OCTSTR)), read_attribute_name)
        .register(
            DerPath::new()
                .child(PathNode::new(Tag::SET))
                .child(PathNode::new(Tag::OCTSTR)),
            read_attribute_value,
        );
    parser
});

fn read_entry_dn(state: &mut DecodeState<EntryFields>, buffer: &mut DerBuffer<'_>) -> LdapResult<()> {
    state.extra.dn = Some(buffer.read_string_value()?);
    Ok(())
}

/// One `PartialAttribute` SEQUENCE: a nested pass over its type and value set
fn read_entry_attribute(
    state: &mut DecodeState<EntryFields>,
    buffer: &mut DerBuffer<'_>,
) -> LdapResult<()> {
    let mut partial = PartialAttribute::default();
    PARTIAL_ATTRIBUTE_PARSER.parse(buffer, &mut partial)?;
    let name = partial
        .name
        .ok_or_else(|| LdapError::decode("partial attribute without type"))?;
    state
        .extra
        .attributes
        .push(Attribute::with_values(name, partial.values));
    Ok(())
}

impl Response for SearchResultEntry {
    const PROTOCOL_OP: u32 = 4;

    fn decode_with(buffer: &mut DerBuffer<'_>, context: &DecodeContext<'_>) -> LdapResult<Self> {
        expect_operation(buffer, Self::PROTOCOL_OP)?;
        let op = operation_path(Self::PROTOCOL_OP);
        let mut parser = message_parser::<EntryFields>(context);
        parser
            .register(op.child(PathNode::new(Tag::OCTSTR).at(0)), read_entry_dn)
            .register(
                op.child(PathNode::new(Tag::SEQ)).child(PathNode::new(Tag::SEQ)),
                read_entry_attribute,
            );
        let mut state = DecodeState::default();
        parser.parse(buffer, &mut state)?;
        let dn = state
            .extra
            .dn
            .ok_or_else(|| LdapError::decode("search result entry without objectName"))?;
        Ok(Self {
            header: state.header.finish(context)?,
            dn,
            attributes: state.extra.attributes,
        })
    }
}

result_response!(
    /// Final message of a search
    SearchResultDone,
    5
);

/// Continuation references returned instead of an entry
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResultReference {
    header: MessageHeader,
    urls: Vec<String>,
}

impl SearchResultReference {
    pub fn new(header: MessageHeader, urls: Vec<String>) -> Self {
        Self { header, urls }
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }
}

impl Message for SearchResultReference {
    fn header(&self) -> &MessageHeader {
        &self.header
    }
}

fn read_reference_url(
    state: &mut DecodeState<Vec<String>>,
    buffer: &mut DerBuffer<'_>,
) -> LdapResult<()> {
    state.extra.push(buffer.read_string_value()?);
    Ok(())
}

impl Response for SearchResultReference {
    const PROTOCOL_OP: u32 = 19;

    fn decode_with(buffer: &mut DerBuffer<'_>, context: &DecodeContext<'_>) -> LdapResult<Self> {
        expect_operation(buffer, Self::PROTOCOL_OP)?;
        let mut parser = message_parser::<Vec<String>>(context);
        parser.register(
            operation_path(Self::PROTOCOL_OP).child(PathNode::new(Tag::OCTSTR)),
            read_reference_url,
        );
        let mut state = DecodeState::default();
        parser.parse(buffer, &mut state)?;
        if state.extra.is_empty() {
            return Err(LdapError::decode("search result reference without URIs"));
        }
        Ok(Self {
            header: state.header.finish(context)?,
            urls: state.extra,
        })
    }
}
