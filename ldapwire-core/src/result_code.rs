//! LDAP result codes (RFC 4511 §4.1.9 and later extensions)

use crate::error::{LdapError, LdapResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of an LDAP operation as carried in the `resultCode` ENUMERATED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultCode {
    Success = 0,
    OperationsError = 1,
    ProtocolError = 2,
    TimeLimitExceeded = 3,
    SizeLimitExceeded = 4,
    CompareFalse = 5,
    CompareTrue = 6,
    AuthMethodNotSupported = 7,
    StrongerAuthRequired = 8,
    Referral = 10,
    AdminLimitExceeded = 11,
    UnavailableCriticalExtension = 12,
    ConfidentialityRequired = 13,
    SaslBindInProgress = 14,
    NoSuchAttribute = 16,
    UndefinedAttributeType = 17,
    InappropriateMatching = 18,
    ConstraintViolation = 19,
    AttributeOrValueExists = 20,
    InvalidAttributeSyntax = 21,
    NoSuchObject = 32,
    AliasProblem = 33,
    InvalidDnSyntax = 34,
    AliasDereferencingProblem = 36,
    InappropriateAuthentication = 48,
    InvalidCredentials = 49,
    InsufficientAccessRights = 50,
    Busy = 51,
    Unavailable = 52,
    UnwillingToPerform = 53,
    LoopDetect = 54,
    NamingViolation = 64,
    ObjectClassViolation = 65,
    NotAllowedOnNonLeaf = 66,
    NotAllowedOnRdn = 67,
    EntryAlreadyExists = 68,
    ObjectClassModsProhibited = 69,
    AffectsMultipleDsas = 71,
    Other = 80,
    Canceled = 118,
    NoSuchOperation = 119,
    TooLate = 120,
    CannotCancel = 121,
    AssertionFailed = 122,
    AuthorizationDenied = 123,
    ESyncRefreshRequired = 4096,
}

const NAMES: &[(ResultCode, &str)] = &[
    (ResultCode::Success, "success"),
    (ResultCode::OperationsError, "operationsError"),
    (ResultCode::ProtocolError, "protocolError"),
    (ResultCode::TimeLimitExceeded, "timeLimitExceeded"),
    (ResultCode::SizeLimitExceeded, "sizeLimitExceeded"),
    (ResultCode::CompareFalse, "compareFalse"),
    (ResultCode::CompareTrue, "compareTrue"),
    (ResultCode::AuthMethodNotSupported, "authMethodNotSupported"),
    (ResultCode::StrongerAuthRequired, "strongerAuthRequired"),
    (ResultCode::Referral, "referral"),
    (ResultCode::AdminLimitExceeded, "adminLimitExceeded"),
    (ResultCode::UnavailableCriticalExtension, "unavailableCriticalExtension"),
    (ResultCode::ConfidentialityRequired, "confidentialityRequired"),
    (ResultCode::SaslBindInProgress, "saslBindInProgress"),
    (ResultCode::NoSuchAttribute, "noSuchAttribute"),
    (ResultCode::UndefinedAttributeType, "undefinedAttributeType"),
    (ResultCode::InappropriateMatching, "inappropriateMatching"),
    (ResultCode::ConstraintViolation, "constraintViolation"),
    (ResultCode::AttributeOrValueExists, "attributeOrValueExists"),
    (ResultCode::InvalidAttributeSyntax, "invalidAttributeSyntax"),
    (ResultCode::NoSuchObject, "noSuchObject"),
    (ResultCode::AliasProblem, "aliasProblem"),
    (ResultCode::InvalidDnSyntax, "invalidDNSyntax"),
    (ResultCode::AliasDereferencingProblem, "aliasDereferencingProblem"),
    (ResultCode::InappropriateAuthentication, "inappropriateAuthentication"),
    (ResultCode::InvalidCredentials, "invalidCredentials"),
    (ResultCode::InsufficientAccessRights, "insufficientAccessRights"),
    (ResultCode::Busy, "busy"),
    (ResultCode::Unavailable, "unavailable"),
    (ResultCode::UnwillingToPerform, "unwillingToPerform"),
    (ResultCode::LoopDetect, "loopDetect"),
    (ResultCode::NamingViolation, "namingViolation"),
    (ResultCode::ObjectClassViolation, "objectClassViolation"),
    (ResultCode::NotAllowedOnNonLeaf, "notAllowedOnNonLeaf"),
    (ResultCode::NotAllowedOnRdn, "notAllowedOnRDN"),
    (ResultCode::EntryAlreadyExists, "entryAlreadyExists"),
    (ResultCode::ObjectClassModsProhibited, "objectClassModsProhibited"),
    (ResultCode::AffectsMultipleDsas, "affectsMultipleDSAs"),
    (ResultCode::Other, "other"),
    (ResultCode::Canceled, "canceled"),
    (ResultCode::NoSuchOperation, "noSuchOperation"),
    (ResultCode::TooLate, "tooLate"),
    (ResultCode::CannotCancel, "cannotCancel"),
    (ResultCode::AssertionFailed, "assertionFailed"),
    (ResultCode::AuthorizationDenied, "authorizationDenied"),
    (ResultCode::ESyncRefreshRequired, "e-syncRefreshRequired"),
];

impl ResultCode {
    /// Numeric value as carried on the wire
    pub fn code(self) -> i64 {
        self as i64
    }

    /// Look up a result code by its wire value
    pub fn from_code(code: i64) -> LdapResult<Self> {
        NAMES
            .iter()
            .find(|(rc, _)| rc.code() == code)
            .map(|(rc, _)| *rc)
            .ok_or(LdapError::UnknownResultCode(code))
    }

    /// Protocol name, e.g. `compareTrue`
    pub fn name(self) -> &'static str {
        NAMES
            .iter()
            .find(|(rc, _)| *rc == self)
            .map(|(_, name)| *name)
            .unwrap_or("unknown")
    }

    pub fn is_success(self) -> bool {
        self == ResultCode::Success
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

impl TryFrom<i64> for ResultCode {
    type Error = LdapError;

    fn try_from(code: i64) -> LdapResult<Self> {
        Self::from_code(code)
    }
}
