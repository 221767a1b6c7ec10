//! Error taxonomy for the routing core.
//!
//! Every kind is its own type with a hand-written [`std::fmt::Display`],
//! matching the rest of the crate's error style rather than pulling in a
//! derive-macro crate for a handful of variants.

use std::fmt;

/// A route pattern failed to parse.
///
/// Returned from [`crate::pattern::Pattern::parse`] and surfaced through
/// [`FreezeError`] when a pending route is compiled at freeze time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSyntaxError {
    /// The pattern did not begin with `/`.
    MissingLeadingSlash { pattern: String },
    /// A `:name` segment had an empty name.
    EmptyParamName { pattern: String },
    /// A wildcard segment appeared before the final segment.
    WildcardNotTerminal { pattern: String },
    /// More than one wildcard segment was present.
    MultipleWildcards { pattern: String },
}

impl fmt::Display for PatternSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternSyntaxError::MissingLeadingSlash { pattern } => {
                write!(f, "route pattern '{pattern}' must start with '/'")
            }
            PatternSyntaxError::EmptyParamName { pattern } => {
                write!(f, "route pattern '{pattern}' has a parameter with an empty name")
            }
            PatternSyntaxError::WildcardNotTerminal { pattern } => {
                write!(
                    f,
                    "route pattern '{pattern}' has a wildcard segment that is not the final segment"
                )
            }
            PatternSyntaxError::MultipleWildcards { pattern } => {
                write!(f, "route pattern '{pattern}' has more than one wildcard segment")
            }
        }
    }
}

impl std::error::Error for PatternSyntaxError {}

/// Two pending routes could not be reconciled into the same tree position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictingRouteError {
    pub method: http::Method,
    pub pattern: String,
    pub reason: ConflictReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictReason {
    /// Two routes register a parameter/wildcard child at the same position
    /// with different capture names.
    ParamNameMismatch { existing: String, incoming: String },
    /// The same `(method, pattern)` pair was registered twice.
    DuplicateTerminal,
}

impl fmt::Display for ConflictingRouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            ConflictReason::ParamNameMismatch { existing, incoming } => write!(
                f,
                "route {} {} conflicts with an existing registration: parameter name '{}' does not match '{}' at the same position",
                self.method, self.pattern, incoming, existing
            ),
            ConflictReason::DuplicateTerminal => write!(
                f,
                "route {} {} is already registered",
                self.method, self.pattern
            ),
        }
    }
}

impl std::error::Error for ConflictingRouteError {}

/// A [`crate::version::VersioningOptions`] configuration was invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersioningConfigError {
    /// No detector was configured.
    NoDetectorConfigured,
    /// The default version is not present in the configured whitelist.
    DefaultNotInWhitelist { default: String },
    /// A path-template detector did not contain a `{version}` placeholder.
    InvalidPathTemplate { template: String },
    /// An accept-header template did not contain a `{version}` placeholder.
    InvalidAcceptTemplate { template: String },
}

impl fmt::Display for VersioningConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersioningConfigError::NoDetectorConfigured => {
                write!(f, "versioning is enabled but no detector was configured")
            }
            VersioningConfigError::DefaultNotInWhitelist { default } => write!(
                f,
                "default version '{default}' is not present in the configured version whitelist"
            ),
            VersioningConfigError::InvalidPathTemplate { template } => write!(
                f,
                "path version template '{template}' must contain a '{{version}}' placeholder"
            ),
            VersioningConfigError::InvalidAcceptTemplate { template } => write!(
                f,
                "accept-header version template '{template}' must contain a '{{version}}' placeholder"
            ),
        }
    }
}

impl std::error::Error for VersioningConfigError {}

/// Registration was attempted after the router had already frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlreadyFrozenError;

impl fmt::Display for AlreadyFrozenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "router is frozen; routes can no longer be registered")
    }
}

impl std::error::Error for AlreadyFrozenError {}

/// The union of failures that can occur while registering a route or
/// compiling pending routes at freeze time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreezeError {
    Pattern(PatternSyntaxError),
    Conflict(ConflictingRouteError),
    Versioning(VersioningConfigError),
    AlreadyFrozen(AlreadyFrozenError),
}

impl fmt::Display for FreezeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FreezeError::Pattern(e) => write!(f, "{e}"),
            FreezeError::Conflict(e) => write!(f, "{e}"),
            FreezeError::Versioning(e) => write!(f, "{e}"),
            FreezeError::AlreadyFrozen(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for FreezeError {}

impl From<PatternSyntaxError> for FreezeError {
    fn from(e: PatternSyntaxError) -> Self {
        FreezeError::Pattern(e)
    }
}

impl From<ConflictingRouteError> for FreezeError {
    fn from(e: ConflictingRouteError) -> Self {
        FreezeError::Conflict(e)
    }
}

impl From<VersioningConfigError> for FreezeError {
    fn from(e: VersioningConfigError) -> Self {
        FreezeError::Versioning(e)
    }
}

impl From<AlreadyFrozenError> for FreezeError {
    fn from(e: AlreadyFrozenError) -> Self {
        FreezeError::AlreadyFrozen(e)
    }
}
