// ABOUTME: Error taxonomy for the Bolt client: connector-level failures and hydrated server errors
// ABOUTME: Mirrors the Neo4j driver's Neo4jError hierarchy with typed subclasses and retry/pool hints

use std::io;
use thiserror::Error;

use crate::packstream::PackStreamError;

/// Top-level error returned by connector operations.
#[derive(Debug, Error)]
pub enum BoltError {
    /// Malformed framing or an unexpected/unknown summary tag. Fatal: the
    /// connection must be marked defunct.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// I/O failure on the underlying socket (broken pipe, reset, timeout).
    #[error("connection error: {0}")]
    Connection(#[from] io::Error),

    /// PackStream encode/decode failure.
    #[error("codec error: {0}")]
    Codec(#[from] PackStreamError),

    /// A server FAILURE summary, hydrated into the Neo4j error hierarchy.
    #[error(transparent)]
    Server(#[from] Neo4jError),

    /// An operation was attempted that the negotiated protocol version does
    /// not support (e.g. impersonation before 4.4).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Caller supplied a value that could not be coerced into the wire
    /// representation (non-iterable bookmarks, non-numeric timeout, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Version negotiation with the server failed.
    #[error("handshake error: {0}")]
    Handshake(String),
}

pub type BoltResult<T> = Result<T, BoltError>;

const CLASSIFICATION_CLIENT: &str = "ClientError";
const CLASSIFICATION_TRANSIENT: &str = "TransientError";
const CLASSIFICATION_DATABASE: &str = "DatabaseError";

/// Fields carried by every hydrated server error.
#[derive(Debug, Clone, Default)]
pub struct ErrorInfo {
    pub message: String,
    pub code: String,
    pub classification: String,
    pub category: String,
    pub title: String,
}

/// The Neo4j server-side error hierarchy, hydrated from a FAILURE summary's
/// `code` and `message` fields.
#[derive(Debug, Error, Clone)]
pub enum Neo4jError {
    #[error("{0}")]
    ClientError(ErrorInfo),
    #[error("{0}")]
    ConstraintError(ErrorInfo),
    #[error("{0}")]
    CypherSyntaxError(ErrorInfo),
    #[error("{0}")]
    CypherTypeError(ErrorInfo),
    #[error("{0}")]
    Forbidden(ErrorInfo),
    #[error("{0}")]
    AuthError(ErrorInfo),
    #[error("{0}")]
    TokenExpired(ErrorInfo),

    #[error("{0}")]
    DatabaseError(ErrorInfo),

    #[error("{0}")]
    TransientError(ErrorInfo),
    #[error("{0}")]
    DatabaseUnavailable(ErrorInfo),
    #[error("{0}")]
    NotALeader(ErrorInfo),
    #[error("{0}")]
    ForbiddenOnReadOnlyDatabase(ErrorInfo),
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{code: {}}} {{message: {}}}", self.code, self.message)
    }
}

impl Neo4jError {
    /// Build a typed error from a FAILURE summary's metadata fields,
    /// applying the classification → subclass lookup and the
    /// AuthorizationExpired reclassification rule.
    pub fn hydrate(code: Option<&str>, message: Option<&str>) -> Self {
        let message = message.unwrap_or("An unknown error occurred").to_string();
        let code = code.unwrap_or("Neo.DatabaseError.General.UnknownError");

        let parts: Vec<&str> = code.split('.').collect();
        let (classification, category, title) = if parts.len() == 4 {
            let mut classification = parts[1].to_string();
            let category = parts[2].to_string();
            let title = parts[3].to_string();
            if code == "Neo.ClientError.Security.AuthorizationExpired" {
                classification = CLASSIFICATION_TRANSIENT.to_string();
            }
            (classification, category, title)
        } else {
            (
                CLASSIFICATION_DATABASE.to_string(),
                "General".to_string(),
                "UnknownError".to_string(),
            )
        };

        let info = ErrorInfo {
            message,
            code: code.to_string(),
            classification: classification.clone(),
            category,
            title,
        };

        Self::extract_error_class(&classification, code, info)
    }

    fn extract_error_class(classification: &str, code: &str, info: ErrorInfo) -> Self {
        match classification {
            CLASSIFICATION_CLIENT => match code {
                "Neo.ClientError.Schema.ConstraintValidationFailed"
                | "Neo.ClientError.Schema.ConstraintViolation"
                | "Neo.ClientError.Statement.ConstraintVerificationFailed"
                | "Neo.ClientError.Statement.ConstraintViolation" => {
                    Neo4jError::ConstraintError(info)
                }
                "Neo.ClientError.Statement.InvalidSyntax"
                | "Neo.ClientError.Statement.SyntaxError" => Neo4jError::CypherSyntaxError(info),
                "Neo.ClientError.Procedure.TypeError"
                | "Neo.ClientError.Statement.InvalidType"
                | "Neo.ClientError.Statement.TypeError" => Neo4jError::CypherTypeError(info),
                "Neo.ClientError.General.ForbiddenOnReadOnlyDatabase" => {
                    Neo4jError::ForbiddenOnReadOnlyDatabase(info)
                }
                "Neo.ClientError.General.ReadOnly"
                | "Neo.ClientError.Schema.ForbiddenOnConstraintIndex"
                | "Neo.ClientError.Schema.IndexBelongsToConstraint"
                | "Neo.ClientError.Security.Forbidden"
                | "Neo.ClientError.Transaction.ForbiddenDueToTransactionType" => {
                    Neo4jError::Forbidden(info)
                }
                "Neo.ClientError.Security.AuthorizationFailed"
                | "Neo.ClientError.Security.Unauthorized" => Neo4jError::AuthError(info),
                "Neo.ClientError.Security.TokenExpired" => Neo4jError::TokenExpired(info),
                "Neo.ClientError.Cluster.NotALeader" => Neo4jError::NotALeader(info),
                _ => Neo4jError::ClientError(info),
            },
            CLASSIFICATION_TRANSIENT => match code {
                "Neo.TransientError.General.DatabaseUnavailable" => {
                    Neo4jError::DatabaseUnavailable(info)
                }
                _ => Neo4jError::TransientError(info),
            },
            CLASSIFICATION_DATABASE => Neo4jError::DatabaseError(info),
            _ => Neo4jError::DatabaseError(info),
        }
    }

    pub fn info(&self) -> &ErrorInfo {
        match self {
            Neo4jError::ClientError(i)
            | Neo4jError::ConstraintError(i)
            | Neo4jError::CypherSyntaxError(i)
            | Neo4jError::CypherTypeError(i)
            | Neo4jError::Forbidden(i)
            | Neo4jError::AuthError(i)
            | Neo4jError::TokenExpired(i)
            | Neo4jError::DatabaseError(i)
            | Neo4jError::TransientError(i)
            | Neo4jError::DatabaseUnavailable(i)
            | Neo4jError::NotALeader(i)
            | Neo4jError::ForbiddenOnReadOnlyDatabase(i) => i,
        }
    }

    /// Whether a transaction that yielded this error is worth retrying.
    pub fn is_retriable(&self) -> bool {
        match self {
            Neo4jError::TransientError(i)
            | Neo4jError::DatabaseUnavailable(i)
            | Neo4jError::NotALeader(i)
            | Neo4jError::ForbiddenOnReadOnlyDatabase(i) => !matches!(
                i.code.as_str(),
                "Neo.TransientError.Transaction.Terminated"
                    | "Neo.TransientError.Transaction.LockClientStopped"
            ),
            _ => false,
        }
    }

    /// True only for `AuthorizationExpired`: all pooled connections sharing
    /// this auth token must be considered stale.
    pub fn invalidates_all_connections(&self) -> bool {
        self.info().code == "Neo.ClientError.Security.AuthorizationExpired"
    }

    /// Routing-table discovery must not retry these: they indicate the
    /// request itself, not the server, is at fault.
    pub fn is_fatal_during_discovery(&self) -> bool {
        let code = self.info().code.as_str();
        if matches!(
            code,
            "Neo.ClientError.Database.DatabaseNotFound"
                | "Neo.ClientError.Transaction.InvalidBookmark"
                | "Neo.ClientError.Transaction.InvalidBookmarkMixture"
        ) {
            return true;
        }
        code.starts_with("Neo.ClientError.Security.")
            && code != "Neo.ClientError.Security.AuthorizationExpired"
    }

    /// True for errors that indicate the server (or the database it hosts)
    /// is unavailable and the pool should deactivate this address.
    pub fn is_service_unavailable(&self) -> bool {
        matches!(self, Neo4jError::DatabaseUnavailable(_))
    }

    /// True for errors that indicate a write was attempted against a
    /// non-writer; the pool should record this as a write failure.
    pub fn is_write_failure(&self) -> bool {
        matches!(
            self,
            Neo4jError::NotALeader(_) | Neo4jError::ForbiddenOnReadOnlyDatabase(_)
        )
    }
}

/// Callback surface the protocol handler invokes on the owning connection
/// pool when a FAILURE summary requires pool-level bookkeeping. Kept as a
/// trait so this crate has no direct dependency on pool internals.
pub trait PoolHandle: Send + Sync {
    fn deactivate(&self);
    fn on_write_failure(&self);
    fn mark_all_stale(&self);
}

/// Applies the pool-dispatch rules for a hydrated server error against an
/// optional pool handle, after the response's `on_failure` callback has run.
pub fn dispatch_pool_side_effects(error: &Neo4jError, pool: Option<&dyn PoolHandle>) {
    let Some(pool) = pool else { return };
    if error.is_service_unavailable() {
        pool.deactivate();
    } else if error.is_write_failure() {
        pool.on_write_failure();
    } else if error.invalidates_all_connections() {
        pool.mark_all_stale();
    }
}
