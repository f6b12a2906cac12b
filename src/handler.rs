// ABOUTME: Per-version protocol facade — what each Bolt version adds or changes relative to the last
// ABOUTME: Each version is a plain value rather than a trait object in a class hierarchy

use crate::error::{BoltError, BoltResult};
use crate::packstream::{Value, ValueMap};

/// Negotiated Bolt protocol version for one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoltVersion {
    pub major: u8,
    pub minor: u8,
}

impl BoltVersion {
    pub const V4_0: Self = Self { major: 4, minor: 0 };
    pub const V4_1: Self = Self { major: 4, minor: 1 };
    pub const V4_2: Self = Self { major: 4, minor: 2 };
    pub const V4_3: Self = Self { major: 4, minor: 3 };
    pub const V4_4: Self = Self { major: 4, minor: 4 };
    pub const V5_0: Self = Self { major: 5, minor: 0 };
}

impl std::fmt::Display for BoltVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// How `route()` is carried on the wire for a given version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingStyle {
    /// 4.0–4.2: no ROUTE message exists; routing is a `RUN` of
    /// `CALL dbms.routing.getRoutingTable(...)` against `system`, followed
    /// by `PULL`.
    ProcedureCall,
    /// 4.3: native `ROUTE` (tag 0x66) with fields `(context, bookmarks, database)`.
    RouteDatabase,
    /// 4.4 / 5.0: native `ROUTE` with fields `(context, bookmarks, db_context)`
    /// where `db_context` is a map holding `db` and/or `imp_user`.
    RouteDbContext,
}

/// What a Bolt version adds or changes relative to the previous one.
/// Deliberately a plain value rather than a trait object hierarchy: each
/// version differs from the last in a handful of flags, not in behavior
/// deep enough to warrant dynamic dispatch.
#[derive(Debug, Clone, Copy)]
pub struct ProtocolHandler {
    pub version: BoltVersion,
    /// 4.1+: HELLO carries `routing` when a routing context is configured.
    pub hello_carries_routing: bool,
    /// 4.4+: `RUN`/`BEGIN`/`ROUTE` accept `imp_user`.
    pub supports_imp_user: bool,
    pub routing_style: RoutingStyle,
}

impl ProtocolHandler {
    pub fn for_version(version: BoltVersion) -> BoltResult<Self> {
        let handler = match (version.major, version.minor) {
            (4, 0) => Self {
                version,
                hello_carries_routing: false,
                supports_imp_user: false,
                routing_style: RoutingStyle::ProcedureCall,
            },
            (4, 1) | (4, 2) => Self {
                version,
                hello_carries_routing: true,
                supports_imp_user: false,
                routing_style: RoutingStyle::ProcedureCall,
            },
            (4, 3) => Self {
                version,
                hello_carries_routing: true,
                supports_imp_user: false,
                routing_style: RoutingStyle::RouteDatabase,
            },
            (4, 4) => Self {
                version,
                hello_carries_routing: true,
                supports_imp_user: true,
                routing_style: RoutingStyle::RouteDbContext,
            },
            (5, 0) => Self {
                version,
                hello_carries_routing: true,
                supports_imp_user: true,
                routing_style: RoutingStyle::RouteDbContext,
            },
            _ => {
                return Err(BoltError::Handshake(format!(
                    "unsupported Bolt protocol version {version}"
                )))
            }
        };
        Ok(handler)
    }
}

/// Caller-supplied options shared by `RUN` and `BEGIN`'s `extra` map.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub read_mode: bool,
    pub db: Option<String>,
    pub imp_user: Option<String>,
    pub bookmarks: Option<Vec<String>>,
    pub tx_metadata: Option<ValueMap>,
    /// Timeout in seconds; converted to non-negative integer milliseconds.
    pub tx_timeout: Option<f64>,
}

/// Builds the `extra` map shared by `RUN` and `BEGIN`, applying the version
/// gate on `imp_user` and the numeric validation on `tx_timeout`.
///
/// `bookmarks` arrives pre-coerced to `Vec<String>` by Rust's type system,
/// so there is no "bookmarks not iterable" input-validation error to raise
/// here (see DESIGN.md).
pub fn build_extra(opts: &RequestOptions, handler: &ProtocolHandler) -> BoltResult<ValueMap> {
    let mut extra = ValueMap::new();

    if opts.read_mode {
        extra.insert("mode", Value::String("r".to_string()));
    }
    if let Some(db) = &opts.db {
        if !db.is_empty() {
            extra.insert("db", Value::String(db.clone()));
        }
    }
    if let Some(imp_user) = &opts.imp_user {
        if !handler.supports_imp_user {
            return Err(BoltError::Configuration(format!(
                "Impersonation is not supported in Bolt Protocol {}. Trying to impersonate {:?}.",
                handler.version, imp_user
            )));
        }
        if !imp_user.is_empty() {
            extra.insert("imp_user", Value::String(imp_user.clone()));
        }
    }
    if let Some(bookmarks) = &opts.bookmarks {
        if !bookmarks.is_empty() {
            extra.insert(
                "bookmarks",
                Value::List(bookmarks.iter().cloned().map(Value::String).collect()),
            );
        }
    }
    if let Some(metadata) = &opts.tx_metadata {
        if !metadata.is_empty() {
            extra.insert("tx_metadata", Value::Map(metadata.clone()));
        }
    }
    if let Some(timeout) = opts.tx_timeout {
        if !timeout.is_finite() {
            return Err(BoltError::InvalidInput(
                "Timeout must be specified as a finite number of seconds".to_string(),
            ));
        }
        let millis = (timeout * 1000.0).round() as i64;
        if millis < 0 {
            return Err(BoltError::InvalidInput(
                "Timeout must be a positive number or 0.".to_string(),
            ));
        }
        extra.insert("tx_timeout", Value::Integer(millis));
    }

    Ok(extra)
}

/// Builds `PULL`/`DISCARD`'s `extra` map: always `n`, `qid` only when not -1.
pub fn build_stream_extra(n: i64, qid: i64) -> ValueMap {
    let mut extra = ValueMap::new();
    extra.insert("n", Value::Integer(n));
    if qid != -1 {
        extra.insert("qid", Value::Integer(qid));
    }
    extra
}

/// Builds HELLO's metadata map: `user_agent`, the routing context (when
/// carried at this version), and the caller's opaque auth fields merged in.
pub fn build_hello_metadata(
    handler: &ProtocolHandler,
    user_agent: &str,
    routing_context: Option<&ValueMap>,
    auth: &ValueMap,
) -> ValueMap {
    let mut metadata = ValueMap::new();
    metadata.insert("user_agent", Value::String(user_agent.to_string()));
    if handler.hello_carries_routing {
        if let Some(ctx) = routing_context {
            metadata.insert("routing", Value::Map(ctx.clone()));
        }
    }
    for (k, v) in auth.iter() {
        metadata.insert(k.clone(), v.clone());
    }
    metadata
}

/// Outcome of `route()`, shaped differently depending on the routing style
/// in play (see DESIGN.md for the 4.0–4.2 vs 4.3+ return-shape difference).
#[derive(Debug, Clone, PartialEq)]
pub enum RouteResult {
    /// 4.0–4.2: the `getRoutingTable` procedure's result rows, zipped
    /// against the column names bound at `RUN`'s `SUCCESS` (not `PULL`'s —
    /// see DESIGN.md).
    Records(Vec<ValueMap>),
    /// 4.3+: the single `rt` field from `ROUTE`'s `SUCCESS`, if present.
    Table(Option<Value>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_40_rejects_imp_user() {
        let handler = ProtocolHandler::for_version(BoltVersion::V4_0).unwrap();
        let opts = RequestOptions {
            imp_user: Some("alice".to_string()),
            ..Default::default()
        };
        let err = build_extra(&opts, &handler).unwrap_err();
        assert!(matches!(err, BoltError::Configuration(_)));
    }

    #[test]
    fn version_44_accepts_imp_user() {
        let handler = ProtocolHandler::for_version(BoltVersion::V4_4).unwrap();
        let opts = RequestOptions {
            imp_user: Some("alice".to_string()),
            ..Default::default()
        };
        let extra = build_extra(&opts, &handler).unwrap();
        assert_eq!(extra.get("imp_user"), Some(&Value::String("alice".into())));
    }

    #[test]
    fn negative_timeout_is_rejected() {
        let handler = ProtocolHandler::for_version(BoltVersion::V5_0).unwrap();
        let opts = RequestOptions {
            tx_timeout: Some(-1.0),
            ..Default::default()
        };
        let err = build_extra(&opts, &handler).unwrap_err();
        assert!(matches!(err, BoltError::InvalidInput(_)));
    }

    #[test]
    fn zero_timeout_is_accepted() {
        let handler = ProtocolHandler::for_version(BoltVersion::V5_0).unwrap();
        let opts = RequestOptions {
            tx_timeout: Some(0.0),
            ..Default::default()
        };
        let extra = build_extra(&opts, &handler).unwrap();
        assert_eq!(extra.get("tx_timeout"), Some(&Value::Integer(0)));
    }

    #[test]
    fn timeout_converts_seconds_to_milliseconds() {
        let handler = ProtocolHandler::for_version(BoltVersion::V5_0).unwrap();
        let opts = RequestOptions {
            tx_timeout: Some(2.5),
            ..Default::default()
        };
        let extra = build_extra(&opts, &handler).unwrap();
        assert_eq!(extra.get("tx_timeout"), Some(&Value::Integer(2500)));
    }

    #[test]
    fn read_mode_sets_r_otherwise_omitted() {
        let handler = ProtocolHandler::for_version(BoltVersion::V4_0).unwrap();
        let read = build_extra(
            &RequestOptions {
                read_mode: true,
                ..Default::default()
            },
            &handler,
        )
        .unwrap();
        assert_eq!(read.get("mode"), Some(&Value::String("r".into())));

        let write = build_extra(&RequestOptions::default(), &handler).unwrap();
        assert_eq!(write.get("mode"), None);
    }

    #[test]
    fn stream_extra_omits_qid_when_default() {
        let extra = build_stream_extra(-1, -1);
        assert_eq!(extra.get("qid"), None);
        let extra = build_stream_extra(100, 7);
        assert_eq!(extra.get("qid"), Some(&Value::Integer(7)));
    }

    #[test]
    fn hello_metadata_carries_routing_only_from_41() {
        let mut ctx = ValueMap::new();
        ctx.insert("address", Value::String("h:7687".into()));

        let h40 = ProtocolHandler::for_version(BoltVersion::V4_0).unwrap();
        let meta = build_hello_metadata(&h40, "ua/1", Some(&ctx), &ValueMap::new());
        assert_eq!(meta.get("routing"), None);

        let h41 = ProtocolHandler::for_version(BoltVersion::V4_1).unwrap();
        let meta = build_hello_metadata(&h41, "ua/1", Some(&ctx), &ValueMap::new());
        assert!(meta.get("routing").is_some());
    }

    #[test]
    fn unsupported_version_is_a_handshake_error() {
        let err = ProtocolHandler::for_version(BoltVersion { major: 3, minor: 0 }).unwrap_err();
        assert!(matches!(err, BoltError::Handshake(_)));
    }
}
