// ABOUTME: Per-connection Bolt context — owns the Outbox/Inbox, response queue, state manager and
// ABOUTME: negotiated protocol handler for one socket.

use std::sync::Arc;

use tokio::io::{split, AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tracing::{debug, instrument, warn};

use crate::error::{dispatch_pool_side_effects, BoltError, BoltResult, Neo4jError, PoolHandle};
use crate::framing::{Inbox, Outbox, DEFAULT_CAPACITY, DEFAULT_MAX_CHUNK_SIZE};
use crate::handler::{
    build_extra, build_hello_metadata, build_stream_extra, BoltVersion, ProtocolHandler,
    RequestOptions, RouteResult, RoutingStyle,
};
use crate::message::{RequestTag, SummaryTag};
use crate::packstream::{encode_structure, Value, ValueMap};
use crate::response::{Response, ResponseQueue};
use crate::state::{ServerState, ServerStateManager};

/// Server identity fields learned from HELLO's (or ROUTE/HELLO hint's)
/// `SUCCESS` metadata. Opaque beyond what the core inspects directly.
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    pub agent: Option<String>,
    pub connection_id: Option<String>,
}

impl ServerInfo {
    fn update(&mut self, metadata: &ValueMap) {
        if let Some(Value::String(s)) = metadata.get("server") {
            self.agent = Some(s.clone());
        }
        if let Some(Value::String(s)) = metadata.get("connection_id") {
            self.connection_id = Some(s.clone());
        }
    }
}

/// One Bolt connection. Not safe to share between tasks — the owning pool
/// hands out exclusive leases.
pub struct Connection<S> {
    writer: WriteHalf<S>,
    inbox: Inbox<ReadHalf<S>>,
    outbox: Outbox,
    responses: ResponseQueue,
    state: ServerStateManager,
    handler: ProtocolHandler,
    user_agent: String,
    routing_context: Option<ValueMap>,
    configuration_hints: ValueMap,
    recv_timeout_seconds: Option<u32>,
    server_info: ServerInfo,
    pool: Option<Arc<dyn PoolHandle>>,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Connection<S> {
    /// Wraps an already-handshaken stream. Version negotiation and
    /// TLS/socket construction happen upstream of this crate.
    pub fn new(
        stream: S,
        version: BoltVersion,
        user_agent: impl Into<String>,
        routing_context: Option<ValueMap>,
    ) -> BoltResult<Self> {
        let handler = ProtocolHandler::for_version(version)?;
        let (read_half, write_half) = split(stream);
        Ok(Self {
            writer: write_half,
            inbox: Inbox::new(read_half),
            outbox: Outbox::new(DEFAULT_CAPACITY, DEFAULT_MAX_CHUNK_SIZE),
            responses: ResponseQueue::new(),
            state: ServerStateManager::new(ServerState::Connected),
            handler,
            user_agent: user_agent.into(),
            routing_context,
            configuration_hints: ValueMap::new(),
            recv_timeout_seconds: None,
            server_info: ServerInfo::default(),
            pool: None,
        })
    }

    pub fn with_pool(mut self, pool: Arc<dyn PoolHandle>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn version(&self) -> BoltVersion {
        self.handler.version
    }

    pub fn state(&self) -> ServerState {
        self.state.state()
    }

    pub fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    pub fn configuration_hints(&self) -> &ValueMap {
        &self.configuration_hints
    }

    pub fn recv_timeout_seconds(&self) -> Option<u32> {
        self.recv_timeout_seconds
    }

    /// `is_reset ⇔ (queue empty ∧ state=READY) ∨ tail.request = "reset"`
    pub fn is_reset(&self) -> bool {
        if self.responses.tail_is_reset() {
            return true;
        }
        self.responses.is_empty() && self.state.state() == ServerState::Ready
    }

    fn enqueue(&mut self, tag: u8, fields: &[Value], response: Response) {
        self.enqueue_wire(tag, fields);
        self.responses.push(response);
    }

    /// Writes a message with no corresponding entry in the response queue —
    /// for GOODBYE, which the server never replies to.
    fn enqueue_no_response(&mut self, tag: u8, fields: &[Value]) {
        self.enqueue_wire(tag, fields);
    }

    fn enqueue_wire(&mut self, tag: u8, fields: &[Value]) {
        let mut buf = bytes::BytesMut::new();
        encode_structure(tag, fields, &mut buf);
        self.outbox.write(&buf);
        self.outbox.chunk();
    }

    // ---- request builders: non-blocking, never touch the socket ----

    #[instrument(skip(self, auth))]
    fn enqueue_hello(&mut self, auth: ValueMap) {
        let metadata = build_hello_metadata(
            &self.handler,
            &self.user_agent,
            self.routing_context.as_ref(),
            &auth,
        );
        debug!("C: HELLO");
        self.enqueue(
            RequestTag::Hello as u8,
            &[Value::Map(metadata)],
            Response::new("hello"),
        );
    }

    /// Best-effort: the server does not reply to GOODBYE, so no `Response`
    /// is registered in the queue for it.
    pub fn goodbye(&mut self) {
        debug!("C: GOODBYE");
        self.enqueue_no_response(RequestTag::Goodbye as u8, &[]);
    }

    pub fn reset_enqueue(&mut self) {
        debug!("C: RESET");
        self.enqueue(RequestTag::Reset as u8, &[], Response::new("reset"));
    }

    pub fn run(
        &mut self,
        query: &str,
        parameters: ValueMap,
        opts: &RequestOptions,
        response: Response,
    ) -> BoltResult<()> {
        let extra = build_extra(opts, &self.handler)?;
        debug!(query, "C: RUN");
        let fields = [
            Value::String(query.to_string()),
            Value::Map(parameters),
            Value::Map(extra),
        ];
        let mut response = response;
        response.request_name = "run".to_string();
        self.enqueue(RequestTag::Run as u8, &fields, response);
        Ok(())
    }

    pub fn pull(&mut self, n: i64, qid: i64, response: Response) {
        let extra = build_stream_extra(n, qid);
        debug!(n, qid, "C: PULL");
        let mut response = response;
        response.request_name = "pull".to_string();
        self.enqueue(RequestTag::Pull as u8, &[Value::Map(extra)], response);
    }

    pub fn discard(&mut self, n: i64, qid: i64, response: Response) {
        let extra = build_stream_extra(n, qid);
        debug!(n, qid, "C: DISCARD");
        let mut response = response;
        response.request_name = "discard".to_string();
        self.enqueue(RequestTag::Discard as u8, &[Value::Map(extra)], response);
    }

    pub fn begin(&mut self, opts: &RequestOptions, response: Response) -> BoltResult<()> {
        let extra = build_extra(opts, &self.handler)?;
        debug!("C: BEGIN");
        let mut response = response;
        response.request_name = "begin".to_string();
        self.enqueue(RequestTag::Begin as u8, &[Value::Map(extra)], response);
        Ok(())
    }

    pub fn commit(&mut self, response: Response) {
        debug!("C: COMMIT");
        let mut response = response;
        response.request_name = "commit".to_string();
        self.enqueue(RequestTag::Commit as u8, &[], response);
    }

    pub fn rollback(&mut self, response: Response) {
        debug!("C: ROLLBACK");
        let mut response = response;
        response.request_name = "rollback".to_string();
        self.enqueue(RequestTag::Rollback as u8, &[], response);
    }

    // ---- suspension points: the only async operations ----

    pub async fn send_all(&mut self) -> BoltResult<()> {
        self.outbox.flush_to(&mut self.writer).await
    }

    /// Consumes one socket message and dispatches it to the queue head.
    /// Returns `Ok(false)` when the queue was already empty (nothing to
    /// wait for).
    pub async fn fetch_one(&mut self) -> BoltResult<bool> {
        if self.responses.is_empty() {
            return Ok(false);
        }
        let (tag, fields) = self.inbox.fetch_message().await.inspect_err(|_| {
            self.state.defunct();
        })?;
        self.dispatch(tag, fields).await?;
        Ok(true)
    }

    pub async fn fetch_all(&mut self) -> BoltResult<()> {
        while self.fetch_one().await? {}
        Ok(())
    }

    #[instrument(skip(self, auth))]
    pub async fn hello(&mut self, auth: ValueMap) -> BoltResult<()> {
        self.enqueue_hello(auth);
        self.send_all().await?;
        self.fetch_all().await
    }

    /// Cancels in-flight responses (the server replies IGNORED for each,
    /// then SUCCESS for the RESET) and drives the connection back to READY.
    pub async fn reset(&mut self) -> BoltResult<()> {
        self.reset_enqueue();
        self.send_all().await?;
        self.fetch_all().await
    }

    /// Routing-table discovery. Shape of the result depends on the
    /// negotiated version's `RoutingStyle`.
    pub async fn route(
        &mut self,
        database: Option<&str>,
        imp_user: Option<&str>,
        bookmarks: Option<Vec<String>>,
    ) -> BoltResult<RouteResult> {
        match self.handler.routing_style {
            RoutingStyle::ProcedureCall => {
                self.route_via_procedure(database, imp_user, bookmarks).await
            }
            RoutingStyle::RouteDatabase => {
                if imp_user.is_some() {
                    return Err(BoltError::Configuration(format!(
                        "Impersonation is not supported in Bolt Protocol {}. Trying to impersonate {:?}.",
                        self.handler.version, imp_user
                    )));
                }
                let db_field = match database {
                    Some(d) => Value::String(d.to_string()),
                    None => Value::Null,
                };
                self.route_via_message(bookmarks, db_field).await
            }
            RoutingStyle::RouteDbContext => {
                let mut db_context = ValueMap::new();
                if let Some(d) = database {
                    db_context.insert("db", Value::String(d.to_string()));
                }
                if let Some(u) = imp_user {
                    db_context.insert("imp_user", Value::String(u.to_string()));
                }
                self.route_via_message(bookmarks, Value::Map(db_context)).await
            }
        }
    }

    async fn route_via_message(
        &mut self,
        bookmarks: Option<Vec<String>>,
        third_field: Value,
    ) -> BoltResult<RouteResult> {
        let context = Value::Map(self.routing_context.clone().unwrap_or_default());
        let bookmarks = Value::List(
            bookmarks
                .unwrap_or_default()
                .into_iter()
                .map(Value::String)
                .collect(),
        );
        debug!("C: ROUTE");
        let rt = std::sync::Arc::new(std::sync::Mutex::new(None));
        let rt_capture = rt.clone();
        let response = Response::new("route").with_on_success(move |metadata| {
            *rt_capture.lock().unwrap() = metadata.get("rt").cloned();
        });
        self.enqueue(
            RequestTag::Route as u8,
            &[context, bookmarks, third_field],
            response,
        );
        self.send_all().await?;
        self.fetch_all().await?;
        Ok(RouteResult::Table(rt.lock().unwrap().take()))
    }

    /// 4.0–4.2: `CALL dbms.routing.getRoutingTable(...)` via RUN+PULL
    /// against `system`. `fields` is bound from RUN's own SUCCESS, not
    /// PULL's — see DESIGN.md.
    async fn route_via_procedure(
        &mut self,
        database: Option<&str>,
        imp_user: Option<&str>,
        bookmarks: Option<Vec<String>>,
    ) -> BoltResult<RouteResult> {
        if imp_user.is_some() {
            return Err(BoltError::Configuration(format!(
                "Impersonation is not supported in Bolt Protocol {}. Trying to impersonate {:?}.",
                self.handler.version, imp_user
            )));
        }

        let mut parameters = ValueMap::new();
        parameters.insert(
            "context",
            Value::Map(self.routing_context.clone().unwrap_or_default()),
        );
        let query = if let Some(db) = database {
            parameters.insert("database", Value::String(db.to_string()));
            "CALL dbms.routing.getRoutingTable($context, $database)"
        } else {
            "CALL dbms.routing.getRoutingTable($context)"
        };

        let opts = RequestOptions {
            read_mode: true,
            db: Some("system".to_string()),
            bookmarks,
            ..Default::default()
        };

        let fields = Arc::new(std::sync::Mutex::new(Vec::<String>::new()));
        let fields_capture = fields.clone();
        let run_response = Response::new("run").with_on_success(move |metadata| {
            if let Some(Value::List(items)) = metadata.get("fields") {
                *fields_capture.lock().unwrap() =
                    items.iter().filter_map(Value::as_str).map(String::from).collect();
            }
        });
        self.run(query, parameters, &opts, run_response)?;

        let records = Arc::new(std::sync::Mutex::new(Vec::<Vec<Value>>::new()));
        let records_capture = records.clone();
        let pull_response = Response::new("pull").with_on_records(move |rows| {
            records_capture.lock().unwrap().extend(rows);
        });
        self.pull(-1, -1, pull_response);

        self.send_all().await?;
        self.fetch_all().await?;

        let fields = fields.lock().unwrap().clone();
        let rows = std::mem::take(&mut *records.lock().unwrap());
        let zipped = rows
            .into_iter()
            .map(|row| {
                fields
                    .iter()
                    .cloned()
                    .zip(row)
                    .collect::<ValueMap>()
            })
            .collect();
        Ok(RouteResult::Records(zipped))
    }

    #[instrument(skip(self, fields))]
    async fn dispatch(&mut self, tag: u8, fields: Vec<Value>) -> BoltResult<()> {
        let Ok(summary) = SummaryTag::try_from(tag) else {
            self.state.defunct();
            return Err(BoltError::Protocol(format!(
                "unexpected response message with signature 0x{tag:02X}"
            )));
        };

        if summary == SummaryTag::Record {
            let row = fields.into_iter().next().and_then(|v| match v {
                Value::List(items) => Some(items),
                _ => None,
            });
            if let (Some(row), Some(front)) = (row, self.responses.front_mut()) {
                debug!("S: RECORD");
                front.fire_records(vec![row]);
            }
            return Ok(());
        }

        let Some(mut response) = self.responses.pop_front() else {
            self.state.defunct();
            return Err(BoltError::Protocol(
                "received a summary with no pending request".to_string(),
            ));
        };
        response.complete = true;

        let metadata = fields
            .into_iter()
            .next()
            .and_then(|v| match v {
                Value::Map(m) => Some(m),
                _ => None,
            })
            .unwrap_or_default();

        match summary {
            SummaryTag::Success => {
                debug!("S: SUCCESS");
                self.state.transition(&response.request_name, &metadata);
                if response.request_name == "hello" {
                    self.apply_hello_hints(&metadata);
                }
                response.fire_success(&metadata);
            }
            SummaryTag::Ignored => {
                debug!("S: IGNORED");
                response.fire_ignored();
            }
            SummaryTag::Failure => {
                debug!("S: FAILURE");
                self.state.fail();
                let code = metadata.get("code").and_then(Value::as_str);
                let message = metadata.get("message").and_then(Value::as_str);
                let error = Neo4jError::hydrate(code, message);
                response.fire_failure(&error);
                dispatch_pool_side_effects(&error, self.pool.as_deref());
                if response.request_name == "reset" {
                    // RESET itself failed: no further recovery is attempted.
                    self.state.defunct();
                } else {
                    self.attempt_implicit_reset().await;
                }
                return Err(BoltError::Server(error));
            }
            SummaryTag::Record => unreachable!("handled above"),
        }
        Ok(())
    }

    /// A RESET is attempted implicitly on FAILURE to return the server to
    /// READY; if RESET itself fails (or the socket errors, or the reply
    /// isn't a SUCCESS), the connection is marked defunct. Reads the RESET
    /// reply directly rather than through `dispatch`/`fetch_one`, since
    /// this is already running inside `dispatch`'s own FAILURE handling.
    async fn attempt_implicit_reset(&mut self) {
        debug!("C: RESET (implicit)");
        self.reset_enqueue();
        if let Err(err) = self.send_all().await {
            warn!(%err, "failed to send implicit RESET after FAILURE");
            self.state.defunct();
            return;
        }

        let message = self.inbox.fetch_message().await;
        let Some(mut response) = self.responses.pop_front() else {
            self.state.defunct();
            return;
        };

        let (tag, fields) = match message {
            Ok(m) => m,
            Err(err) => {
                warn!(%err, "failed to read implicit RESET response");
                self.state.defunct();
                return;
            }
        };

        let metadata = fields
            .into_iter()
            .next()
            .and_then(|v| match v {
                Value::Map(m) => Some(m),
                _ => None,
            })
            .unwrap_or_default();

        if matches!(SummaryTag::try_from(tag), Ok(SummaryTag::Success)) {
            debug!("S: SUCCESS (implicit RESET)");
            self.state.transition(&response.request_name, &metadata);
            response.fire_success(&metadata);
        } else {
            warn!("implicit RESET after FAILURE did not succeed");
            self.state.defunct();
        }
    }

    fn apply_hello_hints(&mut self, metadata: &ValueMap) {
        self.server_info.update(metadata);
        let Some(Value::Map(hints)) = metadata.get("hints") else {
            return;
        };
        for (k, v) in hints.iter() {
            self.configuration_hints.insert(k.clone(), v.clone());
        }
        match hints.get("connection.recv_timeout_seconds") {
            Some(Value::Integer(n)) if *n > 0 => {
                self.recv_timeout_seconds = Some(*n as u32);
            }
            Some(other) => {
                warn!(
                    ?other,
                    "server supplied an invalid value for connection.recv_timeout_seconds"
                );
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    fn encode_success(buf: &mut bytes::BytesMut, metadata: ValueMap) {
        encode_structure(0x70, &[Value::Map(metadata)], buf);
    }

    fn write_chunked(wire: &mut bytes::BytesMut, body: &[u8]) {
        wire.extend_from_slice(&(body.len() as u16).to_be_bytes());
        wire.extend_from_slice(body);
        wire.extend_from_slice(&0u16.to_be_bytes());
    }

    #[tokio::test]
    async fn hello_round_trip_applies_hints_and_moves_to_ready() {
        let (client, mut server) = duplex(4096);
        let mut conn = Connection::new(client, BoltVersion::V5_0, "ua/1", None).unwrap();

        let mut metadata = ValueMap::new();
        metadata.insert("server", Value::String("Neo4j/5.0.0".to_string()));
        metadata.insert("connection_id", Value::String("bolt-1".to_string()));
        let mut hints = ValueMap::new();
        hints.insert("connection.recv_timeout_seconds", Value::Integer(120));
        metadata.insert("hints", Value::Map(hints));

        let mut body = bytes::BytesMut::new();
        encode_success(&mut body, metadata);
        let mut wire = bytes::BytesMut::new();
        write_chunked(&mut wire, &body);

        use tokio::io::AsyncWriteExt;
        server.write_all(&wire).await.unwrap();

        conn.hello(ValueMap::new()).await.unwrap();

        assert_eq!(conn.state(), ServerState::Ready);
        assert_eq!(conn.server_info().agent.as_deref(), Some("Neo4j/5.0.0"));
        assert_eq!(conn.recv_timeout_seconds(), Some(120));
    }

    #[tokio::test]
    async fn run_pull_streaming_then_ready() {
        let (client, mut server) = duplex(8192);
        let mut conn = Connection::new(client, BoltVersion::V5_0, "ua/1", None).unwrap();
        conn.state = ServerStateManager::new(ServerState::Ready);

        use tokio::io::AsyncWriteExt;

        let mut run_meta = ValueMap::new();
        run_meta.insert(
            "fields",
            Value::List(vec![Value::String("n".to_string())]),
        );
        let mut run_body = bytes::BytesMut::new();
        encode_success(&mut run_body, run_meta);
        let mut wire = bytes::BytesMut::new();
        write_chunked(&mut wire, &run_body);
        server.write_all(&wire).await.unwrap();

        let response = Response::new("run");
        conn.run("RETURN 1 AS n", ValueMap::new(), &RequestOptions::default(), response)
            .unwrap();
        conn.send_all().await.unwrap();
        conn.fetch_all().await.unwrap();
        assert_eq!(conn.state(), ServerState::Ready);

        let mut record_body = bytes::BytesMut::new();
        encode_structure(0x71, &[Value::List(vec![Value::Integer(1)])], &mut record_body);
        let mut pull_meta = ValueMap::new();
        pull_meta.insert("has_more", Value::Boolean(false));
        pull_meta.insert("bookmark", Value::String("b1".to_string()));
        let mut pull_body = bytes::BytesMut::new();
        encode_success(&mut pull_body, pull_meta);

        let mut wire = bytes::BytesMut::new();
        write_chunked(&mut wire, &record_body);
        write_chunked(&mut wire, &pull_body);
        server.write_all(&wire).await.unwrap();

        let records = Arc::new(std::sync::Mutex::new(Vec::new()));
        let rc = records.clone();
        let response = Response::new("pull").with_on_records(move |rows| {
            rc.lock().unwrap().extend(rows);
        });
        conn.pull(-1, -1, response);
        conn.send_all().await.unwrap();
        conn.fetch_all().await.unwrap();

        assert_eq!(conn.state(), ServerState::Ready);
        assert_eq!(*records.lock().unwrap(), vec![vec![Value::Integer(1)]]);
    }

    #[tokio::test]
    async fn failure_raises_typed_error_and_implicit_reset_returns_to_ready() {
        let (client, mut server) = duplex(4096);
        let mut conn = Connection::new(client, BoltVersion::V5_0, "ua/1", None).unwrap();
        conn.state = ServerStateManager::new(ServerState::Ready);

        use tokio::io::AsyncWriteExt;
        let mut metadata = ValueMap::new();
        metadata.insert(
            "code",
            Value::String("Neo.ClientError.Cluster.NotALeader".to_string()),
        );
        metadata.insert("message", Value::String("not a leader".to_string()));
        let mut body = bytes::BytesMut::new();
        encode_structure(0x7F, &[Value::Map(metadata)], &mut body);
        let mut wire = bytes::BytesMut::new();
        write_chunked(&mut wire, &body);
        // The implicit RESET's own reply, queued up ahead of time since the
        // client sends RESET and reads this reply within the same fetch_all.
        let mut reset_body = bytes::BytesMut::new();
        encode_success(&mut reset_body, ValueMap::new());
        write_chunked(&mut wire, &reset_body);
        server.write_all(&wire).await.unwrap();

        conn.run(
            "RETURN 1",
            ValueMap::new(),
            &RequestOptions::default(),
            Response::new("run"),
        )
        .unwrap();
        conn.send_all().await.unwrap();
        let err = conn.fetch_all().await.unwrap_err();
        assert!(matches!(err, BoltError::Server(Neo4jError::NotALeader(_))));
        assert_eq!(conn.state(), ServerState::Ready);
    }

    #[tokio::test]
    async fn failure_whose_implicit_reset_also_fails_marks_defunct() {
        let (client, mut server) = duplex(4096);
        let mut conn = Connection::new(client, BoltVersion::V5_0, "ua/1", None).unwrap();
        conn.state = ServerStateManager::new(ServerState::Ready);

        use tokio::io::AsyncWriteExt;
        let mut metadata = ValueMap::new();
        metadata.insert(
            "code",
            Value::String("Neo.ClientError.Cluster.NotALeader".to_string()),
        );
        metadata.insert("message", Value::String("not a leader".to_string()));
        let mut body = bytes::BytesMut::new();
        encode_structure(0x7F, &[Value::Map(metadata)], &mut body);
        let mut wire = bytes::BytesMut::new();
        write_chunked(&mut wire, &body);
        // The implicit RESET itself also fails.
        let mut reset_failure = ValueMap::new();
        reset_failure.insert(
            "code",
            Value::String("Neo.DatabaseError.General.UnknownError".to_string()),
        );
        reset_failure.insert("message", Value::String("boom".to_string()));
        let mut reset_body = bytes::BytesMut::new();
        encode_structure(0x7F, &[Value::Map(reset_failure)], &mut reset_body);
        write_chunked(&mut wire, &reset_body);
        server.write_all(&wire).await.unwrap();

        conn.run(
            "RETURN 1",
            ValueMap::new(),
            &RequestOptions::default(),
            Response::new("run"),
        )
        .unwrap();
        conn.send_all().await.unwrap();
        let err = conn.fetch_all().await.unwrap_err();
        assert!(matches!(err, BoltError::Server(Neo4jError::NotALeader(_))));
        assert_eq!(conn.state(), ServerState::Defunct);
    }

    #[tokio::test]
    async fn is_reset_true_when_queue_empty_and_ready() {
        let (client, _server) = duplex(1024);
        let mut conn = Connection::new(client, BoltVersion::V5_0, "ua/1", None).unwrap();
        conn.state = ServerStateManager::new(ServerState::Ready);
        assert!(conn.is_reset());
    }

    #[tokio::test]
    async fn is_reset_true_when_tail_is_reset_even_mid_failure() {
        let (client, _server) = duplex(1024);
        let mut conn = Connection::new(client, BoltVersion::V5_0, "ua/1", None).unwrap();
        conn.state = ServerStateManager::new(ServerState::Failed);
        conn.reset_enqueue();
        assert!(conn.is_reset());
    }

    #[test]
    fn unknown_version_rejected_at_construction() {
        let (client, _server) = duplex(1024);
        let err = Connection::new(
            client,
            BoltVersion { major: 9, minor: 9 },
            "ua/1",
            None,
        )
        .unwrap_err();
        assert!(matches!(err, BoltError::Handshake(_)));
    }
}
