// ABOUTME: Thin TCP-flavored facade over `Connection`, collapsed into one type
// ABOUTME: since Bolt has exactly one transport shape to wrap

use std::sync::Arc;

use tokio::net::{TcpStream, ToSocketAddrs};

use crate::connection::{Connection, ServerInfo};
use crate::error::{BoltResult, PoolHandle};
use crate::handler::{BoltVersion, RequestOptions, RouteResult};
use crate::packstream::ValueMap;
use crate::response::Response;
use crate::state::ServerState;

/// A Bolt connection over a plain TCP socket. Version negotiation and
/// TLS are the caller's responsibility — `connect`
/// assumes `addr` already speaks Bolt at `version` from byte zero, which
/// in practice means the caller ran the 4-byte magic + version handshake
/// before constructing this client.
pub struct BoltClient {
    connection: Connection<TcpStream>,
}

impl BoltClient {
    /// Opens the TCP socket and wraps it in a `Connection` at the given
    /// (already-negotiated) protocol version.
    pub async fn connect<A: ToSocketAddrs>(
        addr: A,
        version: BoltVersion,
        user_agent: impl Into<String>,
        routing_context: Option<ValueMap>,
    ) -> BoltResult<Self> {
        let socket = TcpStream::connect(addr).await?;
        socket.set_nodelay(true).ok();
        Self::from_stream(socket, version, user_agent, routing_context)
    }

    /// Wraps a socket the caller has already connected (and, for a real
    /// server, already run the Bolt version handshake on) — see
    /// `demos/run_query.rs` for the handshake this skips.
    pub fn from_stream(
        socket: TcpStream,
        version: BoltVersion,
        user_agent: impl Into<String>,
        routing_context: Option<ValueMap>,
    ) -> BoltResult<Self> {
        let connection = Connection::new(socket, version, user_agent, routing_context)?;
        Ok(Self { connection })
    }

    pub fn with_pool(mut self, pool: Arc<dyn PoolHandle>) -> Self {
        self.connection = self.connection.with_pool(pool);
        self
    }

    pub fn version(&self) -> BoltVersion {
        self.connection.version()
    }

    pub fn state(&self) -> ServerState {
        self.connection.state()
    }

    pub fn server_info(&self) -> &ServerInfo {
        self.connection.server_info()
    }

    pub fn is_reset(&self) -> bool {
        self.connection.is_reset()
    }

    pub async fn hello(&mut self, auth: ValueMap) -> BoltResult<()> {
        self.connection.hello(auth).await
    }

    pub fn run(
        &mut self,
        query: &str,
        parameters: ValueMap,
        opts: &RequestOptions,
        response: Response,
    ) -> BoltResult<()> {
        self.connection.run(query, parameters, opts, response)
    }

    pub fn pull(&mut self, n: i64, qid: i64, response: Response) {
        self.connection.pull(n, qid, response)
    }

    pub fn discard(&mut self, n: i64, qid: i64, response: Response) {
        self.connection.discard(n, qid, response)
    }

    pub fn begin(&mut self, opts: &RequestOptions, response: Response) -> BoltResult<()> {
        self.connection.begin(opts, response)
    }

    pub fn commit(&mut self, response: Response) {
        self.connection.commit(response)
    }

    pub fn rollback(&mut self, response: Response) {
        self.connection.rollback(response)
    }

    pub fn goodbye(&mut self) {
        self.connection.goodbye()
    }

    pub async fn reset(&mut self) -> BoltResult<()> {
        self.connection.reset().await
    }

    pub async fn route(
        &mut self,
        database: Option<&str>,
        imp_user: Option<&str>,
        bookmarks: Option<Vec<String>>,
    ) -> BoltResult<RouteResult> {
        self.connection.route(database, imp_user, bookmarks).await
    }

    pub async fn send_all(&mut self) -> BoltResult<()> {
        self.connection.send_all().await
    }

    pub async fn fetch_all(&mut self) -> BoltResult<()> {
        self.connection.fetch_all().await
    }

    pub async fn fetch_one(&mut self) -> BoltResult<bool> {
        self.connection.fetch_one().await
    }
}

/// Credentials for HELLO's auth fields, opaque to the core beyond their
/// wire representation — the auth scheme itself is an external
/// collaborator's concern.
#[derive(Debug, Clone)]
pub struct BasicAuth {
    pub principal: String,
    pub credentials: String,
    pub realm: Option<String>,
}

impl BasicAuth {
    pub fn new(principal: impl Into<String>, credentials: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            credentials: credentials.into(),
            realm: None,
        }
    }

    pub fn into_auth_map(self) -> ValueMap {
        use crate::packstream::Value;
        let mut map = ValueMap::new();
        map.insert("scheme", Value::String("basic".to_string()));
        map.insert("principal", Value::String(self.principal));
        map.insert("credentials", Value::String(self.credentials));
        if let Some(realm) = self.realm {
            map.insert("realm", Value::String(realm));
        }
        map
    }
}
