//! A client-side implementation of the Bolt wire protocol used to talk to a
//! Neo4j graph database server: chunked message framing, a PackStream value
//! codec, a FIFO response queue correlating requests to summaries, a
//! per-connection server-state machine, a versioned protocol handler
//! (Bolt 4.0 through 5.0), and a server-error taxonomy with connection-pool
//! side effects.
//!
//! The socket/TLS factory, the connection pool, the session/transaction
//! convenience API, routing-table caching, and spatial/temporal PackStream
//! value types are treated as external collaborators — this crate describes
//! only the interfaces it consumes from or exposes to them.
//!
//! ```rust,no_run
//! use bolt_client::client::{BasicAuth, BoltClient};
//! use bolt_client::handler::BoltVersion;
//! use bolt_client::packstream::ValueMap;
//! use bolt_client::response::Response;
//!
//! #[tokio::main]
//! async fn main() -> bolt_client::error::BoltResult<()> {
//!     let mut client = BoltClient::connect(
//!         "localhost:7687",
//!         BoltVersion::V5_0,
//!         "bolt-client/0.1",
//!         None,
//!     )
//!     .await?;
//!
//!     client
//!         .hello(BasicAuth::new("neo4j", "password").into_auth_map())
//!         .await?;
//!
//!     client.run(
//!         "RETURN 1 AS n",
//!         ValueMap::new(),
//!         &Default::default(),
//!         Response::new("run"),
//!     )?;
//!     client.pull(-1, -1, Response::new("pull"));
//!     client.send_all().await?;
//!     client.fetch_all().await?;
//!
//!     client.goodbye();
//!     client.send_all().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod connection;
pub mod error;
pub mod framing;
pub mod handler;
pub mod message;
pub mod packstream;
pub mod response;
pub mod state;

pub use client::BoltClient;
pub use connection::Connection;
pub use error::{BoltError, BoltResult, Neo4jError, PoolHandle};
pub use handler::{BoltVersion, ProtocolHandler, RequestOptions, RouteResult};
pub use message::{RequestTag, SummaryTag};
pub use packstream::{PackStreamError, Value, ValueMap};
pub use response::{Response, ResponseQueue};
pub use state::{ServerState, ServerStateManager};
