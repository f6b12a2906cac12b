// ABOUTME: Example application demonstrating a HELLO + RUN + PULL round trip against a Bolt server
// ABOUTME: Shows the raw version handshake (out of scope for the library) plus BoltClient usage

use std::error::Error;

use argh::FromArgs;
use bolt_client::client::{BasicAuth, BoltClient};
use bolt_client::handler::{BoltVersion, RequestOptions};
use bolt_client::packstream::ValueMap;
use bolt_client::response::Response;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Connect to a Neo4j server, run one Cypher query, and print the records.
#[derive(FromArgs)]
struct CliArgs {
    /// whether or not to enable debug logging
    #[argh(switch, short = 'd')]
    debugging: bool,

    /// the hostname or IP address of the server (default: localhost)
    #[argh(option)]
    host: Option<String>,

    /// the port to use when connecting (default: 7687)
    #[argh(option, short = 'p')]
    port: Option<u32>,

    /// the username (default: neo4j)
    #[argh(option)]
    user: Option<String>,

    /// the password
    #[argh(option)]
    password: Option<String>,

    /// the Cypher query to run
    #[argh(option, short = 'q')]
    query: Option<String>,
}

const BOLT_MAGIC: [u8; 4] = [0x60, 0x60, 0xB0, 0x17];

/// Performs the 4-byte magic + 4-version proposal handshake. This lives
/// outside the library on purpose: socket/version negotiation is the
/// caller's concern, and the library starts from an already-negotiated
/// stream.
async fn handshake(stream: &mut TcpStream) -> Result<BoltVersion, Box<dyn Error>> {
    let mut proposal = Vec::with_capacity(20);
    proposal.extend_from_slice(&BOLT_MAGIC);
    for (major, minor) in [(5u32, 0u32), (4, 4), (4, 3), (4, 0)] {
        proposal.extend_from_slice(&[0, 0, minor as u8, major as u8]);
    }
    stream.write_all(&proposal).await?;
    stream.flush().await?;

    let mut response = [0u8; 4];
    stream.read_exact(&mut response).await?;
    let major = response[3];
    let minor = response[2];
    if major == 0 && minor == 0 {
        return Err("server rejected all proposed Bolt versions".into());
    }
    Ok(BoltVersion { major, minor })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli_args: CliArgs = argh::from_env();

    if cli_args.debugging {
        let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("setting default subscriber failed");
    }

    let host = cli_args.host.unwrap_or_else(|| "localhost".to_owned());
    let port = cli_args.port.unwrap_or(7687);
    let user = cli_args.user.unwrap_or_else(|| "neo4j".to_owned());
    let password = cli_args.password.unwrap_or_default();
    let query = cli_args.query.unwrap_or_else(|| "RETURN 1 AS n".to_owned());

    println!("Connecting to {host}:{port}");
    let mut socket = TcpStream::connect((host.as_str(), port as u16)).await?;
    let version = handshake(&mut socket).await?;
    println!("Negotiated Bolt {version}");

    let mut client = BoltClient::from_stream(socket, version, "bolt-client/0.1", None)
        .map_err(|e| Box::<dyn Error>::from(e.to_string()))?;

    client
        .hello(BasicAuth::new(user, password).into_auth_map())
        .await
        .map_err(|e| Box::<dyn Error>::from(e.to_string()))?;
    println!("Connected: {:?}", client.server_info());

    client
        .run(&query, ValueMap::new(), &RequestOptions::default(), Response::new("run"))
        .map_err(|e| Box::<dyn Error>::from(e.to_string()))?;

    let response = Response::new("pull").with_on_records(|rows| {
        for row in rows {
            println!("record: {row:?}");
        }
    });
    client.pull(-1, -1, response);
    client
        .send_all()
        .await
        .map_err(|e| Box::<dyn Error>::from(e.to_string()))?;
    client
        .fetch_all()
        .await
        .map_err(|e| Box::<dyn Error>::from(e.to_string()))?;

    client.goodbye();
    client
        .send_all()
        .await
        .map_err(|e| Box::<dyn Error>::from(e.to_string()))?;

    Ok(())
}
