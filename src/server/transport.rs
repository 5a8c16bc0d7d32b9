use std::net::SocketAddr;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use crate::errors::Result;

/// Request/reply delivery for the server loop.
///
/// `recv` blocks until a request arrives and returns `None` once the
/// transport shuts down. Every request gets exactly one `reply`.
pub trait Transport {
    fn recv(&mut self) -> Result<Option<String>>;
    fn reply(&mut self, message: &str) -> Result<()>;
}

struct Connection {
    peer: SocketAddr,
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

/// Newline-delimited TCP transport: one JSON message per line, one reply
/// line per message. Serves one client connection at a time.
pub struct TcpTransport {
    runtime: Runtime,
    listener: TcpListener,
    conn: Option<Connection>,
    cancel: CancellationToken,
}

impl TcpTransport {
    pub fn bind(port: u16, cancel: CancellationToken) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let listener = runtime.block_on(TcpListener::bind(("0.0.0.0", port)))?;
        Ok(Self {
            runtime,
            listener,
            conn: None,
            cancel,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.conn.as_ref().map(|c| c.peer)
    }
}

async fn next_line(
    listener: &TcpListener,
    conn: &mut Option<Connection>,
    cancel: &CancellationToken,
) -> Result<Option<String>> {
    loop {
        if conn.is_none() {
            let (stream, peer) = tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(None),
                accepted = listener.accept() => accepted?,
            };
            let (read, writer) = stream.into_split();
            *conn = Some(Connection {
                peer,
                reader: BufReader::new(read),
                writer,
            });
        }
        let Some(active) = conn.as_mut() else {
            continue;
        };

        let mut line = String::new();
        let read = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(None),
            read = active.reader.read_line(&mut line) => read,
        };
        match read {
            Ok(n) if n > 0 => {
                let line = line.trim();
                if !line.is_empty() {
                    return Ok(Some(line.to_string()));
                }
            }
            // Client hung up or the connection broke; wait for the next one.
            _ => *conn = None,
        }
    }
}

impl Transport for TcpTransport {
    fn recv(&mut self) -> Result<Option<String>> {
        let Self {
            runtime,
            listener,
            conn,
            cancel,
        } = self;
        runtime.block_on(next_line(listener, conn, cancel))
    }

    fn reply(&mut self, message: &str) -> Result<()> {
        let Self { runtime, conn, .. } = self;
        let Some(active) = conn.as_mut() else {
            return Ok(());
        };
        let sent: std::io::Result<()> = runtime.block_on(async {
            active.writer.write_all(message.as_bytes()).await?;
            active.writer.write_all(b"\n").await?;
            active.writer.flush().await
        });
        if sent.is_err() {
            *conn = None;
        }
        Ok(sent?)
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("local_addr", &self.listener.local_addr().ok())
            .field("peer", &self.peer())
            .finish()
    }
}
