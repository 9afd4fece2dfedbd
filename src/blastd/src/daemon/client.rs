use crate::daemon::handlers::activity::ACTIVITY_REQUEST;
use crate::daemon::handlers::ping::PING_REQUEST;
use crate::daemon::handlers::sync::SYNC_REQUEST;
use crate::daemon::structs::{ActivityData, Request, Response};
use std::io;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;

/// Talks to a running daemon over its socket.
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    pub async fn connect(&self) -> io::Result<DaemonConnection> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (reader, writer) = stream.into_split();
        Ok(DaemonConnection {
            reader: BufReader::new(reader),
            writer,
        })
    }

    pub async fn send_ping_request(&self) -> io::Result<Response> {
        self.connect().await?.request(&Request::new(PING_REQUEST)).await
    }

    pub async fn send_sync_request(&self) -> io::Result<Response> {
        self.connect().await?.request(&Request::new(SYNC_REQUEST)).await
    }

    pub async fn send_activity_request(&self, data: &ActivityData) -> io::Result<Response> {
        let data = serde_json::to_value(data)?;
        self.connect()
            .await?
            .request(&Request::with_data(ACTIVITY_REQUEST, data))
            .await
    }
}

/// One open connection; requests on it are answered in order.
pub struct DaemonConnection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl DaemonConnection {
    pub async fn request(&mut self, request: &Request) -> io::Result<Response> {
        let line = serde_json::to_string(request)?;
        self.send_line(&line).await
    }

    /// Writes `line` verbatim plus a newline and reads one response line.
    pub async fn send_line(&mut self, line: &str) -> io::Result<Response> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;

        let mut response = String::new();
        if self.reader.read_line(&mut response).await? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "daemon closed the connection",
            ));
        }
        Ok(serde_json::from_str(&response)?)
    }
}
