use crate::daemon::error::IntakeError;
use crate::daemon::routes::handle_line;
use crate::daemon::state::DaemonState;
use crate::daemon::structs::Response;
use anyhow::Context;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const SOCKET_MODE: u32 = 0o600;
/// Longest accepted request line, newline excluded.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Unix-socket intake listener.
pub struct DaemonServer {
    listener: UnixListener,
    socket_path: PathBuf,
    state: DaemonState,
}

impl DaemonServer {
    /// Binds the socket at `socket_path`, replacing a stale socket file left
    /// by a previous run, and restricts it to the owner.
    pub fn bind(socket_path: &Path, state: DaemonState) -> anyhow::Result<Self> {
        match std::fs::remove_file(socket_path) {
            Ok(()) => debug!("Removed stale socket {}", socket_path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to remove stale socket {}", socket_path.display())
                })
            }
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("failed to bind {}", socket_path.display()))?;
        std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(SOCKET_MODE))
            .with_context(|| format!("failed to restrict {}", socket_path.display()))?;

        info!("Listening on {}", socket_path.display());
        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
            state,
        })
    }

    /// Accepts connections until `cancellation_token` fires, then closes the
    /// listener and removes the socket file. Open connections are left to
    /// finish on their own.
    pub async fn run(self, cancellation_token: CancellationToken) {
        let Self {
            listener,
            socket_path,
            state,
        } = self;

        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    info!("Shutdown requested, no longer accepting connections");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, _)) => {
                        let state = state.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, &state).await {
                                debug!("Connection closed with error: {}", e);
                            }
                        });
                    }
                    Err(e) => error!("accept error: {}", e),
                }
            }
        }

        drop(listener);
        if let Err(e) = std::fs::remove_file(&socket_path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("Failed to remove socket {}: {}", socket_path.display(), e);
            }
        }
    }
}

/// Answers each request line with exactly one response line, in order, until
/// the client disconnects. A line longer than [`MAX_LINE_BYTES`] is answered
/// with an error and ends the connection.
async fn handle_connection(stream: UnixStream, state: &DaemonState) -> io::Result<()> {
    debug!("Client connected");
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();

    loop {
        line.clear();
        let read = (&mut reader)
            .take(MAX_LINE_BYTES as u64 + 1)
            .read_until(b'\n', &mut line)
            .await?;
        if read == 0 {
            break;
        }

        if line.len() > MAX_LINE_BYTES && !line.ends_with(b"\n") {
            warn!("Dropping client after a line over {} bytes", MAX_LINE_BYTES);
            write_response(&mut writer, &Response::error(IntakeError::InvalidJson)).await?;
            break;
        }

        let response = handle_line(state, line.trim_ascii()).await;
        write_response(&mut writer, &response).await?;
    }

    debug!("Client disconnected");
    Ok(())
}

async fn write_response<W>(writer: &mut W, response: &Response) -> io::Result<()>
where
    W: AsyncWriteExt + Unpin,
{
    let mut encoded = serde_json::to_vec(response)?;
    encoded.push(b'\n');
    writer.write_all(&encoded).await?;
    writer.flush().await
}
