//! IPC (Inter-Process Communication) via Unix sockets
//!
//! The host binds a socket and spawns the renderer, which connects back.
//! Signals travel as length-prefixed JSON in both directions.

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::{Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

mod messages;
pub use messages::{HostSignal, RendererSignal};

use crate::constants::{self, ipc::MAX_MESSAGE_SIZE};

/// Socket path for the host with the given pid
/// (XDG_RUNTIME_DIR with fallback to cache)
pub fn default_socket_path(pid: u32) -> Result<PathBuf> {
    let name = format!("host-{pid}.sock");
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return Ok(PathBuf::from(runtime_dir)
            .join(constants::app::DIR_NAME)
            .join(name));
    }

    let cache = dirs::cache_dir()
        .context("Failed to determine cache directory (no XDG_RUNTIME_DIR or HOME)")?;
    Ok(cache.join(constants::app::DIR_NAME).join(name))
}

/// One end of the host/renderer connection
pub struct SignalConnection {
    stream: UnixStream,
}

impl SignalConnection {
    /// Connect to the host's socket (used by the renderer)
    pub fn connect_to(path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(path)
            .with_context(|| format!("Failed to connect to host at {}", path.display()))?;
        Ok(Self { stream })
    }

    pub fn from_stream(stream: UnixStream) -> Self {
        Self { stream }
    }

    /// Second handle on the same socket, so reads and writes can live on
    /// different threads
    pub fn try_clone(&self) -> Result<Self> {
        let stream = self
            .stream
            .try_clone()
            .context("Failed to clone IPC stream")?;
        Ok(Self { stream })
    }

    pub fn send<T: Serialize>(&mut self, msg: &T) -> Result<()> {
        write_message(&mut self.stream, msg)
    }

    /// Receive the next message (blocking)
    pub fn recv<T: DeserializeOwned>(&mut self) -> Result<T> {
        read_message(&mut self.stream)
    }
}

/// Listening socket owned by the host
pub struct SignalServer {
    listener: UnixListener,
    socket_path: PathBuf,
}

impl SignalServer {
    pub fn bind_to(socket_path: PathBuf) -> Result<Self> {
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {}", parent.display()))?;
        }

        if socket_path.exists() {
            std::fs::remove_file(&socket_path)
                .with_context(|| format!("Failed to remove stale socket: {}", socket_path.display()))?;
        }

        let listener = UnixListener::bind(&socket_path)
            .with_context(|| format!("Failed to bind socket at {}", socket_path.display()))?;

        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&socket_path, std::fs::Permissions::from_mode(0o700))
                .context("Failed to set socket permissions")?;
        }

        Ok(Self {
            listener,
            socket_path,
        })
    }

    /// Accept incoming connection (blocking)
    pub fn accept(&self) -> Result<SignalConnection> {
        let (stream, _addr) = self
            .listener
            .accept()
            .context("Failed to accept IPC connection")?;
        Ok(SignalConnection { stream })
    }

    pub fn path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for SignalServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Write length-prefixed message to stream
fn write_message<W: Write, T: Serialize>(stream: &mut W, msg: &T) -> Result<()> {
    let json = serde_json::to_vec(msg).context("Failed to serialize message to JSON")?;

    if json.len() > MAX_MESSAGE_SIZE {
        return Err(anyhow!(
            "Message too large: {} bytes (max: {})",
            json.len(),
            MAX_MESSAGE_SIZE
        ));
    }

    // u32 little-endian length prefix
    let len = json.len() as u32;
    stream
        .write_all(&len.to_le_bytes())
        .context("Failed to write message length")?;
    stream
        .write_all(&json)
        .context("Failed to write message payload")?;
    stream.flush().context("Failed to flush stream")?;

    Ok(())
}

/// Read length-prefixed message from stream
fn read_message<R: Read, T: DeserializeOwned>(stream: &mut R) -> Result<T> {
    let mut len_buf = [0u8; 4];
    stream
        .read_exact(&mut len_buf)
        .context("Failed to read message length")?;
    let len = u32::from_le_bytes(len_buf) as usize;

    if len > MAX_MESSAGE_SIZE {
        return Err(anyhow!(
            "Message too large: {} bytes (max: {})",
            len,
            MAX_MESSAGE_SIZE
        ));
    }

    let mut json_buf = vec![0u8; len];
    stream
        .read_exact(&mut json_buf)
        .context("Failed to read message payload")?;

    serde_json::from_slice(&json_buf).context("Failed to deserialize message from JSON")
}
