//! Platform-specific pipe/socket implementation.
//!
//! - Unix: Unix Domain Socket
//! - Windows: Named Pipe
//!
//! # Example
//!
//! ```ignore
//! use hostpipe::transport::{resolve_channel_path, PipeListener};
//!
//! let path = resolve_channel_path("unity_module");
//! let mut listener = PipeListener::bind(&path).await?;
//! let stream = listener.accept().await?;
//! ```

use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::error::Result;

/// Map a channel name to a platform endpoint path.
///
/// - Unix: a name containing `/` is used as the socket path verbatim,
///   anything else becomes `<tmp>/<name>.sock`
/// - Windows: `\\.\pipe\<name>` unless already in that form
pub fn resolve_channel_path(name: &str) -> String {
    #[cfg(unix)]
    {
        if name.contains('/') {
            name.to_string()
        } else {
            std::env::temp_dir()
                .join(format!("{name}.sock"))
                .to_string_lossy()
                .into_owned()
        }
    }

    #[cfg(windows)]
    {
        const PIPE_PREFIX: &str = r"\\.\pipe\";
        if name.starts_with(PIPE_PREFIX) {
            name.to_string()
        } else {
            format!("{PIPE_PREFIX}{name}")
        }
    }
}

// ============================================================================
// Unix Implementation
// ============================================================================

#[cfg(unix)]
mod unix_impl {
    use super::*;
    use std::io;
    use std::path::Path;
    use tokio::net::{UnixListener, UnixStream};

    /// Unix Domain Socket listener.
    pub struct PipeListener {
        listener: UnixListener,
        path: String,
    }

    /// Unix Domain Socket stream (connected).
    pub struct PipeStream {
        stream: UnixStream,
    }

    /// Stream type returned by [`connect`].
    pub type ClientStream = UnixStream;

    impl PipeListener {
        /// Bind to a Unix socket path.
        ///
        /// A stale socket file at the path is removed first. Fails with
        /// `AddrInUse` if another server still answers on it.
        pub async fn bind(path: &str) -> Result<Self> {
            if Path::new(path).exists() {
                if UnixStream::connect(path).await.is_ok() {
                    return Err(io::Error::new(
                        io::ErrorKind::AddrInUse,
                        format!("{path} is served by another listener"),
                    )
                    .into());
                }
                std::fs::remove_file(path)?;
            }

            let listener = UnixListener::bind(path)?;

            Ok(Self {
                listener,
                path: path.to_string(),
            })
        }

        /// Accept a single connection.
        pub async fn accept(&mut self) -> Result<PipeStream> {
            let (stream, _addr) = self.listener.accept().await?;
            Ok(PipeStream { stream })
        }

        /// Get the socket path.
        pub fn path(&self) -> &str {
            &self.path
        }
    }

    impl Drop for PipeListener {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.path);
        }
    }

    /// Connect to a listening endpoint.
    pub async fn connect(path: &str) -> Result<ClientStream> {
        Ok(UnixStream::connect(path).await?)
    }

    impl AsyncRead for PipeStream {
        fn poll_read(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            Pin::new(&mut self.stream).poll_read(cx, buf)
        }
    }

    impl AsyncWrite for PipeStream {
        fn poll_write(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            Pin::new(&mut self.stream).poll_write(cx, buf)
        }

        fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Pin::new(&mut self.stream).poll_flush(cx)
        }

        fn poll_shutdown(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
        ) -> Poll<std::io::Result<()>> {
            Pin::new(&mut self.stream).poll_shutdown(cx)
        }
    }
}

// ============================================================================
// Windows Implementation
// ============================================================================

#[cfg(windows)]
mod windows_impl {
    use super::*;
    use tokio::net::windows::named_pipe::{
        ClientOptions, NamedPipeClient, NamedPipeServer, ServerOptions,
    };

    /// Windows Named Pipe listener.
    ///
    /// Holds at most one idle pipe instance; a fresh one is created per accept.
    pub struct PipeListener {
        path: String,
        next: Option<NamedPipeServer>,
    }

    /// Windows Named Pipe stream (connected).
    pub struct PipeStream {
        pipe: NamedPipeServer,
    }

    /// Stream type returned by [`connect`].
    pub type ClientStream = NamedPipeClient;

    impl PipeListener {
        /// Create the first Named Pipe instance.
        ///
        /// Fails if another server already owns the name.
        pub async fn bind(path: &str) -> Result<Self> {
            let first = ServerOptions::new().first_pipe_instance(true).create(path)?;

            Ok(Self {
                path: path.to_string(),
                next: Some(first),
            })
        }

        /// Accept a single connection.
        pub async fn accept(&mut self) -> Result<PipeStream> {
            let server = match self.next.take() {
                Some(server) => server,
                None => ServerOptions::new().create(&self.path)?,
            };

            server.connect().await?;

            Ok(PipeStream { pipe: server })
        }

        /// Get the pipe path.
        pub fn path(&self) -> &str {
            &self.path
        }
    }

    /// Connect to a listening endpoint.
    pub async fn connect(path: &str) -> Result<ClientStream> {
        Ok(ClientOptions::new().open(path)?)
    }

    impl AsyncRead for PipeStream {
        fn poll_read(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            Pin::new(&mut self.pipe).poll_read(cx, buf)
        }
    }

    impl AsyncWrite for PipeStream {
        fn poll_write(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            Pin::new(&mut self.pipe).poll_write(cx, buf)
        }

        fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Pin::new(&mut self.pipe).poll_flush(cx)
        }

        fn poll_shutdown(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
        ) -> Poll<std::io::Result<()>> {
            Pin::new(&mut self.pipe).poll_shutdown(cx)
        }
    }
}

// ============================================================================
// Platform-independent re-exports
// ============================================================================

#[cfg(unix)]
pub use unix_impl::{connect, ClientStream, PipeListener, PipeStream};

#[cfg(windows)]
pub use windows_impl::{connect, ClientStream, PipeListener, PipeStream};
