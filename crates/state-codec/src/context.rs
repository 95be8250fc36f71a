//! Stream contexts for reading and writing cache state
//!
//! Blocks are framed as:
//! - 4 bytes: big-endian payload length
//! - N bytes: payload
//!
//! The contexts borrow nothing from the caller beyond the stream they wrap and
//! never close it; [`WriteContext::into_inner`] and [`ReadContext::into_inner`]
//! hand it back.

use crate::config::CodecConfig;
use crate::wire::TypeResolver;
use crate::{Error, Result};
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Size of the length prefix in bytes
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Writes length-prefixed blocks to an async stream
pub struct WriteContext<W> {
    writer: W,
    config: CodecConfig,
    bytes_written: u64,
}

impl<W: AsyncWrite + Unpin + Send> WriteContext<W> {
    /// Wrap a writer using the default limits
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            config: CodecConfig::default(),
            bytes_written: 0,
        }
    }

    /// Wrap a writer using explicit limits
    ///
    /// Fails with [`Error::Configuration`] if the limits do not validate.
    pub fn with_config(writer: W, config: CodecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            writer,
            config,
            bytes_written: 0,
        })
    }

    /// Limits in effect for this context
    pub const fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Write `payload` as one length-prefixed block
    ///
    /// Nothing is written if the payload exceeds the configured block size.
    pub async fn write_binary(&mut self, payload: &[u8]) -> Result<()> {
        let len = u32::try_from(payload.len())
            .ok()
            .filter(|len| *len <= self.config.max_block_size)
            .ok_or(Error::BlockTooLarge {
                len: payload.len() as u64,
                max: self.config.max_block_size,
            })?;

        self.writer
            .write_all(&len.to_be_bytes())
            .await
            .map_err(|e| Error::io(e, "write length prefix"))?;
        self.bytes_written += LENGTH_PREFIX_SIZE as u64;

        self.writer
            .write_all(payload)
            .await
            .map_err(|e| Error::io(e, "write payload"))?;

        self.bytes_written += payload.len() as u64;
        tracing::trace!(len, total = self.bytes_written, "Wrote binary block");
        Ok(())
    }

    /// Flush buffered bytes to the underlying stream
    pub async fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .await
            .map_err(|e| Error::io(e, "flush"))
    }

    /// Total bytes written through this context
    pub const fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Give the writer back to the caller
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Reads length-prefixed blocks from an async stream
pub struct ReadContext<R> {
    reader: R,
    resolver: Arc<dyn TypeResolver>,
    config: CodecConfig,
    bytes_read: u64,
}

impl<R: AsyncRead + Unpin + Send> ReadContext<R> {
    /// Wrap a reader using the default limits
    pub fn new(reader: R, resolver: Arc<dyn TypeResolver>) -> Self {
        Self {
            reader,
            resolver,
            config: CodecConfig::default(),
            bytes_read: 0,
        }
    }

    /// Wrap a reader using explicit limits
    ///
    /// Fails with [`Error::Configuration`] if the limits do not validate.
    pub fn with_config(
        reader: R,
        resolver: Arc<dyn TypeResolver>,
        config: CodecConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            reader,
            resolver,
            config,
            bytes_read: 0,
        })
    }

    /// Type resolver used to rebuild polymorphic values
    pub fn resolver(&self) -> &dyn TypeResolver {
        self.resolver.as_ref()
    }

    /// Limits in effect for this context
    pub const fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Read one length-prefixed block
    ///
    /// Consumes exactly the prefix and the payload. The length is checked
    /// against the configured block size before any buffer is allocated.
    ///
    /// On [`Error::BlockTooLarge`] only the prefix has been consumed and the
    /// stream is left inside the block. An oversize prefix almost always means
    /// a corrupt stream, so no attempt is made to skip the payload; the caller
    /// should discard the rest of the stream.
    pub async fn read_binary(&mut self) -> Result<Vec<u8>> {
        let mut len_buf = [0u8; LENGTH_PREFIX_SIZE];
        self.reader
            .read_exact(&mut len_buf)
            .await
            .map_err(|e| read_error(e, "length prefix", LENGTH_PREFIX_SIZE))?;
        self.bytes_read += LENGTH_PREFIX_SIZE as u64;

        let len = u32::from_be_bytes(len_buf);
        if len > self.config.max_block_size {
            return Err(Error::BlockTooLarge {
                len: u64::from(len),
                max: self.config.max_block_size,
            });
        }

        let mut payload = vec![0u8; len as usize];
        self.reader
            .read_exact(&mut payload)
            .await
            .map_err(|e| read_error(e, "payload", len as usize))?;
        self.bytes_read += u64::from(len);

        tracing::trace!(len, total = self.bytes_read, "Read binary block");
        Ok(payload)
    }

    /// Total bytes consumed through this context
    pub const fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Give the reader back to the caller
    pub fn into_inner(self) -> R {
        self.reader
    }
}

fn read_error(err: io::Error, section: &'static str, expected: usize) -> Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        Error::truncated(section, expected)
    } else {
        Error::io(err, format!("read {section}"))
    }
}
