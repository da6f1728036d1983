// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! File Streamer Trait - Anti-Corruption Layer for file delivery
//!
//! Isolates the gateway from how bytes actually reach the caller. The
//! gateway decides *whether* and *what* to send; a `FileStreamer` opens the
//! resolved path and hands back a chunked byte stream.

use crate::domain::asset::ResolvedFile;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use thiserror::Error;

/// Chunked file body. Dropping it closes the underlying handle.
pub type ByteStream = BoxStream<'static, Result<Bytes, std::io::Error>>;

/// An opened file body
pub struct FileStream {
    /// Length in bytes at open time
    pub content_length: u64,
    pub body: ByteStream,
}

impl std::fmt::Debug for FileStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStream")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Streaming errors
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("File not found")]
    NotFound,

    #[error("Not a regular file")]
    NotAFile,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Streaming primitive invoked with a granted file
#[async_trait]
pub trait FileStreamer: Send + Sync {
    /// Open `file.absolute_path` for reading
    ///
    /// # Returns
    /// * `Ok(FileStream)` - length plus a lazily read body
    /// * `Err(StreamError::NotFound)` - nothing at the path
    /// * `Err(StreamError::NotAFile)` - the path is a directory or special file
    /// * `Err(StreamError::Io)` - any other I/O failure
    async fn open(&self, file: &ResolvedFile) -> Result<FileStream, StreamError>;
}
