// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Local Filesystem File Streamer
//!
//! Opens granted files with `tokio::fs` and exposes them as a chunked
//! `ReaderStream`. The stream owns the file handle, so dropping the
//! response body (client disconnect, cancelled request) closes the file.
//!
//! **Limitations:**
//! - Symlinks inside a volume root are followed
//! - The length is taken at open time; a file growing mid-stream is truncated
//!   to that length by the HTTP layer

use crate::domain::asset::ResolvedFile;
use crate::domain::streaming::{FileStream, FileStreamer, StreamError};
use async_trait::async_trait;
use futures::StreamExt;
use tokio_util::io::ReaderStream;

/// Default read buffer size per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Local filesystem streamer
pub struct LocalFileStreamer {
    chunk_size: usize,
}

impl LocalFileStreamer {
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }
}

impl Default for LocalFileStreamer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileStreamer for LocalFileStreamer {
    async fn open(&self, file: &ResolvedFile) -> Result<FileStream, StreamError> {
        let path = &file.absolute_path;

        let metadata = match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if is_missing(&e) => return Err(StreamError::NotFound),
            Err(e) => return Err(StreamError::Io(e)),
        };

        if !metadata.is_file() {
            return Err(StreamError::NotAFile);
        }

        let handle = match tokio::fs::File::open(path).await {
            Ok(handle) => handle,
            Err(e) if is_missing(&e) => return Err(StreamError::NotFound),
            Err(e) => return Err(StreamError::Io(e)),
        };

        Ok(FileStream {
            content_length: metadata.len(),
            body: ReaderStream::with_capacity(handle, self.chunk_size).boxed(),
        })
    }
}

// A path component that is a regular file ("a.png/x") reports NotADirectory.
fn is_missing(error: &std::io::Error) -> bool {
    matches!(
        error.kind(),
        std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory
    )
}
