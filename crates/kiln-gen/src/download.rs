//! Streaming asset downloads

use crate::provider::AssetSource;
use kiln_core::Result;
use log::{info, warn};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Bytes copied per read from the remote stream
pub const CHUNK_SIZE: usize = 8192;

/// Saves remote assets to disk chunk by chunk
pub struct AssetDownloader {
    source: Box<dyn AssetSource>,
    chunk_size: usize,
}

impl AssetDownloader {
    pub fn new(source: Box<dyn AssetSource>) -> Self {
        Self {
            source,
            chunk_size: CHUNK_SIZE,
        }
    }

    /// Download `url` to `folder/filename`, creating `folder` if needed.
    ///
    /// An existing file of the same name is overwritten. If the stream breaks
    /// mid-copy the partial file is removed before the error is returned.
    pub fn download(&self, url: &str, folder: &Path, filename: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(folder)?;
        let local_path = folder.join(filename);

        let mut reader = self.source.open(url)?;
        let mut file = File::create(&local_path)?;

        match copy_chunks(&mut reader, &mut file, self.chunk_size) {
            Ok(bytes) => {
                info!("Downloaded {} ({} bytes) to {}", url, bytes, local_path.display());
                Ok(local_path)
            }
            Err(e) => {
                drop(file);
                if let Err(rm) = std::fs::remove_file(&local_path) {
                    warn!("Could not remove partial file {}: {}", local_path.display(), rm);
                }
                Err(e.into())
            }
        }
    }
}

fn copy_chunks<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    chunk_size: usize,
) -> std::io::Result<u64> {
    let mut buf = vec![0u8; chunk_size];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_all(&buf[..n])?;
        total += n as u64;
    }
    writer.flush()?;
    Ok(total)
}

/// File extension of a URL's path (query and fragment ignored), with the dot
pub fn url_extension(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let path = path.split_once("://").map(|(_, rest)| rest).unwrap_or(path);
    // Host only, no path
    let (_, last_segment) = path.rsplit_once('/')?;
    let (stem, ext) = last_segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(format!(".{}", ext))
}
