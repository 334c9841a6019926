//! Artifact checksums.

use crate::bundler::context::ChannelArtifact;
use crate::bundler::error::{ErrorExt, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Hex-encoded SHA-256 of a file, read in 8KB chunks.
pub async fn calculate_sha256(path: &Path) -> Result<String> {
    let mut file = tokio::fs::File::open(path)
        .await
        .fs_context("opening file for hashing", path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    loop {
        let n = file
            .read(&mut buffer)
            .await
            .fs_context("reading file for hash calculation", path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Describes a finished channel artifact: size and checksum.
pub async fn describe_artifact(channel_id: &str, path: &Path) -> Result<ChannelArtifact> {
    let size = tokio::fs::metadata(path)
        .await
        .fs_context("reading artifact metadata", path)?
        .len();
    Ok(ChannelArtifact {
        channel_id: channel_id.to_string(),
        path: path.to_path_buf(),
        size,
        sha256: calculate_sha256(path).await?,
    })
}
