//! Content checksums for files handed out by the bot.
//!
//! Published alongside each download so users can verify what they received.

use sha2::{Digest, Sha256};
use std::io::{self, Read};

const CHUNK_SIZE: usize = 64 * 1024;

/// SHA-256 of a byte slice, lowercase hex.
pub fn checksum_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// SHA-256 of everything readable from `reader`, lowercase hex.
///
/// The reader is consumed to EOF in fixed-size chunks.
///
/// # Errors
/// Propagates read errors other than `Interrupted`.
pub fn content_checksum<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
