//! Input file fingerprints recorded in report summaries

use crate::error::Result;
use blake3::Hasher;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A hash value represented as a hex string
pub type HashValue = String;

/// blake3 digest of a file's bytes, streamed in 64 KiB chunks
pub fn fingerprint_file(path: &Path) -> Result<HashValue> {
    let mut file = File::open(path)?;
    let mut hasher = Hasher::new();
    let mut buffer = vec![0u8; 64 * 1024];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Short form used in terminal output
pub fn short(hash: &str) -> &str {
    &hash[..hash.len().min(12)]
}
