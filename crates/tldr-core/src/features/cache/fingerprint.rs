//! Blake3 content hashing for the file cache.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::shared::models::error::{CoreError, Result};

/// Hashes a file's bytes in fixed-size chunks rather than reading it whole,
/// so cache verification doesn't spike memory on large files.
pub fn hash_file(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let mut file = File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 8192];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

pub fn hash_bytes(content: &[u8]) -> String {
    blake3::hash(content).to_hex().to_string()
}

pub fn read_and_hash(path: impl AsRef<Path>) -> Result<(String, String)> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| CoreError::new(crate::shared::models::error::ErrorKind::Io, e.to_string()).with_file(path.display().to_string()))?;
    let hash = hash_bytes(content.as_bytes());
    Ok((content, hash))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_bytes_is_stable() {
        assert_eq!(hash_bytes(b"fn main() {}"), hash_bytes(b"fn main() {}"));
        assert_ne!(hash_bytes(b"a"), hash_bytes(b"b"));
    }
}
