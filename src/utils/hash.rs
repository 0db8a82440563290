use crate::storage::Digest;
use anyhow::{Context, Result, bail};
use sha2::{Digest as _, Sha256};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use tracing::debug;

/// Read buffer size for streaming hashes
const BUFFER_SIZE: usize = 64 * 1024;

/// SHA-256 of a byte slice as lowercase hex
pub fn hash_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Stream a file through SHA-256 and return lowercase hex.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn hash_file(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Digest of a file, or the tombstone if it cannot be read.
///
/// The sentinel can never collide with a real digest: SHA-256 hex is always
/// 64 characters long.
pub fn digest_of(path: &Path) -> Digest {
    match try_digest_of(path) {
        Ok(digest) => digest,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Unreadable file treated as deleted");
            Digest::Deleted
        }
    }
}

/// Like [`digest_of`], but only a missing file becomes the tombstone.
///
/// Symlinks are followed; a dangling link counts as missing. Anything that is
/// not a regular file is refused without being opened, since opening a FIFO
/// blocks until a writer appears.
///
/// # Errors
///
/// Returns an error if the path is not a regular file or cannot be read, so a
/// permission problem is never mistaken for a deletion.
pub fn try_digest_of(path: &Path) -> Result<Digest> {
    let metadata = match std::fs::metadata(path) {
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Digest::Deleted),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to stat {}", path.display()));
        }
        Ok(metadata) => metadata,
    };

    if !metadata.is_file() {
        bail!("{} is not a regular file", path.display());
    }

    hash_file(path).map(Digest::Content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_hash_bytes() {
        let hash1 = hash_bytes(b"Hello, World!");
        let hash2 = hash_bytes(b"Hello, World!");
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
        assert_ne!(hash1, hash_bytes(b"Different data"));
    }

    #[test]
    fn test_known_vector() {
        assert_eq!(
            hash_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hash_file_matches_bytes() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("test.txt");
        // Larger than one buffer so the streaming loop runs more than once
        let content = vec![b'x'; BUFFER_SIZE * 2 + 17];
        std::fs::write(&file_path, &content)?;

        assert_eq!(hash_file(&file_path)?, hash_bytes(&content));
        Ok(())
    }

    #[test]
    fn test_digest_of_missing_file_is_tombstone() -> Result<()> {
        let dir = tempdir()?;
        let missing = dir.path().join("gone.txt");

        assert_eq!(digest_of(&missing), Digest::Deleted);
        assert_eq!(try_digest_of(&missing)?, Digest::Deleted);
        Ok(())
    }

    #[test]
    fn test_digest_of_existing_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, "hello")?;

        let expected = Digest::Content(hash_bytes(b"hello"));
        assert_eq!(digest_of(&path), expected);
        assert_eq!(try_digest_of(&path)?, expected);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_try_digest_of_directory_is_error() -> Result<()> {
        let dir = tempdir()?;
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub)?;

        assert!(try_digest_of(&sub).is_err());
        assert_eq!(digest_of(&sub), Digest::Deleted);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_try_digest_of_socket_is_refused() -> Result<()> {
        let dir = tempdir()?;
        let socket = dir.path().join("x.txt");
        let _listener = std::os::unix::net::UnixListener::bind(&socket)?;

        let error = try_digest_of(&socket).expect_err("socket must not be hashed");
        assert!(error.to_string().contains("is not a regular file"));
        assert_eq!(digest_of(&socket), Digest::Deleted);
        Ok(())
    }
}
