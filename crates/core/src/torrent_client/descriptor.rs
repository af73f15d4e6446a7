//! Descriptor (.torrent) helpers.
//!
//! Uses librqbit-core to read the declared content name from bencoded
//! metadata without starting a transfer.

use std::path::Path;

use librqbit_core::torrent_metainfo::{torrent_from_bytes, TorrentMetaV1Owned};

use super::TorrentClientError;

/// File extension of persisted descriptors.
pub const DESCRIPTOR_EXTENSION: &str = "torrent";

/// Whether `path` names a descriptor file.
pub fn is_descriptor_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(DESCRIPTOR_EXTENSION))
}

/// Read the content name declared by a descriptor.
pub fn parse_descriptor_name(bytes: &[u8]) -> Result<String, TorrentClientError> {
    let torrent: TorrentMetaV1Owned =
        torrent_from_bytes(bytes).map_err(|e| TorrentClientError::InvalidTorrent(e.to_string()))?;

    let name = torrent
        .info
        .name
        .as_ref()
        .map(|b| bytes_to_string(b.as_ref()))
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| TorrentClientError::InvalidTorrent("descriptor declares no name".to_string()))?;

    Ok(name)
}

/// UTF-8 with a lossy fallback.
fn bytes_to_string(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_parse_name() {
        let bytes = fixtures::descriptor_bytes("Inception (2010) [1080p]");
        assert_eq!(parse_descriptor_name(&bytes).unwrap(), "Inception (2010) [1080p]");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            parse_descriptor_name(b"not a valid torrent"),
            Err(TorrentClientError::InvalidTorrent(_))
        ));
        assert!(parse_descriptor_name(b"").is_err());
    }

    #[test]
    fn test_is_descriptor_path() {
        assert!(is_descriptor_path(Path::new("/tmp/a.torrent")));
        assert!(is_descriptor_path(Path::new("B.TORRENT")));
        assert!(!is_descriptor_path(Path::new("a.torrent.part")));
        assert!(!is_descriptor_path(Path::new("torrent")));
    }

    #[test]
    fn test_bytes_to_string_invalid_utf8() {
        let invalid = vec![0xff, 0xfe, 0x68, 0x65, 0x6c, 0x6c, 0x6f];
        assert!(bytes_to_string(&invalid).contains("hello"));
    }
}
