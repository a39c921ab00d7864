//! Snapshot files: one persisted series behind a versioned, checksummed header.
//!
//! Layout (little endian):
//! `[magic: 8][kind: u8][tag_len: u16][tag: tag_len][payload_len: u64][blake3: 32][payload]`
//!
//! The version tag sits in the clear ahead of the payload so an incompatible snapshot is
//! rejected before any decoding is attempted.

use std::io::Write;
use std::path::Path;

use atomic_write_file::AtomicWriteFile;
use bincode::config::{self, Config};
use bincode::serde::{decode_from_slice, encode_to_vec};

use crate::constants::{MAX_SNAPSHOT_PAYLOAD_BYTES, SNAPSHOT_MAGIC, SNAPSHOT_PREAMBLE_SIZE};
use crate::error::{Result, SimlogError};
use crate::merge::Series;
use crate::types::{SeriesKind, SnapshotConfig};

fn snapshot_config() -> impl Config {
    config::standard()
        .with_fixed_int_encoding()
        .with_little_endian()
}

/// Header fields of a snapshot, readable without decoding the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub kind: SeriesKind,
    pub version_tag: String,
    pub payload_len: u64,
    pub checksum: [u8; 32],
}

impl SnapshotHeader {
    fn parse(bytes: &[u8]) -> Result<(Self, &[u8])> {
        if bytes.len() < SNAPSHOT_PREAMBLE_SIZE {
            return Err(invalid("file is shorter than the snapshot preamble"));
        }
        let (magic, rest) = bytes.split_at(SNAPSHOT_MAGIC.len());
        if magic != SNAPSHOT_MAGIC {
            return Err(invalid("bad magic bytes (not a simlog snapshot)"));
        }
        let (kind, rest) = rest.split_at(1);
        let kind = SeriesKind::from_byte(kind[0])
            .ok_or_else(|| invalid(format!("unknown series kind byte {}", kind[0])))?;
        let (tag_len, rest) = rest.split_at(2);
        let tag_len = usize::from(u16::from_le_bytes([tag_len[0], tag_len[1]]));

        let (tag, rest) = take(rest, tag_len, "version tag")?;
        let version_tag = std::str::from_utf8(tag)
            .map_err(|_| invalid("version tag is not valid UTF-8"))?
            .to_string();

        let (payload_len, rest) = take(rest, 8, "payload length")?;
        let mut len_bytes = [0u8; 8];
        len_bytes.copy_from_slice(payload_len);
        let payload_len = u64::from_le_bytes(len_bytes);

        let (checksum_bytes, rest) = take(rest, 32, "checksum")?;
        let mut checksum = [0u8; 32];
        checksum.copy_from_slice(checksum_bytes);

        Ok((
            Self {
                kind,
                version_tag,
                payload_len,
                checksum,
            },
            rest,
        ))
    }
}

fn take<'a>(bytes: &'a [u8], len: usize, what: &str) -> Result<(&'a [u8], &'a [u8])> {
    if bytes.len() < len {
        return Err(invalid(format!("truncated {what}")));
    }
    Ok(bytes.split_at(len))
}

fn invalid(reason: impl Into<String>) -> SimlogError {
    SimlogError::InvalidSnapshot {
        reason: reason.into(),
    }
}

/// Encodes and decodes series snapshots for one engine version tag.
#[derive(Debug, Clone, Default)]
pub struct SnapshotCodec {
    config: SnapshotConfig,
}

impl SnapshotCodec {
    #[must_use]
    pub fn new(config: SnapshotConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    /// Serialize `series` under the version tag recorded in its manifest.
    pub fn encode<S: Series>(&self, series: &S) -> Result<Vec<u8>> {
        let tag = series.manifest().version.as_bytes();
        let tag_len = u16::try_from(tag.len())
            .map_err(|_| invalid("version tag longer than 65535 bytes"))?;
        let payload = encode_to_vec(series, snapshot_config())?;
        let digest = blake3::hash(&payload);

        let mut out = Vec::with_capacity(SNAPSHOT_PREAMBLE_SIZE + tag.len() + 40 + payload.len());
        out.extend_from_slice(&SNAPSHOT_MAGIC);
        out.push(S::KIND.to_byte());
        out.extend_from_slice(&tag_len.to_le_bytes());
        out.extend_from_slice(tag);
        out.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        out.extend_from_slice(digest.as_bytes());
        out.extend_from_slice(&payload);
        Ok(out)
    }

    /// Validate the header against this engine, then verify and decode the payload.
    pub fn decode<S: Series>(&self, bytes: &[u8]) -> Result<S> {
        let (header, payload) = SnapshotHeader::parse(bytes)?;
        if header.kind != S::KIND {
            return Err(SimlogError::SnapshotKindMismatch {
                expected: S::KIND,
                found: header.kind,
            });
        }
        if header.version_tag != self.config.version_tag {
            tracing::error!(
                target = "simlog::snapshot",
                found = %header.version_tag,
                expected = %self.config.version_tag,
                "snapshot version mismatch"
            );
            return Err(SimlogError::VersionMismatch {
                found: Some(header.version_tag).filter(|tag| !tag.is_empty()),
                expected: self.config.version_tag.clone(),
            });
        }
        if header.payload_len > MAX_SNAPSHOT_PAYLOAD_BYTES {
            return Err(invalid("payload exceeds safety limit"));
        }
        if header.payload_len != payload.len() as u64 {
            return Err(invalid(format!(
                "payload length {} does not match {} bytes on disk",
                header.payload_len,
                payload.len()
            )));
        }

        let actual = blake3::hash(payload);
        if actual.as_bytes() != &header.checksum {
            return Err(SimlogError::SnapshotChecksum {
                expected: blake3::Hash::from(header.checksum).to_hex().to_string(),
                actual: actual.to_hex().to_string(),
            });
        }

        let (series, _) = decode_from_slice::<S, _>(payload, snapshot_config())?;
        if series.manifest().version != header.version_tag {
            return Err(invalid("manifest version disagrees with header tag"));
        }
        Ok(series)
    }

    /// Write the snapshot atomically; readers never observe a half-written file.
    pub fn store<S: Series>(&self, series: &S, path: &Path) -> Result<()> {
        let bytes = self.encode(series)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs_err::create_dir_all(parent)?;
        }
        let mut file = AtomicWriteFile::open(path)?;
        file.write_all(&bytes)?;
        file.commit()?;
        tracing::info!(
            target = "simlog::snapshot",
            path = %path.display(),
            kind = %S::KIND,
            bytes = bytes.len(),
            "snapshot stored"
        );
        Ok(())
    }

    pub fn load<S: Series>(&self, path: &Path) -> Result<S> {
        let bytes = fs_err::read(path)?;
        let series = self.decode(&bytes)?;
        tracing::info!(
            target = "simlog::snapshot",
            path = %path.display(),
            kind = %S::KIND,
            "snapshot loaded"
        );
        Ok(series)
    }
}

/// Read only the header of a snapshot file.
pub fn read_header(path: &Path) -> Result<SnapshotHeader> {
    let bytes = fs_err::read(path)?;
    SnapshotHeader::parse(&bytes).map(|(header, _)| header)
}
