//! Shared constants for snapshots, logging targets and environment switches.

/// Magic bytes at the start of every snapshot file.
pub const SNAPSHOT_MAGIC: [u8; 8] = *b"SIMLOGS1";

/// Fixed-size prefix: magic + kind byte + tag length (u16).
pub const SNAPSHOT_PREAMBLE_SIZE: usize = 8 + 1 + 2;

/// Upper bound on an encoded snapshot payload.
pub const MAX_SNAPSHOT_PAYLOAD_BYTES: u64 = 4 * 1024 * 1024 * 1024;

/// Environment switch that forces sequential extraction when set to a false-like value.
pub const USE_THREADS_ENV: &str = "SIMLOG_USE_THREADS";

/// Progress label used when the caller does not supply one.
pub const DEFAULT_PROGRESS_LABEL: &str = "of input files read";

/// Format string for the optional run-manifest date suffix.
pub const APPEND_DATE_FORMAT: &str = "%Y%m%d%H%M%S";
