//! Fixed values shared across crates.

/// Suffixes written by download managers and OS shells while a file is still
/// incomplete. Matched case-insensitively against the file name.
pub const TRANSIENT_SUFFIXES: &[&str] = &[".tmp", ".aria2", ".part", ".downloading", ".ds_store"];

/// Default stability sampling interval in seconds.
pub const DEFAULT_CHECK_DURATION_SECS: u64 = 10;

/// Default rclone tuning values, passed through untouched.
pub const DEFAULT_BUFFER_SIZE: &str = "64M";
pub const DEFAULT_TRANSFERS: &str = "4";
pub const DEFAULT_CHECKERS: &str = "8";

/// Destination used when neither the settings file nor the environment name one.
pub const DEFAULT_REMOTE_TARGET: &str = "remote:/";

/// Maximum number of rows the history listing returns by default.
pub const DEFAULT_HISTORY_LIMIT: i64 = 100;
