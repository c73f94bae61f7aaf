//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Each service mutates the in-memory chart immediately and records a
//! pending write; the persistence task turns pending writes into SQL.
//! Route handlers stay focused on request parsing and status mapping.

pub mod connections;
pub mod lines;
pub mod people;
pub mod persistence;
pub mod sectors;

/// Stable machine-readable code for a service error.
pub trait ErrorCode {
    fn error_code(&self) -> &'static str;
}

/// Current time as Unix epoch milliseconds.
pub(crate) fn now_ms() -> i64 {
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_millis());
    i64::try_from(millis).unwrap_or(i64::MAX)
}

/// Trimmed, non-empty text.
pub(crate) fn clean_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// `#RRGGBB` hex color.
pub(crate) fn is_hex_color(raw: &str) -> bool {
    raw.len() == 7 && raw.starts_with('#') && raw[1..].chars().all(|c| c.is_ascii_hexdigit())
}
