//! Parsing of video references and catalog durations.
//!
//! Curators paste either a bare video id or a watch/share URL. Durations
//! come back from the catalog as ISO 8601 strings such as `PT4M13S`.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Length of a catalog video id.
pub const VIDEO_ID_LEN: usize = 11;

static VIDEO_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("valid regex"));

static WATCH_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https?://(?:[A-Za-z0-9-]+\.)*youtube\.com/[^?#]*\?(?:[^#]*&)?v=([A-Za-z0-9_-]{11})(?:[&#]|$)",
    )
    .expect("valid regex")
});

static SHORT_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://youtu\.be/([A-Za-z0-9_-]{11})(?:[/?#]|$)").expect("valid regex")
});

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$").expect("valid regex")
});

/// Extract the video id from a bare id, a `youtube.com/watch?v=` URL or a
/// `youtu.be/` share URL.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if VIDEO_ID_RE.is_match(input) {
        return Some(input.to_string());
    }
    WATCH_URL_RE
        .captures(input)
        .or_else(|| SHORT_URL_RE.captures(input))
        .map(|caps| caps[1].to_string())
}

/// Like [`extract_video_id`], but a missing id is a validation error.
pub fn require_video_id(input: &str) -> Result<String, CoreError> {
    extract_video_id(input).ok_or_else(|| {
        CoreError::Validation(format!("Invalid YouTube video ID or URL: '{input}'"))
    })
}

/// Convert an ISO 8601 duration (`PT1H2M3S`, optionally with a day part)
/// to whole seconds. Unparseable or out-of-range input yields 0.
pub fn parse_iso8601_duration(duration: &str) -> i64 {
    let Some(caps) = DURATION_RE.captures(duration.trim()) else {
        return 0;
    };
    [(1, 86_400), (2, 3_600), (3, 60), (4, 1)]
        .into_iter()
        .try_fold(0i64, |total, (group, unit)| {
            let count = match caps.get(group) {
                Some(m) => m.as_str().parse::<i64>().ok()?,
                None => 0,
            };
            count.checked_mul(unit)?.checked_add(total)
        })
        .unwrap_or(0)
}

/// Whole seconds of a catalog duration string, as stored on a schedule item.
///
/// Fails when the string is unparseable, zero, or too long for the column.
pub fn catalog_duration_seconds(duration: &str) -> Result<i32, CoreError> {
    let seconds = i32::try_from(parse_iso8601_duration(duration)).map_err(|_| {
        CoreError::Validation(format!("duration '{duration}' is out of range"))
    })?;
    validate_duration_seconds(seconds).map_err(|_| {
        CoreError::Validation(format!("Invalid ISO 8601 duration: '{duration}'"))
    })?;
    Ok(seconds)
}

/// Schedule items must last at least one second.
pub fn validate_duration_seconds(duration_seconds: i32) -> Result<(), CoreError> {
    if duration_seconds > 0 {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "duration_seconds must be positive, got {duration_seconds}"
        )))
    }
}
