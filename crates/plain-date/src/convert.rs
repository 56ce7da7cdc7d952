//! Timezone-aware conversion of wall-clock timestamps.
//!
//! A wall-clock timestamp ("2024-08-24 14:30:00") carries no zone of its own;
//! it is read in the *reference* zone (the host's system timezone, captured in
//! an [`Ambient`](crate::Ambient) snapshot) and then re-expressed for a
//! *target* zone. The result is an instant in seconds whose UTC rendering is
//! the target zone's wall-clock time at that moment. Day arithmetic on such a
//! value is free of DST jumps, which is what the relative-date buckets in
//! [`format`](crate::format) rely on.
//!
//! Offsets are always evaluated at the instant being converted. A single
//! offset is never reused across instants.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::ambient::Ambient;
use crate::error::PlainError;

/// Wall-clock layouts accepted in addition to RFC 3339, `@<epoch>` and bare dates.
const WALL_CLOCK_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

// ── convert ─────────────────────────────────────────────────────────────────

/// Convert a wall-clock timestamp written in the system timezone into an
/// instant adjusted for `timezone`.
///
/// Reads the system clock and timezone fresh on every call. Use
/// [`convert_at`] to supply the reference zone explicitly.
///
/// # Errors
///
/// Returns [`PlainError::InvalidTimestamp`] if the timestamp cannot be parsed,
/// or [`PlainError::InvalidTimezone`] if `timezone` (or the system zone) is not
/// a valid IANA timezone.
pub fn convert(timestamp: &str, timezone: &str) -> Result<i64, PlainError> {
    let ambient = Ambient::system()?;
    convert_at(timestamp, timezone, &ambient.reference)
}

/// Convert a wall-clock timestamp written in `reference` into an instant
/// adjusted for `timezone`.
///
/// The instant is the naive timestamp (read as if it were UTC) plus
/// `target_offset - reference_offset`, with both offsets taken at the moment
/// the timestamp denotes.
///
/// # Arguments
///
/// * `timestamp` — A wall-clock timestamp (e.g., `"2024-08-24 14:30:00"`)
/// * `timezone` — An IANA timezone name (e.g., `"America/New_York"`)
/// * `reference` — The zone `timestamp` is written in
///
/// # Errors
///
/// Returns [`PlainError::InvalidTimestamp`] if the timestamp cannot be parsed,
/// or [`PlainError::InvalidTimezone`] if `timezone` is not a valid IANA timezone.
///
/// # Examples
///
/// ```
/// use plain_date::convert_at;
///
/// // 14:30 UTC is 10:30 in New York (EDT, UTC-4).
/// let instant = convert_at("2024-08-24 14:30:00", "America/New_York", &chrono_tz::UTC).unwrap();
/// let wall = chrono::DateTime::from_timestamp(instant, 0).unwrap().naive_utc();
/// assert_eq!(wall.to_string(), "2024-08-24 10:30:00");
/// ```
pub fn convert_at(timestamp: &str, timezone: &str, reference: &Tz) -> Result<i64, PlainError> {
    let target = parse_timezone(timezone)?;
    convert_between(timestamp, reference, &target)
}

/// Shared path for [`convert_at`] and the formatter, with both zones resolved.
pub(crate) fn convert_between(
    timestamp: &str,
    reference: &Tz,
    target: &Tz,
) -> Result<i64, PlainError> {
    let wall = parse_wall_clock(timestamp, reference)?;
    let resolved = resolve_moment(&wall, reference).ok_or_else(|| {
        PlainError::InvalidTimestamp(format!("'{}': out of range", timestamp.trim()))
    })?;

    match resolved {
        Moment::Exact(moment) => {
            let offset_delta = offset_at(target, &moment) - offset_at(reference, &moment);
            Ok(wall.and_utc().timestamp() + i64::from(offset_delta))
        }
        // Same zone: the wall-clock reading is already the answer.
        Moment::Skipped(_) if reference == target => Ok(wall.and_utc().timestamp()),
        Moment::Skipped(transition) => Ok(project(&transition, target)),
    }
}

// ── Parsing ─────────────────────────────────────────────────────────────────

/// Parse an IANA timezone string into `Tz`.
pub fn parse_timezone(s: &str) -> Result<Tz, PlainError> {
    s.trim()
        .parse::<Tz>()
        .map_err(|_| PlainError::InvalidTimezone(format!("'{}'", s)))
}

/// Parse a timestamp into wall-clock time in the `reference` zone.
///
/// Accepts `YYYY-MM-DD HH:MM[:SS[.fff]]` (space or `T` separated),
/// `YYYY-MM-DD` (midnight), RFC 3339 strings with an explicit offset and
/// `@<unix seconds>`. The last two name an exact instant, which is
/// re-expressed as `reference` wall-clock time.
pub fn parse_wall_clock(timestamp: &str, reference: &Tz) -> Result<NaiveDateTime, PlainError> {
    let s = timestamp.trim();
    if s.is_empty() {
        return Err(PlainError::InvalidTimestamp("empty timestamp".to_string()));
    }

    if let Some(epoch) = s.strip_prefix('@') {
        let seconds: i64 = epoch
            .parse()
            .map_err(|e| PlainError::InvalidTimestamp(format!("'{}': {}", s, e)))?;
        let dt = DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
            PlainError::InvalidTimestamp(format!("'{}': epoch out of range", s))
        })?;
        return Ok(dt.with_timezone(reference).naive_local());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(reference).naive_local());
    }

    if let Some(wall) = WALL_CLOCK_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Ok(wall);
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|e| PlainError::InvalidTimestamp(format!("'{}': {}", s, e)))
}

// ── Offset arithmetic ───────────────────────────────────────────────────────

/// Where a wall-clock time lands on the UTC timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Moment {
    /// The wall-clock time exists (for ambiguous times, its first occurrence).
    Exact(NaiveDateTime),
    /// The wall-clock time falls in a DST gap; holds the transition instant,
    /// the first valid instant after the gap.
    Skipped(NaiveDateTime),
}

/// The UTC moment (as a naive UTC datetime) that `wall` denotes in `zone`.
///
/// Ambiguous wall-clock times (DST fall-back) take the earlier offset. Times
/// inside a DST gap map to the transition instant that ends the gap.
fn resolve_moment(wall: &NaiveDateTime, zone: &Tz) -> Option<Moment> {
    let offset = match zone.offset_from_local_datetime(wall) {
        LocalResult::Single(offset) => offset.fix(),
        LocalResult::Ambiguous(earlier, _) => earlier.fix(),
        LocalResult::None => return gap_transition(wall, zone).map(Moment::Skipped),
    };
    wall.checked_sub_signed(chrono::Duration::seconds(i64::from(offset.local_minus_utc())))
        .map(Moment::Exact)
}

/// The UTC instant at which the DST gap containing `wall` begins.
///
/// Read with the pre-gap offset, `wall` lies after the transition; read with
/// the post-gap offset, before it. The transition is bisected in between.
fn gap_transition(wall: &NaiveDateTime, zone: &Tz) -> Option<NaiveDateTime> {
    let before_gap = offset_at(zone, &wall.checked_sub_signed(chrono::Duration::days(1))?);
    let mut after = wall.checked_sub_signed(chrono::Duration::seconds(i64::from(before_gap)))?;
    let after_gap = offset_at(zone, &after);
    let mut before = wall.checked_sub_signed(chrono::Duration::seconds(i64::from(after_gap)))?;

    while (after - before).num_seconds() > 1 {
        let half = (after - before).num_seconds() / 2;
        let mid = before + chrono::Duration::seconds(half);
        if offset_at(zone, &mid) == after_gap {
            after = mid;
        } else {
            before = mid;
        }
    }
    Some(after)
}

/// UTC offset of `zone` in seconds at the UTC moment `moment`.
fn offset_at(zone: &Tz, moment: &NaiveDateTime) -> i32 {
    zone.offset_from_utc_datetime(moment).fix().local_minus_utc()
}

/// Seconds since the epoch of `instant` shifted by `target`'s offset at that
/// instant. This is what [`convert_between`] yields for `target`'s own
/// wall-clock rendering of `instant`.
pub(crate) fn project_instant(instant: &DateTime<Utc>, target: &Tz) -> i64 {
    project(&instant.naive_utc(), target)
}

/// Seconds since the epoch of the UTC `moment` shifted by `target`'s offset.
fn project(moment: &NaiveDateTime, target: &Tz) -> i64 {
    moment.and_utc().timestamp() + i64::from(offset_at(target, moment))
}

// ── Tests ───────────────────────────────────────────────────────────────────
