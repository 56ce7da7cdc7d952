//! Relative-date labels: "Today, 5pm", "Tomorrow, 5:50pm", "Friday, 11am",
//! "Aug 30, 12pm", "Yesterday", "Aug. 19th".
//!
//! The timestamp is converted with [`convert`](mod@crate::convert), then bucketed
//! against a [`DayWindow`] built from the target zone's own midnights. Future
//! buckets carry a time-of-day suffix; past buckets do not, unless
//! [`PlainOptions::include_time_for_yesterday`] asks for it on "Yesterday".

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::ambient::Ambient;
use crate::convert::{convert_between, parse_timezone, project_instant};
use crate::error::PlainError;

/// Length of a day in the converted (wall-clock) frame.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Days ahead that are still named by weekday.
const WEEKDAY_HORIZON_DAYS: i64 = 7;

// ── Options ─────────────────────────────────────────────────────────────────

/// How dates before yesterday are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PastDateFormat {
    /// `"Aug 19"`, the same shape as far-future dates.
    MonthDay,
    /// `"Aug. 19th"`.
    #[default]
    MonthDotOrdinal,
}

/// Policy knobs for [`plain_with_options`] and [`plain_at`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlainOptions {
    /// Append the time of day to "Yesterday" (`"Yesterday, 11am"`).
    pub include_time_for_yesterday: bool,
    /// Layout for dates before yesterday.
    pub past_date_format: PastDateFormat,
}

// ── Buckets ─────────────────────────────────────────────────────────────────

/// Relative-day category of an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Bucket {
    Today,
    Tomorrow,
    Yesterday,
    /// Within a week from the start of today, named by weekday.
    WeekdayName,
    /// A week or more ahead.
    MonthDay,
    /// Before the start of yesterday.
    MonthDayPast,
}

impl Bucket {
    fn includes_time(self, options: &PlainOptions) -> bool {
        match self {
            Bucket::Today | Bucket::Tomorrow | Bucket::WeekdayName | Bucket::MonthDay => true,
            Bucket::Yesterday => options.include_time_for_yesterday,
            Bucket::MonthDayPast => false,
        }
    }
}

/// Start-of-day instants around "now", in the converted frame of the target zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayWindow {
    pub yesterday: i64,
    pub today: i64,
    pub tomorrow: i64,
}

impl DayWindow {
    /// Compute the window for `now` against `target`'s local midnights.
    ///
    /// Each boundary is projected at its own instant, so a DST change between
    /// yesterday and tomorrow is accounted for.
    ///
    /// # Errors
    ///
    /// Returns [`PlainError::InvalidTimestamp`] if `now` sits at the edge of
    /// the representable date range.
    pub fn compute(now: &DateTime<Utc>, target: &Tz) -> Result<Self, PlainError> {
        let today = now.with_timezone(target).date_naive();
        let out_of_range =
            || PlainError::InvalidTimestamp(format!("'{}': date out of range", now.to_rfc3339()));
        let yesterday = today.pred_opt().ok_or_else(out_of_range)?;
        let tomorrow = today.succ_opt().ok_or_else(out_of_range)?;

        Ok(Self {
            yesterday: start_of_day(yesterday, target).ok_or_else(out_of_range)?,
            today: start_of_day(today, target).ok_or_else(out_of_range)?,
            tomorrow: start_of_day(tomorrow, target).ok_or_else(out_of_range)?,
        })
    }
}

/// Classify a converted instant against a day window.
///
/// Windows are half-open: an instant exactly at a midnight belongs to the day
/// that midnight starts. Midnight yesterday is therefore "Yesterday", not a
/// past date as a strict `> yesterday` comparison would make it.
pub fn classify(instant: i64, window: &DayWindow) -> Bucket {
    if instant >= window.today {
        if instant < window.tomorrow {
            Bucket::Today
        } else if instant < window.tomorrow + SECONDS_PER_DAY {
            Bucket::Tomorrow
        } else if instant < window.today + WEEKDAY_HORIZON_DAYS * SECONDS_PER_DAY {
            Bucket::WeekdayName
        } else {
            Bucket::MonthDay
        }
    } else if instant >= window.yesterday {
        Bucket::Yesterday
    } else {
        Bucket::MonthDayPast
    }
}

// ── plain ───────────────────────────────────────────────────────────────────

/// A formatted relative date together with how it was derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlainDate {
    /// The display string (e.g., `"Tomorrow, 5:50pm"`).
    pub text: String,
    /// The bucket that selected the template.
    pub bucket: Bucket,
    /// The converted instant that was classified.
    pub instant: i64,
}

impl fmt::Display for PlainDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Render a wall-clock timestamp in the system timezone as a relative date in
/// `timezone`, using the default [`PlainOptions`].
///
/// # Errors
///
/// Returns [`PlainError::InvalidTimestamp`] or [`PlainError::InvalidTimezone`]
/// from the conversion step.
pub fn plain(timestamp: &str, timezone: &str) -> Result<String, PlainError> {
    plain_with_options(timestamp, timezone, &PlainOptions::default())
}

/// Like [`plain`], with explicit options.
///
/// # Errors
///
/// Same as [`plain`].
pub fn plain_with_options(
    timestamp: &str,
    timezone: &str,
    options: &PlainOptions,
) -> Result<String, PlainError> {
    let ambient = Ambient::system()?;
    plain_at(&ambient, timestamp, timezone, options).map(|date| date.text)
}

/// Render a timestamp against an explicit ambient snapshot.
///
/// # Arguments
///
/// * `ambient` — The "now" anchor and the zone `timestamp` is written in
/// * `timestamp` — A wall-clock timestamp (e.g., `"2024-08-21 17:50:00"`)
/// * `timezone` — An IANA timezone name the label is computed for
/// * `options` — Yesterday/past-date policy
///
/// # Errors
///
/// Returns [`PlainError::InvalidTimestamp`] if the timestamp cannot be parsed,
/// or [`PlainError::InvalidTimezone`] if `timezone` is not a valid IANA timezone.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use plain_date::{plain_at, Ambient, PlainOptions};
///
/// // 10:00 in New York on Tuesday 2024-08-20
/// let now = Utc.with_ymd_and_hms(2024, 8, 20, 14, 0, 0).unwrap();
/// let ambient = Ambient::new(now, chrono_tz::America::New_York);
/// let options = PlainOptions::default();
///
/// let date = plain_at(&ambient, "2024-08-21 17:50:00", "America/New_York", &options).unwrap();
/// assert_eq!(date.text, "Tomorrow, 5:50pm");
/// ```
pub fn plain_at(
    ambient: &Ambient,
    timestamp: &str,
    timezone: &str,
    options: &PlainOptions,
) -> Result<PlainDate, PlainError> {
    let target = parse_timezone(timezone)?;
    let instant = convert_between(timestamp, &ambient.reference, &target)?;
    let window = DayWindow::compute(&ambient.now, &target)?;
    let bucket = classify(instant, &window);

    let wall = DateTime::from_timestamp(instant, 0)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| PlainError::InvalidTimestamp(format!("'{}': out of range", timestamp)))?;

    let label = bucket_label(bucket, &wall, options);
    let text = if bucket.includes_time(options) {
        format!("{}, {}", label, format_time_of_day(&wall))
    } else {
        label
    };

    tracing::debug!(
        timestamp,
        timezone,
        reference = %ambient.reference,
        instant,
        ?bucket,
        text = %text,
        "formatted relative date"
    );

    Ok(PlainDate {
        text,
        bucket,
        instant,
    })
}

// ── Internal helpers ────────────────────────────────────────────────────────

/// First instant of `date` in `zone`, projected into the converted frame.
///
/// Zones that skip midnight start the day at the end of the gap.
fn start_of_day(date: NaiveDate, zone: &Tz) -> Option<i64> {
    let midnight = date.and_time(NaiveTime::MIN);
    let first = zone.from_local_datetime(&midnight).earliest().or_else(|| {
        (1..=16).find_map(|step| {
            let probe = midnight + chrono::Duration::minutes(15 * step);
            zone.from_local_datetime(&probe).earliest()
        })
    })?;
    Some(project_instant(&first.with_timezone(&Utc), zone))
}

/// The date part of the label for `bucket`.
fn bucket_label(bucket: Bucket, wall: &NaiveDateTime, options: &PlainOptions) -> String {
    match bucket {
        Bucket::Today => "Today".to_string(),
        Bucket::Tomorrow => "Tomorrow".to_string(),
        Bucket::Yesterday => "Yesterday".to_string(),
        Bucket::WeekdayName => wall.format("%A").to_string(),
        Bucket::MonthDay => wall.format("%b %-d").to_string(),
        Bucket::MonthDayPast => match options.past_date_format {
            PastDateFormat::MonthDay => wall.format("%b %-d").to_string(),
            PastDateFormat::MonthDotOrdinal => {
                let day = wall.day();
                format!("{}. {}{}", wall.format("%b"), day, ordinal_suffix(day))
            }
        },
    }
}

/// "5pm", "5:50pm", "12am". Minutes are dropped on the hour.
fn format_time_of_day(wall: &NaiveDateTime) -> String {
    let (is_pm, hour) = wall.hour12();
    let meridiem = if is_pm { "pm" } else { "am" };
    match wall.minute() {
        0 => format!("{hour}{meridiem}"),
        minute => format!("{hour}:{minute:02}{meridiem}"),
    }
}

/// English ordinal suffix for a day of the month.
fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
