//! # plain-date
//!
//! Timezone-aware conversion and compact relative-date labels for UI
//! surfaces such as notification feeds, activity logs and chat timestamps.
//!
//! ```text
//! Today, 5pm      Tomorrow, 5:50pm      Friday, 11am
//! Aug 30, 12pm    Yesterday             Aug. 19th
//! ```
//!
//! ## Modules
//!
//! - [`convert`](mod@convert) — wall-clock timestamp + target timezone → converted instant
//! - [`format`] — converted instant → relative-date label
//! - [`ambient`] — snapshot of the system clock and system timezone
//! - [`error`] — Error types
//!
//! Every entry point has an explicit form (`*_at`) that takes the ambient
//! snapshot or reference zone as an argument. The short forms ([`convert()`],
//! [`plain()`]) read the system clock and timezone on each call.

pub mod ambient;
pub mod convert;
pub mod error;
pub mod format;

pub use ambient::Ambient;
pub use convert::{convert, convert_at, parse_timezone, parse_wall_clock};
pub use error::{PlainError, Result};
pub use format::{
    classify, plain, plain_at, plain_with_options, Bucket, DayWindow, PastDateFormat, PlainDate,
    PlainOptions, SECONDS_PER_DAY,
};
