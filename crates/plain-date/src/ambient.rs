//! Read-only snapshot of the host environment: the current instant and the
//! system ("reference") timezone.
//!
//! Every public entry point that needs "now" or the system timezone takes an
//! [`Ambient`] value. The convenience wrappers build one with
//! [`Ambient::system`] on each call, so a long-running process picks up DST
//! changes, day rollovers and timezone reconfiguration without restarting.
//! Nothing here is global or mutable.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::convert::parse_timezone;
use crate::error::PlainError;

/// Zone assumed when the operating system cannot report its own.
const FALLBACK_ZONE: &str = "UTC";

/// An immutable snapshot of the clock and the reference timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ambient {
    /// The instant treated as "now".
    pub now: DateTime<Utc>,
    /// The timezone wall-clock timestamps are assumed to be written in.
    pub reference: Tz,
}

impl Ambient {
    /// Build a snapshot from explicit values.
    pub fn new(now: DateTime<Utc>, reference: Tz) -> Self {
        Self { now, reference }
    }

    /// Build a snapshot from an explicit instant and an IANA zone name.
    ///
    /// # Errors
    ///
    /// Returns [`PlainError::InvalidTimezone`] if `reference` is not a known
    /// IANA timezone.
    pub fn with_reference_name(now: DateTime<Utc>, reference: &str) -> Result<Self, PlainError> {
        Ok(Self::new(now, parse_timezone(reference)?))
    }

    /// Read the system clock and the operating system's timezone.
    ///
    /// If the OS lookup itself fails, the reference zone is UTC and a
    /// `warn` event is emitted.
    ///
    /// # Errors
    ///
    /// Returns [`PlainError::InvalidTimezone`] if the OS reports a zone name
    /// that is not in the IANA database shipped with this crate.
    pub fn system() -> Result<Self, PlainError> {
        let name = zone_name_or_fallback(iana_time_zone::get_timezone());
        let reference = parse_timezone(&name)?;
        tracing::trace!(reference = %reference, "captured ambient snapshot");
        Ok(Self::new(Utc::now(), reference))
    }
}

/// The OS zone name, or [`FALLBACK_ZONE`] when the lookup failed.
fn zone_name_or_fallback(lookup: Result<String, iana_time_zone::GetTimezoneError>) -> String {
    lookup.unwrap_or_else(|err| {
        tracing::warn!(error = %err, "system timezone lookup failed, using {FALLBACK_ZONE}");
        FALLBACK_ZONE.to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_with_reference_name_resolves_zone() {
        let now = Utc.with_ymd_and_hms(2024, 8, 20, 14, 0, 0).unwrap();
        let ambient = Ambient::with_reference_name(now, "America/New_York").unwrap();
        assert_eq!(ambient.reference, chrono_tz::America::New_York);
        assert_eq!(ambient.now, now);
    }

    #[test]
    fn test_with_reference_name_rejects_unknown_zone() {
        let now = Utc.with_ymd_and_hms(2024, 8, 20, 14, 0, 0).unwrap();
        let err = Ambient::with_reference_name(now, "Mars/Olympus_Mons").unwrap_err();
        assert!(matches!(err, PlainError::InvalidTimezone(_)), "got: {err}");
    }

    #[test]
    fn test_failed_os_lookup_falls_back_to_utc() {
        let name = zone_name_or_fallback(Err(iana_time_zone::GetTimezoneError::OsError));
        assert_eq!(name, FALLBACK_ZONE);
        assert_eq!(parse_timezone(&name).unwrap(), chrono_tz::UTC);
    }

    #[test]
    fn test_successful_os_lookup_is_kept() {
        let name = zone_name_or_fallback(Ok("Europe/Berlin".to_string()));
        assert_eq!(name, "Europe/Berlin");
    }

    #[test]
    fn test_system_snapshot_reads_clock() {
        // The OS zone varies between machines; only an unknown name may fail.
        if let Ok(ambient) = Ambient::system() {
            let drift = (Utc::now() - ambient.now).num_seconds().abs();
            assert!(drift < 60, "drift was {drift}s");
        }
    }
}
