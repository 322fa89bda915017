use time::{OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

use crate::Error;

/// The current UTC offset of the timezone named by `canonical_timezone`, or `None` if the name is unknown.
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// The current time in the timezone named by `canonical_timezone`, e.g. "Pacific/Auckland".
///
/// # Errors
///
/// Returns [Error::InvalidTimezoneError] if the timezone name is not a canonical timezone.
pub fn local_now(canonical_timezone: &str) -> Result<OffsetDateTime, Error> {
    match get_local_offset(canonical_timezone) {
        Some(offset) => Ok(OffsetDateTime::now_utc().to_offset(offset)),
        None => {
            tracing::error!("Invalid timezone {}", canonical_timezone);
            Err(Error::InvalidTimezoneError(canonical_timezone.to_owned()))
        }
    }
}
