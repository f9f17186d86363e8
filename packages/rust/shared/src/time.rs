//! Wall-clock formatting in the sheet's local zone.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Zone used for every timestamp written to the sheet or the report channel.
pub const BANGKOK: Tz = chrono_tz::Asia::Bangkok;

/// Format `now` as `YYYY-MM-DD HH:MM:SS` in Asia/Bangkok.
pub fn bangkok_timestamp(now: DateTime<Utc>) -> String {
    now.with_timezone(&BANGKOK)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
