use chrono::{DateTime, Utc};

use super::License;

impl License {
    /// Active, and either open-ended or expiring after `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.active && self.expires_at.map_or(true, |exp| exp > now)
    }
}
