//! Relative time captions for row headers
//!
//! Calendar-day buckets are computed in the caller's time zone, so an entry
//! copied at 23:50 reads "Yesterday 23:50" ten minutes after midnight.

use std::fmt::{self, Debug, Display};
use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};

/// Where "now" comes from when captions are rendered
#[derive(Clone)]
pub struct Clock(Arc<dyn Fn() -> DateTime<Local> + Send + Sync>);

impl Clock {
    /// The local wall clock
    pub fn system() -> Self {
        Self(Arc::new(Local::now))
    }

    pub fn from_fn<F>(now: F) -> Self
    where
        F: Fn() -> DateTime<Local> + Send + Sync + 'static,
    {
        Self(Arc::new(now))
    }

    pub fn now(&self) -> DateTime<Local> {
        (self.0)()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::system()
    }
}

impl Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Clock").field(&self.now()).finish()
    }
}

/// Caption for `created_at` relative to `now`, in `now`'s time zone
pub fn relative_time_label_with_now<Tz>(created_at: DateTime<Utc>, now: DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let created = created_at.with_timezone(&now.timezone());
    let days = (now.date_naive() - created.date_naive()).num_days();

    if days >= 7 {
        return created.format("%Y/%m/%d").to_string();
    }
    if days >= 2 {
        return created.format("%a %H:%M").to_string();
    }
    if days == 1 {
        return created.format("Yesterday %H:%M").to_string();
    }

    let secs = now.signed_duration_since(created).num_seconds();
    match secs {
        s if s < 60 => "Just now".to_string(),
        s if s < 120 => "1 minute ago".to_string(),
        s if s < 3600 => format!("{} minutes ago", s / 60),
        s if s < 7200 => "1 hour ago".to_string(),
        s => format!("{} hours ago", s / 3600),
    }
}
