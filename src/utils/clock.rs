use std::convert::Infallible;
use std::env;
use std::fmt;

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Jakarta;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders envelope timestamps in a fixed zone.
#[derive(Debug, Clone, Copy)]
pub struct ResponseClock {
    zone: Tz,
}

impl ResponseClock {
    pub fn new(zone: Tz) -> Self {
        Self { zone }
    }

    pub fn from_env() -> Self {
        let zone = match env::var("RESPONSE_TIMEZONE") {
            Ok(name) => name.parse::<Tz>().unwrap_or_else(|e| {
                tracing::warn!("Invalid RESPONSE_TIMEZONE '{}': {}", name, e);
                DEFAULT_TIMEZONE
            }),
            Err(_) => DEFAULT_TIMEZONE,
        };

        Self::new(zone)
    }

    pub fn stamp(&self) -> RequestTime {
        self.stamp_at(Utc::now())
    }

    pub fn stamp_at(&self, at: DateTime<Utc>) -> RequestTime {
        RequestTime(at.with_timezone(&self.zone).format(TIMESTAMP_FORMAT).to_string())
    }
}

impl Default for ResponseClock {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEZONE)
    }
}

/// When the request arrived, already formatted for the response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTime(String);

impl RequestTime {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestTime
where
    ResponseClock: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(ResponseClock::from_ref(state).stamp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_zone_is_wib() {
        let at = Utc.with_ymd_and_hms(2024, 1, 31, 20, 15, 0).unwrap();

        let stamp = ResponseClock::default().stamp_at(at);

        assert_eq!(stamp.as_str(), "2024-02-01 03:15:00");
    }

    #[test]
    fn test_custom_zone() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

        let stamp = ResponseClock::new(chrono_tz::UTC).stamp_at(at);

        assert_eq!(stamp.to_string(), "2024-06-01 12:00:00");
    }
}
