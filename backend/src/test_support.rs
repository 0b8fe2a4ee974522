//! Shared fixtures for unit tests.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{EmailAddress, Principal, Role, UserId};

/// Fixed instant used by service tests.
pub fn fixture_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 15, 0)
        .single()
        .expect("valid fixture timestamp")
}

/// Clock that only moves when told to.
pub struct FixtureClock(Mutex<DateTime<Utc>>);

impl FixtureClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *self.0.lock().expect("clock mutex") += TimeDelta::seconds(seconds);
    }
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.0.lock().expect("clock mutex")
    }
}

/// Clock pinned to [`fixture_timestamp`].
pub fn fixture_clock() -> Arc<dyn Clock> {
    Arc::new(FixtureClock::new(fixture_timestamp()))
}

/// Principal whose id is derived from the email's local part.
pub fn principal(email: &str, role: Role) -> Principal {
    let email = EmailAddress::new(email).expect("fixture email");
    let local = email.as_ref().split('@').next().unwrap_or("user").to_owned();
    Principal::new(UserId::new(format!("uid-{local}")).expect("fixture id"), email, role)
}
