//! Источник текущего времени для значений по умолчанию и валидаторов.
//!
//! Каждая метка времени, которую хранилище пишет или с которой сравнивает,
//! читается из [`Clock`] в момент вызова.

use chrono::{Duration, Utc};
use sea_orm::prelude::DateTimeUtc;
use std::sync::Mutex;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTimeUtc;
}

/// Системные часы
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTimeUtc {
        Utc::now()
    }
}

/// Часы с ручным управлением для тестов и воспроизведения
#[derive(Debug)]
pub struct FixedClock {
    current: Mutex<DateTimeUtc>,
}

impl FixedClock {
    pub fn new(at: DateTimeUtc) -> Self {
        Self {
            current: Mutex::new(at),
        }
    }

    pub fn set(&self, at: DateTimeUtc) {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTimeUtc {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fixed_clock_moves_only_when_told() {
        let start = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let clock = FixedClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::seconds(90));
        assert_eq!(clock.now(), start + Duration::seconds(90));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn system_clock_is_monotone_enough() {
        let a = SystemClock.now();
        let b = SystemClock.now();
        assert!(b >= a);
    }
}
