//! Time source for server-assigned timestamps.
//!
//! The ordering rule between rejections and edits compares timestamps, so the
//! engine never calls `Utc::now()` directly; it asks a [`Clock`].

use std::sync::{
  Arc,
  atomic::{AtomicI64, Ordering},
};

use chrono::{DateTime, Duration, Utc};

pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> { Utc::now() }
}

/// A clock that starts at a fixed instant and advances by `step` on every
/// read, so consecutive operations get strictly increasing timestamps.
///
/// Clones share the same counter.
#[derive(Debug, Clone)]
pub struct StepClock {
  next_micros: Arc<AtomicI64>,
  step_micros: i64,
}

impl StepClock {
  pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
    Self {
      next_micros: Arc::new(AtomicI64::new(start.timestamp_micros())),
      step_micros: step.num_microseconds().unwrap_or(1),
    }
  }

  /// Move the clock by `by` without producing a reading.
  pub fn advance(&self, by: Duration) {
    self
      .next_micros
      .fetch_add(by.num_microseconds().unwrap_or(0), Ordering::SeqCst);
  }
}

impl Default for StepClock {
  fn default() -> Self {
    Self::new(DateTime::<Utc>::UNIX_EPOCH + Duration::days(365 * 50), Duration::seconds(1))
  }
}

impl Clock for StepClock {
  fn now(&self) -> DateTime<Utc> {
    let micros = self.next_micros.fetch_add(self.step_micros, Ordering::SeqCst);
    DateTime::from_timestamp_micros(micros).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
  }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
  fn now(&self) -> DateTime<Utc> { (**self).now() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn step_clock_is_strictly_increasing() {
    let clock = StepClock::default();
    let a = clock.now();
    let b = clock.now();
    assert_eq!(b - a, Duration::seconds(1));
  }

  #[test]
  fn clones_share_time() {
    let clock = StepClock::default();
    let other = clock.clone();
    let a = clock.now();
    other.advance(Duration::minutes(1));
    let b = clock.now();
    assert_eq!(b - a, Duration::seconds(61));
  }
}
