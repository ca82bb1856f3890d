//! The rejection ledger: read-side rules over a definition's append-only
//! rejection log.
//!
//! A rejection is *outstanding* while it is newer than the definition's last
//! submit change. An outstanding rejection blocks further rejections until
//! the author revises the definition. An empty log is never outstanding, and
//! a rejection stamped at exactly the same instant as the last change counts
//! as answered.

use chrono::{DateTime, Utc};

use crate::definition::Rejection;

/// The most recent `rejected_at` in the log, or `None` for an empty log.
///
/// Does not assume the log is sorted.
pub fn latest_rejection_at(log: &[Rejection]) -> Option<DateTime<Utc>> {
  log.iter().map(|r| r.rejected_at).max()
}

pub fn has_outstanding_rejection(
  log: &[Rejection],
  last_submit_change_at: DateTime<Utc>,
) -> bool {
  latest_rejection_at(log).is_some_and(|latest| latest > last_submit_change_at)
}

/// Whether `log` is ordered by `rejected_at` (ties allowed).
pub fn is_ordered(log: &[Rejection]) -> bool {
  log.windows(2).all(|w| w[0].rejected_at <= w[1].rejected_at)
}

#[cfg(test)]
mod tests {
  use chrono::Duration;
  use uuid::Uuid;

  use super::*;

  fn rejection(at: DateTime<Utc>) -> Rejection {
    Rejection {
      rejection_id: Uuid::new_v4(),
      rejected_by:  Uuid::new_v4(),
      rejected_at:  at,
      content:      "too short".into(),
    }
  }

  #[test]
  fn empty_log_is_never_outstanding() {
    let t0 = Utc::now();
    assert_eq!(latest_rejection_at(&[]), None);
    assert!(!has_outstanding_rejection(&[], t0));
  }

  #[test]
  fn rejection_after_change_is_outstanding() {
    let t0 = Utc::now();
    let log = [rejection(t0 + Duration::seconds(1))];
    assert!(has_outstanding_rejection(&log, t0));
  }

  #[test]
  fn edit_after_rejection_answers_it() {
    let t0 = Utc::now();
    let log = [rejection(t0 + Duration::seconds(1))];
    assert!(!has_outstanding_rejection(&log, t0 + Duration::seconds(2)));
  }

  #[test]
  fn equal_timestamps_count_as_answered() {
    let t = Utc::now();
    assert!(!has_outstanding_rejection(&[rejection(t)], t));
  }

  #[test]
  fn latest_is_max_regardless_of_order() {
    let t0 = Utc::now();
    let late = t0 + Duration::seconds(10);
    let log = [rejection(late), rejection(t0)];
    assert_eq!(latest_rejection_at(&log), Some(late));
    assert!(!is_ordered(&log));
    assert!(has_outstanding_rejection(&log, t0 + Duration::seconds(5)));
  }
}
