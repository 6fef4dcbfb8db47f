//! Recency grouping for history display

use super::types::{ChatSession, SessionSummary};
use chrono::{DateTime, TimeZone, Utc};

/// Anything that carries the timestamp used for recency grouping
pub trait Dated {
    /// When the item was last updated
    fn updated_at(&self) -> DateTime<Utc>;
}

impl Dated for SessionSummary {
    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Dated for ChatSession {
    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Sessions partitioned into display buckets
///
/// Each bucket keeps the order of the input, so a most-recent-first history
/// stays most-recent-first inside every bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecencyGroups<T> {
    /// Updated on the same calendar day as `now`
    pub today: Vec<T>,
    /// Updated on the calendar day before `now`
    pub yesterday: Vec<T>,
    /// Everything else
    pub older: Vec<T>,
}

impl<T> Default for RecencyGroups<T> {
    fn default() -> Self {
        Self {
            today: Vec::new(),
            yesterday: Vec::new(),
            older: Vec::new(),
        }
    }
}

impl<T> RecencyGroups<T> {
    /// Non-empty buckets with their display labels, in Today, Yesterday,
    /// Older order
    pub fn labeled(&self) -> Vec<(&'static str, &[T])> {
        [
            ("Today", self.today.as_slice()),
            ("Yesterday", self.yesterday.as_slice()),
            ("Older", self.older.as_slice()),
        ]
        .into_iter()
        .filter(|(_, items)| !items.is_empty())
        .collect()
    }

    /// Total number of grouped items
    pub fn len(&self) -> usize {
        self.today.len() + self.yesterday.len() + self.older.len()
    }

    /// Whether every bucket is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partition sessions by the calendar day of their last update
///
/// Days are compared in `now`'s timezone: pass `Local::now()` for a display
/// that follows the user's clock, or a UTC instant for deterministic tests.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use ragdesk::session::{group_by_recency, ChatSession};
///
/// let now = Utc::now();
/// let mut recent = ChatSession::new();
/// recent.updated_at = now;
/// let mut old = ChatSession::new();
/// old.updated_at = now - Duration::days(10);
///
/// let groups = group_by_recency(vec![recent, old], &now);
/// assert_eq!(groups.today.len(), 1);
/// assert_eq!(groups.older.len(), 1);
/// ```
pub fn group_by_recency<T, I, Tz>(sessions: I, now: &DateTime<Tz>) -> RecencyGroups<T>
where
    T: Dated,
    I: IntoIterator<Item = T>,
    Tz: TimeZone,
{
    let tz = now.timezone();
    let today = now.date_naive();
    let yesterday = today.pred_opt();

    let mut groups = RecencyGroups::default();
    for session in sessions {
        let day = session.updated_at().with_timezone(&tz).date_naive();
        if day == today {
            groups.today.push(session);
        } else if Some(day) == yesterday {
            groups.yesterday.push(session);
        } else {
            groups.older.push(session);
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::types::SessionId;
    use chrono::{Duration, FixedOffset};

    fn summary(id: &str, updated_at: DateTime<Utc>) -> SessionSummary {
        SessionSummary {
            id: SessionId::from(id),
            title: id.to_string(),
            message_count: 1,
            created_at: updated_at,
            updated_at,
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_now_lands_in_today() {
        let now = noon();
        let groups = group_by_recency(vec![summary("a", now)], &now);
        assert_eq!(groups.today.len(), 1);
        assert!(groups.yesterday.is_empty());
        assert!(groups.older.is_empty());
    }

    #[test]
    fn test_exactly_one_day_earlier_lands_in_yesterday() {
        let now = noon();
        let groups = group_by_recency(vec![summary("a", now - Duration::hours(24))], &now);
        assert_eq!(groups.yesterday.len(), 1);
    }

    #[test]
    fn test_ten_days_earlier_lands_in_older() {
        let now = noon();
        let groups = group_by_recency(vec![summary("a", now - Duration::days(10))], &now);
        assert_eq!(groups.older.len(), 1);
    }

    #[test]
    fn test_calendar_day_not_elapsed_time() {
        // 00:30 today and 23:30 yesterday are one hour apart but in different buckets.
        let now = Utc.with_ymd_and_hms(2026, 3, 15, 0, 45, 0).unwrap();
        let groups = group_by_recency(
            vec![
                summary("today", Utc.with_ymd_and_hms(2026, 3, 15, 0, 30, 0).unwrap()),
                summary("yesterday", Utc.with_ymd_and_hms(2026, 3, 14, 23, 30, 0).unwrap()),
            ],
            &now,
        );
        assert_eq!(groups.today[0].title, "today");
        assert_eq!(groups.yesterday[0].title, "yesterday");
    }

    #[test]
    fn test_days_are_compared_in_now_timezone() {
        // 23:00 UTC on the 14th is already the 15th at UTC+2.
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = Utc
            .with_ymd_and_hms(2026, 3, 15, 10, 0, 0)
            .unwrap()
            .with_timezone(&offset);
        let groups = group_by_recency(
            vec![summary("late", Utc.with_ymd_and_hms(2026, 3, 14, 23, 0, 0).unwrap())],
            &now,
        );
        assert_eq!(groups.today.len(), 1);
    }

    #[test]
    fn test_order_within_bucket_is_preserved() {
        let now = noon();
        let groups = group_by_recency(
            vec![
                summary("newest", now),
                summary("old-1", now - Duration::days(3)),
                summary("middle", now - Duration::hours(1)),
                summary("old-2", now - Duration::days(5)),
            ],
            &now,
        );
        let today: Vec<_> = groups.today.iter().map(|s| s.title.as_str()).collect();
        let older: Vec<_> = groups.older.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(today, vec!["newest", "middle"]);
        assert_eq!(older, vec!["old-1", "old-2"]);
    }

    #[test]
    fn test_labeled_skips_empty_buckets() {
        let now = noon();
        let groups = group_by_recency(
            vec![summary("a", now), summary("b", now - Duration::days(7))],
            &now,
        );
        let labels: Vec<_> = groups.labeled().into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["Today", "Older"]);
        assert_eq!(groups.len(), 2);
    }
}
