//! Load Scheduler
//!
//! Bounded-concurrency admission control for candidate fetches. Every
//! scheduling pass drops completed entries, re-scores the rest by live
//! visibility and admits the highest-scoring pending entries until the
//! in-flight cap is reached. A fetch that never completes is forcibly
//! swept after a timeout so hung requests cannot starve the queue.

use std::cmp::Ordering;
use std::time::{Duration, Instant};

use crate::element::ElementId;

/// Non-fatal load failures, logged and recovered locally.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to load `{url}`")]
    Failed { url: String },

    #[error("`{url}` neither loaded nor errored within {timeout:?}")]
    TimedOut { url: String, timeout: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Pending,
    Loading,
    Completed,
}

#[derive(Debug)]
struct LoadEntry {
    id: u64,
    element: ElementId,
    url: String,
    status: LoadStatus,
    visibility: f32,
    started_at: Option<Instant>,
}

/// A queue entry admitted by the current pass; the caller starts the fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub id: u64,
    pub element: ElementId,
    pub url: String,
}

/// Bounded-concurrency fetch queue.
#[derive(Debug)]
pub struct LoadScheduler {
    entries: Vec<LoadEntry>,
    next_id: u64,
    max_concurrent: usize,
    timeout: Duration,
}

impl LoadScheduler {
    pub fn new(max_concurrent: usize, timeout: Duration) -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
            max_concurrent,
            timeout,
        }
    }

    /// Queue a fetch. Returns the entry id the host will complete with.
    pub fn enqueue(&mut self, element: ElementId, url: String) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.entries.push(LoadEntry {
            id,
            element,
            url,
            status: LoadStatus::Pending,
            visibility: 0.0,
            started_at: None,
        });
        id
    }

    /// One scheduling pass: sweep completed entries, re-score by live
    /// visibility, stable-sort descending and admit pending entries until
    /// the concurrency cap is reached. Admission order is deterministic
    /// given the score snapshot.
    pub fn process(
        &mut self,
        now: Instant,
        mut score: impl FnMut(ElementId) -> f32,
    ) -> Vec<Admission> {
        self.entries.retain(|entry| entry.status != LoadStatus::Completed);
        for entry in &mut self.entries {
            entry.visibility = score(entry.element);
        }
        self.entries.sort_by(|a, b| {
            b.visibility.partial_cmp(&a.visibility).unwrap_or(Ordering::Equal)
        });

        let mut in_flight = self.in_flight();
        let mut admitted = Vec::new();
        for entry in &mut self.entries {
            if in_flight >= self.max_concurrent {
                break;
            }
            if entry.status == LoadStatus::Pending {
                entry.status = LoadStatus::Loading;
                entry.started_at = Some(now);
                in_flight += 1;
                admitted.push(Admission {
                    id: entry.id,
                    element: entry.element,
                    url: entry.url.clone(),
                });
            }
        }
        admitted
    }

    /// Mark an entry completed (success or error), releasing its slot.
    /// Returns the element and URL, or `None` when the entry is unknown or
    /// was already swept by a timeout.
    pub fn finish(&mut self, id: u64) -> Option<(ElementId, String)> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.id == id && entry.status != LoadStatus::Completed)?;
        entry.status = LoadStatus::Completed;
        Some((entry.element, entry.url.clone()))
    }

    /// Force-complete entries that have been loading longer than the
    /// timeout. Slots are released without inferring success or failure.
    /// Returns whether anything was swept.
    pub fn sweep_timeouts(&mut self, now: Instant) -> bool {
        let mut swept = false;
        for entry in &mut self.entries {
            if entry.status != LoadStatus::Loading {
                continue;
            }
            let timed_out = entry
                .started_at
                .is_some_and(|started| now.duration_since(started) >= self.timeout);
            if timed_out {
                entry.status = LoadStatus::Completed;
                swept = true;
                tracing::warn!(
                    error = %LoadError::TimedOut {
                        url: entry.url.clone(),
                        timeout: self.timeout,
                    },
                    "releasing load slot"
                );
            }
        }
        swept
    }

    /// Number of fetches currently in flight.
    pub fn in_flight(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.status == LoadStatus::Loading)
            .count()
    }

    /// Number of entries still waiting for admission.
    pub fn pending(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.status == LoadStatus::Pending)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> LoadScheduler {
        LoadScheduler::new(3, Duration::from_secs(60))
    }

    #[test]
    fn test_concurrency_cap() {
        let mut sched = scheduler();
        for i in 0..5 {
            sched.enqueue(ElementId(i), format!("{i}.jpg"));
        }
        let now = Instant::now();
        let admitted = sched.process(now, |_| 100.0);
        assert_eq!(admitted.len(), 3);
        assert_eq!(sched.in_flight(), 3);
        assert_eq!(sched.pending(), 2);

        // No slot free, nothing more admits.
        assert!(sched.process(now, |_| 100.0).is_empty());

        // One completion frees one slot.
        sched.finish(admitted[0].id);
        let admitted = sched.process(now, |_| 100.0);
        assert_eq!(admitted.len(), 1);
        assert_eq!(sched.pending(), 1);
    }

    #[test]
    fn test_most_visible_admitted_first() {
        let mut sched = LoadScheduler::new(1, Duration::from_secs(60));
        sched.enqueue(ElementId(1), "far.jpg".into());
        sched.enqueue(ElementId(2), "near.jpg".into());
        let admitted = sched.process(Instant::now(), |element| {
            if element == ElementId(2) { 90.0 } else { 10.0 }
        });
        assert_eq!(admitted.len(), 1);
        assert_eq!(admitted[0].element, ElementId(2));
    }

    #[test]
    fn test_equal_scores_keep_enqueue_order() {
        let mut sched = LoadScheduler::new(2, Duration::from_secs(60));
        let a = sched.enqueue(ElementId(1), "a.jpg".into());
        let b = sched.enqueue(ElementId(2), "b.jpg".into());
        let admitted = sched.process(Instant::now(), |_| 50.0);
        assert_eq!(admitted[0].id, a);
        assert_eq!(admitted[1].id, b);
    }

    #[test]
    fn test_timeout_releases_slot() {
        let mut sched = LoadScheduler::new(1, Duration::from_secs(60));
        sched.enqueue(ElementId(1), "hung.jpg".into());
        sched.enqueue(ElementId(2), "next.jpg".into());
        let start = Instant::now();
        let admitted = sched.process(start, |_| 100.0);
        assert_eq!(admitted[0].element, ElementId(1));

        // Not yet timed out.
        assert!(!sched.sweep_timeouts(start + Duration::from_secs(59)));

        let later = start + Duration::from_secs(61);
        assert!(sched.sweep_timeouts(later));
        assert_eq!(sched.in_flight(), 0);

        let admitted = sched.process(later, |_| 100.0);
        assert_eq!(admitted[0].element, ElementId(2));
    }

    #[test]
    fn test_late_completion_after_sweep_is_ignored() {
        let mut sched = LoadScheduler::new(1, Duration::from_secs(60));
        let id = sched.enqueue(ElementId(1), "hung.jpg".into());
        let start = Instant::now();
        sched.process(start, |_| 100.0);
        sched.sweep_timeouts(start + Duration::from_secs(61));
        assert!(sched.finish(id).is_none());
    }

    #[test]
    fn test_finish_unknown_id() {
        let mut sched = scheduler();
        assert!(sched.finish(42).is_none());
    }
}
