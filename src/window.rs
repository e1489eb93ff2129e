use crate::attempt::{AttemptRecord, Outcome, ProgressKey};
use crate::error::Result;
use crate::store::ProgressStore;

/// Number of records a full evaluation window holds, current attempt
/// included.
pub const WINDOW_CAPACITY: usize = 20;

/// The trailing sample a difficulty decision is made from: up to
/// `capacity - 1` stored records for the key group plus the attempt that just
/// completed, sorted ascending by elapsed time. The elapsed-time ordering
/// (not chronological) is what the controller's percentile estimate needs.
#[derive(Debug, Clone)]
pub struct Window {
    records: Vec<AttemptRecord>,
}

impl Window {
    pub fn build<S: ProgressStore>(
        store: &S,
        group_keys: &[ProgressKey],
        current: &AttemptRecord,
        capacity: usize,
    ) -> Result<Window> {
        let mut records = store.trailing_by_keys(group_keys, capacity.saturating_sub(1))?;
        records.push(current.clone());
        records.sort_by_key(|r| r.elapsed_ms);
        Ok(Window { records })
    }

    /// A window smaller than capacity is the expected state for a new user or
    /// a freshly changed configuration; the controller treats it as warm-up.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome == Outcome::Right)
            .count()
    }

    pub fn failure_count(&self) -> usize {
        self.len() - self.success_count()
    }

    /// Successful attempts, still sorted ascending by elapsed time.
    pub fn successes(&self) -> Vec<&AttemptRecord> {
        self.records
            .iter()
            .filter(|r| r.outcome == Outcome::Right)
            .collect()
    }
}
