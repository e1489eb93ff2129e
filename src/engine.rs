use crate::attempt::{AttemptRecord, Outcome};
use crate::category::CommonGroups;
use crate::controller::{decide, Decision};
use crate::error::Result;
use crate::settings::ProgressionSettings;
use crate::store::ProgressStore;
use crate::window::{Window, WINDOW_CAPACITY};

/// One evaluation cycle per completed attempt: derive the key group, pull the
/// trailing window, decide, persist the record, apply the decision. The
/// gameplay loop guarantees cycles never overlap (one attempt is scored at a
/// time); `&mut self` assumes at most one writer.
pub struct ProgressionEngine<S: ProgressStore> {
    store: S,
    groups: CommonGroups,
}

impl<S: ProgressStore> ProgressionEngine<S> {
    pub fn new(store: S) -> Self {
        Self::with_groups(store, CommonGroups::default())
    }

    pub fn with_groups(store: S, groups: CommonGroups) -> Self {
        Self { store, groups }
    }

    /// Evaluates a completed attempt and persists it, updating the difficulty
    /// overrides of every category in the attempt's common group.
    ///
    /// Fail-closed: a storage failure during either the window read or the
    /// record append aborts the cycle with `settings` untouched. A crash
    /// between the append and the caller saving `settings` is tolerable
    /// because the next attempt re-derives the same window.
    pub fn score_attempt(
        &mut self,
        record: &AttemptRecord,
        settings: &mut ProgressionSettings,
    ) -> Result<Decision> {
        record.validate()?;
        let keys = self.groups.group_keys(record);
        let window = Window::build(&self.store, &keys, record, WINDOW_CAPACITY)?;
        let decision = decide(&window, record, settings.goal_seconds)?;
        self.store.append(record)?;
        decision.apply_to(settings, &self.groups.group_of(record.category));
        Ok(decision)
    }

    /// Persists an attempt without evaluating it, for hosts running with
    /// auto-progression switched off.
    pub fn record_attempt(&mut self, record: &AttemptRecord) -> Result<()> {
        record.validate()?;
        self.store.append(record)
    }

    /// Outcomes of the most recent attempts for this attempt's key group;
    /// feeds the host's trailing-dots progress display.
    pub fn recent_outcomes(&self, record: &AttemptRecord) -> Result<Vec<Outcome>> {
        let keys = self.groups.group_keys(record);
        let trailing = self.store.trailing_by_keys(&keys, WINDOW_CAPACITY)?;
        Ok(trailing.into_iter().map(|r| r.outcome).collect())
    }

    /// The underlying record log, for reporting consumers of `all()`.
    pub fn store(&self) -> &S {
        &self.store
    }
}
