use crate::core::params::MapParams;
use crate::core::state::Trajectory;
use crate::error::{Error, Result};

/// Immutable snapshot of one simulation: the parameters in effect when
/// `simulate` was called and the resulting trajectory batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    params: MapParams,
    trajectory: Trajectory,
}

impl RunRecord {
    pub(crate) fn new(params: MapParams, trajectory: Trajectory) -> Self {
        Self { params, trajectory }
    }

    /// Coupling strength used for this run.
    pub fn k(&self) -> f64 {
        self.params.k()
    }

    /// Trajectory length used for this run.
    pub fn n_iters(&self) -> usize {
        self.params.n_iters()
    }

    /// Seed in effect for this run.
    pub fn seed(&self) -> Option<u64> {
        self.params.seed()
    }

    /// Number of trajectories in the batch.
    pub fn n_sim(&self) -> usize {
        self.trajectory.n_sim()
    }

    /// Parameter snapshot.
    pub fn params(&self) -> &MapParams {
        &self.params
    }

    /// The (n_sim, 2, n_iters) trajectory.
    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }
}

/// Ordered history of run records.
///
/// Indices exposed to callers are 1-based; insertion order is never changed.
#[derive(Debug, Clone, Default)]
pub struct RunHistory {
    runs: Vec<RunRecord>,
}

impl RunHistory {
    /// Empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored runs.
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// True when no runs are stored.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Run at 1-based `index`.
    ///
    /// Errors: `Error::OutOfRange` unless `1 <= index <= len`.
    pub fn get(&self, index: usize) -> Result<&RunRecord> {
        self.check_index(index)?;
        Ok(&self.runs[index - 1])
    }

    /// Most recently stored run.
    pub fn last(&self) -> Option<&RunRecord> {
        self.runs.last()
    }

    /// Iterate runs in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, RunRecord> {
        self.runs.iter()
    }

    /// Inclusive `(min K, max K)` over all stored runs, or `None` when empty.
    pub fn k_span(&self) -> Option<(f64, f64)> {
        let ks = self.runs.iter().map(|r| r.params.k_ordered());
        let min = ks.clone().min()?;
        let max = ks.max()?;
        Some((min.into_inner(), max.into_inner()))
    }

    pub(crate) fn push(&mut self, record: RunRecord) {
        self.runs.push(record);
    }

    /// Replace the most recent run.
    pub(crate) fn replace_last(&mut self, record: RunRecord) -> Result<()> {
        let slot = self
            .runs
            .last_mut()
            .ok_or_else(|| Error::OutOfRange("cannot overwrite: run history is empty".into()))?;
        *slot = record;
        Ok(())
    }

    /// Remove the runs at the given 0-based positions, keeping the order of the rest.
    pub(crate) fn remove_positions(&mut self, positions: &[usize]) -> usize {
        let before = self.runs.len();
        let mut pos = 0usize;
        self.runs.retain(|_| {
            let keep = !positions.contains(&pos);
            pos += 1;
            keep
        });
        before - self.runs.len()
    }

    pub(crate) fn clear(&mut self) -> usize {
        let n = self.runs.len();
        self.runs.clear();
        n
    }

    pub(crate) fn check_index(&self, index: usize) -> Result<()> {
        if index == 0 || index > self.runs.len() {
            return Err(Error::OutOfRange(format!(
                "run index {index} outside [1, {}]",
                self.runs.len()
            )));
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a RunHistory {
    type Item = &'a RunRecord;
    type IntoIter = std::slice::Iter<'a, RunRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.runs.iter()
    }
}
