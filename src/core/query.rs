//! Value and range lookup over the run history, and selective clearing.
//!
//! Selectors address runs by 1-based index, by coupling strength K, or by
//! iteration count. Each takes a single value or an inclusive `[lo, hi]`
//! range. Malformed selectors fail with `Error::OutOfRange`; a well-formed
//! value selector that matches nothing yields `None` from [`RunHistory::query`].

use crate::core::run::{RunHistory, RunRecord};
use crate::error::{Error, Result};
use ndarray::Array2;
use std::fmt::Display;
use tracing::debug;

/// A single value or an inclusive range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Span<T> {
    Single(T),
    Range(T, T),
}

impl<T: PartialOrd + Copy + Display> Span<T> {
    /// Inclusive `(lo, hi)` bounds, rejecting inverted ranges.
    fn bounds(&self) -> Result<(T, T)> {
        match *self {
            Span::Single(v) => Ok((v, v)),
            Span::Range(lo, hi) => {
                if lo > hi {
                    return Err(Error::OutOfRange(format!(
                        "range lower bound {lo} exceeds upper bound {hi}"
                    )));
                }
                Ok((lo, hi))
            }
        }
    }
}

#[inline]
fn within<T: PartialOrd>(lo: T, hi: T, v: T) -> bool {
    lo <= v && v <= hi
}

/// How runs are selected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selector {
    /// 1-based run index.
    Run(Span<usize>),
    /// Coupling strength used by the run.
    K(Span<f64>),
    /// Iteration count used by the run.
    NIters(Span<usize>),
}

/// Metadata reported for each matched run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunMetadata {
    /// 1-based position in the history.
    pub index: usize,
    pub k: f64,
    /// Trajectory length.
    pub n_iters: usize,
    pub seed: Option<u64>,
    pub n_sim: usize,
    /// Step-0 (I, theta) pairs, shape (n_sim, 2).
    pub initial_conditions: Array2<f64>,
}

impl RunMetadata {
    fn from_record(index: usize, record: &RunRecord) -> Self {
        Self {
            index,
            k: record.k(),
            n_iters: record.n_iters(),
            seed: record.seed(),
            n_sim: record.n_sim(),
            initial_conditions: record.trajectory().initial_conditions().to_owned(),
        }
    }
}

impl RunHistory {
    /// 0-based positions of the runs matched by `selector`, in history order.
    ///
    /// Errors: `Error::OutOfRange` for inverted ranges, run indices outside
    /// `[1, len]`, negative or non-finite K, or a zero iteration count.
    pub fn select(&self, selector: &Selector) -> Result<Vec<usize>> {
        match selector {
            Selector::Run(span) => {
                let (lo, hi) = span.bounds()?;
                self.check_index(lo)?;
                self.check_index(hi)?;
                Ok((lo - 1..hi).collect())
            }
            Selector::K(span) => {
                let (lo, hi) = span.bounds()?;
                for k in [lo, hi] {
                    if !k.is_finite() || k < 0.0 {
                        return Err(Error::OutOfRange(format!(
                            "K selector must be finite and >= 0, got {k}"
                        )));
                    }
                }
                Ok(self.positions(|r| within(lo, hi, r.k())))
            }
            Selector::NIters(span) => {
                let (lo, hi) = span.bounds()?;
                if lo == 0 {
                    return Err(Error::OutOfRange("n_iters selector must be > 0".into()));
                }
                Ok(self.positions(|r| within(lo, hi, r.n_iters())))
            }
        }
    }

    /// Metadata of the runs matched by `selector`, or `None` if nothing matches.
    pub fn query(&self, selector: &Selector) -> Result<Option<Vec<RunMetadata>>> {
        let positions = self.select(selector)?;
        if positions.is_empty() {
            return Ok(None);
        }
        let found = positions
            .into_iter()
            .map(|p| {
                let index = p + 1;
                self.get(index).map(|r| RunMetadata::from_record(index, r))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(found))
    }

    /// Remove the runs matched by `selector`, or every run when `None`.
    ///
    /// Returns the number of removed runs. Validation happens before removal.
    pub fn clear_runs(&mut self, selector: Option<&Selector>) -> Result<usize> {
        let removed = match selector {
            None => self.clear(),
            Some(sel) => {
                let positions = self.select(sel)?;
                self.remove_positions(&positions)
            }
        };
        debug!(removed, remaining = self.len(), "cleared runs");
        Ok(removed)
    }

    fn positions<F: Fn(&RunRecord) -> bool>(&self, pred: F) -> Vec<usize> {
        self.iter()
            .enumerate()
            .filter(|(_, r)| pred(r))
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sim::{StandardMap, WriteMode};
    use crate::core::state::InitialConditions;

    fn history_with(ks: &[f64], n_iters: usize) -> Result<StandardMap> {
        let mut map = StandardMap::new(1.0, n_iters, Some(1))?;
        for &k in ks {
            map.set_k(k)?;
            map.simulate(WriteMode::Append, InitialConditions::Random(2))?;
        }
        Ok(map)
    }

    #[test]
    fn inverted_run_range_is_out_of_range() -> Result<()> {
        let map = history_with(&[0.5, 1.0, 1.5], 4)?;
        let err = map.history().select(&Selector::Run(Span::Range(2, 1))).unwrap_err();
        assert!(matches!(err, Error::OutOfRange(_)));
        Ok(())
    }

    #[test]
    fn run_index_bounds_checked() -> Result<()> {
        let map = history_with(&[0.5, 1.0], 4)?;
        let h = map.history();
        assert!(h.select(&Selector::Run(Span::Single(0))).is_err());
        assert!(h.select(&Selector::Run(Span::Range(1, 3))).is_err());
        assert_eq!(h.select(&Selector::Run(Span::Range(1, 2)))?, vec![0, 1]);
        Ok(())
    }

    #[test]
    fn k_beyond_span_is_no_match() -> Result<()> {
        let map = history_with(&[0.5, 1.0, 1.5], 4)?;
        assert_eq!(map.history().query(&Selector::K(Span::Single(9.0)))?, None);
        assert_eq!(
            map.history().query(&Selector::K(Span::Range(2.0, 4.0)))?,
            None
        );
        Ok(())
    }

    #[test]
    fn k_range_is_inclusive() -> Result<()> {
        let map = history_with(&[0.5, 1.0, 1.5, 2.0], 4)?;
        let found = map
            .history()
            .query(&Selector::K(Span::Range(1.0, 1.5)))?
            .unwrap_or_default();
        let idx: Vec<usize> = found.iter().map(|m| m.index).collect();
        assert_eq!(idx, vec![2, 3]);
        assert_eq!(found[0].initial_conditions.dim(), (2, 2));
        assert_eq!(found[0].n_iters, 4);
        Ok(())
    }

    #[test]
    fn negative_k_selector_rejected() -> Result<()> {
        let map = history_with(&[0.5], 4)?;
        let err = map.history().query(&Selector::K(Span::Single(-1.0))).unwrap_err();
        assert!(matches!(err, Error::OutOfRange(_)));
        Ok(())
    }

    #[test]
    fn n_iters_selector() -> Result<()> {
        let mut map = history_with(&[0.5], 4)?;
        map.set_n_iters(10)?;
        map.simulate(WriteMode::Append, InitialConditions::Random(1))?;
        let found = map.history().select(&Selector::NIters(Span::Single(10)))?;
        assert_eq!(found, vec![1]);
        assert!(map.history().select(&Selector::NIters(Span::Single(0))).is_err());
        Ok(())
    }

    #[test]
    fn clear_by_k_keeps_parameters() -> Result<()> {
        let mut map = history_with(&[0.5, 1.0, 0.5], 4)?;
        let removed = map.clear_runs(Some(&Selector::K(Span::Single(0.5))))?;
        assert_eq!(removed, 2);
        assert_eq!(map.history().len(), 1);
        assert_eq!(map.history().get(1)?.k(), 1.0);
        assert_eq!(map.k(), 0.5);
        Ok(())
    }

    #[test]
    fn invalid_clear_leaves_history_intact() -> Result<()> {
        let mut map = history_with(&[0.5, 1.0], 4)?;
        assert!(map.clear_runs(Some(&Selector::Run(Span::Range(2, 5)))).is_err());
        assert_eq!(map.history().len(), 2);
        assert_eq!(map.clear_runs(None)?, 2);
        assert!(map.history().is_empty());
        Ok(())
    }
}
