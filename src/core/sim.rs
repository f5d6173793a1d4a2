use crate::core::params::MapParams;
use crate::core::query::Selector;
use crate::core::run::{RunHistory, RunRecord};
use crate::core::state::{InitialConditions, Trajectory, ACTION, ANGLE};
use crate::error::{Error, Result};
use ndarray::Array3;
use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Where a finished run is stored in the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Add a new record at the end of the history.
    #[default]
    Append,
    /// Replace the most recent record.
    Overwrite,
}

impl FromStr for WriteMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "append" => Ok(WriteMode::Append),
            "overwrite" => Ok(WriteMode::Overwrite),
            other => Err(Error::InvalidArgument(format!(
                "invalid option {other:?}; only \"append\" and \"overwrite\" are allowed"
            ))),
        }
    }
}

/// Batched Chirikov standard map engine with a history of completed runs.
///
/// The map acts on the 2-torus:
///
/// ```text
/// I'     = (I + K sin(theta)) mod 2π
/// theta' = (theta + I')       mod 2π
/// ```
///
/// Parameters are mutable between simulations; each run snapshots them.
#[derive(Debug, Clone, Default)]
pub struct StandardMap {
    params: MapParams,
    history: RunHistory,
}

impl StandardMap {
    /// Create an engine with coupling `k`, trajectory length `n_iters` and optional `seed`.
    ///
    /// Errors: `Error::InvalidParameter` if `k < 0` (or not finite) or `n_iters == 0`.
    pub fn new(k: f64, n_iters: usize, seed: Option<u64>) -> Result<Self> {
        Ok(Self {
            params: MapParams::new(k, n_iters, seed)?,
            history: RunHistory::new(),
        })
    }

    /// Create an engine from an already validated parameter set.
    pub fn with_params(params: MapParams) -> Self {
        Self {
            params,
            history: RunHistory::new(),
        }
    }

    /// Current parameters.
    pub fn params(&self) -> &MapParams {
        &self.params
    }

    /// Current coupling strength K.
    pub fn k(&self) -> f64 {
        self.params.k()
    }

    /// Set K for later runs; fails with `Error::InvalidParameter` if negative or not finite.
    pub fn set_k(&mut self, k: f64) -> Result<()> {
        self.params.set_k(k)
    }

    /// Current trajectory length.
    pub fn n_iters(&self) -> usize {
        self.params.n_iters()
    }

    /// Set the trajectory length for later runs; fails with `Error::InvalidParameter` if zero.
    pub fn set_n_iters(&mut self, n_iters: usize) -> Result<()> {
        self.params.set_n_iters(n_iters)
    }

    /// Current RNG seed, `None` when nondeterministic.
    pub fn seed(&self) -> Option<u64> {
        self.params.seed()
    }

    /// Set or unset the RNG seed used by later random batches.
    pub fn set_seed(&mut self, seed: Option<u64>) {
        self.params.set_seed(seed)
    }

    /// Completed runs, oldest first.
    pub fn history(&self) -> &RunHistory {
        &self.history
    }

    /// Run at 1-based `index`.
    pub fn run(&self, index: usize) -> Result<&RunRecord> {
        self.history.get(index)
    }

    /// Remove runs matched by `selector` (all runs when `None`); parameters are untouched.
    pub fn clear_runs(&mut self, selector: Option<&Selector>) -> Result<usize> {
        self.history.clear_runs(selector)
    }

    /// Simulate a batch of trajectories with the current parameters and store the run.
    ///
    /// All inputs are validated before any work is done, so on error the
    /// history is unchanged. Overwriting with an empty history fails with
    /// `Error::OutOfRange`.
    pub fn simulate(&mut self, mode: WriteMode, ic: InitialConditions) -> Result<()> {
        if mode == WriteMode::Overwrite && self.history.is_empty() {
            return Err(Error::OutOfRange(
                "cannot overwrite: run history is empty".into(),
            ));
        }
        ic.validate()?;

        let params = self.params;
        debug!(
            k = params.k(),
            n_iters = params.n_iters(),
            seed = ?params.seed(),
            n_sim = ic.n_sim(),
            ?mode,
            "simulating standard map"
        );

        let mut state = ic.materialize(params.n_iters(), params.seed())?;
        iterate(&mut state, params.k());
        let record = RunRecord::new(params, Trajectory::from_state(state));

        match mode {
            WriteMode::Append => self.history.push(record),
            WriteMode::Overwrite => self.history.replace_last(record)?,
        }
        Ok(())
    }
}

impl fmt::Display for StandardMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.history.k_span() {
            Some((min_k, max_k)) => write!(
                f,
                "Number of runs: {}\nRange of K: [{:?}, {:?}]",
                self.history.len(),
                min_k,
                max_k
            ),
            None => write!(
                f,
                "Current K: {:?}\nCurrent run length: {}",
                self.k(),
                self.n_iters()
            ),
        }
    }
}

/// Advance every trajectory in `state` (shape (n_sim, 2, n_iters)) from its step-0 values.
///
/// The angle update uses the already updated action.
pub fn iterate(state: &mut Array3<f64>, k: f64) {
    let n_iters = state.shape()[2];
    for mut traj in state.outer_iter_mut() {
        for i in 0..n_iters.saturating_sub(1) {
            let action = wrap(traj[[ACTION, i]] + k * traj[[ANGLE, i]].sin());
            let angle = wrap(traj[[ANGLE, i]] + action);
            traj[[ACTION, i + 1]] = action;
            traj[[ANGLE, i + 1]] = angle;
        }
    }
}

/// Reduce `x` into [0, 2π).
#[inline]
pub fn wrap(x: f64) -> f64 {
    let r = x.rem_euclid(TAU);
    // rem_euclid rounds tiny negative inputs up to exactly TAU
    if r >= TAU {
        0.0
    } else {
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parsing() {
        assert_eq!("append".parse::<WriteMode>().ok(), Some(WriteMode::Append));
        assert_eq!(
            "overwrite".parse::<WriteMode>().ok(),
            Some(WriteMode::Overwrite)
        );
        let err = "replace".parse::<WriteMode>().unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn wrap_stays_in_half_open_interval() {
        assert_eq!(wrap(TAU), 0.0);
        assert_eq!(wrap(0.0), 0.0);
        assert_eq!(wrap(-1e-18), 0.0);
        assert!((wrap(-1.0) - (TAU - 1.0)).abs() < 1e-12);
        assert!((wrap(TAU + 0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn origin_is_a_fixed_point() -> Result<()> {
        let mut map = StandardMap::new(1.0, 3, None)?;
        map.simulate(WriteMode::Append, InitialConditions::from_pairs(&[[0.0, 0.0]]))?;
        let traj = map.run(1)?.trajectory();
        for step in 0..3 {
            assert_eq!(traj.point(0, step), Some((0.0, 0.0)));
        }
        Ok(())
    }

    #[test]
    fn angle_uses_updated_action() -> Result<()> {
        let (i0, t0, k) = (1.0, 0.5, 0.8);
        let mut map = StandardMap::new(k, 2, None)?;
        map.simulate(WriteMode::Append, InitialConditions::from_pairs(&[[i0, t0]]))?;
        let (i1, t1) = map.run(1)?.trajectory().point(0, 1).unwrap_or_default();
        let expected_i1 = (i0 + k * t0.sin()).rem_euclid(TAU);
        assert!((i1 - expected_i1).abs() < 1e-15);
        assert!((t1 - (t0 + expected_i1).rem_euclid(TAU)).abs() < 1e-15);
        Ok(())
    }

    #[test]
    fn single_iteration_keeps_initial_state_only() -> Result<()> {
        let mut map = StandardMap::new(2.0, 1, Some(9))?;
        map.simulate(WriteMode::Append, InitialConditions::Random(3))?;
        assert_eq!(map.run(1)?.trajectory().n_iters(), 1);
        Ok(())
    }

    #[test]
    fn overwrite_on_empty_history_fails() -> Result<()> {
        let mut map = StandardMap::default();
        let err = map
            .simulate(WriteMode::Overwrite, InitialConditions::Random(1))
            .unwrap_err();
        assert!(matches!(err, Error::OutOfRange(_)));
        assert!(map.history().is_empty());
        Ok(())
    }

    #[test]
    fn summary_without_runs_reports_parameters() -> Result<()> {
        let map = StandardMap::new(0.75, 200, None)?;
        assert_eq!(map.to_string(), "Current K: 0.75\nCurrent run length: 200");
        Ok(())
    }

    #[test]
    fn summary_with_runs_reports_k_span() -> Result<()> {
        let mut map = StandardMap::new(2.0, 5, Some(4))?;
        map.simulate(WriteMode::Append, InitialConditions::Random(1))?;
        map.set_k(0.5)?;
        map.simulate(WriteMode::Append, InitialConditions::Random(1))?;
        map.set_k(1.0)?;
        assert_eq!(map.to_string(), "Number of runs: 2\nRange of K: [0.5, 2.0]");
        Ok(())
    }
}
