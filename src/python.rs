use crate::core::{InitialConditions, RunMetadata, Selector, Span, StandardMap, WriteMode};
use crate::error::Error;
use crate::export::{self, ExportOptions};
use numpy::{AllowTypeChange, IntoPyArray, PyArray3, PyArrayLike2};
use pyo3::exceptions::{PyIndexError, PyOSError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};
use std::path::PathBuf;

impl From<Error> for PyErr {
    fn from(e: Error) -> Self {
        match e {
            Error::InvalidParameter(_) | Error::InvalidInput(_) | Error::InvalidArgument(_) => {
                PyValueError::new_err(e.to_string())
            }
            Error::OutOfRange(_) => PyIndexError::new_err(e.to_string()),
            Error::Io(_) | Error::Csv(_) => PyOSError::new_err(e.to_string()),
        }
    }
}

/// Python-facing wrapper around the Rust standard map engine.
///
/// API:
/// - StandardMap(K=1.0, n_iters=500, seed=None)
/// - properties K, n_iters, seed
/// - simulate(option="append", ic=1)
/// - run(i) -> np.ndarray, shape (n_sim, 2, n_iters)
/// - metadata(kind=None, value=None), clear_runs(kind=None, value=None)
/// - write(run=None, dir=None, name=None) -> list of paths
#[pyclass(name = "StandardMap")]
pub struct PyStandardMap {
    engine: StandardMap,
}

#[pymethods]
impl PyStandardMap {
    /// Create a new engine with an empty run history.
    ///
    /// Parameters
    /// - K: coupling strength (float, >= 0)
    /// - n_iters: trajectory length (int, > 0)
    /// - seed: RNG seed (int) for random initial conditions; None for nondeterministic
    ///
    /// Errors: raises ValueError on invalid parameters.
    #[new]
    #[pyo3(signature = (K=1.0, n_iters=500, seed=None))]
    #[allow(non_snake_case)]
    fn new(K: f64, n_iters: i64, seed: Option<u64>) -> PyResult<Self> {
        let engine = StandardMap::new(K, iterations(n_iters)?, seed)?;
        Ok(Self { engine })
    }

    #[getter(K)]
    fn k(&self) -> f64 {
        self.engine.k()
    }

    #[setter(K)]
    fn set_k(&mut self, k: f64) -> PyResult<()> {
        Ok(self.engine.set_k(k)?)
    }

    #[getter]
    fn n_iters(&self) -> usize {
        self.engine.n_iters()
    }

    #[setter]
    fn set_n_iters(&mut self, n_iters: i64) -> PyResult<()> {
        Ok(self.engine.set_n_iters(iterations(n_iters)?)?)
    }

    #[getter]
    fn seed(&self) -> Option<u64> {
        self.engine.seed()
    }

    #[setter]
    fn set_seed(&mut self, seed: Option<u64>) {
        self.engine.set_seed(seed)
    }

    /// Simulate and store a run (releases the GIL during the iteration).
    ///
    /// Parameters
    /// - option: "append" (new run) or "overwrite" (replace the most recent run)
    /// - ic: number of random trajectories (int > 0), or a numeric array of shape (m, 2)
    ///       holding (I, theta) pairs in [0, 2π]; integer dtypes are cast to float64
    #[pyo3(signature = (option="append", ic=None))]
    fn simulate(
        &mut self,
        py: Python<'_>,
        option: &str,
        ic: Option<&Bound<'_, PyAny>>,
    ) -> PyResult<()> {
        let mode: WriteMode = option.parse()?;
        let ic = match ic {
            Some(obj) => initial_conditions(obj)?,
            None => InitialConditions::Random(1),
        };
        py.detach(|| self.engine.simulate(mode, ic))?;
        Ok(())
    }

    /// Return the trajectory of run `i` (1-based) as a NumPy array of shape (n_sim, 2, n_iters).
    fn run<'py>(&self, py: Python<'py>, i: usize) -> PyResult<Bound<'py, PyArray3<f64>>> {
        let record = self.engine.run(i)?;
        Ok(record.trajectory().view().to_owned().into_pyarray(py))
    }

    /// Run metadata.
    ///
    /// Without `kind`: {"n_runs": int, "k_range": (min, max) or None}.
    /// With `kind` in {"run", "K", "N"} and a value or inclusive (lo, hi) pair: a list of
    /// per-run dicts, or None if nothing matches.
    #[pyo3(signature = (kind=None, value=None))]
    fn metadata<'py>(
        &self,
        py: Python<'py>,
        kind: Option<&str>,
        value: Option<&Bound<'py, PyAny>>,
    ) -> PyResult<Bound<'py, PyAny>> {
        let Some(kind) = kind else {
            let out = PyDict::new(py);
            out.set_item("n_runs", self.engine.history().len())?;
            out.set_item("k_range", self.engine.history().k_span())?;
            return Ok(out.into_any());
        };
        let selector = selector(kind, value)?;
        match self.engine.history().query(&selector)? {
            None => Ok(py.None().into_bound(py)),
            Some(found) => {
                let list = PyList::empty(py);
                for meta in found {
                    list.append(metadata_dict(py, meta)?)?;
                }
                Ok(list.into_any())
            }
        }
    }

    /// Remove runs from the history; all runs when `kind` is None. Returns the number removed.
    #[pyo3(signature = (kind=None, value=None))]
    fn clear_runs(
        &mut self,
        kind: Option<&str>,
        value: Option<&Bound<'_, PyAny>>,
    ) -> PyResult<usize> {
        let selector = kind.map(|k| selector(k, value)).transpose()?;
        Ok(self.engine.clear_runs(selector.as_ref())?)
    }

    /// Write runs to CSV files, one per run. Returns the written paths.
    ///
    /// Parameters
    /// - run: 1-based index or inclusive (lo, hi) range; None writes every run
    /// - dir: output directory (default "results/csvs")
    /// - name: file name to use instead of "K-<K>-len-<n_iters>.csv"
    #[pyo3(signature = (run=None, dir=None, name=None))]
    fn write(
        &self,
        run: Option<&Bound<'_, PyAny>>,
        dir: Option<PathBuf>,
        name: Option<String>,
    ) -> PyResult<Vec<PathBuf>> {
        let selection = run.map(span::<usize>).transpose()?;
        let mut options = ExportOptions::default();
        if let Some(dir) = dir {
            options.dir = dir;
        }
        options.name = name;
        Ok(export::write_runs(self.engine.history(), selection, &options)?)
    }

    fn __len__(&self) -> usize {
        self.engine.history().len()
    }

    fn __str__(&self) -> String {
        self.engine.to_string()
    }
}

fn iterations(n_iters: i64) -> PyResult<usize> {
    usize::try_from(n_iters).map_err(|_| {
        Error::InvalidParameter(format!("n_iters must be a positive integer, got {n_iters}"))
            .into()
    })
}

fn initial_conditions(obj: &Bound<'_, PyAny>) -> PyResult<InitialConditions> {
    if let Ok(n) = obj.extract::<i64>() {
        let n = usize::try_from(n).map_err(|_| {
            Error::InvalidInput(format!("number of trajectories must be > 0, got {n}"))
        })?;
        return Ok(InitialConditions::Random(n));
    }
    // Integer arrays and nested sequences are cast to float64 like np.asarray(ic, float).
    if let Ok(arr) = obj.extract::<PyArrayLike2<'_, f64, AllowTypeChange>>() {
        return Ok(InitialConditions::Batch(arr.as_array().to_owned()));
    }
    Err(Error::InvalidInput(
        "ic must be an integer or a numeric array of shape (m, 2)".into(),
    )
    .into())
}

fn span<'py, T>(value: &Bound<'py, PyAny>) -> PyResult<Span<T>>
where
    T: FromPyObject<'py> + Copy,
{
    if let Ok(v) = value.extract::<T>() {
        return Ok(Span::Single(v));
    }
    match value.extract::<Vec<T>>() {
        Ok(v) if v.len() == 2 => Ok(Span::Range(v[0], v[1])),
        _ => Err(Error::OutOfRange(
            "selector must be a single value or a two-element (lo, hi) range".into(),
        )
        .into()),
    }
}

fn selector(kind: &str, value: Option<&Bound<'_, PyAny>>) -> PyResult<Selector> {
    let value = value.ok_or_else(|| {
        PyErr::from(Error::InvalidArgument(format!(
            "a value is required when selecting by {kind:?}"
        )))
    })?;
    match kind {
        "run" => Ok(Selector::Run(span(value)?)),
        "K" => Ok(Selector::K(span(value)?)),
        "N" => Ok(Selector::NIters(span(value)?)),
        other => Err(Error::InvalidArgument(format!(
            "unknown selector {other:?}; expected \"run\", \"K\" or \"N\""
        ))
        .into()),
    }
}

fn metadata_dict(py: Python<'_>, meta: RunMetadata) -> PyResult<Bound<'_, PyDict>> {
    let d = PyDict::new(py);
    d.set_item("run", meta.index)?;
    d.set_item("K", meta.k)?;
    d.set_item("n_iters", meta.n_iters)?;
    d.set_item("seed", meta.seed)?;
    d.set_item("n_sim", meta.n_sim)?;
    d.set_item("ic", meta.initial_conditions.into_pyarray(py))?;
    Ok(d)
}
