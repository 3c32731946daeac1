//! Integrated I/Q result containers.

use ndarray::{Array1, Array2, Axis, concatenate};
use std::sync::OnceLock;

use crate::error::{ResultError, ResultResult};

/// Per-shot integrated I/Q data, shaped (bins, shots).
///
/// Effectively immutable after construction: magnitude and phase are computed
/// lazily and cached, which is only sound because nothing rewrites the
/// voltages afterwards.
#[derive(Debug, Clone)]
pub struct IqResults {
    i: Array2<f64>,
    q: Array2<f64>,
    magnitude: OnceLock<Array2<f64>>,
    phase: OnceLock<Array2<f64>>,
}

/// RAW acquisition traces use the same container with time samples on the
/// shot axis.
pub type RawWaveformResults = IqResults;

impl IqResults {
    /// Reshape flat per-shot I/Q arrays into a (bins, shots) grid.
    pub fn new(i: Vec<f64>, q: Vec<f64>, shots: usize) -> ResultResult<Self> {
        if i.len() != q.len() {
            return Err(ResultError::LengthMismatch {
                i: i.len(),
                q: q.len(),
            });
        }
        if shots == 0 || i.len() % shots != 0 {
            return Err(ResultError::ShotMismatch {
                samples: i.len(),
                shots,
            });
        }
        let bins = i.len() / shots;
        let i = Array2::from_shape_vec((bins, shots), i)
            .expect("dimensions validated above");
        let q = Array2::from_shape_vec((bins, shots), q)
            .expect("dimensions validated above");
        Ok(Self {
            i,
            q,
            magnitude: OnceLock::new(),
            phase: OnceLock::new(),
        })
    }

    fn from_grids(i: Array2<f64>, q: Array2<f64>) -> Self {
        Self {
            i,
            q,
            magnitude: OnceLock::new(),
            phase: OnceLock::new(),
        }
    }

    /// In-phase voltages, (bins, shots).
    pub fn i(&self) -> &Array2<f64> {
        &self.i
    }

    /// Quadrature voltages, (bins, shots).
    pub fn q(&self) -> &Array2<f64> {
        &self.q
    }

    /// Number of bins.
    pub fn num_bins(&self) -> usize {
        self.i.nrows()
    }

    /// Shots per bin.
    pub fn shots(&self) -> usize {
        self.i.ncols()
    }

    /// Total acquired samples.
    pub fn num_samples(&self) -> usize {
        self.i.len()
    }

    /// Signal magnitude in volts, computed on first use.
    pub fn magnitude(&self) -> &Array2<f64> {
        self.magnitude.get_or_init(|| {
            let mut out = self.i.clone();
            out.zip_mut_with(&self.q, |i, q| *i = (*i * *i + q * q).sqrt());
            out
        })
    }

    /// Signal phase in radians, computed on first use.
    pub fn phase(&self) -> &Array2<f64> {
        self.phase.get_or_init(|| {
            let mut out = self.q.clone();
            out.zip_mut_with(&self.i, |q, i| *q = q.atan2(*i));
            out
        })
    }

    /// Reduce over the shot axis: per-bin mean and standard deviation of i
    /// and q independently. Magnitude/phase of an average are derived from
    /// the averaged voltages, never averaged themselves.
    pub fn average(&self) -> AveragedIqResults {
        AveragedIqResults {
            i: self.i.mean_axis(Axis(1)).expect("shots axis is non-empty"),
            q: self.q.mean_axis(Axis(1)).expect("shots axis is non-empty"),
            std_i: self.i.std_axis(Axis(1), 0.0),
            std_q: self.q.std_axis(Axis(1), 0.0),
        }
    }

    /// Append another container.
    ///
    /// Operands with equal shots-per-bin are appended along the bin axis
    /// (chunks covering disjoint sweep values); operands with equal bin
    /// counts are appended along the shot axis (chunks covering disjoint
    /// shot subsets of the same sweep). Anything else is a hard error rather
    /// than silent broadcasting.
    pub fn concat(&self, other: &IqResults) -> ResultResult<IqResults> {
        let axis = if self.shots() == other.shots() {
            Axis(0)
        } else if self.num_bins() == other.num_bins() {
            Axis(1)
        } else {
            return Err(ResultError::ConcatMismatch {
                left: self.shots(),
                right: other.shots(),
            });
        };
        let i = concatenate(axis, &[self.i.view(), other.i.view()])
            .expect("shapes validated above");
        let q = concatenate(axis, &[self.q.view(), other.q.view()])
            .expect("shapes validated above");
        Ok(IqResults::from_grids(i, q))
    }
}

/// Shot-averaged I/Q data: per-bin means and standard deviations.
#[derive(Debug, Clone, PartialEq)]
pub struct AveragedIqResults {
    /// Per-bin mean of i.
    pub i: Array1<f64>,
    /// Per-bin mean of q.
    pub q: Array1<f64>,
    /// Per-bin standard deviation of i.
    pub std_i: Array1<f64>,
    /// Per-bin standard deviation of q.
    pub std_q: Array1<f64>,
}

impl AveragedIqResults {
    /// Append another averaged container along the bin axis.
    pub fn concat(&self, other: &AveragedIqResults) -> AveragedIqResults {
        let append = |a: &Array1<f64>, b: &Array1<f64>| {
            concatenate(Axis(0), &[a.view(), b.view()]).expect("1-D arrays always concatenate")
        };
        AveragedIqResults {
            i: append(&self.i, &other.i),
            q: append(&self.q, &other.q),
            std_i: append(&self.std_i, &other.std_i),
            std_q: append(&self.std_q, &other.std_q),
        }
    }

    /// Magnitude of the averaged voltages.
    pub fn magnitude(&self) -> Array1<f64> {
        ndarray::Zip::from(&self.i)
            .and(&self.q)
            .map_collect(|i, q| (i * i + q * q).sqrt())
    }

    /// Phase of the averaged voltages.
    pub fn phase(&self) -> Array1<f64> {
        ndarray::Zip::from(&self.i)
            .and(&self.q)
            .map_collect(|i, q| q.atan2(*i))
    }
}
