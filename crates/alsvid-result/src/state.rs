//! Discriminated state result containers.

use ndarray::{Array1, Array2, Axis, concatenate};

use crate::error::{ResultError, ResultResult};

/// Per-shot discriminated {0, 1} outcomes, shaped (bins, shots).
#[derive(Debug, Clone, PartialEq)]
pub struct StateResults {
    states: Array2<u8>,
}

impl StateResults {
    /// Reshape flat per-shot states into a (bins, shots) grid.
    ///
    /// Values outside {0, 1} are rejected at construction.
    pub fn new(states: Vec<u8>, shots: usize) -> ResultResult<Self> {
        if let Some(&bad) = states.iter().find(|&&s| s > 1) {
            return Err(ResultError::InvalidState(bad));
        }
        if shots == 0 || states.len() % shots != 0 {
            return Err(ResultError::ShotMismatch {
                samples: states.len(),
                shots,
            });
        }
        let bins = states.len() / shots;
        let states = Array2::from_shape_vec((bins, shots), states)
            .expect("dimensions validated above");
        Ok(Self { states })
    }

    /// State grid, (bins, shots).
    pub fn states(&self) -> &Array2<u8> {
        &self.states
    }

    /// Number of bins.
    pub fn num_bins(&self) -> usize {
        self.states.nrows()
    }

    /// Shots per bin.
    pub fn shots(&self) -> usize {
        self.states.ncols()
    }

    /// Total acquired samples.
    pub fn num_samples(&self) -> usize {
        self.states.len()
    }

    /// Per-bin fraction of shots equal to `state`.
    pub fn probability(&self, state: u8) -> Array1<f64> {
        let shots = self.shots() as f64;
        self.states
            .axis_iter(Axis(0))
            .map(|bin| bin.iter().filter(|&&s| s == state).count() as f64 / shots)
            .collect()
    }

    /// Reduce over the shot axis into mean excited-state population per bin.
    pub fn average(&self) -> AveragedStateResults {
        let as_float = self.states.mapv(f64::from);
        AveragedStateResults {
            probabilities: as_float
                .mean_axis(Axis(1))
                .expect("shots axis is non-empty"),
            std: as_float.std_axis(Axis(1), 0.0),
        }
    }

    /// Append another container: along the bin axis when shots-per-bin
    /// match, along the shot axis when bin counts match, an error otherwise.
    pub fn concat(&self, other: &StateResults) -> ResultResult<StateResults> {
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
        let states = concatenate(axis, &[self.states.view(), other.states.view()])
            .expect("shapes validated above");
        Ok(StateResults { states })
    }
}

/// Shot-averaged discrimination outcomes.
#[derive(Debug, Clone, PartialEq)]
pub struct AveragedStateResults {
    /// Per-bin mean excited-state population.
    pub probabilities: Array1<f64>,
    /// Per-bin standard deviation.
    pub std: Array1<f64>,
}

impl AveragedStateResults {
    /// Append another averaged container along the bin axis.
    pub fn concat(&self, other: &AveragedStateResults) -> AveragedStateResults {
        let append = |a: &Array1<f64>, b: &Array1<f64>| {
            concatenate(Axis(0), &[a.view(), b.view()]).expect("1-D arrays always concatenate")
        };
        AveragedStateResults {
            probabilities: append(&self.probabilities, &other.probabilities),
            std: append(&self.std, &other.std),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_rejected() {
        let result = StateResults::new(vec![0, 1, 2, 0], 2);
        assert!(matches!(result, Err(ResultError::InvalidState(2))));
    }

    #[test]
    fn test_probability() {
        let results = StateResults::new(vec![0, 1, 1, 0, 1, 1, 1, 0], 4).unwrap();
        let p1 = results.probability(1);
        assert_eq!(p1.to_vec(), vec![0.5, 0.75]);
        let p0 = results.probability(0);
        assert_eq!(p0.to_vec(), vec![0.5, 0.25]);
    }

    #[test]
    fn test_average() {
        let results = StateResults::new(vec![0, 1, 1, 1], 2).unwrap();
        let averaged = results.average();
        assert_eq!(averaged.probabilities.to_vec(), vec![0.5, 1.0]);
        assert_eq!(averaged.std[1], 0.0);
    }

    #[test]
    fn test_concat() {
        let a = StateResults::new(vec![0, 1], 2).unwrap();
        let b = StateResults::new(vec![1, 1], 2).unwrap();
        let merged = a.concat(&b).unwrap();
        assert_eq!(merged.num_bins(), 2);
        assert_eq!(merged.num_samples(), 4);
    }
}
