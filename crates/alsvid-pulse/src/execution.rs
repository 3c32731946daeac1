//! Execution configuration.

use serde::{Deserialize, Serialize};

/// How raw acquisition data is reduced on or off the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionType {
    /// Full sampled IQ traces.
    Raw,
    /// Demodulated and integrated IQ points.
    Integration,
    /// Thresholded {0, 1} states.
    Discrimination,
    /// Frequency-resolved acquisition for spectroscopy.
    Spectroscopy,
}

/// Whether shots are kept individually or averaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AveragingMode {
    /// Average over shots (hardware or host side).
    Cyclic,
    /// Keep every shot.
    Singleshot,
}

/// Configuration of one execution or sweep call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionParameters {
    /// Number of shots to sample.
    pub nshots: u32,
    /// Wait between shots in ns; `None` falls back to the platform default.
    pub relaxation_time: Option<u64>,
    /// Acquisition reduction mode.
    pub acquisition_type: AcquisitionType,
    /// Shot averaging mode.
    pub averaging_mode: AveragingMode,
}

impl Default for ExecutionParameters {
    fn default() -> Self {
        Self {
            nshots: 1024,
            relaxation_time: None,
            acquisition_type: AcquisitionType::Integration,
            averaging_mode: AveragingMode::Singleshot,
        }
    }
}

impl ExecutionParameters {
    /// Set the shot count.
    #[must_use]
    pub fn with_nshots(mut self, nshots: u32) -> Self {
        self.nshots = nshots;
        self
    }

    /// Set the relaxation time in ns.
    #[must_use]
    pub fn with_relaxation_time(mut self, ns: u64) -> Self {
        self.relaxation_time = Some(ns);
        self
    }

    /// Set the acquisition type.
    #[must_use]
    pub fn with_acquisition(mut self, acquisition: AcquisitionType) -> Self {
        self.acquisition_type = acquisition;
        self
    }

    /// Set the averaging mode.
    #[must_use]
    pub fn with_averaging(mut self, averaging: AveragingMode) -> Self {
        self.averaging_mode = averaging;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ExecutionParameters::default();
        assert_eq!(options.nshots, 1024);
        assert_eq!(options.relaxation_time, None);
        assert_eq!(options.acquisition_type, AcquisitionType::Integration);
        assert_eq!(options.averaging_mode, AveragingMode::Singleshot);
    }

    #[test]
    fn test_builder() {
        let options = ExecutionParameters::default()
            .with_nshots(4096)
            .with_relaxation_time(50_000)
            .with_acquisition(AcquisitionType::Discrimination)
            .with_averaging(AveragingMode::Cyclic);
        assert_eq!(options.nshots, 4096);
        assert_eq!(options.relaxation_time, Some(50_000));
        assert_eq!(options.acquisition_type, AcquisitionType::Discrimination);
        assert_eq!(options.averaging_mode, AveragingMode::Cyclic);
    }
}
