//! Raw-trace decoding: demodulation, integration, discrimination.

use num_complex::Complex64;
use std::f64::consts::TAU;

use crate::error::{ResultError, ResultResult};

/// Sampling period of the digitizer traces, in seconds (1 GS/s).
const SAMPLE_PERIOD: f64 = 1e-9;

/// Demodulate a raw I/Q trace at `frequency` and integrate it into a single
/// I/Q point.
///
/// The trace is mean-subtracted, rotated sample by sample at the
/// intermediate frequency, summed and normalized by the window length.
pub fn demodulate_and_integrate(
    trace_i: &[f64],
    trace_q: &[f64],
    frequency: f64,
) -> ResultResult<(f64, f64)> {
    if trace_i.len() != trace_q.len() {
        return Err(ResultError::LengthMismatch {
            i: trace_i.len(),
            q: trace_q.len(),
        });
    }
    let n = trace_i.len();
    if n == 0 {
        return Ok((0.0, 0.0));
    }
    let mean_i = trace_i.iter().sum::<f64>() / n as f64;
    let mean_q = trace_q.iter().sum::<f64>() / n as f64;

    let mut acc = Complex64::new(0.0, 0.0);
    for (t, (i, q)) in trace_i.iter().zip(trace_q).enumerate() {
        let z = Complex64::new(i - mean_i, q - mean_q);
        let rotor = Complex64::from_polar(2.0, TAU * frequency * (t as f64) * SAMPLE_PERIOD);
        acc += rotor * z;
    }
    acc /= n as f64;
    Ok((acc.re, acc.im))
}

/// Classify an integrated I/Q point into {0, 1}.
///
/// The point is rotated by the calibrated `iq_angle` so the two state blobs
/// separate along the in-phase axis; state 1 when the rotated in-phase
/// component exceeds `threshold`.
pub fn classify(i: f64, q: f64, iq_angle: f64, threshold: f64) -> u8 {
    let rotated = Complex64::new(i, q) * Complex64::from_polar(1.0, iq_angle);
    u8::from(rotated.re > threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_checked() {
        let result = demodulate_and_integrate(&[1.0, 2.0], &[1.0], 10e6);
        assert!(matches!(result, Err(ResultError::LengthMismatch { .. })));
    }

    #[test]
    fn test_dc_trace_integrates_to_zero() {
        // constant trace is removed by the mean subtraction
        let trace = vec![0.7; 128];
        let (i, q) = demodulate_and_integrate(&trace, &trace, 50e6).unwrap();
        assert!(i.abs() < 1e-9);
        assert!(q.abs() < 1e-9);
    }

    #[test]
    fn test_tone_at_if_recovers_amplitude() {
        // a pure tone at the demodulation frequency lands on the real axis
        let frequency = 100e6;
        let n = 1000; // a whole number of 10 ns periods
        let mut trace_i = Vec::with_capacity(n);
        let mut trace_q = Vec::with_capacity(n);
        for t in 0..n {
            let phase = TAU * frequency * (t as f64) * SAMPLE_PERIOD;
            trace_i.push(0.5 * phase.cos());
            trace_q.push(-0.5 * phase.sin());
        }
        let (i, q) = demodulate_and_integrate(&trace_i, &trace_q, frequency).unwrap();
        assert!((i - 1.0).abs() < 1e-9, "i = {i}");
        assert!(q.abs() < 1e-9, "q = {q}");
    }

    #[test]
    fn test_classify_threshold() {
        assert_eq!(classify(1.0, 0.0, 0.0, 0.5), 1);
        assert_eq!(classify(0.2, 0.0, 0.0, 0.5), 0);
        // rotation brings the excited blob onto the +i axis
        assert_eq!(classify(0.0, 1.0, -std::f64::consts::FRAC_PI_2, 0.5), 1);
    }
}
