//! Pulse envelope shapes.

use serde::{Deserialize, Serialize};

use crate::error::{PulseError, PulseResult};

/// Sampled in-phase/quadrature envelope of a pulse, one sample per ns.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// In-phase component.
    pub i: Vec<f64>,
    /// Quadrature component.
    pub q: Vec<f64>,
}

/// Envelope shape of a pulse.
///
/// `rel_sigma` is the ratio duration/σ, following the runcard convention
/// (`Gaussian(5)` means σ = duration / 5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    /// Constant amplitude over the full duration.
    Rectangular,
    /// Gaussian envelope.
    Gaussian {
        /// duration/σ ratio.
        rel_sigma: f64,
    },
    /// Gaussian rise and fall around a flat top.
    GaussianSquare {
        /// duration/σ ratio of the rise/fall.
        rel_sigma: f64,
        /// Fraction of the duration that is flat, in (0, 1].
        width: f64,
    },
    /// Derivative-removal-by-adiabatic-gate envelope: Gaussian in-phase,
    /// scaled Gaussian derivative in quadrature.
    Drag {
        /// duration/σ ratio.
        rel_sigma: f64,
        /// Derivative scaling coefficient.
        beta: f64,
    },
    /// Arbitrary sampled in-phase envelope, quadrature zero.
    Sampled {
        /// One sample per ns.
        samples: Vec<f64>,
    },
}

impl Shape {
    /// Sample the envelope at 1 GS/s for a pulse of `duration` ns.
    pub fn envelope(&self, duration: u64) -> PulseResult<Envelope> {
        let n = duration as usize;
        match self {
            Shape::Rectangular => Ok(Envelope {
                i: vec![1.0; n],
                q: vec![0.0; n],
            }),
            Shape::Gaussian { rel_sigma } => {
                let i = gaussian_samples(n, *rel_sigma);
                Ok(Envelope { i, q: vec![0.0; n] })
            }
            Shape::GaussianSquare { rel_sigma, width } => {
                let flat = ((n as f64) * width).round() as usize;
                let ramp = n.saturating_sub(flat);
                let rise = ramp / 2;
                // Gaussian edges sampled from a full gaussian of the ramp length
                let edges = gaussian_samples(ramp.max(1), *rel_sigma);
                let mut i = Vec::with_capacity(n);
                i.extend_from_slice(&edges[..rise.min(edges.len())]);
                i.extend(std::iter::repeat(1.0).take(n - ramp));
                i.extend_from_slice(&edges[rise.min(edges.len())..]);
                i.truncate(n);
                while i.len() < n {
                    i.push(0.0);
                }
                Ok(Envelope { i, q: vec![0.0; n] })
            }
            Shape::Drag { rel_sigma, beta } => {
                let i = gaussian_samples(n, *rel_sigma);
                let sigma = n as f64 / rel_sigma;
                let mid = (n as f64 - 1.0) / 2.0;
                let q = i
                    .iter()
                    .enumerate()
                    .map(|(t, g)| beta * (-(t as f64 - mid) / (sigma * sigma)) * g)
                    .collect();
                Ok(Envelope { i, q })
            }
            Shape::Sampled { samples } => {
                if samples.len() < n {
                    return Err(PulseError::EnvelopeTooShort {
                        samples: samples.len(),
                        duration,
                    });
                }
                Ok(Envelope {
                    i: samples[..n].to_vec(),
                    q: vec![0.0; n],
                })
            }
        }
    }

    /// Short name of the shape variant.
    pub fn name(&self) -> &'static str {
        match self {
            Shape::Rectangular => "rectangular",
            Shape::Gaussian { .. } => "gaussian",
            Shape::GaussianSquare { .. } => "gaussian_square",
            Shape::Drag { .. } => "drag",
            Shape::Sampled { .. } => "sampled",
        }
    }
}

fn gaussian_samples(n: usize, rel_sigma: f64) -> Vec<f64> {
    let sigma = n as f64 / rel_sigma;
    let mid = (n as f64 - 1.0) / 2.0;
    (0..n)
        .map(|t| {
            let x = (t as f64 - mid) / sigma;
            (-0.5 * x * x).exp()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangular_envelope() {
        let env = Shape::Rectangular.envelope(4).unwrap();
        assert_eq!(env.i, vec![1.0; 4]);
        assert_eq!(env.q, vec![0.0; 4]);
    }

    #[test]
    fn test_gaussian_peaks_in_middle() {
        let env = Shape::Gaussian { rel_sigma: 5.0 }.envelope(41).unwrap();
        let peak = env
            .i
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap()
            .0;
        assert_eq!(peak, 20);
        assert!(env.i[0] < env.i[20]);
    }

    #[test]
    fn test_drag_quadrature_antisymmetric() {
        let env = Shape::Drag {
            rel_sigma: 5.0,
            beta: 0.4,
        }
        .envelope(40)
        .unwrap();
        // derivative term changes sign across the middle
        assert!(env.q[5] > 0.0);
        assert!(env.q[34] < 0.0);
    }

    #[test]
    fn test_sampled_too_short() {
        let shape = Shape::Sampled {
            samples: vec![0.5; 3],
        };
        assert!(matches!(
            shape.envelope(8),
            Err(PulseError::EnvelopeTooShort { .. })
        ));
    }
}
