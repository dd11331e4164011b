//! Smoothing filters for the force channel.
//!
//! Two interchangeable strategies, selected by [`FilterConfig`]:
//!
//! - **Moving average**: centered window of `window_size` samples that
//!   shrinks at the signal edges instead of padding.
//! - **Butterworth low-pass**: digital design via the bilinear transform,
//!   held as second-order sections and applied forward and backward so the
//!   output has zero phase shift.

use nalgebra::{Matrix2, Vector2};
use num_complex::Complex;
use tracing::{debug, warn};

use gait_core::{Error, FilterConfig, Result, Signal, DEFAULT_SAMPLING_TOLERANCE};

/// Centered moving average with edge-shrinking window
#[derive(Debug, Clone, Copy)]
pub struct MovingAverageFilter {
    window_size: usize,
}

impl MovingAverageFilter {
    pub fn new(window_size: usize) -> Result<Self> {
        if window_size < 1 {
            return Err(Error::InvalidConfig(
                "moving average window must be at least 1".into(),
            ));
        }

        Ok(Self { window_size })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Smooth a force sequence.
    ///
    /// Output index `i` averages `[i - (w-1)/2, i + w/2]`, clipped to the
    /// available samples.
    pub fn filter_signal(&self, signal: &[f64]) -> Vec<f64> {
        let before = (self.window_size - 1) / 2;
        let after = self.window_size / 2;
        let last = signal.len().saturating_sub(1);

        (0..signal.len())
            .map(|i| {
                let window = &signal[i.saturating_sub(before)..=(i + after).min(last)];
                window.iter().sum::<f64>() / window.len() as f64
            })
            .collect()
    }
}

/// One second-order section, `a[0] == 1`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b: [f64; 3],
    pub a: [f64; 3],
}

impl Biquad {
    /// Section with the numerator scaled to unit gain at DC
    fn normalized(b: [f64; 3], a: [f64; 3]) -> Self {
        let k = a.iter().sum::<f64>() / b.iter().sum::<f64>();
        Self {
            b: b.map(|c| c * k),
            a,
        }
    }

    pub fn dc_gain(&self) -> f64 {
        self.b.iter().sum::<f64>() / self.a.iter().sum::<f64>()
    }

    /// Single causal pass (direct form II transposed) starting from state `zi`
    pub fn filter(&self, signal: &[f64], zi: [f64; 2]) -> Vec<f64> {
        let [b0, b1, b2] = self.b;
        let [_, a1, a2] = self.a;
        let mut z = zi;

        signal
            .iter()
            .map(|&x| {
                let y = b0 * x + z[0];
                z[0] = b1 * x - a1 * y + z[1];
                z[1] = b2 * x - a2 * y;
                y
            })
            .collect()
    }

    /// Section state for a unit step in steady state
    pub fn steady_state(&self) -> Result<[f64; 2]> {
        let [b0, b1, b2] = self.b;
        let [_, a1, a2] = self.a;

        // I - companion(a)^T
        let system = Matrix2::new(1.0 + a1, -1.0, a2, 1.0);
        let rhs = Vector2::new(b1 - a1 * b0, b2 - a2 * b0);

        system
            .lu()
            .solve(&rhs)
            .map(|zi| [zi[0], zi[1]])
            .ok_or_else(|| Error::InvalidConfig("Butterworth section has a pole at DC".into()))
    }
}

/// Butterworth low-pass filter as a cascade of second-order sections
#[derive(Debug, Clone)]
pub struct ButterworthFilter {
    order: usize,
    cutoff_hz: f64,
    sample_rate_hz: f64,
    sections: Vec<Biquad>,
}

impl ButterworthFilter {
    /// Design a low-pass filter
    ///
    /// # Arguments
    /// * `order` - Filter order (at least 1)
    /// * `cutoff_hz` - Cutoff frequency in Hz, below Nyquist
    /// * `sample_rate_hz` - Sampling rate in Hz
    pub fn new(order: usize, cutoff_hz: f64, sample_rate_hz: f64) -> Result<Self> {
        FilterConfig::Butterworth {
            order,
            cutoff_hz,
            sample_rate_hz,
        }
        .validate()?;

        let nyquist = sample_rate_hz / 2.0;
        if cutoff_hz > 0.9 * nyquist {
            warn!(cutoff_hz, nyquist, "Butterworth cutoff is close to Nyquist");
        }

        // Pre-warp with the sample rate normalised to 2, so the bilinear
        // transform uses 2 * fs = 4.
        let normalized = cutoff_hz / nyquist;
        let warped = 4.0 * (std::f64::consts::PI * normalized / 2.0).tan();

        let poles: Vec<Complex<f64>> = Self::analog_prototype(order)
            .into_iter()
            .map(|p| p * warped)
            .map(|p| (4.0 + p) / (4.0 - p))
            .collect();

        // Poles k and order-1-k are conjugates; each pair gets a double zero
        // at z = -1. An odd order leaves the real pole in the middle.
        let mut sections = Vec::with_capacity(order.div_ceil(2));
        for p in &poles[..order / 2] {
            sections.push(Biquad::normalized(
                [1.0, 2.0, 1.0],
                [1.0, -2.0 * p.re, p.norm_sqr()],
            ));
        }
        if order % 2 == 1 {
            let p = poles[order / 2].re;
            sections.push(Biquad::normalized([1.0, 1.0, 0.0], [1.0, -p, 0.0]));
        }

        Ok(Self {
            order,
            cutoff_hz,
            sample_rate_hz,
            sections,
        })
    }

    /// Poles of the unit-cutoff analog Butterworth prototype
    fn analog_prototype(order: usize) -> Vec<Complex<f64>> {
        let n = order as f64;
        (0..order)
            .map(|k| {
                let m = -(n - 1.0) + 2.0 * k as f64;
                -Complex::from_polar(1.0, std::f64::consts::PI * m / (2.0 * n))
            })
            .collect()
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn cutoff_hz(&self) -> f64 {
        self.cutoff_hz
    }

    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }

    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    /// Samples of odd extension added at each end by [`Self::filter_signal`].
    /// The input must be strictly longer.
    pub fn padding(&self) -> usize {
        3 * (self.order + 1)
    }

    /// Per-section state for a unit step in steady state.
    ///
    /// Scaling it by the first input value starts the cascade as if that
    /// value had been present forever, which removes the start-up transient.
    pub fn steady_state(&self) -> Result<Vec<[f64; 2]>> {
        let mut gain = 1.0;
        self.sections
            .iter()
            .map(|section| -> Result<[f64; 2]> {
                let zi = section.steady_state()?.map(|z| z * gain);
                gain *= section.dc_gain();
                Ok(zi)
            })
            .collect()
    }

    /// Causal pass through every section, each starting from `zi` scaled by
    /// the first input value
    fn cascade(&self, signal: &[f64], zi: &[[f64; 2]]) -> Vec<f64> {
        let x0 = signal.first().copied().unwrap_or(0.0);
        self.sections
            .iter()
            .zip(zi)
            .fold(signal.to_vec(), |x, (section, z)| {
                section.filter(&x, z.map(|v| v * x0))
            })
    }

    /// Zero-phase filtering: forward pass, then backward pass over the
    /// reversed output.
    ///
    /// The input is extended at both ends by [`Self::padding`] samples of
    /// odd reflection, so it must be longer than that.
    pub fn filter_signal(&self, signal: &[f64]) -> Result<Vec<f64>> {
        let len = signal.len();
        let edge = self.padding();
        if len <= edge {
            return Err(Error::InsufficientData {
                required: edge + 1,
                available: len,
            });
        }

        let zi = self.steady_state()?;
        let first = signal[0];
        let last = signal[len - 1];

        let mut extended = Vec::with_capacity(len + 2 * edge);
        extended.extend((1..=edge).rev().map(|i| 2.0 * first - signal[i]));
        extended.extend_from_slice(signal);
        extended.extend((1..=edge).map(|i| 2.0 * last - signal[len - 1 - i]));

        let forward = self.cascade(&extended, &zi);

        let reversed: Vec<f64> = forward.into_iter().rev().collect();
        let backward = self.cascade(&reversed, &zi);
        let output: Vec<f64> = backward.into_iter().rev().collect();

        Ok(output[edge..edge + len].to_vec())
    }
}

/// Smooth `signal` with the configured filter.
///
/// Returns a new signal with the same timestamps. Butterworth requires
/// uniform sampling within [`DEFAULT_SAMPLING_TOLERANCE`].
pub fn apply(signal: &Signal, config: &FilterConfig) -> Result<Signal> {
    apply_with_tolerance(signal, config, DEFAULT_SAMPLING_TOLERANCE)
}

/// [`apply`] with an explicit relative tolerance for the uniform-sampling check
pub fn apply_with_tolerance(
    signal: &Signal,
    config: &FilterConfig,
    sampling_tolerance: f64,
) -> Result<Signal> {
    config.validate()?;

    let forces = signal.forces();

    let smoothed = match *config {
        FilterConfig::MovingAverage { window_size } => {
            if window_size > signal.len() {
                return Err(Error::InvalidConfig(format!(
                    "moving average window {} exceeds signal length {}",
                    window_size,
                    signal.len()
                )));
            }

            debug!(window_size, samples = signal.len(), "Applying moving average");
            MovingAverageFilter::new(window_size)?.filter_signal(&forces)
        }
        FilterConfig::Butterworth {
            order,
            cutoff_hz,
            sample_rate_hz,
        } => {
            signal.check_uniform(sampling_tolerance)?;

            let measured = signal.sampling_rate()?;
            let mismatch = (measured - sample_rate_hz).abs() / measured;
            if mismatch > sampling_tolerance.max(1e-6) {
                return Err(Error::InvalidConfig(format!(
                    "configured sample rate {sample_rate_hz} Hz does not match signal rate {measured:.3} Hz"
                )));
            }

            debug!(
                order,
                cutoff_hz,
                sample_rate_hz,
                samples = signal.len(),
                "Applying zero-phase Butterworth low-pass"
            );
            ButterworthFilter::new(order, cutoff_hz, sample_rate_hz)?.filter_signal(&forces)?
        }
    };

    signal.with_forces(smoothed)
}
