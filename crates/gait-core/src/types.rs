//! Fundamental types for FSR gait analysis.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Relative tolerance on sample spacing before a signal counts as non-uniform.
pub const DEFAULT_SAMPLING_TOLERANCE: f64 = 0.01;

/// A single force reading (seconds, newtons or sensor-native units)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: f64,
    pub force: f64,
}

impl Sample {
    pub fn new(time: f64, force: f64) -> Self {
        Self { time, force }
    }
}

/// Ordered, non-empty sequence of samples with strictly increasing time.
///
/// A `Signal` is never mutated once built; every processing stage returns a
/// new one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    samples: Vec<Sample>,
}

impl Signal {
    /// Build a signal, rejecting empty input, non-finite values and
    /// timestamps that do not strictly increase.
    pub fn new(samples: Vec<Sample>) -> Result<Self> {
        if samples.is_empty() {
            return Err(Error::InvalidSignal("signal has no samples".into()));
        }

        for (i, s) in samples.iter().enumerate() {
            if !s.time.is_finite() || !s.force.is_finite() {
                return Err(Error::InvalidSignal(format!(
                    "non-finite sample at index {i}"
                )));
            }
        }

        if let Some(i) = samples.windows(2).position(|w| w[1].time <= w[0].time) {
            return Err(Error::InvalidSignal(format!(
                "time does not strictly increase at index {}",
                i + 1
            )));
        }

        Ok(Self { samples })
    }

    /// Build a signal from parallel time and force columns
    pub fn from_columns(time: &[f64], force: &[f64]) -> Result<Self> {
        if time.len() != force.len() {
            return Err(Error::LengthMismatch {
                expected: time.len(),
                actual: force.len(),
            });
        }

        Self::new(
            time.iter()
                .zip(force)
                .map(|(&t, &f)| Sample::new(t, f))
                .collect(),
        )
    }

    /// Same timestamps, new force values. Used by stages that replace the
    /// force channel.
    pub fn with_forces(&self, forces: Vec<f64>) -> Result<Self> {
        if forces.len() != self.samples.len() {
            return Err(Error::LengthMismatch {
                expected: self.samples.len(),
                actual: forces.len(),
            });
        }

        Self::new(
            self.samples
                .iter()
                .zip(forces)
                .map(|(s, f)| Sample::new(s.time, f))
                .collect(),
        )
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn time(&self, index: usize) -> f64 {
        self.samples[index].time
    }

    pub fn force(&self, index: usize) -> f64 {
        self.samples[index].force
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.time).collect()
    }

    pub fn forces(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.force).collect()
    }

    /// Total span covered by the signal (seconds)
    pub fn duration(&self) -> f64 {
        self.samples[self.samples.len() - 1].time - self.samples[0].time
    }

    /// Minimum and maximum force
    pub fn force_range(&self) -> (f64, f64) {
        self.samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
                (lo.min(s.force), hi.max(s.force))
            })
    }

    /// Mean interval between consecutive samples
    pub fn mean_interval(&self) -> Result<f64> {
        if self.samples.len() < 2 {
            return Err(Error::InsufficientData {
                required: 2,
                available: self.samples.len(),
            });
        }

        Ok(self.duration() / (self.samples.len() - 1) as f64)
    }

    /// Estimated sampling rate in Hz (1 / mean interval)
    pub fn sampling_rate(&self) -> Result<f64> {
        Ok(1.0 / self.mean_interval()?)
    }

    /// Check that every interval lies within `tolerance` (relative) of the
    /// mean interval.
    pub fn check_uniform(&self, tolerance: f64) -> Result<()> {
        let mean = self.mean_interval()?;

        let max_deviation = self
            .samples
            .windows(2)
            .map(|w| ((w[1].time - w[0].time) - mean).abs() / mean)
            .fold(0.0, f64::max);

        if max_deviation > tolerance {
            return Err(Error::NonUniformSampling {
                max_deviation,
                tolerance,
            });
        }

        Ok(())
    }
}

/// Discrete derivative of force with respect to time, index-aligned with the
/// signal it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slope(Vec<f64>);

impl Slope {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }
}

impl std::ops::Index<usize> for Slope {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

/// Kind of gait event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GaitEventKind {
    /// Foot contacts the ground, start of stance
    HeelStrike,
    /// Foot leaves the ground, start of swing
    ToeOff,
}

impl std::fmt::Display for GaitEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GaitEventKind::HeelStrike => write!(f, "heel strike"),
            GaitEventKind::ToeOff => write!(f, "toe-off"),
        }
    }
}

/// A detected gait event on a specific signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaitEvent {
    /// Index into the source signal
    pub index: usize,
    pub time: f64,
    pub kind: GaitEventKind,
}

impl GaitEvent {
    pub fn new(index: usize, time: f64, kind: GaitEventKind) -> Self {
        Self { index, time, kind }
    }
}

/// One heel strike paired with the toe-off that ends its stance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StanceCycle {
    pub heel_strike: GaitEvent,
    pub toe_off: GaitEvent,
}

impl StanceCycle {
    pub fn stance_duration(&self) -> f64 {
        self.toe_off.time - self.heel_strike.time
    }
}

/// Smoothing filter selection and parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterConfig {
    /// Centered moving average, window shrinks at the edges
    MovingAverage { window_size: usize },

    /// Zero-phase Butterworth low-pass
    Butterworth {
        order: usize,
        cutoff_hz: f64,
        sample_rate_hz: f64,
    },
}

impl FilterConfig {
    /// Butterworth configuration with the sample rate estimated from `signal`
    pub fn butterworth_for(signal: &Signal, order: usize, cutoff_hz: f64) -> Result<Self> {
        Ok(FilterConfig::Butterworth {
            order,
            cutoff_hz,
            sample_rate_hz: signal.sampling_rate()?,
        })
    }

    /// Parameter checks that do not depend on the signal
    pub fn validate(&self) -> Result<()> {
        match *self {
            FilterConfig::MovingAverage { window_size } => {
                if window_size < 1 {
                    return Err(Error::InvalidConfig(
                        "moving average window must be at least 1".into(),
                    ));
                }
            }
            FilterConfig::Butterworth {
                order,
                cutoff_hz,
                sample_rate_hz,
            } => {
                if order < 1 {
                    return Err(Error::InvalidConfig(
                        "Butterworth order must be at least 1".into(),
                    ));
                }
                if !(sample_rate_hz.is_finite() && sample_rate_hz > 0.0) {
                    return Err(Error::InvalidConfig(format!(
                        "sample rate must be positive, got {sample_rate_hz}"
                    )));
                }
                if !(cutoff_hz.is_finite() && cutoff_hz > 0.0) {
                    return Err(Error::InvalidConfig(format!(
                        "cutoff must be positive, got {cutoff_hz}"
                    )));
                }
                let nyquist = sample_rate_hz / 2.0;
                if cutoff_hz >= nyquist {
                    return Err(Error::InvalidConfig(format!(
                        "cutoff {cutoff_hz} Hz must be below Nyquist ({nyquist} Hz)"
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Thresholds for the stance/swing state machine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Upward crossing of this force starts stance
    pub force_on_threshold: f64,
    /// Downward crossing of this force starts swing
    pub force_off_threshold: f64,
    /// Slope at a heel strike must exceed this (force units per second)
    pub min_rising_slope: f64,
    /// Minimum time between two accepted transitions (seconds)
    pub min_phase_duration: f64,
}

impl DetectionConfig {
    /// Parameter checks that do not depend on the signal
    pub fn validate(&self) -> Result<()> {
        let finite = [
            self.force_on_threshold,
            self.force_off_threshold,
            self.min_rising_slope,
            self.min_phase_duration,
        ]
        .iter()
        .all(|v| v.is_finite());

        if !finite {
            return Err(Error::InvalidConfig(
                "detection parameters must be finite".into(),
            ));
        }

        if self.min_phase_duration < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "minimum phase duration must be non-negative, got {}",
                self.min_phase_duration
            )));
        }

        if self.force_off_threshold > self.force_on_threshold {
            return Err(Error::InvalidThresholds(format!(
                "force-off threshold {} exceeds force-on threshold {}",
                self.force_off_threshold, self.force_on_threshold
            )));
        }

        Ok(())
    }
}

fn default_sampling_tolerance() -> f64 {
    DEFAULT_SAMPLING_TOLERANCE
}

/// Complete configuration surface of one analysis run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub filter: FilterConfig,
    pub detection: DetectionConfig,

    /// Relative interval tolerance for the uniform-sampling check
    #[serde(default = "default_sampling_tolerance")]
    pub sampling_tolerance: f64,
}

impl AnalysisConfig {
    pub fn new(filter: FilterConfig, detection: DetectionConfig) -> Self {
        Self {
            filter,
            detection,
            sampling_tolerance: DEFAULT_SAMPLING_TOLERANCE,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.filter.validate()?;
        self.detection.validate()?;

        if !(self.sampling_tolerance.is_finite() && self.sampling_tolerance >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "sampling tolerance must be non-negative, got {}",
                self.sampling_tolerance
            )));
        }

        Ok(())
    }
}
