//! Analysis settings.
//!
//! Settings come from defaults, an optional file and `GAIT_` environment
//! variables (nested keys separated by `__`, e.g. `GAIT_FILTER__CUTOFF_HZ`).

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use gait_core::{AnalysisConfig, DetectionConfig, FilterConfig, Signal, DEFAULT_SAMPLING_TOLERANCE};

/// Complete analysis configuration as loaded from file/environment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Smoothing filter
    pub filter: FilterSettings,

    /// Event detection thresholds
    pub detection: DetectionSettings,

    /// Relative tolerance on sample spacing
    pub sampling_tolerance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    MovingAverage,
    Butterworth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub kind: FilterKind,

    /// Moving average window (samples)
    pub window_size: usize,

    /// Butterworth order
    pub order: usize,

    /// Butterworth cutoff (Hz)
    pub cutoff_hz: f64,

    /// Sampling rate (Hz); estimated from the recording when absent
    pub sample_rate_hz: Option<f64>,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            kind: FilterKind::Butterworth,
            window_size: 3,
            order: 4,
            cutoff_hz: 8.0,
            sample_rate_hz: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionSettings {
    pub force_on_threshold: f64,
    pub force_off_threshold: f64,

    /// Minimum slope at heel strike (force units per second)
    pub min_rising_slope: f64,

    /// Minimum stance/swing duration (seconds)
    pub min_phase_duration: f64,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            force_on_threshold: 20.0,
            force_off_threshold: 10.0,
            min_rising_slope: 0.0,
            min_phase_duration: 0.1,
        }
    }
}

impl From<DetectionSettings> for DetectionConfig {
    fn from(settings: DetectionSettings) -> Self {
        DetectionConfig {
            force_on_threshold: settings.force_on_threshold,
            force_off_threshold: settings.force_off_threshold,
            min_rising_slope: settings.min_rising_slope,
            min_phase_duration: settings.min_phase_duration,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            filter: FilterSettings::default(),
            detection: DetectionSettings::default(),
            sampling_tolerance: DEFAULT_SAMPLING_TOLERANCE,
        }
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("GAIT")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl Settings {
    /// Load configuration from file
    pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(environment())
            .build()?;

        settings.try_deserialize()
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(environment())
            .build()?;

        settings.try_deserialize()
    }

    /// Filter configuration for `signal`, estimating the sample rate from it
    /// when none was configured
    pub fn filter_config(&self, signal: &Signal) -> gait_core::Result<FilterConfig> {
        Ok(match self.filter.kind {
            FilterKind::MovingAverage => FilterConfig::MovingAverage {
                window_size: self.filter.window_size,
            },
            FilterKind::Butterworth => match self.filter.sample_rate_hz {
                Some(sample_rate_hz) => FilterConfig::Butterworth {
                    order: self.filter.order,
                    cutoff_hz: self.filter.cutoff_hz,
                    sample_rate_hz,
                },
                None => FilterConfig::butterworth_for(signal, self.filter.order, self.filter.cutoff_hz)?,
            },
        })
    }

    pub fn analysis_config(&self, signal: &Signal) -> gait_core::Result<AnalysisConfig> {
        Ok(AnalysisConfig {
            filter: self.filter_config(signal)?,
            detection: self.detection.into(),
            sampling_tolerance: self.sampling_tolerance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal_at(rate: f64) -> Signal {
        let time: Vec<f64> = (0..10).map(|i| i as f64 / rate).collect();
        Signal::from_columns(&time, &[0.0; 10]).unwrap()
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.filter.kind, FilterKind::Butterworth);
        assert_eq!(settings.filter.order, 4);
        assert!((settings.filter.cutoff_hz - 8.0).abs() < f64::EPSILON);
        assert!(DetectionConfig::from(settings.detection).validate().is_ok());
    }

    #[test]
    fn test_sample_rate_estimated_from_signal() {
        let settings = Settings::default();
        let config = settings.filter_config(&signal_at(250.0)).unwrap();

        match config {
            FilterConfig::Butterworth { sample_rate_hz, .. } => {
                assert!((sample_rate_hz - 250.0).abs() < 1e-9)
            }
            other => panic!("unexpected filter {other:?}"),
        }
    }

    #[test]
    fn test_explicit_sample_rate_kept() {
        let mut settings = Settings::default();
        settings.filter.sample_rate_hz = Some(100.0);

        let config = settings.filter_config(&signal_at(250.0)).unwrap();
        assert!(matches!(
            config,
            FilterConfig::Butterworth { sample_rate_hz, .. } if sample_rate_hz == 100.0
        ));
    }

    #[test]
    fn test_moving_average_selection() {
        let mut settings = Settings::default();
        settings.filter.kind = FilterKind::MovingAverage;
        settings.filter.window_size = 7;

        let config = settings.filter_config(&signal_at(100.0)).unwrap();
        assert_eq!(config, FilterConfig::MovingAverage { window_size: 7 });
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"filter":{"kind":"moving_average","window_size":5}}"#).unwrap();

        assert_eq!(settings.filter.kind, FilterKind::MovingAverage);
        assert_eq!(settings.filter.window_size, 5);
        assert_eq!(settings.filter.order, 4);
        assert!((settings.sampling_tolerance - DEFAULT_SAMPLING_TOLERANCE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_detection_uses_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"detection":{"force_on_threshold":25.0}}"#).unwrap();

        assert!((settings.detection.force_on_threshold - 25.0).abs() < f64::EPSILON);
        assert!((settings.detection.force_off_threshold - 10.0).abs() < f64::EPSILON);
        assert!((settings.detection.min_phase_duration - 0.1).abs() < f64::EPSILON);
        assert_eq!(settings.filter.kind, FilterKind::Butterworth);
    }

    #[test]
    fn test_partial_detection_from_config_source() {
        let settings: Settings = config::Config::builder()
            .add_source(config::File::from_str(
                "[detection]\nmin_rising_slope = 250.0\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        let detection = DetectionConfig::from(settings.detection);
        assert!((detection.min_rising_slope - 250.0).abs() < f64::EPSILON);
        assert!((detection.force_on_threshold - 20.0).abs() < f64::EPSILON);
    }
}
