//! `gait analyze` subcommand.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use gait_core::{FilterConfig, GaitEvent, StanceCycle};
use gait_signal::{GaitPipeline, PeakSlopeEvents};

use crate::config::{FilterKind, Settings};
use crate::recording::load_recording;

/// Arguments for the analyze command
#[derive(Args, Debug, Default)]
pub struct AnalyzeArgs {
    /// CSV recording with `time` and `force` columns
    pub input: PathBuf,

    /// Settings file (TOML, YAML or JSON)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Smoothing filter
    #[arg(short, long, value_enum)]
    pub filter: Option<FilterKind>,

    /// Moving average window (samples)
    #[arg(long)]
    pub window: Option<usize>,

    /// Butterworth order
    #[arg(long)]
    pub order: Option<usize>,

    /// Butterworth cutoff frequency (Hz)
    #[arg(long)]
    pub cutoff: Option<f64>,

    /// Force threshold that starts stance
    #[arg(long = "on")]
    pub force_on: Option<f64>,

    /// Force threshold that starts swing
    #[arg(long = "off")]
    pub force_off: Option<f64>,

    /// Minimum slope at heel strike (force units per second)
    #[arg(long)]
    pub min_slope: Option<f64>,

    /// Minimum stance/swing duration (seconds)
    #[arg(long)]
    pub min_phase: Option<f64>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl AnalyzeArgs {
    /// Command-line values take precedence over file and environment
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(kind) = self.filter {
            settings.filter.kind = kind;
        }
        if let Some(window) = self.window {
            settings.filter.window_size = window;
        }
        if let Some(order) = self.order {
            settings.filter.order = order;
        }
        if let Some(cutoff) = self.cutoff {
            settings.filter.cutoff_hz = cutoff;
        }
        if let Some(on) = self.force_on {
            settings.detection.force_on_threshold = on;
        }
        if let Some(off) = self.force_off {
            settings.detection.force_off_threshold = off;
        }
        if let Some(slope) = self.min_slope {
            settings.detection.min_rising_slope = slope;
        }
        if let Some(duration) = self.min_phase {
            settings.detection.min_phase_duration = duration;
        }
    }
}

/// Summary of one analysed recording
#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub samples: usize,
    pub sampling_rate_hz: f64,
    pub filter: FilterConfig,
    pub peak_slope: PeakSlopeEvents,
    pub events: Vec<GaitEvent>,
    pub cycles: Vec<StanceCycle>,
}

impl AnalysisReport {
    fn print(&self) {
        println!("Samples:                 {}", self.samples);
        println!("Estimated sampling rate: {:.2} Hz", self.sampling_rate_hz);
        println!("Filter:                  {:?}", self.filter);
        println!(
            "Heel strike (peak slope): t = {:.3} s (index {})",
            self.peak_slope.heel_strike.time, self.peak_slope.heel_strike.index
        );
        println!(
            "Toe-off (peak slope):     t = {:.3} s (index {})",
            self.peak_slope.toe_off.time, self.peak_slope.toe_off.index
        );

        println!();
        println!("Events ({}):", self.events.len());
        for event in &self.events {
            println!("  {:>8.3} s  #{:<6}  {}", event.time, event.index, event.kind);
        }

        if !self.cycles.is_empty() {
            println!();
            println!("Stance phases ({}):", self.cycles.len());
            for cycle in &self.cycles {
                println!(
                    "  {:>8.3} s -> {:>8.3} s  ({:.3} s)",
                    cycle.heel_strike.time,
                    cycle.toe_off.time,
                    cycle.stance_duration()
                );
            }
        }
    }
}

/// Execute the analyze command
pub fn execute(args: AnalyzeArgs) -> Result<()> {
    let mut settings = match &args.config {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("Failed to load settings from {path}"))?,
        None => Settings::from_env().context("Failed to load settings from environment")?,
    };
    args.apply_to(&mut settings);

    let raw = load_recording(&args.input)?;
    let report = analyze(&raw, &settings)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.print();
    }

    Ok(())
}

/// Run the pipeline over a loaded recording
pub fn analyze(raw: &gait_core::Signal, settings: &Settings) -> Result<AnalysisReport> {
    let sampling_rate_hz = raw.sampling_rate()?;
    let config = settings.analysis_config(raw)?;

    let output = GaitPipeline::new(config)?
        .run(raw)
        .context("Gait analysis failed")?;

    Ok(AnalysisReport {
        samples: raw.len(),
        sampling_rate_hz,
        filter: config.filter,
        peak_slope: output.peak_slope()?,
        cycles: output.cycles(),
        events: output.events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gait_core::{GaitEventKind, Signal};

    fn recording() -> Signal {
        let time: Vec<f64> = (0..300).map(|i| i as f64 * 0.01).collect();
        let force: Vec<f64> = (0..300)
            .map(|i| if (10..65).contains(&(i % 100)) { 80.0 } else { 0.0 })
            .collect();
        Signal::from_columns(&time, &force).unwrap()
    }

    #[test]
    fn test_args_override_settings() {
        let mut settings = Settings::default();
        let args = AnalyzeArgs {
            filter: Some(FilterKind::MovingAverage),
            window: Some(5),
            force_on: Some(40.0),
            min_phase: Some(0.25),
            ..Default::default()
        };

        args.apply_to(&mut settings);

        assert_eq!(settings.filter.kind, FilterKind::MovingAverage);
        assert_eq!(settings.filter.window_size, 5);
        assert!((settings.detection.force_on_threshold - 40.0).abs() < f64::EPSILON);
        assert!((settings.detection.min_phase_duration - 0.25).abs() < f64::EPSILON);
        assert_eq!(settings.filter.order, 4);
    }

    #[test]
    fn test_analyze_default_settings() {
        let report = analyze(&recording(), &Settings::default()).unwrap();

        assert_eq!(report.samples, 300);
        assert!((report.sampling_rate_hz - 100.0).abs() < 1e-6);
        assert_eq!(report.cycles.len(), 3);
        assert_eq!(
            report
                .events
                .iter()
                .filter(|e| e.kind == GaitEventKind::HeelStrike)
                .count(),
            3
        );
    }

    #[test]
    fn test_analyze_reports_threshold_errors() {
        let mut settings = Settings::default();
        settings.detection.force_on_threshold = 500.0;

        let err = analyze(&recording(), &settings).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<gait_core::Error>(),
            Some(gait_core::Error::InvalidThresholds(_))
        ));
    }
}
