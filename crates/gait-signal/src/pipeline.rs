//! End-to-end gait analysis pipeline.
//!
//! Runs the stages in a fixed order: smoothing, slope of the smoothed force,
//! event detection. The slope is never taken from the raw signal.

use serde::Serialize;
use tracing::{debug, info};

use gait_core::{
    AnalysisConfig, DetectionConfig, FilterConfig, GaitEvent, GaitEventKind, Result, Signal,
    Slope, StanceCycle,
};

use crate::derivative;
use crate::detection::{detect_peak_slope, EventDetector, PeakSlopeEvents};
use crate::filtering;

/// Everything produced by one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub filtered: Signal,
    pub slope: Slope,
    pub events: Vec<GaitEvent>,
}

impl PipelineOutput {
    /// Heel strikes paired with the toe-off that follows them.
    ///
    /// A heel strike without a following toe-off (recording ends in stance)
    /// does not form a cycle.
    pub fn cycles(&self) -> Vec<StanceCycle> {
        let mut cycles = Vec::new();
        let mut pending: Option<GaitEvent> = None;

        for event in &self.events {
            match event.kind {
                GaitEventKind::HeelStrike => pending = Some(*event),
                GaitEventKind::ToeOff => {
                    if let Some(heel_strike) = pending.take() {
                        cycles.push(StanceCycle {
                            heel_strike,
                            toe_off: *event,
                        });
                    }
                }
            }
        }

        cycles
    }

    /// Steepest rise and fall of the filtered force
    pub fn peak_slope(&self) -> Result<PeakSlopeEvents> {
        detect_peak_slope(&self.filtered, &self.slope)
    }

    pub fn count(&self, kind: GaitEventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }
}

/// Filter, differentiate and detect in one call
#[derive(Debug, Clone)]
pub struct GaitPipeline {
    config: AnalysisConfig,
    detector: EventDetector,
}

impl GaitPipeline {
    /// Validate the whole configuration up front
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let detector = EventDetector::from_validated(config.detection);

        Ok(Self { config, detector })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Process a complete recording. The first failing stage aborts the run.
    pub fn run(&self, raw: &Signal) -> Result<PipelineOutput> {
        debug!(samples = raw.len(), filter = ?self.config.filter, "Starting gait pipeline");

        let filtered =
            filtering::apply_with_tolerance(raw, &self.config.filter, self.config.sampling_tolerance)?;
        let slope = derivative::slope(&filtered)?;
        let events = self.detector.detect(&filtered, &slope)?;

        let output = PipelineOutput {
            filtered,
            slope,
            events,
        };

        info!(
            samples = raw.len(),
            heel_strikes = output.count(GaitEventKind::HeelStrike),
            toe_offs = output.count(GaitEventKind::ToeOff),
            "Gait analysis complete"
        );

        Ok(output)
    }
}

/// One-shot convenience wrapper around [`GaitPipeline`]
pub fn run(
    raw: &Signal,
    filter: &FilterConfig,
    detection: &DetectionConfig,
) -> Result<PipelineOutput> {
    GaitPipeline::new(AnalysisConfig::new(*filter, *detection))?.run(raw)
}
