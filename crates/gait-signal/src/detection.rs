//! Gait event detection.
//!
//! The main detector is a two-state machine over the filtered force:
//!
//! ```text
//!            force crosses up through on-threshold, slope > min
//!   Swing  ------------------------------------------------------>  Stance
//!          <------------------------------------------------------
//!            force crosses down through off-threshold
//! ```
//!
//! A transition is accepted only when at least `min_phase_duration` seconds
//! have passed since the previous one, so a signal chattering around a
//! threshold yields a single event.
//!
//! [`detect_peak_slope`] is the simpler single-step detector: heel strike at
//! the steepest rise, toe-off at the steepest fall.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use gait_core::{DetectionConfig, Error, GaitEvent, GaitEventKind, Result, Signal, Slope};

/// Loading state of the foot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GaitPhase {
    /// Foot not loaded
    Swing,
    /// Foot loaded
    Stance,
}

/// Threshold state machine producing heel strikes and toe-offs
#[derive(Debug, Clone)]
pub struct EventDetector {
    config: DetectionConfig,
}

impl EventDetector {
    pub fn new(config: DetectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_validated(config))
    }

    /// Caller has already run `DetectionConfig::validate`
    pub(crate) fn from_validated(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Scan `filtered` left to right and emit events in time order.
    ///
    /// `slope` must be index-aligned with `filtered`. The scan may end in
    /// stance, in which case the last event is an unmatched heel strike.
    pub fn detect(&self, filtered: &Signal, slope: &Slope) -> Result<Vec<GaitEvent>> {
        if slope.len() != filtered.len() {
            return Err(Error::LengthMismatch {
                expected: filtered.len(),
                actual: slope.len(),
            });
        }

        self.check_range(filtered)?;

        let on = self.config.force_on_threshold;
        let off = self.config.force_off_threshold;
        let samples = filtered.samples();

        let mut phase = GaitPhase::Swing;
        let mut last_transition: Option<f64> = None;
        let mut events = Vec::new();

        for i in 1..samples.len() {
            let prev = samples[i - 1].force;
            let cur = samples[i].force;
            let time = samples[i].time;

            let settled = last_transition
                .map_or(true, |t0| time - t0 >= self.config.min_phase_duration);

            match phase {
                GaitPhase::Swing => {
                    let crossed = prev < on && on <= cur;
                    if crossed && slope[i] > self.config.min_rising_slope && settled {
                        events.push(GaitEvent::new(i, time, GaitEventKind::HeelStrike));
                        phase = GaitPhase::Stance;
                        last_transition = Some(time);
                    }
                }
                GaitPhase::Stance => {
                    let crossed = prev >= off && off > cur;
                    if crossed && settled {
                        events.push(GaitEvent::new(i, time, GaitEventKind::ToeOff));
                        phase = GaitPhase::Swing;
                        last_transition = Some(time);
                    }
                }
            }
        }

        if events.is_empty() {
            warn!(force_on = on, force_off = off, "No gait events detected");
        } else if phase == GaitPhase::Stance {
            debug!("Signal ends in stance, last heel strike is unmatched");
        }

        debug!(events = events.len(), samples = samples.len(), "Event detection complete");

        Ok(events)
    }

    /// Both thresholds must lie inside the observed force range
    fn check_range(&self, filtered: &Signal) -> Result<()> {
        let (lo, hi) = filtered.force_range();

        for (name, value) in [
            ("force-on", self.config.force_on_threshold),
            ("force-off", self.config.force_off_threshold),
        ] {
            if value < lo || value > hi {
                return Err(Error::InvalidThresholds(format!(
                    "{name} threshold {value} outside observed force range [{lo}, {hi}]"
                )));
            }
        }

        Ok(())
    }
}

/// Run the threshold state machine with `config`
pub fn detect(filtered: &Signal, slope: &Slope, config: &DetectionConfig) -> Result<Vec<GaitEvent>> {
    EventDetector::new(*config)?.detect(filtered, slope)
}

/// Single heel strike / toe-off pair located at the slope extrema
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakSlopeEvents {
    pub heel_strike: GaitEvent,
    pub toe_off: GaitEvent,
}

/// Heel strike at the maximum slope, toe-off at the minimum slope.
///
/// Ties resolve to the earliest index.
pub fn detect_peak_slope(filtered: &Signal, slope: &Slope) -> Result<PeakSlopeEvents> {
    if filtered.len() < 2 {
        return Err(Error::InsufficientData {
            required: 2,
            available: filtered.len(),
        });
    }

    if slope.len() != filtered.len() {
        return Err(Error::LengthMismatch {
            expected: filtered.len(),
            actual: slope.len(),
        });
    }

    let values = slope.values();
    let mut max_idx = 0;
    let mut min_idx = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[max_idx] {
            max_idx = i;
        }
        if v < values[min_idx] {
            min_idx = i;
        }
    }

    Ok(PeakSlopeEvents {
        heel_strike: GaitEvent::new(max_idx, filtered.time(max_idx), GaitEventKind::HeelStrike),
        toe_off: GaitEvent::new(min_idx, filtered.time(min_idx), GaitEventKind::ToeOff),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derivative;

    const RATE: f64 = 100.0;

    fn signal_from(force: &[f64]) -> Signal {
        let time: Vec<f64> = (0..force.len()).map(|i| i as f64 / RATE).collect();
        Signal::from_columns(&time, force).unwrap()
    }

    fn config(on: f64, off: f64, min_phase: f64) -> DetectionConfig {
        DetectionConfig {
            force_on_threshold: on,
            force_off_threshold: off,
            min_rising_slope: 100.0,
            min_phase_duration: min_phase,
        }
    }

    fn run(force: &[f64], config: &DetectionConfig) -> Result<Vec<GaitEvent>> {
        let signal = signal_from(force);
        let slope = derivative::slope(&signal)?;
        detect(&signal, &slope, config)
    }

    fn kinds(events: &[GaitEvent], kind: GaitEventKind) -> Vec<usize> {
        events.iter().filter(|e| e.kind == kind).map(|e| e.index).collect()
    }

    #[test]
    fn test_square_wave_cycles() {
        // Loaded from 0.10 s to 0.65 s of every 1 s period, 3 s total
        let force: Vec<f64> = (0..300)
            .map(|i| if (10..65).contains(&(i % 100)) { 800.0 } else { 0.0 })
            .collect();

        let events = run(&force, &config(100.0, 50.0, 0.1)).unwrap();

        assert_eq!(kinds(&events, GaitEventKind::HeelStrike), vec![10, 110, 210]);
        assert_eq!(kinds(&events, GaitEventKind::ToeOff), vec![65, 165, 265]);

        for pair in events.windows(2) {
            assert!(pair[1].time > pair[0].time);
            assert_ne!(pair[0].kind, pair[1].kind);
        }
        assert_eq!(events[0].kind, GaitEventKind::HeelStrike);
        assert!((events[0].time - 0.10).abs() < 1.0 / RATE);
    }

    fn chattering_step() -> Vec<f64> {
        let mut force = vec![0.0; 20];
        force.extend([40.0, 51.0, 49.0, 51.0, 49.0, 52.0]);
        force.extend(vec![300.0; 35]);
        force.extend(vec![0.0; 20]);
        force
    }

    #[test]
    fn test_debounce_single_heel_strike() {
        let events = run(&chattering_step(), &config(50.0, 50.0, 0.2)).unwrap();

        assert_eq!(kinds(&events, GaitEventKind::HeelStrike), vec![21]);
        assert_eq!(kinds(&events, GaitEventKind::ToeOff), vec![61]);
    }

    #[test]
    fn test_without_debounce_chatter_fragments() {
        let events = run(&chattering_step(), &config(50.0, 50.0, 0.0)).unwrap();

        assert!(kinds(&events, GaitEventKind::HeelStrike).len() > 1);
    }

    #[test]
    fn test_slow_creep_is_not_a_strike() {
        // 0.5 N per sample at 100 Hz = 50 N/s, below the 100 N/s guard
        let force: Vec<f64> = (0..200).map(|i| i as f64 * 0.5).collect();

        let events = run(&force, &config(50.0, 40.0, 0.1)).unwrap();

        assert!(events.is_empty());
    }

    #[test]
    fn test_trailing_heel_strike_reported() {
        let mut force = vec![0.0; 10];
        force.extend(vec![500.0; 10]);

        let events = run(&force, &config(100.0, 50.0, 0.1)).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, GaitEventKind::HeelStrike);
        assert_eq!(events[0].index, 10);
    }

    #[test]
    fn test_off_above_on_rejected() {
        let force = vec![0.0, 100.0, 0.0];
        assert!(matches!(
            run(&force, &config(20.0, 30.0, 0.1)),
            Err(Error::InvalidThresholds(_))
        ));
    }

    #[test]
    fn test_threshold_outside_range_rejected() {
        let force = vec![0.0, 10.0, 0.0];
        assert!(matches!(
            run(&force, &config(500.0, 5.0, 0.1)),
            Err(Error::InvalidThresholds(_))
        ));
        assert!(matches!(
            run(&force, &config(5.0, -1.0, 0.1)),
            Err(Error::InvalidThresholds(_))
        ));
    }

    #[test]
    fn test_slope_length_mismatch() {
        let signal = signal_from(&[0.0, 10.0, 0.0]);
        let slope = Slope::new(vec![0.0, 0.0]);

        assert_eq!(
            detect(&signal, &slope, &config(5.0, 5.0, 0.1)).unwrap_err(),
            Error::LengthMismatch { expected: 3, actual: 2 }
        );
    }

    #[test]
    fn test_peak_slope() {
        let force = [0.0, 0.0, 10.0, 45.0, 50.0, 50.0, 30.0, 0.0, 0.0];
        let signal = signal_from(&force);
        let slope = derivative::slope(&signal).unwrap();

        let peaks = detect_peak_slope(&signal, &slope).unwrap();

        assert_eq!(peaks.heel_strike.index, 2);
        assert_eq!(peaks.toe_off.index, 6);
        assert_eq!(peaks.heel_strike.kind, GaitEventKind::HeelStrike);
        assert!((peaks.toe_off.time - 0.06).abs() < 1e-12);
    }
}
