//! # Gait-Signal
//!
//! Signal conditioning and event detection for a single-channel FSR force
//! recording.
//!
//! ## Pipeline Stages
//!
//! 1. **Filtering**: Smooth the raw force with a moving average or a
//!    zero-phase Butterworth low-pass
//! 2. **Derivative**: Rate of force development, index-aligned with the signal
//! 3. **Detection**: Stance/swing state machine emitting heel strikes and
//!    toe-offs, with debounce against threshold chatter
//!
//! Every stage is a pure function over an in-memory [`gait_core::Signal`];
//! separate recordings can be processed on separate threads without
//! coordination.

pub mod derivative;
pub mod detection;
pub mod filtering;
pub mod pipeline;

pub use derivative::*;
pub use detection::*;
pub use filtering::*;
pub use pipeline::*;
