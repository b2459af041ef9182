//! Shift window definition and annotation
//!
//! Pure, synchronous pieces of the engine: window validation (including
//! overnight wraparound), preset resolution from outlet configuration, and
//! lateness arithmetic.

pub mod lateness;
pub mod presets;
pub mod validator;

pub use lateness::{format_lateness, minutes_late, schedule_instant};
pub use presets::{PresetKind, ShiftPreset, ShiftPresets};
pub use validator::ShiftWindow;
