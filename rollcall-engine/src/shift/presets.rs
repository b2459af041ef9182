//! Named shift presets
//!
//! Outlets may configure their own morning/afternoon/night windows; any
//! missing or unparseable field falls back to the built-in default for that
//! field alone. Outlet times may arrive as "HH:MM:SS" and are truncated.

use rollcall_common::models::OutletConfig;
use rollcall_common::time::truncate_to_hh_mm;

/// One named preset offered for clock-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftPreset {
    pub label: &'static str,
    /// "HH:MM"
    pub start: String,
    /// "HH:MM"
    pub end: String,
    pub icon: &'static str,
}

/// The three presets derived from outlet configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftPresets {
    pub morning: ShiftPreset,
    pub afternoon: ShiftPreset,
    pub night: ShiftPreset,
}

/// Preset selector used by clock-in callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetKind {
    Morning,
    Afternoon,
    Night,
}

impl ShiftPresets {
    /// Derive presets from outlet configuration, falling back per-field to
    /// the built-in defaults.
    pub fn resolve(outlet: Option<&OutletConfig>) -> Self {
        let field = |value: Option<&String>, default: &str| -> String {
            value
                .and_then(|text| truncate_to_hh_mm(text))
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            morning: ShiftPreset {
                label: "Morning",
                start: field(outlet.and_then(|o| o.shift_pagi_start.as_ref()), "08:00"),
                end: field(outlet.and_then(|o| o.shift_pagi_end.as_ref()), "17:00"),
                icon: "sunrise",
            },
            afternoon: ShiftPreset {
                label: "Afternoon",
                start: field(outlet.and_then(|o| o.shift_siang_start.as_ref()), "12:00"),
                end: field(outlet.and_then(|o| o.shift_siang_end.as_ref()), "21:00"),
                icon: "sun",
            },
            night: ShiftPreset {
                label: "Night",
                start: field(outlet.and_then(|o| o.shift_malam_start.as_ref()), "20:00"),
                end: field(outlet.and_then(|o| o.shift_malam_end.as_ref()), "05:00"),
                icon: "moon",
            },
        }
    }

    pub fn get(&self, kind: PresetKind) -> &ShiftPreset {
        match kind {
            PresetKind::Morning => &self.morning,
            PresetKind::Afternoon => &self.afternoon,
            PresetKind::Night => &self.night,
        }
    }
}
