//! Scope display settings consumed read-only by the graph pipeline.

pub mod persistence;

use serde::{Deserialize, Serialize};

pub use persistence::SettingsError;

/// Horizontal divisions across the screen.
pub const DIVS_TIME: f64 = 10.0;

const DEFAULT_CHANNELS: usize = 2;
const DEFAULT_TIMEBASE: f64 = 1e-3;
const DEFAULT_FREQUENCYBASE: f64 = 1e3;
const DEFAULT_SAMPLERATE: f64 = 100e3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphFormat {
    /// Samples plotted against time.
    #[default]
    Ty,
    /// Channel pairs plotted against each other.
    Xy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    #[default]
    Auto,
    /// Holds the last triggered trace until a new trigger arrives.
    Normal,
    Single,
    Roll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slope {
    #[default]
    Positive,
    Negative,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoltageSettings {
    pub used: bool,
    /// Volts per division; must not be zero.
    pub gain: f64,
    /// Vertical offset in divisions.
    pub offset: f64,
    pub inverted: bool,
    /// Software trigger level in volts.
    pub trigger_level: f64,
}

impl Default for VoltageSettings {
    fn default() -> Self {
        Self {
            used: true,
            gain: 1.0,
            offset: 0.0,
            inverted: false,
            trigger_level: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrumSettings {
    pub used: bool,
    /// Decibels per division; must not be zero.
    pub magnitude: f64,
    /// Vertical offset in divisions.
    pub offset: f64,
}

impl Default for SpectrumSettings {
    fn default() -> Self {
        Self {
            used: false,
            magnitude: 20.0,
            offset: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HorizontalSettings {
    pub format: GraphFormat,
    /// Seconds per division.
    pub timebase: f64,
    /// Hertz per division in the spectrum view.
    pub frequencybase: f64,
    /// Samples per second.
    pub samplerate: f64,
}

impl Default for HorizontalSettings {
    fn default() -> Self {
        Self {
            format: GraphFormat::Ty,
            timebase: DEFAULT_TIMEBASE,
            frequencybase: DEFAULT_FREQUENCYBASE,
            samplerate: DEFAULT_SAMPLERATE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerSettings {
    pub mode: TriggerMode,
    pub source: usize,
    pub slope: Slope,
    /// Fraction of the screen shown before the trigger point.
    pub position: f64,
}

impl Default for TriggerSettings {
    fn default() -> Self {
        Self {
            mode: TriggerMode::Auto,
            source: 0,
            slope: Slope::Positive,
            position: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeSettings {
    pub horizontal: HorizontalSettings,
    pub trigger: TriggerSettings,
    pub voltage: Vec<VoltageSettings>,
    pub spectrum: Vec<SpectrumSettings>,
}

impl Default for ScopeSettings {
    fn default() -> Self {
        Self::with_channels(DEFAULT_CHANNELS)
    }
}

impl ScopeSettings {
    pub fn with_channels(channels: usize) -> Self {
        Self {
            horizontal: HorizontalSettings::default(),
            trigger: TriggerSettings::default(),
            voltage: vec![VoltageSettings::default(); channels],
            spectrum: vec![SpectrumSettings::default(); channels],
        }
    }

    pub fn channel_count(&self) -> usize {
        self.voltage.len()
    }

    pub fn voltage_used(&self, channel: usize) -> bool {
        self.voltage.get(channel).is_some_and(|v| v.used)
    }

    pub fn spectrum_used(&self, channel: usize) -> bool {
        self.spectrum.get(channel).is_some_and(|s| s.used)
    }

    /// Brings loaded settings back into the range the pipeline expects.
    pub fn sanitize(&mut self) {
        self.spectrum
            .resize(self.voltage.len(), SpectrumSettings::default());

        let h = &mut self.horizontal;
        if !(h.timebase.is_finite() && h.timebase > 0.0) {
            h.timebase = DEFAULT_TIMEBASE;
        }
        if !(h.frequencybase.is_finite() && h.frequencybase > 0.0) {
            h.frequencybase = DEFAULT_FREQUENCYBASE;
        }
        if !(h.samplerate.is_finite() && h.samplerate > 0.0) {
            h.samplerate = DEFAULT_SAMPLERATE;
        }

        let position = self.trigger.position;
        self.trigger.position = if position.is_finite() {
            position.clamp(0.0, 1.0)
        } else {
            TriggerSettings::default().position
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_aligns_spectrum_with_voltage_channels() {
        let mut settings = ScopeSettings::with_channels(4);
        settings.spectrum.truncate(1);
        settings.sanitize();
        assert_eq!(settings.spectrum.len(), 4);

        settings.voltage.truncate(3);
        settings.sanitize();
        assert_eq!(settings.spectrum.len(), 3);
    }

    #[test]
    fn sanitize_repairs_bases_and_position() {
        let mut settings = ScopeSettings::default();
        settings.horizontal.timebase = 0.0;
        settings.horizontal.frequencybase = f64::NAN;
        settings.horizontal.samplerate = -1.0;
        settings.trigger.position = 3.0;
        settings.sanitize();

        assert_eq!(settings.horizontal, HorizontalSettings::default());
        assert_eq!(settings.trigger.position, 1.0);
    }

    #[test]
    fn used_flags_are_false_outside_channel_range() {
        let settings = ScopeSettings::with_channels(1);
        assert!(settings.voltage_used(0));
        assert!(!settings.voltage_used(1));
        assert!(!settings.spectrum_used(0));
    }
}
