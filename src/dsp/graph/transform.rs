//! Sample value to screen coordinate mappings.

use super::GraphPoint;
use crate::settings::{DIVS_TIME, SpectrumSettings, VoltageSettings};

/// Shift that puts sample zero at the left edge of the screen.
pub const HALF_SCREEN_DIVS: f64 = DIVS_TIME / 2.0;

/// Linear map from (sample index, raw value) to screen divisions.
///
/// `divisor` must not be zero; a zero gain or magnitude yields non-finite
/// points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelTransform {
    horizontal_factor: f64,
    divisor: f64,
    sign: f64,
    offset: f64,
}

impl ChannelTransform {
    /// Time-domain mapping for a trace sampled every `interval` seconds.
    pub fn voltage(interval: f64, timebase: f64, settings: &VoltageSettings) -> Self {
        Self {
            horizontal_factor: interval / timebase,
            divisor: settings.gain,
            sign: if settings.inverted { -1.0 } else { 1.0 },
            offset: settings.offset,
        }
    }

    /// Frequency-domain mapping for bins spaced `interval` hertz apart.
    pub fn spectrum(interval: f64, frequencybase: f64, settings: &SpectrumSettings) -> Self {
        Self {
            horizontal_factor: interval / frequencybase,
            divisor: settings.magnitude,
            sign: 1.0,
            offset: settings.offset,
        }
    }

    #[inline]
    pub fn x(&self, position: usize) -> f64 {
        position as f64 * self.horizontal_factor - HALF_SCREEN_DIVS
    }

    #[inline]
    pub fn y(&self, raw: f64) -> f64 {
        raw / self.divisor * self.sign + self.offset
    }

    #[inline]
    pub fn point(&self, position: usize, raw: f64) -> GraphPoint {
        GraphPoint::new(self.x(position), self.y(raw))
    }

    /// Maps `samples` in order, numbering positions from zero.
    pub fn map_into(&self, samples: &[f64], target: &mut Vec<GraphPoint>) {
        target.reserve(samples.len());
        target.extend(
            samples
                .iter()
                .enumerate()
                .map(|(position, &raw)| self.point(position, raw)),
        );
    }
}

/// Vertical-only mapping used on both axes of an XY plot.
#[inline]
pub fn xy_point(x_raw: f64, x: &VoltageSettings, y_raw: f64, y: &VoltageSettings) -> GraphPoint {
    let axis = |raw: f64, settings: &VoltageSettings| {
        let sign = if settings.inverted { -1.0 } else { 1.0 };
        raw / settings.gain * sign + settings.offset
    };
    GraphPoint::new(axis(x_raw, x), axis(y_raw, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voltage_settings(gain: f64, offset: f64, inverted: bool) -> VoltageSettings {
        VoltageSettings {
            gain,
            offset,
            inverted,
            ..Default::default()
        }
    }

    #[test]
    fn voltage_y_is_scaled_and_offset() {
        let transform = ChannelTransform::voltage(1e-5, 1e-3, &voltage_settings(2.5, 0.75, false));
        for v in [-3.3, 0.0, 0.125, 4.2] {
            assert!((transform.y(v) - (v / 2.5 + 0.75)).abs() < 1e-6);
        }
    }

    #[test]
    fn inversion_flips_before_offset() {
        let transform = ChannelTransform::voltage(1e-5, 1e-3, &voltage_settings(2.0, 1.0, true));
        assert!((transform.y(3.0) - (-1.5 + 1.0)).abs() < 1e-9);
    }

    #[test]
    fn x_starts_at_left_edge() {
        let transform = ChannelTransform::voltage(1e-5, 1e-3, &VoltageSettings::default());
        assert_eq!(transform.x(0), -HALF_SCREEN_DIVS);
        assert!((transform.x(500) - 0.0).abs() < 1e-9);
        assert!((transform.x(1000) - HALF_SCREEN_DIVS).abs() < 1e-9);
    }

    #[test]
    fn spectrum_maps_frequency_and_magnitude() {
        let settings = SpectrumSettings {
            used: true,
            magnitude: 20.0,
            offset: -2.0,
        };
        let transform = ChannelTransform::spectrum(50.0, 1_000.0, &settings);
        assert!((transform.x(20) - (20.0 * 0.05 - HALF_SCREEN_DIVS)).abs() < 1e-9);
        assert!((transform.y(-60.0) - (-3.0 - 2.0)).abs() < 1e-9);
    }

    #[test]
    fn map_into_appends_in_sample_order() {
        let transform = ChannelTransform::voltage(1.0, 1.0, &VoltageSettings::default());
        let mut target = Vec::new();
        transform.map_into(&[3.0, 1.0, 2.0], &mut target);
        let ys: Vec<f32> = target.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![3.0, 1.0, 2.0]);
        assert!(target.iter().all(|p| p.z == 0.0));
    }

    #[test]
    fn xy_point_scales_each_axis_with_its_channel() {
        let point = xy_point(
            2.0,
            &voltage_settings(2.0, 0.0, false),
            3.0,
            &voltage_settings(1.0, 0.5, true),
        );
        assert_eq!(point, GraphPoint::new(1.0, -2.5));
    }
}
