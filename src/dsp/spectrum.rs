//! Magnitude spectra of the voltage traces, computed with a real FFT.

use super::{FrameError, FrameProcessor, Reconfigurable, check_sample_count};
use crate::acquisition::{AcquisitionResult, SampleValues};
use crate::settings::ScopeSettings;
use crate::util::signal::{DB_FLOOR, apply_window, power_to_db, remove_dc};
use realfft::{RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex64;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowKind {
    Rectangular,
    #[default]
    Hann,
    Hamming,
    Blackman,
}

impl WindowKind {
    fn coefficients(self, len: usize) -> Vec<f64> {
        let phase = |n: usize| (n as f64) * core::f64::consts::TAU / (len as f64);
        match self {
            WindowKind::Rectangular => vec![1.0; len],
            WindowKind::Hann => (0..len).map(|n| 0.5 * (1.0 - phase(n).cos())).collect(),
            WindowKind::Hamming => (0..len).map(|n| 0.54 - 0.46 * phase(n).cos()).collect(),
            WindowKind::Blackman => {
                let a0 = 0.42;
                let a1 = 0.5;
                let a2 = 0.08;
                (0..len)
                    .map(|n| a0 - a1 * phase(n).cos() + a2 * (2.0 * phase(n)).cos())
                    .collect()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumConfig {
    pub window: WindowKind,
    /// Lowest reported magnitude in dBV.
    pub floor_db: f64,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            window: WindowKind::Hann,
            floor_db: DB_FLOOR,
        }
    }
}

struct SpectrumPlan {
    fft: Arc<dyn RealToComplex<f64>>,
    window: Vec<f64>,
    window_sum: f64,
    input: Vec<f64>,
    output: Vec<Complex64>,
    scratch: Vec<Complex64>,
}

impl SpectrumPlan {
    fn new(planner: &mut RealFftPlanner<f64>, len: usize, kind: WindowKind) -> Self {
        let fft = planner.plan_fft_forward(len);
        let window = kind.coefficients(len);
        Self {
            window_sum: window.iter().sum(),
            input: fft.make_input_vec(),
            output: fft.make_output_vec(),
            scratch: fft.make_scratch_vec(),
            window,
            fft,
        }
    }

    fn len(&self) -> usize {
        self.input.len()
    }
}

/// Computes one spectrum per channel whose spectrum view is enabled.
///
/// Magnitudes are peak amplitudes in dBV; a full-scale sine of amplitude 1 V
/// reads 0 dB at its bin. Bins are spaced `1 / (interval * len)` hertz apart.
pub struct SpectrumGenerator {
    config: SpectrumConfig,
    enabled: Vec<bool>,
    planner: RealFftPlanner<f64>,
    plan: Option<SpectrumPlan>,
}

impl std::fmt::Debug for SpectrumGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumGenerator")
            .field("config", &self.config)
            .field("enabled", &self.enabled)
            .field("fft_len", &self.plan.as_ref().map(SpectrumPlan::len))
            .finish_non_exhaustive()
    }
}

impl SpectrumGenerator {
    pub fn new(config: SpectrumConfig, settings: &ScopeSettings) -> Self {
        Self {
            config,
            enabled: enabled_channels(settings),
            planner: RealFftPlanner::new(),
            plan: None,
        }
    }

    pub fn config(&self) -> SpectrumConfig {
        self.config
    }

    fn plan_for(&mut self, len: usize) -> &mut SpectrumPlan {
        let plan = match self.plan.take() {
            Some(plan) if plan.len() == len => plan,
            _ => {
                debug!("[spectrum] planning {len} point fft");
                SpectrumPlan::new(&mut self.planner, len, self.config.window)
            }
        };
        self.plan.insert(plan)
    }

    fn analyze(&mut self, channel: usize, values: &SampleValues) -> Option<SampleValues> {
        let len = values.len();
        if len < 2 || !(values.interval.is_finite() && values.interval > 0.0) {
            debug!("[spectrum] channel {channel} has too little data for a spectrum");
            return None;
        }

        let floor = self.config.floor_db;
        let plan = self.plan_for(len);
        plan.input.copy_from_slice(&values.samples);
        remove_dc(&mut plan.input);
        apply_window(&mut plan.input, &plan.window);

        if let Err(err) = plan
            .fft
            .process_with_scratch(&mut plan.input, &mut plan.output, &mut plan.scratch)
        {
            warn!("[spectrum] fft failed on channel {channel}: {err}");
            return None;
        }

        let norm = if plan.window_sum.abs() > f64::EPSILON {
            1.0 / plan.window_sum
        } else {
            1.0 / len as f64
        };
        let last = plan.output.len() - 1;
        let nyquist_is_single = len % 2 == 0;
        let samples = plan
            .output
            .iter()
            .enumerate()
            .map(|(bin, value)| {
                // Interior bins carry half of the amplitude.
                let single = bin == 0 || (bin == last && nyquist_is_single);
                let scale = if single { norm } else { 2.0 * norm };
                power_to_db(value.norm_sqr() * scale * scale, floor)
            })
            .collect();

        Some(SampleValues::new(samples, 1.0 / (values.interval * len as f64)))
    }
}

fn enabled_channels(settings: &ScopeSettings) -> Vec<bool> {
    (0..settings.channel_count())
        .map(|channel| settings.spectrum_used(channel))
        .collect()
}

impl FrameProcessor for SpectrumGenerator {
    type Output = Vec<Option<SampleValues>>;

    fn process_frame(&mut self, frame: &AcquisitionResult) -> Result<Self::Output, FrameError> {
        let mut spectra = Vec::with_capacity(frame.channel_count());
        for channel in 0..frame.channel_count() {
            let enabled = self.enabled.get(channel).copied().unwrap_or(false);
            let spectrum = match frame.voltage(channel) {
                Some(values) if enabled && !values.is_empty() => {
                    check_sample_count(channel, values.len())?;
                    self.analyze(channel, values)
                }
                _ => None,
            };
            spectra.push(spectrum);
        }
        Ok(spectra)
    }

    fn reset(&mut self) {
        self.plan = None;
    }
}

impl Reconfigurable<SpectrumConfig> for SpectrumGenerator {
    fn update_config(&mut self, config: SpectrumConfig) {
        if config.window != self.config.window {
            self.plan = None;
        }
        self.config = config;
    }
}

impl Reconfigurable<ScopeSettings> for SpectrumGenerator {
    fn update_config(&mut self, settings: ScopeSettings) {
        self.enabled = enabled_channels(&settings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::MAX_SAMPLE_COUNT;

    const SAMPLE_RATE: f64 = 100e3;

    fn sine(freq: f64, amplitude: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|n| amplitude * (core::f64::consts::TAU * freq * n as f64 / SAMPLE_RATE).sin())
            .collect()
    }

    fn spectrum_settings(channels: usize) -> ScopeSettings {
        let mut settings = ScopeSettings::with_channels(channels);
        for spectrum in &mut settings.spectrum {
            spectrum.used = true;
        }
        settings
    }

    fn peak(values: &SampleValues) -> (usize, f64) {
        values
            .samples
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap()
    }

    #[test]
    fn sine_peaks_at_its_bin_with_unit_amplitude() {
        let mut generator = SpectrumGenerator::new(SpectrumConfig::default(), &spectrum_settings(1));
        let frame =
            AcquisitionResult::from_voltages([sine(1_000.0, 1.0, 1000)], 1.0 / SAMPLE_RATE, true);

        let spectra = generator.process_frame(&frame).unwrap();
        let spectrum = spectra[0].as_ref().unwrap();
        assert_eq!(spectrum.len(), 501);
        assert!((spectrum.interval - 100.0).abs() < 1e-9);

        let (bin, db) = peak(spectrum);
        assert_eq!(bin, 10);
        assert!(db.abs() < 0.1, "peak {db} dB");
    }

    #[test]
    fn rectangular_window_reports_half_amplitude() {
        let config = SpectrumConfig {
            window: WindowKind::Rectangular,
            ..Default::default()
        };
        let mut generator = SpectrumGenerator::new(config, &spectrum_settings(1));
        let frame =
            AcquisitionResult::from_voltages([sine(2_000.0, 0.5, 800)], 1.0 / SAMPLE_RATE, true);

        let spectra = generator.process_frame(&frame).unwrap();
        let (bin, db) = peak(spectra[0].as_ref().unwrap());
        assert_eq!(bin, 16);
        assert!((db + 6.02).abs() < 0.05, "peak {db} dB");
    }

    #[test]
    fn constant_trace_sits_on_floor() {
        let mut generator = SpectrumGenerator::new(SpectrumConfig::default(), &spectrum_settings(1));
        let frame = AcquisitionResult::from_voltages([vec![2.5; 64]], 1.0 / SAMPLE_RATE, true);
        let spectra = generator.process_frame(&frame).unwrap();
        assert!(spectra[0]
            .as_ref()
            .unwrap()
            .samples
            .iter()
            .all(|&db| db == DB_FLOOR));
    }

    #[test]
    fn disabled_and_empty_channels_are_skipped() {
        let mut settings = spectrum_settings(3);
        settings.spectrum[1].used = false;
        let mut generator = SpectrumGenerator::new(SpectrumConfig::default(), &settings);
        let frame = AcquisitionResult::from_voltages(
            [sine(1_000.0, 1.0, 100), sine(1_000.0, 1.0, 100), Vec::new()],
            1.0 / SAMPLE_RATE,
            true,
        );

        let spectra = generator.process_frame(&frame).unwrap();
        assert!(spectra[0].is_some());
        assert!(spectra[1].is_none());
        assert!(spectra[2].is_none());

        generator.update_config(spectrum_settings(3));
        let spectra = generator.process_frame(&frame).unwrap();
        assert!(spectra[1].is_some());
    }

    #[test]
    fn oversized_trace_is_rejected() {
        let mut generator = SpectrumGenerator::new(SpectrumConfig::default(), &spectrum_settings(1));
        let frame = AcquisitionResult::from_voltages(
            [vec![0.0; MAX_SAMPLE_COUNT + 1]],
            1.0 / SAMPLE_RATE,
            true,
        );
        assert!(matches!(
            generator.process_frame(&frame),
            Err(FrameError::SampleCountTooHigh { channel: 0, .. })
        ));
    }

    #[test]
    fn window_change_rebuilds_plan() {
        let mut generator = SpectrumGenerator::new(SpectrumConfig::default(), &spectrum_settings(1));
        // Ten full cycles: each window's main lobe sits on bins 10 +- n.
        let frame =
            AcquisitionResult::from_voltages([sine(1_000.0, 1.0, 1000)], 1.0 / SAMPLE_RATE, true);
        generator.process_frame(&frame).unwrap();

        // (window, level of bin 11, level of bin 12)
        let cases = [
            (WindowKind::Hamming, -7.41, None),
            (WindowKind::Blackman, -4.51, Some(-20.42)),
            (WindowKind::Rectangular, DB_FLOOR, None),
            (WindowKind::Hann, -6.02, None),
        ];
        for (window, side, outer) in cases {
            generator.update_config(SpectrumConfig {
                window,
                ..generator.config()
            });
            assert!(generator.plan.is_none(), "{window:?}");

            let spectra = generator.process_frame(&frame).unwrap();
            let plan = generator.plan.as_ref().unwrap();
            assert_eq!(plan.window, window.coefficients(1000), "{window:?}");

            let spectrum = spectra[0].as_ref().unwrap();
            let (bin, db) = peak(spectrum);
            assert_eq!(bin, 10, "{window:?}");
            assert!(db.abs() < 0.01, "{window:?} peak {db} dB");

            let near = spectrum.samples[11];
            if side == DB_FLOOR {
                assert!(near < -100.0, "{window:?} bin 11 {near} dB");
            } else {
                assert!((near - side).abs() < 0.05, "{window:?} bin 11 {near} dB");
            }
            let far = spectrum.samples[12];
            match outer {
                Some(level) => assert!((far - level).abs() < 0.05, "{window:?} bin 12 {far} dB"),
                None => assert!(far < -100.0, "{window:?} bin 12 {far} dB"),
            }
        }
    }

    #[test]
    fn floor_change_keeps_plan() {
        let mut generator = SpectrumGenerator::new(SpectrumConfig::default(), &spectrum_settings(1));
        let frame = AcquisitionResult::from_voltages([vec![1.0; 64]], 1.0 / SAMPLE_RATE, true);
        generator.process_frame(&frame).unwrap();

        generator.update_config(SpectrumConfig {
            floor_db: -80.0,
            ..generator.config()
        });
        assert!(generator.plan.is_some());
        let spectra = generator.process_frame(&frame).unwrap();
        assert!(spectra[0].as_ref().unwrap().samples.iter().all(|&db| db == -80.0));
    }

    #[test]
    fn plan_follows_trace_length() {
        let mut generator = SpectrumGenerator::new(SpectrumConfig::default(), &spectrum_settings(2));
        let frame = AcquisitionResult::from_voltages(
            [sine(1_000.0, 1.0, 200), sine(1_000.0, 1.0, 300)],
            1.0 / SAMPLE_RATE,
            true,
        );
        let spectra = generator.process_frame(&frame).unwrap();
        assert_eq!(spectra[0].as_ref().map(SampleValues::len), Some(101));
        assert_eq!(spectra[1].as_ref().map(SampleValues::len), Some(151));
    }
}
