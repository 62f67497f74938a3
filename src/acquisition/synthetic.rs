//! Deterministic sine-wave frames standing in for a capture device.

use super::AcquisitionResult;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency: f64,
    pub amplitude: f64,
    pub offset: f64,
}

impl Default for Tone {
    fn default() -> Self {
        Self {
            frequency: 1_000.0,
            amplitude: 1.0,
            offset: 0.0,
        }
    }
}

/// Endless stream of frames, one sine per channel.
///
/// The phase advances by `phase_step` cycles between frames so that an
/// untriggered display visibly drifts. Every `dropout_every`-th frame is
/// flat and reported as untriggered.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    tones: Vec<Tone>,
    samplerate: f64,
    record_length: usize,
    phase: f64,
    phase_step: f64,
    dropout_every: Option<u64>,
    frame_index: u64,
}

impl SyntheticSource {
    pub fn new(tones: Vec<Tone>, samplerate: f64, record_length: usize) -> Self {
        Self {
            tones,
            samplerate,
            record_length,
            phase: 0.0,
            phase_step: 0.13,
            dropout_every: None,
            frame_index: 0,
        }
    }

    pub fn with_phase_step(mut self, cycles: f64) -> Self {
        self.phase_step = cycles;
        self
    }

    pub fn with_dropouts(mut self, every: u64) -> Self {
        self.dropout_every = (every > 0).then_some(every);
        self
    }

    pub fn next_frame(&mut self) -> AcquisitionResult {
        self.frame_index += 1;
        let dropout = self
            .dropout_every
            .is_some_and(|every| self.frame_index % every == 0);

        let interval = 1.0 / self.samplerate;
        let phase = self.phase;
        let len = self.record_length;
        let traces = self.tones.iter().map(|tone| {
            if dropout {
                return vec![tone.offset; len];
            }
            (0..len)
                .map(|n| {
                    let cycles = tone.frequency * n as f64 * interval + phase;
                    tone.offset + tone.amplitude * (core::f64::consts::TAU * cycles).sin()
                })
                .collect()
        });
        let frame = AcquisitionResult::from_voltages(traces, interval, !dropout);

        self.phase = (self.phase + self.phase_step).fract();
        frame
    }
}

impl Iterator for SyntheticSource {
    type Item = AcquisitionResult;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_frame())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_carry_one_trace_per_tone() {
        let mut source = SyntheticSource::new(vec![Tone::default(); 3], 100e3, 2048);
        let frame = source.next_frame();
        assert_eq!(frame.channel_count(), 3);
        assert!(frame.triggered);
        let voltage = frame.voltage(2).unwrap();
        assert_eq!(voltage.len(), 2048);
        assert!((voltage.interval - 1e-5).abs() < 1e-15);
    }

    #[test]
    fn dropout_frames_are_flat_and_untriggered() {
        let tone = Tone {
            offset: 0.25,
            ..Tone::default()
        };
        let frames: Vec<_> = SyntheticSource::new(vec![tone], 100e3, 64)
            .with_dropouts(3)
            .take(6)
            .collect();

        let triggered: Vec<bool> = frames.iter().map(|f| f.triggered).collect();
        assert_eq!(triggered, vec![true, true, false, true, true, false]);
        let flat = frames[2].voltage(0).unwrap();
        assert!(flat.samples.iter().all(|&v| v == 0.25));
    }

    #[test]
    fn phase_advances_between_frames() {
        let mut source =
            SyntheticSource::new(vec![Tone::default()], 100e3, 16).with_phase_step(0.25);
        let first = source.next_frame();
        let second = source.next_frame();
        assert!(first.voltage(0).unwrap().samples[0].abs() < 1e-12);
        assert!((second.voltage(0).unwrap().samples[0] - 1.0).abs() < 1e-12);
    }
}
