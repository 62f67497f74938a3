pub mod graph;
pub mod spectrum;
pub mod trigger;

use crate::acquisition::AcquisitionResult;
use thiserror::Error;

/// Largest per-channel sample count a frame may carry.
pub const MAX_SAMPLE_COUNT: usize = 500_000;

/// Fatal per-frame failures; the whole frame is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("sample count {count} on channel {channel} exceeds the limit of {MAX_SAMPLE_COUNT}")]
    SampleCountTooHigh { channel: usize, count: usize },
}

pub(crate) fn check_sample_count(channel: usize, count: usize) -> Result<(), FrameError> {
    if count > MAX_SAMPLE_COUNT {
        return Err(FrameError::SampleCountTooHigh { channel, count });
    }
    Ok(())
}

pub trait FrameProcessor {
    type Output;

    fn process_frame(&mut self, frame: &AcquisitionResult) -> Result<Self::Output, FrameError>;
    fn reset(&mut self);
}

pub trait Reconfigurable<Cfg> {
    fn update_config(&mut self, config: Cfg);
}
