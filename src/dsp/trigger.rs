//! Software trigger search on the trigger source channel.

use crate::acquisition::AcquisitionResult;
use crate::settings::{DIVS_TIME, ScopeSettings, Slope};
use tracing::debug;

/// Where the trigger sits in the source channel's trace.
///
/// All counts are sample indices into the source trace. An untriggered
/// search reports `post_trigger <= pre_trigger`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TriggerPosition {
    pub pre_trigger: usize,
    pub post_trigger: usize,
    pub start: usize,
}

impl TriggerPosition {
    pub fn triggered(&self) -> bool {
        self.post_trigger > self.pre_trigger
    }

    /// Leading samples to drop so the trigger lands at the configured
    /// screen position. Negative when the locator reports a start ahead of
    /// the pre-trigger span.
    pub fn skip_offset(&self) -> i64 {
        self.start as i64 - self.pre_trigger as i64
    }
}

/// Finds the trigger point of a frame.
pub trait TriggerLocator: Send {
    fn locate(&self, frame: &AcquisitionResult, settings: &ScopeSettings) -> TriggerPosition;
}

/// Level-crossing search over the samples that leave a full screen of data
/// on either side of the trigger.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareTrigger;

impl TriggerLocator for SoftwareTrigger {
    fn locate(&self, frame: &AcquisitionResult, settings: &ScopeSettings) -> TriggerPosition {
        let source = settings.trigger.source;
        if !settings.voltage_used(source) {
            return TriggerPosition::default();
        }
        let Some(values) = frame.voltage(source).filter(|v| !v.is_empty()) else {
            return TriggerPosition::default();
        };
        if !values.interval.is_finite() || values.interval <= 0.0 {
            debug!("[trigger] channel {source} has no usable sample interval");
            return TriggerPosition::default();
        }

        let count = values.len();
        let samples_display =
            (settings.horizontal.timebase * DIVS_TIME / values.interval).round() as usize;
        if samples_display == 0 || samples_display >= count {
            debug!("[trigger] {count} samples cannot fill a {samples_display} sample screen");
            return TriggerPosition::default();
        }

        let pre_trigger =
            (settings.trigger.position.clamp(0.0, 1.0) * samples_display as f64) as usize;
        let post_trigger = count - (samples_display - pre_trigger);
        let level = settings.voltage[source].trigger_level;
        let slope = settings.trigger.slope;

        let first = pre_trigger.max(1);
        let start = values.samples[..post_trigger]
            .windows(2)
            .enumerate()
            .skip(first - 1)
            .find(|(_, pair)| crosses(slope, level, pair[0], pair[1]))
            .map(|(index, _)| index + 1);

        match start {
            Some(start) => TriggerPosition {
                pre_trigger,
                post_trigger,
                start,
            },
            None => TriggerPosition {
                pre_trigger,
                post_trigger: 0,
                start: 0,
            },
        }
    }
}

#[inline]
fn crosses(slope: Slope, level: f64, previous: f64, current: f64) -> bool {
    let rising = previous < level && current >= level;
    let falling = previous > level && current <= level;
    match slope {
        Slope::Positive => rising,
        Slope::Negative => falling,
        Slope::Both => rising || falling,
    }
}
