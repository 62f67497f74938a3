//! Per-channel retention of the last triggered trace.

use crate::acquisition::{EMPTY_VALUES, SampleValues};
use crate::settings::TriggerMode;

#[derive(Debug, Clone, Default)]
struct CachedTrace {
    values: SampleValues,
    skip: usize,
    valid: bool,
}

/// Trigger outcome of the frame being drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerVerdict {
    pub triggered: bool,
    pub mode: TriggerMode,
}

/// Trace chosen for one channel in the current frame.
#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    pub values: &'a SampleValues,
    pub skip: usize,
    /// True when the trace comes from an earlier triggered frame.
    pub held: bool,
}

impl Selection<'_> {
    fn empty() -> Self {
        Self {
            values: &EMPTY_VALUES,
            skip: 0,
            held: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Keeps the last triggered trace of every channel so that NORMAL mode can
/// keep showing it until the next trigger.
#[derive(Debug, Clone, Default)]
pub struct TriggerTraceCache {
    entries: Vec<CachedTrace>,
}

impl TriggerTraceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks the trace to draw for `channel`.
    ///
    /// A triggered frame replaces the cached trace and is returned as is. An
    /// untriggered frame in NORMAL mode returns the cached trace together
    /// with the skip offset it was stored with. In every other case the
    /// cached trace is discarded and the live frame is returned.
    pub fn select<'a>(
        &'a mut self,
        channel: usize,
        frame: Option<&'a SampleValues>,
        skip: usize,
        in_use: bool,
        verdict: TriggerVerdict,
    ) -> Selection<'a> {
        let frame = match frame {
            Some(frame) if in_use => frame,
            _ => {
                self.invalidate(channel);
                return Selection::empty();
            }
        };

        if verdict.triggered {
            let entry = self.entry_mut(channel);
            entry.values.clone_from(frame);
            entry.skip = skip;
            entry.valid = true;
            return Selection {
                values: frame,
                skip,
                held: false,
            };
        }

        if verdict.mode == TriggerMode::Normal && self.is_holding(channel) {
            let entry = &self.entries[channel];
            return Selection {
                values: &entry.values,
                skip: entry.skip,
                held: true,
            };
        }

        self.invalidate(channel);
        Selection {
            values: frame,
            skip,
            held: false,
        }
    }

    pub fn is_holding(&self, channel: usize) -> bool {
        self.entries.get(channel).is_some_and(|entry| entry.valid)
    }

    pub fn invalidate(&mut self, channel: usize) {
        if let Some(entry) = self.entries.get_mut(channel) {
            entry.valid = false;
        }
    }

    pub fn invalidate_all(&mut self) {
        for entry in &mut self.entries {
            entry.valid = false;
        }
    }

    /// Number of channel slots allocated so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry_mut(&mut self, channel: usize) -> &mut CachedTrace {
        if self.entries.len() <= channel {
            self.entries.resize_with(channel + 1, CachedTrace::default);
        }
        &mut self.entries[channel]
    }
}
