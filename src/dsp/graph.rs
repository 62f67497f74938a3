//! Graph generation: turns acquisition frames into per-channel point series
//! for the time-domain, spectrum and XY views.

pub mod cache;
pub mod transform;

pub use cache::{Selection, TriggerTraceCache, TriggerVerdict};
pub use transform::{ChannelTransform, HALF_SCREEN_DIVS, xy_point};

use super::trigger::{TriggerLocator, TriggerPosition};
use super::{FrameError, FrameProcessor, Reconfigurable, check_sample_count};
use crate::acquisition::AcquisitionResult;
use crate::settings::{GraphFormat, ScopeSettings};
use serde::Serialize;
use tracing::debug;

/// Screen position in divisions. `z` is always zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GraphPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl GraphPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: x as f32,
            y: y as f32,
            z: 0.0,
        }
    }
}

pub type ChannelGraph = Vec<GraphPoint>;

/// Everything drawn for one frame, one graph per configured channel.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GraphSet {
    pub format: GraphFormat,
    /// Trigger verdict of the frame; always false in XY format.
    pub triggered: bool,
    pub voltage: Vec<ChannelGraph>,
    pub spectrum: Vec<ChannelGraph>,
}

pub struct GraphGenerator {
    settings: ScopeSettings,
    trigger: Option<Box<dyn TriggerLocator>>,
    voltage_cache: TriggerTraceCache,
    spectrum_cache: TriggerTraceCache,
    ready: bool,
}

impl std::fmt::Debug for GraphGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphGenerator")
            .field("software_trigger", &self.trigger.is_some())
            .field("ready", &self.ready)
            .finish_non_exhaustive()
    }
}

impl GraphGenerator {
    /// Generator for devices that report the trigger verdict themselves.
    ///
    /// No trigger position is searched, so the skip offset is zero, but the
    /// frame's hardware `triggered` flag still decides whether a trace is
    /// stored or held. Zero positions alone would leave every frame
    /// untriggered and NORMAL mode could never hold a trace.
    pub fn new(settings: ScopeSettings) -> Self {
        Self {
            settings,
            trigger: None,
            voltage_cache: TriggerTraceCache::new(),
            spectrum_cache: TriggerTraceCache::new(),
            ready: false,
        }
    }

    /// Generator that searches every frame for the trigger point itself.
    pub fn with_trigger<T>(settings: ScopeSettings, locator: T) -> Self
    where
        T: TriggerLocator + 'static,
    {
        Self {
            trigger: Some(Box::new(locator)),
            ..Self::new(settings)
        }
    }

    pub fn settings(&self) -> &ScopeSettings {
        &self.settings
    }

    /// True once at least one frame produced a complete graph set.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn voltage_cache(&self) -> &TriggerTraceCache {
        &self.voltage_cache
    }

    pub fn spectrum_cache(&self) -> &TriggerTraceCache {
        &self.spectrum_cache
    }

    /// Rejects the frame before any cached trace is touched.
    fn validate(&self, frame: &AcquisitionResult) -> Result<(), FrameError> {
        for channel in 0..self.settings.channel_count() {
            if self.settings.voltage_used(channel) {
                if let Some(values) = frame.voltage(channel) {
                    check_sample_count(channel, values.len())?;
                }
            }
            if self.settings.spectrum_used(channel) {
                if let Some(values) = frame.spectrum(channel) {
                    check_sample_count(channel, values.len())?;
                }
            }
        }
        Ok(())
    }

    fn frame_trigger(&self, frame: &AcquisitionResult) -> (TriggerVerdict, usize) {
        let mode = self.settings.trigger.mode;
        let Some(locator) = self.trigger.as_ref() else {
            let verdict = TriggerVerdict {
                triggered: frame.triggered,
                mode,
            };
            return (verdict, 0);
        };

        let source = self.settings.trigger.source;
        let position = if source < frame.channel_count() {
            locator.locate(frame, &self.settings)
        } else {
            debug!(
                "[graph] trigger source {source} outside {} acquired channels",
                frame.channel_count()
            );
            TriggerPosition::default()
        };

        let skip = usize::try_from(position.skip_offset()).unwrap_or_else(|_| {
            debug!(
                "[graph] trigger start {} precedes pre-trigger span {}; drawing from sample 0",
                position.start, position.pre_trigger
            );
            0
        });
        let verdict = TriggerVerdict {
            triggered: position.triggered(),
            mode,
        };
        (verdict, skip)
    }

    fn generate_voltage(
        &mut self,
        frame: &AcquisitionResult,
        verdict: TriggerVerdict,
        skip: usize,
    ) -> Vec<ChannelGraph> {
        let settings = &self.settings;
        let mut graphs = Vec::with_capacity(settings.channel_count());

        for (channel, voltage) in settings.voltage.iter().enumerate() {
            let selection = self.voltage_cache.select(
                channel,
                frame.voltage(channel),
                skip,
                voltage.used,
                verdict,
            );
            if selection.is_empty() {
                graphs.push(ChannelGraph::new());
                continue;
            }
            if selection.held {
                debug!("[graph] channel {channel} holding last triggered trace");
            }

            let samples = &selection.values.samples;
            let skip = if selection.skip > samples.len() {
                debug!(
                    "[graph] skip {} exceeds {} samples on channel {channel}",
                    selection.skip,
                    samples.len()
                );
                samples.len()
            } else {
                selection.skip
            };

            let transform = ChannelTransform::voltage(
                selection.values.interval,
                settings.horizontal.timebase,
                voltage,
            );
            let mut graph = ChannelGraph::new();
            transform.map_into(&samples[skip..], &mut graph);
            graphs.push(graph);
        }
        graphs
    }

    fn generate_spectrum(
        &mut self,
        frame: &AcquisitionResult,
        verdict: TriggerVerdict,
    ) -> Vec<ChannelGraph> {
        let settings = &self.settings;
        let mut graphs = Vec::with_capacity(settings.channel_count());

        for channel in 0..settings.channel_count() {
            let spectrum = settings.spectrum.get(channel).copied().unwrap_or_default();
            let selection = self.spectrum_cache.select(
                channel,
                frame.spectrum(channel),
                0,
                spectrum.used,
                verdict,
            );
            if selection.is_empty() {
                graphs.push(ChannelGraph::new());
                continue;
            }

            let transform = ChannelTransform::spectrum(
                selection.values.interval,
                settings.horizontal.frequencybase,
                &spectrum,
            );
            let mut graph = ChannelGraph::new();
            transform.map_into(&selection.values.samples, &mut graph);
            graphs.push(graph);
        }
        graphs
    }

    fn generate_xy(&mut self, frame: &AcquisitionResult) -> GraphSet {
        // Held traces belong to the time-domain view.
        self.voltage_cache.invalidate_all();
        self.spectrum_cache.invalidate_all();

        let settings = &self.settings;
        let count = settings.channel_count();
        let mut voltage = vec![ChannelGraph::new(); count];

        let used_voltage = |channel: usize| {
            frame
                .voltage(channel)
                .filter(|values| settings.voltage_used(channel) && !values.is_empty())
        };

        for x_channel in (0..count).step_by(2) {
            let y_channel = x_channel + 1;
            if y_channel == count {
                break;
            }
            let (Some(xs), Some(ys)) = (used_voltage(x_channel), used_voltage(y_channel)) else {
                continue;
            };

            let x_settings = &settings.voltage[x_channel];
            let y_settings = &settings.voltage[y_channel];
            let graph = &mut voltage[x_channel];
            graph.reserve(xs.len().min(ys.len()));
            graph.extend(
                xs.samples
                    .iter()
                    .zip(&ys.samples)
                    .map(|(&x, &y)| xy_point(x, x_settings, y, y_settings)),
            );
        }

        GraphSet {
            format: GraphFormat::Xy,
            triggered: false,
            voltage,
            spectrum: vec![ChannelGraph::new(); count],
        }
    }
}

impl FrameProcessor for GraphGenerator {
    type Output = GraphSet;

    fn process_frame(&mut self, frame: &AcquisitionResult) -> Result<GraphSet, FrameError> {
        self.validate(frame)?;

        let graphs = match self.settings.horizontal.format {
            GraphFormat::Ty => {
                let (verdict, skip) = self.frame_trigger(frame);
                GraphSet {
                    format: GraphFormat::Ty,
                    triggered: verdict.triggered,
                    voltage: self.generate_voltage(frame, verdict, skip),
                    spectrum: self.generate_spectrum(frame, verdict),
                }
            }
            GraphFormat::Xy => self.generate_xy(frame),
        };

        self.ready = true;
        Ok(graphs)
    }

    fn reset(&mut self) {
        self.voltage_cache = TriggerTraceCache::new();
        self.spectrum_cache = TriggerTraceCache::new();
        self.ready = false;
    }
}

impl Reconfigurable<ScopeSettings> for GraphGenerator {
    fn update_config(&mut self, settings: ScopeSettings) {
        let format_changed = settings.horizontal.format != self.settings.horizontal.format;
        let channels_changed = settings.channel_count() != self.settings.channel_count();
        if format_changed || channels_changed {
            debug!("[graph] display layout changed; dropping held traces");
            self.voltage_cache.invalidate_all();
            self.spectrum_cache.invalidate_all();
        }
        self.settings = settings;
    }
}
