//! Per-frame acquisition data handed over by the capture layer.

pub mod synthetic;

/// Sample sequence of one channel in one view, plus its spacing.
///
/// For voltage data `interval` is seconds per sample; for spectrum data it is
/// hertz per bin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleValues {
    pub samples: Vec<f64>,
    pub interval: f64,
}

pub(crate) static EMPTY_VALUES: SampleValues = SampleValues {
    samples: Vec::new(),
    interval: 0.0,
};

impl SampleValues {
    pub fn new(samples: Vec<f64>, interval: f64) -> Self {
        Self { samples, interval }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelData {
    pub voltage: SampleValues,
    pub spectrum: SampleValues,
}

impl ChannelData {
    pub fn from_voltage(voltage: SampleValues) -> Self {
        Self {
            voltage,
            spectrum: SampleValues::default(),
        }
    }
}

/// One acquisition cycle across all channels.
#[derive(Debug, Clone, Default)]
pub struct AcquisitionResult {
    channels: Vec<Option<ChannelData>>,
    /// Hardware trigger verdict, used when no software trigger locator runs.
    pub triggered: bool,
}

impl AcquisitionResult {
    pub fn new(channels: Vec<Option<ChannelData>>, triggered: bool) -> Self {
        Self {
            channels,
            triggered,
        }
    }

    /// Builds a frame from plain voltage traces sharing one sample interval.
    pub fn from_voltages<I>(traces: I, interval: f64, triggered: bool) -> Self
    where
        I: IntoIterator<Item = Vec<f64>>,
    {
        let channels = traces
            .into_iter()
            .map(|samples| Some(ChannelData::from_voltage(SampleValues::new(samples, interval))))
            .collect();
        Self::new(channels, triggered)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn data(&self, channel: usize) -> Option<&ChannelData> {
        self.channels.get(channel).and_then(Option::as_ref)
    }

    pub fn voltage(&self, channel: usize) -> Option<&SampleValues> {
        self.data(channel).map(|data| &data.voltage)
    }

    pub fn spectrum(&self, channel: usize) -> Option<&SampleValues> {
        self.data(channel).map(|data| &data.spectrum)
    }

    /// Stores computed spectra; `None` entries leave a channel untouched.
    pub fn attach_spectra(&mut self, spectra: Vec<Option<SampleValues>>) {
        for (slot, spectrum) in self.channels.iter_mut().zip(spectra) {
            if let (Some(data), Some(spectrum)) = (slot.as_mut(), spectrum) {
                data.spectrum = spectrum;
            }
        }
    }
}
