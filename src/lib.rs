pub mod acquisition;
pub mod dsp;
pub mod settings;
pub mod util;

pub use acquisition::{AcquisitionResult, ChannelData, SampleValues};
pub use dsp::graph::{GraphGenerator, GraphPoint, GraphSet};
pub use dsp::{FrameError, FrameProcessor, MAX_SAMPLE_COUNT, Reconfigurable};
pub use settings::ScopeSettings;
