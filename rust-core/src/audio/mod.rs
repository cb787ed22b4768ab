//! Stream processing and live audio I/O

pub mod params;
pub mod pipeline;
pub mod processor;

#[cfg(feature = "live")]
pub mod buffer;
#[cfg(feature = "live")]
pub mod input;
#[cfg(feature = "live")]
pub mod monitor;
#[cfg(feature = "live")]
pub mod output;

pub use params::GateParameters;
pub use pipeline::{FrameProcessor, OverlapAddPipeline};
pub use processor::{ProcessorState, SpectralGateProcessor};

#[cfg(feature = "live")]
pub use buffer::AudioRingBuffer;
#[cfg(feature = "live")]
pub use input::{list_input_devices, AudioDeviceInfo, AudioError, AudioInput};
#[cfg(feature = "live")]
pub use monitor::{LiveMonitor, MonitorDevices};
#[cfg(feature = "live")]
pub use output::{list_output_devices, AudioOutput};
