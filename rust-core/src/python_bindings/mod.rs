//! PyO3 bindings for Python integration

use pyo3::prelude::*;

mod gate_bindings;
#[cfg(feature = "live")]
mod monitor_bindings;

/// Python module definition
#[pymodule]
fn spectral_gate(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<gate_bindings::PySpectralGate>()?;

    #[cfg(feature = "live")]
    {
        m.add_class::<monitor_bindings::PyLiveMonitor>()?;
        m.add_class::<monitor_bindings::PyAudioDeviceInfo>()?;
    }

    Ok(())
}
