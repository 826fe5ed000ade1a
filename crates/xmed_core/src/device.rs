//! Explicit compute-device selection.

use burn_ndarray::NdArrayDevice;
use serde::{Deserialize, Serialize};

/// Compute device configuration.
///
/// The device is an explicit configuration value injected into the
/// classifier and explainers rather than a process-wide default. Only a
/// CPU device exists for the ndarray backend today; the enum leaves room
/// for accelerator variants without changing call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeviceConfig {
    /// CPU execution via the ndarray backend.
    #[default]
    Cpu,
}

impl DeviceConfig {
    /// Resolve to a concrete ndarray backend device.
    #[must_use]
    pub fn ndarray_device(&self) -> NdArrayDevice {
        match self {
            DeviceConfig::Cpu => NdArrayDevice::Cpu,
        }
    }
}
