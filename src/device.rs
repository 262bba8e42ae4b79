//! Inference device selection

use crate::error::{Result, InsightError};
use candle_core::Device;
use log::{info, warn};

pub const DEVICE_ENV: &str = "RESUME_INSIGHT_DEVICE";

/// Get the best available device for inference (GPU if available, CPU fallback)
pub fn best_device() -> Device {
    #[cfg(feature = "cuda")]
    {
        if let Ok(device) = Device::new_cuda(0) {
            info!("Using CUDA GPU for inference");
            return device;
        }
    }

    if cfg!(target_os = "macos") {
        match Device::new_metal(0) {
            Ok(device) => {
                info!("Using Metal GPU for inference");
                return device;
            }
            Err(e) => warn!("Metal GPU initialization failed: {}", e),
        }
    }

    info!("No GPU available, using CPU");
    Device::Cpu
}

/// Device named by `RESUME_INSIGHT_DEVICE`, or auto-detection when unset
pub fn device_with_override() -> Result<Device> {
    let Ok(preference) = std::env::var(DEVICE_ENV) else {
        return Ok(best_device());
    };

    match preference.to_lowercase().as_str() {
        "cpu" => Ok(Device::Cpu),
        "cuda" => Device::new_cuda(0)
            .map_err(|e| InsightError::ModelLoading(format!("Failed to initialize CUDA: {}", e))),
        "metal" => Device::new_metal(0)
            .map_err(|e| InsightError::ModelLoading(format!("Failed to initialize Metal: {}", e))),
        other => {
            warn!("Unknown device '{}', falling back to auto-detection", other);
            Ok(best_device())
        }
    }
}
