//! Maps `Box<dyn Error>` from the `Device` boundary to a typed `SamplerError`.
//!
//! `sampler_traits` uses `Box<dyn Error + Send + Sync>` so any backend fits;
//! with the `hardware-errors` feature the known `HwError` variants are
//! downcast precisely.

use crate::error::SamplerError;

/// Map a device error to a typed `SamplerError`.
///
/// Every failure on the link counts as lost connectivity except protocol
/// violations, which point at a bug on our side rather than a cable.
pub fn map_device_error(e: &(dyn std::error::Error + 'static)) -> SamplerError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<sampler_hardware::error::HwError>() {
            return match hw {
                sampler_hardware::error::HwError::Protocol(msg) => {
                    SamplerError::Device(format!("protocol violation: {msg}"))
                }
                other => SamplerError::Connectivity(other.to_string()),
            };
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    if s.to_lowercase().contains("protocol") {
        SamplerError::Device(s)
    } else {
        SamplerError::Connectivity(s)
    }
}
