//! GPU capability detection.
//!
//! An ordered probe chain measures total device memory: the NVML API first,
//! then an `nvidia-smi` query. Total failure is not an error; it means the
//! CPU-only tier, which is a fully supported configuration.

use nvml_wrapper::Nvml;

use crate::launch::activity_log::ActivityLog;
use crate::launch::command;

pub const BYTES_TO_GB: f64 = 1024.0 * 1024.0 * 1024.0;
pub const MB_TO_GB: f64 = 1024.0;

// Tier thresholds in GB of device memory, inclusive lower bounds.
pub const VERY_HIGH_GB: f64 = 42.0;
pub const HIGH_GB: f64 = 19.0;
pub const MID_GB: f64 = 9.0;

/// Outcome of a single probe.
#[derive(Clone, Debug, PartialEq)]
pub enum GpuReading {
    /// Total device memory in GB, with the device name when the probe
    /// exposes one.
    Detected { memory_gb: f64, name: Option<String> },
    Unavailable,
}

/// Discrete capability classes, ordered. Boundary values land in the
/// higher class (every threshold is an inclusive lower bound).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum CapabilityTier {
    None,
    Low,
    Mid,
    High,
    VeryHigh,
}

impl CapabilityTier {
    pub fn from_memory_gb(memory_gb: f64) -> Self {
        if memory_gb >= VERY_HIGH_GB {
            CapabilityTier::VeryHigh
        } else if memory_gb >= HIGH_GB {
            CapabilityTier::High
        } else if memory_gb >= MID_GB {
            CapabilityTier::Mid
        } else if memory_gb > 0.0 {
            CapabilityTier::Low
        } else {
            CapabilityTier::None
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CapabilityTier::None => "none (CPU only)",
            CapabilityTier::Low => "low",
            CapabilityTier::Mid => "mid",
            CapabilityTier::High => "high",
            CapabilityTier::VeryHigh => "very high",
        }
    }
}

/// Measured GPU memory in GB, 0.0 when no probe succeeds.
pub fn detect_gpu_memory_gb(log: &ActivityLog) -> f64 {
    for probe in [probe_nvml, probe_nvidia_smi] {
        if let GpuReading::Detected { memory_gb, name } = probe() {
            match name {
                Some(name) => {
                    log.info(&format!("GPU detected: {name} ({memory_gb:.1} GB)"));
                }
                None => log.info(&format!("GPU detected: {memory_gb:.1} GB")),
            }
            return memory_gb;
        }
    }
    log.warn("No compatible GPU found. Assuming CPU only.");
    0.0
}

fn probe_nvml() -> GpuReading {
    let Ok(nvml) = Nvml::init() else {
        return GpuReading::Unavailable;
    };
    let Ok(device) = nvml.device_by_index(0) else {
        return GpuReading::Unavailable;
    };
    let Ok(mem_info) = device.memory_info() else {
        return GpuReading::Unavailable;
    };
    GpuReading::Detected {
        memory_gb: mem_info.total as f64 / BYTES_TO_GB,
        name: device.name().ok(),
    }
}

fn probe_nvidia_smi() -> GpuReading {
    let Some(out) = command::try_output(
        "nvidia-smi",
        &["--query-gpu=memory.total", "--format=csv,noheader,nounits"],
    ) else {
        return GpuReading::Unavailable;
    };
    // One line per device, value in MiB; device 0 is the first line.
    match out.lines().next().and_then(|l| l.trim().parse::<f64>().ok()) {
        Some(total_mb) => GpuReading::Detected {
            memory_gb: total_mb / MB_TO_GB,
            name: None,
        },
        None => GpuReading::Unavailable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries_are_inclusive() {
        // Equality at a threshold selects the higher tier.
        assert_eq!(CapabilityTier::from_memory_gb(42.0), CapabilityTier::VeryHigh);
        assert_eq!(CapabilityTier::from_memory_gb(19.0), CapabilityTier::High);
        assert_eq!(CapabilityTier::from_memory_gb(9.0), CapabilityTier::Mid);
    }

    #[test]
    fn test_tier_ladder() {
        assert_eq!(CapabilityTier::from_memory_gb(80.0), CapabilityTier::VeryHigh);
        assert_eq!(CapabilityTier::from_memory_gb(41.9), CapabilityTier::High);
        assert_eq!(CapabilityTier::from_memory_gb(24.0), CapabilityTier::High);
        assert_eq!(CapabilityTier::from_memory_gb(12.0), CapabilityTier::Mid);
        assert_eq!(CapabilityTier::from_memory_gb(8.0), CapabilityTier::Low);
        assert_eq!(CapabilityTier::from_memory_gb(0.5), CapabilityTier::Low);
        assert_eq!(CapabilityTier::from_memory_gb(0.0), CapabilityTier::None);
    }

    #[test]
    fn test_tiers_are_ordered() {
        assert!(CapabilityTier::None < CapabilityTier::Low);
        assert!(CapabilityTier::Low < CapabilityTier::Mid);
        assert!(CapabilityTier::Mid < CapabilityTier::High);
        assert!(CapabilityTier::High < CapabilityTier::VeryHigh);
    }
}
