//! Device descriptions and queryable properties.

use std::fmt;

use kiln_ir::Arch;
use serde::{Deserialize, Serialize};

/// A device the runtime can launch kernels on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Human-readable device name.
    pub name: String,

    /// Architecture family, which decides the driver backend.
    pub arch: Arch,

    /// Driver-reported version string.
    ///
    /// NVIDIA: compute capability, e.g. `8.6`.
    /// AMD: GFX target with feature flags, e.g. `gfx90a:sramecc+:xnack-`.
    pub version: String,

    /// Maximum work-items per work-group.
    pub max_work_group_size: usize,

    /// Work-group local memory in bytes.
    pub local_mem_size: usize,

    /// Number of compute units.
    pub compute_units: usize,

    /// Supported sub-group sizes.
    pub sub_group_sizes: Vec<usize>,
}

impl DeviceInfo {
    /// A simulated Intel GPU.
    #[must_use]
    pub fn intel_gpu() -> Self {
        Self {
            name: "Simulated Intel GPU".to_string(),
            arch: Arch::IntelGpu,
            version: "1.3".to_string(),
            max_work_group_size: 1024,
            local_mem_size: 64 * 1024,
            compute_units: 512,
            sub_group_sizes: vec![8, 16, 32],
        }
    }

    /// A simulated NVIDIA GPU with compute capability 8.6.
    #[must_use]
    pub fn nvidia_gpu() -> Self {
        Self {
            name: "Simulated NVIDIA GPU".to_string(),
            arch: Arch::NvGpu,
            version: "8.6".to_string(),
            max_work_group_size: 1024,
            local_mem_size: 48 * 1024,
            compute_units: 84,
            sub_group_sizes: vec![32],
        }
    }

    /// A simulated AMD GPU.
    #[must_use]
    pub fn amd_gpu() -> Self {
        Self {
            name: "Simulated AMD GPU".to_string(),
            arch: Arch::AmdGpu,
            version: "gfx90a:sramecc+:xnack-".to_string(),
            max_work_group_size: 1024,
            local_mem_size: 64 * 1024,
            compute_units: 110,
            sub_group_sizes: vec![64],
        }
    }

    /// Architecture name handed to the device compiler.
    ///
    /// `sm_<major><minor>` for NVIDIA, the bare GFX target for AMD, and an
    /// empty string where the driver picks the target itself.
    #[must_use]
    pub fn gpu_version(&self) -> String {
        match self.arch {
            Arch::NvGpu => match self.version.split_once('.') {
                Some((major, minor)) => format!("sm_{major}{minor}"),
                None => "sm_".to_string(),
            },
            Arch::AmdGpu => self
                .version
                .split_once(':')
                .map_or(self.version.as_str(), |(target, _)| target)
                .to_string(),
            Arch::IntelGpu | Arch::X86 | Arch::Unknown => String::new(),
        }
    }

    /// Largest supported sub-group size.
    #[must_use]
    pub fn max_sub_group_size(&self) -> usize {
        self.sub_group_sizes.iter().copied().max().unwrap_or(1)
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.name, self.arch)
    }
}

/// A device property that can be queried through
/// [`BackendApi::device_property`](crate::BackendApi::device_property).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceProperty {
    /// Maximum work-group extent per dimension.
    MaxWorkGroupDims,
    /// Maximum number of work-groups per dimension.
    MaxGridDims,
    /// Local memory per work-group, in bytes.
    MaxSharedMemoryPerGroup,
    /// Maximum work-items per work-group.
    MaxThreadsPerGroup,
    /// Maximum work-items resident on one compute unit.
    MaxThreadsPerComputeUnit,
    /// Number of compute units.
    ComputeUnitCount,
    /// Maximum work-groups resident on one compute unit. Not exposed by SYCL.
    MaxGroupsPerComputeUnit,
    /// Largest sub-group size.
    SubGroupSize,
}

impl fmt::Display for DeviceProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The value of a [`DeviceProperty`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropertyValue {
    Scalar(usize),
    /// Per-dimension values, x first.
    Dims([usize; 3]),
}

impl PropertyValue {
    pub fn as_scalar(self) -> Option<usize> {
        match self {
            Self::Scalar(v) => Some(v),
            Self::Dims(_) => None,
        }
    }

    pub fn as_dims(self) -> Option<[usize; 3]> {
        match self {
            Self::Dims(d) => Some(d),
            Self::Scalar(_) => None,
        }
    }
}
