use kiln_ir::Arch;

use crate::device::DeviceProperty;
use crate::memory::DevicePtr;
use crate::queue::QueueId;

/// Errors reported by a [`BackendApi`](crate::BackendApi).
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("architecture {0:?} is not supported by the SYCL runtime")]
    UnsupportedArch(Arch),

    #[error("no device matches architecture {0:?}")]
    NoDevice(Arch),

    #[error("invalid device id {id} ({count} device(s) available)")]
    InvalidDevice { id: usize, count: usize },

    #[error("device property {0} is not supported")]
    UnsupportedProperty(DeviceProperty),

    #[error("cannot allocate {bytes} byte(s) of device memory")]
    OutOfMemory { bytes: usize },

    #[error("{0} is not a live device allocation")]
    UnknownPointer(DevicePtr),

    #[error("access of {bytes} byte(s) at {ptr} exceeds its allocation ({available} byte(s) left)")]
    OutOfBounds {
        ptr: DevicePtr,
        bytes: usize,
        available: usize,
    },

    #[error("host buffer holds {len} byte(s), {bytes} requested")]
    HostBufferTooSmall { len: usize, bytes: usize },

    #[error("unknown queue {0}")]
    UnknownQueue(QueueId),
}
