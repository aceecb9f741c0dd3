//! Device runtime contract for Kiln-generated SYCL kernels.
//!
//! Generated packed functions take a queue, launch ranges and an array of
//! argument addresses. Hosting them needs a runtime that picks a device,
//! owns its queue, and moves buffers in and out of device memory. That
//! contract is [`BackendApi`]. [`SimulatedBackend`] implements it over host
//! memory for tests and for tooling that runs without a driver.
//!
//! ```
//! use kiln_runtime::{BackendApi, CopyDst, CopySrc, SimulatedBackend};
//!
//! let rt = SimulatedBackend::default();
//! let buf = rt.malloc(4)?;
//! rt.memcpy(CopyDst::Device(buf), CopySrc::Host(&[1, 2, 3, 4]), 4)?;
//! let mut back = [0u8; 4];
//! rt.memcpy(CopyDst::Host(&mut back), CopySrc::Device(buf), 4)?;
//! assert_eq!(back, [1, 2, 3, 4]);
//! rt.free(buf)?;
//! # Ok::<(), kiln_runtime::RuntimeError>(())
//! ```

mod device;
mod error;
mod memory;
mod queue;
mod simulated;

use kiln_ir::Arch;

pub use device::{DeviceInfo, DeviceProperty, PropertyValue};
pub use error::RuntimeError;
pub use memory::{CopyDst, CopySrc, DevicePtr, MemcpyKind};
pub use queue::QueueId;
pub use simulated::SimulatedBackend;

/// Operations a device runtime provides to generated kernels' hosts.
///
/// Operations that need a device select device 0 if none is selected yet,
/// initializing the runtime for the first available architecture.
pub trait BackendApi: Send + Sync {
    /// Initializes the runtime for `arch` and returns the resolved
    /// architecture. [`Arch::Unknown`] picks the first available device's.
    /// Once initialized, later calls return the first resolution.
    fn init(&self, arch: Arch) -> Result<Arch, RuntimeError>;

    /// Selects device `id`, creating its queue on first selection.
    fn set_device(&self, id: usize) -> Result<(), RuntimeError>;

    /// The selected device, if any.
    fn device(&self) -> Option<usize>;

    /// Queries `property` of device `device`, or of the selected device.
    fn device_property(
        &self,
        property: DeviceProperty,
        device: Option<usize>,
    ) -> Result<PropertyValue, RuntimeError>;

    /// Allocates `bytes` bytes of zeroed device memory, or fails with
    /// [`RuntimeError::OutOfMemory`].
    fn malloc(&self, bytes: usize) -> Result<DevicePtr, RuntimeError>;

    /// Frees an allocation returned by [`malloc`](Self::malloc).
    fn free(&self, ptr: DevicePtr) -> Result<(), RuntimeError>;

    /// Sets `bytes` bytes at `ptr` to `value` and waits for completion.
    fn memset(&self, ptr: DevicePtr, value: u8, bytes: usize) -> Result<(), RuntimeError>;

    /// Copies `bytes` bytes and waits for completion.
    fn memcpy(&self, dst: CopyDst<'_>, src: CopySrc<'_>, bytes: usize) -> Result<(), RuntimeError>;

    /// Waits for every queue of every device.
    fn device_sync(&self) -> Result<(), RuntimeError>;

    /// The selected device's queue.
    fn queue(&self) -> Result<QueueId, RuntimeError>;

    /// Waits for one queue.
    fn stream_sync(&self, queue: QueueId) -> Result<(), RuntimeError>;

    /// Architecture name of the selected device for the device compiler,
    /// e.g. `sm_86`.
    fn gpu_version(&self) -> Result<String, RuntimeError>;
}
