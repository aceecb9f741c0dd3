//! A [`BackendApi`] over host memory.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use kiln_ir::Arch;

use crate::device::{DeviceInfo, DeviceProperty, PropertyValue};
use crate::error::RuntimeError;
use crate::memory::{CopyDst, CopySrc, DevicePtr, MemcpyKind};
use crate::queue::{Queue, QueueId};
use crate::BackendApi;

/// First address handed out; keeps null distinguishable.
const BASE_ADDR: u64 = 0x1000;
const ALLOC_ALIGN: u64 = 256;
/// SYCL exposes no grid limit; these match what CUDA devices report.
const MAX_GRID_DIMS: [usize; 3] = [2_097_151, 1024, 1024];

#[derive(Debug)]
struct Allocation {
    device: usize,
    data: Vec<u8>,
}

#[derive(Debug)]
struct State {
    arch: Option<Arch>,
    devices: Vec<DeviceInfo>,
    /// One in-order queue per device, created when the device is first selected.
    queues: Vec<Option<Queue>>,
    current: Option<usize>,
    allocations: BTreeMap<u64, Allocation>,
    next_addr: u64,
}

impl State {
    /// Base address and offset of `len` bytes at `ptr`.
    fn locate(&self, ptr: DevicePtr, len: usize) -> Result<(u64, usize), RuntimeError> {
        let (&base, alloc) = self
            .allocations
            .range(..=ptr.0)
            .next_back()
            .ok_or(RuntimeError::UnknownPointer(ptr))?;
        let offset = usize::try_from(ptr.0 - base).map_err(|_| RuntimeError::UnknownPointer(ptr))?;
        if offset > alloc.data.len() {
            return Err(RuntimeError::UnknownPointer(ptr));
        }
        let available = alloc.data.len() - offset;
        if len > available {
            return Err(RuntimeError::OutOfBounds {
                ptr,
                bytes: len,
                available,
            });
        }
        Ok((base, offset))
    }

    fn bytes(&self, ptr: DevicePtr, len: usize) -> Result<&[u8], RuntimeError> {
        let (base, offset) = self.locate(ptr, len)?;
        let alloc = self
            .allocations
            .get(&base)
            .ok_or(RuntimeError::UnknownPointer(ptr))?;
        Ok(&alloc.data[offset..offset + len])
    }

    fn bytes_mut(&mut self, ptr: DevicePtr, len: usize) -> Result<&mut [u8], RuntimeError> {
        let (base, offset) = self.locate(ptr, len)?;
        let alloc = self
            .allocations
            .get_mut(&base)
            .ok_or(RuntimeError::UnknownPointer(ptr))?;
        Ok(&mut alloc.data[offset..offset + len])
    }

    fn current_queue(&mut self) -> Option<&mut Queue> {
        let device = self.current?;
        self.queues.get_mut(device)?.as_mut()
    }
}

/// Simulated SYCL runtime backed by host memory.
///
/// Devices are described by [`DeviceInfo`]; commands complete as soon as
/// they are submitted. Device selection is lazy: the first operation that
/// needs a device initializes the runtime for the first listed device's
/// architecture and selects device 0.
#[derive(Debug)]
pub struct SimulatedBackend {
    available: Vec<DeviceInfo>,
    state: Mutex<State>,
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new(vec![DeviceInfo::intel_gpu()])
    }
}

impl SimulatedBackend {
    pub fn new(available: Vec<DeviceInfo>) -> Self {
        Self {
            available,
            state: Mutex::new(State {
                arch: None,
                devices: Vec::new(),
                queues: Vec::new(),
                current: None,
                allocations: BTreeMap::new(),
                next_addr: BASE_ADDR,
            }),
        }
    }

    /// Number of allocations not yet freed.
    pub fn live_allocations(&self) -> usize {
        self.lock().allocations.len()
    }

    /// Commands `queue` has completed through synchronization.
    pub fn completed_commands(&self, queue: QueueId) -> Option<usize> {
        let st = self.lock();
        let q = st.queues.get(queue.device)?.as_ref()?;
        (queue.index == 0).then(|| q.completed())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn init_locked(&self, st: &mut State, arch: Arch) -> Result<Arch, RuntimeError> {
        if let Some(resolved) = st.arch {
            return Ok(resolved);
        }
        let wanted = match arch {
            Arch::Unknown => self
                .available
                .first()
                .map(|d| d.arch)
                .ok_or(RuntimeError::NoDevice(arch))?,
            other => other,
        };
        if !matches!(wanted, Arch::NvGpu | Arch::AmdGpu | Arch::IntelGpu) {
            return Err(RuntimeError::UnsupportedArch(wanted));
        }
        let devices: Vec<_> = self
            .available
            .iter()
            .filter(|d| d.arch == wanted)
            .cloned()
            .collect();
        if devices.is_empty() {
            return Err(RuntimeError::NoDevice(wanted));
        }
        log::debug!("SYCL runtime: {} {wanted:?} device(s)", devices.len());
        st.queues = devices.iter().map(|_| None).collect();
        st.devices = devices;
        st.arch = Some(wanted);
        Ok(wanted)
    }

    fn set_device_locked(&self, st: &mut State, id: usize) -> Result<(), RuntimeError> {
        self.init_locked(st, Arch::Unknown)?;
        let count = st.devices.len();
        let slot = st
            .queues
            .get_mut(id)
            .ok_or(RuntimeError::InvalidDevice { id, count })?;
        if slot.is_none() {
            log::debug!("SYCL runtime: creating in-order queue for device {id}");
            *slot = Some(Queue::default());
        }
        st.current = Some(id);
        Ok(())
    }

    /// The selected device, selecting device 0 on first use.
    fn ensure_device(&self, st: &mut State) -> Result<usize, RuntimeError> {
        match st.current {
            Some(id) => Ok(id),
            None => {
                self.set_device_locked(st, 0)?;
                Ok(0)
            }
        }
    }

    fn run_on_current_queue(st: &mut State) {
        if let Some(queue) = st.current_queue() {
            queue.submit();
            queue.wait();
        }
    }
}

impl BackendApi for SimulatedBackend {
    fn init(&self, arch: Arch) -> Result<Arch, RuntimeError> {
        let mut st = self.lock();
        self.init_locked(&mut st, arch)
    }

    fn set_device(&self, id: usize) -> Result<(), RuntimeError> {
        let mut st = self.lock();
        self.set_device_locked(&mut st, id)
    }

    fn device(&self) -> Option<usize> {
        self.lock().current
    }

    fn device_property(
        &self,
        property: DeviceProperty,
        device: Option<usize>,
    ) -> Result<PropertyValue, RuntimeError> {
        let mut st = self.lock();
        let id = match device {
            Some(id) => {
                self.init_locked(&mut st, Arch::Unknown)?;
                id
            }
            None => self.ensure_device(&mut st)?,
        };
        let info = st.devices.get(id).ok_or(RuntimeError::InvalidDevice {
            id,
            count: st.devices.len(),
        })?;
        let value = match property {
            DeviceProperty::MaxWorkGroupDims => PropertyValue::Dims([info.max_work_group_size; 3]),
            DeviceProperty::MaxGridDims => PropertyValue::Dims(MAX_GRID_DIMS),
            DeviceProperty::MaxSharedMemoryPerGroup => PropertyValue::Scalar(info.local_mem_size),
            DeviceProperty::MaxThreadsPerGroup | DeviceProperty::MaxThreadsPerComputeUnit => {
                PropertyValue::Scalar(info.max_work_group_size)
            }
            DeviceProperty::ComputeUnitCount => PropertyValue::Scalar(info.compute_units),
            DeviceProperty::SubGroupSize => PropertyValue::Scalar(info.max_sub_group_size()),
            DeviceProperty::MaxGroupsPerComputeUnit => {
                return Err(RuntimeError::UnsupportedProperty(property))
            }
        };
        Ok(value)
    }

    fn malloc(&self, bytes: usize) -> Result<DevicePtr, RuntimeError> {
        let mut st = self.lock();
        let device = self.ensure_device(&mut st)?;
        let addr = st.next_addr;
        let next_addr = u64::try_from(bytes)
            .ok()
            .and_then(|b| b.max(1).div_ceil(ALLOC_ALIGN).checked_mul(ALLOC_ALIGN))
            .and_then(|span| addr.checked_add(span))
            .ok_or(RuntimeError::OutOfMemory { bytes })?;
        let mut data = Vec::new();
        data.try_reserve_exact(bytes)
            .map_err(|_| RuntimeError::OutOfMemory { bytes })?;
        data.resize(bytes, 0);
        st.next_addr = next_addr;
        st.allocations.insert(addr, Allocation { device, data });
        log::debug!("SYCL malloc: {bytes} byte(s) at {addr:#x} on device {device}");
        Ok(DevicePtr(addr))
    }

    fn free(&self, ptr: DevicePtr) -> Result<(), RuntimeError> {
        let mut st = self.lock();
        let alloc = st
            .allocations
            .remove(&ptr.0)
            .ok_or(RuntimeError::UnknownPointer(ptr))?;
        log::debug!(
            "SYCL free: {} byte(s) at {ptr} on device {}",
            alloc.data.len(),
            alloc.device
        );
        Ok(())
    }

    fn memset(&self, ptr: DevicePtr, value: u8, bytes: usize) -> Result<(), RuntimeError> {
        let mut st = self.lock();
        self.ensure_device(&mut st)?;
        st.bytes_mut(ptr, bytes)?.fill(value);
        Self::run_on_current_queue(&mut st);
        log::debug!("SYCL memset: {bytes} byte(s) at {ptr} to {value:#04x}");
        Ok(())
    }

    fn memcpy(&self, dst: CopyDst<'_>, src: CopySrc<'_>, bytes: usize) -> Result<(), RuntimeError> {
        let kind = MemcpyKind::of(&dst, &src);
        let mut st = self.lock();
        self.ensure_device(&mut st)?;
        if let CopyDst::Host(host) = &dst {
            if host.len() < bytes {
                return Err(RuntimeError::HostBufferTooSmall {
                    len: host.len(),
                    bytes,
                });
            }
        }
        let data = match src {
            CopySrc::Host(host) => host
                .get(..bytes)
                .ok_or(RuntimeError::HostBufferTooSmall {
                    len: host.len(),
                    bytes,
                })?
                .to_vec(),
            CopySrc::Device(ptr) => st.bytes(ptr, bytes)?.to_vec(),
        };
        match dst {
            CopyDst::Host(host) => host[..bytes].copy_from_slice(&data),
            CopyDst::Device(ptr) => st.bytes_mut(ptr, bytes)?.copy_from_slice(&data),
        }
        Self::run_on_current_queue(&mut st);
        log::debug!("SYCL memcpy: {bytes} byte(s) {kind}");
        Ok(())
    }

    fn device_sync(&self) -> Result<(), RuntimeError> {
        let mut st = self.lock();
        self.ensure_device(&mut st)?;
        let drained: usize = st.queues.iter_mut().flatten().map(Queue::wait).sum();
        log::debug!("SYCL device sync: {drained} pending command(s)");
        Ok(())
    }

    fn queue(&self) -> Result<QueueId, RuntimeError> {
        let mut st = self.lock();
        let device = self.ensure_device(&mut st)?;
        Ok(QueueId { device, index: 0 })
    }

    fn stream_sync(&self, queue: QueueId) -> Result<(), RuntimeError> {
        let mut st = self.lock();
        let q = st
            .queues
            .get_mut(queue.device)
            .and_then(Option::as_mut)
            .filter(|_| queue.index == 0)
            .ok_or(RuntimeError::UnknownQueue(queue))?;
        let drained = q.wait();
        log::debug!("SYCL stream sync on {queue}: {drained} pending command(s)");
        Ok(())
    }

    fn gpu_version(&self) -> Result<String, RuntimeError> {
        let mut st = self.lock();
        let device = self.ensure_device(&mut st)?;
        Ok(st
            .devices
            .get(device)
            .map(DeviceInfo::gpu_version)
            .unwrap_or_default())
    }
}
