//! Device pointers and copy endpoints.

use std::fmt;

/// An address in device memory.
///
/// Opaque outside the runtime that handed it out; pointer arithmetic is
/// limited to [`offset`](Self::offset).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DevicePtr(pub(crate) u64);

impl DevicePtr {
    #[must_use]
    pub const fn null() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn as_raw(self) -> u64 {
        self.0
    }

    /// The pointer `bytes` bytes past this one.
    #[must_use]
    pub const fn offset(self, bytes: usize) -> Self {
        Self(self.0 + bytes as u64)
    }
}

impl fmt::Display for DevicePtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Where a copy reads from.
#[derive(Clone, Copy, Debug)]
pub enum CopySrc<'a> {
    Host(&'a [u8]),
    Device(DevicePtr),
}

/// Where a copy writes to.
#[derive(Debug)]
pub enum CopyDst<'a> {
    Host(&'a mut [u8]),
    Device(DevicePtr),
}

/// Direction of a copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemcpyKind {
    HostToHost,
    HostToDevice,
    DeviceToHost,
    DeviceToDevice,
}

impl MemcpyKind {
    pub fn of(dst: &CopyDst<'_>, src: &CopySrc<'_>) -> Self {
        match (dst, src) {
            (CopyDst::Host(_), CopySrc::Host(_)) => Self::HostToHost,
            (CopyDst::Device(_), CopySrc::Host(_)) => Self::HostToDevice,
            (CopyDst::Host(_), CopySrc::Device(_)) => Self::DeviceToHost,
            (CopyDst::Device(_), CopySrc::Device(_)) => Self::DeviceToDevice,
        }
    }
}

impl fmt::Display for MemcpyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::HostToHost => "host-to-host",
            Self::HostToDevice => "host-to-device",
            Self::DeviceToHost => "device-to-host",
            Self::DeviceToDevice => "device-to-device",
        })
    }
}
