//! Compilation targets.

use serde::{Deserialize, Serialize};

/// Source language a backend emits.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Language {
    C,
    Cuda,
    Sycl,
}

/// Device architecture family.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Arch {
    /// Resolved by the runtime at initialization.
    #[default]
    Unknown,
    X86,
    NvGpu,
    AmdGpu,
    IntelGpu,
}

/// A language/architecture pair.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub language: Language,
    pub arch: Arch,
}

impl Target {
    /// SYCL source for a device the runtime picks at initialization.
    pub const fn sycl() -> Self {
        Self {
            language: Language::Sycl,
            arch: Arch::Unknown,
        }
    }

    pub const fn new(language: Language, arch: Arch) -> Self {
        Self { language, arch }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}/{:?}", self.language, self.arch)
    }
}
