//! Read-only access to the running kernel's identification.
//!
//! C header: `include/linux/utsname.h`

use core::ffi::CStr;

/// Accessor for the host's release identifier (`uname -r`).
pub trait UtsName {
    fn release(&self) -> &str;
}

impl<U: UtsName + ?Sized> UtsName for &U {
    fn release(&self) -> &str {
        (**self).release()
    }
}

/// A release identifier fixed at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedRelease(pub &'static str);

impl UtsName for FixedRelease {
    fn release(&self) -> &str {
        self.0
    }
}

/// `utsname()->release` of the namespace the caller runs in.
#[cfg(feature = "kbuild")]
#[derive(Debug, Clone, Copy, Default)]
pub struct KernelUtsName;

#[cfg(feature = "kbuild")]
extern "C" {
    fn rust_helper_utsname_release() -> *const core::ffi::c_char;
}

#[cfg(feature = "kbuild")]
impl UtsName for KernelUtsName {
    fn release(&self) -> &str {
        // SAFETY: The helper returns the `release` field of the current uts
        // namespace, a NUL-terminated array that lives as long as the namespace.
        let release = unsafe { CStr::from_ptr(rust_helper_utsname_release()) };
        release_str(release)
    }
}

/// Views a raw `utsname` release field as text, falling back to `"unknown"`
/// when it is not UTF-8.
pub fn release_str(raw: &CStr) -> &str {
    raw.to_str().unwrap_or("unknown")
}

/// The numeric part of a release such as `6.12.0-android15-8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct KernelVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl KernelVersion {
    /// Parses the leading `major.minor[.patch]` of a release string.
    ///
    /// Anything after the first `-` or `+` is ignored; a missing patch level
    /// reads as 0.
    pub fn parse(release: &str) -> Option<KernelVersion> {
        let numeric = release.split(['-', '+']).next()?;
        let mut parts = numeric.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = match parts.next() {
            Some(p) => p.parse().ok()?,
            None => 0,
        };
        Some(KernelVersion {
            major,
            minor,
            patch,
        })
    }
}

impl core::fmt::Display for KernelVersion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
