use core::fmt;

use crate::{
    error::KernelResult as Result,
    printk::{Level, Printk},
    utsname::UtsName,
};

/// The top level entrypoint to implementing a kernel module.
pub trait Module: Sized + Sync {
    /// Called at module initialization time.
    ///
    /// Use this method to perform whatever setup or registration your module
    /// should do.
    ///
    /// Equivalent to the `module_init` macro in the C API.
    fn init(module: &'static ThisModule, env: &Env<'_>) -> Result<Self>;

    /// Called once when the module is removed. Consumes the instance created
    /// by [`Module::init`].
    ///
    /// Equivalent to the `module_exit` macro in the C API. The default just
    /// drops `self`, so teardown may also live in a [`Drop`] impl.
    fn exit(self, _env: &Env<'_>) {}
}

/// What the host hands to a module's entry points: somewhere to log and a way
/// to read the running kernel's identification.
#[derive(Clone, Copy)]
pub struct Env<'a> {
    sink: &'a dyn Printk,
    uts: &'a dyn UtsName,
}

impl<'a> Env<'a> {
    pub fn new(sink: &'a dyn Printk, uts: &'a dyn UtsName) -> Self {
        Env { sink, uts }
    }

    /// The environment of the running kernel.
    #[cfg(feature = "kbuild")]
    pub fn kernel() -> Env<'static> {
        Env::new(
            &crate::printk::KernelPrintk,
            &crate::utsname::KernelUtsName,
        )
    }

    /// The host's release identifier.
    pub fn release(&self) -> &'a str {
        self.uts.release()
    }
}

impl Printk for Env<'_> {
    fn printk(&self, level: Level, args: fmt::Arguments<'_>) {
        self.sink.printk(level, args)
    }
}

impl fmt::Debug for Env<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env")
            .field("release", &self.release())
            .finish_non_exhaustive()
    }
}

/// Static descriptive attributes, as found in the `.modinfo` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleInfo {
    pub name: &'static str,
    pub author: &'static str,
    pub description: &'static str,
    pub license: &'static str,
    pub version: &'static str,
}

/// Licenses `include/linux/license.h` treats as GPL-compatible.
const GPL_COMPATIBLE: &[&str] = &[
    "GPL",
    "GPL v2",
    "GPL and additional rights",
    "Dual BSD/GPL",
    "Dual MIT/GPL",
    "Dual MPL/GPL",
];

impl ModuleInfo {
    pub const fn new(
        name: &'static str,
        author: &'static str,
        description: &'static str,
        license: &'static str,
        version: &'static str,
    ) -> Self {
        ModuleInfo {
            name,
            author,
            description,
            license,
            version,
        }
    }

    pub fn is_gpl_compatible(&self) -> bool {
        GPL_COMPATIBLE.contains(&self.license)
    }

    /// `key=value` pairs in the order `module!` emits them.
    pub fn modinfo_entries(&self) -> [(&'static str, &'static str); 4] {
        [
            ("license", self.license),
            ("author", self.author),
            ("description", self.description),
            ("version", self.version),
        ]
    }
}

/// Opaque stand-in for the C `struct module`.
#[repr(C)]
pub struct RawModule {
    _opaque: [u8; 0],
}

#[cfg(feature = "kbuild")]
extern "C" {
    /// Emitted by modpost into `<module>.mod.c`.
    pub static mut __this_module: RawModule;
}

/// Equivalent to `THIS_MODULE` in the C API.
///
/// C header: `include/linux/export.h`
pub struct ThisModule {
    ptr: *mut RawModule,
    info: &'static ModuleInfo,
}

// SAFETY: `THIS_MODULE` may be used from all threads within a module.
unsafe impl Sync for ThisModule {}

impl ThisModule {
    /// A module that has no C `struct module` behind it, as used by
    /// [`crate::host::Host`].
    pub const fn new(info: &'static ModuleInfo) -> ThisModule {
        ThisModule {
            ptr: core::ptr::null_mut(),
            info,
        }
    }

    /// Creates a [`ThisModule`] given the `THIS_MODULE` pointer.
    ///
    /// # Safety
    ///
    /// The pointer must be equal to the right `THIS_MODULE`.
    pub const unsafe fn from_ptr(ptr: *mut RawModule, info: &'static ModuleInfo) -> ThisModule {
        ThisModule { ptr, info }
    }

    pub fn as_ptr(&self) -> *mut RawModule {
        self.ptr
    }

    pub fn info(&self) -> &'static ModuleInfo {
        self.info
    }

    pub fn name(&self) -> &'static str {
        self.info.name
    }
}

impl fmt::Debug for ThisModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThisModule")
            .field("name", &self.info.name)
            .field("ptr", &self.ptr)
            .finish()
    }
}

/// The two entry points a host calls: activation and deactivation.
pub struct Registration<M> {
    pub activate: fn(&'static ThisModule, &Env<'_>) -> Result<M>,
    pub deactivate: fn(M, &Env<'_>),
}

impl<M: Module> Registration<M> {
    pub const fn of() -> Self {
        Registration {
            activate: M::init,
            deactivate: M::exit,
        }
    }
}

impl<M> Clone for Registration<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for Registration<M> {}

#[doc(hidden)]
pub const fn modinfo_bytes<const N: usize>(entry: &str) -> [u8; N] {
    let bytes = entry.as_bytes();
    let mut out = [0u8; N];
    let mut i = 0;
    while i < N {
        out[i] = bytes[i];
        i += 1;
    }
    out
}

#[doc(hidden)]
#[macro_export]
macro_rules! __modinfo {
    ($ident:ident, $key:literal, $value:literal) => {
        #[cfg(feature = "kbuild")]
        #[link_section = ".modinfo"]
        #[used]
        static $ident: [u8; concat!($key, "=", $value, "\0").len()] =
            $crate::module::modinfo_bytes(concat!($key, "=", $value, "\0"));
    };
}

/// Declares a kernel module.
///
/// Defines `THIS_MODULE` and `REGISTRATION` in the calling module. With the
/// `kbuild` feature enabled in the calling crate it also emits the
/// `.modinfo` strings and the `init_module`/`cleanup_module` symbols the
/// kernel loader looks for.
///
/// # Examples
///
/// ```ignore
/// use kernel::{error::KernelResult as Result, module, Env, Module, ThisModule};
///
/// module! {
///     type: MyModule,
///     name: "my_module",
///     author: "Rust for Linux Contributors",
///     description: "My very own kernel module!",
///     license: "GPL",
///     version: "1.0",
/// }
///
/// struct MyModule;
///
/// impl Module for MyModule {
///     fn init(_module: &'static ThisModule, _env: &Env<'_>) -> Result<Self> {
///         Ok(MyModule)
///     }
/// }
/// ```
#[macro_export]
macro_rules! module {
    (
        type: $type:ty,
        name: $name:literal,
        author: $author:literal,
        description: $description:literal,
        license: $license:literal,
        version: $version:literal $(,)?
    ) => {
        pub static __MODULE_INFO: $crate::ModuleInfo =
            $crate::ModuleInfo::new($name, $author, $description, $license, $version);

        #[cfg(not(feature = "kbuild"))]
        pub static THIS_MODULE: $crate::ThisModule = $crate::ThisModule::new(&__MODULE_INFO);

        #[cfg(feature = "kbuild")]
        // SAFETY: `__this_module` is constructed by the kernel at load time
        // and lives as long as the module does.
        pub static THIS_MODULE: $crate::ThisModule = unsafe {
            $crate::ThisModule::from_ptr(
                ::core::ptr::addr_of_mut!($crate::module::__this_module),
                &__MODULE_INFO,
            )
        };

        pub static REGISTRATION: $crate::Registration<$type> = $crate::Registration::of();

        $crate::__modinfo!(__MODINFO_LICENSE, "license", $license);
        $crate::__modinfo!(__MODINFO_AUTHOR, "author", $author);
        $crate::__modinfo!(__MODINFO_DESCRIPTION, "description", $description);
        $crate::__modinfo!(__MODINFO_VERSION, "version", $version);

        #[cfg(feature = "kbuild")]
        static mut __MOD: Option<$type> = None;

        #[cfg(feature = "kbuild")]
        #[no_mangle]
        pub extern "C" fn init_module() -> ::core::ffi::c_int {
            $crate::logger::init_kernel_logger();
            let env = $crate::Env::kernel();
            match (REGISTRATION.activate)(&THIS_MODULE, &env) {
                Ok(m) => {
                    // SAFETY: The kernel serializes `init_module` and
                    // `cleanup_module`, so nothing else touches `__MOD` here.
                    unsafe { *::core::ptr::addr_of_mut!(__MOD) = Some(m) };
                    0
                }
                Err(e) => e.to_errno(),
            }
        }

        #[cfg(feature = "kbuild")]
        #[no_mangle]
        pub extern "C" fn cleanup_module() {
            let env = $crate::Env::kernel();
            // SAFETY: Same as in `init_module`.
            if let Some(m) = unsafe { (*::core::ptr::addr_of_mut!(__MOD)).take() } {
                (REGISTRATION.deactivate)(m, &env);
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::linux_err, printk::Capture, utsname::FixedRelease};

    struct Probe;

    impl Module for Probe {
        fn init(module: &'static ThisModule, env: &Env<'_>) -> Result<Self> {
            crate::pr_info!(env, "{} up on {}", module.name(), env.release());
            Ok(Probe)
        }

        fn exit(self, env: &Env<'_>) {
            crate::pr_info!(env, "down");
        }
    }

    struct Refuses;

    impl Module for Refuses {
        fn init(_module: &'static ThisModule, _env: &Env<'_>) -> Result<Self> {
            Err(linux_err::ENODEV)
        }
    }

    crate::module! {
        type: Probe,
        name: "probe",
        author: "Rust for Linux Contributors",
        description: "lifecycle probe",
        license: "Dual MIT/GPL",
        version: "0.1",
    }

    #[test]
    fn module_macro_declares_metadata() {
        assert_eq!(THIS_MODULE.name(), "probe");
        assert!(THIS_MODULE.as_ptr().is_null());
        assert_eq!(THIS_MODULE.info(), &__MODULE_INFO);
        assert_eq!(
            __MODULE_INFO.modinfo_entries(),
            [
                ("license", "Dual MIT/GPL"),
                ("author", "Rust for Linux Contributors"),
                ("description", "lifecycle probe"),
                ("version", "0.1"),
            ]
        );
        assert!(__MODULE_INFO.is_gpl_compatible());
    }

    #[test]
    fn registration_calls_through_to_module() {
        let sink = Capture::new();
        let uts = FixedRelease("6.12.0-test");
        let env = Env::new(&sink, &uts);

        let m = (REGISTRATION.activate)(&THIS_MODULE, &env).unwrap();
        (REGISTRATION.deactivate)(m, &env);

        let lines: Vec<String> = sink.take().into_iter().map(|(_, l)| l).collect();
        assert_eq!(lines, ["probe up on 6.12.0-test", "down"]);
    }

    #[test]
    fn registration_propagates_init_failure() {
        static INFO: ModuleInfo = ModuleInfo::new("refuses", "", "", "GPL", "0");
        static THIS: ThisModule = ThisModule::new(&INFO);
        let sink = Capture::new();
        let uts = FixedRelease("6.1.0");
        let reg = Registration::<Refuses>::of();
        let res = (reg.activate)(&THIS, &Env::new(&sink, &uts));
        assert_eq!(res.err(), Some(linux_err::ENODEV));
        assert!(sink.is_empty());
    }

    #[test]
    fn gpl_compatibility_follows_kernel_list() {
        let mut info = ModuleInfo::new("m", "a", "d", "GPL", "1");
        assert!(info.is_gpl_compatible());
        info.license = "GPL v2";
        assert!(info.is_gpl_compatible());
        info.license = "Proprietary";
        assert!(!info.is_gpl_compatible());
        info.license = "MIT";
        assert!(!info.is_gpl_compatible());
    }

    #[test]
    fn modinfo_bytes_are_nul_terminated() {
        const ENTRY: &str = concat!("license=", "GPL", "\0");
        let bytes: [u8; ENTRY.len()] = modinfo_bytes(ENTRY);
        assert_eq!(&bytes, b"license=GPL\0");
    }
}
