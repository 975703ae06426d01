#![cfg_attr(not(test), no_std)]
#![allow(improper_ctypes)]
extern crate alloc;

pub mod error;
pub mod host;
#[cfg(all(feature = "kbuild", not(test)))]
mod kalloc;
pub mod logger;
pub mod module;
pub mod printk;
pub mod utsname;

pub use error::linux_err as code;
pub use module::{Env, Module, ModuleInfo, Registration, ThisModule};
pub use printk::{Level, Printk};
pub use utsname::UtsName;

#[cfg(all(feature = "kbuild", not(test)))]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    crate::pr_err!(printk::KernelPrintk, "Kernel panic!");
    crate::pr_err!(printk::KernelPrintk, "{:?}", info);
    unsafe {
        bug_helper();
    }
}

#[cfg(all(feature = "kbuild", not(test)))]
extern "C" {
    fn bug_helper() -> !;
}
