//! Hello World kernel module.
//!
//! Logs a greeting with the running kernel's release when loaded and a
//! farewell when removed.
#![cfg_attr(feature = "kbuild", no_std)]

use kernel::{error::KernelResult as Result, module, pr_info, Env, ThisModule};

module! {
    type: HelloWorld,
    name: "hello",
    author: "Tear",
    description: "Hello World Kernel Module for Redmi K60",
    license: "GPL",
    version: "1.0",
}

pub const GREETING: &str = "Hello World! Module loaded successfully.";
pub const FAREWELL: &str = "Goodbye World! Module unloaded.";

pub struct HelloWorld;

impl kernel::Module for HelloWorld {
    fn init(_module: &'static ThisModule, env: &Env<'_>) -> Result<Self> {
        pr_info!(env, "{} Kernel version: {}", GREETING, env.release());
        Ok(HelloWorld)
    }

    fn exit(self, env: &Env<'_>) {
        pr_info!(env, "{}", FAREWELL);
    }
}

#[cfg(test)]
mod tests {
    use kernel::{
        printk::{Capture, Level},
        utsname::FixedRelease,
        Module,
    };

    use super::*;

    #[test]
    fn init_greets_with_release() {
        let sink = Capture::new();
        let uts = FixedRelease("6.12.0-test");
        let env = Env::new(&sink, &uts);

        let m = HelloWorld::init(&THIS_MODULE, &env);
        assert!(m.is_ok());

        let records = sink.take();
        assert_eq!(records.len(), 1);
        let (level, line) = &records[0];
        assert_eq!(*level, Level::Info);
        assert!(line.contains("Hello World! Module loaded successfully."));
        assert!(line.contains("Kernel version: 6.12.0-test"));
    }

    #[test]
    fn exit_says_goodbye_once() {
        let sink = Capture::new();
        let uts = FixedRelease("6.12.0-test");
        let env = Env::new(&sink, &uts);

        HelloWorld.exit(&env);
        assert_eq!(
            sink.take(),
            [(Level::Info, "Goodbye World! Module unloaded.".to_string())]
        );
    }

    #[test]
    fn metadata_matches_manifest() {
        assert_eq!(THIS_MODULE.name(), "hello");
        assert_eq!(__MODULE_INFO.license, "GPL");
        assert_eq!(__MODULE_INFO.author, "Tear");
        assert_eq!(
            __MODULE_INFO.description,
            "Hello World Kernel Module for Redmi K60"
        );
        assert_eq!(__MODULE_INFO.version, "1.0");
        assert!(__MODULE_INFO.is_gpl_compatible());
    }
}
