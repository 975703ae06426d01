//! An in-process module loader.
//!
//! [`Host`] plays the part of `insmod`/`rmmod` for one module: it owns the
//! instance between activation and deactivation and enforces that the two
//! alternate, starting with activation.

use alloc::vec::Vec;

use bitflags::bitflags;

use crate::{
    error::{linux_err, KernelResult as Result},
    module::{Env, Registration, ThisModule},
    pr_warn,
    utsname::KernelVersion,
};

bitflags! {
    /// Subset of the kernel's taint flags a module load can set.
    ///
    /// C header: `include/linux/panic.h`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Taint: u32 {
        /// `P`: a module with a non-GPL-compatible license was loaded.
        const PROPRIETARY_MODULE = 1 << 0;
        /// `O`: an externally-built module was loaded.
        const OOT_MODULE = 1 << 12;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Unloaded,
    Loaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Activated,
    Deactivated,
}

pub struct Host<'a, M> {
    module: &'static ThisModule,
    registration: Registration<M>,
    env: Env<'a>,
    instance: Option<M>,
    taint: Taint,
    events: Vec<Event>,
}

impl<'a, M> Host<'a, M> {
    pub fn new(module: &'static ThisModule, registration: Registration<M>, env: Env<'a>) -> Self {
        Host {
            module,
            registration,
            env,
            instance: None,
            taint: Taint::OOT_MODULE,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> State {
        if self.instance.is_some() {
            State::Loaded
        } else {
            State::Unloaded
        }
    }

    pub fn taint(&self) -> Taint {
        self.taint
    }

    /// Every transition so far, oldest first.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Runs the activation callback.
    ///
    /// Fails with `EEXIST` if the module is already loaded. An error from the
    /// module itself is passed through and leaves the host unloaded.
    pub fn load(&mut self) -> Result<()> {
        let info = self.module.info();
        if self.instance.is_some() {
            log::debug!("{}: already loaded", info.name);
            return Err(linux_err::EEXIST);
        }

        if !info.is_gpl_compatible() && !self.taint.contains(Taint::PROPRIETARY_MODULE) {
            pr_warn!(
                self.env,
                "{}: module license '{}' taints kernel.",
                info.name,
                info.license
            );
            self.taint |= Taint::PROPRIETARY_MODULE;
        }

        let release = self.env.release();
        match KernelVersion::parse(release) {
            Some(version) => log::debug!("{}: loading on kernel {}", info.name, version),
            None => log::debug!("{}: loading on unparsable release {:?}", info.name, release),
        }

        let instance = (self.registration.activate)(self.module, &self.env).inspect_err(|e| {
            log::debug!("{}: init failed with {:?}", info.name, e);
        })?;
        self.instance = Some(instance);
        self.events.push(Event::Activated);
        Ok(())
    }

    /// Runs the deactivation callback.
    ///
    /// Fails with `ENOENT` if nothing is loaded.
    pub fn unload(&mut self) -> Result<()> {
        let instance = self.instance.take().ok_or(linux_err::ENOENT)?;
        log::debug!("{}: unloading", self.module.name());
        (self.registration.deactivate)(instance, &self.env);
        self.events.push(Event::Deactivated);
        Ok(())
    }
}

impl<M> Drop for Host<'_, M> {
    fn drop(&mut self) {
        if self.instance.is_some() {
            let _ = self.unload();
        }
    }
}
