use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::printk::{self, Printk};

/// Forwards `log` records to a [`Printk`] sink.
pub struct PrintkLogger<P> {
    sink: P,
}

impl<P: Printk> PrintkLogger<P> {
    pub const fn new(sink: P) -> Self {
        PrintkLogger { sink }
    }
}

impl<P: Printk + Send + Sync> Log for PrintkLogger<P> {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }
    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let module_path = record.module_path().unwrap_or_default();
        let (level, tag) = match record.level() {
            Level::Error => (printk::Level::Err, "[ERROR]"),
            Level::Warn => (printk::Level::Warning, "[ WARN]"),
            Level::Info => (printk::Level::Info, "[ INFO]"),
            Level::Debug => (printk::Level::Debug, "[DEBUG]"),
            Level::Trace => (printk::Level::Debug, "[TRACE]"),
        };
        self.sink.printk(
            level,
            format_args!("{} [{}] {}", tag, module_path, record.args()),
        );
    }
    fn flush(&self) {}
}

/// The level filter selected by the `LOG` variable at build time.
pub fn level_from_env() -> LevelFilter {
    parse_level(option_env!("LOG"))
}

fn parse_level(value: Option<&str>) -> LevelFilter {
    match value {
        Some("OFF") => LevelFilter::Off,
        Some("ERROR") => LevelFilter::Error,
        Some("WARN") => LevelFilter::Warn,
        Some("INFO") => LevelFilter::Info,
        Some("DEBUG") => LevelFilter::Debug,
        Some("TRACE") => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Installs `logger` as the global `log` backend.
///
/// Only the first call wins; later ones report [`SetLoggerError`] and leave
/// the installed logger in place.
pub fn init_logger<P: Printk + Send + Sync>(
    logger: &'static PrintkLogger<P>,
) -> Result<(), SetLoggerError> {
    log::set_logger(logger)?;
    log::set_max_level(level_from_env());
    Ok(())
}

#[cfg(feature = "kbuild")]
static KERNEL_LOGGER: PrintkLogger<printk::KernelPrintk> =
    PrintkLogger::new(printk::KernelPrintk);

/// Routes `log` through the kernel's printk.
#[cfg(feature = "kbuild")]
pub fn init_kernel_logger() {
    // Already installed by an earlier load in this address space.
    let _ = init_logger(&KERNEL_LOGGER);
}
