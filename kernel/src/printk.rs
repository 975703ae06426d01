use alloc::{string::String, vec::Vec};
use core::{
    cell::RefCell,
    cmp,
    fmt::{self, Write},
};

/// Kernel log levels, in the order `include/linux/kern_levels.h` defines them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Emerg,
    Alert,
    Crit,
    Err,
    Warning,
    Notice,
    Info,
    Debug,
}

impl Level {
    /// The `KERN_*` prefix: `KERN_SOH` followed by the level digit.
    pub const fn prefix(self) -> [u8; 2] {
        [b'\x01', b'0' + self as u8]
    }
}

/// A sink for leveled log records.
///
/// Delivery is infallible from the caller's point of view. A sink that can fail
/// drops the record.
pub trait Printk {
    fn printk(&self, level: Level, args: fmt::Arguments<'_>);
}

impl<P: Printk + ?Sized> Printk for &P {
    fn printk(&self, level: Level, args: fmt::Arguments<'_>) {
        (**self).printk(level, args)
    }
}

// From kernel/print/printk.c
pub const LOG_LINE_MAX: usize = 1024 - 32;

#[doc(hidden)]
pub struct LogLineWriter {
    data: [u8; LOG_LINE_MAX],
    pos: usize,
}

#[allow(clippy::new_without_default)]
impl LogLineWriter {
    pub fn new() -> LogLineWriter {
        LogLineWriter {
            data: [0u8; LOG_LINE_MAX],
            pos: 0,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.pos]
    }
}

impl Write for LogLineWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut copy_len = cmp::min(LOG_LINE_MAX - self.pos, s.len());
        // Never leave half a character at the end of the line.
        while !s.is_char_boundary(copy_len) {
            copy_len -= 1;
        }
        self.data[self.pos..self.pos + copy_len].copy_from_slice(&s.as_bytes()[..copy_len]);
        self.pos += copy_len;
        Ok(())
    }
}

/// In-memory sink that keeps every record it receives.
#[derive(Debug, Default)]
pub struct Capture {
    records: RefCell<Vec<(Level, String)>>,
}

impl Capture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(Level, String)> {
        self.records.borrow().clone()
    }

    /// Drains the records captured so far.
    pub fn take(&self) -> Vec<(Level, String)> {
        core::mem::take(&mut *self.records.borrow_mut())
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl Printk for Capture {
    fn printk(&self, level: Level, args: fmt::Arguments<'_>) {
        let mut line = String::new();
        if line.write_fmt(args).is_ok() {
            self.records.borrow_mut().push((level, line));
        }
    }
}

/// The kernel's own `printk`.
#[cfg(feature = "kbuild")]
#[derive(Debug, Clone, Copy, Default)]
pub struct KernelPrintk;

#[cfg(feature = "kbuild")]
extern "C" {
    fn _printk(fmt: *const core::ffi::c_char, ...) -> core::ffi::c_int;
}

#[cfg(feature = "kbuild")]
impl Printk for KernelPrintk {
    fn printk(&self, level: Level, args: fmt::Arguments<'_>) {
        let mut writer = LogLineWriter::new();
        // LogLineWriter truncates instead of failing; a formatting error from
        // `args` itself just leaves a shorter line.
        let _ = writer.write_fmt(args);
        let line = writer.as_bytes();

        let prefix = level.prefix();
        let mut fmt_str = [0u8; 2 + b"%.*s\n\0".len()];
        fmt_str[..2].copy_from_slice(&prefix);
        fmt_str[2..].copy_from_slice(b"%.*s\n\0");

        // SAFETY: `fmt_str` is NUL-terminated and `%.*s` reads exactly
        // `line.len()` bytes from `line`.
        unsafe {
            _printk(
                fmt_str.as_ptr() as _,
                line.len() as core::ffi::c_int,
                line.as_ptr(),
            )
        };
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! print_macro (
    ($sink:expr, $level:expr, $($arg:tt)+) => (
        $crate::printk::Printk::printk(&$sink, $level, format_args!($($arg)+))
    );
);

/// Prints an emergency-level message (level 0) to `$sink`.
///
/// Equivalent to the kernel's [`pr_emerg`] macro.
///
/// [`pr_emerg`]: https://www.kernel.org/doc/html/latest/core-api/printk-basics.html#c.pr_emerg
#[macro_export]
macro_rules! pr_emerg (
    ($sink:expr, $($arg:tt)+) => (
        $crate::print_macro!($sink, $crate::printk::Level::Emerg, $($arg)+)
    )
);

/// Prints an alert-level message (level 1) to `$sink`.
#[macro_export]
macro_rules! pr_alert (
    ($sink:expr, $($arg:tt)+) => (
        $crate::print_macro!($sink, $crate::printk::Level::Alert, $($arg)+)
    )
);

/// Prints a critical-level message (level 2) to `$sink`.
#[macro_export]
macro_rules! pr_crit (
    ($sink:expr, $($arg:tt)+) => (
        $crate::print_macro!($sink, $crate::printk::Level::Crit, $($arg)+)
    )
);

/// Prints an error-level message (level 3) to `$sink`.
#[macro_export]
macro_rules! pr_err (
    ($sink:expr, $($arg:tt)+) => (
        $crate::print_macro!($sink, $crate::printk::Level::Err, $($arg)+)
    )
);

/// Prints a warning-level message (level 4) to `$sink`.
#[macro_export]
macro_rules! pr_warn (
    ($sink:expr, $($arg:tt)+) => (
        $crate::print_macro!($sink, $crate::printk::Level::Warning, $($arg)+)
    )
);

/// Prints a notice-level message (level 5) to `$sink`.
#[macro_export]
macro_rules! pr_notice (
    ($sink:expr, $($arg:tt)+) => (
        $crate::print_macro!($sink, $crate::printk::Level::Notice, $($arg)+)
    )
);

/// Prints an info-level message (level 6) to `$sink`.
///
/// Use this level for informational messages.
///
/// Equivalent to the kernel's [`pr_info`] macro.
///
/// # Examples
///
/// ```
/// # use kernel::{pr_info, printk::Capture};
/// let sink = Capture::new();
/// pr_info!(sink, "hello {}", "world");
/// assert_eq!(sink.records()[0].1, "hello world");
/// ```
///
/// [`pr_info`]: https://www.kernel.org/doc/html/latest/core-api/printk-basics.html#c.pr_info
#[macro_export]
macro_rules! pr_info (
    ($sink:expr, $($arg:tt)+) => (
        $crate::print_macro!($sink, $crate::printk::Level::Info, $($arg)+)
    )
);

/// Prints a debug-level message (level 7) to `$sink`.
#[macro_export]
macro_rules! pr_debug (
    ($sink:expr, $($arg:tt)+) => (
        $crate::print_macro!($sink, $crate::printk::Level::Debug, $($arg)+)
    )
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_prefix_matches_kern_levels() {
        assert_eq!(&Level::Emerg.prefix(), b"\x010");
        assert_eq!(&Level::Err.prefix(), b"\x013");
        assert_eq!(&Level::Info.prefix(), b"\x016");
        assert_eq!(&Level::Debug.prefix(), b"\x017");
    }

    #[test]
    fn line_writer_truncates_at_log_line_max() {
        let mut writer = LogLineWriter::new();
        let chunk = "x".repeat(600);
        writer.write_str(&chunk).unwrap();
        writer.write_str(&chunk).unwrap();
        assert_eq!(writer.as_bytes().len(), LOG_LINE_MAX);
        // Further writes are dropped silently.
        writer.write_str("tail").unwrap();
        assert_eq!(writer.as_bytes().len(), LOG_LINE_MAX);
    }

    #[test]
    fn line_writer_cuts_on_char_boundary() {
        let mut writer = LogLineWriter::new();
        writer.write_str(&"a".repeat(LOG_LINE_MAX - 1)).unwrap();
        // 'é' is two bytes and only one is left.
        writer.write_str("é").unwrap();
        assert_eq!(writer.as_bytes().len(), LOG_LINE_MAX - 1);
        assert!(core::str::from_utf8(writer.as_bytes()).is_ok());

        let mut writer = LogLineWriter::new();
        writer.write_str(&"€".repeat(LOG_LINE_MAX)).unwrap();
        let line = core::str::from_utf8(writer.as_bytes()).unwrap();
        assert_eq!(line.len(), LOG_LINE_MAX / 3 * 3);
        assert!(line.chars().all(|c| c == '€'));
    }

    #[test]
    fn capture_records_level_and_text() {
        let sink = Capture::new();
        pr_warn!(sink, "disk {} is {}", 3, "full");
        pr_debug!(&sink, "done");
        assert_eq!(
            sink.records(),
            vec![
                (Level::Warning, "disk 3 is full".to_string()),
                (Level::Debug, "done".to_string()),
            ]
        );
        assert_eq!(sink.take().len(), 2);
        assert!(sink.is_empty());
    }
}
