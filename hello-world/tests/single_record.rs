//! Activation and deactivation each produce one record, even with `log`
//! routed into the same printk channel at the most verbose level.

use std::sync::Mutex;

use hello::{HelloWorld, FAREWELL, GREETING, THIS_MODULE};
use kernel::{
    logger::{init_logger, PrintkLogger},
    printk::Level,
    utsname::FixedRelease,
    Env, Module, Printk,
};
use log::LevelFilter;

struct Channel(Mutex<Vec<(Level, String)>>);

impl Channel {
    fn take(&self) -> Vec<(Level, String)> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

impl Printk for Channel {
    fn printk(&self, level: Level, args: core::fmt::Arguments<'_>) {
        self.0.lock().unwrap().push((level, args.to_string()));
    }
}

static CHANNEL: Channel = Channel(Mutex::new(Vec::new()));
static LOGGER: PrintkLogger<&Channel> = PrintkLogger::new(&CHANNEL);

#[test]
fn each_callback_emits_one_record_with_debug_logging_on() {
    init_logger(&LOGGER).unwrap();
    log::set_max_level(LevelFilter::Debug);

    let uts = FixedRelease("6.12.0-test");
    let env = Env::new(&CHANNEL, &uts);

    let module = HelloWorld::init(&THIS_MODULE, &env).unwrap();
    let records = CHANNEL.take();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].0, Level::Info);
    assert!(records[0].1.starts_with(GREETING));
    assert!(records[0].1.ends_with("Kernel version: 6.12.0-test"));

    module.exit(&env);
    assert_eq!(CHANNEL.take(), [(Level::Info, FAREWELL.to_string())]);

    // The bridge is live: a `log` call lands in the same channel.
    log::debug!("bridge check");
    let records = CHANNEL.take();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].0, Level::Debug);
    assert!(records[0].1.ends_with("bridge check"));
}
