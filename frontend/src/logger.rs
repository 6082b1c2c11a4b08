//! `log` 门面的控制台后端
//!
//! wasm32 上写入浏览器 `console.*`，其他目标写入 stderr。

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

pub struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

/// 安装全局 logger，重复调用只会调整级别
pub fn init(level: LevelFilter) {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!("{:<5} {}", record.level(), record.args());

        #[cfg(target_arch = "wasm32")]
        {
            let msg = JsValue::from_str(&line);
            match record.level() {
                Level::Error => web_sys::console::error_1(&msg),
                Level::Warn => web_sys::console::warn_1(&msg),
                Level::Info => web_sys::console::info_1(&msg),
                Level::Debug | Level::Trace => web_sys::console::debug_1(&msg),
            }
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            use std::io::{self, Write};
            if record.level() <= Level::Warn || cfg!(debug_assertions) {
                let _ = writeln!(io::stderr(), "{}", line);
            }
        }
    }

    fn flush(&self) {}
}
