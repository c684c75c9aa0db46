//! Console logging for the browser

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;

/// Route `tracing` output to the browser console.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init(level: LevelFilter) {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .without_time() // std::time is unavailable in the browser
        .with_writer(tracing_web::MakeWebConsoleWriter::new());

    let _ = tracing_subscriber::registry()
        .with(fmt_layer.with_filter(level))
        .try_init();
}
