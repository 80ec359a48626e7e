use log::LevelFilter;
use std::io::Write;

/// Sets up `env_logger` on stderr so rendered output on stdout stays clean.
///
/// Verbosity follows `RUST_LOG` (`error`, `warn`, `info`, `debug`, `trace`)
/// and defaults to `warn`.
pub fn init_logger() {
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Warn);

    env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{:5}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(level)
        .target(env_logger::Target::Stderr)
        .try_init()
        .ok();
}
