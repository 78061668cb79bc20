pub use data::log::Error;

/// Wires the `log` facade to fern: stdout while debugging, a fresh log
/// file otherwise. `RUST_LOG` overrides the default level.
pub fn setup(is_debug: bool) -> Result<(), Error> {
    let default_level = if is_debug {
        log::Level::Debug
    } else {
        log::Level::Info
    };

    let level_filter = std::env::var("RUST_LOG")
        .ok()
        .as_deref()
        .map(str::parse::<log::Level>)
        .transpose()?
        .unwrap_or(default_level)
        .to_level_filter();

    let mut io_sink = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}:{} -- {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                message
            ));
        })
        .level(level_filter);

    if is_debug {
        io_sink = io_sink.chain(std::io::stdout());
    } else {
        io_sink = io_sink.chain(data::log::file()?);
    }

    io_sink.apply()?;

    Ok(())
}
