use tracing_subscriber::EnvFilter;

/// Initializes structured logging.
///
/// Verbosity comes from `RUST_LOG` and defaults to `info`. Output goes to
/// stderr so stdout carries only the stage banners and the stages' own output.
pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // try_init: tests may install a subscriber first
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
