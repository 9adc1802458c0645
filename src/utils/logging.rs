use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Human-readable output in development; JSON with source locations in
/// production. `RUST_LOG` overrides the default `info` filter.
pub fn init(production: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if production {
        let fmt_layer = fmt::layer()
            .json()
            .with_file(true)
            .with_line_number(true);
        registry.with(fmt_layer).init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }
}
