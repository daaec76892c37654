use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber. `RUST_LOG` directives are honoured on top of
/// `billing_service=info` and `meter_client=info`.
pub fn init_tracing() {
    let mut filter = EnvFilter::from_default_env();
    for directive in ["billing_service=info", "meter_client=info"] {
        if let Ok(d) = directive.parse() {
            filter = filter.add_directive(d);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
