use tracing_subscriber::EnvFilter;

/// Filter directive for a `-v` count. Noisy HTTP internals stay at info.
pub fn filter_directive(verbosity: u8) -> String {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    format!("{level},hyper=info,hyper_util=info,reqwest=info")
}

/// Install the global subscriber. `RUST_LOG`, when set and valid, wins over
/// the verbosity flag. Logs go to stderr so command output stays clean.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert!(filter_directive(0).starts_with("warn,"));
        assert!(filter_directive(1).starts_with("info,"));
        assert!(filter_directive(2).starts_with("debug,"));
        assert!(filter_directive(7).starts_with("trace,"));
    }

    #[test]
    fn directives_parse() {
        for v in 0..4 {
            assert!(filter_directive(v).parse::<EnvFilter>().is_ok());
        }
    }
}
