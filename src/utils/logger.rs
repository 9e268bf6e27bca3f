use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Directive used when `RUST_LOG` is unset. `-v` wins over a profile level.
fn default_directive(verbose: bool, level: Option<&str>) -> String {
    match (verbose, level) {
        (true, _) => "trade_swarm=debug,info".to_string(),
        (false, Some(level)) => format!("trade_swarm={}", level.to_ascii_lowercase()),
        (false, None) => "trade_swarm=info".to_string(),
    }
}

fn default_filter(verbose: bool, level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, level)))
}

fn init_cli_logger(filter: EnvFilter) {
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// JSON lines on stdout, for runs collected by a log shipper.
fn init_json_logger(filter: EnvFilter) {
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json(),
        )
        .init();
}

pub fn init_logger(verbose: bool, json: bool) {
    init_logger_with_default(None, verbose, json);
}

/// Like [`init_logger`], with `level` (e.g. from a load profile) as the
/// default crate level when neither `RUST_LOG` nor `-v` is given.
pub fn init_logger_with_default(level: Option<&str>, verbose: bool, json: bool) {
    let filter = default_filter(verbose, level);
    if json {
        init_json_logger(filter);
    } else {
        init_cli_logger(filter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_level_becomes_crate_directive() {
        assert_eq!(default_directive(false, Some("WARN")), "trade_swarm=warn");
        assert_eq!(default_directive(false, None), "trade_swarm=info");
    }

    #[test]
    fn test_verbose_overrides_profile_level() {
        assert_eq!(default_directive(true, Some("error")), "trade_swarm=debug,info");
    }
}
