//! `tracing` subscriber bootstrap.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a formatting subscriber filtered by `RUST_LOG`, or by
/// `default_directive` (e.g. `"fetchkeep=info"`) when `RUST_LOG` is unset.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    #[test]
    fn second_init_is_harmless() {
        super::init("fetchkeep=debug");
        assert!(!super::init("fetchkeep=debug"));
    }
}
