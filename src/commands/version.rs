//! Command: print version information.
use std::io::Write as _;

/// Version string: the release tag when built by CI, else the crate version.
#[must_use]
pub fn version() -> &'static str {
    option_env!("DAYLOG_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the daylog version to stdout.
pub fn run() {
    writeln!(std::io::stdout().lock(), "daylog {}", version()).ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
