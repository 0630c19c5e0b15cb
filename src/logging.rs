use tracing::{Level, Subscriber};

pub fn level(verbosity: u8) -> Level {
    match verbosity {
        0 | 1 => Level::ERROR,
        2 => Level::WARN,
        3 => Level::INFO,
        4 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Colored `date time file:line` output on stderr.
///
/// Returned rather than installed globally; `main` scopes it over the run.
pub fn subscriber(verbosity: u8) -> impl Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_max_level(level(verbosity))
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .finish()
}

#[cfg(test)]
mod tests {
    use tracing::Level;

    use super::level;

    #[test]
    fn verbosity_levels() {
        assert_eq!(level(1), Level::ERROR);
        assert_eq!(level(2), Level::WARN);
        assert_eq!(level(3), Level::INFO);
        assert_eq!(level(4), Level::DEBUG);
        assert_eq!(level(5), Level::TRACE);
    }

    #[test]
    fn scoped_subscriber() {
        tracing::subscriber::with_default(super::subscriber(5), || {
            tracing::trace!("visible only inside this scope");
            assert!(tracing::enabled!(Level::TRACE));
        });
    }
}
