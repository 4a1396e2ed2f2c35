use log::LevelFilter;

/// Maps the command-line verbosity (-2 to 1) to a log level.
pub fn level_for(verbosity: i8) -> LevelFilter {
    match verbosity {
        i8::MIN..=-2 => LevelFilter::Warn,
        -1 => LevelFilter::Info,
        0 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

pub fn init_logger(verbosity: i8) {
    env_logger::Builder::new()
        .filter_level(level_for(verbosity))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for() {
        assert_eq!(level_for(-3), LevelFilter::Warn);
        assert_eq!(level_for(-2), LevelFilter::Warn);
        assert_eq!(level_for(-1), LevelFilter::Info);
        assert_eq!(level_for(0), LevelFilter::Debug);
        assert_eq!(level_for(1), LevelFilter::Trace);
    }
}
