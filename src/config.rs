use crate::store::DEFAULT_KEY;
use clap::{value_parser, Arg, ArgMatches, Command};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_file: PathBuf,
    pub storage_key: String,
    pub submit_delay: Duration,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("structure.json"),
            storage_key: DEFAULT_KEY.to_string(),
            submit_delay: Duration::from_millis(500),
            log_file: None,
        }
    }
}

pub fn command() -> Command {
    Command::new("structure")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Terminal kanban board")
        .arg(
            Arg::new("data-file")
                .long("data-file")
                .env("STRUCTURE_DATA_FILE")
                .value_parser(value_parser!(PathBuf))
                .help("JSON file holding the saved board"),
        )
        .arg(
            Arg::new("key")
                .long("key")
                .env("STRUCTURE_KEY")
                .help("Storage key the board is saved under"),
        )
        .arg(
            Arg::new("submit-delay-ms")
                .long("submit-delay-ms")
                .env("STRUCTURE_SUBMIT_DELAY_MS")
                .value_parser(value_parser!(u64))
                .help("Delay before a new task is added, in milliseconds"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .env("STRUCTURE_LOG_FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Log file, defaults to a .log file beside the data file"),
        )
}

impl Config {
    /// Logs never go to the terminal the board is drawn on.
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.data_file.with_extension("log"))
    }

    pub fn from_matches(matches: &ArgMatches) -> Self {
        let defaults = Config::default();
        Self {
            data_file: matches
                .get_one::<PathBuf>("data-file")
                .cloned()
                .unwrap_or(defaults.data_file),
            storage_key: matches
                .get_one::<String>("key")
                .cloned()
                .unwrap_or(defaults.storage_key),
            submit_delay: matches
                .get_one::<u64>("submit-delay-ms")
                .map(|ms| Duration::from_millis(*ms))
                .unwrap_or(defaults.submit_delay),
            log_file: matches.get_one::<PathBuf>("log-file").cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let matches = command().try_get_matches_from(["structure"]).unwrap();
        let config = Config::from_matches(&matches);

        // env fallbacks may be set on the machine running the tests
        if std::env::var_os("STRUCTURE_SUBMIT_DELAY_MS").is_none() {
            assert_eq!(config.submit_delay, Duration::from_millis(500));
        }
        if std::env::var_os("STRUCTURE_KEY").is_none() {
            assert_eq!(config.storage_key, "kanban-columns");
        }
    }

    #[test]
    fn test_flags() {
        let matches = command()
            .try_get_matches_from([
                "structure",
                "--data-file",
                "/tmp/board.json",
                "--key",
                "work",
                "--submit-delay-ms",
                "0",
                "--log-file",
                "structure.log",
            ])
            .unwrap();
        let config = Config::from_matches(&matches);

        assert_eq!(config.data_file, PathBuf::from("/tmp/board.json"));
        assert_eq!(config.storage_key, "work");
        assert_eq!(config.submit_delay, Duration::ZERO);
        assert_eq!(config.log_file, Some(PathBuf::from("structure.log")));
    }

    #[test]
    fn test_log_path_defaults_beside_data_file() {
        let config = Config {
            data_file: PathBuf::from("/tmp/boards/work.json"),
            ..Config::default()
        };
        assert_eq!(config.log_path(), PathBuf::from("/tmp/boards/work.log"));
        assert_eq!(Config::default().log_path(), PathBuf::from("structure.log"));

        let config = Config {
            log_file: Some(PathBuf::from("/var/log/structure.log")),
            ..config
        };
        assert_eq!(config.log_path(), PathBuf::from("/var/log/structure.log"));
    }

    #[test]
    fn test_rejects_bad_delay() {
        assert!(command()
            .try_get_matches_from(["structure", "--submit-delay-ms", "soon"])
            .is_err());
    }
}
