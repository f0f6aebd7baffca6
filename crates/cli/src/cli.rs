use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::path::{Path, PathBuf};

/// hmi-arbiter: HMI focus and audio arbitration for in-vehicle apps
///
/// Decides which connected application holds the screen and the speaker,
/// and restores the previous arrangement when applications reconnect
/// after a lost connection or an ignition cycle.
#[derive(Debug, Parser, Clone)]
#[command(about, long_about, version)]
pub struct Cli {
    /// Path to configuration file.
    #[arg(short, long, value_parser = validate_file)]
    pub conffile: Option<PathBuf>,

    /// Database to load and save resumption data to. Overrides
    /// `persistence.state_path`.
    ///
    /// Empty string means data is kept in memory only.
    #[arg(short, long)]
    pub statefile: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    pub dump_config: bool,

    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,
}

/// Check if the file exists.
#[inline(always)]
fn validate_file(file: &str) -> Result<PathBuf, String> {
    let path = Path::new(file);
    if path.exists() {
        Ok(path.to_owned())
    } else {
        Err(format!("File not found: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["hmi-arbiter"]).unwrap();
        assert_eq!(cli.conffile, None);
        assert_eq!(cli.statefile, None);
        assert!(!cli.dump_config);
        assert_eq!(cli.verbosity.tracing_level_filter(), LevelFilter::WARN);
    }

    #[test]
    fn statefile_and_verbosity() {
        let cli =
            Cli::try_parse_from(["hmi-arbiter", "-s", "/tmp/state.db", "-vv", "--dump-config"])
                .unwrap();
        assert_eq!(cli.statefile, Some(PathBuf::from("/tmp/state.db")));
        assert!(cli.dump_config);
        assert_eq!(cli.verbosity.tracing_level_filter(), LevelFilter::DEBUG);
    }

    #[test]
    fn missing_conffile_is_rejected() {
        assert!(Cli::try_parse_from(["hmi-arbiter", "-c", "/nonexistent/hmi.toml"]).is_err());
    }
}
