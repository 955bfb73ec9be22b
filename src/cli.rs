use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Path to config TOML (built-in defaults when omitted)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Start with explosion sounds muted (press 'm' to toggle)
    #[arg(long, default_value_t = false)]
    pub muted: bool,

    /// Seed for a reproducible show
    #[arg(long)]
    pub seed: Option<u64>,

    /// Repaints per second (overrides config)
    #[arg(long)]
    pub fps: Option<f32>,

    /// Write logs here; the terminal itself is busy drawing
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["skyburst"]).unwrap();
        assert!(args.config.is_none());
        assert!(!args.muted);
        assert!(args.seed.is_none());
    }

    #[test]
    fn all_flags() {
        let args = Args::try_parse_from([
            "skyburst", "--config", "show.toml", "--muted", "--seed", "7", "--fps", "30", "--log-file", "x.log",
        ])
        .unwrap();
        assert_eq!(args.config.unwrap(), PathBuf::from("show.toml"));
        assert!(args.muted);
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.fps, Some(30.0));
        assert_eq!(args.log_file.unwrap(), PathBuf::from("x.log"));
    }
}
