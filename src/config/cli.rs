use clap::Parser;

#[derive(Parser, Clone, Debug)]
#[command(version, about, long_about = None,
    override_usage = "\n    disg [OPTIONS] [--unshare]\n    disg [OPTIONS] config [KEYS...]")]
pub struct Args {
    /// Set the log level to one of trace, debug, info, warn, or error.
    /// `-v` is shorthand for enabling verbose (trace) logging.
    #[arg(short = 'v',
        long,
        global = true,
        default_missing_value = "trace",
        num_args = 0..=1,
        require_equals = true,
        value_parser = parse_log_level
    )]
    pub log_level: Option<log::LevelFilter>,

    /// Run in a separate user and mount namespace, using the subordinate id
    /// ranges delegated to the invoking user.
    #[arg(long, global = true, action = clap::ArgAction::SetTrue)]
    pub unshare: bool,

    /// Path to the image store. Defaults to `/tmp/docker-image-store`
    #[arg(long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub path: Option<String>,

    /// Subordinate uid allocation file. Defaults to `/etc/subuid`
    #[arg(long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub subuid_file: Option<String>,

    /// Subordinate gid allocation file. Defaults to `/etc/subgid`
    #[arg(long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub subgid_file: Option<String>,

    /// uid mapping helper. Defaults to `newuidmap` from PATH
    #[arg(long, global = true, value_hint = clap::ValueHint::CommandName)]
    pub newuidmap: Option<String>,

    /// gid mapping helper. Defaults to `newgidmap` from PATH
    #[arg(long, global = true, value_hint = clap::ValueHint::CommandName)]
    pub newgidmap: Option<String>,

    /// Do not load config files.
    #[arg(long, global = true, action = clap::ArgAction::SetTrue)]
    pub no_config: bool,

    #[command(subcommand)]
    pub action: Option<Action>,
}

#[derive(clap::Subcommand, Clone, Debug)]
#[command(subcommand_help_heading = "Actions")]
pub enum Action {
    /// Get current configuration options
    Config {
        /// The keys to get from the configuration
        #[arg(value_name = "KEYS", num_args = 0..)]
        keys: Option<Vec<String>>,
    },
}

fn parse_log_level(s: &str) -> Result<log::LevelFilter, String> {
    s.parse::<log::LevelFilter>().map_err(|e| e.to_string())
}
