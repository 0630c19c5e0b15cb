use clap::Parser;
use std::path::PathBuf;

/// Notifies MyDNS of your current IPv4/IPv6 address, once or on a cron schedule.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None, name = "mydns-notifier")]
pub struct Opts {
    /// The path to the configuration file.
    #[clap(long, default_value = "./config.toml")]
    pub config: PathBuf,
    /// How much to log.
    ///
    /// 1 errors only, 2 warnings, 3 info, 4 debug, 5 trace.
    #[clap(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub verbosity: u8,
}
