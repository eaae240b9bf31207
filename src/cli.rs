use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version = env!("APP_VERSION"), about, long_about = None)]
pub struct Cli {
    #[arg(short = 'r', long, help = "Path to the routing configuration file.")]
    pub route_config: PathBuf,

    #[arg(
        short = 'X',
        long,
        default_value = "GET",
        help = "Request method used with TARGET."
    )]
    pub method: String,

    #[arg(
        short = 'H',
        long = "header",
        value_name = "NAME: VALUE",
        help = "Request header used with TARGET, may be repeated."
    )]
    pub headers: Vec<String>,

    #[arg(
        long,
        conflicts_with = "target",
        help = "Read `METHOD TARGET` lines from stdin and reload routes when the file changes."
    )]
    pub stdin: bool,

    #[arg(
        required_unless_present = "stdin",
        help = "Absolute URL or path to resolve, e.g. https://example.com/users/42"
    )]
    pub target: Option<String>,
}
