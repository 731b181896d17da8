#![forbid(unsafe_code)]

//! Command-line argument parsing for the `ledwall` binary.
//!
//! Args are parsed by hand. Flags override `LEDWALL_*` environment
//! variables, which override built-in defaults (see
//! [`EditorConfig::from_env`]).

use std::env;
use std::path::PathBuf;
use std::process;

use ledwall::EditorConfig;
use ledwall_runtime::config::parse_viewport;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
ledwall: inspect an LED wall layout

Loads the panel topology and element configuration, resolves the wall
geometry for a viewport, and prints the canvas and layer stack.

USAGE:
    ledwall [OPTIONS]

OPTIONS:
    --topology=FILE       Read the topology document from FILE
    --config=FILE         Read the configuration document from FILE
    --viewport=WxH        Canvas budget in pixels (default: 1280x720)
    --base-url=URL        Back-end base URL (default: http://127.0.0.1:5000)
    --command-file=PATH   Renderer command file
    --place               Write placement commands for every element
    --save=FILE           Write the normalized configuration to FILE
    --log-json            Emit logs as JSON lines
    --help, -h            Show this help message
    --version, -V         Show version

Without --topology the documents are fetched from the back end, which
requires the `http` feature.

ENVIRONMENT VARIABLES:
    LEDWALL_LOG            Log filter (default: info)
    LEDWALL_BASE_URL       Override the default base URL
    LEDWALL_VIEWPORT       Override the default viewport (WxH)
    LEDWALL_TIMEOUT_MS     Request timeout in milliseconds (default: 5000)
    LEDWALL_COMMAND_FILE   Renderer command file";

/// Parsed command-line options.
#[derive(Debug, Default)]
pub struct Opts {
    /// Editor settings after env and flag overrides.
    pub config: EditorConfig,
    /// Local topology document; `None` means fetch remotely.
    pub topology: Option<PathBuf>,
    /// Local configuration document.
    pub config_file: Option<PathBuf>,
    /// Send placement commands to the renderer.
    pub place: bool,
    /// Where to write the normalized configuration.
    pub save: Option<PathBuf>,
    pub log_json: bool,
}

impl Opts {
    /// Parse the process arguments on top of [`EditorConfig::from_env`].
    pub fn parse() -> Self {
        let args: Vec<String> = env::args().skip(1).collect();
        match Self::parse_from(EditorConfig::from_env(), &args) {
            Ok(opts) => opts,
            Err(Exit::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Err(Exit::Version) => {
                println!("ledwall {VERSION}");
                process::exit(0);
            }
            Err(Exit::Usage(msg)) => {
                eprintln!("{msg}");
                eprintln!("Run 'ledwall --help' for usage.");
                process::exit(2);
            }
        }
    }

    fn parse_from(config: EditorConfig, args: &[String]) -> Result<Self, Exit> {
        let mut opts = Self {
            config,
            ..Self::default()
        };
        for arg in args {
            match arg.as_str() {
                "--help" | "-h" => return Err(Exit::Help),
                "--version" | "-V" => return Err(Exit::Version),
                "--place" => opts.place = true,
                "--log-json" => opts.log_json = true,
                other => {
                    if let Some(val) = other.strip_prefix("--topology=") {
                        opts.topology = Some(PathBuf::from(val));
                    } else if let Some(val) = other.strip_prefix("--config=") {
                        opts.config_file = Some(PathBuf::from(val));
                    } else if let Some(val) = other.strip_prefix("--viewport=") {
                        let viewport = parse_viewport(val).ok_or_else(|| {
                            Exit::Usage(format!("Invalid --viewport value: {val}"))
                        })?;
                        opts.config.viewport = viewport;
                    } else if let Some(val) = other.strip_prefix("--base-url=") {
                        opts.config.sync = opts.config.sync.clone().with_base_url(val);
                    } else if let Some(val) = other.strip_prefix("--command-file=") {
                        opts.config.command_file = Some(PathBuf::from(val));
                    } else if let Some(val) = other.strip_prefix("--save=") {
                        opts.save = Some(PathBuf::from(val));
                    } else {
                        return Err(Exit::Usage(format!("Unknown argument: {other}")));
                    }
                }
            }
        }
        if opts.config_file.is_some() && opts.topology.is_none() {
            return Err(Exit::Usage("--config needs --topology".into()));
        }
        if opts.place && opts.config.command_file.is_none() {
            return Err(Exit::Usage(
                "--place needs --command-file or LEDWALL_COMMAND_FILE".into(),
            ));
        }
        Ok(opts)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Exit {
    Help,
    Version,
    Usage(String),
}
