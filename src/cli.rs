//! Command line arguments: `fileserve [port] [rootDir]`

use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::config::Config;

/// Printed for `--help` and for any invalid invocation
pub const USAGE: &str = "\
Args: [port] [rootDir]
Port should be a number, default value is 80
RootDir should be an existed and absolute dir, default value is the working dir
";

#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(name = "fileserve", override_help = USAGE, disable_version_flag = true)]
pub struct Cli {
    /// Port to listen on
    pub port: Option<u16>,

    /// Directory to serve files from
    pub root: Option<PathBuf>,
}

impl Cli {
    /// Parse and validate arguments, `args[0]` being the program name
    ///
    /// Returns `None` when the caller should print [`USAGE`] and exit: the
    /// port is not a number, the root is not an existing directory, or
    /// there are too many arguments.
    pub fn from_args<I, T>(args: I) -> Option<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = Self::try_parse_from(args).ok()?;

        if let Some(root) = &cli.root {
            if !root.is_dir() {
                return None;
            }
        }

        Some(cli)
    }

    /// Override `cfg` with whatever was given on the command line
    pub fn apply(&self, cfg: &mut Config) {
        if let Some(port) = self.port {
            cfg.server.port = port;
        }
        if let Some(root) = &self.root {
            cfg.static_files.root = root.clone();
        }
    }
}
