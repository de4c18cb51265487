//! These structs provide the CLI interface for the moverperfect CLI.

use crate::model::Platform;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// moverperfect: keeps a spreadsheet ledger of your investments up to date.
///
/// The purpose of this program is to take what was scraped from your investment platforms (the
/// robo-advisor, the employee share-purchase portal, the pension provider and the brokerage) and
/// append anything new to your Google Sheets ledger, along with a fresh valuation for each.
///
/// You will need set up a Google Docs API Key and OAuth for this. Run `moverperfect init` and then
/// `moverperfect auth` once before using `moverperfect run`.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration files.
    ///
    /// This is the first command you should run. You need to get a few things ready beforehand.
    ///
    /// - Decide what directory you want to store data in and pass this as --moverperfect-home. By
    ///   default, It will be $HOME/moverperfect.
    ///
    /// - Get the URLs of your investments spreadsheet and your brokerage spreadsheet and pass them
    ///   as --sheet-url and --brokerage-sheet-url.
    ///
    /// - Set up your Google Sheets API Access credentials and download them to a file. You will
    ///   pass this as --client-secret.
    Init(InitArgs),
    /// Authenticate with Google Sheets via OAuth.
    Auth(AuthArgs),
    /// Reconcile the latest scrapes into the ledger.
    Run(RunArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where moverperfect data and configuration is held. Defaults to ~/moverperfect
    #[arg(long, env = "MOVERPERFECT_HOME", default_value_t = default_home())]
    moverperfect_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, moverperfect_home: PathBuf) -> Self {
        Self {
            log_level,
            moverperfect_home: moverperfect_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn moverperfect_home(&self) -> &DisplayPath {
        &self.moverperfect_home
    }
}

/// (Not shown): Args for the `moverperfect init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The URL to your investments Google sheet. It looks like this:
    /// https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    #[arg(long)]
    sheet_url: String,

    /// The URL to your brokerage Google sheet.
    #[arg(long)]
    brokerage_sheet_url: String,

    /// The path to your downloaded OAuth API credentials. This file will be moved to the default
    /// secrets location in the main data directory.
    #[arg(long)]
    client_secret: PathBuf,
}

impl InitArgs {
    pub fn new(
        sheet_url: impl Into<String>,
        brokerage_sheet_url: impl Into<String>,
        client_secret: impl Into<PathBuf>,
    ) -> Self {
        Self {
            sheet_url: sheet_url.into(),
            brokerage_sheet_url: brokerage_sheet_url.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn sheet_url(&self) -> &str {
        &self.sheet_url
    }

    pub fn brokerage_sheet_url(&self) -> &str {
        &self.brokerage_sheet_url
    }

    pub fn client_secret(&self) -> &Path {
        &self.client_secret
    }
}

/// (Not shown): Args for the `moverperfect auth` command.
#[derive(Debug, Parser, Clone)]
pub struct AuthArgs {
    /// Verify and refresh authentication.
    #[arg(long)]
    verify: bool,
}

impl AuthArgs {
    pub fn new(verify: bool) -> Self {
        Self { verify }
    }

    pub fn verify(&self) -> bool {
        self.verify
    }
}

/// (Not shown): Args for the `moverperfect run` command.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// Only reconcile this platform. Can be given more than once. Platforms are always processed
    /// in the same order: nutmeg, shareworks, standard-life, hargreaves.
    #[arg(long = "platform", value_enum)]
    platforms: Vec<Platform>,
}

impl RunArgs {
    pub fn new(platforms: Vec<Platform>) -> Self {
        Self { platforms }
    }

    /// The platforms to reconcile, in processing order. All of them when none were given.
    pub fn platforms(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|p| self.platforms.is_empty() || self.platforms.contains(p))
            .collect()
    }
}

fn default_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("moverperfect"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --moverperfect-home or MOVERPERFECT_HOME instead of relying on \
                the default home directory. If you continue using the program right now, you may \
                have problems!",
            );
            PathBuf::from("moverperfect")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_platforms_default_to_all() {
        let args = Args::try_parse_from(["moverperfect", "run"]).unwrap();
        let Command::Run(run) = args.command() else {
            panic!("expected the run command");
        };
        assert_eq!(run.platforms(), Platform::ALL.to_vec());
    }

    #[test]
    fn test_run_platforms_keep_processing_order() {
        let args = Args::try_parse_from([
            "moverperfect",
            "--log-level",
            "debug",
            "run",
            "--platform",
            "hargreaves",
            "--platform",
            "nutmeg",
        ])
        .unwrap();
        assert_eq!(args.common().log_level(), LevelFilter::DEBUG);
        let Command::Run(run) = args.command() else {
            panic!("expected the run command");
        };
        assert_eq!(
            run.platforms(),
            vec![Platform::Nutmeg, Platform::Hargreaves]
        );
    }

    #[test]
    fn test_init_args() {
        let args = Args::try_parse_from([
            "moverperfect",
            "--moverperfect-home",
            "/tmp/mp",
            "init",
            "--sheet-url",
            "https://docs.google.com/spreadsheets/d/A",
            "--brokerage-sheet-url",
            "https://docs.google.com/spreadsheets/d/B",
            "--client-secret",
            "secret.json",
        ])
        .unwrap();
        assert_eq!(args.common().moverperfect_home().path(), Path::new("/tmp/mp"));
        let Command::Init(init) = args.command() else {
            panic!("expected the init command");
        };
        assert_eq!(init.brokerage_sheet_url(), "https://docs.google.com/spreadsheets/d/B");
        assert_eq!(init.client_secret(), Path::new("secret.json"));
    }
}
