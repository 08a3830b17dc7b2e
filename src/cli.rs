use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "clarity",
    version,
    about = "Local scoring-checklist tooling: rate items, track group commits, export totals"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print recomputed totals, completeness bands, and group commit states
    Status(StatusArgs),
    /// Print the full checklist hierarchy with scales and current ratings
    List(ListArgs),
    /// Assign a rating to one item, or clear it back to unrated
    Rate(RateArgs),
    /// Reset one group: clear its item ratings and its commit flag
    ResetGroup(GroupArgs),
    /// Mark one group as committed
    CommitGroup(GroupArgs),
    /// Clear every rating and commit flag and remove the state slot
    ResetAll(ResetAllArgs),
    /// Mark every group in the definition as committed
    CommitAll(CommonArgs),
    /// Export the checklist as CSV or a text report
    Export(ExportArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    #[arg(long, default_value = "checklist.json")]
    pub definition: PathBuf,

    #[arg(long, default_value = ".clarity")]
    pub state_root: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Debug, Clone)]
pub struct RateArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(long)]
    pub item: String,

    /// Rating to assign; must be one of the item's scale values
    #[arg(long, conflicts_with = "clear")]
    pub score: Option<u32>,

    /// Remove the item's rating, returning it to the unrated state
    #[arg(long, default_value_t = false)]
    pub clear: bool,
}

#[derive(Args, Debug, Clone)]
pub struct GroupArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Fully-qualified group id, e.g. "S-TI"
    #[arg(long)]
    pub group: String,
}

#[derive(Args, Debug, Clone)]
pub struct ResetAllArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Skip the interactive confirmation prompt
    #[arg(long, default_value_t = false)]
    pub yes: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Report,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Report => "report",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(value_enum)]
    pub format: ExportFormat,

    /// Write to a file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}
