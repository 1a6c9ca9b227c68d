use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand, ValueEnum};

use crate::domain::EntityKind;
use crate::transfer::FileFormat;

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

pub fn styled_command() -> clap::Command {
    Cli::command()
}

#[derive(Debug, Parser)]
#[command(name = "recordbook")]
#[command(bin_name = "recordbook")]
#[command(version)]
#[command(about = "Local-first record store for admin dashboard data")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        short = 'd',
        long,
        global = true,
        env = "RECORDBOOK_DB",
        default_value = ".recordbook/storage.sqlite",
        help = "Path to the SQLite storage database."
    )]
    pub db: String,

    #[arg(
        short = 'c',
        long,
        global = true,
        env = "RECORDBOOK_CONFIG",
        default_value = ".recordbook/config.toml",
        help = "Path to the TOML config file (optional)."
    )]
    pub config: PathBuf,

    #[arg(
        short = 'v',
        long,
        global = true,
        action = ArgAction::Count,
        help = "Log more (-v info, -vv debug). RUST_LOG overrides."
    )]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Create the storage database and default config, seeding sample data.")]
    Init,
    #[command(about = "List records with search, filter, sort and paging.")]
    Ls(ListArgs),
    #[command(about = "Show one record.")]
    Show(ShowArgs),
    #[command(about = "Add a record from field=value pairs.")]
    Add(AddArgs),
    #[command(about = "Edit fields of one record.")]
    Update(UpdateArgs),
    #[command(about = "Delete one record.")]
    Rm(RemoveArgs),
    #[command(about = "Delete every record of an entity.")]
    Clear(ClearArgs),
    #[command(about = "Describe the fields of an entity.")]
    Fields(FieldsArgs),
    #[command(about = "Manage invoice line items.")]
    Items(ItemsArgs),
    #[command(about = "Export records as CSV or JSON.")]
    Export(ExportArgs),
    #[command(about = "Print a CSV import template.")]
    Template(TemplateArgs),
    #[command(about = "Import records from a CSV or JSON file.")]
    Import(ImportArgs),
    #[command(about = "Summarize counts and numeric totals.")]
    Stats(StatsArgs),
    #[command(about = "Find tasks whose project no longer exists.")]
    Check(CheckArgs),
    #[command(about = "Show or change the dark mode preference.")]
    Theme(ThemeArgs),
    #[command(about = "Ask the configured assistant, optionally with records attached.")]
    Ai(AiArgs),
    #[command(about = "Generate or install shell completions.")]
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args, Default)]
pub struct QueryArgs {
    #[arg(short = 'q', long, help = "Case-insensitive text search.")]
    pub search: Option<String>,

    #[arg(
        short = 's',
        long,
        help = "Keep records whose filter field equals this value (\"all\" disables)."
    )]
    pub filter: Option<String>,

    #[arg(
        long = "filter-field",
        help = "Field the filter applies to (defaults to the entity's category field)."
    )]
    pub filter_field: Option<String>,

    #[arg(
        long,
        help = "Sort by field; repeating the same field flips direction like a header click."
    )]
    pub sort: Vec<String>,

    #[arg(long, help = "Reverse the final sort direction.")]
    pub desc: bool,

    #[arg(short = 'p', long, help = "Page number (1-based, clamped).")]
    pub page: Option<usize>,

    #[arg(long = "page-size", help = "Rows per page (defaults to config).")]
    pub page_size: Option<usize>,

    #[arg(long = "no-page", help = "Disable paging.", conflicts_with_all = ["page", "page_size"])]
    pub no_page: bool,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(help = "Entity: projects, tasks, invoices, shipments, companies, products.")]
    pub entity: EntityKind,

    #[command(flatten)]
    pub query: QueryArgs,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    pub entity: EntityKind,

    #[arg(help = "Record id.")]
    pub id: String,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    pub entity: EntityKind,

    #[arg(help = "Field assignments such as status=draft (names or see `fields`).")]
    pub values: Vec<String>,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    pub entity: EntityKind,

    #[arg(help = "Record id.")]
    pub id: String,

    #[arg(required = true, help = "Field assignments to change.")]
    pub values: Vec<String>,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct RemoveArgs {
    pub entity: EntityKind,

    #[arg(help = "Record id.")]
    pub id: String,

    #[arg(long, help = "When removing a project, also remove its tasks.")]
    pub cascade: bool,

    #[arg(short = 'y', long, help = "Skip the confirmation prompt.")]
    pub yes: bool,
}

#[derive(Debug, Args)]
pub struct ClearArgs {
    pub entity: EntityKind,

    #[arg(long, help = "Restore the seed records instead of leaving the collection empty.")]
    pub reseed: bool,

    #[arg(short = 'y', long, help = "Skip the confirmation prompt.")]
    pub yes: bool,
}

#[derive(Debug, Args)]
pub struct FieldsArgs {
    pub entity: EntityKind,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ItemsArgs {
    #[command(subcommand)]
    pub command: ItemsSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum ItemsSubcommands {
    #[command(about = "List the line items of an invoice.")]
    Ls(ItemsListArgs),
    #[command(about = "Append a line item to an invoice.")]
    Add(ItemsAddArgs),
    #[command(about = "Remove a line item by its 1-based position.")]
    Rm(ItemsRemoveArgs),
}

#[derive(Debug, Args)]
pub struct ItemsListArgs {
    #[arg(help = "Invoice id.")]
    pub invoice: String,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ItemsAddArgs {
    #[arg(help = "Invoice id.")]
    pub invoice: String,

    #[arg(help = "Line item description.")]
    pub description: String,

    #[arg(long, default_value_t = 1.0, value_parser = parse_finite)]
    pub quantity: f64,

    #[arg(long = "unit-price", value_parser = parse_finite)]
    pub unit_price: f64,
}

#[derive(Debug, Args)]
pub struct ItemsRemoveArgs {
    #[arg(help = "Invoice id.")]
    pub invoice: String,

    #[arg(help = "Position shown by `items ls`.")]
    pub index: usize,
}

fn parse_finite(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", raw))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("'{}' is not a finite number", raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for FileFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Csv => FileFormat::Csv,
            FormatArg::Json => FileFormat::Json,
        }
    }
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    pub entity: EntityKind,

    #[arg(short = 'f', long, value_enum, default_value = "csv")]
    pub format: FormatArg,

    #[arg(short = 'o', long, help = "Write to a file instead of stdout.")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub query: QueryArgs,
}

#[derive(Debug, Args)]
pub struct TemplateArgs {
    pub entity: EntityKind,

    #[arg(short = 'o', long, help = "Write to a file instead of stdout.")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    pub entity: EntityKind,

    #[arg(help = "CSV or JSON file.")]
    pub file: PathBuf,

    #[arg(
        short = 'f',
        long,
        value_enum,
        help = "Input format (defaults to the file extension)."
    )]
    pub format: Option<FormatArg>,

    #[arg(long, help = "Reject the whole file if any row is invalid.")]
    pub strict: bool,

    #[arg(long = "dry-run", help = "Validate without writing.")]
    pub dry_run: bool,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    pub entity: EntityKind,

    #[command(flatten)]
    pub query: QueryArgs,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    #[arg(long, help = "Remove orphaned tasks.")]
    pub fix: bool,

    #[arg(short = 'y', long, help = "Skip the confirmation prompt.")]
    pub yes: bool,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeAction {
    On,
    Off,
    Toggle,
}

#[derive(Debug, Args)]
pub struct ThemeArgs {
    #[arg(value_enum, help = "Omit to print the current setting.")]
    pub action: Option<ThemeAction>,
}

#[derive(Debug, Args)]
pub struct AiArgs {
    #[arg(help = "Prompt text; read from stdin when omitted.")]
    pub prompt: Option<String>,

    #[arg(short = 'e', long, help = "Attach this entity's records as CSV.")]
    pub entity: Option<EntityKind>,

    #[arg(short = 'a', long, help = "Attach a file.", conflicts_with = "entity")]
    pub attach: Option<PathBuf>,

    #[command(flatten)]
    pub query: QueryArgs,

    #[arg(short = 'j', long, help = "Render the reply as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    #[arg(help = "Shell name (bash, zsh, fish). Auto-detected if omitted.")]
    pub shell: Option<String>,

    #[arg(
        short = 'i',
        long = "install",
        help = "Write completions to the canonical path for the shell."
    )]
    pub install: bool,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
