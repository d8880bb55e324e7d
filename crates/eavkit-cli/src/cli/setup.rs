use clap::{Args, Parser, Subcommand, ValueEnum};
use eavkit::attributes::AttributeKind;
use eavkit::model::OptionId;
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "eavkit", bin_name = "eavkit", version, disable_help_subcommand = true)]
#[command(about = "Typed, category-scoped attributes for catalog items", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding attributes.json (overrides config)
    #[arg(long, global = true, help_heading = "Options")]
    pub data_dir: Option<PathBuf>,

    /// Config file (eavkit.toml)
    #[arg(long, global = true, help_heading = "Options")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, global = true, value_enum, default_value_t = OutputMode::Text, help_heading = "Options")]
    pub output: OutputMode,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage attribute definitions
    #[command(subcommand, display_order = 1)]
    Attr(AttrCommands),

    /// Manage the options of a select attribute
    #[command(subcommand, name = "option", display_order = 2)]
    Options(OptionCommands),

    /// Print the edit form fields of an item
    #[command(display_order = 10)]
    Form(ItemArgs),

    /// Submit attribute values for an item
    #[command(display_order = 11)]
    Edit {
        #[command(flatten)]
        item: ItemArgs,

        /// Move the item to these categories before saving
        #[arg(long = "new-category", value_name = "CATEGORY")]
        new_categories: Vec<String>,

        /// Form fields as KEY=VALUE (e.g. attr_size=42 option_attr_color=Red)
        #[arg(value_parser = parse_pair, value_name = "KEY=VALUE")]
        fields: Vec<(String, String)>,
    },

    /// Show the visible attribute values of an item
    #[command(display_order = 12)]
    Show(ItemArgs),

    /// Filter items by option selections
    #[command(display_order = 13)]
    Filter {
        /// Categories whose filterable attributes apply
        #[arg(long = "category", value_name = "CATEGORY", required = true)]
        categories: Vec<String>,

        /// Candidate items
        #[arg(long = "item", value_name = "ITEM", required = true)]
        items: Vec<String>,

        /// Selections as KEY=OPTION_ID; repeat a key for OR within an attribute
        #[arg(value_parser = parse_pair, value_name = "KEY=OPTION_ID")]
        selections: Vec<(String, String)>,
    },

    /// Remove every stored value of an item the host deleted
    #[command(display_order = 14)]
    Forget {
        #[arg(long)]
        item: String,
    },
}

#[derive(Args, Debug)]
pub struct ItemArgs {
    /// Item id
    #[arg(long)]
    pub item: String,

    /// Current categories of the item
    #[arg(long = "category", value_name = "CATEGORY")]
    pub categories: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum AttrCommands {
    /// Create an attribute definition
    Create {
        /// Display name
        name: String,

        #[arg(long, value_parser = parse_kind)]
        kind: AttributeKind,

        /// Code; derived from the name when omitted
        #[arg(long)]
        code: Option<String>,

        /// Category the attribute applies to (repeatable)
        #[arg(long = "category", value_name = "CATEGORY")]
        categories: Vec<String>,

        #[arg(long)]
        required: bool,

        #[arg(long)]
        hidden: bool,

        #[arg(long)]
        filterable: bool,
    },

    /// List attribute definitions
    #[command(alias = "ls")]
    List {
        /// Only attributes applicable to this category
        #[arg(long)]
        category: Option<String>,
    },

    /// Delete a definition with its options and values
    #[command(alias = "rm")]
    Delete { code: String },
}

#[derive(Subcommand, Debug)]
pub enum OptionCommands {
    /// Add an option (returns the existing one if the label is taken)
    Add { code: String, label: String },

    /// List the options of an attribute
    #[command(alias = "ls")]
    List { code: String },

    /// Delete an option and the values selecting it
    #[command(alias = "rm")]
    Delete {
        #[arg(value_parser = parse_option_id)]
        id: OptionId,
    },
}

pub fn parse_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

fn parse_kind(s: &str) -> Result<AttributeKind, String> {
    AttributeKind::parse(&s.to_lowercase()).ok_or_else(|| {
        let kinds: Vec<&str> = AttributeKind::ALL.iter().map(|k| k.as_str()).collect();
        format!("unknown kind '{}' (expected one of: {})", s, kinds.join(", "))
    })
}

fn parse_option_id(s: &str) -> Result<OptionId, String> {
    s.parse::<OptionId>()
        .map_err(|e| format!("invalid option id '{}': {}", s, e))
}
