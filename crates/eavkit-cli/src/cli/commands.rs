//! # CLI Layer
//!
//! The CLI layer is the **only** place in the codebase that:
//! - Knows about terminal I/O (stdout, stderr)
//! - Initializes the tracing subscriber
//! - Handles argument parsing
//! - Formats output for human consumption
//!
//! ## Responsibilities
//!
//! 1. **Argument Parsing**: Convert shell arguments into typed commands via clap
//! 2. **Context Setup**: Load config, open the file store, build the API
//! 3. **Dispatch**: Route commands to handlers
//! 4. **Output Formatting**: Text via `render`, or JSON with `--output json`
//! 5. **Error Handling**: Field errors go to stderr, one per line, and fail the run

use super::render;
use super::setup::{AttrCommands, Cli, Commands, ItemArgs, OptionCommands, OutputMode};
use anyhow::{bail, Context, Result};
use clap::Parser;
use eavkit::api::AttrsApi;
use eavkit::attributes::AttributeDraft;
use eavkit::catalog::StaticCatalog;
use eavkit::config::EavConfig;
use eavkit::error::EavError;
use eavkit::forms::FormData;
use eavkit::model::{category_set, CategoryId, ItemId};
use eavkit::store::backend::StorageBackend;
use eavkit::store::fs::FileStore;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "EAVKIT_LOG";

pub struct AppContext {
    pub api: AttrsApi<FileStore>,
    pub output: OutputMode,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = create_context(&cli)?;
    match cli.command {
        Commands::Attr(cmd) => handle_attr(&ctx, cmd),
        Commands::Options(cmd) => handle_option(&ctx, cmd),
        Commands::Form(args) => handle_form(&ctx, &args),
        Commands::Edit {
            item,
            new_categories,
            fields,
        } => handle_edit(&ctx, &item, new_categories, fields),
        Commands::Show(args) => handle_show(&ctx, &args),
        Commands::Filter {
            categories,
            items,
            selections,
        } => handle_filter(&ctx, categories, items, selections),
        Commands::Forget { item } => handle_forget(&ctx, &item),
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn create_context(cli: &Cli) -> Result<AppContext> {
    let mut config = EavConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    }
    let store = FileStore::open(config.data_dir()?).with_slugger(config.slugger()?);
    debug!(store = %store.backend().describe(), policy = %config.invalidation, "opened attribute store");

    Ok(AppContext {
        api: AttrsApi::with_config(store, &config),
        output: cli.output,
    })
}

fn emit<T: Serialize + ?Sized>(ctx: &AppContext, value: &T, text: impl FnOnce(&T) -> String) -> Result<()> {
    match ctx.output {
        OutputMode::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputMode::Text => print!("{}", text(value)),
    }
    Ok(())
}

/// Field errors are user-correctable: list them all, then fail.
fn report_validation(ctx: &AppContext, err: EavError) -> anyhow::Error {
    let EavError::Validation(errors) = err else {
        return err.into();
    };
    let messages = ctx.api.form_options().messages(&errors);
    match ctx.output {
        OutputMode::Json => {
            let json: Vec<_> = messages
                .iter()
                .map(|(field, message)| serde_json::json!({ "field": field, "message": message }))
                .collect();
            eprintln!("{}", serde_json::Value::Array(json));
        }
        OutputMode::Text => eprint!("{}", render::render_field_errors(&messages)),
    }
    anyhow::anyhow!("{} field error(s)", errors.len())
}

/// The host catalog as given on the command line: one item and its categories.
fn item_catalog(args: &ItemArgs) -> (StaticCatalog, ItemId) {
    let item = ItemId::new(args.item.as_str());
    let catalog = StaticCatalog::new().with_item(
        item.clone(),
        category_set(args.categories.iter().map(String::as_str)),
    );
    (catalog, item)
}

fn form_data(pairs: Vec<(String, String)>) -> FormData {
    let mut data = FormData::new();
    for (key, value) in pairs {
        data.append(key, value);
    }
    data
}

fn handle_attr(ctx: &AppContext, cmd: AttrCommands) -> Result<()> {
    match cmd {
        AttrCommands::Create {
            name,
            kind,
            code,
            categories,
            required,
            hidden,
            filterable,
        } => {
            let mut draft = AttributeDraft::new(name, kind)
                .categories(category_set(categories.iter().map(String::as_str)));
            if let Some(code) = code {
                draft = draft.code(code);
            }
            if required {
                draft = draft.required();
            }
            if hidden {
                draft = draft.hidden();
            }
            if filterable {
                draft = draft.filterable();
            }
            let def = ctx
                .api
                .create_attribute(draft)
                .map_err(|e| report_validation(ctx, e))?;
            emit(ctx, &def, |d| format!("Created {}\n", render::render_attribute(d)))
        }
        AttrCommands::List { category } => {
            let defs = match category {
                Some(category) => ctx.api.attributes_for_category(&CategoryId::new(category))?,
                None => ctx.api.list_attributes()?,
            };
            emit(ctx, defs.as_slice(), render::render_attributes)
        }
        AttrCommands::Delete { code } => {
            let report = ctx.api.delete_attribute(&code)?;
            match ctx.output {
                OutputMode::Json => println!(
                    "{}",
                    serde_json::json!({ "code": code, "options": report.options, "values": report.values })
                ),
                OutputMode::Text => print!("{}", render::render_cascade(&code, &report)),
            }
            Ok(())
        }
    }
}

fn handle_option(ctx: &AppContext, cmd: OptionCommands) -> Result<()> {
    match cmd {
        OptionCommands::Add { code, label } => {
            if label.trim().is_empty() {
                bail!("option label must not be empty");
            }
            let option = ctx.api.add_option(&code, label.trim())?;
            emit(ctx, &option, |o| format!("{}  {}\n", o.id, o.name))
        }
        OptionCommands::List { code } => {
            let options = ctx.api.list_options(&code)?;
            emit(ctx, options.as_slice(), render::render_options)
        }
        OptionCommands::Delete { id } => {
            let values = ctx.api.delete_option(id)?;
            emit(ctx, &serde_json::json!({ "id": id, "values": values }), |_| {
                format!("Deleted option {} ({} values)\n", id, values)
            })
        }
    }
}

fn handle_form(ctx: &AppContext, args: &ItemArgs) -> Result<()> {
    let (catalog, item) = item_catalog(args);
    let form = ctx.api.edit_form_for(&catalog, &item)?;
    emit(ctx, form.fields(), render::render_fields)
}

fn handle_edit(
    ctx: &AppContext,
    args: &ItemArgs,
    new_categories: Vec<String>,
    fields: Vec<(String, String)>,
) -> Result<()> {
    let (catalog, item) = item_catalog(args);
    let moved = (!new_categories.is_empty())
        .then(|| category_set(new_categories.iter().map(String::as_str)));
    let data = form_data(fields);

    let report = ctx
        .api
        .submit_for(&catalog, &item, moved, &data)
        .map_err(|e| report_validation(ctx, e))?;
    emit(ctx, &report, render::render_commit)
}

fn handle_show(ctx: &AppContext, args: &ItemArgs) -> Result<()> {
    let (catalog, item) = item_catalog(args);
    let values = ctx.api.display_values_for(&catalog, &item)?;
    emit(ctx, values.as_slice(), render::render_values)
}

fn handle_filter(
    ctx: &AppContext,
    categories: Vec<String>,
    items: Vec<String>,
    selections: Vec<(String, String)>,
) -> Result<()> {
    let categories = category_set(categories.iter().map(String::as_str));
    let items: Vec<ItemId> = items.into_iter().map(ItemId::new).collect();
    let matched = ctx
        .api
        .filter(&categories, &items, &form_data(selections))
        .map_err(|e| report_validation(ctx, e))?;
    emit(ctx, matched.as_slice(), render::render_items)
}

fn handle_forget(ctx: &AppContext, item: &str) -> Result<()> {
    let removed = ctx.api.delete_item(&ItemId::new(item))?;
    emit(ctx, &serde_json::json!({ "item": item, "values": removed }), |_| {
        format!("Removed {} values of {}\n", removed, item)
    })
}
