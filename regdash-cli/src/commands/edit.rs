//! Mutating commands: create, update, delete
//!
//! Each one loads the resource first so select options and the local
//! snapshot are current, then goes through the same dialogs the TUI uses.

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use inquire::Text;
use regdash_core::{EditDraft, ListController, Operation};

use super::{parse_assignment, reported, ConsoleSink, Session};
use crate::ui;

#[derive(Parser, Debug)]
pub struct CreateArgs {
    /// Resource name
    pub resource: String,

    /// Field value, repeatable: --set nombre_agente=Ana
    #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment, required = true)]
    pub values: Vec<(String, String)>,
}

#[derive(Parser, Debug)]
pub struct UpdateArgs {
    /// Resource name
    pub resource: String,

    /// Identity of the record to change
    pub id: String,

    /// Field value, repeatable: --set estado_u=retirado
    #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment, required = true)]
    pub values: Vec<(String, String)>,
}

#[derive(Parser, Debug)]
pub struct DeleteArgs {
    /// Resource name
    pub resource: String,

    /// Identity of the record to delete
    pub id: String,

    /// Retyped identity; prompts when omitted
    #[arg(long)]
    pub confirm: Option<String>,
}

async fn load(session: &Session, resource: &str) -> Result<ListController> {
    let mut controller = session.controller(resource, None, Arc::new(ConsoleSink))?;
    let title = controller.config().resource().title.clone();
    ui::with_spinner_async(
        format!("Loading {}", title),
        format!("Loaded {}", title),
        async { reported(controller.refresh().await, Operation::Load) },
    )
    .await?;
    Ok(controller)
}

fn fill(draft: &mut EditDraft, values: Vec<(String, String)>) -> Result<()> {
    for (field, value) in values {
        draft
            .set(&field, value)
            .with_context(|| format!("Cannot set '{}'", field))?;
    }
    Ok(())
}

pub async fn run_create(session: &Session, args: CreateArgs) -> Result<()> {
    let mut controller = load(session, &args.resource).await?;
    let resource = controller.config().resource().clone();

    let mut draft = EditDraft::blank(controller.schema(), &resource.item_type);
    fill(&mut draft, args.values)?;
    let record = draft
        .finish()
        .with_context(|| format!("Invalid {}", resource.item_type))?;

    reported(controller.create(record).await, Operation::Create)
}

pub async fn run_update(session: &Session, args: UpdateArgs) -> Result<()> {
    let mut controller = load(session, &args.resource).await?;

    let mut draft = controller.edit_draft(&args.id)?;
    fill(&mut draft, args.values)?;
    if !draft.is_dirty() {
        println!("Nothing to change");
        return Ok(());
    }

    reported(controller.save_edit(&draft).await, Operation::Update)
}

pub async fn run_delete(session: &Session, args: DeleteArgs) -> Result<()> {
    let mut controller = load(session, &args.resource).await?;
    let confirmation = controller.delete_confirmation(&args.id)?;

    let typed = match args.confirm {
        Some(typed) => typed,
        None => {
            if !std::io::stdin().is_terminal() {
                bail!("Refusing to delete without confirmation: pass --confirm {}", args.id);
            }
            Text::new(&format!("{}:", confirmation.prompt()))
                .with_help_message("Esc to cancel")
                .prompt()
                .context("Deletion cancelled")?
        }
    };

    reported(controller.delete(&confirmation, &typed).await, Operation::Delete)
}
