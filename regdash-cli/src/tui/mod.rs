//! Interactive dashboard
//!
//! One tab per resource with:
//! - Live search, column sort and page size cycling
//! - Summary cards over the whole collection
//! - Typed-identity delete confirmation and an edit/create form
//! - Background refresh on the configured interval
//!
//! Requests run on the tokio runtime while the draw loop keeps the last
//! snapshot on screen.

pub mod app;
pub mod event;
pub mod terminal;
pub mod ui;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use regdash_core::{resources, ListController, MemorySink, PageSize};

use crate::commands::{parse_page_size, Session};

#[derive(Parser, Debug)]
pub struct TuiArgs {
    /// Resource to open first (default: the first tab)
    pub resource: Option<String>,

    /// Rows per page: 10, 20 or 50
    #[arg(long, value_parser = parse_page_size)]
    pub page_size: Option<PageSize>,
}

/// Build a tab per resource and run the TUI until the user quits
pub async fn launch(session: &Session, args: TuiArgs) -> Result<()> {
    let all = resources::all().context("Failed to build resource declarations")?;
    let active = match &args.resource {
        Some(name) => {
            let wanted = resources::find(name)
                .with_context(|| format!("Known resources: {}", resources::names().join(", ")))?;
            all.iter().position(|r| r.name == wanted.name).unwrap_or(0)
        }
        None => 0,
    };

    let client = session.client()?;
    let sink = Arc::new(MemorySink::new());
    let controllers = all
        .into_iter()
        .map(|resource| {
            let view = session.view(resource, args.page_size)?;
            Ok(ListController::new(view, client.clone(), sink.clone()))
        })
        .collect::<Result<Vec<_>>>()?;

    let refresh_every = session.config.view.refresh_interval();
    let handle = tokio::runtime::Handle::current();
    tokio::task::spawn_blocking(move || {
        terminal::run(handle, controllers, sink, active, refresh_every)
    })
    .await
    .context("TUI thread panicked")?
}
