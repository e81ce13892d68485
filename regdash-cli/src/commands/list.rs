//! Read-only commands: resources, list, summary, schema

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use regdash_core::{
    resources, ListController, Operation, PageSize, Paginated, Record, SortDirection,
};

use super::{get_output_format, parse_page_size, reported, ConsoleSink, OutputFormat, Session};
use crate::ui;

/// Longest cell printed in a human table
const MAX_CELL: usize = 40;

#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Resource name (students, programs, agents, inscriptions, active-students, moodle-students)
    pub resource: String,

    /// Case-insensitive substring matched against every field
    #[arg(long, short)]
    pub search: Option<String>,

    /// Column to sort by
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort descending instead of ascending
    #[arg(long, requires = "sort")]
    pub desc: bool,

    /// Page to show (clamped to the last page)
    #[arg(long, short, default_value = "1")]
    pub page: usize,

    /// Rows per page: 10, 20 or 50
    #[arg(long, value_parser = parse_page_size)]
    pub page_size: Option<PageSize>,

    /// Output format
    #[arg(long, short = 'o', value_enum, default_value = "human")]
    pub output: OutputFormat,

    /// Shorthand for --output json
    #[arg(long, conflicts_with = "output")]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct SummaryArgs {
    /// Resource name
    pub resource: String,

    /// Emit the cards as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct SchemaArgs {
    /// Resource name
    pub resource: String,

    /// Emit the schema as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run_resources() -> Result<()> {
    let all = resources::all().context("Failed to build resource declarations")?;
    let headers = vec![
        "NAME".to_string(),
        "PATH".to_string(),
        "IDENTITY".to_string(),
        "TITLE".to_string(),
    ];
    let rows = all
        .iter()
        .map(|r| {
            vec![
                r.name.clone(),
                r.path.clone(),
                r.identity().to_string(),
                r.title.clone(),
            ]
        })
        .collect::<Vec<_>>();
    print_table(&headers, &rows);
    Ok(())
}

/// Controller with the collection loaded, behind a spinner
async fn load(session: &Session, resource: &str, page_size: Option<PageSize>) -> Result<ListController> {
    let mut controller = session.controller(resource, page_size, Arc::new(ConsoleSink))?;
    let title = controller.config().resource().title.clone();
    ui::with_spinner_async(
        format!("Loading {}", title),
        format!("Loaded {}", title),
        async { reported(controller.refresh().await, Operation::Load) },
    )
    .await?;
    Ok(controller)
}

pub async fn run_list(session: &Session, args: ListArgs) -> Result<()> {
    let format = get_output_format(args.output, args.json);
    let mut controller = load(session, &args.resource, args.page_size).await?;

    if let Some(column) = &args.sort {
        if !controller.schema().contains(column) {
            let known: Vec<&str> = controller.schema().names().collect();
            bail!("Unknown column '{}' (columns: {})", column, known.join(", "));
        }
    }

    let engine = controller.engine_mut();
    if let Some(term) = &args.search {
        engine.set_search_term(term.clone());
    }
    if let Some(column) = &args.sort {
        engine.set_sort(column);
        if args.desc {
            engine.set_sort(column);
        }
    }
    let page = engine.go_to_page(args.page);
    if page != args.page {
        tracing::debug!(requested = args.page, page, "page clamped");
    }

    match format {
        OutputFormat::Json => {
            let engine = controller.engine();
            let items: Vec<Record> = engine.visible_slice().cloned().collect();
            let page = Paginated::new(items, engine.page_info());
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        OutputFormat::Quiet => {
            let engine = controller.engine();
            for record in engine.visible_slice() {
                println!("{}", record.value(engine.identity_field()));
            }
        }
        OutputFormat::Human => print_page(&controller),
    }

    Ok(())
}

fn print_page(controller: &ListController) {
    let engine = controller.engine();
    let state = engine.state();

    let headers: Vec<String> = controller
        .config()
        .columns()
        .iter()
        .zip(controller.config().headers(controller.schema()))
        .map(|(column, header)| match &state.sort {
            Some(sort) if &sort.column == column => {
                let arrow = match sort.direction {
                    SortDirection::Ascending => "▲",
                    SortDirection::Descending => "▼",
                };
                format!("{} {}", header, arrow)
            }
            _ => header,
        })
        .collect();

    let rows = controller.visible_rows();
    if rows.is_empty() {
        println!("No records");
    } else {
        print_table(&headers, &rows);
    }

    let info = engine.page_info();
    let footer = match info.shown_range() {
        Some((first, last)) => format!("Showing {}-{} of {}", first, last, info.total),
        None => format!("Showing 0 of {}", info.total),
    };
    println!(
        "\n{} (page {}/{}, {} per page{})",
        footer,
        info.page,
        info.total_pages(),
        state.page_size,
        if state.search.is_empty() {
            String::new()
        } else {
            format!(", search '{}'", state.search)
        }
    );
}

pub async fn run_summary(session: &Session, args: SummaryArgs) -> Result<()> {
    let controller = load(session, &args.resource, None).await?;
    let summaries = controller.summaries();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    println!("┌─ {}", controller.config().resource().title);
    for (i, summary) in summaries.iter().enumerate() {
        let prefix = if i + 1 == summaries.len() { "└─" } else { "├─" };
        println!("{} {}", prefix, summary);
    }
    Ok(())
}

pub fn run_schema(args: SchemaArgs) -> Result<()> {
    let resource = resources::find(&args.resource)
        .with_context(|| format!("Known resources: {}", resources::names().join(", ")))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&resource.schema)?);
        return Ok(());
    }

    println!("{} ({}), identity: {}", resource.title, resource.path, resource.identity());
    if resource.schema.generated_identity() {
        println!("identity is assigned by the backend");
    }
    println!();

    let headers = vec![
        "FIELD".to_string(),
        "LABEL".to_string(),
        "KIND".to_string(),
        "REQUIRED".to_string(),
        "RULES / OPTIONS".to_string(),
    ];
    let rows = resource
        .schema
        .fields()
        .iter()
        .map(|spec| {
            let mut notes: Vec<String> = spec.rules.iter().map(|r| format!("{:?}", r)).collect();
            if let Some(rel) = resource.related.iter().find(|r| r.field == spec.name) {
                notes.push(format!("options from {}", rel.path));
            } else if !spec.options.is_empty() {
                let values: Vec<&str> = spec.options.iter().map(|o| o.value.as_str()).collect();
                notes.push(values.join("|"));
            }
            vec![
                spec.name.clone(),
                spec.label.clone(),
                format!("{:?}", spec.kind).to_lowercase(),
                if spec.required { "yes" } else { "" }.to_string(),
                notes.join(", "),
            ]
        })
        .collect::<Vec<_>>();
    print_table(&headers, &rows);
    Ok(())
}

fn truncate(cell: &str) -> String {
    if cell.chars().count() <= MAX_CELL {
        cell.to_string()
    } else {
        let cut: String = cell.chars().take(MAX_CELL - 1).collect();
        format!("{}…", cut)
    }
}

/// Left-aligned table with a dashed rule under the header
pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|c| truncate(c)).collect())
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    println!("{}", line(headers));
    println!(
        "{}",
        widths.iter().map(|w| "─".repeat(*w)).collect::<Vec<_>>().join("  ")
    );
    for row in &rows {
        println!("{}", line(row));
    }
}
