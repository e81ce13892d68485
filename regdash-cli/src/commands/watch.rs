//! Periodic refresh of one resource until Ctrl-C

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use regdash_core::{ListController, Operation, RefreshTimer};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{reported, ConsoleSink, Session};

#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Resource name
    pub resource: String,

    /// Seconds between refreshes (default: view.refresh_interval_secs)
    #[arg(long, short)]
    pub interval: Option<u64>,
}

fn identities(controller: &ListController) -> HashSet<String> {
    let engine = controller.engine();
    engine
        .collection()
        .iter()
        .filter_map(|r| r.identity_key(engine.identity_field()))
        .collect()
}

fn report(controller: &ListController, previous: Option<&HashSet<String>>, current: &HashSet<String>) {
    let stamp = chrono::Local::now().format("%H:%M:%S");
    let title = &controller.config().resource().title;
    match previous {
        None => println!("[{}] {}: {} records", stamp, title, current.len()),
        Some(previous) => {
            let added = current.difference(previous).count();
            let removed = previous.difference(current).count();
            if added == 0 && removed == 0 {
                println!("[{}] {}: {} records, no changes", stamp, title, current.len());
            } else {
                println!(
                    "[{}] {}: {} records (+{} / -{})",
                    stamp,
                    title,
                    current.len(),
                    added,
                    removed
                );
            }
        }
    }
}

pub async fn run_watch(session: &Session, args: WatchArgs) -> Result<()> {
    let mut controller = session.controller(&args.resource, None, Arc::new(ConsoleSink))?;
    let period = match args.interval {
        Some(0) => bail!("--interval must be at least 1 second"),
        Some(secs) => Duration::from_secs(secs),
        None => controller.config().refresh_interval(),
    };

    reported(controller.refresh().await, Operation::Load)?;
    let mut last = identities(&controller);
    report(&controller, None, &last);

    let (tx, mut rx) = mpsc::channel(1);
    let _timer = RefreshTimer::spawn(period, tx);
    info!(resource = %args.resource, ?period, "watching, Ctrl-C to stop");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                debug!("interrupted");
                break;
            }
            tick = rx.recv() => {
                let Some(tick) = tick else { break };
                debug!(seq = tick.seq, "refresh tick");
                match controller.refresh().await {
                    Ok(()) => {
                        let current = identities(&controller);
                        report(&controller, Some(&last), &current);
                        last = current;
                    }
                    // already reported; the previous snapshot stays
                    Err(e) => warn!(error = %e, "refresh failed"),
                }
            }
        }
    }

    Ok(())
}
