//! `events` and `watch` commands

use anyhow::{bail, Result};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::sink::{EventSink, StdoutSink, StoreSink};
use super::{EventsArgs, Session, WatchArgs};
use crate::domain::events::{resolve_event, EventRecord, EVENT_NAMES};
use crate::error::RegistryResult;
use crate::registry::{BlockRange, EventFilter};

/// Build a filter from event names given on the command line
pub(super) fn event_filter(names: &[String]) -> Result<EventFilter> {
    let mut topics = Vec::with_capacity(names.len());
    for name in names {
        match resolve_event(name) {
            Some((_, topic)) => topics.push(topic),
            None => bail!("unknown event '{name}'; known events: {}", EVENT_NAMES.join(", ")),
        }
    }
    Ok(EventFilter::only(topics))
}

fn make_sink(session: &Session, store: bool, json: bool) -> Result<Box<dyn EventSink>> {
    let stdout = StdoutSink::new(json);
    if store {
        Ok(Box::new(StoreSink::new(session.open_store()?, stdout)))
    } else {
        Ok(Box::new(stdout))
    }
}

/// First block to scan: explicit, else resume from the index, else the configured start
fn start_block(session: &Session, from: Option<u64>, store: bool) -> Result<u64> {
    if let Some(from) = from {
        return Ok(from);
    }
    if store {
        if let Some(last) = session.open_store()?.last_indexed_block()? {
            // upserts make re-reading the last block harmless
            return Ok(last.max(session.config.start_block));
        }
    }
    Ok(session.config.start_block)
}

pub async fn query(session: &Session, args: EventsArgs) -> Result<()> {
    let registry = session.registry()?;
    let filter = event_filter(&args.events)?;
    let range = BlockRange::new(start_block(session, args.from, args.store)?, args.to);

    let records = registry.query_events(range, &filter).await?;
    info!(from = range.from, to = ?range.to, events = records.len(), "queried events");

    let mut sink = make_sink(session, args.store, args.json)?;
    sink.handle(&records).await?;
    sink.finish().await
}

pub async fn watch(session: &Session, args: WatchArgs) -> Result<()> {
    let registry = session.registry()?;
    let filter = event_filter(&args.events)?;
    let mut sink = make_sink(session, args.store, args.json)?;

    let (backlog, mut events) = if args.store {
        let from = start_block(session, None, true)?;
        let (backlog, events) = registry.watch_events_from(from, &filter).await?;
        info!(from, events = backlog.len(), "caught up from index");
        (backlog, events)
    } else {
        (Vec::new(), registry.watch_events(&filter).await?)
    };
    info!(contract = %registry.address(), endpoint = %session.endpoint.display(), "watching events");
    sink.handle(&backlog).await?;

    let endpoint = session.endpoint.display();
    let result = forward_until_interrupted(&mut events, sink.as_mut(), &endpoint).await;
    sink.finish().await?;
    result
}

/// Hand live records to the sink until Ctrl-C; a closed stream is an error
async fn forward_until_interrupted(
    events: &mut mpsc::Receiver<RegistryResult<EventRecord>>,
    sink: &mut dyn EventSink,
    endpoint: &str,
) -> Result<()> {
    loop {
        tokio::select! {
            item = events.recv() => match item {
                Some(Ok(record)) => sink.handle(std::slice::from_ref(&record)).await?,
                Some(Err(err)) => warn!(%err, "dropping undecodable log"),
                None => bail!("event stream closed by {endpoint}"),
            },
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}
