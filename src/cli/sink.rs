//! Destinations for decoded events

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::events::EventRecord;
use crate::store::EventStore;

/// Receives batches of decoded events from a query or a watcher
#[async_trait]
pub trait EventSink: Send {
    async fn handle(&mut self, records: &[EventRecord]) -> Result<()>;

    /// Called once after the last batch
    async fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Prints events as text lines or JSON lines
pub struct StdoutSink {
    json: bool,
}

impl StdoutSink {
    pub fn new(json: bool) -> Self {
        Self { json }
    }
}

pub fn format_record(record: &EventRecord) -> String {
    let block = record
        .block_number
        .map(|b| b.to_string())
        .unwrap_or_else(|| "pending".to_string());
    let index = record
        .log_index
        .map(|i| i.to_string())
        .unwrap_or_else(|| "-".to_string());
    let removed = if record.removed { " (removed)" } else { "" };
    format!(
        "#{block}:{index} {}{removed} {}",
        record.name(),
        record.fields()
    )
}

#[async_trait]
impl EventSink for StdoutSink {
    async fn handle(&mut self, records: &[EventRecord]) -> Result<()> {
        for record in records {
            if self.json {
                println!("{}", serde_json::to_string(&record.to_row())?);
            } else {
                println!("{}", format_record(record));
            }
        }
        Ok(())
    }
}

/// Indexes events into the local database, then forwards them
pub struct StoreSink<S> {
    store: EventStore,
    next: S,
    written: usize,
}

impl<S: EventSink> StoreSink<S> {
    pub fn new(store: EventStore, next: S) -> Self {
        Self {
            store,
            next,
            written: 0,
        }
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

#[async_trait]
impl<S: EventSink> EventSink for StoreSink<S> {
    async fn handle(&mut self, records: &[EventRecord]) -> Result<()> {
        self.written += self.store.insert_events(records)?;
        self.next.handle(records).await
    }

    async fn finish(&mut self) -> Result<()> {
        let stats = self.store.stats()?;
        tracing::info!(
            written = self.written,
            total = stats.total,
            last_block = ?stats.last_block,
            "event index updated"
        );
        self.next.finish().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::NodeRegistry;
    use crate::domain::events::tests::rpc_log;
    use alloy::primitives::{address, Address, U256};
    use alloy::sol_types::SolEvent;

    const REGISTRY: Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");

    /// Collects what reaches the end of a sink chain
    #[derive(Default)]
    struct Collect(Vec<&'static str>);

    #[async_trait]
    impl EventSink for Collect {
        async fn handle(&mut self, records: &[EventRecord]) -> Result<()> {
            self.0.extend(records.iter().map(EventRecord::name));
            Ok(())
        }
    }

    fn disabled(block: u64) -> EventRecord {
        let event = NodeRegistry::NodeDisabled {
            nodeId: U256::from(100),
        };
        EventRecord::from_log(&rpc_log(REGISTRY, event.encode_log_data(), block, 0), REGISTRY)
            .unwrap()
    }

    #[tokio::test]
    async fn test_store_sink_indexes_and_forwards() {
        let store = EventStore::open_in_memory(1, REGISTRY).unwrap();
        let mut sink = StoreSink::new(store, Collect::default());

        sink.handle(&[disabled(5), disabled(6)]).await.unwrap();
        sink.finish().await.unwrap();

        assert_eq!(sink.written(), 2);
        assert_eq!(sink.next.0, vec!["NodeDisabled", "NodeDisabled"]);
        assert_eq!(sink.store.last_indexed_block().unwrap(), Some(6));
    }

    #[test]
    fn test_format_record() {
        let line = format_record(&disabled(7));
        assert_eq!(line, r#"#7:0 NodeDisabled {"nodeId":"100"}"#);
    }
}
