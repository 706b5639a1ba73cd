//! SQLite index of decoded registry events

use std::path::Path;

use alloy::primitives::Address;
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use tracing::debug;

use crate::domain::events::{resolve_event, EventRecord, EventRow};

/// One indexed event, as stored
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEvent {
    pub block_number: u64,
    pub log_index: u64,
    pub event: String,
    pub tx_hash: Option<String>,
    pub block_hash: Option<String>,
    pub node_id: Option<String>,
    /// Event arguments as a JSON object
    pub payload: String,
}

impl StoredEvent {
    pub fn to_row(&self, contract: Address) -> Result<EventRow> {
        let event = resolve_event(&self.event)
            .map(|(name, _)| name)
            .with_context(|| format!("unknown event name {} in store", self.event))?;
        let fields = serde_json::from_str(&self.payload)
            .with_context(|| format!("corrupt payload at block {}", self.block_number))?;
        Ok(EventRow {
            event,
            block_number: Some(self.block_number),
            log_index: Some(self.log_index),
            transaction_hash: self.tx_hash.clone(),
            block_hash: self.block_hash.clone(),
            address: contract.to_string(),
            fields,
        })
    }
}

/// Selection over the index; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub events: Vec<String>,
    pub from_block: Option<u64>,
    pub to_block: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreStats {
    pub total: u64,
    pub first_block: Option<u64>,
    pub last_block: Option<u64>,
    /// Count per event name, most frequent first
    pub by_event: Vec<(String, u64)>,
}

/// Events of one registry deployment on one chain
#[derive(Debug)]
pub struct EventStore {
    conn: Connection,
    chain_id: u64,
    contract: String,
}

impl EventStore {
    /// Open or create the index database
    pub fn open(path: &Path, chain_id: u64, contract: Address) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let conn = Connection::open(path).with_context(|| format!("open db {}", path.display()))?;
        Self::with_connection(conn, chain_id, contract)
    }

    pub fn open_in_memory(chain_id: u64, contract: Address) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, chain_id, contract)
    }

    fn with_connection(conn: Connection, chain_id: u64, contract: Address) -> Result<Self> {
        let store = Self {
            conn,
            chain_id,
            contract: contract.to_string().to_lowercase(),
        };
        store.init()?;
        Ok(store)
    }

    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS events (
                chain_id      INTEGER NOT NULL,
                contract      TEXT NOT NULL,
                block_number  INTEGER NOT NULL,
                log_index     INTEGER NOT NULL,
                event         TEXT NOT NULL,
                tx_hash       TEXT,
                block_hash    TEXT,
                node_id       TEXT,
                payload       TEXT NOT NULL,
                created_at    INTEGER DEFAULT (strftime('%s', 'now')),
                PRIMARY KEY (chain_id, contract, block_number, log_index)
            );

            CREATE INDEX IF NOT EXISTS idx_events_name ON events(event);
            CREATE INDEX IF NOT EXISTS idx_events_node ON events(node_id);
            ",
        )?;
        Ok(())
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Upsert records; removed (reorged) logs are deleted instead
    ///
    /// Records without a block position are pending and skipped.
    /// Returns the number of rows written or deleted.
    pub fn insert_events(&mut self, records: &[EventRecord]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut changed = 0;
        for record in records {
            let (Some(block), Some(index)) = (record.block_number, record.log_index) else {
                continue;
            };
            if record.removed {
                changed += tx.execute(
                    "DELETE FROM events
                     WHERE chain_id = ?1 AND contract = ?2 AND block_number = ?3 AND log_index = ?4",
                    params![self.chain_id, self.contract, block, index],
                )?;
                continue;
            }
            changed += tx.execute(
                "INSERT INTO events(chain_id, contract, block_number, log_index, event,
                                    tx_hash, block_hash, node_id, payload)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(chain_id, contract, block_number, log_index) DO UPDATE SET
                    event=excluded.event,
                    tx_hash=excluded.tx_hash,
                    block_hash=excluded.block_hash,
                    node_id=excluded.node_id,
                    payload=excluded.payload",
                params![
                    self.chain_id,
                    self.contract,
                    block,
                    index,
                    record.name(),
                    record.transaction_hash.map(|h| h.to_string()),
                    record.block_hash.map(|h| h.to_string()),
                    record.node_id().map(|id| id.to_string()),
                    record.fields().to_string(),
                ],
            )?;
        }
        tx.commit()?;
        debug!(changed, "indexed events");
        Ok(changed)
    }

    /// Stored events matching `query`, in chain order
    pub fn events(&self, query: &EventQuery) -> Result<Vec<StoredEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT block_number, log_index, event, tx_hash, block_hash, node_id, payload
             FROM events
             WHERE chain_id = ?1 AND contract = ?2
               AND (?3 IS NULL OR block_number >= ?3)
               AND (?4 IS NULL OR block_number <= ?4)
             ORDER BY block_number, log_index",
        )?;
        let rows = stmt.query_map(
            params![self.chain_id, self.contract, query.from_block, query.to_block],
            |row| {
                Ok(StoredEvent {
                    block_number: row.get(0)?,
                    log_index: row.get(1)?,
                    event: row.get(2)?,
                    tx_hash: row.get(3)?,
                    block_hash: row.get(4)?,
                    node_id: row.get(5)?,
                    payload: row.get(6)?,
                })
            },
        )?;

        let mut events = Vec::new();
        for row in rows {
            let event = row?;
            if query.events.is_empty()
                || query.events.iter().any(|name| name.eq_ignore_ascii_case(&event.event))
            {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Highest block with an indexed event
    pub fn last_indexed_block(&self) -> Result<Option<u64>> {
        let block: Option<u64> = self.conn.query_row(
            "SELECT MAX(block_number) FROM events WHERE chain_id = ?1 AND contract = ?2",
            params![self.chain_id, self.contract],
            |row| row.get(0),
        )?;
        Ok(block)
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let (total, first_block, last_block): (u64, Option<u64>, Option<u64>) = self.conn.query_row(
            "SELECT COUNT(*), MIN(block_number), MAX(block_number)
             FROM events WHERE chain_id = ?1 AND contract = ?2",
            params![self.chain_id, self.contract],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let mut stmt = self.conn.prepare(
            "SELECT event, COUNT(*) AS n FROM events
             WHERE chain_id = ?1 AND contract = ?2
             GROUP BY event ORDER BY n DESC, event",
        )?;
        let by_event = stmt
            .query_map(params![self.chain_id, self.contract], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<rusqlite::Result<Vec<(String, u64)>>>()?;

        Ok(StoreStats {
            total,
            first_block,
            last_block,
            by_event,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::NodeRegistry;
    use crate::domain::events::tests::rpc_log;
    use alloy::primitives::{address, U256};
    use alloy::sol_types::SolEvent;

    const REGISTRY: Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");

    fn enabled(node: u64, block: u64, index: u64) -> EventRecord {
        let event = NodeRegistry::NodeEnabled {
            nodeId: U256::from(node),
        };
        let log = rpc_log(REGISTRY, event.encode_log_data(), block, index);
        EventRecord::from_log(&log, REGISTRY).unwrap()
    }

    fn fee(node: u64, block: u64) -> EventRecord {
        let event = NodeRegistry::MinMonthlyFeeUpdated {
            nodeId: U256::from(node),
            minMonthlyFeeMicroDollars: U256::from(5_000u64),
        };
        let log = rpc_log(REGISTRY, event.encode_log_data(), block, 0);
        EventRecord::from_log(&log, REGISTRY).unwrap()
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut store = EventStore::open_in_memory(31337, REGISTRY).unwrap();
        let records = vec![enabled(100, 10, 0), enabled(200, 10, 1)];

        store.insert_events(&records).unwrap();
        store.insert_events(&records).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.by_event, vec![("NodeEnabled".to_string(), 2)]);
    }

    #[test]
    fn test_query_by_name_and_range() {
        let mut store = EventStore::open_in_memory(31337, REGISTRY).unwrap();
        store
            .insert_events(&[enabled(100, 5, 0), fee(100, 8), enabled(200, 12, 0)])
            .unwrap();

        let all = store.events(&EventQuery::default()).unwrap();
        assert_eq!(
            all.iter().map(|e| e.block_number).collect::<Vec<_>>(),
            vec![5, 8, 12]
        );

        let fees = store
            .events(&EventQuery {
                events: vec!["minmonthlyfeeupdated".to_string()],
                ..Default::default()
            })
            .unwrap();
        assert_eq!(fees.len(), 1);
        assert_eq!(fees[0].node_id.as_deref(), Some("100"));

        let ranged = store
            .events(&EventQuery {
                from_block: Some(6),
                to_block: Some(12),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(ranged.len(), 2);
    }

    #[test]
    fn test_last_indexed_block() {
        let mut store = EventStore::open_in_memory(1, REGISTRY).unwrap();
        assert_eq!(store.last_indexed_block().unwrap(), None);

        store.insert_events(&[enabled(100, 3, 0), fee(100, 9)]).unwrap();
        assert_eq!(store.last_indexed_block().unwrap(), Some(9));
    }

    #[test]
    fn test_removed_log_is_deleted() {
        let mut store = EventStore::open_in_memory(1, REGISTRY).unwrap();
        store.insert_events(&[enabled(100, 3, 0)]).unwrap();

        let mut reorged = enabled(100, 3, 0);
        reorged.removed = true;
        store.insert_events(&[reorged]).unwrap();

        assert_eq!(store.stats().unwrap().total, 0);
    }

    #[test]
    fn test_chains_are_isolated() {
        let mut mainnet = EventStore::open_in_memory(1, REGISTRY).unwrap();
        mainnet.insert_events(&[enabled(100, 3, 0)]).unwrap();
        mainnet.chain_id = 10;
        assert_eq!(mainnet.stats().unwrap().total, 0);
    }

    #[test]
    fn test_stored_row_round_trips_payload() {
        let mut store = EventStore::open_in_memory(1, REGISTRY).unwrap();
        store.insert_events(&[fee(100, 4)]).unwrap();

        let stored = store.events(&EventQuery::default()).unwrap();
        let row = stored[0].to_row(REGISTRY).unwrap();
        assert_eq!(row.event, "MinMonthlyFeeUpdated");
        assert_eq!(row.fields["minMonthlyFeeMicroDollars"], "5000");
    }
}
