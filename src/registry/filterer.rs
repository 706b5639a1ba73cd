//! Historical and live event logs

use std::pin::pin;

use alloy::primitives::{Address, TxHash, B256, U256};
use alloy::providers::Provider;
use alloy::rpc::types::{Filter, Log};
use alloy::sol_types::SolEvent;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::RegistryClient;
use crate::bindings::NodeRegistry;
use crate::domain::events::{decode_event, EventRecord, RegistryEvent};
use crate::error::{RegistryError, RegistryResult};

/// Buffered events per watcher before the producer waits
pub const WATCH_CHANNEL_CAPACITY: usize = 100;

/// Inclusive block range; an open end means the latest block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockRange {
    pub from: u64,
    pub to: Option<u64>,
}

impl BlockRange {
    pub fn new(from: u64, to: Option<u64>) -> Self {
        Self { from, to }
    }

    pub fn since(from: u64) -> Self {
        Self { from, to: None }
    }
}

/// Indexed-argument filter for topics 1 to 3; an empty slot matches anything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicFilter {
    slots: [Vec<B256>; 3],
}

impl TopicFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill slots in order, one per indexed argument
    pub fn from_slots(slots: impl IntoIterator<Item = Vec<B256>>) -> Self {
        let mut filter = Self::default();
        for (slot, values) in filter.slots.iter_mut().zip(slots) {
            *slot = values;
        }
        filter
    }

    pub fn topic1(mut self, values: impl IntoIterator<Item = B256>) -> Self {
        self.slots[0] = values.into_iter().collect();
        self
    }

    pub fn topic2(mut self, values: impl IntoIterator<Item = B256>) -> Self {
        self.slots[1] = values.into_iter().collect();
        self
    }

    pub fn topic3(mut self, values: impl IntoIterator<Item = B256>) -> Self {
        self.slots[2] = values.into_iter().collect();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Vec::is_empty)
    }

    fn apply(&self, mut filter: Filter) -> Filter {
        let [t1, t2, t3] = &self.slots;
        if !t1.is_empty() {
            filter = filter.topic1(t1.clone());
        }
        if !t2.is_empty() {
            filter = filter.topic2(t2.clone());
        }
        if !t3.is_empty() {
            filter = filter.topic3(t3.clone());
        }
        filter
    }
}

/// Value that can be matched as an indexed topic
pub trait TopicValue {
    fn to_topic(&self) -> B256;
}

impl TopicValue for U256 {
    fn to_topic(&self) -> B256 {
        B256::from(*self)
    }
}

impl TopicValue for Address {
    fn to_topic(&self) -> B256 {
        self.into_word()
    }
}

impl TopicValue for B256 {
    fn to_topic(&self) -> B256 {
        *self
    }
}

fn topics<T: TopicValue>(values: &[T]) -> Vec<B256> {
    values.iter().map(TopicValue::to_topic).collect()
}

/// Which registry events to return
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// topic0 values; empty means every event
    pub events: Vec<B256>,
    pub topics: TopicFilter,
}

impl EventFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn only(events: impl IntoIterator<Item = B256>) -> Self {
        Self {
            events: events.into_iter().collect(),
            topics: TopicFilter::default(),
        }
    }

    pub fn with_topics(mut self, topics: TopicFilter) -> Self {
        self.topics = topics;
        self
    }
}

/// A typed event and where it was emitted
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<E> {
    pub event: E,
    pub block_number: Option<u64>,
    pub log_index: Option<u64>,
    pub transaction_hash: Option<TxHash>,
}

impl<P: Provider + Clone> RegistryClient<P> {
    fn base_filter(&self, filter: &EventFilter) -> Filter {
        let mut base = Filter::new().address(self.address());
        if !filter.events.is_empty() {
            base = base.event_signature(filter.events.clone());
        }
        filter.topics.apply(base)
    }

    /// `eth_getLogs` over `range`, split into `log_chunk_size` windows
    async fn fetch_logs(&self, range: BlockRange, base: Filter) -> RegistryResult<Vec<Log>> {
        let to = match range.to {
            Some(to) => to,
            None => self.provider().get_block_number().await?,
        };
        if range.from > to {
            return Ok(Vec::new());
        }

        let mut logs = Vec::new();
        let mut start = range.from;
        loop {
            let end = start.saturating_add(self.log_chunk_size - 1).min(to);
            let chunk = self
                .provider()
                .get_logs(&base.clone().from_block(start).to_block(end))
                .await?;
            debug!(from = start, to = end, logs = chunk.len(), "fetched logs");
            logs.extend(chunk);
            if end >= to {
                break;
            }
            start = end + 1;
        }
        Ok(logs)
    }

    /// Registry events in `range`, in chain order
    ///
    /// Logs whose topic0 is not part of the ABI are skipped.
    pub async fn query_events(
        &self,
        range: BlockRange,
        filter: &EventFilter,
    ) -> RegistryResult<Vec<EventRecord>> {
        let logs = self.fetch_logs(range, self.base_filter(filter)).await?;
        let mut records = Vec::with_capacity(logs.len());
        for log in &logs {
            match EventRecord::from_log(log, self.address()) {
                Ok(record) => records.push(record),
                Err(RegistryError::UnknownEvent(topic)) => {
                    warn!(%topic, block = ?log.block_number, "skipping unknown log");
                }
                Err(err) => return Err(err),
            }
        }
        records.sort_by_key(EventRecord::position);
        Ok(records)
    }

    /// Typed query for one event kind
    pub async fn filter<E: SolEvent>(
        &self,
        range: BlockRange,
        topics: TopicFilter,
    ) -> RegistryResult<Vec<Decoded<E>>> {
        let filter = EventFilter::only([E::SIGNATURE_HASH]).with_topics(topics);
        let logs = self.fetch_logs(range, self.base_filter(&filter)).await?;

        let mut decoded = logs
            .iter()
            .map(|log| {
                let typed = log.log_decode::<E>()?;
                Ok(Decoded {
                    event: typed.inner.data,
                    block_number: log.block_number,
                    log_index: log.log_index,
                    transaction_hash: log.transaction_hash,
                })
            })
            .collect::<RegistryResult<Vec<_>>>()?;
        decoded.sort_by_key(|d| {
            (
                d.block_number.unwrap_or(u64::MAX),
                d.log_index.unwrap_or(u64::MAX),
            )
        });
        Ok(decoded)
    }

    /// Decode one log, rejecting logs from other contracts
    pub fn parse_log(&self, log: &Log) -> RegistryResult<RegistryEvent> {
        if log.address() != self.address() {
            return Err(RegistryError::ForeignLog(log.address()));
        }
        decode_event(log)
    }

    /// Install a log subscription or filter poller without consuming it yet
    async fn log_stream(&self, filter: &EventFilter) -> RegistryResult<BoxStream<'static, Vec<Log>>> {
        let base = self.base_filter(filter);
        if self.subscriptions {
            let subscription = self.provider().subscribe_logs(&base).await?;
            debug!(registry = %self.address(), "watching logs by subscription");
            Ok(subscription.into_stream().map(|log| vec![log]).boxed())
        } else {
            let poller = self.provider().watch_logs(&base).await?;
            debug!(registry = %self.address(), "watching logs by polling");
            Ok(poller.into_stream().boxed())
        }
    }

    fn spawn_forward(
        &self,
        stream: BoxStream<'static, Vec<Log>>,
    ) -> mpsc::Receiver<RegistryResult<EventRecord>> {
        let (tx, rx) = mpsc::channel(WATCH_CHANNEL_CAPACITY);
        tokio::spawn(forward(stream, self.address(), tx));
        rx
    }

    /// Stream new registry events through a bounded channel
    ///
    /// Uses a log subscription when enabled on the client, a filter
    /// poller otherwise. Dropping the receiver ends the background task.
    pub async fn watch_events(
        &self,
        filter: &EventFilter,
    ) -> RegistryResult<mpsc::Receiver<RegistryResult<EventRecord>>> {
        let stream = self.log_stream(filter).await?;
        Ok(self.spawn_forward(stream))
    }

    /// Stream new registry events over `eth_subscribe`
    pub async fn subscribe_events(
        &self,
        filter: &EventFilter,
    ) -> RegistryResult<mpsc::Receiver<RegistryResult<EventRecord>>> {
        if !self.subscriptions {
            return Err(RegistryError::SubscriptionsUnsupported);
        }
        self.watch_events(filter).await
    }

    /// Catch up from `from` and keep watching, with no gap in between
    ///
    /// The watcher is installed before the backlog is read, so logs mined
    /// meanwhile may arrive twice but never go missing.
    pub async fn watch_events_from(
        &self,
        from: u64,
        filter: &EventFilter,
    ) -> RegistryResult<(Vec<EventRecord>, mpsc::Receiver<RegistryResult<EventRecord>>)> {
        let stream = self.log_stream(filter).await?;
        let backlog = self.query_events(BlockRange::since(from), filter).await?;
        Ok((backlog, self.spawn_forward(stream)))
    }
}

/// Decode batches of logs into the channel until either side closes
async fn forward<S>(stream: S, registry: Address, tx: mpsc::Sender<RegistryResult<EventRecord>>)
where
    S: Stream<Item = Vec<Log>>,
{
    let mut stream = pin!(stream);
    loop {
        let batch = tokio::select! {
            _ = tx.closed() => {
                debug!(%registry, "event receiver dropped, stopping watcher");
                return;
            }
            next = stream.next() => match next {
                Some(batch) => batch,
                None => break,
            },
        };
        for log in batch {
            let item = match EventRecord::from_log(&log, registry) {
                Err(RegistryError::UnknownEvent(topic)) => {
                    warn!(%topic, "skipping unknown log");
                    continue;
                }
                other => other,
            };
            if tx.send(item).await.is_err() {
                debug!(%registry, "event receiver dropped, stopping watcher");
                return;
            }
        }
    }
    warn!(%registry, "log stream ended");
}

macro_rules! typed_filters {
    ($( $(#[$doc:meta])* $fn_name:ident => $event:ident ( $($arg:ident : $ty:ty),+ ) ;)*) => {
        impl<P: Provider + Clone> RegistryClient<P> {
            $(
                $(#[$doc])*
                pub async fn $fn_name(
                    &self,
                    range: BlockRange,
                    $($arg: &[$ty]),+
                ) -> RegistryResult<Vec<Decoded<NodeRegistry::$event>>> {
                    let topics = TopicFilter::from_slots([$(topics($arg)),+]);
                    self.filter::<NodeRegistry::$event>(range, topics).await
                }
            )*
        }
    };
}

typed_filters! {
    filter_api_disabled => ApiDisabled(node_id: U256);
    filter_api_enabled => ApiEnabled(node_id: U256);
    filter_approval => Approval(owner: Address, approved: Address, token_id: U256);
    filter_approval_for_all => ApprovalForAll(owner: Address, operator: Address);
    filter_default_admin_transfer_scheduled => DefaultAdminTransferScheduled(new_admin: Address);
    filter_http_address_updated => HttpAddressUpdated(node_id: U256);
    filter_min_monthly_fee_updated => MinMonthlyFeeUpdated(node_id: U256);
    /// `NodeAdded` by node id and owner
    filter_node_added => NodeAdded(node_id: U256, owner: Address);
    filter_node_disabled => NodeDisabled(node_id: U256);
    filter_node_enabled => NodeEnabled(node_id: U256);
    filter_node_transferred => NodeTransferred(node_id: U256, from: Address, to: Address);
    filter_replication_disabled => ReplicationDisabled(node_id: U256);
    filter_replication_enabled => ReplicationEnabled(node_id: U256);
    filter_role_admin_changed => RoleAdminChanged(role: B256, previous_admin_role: B256, new_admin_role: B256);
    /// `RoleGranted` by role, account and sender
    filter_role_granted => RoleGranted(role: B256, account: Address, sender: Address);
    filter_role_revoked => RoleRevoked(role: B256, account: Address, sender: Address);
    /// ERC-721 `Transfer` by from, to and token id
    filter_transfer => Transfer(from: Address, to: Address, token_id: U256);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::tests::rpc_log;
    use alloy::primitives::{address, b256};

    #[test]
    fn test_topic_filter_slots_in_order() {
        let filter = TopicFilter::from_slots([vec![B256::ZERO], vec![], vec![B256::repeat_byte(1)]]);
        assert_eq!(filter, TopicFilter::new().topic1([B256::ZERO]).topic3([B256::repeat_byte(1)]));
        assert!(!filter.is_empty());
        assert!(TopicFilter::new().is_empty());
    }

    #[test]
    fn test_topic_values_are_left_padded() {
        let owner = address!("0x00000000000000000000000000000000000000aa");
        assert_eq!(
            owner.to_topic(),
            b256!("0x00000000000000000000000000000000000000000000000000000000000000aa")
        );
        assert_eq!(
            U256::from(200).to_topic(),
            b256!("0x00000000000000000000000000000000000000000000000000000000000000c8")
        );
    }

    #[tokio::test]
    async fn test_forward_stops_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(WATCH_CHANNEL_CAPACITY);
        let task = tokio::spawn(forward(futures::stream::pending::<Vec<Log>>(), Address::ZERO, tx));
        drop(rx);

        tokio::time::timeout(std::time::Duration::from_secs(5), task)
            .await
            .expect("watcher still running after receiver drop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_forward_delivers_known_events_in_order() {
        let registry = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");
        let enabled = NodeRegistry::NodeEnabled { nodeId: U256::from(7) }.encode_log_data();
        let unknown = alloy::primitives::LogData::new_unchecked(
            vec![B256::repeat_byte(0x99)],
            Default::default(),
        );
        let batches = vec![
            vec![rpc_log(registry, enabled.clone(), 1, 0), rpc_log(registry, unknown, 1, 1)],
            vec![rpc_log(registry, enabled, 2, 0)],
        ];

        let (tx, mut rx) = mpsc::channel(WATCH_CHANNEL_CAPACITY);
        tokio::spawn(forward(futures::stream::iter(batches), registry, tx));

        let mut positions = Vec::new();
        while let Some(item) = rx.recv().await {
            let record = item.unwrap();
            assert_eq!(record.name(), "NodeEnabled");
            positions.push(record.position());
        }
        assert_eq!(positions, vec![(1, 0), (2, 0)]);
    }

    #[test]
    fn test_base_filter_fills_all_three_slots() {
        let provider = alloy::providers::ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_mocked_client(alloy::transports::mock::Asserter::new());
        let registry = RegistryClient::new(Address::repeat_byte(0xee), provider);
        let from = Address::repeat_byte(1);
        let to = Address::repeat_byte(2);

        let filter = EventFilter::only([NodeRegistry::Transfer::SIGNATURE_HASH]).with_topics(
            TopicFilter::from_slots([topics(&[from]), topics(&[to]), topics(&[U256::from(100)])]),
        );
        let expected = Filter::new()
            .address(Address::repeat_byte(0xee))
            .event_signature(vec![NodeRegistry::Transfer::SIGNATURE_HASH])
            .topic1(vec![from.into_word()])
            .topic2(vec![to.into_word()])
            .topic3(vec![B256::from(U256::from(100))]);
        assert_eq!(registry.base_filter(&filter), expected);
    }

    #[test]
    fn test_empty_topic_filter_leaves_filter_untouched() {
        let filter = Filter::new().address(Address::ZERO);
        assert_eq!(TopicFilter::new().apply(filter.clone()), filter);
    }
}
