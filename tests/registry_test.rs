//! Drives the registry proxy against alloy's mocked transport
//!
//! Each test queues the JSON-RPC responses the client is expected to
//! request, in order, and checks the decoded result.

use alloy::primitives::{address, Address, Bytes, B256, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::json_rpc::ErrorPayload;
use alloy::rpc::types::Log;
use alloy::sol_types::{SolEvent, SolValue};
use alloy::transports::mock::Asserter;
use serde_json::json;

use noderegistry::domain::roles::Role;
use noderegistry::registry::{
    deploy, BlockRange, EventFilter, ReceiptPolicy, TopicFilter, TxOptions,
};
use noderegistry::{NodeRegistry, NodeRegistryErrors, RegistryClient, RegistryError};

const REGISTRY: Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");
const OPERATOR: Address = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");

fn client(asserter: &Asserter) -> RegistryClient<impl Provider + Clone> {
    let provider = ProviderBuilder::new()
        .disable_recommended_fillers()
        .connect_mocked_client(asserter.clone());
    RegistryClient::new(REGISTRY, provider)
}

fn rpc_log<E: SolEvent>(event: &E, block: u64, index: u64) -> Log {
    Log {
        inner: alloy::primitives::Log {
            address: REGISTRY,
            data: event.encode_log_data(),
        },
        block_hash: Some(B256::repeat_byte(0xbb)),
        block_number: Some(block),
        block_timestamp: None,
        transaction_hash: Some(B256::repeat_byte(0xcc)),
        transaction_index: Some(0),
        log_index: Some(index),
        removed: false,
    }
}

fn receipt(tx_hash: B256, logs: Vec<Log>, contract: Option<Address>) -> serde_json::Value {
    json!({
        "type": "0x2",
        "status": "0x1",
        "cumulativeGasUsed": "0xc350",
        "logs": logs,
        "logsBloom": format!("0x{}", "00".repeat(256)),
        "transactionHash": tx_hash,
        "transactionIndex": "0x0",
        "blockHash": B256::repeat_byte(0xbb),
        "blockNumber": "0x2a",
        "gasUsed": "0xc350",
        "effectiveGasPrice": "0x1",
        "from": OPERATOR,
        "to": if contract.is_some() { None } else { Some(REGISTRY) },
        "contractAddress": contract,
    })
}

fn node(http: &str) -> NodeRegistry::Node {
    NodeRegistry::Node {
        signingKeyPub: Bytes::from(vec![0x04, 0x01, 0x02]),
        httpAddress: http.to_string(),
        isReplicationEnabled: true,
        isApiEnabled: true,
        isDisabled: false,
        minMonthlyFeeMicroDollars: U256::from(1_000_000u64),
    }
}

fn revert_payload(data: Vec<u8>) -> ErrorPayload {
    let hex = format!("0x{}", hex::encode(data));
    ErrorPayload {
        code: 3,
        message: "execution reverted".into(),
        data: Some(serde_json::value::to_raw_value(&hex).unwrap()),
    }
}

#[tokio::test]
async fn test_view_calls_decode_returns() {
    let asserter = Asserter::new();
    let registry = client(&asserter);

    asserter.push_success(&Bytes::from(("NodeRegistry".to_string(),).abi_encode_params()));
    asserter.push_success(&Bytes::from(U256::from(2).abi_encode()));
    asserter.push_success(&Bytes::from(true.abi_encode()));

    assert_eq!(registry.name().await.unwrap(), "NodeRegistry");
    assert_eq!(registry.get_all_nodes_count().await.unwrap(), U256::from(2));
    assert!(registry.has_role(Role::NodeManager, OPERATOR).await.unwrap());
}

#[tokio::test]
async fn test_get_all_nodes_maps_to_domain() {
    let asserter = Asserter::new();
    let registry = client(&asserter);

    let nodes = vec![
        NodeRegistry::NodeWithId {
            nodeId: U256::from(100),
            node: node("http://a:5050"),
        },
        NodeRegistry::NodeWithId {
            nodeId: U256::from(200),
            node: node("http://b:5050"),
        },
    ];
    asserter.push_success(&Bytes::from((nodes,).abi_encode_params()));

    let listed = registry.get_all_nodes().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[1].node_id, U256::from(200));
    assert_eq!(listed[1].node.http_address, "http://b:5050");
    assert_eq!(listed[0].node.status(), "api+replication");
}

#[tokio::test]
async fn test_custom_error_is_decoded() {
    let asserter = Asserter::new();
    let registry = client(&asserter);

    let data = alloy::sol_types::SolError::abi_encode(&NodeRegistry::NodeDoesNotExist {});
    asserter.push_failure(revert_payload(data));

    let err = registry.get_node(U256::from(999)).await.unwrap_err();
    assert!(matches!(
        err.revert(),
        Some(NodeRegistryErrors::NodeDoesNotExist(_))
    ));
    assert_eq!(err.to_string(), "contract reverted: NodeDoesNotExist()");
}

#[tokio::test]
async fn test_unauthorized_account_carries_args() {
    let asserter = Asserter::new();
    let registry = client(&asserter);

    let data = alloy::sol_types::SolError::abi_encode(&NodeRegistry::AccessControlUnauthorizedAccount {
        account: OPERATOR,
        neededRole: Role::Admin.id(),
    });
    asserter.push_failure(revert_payload(data));

    let err = registry.max_active_nodes().await.unwrap_err();
    match err {
        RegistryError::Revert(NodeRegistryErrors::AccessControlUnauthorizedAccount(e)) => {
            assert_eq!(e.account, OPERATOR);
            assert_eq!(e.neededRole, Role::Admin.id());
        }
        other => panic!("unexpected error {other}"),
    }
}

#[tokio::test]
async fn test_transaction_returns_hash() {
    let asserter = Asserter::new();
    let registry = client(&asserter);
    let hash = B256::repeat_byte(0x42);

    asserter.push_success(&hash);

    let pending = registry.enable_node(U256::from(100)).await.unwrap();
    assert_eq!(pending.tx_hash(), hash);
    assert_eq!(pending.method(), "enableNode");
}

#[tokio::test]
async fn test_query_events_chunks_and_orders() {
    let asserter = Asserter::new();
    let registry = client(&asserter).with_log_chunk_size(10);

    let enabled = NodeRegistry::NodeEnabled {
        nodeId: U256::from(100),
    };
    let disabled = NodeRegistry::NodeDisabled {
        nodeId: U256::from(100),
    };
    // windows [0, 9], [10, 19], [20, 25]
    asserter.push_success(&vec![rpc_log(&enabled, 3, 1), rpc_log(&disabled, 3, 0)]);
    asserter.push_success(&Vec::<Log>::new());
    asserter.push_success(&vec![rpc_log(&enabled, 21, 0)]);

    let records = registry
        .query_events(BlockRange::new(0, Some(25)), &EventFilter::all())
        .await
        .unwrap();

    let positions: Vec<_> = records.iter().map(|r| (r.position(), r.name())).collect();
    assert_eq!(
        positions,
        vec![
            ((3, 0), "NodeDisabled"),
            ((3, 1), "NodeEnabled"),
            ((21, 0), "NodeEnabled"),
        ]
    );
}

#[tokio::test]
async fn test_query_events_skips_unknown_topics() {
    let asserter = Asserter::new();
    let registry = client(&asserter);

    let mut unknown = rpc_log(&NodeRegistry::NodeEnabled { nodeId: U256::from(1) }, 1, 0);
    unknown.inner.data = alloy::primitives::LogData::new_unchecked(
        vec![B256::repeat_byte(0x99)],
        Bytes::new(),
    );
    let known = rpc_log(&NodeRegistry::NodeEnabled { nodeId: U256::from(1) }, 1, 1);
    asserter.push_success(&vec![unknown, known]);

    let records = registry
        .query_events(BlockRange::new(0, Some(5)), &EventFilter::all())
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name(), "NodeEnabled");
}

#[tokio::test]
async fn test_typed_node_added_filter() {
    let asserter = Asserter::new();
    let registry = client(&asserter);

    let added = NodeRegistry::NodeAdded {
        nodeId: U256::from(100),
        owner: OPERATOR,
        signingKeyPub: Bytes::from(vec![0x04]),
        httpAddress: "http://a:5050".to_string(),
        minMonthlyFeeMicroDollars: U256::from(10u64),
    };
    asserter.push_success(&vec![rpc_log(&added, 7, 2)]);

    let found = registry
        .filter_node_added(BlockRange::new(0, Some(10)), &[U256::from(100)], &[OPERATOR])
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].event.httpAddress, "http://a:5050");
    assert_eq!(found[0].block_number, Some(7));
    assert_eq!(found[0].log_index, Some(2));
}

#[tokio::test]
async fn test_empty_range_makes_no_request() {
    let asserter = Asserter::new();
    let registry = client(&asserter);

    let records = registry
        .query_events(BlockRange::new(10, Some(5)), &EventFilter::all())
        .await
        .unwrap();
    assert!(records.is_empty());

    let typed = registry
        .filter::<NodeRegistry::Transfer>(BlockRange::new(10, Some(5)), TopicFilter::new())
        .await
        .unwrap();
    assert!(typed.is_empty());
}

#[tokio::test]
async fn test_parse_log_rejects_other_contracts() {
    let asserter = Asserter::new();
    let registry = client(&asserter);

    let mut log = rpc_log(&NodeRegistry::ApiEnabled { nodeId: U256::from(5) }, 1, 0);
    assert!(registry.parse_log(&log).is_ok());

    log.inner.address = Address::repeat_byte(0x11);
    assert!(matches!(
        registry.parse_log(&log),
        Err(RegistryError::ForeignLog(_))
    ));
}

#[tokio::test]
async fn test_subscriptions_need_pubsub() {
    let asserter = Asserter::new();
    let registry = client(&asserter);

    let err = registry
        .subscribe_events(&EventFilter::all())
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::SubscriptionsUnsupported));
}

#[tokio::test]
async fn test_add_node_and_wait_reads_node_id() {
    let asserter = Asserter::new();
    let registry = client(&asserter);
    let hash = B256::repeat_byte(0x42);

    let added = NodeRegistry::NodeAdded {
        nodeId: U256::from(300),
        owner: OPERATOR,
        signingKeyPub: Bytes::from(vec![0x04]),
        httpAddress: "http://c:5050".to_string(),
        minMonthlyFeeMicroDollars: U256::from(10u64),
    };
    asserter.push_success(&hash);
    asserter.push_success(&receipt(hash, vec![rpc_log(&added, 42, 0)], None));

    let (node_id, outcome) = registry
        .add_node_and_wait(
            OPERATOR,
            Bytes::from(vec![0x04]),
            "http://c:5050".to_string(),
            U256::from(10u64),
        )
        .await
        .unwrap();
    assert_eq!(node_id, U256::from(300));
    assert_eq!(outcome.tx_hash, hash);
    assert_eq!(outcome.block_number, Some(42));
    assert_eq!(outcome.gas_used, 50_000);
    assert_eq!(outcome.events.len(), 1);
}

#[tokio::test]
async fn test_wait_without_node_added_is_an_error() {
    let asserter = Asserter::new();
    let registry = client(&asserter);
    let hash = B256::repeat_byte(0x43);

    asserter.push_success(&hash);
    asserter.push_success(&receipt(hash, Vec::new(), None));

    let err = registry
        .add_node_and_wait(OPERATOR, Bytes::new(), "http://d:5050".to_string(), U256::ZERO)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::MissingEvent("NodeAdded")));
}

#[tokio::test]
async fn test_deploy_binds_to_receipt_address() {
    let asserter = Asserter::new();
    let provider = ProviderBuilder::new()
        .disable_recommended_fillers()
        .connect_mocked_client(asserter.clone());
    let hash = B256::repeat_byte(0x44);
    let deployed = Address::repeat_byte(0x55);

    asserter.push_success(&hash);
    asserter.push_success(&receipt(hash, Vec::new(), Some(deployed)));

    let deployment = deploy(provider, OPERATOR, &TxOptions::default(), ReceiptPolicy::default())
        .await
        .unwrap();
    assert_eq!(deployment.client.address(), deployed);
    assert_eq!(deployment.tx_hash, hash);
    assert_eq!(deployment.block_number, Some(42));
}

#[tokio::test]
async fn test_typed_filters_with_three_topics() {
    let asserter = Asserter::new();
    let registry = client(&asserter);
    let admin = Address::repeat_byte(0x0a);

    let granted = NodeRegistry::RoleGranted {
        role: Role::NodeManager.id(),
        account: OPERATOR,
        sender: admin,
    };
    let transfer = NodeRegistry::Transfer {
        from: OPERATOR,
        to: admin,
        tokenId: U256::from(100),
    };
    asserter.push_success(&vec![rpc_log(&granted, 4, 1)]);
    asserter.push_success(&vec![rpc_log(&transfer, 9, 0)]);

    let roles = registry
        .filter_role_granted(
            BlockRange::new(0, Some(10)),
            &[Role::NodeManager.id()],
            &[OPERATOR],
            &[admin],
        )
        .await
        .unwrap();
    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].event.account, OPERATOR);
    assert_eq!(roles[0].event.sender, admin);

    let transfers = registry
        .filter_transfer(BlockRange::new(0, Some(10)), &[OPERATOR], &[admin], &[U256::from(100)])
        .await
        .unwrap();
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].event.tokenId, U256::from(100));
    assert_eq!(transfers[0].block_number, Some(9));
}

#[tokio::test]
async fn test_watch_events_delivers_through_channel() {
    let asserter = Asserter::new();
    let registry = client(&asserter);

    // eth_newFilter, then the first eth_getFilterChanges
    asserter.push_success(&U256::from(1));
    asserter.push_success(&vec![rpc_log(&NodeRegistry::NodeEnabled { nodeId: U256::from(100) }, 8, 0)]);

    let mut events = registry.watch_events(&EventFilter::all()).await.unwrap();
    let record = tokio::time::timeout(std::time::Duration::from_secs(10), events.recv())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(record.name(), "NodeEnabled");
    assert_eq!(record.position(), (8, 0));
}

#[tokio::test]
async fn test_watch_from_installs_watcher_before_backlog() {
    let asserter = Asserter::new();
    let registry = client(&asserter);

    // eth_newFilter, eth_blockNumber, eth_getLogs, then eth_getFilterChanges
    asserter.push_success(&U256::from(7));
    asserter.push_success(&U256::from(12));
    asserter.push_success(&vec![rpc_log(&NodeRegistry::NodeDisabled { nodeId: U256::from(100) }, 10, 0)]);
    asserter.push_success(&vec![rpc_log(&NodeRegistry::NodeEnabled { nodeId: U256::from(100) }, 13, 0)]);

    let (backlog, mut events) = registry
        .watch_events_from(5, &EventFilter::all())
        .await
        .unwrap();
    assert_eq!(backlog.len(), 1);
    assert_eq!(backlog[0].name(), "NodeDisabled");

    let live = tokio::time::timeout(std::time::Duration::from_secs(10), events.recv())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(live.name(), "NodeEnabled");
    assert_eq!(live.position(), (13, 0));
}
