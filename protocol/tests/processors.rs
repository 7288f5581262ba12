//! Block-level integration tests for the transaction processors.
//!
//! Each test builds a chain on its own temporary ledger, drives a block
//! through the default registry and inspects what landed in storage.

use std::sync::Arc;

use tessera_protocol::chain::{Chain, ChainManager};
use tessera_protocol::config::{ChainConfig, DEX_LOCK_TIME};
use tessera_protocol::converter::DistributionFeeTxData;
use tessera_protocol::crypto::TxHash;
use tessera_protocol::default_registry;
use tessera_protocol::dex::{OrderSide, TradingOrder, TradingPairConfig};
use tessera_protocol::processor::{ErrorCode, ProcessorRegistry, SyncStatus};
use tessera_protocol::storage::{
    BlockHeader, ConfirmWithdrawalRecord, DistributionFeeStore, HeterogeneousAddress, LedgerDb,
};
use tessera_protocol::transaction::{
    AssetKey, CoinOutput, NativeAddress, Transaction, TransactionBuilder, TxType,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

const CHAIN_ID: u16 = 5;
const NATIVE: AssetKey = AssetKey::new(5, 1);
const USDX: AssetKey = AssetKey::new(5, 2);

struct Node {
    registry: ProcessorRegistry,
    ledger: LedgerDb,
    pair: TradingPairConfig,
    withdrawal: Transaction,
    signers: Vec<NativeAddress>,
}

/// A chain with one NATIVE/USDX pair and one confirmed withdrawal signed by
/// two signers, sharing a fee of 1000.
fn setup() -> Node {
    let ledger = LedgerDb::open_temporary().expect("temp db");

    let pair = TradingPairConfig {
        pair_hash: TxHash::digest(b"NATIVE/USDX"),
        base_asset: NATIVE,
        quote_asset: USDX,
        base_decimals: 8,
        quote_decimals: 6,
        min_trading_amount: 1_000_000,
    };
    ledger.put_trading_pair(&pair).unwrap();

    let withdrawal = TransactionBuilder::new(TxType::Withdrawal)
        .tx_data(b"withdraw 10 to 0xdead".to_vec())
        .timestamp(1_700_000_000_000)
        .build();
    ledger.put_confirmed_tx(&withdrawal).unwrap();

    let heterogeneous = vec![
        HeterogeneousAddress::new(101, "0x1111"),
        HeterogeneousAddress::new(102, "bc1q2222"),
    ];
    let signers = vec![NativeAddress::new("signer-a"), NativeAddress::new("signer-b")];
    for (address, native) in heterogeneous.iter().zip(&signers) {
        ledger.put_reward_address(address, native).unwrap();
    }
    ledger
        .put_confirm_withdrawal(&ConfirmWithdrawalRecord {
            withdrawal_tx_hash: withdrawal.hash,
            confirm_tx_hash: TxHash::digest(b"confirm"),
            reward_addresses: heterogeneous,
        })
        .unwrap();

    let config = ChainConfig {
        withdrawal_distribution_fee: 1_000,
        ..ChainConfig::for_chain(CHAIN_ID)
    };
    let chains = Arc::new(ChainManager::new());
    chains.register(Chain::with_ledger(config, ledger.clone()));

    Node {
        registry: default_registry(chains).expect("registry"),
        ledger,
        pair,
        withdrawal,
        signers,
    }
}

fn buy_order(node: &Node, price: u128, amount: u128, locked: u128) -> Transaction {
    let order = TradingOrder::new(
        OrderSide::Buy,
        NativeAddress::new("buyer"),
        node.pair.pair_hash,
        price,
        amount,
    );
    TransactionBuilder::new(TxType::TradingOrder)
        .payload(&order)
        .unwrap()
        .outputs(vec![CoinOutput::new(
            NativeAddress::new("buyer"),
            USDX,
            locked,
            DEX_LOCK_TIME,
        )])
        .unwrap()
        .timestamp(1)
        .build()
}

fn payout(node: &Node, basis: TxHash, memo: &str) -> Transaction {
    let outputs = node
        .signers
        .iter()
        .map(|signer| CoinOutput::new(signer.clone(), NATIVE, 500, 0))
        .collect();
    TransactionBuilder::new(TxType::DistributionFee)
        .payload(&DistributionFeeTxData::new(basis))
        .unwrap()
        .outputs(outputs)
        .unwrap()
        .remark(memo)
        .timestamp(2)
        .build()
}

fn header(height: u64) -> BlockHeader {
    BlockHeader::new(height, TxHash::digest(&height.to_le_bytes()), height * 1_000)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn block_with_mixed_types_is_filtered_per_processor() {
    let node = setup();

    // Price 2.5 USDX (6 decimals); 10 NATIVE (8 decimals) costs 25 USDX.
    let affordable = buy_order(&node, 2_500_000, 1_000_000_000, 25_000_000);
    let short = buy_order(&node, 2_500_000, 1_000_000_000, 24_999_999);
    let transfer = TransactionBuilder::new(TxType::Transfer)
        .tx_data(vec![1])
        .timestamp(3)
        .build();
    let first = payout(&node, node.withdrawal.hash, "first");
    let duplicate = payout(&node, node.withdrawal.hash, "duplicate");

    let block = vec![
        affordable.clone(),
        transfer.clone(),
        short.clone(),
        first.clone(),
        duplicate.clone(),
    ];
    let outcome = node.registry.validate_block(CHAIN_ID, &block, None);

    assert_eq!(outcome.accepted, vec![affordable, transfer, first]);
    assert_eq!(outcome.rejected, vec![short, duplicate]);
    assert_eq!(
        outcome.error_codes.get(&TxType::TradingOrder),
        Some(&ErrorCode::DataError)
    );
    assert_eq!(
        outcome.error_codes.get(&TxType::DistributionFee),
        Some(&ErrorCode::BlockTxDuplication)
    );
}

#[test]
fn commit_reorg_and_replay_of_a_distribution() {
    let node = setup();
    let tx = payout(&node, node.withdrawal.hash, "pay");
    let block = vec![tx.clone()];

    // Block 10 commits the payout.
    assert!(node.registry.validate_block(CHAIN_ID, &block, None).rejected.is_empty());
    assert!(node
        .registry
        .commit_block(CHAIN_ID, &block, &header(10), SyncStatus::Running));
    assert_eq!(node.ledger.distribution_fee_count(), 1);

    // A second payout for the same withdrawal is refused.
    let replay = vec![payout(&node, node.withdrawal.hash, "again")];
    let outcome = node.registry.validate_block(CHAIN_ID, &replay, None);
    assert_eq!(
        outcome.error_codes.get(&TxType::DistributionFee),
        Some(&ErrorCode::DistributionFeeIsDuplication)
    );

    // Block 10 is reorganized away; the withdrawal becomes payable again.
    assert!(node.registry.rollback_block(CHAIN_ID, &block, &header(10)));
    assert!(node
        .ledger
        .find_by_basis(&node.withdrawal.hash)
        .unwrap()
        .is_none());
    assert!(node.registry.validate_block(CHAIN_ID, &replay, None).rejected.is_empty());

    // Rolling back again changes nothing.
    assert!(node.registry.rollback_block(CHAIN_ID, &block, &header(10)));
}

#[test]
fn failing_distribution_commit_rolls_back_its_own_batch() {
    let node = setup();
    let owner = payout(&node, node.withdrawal.hash, "owner");
    assert!(node
        .registry
        .commit_block(CHAIN_ID, &[owner.clone()], &header(1), SyncStatus::Syncing));

    // Validation was skipped: another distribution for the same basis and a
    // fresh one arrive in the same block. The conflicting save fails.
    let other_basis = TxHash::digest(b"other withdrawal");
    let fresh = payout(&node, other_basis, "fresh");
    let intruder = payout(&node, node.withdrawal.hash, "intruder");
    assert!(!node.registry.commit_block(
        CHAIN_ID,
        &[fresh, intruder],
        &header(2),
        SyncStatus::Running
    ));

    assert!(node.ledger.find_by_basis(&other_basis).unwrap().is_none());
    assert_eq!(
        node.ledger
            .find_by_basis(&node.withdrawal.hash)
            .unwrap()
            .map(|record| record.distribution_tx_hash),
        Some(owner.hash)
    );
}

#[test]
fn on_disk_ledger_keeps_payouts_across_restarts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let basis = TxHash::digest(b"basis");
    let distribution = TxHash::digest(b"distribution");

    {
        let ledger = LedgerDb::open(dir.path()).unwrap();
        ledger
            .save(&tessera_protocol::storage::DistributionFeeRecord::new(
                basis,
                distribution,
            ))
            .unwrap();
        ledger.flush().unwrap();
    }

    let ledger = LedgerDb::open(dir.path()).unwrap();
    let record = ledger.find_by_basis(&basis).unwrap().expect("record");
    assert_eq!(record.distribution_tx_hash, distribution);
}

#[test]
fn chains_do_not_share_state() {
    let node = setup();
    let tx = payout(&node, node.withdrawal.hash, "pay");

    // Chain 6 is unknown to this node.
    let outcome = node.registry.validate_block(6, &[tx.clone()], None);
    assert_eq!(outcome.rejected, vec![tx.clone()]);
    assert_eq!(
        outcome.error_codes.get(&TxType::DistributionFee),
        Some(&ErrorCode::ChainNotExist)
    );
    assert!(!node
        .registry
        .commit_block(6, &[tx], &header(1), SyncStatus::Running));
    assert_eq!(node.ledger.distribution_fee_count(), 0);
}

#[test]
fn repeated_distribution_keeps_its_first_copy() {
    let node = setup();
    let tx = payout(&node, node.withdrawal.hash, "pay");

    let block = vec![tx.clone(), tx.clone()];
    let outcome = node.registry.validate_block(CHAIN_ID, &block, None);

    assert_eq!(outcome.accepted, vec![tx.clone()]);
    assert_eq!(outcome.rejected, vec![tx]);
    assert_eq!(
        outcome.error_codes.get(&TxType::DistributionFee),
        Some(&ErrorCode::BlockTxDuplication)
    );
}
