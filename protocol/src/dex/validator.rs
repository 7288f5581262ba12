//! Admission checks for `TradingOrder` transactions.

use std::sync::Arc;

use primitive_types::U256;
use thiserror::Error;
use tracing::{error, warn};

use super::order::{OrderSide, TradingOrder};
use super::pair::TradingPairConfig;
use crate::chain::{Chain, ChainManager};
use crate::crypto::TxHash;
use crate::processor::{
    BatchResult, ErrorCode, ProcessorError, SiblingGroups, SyncStatus, TransactionProcessor,
};
use crate::storage::BlockHeader;
use crate::transaction::{AssetKey, CodecError, CoinOutput, Transaction, TxType};

// ---------------------------------------------------------------------------
// Error Types
// ---------------------------------------------------------------------------

/// Why an order was refused.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("malformed order transaction: {0}")]
    Malformed(#[from] CodecError),

    #[error("unknown order type {0}")]
    InvalidOrderType(u8),

    #[error("order transaction has no locked output")]
    MissingLockedOutput,

    #[error("locked output has lock time {actual}, expected {expected}")]
    InvalidLockTime { expected: i64, actual: i64 },

    #[error("order price is zero")]
    ZeroPrice,

    #[error("order amount is zero")]
    ZeroAmount,

    #[error("trading pair {0} does not exist")]
    PairNotFound(TxHash),

    #[error("invalid trading pair: {0}")]
    InvalidPair(String),

    #[error("locked asset {actual} does not match required asset {expected}")]
    AssetMismatch { expected: AssetKey, actual: AssetKey },

    #[error("order amount {amount} below minimum {minimum}")]
    BelowMinimum { amount: u128, minimum: u128 },

    #[error("locked funds fill {fillable}, order asks for {amount}")]
    InsufficientLockedFunds { fillable: u128, amount: u128 },

    #[error("locked amount {locked} differs from sell amount {amount}")]
    SellAmountMismatch { locked: u128, amount: u128 },

    #[error("arithmetic overflow computing fillable amount")]
    Overflow,
}

impl OrderError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::PairNotFound(_) => ErrorCode::DataNotFound,
            Self::AssetMismatch { .. } => ErrorCode::OrderCoinNotEqual,
            Self::BelowMinimum { .. } => ErrorCode::BelowTradingMinSize,
            _ => ErrorCode::DataError,
        }
    }
}

impl From<OrderError> for ProcessorError {
    fn from(err: OrderError) -> Self {
        ProcessorError::Rejected(err.code())
    }
}

// ---------------------------------------------------------------------------
// Fixed-point arithmetic
// ---------------------------------------------------------------------------

/// Base asset amount a buyer's locked quote funds can fill at `price`.
///
/// Computes `floor(locked * 10^base_decimals / price)` in 256 bits: the
/// quote decimals of `locked` and `price` cancel, and the scaled product of
/// two `u128`s with at most 18 decimals always fits. Truncation favours the
/// seller; a buyer is never credited with funds they did not lock.
///
/// A quotient beyond `u128::MAX` saturates, since it covers any order
/// amount.
pub fn fillable_base_amount(
    locked: u128,
    price: u128,
    base_decimals: u8,
) -> Result<u128, OrderError> {
    if price == 0 {
        return Err(OrderError::ZeroPrice);
    }
    let scale = U256::from(10u8)
        .checked_pow(U256::from(base_decimals))
        .ok_or(OrderError::Overflow)?;
    let scaled = U256::from(locked)
        .checked_mul(scale)
        .ok_or(OrderError::Overflow)?;

    let fillable = scaled / U256::from(price);
    if fillable.bits() > 128 {
        return Ok(u128::MAX);
    }
    Ok(fillable.low_u128())
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

/// Checks that need neither storage nor the pair.
pub fn check_structure(
    order: &TradingOrder,
    locked: &CoinOutput,
    required_lock_time: i64,
) -> Result<OrderSide, OrderError> {
    let side = order
        .side()
        .ok_or(OrderError::InvalidOrderType(order.order_type))?;
    if locked.lock_time != required_lock_time {
        return Err(OrderError::InvalidLockTime {
            expected: required_lock_time,
            actual: locked.lock_time,
        });
    }
    if order.price == 0 {
        return Err(OrderError::ZeroPrice);
    }
    if order.amount == 0 {
        return Err(OrderError::ZeroAmount);
    }
    Ok(side)
}

/// Checks the locked output against the pair the order trades on.
pub fn check_against_pair(
    order: &TradingOrder,
    side: OrderSide,
    locked: &CoinOutput,
    pair: &TradingPairConfig,
) -> Result<(), OrderError> {
    let expected = match side {
        OrderSide::Buy => pair.quote_asset,
        OrderSide::Sell => pair.base_asset,
    };
    if locked.asset() != expected {
        return Err(OrderError::AssetMismatch {
            expected,
            actual: locked.asset(),
        });
    }
    if order.amount < pair.min_trading_amount {
        return Err(OrderError::BelowMinimum {
            amount: order.amount,
            minimum: pair.min_trading_amount,
        });
    }

    match side {
        OrderSide::Buy => {
            let fillable = fillable_base_amount(locked.amount, order.price, pair.base_decimals)?;
            if fillable < order.amount {
                return Err(OrderError::InsufficientLockedFunds {
                    fillable,
                    amount: order.amount,
                });
            }
        }
        OrderSide::Sell => {
            if locked.amount != order.amount {
                return Err(OrderError::SellAmountMismatch {
                    locked: locked.amount,
                    amount: order.amount,
                });
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// OrderAdmissionValidator
// ---------------------------------------------------------------------------

/// Processor for [`TxType::TradingOrder`].
///
/// Admission has no persisted side effect here: the order book picks up
/// committed orders itself, so commit and rollback succeed without work.
#[derive(Debug, Clone)]
pub struct OrderAdmissionValidator {
    chains: Arc<ChainManager>,
}

impl OrderAdmissionValidator {
    pub fn new(chains: Arc<ChainManager>) -> Self {
        Self { chains }
    }

    /// Admit a single order transaction on `chain`.
    ///
    /// Order errors are rejections; a failing pair lookup is a system error.
    pub fn admit(&self, chain: &Chain, tx: &Transaction) -> Result<OrderSide, ProcessorError> {
        let order: TradingOrder = tx.payload().map_err(OrderError::from)?;
        let coins = tx.coins().map_err(OrderError::from)?;
        let locked = coins.first_output().ok_or(OrderError::MissingLockedOutput)?;

        let side = check_structure(&order, locked, chain.config().order_lock_time)?;

        let pair = chain
            .trading_pairs()
            .trading_pair(&order.trading_pair_hash)?
            .ok_or(OrderError::PairNotFound(order.trading_pair_hash))?;

        check_against_pair(&order, side, locked, &pair)?;
        Ok(side)
    }
}

impl TransactionProcessor for OrderAdmissionValidator {
    fn tx_type(&self) -> TxType {
        TxType::TradingOrder
    }

    fn validate(
        &self,
        chain_id: u16,
        txs: &[Transaction],
        _siblings: &SiblingGroups,
        _header: Option<&BlockHeader>,
    ) -> BatchResult {
        if txs.is_empty() {
            return BatchResult::empty();
        }
        let Some(chain) = self.chains.get(chain_id) else {
            error!(chain_id, "order validation for unknown chain");
            return BatchResult::reject_all(txs, ErrorCode::ChainNotExist);
        };

        let mut result = BatchResult::empty();
        for tx in txs {
            match self.admit(&chain, tx) {
                Ok(_) => {}
                Err(err) if err.is_system() => {
                    error!(chain_id, tx_hash = %tx.hash, error = %err, "order validation failed");
                    return BatchResult::reject_all(txs, ErrorCode::SysUnknownException);
                }
                Err(err) => {
                    warn!(
                        chain_id,
                        tx_hash = %tx.hash,
                        error_code = %err.code(),
                        "trading order rejected"
                    );
                    result.reject(tx, err.code());
                }
            }
        }
        result
    }

    fn commit(&self, _: u16, _: &[Transaction], _: &BlockHeader, _: SyncStatus) -> bool {
        true
    }

    fn rollback(&self, _: u16, _: &[Transaction], _: &BlockHeader) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChainConfig, DEX_LOCK_TIME};
    use crate::storage::LedgerDb;
    use crate::transaction::{NativeAddress, TransactionBuilder};

    const BASE: AssetKey = AssetKey::new(1, 1);
    const QUOTE: AssetKey = AssetKey::new(1, 2);

    fn pair() -> TradingPairConfig {
        TradingPairConfig {
            pair_hash: TxHash::digest(b"NVT/USDT"),
            base_asset: BASE,
            quote_asset: QUOTE,
            base_decimals: 8,
            quote_decimals: 8,
            min_trading_amount: 100_000_000,
        }
    }

    fn setup() -> (OrderAdmissionValidator, LedgerDb) {
        let ledger = LedgerDb::open_temporary().unwrap();
        ledger.put_trading_pair(&pair()).unwrap();
        let chains = Arc::new(ChainManager::new());
        chains.register(Chain::with_ledger(ChainConfig::for_chain(1), ledger.clone()));
        (OrderAdmissionValidator::new(chains), ledger)
    }

    fn order_tx(side: OrderSide, price: u128, amount: u128, locked: CoinOutput) -> Transaction {
        let order = TradingOrder::new(
            side,
            NativeAddress::new("trader"),
            pair().pair_hash,
            price,
            amount,
        );
        TransactionBuilder::new(TxType::TradingOrder)
            .payload(&order)
            .unwrap()
            .outputs(vec![locked])
            .unwrap()
            .build()
    }

    fn locked(asset: AssetKey, amount: u128) -> CoinOutput {
        CoinOutput::new(NativeAddress::new("dex"), asset, amount, DEX_LOCK_TIME)
    }

    fn validate(validator: &OrderAdmissionValidator, txs: &[Transaction]) -> BatchResult {
        validator.validate(1, txs, &SiblingGroups::new(), None)
    }

    // -- Fixed-point ---------------------------------------------------------

    #[test]
    fn fillable_truncates_toward_zero() {
        assert_eq!(fillable_base_amount(200_000_000, 200_000_000, 8).unwrap(), 100_000_000);
        assert_eq!(fillable_base_amount(199_999_999, 200_000_000, 8).unwrap(), 99_999_999);
        // 1 / 3 at 2 decimals = 0.33
        assert_eq!(fillable_base_amount(1, 3, 2).unwrap(), 33);
    }

    #[test]
    fn fillable_handles_large_locked_amounts() {
        let locked = u128::MAX / 2;
        assert_eq!(fillable_base_amount(locked, locked, 0).unwrap(), 1);
        // More than any u128 order could ask for.
        assert_eq!(fillable_base_amount(u128::MAX, 1, 18).unwrap(), u128::MAX);
        assert!(matches!(
            fillable_base_amount(1, 1, u8::MAX),
            Err(OrderError::Overflow)
        ));
    }

    #[test]
    fn fillable_at_eighteen_decimals() {
        const UNIT: u128 = 1_000_000_000_000_000_000;
        // 3000 quote at 2000 quote per base fills 1.5 base.
        assert_eq!(
            fillable_base_amount(3_000 * UNIT, 2_000 * UNIT, 18).unwrap(),
            1_500_000_000_000_000_000
        );
        assert_eq!(
            fillable_base_amount(3_000 * UNIT - 1, 2_000 * UNIT, 18).unwrap(),
            1_499_999_999_999_999_999
        );
        // Price far above the old remainder-scaling limit.
        assert_eq!(
            fillable_base_amount(10_000_000 * UNIT, 5_000_000 * UNIT, 18).unwrap(),
            2 * UNIT
        );
    }

    #[test]
    fn fillable_never_exceeds_exact_quotient() {
        for locked in [1u128, 7, 99, 1_000, 123_456_789] {
            for price in [1u128, 3, 7, 100, 99_999] {
                let fillable = fillable_base_amount(locked, price, 4).unwrap();
                assert!(fillable * price <= locked * 10_000);
                assert!((fillable + 1) * price > locked * 10_000);
            }
        }
    }

    // -- Buy side ------------------------------------------------------------

    #[test]
    fn buy_with_exact_funds_is_accepted() {
        let (validator, _ledger) = setup();
        let tx = order_tx(OrderSide::Buy, 200_000_000, 100_000_000, locked(QUOTE, 200_000_000));
        assert!(validate(&validator, &[tx]).is_clean());
    }

    #[test]
    fn buy_one_unit_short_is_rejected() {
        let (validator, _ledger) = setup();
        let tx = order_tx(OrderSide::Buy, 200_000_000, 100_000_000, locked(QUOTE, 199_999_999));
        let result = validate(&validator, &[tx.clone()]);
        assert_eq!(result.rejected, vec![tx]);
        assert_eq!(result.error_code, Some(ErrorCode::DataError));
    }

    #[test]
    fn buy_on_eighteen_decimal_pair() {
        const UNIT: u128 = 1_000_000_000_000_000_000;
        let pair = TradingPairConfig {
            base_decimals: 18,
            quote_decimals: 18,
            min_trading_amount: UNIT / 100,
            ..pair()
        };
        let order = TradingOrder::new(
            OrderSide::Buy,
            NativeAddress::new("trader"),
            pair.pair_hash,
            2_000 * UNIT,
            3 * UNIT / 2,
        );

        let funded = locked(QUOTE, 3_000 * UNIT);
        assert!(check_against_pair(&order, OrderSide::Buy, &funded, &pair).is_ok());

        let short = locked(QUOTE, 3_000 * UNIT - 1);
        assert!(matches!(
            check_against_pair(&order, OrderSide::Buy, &short, &pair),
            Err(OrderError::InsufficientLockedFunds { .. })
        ));
    }

    #[test]
    fn buy_locking_base_asset_is_rejected() {
        let (validator, _ledger) = setup();
        let tx = order_tx(OrderSide::Buy, 200_000_000, 100_000_000, locked(BASE, 200_000_000));
        assert_eq!(
            validate(&validator, &[tx]).error_code,
            Some(ErrorCode::OrderCoinNotEqual)
        );
    }

    #[test]
    fn buy_below_minimum_is_rejected() {
        let (validator, _ledger) = setup();
        let tx = order_tx(OrderSide::Buy, 200_000_000, 99_999_999, locked(QUOTE, 400_000_000));
        assert_eq!(
            validate(&validator, &[tx]).error_code,
            Some(ErrorCode::BelowTradingMinSize)
        );
    }

    // -- Sell side -----------------------------------------------------------

    #[test]
    fn sell_with_matching_lock_is_accepted() {
        let (validator, _ledger) = setup();
        let tx = order_tx(OrderSide::Sell, 5, 150_000_000, locked(BASE, 150_000_000));
        assert!(validate(&validator, &[tx]).is_clean());
    }

    #[test]
    fn sell_with_any_difference_is_rejected() {
        let (validator, _ledger) = setup();
        for amount in [149_999_999u128, 150_000_001] {
            let tx = order_tx(OrderSide::Sell, 5, 150_000_000, locked(BASE, amount));
            assert_eq!(validate(&validator, &[tx]).error_code, Some(ErrorCode::DataError));
        }
    }

    #[test]
    fn sell_locking_quote_asset_is_rejected() {
        let (validator, _ledger) = setup();
        let tx = order_tx(OrderSide::Sell, 5, 150_000_000, locked(QUOTE, 150_000_000));
        assert_eq!(
            validate(&validator, &[tx]).error_code,
            Some(ErrorCode::OrderCoinNotEqual)
        );
    }

    // -- Structure -----------------------------------------------------------

    #[test]
    fn structural_errors_are_data_errors() {
        let (validator, _ledger) = setup();
        let spendable = CoinOutput::new(NativeAddress::new("dex"), QUOTE, 200_000_000, 0);
        let txs = vec![
            order_tx(OrderSide::Buy, 200_000_000, 100_000_000, spendable),
            order_tx(OrderSide::Buy, 0, 100_000_000, locked(QUOTE, 200_000_000)),
            order_tx(OrderSide::Sell, 1, 0, locked(BASE, 0)),
        ];
        let result = validate(&validator, &txs);
        assert_eq!(result.rejected, txs);
        assert_eq!(result.error_code, Some(ErrorCode::DataError));
    }

    #[test]
    fn unknown_order_type_is_a_data_error() {
        let mut order = TradingOrder::new(
            OrderSide::Buy,
            NativeAddress::new("trader"),
            pair().pair_hash,
            1,
            1,
        );
        order.order_type = 9;
        let err = check_structure(&order, &locked(QUOTE, 1), DEX_LOCK_TIME).unwrap_err();
        assert!(matches!(err, OrderError::InvalidOrderType(9)));
        assert_eq!(err.code(), ErrorCode::DataError);
    }

    #[test]
    fn garbage_payload_and_missing_output_are_rejected_individually() {
        let (validator, _ledger) = setup();
        let garbage = TransactionBuilder::new(TxType::TradingOrder)
            .tx_data(vec![0xFF; 3])
            .build();
        let no_output = TransactionBuilder::new(TxType::TradingOrder)
            .payload(&TradingOrder::new(
                OrderSide::Buy,
                NativeAddress::new("trader"),
                pair().pair_hash,
                1,
                1,
            ))
            .unwrap()
            .outputs(Vec::new())
            .unwrap()
            .build();
        let good = order_tx(OrderSide::Sell, 5, 150_000_000, locked(BASE, 150_000_000));

        let result = validate(&validator, &[garbage.clone(), no_output.clone(), good]);
        assert_eq!(result.rejected, vec![garbage, no_output]);
        assert_eq!(result.error_code, Some(ErrorCode::DataError));
    }

    #[test]
    fn unknown_pair_is_not_found() {
        let (validator, _ledger) = setup();
        let order = TradingOrder::new(
            OrderSide::Sell,
            NativeAddress::new("trader"),
            TxHash::digest(b"unlisted"),
            5,
            150_000_000,
        );
        let tx = TransactionBuilder::new(TxType::TradingOrder)
            .payload(&order)
            .unwrap()
            .outputs(vec![locked(BASE, 150_000_000)])
            .unwrap()
            .build();
        assert_eq!(
            validate(&validator, &[tx]).error_code,
            Some(ErrorCode::DataNotFound)
        );
    }

    // -- Batch policy --------------------------------------------------------

    #[test]
    fn batch_reports_last_error_code() {
        let (validator, _ledger) = setup();
        let below = order_tx(OrderSide::Sell, 5, 1, locked(BASE, 1));
        let good = order_tx(OrderSide::Sell, 5, 150_000_000, locked(BASE, 150_000_000));
        let wrong_asset = order_tx(OrderSide::Sell, 5, 150_000_000, locked(QUOTE, 150_000_000));

        let result = validate(&validator, &[below.clone(), good, wrong_asset.clone()]);
        assert_eq!(result.rejected, vec![below, wrong_asset]);
        assert_eq!(result.error_code, Some(ErrorCode::OrderCoinNotEqual));
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let validator = OrderAdmissionValidator::new(Arc::new(ChainManager::new()));
        let result = validate(&validator, &[]);
        assert!(result.is_clean());
        assert_eq!(result.error_code, None);
    }

    #[test]
    fn unknown_chain_rejects_whole_batch() {
        let validator = OrderAdmissionValidator::new(Arc::new(ChainManager::new()));
        let tx = order_tx(OrderSide::Sell, 5, 150_000_000, locked(BASE, 150_000_000));
        let result = validate(&validator, &[tx.clone()]);
        assert_eq!(result.rejected, vec![tx]);
        assert_eq!(result.error_code, Some(ErrorCode::ChainNotExist));
    }

    #[test]
    fn commit_and_rollback_are_no_ops() {
        let (validator, _ledger) = setup();
        let header = BlockHeader::default();
        assert!(validator.commit(1, &[], &header, SyncStatus::Running));
        assert!(validator.rollback(1, &[], &header));
    }
}
