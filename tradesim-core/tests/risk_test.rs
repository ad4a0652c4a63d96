//! Integration tests for the risk gate across a simulated session.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::thread;
use tradesim_core::config::RiskConfig;
use tradesim_core::domain::{OrderRequest, OrderSide, OrderType};
use tradesim_core::risk::{
    BlockReason, Clock, ManualClock, RiskError, RiskManager, TradePermission, TradeResult,
};

fn open() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap()
}

fn session() -> (Arc<RiskManager>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(open()));
    let risk = RiskManager::with_clock(RiskConfig::default(), dec!(10000), clock.clone()).unwrap();
    (Arc::new(risk), clock)
}

fn closed(pnl: Decimal, at: DateTime<Utc>) -> TradeResult {
    TradeResult {
        timestamp: at,
        symbol: "BTC-USD".into(),
        side: OrderSide::Buy,
        entry_price: dec!(50000),
        exit_price: dec!(50000) + pnl * dec!(50),
        amount: dec!(0.02),
        pnl,
        is_win: pnl > Decimal::ZERO,
    }
}

#[test]
fn sized_order_passes_validation() {
    let (risk, _) = session();
    assert!(risk.can_trade().is_allowed());

    let entry = dec!(50000);
    let stop = dec!(49500);
    let amount = risk.calculate_position_size(entry, stop, risk.current_balance());
    let request = OrderRequest {
        symbol: "BTC-USD".into(),
        side: OrderSide::Buy,
        order_type: OrderType::Limit,
        price: entry,
        amount,
        stop_loss: Some(stop),
        take_profit: Some(dec!(51000)),
    };
    assert_eq!(request.notional(), dec!(1000));
    assert_eq!(risk.validate_order(&request, 0), Ok(()));

    let no_stop = OrderRequest {
        stop_loss: Some(Decimal::ZERO),
        ..request
    };
    assert_eq!(
        risk.validate_order(&no_stop, 0),
        Err(RiskError::MissingStopLoss)
    );
}

#[test]
fn losing_streak_pauses_then_resumes() {
    let (risk, clock) = session();
    for i in 0..3 {
        clock.advance(Duration::minutes(1));
        risk.record_trade(closed(dec!(-5), open() + Duration::minutes(i)));
    }
    let permission = risk.can_trade();
    match permission.reason() {
        Some(BlockReason::Cooldown { remaining }) => {
            assert_eq!(*remaining, Duration::minutes(15))
        }
        other => panic!("expected cooldown, got {other:?}"),
    }
    assert!(permission.reason().unwrap().to_string().contains("cooldown"));

    clock.advance(Duration::minutes(15));
    assert_eq!(risk.can_trade(), TradePermission::Allowed);

    // Streak restarted from zero: two more losses do not re-trigger the pause.
    risk.record_trade(closed(dec!(-5), clock.now()));
    risk.record_trade(closed(dec!(-5), clock.now()));
    assert!(!risk.is_in_cooldown());
    assert_eq!(risk.consecutive_losses(), 2);
}

#[test]
fn daily_loss_limit_holds_until_midnight_utc() {
    let (risk, clock) = session();
    risk.record_trade(closed(dec!(-60), open()));
    risk.record_trade(closed(dec!(80), open()));
    risk.record_trade(closed(dec!(-130), open()));
    assert_eq!(risk.daily_pnl(), dec!(-110));
    assert!(matches!(
        risk.can_trade().reason(),
        Some(BlockReason::DailyLossLimit { .. })
    ));

    clock.set(Utc.with_ymd_and_hms(2024, 6, 3, 23, 59, 59).unwrap());
    assert!(!risk.can_trade().is_allowed());

    clock.set(Utc.with_ymd_and_hms(2024, 6, 4, 0, 0, 0).unwrap());
    assert!(risk.can_trade().is_allowed());
    assert_eq!(risk.daily_trade_count(), 0);

    let stats = risk.stats();
    assert_eq!(stats.total_trades, 3);
    assert_eq!(stats.total_profit, dec!(80));
    assert_eq!(stats.total_loss, dec!(190));
    assert_eq!(stats.net_pnl, dec!(-110));
    assert_eq!(stats.daily_pnl, Decimal::ZERO);
}

#[test]
fn concurrent_recording_is_serialized() {
    let (risk, _) = session();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let risk = Arc::clone(&risk);
            thread::spawn(move || {
                for _ in 0..5 {
                    risk.record_trade(closed(dec!(1), open()));
                    let _ = risk.can_trade();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(risk.daily_trade_count(), 40);
    assert_eq!(risk.current_balance(), dec!(10040));
    assert_eq!(risk.trade_history().len(), 40);
}
