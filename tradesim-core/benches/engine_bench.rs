//! Criterion benchmarks for TradeSim hot paths.
//!
//! Benchmarks:
//! 1. Candle replay loop (full backtest with the EMA crossover)
//! 2. Signal generation over a single window
//! 3. Risk gate checks and trade recording

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

use tradesim_core::config::{BacktestConfig, RiskConfig, StrategyParams};
use tradesim_core::domain::{Candle, HistoricalData, OrderRequest, OrderSide, OrderType};
use tradesim_core::engine::BacktestEngine;
use tradesim_core::risk::{RiskManager, TradeResult};
use tradesim_core::signals::{EmaCrossover, SignalGenerator};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_candles(n: usize) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let wave = (i as f64 * 0.07).sin() * 800.0;
            let close = Decimal::from_f64_retain(50_000.0 + wave)
                .unwrap_or(dec!(50000))
                .round_dp(2);
            Candle::new(
                "BTC-USD",
                start + Duration::minutes(i as i64),
                close - dec!(5),
                close + dec!(25),
                close - dec!(25),
                close,
                dec!(3),
            )
        })
        .collect()
}

// ── 1. Replay loop ───────────────────────────────────────────────────

fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("candle_replay");
    let strategy = EmaCrossover::default();
    let params = StrategyParams::default();

    for n in [1_000usize, 10_000] {
        let data = Arc::new(HistoricalData::new("BTC-USD", make_candles(n)));
        group.bench_with_input(BenchmarkId::new("ema_crossover", n), &data, |b, data| {
            b.iter(|| {
                let mut engine = BacktestEngine::new(BacktestConfig::default(), Arc::clone(data));
                black_box(engine.run(&strategy, &params).ok())
            })
        });
    }
    group.finish();
}

// ── 2. Signal generation ─────────────────────────────────────────────

fn bench_signal(c: &mut Criterion) {
    let strategy = EmaCrossover::default();
    let closes: Vec<Decimal> = make_candles(50).iter().map(|c| c.close).collect();
    let volumes = vec![dec!(3); closes.len()];

    c.bench_function("ema_crossover_window_50", |b| {
        b.iter(|| {
            black_box(strategy.generate_signal("BTC-USD", black_box(&closes), &volumes, None))
        })
    });
}

// ── 3. Risk gate ─────────────────────────────────────────────────────

fn bench_risk(c: &mut Criterion) {
    let mut group = c.benchmark_group("risk_gate");
    let config = RiskConfig {
        daily_trading_limit: u32::MAX,
        ..RiskConfig::default()
    };
    let risk = RiskManager::new(config, dec!(10000)).unwrap();
    let request = OrderRequest {
        symbol: "BTC-USD".into(),
        side: OrderSide::Buy,
        order_type: OrderType::Limit,
        price: dec!(50000),
        amount: dec!(0.01),
        stop_loss: Some(dec!(49500)),
        take_profit: None,
    };

    group.bench_function("can_trade", |b| b.iter(|| black_box(risk.can_trade())));
    group.bench_function("validate_order", |b| {
        b.iter(|| black_box(risk.validate_order(&request, 1)))
    });
    group.bench_function("record_win", |b| {
        b.iter(|| {
            risk.record_trade(TradeResult {
                timestamp: Utc::now(),
                symbol: "BTC-USD".into(),
                side: OrderSide::Buy,
                entry_price: dec!(50000),
                exit_price: dec!(50010),
                amount: dec!(0.01),
                pnl: dec!(0.1),
                is_win: true,
            })
        })
    });
    group.finish();
}

criterion_group!(benches, bench_replay, bench_signal, bench_risk);
criterion_main!(benches);
