//! Seeded synthetic snapshot generator for demos and tests.
//!
//! Labels follow a bullish-pattern probability over the drawn features, so a
//! trained model has real structure to find, then 10% of labels are flipped
//! as noise.
use log::info;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

use crate::data_handling::TrainingSet;
use crate::error::PredictError;
use crate::features::FeatureRecord;

/// Generate `n` labeled snapshots from the given seed.
pub fn generate(n: usize, seed: u64) -> Result<TrainingSet, PredictError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    for _ in 0..n {
        let record = draw_record(&mut rng);
        let probability = pattern_probability(&record);
        labels.push(u8::from(rng.gen::<f64>() < probability));
        rows.push(record.to_vector());
    }

    let flips = n / 10;
    if flips > 0 {
        for idx in index::sample(&mut rng, n, flips).iter() {
            labels[idx] = 1 - labels[idx];
        }
    }

    let positives = labels.iter().filter(|&&label| label == 1).count();
    info!(
        "generated {} synthetic rows, positive rate {:.1}%",
        n,
        100.0 * positives as f64 / n.max(1) as f64
    );
    TrainingSet::from_rows(rows, labels)
}

fn draw_record(rng: &mut StdRng) -> FeatureRecord {
    let macd = rng.gen_range(-0.5f32..0.5);
    let macd_signal = rng.gen_range(-0.3f32..0.3);
    let ema_20 = rng.gen_range(100.0f32..10_000.0);
    let ema_50 = ema_20 * rng.gen_range(0.9f32..1.1);
    let atr_percent = rng.gen_range(1.0f32..10.0);
    let price_vs_ema20 = rng.gen_range(-5.0f32..5.0);
    let price_vs_ema50 = rng.gen_range(-10.0f32..10.0);

    FeatureRecord {
        rsi: rng.gen_range(20.0f32..80.0),
        macd,
        macd_signal,
        macd_histogram: macd - macd_signal,
        ema_20,
        ema_50,
        atr: ema_20 * atr_percent / 100.0,
        atr_percent,
        bb_position: rng.gen_range(0.0f32..1.0),
        volume_ratio: rng.gen_range(0.5f32..3.0),
        price_vs_ema20,
        price_vs_ema50,
        ema20_trend: rng.gen_range(0..3) as f32,
        ema50_trend: rng.gen_range(0..3) as f32,
        price_above_ema20: if price_vs_ema20 > 0.0 { 1.0 } else { 0.0 },
        price_above_ema50: if price_vs_ema50 > 0.0 { 1.0 } else { 0.0 },
        ema20_above_ema50: if ema_20 > ema_50 { 1.0 } else { 0.0 },
        momentum_24h: rng.gen_range(-10.0f32..10.0),
        momentum_7d: rng.gen_range(-20.0f32..20.0),
        market_cap_tier: rng.gen_range(0..3) as f32,
        volatility_tier: rng.gen_range(0..3) as f32,
        btc_correlation: rng.gen_range(0.3f32..0.9),
        market_regime: rng.gen_range(0..3) as f32,
    }
}

/// Probability that a snapshot with these features precedes a >1% rise.
///
/// Bullish conditions add to a 0.5 base, bearish ones subtract, and the
/// result is clipped to [0.1, 0.9] so neither class ever vanishes.
fn pattern_probability(record: &FeatureRecord) -> f64 {
    let mut score = 0.0f64;
    if (50.0..=70.0).contains(&record.rsi) {
        score += 0.1;
    }
    if record.rsi < 30.0 {
        score += 0.05;
    }
    if record.rsi > 80.0 {
        score -= 0.15;
    }
    if record.macd_histogram > 0.0 {
        score += 0.08;
    }
    if record.volume_ratio > 1.5 {
        score += 0.12;
    }
    if record.volume_ratio > 2.0 {
        score += 0.05;
    }
    if record.price_above_ema20 == 1.0 {
        score += 0.1;
    }
    if record.ema20_trend == 2.0 {
        score += 0.08;
    }
    if record.momentum_24h > 2.0 {
        score += 0.06;
    }
    if (0.3..=0.7).contains(&record.bb_position) {
        score += 0.05;
    }
    if record.market_regime == 2.0 {
        score += 0.08;
    }
    if record.market_regime == 0.0 {
        score -= 0.1;
    }
    (0.5 + score).clamp(0.1, 0.9)
}
