//! Load the persisted model and score a few coin snapshots.
//!
//! Run the train_model example first so artifacts/crypto_model exists.
use anyhow::Result;

use coincast::features::FeatureRecord;
use coincast::io::model_store::ModelStore;
use coincast::service::{PredictionService, ScoreRequest};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let service = PredictionService::new(ModelStore::new("artifacts"));
    let health = service.health();
    println!("before load: status={}", health.status);

    service.load("crypto_model")?;
    let health = service.health();
    println!(
        "after load: status={} version={} features={}",
        health.status,
        health.model_version.as_deref().unwrap_or("-"),
        health.features_count
    );

    let strong_momentum = ScoreRequest {
        coin_id: "bitcoin".to_string(),
        features: FeatureRecord {
            rsi: 62.0,
            macd_histogram: 0.3,
            volume_ratio: 2.2,
            price_above_ema20: 1.0,
            ema20_trend: 2.0,
            momentum_24h: 4.5,
            market_regime: 2.0,
            ..FeatureRecord::default()
        },
    };
    let scored = service.score_one(&strong_momentum)?;
    println!(
        "{}: p={:.4} confidence={} prediction={}",
        scored.coin_id,
        scored.probability,
        scored.confidence.as_str(),
        scored.prediction
    );

    let batch = vec![
        strong_momentum.clone(),
        ScoreRequest {
            coin_id: "ethereum".to_string(),
            features: FeatureRecord::default(),
        },
        ScoreRequest {
            coin_id: "dogecoin".to_string(),
            features: FeatureRecord {
                rsi: 25.0,
                volume_ratio: 0.6,
                price_above_ema20: 0.0,
                ema20_trend: 0.0,
                momentum_24h: -6.0,
                market_regime: 0.0,
                ..FeatureRecord::default()
            },
        },
    ];
    let outcome = service.score_batch(&batch)?;
    println!("ranked by probability (model {}):", outcome.model_version);
    for result in &outcome.results {
        println!(
            "  {:<10} p={:.4} {}",
            result.coin_id,
            result.probability,
            result.confidence.as_str()
        );
    }
    for failure in &outcome.errors {
        println!("  {:<10} dropped: {}", failure.coin_id, failure.error);
    }
    Ok(())
}
