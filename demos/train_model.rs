//! Train a calibrated model and persist it to the artifact store.
//!
//! With no arguments this trains on seeded synthetic snapshots; pass a CSV
//! path to train on real labeled history instead.
//!
//! ```text
//! cargo run --example train_model [training.csv]
//! ```
use anyhow::Result;

use coincast::config::TrainingConfig;
use coincast::io::dataset::read_training_csv;
use coincast::io::model_store::ModelStore;
use coincast::synthetic;
use coincast::trainer::ModelTrainer;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let data = match std::env::args().nth(1) {
        Some(path) => read_training_csv(&path)?,
        None => synthetic::generate(10_000, 42)?,
    };

    let trainer = ModelTrainer::new(TrainingConfig::default());
    let (model, metadata, report) = trainer.train(&data)?;

    println!("=== Training Results ===");
    println!("brier score: {:.4}", report.brier);
    println!(
        "positive class: precision {:.3}, recall {:.3}, support {}",
        report.classes.positive.precision,
        report.classes.positive.recall,
        report.classes.positive.support
    );
    println!(
        "negative class: precision {:.3}, recall {:.3}, support {}",
        report.classes.negative.precision,
        report.classes.negative.recall,
        report.classes.negative.support
    );
    println!("=== Top 10 Features ===");
    for (name, delta) in report.importances.iter().take(10) {
        println!("  {:<20} {:+.4}", name, delta);
    }

    let store = ModelStore::new("artifacts");
    store.save("crypto_model", &model, &metadata)?;
    println!("saved model version {} to artifacts/", metadata.version);
    Ok(())
}
