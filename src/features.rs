use serde::{Deserialize, Serialize};

/// Number of features every model in this crate is trained and served with.
pub const FEATURE_COUNT: usize = 23;

/// Canonical feature order shared by training and serving.
///
/// This is the contract: matrices are built column-by-column in this order
/// and scoring vectors are extracted in this order. A persisted model whose
/// metadata disagrees with this list must be refused at load time.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "rsi",
    "macd",
    "macd_signal",
    "macd_histogram",
    "ema_20",
    "ema_50",
    "atr",
    "atr_percent",
    "bb_position",
    "volume_ratio",
    "price_vs_ema20",
    "price_vs_ema50",
    "ema20_trend",
    "ema50_trend",
    "price_above_ema20",
    "price_above_ema50",
    "ema20_above_ema50",
    "momentum_24h",
    "momentum_7d",
    "market_cap_tier",
    "volatility_tier",
    "btc_correlation",
    "market_regime",
];

/// What the binary outcome label means.
pub const TARGET_NAME: &str = "price_up_1pct_24h";

fn default_rsi() -> f32 {
    50.0
}

fn default_atr_percent() -> f32 {
    3.0
}

fn default_bb_position() -> f32 {
    0.5
}

fn default_volume_ratio() -> f32 {
    1.0
}

fn default_btc_correlation() -> f32 {
    0.6
}

/// Neutral setting for the three-way flags and tiers.
fn default_one() -> f32 {
    1.0
}

/// One coin snapshot's technical-analysis features.
///
/// Every field is optional on the wire and falls back to a neutral default,
/// so a caller can send a sparse record. `to_vector` emits the values in
/// [`FEATURE_NAMES`] order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    #[serde(default = "default_rsi")]
    pub rsi: f32,
    #[serde(default)]
    pub macd: f32,
    #[serde(default)]
    pub macd_signal: f32,
    #[serde(default)]
    pub macd_histogram: f32,
    #[serde(default)]
    pub ema_20: f32,
    #[serde(default)]
    pub ema_50: f32,
    #[serde(default)]
    pub atr: f32,
    #[serde(default = "default_atr_percent")]
    pub atr_percent: f32,
    #[serde(default = "default_bb_position")]
    pub bb_position: f32,
    #[serde(default = "default_volume_ratio")]
    pub volume_ratio: f32,
    #[serde(default)]
    pub price_vs_ema20: f32,
    #[serde(default)]
    pub price_vs_ema50: f32,
    /// 0 = down, 1 = neutral, 2 = up
    #[serde(default = "default_one")]
    pub ema20_trend: f32,
    #[serde(default = "default_one")]
    pub ema50_trend: f32,
    #[serde(default = "default_one")]
    pub price_above_ema20: f32,
    #[serde(default = "default_one")]
    pub price_above_ema50: f32,
    #[serde(default = "default_one")]
    pub ema20_above_ema50: f32,
    #[serde(default)]
    pub momentum_24h: f32,
    #[serde(default)]
    pub momentum_7d: f32,
    /// 0 = small, 1 = mid, 2 = large
    #[serde(default = "default_one")]
    pub market_cap_tier: f32,
    /// 0 = low, 1 = moderate, 2 = high
    #[serde(default = "default_one")]
    pub volatility_tier: f32,
    #[serde(default = "default_btc_correlation")]
    pub btc_correlation: f32,
    /// 0 = risk_off, 1 = neutral, 2 = risk_on
    #[serde(default = "default_one")]
    pub market_regime: f32,
}

impl Default for FeatureRecord {
    fn default() -> Self {
        FeatureRecord {
            rsi: default_rsi(),
            macd: 0.0,
            macd_signal: 0.0,
            macd_histogram: 0.0,
            ema_20: 0.0,
            ema_50: 0.0,
            atr: 0.0,
            atr_percent: default_atr_percent(),
            bb_position: default_bb_position(),
            volume_ratio: default_volume_ratio(),
            price_vs_ema20: 0.0,
            price_vs_ema50: 0.0,
            ema20_trend: default_one(),
            ema50_trend: default_one(),
            price_above_ema20: default_one(),
            price_above_ema50: default_one(),
            ema20_above_ema50: default_one(),
            momentum_24h: 0.0,
            momentum_7d: 0.0,
            market_cap_tier: default_one(),
            volatility_tier: default_one(),
            btc_correlation: default_btc_correlation(),
            market_regime: default_one(),
        }
    }
}

impl FeatureRecord {
    /// Feature values in the canonical schema order.
    pub fn to_vector(&self) -> Vec<f32> {
        vec![
            self.rsi,
            self.macd,
            self.macd_signal,
            self.macd_histogram,
            self.ema_20,
            self.ema_50,
            self.atr,
            self.atr_percent,
            self.bb_position,
            self.volume_ratio,
            self.price_vs_ema20,
            self.price_vs_ema50,
            self.ema20_trend,
            self.ema50_trend,
            self.price_above_ema20,
            self.price_above_ema50,
            self.ema20_above_ema50,
            self.momentum_24h,
            self.momentum_7d,
            self.market_cap_tier,
            self.volatility_tier,
            self.btc_correlation,
            self.market_regime,
        ]
    }
}

/// True when `names` matches the compiled schema in length and order.
pub fn schema_matches(names: &[String]) -> bool {
    names.len() == FEATURE_COUNT
        && names
            .iter()
            .zip(FEATURE_NAMES.iter())
            .all(|(a, b)| a == b)
}

/// Owned copy of the schema, for metadata records.
pub fn schema_names() -> Vec<String> {
    FEATURE_NAMES.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_follows_schema_order() {
        let record = FeatureRecord {
            rsi: 61.0,
            market_regime: 2.0,
            ..FeatureRecord::default()
        };
        let v = record.to_vector();
        assert_eq!(v.len(), FEATURE_COUNT);
        assert_eq!(v[0], 61.0);
        assert_eq!(v[FEATURE_COUNT - 1], 2.0);
    }

    #[test]
    fn sparse_json_takes_defaults() {
        let record: FeatureRecord =
            serde_json::from_str(r#"{"rsi": 72.5, "volume_ratio": 2.1}"#).unwrap();
        assert_eq!(record.rsi, 72.5);
        assert_eq!(record.volume_ratio, 2.1);
        assert_eq!(record.atr_percent, 3.0);
        assert_eq!(record.bb_position, 0.5);
        assert_eq!(record.btc_correlation, 0.6);
        assert_eq!(record.market_regime, 1.0);
    }

    #[test]
    fn schema_check_rejects_reorder_and_truncation() {
        let exact = schema_names();
        assert!(schema_matches(&exact));

        let mut reordered = schema_names();
        reordered.swap(0, 1);
        assert!(!schema_matches(&reordered));

        let mut truncated = schema_names();
        truncated.pop();
        assert!(!schema_matches(&truncated));
    }
}
