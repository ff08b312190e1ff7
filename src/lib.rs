//! coincast: calibrated short-horizon crypto movement prediction.
//!
//! This crate trains a boosted-tree classifier with per-fold isotonic
//! calibration over a fixed 23-feature technical-analysis schema, persists
//! the resulting ensemble with a metadata sidecar, and serves calibrated
//! probabilities that a coin rises more than 1% in the next 24 hours.
//!
//! The design keeps training and serving on one compiled feature schema so
//! a model can never silently score vectors laid out differently from the
//! data it was trained on.
pub mod calibration;
pub mod config;
pub mod data_handling;
pub mod error;
pub mod features;
pub mod io;
pub mod math;
pub mod models;
pub mod service;
pub mod stats;
pub mod synthetic;
pub mod trainer;
