pub mod gbdt;
