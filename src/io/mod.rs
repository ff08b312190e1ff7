pub mod dataset;
pub mod model_store;
