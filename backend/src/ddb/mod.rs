pub mod model;
pub mod prediction_store;
