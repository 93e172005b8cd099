pub mod assembler;
pub mod classifier;
pub mod encoder;
pub mod predictor;
pub mod preprocess;
pub mod scaler;
pub mod stats_repository;

pub use assembler::*;
pub use classifier::*;
pub use encoder::*;
pub use predictor::*;
pub use preprocess::*;
pub use scaler::*;
pub use stats_repository::*;
