pub mod export;
pub mod plan;
