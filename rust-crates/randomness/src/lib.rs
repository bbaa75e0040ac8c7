pub mod aggregator;
pub mod demo;
pub mod error;
pub mod file_rows;
pub mod games;
pub mod oracle;
pub mod participant;
pub mod social;
pub mod staking;
pub mod tweet;
pub mod winners;

pub use error::{
    Error,
    Result,
    is_rate_limit_message,
};
