use crate::{
    Error,
    Result,
};

const BASE_APY: f64 = 5.0;
const APY_PER_DAY: f64 = 0.5;

/// Annual rate in percent for a lock of `days`.
pub fn apy_for(days: u32) -> f64 {
    BASE_APY + APY_PER_DAY * f64::from(days)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RewardEstimate {
    pub apy: f64,
    pub reward: f64,
}

pub fn estimate_rewards(amount: f64, days: u32) -> RewardEstimate {
    let apy = apy_for(days);
    let reward = amount * apy / 100.0 * f64::from(days) / 365.0;
    RewardEstimate { apy, reward }
}

/// A simulated stake. Nothing is sent on chain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StakePosition {
    pub amount: f64,
    pub days: u32,
    pub estimate: RewardEstimate,
}

pub fn stake(amount: f64, days: u32) -> Result<StakePosition> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::Validation("Please enter a valid amount".to_string()));
    }
    if days == 0 {
        return Err(Error::Validation("Staking period must be at least one day".to_string()));
    }
    let estimate = estimate_rewards(amount, days);
    tracing::info!(
        "simulated stake of {amount} for {days} days at {:.1}% APY",
        estimate.apy
    );
    Ok(StakePosition {
        amount,
        days,
        estimate,
    })
}
