use borsh::{BorshDeserialize, BorshSerialize};
use chrono::{DateTime, NaiveDateTime, Utc};
use rocket::serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

/// On-chain layout of a user staking account. Fixed by the deployed
/// program; decoded read-only.
#[derive(BorshSerialize, BorshDeserialize, PartialEq, Debug)]
pub struct StakingAccount {
    pub user: Pubkey,
    pub amount_staked: u64,
    pub stake_start_time: u64,
    pub reward_rate: u64,
    pub is_initialized: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct StakingAccountInfo {
    pub staking_account: String,
    pub user: String,
    pub amount_staked: u64,
    pub stake_start_time: u64,
    pub stake_start_time_utc: String,
    pub reward_rate: u64,
    pub is_initialized: bool,
}

impl StakingAccountInfo {
    pub fn new(staking_account: String, account: StakingAccount) -> StakingAccountInfo {
        StakingAccountInfo {
            staking_account,
            user: account.user.to_string(),
            amount_staked: account.amount_staked,
            stake_start_time: account.stake_start_time,
            stake_start_time_utc: format_timestamp(account.stake_start_time),
            reward_rate: account.reward_rate,
            is_initialized: account.is_initialized,
        }
    }
}

fn format_timestamp(timestamp: u64) -> String {
    match NaiveDateTime::from_timestamp_opt(timestamp as i64, 0) {
        Some(val) => std::format!(
            "{} UTC",
            DateTime::<Utc>::from_utc(val, Utc).format("%Y-%m-%d %H:%M:%S")
        ),
        None => String::from("N/A"),
    }
}
