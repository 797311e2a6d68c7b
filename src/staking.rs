use rocket::serde::Deserialize;
use solana_sdk::{
    commitment_config::{CommitmentConfig, CommitmentLevel},
    pubkey::Pubkey,
};
use std::str::FromStr;

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct StakingConfig {
    pub on_chain_endpoint: String,
    pub commitment_level: String,
    pub staking_program_address: String,
    pub staking_token_mint: String,
    pub staking_vault_address: String,
    pub fee_payer_address: String,
    pub fee_payer_private_key: String,
    pub send_transaction_simulate: bool,
    pub confirmation_timeout_secs: u64,
    pub solana_web_api_rust_log: String,
}

impl StakingConfig {
    pub fn program_id(&self) -> Pubkey {
        self.staking_program_address
            .parse::<Pubkey>()
            .expect("invalid staking_program_address in config")
    }

    pub fn token_mint(&self) -> Pubkey {
        self.staking_token_mint
            .parse::<Pubkey>()
            .expect("invalid staking_token_mint in config")
    }

    pub fn vault_storage(&self) -> Pubkey {
        self.staking_vault_address
            .parse::<Pubkey>()
            .expect("invalid staking_vault_address in config")
    }

    pub fn fee_payer(&self) -> Pubkey {
        self.fee_payer_address
            .parse::<Pubkey>()
            .expect("invalid fee_payer_address in config")
    }

    pub fn commitment(&self) -> CommitmentConfig {
        let commitment = CommitmentLevel::from_str(&self.commitment_level)
            .expect("unrecognized commitment_level in config");
        CommitmentConfig { commitment }
    }
}

pub mod opcode {
    pub const INITIALIZE: u8 = 0;
    pub const STAKE: u8 = 1;
    pub const UNSTAKE: u8 = 2;
    pub const WITHDRAW: u8 = 3;
}
