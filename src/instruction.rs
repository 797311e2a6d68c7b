use solana_program::system_program;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    transaction::Transaction,
};

use crate::error::StakingError;
use crate::staking::opcode;

/// Operations accepted by the on-chain staking program.
///
/// Wire format: one opcode byte followed by the variant's `u64` fields in
/// declaration order, little-endian. The opcode numbering is a
/// compatibility contract with the deployed program and must not change
/// on one side only.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum StakeInstruction {
    /// Set up a fresh staking account for a user.
    ///
    /// 0. `[writable, signer]` Vault account (fresh keypair, co-signed by the caller)
    /// 1. `[signer]` User account
    /// 2. `[writable]` Vault storage account
    /// 3. `[]` System program
    Initialize,

    /// Move tokens from the user into the vault.
    ///
    /// 0. `[writable, signer]` User account
    /// 1. `[writable]` User SPL token account
    /// 2. `[writable]` Vault SPL token account
    /// 3. `[]` SPL token program
    Stake { amount: u64, duration: u64 },

    /// Move tokens from the vault back to the user.
    /// Accounts as for `Stake`.
    Unstake { amount: u64 },

    /// Drain the matured position back to the user.
    /// Accounts as for `Stake`.
    Withdraw,
}

impl StakeInstruction {
    pub fn opcode(&self) -> u8 {
        match self {
            StakeInstruction::Initialize => opcode::INITIALIZE,
            StakeInstruction::Stake { .. } => opcode::STAKE,
            StakeInstruction::Unstake { .. } => opcode::UNSTAKE,
            StakeInstruction::Withdraw => opcode::WITHDRAW,
        }
    }

    /// Serialize into the program's wire format. Pure; rejects
    /// zero-amount transfers before producing any bytes.
    pub fn pack(&self) -> Result<Vec<u8>, StakingError> {
        let mut data = vec![self.opcode()];
        match self {
            StakeInstruction::Initialize | StakeInstruction::Withdraw => {}
            StakeInstruction::Stake { amount, duration } => {
                check_amount(*amount)?;
                data.extend_from_slice(&amount.to_le_bytes());
                data.extend_from_slice(&duration.to_le_bytes());
            }
            StakeInstruction::Unstake { amount } => {
                check_amount(*amount)?;
                data.extend_from_slice(&amount.to_le_bytes());
            }
        }
        Ok(data)
    }

    /// Exact inverse of `pack` at the byte-layout level.
    pub fn unpack(input: &[u8]) -> Result<Self, StakingError> {
        let (tag, mut rest) = input
            .split_first()
            .ok_or_else(|| StakingError::EncodingError("empty instruction data".to_string()))?;
        let instruction = match *tag {
            opcode::INITIALIZE => StakeInstruction::Initialize,
            opcode::STAKE => {
                let amount = unpack_u64(&mut rest)?;
                let duration = unpack_u64(&mut rest)?;
                StakeInstruction::Stake { amount, duration }
            }
            opcode::UNSTAKE => {
                let amount = unpack_u64(&mut rest)?;
                StakeInstruction::Unstake { amount }
            }
            opcode::WITHDRAW => StakeInstruction::Withdraw,
            other => {
                return Err(StakingError::EncodingError(format!(
                    "unknown opcode {}",
                    other
                )))
            }
        };
        if !rest.is_empty() {
            return Err(StakingError::EncodingError(format!(
                "{} trailing byte(s) after instruction",
                rest.len()
            )));
        }
        Ok(instruction)
    }
}

fn unpack_u64(input: &mut &[u8]) -> Result<u64, StakingError> {
    let value = input
        .get(..8)
        .and_then(|slice| slice.try_into().ok())
        .map(u64::from_le_bytes)
        .ok_or_else(|| StakingError::EncodingError("instruction field truncated".to_string()))?;
    *input = &input[8..];
    Ok(value)
}

fn check_amount(amount: u64) -> Result<(), StakingError> {
    if amount == 0 {
        return Err(StakingError::EncodingError(
            "amount cannot be zero".to_string(),
        ));
    }
    Ok(())
}

pub fn get_initialize(
    program_id: Pubkey,
    instruction_data: &[u8],
    vault_account: Pubkey,
    user: Pubkey,
    vault_storage: Pubkey,
) -> Instruction {
    Instruction::new_with_bytes(
        program_id,
        instruction_data,
        vec![
            // 0. `[writable, signer]` Vault account
            AccountMeta::new(vault_account, true),
            // 1. `[signer]` User account
            AccountMeta::new_readonly(user, true),
            // 2. `[writable]` Vault storage account
            // config
            AccountMeta::new(vault_storage, false),
            // 3. `[]` System program
            AccountMeta::new_readonly(system_program::id(), false),
        ],
    )
}

/// Stake, unstake and withdraw share one account list; the opcode decides
/// the transfer direction on-chain. The order is part of the program's
/// contract and is never rearranged here.
pub fn get_transfer(
    program_id: Pubkey,
    instruction_data: &[u8],
    user: Pubkey,
    user_token_account: Pubkey,
    vault_token_account: Pubkey,
) -> Instruction {
    Instruction::new_with_bytes(
        program_id,
        instruction_data,
        vec![
            // 0. `[writable, signer]` User account
            AccountMeta::new(user, true),
            // 1. `[writable]` User SPL token account
            // get_associated_account
            AccountMeta::new(user_token_account, false),
            // 2. `[writable]` Vault SPL token account
            // get_associated_account of the vault pda
            AccountMeta::new(vault_token_account, false),
            // 3. `[]` SPL token program account
            AccountMeta::new_readonly(spl_token::id(), false),
        ],
    )
}

/// Pick the staking operation out of an assembled transaction. Used to
/// report which operation a failed submission carried.
pub fn find_staking_instruction(
    transaction: &Transaction,
    program_id: &Pubkey,
) -> Option<StakeInstruction> {
    let message = &transaction.message;
    message.instructions.iter().find_map(|compiled| {
        let index = compiled.program_id_index as usize;
        if message.account_keys.get(index) == Some(program_id) {
            StakeInstruction::unpack(&compiled.data).ok()
        } else {
            None
        }
    })
}
