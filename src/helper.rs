use base64::{engine::general_purpose, Engine as _};
use solana_sdk::{
    hash::Hash,
    instruction::Instruction,
    message::Message,
    pubkey::Pubkey,
    signature::Keypair,
    transaction::Transaction,
};

use crate::error::StakingError;

/// Build an unsigned transaction from an ordered instruction batch.
///
/// The batch applies all-or-nothing on-chain, so account creation can
/// ride in front of the transfer it enables. Account order within each
/// instruction is preserved verbatim.
pub fn assemble(
    instructions: &[Instruction],
    fee_payer: &Pubkey,
    blockhash: Hash,
) -> Result<Transaction, StakingError> {
    if instructions.is_empty() {
        return Err(StakingError::EmptyTransaction);
    }
    let message = Message::new_with_blockhash(instructions, Some(fee_payer), &blockhash);
    Ok(Transaction::new_unsigned(message))
}

pub fn serialize_transaction(transaction: &Transaction) -> Result<String, StakingError> {
    let bytes = bincode::serialize(transaction)
        .map_err(|err| StakingError::EncodingError(err.to_string()))?;
    Ok(general_purpose::STANDARD.encode(bytes))
}

pub fn deserialize_transaction(encoded: &str) -> Result<Transaction, StakingError> {
    let bytes = general_purpose::STANDARD
        .decode(encoded)
        .map_err(|err| StakingError::EncodingError(err.to_string()))?;
    bincode::deserialize::<Transaction>(bytes.as_slice())
        .map_err(|err| StakingError::EncodingError(err.to_string()))
}

pub fn parse_pubkey(input: &str) -> Result<Pubkey, StakingError> {
    input
        .parse::<Pubkey>()
        .map_err(|err| StakingError::InvalidKey(format!("{}: {}", input, err)))
}

/// Key material arrives as the base58 encoding of the 64-byte secret key.
/// It is never logged and never leaves this process.
pub fn parse_keypair(encoded: &str) -> Result<Keypair, StakingError> {
    let bytes = bs58::decode(encoded)
        .into_vec()
        .map_err(|err| StakingError::InvalidKey(format!("secret key: {}", err)))?;
    Keypair::from_bytes(&bytes)
        .map_err(|err| StakingError::InvalidKey(format!("secret key: {}", err)))
}
