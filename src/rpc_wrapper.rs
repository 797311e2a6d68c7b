use std::time::{Duration, Instant};

use solana_client::{
    rpc_client::RpcClient,
    rpc_config::{RpcSendTransactionConfig, RpcSimulateTransactionConfig},
};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    transaction::{Transaction, TransactionError},
};
use solana_transaction_status::TransactionStatus;
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account,
};

use crate::error::StakingError;
use crate::staking::StakingConfig;

const CONFIRMATION_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Derive the vault account for `owner` under the staking program.
///
/// Pure: identical inputs always yield the identical address and bump.
/// The bump search guarantees the address has no corresponding private
/// key.
pub fn find_vault_address(program_id: &Pubkey, owner: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[owner.as_ref()], program_id)
}

/// Resolve the associated token account for `(owner, mint)`.
///
/// When the account does not exist yet, the fee-payer-funded creation
/// instruction is returned alongside so the caller can batch it ahead of
/// the transfer. Creating is idempotent: an existing account yields no
/// instruction, and replaying a creation that already landed is a no-op.
pub fn get_associated_account(
    rpc_client: &RpcClient,
    owner: &Pubkey,
    fee_payer: &Pubkey,
    mint: &Pubkey,
) -> Result<(Pubkey, Option<Instruction>), StakingError> {
    let associated_account = get_associated_token_address(owner, mint);
    let existing = rpc_client
        .get_account_with_commitment(&associated_account, rpc_client.commitment())
        .map_err(|err| StakingError::ResolutionFailed(err.to_string()))?
        .value;
    Ok((
        associated_account,
        maybe_create_associated_account(existing.is_some(), owner, fee_payer, mint),
    ))
}

pub fn maybe_create_associated_account(
    exists: bool,
    owner: &Pubkey,
    fee_payer: &Pubkey,
    mint: &Pubkey,
) -> Option<Instruction> {
    if exists {
        None
    } else {
        Some(create_associated_token_account(
            fee_payer,
            owner,
            mint,
            &spl_token::id(),
        ))
    }
}

/// Sign and submit, blocking until the client's commitment level is
/// reached or the configured timeout elapses.
///
/// The ledger deduplicates by signature, so duplicate delivery of the
/// same signed transaction is safe; a caller must still not resubmit
/// after receiving `Ok`. On `Timeout` the outcome is unknown: check the
/// ledger for the returned signature before retrying.
pub fn submit_and_confirm(
    rpc_client: &RpcClient,
    staking_config: &StakingConfig,
    transaction: &mut Transaction,
    signers: &[&Keypair],
) -> Result<Signature, StakingError> {
    let blockhash = transaction.message.recent_blockhash;
    transaction
        .try_partial_sign(&signers.to_vec(), blockhash)
        .map_err(|err| StakingError::SignatureMissing(err.to_string()))?;
    check_signatures(transaction)?;

    if staking_config.send_transaction_simulate {
        simulate(rpc_client, transaction)?;
    }

    let send_config = RpcSendTransactionConfig {
        skip_preflight: false,
        preflight_commitment: Some(rpc_client.commitment().commitment),
        ..RpcSendTransactionConfig::default()
    };
    let signature = rpc_client
        .send_transaction_with_config(transaction, send_config)
        .map_err(|err| StakingError::NetworkError(err.to_string()))?;

    wait_for_confirmation(
        rpc_client,
        &signature,
        staking_config.confirmation_timeout_secs,
    )?;

    Ok(signature)
}

/// Every account flagged as a signer must carry a signature before the
/// transaction leaves the process. Checked locally so a half-signed
/// transaction never reaches the network.
pub fn check_signatures(transaction: &Transaction) -> Result<(), StakingError> {
    let missing: Vec<String> = transaction
        .signatures
        .iter()
        .zip(transaction.message.account_keys.iter())
        .filter(|(signature, _)| **signature == Signature::default())
        .map(|(_, pubkey)| pubkey.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(StakingError::SignatureMissing(missing.join(", ")))
    }
}

fn simulate(rpc_client: &RpcClient, transaction: &Transaction) -> Result<(), StakingError> {
    let simulate_config = RpcSimulateTransactionConfig {
        sig_verify: true,
        commitment: Some(rpc_client.commitment()),
        ..RpcSimulateTransactionConfig::default()
    };
    let result = rpc_client
        .simulate_transaction_with_config(transaction, simulate_config)
        .map_err(|err| StakingError::NetworkError(err.to_string()))?;
    match result.value.err {
        // The program rejected the instruction logic; retrying the same
        // request cannot succeed.
        Some(TransactionError::InstructionError(_, _)) => {
            let log = result.value.logs.unwrap_or_default().join("  ");
            Err(StakingError::SimulationFailed(log))
        }
        // Environmental failures (expired blockhash and the like) are
        // retryable with a fresh transaction.
        Some(err) => Err(StakingError::NetworkError(err.to_string())),
        None => Ok(()),
    }
}

fn wait_for_confirmation(
    rpc_client: &RpcClient,
    signature: &Signature,
    timeout_secs: u64,
) -> Result<(), StakingError> {
    let commitment = rpc_client.commitment();
    let started = Instant::now();
    loop {
        let statuses = rpc_client
            .get_signature_statuses(&[*signature])
            .map_err(|err| StakingError::NetworkError(err.to_string()))?;
        if let Some(Some(status)) = statuses.value.into_iter().next() {
            if confirmation_reached(&status, commitment)? {
                return Ok(());
            }
        }
        if started.elapsed().as_secs() >= timeout_secs {
            return Err(StakingError::Timeout {
                signature: signature.to_string(),
                waited_secs: timeout_secs,
            });
        }
        std::thread::sleep(CONFIRMATION_POLL_INTERVAL);
    }
}

/// A status that carries an execution error is terminal: the transaction
/// landed and was rejected by the program.
pub fn confirmation_reached(
    status: &TransactionStatus,
    commitment: CommitmentConfig,
) -> Result<bool, StakingError> {
    if let Some(err) = &status.err {
        return Err(StakingError::SimulationFailed(format!(
            "transaction failed on chain: {:?}",
            err
        )));
    }
    Ok(status.satisfies_commitment(commitment))
}
