// Unit tests to cover the rpc_wrapper module

use crate::rpc_wrapper::*;
use crate::{helper, instruction, staking};

use crate::instruction::StakeInstruction;
use solana_client::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
};
use solana_transaction_status::{TransactionConfirmationStatus, TransactionStatus};
use spl_associated_token_account::get_associated_token_address;

fn test_config() -> staking::StakingConfig {
    staking::StakingConfig {
        on_chain_endpoint: String::from("https://api.devnet.solana.com"),
        commitment_level: String::from("confirmed"),
        staking_program_address: String::from("HVA9bXns8yg2vG7VFU1rCtAL9FSXjMCkMMj6RcEjUbdP"),
        staking_token_mint: String::from("BSSbai4rmTWoiswetQUb7X5TwTvT93WoDPEF3QuNCdd"),
        staking_vault_address: String::from("2SKGL7hP8pEcHJkWDYi6zHBJ7LKGpEsYAb9KyuyqieHu"),
        fee_payer_address: String::from("Bdd59KsthFZxqMjBbpK9Qd9FUpkmLMxTcpNystMv1CXw"),
        fee_payer_private_key: String::from(
            "nNL6jFkycDn4EpFiqqbYzU6A5DWaH9wEr8oJZcjimXM8q3BEu6CYnEcuvm6GdfNN9kkw9eG1JKrYqap6ZFtEPob",
        ),
        send_transaction_simulate: true,
        confirmation_timeout_secs: 5,
        solana_web_api_rust_log: String::from("info"),
    }
}

// The RPC reports rooted transactions with a null confirmation count.
fn status_at(
    confirmation_status: TransactionConfirmationStatus,
    confirmations: Option<usize>,
) -> TransactionStatus {
    TransactionStatus {
        slot: 1,
        confirmations,
        status: Ok(()),
        err: None,
        confirmation_status: Some(confirmation_status),
    }
}

#[test]
fn vault_address_is_deterministic() {
    let config = test_config();
    let program_id = config.program_id();
    let owner = config.fee_payer();

    let (first, first_bump) = find_vault_address(&program_id, &owner);
    let (second, second_bump) = find_vault_address(&program_id, &owner);
    assert_eq!(first, second);
    assert_eq!(first_bump, second_bump);
}

#[test]
fn vault_address_matches_its_bump() {
    let config = test_config();
    let program_id = config.program_id();
    let owner = config.fee_payer();

    let (address, bump) = find_vault_address(&program_id, &owner);
    let recreated =
        Pubkey::create_program_address(&[owner.as_ref(), &[bump]], &program_id).unwrap();
    assert_eq!(address, recreated);
}

#[test]
fn vault_addresses_differ_per_owner() {
    let config = test_config();
    let program_id = config.program_id();

    let (first, _) = find_vault_address(&program_id, &Pubkey::new_unique());
    let (second, _) = find_vault_address(&program_id, &Pubkey::new_unique());
    assert_ne!(first, second);
}

#[test]
fn associated_account_derivation_is_deterministic() {
    let owner = Pubkey::new_unique();
    let mint = Pubkey::new_unique();

    assert_eq!(
        get_associated_token_address(&owner, &mint),
        get_associated_token_address(&owner, &mint)
    );
}

#[test]
fn existing_associated_account_needs_no_creation() {
    let owner = Pubkey::new_unique();
    let fee_payer = Pubkey::new_unique();
    let mint = Pubkey::new_unique();

    assert!(maybe_create_associated_account(true, &owner, &fee_payer, &mint).is_none());
}

#[test]
fn missing_associated_account_is_created_by_fee_payer() {
    let owner = Pubkey::new_unique();
    let fee_payer = Pubkey::new_unique();
    let mint = Pubkey::new_unique();

    let create = maybe_create_associated_account(false, &owner, &fee_payer, &mint).unwrap();
    assert_eq!(create.program_id, spl_associated_token_account::id());
    // funding account signs, the derived account is created
    assert_eq!(create.accounts[0].pubkey, fee_payer);
    assert!(create.accounts[0].is_signer);
    assert_eq!(
        create.accounts[1].pubkey,
        get_associated_token_address(&owner, &mint)
    );
}

#[test]
fn unsigned_transaction_reports_missing_signers() {
    let config = test_config();
    let user = Pubkey::new_unique();
    let data = StakeInstruction::Withdraw.pack().unwrap();
    let transfer = instruction::get_transfer(
        config.program_id(),
        &data,
        user,
        Pubkey::new_unique(),
        Pubkey::new_unique(),
    );
    let transaction = helper::assemble(&[transfer], &config.fee_payer(), Hash::default()).unwrap();

    let err = check_signatures(&transaction).unwrap_err();
    let message = err.to_string();
    assert!(message.contains(&config.fee_payer().to_string()));
    assert!(message.contains(&user.to_string()));
}

#[test]
fn submit_rejects_missing_signature_before_any_rpc_call() {
    // every rpc call on this mock fails, so reaching the network would
    // surface as a network error instead
    let rpc_client = RpcClient::new_mock("fails".to_string());
    let config = test_config();

    let data = StakeInstruction::Unstake { amount: 20 }.pack().unwrap();
    let transfer = instruction::get_transfer(
        config.program_id(),
        &data,
        Pubkey::new_unique(),
        Pubkey::new_unique(),
        Pubkey::new_unique(),
    );
    let mut transaction =
        helper::assemble(&[transfer], &config.fee_payer(), Hash::default()).unwrap();

    let err = submit_and_confirm(&rpc_client, &config, &mut transaction, &[]).unwrap_err();
    assert!(err.to_string().contains("missing required signature"));
    assert!(!err.is_retryable());
}

#[test]
fn fully_signed_transaction_passes_signature_check() {
    let config = test_config();
    let fee_payer = helper::parse_keypair(&config.fee_payer_private_key).unwrap();

    let data = StakeInstruction::Withdraw.pack().unwrap();
    let transfer = instruction::get_transfer(
        config.program_id(),
        &data,
        config.fee_payer(),
        Pubkey::new_unique(),
        Pubkey::new_unique(),
    );
    let mut transaction =
        helper::assemble(&[transfer], &config.fee_payer(), Hash::default()).unwrap();
    transaction
        .try_partial_sign(&vec![&fee_payer], Hash::default())
        .unwrap();

    assert!(check_signatures(&transaction).is_ok());
    assert_ne!(transaction.signatures[0], Signature::default());
}

#[test]
fn confirmation_respects_commitment_level() {
    let confirmed = status_at(TransactionConfirmationStatus::Confirmed, Some(1));
    assert!(confirmation_reached(&confirmed, CommitmentConfig::confirmed()).unwrap());
    assert!(!confirmation_reached(&confirmed, CommitmentConfig::finalized()).unwrap());
    assert!(confirmation_reached(&confirmed, CommitmentConfig::processed()).unwrap());

    let finalized = status_at(TransactionConfirmationStatus::Finalized, None);
    assert!(confirmation_reached(&finalized, CommitmentConfig::finalized()).unwrap());
}

#[test]
fn on_chain_failure_is_terminal() {
    use solana_sdk::transaction::TransactionError;

    let status = TransactionStatus {
        slot: 1,
        confirmations: Some(1),
        status: Err(TransactionError::AccountNotFound),
        err: Some(TransactionError::AccountNotFound),
        confirmation_status: Some(TransactionConfirmationStatus::Confirmed),
    };
    let err = confirmation_reached(&status, CommitmentConfig::confirmed()).unwrap_err();
    assert!(!err.is_retryable());
}
