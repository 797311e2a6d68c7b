use crate::error::StakingError;
use crate::instruction::StakeInstruction;
use crate::{helper, instruction, rpc_wrapper, staking};
use log::warn;
use rocket::{serde::json::Json, State};
use solana_client::rpc_client::RpcClient;
use solana_sdk::instruction::Instruction;

/// Build the unsigned stake/unstake/withdraw transaction for a user.
///
/// Token accounts may be passed in by a caller that already resolved
/// them; otherwise they are derived here and their creation instructions
/// are batched in front of the transfer.
#[get(
    "/get_encoded_transaction?<user_token_owner>&<instruction_type>&<amount>&<duration>&<user_token_account>&<vault_token_account>"
)]
pub async fn encode(
    rpc_client: &State<RpcClient>,
    staking_config: &State<staking::StakingConfig>,
    user_token_owner: String,
    instruction_type: String,
    amount: Option<u64>,
    duration: Option<u64>,
    user_token_account: Option<String>,
    vault_token_account: Option<String>,
) -> Json<Result<String, String>> {
    Json(
        build_transfer_transaction(
            rpc_client,
            staking_config,
            &user_token_owner,
            &instruction_type,
            amount,
            duration,
            user_token_account,
            vault_token_account,
        )
        .map_err(|err| {
            warn!("get_encoded_transaction failed: {}", err);
            err.to_string()
        }),
    )
}

fn build_transfer_transaction(
    rpc_client: &RpcClient,
    staking_config: &staking::StakingConfig,
    user_token_owner: &str,
    instruction_type: &str,
    amount: Option<u64>,
    duration: Option<u64>,
    user_token_account: Option<String>,
    vault_token_account: Option<String>,
) -> Result<String, StakingError> {
    let program_id = staking_config.program_id();
    let fee_payer = staking_config.fee_payer();
    let mint = staking_config.token_mint();

    let user = helper::parse_pubkey(user_token_owner)?;

    let staking_instruction = match instruction_type {
        "stake" => StakeInstruction::Stake {
            amount: require_field(amount, "amount")?,
            duration: require_field(duration, "duration")?,
        },
        "unstake" => StakeInstruction::Unstake {
            amount: require_field(amount, "amount")?,
        },
        "withdraw" => StakeInstruction::Withdraw,
        other => {
            return Err(StakingError::EncodingError(format!(
                "unknown instruction type {}",
                other
            )))
        }
    };
    // Encoding problems surface here, before any account lookup.
    let instruction_data = staking_instruction.pack()?;

    let (vault_account, _bump_seed) = rpc_wrapper::find_vault_address(&program_id, &user);

    let (user_token_account, user_associated_instruction) = match user_token_account {
        Some(account) => (helper::parse_pubkey(&account)?, None),
        None => rpc_wrapper::get_associated_account(rpc_client, &user, &fee_payer, &mint)?,
    };
    let (vault_token_account, vault_associated_instruction) = match vault_token_account {
        Some(account) => (helper::parse_pubkey(&account)?, None),
        None => {
            rpc_wrapper::get_associated_account(rpc_client, &vault_account, &fee_payer, &mint)?
        }
    };

    let main_instruction = instruction::get_transfer(
        program_id,
        &instruction_data,
        user,
        user_token_account,
        vault_token_account,
    );

    // Account creations ride in the same transaction; the batch applies
    // all-or-nothing.
    let mut instructions: Vec<Instruction> = Vec::new();
    instructions.extend(user_associated_instruction);
    instructions.extend(vault_associated_instruction);
    instructions.push(main_instruction);

    let blockhash = rpc_client
        .get_latest_blockhash()
        .map_err(|err| StakingError::NetworkError(err.to_string()))?;
    let transaction = helper::assemble(&instructions, &fee_payer, blockhash)?;
    helper::serialize_transaction(&transaction)
}

fn require_field(value: Option<u64>, name: &str) -> Result<u64, StakingError> {
    value.ok_or_else(|| StakingError::EncodingError(format!("missing {}", name)))
}

/// Sign with the configured fee payer and submit, blocking until the
/// configured commitment level is reached.
#[post("/send_transaction", data = "<encoded_transaction>")]
pub async fn send(
    rpc_client: &State<RpcClient>,
    staking_config: &State<staking::StakingConfig>,
    encoded_transaction: String,
) -> Json<Result<String, String>> {
    Json(
        sign_and_send(rpc_client, staking_config, &encoded_transaction).map_err(|err| {
            warn!("send_transaction failed: {}", err);
            err.to_string()
        }),
    )
}

fn sign_and_send(
    rpc_client: &RpcClient,
    staking_config: &staking::StakingConfig,
    encoded_transaction: &str,
) -> Result<String, StakingError> {
    let mut transaction = helper::deserialize_transaction(encoded_transaction)?;
    let staking_operation =
        instruction::find_staking_instruction(&transaction, &staking_config.program_id());
    let fee_payer = helper::parse_keypair(&staking_config.fee_payer_private_key)?;
    let signature = rpc_wrapper::submit_and_confirm(
        rpc_client,
        staking_config,
        &mut transaction,
        &[&fee_payer],
    )
    .map_err(|err| {
        warn!(
            "submitting {:?} failed (retryable: {}): {}",
            staking_operation,
            err.is_retryable(),
            err
        );
        err
    })?;
    Ok(signature.to_string())
}

/// Add a caller's signature to an encoded transaction. Used for the
/// vault account keypair on initialize and for any co-signing wallet.
#[post("/sign_transaction/<user_private_key>", data = "<encoded_transaction>")]
pub async fn sign(
    user_private_key: String,
    encoded_transaction: String,
) -> Json<Result<String, String>> {
    Json(
        partial_sign(&user_private_key, &encoded_transaction).map_err(|err| {
            warn!("sign_transaction failed: {}", err);
            err.to_string()
        }),
    )
}

fn partial_sign(user_private_key: &str, encoded_transaction: &str) -> Result<String, StakingError> {
    let mut transaction = helper::deserialize_transaction(encoded_transaction)?;
    let keypair = helper::parse_keypair(user_private_key)?;
    let blockhash = transaction.message.recent_blockhash;
    transaction
        .try_partial_sign(&vec![&keypair], blockhash)
        .map_err(|err| StakingError::SignatureMissing(err.to_string()))?;
    helper::serialize_transaction(&transaction)
}
