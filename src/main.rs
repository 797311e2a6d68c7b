mod dto;
mod error;
mod helper;
mod instruction;
mod routes;
mod rpc_wrapper;
mod staking;

use borsh::BorshDeserialize;
use log::warn;
use rocket::{serde::json::Json, Config, State};
use solana_client::rpc_client::RpcClient;

#[macro_use]
extern crate rocket;
extern crate log;
extern crate pretty_env_logger;

use crate::error::StakingError;
use crate::instruction::StakeInstruction;

/// Build the unsigned transaction that sets up a user's staking account.
///
/// The vault account is a fresh keypair generated by the caller, which
/// must co-sign through /sign_transaction before submission.
#[get("/get_initialize_transaction?<user>&<vault_account>")]
async fn get_initialize_transaction(
    rpc_client: &State<RpcClient>,
    staking_config: &State<staking::StakingConfig>,
    user: String,
    vault_account: String,
) -> Json<Result<String, String>> {
    Json(
        build_initialize_transaction(rpc_client, staking_config, &user, &vault_account).map_err(
            |err| {
                warn!("get_initialize_transaction failed: {}", err);
                err.to_string()
            },
        ),
    )
}

fn build_initialize_transaction(
    rpc_client: &RpcClient,
    staking_config: &staking::StakingConfig,
    user: &str,
    vault_account: &str,
) -> Result<String, StakingError> {
    let user = helper::parse_pubkey(user)?;
    let vault_account = helper::parse_pubkey(vault_account)?;
    let instruction_data = StakeInstruction::Initialize.pack()?;

    let initialize_instruction = instruction::get_initialize(
        staking_config.program_id(),
        &instruction_data,
        vault_account,
        user,
        staking_config.vault_storage(),
    );

    let blockhash = rpc_client
        .get_latest_blockhash()
        .map_err(|err| StakingError::NetworkError(err.to_string()))?;
    let transaction = helper::assemble(
        &[initialize_instruction],
        &staking_config.fee_payer(),
        blockhash,
    )?;
    helper::serialize_transaction(&transaction)
}

#[get("/get_staking_account_info?<staking_account>")]
async fn get_staking_account_info(
    rpc_client: &State<RpcClient>,
    staking_account: String,
) -> Json<Result<dto::StakingAccountInfo, String>> {
    Json(fetch_staking_account(rpc_client, &staking_account).map_err(|err| {
        warn!("get_staking_account_info failed: {}", err);
        err.to_string()
    }))
}

fn fetch_staking_account(
    rpc_client: &RpcClient,
    staking_account: &str,
) -> Result<dto::StakingAccountInfo, StakingError> {
    let account_key = helper::parse_pubkey(staking_account)?;
    let account = rpc_client
        .get_account(&account_key)
        .map_err(|err| StakingError::ResolutionFailed(err.to_string()))?;
    let staking_data = dto::StakingAccount::try_from_slice(account.data.as_slice())
        .map_err(|err| StakingError::EncodingError(format!("staking account state: {}", err)))?;
    Ok(dto::StakingAccountInfo::new(
        staking_account.to_string(),
        staking_data,
    ))
}

#[get("/")]
async fn health_ping() -> &'static str {
    ""
}

#[launch]
fn rocket() -> _ {
    let staking_config = Config::figment()
        .extract::<staking::StakingConfig>()
        .unwrap();
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", &staking_config.solana_web_api_rust_log);
    }

    pretty_env_logger::init_timed();

    // Fail at boot on malformed operator-supplied keys.
    staking_config.program_id();
    staking_config.token_mint();
    staking_config.vault_storage();
    staking_config.fee_payer();

    let rpc_client = RpcClient::new_with_commitment(
        staking_config.on_chain_endpoint.clone(),
        staking_config.commitment(),
    );
    rocket::build()
        .manage(rpc_client)
        .manage(staking_config)
        .attach(routes::mount())
        .mount(
            "/",
            routes![
                get_initialize_transaction,
                get_staking_account_info,
                health_ping
            ],
        )
}

#[cfg(test)]
mod rpc_wrapper_tests;
