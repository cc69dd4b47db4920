//! # Smart Account Demo
//!
//! Runs the reference scenario against an in-memory substrate:
//!
//! 1. Owner forwards 500000 wei with calldata `0x11` to a target
//! 2. Owner and non-owner sign `"Hello World"`; the oracle answers both
//! 3. Owner stores `0x1122` under `hash_message("key")` and reads it back
//!
//! Configuration comes from `SA_*` environment variables.

use anyhow::{Context, Result};
use smart_account::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Account address used by the demo.
const ACCOUNT: Address = Address::from_low_u64(0x5afe);

#[tokio::main]
async fn main() -> Result<()> {
    let config = AccountConfig::from_env().context("invalid configuration")?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_level))
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!(version = smart_account::VERSION, "Starting smart account demo");

    let owner = LocalSigner::random();
    let stranger = LocalSigner::random();
    let recipient = Address::from_low_u64(0xA11CE);

    let account = SmartAccount::in_memory(ACCOUNT, owner.address(), config);
    let mut events = account.subscribe();
    account
        .substrate()
        .set_balance(owner.address(), U256::from(1_000_000));

    // 1. Forward value
    let value = U256::from(500_000);
    account
        .execute(
            CallContext::with_value(owner.address(), value),
            ExecuteRequest::call(recipient, value, Bytes::from_slice(&[0x11])),
        )
        .await
        .context("execute failed")?;

    while let Ok(event) = events.try_recv() {
        let log = event.to_log(account.address());
        info!(event = event.name(), topic = %log.topics[0], data = %log.data, "Event");
    }
    info!(
        recipient_balance = %account.substrate().balance_of(recipient),
        "Value forwarded"
    );

    // 2. Signature oracle
    let digest = hash_message(b"Hello World");
    let by_owner = owner.sign_hash(&digest)?;
    let by_stranger = stranger.sign_hash(&digest)?;
    info!(
        owner = %account.is_valid_signature(&digest, &by_owner),
        stranger = %account.is_valid_signature(&digest, &by_stranger),
        "isValidSignature"
    );

    // 3. Metadata
    let key = DataKey::from(hash_message(b"key"));
    account
        .set_data(owner.address(), key, Bytes::from_slice(&[0x11, 0x22]))
        .context("setData failed")?;
    info!(key = ?key, value = %account.get_data(&key), "getData");

    info!(stats = ?account.stats(), "Demo complete");
    Ok(())
}
