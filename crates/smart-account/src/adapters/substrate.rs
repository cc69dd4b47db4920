//! # In-Memory Substrate
//!
//! Journaled in-memory world used by tests and the demo binary.
//!
//! Balances, code and nonces live behind a single lock. Checkpoints push a
//! full copy of the world; `revert` restores it, `commit` drops it.
//! Calls are routed to registered [`CallHandler`]s, which may call back
//! into the account. No lock is held while a handler runs.

use crate::domain::entities::{CallFrame, DeployFrame};
use crate::domain::services::{compute_contract_address, compute_contract_address_create2};
use crate::domain::value_objects::{Address, Bytes, U256};
use crate::errors::SubstrateError;
use crate::ports::outbound::{ExecutionSubstrate, JournalCheckpoint};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Reserved EOF prefix (EIP-3541).
const EOF_PREFIX: u8 = 0xEF;

/// `INVALID` opcode. Init code starting with it reverts in the constructor.
const INVALID_OPCODE: u8 = 0xFE;

// =============================================================================
// CALL HANDLERS
// =============================================================================

/// Code living at an address.
///
/// Receives every call routed to that address, after the value transfer.
#[async_trait]
pub trait CallHandler: Send + Sync {
    /// Runs the call. An error reverts everything the call did.
    async fn on_call(&self, frame: &CallFrame) -> Result<Bytes, SubstrateError>;
}

/// Returns the calldata unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoHandler;

#[async_trait]
impl CallHandler for EchoHandler {
    async fn on_call(&self, frame: &CallFrame) -> Result<Bytes, SubstrateError> {
        Ok(frame.data.clone())
    }
}

/// Always reverts with a fixed reason.
#[derive(Debug, Clone)]
pub struct RevertHandler {
    reason: String,
}

impl RevertHandler {
    /// Creates a handler reverting with `reason`.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl CallHandler for RevertHandler {
    async fn on_call(&self, _frame: &CallFrame) -> Result<Bytes, SubstrateError> {
        Err(SubstrateError::Revert(self.reason.clone()))
    }
}

// =============================================================================
// WORLD STATE
// =============================================================================

#[derive(Debug, Clone, Default)]
struct WorldState {
    balances: HashMap<Address, U256>,
    code: HashMap<Address, Bytes>,
    nonces: HashMap<Address, u64>,
}

impl WorldState {
    fn balance(&self, address: Address) -> U256 {
        self.balances.get(&address).copied().unwrap_or_default()
    }

    fn nonce(&self, address: Address) -> u64 {
        self.nonces.get(&address).copied().unwrap_or(0)
    }

    fn move_value(&mut self, from: Address, to: Address, value: U256) -> Result<(), SubstrateError> {
        if value.is_zero() {
            return Ok(());
        }
        let available = self.balance(from);
        if available < value {
            return Err(SubstrateError::InsufficientBalance {
                required: value,
                available,
            });
        }
        self.balances.insert(from, available - value);
        let credited = self.balance(to).saturating_add(value);
        self.balances.insert(to, credited);
        Ok(())
    }

    /// EIP-684: an address with code or a non-zero nonce is taken.
    fn is_occupied(&self, address: Address) -> bool {
        self.code.get(&address).is_some_and(|c| !c.is_empty()) || self.nonce(address) > 0
    }
}

// =============================================================================
// SUBSTRATE
// =============================================================================

/// In-memory [`ExecutionSubstrate`] with a checkpoint journal.
pub struct InMemorySubstrate {
    world: RwLock<WorldState>,
    journal: Mutex<Vec<WorldState>>,
    handlers: RwLock<HashMap<Address, Arc<dyn CallHandler>>>,
    max_init_code_size: usize,
}

impl std::fmt::Debug for InMemorySubstrate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let world = self.world.read();
        f.debug_struct("InMemorySubstrate")
            .field("accounts", &world.balances.len())
            .field("contracts", &world.code.len())
            .field("journal_depth", &self.journal.lock().len())
            .field("handlers", &self.handlers.read().len())
            .finish()
    }
}

impl InMemorySubstrate {
    /// Creates an empty world with the given init code limit.
    #[must_use]
    pub fn new(max_init_code_size: usize) -> Self {
        Self {
            world: RwLock::new(WorldState::default()),
            journal: Mutex::new(Vec::new()),
            handlers: RwLock::new(HashMap::new()),
            max_init_code_size,
        }
    }

    /// Overwrites the balance of `address`.
    pub fn set_balance(&self, address: Address, balance: U256) {
        self.world.write().balances.insert(address, balance);
    }

    /// Deployed code at `address`, empty if none.
    #[must_use]
    pub fn code_at(&self, address: Address) -> Bytes {
        self.world
            .read()
            .code
            .get(&address)
            .cloned()
            .unwrap_or_default()
    }

    /// Current nonce of `address`.
    #[must_use]
    pub fn nonce_of(&self, address: Address) -> u64 {
        self.world.read().nonce(address)
    }

    /// Routes future calls to `address` through `handler`.
    pub fn register_handler(&self, address: Address, handler: Arc<dyn CallHandler>) {
        self.handlers.write().insert(address, handler);
    }

    /// Number of open checkpoints.
    #[must_use]
    pub fn journal_depth(&self) -> usize {
        self.journal.lock().len()
    }

    fn handler_for(&self, address: Address) -> Option<Arc<dyn CallHandler>> {
        self.handlers.read().get(&address).cloned()
    }

    /// Closes `checkpoint`, which must be the innermost one.
    fn pop_checkpoint(&self, checkpoint: JournalCheckpoint) -> Result<WorldState, SubstrateError> {
        let mut journal = self.journal.lock();
        if journal.len() != checkpoint.0 + 1 {
            return Err(SubstrateError::InvalidCheckpoint(checkpoint.0));
        }
        journal
            .pop()
            .ok_or(SubstrateError::InvalidCheckpoint(checkpoint.0))
    }

    /// Settles a nested step: commit on success, revert on failure.
    fn settle<T>(
        &self,
        checkpoint: JournalCheckpoint,
        outcome: Result<T, SubstrateError>,
    ) -> Result<T, SubstrateError> {
        match outcome {
            Ok(value) => {
                self.commit(checkpoint)?;
                Ok(value)
            }
            Err(e) => {
                self.revert(checkpoint)?;
                Err(e)
            }
        }
    }

    fn validate_init_code(&self, init_code: &[u8]) -> Result<(), SubstrateError> {
        if init_code.len() > self.max_init_code_size {
            return Err(SubstrateError::InitCodeSizeExceeded {
                size: init_code.len(),
                max: self.max_init_code_size,
            });
        }
        match init_code.first() {
            None => Err(SubstrateError::Revert("empty init code".to_string())),
            Some(&EOF_PREFIX) => Err(SubstrateError::InvalidCodePrefix),
            Some(&INVALID_OPCODE) => Err(SubstrateError::Revert(
                "constructor reverted".to_string(),
            )),
            Some(_) => Ok(()),
        }
    }

    /// Places the contract. Init code is stored as the runtime code.
    fn install(&self, frame: &DeployFrame) -> Result<Address, SubstrateError> {
        self.validate_init_code(frame.init_code.as_slice())?;

        let mut world = self.world.write();
        let address = match frame.salt {
            None => {
                let nonce = world.nonce(frame.creator);
                world.nonces.insert(frame.creator, nonce + 1);
                compute_contract_address(frame.creator, nonce)
            }
            Some(salt) => {
                compute_contract_address_create2(frame.creator, salt, frame.init_code.as_slice())
            }
        };

        if world.is_occupied(address) {
            return Err(SubstrateError::ContractAlreadyExists(address));
        }

        world.move_value(frame.creator, address, frame.value)?;
        world.code.insert(address, frame.init_code.clone());
        // EIP-161: new contracts start at nonce 1.
        world.nonces.insert(address, 1);
        Ok(address)
    }
}

impl Default for InMemorySubstrate {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_INIT_CODE_SIZE)
    }
}

#[async_trait]
impl ExecutionSubstrate for InMemorySubstrate {
    fn checkpoint(&self) -> JournalCheckpoint {
        let snapshot = self.world.read().clone();
        let mut journal = self.journal.lock();
        journal.push(snapshot);
        let checkpoint = JournalCheckpoint(journal.len() - 1);
        trace!(depth = checkpoint.0, "Checkpoint opened");
        checkpoint
    }

    fn commit(&self, checkpoint: JournalCheckpoint) -> Result<(), SubstrateError> {
        self.pop_checkpoint(checkpoint)?;
        trace!(depth = checkpoint.0, "Checkpoint committed");
        Ok(())
    }

    fn revert(&self, checkpoint: JournalCheckpoint) -> Result<(), SubstrateError> {
        let snapshot = self.pop_checkpoint(checkpoint)?;
        *self.world.write() = snapshot;
        trace!(depth = checkpoint.0, "Checkpoint reverted");
        Ok(())
    }

    fn balance_of(&self, address: Address) -> U256 {
        self.world.read().balance(address)
    }

    fn transfer(&self, from: Address, to: Address, value: U256) -> Result<(), SubstrateError> {
        self.world.write().move_value(from, to, value)
    }

    async fn call(&self, frame: CallFrame) -> Result<Bytes, SubstrateError> {
        if frame.is_static && !frame.value.is_zero() {
            return Err(SubstrateError::WriteInStaticContext);
        }

        let checkpoint = self.checkpoint();
        if let Err(e) = self.transfer(frame.caller, frame.target, frame.value) {
            return self.settle(checkpoint, Err(e));
        }

        let outcome = match self.handler_for(frame.target) {
            Some(handler) => handler.on_call(&frame).await,
            None => Ok(Bytes::new()),
        };

        debug!(
            target_address = ?frame.target,
            is_static = frame.is_static,
            success = outcome.is_ok(),
            "Call routed"
        );
        self.settle(checkpoint, outcome)
    }

    async fn deploy(&self, frame: DeployFrame) -> Result<Address, SubstrateError> {
        let checkpoint = self.checkpoint();
        let outcome = self.install(&frame);
        if let Ok(address) = &outcome {
            debug!(contract = ?address, create2 = frame.salt.is_some(), "Contract installed");
        }
        self.settle(checkpoint, outcome)
    }
}

// =============================================================================
// TESTS
// =============================================================================
