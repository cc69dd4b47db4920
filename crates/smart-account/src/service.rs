//! # Smart Account Service
//!
//! Wires the domain (ownership, data store, audit log, signature rules) to
//! the driven ports and exposes the [`SmartAccountApi`].
//!
//! ## Execute Pipeline
//!
//! 1. Owner gate (`Unauthorized`)
//! 2. Static context (`WriteInStaticContext`) and reentrancy guard
//!    (`ReentrantCall`, when enabled)
//! 3. Operation decoding (`UnsupportedOperation`) and request shape
//! 4. Substrate checkpoint, deposit of the attached value, dispatch
//! 5. Commit, append the record, emit `ContractCreated` / `Executed`
//!
//! Any failure in steps 1-4 reverts the checkpoint and leaves no record.
//!
//! While a STATICCALL dispatch is in flight the account refuses every
//! write, whether or not the reentrancy guard is on.

use crate::adapters::{InMemorySubstrate, Secp256k1Recovery};
use crate::config::AccountConfig;
use crate::domain::audit::AuditLog;
use crate::domain::authorization::Ownership;
use crate::domain::data_store::DataStore;
use crate::domain::entities::{
    CallContext, CallFrame, DeployFrame, ExecuteRequest, OperationRecord, OperationType,
};
use crate::domain::invariants::{
    check_no_record_on_failure, check_record_fidelity, check_request_shape, SALT_LENGTH,
};
use crate::domain::signature::{validate_signature, MagicValue, SignatureCheck};
use crate::domain::value_objects::{Address, Bytes, DataKey, Hash};
use crate::errors::AccountError;
use crate::events::AccountEvent;
use crate::ports::inbound::SmartAccountApi;
use crate::ports::outbound::{ExecutionSubstrate, JournalCheckpoint, SignatureRecovery};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

/// Counters kept by the account.
///
/// Observability only: no operation reads them, so they never change a
/// result. `is_valid_signature` bumps them and is otherwise pure.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AccountStats {
    /// Successful `execute` calls.
    pub executions: u64,
    /// `execute` calls that passed the gate and then failed.
    pub failed_executions: u64,
    /// Calls refused up front (see [`AccountError::is_rejection`]).
    pub rejected_calls: u64,
    /// Applied metadata writes (one per key).
    pub data_writes: u64,
    /// `is_valid_signature` queries.
    pub signature_checks: u64,
    /// Queries answered with the success magic value.
    pub valid_signatures: u64,
}

/// Undo information for one unguarded `execute`.
///
/// Owner and data are copied on the first nested write only.
struct RollbackFrame {
    records: usize,
    state: Option<(Ownership, DataStore)>,
}

/// Holds the execution lock for one `execute`. Released on drop.
struct ReentrancyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ReentrancyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Marks a STATICCALL dispatch as in flight. Left on drop.
struct StaticFrame<'a> {
    depth: &'a AtomicUsize,
}

impl<'a> StaticFrame<'a> {
    fn enter(depth: &'a AtomicUsize) -> Self {
        depth.fetch_add(1, Ordering::AcqRel);
        Self { depth }
    }
}

impl Drop for StaticFrame<'_> {
    fn drop(&mut self) {
        self.depth.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A programmable account controlled by a single owner.
///
/// Generic over the execution substrate and the signature recovery
/// backend. Locks are never held across substrate calls, so handlers
/// running inside a call may re-enter the account.
pub struct SmartAccount<S: ExecutionSubstrate, R: SignatureRecovery> {
    /// Address of the account in the substrate.
    address: Address,
    /// Execution environment.
    substrate: Arc<S>,
    /// ECDSA recovery backend.
    recovery: R,
    /// Current owner.
    ownership: RwLock<Ownership>,
    /// ERC-725Y metadata.
    data: RwLock<DataStore>,
    /// Successful operations, in emission order.
    audit: RwLock<AuditLog>,
    /// Set while an `execute` runs.
    executing: AtomicBool,
    /// Open STATICCALL dispatches.
    static_depth: AtomicUsize,
    /// Open unguarded executes, innermost last.
    rollback: Mutex<Vec<RollbackFrame>>,
    /// Event fan-out.
    events: broadcast::Sender<AccountEvent>,
    /// Counters.
    stats: Mutex<AccountStats>,
    /// Runtime configuration.
    config: AccountConfig,
}

impl<S: ExecutionSubstrate, R: SignatureRecovery> std::fmt::Debug for SmartAccount<S, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmartAccount")
            .field("address", &self.address)
            .field("owner", &self.ownership.read().owner())
            .field("records", &self.audit.read().len())
            .field("entries", &self.data.read().len())
            .finish_non_exhaustive()
    }
}

impl<S: ExecutionSubstrate, R: SignatureRecovery> SmartAccount<S, R> {
    /// Creates an account at `address` owned by `creator`.
    pub fn new(
        address: Address,
        creator: Address,
        substrate: Arc<S>,
        recovery: R,
        config: AccountConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        info!(account = ?address, owner = ?creator, "Smart account created");
        Self {
            address,
            substrate,
            recovery,
            ownership: RwLock::new(Ownership::new(creator)),
            data: RwLock::new(DataStore::new()),
            audit: RwLock::new(AuditLog::new()),
            executing: AtomicBool::new(false),
            static_depth: AtomicUsize::new(0),
            rollback: Mutex::new(Vec::new()),
            events,
            stats: Mutex::new(AccountStats::default()),
            config,
        }
    }

    /// Subscribes to account events.
    pub fn subscribe(&self) -> broadcast::Receiver<AccountEvent> {
        self.events.subscribe()
    }

    /// Snapshot of the audit log.
    pub fn records(&self) -> Vec<OperationRecord> {
        self.audit.read().records().to_vec()
    }

    /// Current counters.
    pub fn stats(&self) -> AccountStats {
        self.stats.lock().clone()
    }

    /// Active configuration.
    pub fn config(&self) -> &AccountConfig {
        &self.config
    }

    /// Underlying substrate.
    pub fn substrate(&self) -> &Arc<S> {
        &self.substrate
    }

    fn emit(&self, event: AccountEvent) {
        debug!(event = event.name(), "Emitting event");
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }

    fn ensure_owner(&self, caller: Address) -> Result<(), AccountError> {
        let result = self.ownership.read().ensure_owner(caller);
        if result.is_err() {
            warn!(caller = ?caller, "Unauthorized call rejected");
        }
        result
    }

    fn ensure_not_static(&self) -> Result<(), AccountError> {
        if self.static_depth.load(Ordering::Acquire) > 0 {
            warn!("State change inside static call rejected");
            return Err(AccountError::WriteInStaticContext);
        }
        Ok(())
    }

    /// Refuses state mutation inside a static call or a running `execute`.
    fn ensure_writable(&self) -> Result<(), AccountError> {
        self.ensure_not_static()?;
        if self.config.reentrancy_guard && self.executing.load(Ordering::Acquire) {
            warn!("Reentrant call rejected");
            return Err(AccountError::ReentrantCall);
        }
        Ok(())
    }

    fn count_rejection<T>(&self, result: Result<T, AccountError>) -> Result<T, AccountError> {
        if matches!(&result, Err(e) if e.is_rejection()) {
            self.stats.lock().rejected_calls += 1;
        }
        result
    }

    #[instrument(
        skip(self, ctx, request),
        fields(account = ?self.address, caller = ?ctx.caller, op = %request.operation_type)
    )]
    async fn dispatch_execute(
        &self,
        ctx: CallContext,
        request: ExecuteRequest,
    ) -> Result<Bytes, AccountError> {
        let records_before = self.audit.read().len();
        let result = self.gated_execute(ctx, &request).await;

        match &result {
            Ok(_) => self.stats.lock().executions += 1,
            Err(e) if e.is_rejection() => self.stats.lock().rejected_calls += 1,
            Err(e) => {
                debug_assert!(check_no_record_on_failure(
                    true,
                    records_before,
                    self.audit.read().len()
                ));
                warn!(error = %e, "Execute failed");
                self.stats.lock().failed_executions += 1;
            }
        }
        result
    }

    async fn gated_execute(
        &self,
        ctx: CallContext,
        request: &ExecuteRequest,
    ) -> Result<Bytes, AccountError> {
        self.ensure_owner(ctx.caller)?;
        self.ensure_not_static()?;

        let _guard = if self.config.reentrancy_guard {
            let guard = ReentrancyGuard::acquire(&self.executing);
            if guard.is_none() {
                warn!("Reentrant execute rejected");
                return Err(AccountError::ReentrantCall);
            }
            guard
        } else {
            None
        };

        self.execute_unguarded(ctx, request).await
    }

    async fn execute_unguarded(
        &self,
        ctx: CallContext,
        request: &ExecuteRequest,
    ) -> Result<Bytes, AccountError> {
        let operation = OperationType::from_discriminant(request.operation_type)
            .ok_or(AccountError::UnsupportedOperation(request.operation_type))?;
        check_request_shape(operation, request)?;

        // Without the guard, nested dispatches may touch account state.
        let tracked = !self.config.reentrancy_guard;
        if tracked {
            let records = self.audit.read().len();
            self.rollback.lock().push(RollbackFrame {
                records,
                state: None,
            });
        }

        let checkpoint = self.substrate.checkpoint();
        let outcome = self.run(ctx, operation, request).await;
        let frame = if tracked {
            self.rollback.lock().pop()
        } else {
            None
        };

        let (output, created) = match outcome {
            Ok(done) => done,
            Err(e) => {
                self.roll_back(frame, checkpoint);
                return Err(e);
            }
        };
        if let Err(e) = self.substrate.commit(checkpoint) {
            self.roll_back(frame, checkpoint);
            return Err(e.into());
        }

        let record = OperationRecord::from_request(operation, request);
        debug_assert!(check_record_fidelity(operation, request, &record));
        let index = self.audit.write().append(record.clone());

        if let Some(event) = created {
            self.emit(event);
        }
        info!(index, target_address = ?record.target, value = %record.value, "Executed");
        self.emit(AccountEvent::Executed(record));

        Ok(output)
    }

    /// Deposit then dispatch, inside the caller's checkpoint.
    async fn run(
        &self,
        ctx: CallContext,
        operation: OperationType,
        request: &ExecuteRequest,
    ) -> Result<(Bytes, Option<AccountEvent>), AccountError> {
        self.substrate.transfer(ctx.caller, self.address, ctx.value)?;

        match operation {
            OperationType::Call | OperationType::StaticCall => {
                let is_static = operation == OperationType::StaticCall;
                let frame = CallFrame {
                    caller: self.address,
                    target: request.target,
                    value: request.value,
                    data: request.data.clone(),
                    is_static,
                };
                let _static_frame = is_static.then(|| StaticFrame::enter(&self.static_depth));
                let output = self.substrate.call(frame).await?;
                Ok((output, None))
            }
            OperationType::Create | OperationType::Create2 => {
                let (init_code, salt) = split_init_code(operation, request.data.as_slice());
                let frame = DeployFrame {
                    creator: self.address,
                    value: request.value,
                    init_code: Bytes::from_slice(init_code),
                    salt,
                };
                let contract = self.substrate.deploy(frame).await?;
                let event = AccountEvent::ContractCreated {
                    operation_type: operation,
                    contract,
                    value: request.value,
                    salt: salt.unwrap_or(Hash::ZERO),
                };
                Ok((Bytes::from_slice(contract.as_bytes()), Some(event)))
            }
        }
    }

    /// Copies owner and data into every open frame still lacking them.
    /// Called before any owner or data write.
    fn preserve_for_rollback(&self) {
        let mut frames = self.rollback.lock();
        if frames.iter().all(|frame| frame.state.is_some()) {
            return;
        }
        let ownership = self.ownership.read().clone();
        let data = self.data.read().clone();
        for frame in frames.iter_mut().filter(|frame| frame.state.is_none()) {
            frame.state = Some((ownership.clone(), data.clone()));
        }
    }

    /// Undoes a failed dispatch. A journal failure is logged and does not
    /// replace the dispatch error.
    fn roll_back(&self, frame: Option<RollbackFrame>, checkpoint: JournalCheckpoint) {
        if let Some(frame) = frame {
            if let Some((ownership, data)) = frame.state {
                *self.ownership.write() = ownership;
                *self.data.write() = data;
            }
            self.audit.write().rewind(frame.records);
        }
        if let Err(e) = self.substrate.revert(checkpoint) {
            warn!(error = %e, checkpoint = checkpoint.0, "Journal revert failed");
        }
    }

    fn write_entries(
        &self,
        caller: Address,
        keys: &[DataKey],
        values: &[Bytes],
    ) -> Result<(), AccountError> {
        self.ensure_owner(caller)?;
        self.ensure_writable()?;
        DataStore::check_batch(keys, values)?;

        self.preserve_for_rollback();
        self.data.write().set_batch(keys, values)?;
        self.stats.lock().data_writes += keys.len() as u64;
        debug!(entries = keys.len(), "Data written");

        for key in keys {
            self.emit(AccountEvent::DataChanged { key: *key });
        }
        Ok(())
    }

    fn change_owner(&self, caller: Address, new_owner: Address) -> Result<(), AccountError> {
        self.ensure_owner(caller)?;
        self.ensure_writable()?;
        if new_owner.is_zero() {
            return Err(AccountError::InvalidOwner(new_owner));
        }

        self.preserve_for_rollback();
        let previous = self.ownership.write().transfer(caller, new_owner)?;
        info!(previous = ?previous, new = ?new_owner, "Ownership transferred");
        self.emit(AccountEvent::OwnershipTransferred {
            previous,
            new: new_owner,
        });
        Ok(())
    }
}

impl SmartAccount<InMemorySubstrate, Secp256k1Recovery> {
    /// Account backed by a fresh in-memory world.
    pub fn in_memory(address: Address, creator: Address, config: AccountConfig) -> Self {
        let substrate = Arc::new(InMemorySubstrate::new(config.max_init_code_size));
        Self::new(address, creator, substrate, Secp256k1Recovery::new(), config)
    }
}

/// Splits deployment data into init code and optional CREATE2 salt.
/// Lengths are validated beforehand by `check_request_shape`.
fn split_init_code(operation: OperationType, data: &[u8]) -> (&[u8], Option<Hash>) {
    match operation {
        OperationType::Create2 => {
            let (code, salt) = data.split_at(data.len() - SALT_LENGTH);
            (code, Hash::from_slice(salt))
        }
        _ => (data, None),
    }
}

#[async_trait]
impl<S, R> SmartAccountApi for SmartAccount<S, R>
where
    S: ExecutionSubstrate + 'static,
    R: SignatureRecovery + 'static,
{
    fn address(&self) -> Address {
        self.address
    }

    fn owner(&self) -> Address {
        self.ownership.read().owner()
    }

    async fn execute(
        &self,
        ctx: CallContext,
        request: ExecuteRequest,
    ) -> Result<Bytes, AccountError> {
        self.dispatch_execute(ctx, request).await
    }

    fn is_valid_signature(&self, digest: &Hash, signature: &[u8]) -> MagicValue {
        let owner = self.owner();
        let check = validate_signature(
            &self.recovery,
            owner,
            digest,
            signature,
            self.config.strict_low_s,
        );

        {
            let mut stats = self.stats.lock();
            stats.signature_checks += 1;
            if check.is_valid() {
                stats.valid_signatures += 1;
            }
        }
        if let SignatureCheck::Invalid(reason) = &check {
            debug!(reason = %reason, "Signature rejected");
        }
        check.magic_value()
    }

    fn set_data(&self, caller: Address, key: DataKey, value: Bytes) -> Result<(), AccountError> {
        self.count_rejection(self.write_entries(caller, &[key], &[value]))
    }

    fn set_data_batch(
        &self,
        caller: Address,
        keys: &[DataKey],
        values: &[Bytes],
    ) -> Result<(), AccountError> {
        self.count_rejection(self.write_entries(caller, keys, values))
    }

    fn get_data(&self, key: &DataKey) -> Bytes {
        self.data.read().get(key)
    }

    fn get_data_batch(&self, keys: &[DataKey]) -> Vec<Bytes> {
        self.data.read().get_batch(keys)
    }

    fn transfer_ownership(&self, caller: Address, new_owner: Address) -> Result<(), AccountError> {
        self.count_rejection(self.change_owner(caller, new_owner))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{CallHandler, EchoHandler, LocalSigner, RevertHandler};
    use crate::domain::services::{compute_contract_address, hash_message};
    use crate::domain::value_objects::U256;
    use crate::errors::SubstrateError;
    use std::sync::OnceLock;

    const ACCOUNT: Address = Address::from_low_u64(0xACC);
    const WRITER: Address = Address::from_low_u64(0xB0B);

    fn guard_off() -> AccountConfig {
        AccountConfig {
            reentrancy_guard: false,
            ..AccountConfig::default()
        }
    }

    /// In-memory substrate whose journal refuses to revert, and optionally
    /// to commit.
    struct BrokenJournal {
        inner: InMemorySubstrate,
        fail_commit: bool,
    }

    impl BrokenJournal {
        fn new(fail_commit: bool) -> Self {
            Self {
                inner: InMemorySubstrate::new(AccountConfig::default().max_init_code_size),
                fail_commit,
            }
        }
    }

    #[async_trait]
    impl ExecutionSubstrate for BrokenJournal {
        fn checkpoint(&self) -> JournalCheckpoint {
            self.inner.checkpoint()
        }

        fn commit(&self, checkpoint: JournalCheckpoint) -> Result<(), SubstrateError> {
            if self.fail_commit {
                return Err(SubstrateError::Unavailable("journal offline".to_string()));
            }
            self.inner.commit(checkpoint)
        }

        fn revert(&self, _checkpoint: JournalCheckpoint) -> Result<(), SubstrateError> {
            Err(SubstrateError::Unavailable("journal offline".to_string()))
        }

        fn balance_of(&self, address: Address) -> U256 {
            self.inner.balance_of(address)
        }

        fn transfer(&self, from: Address, to: Address, value: U256) -> Result<(), SubstrateError> {
            self.inner.transfer(from, to, value)
        }

        async fn call(&self, frame: CallFrame) -> Result<Bytes, SubstrateError> {
            self.inner.call(frame).await
        }

        async fn deploy(&self, frame: DeployFrame) -> Result<Address, SubstrateError> {
            self.inner.deploy(frame).await
        }
    }

    /// Callee that writes one entry back into the account and notes
    /// whether the outermost rollback frame held a state copy before and
    /// after the write.
    struct NestedWriter<S: ExecutionSubstrate> {
        account: OnceLock<Arc<SmartAccount<S, Secp256k1Recovery>>>,
        key: DataKey,
        saved: Mutex<Vec<(bool, bool)>>,
    }

    impl<S: ExecutionSubstrate> NestedWriter<S> {
        fn new(key: DataKey) -> Arc<Self> {
            Arc::new(Self {
                account: OnceLock::new(),
                key,
                saved: Mutex::new(Vec::new()),
            })
        }
    }

    fn state_saved<S: ExecutionSubstrate>(account: &SmartAccount<S, Secp256k1Recovery>) -> bool {
        account
            .rollback
            .lock()
            .first()
            .is_some_and(|frame| frame.state.is_some())
    }

    #[async_trait]
    impl<S: ExecutionSubstrate + 'static> CallHandler for NestedWriter<S> {
        async fn on_call(&self, _frame: &CallFrame) -> Result<Bytes, SubstrateError> {
            let account = self
                .account
                .get()
                .ok_or_else(|| SubstrateError::Unavailable("account not bound".to_string()))?;

            let before = state_saved(account);
            account
                .set_data(account.owner(), self.key, Bytes::from_slice(&[0x55]))
                .map_err(|e| SubstrateError::Revert(e.to_string()))?;
            let after = state_saved(account);

            self.saved.lock().push((before, after));
            Ok(Bytes::new())
        }
    }

    fn create_test_account(
        owner: Address,
    ) -> SmartAccount<InMemorySubstrate, Secp256k1Recovery> {
        SmartAccount::in_memory(ACCOUNT, owner, AccountConfig::default())
    }

    fn addr(n: u64) -> Address {
        Address::from_low_u64(n)
    }

    #[tokio::test]
    async fn test_owner_call_records_and_emits() {
        let owner = addr(1);
        let account = create_test_account(owner);
        let mut events = account.subscribe();
        account.substrate().set_balance(owner, U256::from(500_000));

        let request =
            ExecuteRequest::call(addr(2), U256::from(500_000), Bytes::from_slice(&[0x11]));
        account
            .execute(CallContext::with_value(owner, U256::from(500_000)), request)
            .await
            .unwrap();

        let records = account.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].operation_type, OperationType::Call);
        assert_eq!(records[0].value, U256::from(500_000));
        assert_eq!(account.substrate().balance_of(addr(2)), U256::from(500_000));

        match events.try_recv().unwrap() {
            AccountEvent::Executed(record) => assert_eq!(record, records[0]),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_owner_rejected_without_trace() {
        let account = create_test_account(addr(1));

        let err = account
            .execute(
                CallContext::from_caller(addr(9)),
                ExecuteRequest::call(addr(2), U256::zero(), Bytes::new()),
            )
            .await
            .unwrap_err();

        assert_eq!(
            err,
            AccountError::Unauthorized {
                caller: addr(9),
                owner: addr(1)
            }
        );
        assert!(account.records().is_empty());
        assert_eq!(account.stats().rejected_calls, 1);
        assert_eq!(account.stats().failed_executions, 0);
    }

    #[tokio::test]
    async fn test_unsupported_operation() {
        let account = create_test_account(addr(1));
        let mut request = ExecuteRequest::call(addr(2), U256::zero(), Bytes::new());
        request.operation_type = U256::from(4);

        let err = account
            .execute(CallContext::from_caller(addr(1)), request)
            .await
            .unwrap_err();
        assert_eq!(err, AccountError::UnsupportedOperation(U256::from(4)));
        assert!(account.records().is_empty());
        assert_eq!(account.stats().failed_executions, 1);
    }

    #[tokio::test]
    async fn test_create_returns_address_and_orders_events() {
        let owner = addr(1);
        let account = create_test_account(owner);
        let mut events = account.subscribe();

        let output = account
            .execute(
                CallContext::from_caller(owner),
                ExecuteRequest::new(
                    OperationType::Create,
                    addr(0xDEAD),
                    U256::zero(),
                    Bytes::from_slice(&[0x60, 0x00]),
                ),
            )
            .await
            .unwrap();

        let expected = compute_contract_address(ACCOUNT, 0);
        assert_eq!(output.as_slice(), expected.as_bytes());
        assert_eq!(account.records()[0].target, addr(0xDEAD));

        assert!(matches!(
            events.try_recv().unwrap(),
            AccountEvent::ContractCreated { contract, .. } if contract == expected
        ));
        assert!(matches!(events.try_recv().unwrap(), AccountEvent::Executed(_)));
    }

    #[tokio::test]
    async fn test_failed_call_rolls_back_deposit() {
        let owner = addr(1);
        let account = create_test_account(owner);
        account.substrate().set_balance(owner, U256::from(100));
        account
            .substrate()
            .register_handler(addr(2), Arc::new(RevertHandler::new("boom")));

        let err = account
            .execute(
                CallContext::with_value(owner, U256::from(100)),
                ExecuteRequest::call(addr(2), U256::from(100), Bytes::new()),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AccountError::ExecutionReverted(_)));
        assert_eq!(account.substrate().balance_of(owner), U256::from(100));
        assert!(account.substrate().balance_of(ACCOUNT).is_zero());
        assert_eq!(account.substrate().journal_depth(), 0);
        assert!(account.records().is_empty());
    }

    #[tokio::test]
    async fn test_static_call_returns_output() {
        let owner = addr(1);
        let account = create_test_account(owner);
        account
            .substrate()
            .register_handler(addr(2), Arc::new(EchoHandler));

        let output = account
            .execute(
                CallContext::from_caller(owner),
                ExecuteRequest::static_call(addr(2), Bytes::from_slice(&[1, 2, 3])),
            )
            .await
            .unwrap();
        assert_eq!(output.as_slice(), &[1, 2, 3]);
        assert_eq!(account.records()[0].operation_type, OperationType::StaticCall);
    }

    #[test]
    fn test_signature_follows_owner() {
        let signer = LocalSigner::random();
        let other = LocalSigner::random();
        let account = create_test_account(signer.address());
        let digest = hash_message(b"Hello World");

        let sig = signer.sign_hash(&digest).unwrap();
        assert_eq!(account.is_valid_signature(&digest, &sig), MagicValue::SUCCESS);

        account
            .transfer_ownership(signer.address(), other.address())
            .unwrap();
        assert_eq!(account.is_valid_signature(&digest, &sig), MagicValue::FAILURE);
        assert_eq!(account.stats().signature_checks, 2);
        assert_eq!(account.stats().valid_signatures, 1);
    }

    #[test]
    fn test_data_writes_emit_events() {
        let owner = addr(1);
        let account = create_test_account(owner);
        let mut events = account.subscribe();
        let key = DataKey::from(hash_message(b"key"));

        account
            .set_data(owner, key, Bytes::from_slice(&[0x11, 0x22]))
            .unwrap();

        assert_eq!(account.get_data(&key).as_slice(), &[0x11, 0x22]);
        assert_eq!(
            events.try_recv().unwrap(),
            AccountEvent::DataChanged { key }
        );
        assert_eq!(account.stats().data_writes, 1);
    }

    #[test]
    fn test_split_create2_data() {
        let mut data = vec![0x60, 0x00];
        data.extend_from_slice(&[7u8; 32]);
        let (code, salt) = split_init_code(OperationType::Create2, &data);
        assert_eq!(code, &[0x60, 0x00]);
        assert_eq!(salt, Some(Hash::new([7u8; 32])));

        let (code, salt) = split_init_code(OperationType::Create, &data);
        assert_eq!(code.len(), 34);
        assert!(salt.is_none());
    }

    #[test]
    fn test_signature_check_leaves_account_untouched() {
        let signer = LocalSigner::random();
        let account = create_test_account(signer.address());
        let mut events = account.subscribe();
        let digest = hash_message(b"Hello World");
        let sig = signer.sign_hash(&digest).unwrap();

        for _ in 0..3 {
            assert_eq!(account.is_valid_signature(&digest, &sig), MagicValue::SUCCESS);
            assert_eq!(
                account.is_valid_signature(&digest, &[0u8; 65]),
                MagicValue::FAILURE
            );
        }

        assert_eq!(account.owner(), signer.address());
        assert!(account.records().is_empty());
        assert!(events.try_recv().is_err());
        assert_eq!(account.stats().signature_checks, 6);
        assert_eq!(account.stats().valid_signatures, 3);
    }

    #[tokio::test]
    async fn test_failed_journal_revert_keeps_dispatch_error() {
        let owner = addr(1);
        let substrate = Arc::new(BrokenJournal::new(false));
        substrate
            .inner
            .register_handler(addr(2), Arc::new(RevertHandler::new("boom")));
        let account = SmartAccount::new(
            ACCOUNT,
            owner,
            substrate,
            Secp256k1Recovery::new(),
            AccountConfig::default(),
        );

        let err = account
            .execute(
                CallContext::from_caller(owner),
                ExecuteRequest::call(addr(2), U256::zero(), Bytes::new()),
            )
            .await
            .unwrap_err();

        assert_eq!(
            err,
            AccountError::ExecutionReverted(SubstrateError::Revert("boom".to_string()))
        );
        assert!(account.records().is_empty());
        assert_eq!(account.stats().failed_executions, 1);
    }

    #[tokio::test]
    async fn test_failed_commit_restores_account_state() {
        let owner = addr(1);
        let key = DataKey::new([5u8; 32]);
        let substrate = Arc::new(BrokenJournal::new(true));
        let writer = NestedWriter::<BrokenJournal>::new(key);
        substrate.inner.register_handler(WRITER, writer.clone());
        let account = Arc::new(SmartAccount::new(
            ACCOUNT,
            owner,
            substrate,
            Secp256k1Recovery::new(),
            guard_off(),
        ));
        assert!(writer.account.set(account.clone()).is_ok());

        let err = account
            .execute(
                CallContext::from_caller(owner),
                ExecuteRequest::call(WRITER, U256::zero(), Bytes::new()),
            )
            .await
            .unwrap_err();

        assert_eq!(
            err,
            AccountError::ExecutionReverted(SubstrateError::Unavailable(
                "journal offline".to_string()
            ))
        );
        assert_eq!(writer.saved.lock().len(), 1);
        assert!(account.get_data(&key).is_empty());
        assert!(account.records().is_empty());
    }

    #[tokio::test]
    async fn test_unguarded_execute_copies_state_on_first_write_only() {
        let owner = addr(1);
        let key = DataKey::new([6u8; 32]);
        let account = Arc::new(SmartAccount::in_memory(ACCOUNT, owner, guard_off()));
        let writer = NestedWriter::<InMemorySubstrate>::new(key);
        account.substrate().register_handler(WRITER, writer.clone());
        assert!(writer.account.set(account.clone()).is_ok());

        // No nested write: nothing is copied and the frame is closed.
        account
            .execute(
                CallContext::from_caller(owner),
                ExecuteRequest::call(addr(2), U256::zero(), Bytes::new()),
            )
            .await
            .unwrap();
        assert!(account.rollback.lock().is_empty());

        account
            .execute(
                CallContext::from_caller(owner),
                ExecuteRequest::call(WRITER, U256::zero(), Bytes::new()),
            )
            .await
            .unwrap();

        assert_eq!(*writer.saved.lock(), vec![(false, true)]);
        assert_eq!(account.get_data(&key).as_slice(), &[0x55]);
        assert!(account.rollback.lock().is_empty());
        assert_eq!(account.records().len(), 2);
    }

    #[tokio::test]
    async fn test_guarded_execute_opens_no_rollback_frame() {
        let owner = addr(1);
        let account = create_test_account(owner);
        account
            .execute(
                CallContext::from_caller(owner),
                ExecuteRequest::call(addr(2), U256::zero(), Bytes::new()),
            )
            .await
            .unwrap();
        account
            .set_data(owner, DataKey::new([1u8; 32]), Bytes::from_slice(&[1]))
            .unwrap();
        assert!(account.rollback.lock().is_empty());
    }
}
