//! Per-invocation state.
//!
//! One [`HookContext`] exists per hook run. It is built by the driver,
//! mutated through host calls while the guest executes, consumed by the
//! commit engine and then discarded; nothing in it survives the
//! invocation except what commit writes to the ledger.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use hook_host_codec::{parse_field_at, types, ParsedField};
use hook_host_common::{caps, AccountId, Hash256};
use hook_host_crypto::sha512h_parts;
use hook_host_ledger::SharedLedger;

use crate::config::HookHostConfig;
use crate::otxn::OtxnFrame;

/// Hash prefix for emit nonces.
const NONCE_PREFIX: [u8; 4] = *b"ETN\0";

/// How a hook run terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitType {
    /// The guest trapped, ran out of fuel, or the module was unusable.
    WasmError = 0,
    /// The guest rolled the originating transaction back.
    Rollback = 1,
    /// The guest accepted; staged effects apply.
    Accept = 2,
}

/// Terminal state of an invocation.
#[derive(Debug, Clone)]
pub struct ExitState {
    pub exit_type: ExitType,
    pub code: i64,
    pub reason: String,
    /// Set by `accept`/`rollback`/guard violation; tells the driver the
    /// termination was requested rather than a fault.
    pub complete: bool,
}

impl Default for ExitState {
    fn default() -> Self {
        // a hook that never reaches accept() rolls back
        Self {
            exit_type: ExitType::Rollback,
            code: -1,
            reason: String::new(),
            complete: false,
        }
    }
}

/// What a slot's entry reference points at inside its storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryRef {
    /// The whole object: a bare field sequence.
    Root,
    /// One field, by the offset of its preamble.
    Field { start: usize },
}

/// A slot: an owned serialized object plus a position inside it.
#[derive(Debug, Clone)]
pub struct SlotEntry {
    /// The identifier the slot was loaded under (32-byte txn id or
    /// 34-byte keylet).
    pub id: Vec<u8>,
    /// The owning serialized object.
    pub storage: Arc<[u8]>,
    /// Current position.
    pub entry: EntryRef,
}

impl SlotEntry {
    pub fn root(id: Vec<u8>, storage: Arc<[u8]>) -> Self {
        Self {
            id,
            storage,
            entry: EntryRef::Root,
        }
    }

    /// Parse the current entry when it is a single field.
    pub fn parsed(&self) -> Option<ParsedField> {
        match self.entry {
            EntryRef::Root => None,
            EntryRef::Field { start } => parse_field_at(&self.storage, start).ok(),
        }
    }

    /// The bytes a drill-down operation searches: the whole storage for a
    /// root, the payload for a field entry.
    pub fn search_region(&self) -> Option<(usize, &[u8])> {
        match self.entry {
            EntryRef::Root => Some((0, &self.storage)),
            EntryRef::Field { .. } => {
                let field = self.parsed()?;
                let end = field.payload_start + field.payload_len;
                Some((field.payload_start, &self.storage[field.payload_start..end]))
            }
        }
    }

    /// The serialized value of the entry: the full sequence for a root;
    /// for a field, its payload — with the VL length prefix retained for
    /// variable-length types (the account-id prefix strip happens at the
    /// ABI boundary).
    pub fn value(&self) -> Option<Vec<u8>> {
        match self.entry {
            EntryRef::Root => Some(self.storage.to_vec()),
            EntryRef::Field { .. } => {
                let field = self.parsed()?;
                let payload =
                    &self.storage[field.payload_start..field.payload_start + field.payload_len];
                if types::is_vl(field.type_code) {
                    let mut out = hook_host_codec::encode_vl(payload.len());
                    out.extend_from_slice(payload);
                    Some(out)
                } else {
                    Some(payload.to_vec())
                }
            }
        }
    }

    /// Type code of the current entry; objects for roots.
    pub fn type_code(&self) -> u8 {
        match self.parsed() {
            None => types::OBJECT,
            Some(field) => field.type_code,
        }
    }
}

/// A staged state-cache value.
pub type StateCacheEntry = (bool, Vec<u8>);

/// One validated transaction awaiting emission.
#[derive(Debug, Clone)]
pub struct EmittedTxn {
    pub id: Hash256,
    pub serialized: Vec<u8>,
}

/// The mutable state of a single hook invocation.
#[derive(Debug)]
pub struct HookContext {
    pub hook_account: AccountId,
    pub hook_hash: Hash256,
    pub hook_set_txn_id: Hash256,
    pub otxn: OtxnFrame,
    pub ledger: SharedLedger,
    pub config: HookHostConfig,

    slots: HashMap<u32, SlotEntry>,
    slot_free: VecDeque<u32>,
    slot_counter: u32,

    /// key → (modified, blob); BTreeMap so commit order is deterministic.
    pub state_cache: BTreeMap<Hash256, StateCacheEntry>,
    pub emitted: Vec<EmittedTxn>,
    pub nonces_used: HashSet<Hash256>,
    nonce_counter: u32,
    /// -1 until `etxn_reserve`.
    pub expected_etxn_count: i64,
    /// Cached `fee_base × burden`; 0 until first computed.
    pub fee_base: u64,
    burden: Option<u64>,
    generation: Option<u32>,
    pub guard_map: HashMap<u32, u32>,

    pub exit: ExitState,
    pub instruction_count: u64,
}

impl HookContext {
    pub fn new(
        hook_account: AccountId,
        hook_hash: Hash256,
        hook_set_txn_id: Hash256,
        otxn: OtxnFrame,
        ledger: SharedLedger,
        config: HookHostConfig,
    ) -> Self {
        Self {
            hook_account,
            hook_hash,
            hook_set_txn_id,
            otxn,
            ledger,
            config,
            slots: HashMap::new(),
            slot_free: VecDeque::new(),
            slot_counter: 1,
            state_cache: BTreeMap::new(),
            emitted: Vec::new(),
            nonces_used: HashSet::new(),
            nonce_counter: 0,
            expected_etxn_count: -1,
            fee_base: 0,
            burden: None,
            generation: None,
            guard_map: HashMap::new(),
            exit: ExitState::default(),
            instruction_count: 0,
        }
    }

    // --- slot table ---------------------------------------------------

    /// Whether no handle can be produced for an "any slot" request.
    pub fn no_free_slots(&self) -> bool {
        // strict: the counter sits one past the last minted handle
        self.slot_counter > caps::MAX_SLOTS && self.slot_free.is_empty()
    }

    /// Take a handle: reuse a freed one, else mint the next.
    pub fn take_free_slot(&mut self) -> u32 {
        if let Some(slot) = self.slot_free.pop_front() {
            return slot;
        }
        let slot = self.slot_counter;
        self.slot_counter += 1;
        slot
    }

    pub fn slot(&self, handle: u32) -> Option<&SlotEntry> {
        self.slots.get(&handle)
    }

    pub fn put_slot(&mut self, handle: u32, entry: SlotEntry) {
        self.slots.insert(handle, entry);
    }

    /// Drop a slot and queue its handle for reuse.
    pub fn clear_slot(&mut self, handle: u32) -> bool {
        if self.slots.remove(&handle).is_some() {
            self.slot_free.push_back(handle);
            true
        } else {
            false
        }
    }

    pub fn slot_count_live(&self) -> usize {
        self.slots.len()
    }

    // --- lineage ------------------------------------------------------

    /// Burden of the originating transaction, cached per invocation.
    pub fn otxn_burden(&mut self) -> u64 {
        if let Some(burden) = self.burden {
            return burden;
        }
        let burden = self.otxn.burden();
        self.burden = Some(burden);
        burden
    }

    /// Generation of the originating transaction, cached per invocation.
    pub fn otxn_generation(&mut self) -> u32 {
        if let Some(generation) = self.generation {
            return generation;
        }
        let generation = self.otxn.generation();
        self.generation = Some(generation);
        generation
    }

    // --- nonces -------------------------------------------------------

    /// Draw the next deterministic nonce, or None past the cap.
    pub fn next_nonce(&mut self) -> Option<Hash256> {
        if self.nonce_counter > caps::MAX_NONCE {
            return None;
        }
        let counter = self.nonce_counter;
        self.nonce_counter += 1;
        let hash = Hash256(sha512h_parts(&[
            &NONCE_PREFIX,
            self.otxn.id().as_bytes(),
            &counter.to_be_bytes(),
            self.hook_account.as_bytes(),
        ]));
        self.nonces_used.insert(hash);
        Some(hash)
    }

    // --- exit ---------------------------------------------------------

    /// Record a requested termination.
    pub fn set_exit(&mut self, exit_type: ExitType, code: i64, reason: String) {
        self.exit.exit_type = exit_type;
        self.exit.code = code;
        self.exit.reason = reason;
        self.exit.complete = true;
    }
}

/// Left-zero-pad a 1..=32 byte key to the canonical 32-byte form.
pub fn make_state_key(source: &[u8]) -> Option<Hash256> {
    if source.is_empty() || source.len() > caps::STATE_KEY_LEN {
        return None;
    }
    let mut key = [0u8; 32];
    key[32 - source.len()..].copy_from_slice(source);
    Some(Hash256(key))
}
