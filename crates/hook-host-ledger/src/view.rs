//! In-memory ledger view.
//!
//! Holds the keylet-addressed entry store, the fee and reserve schedule,
//! the owner and emitted directories, and the execution-metadata records
//! the commit engine appends. The view mutates only during the commit
//! phase; during guest execution it serves reads.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{trace, warn};

use hook_host_codec::{emplace, sf, StoBuilder};
use hook_host_common::{caps, AccountId, Hash256, Keylet};

use crate::entry;
use crate::keylet;
use crate::{LedgerError, Result};

/// A ledger view shared between the driver and the commit engine.
pub type SharedLedger = Arc<RwLock<LedgerView>>;

/// Fee and reserve schedule of the current ledger.
#[derive(Debug, Clone, Copy)]
pub struct Fees {
    /// Base transaction fee in drops.
    pub base_fee: u64,
    /// Reserve for an account with no owned objects.
    pub base_reserve: u64,
    /// Additional reserve per owner-count unit.
    pub increment_reserve: u64,
}

impl Default for Fees {
    fn default() -> Self {
        Self {
            base_fee: 10,
            base_reserve: 10_000_000,
            increment_reserve: 2_000_000,
        }
    }
}

impl Fees {
    /// The balance an account must hold at the given owner count.
    pub fn account_reserve(&self, owner_count: u32) -> u64 {
        self.base_reserve + self.increment_reserve * owner_count as u64
    }
}

/// Owner-count units consumed by `state_count` hook state entries: one
/// unit per five entries, rounded up.
pub fn reserve_units(state_count: u32) -> u32 {
    state_count.div_ceil(caps::STATE_ENTRIES_PER_RESERVE)
}

/// Transaction master: transaction id to serialized form.
#[derive(Debug, Default)]
pub struct TransactionMaster {
    txns: HashMap<Hash256, Vec<u8>>,
}

impl TransactionMaster {
    pub fn insert(&mut self, id: Hash256, serialized: Vec<u8>) {
        self.txns.insert(id, serialized);
    }

    pub fn fetch(&self, id: &Hash256) -> Option<&Vec<u8>> {
        self.txns.get(id)
    }
}

/// One hook execution's metadata record.
#[derive(Debug, Clone)]
pub struct HookExecutionMeta {
    pub result: u8,
    pub hook_hash: Hash256,
    pub account: AccountId,
    /// Exit code in the signed-to-unsigned-biased encoding.
    pub return_code: u64,
    pub return_string: Vec<u8>,
    pub instruction_count: u64,
    pub emit_count: u16,
    pub execution_index: u16,
    pub state_change_count: u16,
}

impl HookExecutionMeta {
    /// Serialize as a HookExecution object.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut b = StoBuilder::new();
        b.begin_object(sf::HOOK_EXECUTION);
        b.u16_field(sf::HOOK_EMIT_COUNT, self.emit_count);
        b.u16_field(sf::HOOK_EXECUTION_INDEX, self.execution_index);
        b.u16_field(sf::HOOK_STATE_CHANGE_COUNT, self.state_change_count);
        b.u64_field(sf::HOOK_INSTRUCTION_COUNT, self.instruction_count);
        b.u64_field(sf::HOOK_RETURN_CODE, self.return_code);
        b.hash256_field(sf::HOOK_HASH, self.hook_hash.as_bytes());
        b.vl_field(sf::HOOK_RETURN_STRING, &self.return_string);
        b.account_field(sf::HOOK_ACCOUNT, self.account.as_bytes());
        b.u8_field(sf::HOOK_RESULT, self.result);
        b.end_object();
        b.into_bytes()
    }
}

/// The in-memory ledger.
#[derive(Debug)]
pub struct LedgerView {
    /// Last validated ledger sequence.
    seq: u32,
    fees: Fees,
    entries: HashMap<Keylet, Vec<u8>>,
    txn_master: TransactionMaster,
    hook_executions: Vec<HookExecutionMeta>,
    next_execution_index: u16,
}

/// Entries a single directory page will hold.
const DIR_PAGE_CAP: usize = 1024;

impl LedgerView {
    pub fn new(seq: u32, fees: Fees) -> Self {
        Self {
            seq,
            fees,
            entries: HashMap::new(),
            txn_master: TransactionMaster::default(),
            hook_executions: Vec::new(),
            next_execution_index: 0,
        }
    }

    /// Wrap the view for sharing between driver and commit engine.
    pub fn into_shared(self) -> SharedLedger {
        Arc::new(RwLock::new(self))
    }

    /// Last validated ledger sequence.
    pub fn seq(&self) -> u32 {
        self.seq
    }

    pub fn fees(&self) -> &Fees {
        &self.fees
    }

    pub fn get(&self, keylet: &Keylet) -> Option<&Vec<u8>> {
        self.entries.get(keylet)
    }

    pub fn contains(&self, keylet: &Keylet) -> bool {
        self.entries.contains_key(keylet)
    }

    pub fn insert(&mut self, keylet: Keylet, serialized: Vec<u8>) {
        self.entries.insert(keylet, serialized);
    }

    pub fn remove(&mut self, keylet: &Keylet) -> Option<Vec<u8>> {
        self.entries.remove(keylet)
    }

    pub fn txn_master(&self) -> &TransactionMaster {
        &self.txn_master
    }

    pub fn txn_master_mut(&mut self) -> &mut TransactionMaster {
        &mut self.txn_master
    }

    /// Metadata records appended so far.
    pub fn hook_executions(&self) -> &[HookExecutionMeta] {
        &self.hook_executions
    }

    /// Hand out the next execution index and append a metadata record.
    pub fn push_hook_execution(&mut self, mut meta: HookExecutionMeta) -> u16 {
        let index = self.next_execution_index;
        self.next_execution_index = self.next_execution_index.wrapping_add(1);
        meta.execution_index = index;
        self.hook_executions.push(meta);
        index
    }

    /// Append `key` to a directory, creating the node on first use.
    /// Returns the page the key landed on.
    pub fn dir_add(&mut self, dir: &Keylet, key: Hash256) -> Result<u64> {
        let mut keys = match self.entries.get(dir) {
            Some(node) => entry::directory_keys(node),
            None => Vec::new(),
        };
        if keys.len() >= DIR_PAGE_CAP {
            return Err(LedgerError::DirectoryFull);
        }
        if !keys.contains(&key) {
            keys.push(key);
        }
        self.entries.insert(*dir, entry::directory(&keys, 0));
        Ok(0)
    }

    /// Remove `key` from a directory, deleting the node when it empties.
    pub fn dir_remove(&mut self, dir: &Keylet, key: &Hash256) -> Result<()> {
        let Some(node) = self.entries.get(dir) else {
            return Err(LedgerError::BadLedger("directory node missing"));
        };
        let mut keys = entry::directory_keys(node);
        let before = keys.len();
        keys.retain(|k| k != key);
        if keys.len() == before {
            return Err(LedgerError::BadLedger("key not in directory"));
        }
        if keys.is_empty() {
            self.entries.remove(dir);
        } else {
            self.entries.insert(*dir, entry::directory(&keys, 0));
        }
        Ok(())
    }

    /// Overwrite a u32 field of a stored entry.
    fn update_entry_u32(&mut self, keylet: &Keylet, field: u32, value: u32) -> Result<()> {
        let current = self
            .entries
            .get(keylet)
            .ok_or(LedgerError::Internal("entry vanished during update"))?;
        let mut fb = StoBuilder::new();
        fb.u32_field(field, value);
        let updated = emplace(current, &fb.into_bytes(), field)
            .map_err(|_| LedgerError::BadLedger("entry failed to reparse"))?;
        self.entries.insert(*keylet, updated);
        Ok(())
    }

    /// Adjust an account's owner count by `delta` units.
    fn adjust_owner_count(&mut self, account: &AccountId, delta: i32) -> Result<()> {
        let account_keylet = keylet::account(account);
        let entry_bytes = self
            .entries
            .get(&account_keylet)
            .ok_or(LedgerError::Internal("account root missing"))?;
        let current = entry::read_u32(entry_bytes, sf::OWNER_COUNT).unwrap_or(0);
        let updated = current.saturating_add_signed(delta);
        self.update_entry_u32(&account_keylet, sf::OWNER_COUNT, updated)
    }

    /// Write through one hook state change: create, overwrite or (for an
    /// empty blob) delete the state entry, maintaining the owner
    /// directory, the hook's state count and the account reserve.
    pub fn set_hook_state(&mut self, owner: &AccountId, key: &Hash256, data: &[u8]) -> Result<()> {
        let account_keylet = keylet::account(owner);
        let hook_keylet = keylet::hook(owner);
        let owner_dir = keylet::owner_dir(owner);
        let state_keylet = keylet::hook_state(owner, key);

        if !self.entries.contains_key(&account_keylet) {
            return Err(LedgerError::Internal("account root missing"));
        }
        let Some(hook_entry) = self.entries.get(&hook_keylet) else {
            warn!(account = %owner, "state write for an account with no hook installed");
            return Err(LedgerError::Internal("hook entry missing"));
        };

        let data_max = entry::read_u32(hook_entry, sf::HOOK_STATE_DATA_MAX_SIZE)
            .unwrap_or(caps::HOOK_STATE_DATA_MAX);
        if data.len() > data_max as usize {
            return Err(LedgerError::StateDataTooLarge);
        }

        let state_count = entry::read_u32(hook_entry, sf::HOOK_STATE_COUNT).unwrap_or(0);
        let old_reserve = reserve_units(state_count);
        let old_state = self.entries.get(&state_keylet).cloned();

        if data.is_empty() {
            // delete; removing an absent entry counts as success
            if old_state.is_none() {
                return Ok(());
            }
            self.dir_remove(&owner_dir, &state_keylet.key)?;
            self.entries.remove(&state_keylet);

            let new_count = state_count.saturating_sub(1);
            if reserve_units(new_count) < old_reserve {
                self.adjust_owner_count(owner, -1)?;
            }
            // NB: the count field takes the reserve-unit value here, not
            // the decremented count; longstanding behavior the rest of
            // the system accounts for
            self.update_entry_u32(&hook_keylet, sf::HOOK_STATE_COUNT, reserve_units(new_count))?;
            trace!(account = %owner, key = %key, "deleted hook state");
            return Ok(());
        }

        if old_state.is_none() {
            let new_count = state_count + 1;
            if reserve_units(new_count) > old_reserve {
                // the state allotment for the current owner count is
                // exhausted; charge another reserve unit
                let account_entry = self
                    .entries
                    .get(&account_keylet)
                    .ok_or(LedgerError::Internal("account root missing"))?;
                let owner_count = entry::read_u32(account_entry, sf::OWNER_COUNT).unwrap_or(0);
                let balance = entry::read_drops(account_entry, sf::BALANCE).unwrap_or(0);
                if balance < self.fees.account_reserve(owner_count + 1) {
                    return Err(LedgerError::InsufficientReserve);
                }
                self.adjust_owner_count(owner, 1)?;
            }
            self.update_entry_u32(&hook_keylet, sf::HOOK_STATE_COUNT, new_count)?;
        }

        let page = if old_state.is_none() {
            self.dir_add(&owner_dir, state_keylet.key)?
        } else {
            0
        };
        self.entries
            .insert(state_keylet, entry::hook_state(owner, key, data, page));
        trace!(account = %owner, key = %key, len = data.len(), "wrote hook state");
        Ok(())
    }

    /// Read a hook state blob.
    pub fn get_hook_state(&self, owner: &AccountId, key: &Hash256) -> Option<Vec<u8>> {
        let state_keylet = keylet::hook_state(owner, key);
        let entry_bytes = self.entries.get(&state_keylet)?;
        entry::read_vl(entry_bytes, sf::HOOK_STATE_DATA)
    }

    /// Insert an emitted transaction into the emitted directory. Returns
    /// false when an entry for the id already exists.
    pub fn insert_emitted_txn(&mut self, txn_id: &Hash256, serialized: &[u8]) -> Result<bool> {
        let emitted_keylet = keylet::emitted(txn_id);
        if self.entries.contains_key(&emitted_keylet) {
            return Ok(false);
        }
        let page = self.dir_add(&keylet::emitted_dir(), emitted_keylet.key)?;
        self.entries
            .insert(emitted_keylet, entry::emitted_txn(serialized, page));
        Ok(true)
    }

    /// Remove an emitted transaction entry. Returns false when no entry
    /// exists for the id.
    pub fn remove_emitted_txn(&mut self, txn_id: &Hash256) -> Result<bool> {
        let emitted_keylet = keylet::emitted(txn_id);
        if !self.entries.contains_key(&emitted_keylet) {
            return Ok(false);
        }
        self.dir_remove(&keylet::emitted_dir(), &emitted_keylet.key)?;
        self.entries.remove(&emitted_keylet);
        Ok(true)
    }

    /// Number of entries in the emitted directory.
    pub fn emitted_dir_len(&self) -> usize {
        self.entries
            .get(&keylet::emitted_dir())
            .map(|node| entry::directory_keys(node).len())
            .unwrap_or(0)
    }
}
