//! Sharded global symbol table.
//!
//! Interning maps a name to the one symbol allocation that owns it, so
//! that identity equality (the cheap kind) coincides with name equality
//! for all interned symbols. Worker threads intern concurrently; the
//! table is sharded with per-shard read/write locks so the hot read path
//! (the name already exists) takes a shared lock only.

use crate::symbol::Symbol;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shard count. 16 keeps contention negligible for a handful of worker
/// threads without wasting lock words.
const NUM_SHARDS: usize = 16;

#[derive(Default)]
struct Shard {
    map: FxHashMap<Arc<str>, Symbol>,
}

/// The symbol table: name to interned symbol, lookup-or-create.
pub struct SymbolTable {
    shards: [RwLock<Shard>; NUM_SHARDS],
    /// Total interned count across shards, for O(1) `len`.
    total_count: AtomicUsize,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable {
            shards: std::array::from_fn(|_| RwLock::new(Shard::default())),
            total_count: AtomicUsize::new(0),
        }
    }

    /// Compute the shard for a name from its leading bytes.
    #[inline]
    fn shard_for(name: &str) -> usize {
        let mut hash = 0u32;
        for byte in name.bytes().take(8) {
            hash = hash.wrapping_mul(31).wrapping_add(u32::from(byte));
        }
        (hash as usize) % NUM_SHARDS
    }

    /// Return the symbol interned under `name`, creating it on first use.
    pub fn intern(&self, name: &str) -> Symbol {
        let shard = &self.shards[Self::shard_for(name)];

        // Fast path: the name is already interned.
        {
            let guard = shard.read();
            if let Some(symbol) = guard.map.get(name) {
                return symbol.clone();
            }
        }

        let mut guard = shard.write();

        // Double-check after taking the write lock; another thread may
        // have interned the name in between.
        if let Some(symbol) = guard.map.get(name) {
            return symbol.clone();
        }

        let symbol = Symbol::new(name);
        guard.map.insert(symbol.name_arc(), symbol.clone());
        self.total_count.fetch_add(1, Ordering::Relaxed);
        symbol
    }

    /// Look a name up without creating it.
    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        let shard = self.shards[Self::shard_for(name)].read();
        shard.map.get(name).cloned()
    }

    /// Number of interned symbols.
    pub fn len(&self) -> usize {
        self.total_count.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all interned symbols, in no particular order.
    pub fn symbols(&self) -> Vec<Symbol> {
        let mut out = Vec::with_capacity(self.len());
        for shard in &self.shards {
            out.extend(shard.read().map.values().cloned());
        }
        out
    }

    /// Drop every interned symbol. Symbols still referenced from live
    /// expressions stay alive through those references but lose their
    /// table identity: interning the same name again creates a distinct
    /// symbol.
    pub fn clear(&self) {
        let mut dropped = 0usize;
        for shard in &self.shards {
            let mut guard = shard.write();
            dropped += guard.map.len();
            guard.map.clear();
        }
        self.total_count.fetch_sub(dropped, Ordering::Relaxed);
        tracing::debug!(dropped, "symbol table cleared");
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}
