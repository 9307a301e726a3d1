//! Work-list of named types awaiting emission by the forward compiler.

use std::collections::{HashMap, VecDeque};

use serde::Serialize;

use crate::error::BridgeError;
use crate::types::{ObjectType, TypeName};

/// Why a named type is in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Necessity {
    /// Explicitly requested by the caller. Failures abort the run.
    Required,
    /// Reached transitively. Failures are logged and the type is skipped.
    Discovered,
}

/// One pending named type.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub key: TypeName,
    /// External name assigned by the name registry.
    pub name: String,
    pub object: ObjectType,
    pub necessity: Necessity,
}

/// A discovered type that could not be compiled.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedType {
    pub key: String,
    pub name: String,
    /// Validator that references to this type still point at.
    pub validator_name: String,
    pub kind: &'static str,
    pub reason: String,
}

impl SkippedType {
    pub(crate) fn new(entry: &QueueEntry, validator_name: String, error: &BridgeError) -> Self {
        Self {
            key: entry.key.to_string(),
            name: entry.name.clone(),
            validator_name,
            kind: error.kind(),
            reason: error.to_string(),
        }
    }
}

/// FIFO of named types with a seen-set, so each type is emitted once.
///
/// Entries are pushed while other entries are being compiled; consumers
/// must drain it with `while let Some(entry) = queue.pop()`.
#[derive(Debug, Default)]
pub struct ConversionQueue {
    pending: VecDeque<QueueEntry>,
    seen: HashMap<TypeName, Necessity>,
}

impl ConversionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a type unless it was already enqueued or emitted.
    ///
    /// Requesting a type that is still pending as `Discovered` upgrades it
    /// to `Required`. Returns true if a new entry was added.
    pub fn push(&mut self, entry: QueueEntry) -> bool {
        match self.seen.get(&entry.key) {
            None => {
                self.seen.insert(entry.key.clone(), entry.necessity);
                self.pending.push_back(entry);
                true
            }
            Some(Necessity::Discovered) if entry.necessity == Necessity::Required => {
                self.seen.insert(entry.key.clone(), Necessity::Required);
                if let Some(pending) = self.pending.iter_mut().find(|e| e.key == entry.key) {
                    pending.necessity = Necessity::Required;
                }
                false
            }
            Some(_) => false,
        }
    }

    pub fn pop(&mut self) -> Option<QueueEntry> {
        self.pending.pop_front()
    }

    /// True if the type was ever enqueued during this invocation.
    pub fn contains(&self, key: &TypeName) -> bool {
        self.seen.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}
