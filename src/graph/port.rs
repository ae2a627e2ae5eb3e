//! Typed ports for graph nodes.
//!
//! Nodes exchange data through ports: an `Outport` holds a value cached
//! during node evaluation and may feed any number of `Inport`s; an
//! `Inport` reads through its single connection. Flow-kinded ports carry
//! no values and only define the control-flow chain.
//!
//! ## The `Missing` sentinel
//!
//! An unconnected or invalid port reads as [`PortValue::Missing`], which
//! refuses every conversion, and [`PortKind::Missing`] refuses every
//! connection. This keeps absent data from being silently computed with:
//! downstream code sees `None` from every accessor instead of a default.
//!
//! ## PortValue Types
//!
//! - `Int`: Numbers (damage, cost, counts)
//! - `Bool`: Flags
//! - `Text`: Strings (labels, keys)
//! - `IntList`: Number lists
//! - `OwnerList`: Stat-owner references (selected targets)

use serde::{Deserialize, Serialize};

use crate::stats::OwnerId;

/// The kind of data a port carries.
///
/// Connection compatibility is exact-kind equality; `Flow` ports connect
/// only to `Flow` ports and define the `Next` chain rather than carrying
/// values. `Missing` never connects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortKind {
    /// Control-flow edge, no value.
    Flow,
    /// Integer value.
    Int,
    /// Boolean flag.
    Bool,
    /// Text value.
    Text,
    /// List of integers.
    IntList,
    /// List of stat-owner references.
    OwnerList,
    /// Invalid/unknown port. Refuses all connections.
    Missing,
}

impl PortKind {
    /// Check whether an outport of this kind may connect to an inport of
    /// `other`.
    #[must_use]
    pub fn can_connect(self, other: PortKind) -> bool {
        self != PortKind::Missing && other != PortKind::Missing && self == other
    }

    /// Flow ports carry no value and get no value slot.
    #[must_use]
    pub fn carries_value(self) -> bool {
        !matches!(self, PortKind::Flow | PortKind::Missing)
    }
}

/// A value flowing through a port.
///
/// `Missing` is the typed sentinel for absent data: every accessor
/// returns `None` for it, so callers cannot accidentally treat an
/// unconnected port as zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortValue {
    /// No value. Produced by unconnected ports and evaluation failures.
    Missing,
    /// Integer value.
    Int(i64),
    /// Boolean flag.
    Bool(bool),
    /// Text value.
    Text(String),
    /// List of integers.
    IntList(Vec<i64>),
    /// List of stat-owner references (e.g. selected targets).
    OwnerList(Vec<OwnerId>),
}

impl PortValue {
    /// The kind of this value. `Missing` values have the `Missing` kind.
    #[must_use]
    pub fn kind(&self) -> PortKind {
        match self {
            PortValue::Missing => PortKind::Missing,
            PortValue::Int(_) => PortKind::Int,
            PortValue::Bool(_) => PortKind::Bool,
            PortValue::Text(_) => PortKind::Text,
            PortValue::IntList(_) => PortKind::IntList,
            PortValue::OwnerList(_) => PortKind::OwnerList,
        }
    }

    /// Check for the missing sentinel.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, PortValue::Missing)
    }

    /// Get as integer if this is an Int value.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PortValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as bool if this is a Bool value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PortValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as string reference if this is a Text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PortValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get as int list reference if this is an IntList value.
    #[must_use]
    pub fn as_int_list(&self) -> Option<&[i64]> {
        match self {
            PortValue::IntList(v) => Some(v),
            _ => None,
        }
    }

    /// Get as owner list reference if this is an OwnerList value.
    #[must_use]
    pub fn as_owner_list(&self) -> Option<&[OwnerId]> {
        match self {
            PortValue::OwnerList(v) => Some(v),
            _ => None,
        }
    }
}

// Convenient From implementations
impl From<i64> for PortValue {
    fn from(v: i64) -> Self {
        PortValue::Int(v)
    }
}

impl From<i32> for PortValue {
    fn from(v: i32) -> Self {
        PortValue::Int(v as i64)
    }
}

impl From<bool> for PortValue {
    fn from(v: bool) -> Self {
        PortValue::Bool(v)
    }
}

impl From<String> for PortValue {
    fn from(v: String) -> Self {
        PortValue::Text(v)
    }
}

impl From<&str> for PortValue {
    fn from(v: &str) -> Self {
        PortValue::Text(v.to_string())
    }
}

impl From<Vec<i64>> for PortValue {
    fn from(v: Vec<i64>) -> Self {
        PortValue::IntList(v)
    }
}

impl From<Vec<OwnerId>> for PortValue {
    fn from(v: Vec<OwnerId>) -> Self {
        PortValue::OwnerList(v)
    }
}

/// Reference to an outport's cached value slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutportRef {
    /// The node owning the outport.
    pub node: super::NodeId,
    /// Dense index into the instance's [`PortStore`].
    pub slot: usize,
}

/// An input port declared on a node.
///
/// Reads through at most one connection; unconnected inports read as
/// `Missing`. Flow-kinded inports are pure link targets and never carry
/// a source.
#[derive(Clone, Debug)]
pub struct Inport {
    pub(crate) name: String,
    pub(crate) kind: PortKind,
    pub(crate) source: Option<OutportRef>,
}

impl Inport {
    /// Port name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Port kind.
    #[must_use]
    pub fn kind(&self) -> PortKind {
        self.kind
    }

    /// The resolved connection, if any.
    #[must_use]
    pub fn source(&self) -> Option<OutportRef> {
        self.source
    }
}

/// An output port declared on a node.
///
/// Holds a cached value set during node evaluation; may feed any number
/// of inports. Flow-kinded outports have no value slot.
#[derive(Clone, Debug)]
pub struct Outport {
    pub(crate) name: String,
    pub(crate) kind: PortKind,
    pub(crate) slot: Option<usize>,
}

impl Outport {
    /// Port name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Port kind.
    #[must_use]
    pub fn kind(&self) -> PortKind {
        self.kind
    }

    /// Dense value-slot index. `None` for flow outports.
    #[must_use]
    pub fn slot(&self) -> Option<usize> {
        self.slot
    }
}

/// Per-instance cache of outport values.
///
/// One slot per value-carrying outport in the graph, indexed densely in
/// declaration order. All slots read `Missing` until the owning node
/// evaluates; the store is cleared at the start of every run.
#[derive(Clone, Debug)]
pub struct PortStore {
    slots: Vec<PortValue>,
}

impl PortStore {
    pub(crate) fn new(slot_count: usize) -> Self {
        Self {
            slots: vec![PortValue::Missing; slot_count],
        }
    }

    pub(crate) fn get(&self, slot: usize) -> &PortValue {
        static MISSING: PortValue = PortValue::Missing;
        self.slots.get(slot).unwrap_or(&MISSING)
    }

    pub(crate) fn set(&mut self, slot: usize, value: PortValue) {
        if let Some(entry) = self.slots.get_mut(slot) {
            *entry = value;
        }
    }

    pub(crate) fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = PortValue::Missing;
        }
    }
}
