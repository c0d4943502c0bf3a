//! Shared propagation context.
//!
//! A [`SharedData`] is a key/value store that travels alongside a promise
//! chain independently of the values flowing through `then`. Every promise
//! derived from a promise carrying a context holds a handle to the same
//! store. When two independently created contexts meet, [`SharedData::merge`]
//! folds the secondary store into the primary one and forwards the secondary
//! handle, so both sides observe one logical context from then on.
//!
//! Writes are governed by two independent axes:
//!
//! - [`Scenario`]: overwrite (last write wins), write-once (first write wins)
//!   or merge (writes accumulate in order under the key).
//! - [`StoreKind`]: arbitrary keys, or only the keys declared with
//!   [`SharedData::set_map`].
//!
//! A `null` value is never stored.

mod key;

pub use key::DataKey;

use core::fmt;
use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;

use crate::tracing_compat::{trace, warn};

/// Write semantics for repeated writes to one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Last write wins.
    #[default]
    Overwrite,
    /// First write wins; later writes are ignored.
    WriteOnce,
    /// Writes accumulate into an ordered list.
    Merge,
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overwrite => write!(f, "overwrite"),
            Self::WriteOnce => write!(f, "write_once"),
            Self::Merge => write!(f, "merge"),
        }
    }
}

impl FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overwrite" | "write_overwrite" => Ok(Self::Overwrite),
            "write_once" | "write-once" | "once" => Ok(Self::WriteOnce),
            "merge" | "write_merge" => Ok(Self::Merge),
            other => Err(format!("unknown shared-data scenario: {other}")),
        }
    }
}

/// Which keys a context accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// Any key is accepted.
    #[default]
    Arbitrary,
    /// Only keys declared through `set_map` are accepted.
    DefinedOnly,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arbitrary => write!(f, "arbitrary"),
            Self::DefinedOnly => write!(f, "defined"),
        }
    }
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arbitrary" => Ok(Self::Arbitrary),
            "defined" | "defined_only" | "defined-only" => Ok(Self::DefinedOnly),
            other => Err(format!("unknown shared-data kind: {other}")),
        }
    }
}

/// A stored value: a single write, or the accumulated writes of the merge scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entry {
    /// One value.
    Single(Value),
    /// Values accumulated in write order.
    Merged(Vec<Value>),
}

impl Entry {
    /// Returns the observable value: merged entries read as an array.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Single(v) => v.clone(),
            Self::Merged(values) => Value::Array(values.clone()),
        }
    }

    /// Returns every value written under this entry, in write order.
    #[must_use]
    pub fn values(&self) -> Vec<Value> {
        match self {
            Self::Single(v) => vec![v.clone()],
            Self::Merged(values) => values.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct Store {
    entries: SmallVec<[(DataKey, Entry); 4]>,
    declared: Vec<DataKey>,
    scenario: Scenario,
    kind: StoreKind,
}

impl Store {
    fn position(&self, key: &DataKey) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    fn accepts(&self, key: &DataKey) -> bool {
        match self.kind {
            StoreKind::Arbitrary => true,
            StoreKind::DefinedOnly => self.declared.contains(key),
        }
    }

    fn write(&mut self, key: DataKey, value: Value) -> bool {
        if value.is_null() {
            return false;
        }
        if !self.accepts(&key) {
            warn!(key = %key, "dropping write to undeclared shared-data key");
            return false;
        }
        let Some(idx) = self.position(&key) else {
            self.entries.push((key, Entry::Single(value)));
            return true;
        };
        let slot = &mut self.entries[idx].1;
        match self.scenario {
            Scenario::Overwrite => {
                *slot = Entry::Single(value);
                true
            }
            Scenario::WriteOnce => false,
            Scenario::Merge => {
                match slot {
                    Entry::Single(previous) => {
                        let previous = std::mem::take(previous);
                        *slot = Entry::Merged(vec![previous, value]);
                    }
                    Entry::Merged(values) => values.push(value),
                }
                true
            }
        }
    }
    /// Writes a whole entry of another context under `key`.
    ///
    /// The scenario applies once for the key: overwrite replaces the entry,
    /// write-once keeps an existing one and merge appends its values.
    fn write_entry(&mut self, key: DataKey, entry: Entry) -> bool {
        if !self.accepts(&key) {
            warn!(key = %key, "dropping merged entry for undeclared shared-data key");
            return false;
        }
        let Some(idx) = self.position(&key) else {
            self.entries.push((key, entry));
            return true;
        };
        let slot = &mut self.entries[idx].1;
        match self.scenario {
            Scenario::Overwrite => {
                *slot = entry;
                true
            }
            Scenario::WriteOnce => false,
            Scenario::Merge => {
                let mut values = slot.values();
                values.extend(entry.values());
                *slot = Entry::Merged(values);
                true
            }
        }
    }
}

#[derive(Debug)]
struct Node {
    /// Set once this context has been merged into another one.
    forward: Option<SharedData>,
    store: Store,
}

/// Handle to a shared propagation context.
///
/// Cloning the handle shares the store. Handles are `!Send`; the engine is
/// single-threaded.
#[derive(Clone)]
pub struct SharedData {
    node: Rc<RefCell<Node>>,
}

impl SharedData {
    /// Creates an empty context using the scenario and kind of the current
    /// engine configuration.
    #[must_use]
    pub fn new() -> Self {
        let config = crate::config::current();
        let data = Self::with_options(config.shared_scenario, config.shared_kind);
        if config.shared_kind == StoreKind::DefinedOnly {
            data.with_store_mut(|store| {
                store.declared = config.shared_keys.into_iter().map(DataKey::from).collect();
            });
        }
        data
    }

    /// Creates an empty context with explicit write semantics.
    #[must_use]
    pub fn with_options(scenario: Scenario, kind: StoreKind) -> Self {
        Self {
            node: Rc::new(RefCell::new(Node {
                forward: None,
                store: Store {
                    scenario,
                    kind,
                    ..Store::default()
                },
            })),
        }
    }

    /// Creates a defined-only context accepting exactly `keys`.
    #[must_use]
    pub fn defined<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<DataKey>,
    {
        let data = Self::with_options(Scenario::Overwrite, StoreKind::DefinedOnly);
        data.set_map(keys);
        data
    }

    /// Follows forwarding links to the handle that owns the store.
    fn root(&self) -> Self {
        let mut current = self.clone();
        loop {
            let next = current.node.borrow().forward.clone();
            match next {
                Some(next) => current = next,
                None => break,
            }
        }
        if !Rc::ptr_eq(&current.node, &self.node) {
            // Path compression: point directly at the root.
            self.node.borrow_mut().forward = Some(current.clone());
        }
        current
    }

    fn with_store<R>(&self, f: impl FnOnce(&Store) -> R) -> R {
        let root = self.root();
        let node = root.node.borrow();
        f(&node.store)
    }

    fn with_store_mut<R>(&self, f: impl FnOnce(&mut Store) -> R) -> R {
        let root = self.root();
        let mut node = root.node.borrow_mut();
        f(&mut node.store)
    }

    /// Returns true when both handles observe the same logical context.
    #[must_use]
    pub fn same_context(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.root().node, &other.root().node)
    }

    /// Writes `value` under `key` following the current scenario.
    ///
    /// Returns whether the write changed the context. `null` values, writes
    /// ignored by write-once and writes to undeclared keys of a defined-only
    /// context return `false`.
    pub fn add(&self, key: impl Into<DataKey>, value: impl Into<Value>) -> bool {
        let key = key.into();
        let value = value.into();
        trace!(key = %key, "shared-data write");
        self.with_store_mut(|store| store.write(key, value))
    }

    /// Serializes `value` and writes it under `key`.
    pub fn add_serialized<V: Serialize + ?Sized>(
        &self,
        key: impl Into<DataKey>,
        value: &V,
    ) -> Result<bool, serde_json::Error> {
        let value = serde_json::to_value(value)?;
        Ok(self.add(key, value))
    }

    /// Writes a structured value under a key derived from its type.
    pub fn add_object<V: Serialize>(&self, value: &V) -> Result<bool, serde_json::Error> {
        self.add_serialized(DataKey::of_type::<V>(), value)
    }

    /// Writes `value` under a key digested from a structured `key`.
    pub fn add_hashed<K, V>(&self, key: &K, value: &V) -> Result<bool, serde_json::Error>
    where
        K: Serialize + ?Sized,
        V: Serialize + ?Sized,
    {
        let key = DataKey::hashed(key)?;
        self.add_serialized(key, value)
    }

    /// Reads the value under `key`; merged entries read as an array.
    #[must_use]
    pub fn get(&self, key: impl Into<DataKey>) -> Option<Value> {
        let key = key.into();
        self.with_store(|store| {
            store
                .position(&key)
                .map(|idx| store.entries[idx].1.to_value())
        })
    }

    /// Reads the value under `key`, or `default` when absent.
    #[must_use]
    pub fn get_or(&self, key: impl Into<DataKey>, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }

    /// Reads and deserializes the value under `key`.
    pub fn get_as<V: DeserializeOwned>(
        &self,
        key: impl Into<DataKey>,
    ) -> Result<Option<V>, serde_json::Error> {
        self.get(key).map(serde_json::from_value).transpose()
    }

    /// Reads the structured value stored by [`add_object`](Self::add_object).
    pub fn get_object<V: DeserializeOwned>(&self) -> Result<Option<V>, serde_json::Error> {
        self.get_as(DataKey::of_type::<V>())
    }

    /// Returns the raw entry under `key`.
    #[must_use]
    pub fn entry(&self, key: impl Into<DataKey>) -> Option<Entry> {
        let key = key.into();
        self.with_store(|store| store.position(&key).map(|idx| store.entries[idx].1.clone()))
    }

    /// Returns true if a value is stored under `key`.
    #[must_use]
    pub fn has(&self, key: impl Into<DataKey>) -> bool {
        let key = key.into();
        self.with_store(|store| store.position(&key).is_some())
    }

    /// Declares the accepted keys and switches to defined-only mode.
    ///
    /// Existing entries are flushed.
    pub fn set_map<I, K>(&self, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: Into<DataKey>,
    {
        let declared: Vec<DataKey> = keys.into_iter().map(Into::into).collect();
        self.with_store_mut(|store| {
            store.entries.clear();
            store.declared = declared;
            store.kind = StoreKind::DefinedOnly;
        });
    }

    /// Removes every entry. Declared keys and write semantics are kept.
    pub fn flush(&self) {
        self.with_store_mut(|store| store.entries.clear());
    }

    /// Returns the write scenario.
    #[must_use]
    pub fn scenario(&self) -> Scenario {
        self.with_store(|store| store.scenario)
    }

    /// Changes the write scenario for subsequent writes.
    pub fn set_scenario(&self, scenario: Scenario) {
        self.with_store_mut(|store| store.scenario = scenario);
    }

    /// Returns the key policy.
    #[must_use]
    pub fn kind(&self) -> StoreKind {
        self.with_store(|store| store.kind)
    }

    /// Changes the key policy for subsequent writes.
    pub fn set_kind(&self, kind: StoreKind) {
        self.with_store_mut(|store| store.kind = kind);
    }

    /// Returns the declared keys of a defined-only context.
    #[must_use]
    pub fn declared_keys(&self) -> Vec<DataKey> {
        self.with_store(|store| store.declared.clone())
    }

    /// Returns the number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.with_store(|store| store.entries.len())
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a snapshot of every entry in first-write order.
    #[must_use]
    pub fn entries(&self) -> Vec<(DataKey, Entry)> {
        self.with_store(|store| store.entries.iter().cloned().collect())
    }

    /// Returns the stored keys in first-write order.
    #[must_use]
    pub fn keys(&self) -> Vec<DataKey> {
        self.with_store(|store| store.entries.iter().map(|(k, _)| k.clone()).collect())
    }

    /// Renders the context as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let map = self.with_store(|store| {
            store
                .entries
                .iter()
                .map(|(k, e)| (k.as_str().to_string(), e.to_value()))
                .collect::<serde_json::Map<_, _>>()
        });
        Value::Object(map)
    }

    /// Folds `other` into this context and forwards `other` here.
    ///
    /// Entries of `other` are written in their first-write order, once per
    /// key and whole, using this context's scenario. Afterwards both handles
    /// observe this context. Merging a context with itself is a no-op.
    pub fn merge(&self, other: &Self) {
        let primary = self.root();
        let secondary = other.root();
        if Rc::ptr_eq(&primary.node, &secondary.node) {
            return;
        }
        let folded = {
            let mut node = secondary.node.borrow_mut();
            node.forward = Some(primary.clone());
            std::mem::take(&mut node.store.entries)
        };
        trace!(keys = folded.len(), "merging shared-data contexts");
        primary.with_store_mut(|store| {
            for (key, entry) in folded {
                store.write_entry(key, entry);
            }
        });
    }
}

impl Default for SharedData {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SharedData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedData")
            .field("scenario", &self.scenario())
            .field("kind", &self.kind())
            .field("entries", &self.to_json())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_test_logging;
    use serde_json::json;

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn overwrite_keeps_last_write() {
        init_test("overwrite_keeps_last_write");
        let data = SharedData::with_options(Scenario::Overwrite, StoreKind::Arbitrary);
        assert!(data.add("k", "a"));
        assert!(data.add("k", "b"));
        assert_eq!(data.get("k"), Some(json!("b")));
        crate::test_complete!("overwrite_keeps_last_write");
    }

    #[test]
    fn write_once_ignores_second_write() {
        init_test("write_once_ignores_second_write");
        let data = SharedData::with_options(Scenario::WriteOnce, StoreKind::Arbitrary);
        assert!(data.add("k", "A"));
        let stored = data.add("k", "B");
        crate::assert_with_log!(!stored, "second write ignored", false, stored);
        assert_eq!(data.get("k"), Some(json!("A")));
        crate::test_complete!("write_once_ignores_second_write");
    }

    #[test]
    fn merge_accumulates_in_order() {
        init_test("merge_accumulates_in_order");
        let data = SharedData::with_options(Scenario::Merge, StoreKind::Arbitrary);
        data.add("k", "A");
        assert_eq!(data.get("k"), Some(json!("A")));
        data.add("k", "B");
        data.add("k", "C");
        assert_eq!(data.get("k"), Some(json!(["A", "B", "C"])));
        assert_eq!(
            data.entry("k"),
            Some(Entry::Merged(vec![json!("A"), json!("B"), json!("C")]))
        );
        crate::test_complete!("merge_accumulates_in_order");
    }

    #[test]
    fn null_is_never_stored() {
        init_test("null_is_never_stored");
        let data = SharedData::with_options(Scenario::Overwrite, StoreKind::Arbitrary);
        assert!(!data.add("k", Value::Null));
        assert!(!data.has("k"));
        data.add("k", 1);
        assert!(!data.add("k", Value::Null));
        assert_eq!(data.get("k"), Some(json!(1)));
        crate::test_complete!("null_is_never_stored");
    }

    #[test]
    fn defined_only_drops_undeclared_keys() {
        init_test("defined_only_drops_undeclared_keys");
        let data = SharedData::defined(["user", "trace"]);
        assert!(data.add("user", "ada"));
        assert!(!data.add("other", "x"));
        assert!(!data.has("other"));
        assert_eq!(data.len(), 1);
        assert_eq!(data.kind(), StoreKind::DefinedOnly);
        assert_eq!(
            data.declared_keys(),
            vec![DataKey::from("user"), DataKey::from("trace")]
        );
        crate::test_complete!("defined_only_drops_undeclared_keys");
    }

    #[test]
    fn set_map_flushes_existing_entries() {
        init_test("set_map_flushes_existing_entries");
        let data = SharedData::with_options(Scenario::Overwrite, StoreKind::Arbitrary);
        data.add("a", 1);
        data.set_map(["b"]);
        assert!(data.is_empty());
        assert!(!data.add("a", 2));
        assert!(data.add("b", 3));
        crate::test_complete!("set_map_flushes_existing_entries");
    }

    #[test]
    fn get_or_and_get_as() {
        init_test("get_or_and_get_as");
        let data = SharedData::with_options(Scenario::Overwrite, StoreKind::Arbitrary);
        data.add("n", 5);
        assert_eq!(data.get_or("missing", json!("d")), json!("d"));
        assert_eq!(data.get_as::<u32>("n").unwrap(), Some(5));
        assert_eq!(data.get_as::<u32>("missing").unwrap(), None);
        assert!(data.get_as::<String>("n").is_err());
        crate::test_complete!("get_or_and_get_as");
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct RequestMeta {
        id: u32,
        origin: String,
    }

    #[test]
    fn objects_are_keyed_by_type() {
        init_test("objects_are_keyed_by_type");
        let data = SharedData::with_options(Scenario::Overwrite, StoreKind::Arbitrary);
        let meta = RequestMeta {
            id: 9,
            origin: "edge".into(),
        };
        assert!(data.add_object(&meta).unwrap());
        assert!(data.has(DataKey::of_type::<RequestMeta>()));
        assert_eq!(data.get_object::<RequestMeta>().unwrap(), Some(meta));
        crate::test_complete!("objects_are_keyed_by_type");
    }

    #[test]
    fn hashed_keys_are_stable() {
        init_test("hashed_keys_are_stable");
        let data = SharedData::with_options(Scenario::Overwrite, StoreKind::Arbitrary);
        data.add_hashed(&json!({"route": "/a", "v": 2}), &"cached")
            .unwrap();
        let key = DataKey::hashed(&json!({"route": "/a", "v": 2})).unwrap();
        assert_eq!(data.get(key), Some(json!("cached")));
        crate::test_complete!("hashed_keys_are_stable");
    }

    #[test]
    fn merge_folds_and_forwards() {
        init_test("merge_folds_and_forwards");
        let primary = SharedData::with_options(Scenario::Overwrite, StoreKind::Arbitrary);
        let secondary = SharedData::with_options(Scenario::Overwrite, StoreKind::Arbitrary);
        primary.add("a", 1);
        secondary.add("b", 2);
        secondary.add("a", 3);

        primary.merge(&secondary);
        assert!(primary.same_context(&secondary));
        assert_eq!(primary.get("a"), Some(json!(3)));
        assert_eq!(secondary.get("b"), Some(json!(2)));

        secondary.add("c", 4);
        assert_eq!(primary.get("c"), Some(json!(4)));
        assert_eq!(
            primary.keys(),
            vec![DataKey::from("a"), DataKey::from("b"), DataKey::from("c")]
        );
        crate::test_complete!("merge_folds_and_forwards");
    }

    #[test]
    fn merge_uses_primary_semantics() {
        init_test("merge_uses_primary_semantics");
        let primary = SharedData::with_options(Scenario::Merge, StoreKind::Arbitrary);
        let secondary = SharedData::with_options(Scenario::Merge, StoreKind::Arbitrary);
        primary.add("k", "p");
        secondary.add("k", "s1");
        secondary.add("k", "s2");
        primary.merge(&secondary);
        assert_eq!(primary.get("k"), Some(json!(["p", "s1", "s2"])));

        let once = SharedData::with_options(Scenario::WriteOnce, StoreKind::Arbitrary);
        let other = SharedData::with_options(Scenario::Overwrite, StoreKind::Arbitrary);
        once.add("k", "first");
        other.add("k", "second");
        once.merge(&other);
        assert_eq!(once.get("k"), Some(json!("first")));
        crate::test_complete!("merge_uses_primary_semantics");
    }

    fn accumulated(values: &[&str]) -> SharedData {
        let data = SharedData::with_options(Scenario::Merge, StoreKind::Arbitrary);
        for value in values {
            data.add("k", *value);
        }
        data
    }

    #[test]
    fn merge_writes_each_entry_once_and_whole() {
        init_test("merge_writes_each_entry_once_and_whole");
        let fresh = SharedData::with_options(Scenario::WriteOnce, StoreKind::Arbitrary);
        fresh.merge(&accumulated(&["s1", "s2"]));
        assert_eq!(fresh.get("k"), Some(json!(["s1", "s2"])));

        let overwrite = SharedData::with_options(Scenario::Overwrite, StoreKind::Arbitrary);
        overwrite.add("k", "p");
        overwrite.merge(&accumulated(&["s1", "s2"]));
        assert_eq!(overwrite.get("k"), Some(json!(["s1", "s2"])));

        let once = SharedData::with_options(Scenario::WriteOnce, StoreKind::Arbitrary);
        once.add("k", "p");
        once.merge(&accumulated(&["s1", "s2"]));
        assert_eq!(once.get("k"), Some(json!("p")));

        let merging = SharedData::with_options(Scenario::Merge, StoreKind::Arbitrary);
        merging.add("k", "p");
        merging.merge(&accumulated(&["s1", "s2"]));
        assert_eq!(merging.get("k"), Some(json!(["p", "s1", "s2"])));

        let defined = SharedData::defined(["other"]);
        defined.merge(&accumulated(&["s1"]));
        assert!(!defined.has("k"));
        crate::test_complete!("merge_writes_each_entry_once_and_whole");
    }

    #[test]
    fn merge_with_self_and_chains() {
        init_test("merge_with_self_and_chains");
        let a = SharedData::with_options(Scenario::Overwrite, StoreKind::Arbitrary);
        let b = SharedData::with_options(Scenario::Overwrite, StoreKind::Arbitrary);
        let c = SharedData::with_options(Scenario::Overwrite, StoreKind::Arbitrary);
        a.merge(&a);
        a.merge(&b);
        b.merge(&c);
        c.merge(&a);
        assert!(a.same_context(&c));
        c.add("z", true);
        assert_eq!(a.get("z"), Some(json!(true)));
        crate::test_complete!("merge_with_self_and_chains");
    }

    #[test]
    fn to_json_renders_entries() {
        init_test("to_json_renders_entries");
        let data = SharedData::with_options(Scenario::Merge, StoreKind::Arbitrary);
        data.add("x", 1);
        data.add("x", 2);
        data.add("y", "v");
        assert_eq!(data.to_json(), json!({"x": [1, 2], "y": "v"}));
        data.flush();
        assert!(data.is_empty());
        crate::test_complete!("to_json_renders_entries");
    }

    #[test]
    fn scenario_and_kind_parse() {
        init_test("scenario_and_kind_parse");
        assert_eq!("merge".parse::<Scenario>(), Ok(Scenario::Merge));
        assert_eq!("write_once".parse::<Scenario>(), Ok(Scenario::WriteOnce));
        assert!("sometimes".parse::<Scenario>().is_err());
        assert_eq!("defined".parse::<StoreKind>(), Ok(StoreKind::DefinedOnly));
        assert_eq!(Scenario::WriteOnce.to_string(), "write_once");
        crate::test_complete!("scenario_and_kind_parse");
    }
}
