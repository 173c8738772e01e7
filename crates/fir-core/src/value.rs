//! Canonical immutable values: byte blobs and lists of values.
//!
//! Identity is purely structural. Every instance caches a cheap
//! implementation hash computed once at construction; a list's cached hash
//! combines only the children's cached hashes, so building a list never
//! rehashes deep content. The cryptographic content hash lives in
//! [`crate::hash`] and is unrelated to this cached hash.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::{Arc, LazyLock, OnceLock, RwLock};

use hashbrown::hash_map::RawEntryMut;
use hashbrown::HashMap;

#[derive(Debug, Clone)]
pub enum Value {
    Blob(Arc<BlobValue>),
    List(Arc<ListValue>),
}

#[derive(Debug)]
pub struct BlobValue {
    bytes: Vec<u8>,
    hash: u64,
}

impl BlobValue {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[derive(Debug)]
pub struct ListValue {
    items: Vec<Value>,
    hash: u64,
}

impl ListValue {
    pub fn items(&self) -> &[Value] {
        &self.items
    }
}

fn hash_blob_bytes(bytes: &[u8]) -> u64 {
    let mut h = DefaultHasher::new();
    h.write_u8(b'B');
    h.write(bytes);
    h.finish()
}

fn hash_list_items(items: &[Value]) -> u64 {
    let mut h = DefaultHasher::new();
    h.write_u8(b'L');
    h.write_usize(items.len());
    for item in items {
        h.write_u64(item.cached_hash());
    }
    h.finish()
}

static EMPTY_BLOB: LazyLock<Value> = LazyLock::new(|| {
    Value::Blob(Arc::new(BlobValue {
        hash: hash_blob_bytes(&[]),
        bytes: Vec::new(),
    }))
});

static EMPTY_LIST: LazyLock<Value> = LazyLock::new(|| {
    Value::List(Arc::new(ListValue {
        hash: hash_list_items(&[]),
        items: Vec::new(),
    }))
});

impl Value {
    /// Build a blob value. The empty blob is a shared canonical instance.
    pub fn blob(bytes: Vec<u8>) -> Value {
        if bytes.is_empty() {
            return Value::empty_blob();
        }
        Value::Blob(Arc::new(BlobValue {
            hash: hash_blob_bytes(&bytes),
            bytes,
        }))
    }

    /// Build a list value. The empty list is a shared canonical
    /// instance; other lists are fresh allocations, freed with their
    /// last reference. Callers that want shared instances for
    /// long-lived structures intern explicitly through a
    /// [`ValueInterner`].
    pub fn list(items: Vec<Value>) -> Value {
        if items.is_empty() {
            return Value::empty_list();
        }
        Value::List(Arc::new(ListValue {
            hash: hash_list_items(&items),
            items,
        }))
    }

    pub fn empty_blob() -> Value {
        EMPTY_BLOB.clone()
    }

    pub fn empty_list() -> Value {
        EMPTY_LIST.clone()
    }

    pub fn cached_hash(&self) -> u64 {
        match self {
            Value::Blob(b) => b.hash,
            Value::List(l) => l.hash,
        }
    }

    pub fn is_blob(&self) -> bool {
        matches!(self, Value::Blob(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(b) => Some(&b.bytes),
            Value::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(&l.items),
            Value::Blob(_) => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Blob(a), Value::Blob(b)) => {
                Arc::ptr_eq(a, b) || (a.hash == b.hash && a.bytes == b.bytes)
            }
            (Value::List(a), Value::List(b)) => {
                Arc::ptr_eq(a, b) || (a.hash == b.hash && a.items == b.items)
            }
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.cached_hash());
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Blob(b) => {
                write!(f, "Blob[{}](", b.bytes.len())?;
                for byte in b.bytes.iter().take(16) {
                    write!(f, "{byte:02x}")?;
                }
                if b.bytes.len() > 16 {
                    write!(f, "..")?;
                }
                write!(f, ")")
            }
            Value::List(l) => {
                write!(f, "List[{}](", l.items.len())?;
                for (i, item) in l.items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Thread-safe hash-consing table for list values.
///
/// Interning never changes observable equality, only reference identity.
/// Concurrent interns of the same structure converge on one canonical
/// instance: the read path looks up by the children's combined hash without
/// allocating a key, and the insert path rechecks under the write lock.
///
/// The table holds strong references and never evicts, so it is an opt-in
/// registry for structures meant to live as long as the interner, not a
/// cache on the plain construction path. [`Value::list`] does not register
/// anything.
pub struct ValueInterner {
    lists: RwLock<HashMap<Value, ()>>,
}

impl ValueInterner {
    pub fn new() -> Self {
        ValueInterner {
            lists: RwLock::new(HashMap::new()),
        }
    }

    /// A process-wide interner for callers sharing canonical instances
    /// across subsystems.
    pub fn global() -> &'static ValueInterner {
        static GLOBAL: OnceLock<ValueInterner> = OnceLock::new();
        GLOBAL.get_or_init(ValueInterner::new)
    }

    /// Number of distinct list structures currently interned.
    pub fn len(&self) -> usize {
        self.lists.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the canonical list value for `items`, inserting if absent.
    pub fn intern_list(&self, items: Vec<Value>) -> Value {
        if items.is_empty() {
            return Value::empty_list();
        }
        let combined = hash_list_items(&items);

        {
            let map = self.lists.read().unwrap_or_else(|e| e.into_inner());
            let hash = map_key_hash(map.hasher(), combined);
            if let Some((existing, ())) = map
                .raw_entry()
                .from_hash(hash, |k| list_matches(k, combined, &items))
            {
                return existing.clone();
            }
        }

        let candidate = Value::List(Arc::new(ListValue {
            hash: combined,
            items,
        }));

        let mut map = self.lists.write().unwrap_or_else(|e| e.into_inner());
        let hasher = map.hasher().clone();
        let hash = map_key_hash(&hasher, combined);
        match map
            .raw_entry_mut()
            .from_hash(hash, |k| k.cached_hash() == combined && *k == candidate)
        {
            RawEntryMut::Occupied(entry) => entry.key().clone(),
            RawEntryMut::Vacant(entry) => {
                entry.insert_with_hasher(hash, candidate.clone(), (), |k| {
                    map_key_hash(&hasher, k.cached_hash())
                });
                candidate
            }
        }
    }
}

impl Default for ValueInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash a value's cached hash the same way the table's hasher hashes a
/// stored `Value` key. `Value::hash` writes exactly one `u64`, so the two
/// paths agree.
fn map_key_hash<S: BuildHasher>(build: &S, cached: u64) -> u64 {
    let mut h = build.build_hasher();
    h.write_u64(cached);
    h.finish()
}

fn list_matches(key: &Value, combined: u64, items: &[Value]) -> bool {
    match key {
        Value::List(l) => l.hash == combined && l.items == items,
        Value::Blob(_) => false,
    }
}
