// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Field-name ↔ field-index mapping for struct regions.
//!
//! Two lifecycles are provided:
//! - [`KnownFields`] - names enumerated up front; immutable and freely shared
//!   between traversals (struct binders keep one for their lifetime).
//! - [`DynamicFields`] - starts empty and allocates indices the first time a
//!   name is seen. One instance belongs to one struct region of one
//!   traversal; [`DynamicFields::new_ref`] is the only way to obtain a shared
//!   handle and callers create a fresh one per region.
//!
//! Each index also carries an [`IndexCache`] slot in which a backend may
//! memoize a compiled lookup structure for that particular index.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

use crate::core::{CodecError, Result};

/// Index returned by a source for a field name the index does not know.
pub const UNKNOWN_FIELD: usize = usize::MAX;

/// Shared handle to a field index, as passed to `begin_struct`/`end_struct`.
pub type FieldIndexRef = Arc<dyn FieldIndex>;

/// Bidirectional name ↔ index mapping for one struct shape.
pub trait FieldIndex: Send + Sync + fmt::Debug {
    /// Index for `name`. Dynamic indexes allocate on first sight and always
    /// return `Some`.
    fn name_to_index(&self, name: &str) -> Option<usize>;

    /// Name for `index`, or a `#<index>` placeholder when the index is unknown.
    fn index_to_name(&self, index: usize) -> String;

    /// Number of indices allocated so far.
    fn count(&self) -> usize;

    /// Whether the index grows as new names are seen.
    fn is_dynamic(&self) -> bool;

    /// Backend cache slot bound to this instance.
    fn cache(&self) -> &IndexCache;

    /// Whether `index` currently maps to a name.
    fn contains_index(&self, index: usize) -> bool {
        index < self.count()
    }
}

/// Placeholder name for an index with no known name.
pub fn placeholder_name(index: usize) -> String {
    if index == UNKNOWN_FIELD {
        "#unknown".to_string()
    } else {
        format!("#{index}")
    }
}

/// Identity comparison of two field index handles.
pub fn same_index(a: &FieldIndexRef, b: &FieldIndexRef) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

// =============================================================================
// Known fields
// =============================================================================

/// Fixed, pre-declared field set.
pub struct KnownFields {
    names: Vec<String>,
    lookup: HashMap<String, usize>,
    cache: IndexCache,
}

impl KnownFields {
    /// Create a known index. Names are assigned indices in iteration order.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if a name appears twice.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut lookup = HashMap::with_capacity(names.len());
        for (index, name) in names.iter().enumerate() {
            if lookup.insert(name.clone(), index).is_some() {
                return Err(CodecError::invariant_violation(format!(
                    "duplicate field name '{name}'"
                )));
            }
        }
        Ok(Self {
            names,
            lookup,
            cache: IndexCache::new(),
        })
    }

    /// Create a known index behind a shared handle.
    pub fn new_ref<I, S>(names: I) -> Result<FieldIndexRef>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Arc::new(Self::new(names)?))
    }

    /// All names in index order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl fmt::Debug for KnownFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnownFields")
            .field("names", &self.names)
            .finish()
    }
}

impl FieldIndex for KnownFields {
    fn name_to_index(&self, name: &str) -> Option<usize> {
        self.lookup.get(name).copied()
    }

    fn index_to_name(&self, index: usize) -> String {
        self.names
            .get(index)
            .cloned()
            .unwrap_or_else(|| placeholder_name(index))
    }

    fn count(&self) -> usize {
        self.names.len()
    }

    fn is_dynamic(&self) -> bool {
        false
    }

    fn cache(&self) -> &IndexCache {
        &self.cache
    }
}

// =============================================================================
// Dynamic fields
// =============================================================================

/// Auto-growing field set; insertion order is index order.
///
/// An instance belongs to exactly one struct region of one traversal: the
/// region that opened it with `begin_struct` and closes it with
/// `end_struct`. Indexes are assigned in first-seen order, so sharing an
/// instance between regions or traversals hands out indexes that depend on
/// what the other side saw first. The type is `Send + Sync` only so it can
/// sit behind [`FieldIndexRef`]; nothing serializes its use across regions.
pub struct DynamicFields {
    inner: Mutex<DynamicInner>,
    cache: IndexCache,
}

#[derive(Default)]
struct DynamicInner {
    names: Vec<String>,
    lookup: HashMap<String, usize>,
}

impl DynamicFields {
    /// Create an empty dynamic index.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(DynamicInner::default()),
            cache: IndexCache::new(),
        }
    }

    /// Create a fresh dynamic index for one struct region.
    ///
    /// Call once per region; the handle must not outlive or be reused past
    /// the matching `end_struct`.
    pub fn new_ref() -> FieldIndexRef {
        Arc::new(Self::new())
    }

    fn with_inner<R>(&self, f: impl FnOnce(&mut DynamicInner) -> R) -> R {
        // A poisoned lock still holds a consistent name table: every mutation
        // is a push followed by an insert of the same index.
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut inner)
    }
}

impl Default for DynamicFields {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DynamicFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.with_inner(|inner| inner.names.clone());
        f.debug_struct("DynamicFields").field("names", &names).finish()
    }
}

impl FieldIndex for DynamicFields {
    fn name_to_index(&self, name: &str) -> Option<usize> {
        Some(self.with_inner(|inner| {
            if let Some(&index) = inner.lookup.get(name) {
                return index;
            }
            let index = inner.names.len();
            inner.names.push(name.to_string());
            inner.lookup.insert(name.to_string(), index);
            index
        }))
    }

    fn index_to_name(&self, index: usize) -> String {
        self.with_inner(|inner| inner.names.get(index).cloned())
            .unwrap_or_else(|| placeholder_name(index))
    }

    fn count(&self) -> usize {
        self.with_inner(|inner| inner.names.len())
    }

    fn is_dynamic(&self) -> bool {
        true
    }

    fn cache(&self) -> &IndexCache {
        &self.cache
    }
}

// =============================================================================
// Cache slot
// =============================================================================

/// Type-keyed memo slot attached to a field index.
///
/// Correctness never depends on an entry being present.
#[derive(Default)]
pub struct IndexCache {
    entries: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl IndexCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached entry of type `T`.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let entries = self.entries.read().ok()?;
        entries
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|entry| entry.downcast::<T>().ok())
    }

    /// Store an entry of type `T`, replacing any previous one.
    pub fn put<T: Any + Send + Sync>(&self, value: T) -> Arc<T> {
        let value = Arc::new(value);
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(TypeId::of::<T>(), value.clone());
        }
        value
    }

    /// Get the entry of type `T`, building it on first use.
    pub fn get_or_insert_with<T, F>(&self, build: F) -> Arc<T>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        match self.get::<T>() {
            Some(entry) => entry,
            None => self.put(build()),
        }
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for IndexCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexCache")
            .field("entries", &self.len())
            .finish()
    }
}
