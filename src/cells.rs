//! Cells and variables as the notebook model hands them to the graph.
//!
//! The notebook owns cell contents. Graph nodes only ever hold a
//! [`CellHandle`], which exposes the live code for reading.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use parking_lot::RwLockReadGuard;

/// Stable, opaque identifier of a notebook cell.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct CellId(String);

impl CellId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CellId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CellId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellContent {
    pub code: String,
}

impl CellContent {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }

    /// Number of lines as shown in the editor. Empty code still occupies one line.
    pub fn line_count(&self) -> usize {
        self.code.lines().count().max(1)
    }
}

/// Read-only view of a cell's live content.
///
/// Cloning the handle shares the same content; the owning [`CellStore`]
/// is the only place that writes through it.
#[derive(Clone, Debug)]
pub struct CellHandle(Arc<RwLock<CellContent>>);

impl CellHandle {
    fn new(content: CellContent) -> Self {
        Self(Arc::new(RwLock::new(content)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, CellContent> {
        self.0.read()
    }

    pub fn code(&self) -> String {
        self.0.read().code.clone()
    }

    pub fn line_count(&self) -> usize {
        self.0.read().line_count()
    }

    pub fn same_cell(&self, other: &CellHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for CellHandle {
    fn eq(&self, other: &Self) -> bool {
        self.same_cell(other)
    }
}

/// Accessor the element builders use to reach cell contents without
/// holding on to the whole notebook.
pub trait CellSource {
    fn cell(&self, id: &CellId) -> Option<CellHandle>;
}

/// Minimal owner of cell contents.
#[derive(Debug, Default)]
pub struct CellStore {
    cells: HashMap<CellId, CellHandle>,
}

impl CellStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the code of a cell, creating it if needed. Existing handles
    /// observe the new code.
    pub fn set_code(&mut self, id: impl Into<CellId>, code: impl Into<String>) -> CellHandle {
        let id = id.into();
        let code = code.into();
        match self.cells.get(&id) {
            Some(handle) => {
                handle.0.write().code = code;
                handle.clone()
            }
            None => {
                let handle = CellHandle::new(CellContent::new(code));
                self.cells.insert(id, handle.clone());
                handle
            }
        }
    }

    pub fn remove(&mut self, id: &CellId) -> bool {
        self.cells.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl CellSource for CellStore {
    fn cell(&self, id: &CellId) -> Option<CellHandle> {
        self.cells.get(id).cloned()
    }
}

impl<K: Into<CellId>, V: Into<String>> FromIterator<(K, V)> for CellStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut store = CellStore::new();
        for (id, code) in iter {
            store.set_code(id, code);
        }
        store
    }
}

/// A named binding tracked across cells.
///
/// `data_type` and `value` are display strings for the selection panel and
/// are `None` until the kernel reports them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Variable {
    pub name: String,
    pub declared_by: Vec<CellId>,
    pub used_by: Vec<CellId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub data_type: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub value: Option<String>,
}

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn declared_by<I, C>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<CellId>,
    {
        self.declared_by = cells.into_iter().map(Into::into).collect();
        self
    }

    pub fn used_by<I, C>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<CellId>,
    {
        self.used_by = cells.into_iter().map(Into::into).collect();
        self
    }

    pub fn data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn is_declared_by(&self, cell: &CellId) -> bool {
        self.declared_by.contains(cell)
    }

    pub fn is_used_by(&self, cell: &CellId) -> bool {
        self.used_by.contains(cell)
    }
}

/// Every variable the kernel knows about, keyed and iterated by name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariableTable {
    variables: BTreeMap<String, Variable>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the variable with the same name.
    pub fn insert(&mut self, variable: Variable) -> Option<Variable> {
        self.variables.insert(variable.name.clone(), variable)
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Variable> {
        self.variables.remove(name)
    }

    pub fn iter(&self) -> btree_map::Values<'_, String, Variable> {
        self.variables.values()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

impl FromIterator<Variable> for VariableTable {
    fn from_iter<I: IntoIterator<Item = Variable>>(iter: I) -> Self {
        let mut table = VariableTable::new();
        for variable in iter {
            table.insert(variable);
        }
        table
    }
}

impl<'a> IntoIterator for &'a VariableTable {
    type Item = &'a Variable;
    type IntoIter = btree_map::Values<'a, String, Variable>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
