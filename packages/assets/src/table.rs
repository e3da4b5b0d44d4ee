use crate::error::{AssetError, AssetResult};
use crate::id::{AssetHandle, AssetId};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Generations are process-wide so two tables never issue equal handles
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// One binary asset and its metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
    pub id: AssetId,
    pub payload: Arc<[u8]>,
    pub mime: String,
    /// Archive-relative path the asset was loaded from or last saved to
    pub path: Option<String>,
    pub name: Option<String>,
}

impl AssetRecord {
    pub fn new(id: AssetId, payload: impl Into<Arc<[u8]>>, mime: impl Into<String>) -> Self {
        Self {
            id,
            payload: payload.into(),
            mime: mime.into(),
            path: None,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Owner of every asset of one project
#[derive(Debug)]
pub struct AssetTable {
    generation: u64,
    records: BTreeMap<AssetId, AssetRecord>,
    handles: HashMap<AssetId, AssetHandle>,
    by_handle: HashMap<String, AssetId>,
}

impl AssetTable {
    pub fn new() -> Self {
        Self {
            generation: next_generation(),
            records: BTreeMap::new(),
            handles: HashMap::new(),
            by_handle: HashMap::new(),
        }
    }

    /// Generation whose handles are currently valid
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Store a new asset under a freshly generated id
    pub fn add(
        &mut self,
        payload: impl Into<Arc<[u8]>>,
        mime: impl Into<String>,
        name: Option<String>,
    ) -> (AssetId, AssetHandle) {
        let mut id = AssetId::generate();
        while self.records.contains_key(&id) {
            id = AssetId::generate();
        }

        let mut record = AssetRecord::new(id.clone(), payload, mime);
        record.name = name;
        let handle = self.attach(record);
        debug!(id = %id, generation = self.generation, "Added asset");
        (id, handle)
    }

    /// Adopt a record that already has an id (e.g. read from an archive)
    pub fn insert_record(&mut self, record: AssetRecord) -> AssetResult<AssetHandle> {
        if self.records.contains_key(&record.id) {
            return Err(AssetError::DuplicateId {
                id: record.id.to_string(),
            });
        }
        Ok(self.attach(record))
    }

    fn attach(&mut self, record: AssetRecord) -> AssetHandle {
        let handle = AssetHandle::issue(self.generation);
        self.by_handle
            .insert(handle.as_str().to_string(), record.id.clone());
        self.handles.insert(record.id.clone(), handle.clone());
        self.records.insert(record.id.clone(), record);
        handle
    }

    pub fn get(&self, id: &AssetId) -> AssetResult<&[u8]> {
        self.record(id).map(|r| &*r.payload)
    }

    pub fn record(&self, id: &AssetId) -> AssetResult<&AssetRecord> {
        self.records
            .get(id)
            .ok_or_else(|| AssetError::not_found(id.as_str()))
    }

    pub fn record_mut(&mut self, id: &AssetId) -> AssetResult<&mut AssetRecord> {
        self.records
            .get_mut(id)
            .ok_or_else(|| AssetError::not_found(id.as_str()))
    }

    pub fn handle_of(&self, id: &AssetId) -> AssetResult<&AssetHandle> {
        self.handles
            .get(id)
            .ok_or_else(|| AssetError::not_found(id.as_str()))
    }

    /// Translate a live handle back to the id it was issued for
    pub fn resolve_by_handle(&self, handle: &str) -> AssetResult<&AssetId> {
        self.by_handle
            .get(handle)
            .ok_or_else(|| AssetError::unknown_handle(handle))
    }

    pub fn contains(&self, id: &AssetId) -> bool {
        self.records.contains_key(id)
    }

    /// Remove an asset and revoke its handle
    pub fn remove(&mut self, id: &AssetId) -> AssetResult<AssetRecord> {
        let record = self
            .records
            .remove(id)
            .ok_or_else(|| AssetError::not_found(id.as_str()))?;
        if let Some(handle) = self.handles.remove(id) {
            self.by_handle.remove(handle.as_str());
        }
        debug!(id = %id, "Removed asset");
        Ok(record)
    }

    /// Revoke every handle and drop every record
    pub fn clear(&mut self) {
        self.records.clear();
        self.handles.clear();
        self.by_handle.clear();
        self.generation = next_generation();
    }

    /// Swap in a new set of records.
    ///
    /// All current handles are revoked and the generation advances before
    /// any new handle is issued. Duplicate ids are rejected up front and
    /// leave the table untouched.
    pub fn replace_all(&mut self, records: Vec<AssetRecord>) -> AssetResult<()> {
        let mut seen = std::collections::HashSet::new();
        for record in &records {
            if !seen.insert(&record.id) {
                return Err(AssetError::DuplicateId {
                    id: record.id.to_string(),
                });
            }
        }

        let revoked = self.handles.len();
        self.clear();
        for record in records {
            self.attach(record);
        }
        debug!(
            revoked,
            loaded = self.records.len(),
            generation = self.generation,
            "Replaced asset table"
        );
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetRecord> {
        self.records.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &AssetId> {
        self.records.keys()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for AssetTable {
    fn default() -> Self {
        Self::new()
    }
}
