// bridge_core/src/entities/field_store.rs
use crate::entities::entity_handle::EntityHandle;
use crate::entities::key_values::MODEL_FIELD;
use std::collections::HashMap;

/// The engine's untyped per-entity key-value store.
///
/// Implementations are handed to the bridge explicitly; the bridge never
/// reaches for a process-wide engine pointer.
pub trait FieldStore {
    /// Copies the raw value of `name` into a buffer of at most `capacity`
    /// bytes, NUL terminated. `None` when the field is not part of the
    /// entity's schema.
    fn get_key_value(&self, entity: EntityHandle, name: &str, capacity: usize) -> Option<Vec<u8>>;

    /// Writes the raw value of `name`. `false` when the field is not part of
    /// the entity's schema.
    fn set_key_value(&mut self, entity: EntityHandle, name: &str, value: &[u8]) -> bool;

    /// Name of the entity's data description class.
    fn class_name(&self, entity: EntityHandle) -> Option<String>;

    /// Resolves an interned string id, as stored in the `model` field.
    fn pooled_string(&self, id: usize) -> Option<String>;

    /// The live entity at `index`, if any.
    fn entity_from_index(&self, index: u32) -> Option<EntityHandle>;
}

#[derive(Debug, Clone, Default)]
struct StoredEntity {
    class_name: String,
    fields: HashMap<String, Vec<u8>>,
}

/// In-memory `FieldStore` used by tooling and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryFieldStore {
    entities: HashMap<EntityHandle, StoredEntity>,
    string_pool: Vec<String>,
    pool_ids: HashMap<String, usize>,
}

impl MemoryFieldStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity of `class_name`. Its schema is exactly the given fields.
    pub fn spawn(&mut self, entity: EntityHandle, class_name: &str, fields: &[(&str, &str)]) {
        let mut stored = StoredEntity {
            class_name: class_name.to_string(),
            fields: HashMap::new(),
        };
        for (name, value) in fields {
            let raw = self.encode(name, value.as_bytes());
            stored.fields.insert(name.to_string(), raw);
        }
        self.entities.insert(entity, stored);
    }

    pub fn remove(&mut self, entity: EntityHandle) -> bool {
        self.entities.remove(&entity).is_some()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Interns `text` and returns its pool id.
    pub fn intern(&mut self, text: &str) -> usize {
        if let Some(&id) = self.pool_ids.get(text) {
            return id;
        }
        let id = self.string_pool.len();
        self.string_pool.push(text.to_string());
        self.pool_ids.insert(text.to_string(), id);
        id
    }

    /// The `model` field holds a pool id rather than text.
    fn encode(&mut self, name: &str, value: &[u8]) -> Vec<u8> {
        let text = until_nul(value);
        if name == MODEL_FIELD {
            let id = self.intern(&String::from_utf8_lossy(text));
            return id.to_ne_bytes().to_vec();
        }
        text.to_vec()
    }
}

impl FieldStore for MemoryFieldStore {
    fn get_key_value(&self, entity: EntityHandle, name: &str, capacity: usize) -> Option<Vec<u8>> {
        let raw = self.entities.get(&entity)?.fields.get(name)?;
        if capacity == 0 {
            return Some(Vec::new());
        }
        let mut buf: Vec<u8> = raw.iter().copied().take(capacity - 1).collect();
        buf.push(0);
        Some(buf)
    }

    fn set_key_value(&mut self, entity: EntityHandle, name: &str, value: &[u8]) -> bool {
        let known = self
            .entities
            .get(&entity)
            .is_some_and(|e| e.fields.contains_key(name));
        if !known {
            return false;
        }

        let raw = self.encode(name, value);
        if let Some(stored) = self.entities.get_mut(&entity) {
            stored.fields.insert(name.to_string(), raw);
        }
        true
    }

    fn class_name(&self, entity: EntityHandle) -> Option<String> {
        self.entities.get(&entity).map(|e| e.class_name.clone())
    }

    fn pooled_string(&self, id: usize) -> Option<String> {
        self.string_pool.get(id).cloned()
    }

    fn entity_from_index(&self, index: u32) -> Option<EntityHandle> {
        self.entities.keys().find(|e| e.index() == index).copied()
    }
}

/// The bytes before the first NUL.
pub(crate) fn until_nul(raw: &[u8]) -> &[u8] {
    match raw.iter().position(|&b| b == 0) {
        Some(end) => &raw[..end],
        None => raw,
    }
}
