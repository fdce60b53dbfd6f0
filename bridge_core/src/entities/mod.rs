pub mod entity_handle;
pub mod field_store;
pub mod key_values;
