// bridge_core/src/entities/entity_handle.rs
use crate::error::*;
use std::fmt;

/// Bits of an integer handle used by the entry index.
pub const NUM_ENT_ENTRY_BITS: u32 = 12;
pub const NUM_ENT_ENTRIES: u32 = 1 << NUM_ENT_ENTRY_BITS;
pub const ENT_ENTRY_MASK: u32 = NUM_ENT_ENTRIES - 1;
pub const NUM_SERIAL_NUM_BITS: u32 = 32 - NUM_ENT_ENTRY_BITS;
/// Integer handle value that never refers to an entity.
pub const INVALID_EHANDLE_INDEX: u32 = 0xFFFF_FFFF;

/// Opaque reference to an entity owned by the engine.
///
/// Holding a handle does not keep the entity alive; a stale handle is the
/// engine's problem, not the bridge's.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct EntityHandle {
    index: u32,
    serial: u32,
}

impl EntityHandle {
    pub fn new(index: u32, serial: u32) -> BridgeResult<Self> {
        if index >= NUM_ENT_ENTRIES {
            return Err(BridgeError::index(index as usize, NUM_ENT_ENTRIES as usize));
        }
        Ok(Self {
            index,
            serial: serial & ((1 << NUM_SERIAL_NUM_BITS) - 1),
        })
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn serial(&self) -> u32 {
        self.serial
    }

    /// Packs the handle the way the engine stores it in networked fields.
    pub fn to_int_handle(&self) -> u32 {
        self.index | (self.serial << NUM_ENT_ENTRY_BITS)
    }

    pub fn from_int_handle(handle: u32) -> Option<Self> {
        if handle == INVALID_EHANDLE_INDEX {
            return None;
        }
        Some(Self {
            index: handle & ENT_ENTRY_MASK,
            serial: handle >> NUM_ENT_ENTRY_BITS,
        })
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}:{})", self.index, self.serial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_handle_packs_index_and_serial() {
        let handle = EntityHandle::new(5, 3).unwrap();
        assert_eq!(handle.to_int_handle(), 5 | (3 << 12));
        assert_eq!(EntityHandle::from_int_handle(handle.to_int_handle()), Some(handle));
        assert_eq!(EntityHandle::from_int_handle(INVALID_EHANDLE_INDEX), None);
    }

    #[test]
    fn index_is_bounded() {
        assert_eq!(
            EntityHandle::new(NUM_ENT_ENTRIES, 0).unwrap_err().kind(),
            ErrorKind::Index
        );
    }
}
