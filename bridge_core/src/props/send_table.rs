// bridge_core/src/props/send_table.rs
use crate::props::send_prop::SendProp;
use std::collections::HashMap;
use std::cell::Cell;
use crate::error::*;

/// An ordered, named collection of props shared by every entity of one class.
///
/// Tables are filled during registration and then published with
/// `set_initialized(true)`; after that their contents are frozen. The
/// flags are runtime bookkeeping and can be flipped through a shared
/// reference.
#[derive(Debug, Clone, Default)]
pub struct SendTable {
    name: String,
    props: Vec<SendProp>,
    /// Maps a prop name to its position in `props`.
    by_name: HashMap<String, usize>,
    initialized: Cell<bool>,
    write_flag: Cell<bool>,
    has_props_encoded_against_tick_count: Cell<bool>,
}

impl SendTable {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of props.
    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    pub fn props(&self) -> &[SendProp] {
        &self.props
    }

    pub fn iter(&self) -> impl Iterator<Item = &SendProp> {
        self.props.iter()
    }

    /// Bounds checked positional access.
    pub fn get_prop(&self, index: usize) -> BridgeResult<&SendProp> {
        self.props
            .get(index)
            .ok_or_else(|| BridgeError::index(index, self.props.len()))
    }

    /// Lookup by name within this table only.
    pub fn get_prop_by_name(&self, name: &str) -> BridgeResult<&SendProp> {
        self.prop_index(name)
            .map(|index| &self.props[index])
            .ok_or_else(|| BridgeError::not_found("SendProp", format!("{}.{}", self.name, name)))
    }

    pub fn prop_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Appends a prop and returns its index.
    pub fn add_prop(&mut self, prop: SendProp) -> BridgeResult<usize> {
        if self.initialized.get() {
            return Err(BridgeError::State(format!(
                "SendTable \"{}\" is initialized and can no longer change.",
                self.name
            )));
        }

        if self.by_name.contains_key(prop.name()) {
            return Err(BridgeError::State(format!(
                "SendTable \"{}\" already has a prop named \"{}\".",
                self.name,
                prop.name()
            )));
        }

        if let Some(element) = prop.array_prop_index() {
            if element >= self.props.len() {
                return Err(BridgeError::index(element, self.props.len()));
            }
        }

        let index = self.props.len();
        self.by_name.insert(prop.name().to_string(), index);
        self.props.push(prop);
        Ok(index)
    }

    /// Element prop of the array prop at `index`.
    pub fn array_prop(&self, index: usize) -> BridgeResult<Option<&SendProp>> {
        let prop = self.get_prop(index)?;
        match prop.array_prop_index() {
            Some(element) => self.get_prop(element).map(Some),
            None => Ok(None),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    /// Publishes the table. Once published it cannot be reopened.
    pub fn set_initialized(&self, initialized: bool) -> BridgeResult<()> {
        if self.initialized.get() && !initialized {
            return Err(BridgeError::State(format!(
                "SendTable \"{}\" is already initialized.",
                self.name
            )));
        }
        self.initialized.set(initialized);
        Ok(())
    }

    pub fn write_flag(&self) -> bool {
        self.write_flag.get()
    }

    pub fn set_write_flag(&self, write_flag: bool) {
        self.write_flag.set(write_flag);
    }

    pub fn has_props_encoded_against_tick_count(&self) -> bool {
        self.has_props_encoded_against_tick_count.get()
    }

    pub fn set_has_props_encoded_against_tick_count(&self, value: bool) {
        self.has_props_encoded_against_tick_count.set(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::send_prop::SendPropType;

    fn player_table() -> SendTable {
        let mut table = SendTable::new("DT_BasePlayer");
        table.add_prop(SendProp::int("m_iHealth", 0, 10)).unwrap();
        table.add_prop(SendProp::float("m_flMaxspeed", 4, 12, 0.0, 2048.0)).unwrap();
        table.add_prop(SendProp::int("000", 8, 8).with_parent_array("m_iAmmo")).unwrap();
        table.add_prop(SendProp::array("m_iAmmo", 2, 32, 4)).unwrap();
        table
    }

    #[test]
    fn lookup_by_name_is_stable() {
        let table = player_table();
        let first = table.get_prop_by_name("m_flMaxspeed").unwrap();
        let second = table.get_prop_by_name("m_flMaxspeed").unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.prop_type(), SendPropType::Float);

        let err = table.get_prop_by_name("m_iFrags").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn lookup_by_index_is_bounds_checked() {
        let table = player_table();
        assert_eq!(table.len(), 4);
        assert_eq!(table.get_prop(0).unwrap().name(), "m_iHealth");
        assert_eq!(
            table.get_prop(4).unwrap_err(),
            BridgeError::Index { index: 4, length: 4 }
        );
    }

    #[test]
    fn array_prop_resolves_inside_the_table() {
        let table = player_table();
        let element = table.array_prop(3).unwrap().unwrap();
        assert_eq!(element.name(), "000");
        assert!(table.array_prop(0).unwrap().is_none());
    }

    #[test]
    fn array_element_must_already_exist() {
        let mut table = SendTable::new("DT_Weapons");
        let err = table.add_prop(SendProp::array("m_hMyWeapons", 0, 48, 4)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Index);
    }

    #[test]
    fn initialized_table_is_frozen() {
        let mut table = player_table();
        assert!(!table.is_initialized());
        table.set_initialized(true).unwrap();
        assert!(table.is_initialized());

        let err = table.add_prop(SendProp::int("m_iFrags", 12, 12)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
        assert_eq!(table.set_initialized(false).unwrap_err().kind(), ErrorKind::State);
        assert!(table.set_initialized(true).is_ok());
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut table = player_table();
        let err = table.add_prop(SendProp::int("m_iHealth", 0, 10)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
    }

    #[test]
    fn bookkeeping_flags_toggle_after_publish() {
        let table = player_table();
        table.set_initialized(true).unwrap();
        table.set_write_flag(true);
        table.set_has_props_encoded_against_tick_count(true);
        assert!(table.write_flag());
        assert!(table.has_props_encoded_against_tick_count());
    }
}
