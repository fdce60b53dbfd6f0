// bridge_core/src/props/registry.rs
use crate::props::server_class::ServerClass;
use crate::props::send_prop::SendPropType;
use crate::props::send_table::SendTable;
use crate::props::send_prop::SendProp;
use std::collections::HashSet;
use std::collections::HashMap;
use crate::error::*;

/// Non-owning handle to a table stored in a `PropRegistry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub usize);

/// A prop found by a recursive search, with its offset from the start of the entity.
#[derive(Debug, Clone, Copy)]
pub struct FoundProp<'a> {
    pub table: TableId,
    pub prop: &'a SendProp,
    pub offset: usize,
}

/// Owns every send table and server class known to the bridge.
///
/// Props never own the tables they refer to; they hold a `TableId` into
/// this arena, so a table may be shared by any number of props and classes.
#[derive(Debug, Default)]
pub struct PropRegistry {
    tables: Vec<SendTable>,
    table_names: HashMap<String, TableId>,
    classes: Vec<ServerClass>,
    class_names: HashMap<String, usize>,
    /// Most recently registered class.
    head: Option<usize>,
}

impl PropRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a table and returns its id.
    pub fn add_table(&mut self, table: SendTable) -> BridgeResult<TableId> {
        if self.table_names.contains_key(table.name()) {
            return Err(BridgeError::State(format!(
                "SendTable \"{}\" is already registered.",
                table.name()
            )));
        }

        let id = TableId(self.tables.len());
        self.table_names.insert(table.name().to_string(), id);
        self.tables.push(table);
        log::debug!("Registered send table {:?} as {:?}.", self.tables[id.0].name(), id);
        Ok(id)
    }

    /// Appends `prop` to table `id`, checking that a nested table link points
    /// at a registered table.
    pub fn add_prop(&mut self, id: TableId, prop: SendProp) -> BridgeResult<usize> {
        if let Some(nested) = prop.data_table_id() {
            self.table(nested)?;
        }
        self.table_mut(id)?.add_prop(prop)
    }

    pub fn table(&self, id: TableId) -> BridgeResult<&SendTable> {
        self.tables
            .get(id.0)
            .ok_or_else(|| BridgeError::index(id.0, self.tables.len()))
    }

    pub fn table_mut(&mut self, id: TableId) -> BridgeResult<&mut SendTable> {
        let len = self.tables.len();
        self.tables
            .get_mut(id.0)
            .ok_or_else(|| BridgeError::index(id.0, len))
    }

    pub fn table_id(&self, name: &str) -> BridgeResult<TableId> {
        self.table_names
            .get(name)
            .copied()
            .ok_or_else(|| BridgeError::not_found("SendTable", name))
    }

    pub fn find_table(&self, name: &str) -> BridgeResult<&SendTable> {
        self.table(self.table_id(name)?)
    }

    pub fn tables(&self) -> impl Iterator<Item = (TableId, &SendTable)> {
        self.tables.iter().enumerate().map(|(i, t)| (TableId(i), t))
    }

    /// Nested table of a data table prop.
    pub fn data_table_of(&self, prop: &SendProp) -> BridgeResult<Option<&SendTable>> {
        match prop.data_table_id() {
            Some(id) => self.table(id).map(Some),
            None => Ok(None),
        }
    }

    /// Registers a server class and makes it the head of the class list.
    pub fn register_server_class(&mut self, name: &str, table: TableId) -> BridgeResult<usize> {
        self.table(table)?;

        if self.class_names.contains_key(name) {
            return Err(BridgeError::State(format!(
                "ServerClass \"{name}\" is already registered."
            )));
        }

        let class_index = self.classes.len();
        self.classes.push(ServerClass {
            name: name.to_string(),
            table,
            class_index,
            next: self.head,
        });
        self.class_names.insert(name.to_string(), class_index);
        self.head = Some(class_index);
        Ok(class_index)
    }

    pub fn server_class(&self, name: &str) -> BridgeResult<&ServerClass> {
        self.class_names
            .get(name)
            .map(|&index| &self.classes[index])
            .ok_or_else(|| BridgeError::not_found("ServerClass", name))
    }

    pub fn server_class_at(&self, class_index: usize) -> BridgeResult<&ServerClass> {
        self.classes
            .get(class_index)
            .ok_or_else(|| BridgeError::index(class_index, self.classes.len()))
    }

    /// Walks the class list from the head, the way the engine does.
    pub fn server_classes(&self) -> ServerClassIter<'_> {
        ServerClassIter {
            registry: self,
            next: self.head,
        }
    }

    /// Publishes every table.
    pub fn initialize_all(&self) -> BridgeResult<()> {
        for table in &self.tables {
            table.set_initialized(true)?;
        }
        Ok(())
    }

    /// Searches `root` and every table nested under it, depth first.
    ///
    /// Exclude props are skipped. The returned offset is the sum of the
    /// offsets of the data table props crossed on the way down.
    pub fn find_prop(&self, root: TableId, name: &str) -> BridgeResult<FoundProp<'_>> {
        let mut visiting = HashSet::new();
        match self.find_prop_in(root, name, 0, &mut visiting)? {
            Some(found) => Ok(found),
            None => Err(BridgeError::not_found(
                "SendProp",
                format!("{}.{}", self.table(root)?.name(), name),
            )),
        }
    }

    /// Recursive search starting at the table of a server class.
    pub fn find_class_prop(&self, class_name: &str, name: &str) -> BridgeResult<FoundProp<'_>> {
        let class = self.server_class(class_name)?;
        self.find_prop(class.table, name)
    }

    fn find_prop_in(
        &self,
        id: TableId,
        name: &str,
        base_offset: usize,
        visiting: &mut HashSet<TableId>,
    ) -> BridgeResult<Option<FoundProp<'_>>> {
        // A table reachable from itself would recurse forever.
        if !visiting.insert(id) {
            return Ok(None);
        }

        let table = self.table(id)?;
        for prop in table.iter() {
            if prop.is_exclude_prop() {
                continue;
            }

            if prop.name() == name {
                visiting.remove(&id);
                return Ok(Some(FoundProp {
                    table: id,
                    prop,
                    offset: base_offset + prop.offset(),
                }));
            }

            if prop.prop_type() == SendPropType::DataTable {
                if let Some(nested) = prop.data_table_id() {
                    let found =
                        self.find_prop_in(nested, name, base_offset + prop.offset(), visiting)?;
                    if found.is_some() {
                        visiting.remove(&id);
                        return Ok(found);
                    }
                }
            }
        }

        visiting.remove(&id);
        Ok(None)
    }
}

/// Iterator over server classes following their `next` links.
pub struct ServerClassIter<'a> {
    registry: &'a PropRegistry,
    next: Option<usize>,
}

impl<'a> Iterator for ServerClassIter<'a> {
    type Item = &'a ServerClass;

    fn next(&mut self) -> Option<Self::Item> {
        let class = self.registry.classes.get(self.next?)?;
        self.next = class.next;
        Some(class)
    }
}
