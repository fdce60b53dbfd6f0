// bridge_core/src/scripting/modules/props_module.rs
use crate::scripting::modules::variant_module::LuaSendPropVariant;
use crate::scripting::modules::entity_module::entity_from_index;
use crate::scripting::modules::lua_module::*;
use crate::scripting::lua_bridge_ctx::LuaBridgeCtx;
use crate::props::send_prop::{SendProp, SendPropFlags, SendPropType};
use crate::dumps::server_classes_to_string;
use crate::props::registry::PropRegistry;
use crate::props::send_table::SendTable;
use crate::props::registry::TableId;
use crate::scripting::lua_constants::*;
use crate::error::BridgeError;
use strum::IntoEnumIterator;
use mlua::UserDataMethods;
use mlua::UserDataFields;
use mlua::prelude::LuaResult;
use mlua::MetaMethod;
use mlua::UserData;
use std::rc::Rc;
use mlua::Value;
use mlua::Lua;
use crate::*;

/// Lua module that exposes send tables, send props and server classes
/// through the `props` global.
#[derive(Default)]
pub struct PropsModule;
register_lua_module!(PropsModule);
register_lua_api!(PropsModule, "props.lua");

impl LuaModule for PropsModule {
    fn register(&self, lua: &Lua) -> LuaResult<()> {
        let props_tbl = lua.create_table()?;

        let types = lua.create_table()?;
        for prop_type in SendPropType::iter() {
            types.set(prop_type.to_string(), prop_type as i64)?;
        }
        props_tbl.set(SEND_PROP_TYPE, types)?;

        for (name, flag) in SendPropFlags::ALL {
            props_tbl.set(format!("{SPROP_PREFIX}{name}"), flag.bits())?;
        }

        props_tbl.set(
            SERVER_CLASSES,
            lua.create_function(|lua, ()| {
                let registry = registry(lua)?;
                let classes = lua.create_table()?;
                for (i, class) in registry.server_classes().enumerate() {
                    classes.set(i + 1, LuaServerClass {
                        registry: registry.clone(),
                        class_index: class.class_index(),
                    })?;
                }
                Ok(classes)
            })?,
        )?;

        props_tbl.set(
            SERVER_CLASS,
            lua.create_function(|lua, name: String| {
                let registry = registry(lua)?;
                let class_index = registry.server_class(&name)?.class_index();
                Ok(LuaServerClass { registry, class_index })
            })?,
        )?;

        props_tbl.set(
            FIND_TABLE,
            lua.create_function(|lua, name: String| {
                let registry = registry(lua)?;
                let id = registry.table_id(&name)?;
                Ok(LuaSendTable { registry, id })
            })?,
        )?;

        props_tbl.set(
            DUMP_SERVER_CLASSES,
            lua.create_function(|lua, ()| {
                let registry = registry(lua)?;
                Ok(server_classes_to_string(&registry))
            })?,
        )?;

        lua.globals().set(PROPS, props_tbl)?;
        Ok(())
    }
}

impl LuaApi for PropsModule {
    fn emit_api(&self, out: &mut LuaApiWriter) {
        out.line("---@class props");
        out.line("props = {}");
        out.line("");

        out.line("---@enum SendPropType");
        out.line("props.SendPropType = {");
        for prop_type in SendPropType::iter() {
            out.write(format_args!("    {} = {},\n", prop_type, prop_type as i64));
        }
        out.line("}");
        out.line("");

        for (name, flag) in SendPropFlags::ALL {
            out.write(format_args!("props.{SPROP_PREFIX}{name} = {}\n", flag.bits()));
        }
        out.line("");

        out.line("---@return ServerClass[]");
        out.line("function props.server_classes() end");
        out.line("---@param name string");
        out.line("---@return ServerClass");
        out.line("function props.server_class(name) end");
        out.line("---@param name string");
        out.line("---@return SendTable");
        out.line("function props.find_table(name) end");
        out.line("---@return string");
        out.line("function props.dump_server_classes() end");
        out.line("");

        out.line("---@class ServerClass");
        out.line("---@field name string");
        out.line("---@field table SendTable");
        out.line("---@field next ServerClass|nil");
        out.line("---@field class_index integer");
        out.line("");

        out.line("---@class SendTable");
        out.line("---@field name string");
        out.line("---@field length integer");
        out.line("---@field props SendProp[]");
        out.line("local SendTable = {}");
        for method in ["get_name"] {
            out.write(format_args!("---@return string\nfunction SendTable:{method}() end\n"));
        }
        out.line("---@return integer");
        out.line("function SendTable:get_length() end");
        for method in ["is_initialized", "get_write_flag", "has_props_encoded_against_tick_count"] {
            out.write(format_args!("---@return boolean\nfunction SendTable:{method}() end\n"));
        }
        for method in ["set_initialized", "set_write_flag", "set_has_props_encoded_against_tick_count"] {
            out.write(format_args!("---@param value boolean\nfunction SendTable:{method}(value) end\n"));
        }
        out.line("---Zero based index, or a prop name.");
        out.line("---@param key integer|string");
        out.line("---@return SendProp");
        out.line("function SendTable:get_prop(key) end");
        out.line("");

        out.line("---@class SendProp");
        for (field, ty) in [
            ("name", "string"),
            ("type", "integer"),
            ("bits", "integer"),
            ("low_value", "number"),
            ("high_value", "number"),
            ("high_low_mul", "number"),
            ("length", "integer"),
            ("element_stride", "integer"),
            ("offset", "integer"),
            ("flags", "integer"),
            ("array_prop", "SendProp|nil"),
            ("data_table", "SendTable|nil"),
            ("exclude_data_table_name", "string|nil"),
            ("parent_array_prop_name", "string|nil"),
        ] {
            out.write(format_args!("---@field {field} {ty}\n"));
        }
        out.line("local SendProp = {}");
        for (method, ret) in [
            ("get_name", "string"),
            ("get_type", "integer"),
            ("get_offset", "integer"),
            ("get_length", "integer"),
            ("get_element_stride", "integer"),
            ("get_flags", "integer"),
            ("get_array_prop", "SendProp|nil"),
            ("get_data_table", "SendTable|nil"),
            ("get_exclude_data_table_name", "string|nil"),
            ("get_parent_array_prop_name", "string|nil"),
            ("is_signed", "boolean"),
            ("is_exclude_prop", "boolean"),
            ("is_inside_array", "boolean"),
        ] {
            out.write(format_args!("---@return {ret}\nfunction SendProp:{method}() end\n"));
        }
        out.line("---@param entity_index integer");
        out.line("---@param element integer|nil");
        out.line("---@return SendPropVariant");
        out.line("function SendProp:call_proxy(entity_index, element) end");
        out.line("");
    }
}

fn registry(lua: &Lua) -> LuaResult<Rc<PropRegistry>> {
    Ok(LuaBridgeCtx::borrow_ctx(lua)?.registry.clone())
}

/// Lua view of a `ServerClass`.
#[derive(Clone)]
pub struct LuaServerClass {
    registry: Rc<PropRegistry>,
    class_index: usize,
}

impl UserData for LuaServerClass {
    fn add_fields<F: UserDataFields<Self>>(fields: &mut F) {
        fields.add_field_method_get("name", |_, this| {
            Ok(this.registry.server_class_at(this.class_index)?.name().to_string())
        });
        fields.add_field_method_get("class_index", |_, this| Ok(this.class_index));
        fields.add_field_method_get("table", |_, this| {
            let id = this.registry.server_class_at(this.class_index)?.table();
            Ok(LuaSendTable { registry: this.registry.clone(), id })
        });
        fields.add_field_method_get("next", |_, this| {
            let next = this.registry.server_class_at(this.class_index)?.next();
            Ok(next.map(|class_index| LuaServerClass {
                registry: this.registry.clone(),
                class_index,
            }))
        });
    }

    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            let class = this.registry.server_class_at(this.class_index)?;
            Ok(format!("ServerClass({})", class.name()))
        });
    }
}

/// Lua view of a `SendTable`. Holds an id, never the table itself.
#[derive(Clone)]
pub struct LuaSendTable {
    registry: Rc<PropRegistry>,
    id: TableId,
}

impl LuaSendTable {
    fn table(&self) -> LuaResult<&SendTable> {
        Ok(self.registry.table(self.id)?)
    }

    fn prop(&self, index: usize) -> LuaSendProp {
        LuaSendProp {
            registry: self.registry.clone(),
            table: self.id,
            index,
        }
    }

    /// Resolves a zero based index or a prop name.
    fn lookup(&self, key: Value) -> LuaResult<LuaSendProp> {
        let table = self.table()?;
        let index = match key {
            Value::Integer(i) if i < 0 => {
                return Err(BridgeError::Index { index: i, length: table.len() }.into());
            }
            Value::Integer(i) => {
                let index = i as usize;
                table.get_prop(index)?;
                index
            }
            // 2^0 and friends arrive as floats
            Value::Number(n) if n.fract() == 0.0 && n >= 0.0 => {
                let index = n as usize;
                table.get_prop(index)?;
                index
            }
            Value::String(name) => {
                let name = name.to_str()?.to_string();
                table.get_prop_by_name(&name)?;
                table.prop_index(&name).unwrap_or_default()
            }
            other => {
                return Err(mlua::Error::RuntimeError(format!(
                    "SendTable index must be an integer or a string, not {}.",
                    other.type_name()
                )));
            }
        };
        Ok(self.prop(index))
    }
}

impl UserData for LuaSendTable {
    fn add_fields<F: UserDataFields<Self>>(fields: &mut F) {
        fields.add_field_method_get("name", |_, this| Ok(this.table()?.name().to_string()));
        fields.add_field_method_get("length", |_, this| Ok(this.table()?.len()));
        fields.add_field_method_get("props", |lua, this| {
            let props = lua.create_table()?;
            for index in 0..this.table()?.len() {
                props.set(index + 1, this.prop(index))?;
            }
            Ok(props)
        });
    }

    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("get_name", |_, this, ()| Ok(this.table()?.name().to_string()));
        methods.add_method("get_length", |_, this, ()| Ok(this.table()?.len()));
        methods.add_method("is_initialized", |_, this, ()| Ok(this.table()?.is_initialized()));
        methods.add_method("get_write_flag", |_, this, ()| Ok(this.table()?.write_flag()));
        methods.add_method("has_props_encoded_against_tick_count", |_, this, ()| {
            Ok(this.table()?.has_props_encoded_against_tick_count())
        });
        methods.add_method("set_initialized", |_, this, value: bool| {
            Ok(this.table()?.set_initialized(value)?)
        });
        methods.add_method("set_write_flag", |_, this, value: bool| {
            this.table()?.set_write_flag(value);
            Ok(())
        });
        methods.add_method("set_has_props_encoded_against_tick_count", |_, this, value: bool| {
            this.table()?.set_has_props_encoded_against_tick_count(value);
            Ok(())
        });
        methods.add_method("get_prop", |_, this, key: Value| this.lookup(key));

        methods.add_meta_method(MetaMethod::Len, |_, this, ()| Ok(this.table()?.len()));
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            Ok(format!("SendTable({})", this.table()?.name()))
        });
    }
}

/// Lua view of one `SendProp`, addressed by table and index.
#[derive(Clone)]
pub struct LuaSendProp {
    registry: Rc<PropRegistry>,
    table: TableId,
    index: usize,
}

impl LuaSendProp {
    fn prop(&self) -> LuaResult<&SendProp> {
        Ok(self.registry.table(self.table)?.get_prop(self.index)?)
    }

    fn array_prop(&self) -> LuaResult<Option<LuaSendProp>> {
        Ok(self.prop()?.array_prop_index().map(|index| LuaSendProp {
            registry: self.registry.clone(),
            table: self.table,
            index,
        }))
    }

    fn data_table(&self) -> LuaResult<Option<LuaSendTable>> {
        Ok(self.prop()?.data_table_id().map(|id| LuaSendTable {
            registry: self.registry.clone(),
            id,
        }))
    }
}

impl UserData for LuaSendProp {
    fn add_fields<F: UserDataFields<Self>>(fields: &mut F) {
        fields.add_field_method_get("name", |_, this| Ok(this.prop()?.name().to_string()));
        fields.add_field_method_get("type", |_, this| Ok(this.prop()?.prop_type() as i64));
        fields.add_field_method_get("bits", |_, this| Ok(this.prop()?.bits()));
        fields.add_field_method_get("low_value", |_, this| Ok(this.prop()?.low_value()));
        fields.add_field_method_get("high_value", |_, this| Ok(this.prop()?.high_value()));
        fields.add_field_method_get("high_low_mul", |_, this| Ok(this.prop()?.high_low_mul()));
        fields.add_field_method_get("length", |_, this| Ok(this.prop()?.num_elements()));
        fields.add_field_method_get("element_stride", |_, this| Ok(this.prop()?.element_stride()));
        fields.add_field_method_get("offset", |_, this| Ok(this.prop()?.offset()));
        fields.add_field_method_get("flags", |_, this| Ok(this.prop()?.flags().bits()));
        fields.add_field_method_get("array_prop", |_, this| this.array_prop());
        fields.add_field_method_get("data_table", |_, this| this.data_table());
        fields.add_field_method_get("exclude_data_table_name", |_, this| {
            Ok(this.prop()?.exclude_data_table_name().map(str::to_string))
        });
        fields.add_field_method_get("parent_array_prop_name", |_, this| {
            Ok(this.prop()?.parent_array_prop_name().map(str::to_string))
        });
        fields.add_field_method_get("priority", |_, this| Ok(this.prop()?.priority()?));
    }

    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("get_name", |_, this, ()| Ok(this.prop()?.name().to_string()));
        methods.add_method("get_type", |_, this, ()| Ok(this.prop()?.prop_type() as i64));
        methods.add_method("get_offset", |_, this, ()| Ok(this.prop()?.offset()));
        methods.add_method("get_length", |_, this, ()| Ok(this.prop()?.num_elements()));
        methods.add_method("get_element_stride", |_, this, ()| Ok(this.prop()?.element_stride()));
        methods.add_method("get_flags", |_, this, ()| Ok(this.prop()?.flags().bits()));
        methods.add_method("get_array_prop", |_, this, ()| this.array_prop());
        methods.add_method("get_data_table", |_, this, ()| this.data_table());
        methods.add_method("get_exclude_data_table_name", |_, this, ()| {
            Ok(this.prop()?.exclude_data_table_name().map(str::to_string))
        });
        methods.add_method("get_parent_array_prop_name", |_, this, ()| {
            Ok(this.prop()?.parent_array_prop_name().map(str::to_string))
        });
        methods.add_method("is_signed", |_, this, ()| Ok(this.prop()?.is_signed()));
        methods.add_method("is_exclude_prop", |_, this, ()| Ok(this.prop()?.is_exclude_prop()));
        methods.add_method("is_inside_array", |_, this, ()| Ok(this.prop()?.is_inside_array()));
        methods.add_method("get_priority", |_, this, ()| Ok(this.prop()?.priority()?));

        methods.add_method(
            "call_proxy",
            |lua, this, (entity_index, element): (u32, Option<usize>)| {
                let entity = entity_from_index(lua, entity_index)?;
                let variant = this.prop()?.call_proxy(entity, element.unwrap_or(0))?;
                Ok(LuaSendPropVariant(variant))
            },
        );

        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            let prop = this.prop()?;
            Ok(format!("SendProp({} {})", prop.name(), prop.prop_type()))
        });
    }
}
