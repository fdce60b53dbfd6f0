// bridge_core/src/scripting/modules/variant_module.rs
use crate::scripting::modules::entity_module::{vector_from_lua, vector_to_lua};
use crate::scripting::modules::lua_module::*;
use crate::props::variant::SendPropVariant;
use crate::scripting::lua_constants::*;
use mlua::prelude::LuaResult;
use mlua::UserDataMethods;
use mlua::UserDataFields;
use mlua::MetaMethod;
use mlua::UserData;
use mlua::Table;
use mlua::Lua;
use crate::*;

/// Lua module that exposes the `SendPropVariant()` constructor.
#[derive(Default)]
pub struct VariantModule;
register_lua_module!(VariantModule);
register_lua_api!(VariantModule, "props.lua");

impl LuaModule for VariantModule {
    fn register(&self, lua: &Lua) -> LuaResult<()> {
        let ctor = lua.create_function(|_, ()| Ok(LuaSendPropVariant::default()))?;
        lua.globals().set(SEND_PROP_VARIANT, ctor)?;
        Ok(())
    }
}

impl LuaApi for VariantModule {
    fn emit_api(&self, out: &mut LuaApiWriter) {
        out.line("---@class SendPropVariant");
        out.line("---@field type integer");
        out.line("local SendPropVariant = {}");
        for (kind, ty) in [
            ("float", "number"),
            ("int", "integer"),
            ("string", "string"),
            ("data", "string"),
            ("vector", "Vector"),
        ] {
            out.write(format_args!(
                "---@return {ty}\nfunction SendPropVariant:get_{kind}() end\n\
                 ---@param value {ty}\nfunction SendPropVariant:set_{kind}(value) end\n"
            ));
        }
        out.line("---@return string");
        out.line("function SendPropVariant:to_string() end");
        out.line("");
        out.line("---@return SendPropVariant");
        out.write(format_args!("function {SEND_PROP_VARIANT}() end\n\n"));
    }
}

/// A `SendPropVariant` owned by a script.
#[derive(Clone, Default)]
pub struct LuaSendPropVariant(pub SendPropVariant);

impl UserData for LuaSendPropVariant {
    fn add_fields<F: UserDataFields<Self>>(fields: &mut F) {
        fields.add_field_method_get("type", |_, this| Ok(this.0.prop_type() as i64));
    }

    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("to_string", |_, this, ()| Ok(this.0.to_string()));

        methods.add_method("get_float", |_, this, ()| Ok(this.0.get_float()?));
        methods.add_method("get_int", |_, this, ()| Ok(this.0.get_int()?));
        methods.add_method("get_string", |_, this, ()| Ok(this.0.get_string()?));
        methods.add_method("get_data", |lua, this, ()| lua.create_string(this.0.get_data()?));
        methods.add_method("get_vector", |lua, this, ()| vector_to_lua(lua, this.0.get_vector()?));
        methods.add_method("get_int64", |_, this, ()| Ok(this.0.get_int64()?));

        methods.add_method_mut("set_float", |_, this, value: f32| {
            this.0.set_float(value);
            Ok(())
        });
        methods.add_method_mut("set_int", |_, this, value: i32| {
            this.0.set_int(value);
            Ok(())
        });
        methods.add_method_mut("set_string", |_, this, value: String| {
            this.0.set_string(&value);
            Ok(())
        });
        methods.add_method_mut("set_data", |_, this, value: mlua::String| {
            this.0.set_data(&value.as_bytes());
            Ok(())
        });
        methods.add_method_mut("set_vector", |_, this, value: Table| {
            this.0.set_vector(vector_from_lua(&value)?);
            Ok(())
        });
        methods.add_method_mut("set_int64", |_, this, value: i64| Ok(this.0.set_int64(value)?));

        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| Ok(this.0.to_string()));
    }
}
