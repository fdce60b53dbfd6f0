// bridge_core/src/scripting/modules/entity_module.rs
use crate::entities::key_values::{Color, KeyValue, KeyValues};
use crate::entities::entity_handle::EntityHandle;
use crate::scripting::modules::lua_module::*;
use crate::scripting::lua_bridge_ctx::LuaBridgeCtx;
use crate::entities::field_store::FieldStore;
use crate::scripting::lua_constants::*;
use crate::error::BridgeResult;
use crate::error::BridgeError;
use mlua::prelude::LuaResult;
use mlua::UserDataMethods;
use mlua::UserDataFields;
use mlua::MetaMethod;
use mlua::UserData;
use glam::Vec3;
use mlua::Value;
use mlua::Table;
use mlua::Lua;
use crate::*;

/// Lua module that exposes the `entity(index)` constructor.
#[derive(Default)]
pub struct EntityModule;
register_lua_module!(EntityModule);
register_lua_api!(EntityModule, "entity.lua");

impl LuaModule for EntityModule {
    fn register(&self, lua: &Lua) -> LuaResult<()> {
        let factory = lua.create_function(|lua, index: u32| {
            Ok(LuaEntity {
                handle: entity_from_index(lua, index)?,
            })
        })?;
        lua.globals().set(ENTITY, factory)?;
        Ok(())
    }
}

impl LuaApi for EntityModule {
    fn emit_api(&self, out: &mut LuaApiWriter) {
        out.line("---@class Vector");
        out.line("---@field x number");
        out.line("---@field y number");
        out.line("---@field z number");
        out.line("");
        out.line("---@class Color");
        out.line("---@field r integer");
        out.line("---@field g integer");
        out.line("---@field b integer");
        out.line("---@field a integer");
        out.line("");
        out.line("---@class Entity");
        out.line("---@field index integer");
        out.line("---@field int_handle integer");
        out.line("---@field class_name string");
        out.line("local Entity = {}");
        for (method, ret) in [
            ("get_key_value_string", "string"),
            ("get_key_value_int", "integer"),
            ("get_key_value_float", "number"),
            ("get_key_value_bool", "boolean"),
            ("get_key_value_vector", "Vector"),
            ("get_key_value_color", "Color"),
        ] {
            out.write(format_args!(
                "---@param name string\n---@return {ret}\nfunction Entity:{method}(name) end\n"
            ));
        }
        out.line("---@param name string");
        out.line("---@param value integer|number|boolean|string|Vector|Color");
        out.line("function Entity:set_key_value(name, value) end");
        out.line("---@param name string");
        out.line("---@param color Color");
        out.line("function Entity:set_key_value_color(name, color) end");
        out.line("");
        out.line("---@param index integer");
        out.line("---@return Entity");
        out.line("function entity(index) end");
    }
}

/// Looks up the live entity at `index` in the bridged store.
pub fn entity_from_index(lua: &Lua, index: u32) -> LuaResult<EntityHandle> {
    let ctx = LuaBridgeCtx::borrow_ctx(lua)?;
    let store = ctx.store.borrow();
    store
        .entity_from_index(index)
        .ok_or_else(|| BridgeError::NotFound {
            what: "Entity",
            name: index.to_string(),
        }.into())
}

/// Runs `f` against the bridged store.
fn with_store<R>(lua: &Lua, f: impl FnOnce(&dyn FieldStore) -> BridgeResult<R>) -> LuaResult<R> {
    let ctx = LuaBridgeCtx::borrow_ctx(lua)?;
    let store = ctx.store.borrow();
    Ok(f(&*store)?)
}

fn with_store_mut<R>(lua: &Lua, f: impl FnOnce(&mut dyn FieldStore) -> BridgeResult<R>) -> LuaResult<R> {
    let ctx = LuaBridgeCtx::borrow_ctx(lua)?;
    let mut store = ctx.store.borrow_mut();
    Ok(f(&mut *store)?)
}

pub fn vector_to_lua(lua: &Lua, v: Vec3) -> LuaResult<Table> {
    let tbl = lua.create_table()?;
    tbl.set(X, v.x)?;
    tbl.set(Y, v.y)?;
    tbl.set(Z, v.z)?;
    Ok(tbl)
}

pub fn vector_from_lua(tbl: &Table) -> LuaResult<Vec3> {
    Ok(Vec3::new(tbl.get(X)?, tbl.get(Y)?, tbl.get(Z)?))
}

fn color_to_lua(lua: &Lua, c: Color) -> LuaResult<Table> {
    let tbl = lua.create_table()?;
    tbl.set(R, c.r)?;
    tbl.set(G, c.g)?;
    tbl.set(B, c.b)?;
    tbl.set(A, c.a)?;
    Ok(tbl)
}

fn color_from_lua(tbl: &Table) -> LuaResult<Color> {
    Ok(Color::new(tbl.get(R)?, tbl.get(G)?, tbl.get(B)?, tbl.get(A)?))
}

/// Converts a script value into the closed set of writable key values.
fn key_value_from_lua(value: Value) -> LuaResult<KeyValue> {
    match value {
        Value::Boolean(b) => Ok(b.into()),
        Value::Integer(i) => i32::try_from(i)
            .map(KeyValue::Int)
            .map_err(|_| mlua::Error::RuntimeError(format!("{i} does not fit a KeyValue integer."))),
        Value::Number(n) => Ok(KeyValue::Float(n as f32)),
        // Lua strings are bytes; anything that is not UTF-8 is written raw
        Value::String(s) => match s.to_str() {
            Ok(text) => Ok(KeyValue::String(text.to_string())),
            Err(_) => Ok(KeyValue::Buffer(s.as_bytes().to_vec())),
        },
        Value::Table(tbl) if tbl.contains_key(X)? => Ok(vector_from_lua(&tbl)?.into()),
        Value::Table(tbl) if tbl.contains_key(R)? => Ok(color_from_lua(&tbl)?.into()),
        other => Err(mlua::Error::RuntimeError(format!(
            "Cannot store a {} in a KeyValue.",
            other.type_name()
        ))),
    }
}

/// A script's handle on one engine entity.
#[derive(Clone, Copy)]
pub struct LuaEntity {
    pub handle: EntityHandle,
}

impl UserData for LuaEntity {
    fn add_fields<F: UserDataFields<Self>>(fields: &mut F) {
        fields.add_field_method_get("index", |_, this| Ok(this.handle.index()));
        fields.add_field_method_get("int_handle", |_, this| Ok(this.handle.to_int_handle()));
        fields.add_field_method_get("class_name", |lua, this| {
            with_store(lua, |store| {
                store.class_name(this.handle).ok_or_else(|| BridgeError::NotFound {
                    what: "Entity",
                    name: this.handle.to_string(),
                })
            })
        });
    }

    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("get_key_value_string", |lua, this, name: String| {
            with_store(lua, |store| store.get_key_value_string(this.handle, &name))
        });

        methods.add_method("get_key_value_int", |lua, this, name: String| {
            with_store(lua, |store| store.get_key_value_int(this.handle, &name))
        });

        methods.add_method("get_key_value_float", |lua, this, name: String| {
            with_store(lua, |store| store.get_key_value_float(this.handle, &name))
        });

        methods.add_method("get_key_value_bool", |lua, this, name: String| {
            with_store(lua, |store| store.get_key_value_bool(this.handle, &name))
        });

        methods.add_method("get_key_value_vector", |lua, this, name: String| {
            let v = with_store(lua, |store| store.get_key_value_vector(this.handle, &name))?;
            vector_to_lua(lua, v)
        });

        methods.add_method("get_key_value_color", |lua, this, name: String| {
            let c = with_store(lua, |store| store.get_key_value_color(this.handle, &name))?;
            color_to_lua(lua, c)
        });

        methods.add_method("set_key_value", |lua, this, (name, value): (String, Value)| {
            let value = key_value_from_lua(value)?;
            with_store_mut(lua, |store| store.set_key_value_typed(this.handle, &name, value))
        });

        methods.add_method("set_key_value_color", |lua, this, (name, color): (String, Table)| {
            let color = color_from_lua(&color)?;
            with_store_mut(lua, |store| store.set_key_value_color(this.handle, &name, color))
        });

        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| Ok(this.handle.to_string()));
        methods.add_meta_method(MetaMethod::Eq, |_, this, other: mlua::UserDataRef<LuaEntity>| {
            Ok(this.handle == other.handle)
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::entities::entity_handle::EntityHandle;
    use crate::entities::field_store::FieldStore;
    use crate::scripting::script_host::ScriptHost;
    use crate::entities::key_values::KeyValues;
    use crate::testing::{sample_registry, sample_store};

    fn host() -> ScriptHost {
        ScriptHost::new(sample_registry(), sample_store()).unwrap()
    }

    #[test]
    fn typed_getters() {
        let host = host();
        let (name, health, speed, disabled): (String, i32, f32, bool) = host
            .eval(
                r#"
                local e = entity(1)
                return e:get_key_value_string("targetname"),
                       e:get_key_value_int("health"),
                       e:get_key_value_float("speed"),
                       e:get_key_value_bool("disabled")
                "#,
            )
            .unwrap();
        assert_eq!((name.as_str(), health, speed, disabled), ("player_one", 100, 1.5, true));

        let (x, z, g): (f32, f32, u8) = host
            .eval(
                r#"
                local e = entity(1)
                local v = e:get_key_value_vector("origin")
                local c = e:get_key_value_color("rendercolor")
                return v.x, v.z, c.g
                "#,
            )
            .unwrap();
        assert_eq!((x, z, g), (1.0, 3.0, 0));
    }

    #[test]
    fn model_reads_through_the_string_pool() {
        let host = host();
        let model: String = host.eval(r#"return entity(2):get_key_value_string("model")"#).unwrap();
        assert_eq!(model, "models/props/crate.mdl");
    }

    #[test]
    fn errors_surface_as_lua_errors() {
        let host = host();
        let err = host
            .eval::<()>(r#"return entity(1):get_key_value_int("nope")"#)
            .unwrap_err();
        assert!(
            err.to_string().contains("\"nope\" is not a valid KeyValue for entity class \"player\"."),
            "{err}"
        );

        let err = host
            .eval::<()>(r#"return entity(2):get_key_value_vector("origin")"#)
            .unwrap_err();
        assert!(err.to_string().contains("does not seem to be a vector"), "{err}");

        let caught: bool = host
            .eval(r#"return not pcall(function() return entity(42) end)"#)
            .unwrap();
        assert!(caught);
    }

    #[test]
    fn setters_write_through_to_the_store() {
        let host = host();
        host.exec(
            r#"
            local e = entity(1)
            e:set_key_value("health", 50)
            e:set_key_value("speed", 0.25)
            e:set_key_value("origin", { x = 4, y = 5, z = 6 })
            e:set_key_value_color("rendercolor", { r = 1, g = 2, b = 3, a = 4 })
            e:set_key_value("model", "models/other.mdl")
            "#,
        )
        .unwrap();

        let store = host.store();
        let store = store.borrow();
        let e = EntityHandle::new(1, 0).unwrap();
        assert_eq!(store.get_key_value_string(e, "health").unwrap(), "50");
        assert_eq!(store.get_key_value_string(e, "speed").unwrap(), "0.250000");
        assert_eq!(store.get_key_value_string(e, "origin").unwrap(), "4.000000 5.000000 6.000000");
        assert_eq!(store.get_key_value_string(e, "rendercolor").unwrap(), "1 2 3 4");
        assert_eq!(store.get_key_value_string(e, "model").unwrap(), "models/other.mdl");
    }

    #[test]
    fn byte_strings_are_written_raw() {
        let host = host();
        let text: String = host
            .eval(
                r#"
                local e = entity(1)
                e:set_key_value("targetname", "\xff\xfe")
                return e:get_key_value_string("targetname")
                "#,
            )
            .unwrap();
        assert_eq!(text, "\u{FFFD}\u{FFFD}");

        let store = host.store();
        let raw = store
            .borrow()
            .get_key_value(EntityHandle::new(1, 0).unwrap(), "targetname", 1024)
            .unwrap();
        assert_eq!(raw, b"\xff\xfe\0".to_vec());
    }

    #[test]
    fn entity_fields() {
        let host = host();
        let (index, handle, class): (u32, u32, String) = host
            .eval(r#"local e = entity(2) return e.index, e.int_handle, e.class_name"#)
            .unwrap();
        assert_eq!((index, handle, class.as_str()), (2, 2 | (5 << 12), "prop_physics"));
        assert!(host.eval::<bool>("return entity(1) == entity(1)").unwrap());
    }
}
