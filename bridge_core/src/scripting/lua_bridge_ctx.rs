// bridge_core/src/scripting/lua_bridge_ctx.rs
use crate::entities::field_store::FieldStore;
use crate::props::registry::PropRegistry;
use crate::scripting::lua_constants::*;
use mlua::prelude::LuaResult;
use std::cell::RefCell;
use mlua::UserDataRef;
use mlua::UserData;
use std::rc::Rc;
use mlua::Lua;

/// The Lua-exposed context that gives scripts access to the engine's
/// props and field store.
#[derive(Clone)]
pub struct LuaBridgeCtx {
    pub registry: Rc<PropRegistry>,
    pub store: Rc<RefCell<dyn FieldStore>>,
}

impl UserData for LuaBridgeCtx {}

impl LuaBridgeCtx {
    pub fn new(registry: Rc<PropRegistry>, store: Rc<RefCell<dyn FieldStore>>) -> Self {
        Self { registry, store }
    }

    /// Registers this `LuaBridgeCtx` instance in the Lua global table.
    pub fn set_lua_bridge_ctx(self, lua: &Lua) -> LuaResult<()> {
        let globals = lua.globals();
        globals.set(LUA_BRIDGE_CTX, self)?;
        Ok(())
    }

    /// Retrieves a borrowed reference to the stored `LuaBridgeCtx`.
    pub fn borrow_ctx(lua: &Lua) -> LuaResult<UserDataRef<LuaBridgeCtx>> {
        let globals = lua.globals();
        let user_data: mlua::AnyUserData = globals.get(LUA_BRIDGE_CTX)?;
        user_data.borrow::<LuaBridgeCtx>()
    }
}
