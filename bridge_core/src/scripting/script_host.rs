// bridge_core/src/scripting/script_host.rs
use crate::scripting::modules::lua_module::register_all_modules;
use crate::entities::field_store::MemoryFieldStore;
use crate::scripting::lua_bridge_ctx::LuaBridgeCtx;
use crate::entities::field_store::FieldStore;
use crate::props::registry::PropRegistry;
use mlua::prelude::LuaResult;
use mlua::FromLuaMulti;
use std::cell::RefCell;
use std::path::Path;
use std::sync::Arc;
use std::rc::Rc;
use mlua::Lua;
use std::fs;

/// Owns the Lua VM and the state every registered module reads from.
pub struct ScriptHost<S: FieldStore + 'static = MemoryFieldStore> {
    lua: Lua,
    registry: Rc<PropRegistry>,
    store: Rc<RefCell<S>>,
}

impl<S: FieldStore + 'static> ScriptHost<S> {
    /// Creates a VM with every Lua module registered against `registry` and `store`.
    pub fn new(registry: PropRegistry, store: S) -> LuaResult<Self> {
        Self::with_shared(Rc::new(registry), Rc::new(RefCell::new(store)))
    }

    /// Same as `new` for state the caller keeps a handle to.
    pub fn with_shared(registry: Rc<PropRegistry>, store: Rc<RefCell<S>>) -> LuaResult<Self> {
        let lua = Lua::new();

        let shared: Rc<RefCell<dyn FieldStore>> = store.clone();
        LuaBridgeCtx::new(registry.clone(), shared).set_lua_bridge_ctx(&lua)?;
        register_all_modules(&lua)?;

        log::info!(
            "Script host ready with {} tables and {} server classes.",
            registry.tables().count(),
            registry.server_classes().count()
        );

        Ok(Self { lua, registry, store })
    }

    /// Runs a chunk for its side effects.
    pub fn exec(&self, src: &str) -> LuaResult<()> {
        self.lua.load(src).set_name("=bridge").exec()
    }

    /// Runs a chunk and converts whatever it returns.
    pub fn eval<T: FromLuaMulti>(&self, src: &str) -> LuaResult<T> {
        self.lua.load(src).set_name("=bridge").eval()
    }

    /// Loads and runs the script at `path`.
    pub fn run_file(&self, path: &Path) -> LuaResult<()> {
        let src = fs::read_to_string(path)
            .map_err(|e| mlua::Error::ExternalError(Arc::new(e)))?;

        let path_name = path.display().to_string();
        log::debug!("Running script {path_name}.");

        self.lua.load(&src).set_name(path_name).exec()
    }

    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    pub fn registry(&self) -> Rc<PropRegistry> {
        self.registry.clone()
    }

    pub fn store(&self) -> Rc<RefCell<S>> {
        self.store.clone()
    }
}
