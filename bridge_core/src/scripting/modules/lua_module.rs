// bridge_core/src/scripting/modules/lua_module.rs
use std::collections::HashMap;
use mlua::prelude::LuaResult;
use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::fmt::Write;
use std::path::Path;
use mlua::Lua;
use std::io;
use std::fs;

/// Every part of the bridge that wants to expose Lua functions implements this.
pub trait LuaModule {
    /// Registers the module's functions, types and globals with the given Lua state.
    fn register(&self, lua: &Lua) -> LuaResult<()>;
}

/// Registry that the inventory crate will collect.
pub struct LuaModuleRegistry {
    pub name: &'static str,
    /// Called once for every module when a script host starts.
    pub ctor: fn() -> Box<dyn LuaModule>,
}

inventory::collect!(LuaModuleRegistry);

/// All registered modules, sorted by name so registration order is stable.
pub static LUA_MODULES: Lazy<Vec<&'static LuaModuleRegistry>> = Lazy::new(|| {
    let mut modules: Vec<_> = inventory::iter::<LuaModuleRegistry>.into_iter().collect();
    modules.sort_by_key(|reg| reg.name);
    modules
});

/// Registers every collected module with `lua`.
pub fn register_all_modules(lua: &Lua) -> LuaResult<()> {
    for reg in LUA_MODULES.iter() {
        (reg.ctor)().register(lua)?;
        log::debug!("Registered Lua module {}.", reg.name);
    }
    Ok(())
}

/// Trait which ensures lua api is implemented for a module.
pub trait LuaApi {
    /// Emit Lua signatures.
    fn emit_api(&self, out: &mut LuaApiWriter);
}

/// Writes the lua api for a module.
#[derive(Default)]
pub struct LuaApiWriter {
    pub buf: String,
}

impl LuaApiWriter {
    pub fn new() -> Self {
        Self { buf: String::new() }
    }

    pub fn line(&mut self, s: &str) {
        self.buf.push_str(s);
        self.buf.push('\n');
    }

    pub fn write(&mut self, args: std::fmt::Arguments) {
        let _ = self.buf.write_fmt(args);
    }
}

pub struct LuaApiRegistry {
    pub name: &'static str,
    /// File the stubs of this module are written to.
    pub filename: &'static str,
    pub ctor: fn() -> Box<dyn LuaApi>,
}

inventory::collect!(LuaApiRegistry);

#[macro_export]
macro_rules! register_lua_api {
    ($ty:ty, $file:expr) => {
        inventory::submit! {
            $crate::scripting::modules::lua_module::LuaApiRegistry {
                name: stringify!($ty),
                filename: $file,
                ctor: || Box::new(<$ty>::default()),
            }
        }
    };
}

#[macro_export]
macro_rules! register_lua_module {
    ($ty:ty) => {
        inventory::submit! {
            $crate::scripting::modules::lua_module::LuaModuleRegistry {
                name: stringify!($ty),
                ctor: || {
                    // Enforces each module to implement its api generation.
                    fn _assert<T: $crate::scripting::modules::lua_module::LuaExposedModule>() {}
                    _assert::<$ty>();
                    Box::new(<$ty>::default())
                },
            }
        }
    };
}

pub trait LuaExposedModule: LuaModule + LuaApi {}

impl<T> LuaExposedModule for T
where
    T: LuaModule + LuaApi
{}

/// Collects the api of every module, grouped by target file.
pub fn collect_lua_api() -> HashMap<&'static str, String> {
    let mut per_file: HashMap<&'static str, String> = HashMap::new();

    let mut regs: Vec<_> = inventory::iter::<LuaApiRegistry>.into_iter().collect();
    regs.sort_by_key(|reg| (reg.filename, reg.name));

    for reg in regs {
        let module = (reg.ctor)();
        let mut writer = LuaApiWriter::new();
        module.emit_api(&mut writer);

        per_file
            .entry(reg.filename)
            .and_modify(|buf| buf.push_str(&writer.buf))
            .or_insert_with(|| writer.buf);
    }

    per_file
}

/// Writes the module api to .lua files in `out_dir` and returns their paths.
pub fn generate_lua_api(out_dir: &Path) -> io::Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;

    let mut written = Vec::new();
    for (filename, content) in collect_lua_api() {
        let path = out_dir.join(filename);
        let mut file = String::from("-- Auto-generated. Do not edit.\n---@meta\n\n");
        file.push_str(&content);
        fs::write(&path, file)?;
        written.push(path);
    }

    written.sort();
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_module_is_collected() {
        let names: Vec<&str> = LUA_MODULES.iter().map(|reg| reg.name).collect();
        for expected in ["EntityModule", "LoggingModule", "PropsModule", "VariantModule"] {
            assert!(names.contains(&expected), "{expected} missing from {names:?}");
        }
    }

    #[test]
    fn api_files_carry_the_meta_header() {
        let dir = tempfile::tempdir().unwrap();
        let written = generate_lua_api(dir.path()).unwrap();
        assert!(!written.is_empty());

        let props = fs::read_to_string(dir.path().join("props.lua")).unwrap();
        assert!(props.starts_with("-- Auto-generated. Do not edit.\n---@meta\n"));
        assert!(props.contains("---@class SendTable"));
    }
}
