// bridge_core/src/scripting/modules/logging_module.rs
use crate::scripting::modules::lua_module::*;
use crate::logging::logging::last_log;
use crate::scripting::lua_constants::*;
use mlua::prelude::LuaResult;
use mlua::Variadic;
use mlua::Function;
use mlua::Value;
use mlua::Lua;
use crate::*;

/// Log-level strings that are exposed to Lua.
pub const LOG_INFO: &str = "info";
pub const LOG_WARN: &str = "warn";
pub const LOG_ERROR: &str = "error";
pub const LOG_DEBUG: &str = "debug";
pub const LOG_LAST: &str = "last";

/// Lua module that exposes the four log levels as the `log` global.
#[derive(Default)]
pub struct LoggingModule;
register_lua_module!(LoggingModule);
register_lua_api!(LoggingModule, "log.lua");

impl LuaModule for LoggingModule {
    fn register(&self, lua: &Lua) -> LuaResult<()> {
        // Helper that creates a wrapper for a concrete log level
        fn level_wrapper(lua: &Lua, level_name: &'static str) -> LuaResult<Function> {
            lua.create_function(move |_lua, args: Variadic<Value>| {
                let msg = match args.first() {
                    Some(Value::String(s)) => s.to_str()?.to_string(),
                    _ => {
                        return Err(mlua::Error::RuntimeError(format!(
                            "log.{level_name} expects a string"
                        )));
                    }
                };

                match level_name {
                    LOG_INFO => bridge_info!("[Lua] {}", msg),
                    LOG_WARN => bridge_warn!("[Lua] {}", msg),
                    LOG_ERROR => bridge_error!("[Lua] {}", msg),
                    _ => bridge_debug!("[Lua] {}", msg),
                }

                Ok(Value::Nil)
            })
        }

        let log_tbl = lua.create_table()?;
        log_tbl.set(LOG_INFO, level_wrapper(lua, LOG_INFO)?)?;
        log_tbl.set(LOG_WARN, level_wrapper(lua, LOG_WARN)?)?;
        log_tbl.set(LOG_ERROR, level_wrapper(lua, LOG_ERROR)?)?;
        log_tbl.set(LOG_DEBUG, level_wrapper(lua, LOG_DEBUG)?)?;
        log_tbl.set(LOG_LAST, lua.create_function(|_, ()| Ok(last_log()))?)?;

        lua.globals().set(LOG, log_tbl)?;
        Ok(())
    }
}

impl LuaApi for LoggingModule {
    fn emit_api(&self, out: &mut LuaApiWriter) {
        out.line("---@class log");
        out.line("log = {}");
        for level in [LOG_INFO, LOG_WARN, LOG_ERROR, LOG_DEBUG] {
            out.write(format_args!("---@param msg string\nfunction log.{level}(msg) end\n"));
        }
        out.line("---@return string");
        out.write(format_args!("function log.{LOG_LAST}() end\n"));
    }
}

#[cfg(test)]
mod tests {
    use crate::scripting::script_host::ScriptHost;
    use crate::testing::{sample_registry, sample_store};

    #[test]
    fn lua_logs_are_remembered() {
        let host = ScriptHost::new(sample_registry(), sample_store()).unwrap();
        let last: String = host.eval(r#"log.warn("no model") return log.last()"#).unwrap();
        assert_eq!(last, "[Lua] no model");
        assert!(host.exec("log.info(5)").is_err());
    }
}
