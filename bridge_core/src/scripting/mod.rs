pub mod lua_bridge_ctx;
pub mod lua_constants;
pub mod modules;
pub mod script_host;
