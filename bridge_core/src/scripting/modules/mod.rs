pub mod entity_module;
pub mod logging_module;
pub mod lua_module;
pub mod props_module;
pub mod variant_module;
