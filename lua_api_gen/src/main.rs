// lua_api_gen/src/main.rs
use bridge_core::scripting::modules::lua_module::*;
use bridge_core::storage::bridge_config::*;
use bridge_core::logging::logging::init_logger;
use std::error::Error;
use std::path::PathBuf;
use std::env;

fn main() -> Result<(), Box<dyn Error>> {
    // An explicit config path wins over the per-user one
    let config_path = env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(default_config_path);

    let config = match &config_path {
        Some(path) => load_config(path),
        None => BridgeConfig::default(),
    };

    let _logger = init_logger(&config)?;

    let modules = inventory::iter::<LuaApiRegistry>.into_iter().count();
    log::info!(
        "Generating Lua API for {modules} modules into {}.",
        config.lua_api_dir.display()
    );

    for path in generate_lua_api(&config.lua_api_dir)? {
        println!("Written to: {}", path.display());
    }

    Ok(())
}
