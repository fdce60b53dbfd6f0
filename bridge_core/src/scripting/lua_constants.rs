// bridge_core/src/scripting/lua_constants.rs

/// GLOBALS
pub const LUA_BRIDGE_CTX: &str = "lua_bridge_ctx";
pub const PROPS: &str = "props";
pub const ENTITY: &str = "entity";
pub const LOG: &str = "log";
pub const SEND_PROP_VARIANT: &str = "SendPropVariant";

// props tables
pub const SEND_PROP_TYPE: &str = "SendPropType";
pub const SPROP_PREFIX: &str = "SPROP_";
pub const SERVER_CLASSES: &str = "server_classes";
pub const SERVER_CLASS: &str = "server_class";
pub const FIND_TABLE: &str = "find_table";
pub const DUMP_SERVER_CLASSES: &str = "dump_server_classes";

// Vector and color fields
pub const X: &str = "x";
pub const Y: &str = "y";
pub const Z: &str = "z";
pub const R: &str = "r";
pub const G: &str = "g";
pub const B: &str = "b";
pub const A: &str = "a";
