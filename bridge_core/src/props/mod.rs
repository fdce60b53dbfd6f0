pub mod registry;
pub mod send_prop;
pub mod send_table;
pub mod server_class;
pub mod variant;
