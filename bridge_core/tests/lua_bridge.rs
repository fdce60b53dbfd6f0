// bridge_core/tests/lua_bridge.rs
use bridge_core::entities::field_store::MemoryFieldStore;
use bridge_core::entities::entity_handle::EntityHandle;
use bridge_core::scripting::script_host::ScriptHost;
use bridge_core::entities::key_values::KeyValues;
use bridge_core::props::send_prop::SendPropFlags;
use bridge_core::props::registry::PropRegistry;
use bridge_core::props::variant::SendPropVariant;
use bridge_core::props::send_table::SendTable;
use bridge_core::props::send_prop::SendProp;
use bridge_core::error::ErrorKind;
use std::io::Write;

fn door_registry() -> PropRegistry {
    let mut registry = PropRegistry::new();

    let base = registry.add_table(SendTable::new("DT_BaseEntity")).unwrap();
    registry
        .add_prop(base, SendProp::vector("m_vecOrigin", 0, 0, 0.0, 0.0))
        .unwrap();

    let door = registry.add_table(SendTable::new("DT_BaseDoor")).unwrap();
    registry
        .add_prop(door, SendProp::data_table("baseclass", 0, base))
        .unwrap();
    registry
        .add_prop(
            door,
            SendProp::float("m_flWaveHeight", 40, 8, 0.0, 8.0)
                .with_flags(SendPropFlags::ROUNDDOWN)
                .with_proxy(|_, _, _| Ok(SendPropVariant::Float(4.0))),
        )
        .unwrap();

    registry.register_server_class("CBaseEntity", base).unwrap();
    registry.register_server_class("CBaseDoor", door).unwrap();
    registry.initialize_all().unwrap();
    registry
}

fn door_store() -> MemoryFieldStore {
    let mut store = MemoryFieldStore::new();
    store.spawn(
        EntityHandle::new(7, 3).unwrap(),
        "func_door",
        &[
            ("speed", "100"),
            ("movedir", "0 90 0"),
            ("rendercolor", "255 255 255 255"),
            ("locked", "0"),
            ("model", "*12"),
        ],
    );
    store
}

#[test]
fn nested_props_resolve_with_offsets() {
    let registry = door_registry();
    let door = registry.table_id("DT_BaseDoor").unwrap();

    let found = registry.find_prop(door, "m_vecOrigin").unwrap();
    assert_eq!(found.prop.name(), "m_vecOrigin");
    assert_eq!(found.offset, 0);

    let err = registry.find_prop(door, "m_iHealth").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn scripts_read_and_write_key_values() {
    let host = ScriptHost::new(door_registry(), door_store()).unwrap();

    host.exec(
        r#"
        local door = entity(7)
        assert(door.class_name == "func_door")
        assert(door:get_key_value_int("speed") == 100)
        assert(door:get_key_value_bool("locked") == false)
        assert(door:get_key_value_string("model") == "*12")

        local dir = door:get_key_value_vector("movedir")
        door:set_key_value("movedir", { x = dir.x, y = dir.y + 90, z = dir.z })
        door:set_key_value("speed", 250)
        door:set_key_value("locked", true)
        "#,
    )
    .unwrap();

    let store = host.store();
    let store = store.borrow();
    let door = EntityHandle::new(7, 3).unwrap();
    assert_eq!(store.get_key_value_int(door, "speed").unwrap(), 250);
    assert!(store.get_key_value_bool(door, "locked").unwrap());
    assert_eq!(
        store.get_key_value_string(door, "movedir").unwrap(),
        "0.000000 180.000000 0.000000"
    );
}

#[test]
fn script_errors_carry_bridge_messages() {
    let host = ScriptHost::new(door_registry(), door_store()).unwrap();

    let err = host
        .exec(r#"entity(7):get_key_value_string("health")"#)
        .unwrap_err()
        .to_string();
    assert!(
        err.contains("\"health\" is not a valid KeyValue for entity class \"func_door\"."),
        "{err}"
    );

    let err = host.exec("entity(8)").unwrap_err().to_string();
    assert!(err.contains("Entity \"8\" was not found."), "{err}");

    let ok: bool = host
        .eval(r#"return pcall(function() return entity(7):get_key_value_color("speed") end)"#)
        .unwrap();
    assert!(!ok);
}

#[test]
fn props_and_proxies_from_a_script_file() {
    let host = ScriptHost::new(door_registry(), door_store()).unwrap();

    let mut file = tempfile::Builder::new().suffix(".lua").tempfile().unwrap();
    writeln!(
        file,
        r#"
        local class = props.server_class("CBaseDoor")
        local wave = class.table:get_prop("m_flWaveHeight")
        assert(wave.type == props.SendPropType.FLOAT)
        assert(wave:get_flags() & props.SPROP_ROUNDDOWN ~= 0)
        assert(wave.high_low_mul > 31.8 and wave.high_low_mul < 31.9)
        assert(wave:call_proxy(7):get_float() == 4.0)
        assert(class.next.name == "CBaseEntity")
        assert(class.next.next == nil)
        log.info("door checked")
        "#
    )
    .unwrap();

    host.run_file(file.path()).unwrap();
    assert_eq!(host.eval::<String>("return log.last()").unwrap(), "[Lua] door checked");
}
