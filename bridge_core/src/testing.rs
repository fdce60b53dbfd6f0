// bridge_core/src/testing.rs
use crate::entities::field_store::MemoryFieldStore;
use crate::entities::entity_handle::EntityHandle;
use crate::props::send_prop::SendPropFlags;
use crate::props::registry::PropRegistry;
use crate::props::variant::SendPropVariant;
use crate::props::send_table::SendTable;
use crate::props::send_prop::SendProp;

/// Two classes sharing `DT_BaseEntity`:
///
/// - `CBaseEntity` -> `DT_BaseEntity`
/// - `CBasePlayer` -> `DT_BasePlayer` -> (`DT_BaseEntity` at 0, `DT_LocalPlayerExclusive` at 256)
pub fn sample_registry() -> PropRegistry {
    let mut registry = PropRegistry::new();

    let base = registry.add_table(SendTable::new("DT_BaseEntity")).unwrap();
    registry.add_prop(base, SendProp::vector("m_vecOrigin", 0, 0, 0.0, 0.0)).unwrap();
    registry
        .add_prop(
            base,
            SendProp::int("m_iTeamNum", 12, 6)
                .with_flags(SendPropFlags::UNSIGNED)
                .with_proxy(|_, entity, _| Ok(SendPropVariant::Int(entity.index() as i32 % 4))),
        )
        .unwrap();
    registry
        .add_prop(base, SendProp::int("m_flSimulationTime", 16, 8).with_flags(SendPropFlags::CHANGES_OFTEN))
        .unwrap();
    registry.add_prop(base, SendProp::string("m_iName", 20)).unwrap();

    let local = registry.add_table(SendTable::new("DT_LocalPlayerExclusive")).unwrap();
    registry
        .add_prop(local, SendProp::vector("m_vecVelocity", 16, 20, -2048.0, 2048.0))
        .unwrap();

    let player = registry.add_table(SendTable::new("DT_BasePlayer")).unwrap();
    registry
        .add_prop(player, SendProp::exclude("DT_BaseEntity", "m_flSimulationTime"))
        .unwrap();
    registry.add_prop(player, SendProp::data_table("baseclass", 0, base)).unwrap();
    registry.add_prop(player, SendProp::int("m_iHealth", 200, 10)).unwrap();
    registry
        .add_prop(player, SendProp::int("000", 204, 8).with_parent_array("m_iAmmo"))
        .unwrap();
    registry.add_prop(player, SendProp::array("m_iAmmo", 3, 32, 4)).unwrap();
    registry.add_prop(player, SendProp::data_table("localdata", 256, local)).unwrap();

    registry.register_server_class("CBaseEntity", base).unwrap();
    registry.register_server_class("CBasePlayer", player).unwrap();
    registry.initialize_all().unwrap();
    registry
}

/// Entity 1 is a player, entity 2 a physics prop.
pub fn sample_store() -> MemoryFieldStore {
    let mut store = MemoryFieldStore::new();
    store.spawn(
        EntityHandle::new(1, 0).unwrap(),
        "player",
        &[
            ("targetname", "player_one"),
            ("health", "100"),
            ("speed", "1.5"),
            ("origin", "1.0 2.0 3.0"),
            ("rendercolor", "255 0 128 255"),
            ("disabled", "1"),
            ("model", "models/player.mdl"),
        ],
    );
    store.spawn(
        EntityHandle::new(2, 5).unwrap(),
        "prop_physics",
        &[("model", "models/props/crate.mdl"), ("origin", "1.0 2.0")],
    );
    store
}
