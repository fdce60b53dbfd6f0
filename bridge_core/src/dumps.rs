// bridge_core/src/dumps.rs
use crate::props::registry::PropRegistry;
use crate::props::send_prop::SendPropType;
use crate::props::registry::TableId;
use std::collections::HashSet;
use std::fmt::Write;
use std::fmt;

const INDENT: &str = "  ";

/// Writes every server class, newest first, followed by its table tree.
///
/// ```text
/// CBasePlayer (1)
///   DT_BasePlayer
///     m_iHealth INT offset=200 bits=10 flags=NONE
///     baseclass DATATABLE offset=0
///       DT_BaseEntity
///         ...
/// ```
pub fn dump_server_classes<W: Write>(registry: &PropRegistry, out: &mut W) -> fmt::Result {
    for class in registry.server_classes() {
        writeln!(out, "{} ({})", class.name(), class.class_index())?;
        let mut path = HashSet::new();
        dump_table(registry, class.table(), 1, &mut path, out)?;
    }
    Ok(())
}

/// Same as `dump_server_classes`, collected into a string.
pub fn server_classes_to_string(registry: &PropRegistry) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = dump_server_classes(registry, &mut out);
    out
}

fn dump_table<W: Write>(
    registry: &PropRegistry,
    id: TableId,
    depth: usize,
    path: &mut HashSet<TableId>,
    out: &mut W,
) -> fmt::Result {
    let indent = INDENT.repeat(depth);
    let Ok(table) = registry.table(id) else {
        return writeln!(out, "{indent}<missing table {}>", id.0);
    };

    if !path.insert(id) {
        return writeln!(out, "{indent}{} <recursive>", table.name());
    }

    writeln!(out, "{indent}{}", table.name())?;
    for prop in table.iter() {
        write!(out, "{indent}{INDENT}{} {}", prop.name(), prop.prop_type())?;

        if let Some(dt_name) = prop.exclude_data_table_name() {
            writeln!(out, " excluded from {dt_name}")?;
            continue;
        }

        match prop.prop_type() {
            SendPropType::DataTable => {
                writeln!(out, " offset={}", prop.offset())?;
                if let Some(nested) = prop.data_table_id() {
                    dump_table(registry, nested, depth + 2, path, out)?;
                }
            }
            SendPropType::Array => {
                writeln!(
                    out,
                    " length={} stride={}",
                    prop.num_elements(),
                    prop.element_stride()
                )?;
            }
            _ => {
                writeln!(
                    out,
                    " offset={} bits={} flags={}",
                    prop.offset(),
                    prop.bits(),
                    prop.flags()
                )?;
            }
        }
    }

    path.remove(&id);
    Ok(())
}
