// bridge_core/src/props/send_prop.rs
use crate::entities::entity_handle::EntityHandle;
use crate::props::variant::SendPropVariant;
use crate::props::registry::TableId;
use crate::error::*;
use strum_macros::IntoStaticStr;
use strum_macros::EnumString;
use strum_macros::EnumIter;
use strum_macros::Display;
use serde::Deserialize;
use serde::Serialize;
use std::ops::BitOr;
use std::rc::Rc;
use std::fmt;

/// The engine's networked property types.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Display, EnumIter, EnumString, IntoStaticStr,
    Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum SendPropType {
    Int = 0,
    Float = 1,
    Vector = 2,
    VectorXY = 3,
    String = 4,
    Array = 5,
    DataTable = 6,
}

/// Name of the 64 bit integer type of newer engine generations. Not supported here.
pub const INT64_TYPE_NAME: &str = "INT64";

/// Bit set modifying how a prop is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SendPropFlags(pub u32);

impl SendPropFlags {
    pub const NONE: Self = Self(0);
    pub const UNSIGNED: Self = Self(1 << 0);
    pub const COORD: Self = Self(1 << 1);
    pub const NOSCALE: Self = Self(1 << 2);
    pub const ROUNDDOWN: Self = Self(1 << 3);
    pub const ROUNDUP: Self = Self(1 << 4);
    pub const NORMAL: Self = Self(1 << 5);
    pub const EXCLUDE: Self = Self(1 << 6);
    pub const XYZE: Self = Self(1 << 7);
    pub const INSIDEARRAY: Self = Self(1 << 8);
    pub const PROXY_ALWAYS_YES: Self = Self(1 << 9);
    pub const CHANGES_OFTEN: Self = Self(1 << 10);
    pub const IS_A_VECTOR_ELEM: Self = Self(1 << 11);
    pub const COLLAPSIBLE: Self = Self(1 << 12);
    pub const COORD_MP: Self = Self(1 << 13);
    pub const COORD_MP_LOWPRECISION: Self = Self(1 << 14);
    pub const COORD_MP_INTEGRAL: Self = Self(1 << 15);

    /// Every named flag, in bit order.
    pub const ALL: &'static [(&'static str, SendPropFlags)] = &[
        ("UNSIGNED", Self::UNSIGNED),
        ("COORD", Self::COORD),
        ("NOSCALE", Self::NOSCALE),
        ("ROUNDDOWN", Self::ROUNDDOWN),
        ("ROUNDUP", Self::ROUNDUP),
        ("NORMAL", Self::NORMAL),
        ("EXCLUDE", Self::EXCLUDE),
        ("XYZE", Self::XYZE),
        ("INSIDEARRAY", Self::INSIDEARRAY),
        ("PROXY_ALWAYS_YES", Self::PROXY_ALWAYS_YES),
        ("CHANGES_OFTEN", Self::CHANGES_OFTEN),
        ("IS_A_VECTOR_ELEM", Self::IS_A_VECTOR_ELEM),
        ("COLLAPSIBLE", Self::COLLAPSIBLE),
        ("COORD_MP", Self::COORD_MP),
        ("COORD_MP_LOWPRECISION", Self::COORD_MP_LOWPRECISION),
        ("COORD_MP_INTEGRAL", Self::COORD_MP_INTEGRAL),
    ];

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: SendPropFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Names of the flags that are set, in bit order.
    pub fn names(self) -> Vec<&'static str> {
        Self::ALL
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(name, _)| *name)
            .collect()
    }
}

impl BitOr for SendPropFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for SendPropFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "NONE");
        }
        write!(f, "{}", self.names().join("|"))
    }
}

/// Computes the value of a prop for one entity. The `usize` is the array element.
pub type SendProxyFn = dyn Fn(&SendProp, EntityHandle, usize) -> BridgeResult<SendPropVariant>;

/// What a prop points at besides its own scalar data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PropLink {
    Scalar,
    /// Index of the element prop inside the owning table.
    ArrayElement(usize),
    DataTable(TableId),
}

/// One named, typed field of a send table.
#[derive(Clone)]
pub struct SendProp {
    name: String,
    prop_type: SendPropType,
    link: PropLink,
    offset: usize,
    bits: u32,
    low_value: f32,
    high_value: f32,
    high_low_mul: f32,
    flags: SendPropFlags,
    num_elements: usize,
    element_stride: usize,
    exclude_data_table_name: Option<String>,
    parent_array_prop_name: Option<String>,
    proxy: Option<Rc<SendProxyFn>>,
}

impl SendProp {
    fn scalar(name: &str, prop_type: SendPropType, offset: usize, bits: u32) -> Self {
        Self {
            name: name.to_string(),
            prop_type,
            link: PropLink::Scalar,
            offset,
            bits,
            low_value: 0.0,
            high_value: 0.0,
            high_low_mul: 0.0,
            flags: SendPropFlags::NONE,
            num_elements: 1,
            element_stride: 0,
            exclude_data_table_name: None,
            parent_array_prop_name: None,
            proxy: None,
        }
    }

    pub fn int(name: &str, offset: usize, bits: u32) -> Self {
        Self::scalar(name, SendPropType::Int, offset, bits)
    }

    /// A quantized float in `[low, high]`.
    pub fn float(name: &str, offset: usize, bits: u32, low: f32, high: f32) -> Self {
        let mut prop = Self::scalar(name, SendPropType::Float, offset, bits);
        prop.low_value = low;
        prop.high_value = high;
        prop.high_low_mul = range_multiplier(bits, high - low);
        prop
    }

    pub fn vector(name: &str, offset: usize, bits: u32, low: f32, high: f32) -> Self {
        let mut prop = Self::float(name, offset, bits, low, high);
        prop.prop_type = SendPropType::Vector;
        prop
    }

    pub fn vector_xy(name: &str, offset: usize, bits: u32, low: f32, high: f32) -> Self {
        let mut prop = Self::float(name, offset, bits, low, high);
        prop.prop_type = SendPropType::VectorXY;
        prop
    }

    pub fn string(name: &str, offset: usize) -> Self {
        Self::scalar(name, SendPropType::String, offset, 0)
    }

    /// An array whose element prop sits at `element_index` in the same table.
    pub fn array(name: &str, element_index: usize, num_elements: usize, element_stride: usize) -> Self {
        let mut prop = Self::scalar(name, SendPropType::Array, 0, 0);
        prop.link = PropLink::ArrayElement(element_index);
        prop.num_elements = num_elements;
        prop.element_stride = element_stride;
        prop
    }

    /// A nested table embedded at `offset`.
    pub fn data_table(name: &str, offset: usize, table: TableId) -> Self {
        let mut prop = Self::scalar(name, SendPropType::DataTable, offset, 0);
        prop.link = PropLink::DataTable(table);
        prop
    }

    /// Excludes `prop_name` of table `data_table_name` from the owning class.
    pub fn exclude(data_table_name: &str, prop_name: &str) -> Self {
        let mut prop = Self::scalar(prop_name, SendPropType::Int, 0, 0);
        prop.flags = SendPropFlags::EXCLUDE;
        prop.exclude_data_table_name = Some(data_table_name.to_string());
        prop
    }

    pub fn with_flags(mut self, flags: SendPropFlags) -> Self {
        self.flags = self.flags | flags;
        self
    }

    pub fn with_parent_array(mut self, parent_array_prop_name: &str) -> Self {
        self.flags = self.flags | SendPropFlags::INSIDEARRAY;
        self.parent_array_prop_name = Some(parent_array_prop_name.to_string());
        self
    }

    pub fn with_proxy<F>(mut self, proxy: F) -> Self
    where
        F: Fn(&SendProp, EntityHandle, usize) -> BridgeResult<SendPropVariant> + 'static,
    {
        self.proxy = Some(Rc::new(proxy));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prop_type(&self) -> SendPropType {
        self.prop_type
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn low_value(&self) -> f32 {
        self.low_value
    }

    pub fn high_value(&self) -> f32 {
        self.high_value
    }

    pub fn high_low_mul(&self) -> f32 {
        self.high_low_mul
    }

    pub fn flags(&self) -> SendPropFlags {
        self.flags
    }

    /// Array length; 1 for everything that is not an array.
    pub fn num_elements(&self) -> usize {
        self.num_elements
    }

    pub fn element_stride(&self) -> usize {
        self.element_stride
    }

    pub fn exclude_data_table_name(&self) -> Option<&str> {
        self.exclude_data_table_name.as_deref()
    }

    pub fn parent_array_prop_name(&self) -> Option<&str> {
        self.parent_array_prop_name.as_deref()
    }

    /// Index of the element prop in the owning table, for arrays.
    pub fn array_prop_index(&self) -> Option<usize> {
        match self.link {
            PropLink::ArrayElement(index) => Some(index),
            _ => None,
        }
    }

    /// The nested table, for data table props.
    pub fn data_table_id(&self) -> Option<TableId> {
        match self.link {
            PropLink::DataTable(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_signed(&self) -> bool {
        !self.flags.contains(SendPropFlags::UNSIGNED)
    }

    pub fn is_exclude_prop(&self) -> bool {
        self.flags.contains(SendPropFlags::EXCLUDE)
    }

    pub fn is_inside_array(&self) -> bool {
        self.flags.contains(SendPropFlags::INSIDEARRAY)
    }

    /// Only exists on newer engine generations.
    pub fn priority(&self) -> BridgeResult<u8> {
        Err(BridgeError::unsupported("priority"))
    }

    /// Runs the send proxy of this prop for `entity` and returns the produced value.
    pub fn call_proxy(&self, entity: EntityHandle, element: usize) -> BridgeResult<SendPropVariant> {
        match self.prop_type {
            SendPropType::Array | SendPropType::DataTable => {
                return Err(BridgeError::unsupported(format!(
                    "call_proxy on {} prop \"{}\"",
                    self.prop_type, self.name
                )));
            }
            _ => {}
        }

        let proxy = self.proxy.as_ref().ok_or_else(|| {
            BridgeError::unsupported(format!("call_proxy on \"{}\" without a proxy", self.name))
        })?;

        proxy(self, entity, element)
    }
}

impl fmt::Debug for SendProp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendProp")
            .field("name", &self.name)
            .field("prop_type", &self.prop_type)
            .field("link", &self.link)
            .field("offset", &self.offset)
            .field("bits", &self.bits)
            .field("flags", &self.flags)
            .field("num_elements", &self.num_elements)
            .field("has_proxy", &self.proxy.is_some())
            .finish()
    }
}

/// `(2^bits - 1) / range`, the quantization step the engine stores alongside floats.
fn range_multiplier(bits: u32, range: f32) -> f32 {
    if bits == 0 || range <= 0.0 {
        return 0.0;
    }
    let high = if bits >= 32 { u32::MAX - 1 } else { (1u32 << bits) - 1 };
    high as f32 / range
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn type_names_match_engine() {
        let names: Vec<String> = SendPropType::iter().map(|t| t.to_string()).collect();
        assert_eq!(
            names,
            ["INT", "FLOAT", "VECTOR", "VECTORXY", "STRING", "ARRAY", "DATATABLE"]
        );
        assert_eq!(SendPropType::from_str("DATATABLE"), Ok(SendPropType::DataTable));
        assert!(SendPropType::from_str(INT64_TYPE_NAME).is_err());
    }

    #[test]
    fn flag_predicates() {
        let prop = SendProp::int("m_iHealth", 8, 10).with_flags(SendPropFlags::UNSIGNED);
        assert!(!prop.is_signed());
        assert!(!prop.is_exclude_prop());
        assert!(!prop.is_inside_array());

        let element = SendProp::int("000", 0, 4).with_parent_array("m_iAmmo");
        assert!(element.is_inside_array());
        assert_eq!(element.parent_array_prop_name(), Some("m_iAmmo"));

        let excluded = SendProp::exclude("DT_BaseEntity", "m_flSimulationTime");
        assert!(excluded.is_exclude_prop());
        assert_eq!(excluded.exclude_data_table_name(), Some("DT_BaseEntity"));
    }

    #[test]
    fn only_the_matching_link_is_populated() {
        let scalar = SendProp::float("m_flSpeed", 0, 8, 0.0, 255.0);
        assert_eq!(scalar.array_prop_index(), None);
        assert_eq!(scalar.data_table_id(), None);

        let array = SendProp::array("m_iAmmo", 3, 32, 4);
        assert_eq!(array.array_prop_index(), Some(3));
        assert_eq!(array.data_table_id(), None);
        assert_eq!(array.num_elements(), 32);

        let table = SendProp::data_table("baseclass", 0, TableId(2));
        assert_eq!(table.array_prop_index(), None);
        assert_eq!(table.data_table_id(), Some(TableId(2)));
    }

    #[test]
    fn float_range_multiplier() {
        let prop = SendProp::float("m_flCycle", 0, 8, 0.0, 1.0);
        assert_eq!(prop.high_low_mul(), 255.0);
        assert_eq!(SendProp::float("m_flFlat", 0, 8, 1.0, 1.0).high_low_mul(), 0.0);
    }

    #[test]
    fn flags_display() {
        let flags = SendPropFlags::UNSIGNED | SendPropFlags::CHANGES_OFTEN;
        assert_eq!(flags.to_string(), "UNSIGNED|CHANGES_OFTEN");
        assert_eq!(SendPropFlags::NONE.to_string(), "NONE");
        assert_eq!(SendPropFlags::CHANGES_OFTEN.bits(), 1024);
    }

    #[test]
    fn call_proxy_requires_a_proxy() {
        let entity = EntityHandle::new(1, 0).unwrap();
        let bare = SendProp::int("m_iTeamNum", 0, 6);
        let err = bare.call_proxy(entity, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);

        let proxied = SendProp::int("m_iTeamNum", 0, 6)
            .with_proxy(|_, entity, _| Ok(SendPropVariant::Int(entity.index() as i32 + 1)));
        assert_eq!(proxied.call_proxy(entity, 0), Ok(SendPropVariant::Int(2)));

        let array = SendProp::array("m_iAmmo", 0, 4, 4);
        assert_eq!(
            array.call_proxy(entity, 0).unwrap_err().kind(),
            ErrorKind::UnsupportedOperation
        );
    }

    #[test]
    fn priority_is_unsupported() {
        let prop = SendProp::int("m_fFlags", 0, 10);
        assert_eq!(prop.priority().unwrap_err().kind(), ErrorKind::UnsupportedOperation);
    }
}
