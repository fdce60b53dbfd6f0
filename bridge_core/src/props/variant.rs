// bridge_core/src/props/variant.rs
use crate::props::send_prop::SendPropType;
use crate::error::*;
use glam::Vec3;
use std::fmt;

/// One value produced by a send proxy, tagged by its prop type.
#[derive(Debug, Clone, PartialEq)]
pub enum SendPropVariant {
    Float(f32),
    Int(i32),
    String(String),
    /// Opaque bytes, used by data table proxies.
    Data(Vec<u8>),
    Vector(Vec3),
}

impl Default for SendPropVariant {
    fn default() -> Self {
        SendPropVariant::Float(0.0)
    }
}

/// A Rust type that a `SendPropVariant` can hold.
pub trait VariantPayload: Sized {
    const PROP_TYPE: SendPropType;

    fn from_variant(variant: &SendPropVariant) -> Option<Self>;

    fn into_variant(self) -> SendPropVariant;
}

impl VariantPayload for f32 {
    const PROP_TYPE: SendPropType = SendPropType::Float;

    fn from_variant(variant: &SendPropVariant) -> Option<Self> {
        match variant {
            SendPropVariant::Float(v) => Some(*v),
            _ => None,
        }
    }

    fn into_variant(self) -> SendPropVariant {
        SendPropVariant::Float(self)
    }
}

impl VariantPayload for i32 {
    const PROP_TYPE: SendPropType = SendPropType::Int;

    fn from_variant(variant: &SendPropVariant) -> Option<Self> {
        match variant {
            SendPropVariant::Int(v) => Some(*v),
            _ => None,
        }
    }

    fn into_variant(self) -> SendPropVariant {
        SendPropVariant::Int(self)
    }
}

impl VariantPayload for String {
    const PROP_TYPE: SendPropType = SendPropType::String;

    fn from_variant(variant: &SendPropVariant) -> Option<Self> {
        match variant {
            SendPropVariant::String(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn into_variant(self) -> SendPropVariant {
        SendPropVariant::String(self)
    }
}

impl VariantPayload for Vec<u8> {
    const PROP_TYPE: SendPropType = SendPropType::DataTable;

    fn from_variant(variant: &SendPropVariant) -> Option<Self> {
        match variant {
            SendPropVariant::Data(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn into_variant(self) -> SendPropVariant {
        SendPropVariant::Data(self)
    }
}

impl VariantPayload for Vec3 {
    const PROP_TYPE: SendPropType = SendPropType::Vector;

    fn from_variant(variant: &SendPropVariant) -> Option<Self> {
        match variant {
            SendPropVariant::Vector(v) => Some(*v),
            _ => None,
        }
    }

    fn into_variant(self) -> SendPropVariant {
        SendPropVariant::Vector(self)
    }
}

impl SendPropVariant {
    /// The type tag of the held value.
    pub fn prop_type(&self) -> SendPropType {
        match self {
            SendPropVariant::Float(_) => SendPropType::Float,
            SendPropVariant::Int(_) => SendPropType::Int,
            SendPropVariant::String(_) => SendPropType::String,
            SendPropVariant::Data(_) => SendPropType::DataTable,
            SendPropVariant::Vector(_) => SendPropType::Vector,
        }
    }

    /// Returns the value as `T`, failing if the tag is not `T`'s.
    pub fn get<T: VariantPayload>(&self) -> BridgeResult<T> {
        T::from_variant(self).ok_or(BridgeError::TypeMismatch {
            expected: T::PROP_TYPE,
            actual: self.prop_type(),
        })
    }

    /// Replaces the value and its tag.
    pub fn set<T: VariantPayload>(&mut self, value: T) {
        *self = value.into_variant();
    }

    pub fn get_float(&self) -> BridgeResult<f32> {
        self.get()
    }

    pub fn set_float(&mut self, value: f32) {
        self.set(value);
    }

    pub fn get_int(&self) -> BridgeResult<i32> {
        self.get()
    }

    pub fn set_int(&mut self, value: i32) {
        self.set(value);
    }

    pub fn get_string(&self) -> BridgeResult<String> {
        self.get()
    }

    pub fn set_string(&mut self, value: &str) {
        self.set(value.to_string());
    }

    pub fn get_data(&self) -> BridgeResult<Vec<u8>> {
        self.get()
    }

    pub fn set_data(&mut self, value: &[u8]) {
        self.set(value.to_vec());
    }

    pub fn get_vector(&self) -> BridgeResult<Vec3> {
        self.get()
    }

    pub fn set_vector(&mut self, value: Vec3) {
        self.set(value);
    }

    /// 64 bit payloads only exist on newer engine generations.
    pub fn get_int64(&self) -> BridgeResult<i64> {
        Err(BridgeError::unsupported("get_int64"))
    }

    pub fn set_int64(&mut self, _value: i64) -> BridgeResult<()> {
        Err(BridgeError::unsupported("set_int64"))
    }
}

impl fmt::Display for SendPropVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendPropVariant::Float(v) => write!(f, "{v:.6}"),
            SendPropVariant::Int(v) => write!(f, "{v}"),
            SendPropVariant::String(v) => write!(f, "{v}"),
            SendPropVariant::Data(_) => write!(f, "Binary"),
            SendPropVariant::Vector(v) => write!(f, "({:.3},{:.3},{:.3})", v.x, v.y, v.z),
        }
    }
}
