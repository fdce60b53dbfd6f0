// bridge_core/src/entities/key_values.rs
use crate::entities::entity_handle::EntityHandle;
use crate::entities::field_store::until_nul;
use crate::entities::field_store::FieldStore;
use crate::error::*;
use std::str::FromStr;
use glam::Vec3;
use std::fmt;

/// Size of the buffer a key value is copied into, terminator included.
pub const MAX_KEY_VALUE_LENGTH: usize = 1024;

/// This field holds an interned string id instead of inline text.
pub const MODEL_FIELD: &str = "model";

/// An 8 bit per channel color, as stored in `rendercolor` style fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.r, self.g, self.b, self.a)
    }
}

/// A value written to a key-value field.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyValue {
    Int(i32),
    Float(f32),
    Vector(Vec3),
    String(String),
    /// Raw bytes, written as they are.
    Buffer(Vec<u8>),
}

impl KeyValue {
    /// The text the engine stores for this value.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            KeyValue::Int(v) => v.to_string().into_bytes(),
            KeyValue::Float(v) => format!("{v:.6}").into_bytes(),
            KeyValue::Vector(v) => format!("{:.6} {:.6} {:.6}", v.x, v.y, v.z).into_bytes(),
            KeyValue::String(v) => v.clone().into_bytes(),
            KeyValue::Buffer(v) => v.clone(),
        }
    }
}

impl From<i32> for KeyValue {
    fn from(value: i32) -> Self {
        KeyValue::Int(value)
    }
}

impl From<f32> for KeyValue {
    fn from(value: f32) -> Self {
        KeyValue::Float(value)
    }
}

impl From<bool> for KeyValue {
    fn from(value: bool) -> Self {
        KeyValue::Int(value as i32)
    }
}

impl From<Vec3> for KeyValue {
    fn from(value: Vec3) -> Self {
        KeyValue::Vector(value)
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::String(value.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        KeyValue::String(value)
    }
}

impl From<Color> for KeyValue {
    fn from(value: Color) -> Self {
        KeyValue::String(value.to_string())
    }
}

/// Typed access to the key values of an entity.
///
/// Every `FieldStore` gets these for free. The store only knows text; these
/// methods parse and validate it, and turn "field does not exist" into
/// `BridgeError::FieldNotFound`.
pub trait KeyValues: FieldStore {
    fn get_key_value_string(&self, entity: EntityHandle, name: &str) -> BridgeResult<String> {
        let raw = self
            .get_key_value(entity, name, MAX_KEY_VALUE_LENGTH)
            .ok_or_else(|| field_not_found(self, entity, name))?;

        if name == MODEL_FIELD {
            return self.resolve_pooled(&raw);
        }

        Ok(String::from_utf8_lossy(until_nul(&raw)).into_owned())
    }

    fn get_key_value_int(&self, entity: EntityHandle, name: &str) -> BridgeResult<i32> {
        let text = self.get_key_value_string(entity, name)?;
        parse_number(&text, "an integer")
    }

    fn get_key_value_float(&self, entity: EntityHandle, name: &str) -> BridgeResult<f32> {
        let text = self.get_key_value_string(entity, name)?;
        parse_number(&text, "a float")
    }

    /// `true` only for the exact text `"1"`.
    fn get_key_value_bool(&self, entity: EntityHandle, name: &str) -> BridgeResult<bool> {
        Ok(self.get_key_value_string(entity, name)? == "1")
    }

    fn get_key_value_vector(&self, entity: EntityHandle, name: &str) -> BridgeResult<Vec3> {
        let text = self.get_key_value_string(entity, name)?;
        let [x, y, z] = parse_tokens::<f32, 3>(&text)
            .ok_or_else(|| BridgeError::Format("KeyValue does not seem to be a vector.".into()))?;
        Ok(Vec3::new(x, y, z))
    }

    fn get_key_value_color(&self, entity: EntityHandle, name: &str) -> BridgeResult<Color> {
        let text = self.get_key_value_string(entity, name)?;
        let [r, g, b, a] = parse_tokens::<u8, 4>(&text)
            .ok_or_else(|| BridgeError::Format("KeyValue does not seem to be a color.".into()))?;
        Ok(Color::new(r, g, b, a))
    }

    fn set_key_value_color(&mut self, entity: EntityHandle, name: &str, color: Color) -> BridgeResult<()> {
        self.set_key_value_typed(entity, name, color.into())
    }

    /// Writes `value` through the store.
    fn set_key_value_typed(&mut self, entity: EntityHandle, name: &str, value: KeyValue) -> BridgeResult<()> {
        let bytes = value.to_bytes();
        if bytes.len() >= MAX_KEY_VALUE_LENGTH {
            return Err(BridgeError::Format(format!(
                "KeyValue \"{name}\" is {} bytes long; the limit is {}.",
                bytes.len(),
                MAX_KEY_VALUE_LENGTH - 1
            )));
        }

        if !self.set_key_value(entity, name, &bytes) {
            return Err(field_not_found(&*self, entity, name));
        }

        log::trace!("Set KeyValue {name:?} on {entity}.");
        Ok(())
    }

    /// Dereferences the pool id held by a `model` buffer.
    fn resolve_pooled(&self, raw: &[u8]) -> BridgeResult<String> {
        const ID_LEN: usize = std::mem::size_of::<usize>();
        let id: [u8; ID_LEN] = raw
            .get(..ID_LEN)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| BridgeError::Format("KeyValue \"model\" holds no string reference.".into()))?;

        let id = usize::from_ne_bytes(id);
        self.pooled_string(id).ok_or_else(|| {
            BridgeError::Format(format!("KeyValue \"model\" refers to unknown string {id}."))
        })
    }
}

impl<S: FieldStore + ?Sized> KeyValues for S {}

fn field_not_found<S: FieldStore + ?Sized>(store: &S, entity: EntityHandle, name: &str) -> BridgeError {
    let class_name = store
        .class_name(entity)
        .unwrap_or_else(|| "<unknown>".to_string());
    log::debug!("KeyValue {name:?} is not part of {class_name:?}.");
    BridgeError::FieldNotFound {
        name: name.to_string(),
        class_name,
    }
}

fn parse_number<T: FromStr>(text: &str, expected: &'static str) -> BridgeResult<T> {
    text.trim().parse().map_err(|_| BridgeError::Parse {
        text: text.to_string(),
        expected,
    })
}

/// Exactly `N` whitespace separated tokens, each parsed as `T`.
fn parse_tokens<T: FromStr + Copy + Default, const N: usize>(text: &str) -> Option<[T; N]> {
    let mut out = [T::default(); N];
    let mut tokens = text.split_whitespace();
    for slot in out.iter_mut() {
        *slot = tokens.next()?.parse().ok()?;
    }
    if tokens.next().is_some() {
        return None;
    }
    Some(out)
}
