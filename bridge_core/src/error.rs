// bridge_core/src/error.rs
use crate::props::send_prop::SendPropType;
use strum_macros::IntoStaticStr;
use strum_macros::Display;
use thiserror::Error;

/// Result alias used by every bridge operation.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Coarse classification of a `BridgeError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum ErrorKind {
    FieldNotFound,
    NotFound,
    Index,
    Parse,
    Format,
    TypeMismatch,
    UnsupportedOperation,
    State,
}

/// Everything that can go wrong while reading or writing bridged values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    /// The field is not part of the entity's schema.
    #[error("\"{name}\" is not a valid KeyValue for entity class \"{class_name}\".")]
    FieldNotFound { name: String, class_name: String },

    /// A named lookup (table, prop, server class, entity) found nothing.
    #[error("{what} \"{name}\" was not found.")]
    NotFound { what: &'static str, name: String },

    #[error("Index {index} is out of range (length {length}).")]
    Index { index: i64, length: usize },

    /// The raw text is not a number of the requested kind.
    #[error("KeyValue \"{text}\" could not be parsed as {expected}.")]
    Parse { text: String, expected: &'static str },

    /// The raw text does not have the requested shape.
    #[error("{0}")]
    Format(String),

    /// A variant was read as a type it does not hold.
    #[error("Variant holds {actual}, not {expected}.")]
    TypeMismatch {
        expected: SendPropType,
        actual: SendPropType,
    },

    #[error("\"{0}\" is not implemented for this engine.")]
    UnsupportedOperation(String),

    /// Mutation of a published table, or another misuse of registration.
    #[error("{0}")]
    State(String),
}

impl BridgeError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::FieldNotFound { .. } => ErrorKind::FieldNotFound,
            BridgeError::NotFound { .. } => ErrorKind::NotFound,
            BridgeError::Index { .. } => ErrorKind::Index,
            BridgeError::Parse { .. } => ErrorKind::Parse,
            BridgeError::Format(_) => ErrorKind::Format,
            BridgeError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            BridgeError::UnsupportedOperation(_) => ErrorKind::UnsupportedOperation,
            BridgeError::State(_) => ErrorKind::State,
        }
    }

    pub(crate) fn not_found(what: &'static str, name: impl Into<String>) -> Self {
        BridgeError::NotFound { what, name: name.into() }
    }

    pub(crate) fn index(index: usize, length: usize) -> Self {
        BridgeError::Index { index: index as i64, length }
    }

    pub(crate) fn unsupported(what: impl Into<String>) -> Self {
        BridgeError::UnsupportedOperation(what.into())
    }
}

impl From<BridgeError> for mlua::Error {
    fn from(err: BridgeError) -> Self {
        mlua::Error::external(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_not_found_names_field_and_class() {
        let err = BridgeError::FieldNotFound {
            name: "health".into(),
            class_name: "CBaseEntity".into(),
        };
        assert_eq!(err.kind(), ErrorKind::FieldNotFound);
        assert_eq!(
            err.to_string(),
            "\"health\" is not a valid KeyValue for entity class \"CBaseEntity\"."
        );
    }

    #[test]
    fn type_mismatch_uses_engine_type_names() {
        let err = BridgeError::TypeMismatch {
            expected: SendPropType::Int,
            actual: SendPropType::Float,
        };
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert_eq!(err.to_string(), "Variant holds FLOAT, not INT.");
    }

    #[test]
    fn kind_display_matches_variant_name() {
        assert_eq!(ErrorKind::UnsupportedOperation.to_string(), "UnsupportedOperation");
        assert_eq!(BridgeError::State("locked".into()).kind(), ErrorKind::State);
    }
}
