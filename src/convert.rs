//! Wire-format value conversion.
//!
//! Command payloads carry property values as plain text (`"0.5"`, `"true"`,
//! `"[1, 0, 0, 1]"`). This module converts that text into a typed
//! [`PropertyValue`] against the target property's declared [`TargetType`].
//! Pure and stateless; it knows nothing about any specific command handler.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The runtime type a wire value is converted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetType {
    Int,
    Bool,
    Float,
    Str,
    /// RGBA color; 3 components default alpha to 1.0.
    Color,
    Vec2,
    Vec3,
    /// 4-component vector; 3 components default the 4th to 1.0.
    Vec4,
    /// Enumeration with its declared value names, resolved case-insensitively.
    Enum(&'static [&'static str]),
    /// Object/asset reference. Settable only by the host, never from wire text.
    Reference,
}

impl TargetType {
    pub fn name(&self) -> &'static str {
        match self {
            TargetType::Int => "int",
            TargetType::Bool => "bool",
            TargetType::Float => "float",
            TargetType::Str => "string",
            TargetType::Color => "color",
            TargetType::Vec2 => "vec2",
            TargetType::Vec3 => "vec3",
            TargetType::Vec4 => "vec4",
            TargetType::Enum(_) => "enum",
            TargetType::Reference => "reference",
        }
    }
}

/// A converted, strongly-typed property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum PropertyValue {
    Int(i64),
    Bool(bool),
    Float(f32),
    Str(String),
    Color([f32; 4]),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Enum(String),
}

impl fmt::Display for PropertyValue {
    /// Renders the value back to wire-format text. Composite values use the
    /// bracketed comma-separated form the conversion engine accepts as input.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, components: &[f32]) -> fmt::Result {
            write!(f, "[")?;
            for (i, c) in components.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{c}")?;
            }
            write!(f, "]")
        }
        match self {
            PropertyValue::Int(v) => write!(f, "{v}"),
            PropertyValue::Bool(v) => write!(f, "{v}"),
            PropertyValue::Float(v) => write!(f, "{v}"),
            PropertyValue::Str(v) | PropertyValue::Enum(v) => write!(f, "{v}"),
            PropertyValue::Color(c) | PropertyValue::Vec4(c) => join(f, c),
            PropertyValue::Vec2(c) => join(f, c),
            PropertyValue::Vec3(c) => join(f, c),
        }
    }
}

/// Why a wire value could not be converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    InvalidScalar {
        value: String,
        expected: &'static str,
    },
    ArityMismatch {
        value: String,
        expected: &'static str,
        got: usize,
    },
    UnknownEnumValue {
        value: String,
        allowed: &'static [&'static str],
    },
    UnsupportedType {
        target: &'static str,
    },
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionError::InvalidScalar { value, expected } => {
                write!(f, "'{value}' is not a valid {expected}")
            }
            ConversionError::ArityMismatch {
                value,
                expected,
                got,
            } => write!(f, "'{value}' has {got} components, expected {expected}"),
            ConversionError::UnknownEnumValue { value, allowed } => write!(
                f,
                "'{value}' is not one of the allowed values [{}]",
                allowed.join(", ")
            ),
            ConversionError::UnsupportedType { target } => {
                write!(f, "target type '{target}' cannot be set from wire text")
            }
        }
    }
}

impl std::error::Error for ConversionError {}

/// Convert wire-format text into a typed value.
pub fn convert(text: &str, target: TargetType) -> Result<PropertyValue, ConversionError> {
    match target {
        TargetType::Int => text
            .trim()
            .parse::<i64>()
            .map(PropertyValue::Int)
            .map_err(|_| ConversionError::InvalidScalar {
                value: text.to_string(),
                expected: "int",
            }),
        TargetType::Bool => match text.trim() {
            t if t.eq_ignore_ascii_case("true") => Ok(PropertyValue::Bool(true)),
            t if t.eq_ignore_ascii_case("false") => Ok(PropertyValue::Bool(false)),
            _ => Err(ConversionError::InvalidScalar {
                value: text.to_string(),
                expected: "bool",
            }),
        },
        TargetType::Float => text
            .trim()
            .parse::<f32>()
            .map(PropertyValue::Float)
            .map_err(|_| ConversionError::InvalidScalar {
                value: text.to_string(),
                expected: "float",
            }),
        TargetType::Str => Ok(PropertyValue::Str(text.to_string())),
        TargetType::Color => {
            let c = components(text)?;
            match c.as_slice() {
                [r, g, b] => Ok(PropertyValue::Color([*r, *g, *b, 1.0])),
                [r, g, b, a] => Ok(PropertyValue::Color([*r, *g, *b, *a])),
                other => Err(ConversionError::ArityMismatch {
                    value: text.to_string(),
                    expected: "3 or 4",
                    got: other.len(),
                }),
            }
        }
        TargetType::Vec2 => {
            let c = components(text)?;
            match c.as_slice() {
                [x, y] => Ok(PropertyValue::Vec2([*x, *y])),
                other => Err(ConversionError::ArityMismatch {
                    value: text.to_string(),
                    expected: "2",
                    got: other.len(),
                }),
            }
        }
        TargetType::Vec3 => {
            let c = components(text)?;
            match c.as_slice() {
                [x, y, z] => Ok(PropertyValue::Vec3([*x, *y, *z])),
                other => Err(ConversionError::ArityMismatch {
                    value: text.to_string(),
                    expected: "3",
                    got: other.len(),
                }),
            }
        }
        TargetType::Vec4 => {
            let c = components(text)?;
            match c.as_slice() {
                [x, y, z] => Ok(PropertyValue::Vec4([*x, *y, *z, 1.0])),
                [x, y, z, w] => Ok(PropertyValue::Vec4([*x, *y, *z, *w])),
                other => Err(ConversionError::ArityMismatch {
                    value: text.to_string(),
                    expected: "3 or 4",
                    got: other.len(),
                }),
            }
        }
        TargetType::Enum(allowed) => {
            let trimmed = text.trim();
            allowed
                .iter()
                .find(|name| name.eq_ignore_ascii_case(trimmed))
                .map(|name| PropertyValue::Enum((*name).to_string()))
                .ok_or(ConversionError::UnknownEnumValue {
                    value: text.to_string(),
                    allowed,
                })
        }
        TargetType::Reference => Err(ConversionError::UnsupportedType {
            target: "reference",
        }),
    }
}

/// Split a bracketed or bare comma-separated list into float components.
/// Brackets are stripped before splitting.
fn components(text: &str) -> Result<Vec<f32>, ConversionError> {
    let mut clean = text.trim();
    if clean.starts_with('[') && clean.ends_with(']') {
        clean = clean
            .get(1..clean.len() - 1)
            .unwrap_or_default()
            .trim();
    }
    clean
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f32>()
                .map_err(|_| ConversionError::InvalidScalar {
                    value: part.trim().to_string(),
                    expected: "float",
                })
        })
        .collect()
}
