//! Scalar element types stored in dataset payloads.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Element type of a dataset payload.
///
/// The converter never decodes elements; only the width matters for size
/// validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    /// 32-bit float (base and query vectors).
    #[serde(rename = "f32")]
    Float32,
    /// 64-bit signed integer (ground-truth neighbor ids).
    #[serde(rename = "i64")]
    Int64,
}

impl ElementType {
    /// Width of one element in bytes.
    pub const fn width(self) -> usize {
        match self {
            ElementType::Float32 => 4,
            ElementType::Int64 => 8,
        }
    }

    /// Conventional extension for standard-layout files of this type.
    pub const fn standard_extension(self) -> &'static str {
        match self {
            ElementType::Float32 => "fbin",
            ElementType::Int64 => "ibin",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Float32 => write!(f, "f32"),
            ElementType::Int64 => write!(f, "i64"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widths() {
        assert_eq!(ElementType::Float32.width(), 4);
        assert_eq!(ElementType::Int64.width(), 8);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&ElementType::Int64).unwrap();
        assert_eq!(json, "\"i64\"");
        let parsed: ElementType = serde_json::from_str("\"f32\"").unwrap();
        assert_eq!(parsed, ElementType::Float32);
    }
}
