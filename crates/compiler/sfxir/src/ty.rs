use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The element type of a uniform constant as spelled in the shading language.
///
/// Serialized in its source spelling, e.g. `"float4x4"`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
#[serde(into = "String", try_from = "String")]
pub enum ConstantType {
    Scalar(ScalarKind),
    Vector {
        scalar: ScalarKind,
        size: VectorSize,
    },
    Matrix {
        rows: VectorSize,
        columns: VectorSize,
        scalar: ScalarKind,
    },
}

impl ConstantType {
    pub fn scalar(&self) -> ScalarKind {
        match *self {
            ConstantType::Scalar(scalar) => scalar,
            ConstantType::Vector { scalar, .. } => scalar,
            ConstantType::Matrix { scalar, .. } => scalar,
        }
    }

    pub fn is_matrix(&self) -> bool {
        matches!(self, ConstantType::Matrix { .. })
    }
}

impl fmt::Display for ConstantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantType::Scalar(scalar) => write!(f, "{}", scalar),
            ConstantType::Vector { scalar, size } => write!(f, "{}{}", scalar, size.to_u32()),
            ConstantType::Matrix {
                rows,
                columns,
                scalar,
            } => write!(f, "{}{}x{}", scalar, rows.to_u32(), columns.to_u32()),
        }
    }
}

impl From<ConstantType> for String {
    fn from(ty: ConstantType) -> Self {
        ty.to_string()
    }
}

impl TryFrom<String> for ConstantType {
    type Error = ParseTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Error)]
#[error("`{0}` is not a valid constant type")]
pub struct ParseTypeError(pub String);

impl FromStr for ConstantType {
    type Err = ParseTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseTypeError(s.to_string());

        let split = s
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(s.len());
        let (scalar, dims) = s.split_at(split);
        let scalar: ScalarKind = scalar.parse().map_err(|_| err())?;

        if dims.is_empty() {
            return Ok(ConstantType::Scalar(scalar));
        }

        match dims.split_once('x') {
            None => Ok(ConstantType::Vector {
                scalar,
                size: VectorSize::from_str(dims).map_err(|_| err())?,
            }),
            Some((rows, columns)) => Ok(ConstantType::Matrix {
                rows: VectorSize::from_str(rows).map_err(|_| err())?,
                columns: VectorSize::from_str(columns).map_err(|_| err())?,
                scalar,
            }),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub enum ScalarKind {
    Float,
    Half,
    Int,
    UInt,
    Bool,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarKind::Float => write!(f, "float"),
            ScalarKind::Half => write!(f, "half"),
            ScalarKind::Int => write!(f, "int"),
            ScalarKind::UInt => write!(f, "uint"),
            ScalarKind::Bool => write!(f, "bool"),
        }
    }
}

impl FromStr for ScalarKind {
    type Err = ParseTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "float" => Ok(ScalarKind::Float),
            "half" => Ok(ScalarKind::Half),
            "int" => Ok(ScalarKind::Int),
            "uint" => Ok(ScalarKind::UInt),
            "bool" => Ok(ScalarKind::Bool),
            _ => Err(ParseTypeError(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub enum VectorSize {
    Two,
    Three,
    Four,
}

impl VectorSize {
    pub fn to_u32(&self) -> u32 {
        match self {
            VectorSize::Two => 2,
            VectorSize::Three => 3,
            VectorSize::Four => 4,
        }
    }
}

impl FromStr for VectorSize {
    type Err = ParseTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "2" => Ok(VectorSize::Two),
            "3" => Ok(VectorSize::Three),
            "4" => Ok(VectorSize::Four),
            _ => Err(ParseTypeError(s.to_string())),
        }
    }
}

pub const TY_FLOAT: ConstantType = ConstantType::Scalar(ScalarKind::Float);
pub const TY_FLOAT2: ConstantType = ConstantType::Vector {
    scalar: ScalarKind::Float,
    size: VectorSize::Two,
};
pub const TY_FLOAT3: ConstantType = ConstantType::Vector {
    scalar: ScalarKind::Float,
    size: VectorSize::Three,
};
pub const TY_FLOAT4: ConstantType = ConstantType::Vector {
    scalar: ScalarKind::Float,
    size: VectorSize::Four,
};
pub const TY_FLOAT4X4: ConstantType = ConstantType::Matrix {
    rows: VectorSize::Four,
    columns: VectorSize::Four,
    scalar: ScalarKind::Float,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_constant_types() {
        assert_eq!("float".parse::<ConstantType>(), Ok(TY_FLOAT));
        assert_eq!("float3".parse::<ConstantType>(), Ok(TY_FLOAT3));
        assert_eq!("float4x4".parse::<ConstantType>(), Ok(TY_FLOAT4X4));
        assert_eq!(
            "int2".parse::<ConstantType>(),
            Ok(ConstantType::Vector {
                scalar: ScalarKind::Int,
                size: VectorSize::Two
            })
        );
        assert!("float5".parse::<ConstantType>().is_err());
        assert!("sampler".parse::<ConstantType>().is_err());
    }

    #[test]
    fn test_display_matches_parse() {
        for ty in ["float", "half2", "bool", "float3x4", "uint4"] {
            assert_eq!(ty.parse::<ConstantType>().unwrap().to_string(), ty);
        }
    }
}
