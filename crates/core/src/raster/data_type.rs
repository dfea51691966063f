//! On-disk cell types

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Storage type a grid is persisted with. In memory every cell is an `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Double,
    Float,
    Integer,
    Byte,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Double => "double",
            DataType::Float => "float",
            DataType::Integer => "integer",
            DataType::Byte => "byte",
        };
        f.write_str(name)
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "double" | "f64" => Ok(DataType::Double),
            "float" | "f32" => Ok(DataType::Float),
            "integer" | "int" | "i16" => Ok(DataType::Integer),
            "byte" | "u8" => Ok(DataType::Byte),
            other => Err(Error::UnsupportedDataType(other.to_string())),
        }
    }
}
