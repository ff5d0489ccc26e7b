//! Runtime column types of the query engine.
//!
//! Schema descriptors carry a `ColumnType` instead of raw type strings, so a
//! typo in a schema file fails at parse time rather than inside generated DDL.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Column type enum covering the engine's runtime types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Char,
    Boolean,
    Byte,
    Short,
    Integer,
    Long,
    BigInteger,
    Float,
    Double,
    BigDecimal,
    Date,
    Time,
    Timestamp,
    Blob,
    Clob,
    Xml,
    Varbinary,
    Json,
    Geometry,
    Object,
}

impl ColumnType {
    /// DDL keyword for this type.
    ///
    /// This is the only place a type becomes text.
    pub const fn ddl_name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Char => "char",
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Integer => "integer",
            Self::Long => "long",
            Self::BigInteger => "biginteger",
            Self::Float => "float",
            Self::Double => "double",
            Self::BigDecimal => "bigdecimal",
            Self::Date => "date",
            Self::Time => "time",
            Self::Timestamp => "timestamp",
            Self::Blob => "blob",
            Self::Clob => "clob",
            Self::Xml => "xml",
            Self::Varbinary => "varbinary",
            Self::Json => "json",
            Self::Geometry => "geometry",
            Self::Object => "object",
        }
    }

    /// Check if this type can identify a row.
    ///
    /// LOBs and opaque objects have no usable equality, so they cannot
    /// appear in the join predicate between base and shadow rows.
    pub const fn can_be_primary_key(&self) -> bool {
        !matches!(
            self,
            Self::Blob | Self::Clob | Self::Xml | Self::Json | Self::Geometry | Self::Object
        )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ddl_name())
    }
}

/// Error returned when a type keyword is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownType(pub String);

impl fmt::Display for UnknownType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown column type: {}", self.0)
    }
}

impl std::error::Error for UnknownType {}

impl FromStr for ColumnType {
    type Err = UnknownType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s.to_lowercase().as_str() {
            "string" | "varchar" | "text" => Self::String,
            "char" | "character" => Self::Char,
            "boolean" | "bool" => Self::Boolean,
            "byte" | "tinyint" => Self::Byte,
            "short" | "smallint" => Self::Short,
            "integer" | "int" => Self::Integer,
            "long" | "bigint" => Self::Long,
            "biginteger" => Self::BigInteger,
            "float" | "real" => Self::Float,
            "double" => Self::Double,
            "bigdecimal" | "decimal" | "numeric" => Self::BigDecimal,
            "date" => Self::Date,
            "time" => Self::Time,
            "timestamp" => Self::Timestamp,
            "blob" => Self::Blob,
            "clob" => Self::Clob,
            "xml" => Self::Xml,
            "varbinary" | "bytes" => Self::Varbinary,
            "json" => Self::Json,
            "geometry" => Self::Geometry,
            "object" => Self::Object,
            _ => return Err(UnknownType(s.to_string())),
        };
        Ok(ty)
    }
}
