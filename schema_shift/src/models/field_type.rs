//! Relational type families for entity fields
//!
//! Field types are written in schema documents as PostgreSQL-flavoured tags
//! (`uuid`, `varchar(128)`, `numeric(10,2)`, `integer[]`) and rendered back
//! as lowercase SQL types.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Error;

static TYPE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-z][a-z0-9 ]*?)\s*(?:\(\s*(\d+)\s*(?:,\s*(\d+)\s*)?\))?\s*((?:\[\s*\])*)$")
        .expect("type pattern is valid")
});

/// Semantic type tag of a field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldType {
    Text,
    Varchar(Option<u32>),
    Char(Option<u32>),
    Citext,
    Uuid,
    SmallInt,
    Integer,
    BigInt,
    SmallSerial,
    Serial,
    BigSerial,
    Numeric {
        precision: Option<u32>,
        scale: Option<u32>,
    },
    Real,
    DoublePrecision,
    Money,
    Boolean,
    Date,
    Time,
    TimeTz,
    Timestamp,
    TimestampTz,
    Interval,
    Json,
    Jsonb,
    Bytea,
    Xml,
    TsVector,
    Int4Range,
    Int8Range,
    NumRange,
    TsRange,
    TsTzRange,
    DateRange,
    Point,
    Line,
    Lseg,
    GeoBox,
    Path,
    Polygon,
    Circle,
    Inet,
    Cidr,
    MacAddr,
    MacAddr8,
    Vector(Option<u32>),
    Bit(Option<u32>),
    VarBit(Option<u32>),
    /// Closed value set; the values live in the field's enum metadata
    Enum,
    Array(Box<FieldType>),
}

impl FieldType {
    /// Lowercase SQL type used in DDL and snapshots
    pub fn sql_type(&self) -> String {
        fn sized(base: &str, size: &Option<u32>) -> String {
            match size {
                Some(n) => format!("{}({})", base, n),
                None => base.to_string(),
            }
        }

        match self {
            FieldType::Text | FieldType::Enum => "text".to_string(),
            FieldType::Varchar(n) => sized("varchar", n),
            FieldType::Char(n) => sized("char", n),
            FieldType::Citext => "citext".to_string(),
            FieldType::Uuid => "uuid".to_string(),
            FieldType::SmallInt => "smallint".to_string(),
            FieldType::Integer => "integer".to_string(),
            FieldType::BigInt => "bigint".to_string(),
            FieldType::SmallSerial => "smallserial".to_string(),
            FieldType::Serial => "serial".to_string(),
            FieldType::BigSerial => "bigserial".to_string(),
            FieldType::Numeric { precision, scale } => match (precision, scale) {
                (Some(p), Some(s)) => format!("numeric({},{})", p, s),
                (Some(p), None) => format!("numeric({})", p),
                _ => "numeric".to_string(),
            },
            FieldType::Real => "real".to_string(),
            FieldType::DoublePrecision => "double precision".to_string(),
            FieldType::Money => "money".to_string(),
            FieldType::Boolean => "boolean".to_string(),
            FieldType::Date => "date".to_string(),
            FieldType::Time => "time".to_string(),
            FieldType::TimeTz => "timetz".to_string(),
            FieldType::Timestamp => "timestamp".to_string(),
            FieldType::TimestampTz => "timestamptz".to_string(),
            FieldType::Interval => "interval".to_string(),
            FieldType::Json => "json".to_string(),
            FieldType::Jsonb => "jsonb".to_string(),
            FieldType::Bytea => "bytea".to_string(),
            FieldType::Xml => "xml".to_string(),
            FieldType::TsVector => "tsvector".to_string(),
            FieldType::Int4Range => "int4range".to_string(),
            FieldType::Int8Range => "int8range".to_string(),
            FieldType::NumRange => "numrange".to_string(),
            FieldType::TsRange => "tsrange".to_string(),
            FieldType::TsTzRange => "tstzrange".to_string(),
            FieldType::DateRange => "daterange".to_string(),
            FieldType::Point => "point".to_string(),
            FieldType::Line => "line".to_string(),
            FieldType::Lseg => "lseg".to_string(),
            FieldType::GeoBox => "box".to_string(),
            FieldType::Path => "path".to_string(),
            FieldType::Polygon => "polygon".to_string(),
            FieldType::Circle => "circle".to_string(),
            FieldType::Inet => "inet".to_string(),
            FieldType::Cidr => "cidr".to_string(),
            FieldType::MacAddr => "macaddr".to_string(),
            FieldType::MacAddr8 => "macaddr8".to_string(),
            FieldType::Vector(n) => sized("vector", n),
            FieldType::Bit(n) => sized("bit", n),
            FieldType::VarBit(n) => sized("varbit", n),
            FieldType::Array(inner) => format!("{}[]", inner.sql_type()),
        }
    }

    /// Type a foreign-key column must have to reference a key of this type
    pub fn reference_type(&self) -> FieldType {
        match self {
            FieldType::SmallSerial => FieldType::SmallInt,
            FieldType::Serial => FieldType::Integer,
            FieldType::BigSerial => FieldType::BigInt,
            other => other.clone(),
        }
    }

    /// Integer families, the only ones allowed to be identity columns
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            FieldType::SmallInt
                | FieldType::Integer
                | FieldType::BigInt
                | FieldType::SmallSerial
                | FieldType::Serial
                | FieldType::BigSerial
        )
    }

    /// Date/timestamp families usable as a time-partition column
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            FieldType::Date | FieldType::Timestamp | FieldType::TimestampTz
        )
    }

    /// Database extension providing this type, if any
    pub fn required_extension(&self) -> Option<&'static str> {
        match self {
            FieldType::Vector(_) => Some("vector"),
            FieldType::Citext => Some("citext"),
            FieldType::Array(inner) => inner.required_extension(),
            _ => None,
        }
    }

    fn from_base(base: &str, first: Option<u32>, second: Option<u32>) -> Option<FieldType> {
        let ty = match base {
            "text" => FieldType::Text,
            "varchar" | "character varying" => FieldType::Varchar(first),
            "char" | "character" | "bpchar" => FieldType::Char(first),
            "citext" => FieldType::Citext,
            "uuid" => FieldType::Uuid,
            "smallint" | "int2" => FieldType::SmallInt,
            "integer" | "int" | "int4" => FieldType::Integer,
            "bigint" | "int8" => FieldType::BigInt,
            "smallserial" | "serial2" => FieldType::SmallSerial,
            "serial" | "serial4" => FieldType::Serial,
            "bigserial" | "serial8" => FieldType::BigSerial,
            "numeric" | "decimal" => FieldType::Numeric {
                precision: first,
                scale: second,
            },
            "real" | "float4" => FieldType::Real,
            "double precision" | "double" | "float8" => FieldType::DoublePrecision,
            "money" => FieldType::Money,
            "boolean" | "bool" => FieldType::Boolean,
            "date" => FieldType::Date,
            "time" | "time without time zone" => FieldType::Time,
            "timetz" | "time with time zone" => FieldType::TimeTz,
            "timestamp" | "timestamp without time zone" => FieldType::Timestamp,
            "timestamptz" | "timestamp with time zone" => FieldType::TimestampTz,
            "interval" => FieldType::Interval,
            "json" => FieldType::Json,
            "jsonb" => FieldType::Jsonb,
            "bytea" => FieldType::Bytea,
            "xml" => FieldType::Xml,
            "tsvector" => FieldType::TsVector,
            "int4range" => FieldType::Int4Range,
            "int8range" => FieldType::Int8Range,
            "numrange" => FieldType::NumRange,
            "tsrange" => FieldType::TsRange,
            "tstzrange" => FieldType::TsTzRange,
            "daterange" => FieldType::DateRange,
            "point" => FieldType::Point,
            "line" => FieldType::Line,
            "lseg" => FieldType::Lseg,
            "box" => FieldType::GeoBox,
            "path" => FieldType::Path,
            "polygon" => FieldType::Polygon,
            "circle" => FieldType::Circle,
            "inet" => FieldType::Inet,
            "cidr" => FieldType::Cidr,
            "macaddr" => FieldType::MacAddr,
            "macaddr8" => FieldType::MacAddr8,
            "vector" => FieldType::Vector(first),
            "bit" => FieldType::Bit(first),
            "varbit" | "bit varying" => FieldType::VarBit(first),
            "enum" => FieldType::Enum,
            _ => return None,
        };
        Some(ty)
    }
}

impl FromStr for FieldType {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let lowered = raw.trim().to_lowercase();
        let captures = TYPE_PATTERN
            .captures(&lowered)
            .ok_or_else(|| Error::TypeMapping(format!("Unrecognized field type: '{}'", raw)))?;

        let base = captures[1].split_whitespace().collect::<Vec<_>>().join(" ");
        let size = |group: usize| -> Result<Option<u32>, Error> {
            captures
                .get(group)
                .map(|m| {
                    m.as_str()
                        .parse::<u32>()
                        .map_err(|e| Error::TypeMapping(format!("Invalid size '{}' in '{}': {}", m.as_str(), raw, e)))
                })
                .transpose()
        };
        let first = size(2)?;
        let second = size(3)?;
        let dimensions = captures.get(4).map_or(0, |m| m.as_str().matches('[').count());

        let mut ty = FieldType::from_base(&base, first, second)
            .ok_or_else(|| Error::TypeMapping(format!("Unknown type family '{}' in '{}'", base, raw)))?;
        for _ in 0..dimensions {
            ty = FieldType::Array(Box::new(ty));
        }

        Ok(ty)
    }
}

impl TryFrom<String> for FieldType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldType> for String {
    fn from(ty: FieldType) -> Self {
        match ty {
            FieldType::Enum => "enum".to_string(),
            other => other.sql_type(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("uuid", "uuid")]
    #[case("VARCHAR(128)", "varchar(128)")]
    #[case("character varying", "varchar")]
    #[case("decimal(10, 2)", "numeric(10,2)")]
    #[case("timestamp with time zone", "timestamptz")]
    #[case("double  precision", "double precision")]
    #[case("integer[]", "integer[]")]
    #[case("text[][]", "text[][]")]
    #[case("vector(1536)", "vector(1536)")]
    #[case("varbit(8)", "varbit(8)")]
    #[case("enum", "text")]
    fn test_parse_and_render(#[case] input: &str, #[case] rendered: &str) {
        let ty: FieldType = input.parse().unwrap();
        assert_eq!(ty.sql_type(), rendered);
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(matches!("hyperloglog".parse::<FieldType>(), Err(Error::TypeMapping(_))));
        assert!(matches!("varchar(abc)".parse::<FieldType>(), Err(Error::TypeMapping(_))));
    }

    #[rstest]
    #[case("varchar(99999999999)")]
    #[case("numeric(10, 4294967296)")]
    fn test_oversized_modifier_is_rejected(#[case] input: &str) {
        let err = input.parse::<FieldType>().unwrap_err();
        assert!(matches!(err, Error::TypeMapping(ref message) if message.contains("Invalid size")), "{}", err);
    }

    #[test]
    fn test_reference_type_strips_serial() {
        assert_eq!(FieldType::BigSerial.reference_type(), FieldType::BigInt);
        assert_eq!(FieldType::Uuid.reference_type(), FieldType::Uuid);
    }

    #[test]
    fn test_required_extension() {
        assert_eq!(FieldType::Vector(Some(3)).required_extension(), Some("vector"));
        assert_eq!(
            FieldType::Array(Box::new(FieldType::Citext)).required_extension(),
            Some("citext")
        );
        assert_eq!(FieldType::Jsonb.required_extension(), None);
    }

    #[test]
    fn test_serde_round_trip_through_tags() {
        let ty: FieldType = serde_json::from_str("\"numeric(12,4)\"").unwrap();
        assert_eq!(ty, FieldType::Numeric { precision: Some(12), scale: Some(4) });
        assert_eq!(serde_json::to_string(&FieldType::Enum).unwrap(), "\"enum\"");
    }
}
