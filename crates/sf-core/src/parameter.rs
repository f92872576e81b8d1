//! Named script parameters
//!
//! A [`ParameterCollection`] maps parameter names to a declared [`DbType`] and a
//! resolver. Resolvers are evaluated fresh for every script, receiving the
//! script's display name and the parameter name, so a value may depend on the
//! script being executed. Scripts reference a parameter as `@name`.

use crate::error::{CoreError, CoreResult};
use chrono::NaiveDateTime;
use std::fmt;

/// Resolver signature: `(script display name, parameter name) -> value`
pub type ResolveParameter = dyn Fn(&str, &str) -> ParamValue + Send + Sync;

/// Declared database type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// Text value (VARCHAR)
    String,
    /// 32-bit integer
    Int32,
    /// 64-bit integer
    Int64,
    /// Boolean
    Boolean,
    /// Double precision float
    Double,
    /// Timestamp without time zone
    DateTime,
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DbType::String => "string",
            DbType::Int32 => "int32",
            DbType::Int64 => "int64",
            DbType::Boolean => "boolean",
            DbType::Double => "double",
            DbType::DateTime => "datetime",
        };
        f.write_str(name)
    }
}

/// A concrete value produced by a resolver
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl ParamValue {
    fn kind(&self) -> &'static str {
        match self {
            ParamValue::Null => "null",
            ParamValue::Bool(_) => "boolean",
            ParamValue::Int(_) => "integer",
            ParamValue::Float(_) => "float",
            ParamValue::Text(_) => "text",
            ParamValue::Timestamp(_) => "timestamp",
        }
    }

    /// Convert the value to the representation required by `db_type`.
    ///
    /// `Null` is accepted for every type. Text is parsed when the target type
    /// is not textual.
    pub fn coerce(self, name: &str, db_type: DbType) -> CoreResult<ParamValue> {
        let mismatch = |found: &ParamValue| CoreError::ParameterType {
            name: name.to_string(),
            expected: db_type.to_string(),
            found: found.kind().to_string(),
        };

        let coerced = match (db_type, self) {
            (_, ParamValue::Null) => ParamValue::Null,

            (DbType::String, ParamValue::Text(s)) => ParamValue::Text(s),
            (DbType::String, other) => ParamValue::Text(other.to_string()),

            (DbType::Int32, ParamValue::Int(i)) if i32::try_from(i).is_ok() => ParamValue::Int(i),
            (DbType::Int32, ParamValue::Text(s)) => match s.trim().parse::<i32>() {
                Ok(i) => ParamValue::Int(i64::from(i)),
                Err(_) => return Err(mismatch(&ParamValue::Text(s))),
            },

            (DbType::Int64, ParamValue::Int(i)) => ParamValue::Int(i),
            (DbType::Int64, ParamValue::Text(s)) => match s.trim().parse::<i64>() {
                Ok(i) => ParamValue::Int(i),
                Err(_) => return Err(mismatch(&ParamValue::Text(s))),
            },

            (DbType::Boolean, ParamValue::Bool(b)) => ParamValue::Bool(b),
            (DbType::Boolean, ParamValue::Int(0)) => ParamValue::Bool(false),
            (DbType::Boolean, ParamValue::Int(1)) => ParamValue::Bool(true),
            (DbType::Boolean, ParamValue::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => ParamValue::Bool(true),
                "false" | "0" => ParamValue::Bool(false),
                _ => return Err(mismatch(&ParamValue::Text(s))),
            },

            (DbType::Double, ParamValue::Float(f)) => ParamValue::Float(f),
            (DbType::Double, ParamValue::Int(i)) => ParamValue::Float(i as f64),
            (DbType::Double, ParamValue::Text(s)) => match s.trim().parse::<f64>() {
                Ok(f) => ParamValue::Float(f),
                Err(_) => return Err(mismatch(&ParamValue::Text(s))),
            },

            (DbType::DateTime, ParamValue::Timestamp(t)) => ParamValue::Timestamp(t),
            (DbType::DateTime, ParamValue::Text(s)) => match parse_timestamp(&s) {
                Some(t) => ParamValue::Timestamp(t),
                None => return Err(mismatch(&ParamValue::Text(s))),
            },

            (_, other) => return Err(mismatch(&other)),
        };
        Ok(coerced)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Null => f.write_str("NULL"),
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Timestamp(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S%.f")),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Int(i)
    }
}

impl From<i32> for ParamValue {
    fn from(i: i32) -> Self {
        ParamValue::Int(i64::from(i))
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

impl From<f64> for ParamValue {
    fn from(f: f64) -> Self {
        ParamValue::Float(f)
    }
}

impl From<NaiveDateTime> for ParamValue {
    fn from(t: NaiveDateTime) -> Self {
        ParamValue::Timestamp(t)
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ParamValue::Null)
    }
}

/// Parse the timestamp layouts accepted for `datetime` parameters
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    const FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
    ];
    let s = s.trim();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Check that `name` can be written as an `@name` placeholder
pub fn is_valid_parameter_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A named, typed parameter with its resolver
pub struct MigrationParameter {
    name: String,
    db_type: DbType,
    resolver: Box<ResolveParameter>,
}

impl MigrationParameter {
    /// Create a parameter, validating its name
    pub fn new<F>(name: impl Into<String>, db_type: DbType, resolver: F) -> CoreResult<Self>
    where
        F: Fn(&str, &str) -> ParamValue + Send + Sync + 'static,
    {
        let name = name.into();
        if !is_valid_parameter_name(&name) {
            return Err(CoreError::InvalidParameterName { name });
        }
        Ok(Self {
            name,
            db_type,
            resolver: Box::new(resolver),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn db_type(&self) -> DbType {
        self.db_type
    }

    /// Evaluate the resolver for `script_name` and coerce the result to the declared type
    pub fn resolve(&self, script_name: &str) -> CoreResult<ResolvedParameter> {
        let raw = (self.resolver)(script_name, &self.name);
        let value = raw.coerce(&self.name, self.db_type)?;
        Ok(ResolvedParameter {
            name: self.name.clone(),
            db_type: self.db_type,
            value,
        })
    }
}

impl fmt::Debug for MigrationParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationParameter")
            .field("name", &self.name)
            .field("db_type", &self.db_type)
            .finish_non_exhaustive()
    }
}

/// A parameter value ready to be bound into a statement
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParameter {
    pub name: String,
    pub db_type: DbType,
    pub value: ParamValue,
}

impl ResolvedParameter {
    pub fn new(name: impl Into<String>, db_type: DbType, value: impl Into<ParamValue>) -> Self {
        Self {
            name: name.into(),
            db_type,
            value: value.into(),
        }
    }
}

/// Insertion-ordered collection of parameters with unique names
#[derive(Debug, Default)]
pub struct ParameterCollection {
    parameters: Vec<MigrationParameter>,
}

impl ParameterCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter built from its parts.
    ///
    /// Fails with [`CoreError::DuplicateParameter`] if the name is already
    /// present; the existing entry is left untouched.
    pub fn add<F>(&mut self, name: impl Into<String>, db_type: DbType, resolver: F) -> CoreResult<&mut Self>
    where
        F: Fn(&str, &str) -> ParamValue + Send + Sync + 'static,
    {
        let parameter = MigrationParameter::new(name, db_type, resolver)?;
        self.insert(parameter)
    }

    /// Add an already constructed parameter
    pub fn insert(&mut self, parameter: MigrationParameter) -> CoreResult<&mut Self> {
        if self.contains(parameter.name()) {
            return Err(CoreError::DuplicateParameter {
                name: parameter.name,
            });
        }
        self.parameters.push(parameter);
        Ok(self)
    }

    /// Remove a parameter by name, returning it if present
    pub fn remove(&mut self, name: &str) -> Option<MigrationParameter> {
        let index = self.parameters.iter().position(|p| p.name == name)?;
        Some(self.parameters.remove(index))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parameters.iter().any(|p| p.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&MigrationParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MigrationParameter> {
        self.parameters.iter()
    }

    /// Parameter names in insertion order
    pub fn names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }

    /// Evaluate every resolver against `script_name`, in insertion order
    pub fn resolve(&self, script_name: &str) -> CoreResult<Vec<ResolvedParameter>> {
        self.parameters
            .iter()
            .map(|p| p.resolve(script_name))
            .collect()
    }
}

#[cfg(test)]
#[path = "parameter_test.rs"]
mod tests;
