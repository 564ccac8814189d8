//! Record construction
//!
//! [`DnsRecord`] enforces the per-type shape rules before anything reaches
//! the API, and renders itself as a [`ResourceRecordSet`].
//!
//! | Type  | Values            | Alias target |
//! |-------|-------------------|--------------|
//! | A     | one or more, xor  | allowed      |
//! | AAAA  | one or more, xor  | allowed      |
//! | CNAME | exactly one       | no           |
//! | MX    | one or more       | no           |
//! | TXT   | one or more       | no           |

use std::fmt;
use std::str::FromStr;

use crate::error::{ClassifiedError, Result};
use crate::traits::{AliasTarget, ResourceRecordSet};

/// TTL used when none is given (in seconds)
pub const DEFAULT_TTL: u32 = 300;

/// Supported record types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    Aaaa,
    Cname,
    Mx,
    Txt,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Mx => "MX",
            RecordType::Txt => "TXT",
        }
    }

    /// Whether this type may point at an alias target instead of values
    pub fn supports_alias(&self) -> bool {
        matches!(self, RecordType::A | RecordType::Aaaa)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = ClassifiedError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            "CNAME" => Ok(RecordType::Cname),
            "MX" => Ok(RecordType::Mx),
            "TXT" => Ok(RecordType::Txt),
            other => Err(ClassifiedError::validation(format!(
                "Unknown record type: {}",
                other
            ))),
        }
    }
}

/// A validated DNS record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    name: String,
    record_type: RecordType,
    ttl: u32,
    values: Vec<String>,
    alias_target: Option<AliasTarget>,
}

impl DnsRecord {
    /// Build a value record of any type with the default TTL
    pub fn new<S: AsRef<str>>(record_type: RecordType, name: impl Into<String>, values: &[S]) -> Result<Self> {
        Self::build(record_type, name.into(), DEFAULT_TTL, values, None)
    }

    /// Build an alias record (A or AAAA only)
    pub fn alias(record_type: RecordType, name: impl Into<String>, target: AliasTarget) -> Result<Self> {
        Self::build::<&str>(record_type, name.into(), DEFAULT_TTL, &[], Some(target))
    }

    /// Build a record from loose parts
    ///
    /// This is the general constructor the others delegate to. Supplying
    /// both `values` and `alias_target`, or neither, is rejected.
    pub fn build<S: AsRef<str>>(
        record_type: RecordType,
        name: String,
        ttl: u32,
        values: &[S],
        alias_target: Option<AliasTarget>,
    ) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(ClassifiedError::validation("Record name cannot be empty"));
        }

        let values: Vec<String> = values.iter().map(|v| v.as_ref().trim().to_string()).collect();

        if alias_target.is_some() && !record_type.supports_alias() {
            return Err(ClassifiedError::validation(format!(
                "{} records cannot use an alias target",
                record_type
            )));
        }

        match record_type {
            RecordType::A | RecordType::Aaaa => match (values.is_empty(), alias_target.is_some()) {
                (false, true) => {
                    return Err(ClassifiedError::validation(format!(
                        "Cannot specify both values and alias_target for {} record",
                        record_type
                    )));
                }
                (true, false) => {
                    return Err(ClassifiedError::validation(format!(
                        "Must specify either values or alias_target for {} record",
                        record_type
                    )));
                }
                _ => {}
            },
            RecordType::Cname => {
                if values.is_empty() {
                    return Err(ClassifiedError::validation("CNAME record requires a value"));
                }
                if values.len() != 1 {
                    return Err(ClassifiedError::validation(
                        "CNAME record can only have one value",
                    ));
                }
            }
            RecordType::Mx | RecordType::Txt => {
                if values.is_empty() {
                    return Err(ClassifiedError::validation(format!(
                        "{} record requires at least one value",
                        record_type
                    )));
                }
            }
        }

        if values.iter().any(|v| v.is_empty()) {
            return Err(ClassifiedError::validation(format!(
                "{} record values cannot be blank",
                record_type
            )));
        }

        let values = if record_type == RecordType::Txt {
            values.into_iter().map(quote_txt).collect()
        } else {
            values
        };

        Ok(Self {
            name,
            record_type,
            ttl,
            values,
            alias_target,
        })
    }

    /// Override the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn alias_target(&self) -> Option<&AliasTarget> {
        self.alias_target.as_ref()
    }

    /// Render as an API record set; alias records carry no TTL
    pub fn to_record_set(&self) -> ResourceRecordSet {
        ResourceRecordSet {
            name: self.name.clone(),
            record_type: self.record_type.as_str().to_string(),
            ttl: self.alias_target.is_none().then_some(self.ttl),
            values: self.values.clone(),
            alias_target: self.alias_target.clone(),
        }
    }
}

fn quote_txt(value: String) -> String {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        value
    } else {
        format!("\"{}\"", value)
    }
}
