//! Composite identifiers
//!
//! A managed entity is addressed by its parent scope plus a local key, encoded
//! as one string joined by [`DELIMITER`] (e.g. `43253:pol1`). Parts containing
//! the delimiter are rejected at encode time, so every identifier produced here
//! decodes back to exactly the parts it was built from.

use thiserror::Error;

/// Separator between identifier parts
pub const DELIMITER: char = ':';

/// Errors produced while encoding or decoding identifiers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("invalid ID '{id}': expected {expected} part(s) in the form {description}, got {got}")]
    WrongArity {
        id: String,
        expected: usize,
        got: usize,
        description: String,
    },

    #[error("ID part '{part}' must not contain ':'")]
    DelimiterInPart { part: String },

    #[error("expected {expected} ID part(s), got {got}")]
    PartCount { expected: usize, got: usize },

    #[error("invalid {field} '{value}' in ID: expected an integer")]
    NotAnInteger { field: String, value: String },

    #[error("{part} cannot change from '{recorded}' to '{declared}' in place; replace the resource")]
    KeyChanged {
        part: String,
        recorded: String,
        declared: String,
    },
}

/// Reject a part that would not survive a round trip through [`decode`]
pub fn check_part(part: &str) -> Result<(), IdError> {
    if part.contains(DELIMITER) {
        return Err(IdError::DelimiterInPart {
            part: part.to_string(),
        });
    }
    Ok(())
}

/// Join identifier parts with the delimiter
pub fn encode<S: AsRef<str>>(parts: &[S]) -> Result<String, IdError> {
    let mut encoded = String::new();
    for (i, part) in parts.iter().enumerate() {
        let part = part.as_ref();
        check_part(part)?;
        if i > 0 {
            encoded.push(DELIMITER);
        }
        encoded.push_str(part);
    }
    Ok(encoded)
}

/// Split an identifier into exactly `expected` parts.
///
/// `description` names the expected shape (e.g. `configID:securityPolicyID`)
/// and is echoed in the error.
pub fn decode(id: &str, expected: usize, description: &str) -> Result<Vec<String>, IdError> {
    let parts: Vec<String> = if id.is_empty() {
        Vec::new()
    } else {
        id.split(DELIMITER).map(str::to_string).collect()
    };

    if parts.len() != expected {
        return Err(IdError::WrongArity {
            id: id.to_string(),
            expected,
            got: parts.len(),
            description: description.to_string(),
        });
    }
    Ok(parts)
}

/// Parse a numeric identifier part
pub fn parse_int(value: &str, field: &str) -> Result<i64, IdError> {
    value.parse().map_err(|_| IdError::NotAnInteger {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Fixed identifier shape of one entity type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdFormat {
    description: &'static str,
}

impl IdFormat {
    /// `description` lists the part names joined by the delimiter,
    /// e.g. `"configID:actionID"`.
    pub const fn new(description: &'static str) -> Self {
        Self { description }
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn arity(&self) -> usize {
        self.description.split(DELIMITER).count()
    }

    pub fn encode<S: AsRef<str>>(&self, parts: &[S]) -> Result<String, IdError> {
        if parts.len() != self.arity() {
            return Err(IdError::PartCount {
                expected: self.arity(),
                got: parts.len(),
            });
        }
        encode(parts)
    }

    pub fn decode(&self, id: &str) -> Result<Vec<String>, IdError> {
        decode(id, self.arity(), self.description)
    }

    /// Part names in order, e.g. `["configID", "actionID"]`
    pub fn part_names(&self) -> impl Iterator<Item = &'static str> {
        self.description.split(DELIMITER)
    }

    /// Check the parts pinned by declared attributes before anything is
    /// written remotely. `None` marks a part the platform assigns.
    pub fn check_declared(&self, declared: &[Option<String>]) -> Result<(), IdError> {
        if declared.len() != self.arity() {
            return Err(IdError::PartCount {
                expected: self.arity(),
                got: declared.len(),
            });
        }
        declared.iter().flatten().try_for_each(|part| check_part(part))
    }

    /// Fail when a declared part differs from the part recorded in `id`
    pub fn verify_unchanged(&self, id: &str, declared: &[Option<String>]) -> Result<(), IdError> {
        self.check_declared(declared)?;
        let recorded = self.decode(id)?;
        for ((name, recorded), declared) in self.part_names().zip(recorded).zip(declared) {
            if let Some(declared) = declared
                && *declared != recorded
            {
                return Err(IdError::KeyChanged {
                    part: name.to_string(),
                    recorded,
                    declared: declared.clone(),
                });
            }
        }
        Ok(())
    }
}
