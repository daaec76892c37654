use std::fmt;

/// Why a raw block identifier was refused.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockIdError {
    #[error("block number is required")]
    Empty,
    #[error("block number must start with '{prefix}'")]
    MissingPrefix { prefix: String },
    #[error("block suffix '{suffix}' is not a number")]
    InvalidNumber { suffix: String },
    #[error("block suffix {value} is outside {min}..={max}")]
    OutOfRange { value: i64, min: u32, max: u32 },
}

/// Naming convention for blocks: a fixed prefix followed by a bounded number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRule {
    pub prefix: String,
    pub min: u32,
    pub max: u32,
}

impl Default for BlockRule {
    fn default() -> Self {
        Self {
            prefix: "355/".to_string(),
            min: 1,
            max: 66,
        }
    }
}

impl BlockRule {
    pub fn parse(&self, raw: &str) -> Result<BlockId, BlockIdError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(BlockIdError::Empty);
        }

        let suffix = raw
            .strip_prefix(self.prefix.as_str())
            .ok_or_else(|| BlockIdError::MissingPrefix {
                prefix: self.prefix.clone(),
            })?;

        let value: i64 = suffix.parse().map_err(|_| BlockIdError::InvalidNumber {
            suffix: suffix.to_string(),
        })?;

        if value < i64::from(self.min) || value > i64::from(self.max) {
            return Err(BlockIdError::OutOfRange {
                value,
                min: self.min,
                max: self.max,
            });
        }

        Ok(BlockId(raw.to_string()))
    }
}

/// A block identifier that passed a [`BlockRule`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockId(String);

impl BlockId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for BlockId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
