use std::fmt;

use meter_client::domain::{BlockId, BlockIdError, BlockRule};

/// Raw text entered for a submission, one string per form field.
#[derive(Debug, Clone, Default)]
pub struct BillingForm {
    pub block: String,
    pub meter_reading: String,
    pub tariff_rate: String,
    pub vat_percent: String,
    pub additional_fee: String,
}

/// A form whose fields all parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedForm {
    pub block: BlockId,
    pub meter_reading: f64,
    pub tariff_rate: f64,
    pub vat_percent: f64,
    pub additional_fee: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Block,
    MeterReading,
    TariffRate,
    VatPercent,
    AdditionalFee,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::MeterReading => "meter_reading",
            Self::TariffRate => "tariff_rate",
            Self::VatPercent => "vat_percent",
            Self::AdditionalFee => "additional_fee",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldErrorKind {
    Required,
    MissingPrefix(String),
    InvalidNumber,
    OutOfRange { min: u32, max: u32 },
    Negative,
}

impl fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => f.write_str("required"),
            Self::MissingPrefix(prefix) => write!(f, "must start with '{prefix}'"),
            Self::InvalidNumber => f.write_str("invalid number format"),
            Self::OutOfRange { min, max } => write!(f, "must be between {min} and {max}"),
            Self::Negative => f.write_str("must not be negative"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub kind: FieldErrorKind,
}

/// Every field-level problem found in one form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn for_field(&self, field: Field) -> Option<&FieldErrorKind> {
        self.0.iter().find(|e| e.field == field).map(|e| &e.kind)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field.name(), e.kind)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<BlockIdError> for FieldErrorKind {
    fn from(e: BlockIdError) -> Self {
        match e {
            BlockIdError::Empty => Self::Required,
            BlockIdError::MissingPrefix { prefix } => Self::MissingPrefix(prefix),
            BlockIdError::InvalidNumber { .. } => Self::InvalidNumber,
            BlockIdError::OutOfRange { min, max, .. } => Self::OutOfRange { min, max },
        }
    }
}

/// Parse a non-negative, finite amount.
pub fn parse_amount(raw: &str) -> Result<f64, FieldErrorKind> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(FieldErrorKind::Required);
    }

    let value: f64 = raw.parse().map_err(|_| FieldErrorKind::InvalidNumber)?;
    if !value.is_finite() {
        return Err(FieldErrorKind::InvalidNumber);
    }
    if value < 0.0 {
        return Err(FieldErrorKind::Negative);
    }

    Ok(value)
}

/// Check every field and collect all errors rather than stopping at the first.
pub fn validate(form: &BillingForm, rule: &BlockRule) -> Result<ValidatedForm, ValidationErrors> {
    let mut errors = Vec::new();

    let mut amount = |field: Field, raw: &str| match parse_amount(raw) {
        Ok(v) => v,
        Err(kind) => {
            errors.push(FieldError { field, kind });
            0.0
        }
    };

    let meter_reading = amount(Field::MeterReading, &form.meter_reading);
    let tariff_rate = amount(Field::TariffRate, &form.tariff_rate);
    let vat_percent = amount(Field::VatPercent, &form.vat_percent);
    let additional_fee = amount(Field::AdditionalFee, &form.additional_fee);

    let block = match rule.parse(&form.block) {
        Ok(b) => Some(b),
        Err(e) => {
            errors.insert(
                0,
                FieldError {
                    field: Field::Block,
                    kind: e.into(),
                },
            );
            None
        }
    };

    match block {
        Some(block) if errors.is_empty() => Ok(ValidatedForm {
            block,
            meter_reading,
            tariff_rate,
            vat_percent,
            additional_fee,
        }),
        _ => Err(ValidationErrors(errors)),
    }
}
