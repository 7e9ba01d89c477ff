//! Field layouts for account records and the records themselves.
//!
//! Two schema variants exist: the `Full` training schema with all 23
//! attributes of the credit-card clients table, and the `Reduced` schema
//! holding the 7 attributes that can be collected interactively. The order
//! of `Schema::fields` is the order of the encoded feature vector and must
//! never change between training, holdout and inference.
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

pub const LIMIT_BAL: &str = "LIMIT_BAL";
pub const SEX: &str = "SEX";
pub const EDUCATION: &str = "EDUCATION";
pub const MARRIAGE: &str = "MARRIAGE";
pub const AGE: &str = "AGE";
pub const BILL_AMT1: &str = "BILL_AMT1";
pub const PAY_AMT1: &str = "PAY_AMT1";

/// Name of the label column in the training table.
pub const LABEL_COLUMN: &str = "default payment next month";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Categorical,
    Numeric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn categorical(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Categorical,
    }
}

const fn numeric(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Numeric,
    }
}

// Column order of the source table.
const FULL_FIELDS: [FieldSpec; 23] = [
    numeric(LIMIT_BAL),
    categorical(SEX),
    categorical(EDUCATION),
    categorical(MARRIAGE),
    numeric(AGE),
    numeric("PAY_0"),
    numeric("PAY_2"),
    numeric("PAY_3"),
    numeric("PAY_4"),
    numeric("PAY_5"),
    numeric("PAY_6"),
    numeric(BILL_AMT1),
    numeric("BILL_AMT2"),
    numeric("BILL_AMT3"),
    numeric("BILL_AMT4"),
    numeric("BILL_AMT5"),
    numeric("BILL_AMT6"),
    numeric(PAY_AMT1),
    numeric("PAY_AMT2"),
    numeric("PAY_AMT3"),
    numeric("PAY_AMT4"),
    numeric("PAY_AMT5"),
    numeric("PAY_AMT6"),
];

// Order of the interactive form: gender, education, marital status, age,
// credit limit, last bill, last payment.
const REDUCED_FIELDS: [FieldSpec; 7] = [
    categorical(SEX),
    categorical(EDUCATION),
    categorical(MARRIAGE),
    numeric(AGE),
    numeric(LIMIT_BAL),
    numeric(BILL_AMT1),
    numeric(PAY_AMT1),
];

/// Schema variant a record or model is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schema {
    Full,
    Reduced,
}

impl Schema {
    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            Schema::Full => &FULL_FIELDS,
            Schema::Reduced => &REDUCED_FIELDS,
        }
    }

    /// Length of the encoded feature vector.
    pub fn width(&self) -> usize {
        self.fields().len()
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields().iter().find(|spec| spec.name == name)
    }

    pub fn categorical_fields(&self) -> impl Iterator<Item = &'static str> {
        self.fields()
            .iter()
            .filter(|spec| spec.kind == FieldKind::Categorical)
            .map(|spec| spec.name)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schema::Full => write!(f, "full"),
            Schema::Reduced => write!(f, "reduced"),
        }
    }
}

/// A single field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Category(String),
    Number(f64),
}

/// One account's attributes at a point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, field: &str, value: impl Into<String>) -> Self {
        self.insert(field, Value::Category(value.into()));
        self
    }

    pub fn with_number(mut self, field: &str, value: f64) -> Self {
        self.insert(field, Value::Number(value));
        self
    }

    pub fn insert(&mut self, field: &str, value: Value) {
        self.values.insert(field.to_string(), value);
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Fails on the first schema field that is absent and on the first field
    /// the schema does not define.
    pub fn check_conforms(&self, schema: Schema) -> Result<()> {
        for spec in schema.fields() {
            if !self.values.contains_key(spec.name) {
                return Err(PipelineError::schema(
                    spec.name,
                    format!("missing from record for {} schema", schema),
                ));
            }
        }
        if let Some(extra) = self.field_names().find(|name| schema.field(name).is_none()) {
            return Err(PipelineError::schema(
                extra,
                format!("not part of the {} schema", schema),
            ));
        }
        Ok(())
    }

    /// Copy of this record restricted to the fields of `schema`.
    pub fn project(&self, schema: Schema) -> Result<Record> {
        let mut projected = Record::new();
        for spec in schema.fields() {
            let value = self.values.get(spec.name).ok_or_else(|| {
                PipelineError::schema(spec.name, format!("required by {} schema", schema))
            })?;
            projected.insert(spec.name, value.clone());
        }
        Ok(projected)
    }

    pub(crate) fn category(&self, field: &str) -> Result<&str> {
        match self.values.get(field) {
            Some(Value::Category(value)) => Ok(value.as_str()),
            Some(Value::Number(_)) => Err(PipelineError::schema(
                field,
                "expected a categorical value, found a number",
            )),
            None => Err(PipelineError::schema(field, "missing from record")),
        }
    }

    pub(crate) fn number(&self, field: &str) -> Result<f64> {
        match self.values.get(field) {
            Some(Value::Number(value)) if value.is_finite() => Ok(*value),
            Some(Value::Number(value)) => Err(PipelineError::schema(
                field,
                format!("non-finite value {}", value),
            )),
            Some(Value::Category(_)) => Err(PipelineError::schema(
                field,
                "expected a number, found a categorical value",
            )),
            None => Err(PipelineError::schema(field, "missing from record")),
        }
    }
}

/// Declares a closed vocabulary enum with its display labels and the
/// integer codes used by the credit-card clients table.
macro_rules! vocabulary {
    ($name:ident, $field:expr, { $($variant:ident => $label:expr, [$code:literal $(, $alias:literal)*]);+ $(;)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// Map a raw table code onto the vocabulary.
            pub fn from_code(code: i64) -> Option<Self> {
                match code {
                    $($code $(| $alias)* => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// The table code written for this value.
            pub fn code(&self) -> i64 {
                match self {
                    $($name::$variant => $code),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = PipelineError;

            fn from_str(s: &str) -> Result<Self> {
                let wanted = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| PipelineError::unknown_category($field, wanted))
            }
        }
    };
}

vocabulary!(Gender, SEX, {
    Male => "Male", [1];
    Female => "Female", [2];
});

vocabulary!(Education, EDUCATION, {
    GraduateSchool => "Graduate School", [1];
    University => "University", [2];
    HighSchool => "High School", [3];
    Others => "Others", [4, 0, 5, 6];
});

vocabulary!(MaritalStatus, MARRIAGE, {
    Married => "Married", [1];
    Single => "Single", [2];
    Others => "Others", [3, 0];
});

/// Label for a raw categorical code of `field`, when the field has a
/// known vocabulary.
pub fn decode_category(field: &str, code: i64) -> Option<&'static str> {
    match field {
        SEX => Gender::from_code(code).map(|v| v.label()),
        EDUCATION => Education::from_code(code).map(|v| v.label()),
        MARRIAGE => MaritalStatus::from_code(code).map(|v| v.label()),
        _ => None,
    }
}

/// The seven attributes collected by the interactive form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantProfile {
    pub gender: Gender,
    pub education: Education,
    pub marital_status: MaritalStatus,
    pub age: f64,
    pub credit_limit: f64,
    pub bill_amount: f64,
    pub payment_amount: f64,
}

impl ApplicantProfile {
    /// The applicant with categories spelled as raw table codes, for models
    /// fitted on a table read without decoding.
    pub fn to_coded_record(&self) -> Record {
        self.numbers(
            Record::new()
                .with_category(SEX, self.gender.code().to_string())
                .with_category(EDUCATION, self.education.code().to_string())
                .with_category(MARRIAGE, self.marital_status.code().to_string()),
        )
    }

    fn numbers(&self, record: Record) -> Record {
        record
            .with_number(AGE, self.age)
            .with_number(LIMIT_BAL, self.credit_limit)
            .with_number(BILL_AMT1, self.bill_amount)
            .with_number(PAY_AMT1, self.payment_amount)
    }
}

impl From<&ApplicantProfile> for Record {
    fn from(profile: &ApplicantProfile) -> Self {
        profile.numbers(
            Record::new()
                .with_category(SEX, profile.gender.label())
                .with_category(EDUCATION, profile.education.label())
                .with_category(MARRIAGE, profile.marital_status.label()),
        )
    }
}
