//! Categorical code map and feature encoder.
//!
//! The code map is fitted once from a training corpus and is read-only
//! afterwards. Encoding turns a `Record` into a feature vector laid out in
//! `Schema::fields` order: categorical fields become their integer code,
//! numeric fields pass through unchanged (scaling happens later, see
//! `preprocessing`).
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::{PipelineError, Result};
use crate::math::Array2;
use crate::schema::{FieldKind, Record, Schema};

/// Per-field mapping from observed category strings to small integers.
///
/// Codes are assigned in sorted order of the observed strings, so the
/// fitted map does not depend on the order of the training rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoricalCodeMap {
    fields: BTreeMap<String, BTreeMap<String, u32>>,
}

impl CategoricalCodeMap {
    /// Fit the code map from the categorical fields of `schema`.
    pub fn fit(records: &[Record], schema: Schema) -> Result<Self> {
        if records.is_empty() {
            return Err(PipelineError::InsufficientData(
                "cannot fit a categorical code map on zero records".to_string(),
            ));
        }

        let mut observed: BTreeMap<&'static str, BTreeSet<&str>> = schema
            .categorical_fields()
            .map(|field| (field, BTreeSet::new()))
            .collect();

        for record in records {
            record.check_conforms(schema)?;
            for (field, seen) in observed.iter_mut() {
                seen.insert(record.category(field)?);
            }
        }

        let fields = observed
            .into_iter()
            .map(|(field, seen)| {
                let codes = seen
                    .into_iter()
                    .enumerate()
                    .map(|(code, value)| (value.to_string(), code as u32))
                    .collect::<BTreeMap<_, _>>();
                (field.to_string(), codes)
            })
            .collect::<BTreeMap<_, _>>();

        for (field, codes) in &fields {
            log::debug!("Code map for {}: {:?}", field, codes);
        }

        Ok(Self { fields })
    }

    /// Code of `value` for `field`.
    pub fn code(&self, field: &str, value: &str) -> Result<u32> {
        let codes = self.fields.get(field).ok_or_else(|| {
            PipelineError::schema(field, "no categorical code map was fitted for this field")
        })?;
        codes
            .get(value)
            .copied()
            .ok_or_else(|| PipelineError::unknown_category(field, value))
    }

    /// Observed categories of `field`, in code order.
    pub fn categories(&self, field: &str) -> Option<Vec<&str>> {
        self.fields.get(field).map(|codes| {
            let mut ordered = vec![""; codes.len()];
            for (value, &code) in codes {
                ordered[code as usize] = value.as_str();
            }
            ordered
        })
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

/// Encode one record into a feature vector of `schema.width()` values.
pub fn encode(record: &Record, schema: Schema, codes: &CategoricalCodeMap) -> Result<Vec<f64>> {
    record.check_conforms(schema)?;
    schema
        .fields()
        .iter()
        .map(|spec| match spec.kind {
            FieldKind::Categorical => {
                let value = record.category(spec.name)?;
                codes.code(spec.name, value).map(f64::from)
            }
            FieldKind::Numeric => record.number(spec.name),
        })
        .collect()
}

/// Encode a batch of records. Row `i` of the result encodes `records[i]`.
pub fn encode_all(
    records: &[Record],
    schema: Schema,
    codes: &CategoricalCodeMap,
) -> Result<Array2<f64>> {
    let rows = records
        .iter()
        .map(|record| encode(record, schema, codes))
        .collect::<Result<Vec<_>>>()?;
    Array2::from_rows(rows, schema.width())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AGE, BILL_AMT1, EDUCATION, LIMIT_BAL, MARRIAGE, PAY_AMT1, SEX};

    fn applicant(sex: &str, education: &str, marriage: &str, age: f64) -> Record {
        Record::new()
            .with_category(SEX, sex)
            .with_category(EDUCATION, education)
            .with_category(MARRIAGE, marriage)
            .with_number(AGE, age)
            .with_number(LIMIT_BAL, 5000.0)
            .with_number(BILL_AMT1, 2000.0)
            .with_number(PAY_AMT1, 2500.0)
    }

    #[test]
    fn codes_follow_sorted_category_order() {
        let records = vec![
            applicant("Male", "University", "Single", 30.0),
            applicant("Female", "Graduate School", "Married", 41.0),
        ];
        let codes = CategoricalCodeMap::fit(&records, Schema::Reduced).unwrap();
        assert_eq!(codes.code(SEX, "Female").unwrap(), 0);
        assert_eq!(codes.code(SEX, "Male").unwrap(), 1);
        assert_eq!(
            codes.categories(EDUCATION).unwrap(),
            vec!["Graduate School", "University"]
        );
    }

    #[test]
    fn fit_is_independent_of_row_order() {
        let mut records = vec![
            applicant("Male", "University", "Single", 30.0),
            applicant("Female", "High School", "Married", 41.0),
            applicant("Female", "Others", "Others", 52.0),
        ];
        let forward = CategoricalCodeMap::fit(&records, Schema::Reduced).unwrap();
        records.reverse();
        let backward = CategoricalCodeMap::fit(&records, Schema::Reduced).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn encode_lays_out_fields_in_schema_order() {
        let records = vec![
            applicant("Male", "University", "Single", 30.0),
            applicant("Female", "Graduate School", "Married", 41.0),
        ];
        let codes = CategoricalCodeMap::fit(&records, Schema::Reduced).unwrap();
        let v = encode(&records[0], Schema::Reduced, &codes).unwrap();
        assert_eq!(v, vec![1.0, 1.0, 1.0, 30.0, 5000.0, 2000.0, 2500.0]);
    }

    #[test]
    fn unseen_category_is_rejected() {
        let records = vec![applicant("Male", "University", "Single", 30.0)];
        let codes = CategoricalCodeMap::fit(&records, Schema::Reduced).unwrap();
        let err = encode(
            &applicant("Male", "High School", "Single", 30.0),
            Schema::Reduced,
            &codes,
        )
        .unwrap_err();
        assert_eq!(
            err,
            PipelineError::UnknownCategory {
                field: EDUCATION.to_string(),
                value: "High School".to_string()
            }
        );
    }

    #[test]
    fn encode_all_preserves_input_order() {
        let records = vec![
            applicant("Male", "University", "Single", 30.0),
            applicant("Female", "University", "Single", 44.0),
            applicant("Male", "University", "Single", 25.0),
        ];
        let codes = CategoricalCodeMap::fit(&records, Schema::Reduced).unwrap();
        let x = encode_all(&records, Schema::Reduced, &codes).unwrap();
        assert_eq!(x.shape(), (3, 7));
        assert_eq!(x.column(3), vec![30.0, 44.0, 25.0]);
    }

    #[test]
    fn fit_on_empty_corpus_fails() {
        assert!(matches!(
            CategoricalCodeMap::fit(&[], Schema::Reduced),
            Err(PipelineError::InsufficientData(_))
        ));
    }
}
