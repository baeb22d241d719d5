use crate::domain::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// ABO group and Rh factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloodType {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
}

impl BloodType {
    /// Canonical order, also the order of the inventory fields.
    pub const ALL: [BloodType; 8] = [
        BloodType::APositive,
        BloodType::ANegative,
        BloodType::BPositive,
        BloodType::BNegative,
        BloodType::OPositive,
        BloodType::ONegative,
        BloodType::AbPositive,
        BloodType::AbNegative,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BloodType::APositive => "A+",
            BloodType::ANegative => "A-",
            BloodType::BPositive => "B+",
            BloodType::BNegative => "B-",
            BloodType::OPositive => "O+",
            BloodType::ONegative => "O-",
            BloodType::AbPositive => "AB+",
            BloodType::AbNegative => "AB-",
        }
    }

    /// Name of the matching field in an inventory payload.
    pub fn field_name(&self) -> &'static str {
        match self {
            BloodType::APositive => "A_positive",
            BloodType::ANegative => "A_negative",
            BloodType::BPositive => "B_positive",
            BloodType::BNegative => "B_negative",
            BloodType::OPositive => "O_positive",
            BloodType::ONegative => "O_negative",
            BloodType::AbPositive => "AB_positive",
            BloodType::AbNegative => "AB_negative",
        }
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BloodType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BloodType::ALL
            .into_iter()
            .find(|t| t.label() == s)
            .ok_or_else(|| DomainError::Validation(format!("Unknown blood type: {s}")))
    }
}

macro_rules! subdivisions {
    ($($variant:ident),+ $(,)?) => {
        /// Sub-divisions of the region served by the registry.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum Subdivision {
            $($variant),+
        }

        impl Subdivision {
            pub const ALL: &'static [Subdivision] = &[$(Subdivision::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Subdivision::$variant => stringify!($variant)),+
                }
            }
        }
    };
}

subdivisions!(
    Dukli,
    Jirania,
    Mohanpur,
    Mandwi,
    Khowai,
    Teliamura,
    Tulasikhar,
    Bishalgarh,
    Melaghar,
    Matabari,
    Amarpur,
    Rajnagar,
    Bakafa,
    Satchand,
    Rupaichari,
    Kadamtala,
    Kanchanpur,
    Panisagar,
    Salema,
    Gandacherra,
    Chawmanu,
    Sadar,
);

impl fmt::Display for Subdivision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subdivision {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Subdivision::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| DomainError::Validation(format!("Unknown subdivision: {s}")))
    }
}

/// Stock count for each of the eight blood types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodQuantities {
    #[serde(rename = "A_positive")]
    pub a_positive: u32,
    #[serde(rename = "A_negative")]
    pub a_negative: u32,
    #[serde(rename = "B_positive")]
    pub b_positive: u32,
    #[serde(rename = "B_negative")]
    pub b_negative: u32,
    #[serde(rename = "O_positive")]
    pub o_positive: u32,
    #[serde(rename = "O_negative")]
    pub o_negative: u32,
    #[serde(rename = "AB_positive")]
    pub ab_positive: u32,
    #[serde(rename = "AB_negative")]
    pub ab_negative: u32,
}

impl BloodQuantities {
    pub fn get(&self, blood_type: BloodType) -> u32 {
        match blood_type {
            BloodType::APositive => self.a_positive,
            BloodType::ANegative => self.a_negative,
            BloodType::BPositive => self.b_positive,
            BloodType::BNegative => self.b_negative,
            BloodType::OPositive => self.o_positive,
            BloodType::ONegative => self.o_negative,
            BloodType::AbPositive => self.ab_positive,
            BloodType::AbNegative => self.ab_negative,
        }
    }

    fn slot(&mut self, blood_type: BloodType) -> &mut u32 {
        match blood_type {
            BloodType::APositive => &mut self.a_positive,
            BloodType::ANegative => &mut self.a_negative,
            BloodType::BPositive => &mut self.b_positive,
            BloodType::BNegative => &mut self.b_negative,
            BloodType::OPositive => &mut self.o_positive,
            BloodType::ONegative => &mut self.o_negative,
            BloodType::AbPositive => &mut self.ab_positive,
            BloodType::AbNegative => &mut self.ab_negative,
        }
    }

    /// Blood types with stock on hand, in canonical order.
    pub fn available(&self) -> Vec<BloodType> {
        BloodType::ALL
            .into_iter()
            .filter(|t| self.get(*t) > 0)
            .collect()
    }
}

/// Inventory payload as received over the wire. Every field must be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuantitiesInput {
    #[serde(rename = "A_positive", default)]
    pub a_positive: Option<i64>,
    #[serde(rename = "A_negative", default)]
    pub a_negative: Option<i64>,
    #[serde(rename = "B_positive", default)]
    pub b_positive: Option<i64>,
    #[serde(rename = "B_negative", default)]
    pub b_negative: Option<i64>,
    #[serde(rename = "O_positive", default)]
    pub o_positive: Option<i64>,
    #[serde(rename = "O_negative", default)]
    pub o_negative: Option<i64>,
    #[serde(rename = "AB_positive", default)]
    pub ab_positive: Option<i64>,
    #[serde(rename = "AB_negative", default)]
    pub ab_negative: Option<i64>,
}

impl QuantitiesInput {
    fn value(&self, blood_type: BloodType) -> Option<i64> {
        match blood_type {
            BloodType::APositive => self.a_positive,
            BloodType::ANegative => self.a_negative,
            BloodType::BPositive => self.b_positive,
            BloodType::BNegative => self.b_negative,
            BloodType::OPositive => self.o_positive,
            BloodType::ONegative => self.o_negative,
            BloodType::AbPositive => self.ab_positive,
            BloodType::AbNegative => self.ab_negative,
        }
    }
}

impl From<BloodQuantities> for QuantitiesInput {
    fn from(q: BloodQuantities) -> Self {
        Self {
            a_positive: Some(q.a_positive.into()),
            a_negative: Some(q.a_negative.into()),
            b_positive: Some(q.b_positive.into()),
            b_negative: Some(q.b_negative.into()),
            o_positive: Some(q.o_positive.into()),
            o_negative: Some(q.o_negative.into()),
            ab_positive: Some(q.ab_positive.into()),
            ab_negative: Some(q.ab_negative.into()),
        }
    }
}

impl TryFrom<QuantitiesInput> for BloodQuantities {
    type Error = DomainError;

    fn try_from(input: QuantitiesInput) -> Result<Self, Self::Error> {
        let mut quantities = BloodQuantities::default();
        let mut missing = Vec::new();
        let mut out_of_range = Vec::new();

        for blood_type in BloodType::ALL {
            match input.value(blood_type) {
                None => missing.push(blood_type.field_name()),
                Some(v) => match u32::try_from(v) {
                    Ok(v) => *quantities.slot(blood_type) = v,
                    Err(_) => out_of_range.push(blood_type.field_name()),
                },
            }
        }

        if !missing.is_empty() {
            return Err(DomainError::Validation(format!(
                "Missing quantities: {}",
                missing.join(", ")
            )));
        }
        if !out_of_range.is_empty() {
            return Err(DomainError::Validation(format!(
                "Quantities must be non-negative integers: {}",
                out_of_range.join(", ")
            )));
        }
        Ok(quantities)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub bank_id: String,
    pub quantities: BloodQuantities,
    pub last_updated: DateTime<Utc>,
}

/// Whether an upsert inserted a fresh record or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_input(value: i64) -> QuantitiesInput {
        QuantitiesInput {
            a_positive: Some(value),
            a_negative: Some(value),
            b_positive: Some(value),
            b_negative: Some(value),
            o_positive: Some(value),
            o_negative: Some(value),
            ab_positive: Some(value),
            ab_negative: Some(value),
        }
    }

    #[test]
    fn test_blood_type_parses_wire_labels() {
        assert_eq!("AB-".parse::<BloodType>().unwrap(), BloodType::AbNegative);
        assert_eq!("O+".parse::<BloodType>().unwrap(), BloodType::OPositive);
        assert!("C+".parse::<BloodType>().is_err());
        assert!("a+".parse::<BloodType>().is_err());
    }

    #[test]
    fn test_blood_type_serializes_as_label() {
        let json = serde_json::to_string(&BloodType::BNegative).unwrap();
        assert_eq!(json, "\"B-\"");
    }

    #[test]
    fn test_subdivision_closed_list() {
        assert_eq!(Subdivision::ALL.len(), 22);
        assert_eq!("Khowai".parse::<Subdivision>().unwrap(), Subdivision::Khowai);
        assert!("Agartala".parse::<Subdivision>().is_err());
        assert_eq!(Subdivision::Sadar.to_string(), "Sadar");
    }

    #[test]
    fn test_quantities_input_requires_every_field() {
        let mut input = full_input(3);
        input.o_negative = None;
        input.ab_positive = None;

        let err = BloodQuantities::try_from(input).unwrap_err();
        match err {
            DomainError::Validation(msg) => {
                assert!(msg.contains("O_negative"));
                assert!(msg.contains("AB_positive"));
                assert!(!msg.contains("A_positive,"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_quantities_input_rejects_negative_values() {
        let mut input = full_input(1);
        input.b_positive = Some(-4);

        let err = BloodQuantities::try_from(input).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("B_positive")));
    }

    #[test]
    fn test_quantities_input_zero_is_valid() {
        let quantities = BloodQuantities::try_from(full_input(0)).unwrap();
        assert_eq!(quantities, BloodQuantities::default());
        assert!(quantities.available().is_empty());
    }

    #[test]
    fn test_available_lists_stocked_types_in_order() {
        let quantities = BloodQuantities {
            ab_negative: 1,
            a_positive: 7,
            o_negative: 2,
            ..Default::default()
        };
        assert_eq!(
            quantities.available(),
            vec![BloodType::APositive, BloodType::ONegative, BloodType::AbNegative]
        );
    }

    #[test]
    fn test_quantities_wire_field_names() {
        let quantities = BloodQuantities {
            a_positive: 5,
            ..Default::default()
        };
        let value = serde_json::to_value(quantities).unwrap();
        assert_eq!(value["A_positive"], 5);
        assert_eq!(value["AB_negative"], 0);
    }
}
