use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::LoanError;
use crate::schedule::calendar::{parse_weekday, weekday_label};

/// identifier assigned by the record store on first save
pub type RecordId = Uuid;

/// payment cadence of a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modality {
    #[serde(rename = "Diario")]
    Daily,
    #[serde(rename = "Semanal")]
    Weekly,
    #[serde(rename = "Mensual")]
    Monthly,
}

impl Modality {
    pub const ALL: [Modality; 3] = [Modality::Daily, Modality::Weekly, Modality::Monthly];

    /// label as stored and shown to collectors
    pub fn label(&self) -> &'static str {
        match self {
            Modality::Daily => "Diario",
            Modality::Weekly => "Semanal",
            Modality::Monthly => "Mensual",
        }
    }

    /// whether installments fall on a chosen weekday
    pub fn uses_anchor_weekday(&self) -> bool {
        !matches!(self, Modality::Daily)
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Modality {
    type Err = LoanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "diario" | "daily" => Ok(Modality::Daily),
            "semanal" | "weekly" => Ok(Modality::Weekly),
            "mensual" | "monthly" => Ok(Modality::Monthly),
            other => Err(LoanError::Validation {
                field: "modality",
                message: format!("unknown modality {:?}", other),
            }),
        }
    }
}

/// effective collection anchor shown next to a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum CollectionDay {
    /// collected every business day
    Daily,
    /// collected on this weekday
    Weekday(Weekday),
}

impl fmt::Display for CollectionDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionDay::Daily => f.write_str(Modality::Daily.label()),
            CollectionDay::Weekday(day) => f.write_str(weekday_label(*day)),
        }
    }
}

impl From<CollectionDay> for String {
    fn from(day: CollectionDay) -> Self {
        day.to_string()
    }
}

impl TryFrom<String> for CollectionDay {
    type Error = LoanError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.parse::<Modality>().ok() == Some(Modality::Daily) {
            return Ok(CollectionDay::Daily);
        }
        parse_weekday(&value)
            .map(CollectionDay::Weekday)
            .ok_or(LoanError::Validation {
                field: "day_of_week",
                message: format!("unknown collection day {:?}", value),
            })
    }
}

/// kind of stored file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    DniFront,
    DniBack,
    Profile,
}

/// user roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Collector,
}

/// account state; disabled users cannot sign in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserState {
    Enabled,
    Disabled,
}

/// what to do with a payment larger than the remaining balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverpaymentPolicy {
    /// accept; remaining balance goes negative
    Allow,
    /// refuse before anything is written
    Reject,
}
