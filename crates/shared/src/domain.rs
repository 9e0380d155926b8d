use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::UnknownField;

pub const TOTAL_QUESTIONS: u32 = 11;

pub const MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

pub const COMMENTS_MAX_LEN: usize = 500;

pub const ACCEPTED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "application/pdf",
];

macro_rules! field_ids {
    ($($variant:ident => $id:literal),+ $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum FieldId {
            $(
                #[serde(rename = $id)]
                $variant,
            )+
        }

        impl FieldId {
            pub const ALL: &'static [FieldId] = &[$(FieldId::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(FieldId::$variant => $id,)+
                }
            }
        }

        impl FromStr for FieldId {
            type Err = UnknownField;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($id => Ok(FieldId::$variant),)+
                    other => Err(UnknownField(other.to_string())),
                }
            }
        }
    };
}

field_ids! {
    NewLeads => "newLeads",
    LeadsToDeals => "leadsToDeals",
    LostLeads => "lostLeads",
    ActiveChats => "activeChats",
    TransferredClients => "transferredClients",
    ClosedDeals => "closedDeals",
    DealAmount => "dealAmount",
    ShippedOrders => "shippedOrders",
    PaidOrders => "paidOrders",
    Receipts => "receipts",
    Comments => "comments",
}

/// The nine numeric KPIs that each count as one answered question.
pub const REQUIRED_NUMERIC_FIELDS: [FieldId; 9] = [
    FieldId::NewLeads,
    FieldId::LeadsToDeals,
    FieldId::LostLeads,
    FieldId::ActiveChats,
    FieldId::TransferredClients,
    FieldId::ClosedDeals,
    FieldId::DealAmount,
    FieldId::ShippedOrders,
    FieldId::PaidOrders,
];

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Number,
    Text,
    File,
}

/// Static metadata for one form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub id: FieldId,
    pub kind: FieldKind,
    pub required: bool,
    pub non_negative: bool,
    pub max_len: Option<usize>,
    /// Another numeric field this one may not exceed once that field is positive.
    pub bounded_by: Option<FieldId>,
}

impl FieldSpec {
    const fn number(id: FieldId) -> Self {
        Self {
            id,
            kind: FieldKind::Number,
            required: true,
            non_negative: true,
            max_len: None,
            bounded_by: None,
        }
    }

    const fn bounded_number(id: FieldId, bound: FieldId) -> Self {
        let mut spec = Self::number(id);
        spec.bounded_by = Some(bound);
        spec
    }
}

impl FieldId {
    pub const fn spec(self) -> FieldSpec {
        match self {
            FieldId::LeadsToDeals | FieldId::LostLeads => {
                FieldSpec::bounded_number(self, FieldId::NewLeads)
            }
            FieldId::Receipts => FieldSpec {
                id: self,
                kind: FieldKind::File,
                required: true,
                non_negative: false,
                max_len: None,
                bounded_by: None,
            },
            FieldId::Comments => FieldSpec {
                id: self,
                kind: FieldKind::Text,
                required: false,
                non_negative: false,
                max_len: Some(COMMENTS_MAX_LEN),
                bounded_by: None,
            },
            _ => FieldSpec::number(self),
        }
    }

    pub fn is_file(self) -> bool {
        self.spec().kind == FieldKind::File
    }

    /// Fields whose values are plain text and therefore persisted.
    pub fn value_fields() -> impl Iterator<Item = FieldId> {
        FieldId::ALL.iter().copied().filter(|id| !id.is_file())
    }
}

/// Outcome of validating one field against the current form state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub message: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }
}

/// Visual state a field carries after its last validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldMarker {
    #[default]
    Unmarked,
    Valid,
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    pub completed: u32,
    pub total: u32,
}

impl ProgressState {
    pub fn new(completed: u32) -> Self {
        Self {
            completed: completed.min(TOTAL_QUESTIONS),
            total: TOTAL_QUESTIONS,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }

    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.completed) / f64::from(self.total) * 100.0
    }

    pub fn label(&self) -> String {
        format!("{} из {} вопросов", self.completed, self.total)
    }
}

/// A file handed over by the picker, not yet checked against attachment rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub content: Vec<u8>,
}
