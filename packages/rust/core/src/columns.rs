//! Header-driven column resolution.
//!
//! The sheet's columns may be reordered, renamed around, or extended at any
//! time, so positions are looked up by exact header label on every run.

use paylink_shared::{ColumnLabels, NotifierError, Result};

/// Semantic fields the notifier reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    PaymentLink,
    IsGenPaymentLink,
    IsSendNoti,
    LandNo,
    Phone,
    Email,
    Timestamp,
    Error,
}

impl Field {
    /// Every field, in resolution order.
    pub const ALL: [Field; 8] = [
        Field::PaymentLink,
        Field::IsGenPaymentLink,
        Field::IsSendNoti,
        Field::LandNo,
        Field::Phone,
        Field::Email,
        Field::Timestamp,
        Field::Error,
    ];

    /// Fields a run cannot proceed without, in the order they are checked.
    pub const REQUIRED: [Field; 3] = [
        Field::PaymentLink,
        Field::IsGenPaymentLink,
        Field::IsSendNoti,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::PaymentLink => "payment_link",
            Field::IsGenPaymentLink => "is_gen_payment_link",
            Field::IsSendNoti => "is_send_noti",
            Field::LandNo => "land_no",
            Field::Phone => "phone",
            Field::Email => "email",
            Field::Timestamp => "timestamp",
            Field::Error => "error",
        }
    }

    fn label(self, labels: &ColumnLabels) -> &str {
        match self {
            Field::PaymentLink => &labels.payment_link,
            Field::IsGenPaymentLink => &labels.is_gen_payment_link,
            Field::IsSendNoti => &labels.is_send_noti,
            Field::LandNo => &labels.land_no,
            Field::Phone => &labels.phone,
            Field::Email => &labels.email,
            Field::Timestamp => &labels.timestamp,
            Field::Error => &labels.error,
        }
    }

    /// Columns shown in the per-row diagnostic dump.
    pub fn is_displayed(self) -> bool {
        matches!(self, Field::LandNo | Field::Phone | Field::Email)
    }
}

/// Zero-based column position per field; `None` when the header lacks it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchemaMap {
    pub payment_link: Option<usize>,
    pub is_gen_payment_link: Option<usize>,
    pub is_send_noti: Option<usize>,
    pub land_no: Option<usize>,
    pub phone: Option<usize>,
    pub email: Option<usize>,
    pub timestamp: Option<usize>,
    pub error: Option<usize>,
}

impl SchemaMap {
    pub fn get(&self, field: Field) -> Option<usize> {
        *self.slot(field)
    }

    fn slot(&self, field: Field) -> &Option<usize> {
        match field {
            Field::PaymentLink => &self.payment_link,
            Field::IsGenPaymentLink => &self.is_gen_payment_link,
            Field::IsSendNoti => &self.is_send_noti,
            Field::LandNo => &self.land_no,
            Field::Phone => &self.phone,
            Field::Email => &self.email,
            Field::Timestamp => &self.timestamp,
            Field::Error => &self.error,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<usize> {
        match field {
            Field::PaymentLink => &mut self.payment_link,
            Field::IsGenPaymentLink => &mut self.is_gen_payment_link,
            Field::IsSendNoti => &mut self.is_send_noti,
            Field::LandNo => &mut self.land_no,
            Field::Phone => &mut self.phone,
            Field::Email => &mut self.email,
            Field::Timestamp => &mut self.timestamp,
            Field::Error => &mut self.error,
        }
    }

    /// Field resolved at column `index`, if any.
    pub fn field_at(&self, index: usize) -> Option<Field> {
        Field::ALL
            .into_iter()
            .find(|&field| self.get(field) == Some(index))
    }

    /// Fail with [`NotifierError::MissingColumn`] on the first absent required field.
    pub fn validate(&self) -> Result<()> {
        match Field::REQUIRED.into_iter().find(|&f| self.get(f).is_none()) {
            Some(field) => Err(NotifierError::MissingColumn {
                field: field.name(),
            }),
            None => Ok(()),
        }
    }
}

impl std::fmt::Display for SchemaMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = Field::ALL
            .into_iter()
            .map(|field| match self.get(field) {
                Some(i) => format!("{}={i}", field.name()),
                None => format!("{}=-", field.name()),
            })
            .collect();
        f.write_str(&parts.join(", "))
    }
}

/// Map header labels to field positions. Never fails; absent fields stay `None`.
///
/// Duplicate labels resolve to their last occurrence.
pub fn resolve(headers: &[String], labels: &ColumnLabels) -> SchemaMap {
    let mut schema = SchemaMap::default();
    for (i, header) in headers.iter().enumerate() {
        if let Some(field) = Field::ALL
            .into_iter()
            .find(|f| f.label(labels) == header.as_str())
        {
            *schema.slot_mut(field) = Some(i);
        }
    }
    schema
}

/// Whether `header` is the label of a control, timestamp or error column.
///
/// Matched on the label itself, so every copy of a duplicated header counts.
pub fn is_control_label(header: &str, labels: &ColumnLabels) -> bool {
    Field::ALL
        .into_iter()
        .any(|field| !field.is_displayed() && field.label(labels) == header)
}

/// Cell at `index`, or `None` when the column is absent or the row is short.
pub fn cell(row: &[String], index: Option<usize>) -> Option<&str> {
    index.and_then(|i| row.get(i)).map(String::as_str)
}
