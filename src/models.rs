use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// HTTP Method enum
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    GET,
    POST,
    DELETE,
}

impl HttpMethod {
    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::DELETE => "DELETE",
        }
    }

    pub fn has_body(&self) -> bool {
        matches!(self, HttpMethod::POST)
    }
}

/// Which of the two record collections an entry belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Income,
    Expense,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Income => "income",
            RecordKind::Expense => "expense",
        }
    }

    /// Key the backend may wrap a listing in (`{"incomes": [...]}`)
    pub fn collection_key(&self) -> &'static str {
        match self {
            RecordKind::Income => "incomes",
            RecordKind::Expense => "expenses",
        }
    }

    pub fn list_path(&self) -> String {
        format!("get-{}", self.collection_key())
    }

    pub fn add_path(&self) -> String {
        format!("add-{}", self.as_str())
    }

    pub fn delete_path(&self, id: &str) -> String {
        format!("delete-{}/{}", self.as_str(), id)
    }

    pub fn fetch_failed(&self) -> String {
        format!("Failed to fetch {}", self.collection_key())
    }

    pub fn add_failed(&self) -> String {
        format!("Failed to add {}", self.as_str())
    }

    pub fn delete_failed(&self) -> String {
        format!("Failed to delete {}", self.as_str())
    }

    pub fn invalid_data(&self) -> String {
        format!("Invalid {} data", self.as_str())
    }

    pub fn invalid_id(&self) -> String {
        format!("Invalid {} ID", self.as_str())
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "income" | "incomes" => Ok(RecordKind::Income),
            "expense" | "expenses" => Ok(RecordKind::Expense),
            other => Err(format!("unknown record kind '{}'", other)),
        }
    }
}

/// A single income or expense entry as acknowledged by the backend
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireRecord")]
pub struct Record {
    pub id: String,
    pub title: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub amount: Decimal,
    pub category: String,
    #[serde(with = "calendar_date")]
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Wire shape of a record: the backend names the id `_id`, `id`, or both
#[derive(Deserialize)]
struct WireRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "_id")]
    object_id: Option<String>,
    title: String,
    amount: Decimal,
    #[serde(default)]
    category: String,
    #[serde(with = "calendar_date")]
    date: NaiveDate,
    #[serde(default)]
    description: Option<String>,
}

impl TryFrom<WireRecord> for Record {
    type Error = String;

    fn try_from(wire: WireRecord) -> Result<Self, Self::Error> {
        let id = wire
            .object_id
            .or(wire.id)
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| String::from("record is missing an id"))?;

        Ok(Record {
            id,
            title: wire.title,
            amount: wire.amount,
            category: wire.category,
            date: wire.date,
            description: wire.description.filter(|d| !d.is_empty()),
        })
    }
}

/// Record minus id: the payload of an add request
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewRecord {
    pub title: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub amount: Decimal,
    pub category: String,
    #[serde(with = "calendar_date")]
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewRecord {
    pub fn new(
        title: impl Into<String>,
        amount: Decimal,
        category: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        NewRecord {
            title: title.into(),
            amount,
            category: category.into(),
            date,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check the payload is well-formed before it goes anywhere near the network
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty()
            && !self.category.trim().is_empty()
            && !self.amount.is_sign_negative()
    }

    /// Materialize a record under a locally generated id
    pub fn into_record(self, id: String) -> Record {
        Record {
            id,
            title: self.title,
            amount: self.amount,
            category: self.category,
            date: self.date,
            description: self.description,
        }
    }
}

/// Login payload
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Sign-up payload
#[derive(Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Smallest and largest amount in a collection; both zero when it is empty
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AmountRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl AmountRange {
    pub fn of(records: &[Record]) -> Self {
        let mut amounts = records.iter().map(|r| r.amount);
        let Some(first) = amounts.next() else {
            return AmountRange::default();
        };
        amounts.fold(AmountRange { min: first, max: first }, |range, amount| AmountRange {
            min: range.min.min(amount),
            max: range.max.max(amount),
        })
    }
}

/// Aggregates derived from the current collections
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Totals {
    pub income: Decimal,
    pub expenses: Decimal,
    pub balance: Decimal,
    pub income_range: AmountRange,
    pub expense_range: AmountRange,
}

impl Totals {
    pub fn compute(incomes: &[Record], expenses: &[Record]) -> Self {
        let income: Decimal = incomes.iter().map(|r| r.amount).sum();
        let expense_total: Decimal = expenses.iter().map(|r| r.amount).sum();
        Totals {
            income,
            expenses: expense_total,
            balance: income - expense_total,
            income_range: AmountRange::of(incomes),
            expense_range: AmountRange::of(expenses),
        }
    }
}

/// Parse a calendar date, accepting either `YYYY-MM-DD` or a full timestamp
pub fn parse_calendar_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    let raw = raw.trim();
    let head = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
}

mod calendar_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_calendar_date(&raw).map_err(de::Error::custom)
    }
}
