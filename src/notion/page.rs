//! Decoding of Notion pages into rows.
//!
//! Properties are looked up by their configured names and must have the
//! expected property type. A missing or mistyped property is a malformed
//! source, not a bad row.

use crate::config::PropertiesConfig;
use crate::models::{DateRange, RawRow, SubscriptionRow};
use crate::notes::RichText;
use crate::notion::client::SourceError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
struct PageObject {
    id: String,
    created_time: DateTime<Utc>,
    properties: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct NamedOption {
    name: String,
}

#[derive(Debug, Deserialize)]
struct StatusProperty {
    status: Option<NamedOption>,
}

#[derive(Debug, Deserialize)]
struct SelectProperty {
    select: Option<NamedOption>,
}

#[derive(Debug, Deserialize)]
struct RelationRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RelationProperty {
    relation: Vec<RelationRef>,
}

#[derive(Debug, Deserialize)]
struct PlainText {
    #[serde(default)]
    plain_text: String,
}

#[derive(Debug, Deserialize)]
struct TitleProperty {
    title: Vec<PlainText>,
}

#[derive(Debug, Deserialize)]
struct RichTextProperty {
    rich_text: Vec<RichText>,
}

#[derive(Debug, Deserialize)]
struct NotionDate {
    start: String,
    end: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DateProperty {
    date: Option<NotionDate>,
}

#[derive(Debug, Deserialize)]
struct NumberProperty {
    number: Option<f64>,
}

impl PageObject {
    fn parse(page: Value) -> Result<Self, SourceError> {
        serde_json::from_value(page)
            .map_err(|e| SourceError::Malformed(format!("page object: {}", e)))
    }

    fn property<T: DeserializeOwned>(&self, name: &str) -> Result<T, SourceError> {
        let value = self.properties.get(name).ok_or_else(|| {
            SourceError::Malformed(format!("page {} has no property '{}'", self.id, name))
        })?;

        serde_json::from_value(value.clone()).map_err(|e| {
            SourceError::Malformed(format!(
                "page {} property '{}': {}",
                self.id, name, e
            ))
        })
    }

    fn title(&self, name: &str) -> Result<Option<String>, SourceError> {
        let title: TitleProperty = self.property(name)?;
        let text: String = title.title.into_iter().map(|t| t.plain_text).collect();
        Ok(Some(text).filter(|t| !t.trim().is_empty()))
    }

    fn select(&self, name: &str) -> Result<Option<String>, SourceError> {
        let select: SelectProperty = self.property(name)?;
        Ok(select.select.map(|option| option.name))
    }

    fn number(&self, name: &str) -> Result<f64, SourceError> {
        let number: NumberProperty = self.property(name)?;
        number.number.ok_or_else(|| {
            SourceError::Malformed(format!("page {} property '{}' is empty", self.id, name))
        })
    }
}

/// Parse a date property value. Accepts RFC 3339 date-times and bare
/// `YYYY-MM-DD` dates, which are read as midnight UTC.
pub fn parse_date(value: &str) -> Result<DateTime<Utc>, SourceError> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Ok(datetime.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
        .ok_or_else(|| SourceError::Malformed(format!("invalid date '{}'", value)))
}

/// Decode a page of the applications database.
pub fn decode_application(page: Value, props: &PropertiesConfig) -> Result<RawRow, SourceError> {
    let page = PageObject::parse(page)?;

    let status: StatusProperty = page.property(&props.status)?;
    let relation: RelationProperty = page.property(&props.application)?;
    let deadline: DateProperty = page.property(&props.deadline)?;

    let deadline = match deadline.date {
        Some(date) => Some(DateRange {
            start: parse_date(&date.start)?,
            end: date.end.as_deref().map(parse_date).transpose()?,
        }),
        None => None,
    };

    Ok(RawRow {
        // A null status is left for the classifier to reject.
        status: status.status.map(|s| s.name).unwrap_or_default(),
        company: page.title(&props.company)?,
        role: page.select(&props.role)?,
        team: page.select(&props.team)?,
        parent_ids: relation.relation.into_iter().map(|r| r.id).collect(),
        deadline,
        created: page.created_time,
        id: page.id,
    })
}

/// Decode only the company title of an applications page.
pub fn decode_company(page: Value, props: &PropertiesConfig) -> Result<Option<String>, SourceError> {
    PageObject::parse(page)?.title(&props.company)
}

/// Decode a page of the subscriptions database.
pub fn decode_subscription(
    page: Value,
    props: &PropertiesConfig,
) -> Result<SubscriptionRow, SourceError> {
    let page = PageObject::parse(page)?;

    // The name is only used in log lines, so it may be absent.
    let name = if page.properties.contains_key(&props.name) {
        page.title(&props.name)?
    } else {
        None
    };

    Ok(SubscriptionRow {
        name,
        price: page.number(&props.price)?,
        frequency_months: page.number(&props.frequency)?,
    })
}

/// Decode the notes of a page: its id and the notes rich text.
pub fn decode_notes(
    page: Value,
    props: &PropertiesConfig,
) -> Result<(String, Vec<RichText>), SourceError> {
    let page = PageObject::parse(page)?;
    let notes: RichTextProperty = page.property(&props.notes)?;
    Ok((page.id, notes.rich_text))
}
