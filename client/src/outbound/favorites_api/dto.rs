//! DTOs for decoding backend favorites payloads.
//!
//! Backend records wrap a nested `item` whose shape varies by kind and whose
//! fields may be missing, null, or typed loosely. The adapter decodes into
//! these transport DTOs first, then maps into domain entries in one pass
//! using the defaulting rules below:
//!
//! - strings: missing or null values become `""`; an object contributes its
//!   `name`;
//! - numbers: numeric strings are parsed; anything else becomes `0`;
//! - images: each element may be a URL string or an object with `url`;
//! - a record whose `item` is missing or null is dropped;
//! - a record without a usable id is dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{
    EntityId, FavoriteEntry, FavoriteKind, HouseSnapshot, JobSnapshot, Listing,
};

/// List payload, either bare or wrapped in the `{ success, data }` envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum FavoritesListDto {
    Bare(Vec<FavoriteRecordDto>),
    Wrapped {
        #[serde(default)]
        data: Vec<FavoriteRecordDto>,
    },
}

#[derive(Debug, Deserialize)]
pub(super) struct FavoriteRecordDto {
    #[serde(default)]
    item_id: Value,
    #[serde(default)]
    item: Option<ItemDto>,
    #[serde(default)]
    created_at: Value,
}

#[derive(Debug, Deserialize)]
struct ItemDto {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    title: Value,
    #[serde(default)]
    location: Value,
    #[serde(default)]
    price: Value,
    #[serde(default)]
    images: Value,
    #[serde(default)]
    bedrooms: Value,
    #[serde(default)]
    bathrooms: Value,
    #[serde(default)]
    area: Value,
    #[serde(default)]
    listing_type: Value,
    #[serde(default)]
    company: Value,
    #[serde(default)]
    company_name: Value,
    #[serde(default)]
    company_logo: Value,
    #[serde(default)]
    salary_min: Value,
    #[serde(default)]
    salary_max: Value,
    #[serde(default)]
    job_type: Value,
}

/// Body of `POST /favorites/toggle`.
#[derive(Debug, Serialize)]
pub(super) struct ToggleRequestDto<'a> {
    pub(super) item_id: &'a str,
    pub(super) item_type: &'a str,
}

/// Toggle result, wrapped in `{ success, data }` or bare.
#[derive(Debug, Deserialize)]
pub(super) struct ToggleResponseDto {
    #[serde(default)]
    data: Option<ToggleDataDto>,
    #[serde(default)]
    favorited: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ToggleDataDto {
    favorited: bool,
}

/// Failure body; only the message is of interest.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ErrorBodyDto {
    #[serde(default)]
    message: Option<String>,
}

impl FavoritesListDto {
    pub(super) fn into_domain_entries(self, kind: FavoriteKind) -> Vec<FavoriteEntry> {
        let records = match self {
            Self::Bare(records) => records,
            Self::Wrapped { data } => data,
        };
        records
            .into_iter()
            .filter_map(|record| record.into_domain_entry(kind))
            .collect()
    }
}

impl FavoriteRecordDto {
    fn into_domain_entry(self, kind: FavoriteKind) -> Option<FavoriteEntry> {
        let item = self.item?;
        let id = entity_id(&item.id).or_else(|| entity_id(&self.item_id))?;
        let listing = match kind {
            FavoriteKind::House => Listing::house(id, item.into_house()),
            FavoriteKind::Job => Listing::job(id, item.into_job()),
        };
        Some(FavoriteEntry::new(listing, timestamp(&self.created_at)))
    }
}

impl ItemDto {
    fn into_house(self) -> HouseSnapshot {
        HouseSnapshot {
            title: text(&self.title),
            price: number(&self.price),
            location: text(&self.location),
            images: images(&self.images),
            bedrooms: count(&self.bedrooms),
            bathrooms: count(&self.bathrooms),
            area: number(&self.area),
            listing_type: text(&self.listing_type),
        }
    }

    fn into_job(self) -> JobSnapshot {
        let company = match text(&self.company) {
            name if name.is_empty() => text(&self.company_name),
            name => name,
        };
        JobSnapshot {
            title: text(&self.title),
            company,
            location: text(&self.location),
            salary_min: number(&self.salary_min),
            salary_max: number(&self.salary_max),
            job_type: text(&self.job_type),
            company_logo: Some(text(&self.company_logo)).filter(|logo| !logo.is_empty()),
        }
    }
}

impl ToggleResponseDto {
    pub(super) fn favorited(&self) -> Option<bool> {
        self.data
            .as_ref()
            .map(|data| data.favorited)
            .or(self.favorited)
    }
}

impl ErrorBodyDto {
    pub(super) fn into_message(self) -> Option<String> {
        self.message
            .map(|message| message.trim().to_owned())
            .filter(|message| !message.is_empty())
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Object(object) => object.get("name").map(text).unwrap_or_default(),
        _ => String::new(),
    }
}

fn number(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|number| number.is_finite()).unwrap_or(0.0)
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "the value is clamped to the u32 range before the cast; fractions truncate"
)]
fn count(value: &Value) -> u32 {
    let number = number(value);
    if number <= 0.0 {
        0
    } else if number >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        number as u32
    }
}

fn images(value: &Value) -> Vec<String> {
    let Value::Array(elements) = value else {
        return Vec::new();
    };
    elements
        .iter()
        .filter_map(|element| match element {
            Value::String(url) => Some(url.clone()),
            Value::Object(object) => object.get("url").and_then(Value::as_str).map(str::to_owned),
            _ => None,
        })
        .filter(|url| !url.trim().is_empty())
        .collect()
}

fn entity_id(value: &Value) -> Option<EntityId> {
    let raw = match value {
        Value::String(text) => text.trim().to_owned(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    EntityId::new(raw).ok()
}

fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|parsed| parsed.with_timezone(&Utc))
}
