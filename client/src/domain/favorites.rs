//! Favorite entries and the in-memory favorites set.
//!
//! A favorite is a denormalised snapshot of a house or job listing taken at
//! the moment the user saved it. Snapshots are never live-synced with the
//! source listing, so favorites render without a network round trip at the
//! cost of going stale when the listing is edited later.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// Natural identifier of a house or job listing.
///
/// ## Invariants
/// - Non-empty and free of surrounding whitespace.
///
/// # Examples
/// ```
/// use marketplace_client::domain::EntityId;
///
/// let id = EntityId::new("h1").expect("valid id");
/// assert_eq!(id.as_str(), "h1");
/// assert!(EntityId::new(" h1").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

/// Validation errors returned when constructing [`EntityId`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityIdValidationError {
    /// Identifier is empty.
    #[error("entity id must not be empty")]
    Empty,
    /// Identifier has leading or trailing whitespace.
    #[error("entity id must not contain surrounding whitespace")]
    ContainsWhitespace,
}

impl EntityId {
    /// Validate and construct an identifier.
    pub fn new(value: impl Into<String>) -> Result<Self, EntityIdValidationError> {
        let raw = value.into();
        if raw.is_empty() {
            return Err(EntityIdValidationError::Empty);
        }
        if raw.trim() != raw {
            return Err(EntityIdValidationError::ContainsWhitespace);
        }
        Ok(Self(raw))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<EntityId> for String {
    fn from(value: EntityId) -> Self {
        value.0
    }
}

impl TryFrom<String> for EntityId {
    type Error = EntityIdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// The two kinds of entity a user can favorite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FavoriteKind {
    /// A house listing.
    House,
    /// A job posting.
    Job,
}

impl FavoriteKind {
    /// Every kind, in display order.
    pub const ALL: [Self; 2] = [Self::House, Self::Job];

    /// Local string form (`house`, `job`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::House => "house",
            Self::Job => "job",
        }
    }

    /// Wire form used by the favorites API (`HOUSE`, `JOB`).
    pub fn as_remote_str(self) -> &'static str {
        match self {
            Self::House => "HOUSE",
            Self::Job => "JOB",
        }
    }
}

impl fmt::Display for FavoriteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown favorite kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown favorite kind: {input}")]
pub struct ParseFavoriteKindError {
    /// The unrecognised input value.
    pub input: String,
}

impl std::str::FromStr for FavoriteKind {
    type Err = ParseFavoriteKindError;

    /// Accepts both the local and the wire form, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("house") {
            Ok(Self::House)
        } else if s.eq_ignore_ascii_case("job") {
            Ok(Self::Job)
        } else {
            Err(ParseFavoriteKindError {
                input: s.to_owned(),
            })
        }
    }
}

/// Display fields of a house listing captured at favoriting time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseSnapshot {
    /// Listing headline.
    pub title: String,
    /// Asking price or rent.
    #[serde(with = "finite_number")]
    pub price: f64,
    /// Free-form location line.
    pub location: String,
    /// Image URLs in display order.
    #[serde(default)]
    pub images: Vec<String>,
    /// Number of bedrooms.
    pub bedrooms: u32,
    /// Number of bathrooms.
    pub bathrooms: u32,
    /// Floor area.
    #[serde(with = "finite_number")]
    pub area: f64,
    /// Sale or rent marker as supplied by the backend.
    #[serde(default)]
    pub listing_type: String,
}

/// Display fields of a job posting captured at favoriting time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    /// Job title.
    pub title: String,
    /// Hiring company name.
    pub company: String,
    /// Free-form location line.
    pub location: String,
    /// Lower salary bound.
    #[serde(with = "finite_number")]
    pub salary_min: f64,
    /// Upper salary bound.
    #[serde(with = "finite_number")]
    pub salary_max: f64,
    /// Contract type (full time, part time, ...).
    #[serde(default)]
    pub job_type: String,
    /// Company logo URL, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_logo: Option<String>,
}

/// Amounts are stored as finite numbers. JSON has no encoding for NaN or
/// infinity, so a non-finite amount is refused on write, and a `null` left
/// by older builds reads back as zero.
mod finite_number {
    use serde::{Deserialize, Deserializer, Serializer, de, ser};

    pub(super) fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            Err(<S::Error as ser::Error>::custom(format!("amount {value} is not finite")))
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let value = Option::<f64>::deserialize(deserializer)?;
        match value {
            Some(number) if !number.is_finite() => Err(<D::Error as de::Error>::custom(
                format!("amount {number} is not finite"),
            )),
            other => Ok(other.unwrap_or(0.0)),
        }
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

impl HouseSnapshot {
    fn normalised(self) -> Self {
        Self {
            price: finite_or_zero(self.price),
            area: finite_or_zero(self.area),
            ..self
        }
    }
}

impl JobSnapshot {
    fn normalised(self) -> Self {
        Self {
            salary_min: finite_or_zero(self.salary_min),
            salary_max: finite_or_zero(self.salary_max),
            ..self
        }
    }
}

/// Snapshot of a favoritable entity. The variant determines the kind.
#[derive(Debug, Clone, PartialEq)]
pub enum EntitySnapshot {
    /// Snapshot of a house listing.
    House(HouseSnapshot),
    /// Snapshot of a job posting.
    Job(JobSnapshot),
}

impl EntitySnapshot {
    /// Kind implied by the variant.
    pub fn kind(&self) -> FavoriteKind {
        match self {
            Self::House(_) => FavoriteKind::House,
            Self::Job(_) => FavoriteKind::Job,
        }
    }

    /// Headline shown on favorite cards.
    pub fn title(&self) -> &str {
        match self {
            Self::House(house) => house.title.as_str(),
            Self::Job(job) => job.title.as_str(),
        }
    }

    /// Replace non-finite amounts with zero.
    fn normalised(self) -> Self {
        match self {
            Self::House(house) => Self::House(house.normalised()),
            Self::Job(job) => Self::Job(job.normalised()),
        }
    }

    fn from_value(kind: FavoriteKind, value: Value) -> Result<Self, serde_json::Error> {
        match kind {
            FavoriteKind::House => serde_json::from_value(value).map(Self::House),
            FavoriteKind::Job => serde_json::from_value(value).map(Self::Job),
        }
    }
}

impl Serialize for EntitySnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::House(house) => house.serialize(serializer),
            Self::Job(job) => job.serialize(serializer),
        }
    }
}

/// A listing as presented by an entity card: its id plus current fields.
///
/// # Examples
/// ```
/// use marketplace_client::domain::{EntityId, FavoriteKind, HouseSnapshot, Listing};
///
/// let listing = Listing::house(
///     EntityId::new("h1").expect("id"),
///     HouseSnapshot { title: "Loft".to_owned(), ..HouseSnapshot::default() },
/// );
/// assert_eq!(listing.kind(), FavoriteKind::House);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "FavoriteEntryDto")]
pub struct Listing {
    /// Listing identifier.
    pub id: EntityId,
    /// Current display fields.
    pub snapshot: EntitySnapshot,
}

impl Listing {
    /// Build a house listing. Non-finite amounts become zero.
    pub fn house(id: EntityId, snapshot: HouseSnapshot) -> Self {
        Self {
            id,
            snapshot: EntitySnapshot::House(snapshot.normalised()),
        }
    }

    /// Build a job listing. Non-finite amounts become zero.
    pub fn job(id: EntityId, snapshot: JobSnapshot) -> Self {
        Self {
            id,
            snapshot: EntitySnapshot::Job(snapshot.normalised()),
        }
    }

    /// Kind implied by the snapshot.
    pub fn kind(&self) -> FavoriteKind {
        self.snapshot.kind()
    }
}

/// A favorited entity.
///
/// Serialised as `{ "id", "type", "snapshot", "savedAt" }`. Deserialisation
/// rejects entries whose snapshot does not decode as the declared `type`.
///
/// ## Invariants
/// - Snapshot amounts are finite, so every entry encodes as JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "FavoriteEntryDto")]
pub struct FavoriteEntry {
    id: EntityId,
    snapshot: EntitySnapshot,
    saved_at: Option<DateTime<Utc>>,
}

impl FavoriteEntry {
    /// Capture a listing as a favorite. Non-finite amounts become zero.
    pub fn new(listing: Listing, saved_at: Option<DateTime<Utc>>) -> Self {
        Self {
            id: listing.id,
            snapshot: listing.snapshot.normalised(),
            saved_at,
        }
    }

    /// Identifier of the favorited entity.
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// Kind of the favorited entity.
    pub fn kind(&self) -> FavoriteKind {
        self.snapshot.kind()
    }

    /// Snapshot taken when the entity was favorited.
    pub fn snapshot(&self) -> &EntitySnapshot {
        &self.snapshot
    }

    /// When the favorite was taken, if known.
    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        self.saved_at
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FavoriteEntryDto {
    id: EntityId,
    #[serde(rename = "type")]
    kind: FavoriteKind,
    snapshot: Value,
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FavoriteEntryRef<'a> {
    id: &'a EntityId,
    #[serde(rename = "type")]
    kind: FavoriteKind,
    snapshot: &'a EntitySnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved_at: Option<DateTime<Utc>>,
}

impl Serialize for FavoriteEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        FavoriteEntryRef {
            id: &self.id,
            kind: self.kind(),
            snapshot: &self.snapshot,
            saved_at: self.saved_at,
        }
        .serialize(serializer)
    }
}

impl Serialize for Listing {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        FavoriteEntryRef {
            id: &self.id,
            kind: self.kind(),
            snapshot: &self.snapshot,
            saved_at: None,
        }
        .serialize(serializer)
    }
}

/// Errors raised when decoding a persisted favorite entry.
#[derive(Debug, Error)]
pub enum FavoriteEntryDecodeError {
    /// The snapshot does not match the declared kind.
    #[error("snapshot for {kind} {id} is invalid: {source}")]
    Snapshot {
        /// Declared kind.
        kind: FavoriteKind,
        /// Entry identifier.
        id: EntityId,
        /// Underlying decode failure.
        #[source]
        source: serde_json::Error,
    },
}

impl TryFrom<FavoriteEntryDto> for FavoriteEntry {
    type Error = FavoriteEntryDecodeError;

    fn try_from(value: FavoriteEntryDto) -> Result<Self, Self::Error> {
        let FavoriteEntryDto {
            id,
            kind,
            snapshot,
            saved_at,
        } = value;
        let snapshot = EntitySnapshot::from_value(kind, snapshot).map_err(|source| {
            FavoriteEntryDecodeError::Snapshot {
                kind,
                id: id.clone(),
                source,
            }
        })?;
        Ok(Self {
            id,
            snapshot,
            saved_at,
        })
    }
}

impl TryFrom<FavoriteEntryDto> for Listing {
    type Error = FavoriteEntryDecodeError;

    fn try_from(value: FavoriteEntryDto) -> Result<Self, Self::Error> {
        let entry = FavoriteEntry::try_from(value)?;
        Ok(Self {
            id: entry.id,
            snapshot: entry.snapshot,
        })
    }
}

/// The two favorites collections, keyed by id within each kind.
///
/// ## Invariants
/// - Within a kind no two entries share an id.
/// - Insertion order is preserved for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FavoritesSet {
    houses: Vec<FavoriteEntry>,
    jobs: Vec<FavoriteEntry>,
}

impl FavoritesSet {
    /// Build a set from persisted collections, dropping duplicate ids and
    /// entries filed under the wrong kind.
    pub fn from_collections(houses: Vec<FavoriteEntry>, jobs: Vec<FavoriteEntry>) -> Self {
        let mut set = Self::default();
        set.replace(FavoriteKind::House, houses);
        set.replace(FavoriteKind::Job, jobs);
        set
    }

    /// Entries of one kind in display order.
    pub fn entries(&self, kind: FavoriteKind) -> &[FavoriteEntry] {
        match kind {
            FavoriteKind::House => &self.houses,
            FavoriteKind::Job => &self.jobs,
        }
    }

    /// Whether `(id, kind)` is present.
    pub fn contains(&self, id: &EntityId, kind: FavoriteKind) -> bool {
        self.entries(kind).iter().any(|entry| entry.id() == id)
    }

    /// Insert an entry unless its `(id, kind)` is already present.
    ///
    /// Returns `true` when the entry was inserted.
    pub fn insert(&mut self, entry: FavoriteEntry) -> bool {
        if self.contains(entry.id(), entry.kind()) {
            return false;
        }
        self.entries_mut(entry.kind()).push(entry);
        true
    }

    /// Remove `(id, kind)` if present. Returns `true` when something was removed.
    pub fn remove(&mut self, id: &EntityId, kind: FavoriteKind) -> bool {
        let entries = self.entries_mut(kind);
        let before = entries.len();
        entries.retain(|entry| entry.id() != id);
        entries.len() != before
    }

    /// Replace one collection wholesale, keeping the first occurrence of each id.
    pub fn replace(&mut self, kind: FavoriteKind, entries: Vec<FavoriteEntry>) {
        self.entries_mut(kind).clear();
        for entry in entries.into_iter().filter(|entry| entry.kind() == kind) {
            self.insert(entry);
        }
    }

    /// Drop every entry of every kind.
    pub fn clear(&mut self) {
        self.houses.clear();
        self.jobs.clear();
    }

    /// Total number of favorites across kinds.
    pub fn len(&self) -> usize {
        self.houses.len() + self.jobs.len()
    }

    /// Whether no favorites exist.
    pub fn is_empty(&self) -> bool {
        self.houses.is_empty() && self.jobs.is_empty()
    }

    fn entries_mut(&mut self, kind: FavoriteKind) -> &mut Vec<FavoriteEntry> {
        match kind {
            FavoriteKind::House => &mut self.houses,
            FavoriteKind::Job => &mut self.jobs,
        }
    }
}
