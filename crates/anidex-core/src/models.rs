//! Domain models for the anidex catalog.

use serde::{Deserialize, Serialize};

// =============================================================================
// FIELD VALUES
// =============================================================================

/// Scalar kind of a canonical column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Int,
    Float,
}

/// A single typed cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i32),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Render the value as it should appear in a spreadsheet cell.
    pub fn to_cell(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Int(n) => n.to_string(),
            FieldValue::Float(f) => f.to_string(),
        }
    }
}

/// Conversion between a record's column type and [`FieldValue`].
trait Scalar: Sized {
    fn from_field_value(value: FieldValue) -> Option<Self>;
    fn into_field_value(self) -> FieldValue;
}

impl Scalar for String {
    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Text(s) => Some(s),
            FieldValue::Int(_) | FieldValue::Float(_) => Some(value.to_cell()),
        }
    }

    fn into_field_value(self) -> FieldValue {
        FieldValue::Text(self)
    }
}

impl Scalar for i32 {
    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Int(n) => Some(n),
            _ => None,
        }
    }

    fn into_field_value(self) -> FieldValue {
        FieldValue::Int(self)
    }
}

impl Scalar for f64 {
    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Float(f) => Some(f),
            FieldValue::Int(n) => Some(f64::from(n)),
            FieldValue::Text(_) => None,
        }
    }

    fn into_field_value(self) -> FieldValue {
        FieldValue::Float(self)
    }
}

// =============================================================================
// CANONICAL ENTRY
// =============================================================================

/// Declares the canonical record, its column enum, and the typed accessors
/// between them. Column order here is the column order of `anime_library`.
macro_rules! canonical_fields {
    ($($variant:ident => $name:ident: $ty:ty, $kind:ident;)+) => {
        /// Canonical anime record, one row of `anime_library`.
        ///
        /// `system_id` joins the record to its spreadsheet row; it is assigned
        /// once and never regenerated.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
        pub struct AnimeEntry {
            pub system_id: String,
            $(pub $name: Option<$ty>,)+
        }

        /// A column of the canonical record.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum Field {
            SystemId,
            $($variant,)+
        }

        impl Field {
            /// Every column, key first.
            pub const ALL: &'static [Field] = &[Field::SystemId, $(Field::$variant,)+];

            /// Header name on the spreadsheet and column name in the store.
            pub fn header(self) -> &'static str {
                match self {
                    Field::SystemId => "system_id",
                    $(Field::$variant => stringify!($name),)+
                }
            }

            /// Scalar kind stored in this column.
            pub fn kind(self) -> FieldKind {
                match self {
                    Field::SystemId => FieldKind::Text,
                    $(Field::$variant => FieldKind::$kind,)+
                }
            }
        }

        impl AnimeEntry {
            /// Read a column as a typed value.
            pub fn get(&self, field: Field) -> Option<FieldValue> {
                match field {
                    Field::SystemId => Some(FieldValue::Text(self.system_id.clone())),
                    $(Field::$variant => self.$name.clone().map(Scalar::into_field_value),)+
                }
            }

            /// Write a column. A value of the wrong kind clears the column;
            /// `system_id` ignores absent or non-text values.
            pub fn set(&mut self, field: Field, value: Option<FieldValue>) {
                match field {
                    Field::SystemId => {
                        if let Some(FieldValue::Text(id)) = value {
                            self.system_id = id;
                        }
                    }
                    $(Field::$variant => {
                        self.$name = value.and_then(<$ty as Scalar>::from_field_value);
                    })+
                }
            }
        }
    };
}

canonical_fields! {
    MalId => mal_id: i32, Int;
    SeriesEn => series_en: String, Text;
    SeriesRoman => series_roman: String, Text;
    SeriesCn => series_cn: String, Text;
    SeriesSeasonEn => series_season_en: String, Text;
    SeriesSeasonRoman => series_season_roman: String, Text;
    SeriesSeasonCn => series_season_cn: String, Text;
    SeriesSeason => series_season: String, Text;
    AltName => alt_name: String, Text;
    AiringType => airing_type: String, Text;
    MyProgress => my_progress: String, Text;
    AiringStatus => airing_status: String, Text;
    EpTotal => ep_total: i32, Int;
    EpFin => ep_fin: i32, Int;
    RatingMine => rating_mine: String, Text;
    MainSpinoff => main_spinoff: String, Text;
    ReleaseDate => release_date: String, Text;
    Studio => studio: String, Text;
    Director => director: String, Text;
    Producer => producer: String, Text;
    DistributorTw => distributor_tw: String, Text;
    GenreMain => genre_main: String, Text;
    GenreSub => genre_sub: String, Text;
    Remark => remark: String, Text;
    MalLink => mal_link: String, Text;
    AnilistLink => anilist_link: String, Text;
    Op => op: String, Text;
    Ed => ed: String, Text;
    InsertOst => insert_ost: String, Text;
    Seiyuu => seiyuu: String, Text;
    SourceBaha => source_baha: String, Text;
    SourceNetflix => source_netflix: String, Text;
    MalRating => mal_rating: f64, Float;
    CoverImageUrl => cover_image_url: String, Text;
}

impl Field {
    /// Look up a column by its header name.
    pub fn from_header(header: &str) -> Option<Field> {
        let header = header.trim();
        Self::ALL.iter().copied().find(|f| f.header() == header)
    }
}

/// Whether an airing status denotes a title that has not aired yet.
///
/// Accepts spelling variants such as "Not Yet Aired", "not_yet_aired", and
/// "not-yet-aired".
pub fn is_not_yet_aired(status: Option<&str>) -> bool {
    status.is_some_and(|s| {
        let folded: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        folded == "notyetaired"
    })
}

/// Whether an entry still needs data from the metadata service.
///
/// Requires an external id, and then either a missing cover or a missing
/// rating on a title that has already aired.
pub fn needs_enrichment(entry: &AnimeEntry) -> bool {
    entry.mal_id.is_some()
        && (entry.cover_image_url.is_none()
            || (entry.mal_rating.is_none() && !is_not_yet_aired(entry.airing_status.as_deref())))
}

// =============================================================================
// FRANCHISE HUB
// =============================================================================

/// One row of the franchise hub tab.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FranchiseRecord {
    pub system_id: Option<String>,
    pub series_en: String,
    pub series_roman: Option<String>,
    pub series_cn: Option<String>,
    pub rating_series: Option<String>,
    pub alt_name: Option<String>,
}

// =============================================================================
// SYNC ARTIFACTS
// =============================================================================

/// A correction to write back to the spreadsheet. Row and column are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPatch {
    pub row: usize,
    pub col: usize,
    pub value: String,
}

impl PendingPatch {
    pub fn new(row: usize, col: usize, value: impl Into<String>) -> Self {
        Self {
            row,
            col,
            value: value.into(),
        }
    }
}

/// Data returned by the metadata service for one external id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    pub cover_image_url: Option<String>,
    pub mal_rating: Option<f64>,
}

impl EnrichmentResult {
    /// Copy present fields onto `entry`, leaving the rest untouched.
    ///
    /// Returns true when at least one field was written.
    pub fn apply_to(&self, entry: &mut AnimeEntry) -> bool {
        let mut changed = false;
        if let Some(url) = &self.cover_image_url {
            entry.cover_image_url = Some(url.clone());
            changed = true;
        }
        if let Some(rating) = self.mal_rating {
            entry.mal_rating = Some(rating);
            changed = true;
        }
        changed
    }

    pub fn is_empty(&self) -> bool {
        self.cover_image_url.is_none() && self.mal_rating.is_none()
    }
}

/// What reconciliation did with one normalized row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Created,
    Updated,
}

/// Totals reported by one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub enriched: usize,
    pub patches_written: usize,
    pub hub_rows_added: usize,
}
