//! Field-level merge policy for reconciling sheet rows into stored records.
//!
//! The spreadsheet is authoritative for editorial columns, even when that
//! erases a stored value. Enrichment columns are only filled while empty:
//! once the metadata service has populated them, a blank sheet cell must not
//! clear them.

use std::collections::HashMap;

use crate::models::{AnimeEntry, Field};

/// How a stored column reacts to an incoming value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeRule {
    /// Replace the stored value, including with an absent one.
    OverwriteAlways,
    /// Replace only when the stored value is absent.
    OverwriteIfAbsent,
}

/// Per-column merge rules. Columns without an explicit rule overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePolicy {
    rules: HashMap<Field, MergeRule>,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self::with_sticky(&[Field::CoverImageUrl, Field::MalRating])
    }
}

impl MergePolicy {
    /// Policy where every column overwrites.
    pub fn overwrite_all() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Policy where the given columns are sticky and every other overwrites.
    pub fn with_sticky(fields: &[Field]) -> Self {
        let rules = fields
            .iter()
            .map(|f| (*f, MergeRule::OverwriteIfAbsent))
            .collect();
        Self { rules }
    }

    /// Build from the `SYNC_STICKY_FIELDS` environment variable.
    ///
    /// The variable is a comma-separated list of header names. Unset keeps the
    /// default (`cover_image_url,mal_rating`); unknown names are ignored.
    pub fn from_env() -> Self {
        match std::env::var("SYNC_STICKY_FIELDS") {
            Ok(list) => Self::parse(&list),
            Err(_) => Self::default(),
        }
    }

    /// Parse a comma-separated list of sticky header names.
    pub fn parse(list: &str) -> Self {
        let fields: Vec<Field> = list
            .split(',')
            .filter_map(|name| {
                let field = Field::from_header(name);
                if field.is_none() && !name.trim().is_empty() {
                    tracing::warn!(field = name.trim(), "Ignoring unknown sticky field");
                }
                field
            })
            .filter(|f| *f != Field::SystemId)
            .collect();
        Self::with_sticky(&fields)
    }

    /// Set the rule for one column.
    pub fn set(mut self, field: Field, rule: MergeRule) -> Self {
        self.rules.insert(field, rule);
        self
    }

    /// Rule applied to a column.
    pub fn rule(&self, field: Field) -> MergeRule {
        self.rules
            .get(&field)
            .copied()
            .unwrap_or(MergeRule::OverwriteAlways)
    }

    /// Merge `incoming` into `existing` column by column.
    ///
    /// `system_id` is the join key and is never touched.
    pub fn merge(&self, existing: &mut AnimeEntry, incoming: &AnimeEntry) {
        for &field in Field::ALL {
            if field == Field::SystemId {
                continue;
            }
            match self.rule(field) {
                MergeRule::OverwriteAlways => existing.set(field, incoming.get(field)),
                MergeRule::OverwriteIfAbsent => {
                    if existing.get(field).is_none() {
                        existing.set(field, incoming.get(field));
                    }
                }
            }
        }
    }
}
