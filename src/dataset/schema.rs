//! Declarative column schema: every known dataset column carries exactly one role.
//!
//! Only [`ColumnRole::PermittedFeature`] columns ever reach the model. Columns the
//! schema does not list are excluded as well, so a new post-release column added to
//! the dataset cannot leak in by accident.

use serde::Serialize;

/// Column holding the binary success label.
pub const LABEL_COLUMN: &str = "success";

/// Role a dataset column plays in training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnRole {
    /// Training target.
    Label,
    /// Knowable before release; fed to the model.
    PermittedFeature,
    /// Only knowable after release; never fed to the model.
    ExcludedLeakage,
    /// Descriptive text or raw fields already encoded elsewhere.
    Metadata,
}

/// A named column and its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub role: ColumnRole,
}

const fn col(name: &'static str, role: ColumnRole) -> ColumnSpec {
    ColumnSpec { name, role }
}

use ColumnRole::{ExcludedLeakage, Label, Metadata, PermittedFeature};

/// Known columns. Permitted features appear in the order the feature matrix uses.
pub const SCHEMA: &[ColumnSpec] = &[
    col(LABEL_COLUMN, Label),
    // basic
    col("budget", PermittedFeature),
    col("Budget_log", PermittedFeature),
    col("runtime", PermittedFeature),
    col("runtime_minutes", PermittedFeature),
    col("runtime_hours", PermittedFeature),
    // release timing
    col("release_year", PermittedFeature),
    col("release_month", PermittedFeature),
    col("release_weekday", PermittedFeature),
    col("release_quarter", PermittedFeature),
    col("is_holiday_season", PermittedFeature),
    // genres
    col("num_genres", PermittedFeature),
    col("genre_Action", PermittedFeature),
    col("genre_Adventure", PermittedFeature),
    col("genre_Comedy", PermittedFeature),
    col("genre_Drama", PermittedFeature),
    col("genre_Thriller", PermittedFeature),
    col("genre_Science Fiction", PermittedFeature),
    col("genre_Family", PermittedFeature),
    col("genre_Fantasy", PermittedFeature),
    col("genre_Crime", PermittedFeature),
    col("genre_Animation", PermittedFeature),
    col("genre_Horror", PermittedFeature),
    col("genre_Romance", PermittedFeature),
    col("genre_Mystery", PermittedFeature),
    col("genre_History", PermittedFeature),
    col("genre_Music", PermittedFeature),
    // countries
    col("is_united_states_of_america", PermittedFeature),
    col("is_united_kingdom", PermittedFeature),
    col("is_canada", PermittedFeature),
    col("is_vietnam", PermittedFeature),
    col("is_china", PermittedFeature),
    col("is_france", PermittedFeature),
    col("is_south_korea", PermittedFeature),
    col("is_australia", PermittedFeature),
    col("is_japan", PermittedFeature),
    col("is_india", PermittedFeature),
    col("is_usa", PermittedFeature),
    // cast
    col("num_main_cast", PermittedFeature),
    col("cast_genre_interaction", PermittedFeature),
    // post-release outcomes
    col("revenue", ExcludedLeakage),
    col("Revenue_log", ExcludedLeakage),
    col("vote_average", ExcludedLeakage),
    col("Vote Average", ExcludedLeakage),
    col("vote_count", ExcludedLeakage),
    col("roi", ExcludedLeakage),
    col("roi_clipped", ExcludedLeakage),
    col("roi_vs_vote", ExcludedLeakage),
    col("budget_per_year", ExcludedLeakage),
    // descriptive
    col("Id", Metadata),
    col("Title", Metadata),
    col("Original Title", Metadata),
    col("Original Language", Metadata),
    col("Overview", Metadata),
    col("Release Date", Metadata),
    col("Genres", Metadata),
    col("Production Companies", Metadata),
    col("Production Countries", Metadata),
    col("Spoken Languages", Metadata),
    col("Director", Metadata),
    col("Stars", Metadata),
    col("genres_list", Metadata),
    col("country_simple", Metadata),
    col("country_grouped", Metadata),
    col("main_genre", Metadata),
    col("runtime_group", Metadata),
];

/// Role of a column, or `None` when the schema does not list it.
pub fn role_of(name: &str) -> Option<ColumnRole> {
    SCHEMA.iter().find(|spec| spec.name == name).map(|spec| spec.role)
}

/// Permitted feature names in matrix order.
pub fn permitted_features() -> impl Iterator<Item = &'static str> {
    SCHEMA
        .iter()
        .filter(|spec| spec.role == PermittedFeature)
        .map(|spec| spec.name)
}

/// How a dataset header lines up with the schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaReport {
    pub label_present: bool,
    /// Permitted features present in the header, in schema order.
    pub permitted: Vec<String>,
    /// Permitted features the header lacks.
    pub missing_permitted: Vec<String>,
    /// Leakage columns seen in the header.
    pub leakage: Vec<String>,
    pub metadata: Vec<String>,
    /// Header columns the schema does not know; excluded.
    pub unlisted: Vec<String>,
}

/// Classify a dataset header against [`SCHEMA`].
pub fn classify_header(headers: &[String]) -> SchemaReport {
    let mut report = SchemaReport::default();
    for name in permitted_features() {
        if headers.iter().any(|h| h == name) {
            report.permitted.push(name.to_string());
        } else {
            report.missing_permitted.push(name.to_string());
        }
    }
    for header in headers {
        match role_of(header) {
            Some(Label) => report.label_present = true,
            Some(PermittedFeature) => {}
            Some(ExcludedLeakage) => report.leakage.push(header.clone()),
            Some(Metadata) => report.metadata.push(header.clone()),
            None => report.unlisted.push(header.clone()),
        }
    }
    report
}
