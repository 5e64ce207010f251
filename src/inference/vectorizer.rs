//! Builds the model's input vector from a request, in the persisted feature order.

use std::collections::HashMap;

use time::OffsetDateTime;

use super::RequestError;
use super::request::{NumberLike, PredictionRequest};

pub const DEFAULT_RUNTIME: f64 = 120.0;
/// Friday, with Monday as `0`.
pub const DEFAULT_WEEKDAY: f64 = 4.0;
pub const DEFAULT_NUM_CAST: f64 = 3.0;

const HOLIDAY_MONTHS: [i64; 4] = [6, 7, 11, 12];

/// Genres with a `genre_<Name>` column.
pub const KNOWN_GENRES: [&str; 15] = [
    "Action",
    "Adventure",
    "Comedy",
    "Drama",
    "Thriller",
    "Science Fiction",
    "Family",
    "Fantasy",
    "Crime",
    "Animation",
    "Horror",
    "Romance",
    "Mystery",
    "History",
    "Music",
];

/// Country spellings and the flag columns they set.
const COUNTRY_FLAGS: &[(&str, &[&str])] = &[
    (
        "United States of America",
        &["is_united_states_of_america", "is_usa"],
    ),
    ("USA", &["is_united_states_of_america", "is_usa"]),
    ("United Kingdom", &["is_united_kingdom"]),
    ("UK", &["is_united_kingdom"]),
    ("South Korea", &["is_south_korea"]),
    ("Korea", &["is_south_korea"]),
    ("Vietnam", &["is_vietnam"]),
    ("China", &["is_china"]),
    ("France", &["is_france"]),
    ("Australia", &["is_australia"]),
    ("Japan", &["is_japan"]),
    ("India", &["is_india"]),
    ("Canada", &["is_canada"]),
];

const DEFAULT_COUNTRY_FLAGS: [&str; 2] = ["is_united_states_of_america", "is_usa"];

/// Date used when a request leaves the release month or year out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceDate {
    pub year: i32,
    pub month: u8,
}

impl ReferenceDate {
    /// Current local date, falling back to UTC when the offset is unknown.
    pub fn today() -> Self {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        Self {
            year: now.year(),
            month: u8::from(now.month()),
        }
    }
}

/// Maps requests onto a fixed, ordered feature contract.
#[derive(Debug, Clone)]
pub struct FeatureVectorizer {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl FeatureVectorizer {
    pub fn new(names: Vec<String>) -> Self {
        let index = names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();
        Self { names, index }
    }

    pub fn feature_names(&self) -> &[String] {
        &self.names
    }

    /// Unscaled vector with one slot per feature name.
    ///
    /// Names this vectorizer cannot derive stay `0.0`. Fails only when a supplied
    /// numeric field is not a number.
    pub fn vectorize(
        &self,
        request: &PredictionRequest,
        today: ReferenceDate,
    ) -> Result<Vec<f32>, RequestError> {
        let mut features = Features {
            values: vec![0.0; self.names.len()],
            index: &self.index,
        };

        let budget = number_or(&request.budget, "budget", 0.0)?;
        features.set("budget", budget);
        let budget_log = if budget > 0.0 {
            (budget + 1.0).log10()
        } else {
            0.0
        };
        features.set("Budget_log", budget_log);

        let runtime = number_or(&request.runtime, "runtime", DEFAULT_RUNTIME)?;
        features.set("runtime", runtime);
        features.set("runtime_minutes", runtime);
        features.set("runtime_hours", runtime / 60.0);

        // Calendar fields are whole numbers; fractional input truncates.
        let month =
            number_or(&request.release_month, "releaseMonth", f64::from(today.month))?.trunc();
        let year = number_or(&request.release_year, "releaseYear", f64::from(today.year))?.trunc();
        let weekday =
            number_or(&request.release_weekday, "releaseWeekday", DEFAULT_WEEKDAY)?.trunc();
        features.set("release_year", year);
        features.set("release_month", month);
        features.set("release_weekday", weekday);
        features.set("release_quarter", ((month - 1.0) / 3.0).floor() + 1.0);
        let holiday = HOLIDAY_MONTHS.contains(&(month as i64));
        features.set("is_holiday_season", if holiday { 1.0 } else { 0.0 });

        let genres = request
            .genres
            .as_ref()
            .map(|list| list.tokens())
            .unwrap_or_default();
        features.set("num_genres", genres.len() as f64);
        for genre in &genres {
            if KNOWN_GENRES.contains(&genre.as_str()) {
                features.set(&format!("genre_{genre}"), 1.0);
            }
        }

        let countries = request
            .countries
            .as_ref()
            .map(|list| list.tokens())
            .unwrap_or_default();
        if countries.is_empty() {
            for flag in DEFAULT_COUNTRY_FLAGS {
                features.set(flag, 1.0);
            }
        }
        for country in &countries {
            if let Some((_, flags)) = COUNTRY_FLAGS.iter().find(|(name, _)| *name == country.as_str()) {
                for flag in *flags {
                    features.set(flag, 1.0);
                }
            }
        }

        let num_cast = number_or(&request.num_cast, "numCast", DEFAULT_NUM_CAST)?.trunc();
        features.set("num_main_cast", num_cast);
        features.set("cast_genre_interaction", num_cast * genres.len() as f64);

        Ok(features.values)
    }
}

struct Features<'a> {
    values: Vec<f32>,
    index: &'a HashMap<String, usize>,
}

impl Features<'_> {
    fn set(&mut self, name: &str, value: f64) {
        if let Some(&idx) = self.index.get(name) {
            self.values[idx] = value as f32;
        }
    }
}

fn number_or(
    value: &Option<NumberLike>,
    field: &'static str,
    default: f64,
) -> Result<f64, RequestError> {
    match value {
        Some(NumberLike::Text(text)) if text.trim().is_empty() => Ok(default),
        Some(number) => number.to_f64(field),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::permitted_features;
    use crate::inference::request::StringList;

    const JUNE_2024: ReferenceDate = ReferenceDate {
        year: 2024,
        month: 6,
    };

    fn full_contract() -> FeatureVectorizer {
        FeatureVectorizer::new(permitted_features().map(str::to_string).collect())
    }

    fn value(vectorizer: &FeatureVectorizer, vector: &[f32], name: &str) -> f32 {
        let idx = vectorizer
            .feature_names()
            .iter()
            .position(|n| n == name)
            .unwrap();
        vector[idx]
    }

    #[test]
    fn zero_budget_has_zero_log() {
        let v = full_contract();
        let request = PredictionRequest {
            budget: Some(NumberLike::Number(0.0)),
            ..PredictionRequest::default()
        };
        let vector = v.vectorize(&request, JUNE_2024).unwrap();
        assert_eq!(vector.len(), 39);
        assert_eq!(value(&v, &vector, "Budget_log"), 0.0);
        assert_eq!(value(&v, &vector, "runtime"), 120.0);
        assert_eq!(value(&v, &vector, "runtime_hours"), 2.0);
        assert_eq!(value(&v, &vector, "release_weekday"), 4.0);
        assert_eq!(value(&v, &vector, "num_main_cast"), 3.0);
        assert_eq!(value(&v, &vector, "release_year"), 2024.0);
    }

    #[test]
    fn budget_log_is_base_ten() {
        let v = full_contract();
        let request = PredictionRequest {
            budget: Some(NumberLike::Text("999".to_string())),
            ..PredictionRequest::default()
        };
        let vector = v.vectorize(&request, JUNE_2024).unwrap();
        assert!((value(&v, &vector, "Budget_log") - 3.0).abs() < 1e-6);
    }

    #[test]
    fn release_month_drives_quarter_and_holiday() {
        let v = full_contract();
        let july = PredictionRequest {
            release_month: Some(NumberLike::Number(7.0)),
            ..PredictionRequest::default()
        };
        let vector = v.vectorize(&july, JUNE_2024).unwrap();
        assert_eq!(value(&v, &vector, "release_quarter"), 3.0);
        assert_eq!(value(&v, &vector, "is_holiday_season"), 1.0);

        let february = PredictionRequest {
            release_month: Some(NumberLike::Number(2.0)),
            ..PredictionRequest::default()
        };
        let vector = v.vectorize(&february, JUNE_2024).unwrap();
        assert_eq!(value(&v, &vector, "release_quarter"), 1.0);
        assert_eq!(value(&v, &vector, "is_holiday_season"), 0.0);
    }

    #[test]
    fn genre_string_and_list_match() {
        let v = full_contract();
        let joined = PredictionRequest {
            genres: Some(StringList::Joined("Action, Drama".to_string())),
            num_cast: Some(NumberLike::Number(2.0)),
            ..PredictionRequest::default()
        };
        let listed = PredictionRequest {
            genres: Some(["Action", "Drama"].into_iter().collect()),
            num_cast: Some(NumberLike::Number(2.0)),
            ..PredictionRequest::default()
        };
        let a = v.vectorize(&joined, JUNE_2024).unwrap();
        let b = v.vectorize(&listed, JUNE_2024).unwrap();
        assert_eq!(a, b);
        assert_eq!(value(&v, &a, "num_genres"), 2.0);
        assert_eq!(value(&v, &a, "genre_Action"), 1.0);
        assert_eq!(value(&v, &a, "genre_Drama"), 1.0);
        assert_eq!(value(&v, &a, "genre_Comedy"), 0.0);
        assert_eq!(value(&v, &a, "cast_genre_interaction"), 4.0);
    }

    #[test]
    fn unknown_genres_count_but_set_no_flag() {
        let v = full_contract();
        let request = PredictionRequest {
            genres: Some(StringList::Joined("Sci-Fi,Western".to_string())),
            ..PredictionRequest::default()
        };
        let vector = v.vectorize(&request, JUNE_2024).unwrap();
        assert_eq!(value(&v, &vector, "num_genres"), 2.0);
        assert!(KNOWN_GENRES
            .iter()
            .all(|g| value(&v, &vector, &format!("genre_{g}")) == 0.0));
    }

    #[test]
    fn missing_countries_default_to_usa() {
        let v = full_contract();
        let vector = v
            .vectorize(&PredictionRequest::default(), JUNE_2024)
            .unwrap();
        assert_eq!(value(&v, &vector, "is_usa"), 1.0);
        assert_eq!(value(&v, &vector, "is_united_states_of_america"), 1.0);
        let others: Vec<&str> = permitted_features()
            .filter(|name| name.starts_with("is_") && *name != "is_holiday_season")
            .filter(|name| !DEFAULT_COUNTRY_FLAGS.contains(name))
            .collect();
        assert_eq!(others.len(), 9);
        for flag in others {
            assert_eq!(value(&v, &vector, flag), 0.0, "{flag}");
        }
    }

    #[test]
    fn country_aliases_set_the_same_flags() {
        let v = full_contract();
        let request = PredictionRequest {
            countries: Some(StringList::Joined("UK, Korea".to_string())),
            ..PredictionRequest::default()
        };
        let vector = v.vectorize(&request, JUNE_2024).unwrap();
        assert_eq!(value(&v, &vector, "is_united_kingdom"), 1.0);
        assert_eq!(value(&v, &vector, "is_south_korea"), 1.0);
        assert_eq!(value(&v, &vector, "is_usa"), 0.0);
    }

    #[test]
    fn follows_the_given_order_and_ignores_unknown_names() {
        let v = FeatureVectorizer::new(vec![
            "runtime".to_string(),
            "mystery_feature".to_string(),
            "budget".to_string(),
        ]);
        let request = PredictionRequest {
            budget: Some(NumberLike::Number(5.0)),
            runtime: Some(NumberLike::Number(90.0)),
            ..PredictionRequest::default()
        };
        let vector = v.vectorize(&request, JUNE_2024).unwrap();
        assert_eq!(vector, vec![90.0, 0.0, 5.0]);
    }

    #[test]
    fn non_numeric_field_is_an_error() {
        let v = full_contract();
        let request = PredictionRequest {
            runtime: Some(NumberLike::Text("long".to_string())),
            ..PredictionRequest::default()
        };
        let err = v.vectorize(&request, JUNE_2024).unwrap_err();
        assert!(matches!(err, RequestError::NotNumeric { field: "runtime", .. }));
        let request = PredictionRequest {
            budget: Some(NumberLike::Text("NaN".to_string())),
            ..PredictionRequest::default()
        };
        let err = v.vectorize(&request, JUNE_2024).unwrap_err();
        assert!(matches!(err, RequestError::NotNumeric { field: "budget", .. }));
    }

    #[test]
    fn raw_budget_and_runtime_fill_their_training_columns() {
        let v = full_contract();
        let request = PredictionRequest {
            budget: Some(NumberLike::Text("50000".to_string())),
            runtime: Some(NumberLike::Number(95.0)),
            ..PredictionRequest::default()
        };
        let vector = v.vectorize(&request, JUNE_2024).unwrap();
        assert_eq!(value(&v, &vector, "budget"), 50_000.0);
        assert!((value(&v, &vector, "Budget_log") - 4.699).abs() < 1e-3);
        assert_eq!(value(&v, &vector, "runtime"), 95.0);
        assert_eq!(value(&v, &vector, "runtime_minutes"), 95.0);
    }
}
