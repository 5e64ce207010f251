//! Prediction request as received from JSON clients.

use serde::{Deserialize, Serialize};

use super::RequestError;

/// A number sent either as a JSON number or as a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberLike {
    Number(f64),
    Text(String),
}

impl NumberLike {
    /// Coerce to a finite `f64`; `field` names the request field in the error.
    ///
    /// `"NaN"` and `"inf"` parse as floats but are rejected like any other text.
    pub fn to_f64(&self, field: &'static str) -> Result<f64, RequestError> {
        let value = match self {
            NumberLike::Number(value) => Some(*value),
            NumberLike::Text(text) => text.trim().parse::<f64>().ok(),
        };
        match value {
            Some(value) if value.is_finite() => Ok(value),
            _ => Err(RequestError::NotNumeric {
                field,
                value: self.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for NumberLike {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumberLike::Number(value) => write!(f, "{value}"),
            NumberLike::Text(text) => f.write_str(text),
        }
    }
}

impl From<f64> for NumberLike {
    fn from(value: f64) -> Self {
        NumberLike::Number(value)
    }
}

/// A list sent either as a JSON array or as a comma-separated string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringList {
    List(Vec<String>),
    Joined(String),
}

impl StringList {
    /// Trimmed, non-empty tokens in input order.
    pub fn tokens(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            StringList::List(items) => items.iter().map(String::as_str).collect(),
            StringList::Joined(text) => text.split(',').collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl<S: Into<String>> FromIterator<S> for StringList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        StringList::List(iter.into_iter().map(Into::into).collect())
    }
}

/// Movie attributes known before release. Every field is optional at this layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<NumberLike>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<NumberLike>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_month: Option<NumberLike>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<NumberLike>,
    /// `0` is Monday.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_weekday: Option<NumberLike>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<StringList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub countries: Option<StringList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_cast: Option<NumberLike>,
}

impl PredictionRequest {
    /// Parse a request from JSON text.
    pub fn from_json(text: &str) -> Result<Self, RequestError> {
        serde_json::from_str(text).map_err(RequestError::Json)
    }

    /// Reject requests lacking the fields a client must always send.
    pub fn validate_required(&self) -> Result<(), RequestError> {
        let title_ok = self
            .title
            .as_deref()
            .is_some_and(|title| !title.trim().is_empty());
        if !title_ok {
            return Err(RequestError::MissingField("title"));
        }
        let budget_ok = match &self.budget {
            Some(NumberLike::Text(text)) => !text.trim().is_empty(),
            Some(NumberLike::Number(_)) => true,
            None => false,
        };
        if !budget_ok {
            return Err(RequestError::MissingField("budget"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_numbers_as_strings_and_lists_as_text() {
        let request = PredictionRequest::from_json(
            r#"{"title":"Heat","budget":"60000000","releaseMonth":12,"genres":"Action, Crime ,","countries":["USA"]}"#,
        )
        .unwrap();
        assert_eq!(request.budget.as_ref().unwrap().to_f64("budget").unwrap(), 6.0e7);
        assert_eq!(
            request.release_month.as_ref().unwrap().to_f64("releaseMonth").unwrap(),
            12.0
        );
        assert_eq!(request.genres.unwrap().tokens(), vec!["Action", "Crime"]);
        assert_eq!(request.countries.unwrap().tokens(), vec!["USA"]);
    }

    #[test]
    fn non_numeric_text_names_the_field() {
        let value = NumberLike::Text("lots".to_string());
        let err = value.to_f64("budget").unwrap_err();
        assert_eq!(err.to_string(), "Field 'budget' is not numeric: \"lots\"");
    }

    #[test]
    fn nan_and_infinite_values_are_not_numeric() {
        for text in ["NaN", "inf", "-Infinity"] {
            let err = NumberLike::Text(text.to_string()).to_f64("budget").unwrap_err();
            assert!(matches!(err, RequestError::NotNumeric { field: "budget", .. }), "{text}");
        }
        let err = NumberLike::Number(f64::NAN).to_f64("runtime").unwrap_err();
        assert_eq!(err.to_string(), "Field 'runtime' is not numeric: \"NaN\"");
        assert_eq!(NumberLike::Text(" 1e3 ".to_string()).to_f64("budget").unwrap(), 1000.0);
    }

    #[test]
    fn required_fields_are_title_then_budget() {
        let mut request = PredictionRequest::default();
        assert_eq!(
            request.validate_required().unwrap_err().to_string(),
            "Missing required field: title"
        );
        request.title = Some("Alien".to_string());
        assert_eq!(
            request.validate_required().unwrap_err().to_string(),
            "Missing required field: budget"
        );
        request.budget = Some(NumberLike::Number(0.0));
        assert!(request.validate_required().is_ok());
    }
}
