use super::request::{NumberLike, PredictionRequest, StringList};

/// Example requests covering the usual release profiles.
pub fn sample_requests() -> Vec<PredictionRequest> {
    vec![
        sample(
            "Blockbuster Action",
            200_000_000.0,
            150.0,
            6.0,
            &["Action", "Adventure", "Science Fiction"],
        ),
        sample("Indie Drama", 5_000_000.0, 105.0, 10.0, &["Drama"]),
        sample("Summer Comedy", 40_000_000.0, 98.0, 7.0, &["Comedy"]),
        sample(
            "Holiday Horror",
            15_000_000.0,
            95.0,
            10.0,
            &["Horror", "Thriller"],
        ),
    ]
}

fn sample(title: &str, budget: f64, runtime: f64, month: f64, genres: &[&str]) -> PredictionRequest {
    PredictionRequest {
        title: Some(title.to_string()),
        budget: Some(NumberLike::Number(budget)),
        runtime: Some(NumberLike::Number(runtime)),
        release_month: Some(NumberLike::Number(month)),
        genres: Some(genres.iter().copied().collect::<StringList>()),
        ..PredictionRequest::default()
    }
}
