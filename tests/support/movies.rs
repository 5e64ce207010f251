use std::fmt::Write as _;
use std::path::Path;

/// Header mixing permitted features, leakage columns and free-text metadata.
pub const HEADER: &str = "Id,Title,Overview,budget,Budget_log,runtime,release_month,\
release_quarter,is_holiday_season,num_genres,genre_Action,genre_Drama,is_usa,\
num_main_cast,revenue,vote_average,roi,success";

/// Permitted columns of [`HEADER`] in schema order.
pub const EXPECTED_FEATURES: [&str; 11] = [
    "budget",
    "Budget_log",
    "runtime",
    "release_month",
    "release_quarter",
    "is_holiday_season",
    "num_genres",
    "genre_Action",
    "genre_Drama",
    "is_usa",
    "num_main_cast",
];

/// Write `rows` synthetic movies where big holiday releases tend to succeed.
pub fn write_movies_csv(path: &Path, rows: usize) {
    let mut text = format!("{HEADER}\n");
    for i in 0..rows {
        let month = 1 + i % 12;
        let holiday = matches!(month, 6 | 7 | 11 | 12);
        let budget = 1_000_000 * (5 + (i * 37) % 150);
        let success = budget > 60_000_000 || (holiday && budget > 30_000_000);
        let action = u8::from(i % 2 == 0);
        let revenue = if success { budget * 3 } else { budget / 2 };
        writeln!(
            text,
            "{i},\"Movie {i}\",\"A story, told \"\"twice\"\"\",{budget},{:.4},{},{month},{},{},{},{action},{},1,{},{revenue},{:.1},{:.2},{}",
            ((budget + 1) as f64).log10(),
            85 + i % 60,
            (month - 1) / 3 + 1,
            u8::from(holiday),
            1 + i % 3,
            1 - action,
            2 + i % 4,
            if success { 7.5 } else { 5.0 },
            revenue as f64 / budget as f64,
            u8::from(success),
        )
        .expect("format row");
    }
    std::fs::write(path, text).expect("write movies csv");
}
