use std::path::Path;

use crate::ml::FeatureImportance;

/// File name of the ranked importance table in the output directory.
pub const IMPORTANCE_FILE_NAME: &str = "feature_importance.csv";

/// Render the ranked list as `feature,importance` CSV.
pub fn importance_csv(ranked: &[FeatureImportance]) -> String {
    let mut out = String::from("feature,importance\n");
    for entry in ranked {
        out.push_str(&csv_field(&entry.feature));
        out.push(',');
        out.push_str(&entry.importance.to_string());
        out.push('\n');
    }
    out
}

/// Write the importance table to `path`.
pub fn write_importance_csv(path: &Path, ranked: &[FeatureImportance]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, importance_csv(ranked))
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
