use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
    pub pages: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScrapeResponse {
    pub message: String,
    /// One flat object per record; absent fields are serialised as `""`.
    pub results: Vec<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub finished_at: Option<String>,
    #[serde(default)]
    pub export_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// One extracted listing.
///
/// Every field is optional: a selector or pattern that matches nothing
/// leaves its field `None`. Records are only built by the field extractor
/// and are not modified afterwards.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ListingRecord {
    pub company: Option<String>,
    pub title: Option<String>,
    pub location: Option<String>,
    pub posted_at: Option<String>,
    pub applicant_count: Option<String>,
    /// Pill text classified as on-site / remote / hybrid.
    pub workplace_type: Option<String>,
    /// Pill text classified as full-time / part-time / contract / internship.
    pub employment_type: Option<String>,
    pub full_description: Option<String>,
    // Derived from `full_description`; each holds the whole matched span.
    pub experience: Option<String>,
    pub compensation: Option<String>,
    pub notice_period: Option<String>,
    pub parsed_location: Option<String>,
    pub role_overview: Option<String>,
}

impl ListingRecord {
    /// Column names in export order.
    pub const COLUMNS: [&'static str; 13] = [
        "company",
        "title",
        "location",
        "posted_at",
        "applicant_count",
        "workplace_type",
        "employment_type",
        "full_description",
        "experience",
        "compensation",
        "notice_period",
        "parsed_location",
        "role_overview",
    ];

    /// Field values in [`Self::COLUMNS`] order.
    pub fn values(&self) -> [Option<&str>; 13] {
        [
            self.company.as_deref(),
            self.title.as_deref(),
            self.location.as_deref(),
            self.posted_at.as_deref(),
            self.applicant_count.as_deref(),
            self.workplace_type.as_deref(),
            self.employment_type.as_deref(),
            self.full_description.as_deref(),
            self.experience.as_deref(),
            self.compensation.as_deref(),
            self.notice_period.as_deref(),
            self.parsed_location.as_deref(),
            self.role_overview.as_deref(),
        ]
    }

    /// Flat row with `None` replaced by the empty string.
    pub fn to_row(&self) -> Vec<String> {
        self.values()
            .iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect()
    }

    /// JSON object keyed by column name with `None` replaced by `""`.
    pub fn to_json_row(&self) -> serde_json::Map<String, serde_json::Value> {
        Self::COLUMNS
            .iter()
            .zip(self.values())
            .map(|(name, value)| {
                (
                    (*name).to_string(),
                    serde_json::Value::String(value.unwrap_or_default().to_string()),
                )
            })
            .collect()
    }

    /// Short human label used in logs.
    pub fn summary(&self) -> String {
        format!(
            "{} at {}",
            self.title.as_deref().unwrap_or("<untitled>"),
            self.company.as_deref().unwrap_or("<unknown company>")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_row_blanks_missing_fields() {
        let record = ListingRecord {
            company: Some("Acme Corp".into()),
            ..Default::default()
        };
        let row = record.to_json_row();
        assert_eq!(row.len(), ListingRecord::COLUMNS.len());
        assert_eq!(row["company"], "Acme Corp");
        assert_eq!(row["title"], "");
        assert_eq!(row["role_overview"], "");
    }

    #[test]
    fn test_json_row_keeps_column_order() {
        let row = ListingRecord::default().to_json_row();
        let keys: Vec<&str> = row.keys().map(String::as_str).collect();
        assert_eq!(keys, ListingRecord::COLUMNS);
    }

    #[test]
    fn test_summary_falls_back_for_missing_headline() {
        let record = ListingRecord::default();
        assert_eq!(record.summary(), "<untitled> at <unknown company>");
    }
}
