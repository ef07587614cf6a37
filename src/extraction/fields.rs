use super::dom::{element_text_lines, MarkupSnapshot};
use super::patterns::{collapse_whitespace, parse_description};
use crate::core::selectors::DetailSelectors;
use crate::types::ListingRecord;

/// Tertiary-list offsets: `[connection, ·, posted, ·, applicants, ...]`.
const POSTED_AT_INDEX: usize = 2;
const APPLICANT_COUNT_INDEX: usize = 4;

const WORKPLACE_TYPES: [&str; 3] = ["On-site", "Remote", "Hybrid"];
const EMPLOYMENT_TYPES: [&str; 4] = ["Full-time", "Part-time", "Contract", "Internship"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PillKind {
    Workplace,
    Employment,
}

/// Workplace vocabulary is checked first; a pill matching both counts as workplace.
pub fn classify_pill(text: &str) -> Option<PillKind> {
    if WORKPLACE_TYPES.iter().any(|v| text.contains(v)) {
        Some(PillKind::Workplace)
    } else if EMPLOYMENT_TYPES.iter().any(|v| text.contains(v)) {
        Some(PillKind::Employment)
    } else {
        None
    }
}

/// Turns a detail-view snapshot into a [`ListingRecord`].
///
/// Pure: the same markup always yields the same record, and no selector or
/// pattern miss is ever an error.
#[derive(Debug, Clone, Default)]
pub struct FieldExtractor {
    selectors: DetailSelectors,
}

impl FieldExtractor {
    pub fn new(selectors: DetailSelectors) -> Self {
        Self { selectors }
    }

    pub fn extract(&self, html: &str) -> ListingRecord {
        self.extract_snapshot(&MarkupSnapshot::parse(html))
    }

    pub fn extract_snapshot(&self, snapshot: &MarkupSnapshot) -> ListingRecord {
        let sel = &self.selectors;

        let tertiary = snapshot.query_texts(&sel.tertiary_items);
        let posted_at = tertiary.get(POSTED_AT_INDEX).cloned();
        let applicant_count = tertiary.get(APPLICANT_COUNT_INDEX).cloned();

        let mut workplace_type = None;
        let mut employment_type = None;
        for pill in snapshot.query_texts(&sel.pills) {
            match classify_pill(&pill) {
                Some(PillKind::Workplace) => workplace_type = Some(pill),
                Some(PillKind::Employment) => employment_type = Some(pill),
                None => {}
            }
        }

        let full_description = snapshot
            .query(&sel.description)
            .first()
            .map(|el| collapse_whitespace(&element_text_lines(*el)));
        let derived = full_description
            .as_deref()
            .map(parse_description)
            .unwrap_or_default();

        ListingRecord {
            company: snapshot.query_text(&sel.company),
            title: snapshot.query_text(&sel.title),
            location: snapshot.query_text(&sel.location),
            posted_at,
            applicant_count,
            workplace_type,
            employment_type,
            full_description,
            experience: derived.experience,
            compensation: derived.compensation,
            notice_period: derived.notice_period,
            parsed_location: derived.parsed_location,
            role_overview: derived.role_overview,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail_page(tertiary: &[&str], description: Option<&str>) -> String {
        let spans: String = tertiary
            .iter()
            .map(|t| format!("<span>{}</span>", t))
            .collect();
        let about = description
            .map(|d| format!(r#"<div id="job-details"><p>{}</p></div>"#, d))
            .unwrap_or_default();
        format!(
            r#"<html><body>
            <div class="job-details-jobs-unified-top-card__company-name"><a href="/c">Acme Corp</a></div>
            <div class="job-details-jobs-unified-top-card__job-title"><h1>Backend Engineer</h1></div>
            <div class="job-details-jobs-unified-top-card__tertiary-description-container">{spans}</div>
            {about}
            </body></html>"#
        )
    }

    #[test]
    fn test_end_to_end_acme_scenario() {
        let html = detail_page(
            &["3rd", "·", "2 days ago", "·", "47 applicants"],
            Some("Experience: 3+ Years CTC: 12-15 LPA"),
        );
        let record = FieldExtractor::default().extract(&html);

        assert_eq!(record.company.as_deref(), Some("Acme Corp"));
        assert_eq!(record.title.as_deref(), Some("Backend Engineer"));
        assert_eq!(record.posted_at.as_deref(), Some("2 days ago"));
        assert_eq!(record.applicant_count.as_deref(), Some("47 applicants"));
        assert_eq!(record.experience.as_deref(), Some("Experience: 3+ Years"));
        assert_eq!(record.compensation.as_deref(), Some("CTC: 12-15 LPA"));
        assert!(record.notice_period.is_none());
        assert!(record.parsed_location.is_none());
    }

    #[test]
    fn test_tertiary_thresholds() {
        let extractor = FieldExtractor::default();

        let two = extractor.extract(&detail_page(&["3rd", "·"], None));
        assert!(two.posted_at.is_none());
        assert!(two.applicant_count.is_none());

        let three = extractor.extract(&detail_page(&["3rd", "·", "1 week ago"], None));
        assert_eq!(three.posted_at.as_deref(), Some("1 week ago"));
        assert!(three.applicant_count.is_none());

        let four = extractor.extract(&detail_page(&["a", "b", "c", "d"], None));
        assert_eq!(four.posted_at.as_deref(), Some("c"));
        assert!(four.applicant_count.is_none());

        let five = extractor.extract(&detail_page(&["a", "b", "c", "d", "e"], None));
        assert_eq!(five.applicant_count.as_deref(), Some("e"));
    }

    #[test]
    fn test_missing_description_leaves_derived_fields_absent() {
        let record = FieldExtractor::default().extract(&detail_page(&["x"], None));
        assert_eq!(record.company.as_deref(), Some("Acme Corp"));
        assert_eq!(record.title.as_deref(), Some("Backend Engineer"));
        assert!(record.full_description.is_none());
        assert!(record.experience.is_none());
        assert!(record.compensation.is_none());
        assert!(record.notice_period.is_none());
        assert!(record.parsed_location.is_none());
        assert!(record.role_overview.is_none());
    }

    #[test]
    fn test_empty_markup_yields_empty_record() {
        let record = FieldExtractor::default().extract("<html><body></body></html>");
        assert_eq!(record, ListingRecord::default());
    }

    #[test]
    fn test_description_whitespace_is_collapsed() {
        let html = r#"<div id="job-details">
            <h2>About   the job</h2>
            <ul><li>Location:
                Remote</li><li>Notice Period - 15 days</li></ul>
        </div>"#;
        let record = FieldExtractor::default().extract(html);
        assert_eq!(
            record.full_description.as_deref(),
            Some("About the job Location: Remote Notice Period - 15 days")
        );
        assert_eq!(
            record.notice_period.as_deref(),
            Some("Notice Period - 15 days")
        );
    }

    #[test]
    fn test_pills_last_match_wins() {
        let html = r#"
            <li class="job-details-preferences-and-skills__pill"><span aria-hidden="true">Remote</span></li>
            <li class="job-details-preferences-and-skills__pill"><span aria-hidden="true">Contract</span></li>
            <li class="job-details-preferences-and-skills__pill"><span aria-hidden="true">Hybrid</span></li>
            <li class="job-details-preferences-and-skills__pill"><span aria-hidden="true">Full-time</span></li>
            <li class="job-details-preferences-and-skills__pill"><span aria-hidden="true">Matches your skills</span></li>
            <li class="job-details-preferences-and-skills__pill"><span>On-site</span></li>"#;
        let record = FieldExtractor::default().extract(html);
        assert_eq!(record.workplace_type.as_deref(), Some("Hybrid"));
        assert_eq!(record.employment_type.as_deref(), Some("Full-time"));
    }

    #[test]
    fn test_classify_pill_vocabularies() {
        assert_eq!(classify_pill("Remote"), Some(PillKind::Workplace));
        assert_eq!(classify_pill("Internship"), Some(PillKind::Employment));
        assert_eq!(classify_pill("$120K/yr"), None);
        // Matching is case-sensitive on the rendered pill text.
        assert_eq!(classify_pill("remote"), None);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let html = detail_page(
            &["1st", "·", "3 hours ago", "·", "12 applicants"],
            Some("Role: Rust Developer Location: Berlin"),
        );
        let extractor = FieldExtractor::default();
        let first = extractor.extract(&html);
        let second = extractor.extract(&html);
        assert_eq!(first, second);
        assert_eq!(first.role_overview.as_deref(), Some("Role: Rust Developer"));
        assert_eq!(first.parsed_location.as_deref(), Some("Location: Berlin"));
    }
}
