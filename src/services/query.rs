use crate::error::Result;
use crate::models::{ExecutionRecord, ExecutionStatus};
use std::cmp::Ordering;

/// Parsed form of the materialized-listing parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionFilter {
    /// 0 means unlimited.
    pub limit: usize,
    pub tag: Option<String>,
    pub status: Option<ExecutionStatus>,
    pub include_deleted: bool,
}

impl ExecutionFilter {
    /// Empty `tag` or `status` disable that predicate.
    pub fn parse(limit: usize, tag: &str, status: &str, include_deleted: bool) -> Result<Self> {
        let tag = (!tag.is_empty()).then(|| tag.to_string());
        let status = if status.is_empty() {
            None
        } else {
            Some(status.parse::<ExecutionStatus>()?)
        };

        Ok(Self {
            limit,
            tag,
            status,
            include_deleted,
        })
    }

    pub fn matches(&self, record: &ExecutionRecord) -> bool {
        if !self.include_deleted && record.deleted {
            return false;
        }
        if let Some(ref tag) = self.tag {
            if record.tag.as_deref() != Some(tag.as_str()) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        true
    }

    /// Filter, then order newest first (ties by id), then truncate.
    pub fn apply(&self, records: Vec<ExecutionRecord>) -> Vec<ExecutionRecord> {
        let mut matched: Vec<ExecutionRecord> =
            records.into_iter().filter(|r| self.matches(r)).collect();
        matched.sort_by(newest_first);
        if self.limit > 0 {
            matched.truncate(self.limit);
        }
        matched
    }
}

fn newest_first(a: &ExecutionRecord, b: &ExecutionRecord) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn record(
        id: &str,
        created_at: i64,
        tag: Option<&str>,
        status: ExecutionStatus,
    ) -> ExecutionRecord {
        let tag = tag.map(str::to_string);
        let mut record = ExecutionRecord::scheduled(id.to_string(), "nightly-db", tag, created_at);
        record.status = status;
        record
    }

    fn ids(records: &[ExecutionRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn empty_values_disable_predicates() {
        let filter = ExecutionFilter::parse(0, "", "", false).unwrap();
        assert_eq!(filter, ExecutionFilter::default());
    }

    #[test]
    fn invalid_status_is_invalid_argument() {
        let err = ExecutionFilter::parse(0, "", "Finished", false).unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[test]
    fn filters_by_tag_and_status() {
        let records = vec![
            record("a", 1, Some("weekly"), ExecutionStatus::Success),
            record("b", 2, Some("weekly"), ExecutionStatus::Error),
            record("c", 3, Some("daily"), ExecutionStatus::Success),
            record("d", 4, None, ExecutionStatus::Success),
        ];

        let filter = ExecutionFilter::parse(0, "weekly", "Success", false).unwrap();
        assert_eq!(ids(&filter.apply(records.clone())), vec!["a"]);

        let filter = ExecutionFilter::parse(0, "", "Success", false).unwrap();
        assert_eq!(ids(&filter.apply(records)), vec!["d", "c", "a"]);
    }

    #[test]
    fn orders_newest_first_with_id_tie_break() {
        let records = vec![
            record("b", 5, None, ExecutionStatus::Scheduled),
            record("c", 9, None, ExecutionStatus::Scheduled),
            record("a", 5, None, ExecutionStatus::Scheduled),
            record("d", 1, None, ExecutionStatus::Scheduled),
        ];

        let all = ExecutionFilter::default().apply(records.clone());
        assert_eq!(ids(&all), vec!["c", "a", "b", "d"]);

        let limited = ExecutionFilter::parse(2, "", "", false).unwrap().apply(records);
        assert_eq!(ids(&limited), vec!["c", "a"]);
    }

    #[test]
    fn limit_applies_after_filtering() {
        let records = vec![
            record("a", 3, None, ExecutionStatus::Error),
            record("b", 2, None, ExecutionStatus::Success),
            record("c", 1, None, ExecutionStatus::Success),
        ];
        let filter = ExecutionFilter::parse(1, "", "Success", false).unwrap();
        assert_eq!(ids(&filter.apply(records)), vec!["b"]);
    }

    #[test]
    fn deleted_records_hidden_unless_requested() {
        let mut gone = record("a", 2, None, ExecutionStatus::Success);
        gone.deleted = true;
        let records = vec![gone, record("b", 1, None, ExecutionStatus::Success)];

        let visible = ExecutionFilter::default().apply(records.clone());
        assert_eq!(ids(&visible), vec!["b"]);

        let everything = ExecutionFilter::parse(0, "", "", true).unwrap().apply(records);
        assert_eq!(ids(&everything), vec!["a", "b"]);
    }
}
