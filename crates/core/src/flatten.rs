use crate::config::SourceOrder;
use crate::domain::{ExportRecord, FlatRow};
use crate::utils::format_epoch_to_local;

/// Flattens raw export records into rows with dense, oldest-first ids.
///
/// With [`SourceOrder::NewestFirst`] the input is reversed before ids are
/// assigned, so position 0 is the oldest follow.
pub fn flatten(records: &[ExportRecord], order: SourceOrder) -> Vec<FlatRow> {
    if order == SourceOrder::NewestFirst && !looks_newest_first(records) {
        log::warn!(
            "Export timestamps are not newest-first; ids may not be in chronological order"
        );
    }

    let mut structured: Vec<(String, String, String)> = records
        .iter()
        .map(|record| {
            let reference = record.primary_reference();
            (
                record.username(),
                reference.href,
                format_epoch_to_local(reference.timestamp),
            )
        })
        .collect();

    if order == SourceOrder::NewestFirst {
        structured.reverse();
    }

    structured
        .into_iter()
        .enumerate()
        .map(|(idx, (username, url, timestamp))| FlatRow {
            id: idx as u64,
            username,
            url,
            timestamp,
        })
        .collect()
}

/// True when the known timestamps never increase. Records without a
/// timestamp are ignored.
fn looks_newest_first(records: &[ExportRecord]) -> bool {
    let stamps: Vec<i64> = records
        .iter()
        .filter_map(|r| r.primary_reference().timestamp)
        .collect();
    stamps.windows(2).all(|pair| pair[0] >= pair[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExportReference;

    fn record(title: &str, href: &str, ts: Option<i64>) -> ExportRecord {
        ExportRecord {
            title: title.to_string(),
            string_list_data: vec![ExportReference {
                href: href.to_string(),
                value: String::new(),
                timestamp: ts,
            }],
        }
    }

    #[test]
    fn test_flatten_reverses_newest_first() {
        let records = vec![record("b", "ub", Some(200)), record("a", "ua", Some(100))];
        let rows = flatten(&records, SourceOrder::NewestFirst);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, 0);
        assert_eq!(rows[0].username, "a");
        assert_eq!(rows[0].url, "ua");
        assert_eq!(rows[0].timestamp, format_epoch_to_local(Some(100)));
        assert_eq!(rows[1].id, 1);
        assert_eq!(rows[1].username, "b");
        assert_eq!(rows[1].timestamp, format_epoch_to_local(Some(200)));
    }

    #[test]
    fn test_flatten_keeps_oldest_first() {
        let records = vec![record("a", "ua", Some(100)), record("b", "ub", Some(200))];
        let rows = flatten(&records, SourceOrder::OldestFirst);
        assert_eq!(rows[0].username, "a");
        assert_eq!(rows[1].username, "b");
    }

    #[test]
    fn test_flatten_ids_are_dense() {
        let records: Vec<ExportRecord> = (0..25)
            .map(|i| record(&format!("user{i}"), "", Some(1000 - i)))
            .collect();
        let rows = flatten(&records, SourceOrder::NewestFirst);
        let ids: Vec<u64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, (0..25).collect::<Vec<u64>>());
        assert_eq!(rows[0].username, "user24");
        assert_eq!(rows[24].username, "user0");
    }

    #[test]
    fn test_flatten_degrades_missing_reference() {
        let records = vec![ExportRecord {
            title: "ghost".to_string(),
            string_list_data: Vec::new(),
        }];
        let rows = flatten(&records, SourceOrder::NewestFirst);
        assert_eq!(rows[0].username, "ghost");
        assert_eq!(rows[0].url, "");
        assert_eq!(rows[0].timestamp, "");
    }

    #[test]
    fn test_flatten_empty_input() {
        assert!(flatten(&[], SourceOrder::NewestFirst).is_empty());
    }

    #[test]
    fn test_looks_newest_first() {
        let newest_first = vec![
            record("c", "", Some(300)),
            record("x", "", None),
            record("a", "", Some(100)),
        ];
        assert!(looks_newest_first(&newest_first));

        let oldest_first = vec![record("a", "", Some(100)), record("c", "", Some(300))];
        assert!(!looks_newest_first(&oldest_first));
    }
}
