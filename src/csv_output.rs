//! CSV output format for normalized trace datasets

use crate::dataset::TraceDataset;
use crate::record::{NormalizedRecord, PerRankMetadata};

const RECORD_HEADER: &str = "rank,function_id,function_name,tstart,tend,time,arg_count,args,\
                             return_value,file_name,offset,io_volume,category,io_type,interface,annotation";

const METADATA_HEADER: &str = "rank,start_timestamp,end_timestamp,time,file_count,total_records";

/// Escape CSV field (handle commas, quotes, newlines)
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn optional<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

fn format_record(record: &NormalizedRecord) -> String {
    let annotation = record
        .annotation
        .as_ref()
        .map(|a| format!("{:?}: {}", a.severity, a.message))
        .unwrap_or_default();
    let fields = [
        record.rank.to_string(),
        record.function_id.to_string(),
        escape_field(&record.function_name),
        record.tstart.to_string(),
        record.tend.to_string(),
        record.time.to_string(),
        record.arg_count.to_string(),
        escape_field(&record.args.join(" ")),
        record.return_value.to_string(),
        escape_field(&optional(&record.file_name)),
        optional(&record.offset),
        optional(&record.io_volume),
        record.category.to_string(),
        record.io_type.to_string(),
        record.interface.to_string(),
        escape_field(&annotation),
    ];
    fields.join(",")
}

fn format_metadata(metadata: &PerRankMetadata) -> String {
    [
        metadata.rank.to_string(),
        metadata.start_timestamp.to_string(),
        metadata.end_timestamp.to_string(),
        metadata.time.to_string(),
        metadata.file_count.to_string(),
        metadata.total_records.to_string(),
    ]
    .join(",")
}

/// Render the record table as CSV with the stable 16-column header
pub fn records_to_csv(dataset: &TraceDataset) -> String {
    let mut output = String::new();
    output.push_str(RECORD_HEADER);
    output.push('\n');
    for record in &dataset.records {
        output.push_str(&format_record(record));
        output.push('\n');
    }
    output
}

/// Render the per-rank metadata table as CSV
pub fn metadata_to_csv(dataset: &TraceDataset) -> String {
    let mut output = String::new();
    output.push_str(METADATA_HEADER);
    output.push('\n');
    for metadata in &dataset.metadata {
        output.push_str(&format_metadata(metadata));
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Category, Interface, IoType};
    use crate::record::Annotation;

    fn sample_record() -> NormalizedRecord {
        NormalizedRecord {
            rank: 1,
            function_id: 4,
            function_name: "fwrite".to_string(),
            tstart: 0.5,
            tend: 0.75,
            time: 0.25,
            arg_count: 4,
            args: vec![
                "buf".to_string(),
                "2".to_string(),
                "5".to_string(),
                "6".to_string(),
            ],
            return_value: 2,
            file_name: Some("/tmp/a,b".to_string()),
            offset: Some(0),
            io_volume: Some(10),
            category: Category::Io,
            io_type: IoType::Write,
            interface: Interface::Posix,
            annotation: None,
        }
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_record_row_field_count() {
        let dataset = TraceDataset {
            records: vec![sample_record()],
            metadata: vec![],
        };
        let csv = records_to_csv(&dataset);
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap().split(',').count(), 16);
        // the quoted file name keeps its comma
        let row = lines.next().unwrap();
        assert!(row.contains("\"/tmp/a,b\""));
        assert!(row.contains("io,write,posix"));
    }

    #[test]
    fn test_optional_columns_render_empty() {
        let mut record = sample_record();
        record.file_name = None;
        record.offset = None;
        record.io_volume = None;
        let row = format_record(&record);
        assert!(row.contains(",2,,,,io,"));
    }

    #[test]
    fn test_annotation_rendered() {
        let mut record = sample_record();
        record.annotation = Some(Annotation::warning("seek beyond end of file"));
        let row = format_record(&record);
        assert!(row.ends_with("Warning: seek beyond end of file"));
    }

    #[test]
    fn test_metadata_csv() {
        let dataset = TraceDataset {
            records: vec![],
            metadata: vec![PerRankMetadata {
                rank: 0,
                start_timestamp: 1.0,
                end_timestamp: 2.5,
                time: 1.5,
                file_count: 3,
                total_records: 12,
            }],
        };
        let csv = metadata_to_csv(&dataset);
        assert!(csv.starts_with(METADATA_HEADER));
        assert!(csv.contains("0,1,2.5,1.5,3,12"));
    }
}
