//! Output formatting for CLI commands.

use anyhow::Result;
use serde::Serialize;

use crate::cli::args::{FathomArgs, OutputFormat};
use crate::indexing::IndexReport;
use crate::search::SearchResults;

pub fn output_report(report: &IndexReport, args: &FathomArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Json => output_json(report, args),
        OutputFormat::Human => {
            println!("{}", format_report(report));
            Ok(())
        }
    }
}

pub fn output_results(results: &SearchResults, args: &FathomArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Json => output_json(results, args),
        OutputFormat::Human => {
            println!("{}", format_results(results));
            Ok(())
        }
    }
}

fn output_json<T: Serialize>(value: &T, args: &FathomArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}

fn format_report(report: &IndexReport) -> String {
    let mut out = format!(
        "Indexed {}/{} documents into `{}` in {:.2?}",
        report.documents_indexed, report.total_documents, report.index, report.execution_time
    );
    if report.documents_failed > 0 {
        out.push_str(&format!("\n  {} failed", report.documents_failed));
    }
    if report.documents_deleted > 0 {
        out.push_str(&format!("\n  {} replaced", report.documents_deleted));
    }
    out
}

fn format_results(results: &SearchResults) -> String {
    let mut out = format!(
        "Showing {} of {} hits",
        results.len(),
        results.total_hits
    );
    if let Some(suggestion) = &results.suggestion {
        out.push_str(&format!("\nDid you mean: {suggestion}"));
    }
    for (rank, doc) in results.docs.iter().enumerate() {
        out.push_str(&format!("\n{:>3}. {} (score {:.4})", rank + 1, doc.id, doc.score));
        for (name, value) in &doc.fields {
            out.push_str(&format!("\n       {name}: {}", value.to_json()));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use super::*;
    use crate::document::Value;
    use crate::search::SearchDoc;

    #[test]
    fn test_format_report() {
        let report = IndexReport {
            index: "books".to_string(),
            total_documents: 3,
            documents_indexed: 2,
            documents_failed: 1,
            documents_deleted: 0,
            execution_time: Duration::from_millis(5),
        };
        let text = format_report(&report);
        assert!(text.starts_with("Indexed 2/3 documents into `books`"));
        assert!(text.contains("1 failed"));
        assert!(!text.contains("replaced"));
    }

    #[test]
    fn test_format_results() {
        let results = SearchResults {
            docs: vec![SearchDoc {
                doc_number: 0,
                id: "dune".to_string(),
                score: 1.5,
                fields: BTreeMap::from([("title".to_string(), Value::from("Dune"))]),
            }],
            total_hits: 4,
            suggestion: Some("desert".to_string()),
        };
        let text = format_results(&results);
        assert!(text.contains("Showing 1 of 4 hits"));
        assert!(text.contains("Did you mean: desert"));
        assert!(text.contains("1. dune (score 1.5000)"));
        assert!(text.contains("title: \"Dune\""));
    }
}
