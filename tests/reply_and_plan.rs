//! Integration tests for response splitting and plan execution, covering the
//! fallback and failure paths end to end.

use daver::analysis::{self, AnalysisError};
use daver::table::{CellValue, Table};
use daver::{ModelReply, PLAN_SECTION_HEADER};

fn harvest() -> Table {
    Table::new(
        vec!["Region".into(), "Crop".into(), "Result".into()],
        vec![
            vec![
                CellValue::Text("South".into()),
                CellValue::Text("Cotton".into()),
                CellValue::Number(1.0),
            ],
            vec![
                CellValue::Text("North".into()),
                CellValue::Text("Wheat".into()),
                CellValue::Number(2.0),
            ],
        ],
    )
}

#[test]
fn response_without_header_still_yields_a_non_empty_payload() {
    let text = "{\"steps\": [{\"op\": \"head\", \"n\": 1}]}";
    let reply = ModelReply::parse(text);
    assert!(reply.rationale.is_none());
    assert!(!reply.payload.is_empty());

    // And the fallback payload executes normally.
    let outcome = analysis::execute(&harvest(), &reply.payload).unwrap();
    assert_eq!(outcome.table.row_count(), 1);
}

#[test]
fn well_formed_response_splits_and_executes() {
    let text = format!(
        "남부 지역의 면화만 남기면 됩니다.\n\n{}\n```json\n{}\n```",
        PLAN_SECTION_HEADER,
        r#"{"steps": [{"op": "filter", "column": "Crop", "value": "Cotton"}]}"#
    );
    let reply = ModelReply::parse(&text);
    assert_eq!(
        reply.rationale.as_deref(),
        Some("남부 지역의 면화만 남기면 됩니다.")
    );

    let outcome = analysis::execute(&harvest(), &reply.payload).unwrap();
    assert_eq!(outcome.table.row_count(), 1);
    assert_eq!(
        outcome.table.cell(0, "Region"),
        Some(&CellValue::Text("South".into()))
    );
}

#[test]
fn undefined_column_is_caught_with_the_plan_visible() {
    let payload = r#"{"steps": [{"op": "aggregate", "column": "Profit", "func": "sum"}]}"#;
    let err = analysis::execute(&harvest(), payload).unwrap_err();

    match &err {
        AnalysisError::Execution { message, payload, .. } => {
            assert!(message.contains("Profit"));
            assert!(payload.contains("aggregate"));
        }
        other => panic!("expected execution error, got {other:?}"),
    }
}

#[test]
fn raw_code_from_the_model_is_rejected_not_evaluated() {
    // A model ignoring the contract and returning pandas-style code must be
    // surfaced as an invalid payload, never executed.
    let reply = ModelReply::parse("df[df['Crop'] == 'Cotton']");
    let err = analysis::execute(&harvest(), &reply.payload).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidJson { .. }));
    assert_eq!(err.payload(), "df[df['Crop'] == 'Cotton']");
}

#[test]
fn failed_plans_leave_the_input_table_untouched() {
    let table = harvest();
    let payload = r#"{"steps": [{"op": "select", "columns": ["Ghost"]}]}"#;
    let _ = analysis::execute(&table, payload).unwrap_err();
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.columns().len(), 3);
}
