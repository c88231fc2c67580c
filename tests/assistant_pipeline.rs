//! End-to-end pipeline tests: sheet export and model endpoint both mocked,
//! the assistant runs load → filter → prompt → call → execute.

use daver::model::{GenerationOptions, ModelClient};
use daver::sheet::{HttpSheetFetcher, SheetSource, SheetStore};
use daver::table::{CellValue, FilterSet, Predicate};
use daver::{Assistant, Error, RequestPhase};
use mockito::Matcher;
use std::sync::Arc;
use std::time::Duration;

const CSV: &str = "Region,Crop,Result\n\
South,Cotton,1\nNorth,Wheat,2\nSouth,Cotton,3\nEast,Rice,4\nWest,Cotton,5\n";

const GENERATE_PATH: &str = "/models/gemini-2.0-flash:generateContent";

fn assistant_for(server: &mockito::ServerGuard) -> Assistant {
    std::env::set_var("GEMINI_API_KEY", "test-key");
    let source = SheetSource::from_share_url(&server.url()).unwrap();
    let store = Arc::new(SheetStore::new(
        source,
        Arc::new(HttpSheetFetcher::new().unwrap()),
        Duration::from_secs(600),
        None,
    ));
    let client = ModelClient::with_base_url(
        "gemini-2.0-flash",
        GenerationOptions::default(),
        &server.url(),
    )
    .unwrap();
    Assistant::new(store, client, 5)
}

fn model_reply(text: &str) -> String {
    serde_json::json!({
        "candidates": [{
            "content": { "parts": [{"text": text}], "role": "model" },
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

async fn mock_sheet(server: &mut mockito::ServerGuard) -> mockito::Mock {
    server
        .mock("GET", "/export?format=csv")
        .with_status(200)
        .with_body(CSV)
        .create_async()
        .await
}

#[tokio::test]
async fn ask_runs_the_full_pipeline() {
    let mut server = mockito::Server::new_async().await;
    let _sheet = mock_sheet(&mut server).await;
    let reply = "면화 행을 세어 보면 됩니다.\n\n### PLAN\n```json\n\
        {\"steps\": [{\"op\": \"aggregate\", \"column\": \"Result\", \"func\": \"count\"}]}\n```";
    let _model = server
        .mock("POST", GENERATE_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(model_reply(reply))
        .create_async()
        .await;

    let assistant = assistant_for(&server);
    let filters = FilterSet::new().with(Predicate::equals("Crop", "Cotton"));
    let outcome = assistant.ask(&filters, "면화가 몇 건이야?").await.unwrap();

    assert_eq!(
        outcome.rationale.as_deref(),
        Some("면화 행을 세어 보면 됩니다.")
    );
    // Count runs over the filtered sub-table (3 cotton rows).
    assert_eq!(
        outcome.analysis.table.cell(0, "count(Result)"),
        Some(&CellValue::Number(3.0))
    );
    assert_eq!(outcome.phases.last(), Some(&RequestPhase::Idle));
    assert!(outcome.phases.contains(&RequestPhase::Displayed));
}

#[tokio::test]
async fn ask_with_headerless_reply_uses_the_fallback_path() {
    let mut server = mockito::Server::new_async().await;
    let _sheet = mock_sheet(&mut server).await;
    let _model = server
        .mock("POST", GENERATE_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(model_reply("{\"steps\": [{\"op\": \"head\", \"n\": 2}]}"))
        .create_async()
        .await;

    let assistant = assistant_for(&server);
    let outcome = assistant.ask(&FilterSet::new(), "앞 두 행만").await.unwrap();

    assert!(outcome.rationale.is_none());
    assert_eq!(outcome.analysis.table.row_count(), 2);
}

#[tokio::test]
async fn bad_plan_surfaces_as_analysis_error_with_payload() {
    let mut server = mockito::Server::new_async().await;
    let _sheet = mock_sheet(&mut server).await;
    let reply = "### PLAN\n```json\n{\"steps\": [{\"op\": \"sort\", \"by\": \"Profit\"}]}\n```";
    let _model = server
        .mock("POST", GENERATE_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(model_reply(reply))
        .create_async()
        .await;

    let assistant = assistant_for(&server);
    let err = assistant.ask(&FilterSet::new(), "정렬해줘").await.unwrap_err();

    match err {
        Error::Analysis(inner) => {
            assert!(inner.to_string().contains("Profit"));
            assert!(inner.payload().contains("sort"));
        }
        other => panic!("expected analysis error, got {other}"),
    }
}

#[tokio::test]
async fn sheet_failure_fails_the_action_but_not_the_session() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/export?format=csv")
        .with_status(500)
        .create_async()
        .await;

    let assistant = assistant_for(&server);
    let err = assistant.ask(&FilterSet::new(), "q").await.unwrap_err();
    assert!(matches!(err, Error::Sheet(_)));
    assert!(!err.halts_session());
}

#[tokio::test]
async fn model_failure_after_load_leaves_the_cached_table_usable() {
    let mut server = mockito::Server::new_async().await;
    let _sheet = mock_sheet(&mut server).await;
    server
        .mock("POST", GENERATE_PATH)
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let assistant = assistant_for(&server);
    let filters = FilterSet::new().with(Predicate::equals("Crop", "Cotton"));

    let err = assistant.ask(&filters, "q").await.unwrap_err();
    assert!(matches!(err, Error::Model { status: 500, .. }));

    // The manual search path still works against the cached table.
    let search = assistant.search(&filters).await.unwrap();
    assert_eq!(search.filtered.row_count(), 3);
    assert_eq!(search.loaded.row_count(), 5);
}
