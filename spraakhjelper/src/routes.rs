use crate::AppState;
use crate::error::OracleError;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use common::languages::{Language, SUPPORTED_LANGUAGES};
use common::models::{
    AnalyzeRequest, AnalyzeResponse, CheckRequest, CheckResponse, ErrorResponse, FieldError,
    Provider, SplitRequest, SplitResponse,
};
use log::{error, info, warn};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

type ErrorReply = (StatusCode, Json<ErrorResponse>);

fn rejection_to_response(rejection: JsonRejection) -> ErrorReply {
    warn!("rejected request body: {rejection}");
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: "Invalid input".to_string(),
            kind: Some("validation".to_string()),
            message: rejection.body_text(),
            details: vec![FieldError {
                field: "body".to_string(),
                message: rejection.body_text(),
            }],
        }),
    )
}

fn err_to_response(operation: &str, err: OracleError) -> ErrorReply {
    let message = err.to_string();
    match err {
        OracleError::Validation(details) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Invalid input".to_string(),
                kind: Some("validation".to_string()),
                message,
                details,
            }),
        ),
        e => {
            match &e {
                OracleError::Configuration(..) => error!("{operation}: {e}"),
                _ => warn!("{operation} failed: {e}"),
            }
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Internal server error".to_string(),
                    kind: Some(e.kind().to_string()),
                    message,
                    details: Vec::new(),
                }),
            )
        }
    }
}

fn new_submission_id(provider: Provider) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("{provider}-{millis}-{}", Uuid::new_v4())
}

#[utoipa::path(post, path = "/api/v1/split", request_body = SplitRequest, responses((status = OK, body = SplitResponse), (status = BAD_REQUEST, body = ErrorResponse), (status = INTERNAL_SERVER_ERROR, body = ErrorResponse)), description = "Splits learner text into sentences with normalized punctuation")]
#[axum::debug_handler]
pub async fn split(
    state: State<AppState>,
    body: Result<Json<SplitRequest>, JsonRejection>,
) -> Result<Json<SplitResponse>, ErrorReply> {
    let Json(request) = body.map_err(rejection_to_response)?;
    let provider = request.provider.unwrap_or_default();
    info!(
        "Splitting sentences for language {} via {provider}",
        request.native_language
    );

    let sentences = state
        .oracle(provider)
        .split_into_sentences(&request.text, &request.native_language)
        .await
        .map_err(|err| err_to_response("split", err))?;

    Ok(Json(SplitResponse {
        success: true,
        sentence_count: sentences.len(),
        sentences,
        native_language: request.native_language,
        original_text: request.text,
        provider,
    }))
}

#[utoipa::path(post, path = "/api/v1/analyze", request_body = AnalyzeRequest, responses((status = OK, body = AnalyzeResponse), (status = BAD_REQUEST, body = ErrorResponse), (status = INTERNAL_SERVER_ERROR, body = ErrorResponse)), description = "Judges each sentence and explains errors in Norwegian and the mother tongue")]
#[axum::debug_handler]
pub async fn analyze(
    state: State<AppState>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ErrorReply> {
    let Json(request) = body.map_err(rejection_to_response)?;
    let provider = request.provider.unwrap_or_default();
    let submission_id = new_submission_id(provider);
    info!(
        "Analyzing submission {submission_id} for language {}",
        request.native_language
    );

    let results = state
        .oracle(provider)
        .analyze_sentences(&request.text, &request.native_language, &submission_id)
        .await
        .map_err(|err| err_to_response("analyze", err))?;

    Ok(Json(AnalyzeResponse {
        success: true,
        submission_id,
        results,
        native_language: request.native_language,
        original_text: request.text,
        provider,
    }))
}

#[utoipa::path(post, path = "/api/v1/check", request_body = CheckRequest, responses((status = OK, body = CheckResponse), (status = BAD_REQUEST, body = ErrorResponse), (status = INTERNAL_SERVER_ERROR, body = ErrorResponse)), description = "Rechecks a single sentence the learner rewrote")]
pub async fn check(
    state: State<AppState>,
    body: Result<Json<CheckRequest>, JsonRejection>,
) -> Result<Json<CheckResponse>, ErrorReply> {
    let Json(request) = body.map_err(rejection_to_response)?;
    let provider = request.provider.unwrap_or_default();
    info!(
        "Checking sentence for language {} via {provider}",
        request.native_language
    );

    let outcome = state
        .oracle(provider)
        .check_single_sentence(
            &request.sentence,
            &request.correct_sentence,
            &request.native_language,
        )
        .await
        .map_err(|err| err_to_response("check", err))?;

    Ok(Json(CheckResponse {
        success: true,
        outcome,
        provider,
    }))
}

#[utoipa::path(get, path = "/api/v1/languages", responses((status = OK, body = Vec<Language>)), description = "Lists supported mother tongues")]
pub async fn languages() -> Json<Vec<Language>> {
    Json(SUPPORTED_LANGUAGES.to_vec())
}

#[cfg(test)]
mod tests {
    use crate::oracle::OracleClient;
    use crate::oracle::fake::FakeOracle;
    use crate::{AppState, app};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use common::models::Provider;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn state(openai: FakeOracle, azure: FakeOracle) -> AppState {
        AppState::new(
            OracleClient::new(Arc::new(openai)),
            OracleClient::new(Arc::new(azure)),
        )
    }

    async fn post(state: AppState, path: &str, body: String) -> (StatusCode, Value) {
        let response = app(state)
            .oneshot(
                Request::post(path)
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    const SPLIT_REPLY: &str = r#"[
        {"original": "Jeg heter ole.", "corrected": "Jeg heter ole."},
        {"original": "Jeg er fra norge.", "corrected": "Jeg er fra norge."}
    ]"#;

    #[tokio::test]
    async fn split_returns_sentences_and_count() {
        let state = state(
            FakeOracle::replying(Provider::OpenAi, SPLIT_REPLY),
            FakeOracle::unreachable(Provider::Azure),
        );
        let body = json!({"text": "jeg heter ole jeg er fra norge", "nativeLanguage": "polsk"});
        let (status, body) = post(state, "/api/v1/split", body.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["sentenceCount"], 2);
        assert_eq!(body["sentences"][0]["original"], "Jeg heter ole.");
        assert_eq!(body["sentences"][1]["corrected"], "Jeg er fra norge.");
        assert_eq!(body["originalText"], "jeg heter ole jeg er fra norge");
        assert_eq!(body["provider"], "openai");
    }

    #[tokio::test]
    async fn provider_field_selects_backend() {
        let state = state(
            FakeOracle::unreachable(Provider::OpenAi),
            FakeOracle::replying(Provider::Azure, SPLIT_REPLY),
        );
        let body = json!({"text": "jeg heter ole", "morsmaal": "polsk", "provider": "azure"});
        let (status, body) = post(state, "/api/v1/split", body.to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["provider"], "azure");
        assert_eq!(body["nativeLanguage"], "polsk");
    }

    #[tokio::test]
    async fn blank_fields_are_bad_request() {
        let state = state(
            FakeOracle::replying(Provider::OpenAi, SPLIT_REPLY),
            FakeOracle::unreachable(Provider::Azure),
        );
        let (status, body) = post(state, "/api/v1/split", json!({"text": " "}).to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid input");
        assert_eq!(body["details"][0]["field"], "text");
        assert_eq!(body["details"][1]["field"], "nativeLanguage");
    }

    #[tokio::test]
    async fn unparsable_body_is_bad_request() {
        let state = state(
            FakeOracle::replying(Provider::OpenAi, SPLIT_REPLY),
            FakeOracle::unreachable(Provider::Azure),
        );
        let (status, body) = post(state, "/api/v1/check", "{not json".to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation");
    }

    #[tokio::test]
    async fn analyze_assigns_ids_from_submission() {
        let reply = r#"[
            {"bruker_setning": "Jeg bor i Oslo.", "riktig_setning": "Jeg bor i Oslo.",
             "forklaring": "", "forklaring_morsmaal": "", "setning_status": "riktig"},
            {"bruker_setning": "Hu går til skole.", "riktig_setning": "Hun går til skolen.",
             "forklaring": "1. **Hun**", "forklaring_morsmaal": "1. **Hun** (pl)",
             "setning_status": "feil"}
        ]"#;
        let state = state(
            FakeOracle::unreachable(Provider::OpenAi),
            FakeOracle::replying(Provider::Azure, reply),
        );
        let body = json!({
            "text": "Jeg bor i Oslo. Hu går til skole.",
            "nativeLanguage": "polsk",
            "provider": "azure",
        });
        let (status, body) = post(state, "/api/v1/analyze", body.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        let submission_id = body["submissionId"].as_str().unwrap();
        assert!(submission_id.starts_with("azure-"));
        assert_eq!(body["results"][0]["sentenceId"], format!("{submission_id}-0"));
        assert_eq!(body["results"][1]["sentenceId"], format!("{submission_id}-1"));
        assert_eq!(body["results"][0]["status"], "initially-correct");
        assert_eq!(body["results"][1]["status"], "incorrect");
        assert_eq!(
            body["results"][0]["explanationNative"],
            crate::normalize::POSITIVE_FEEDBACK
        );
    }

    #[tokio::test]
    async fn unreachable_oracle_is_internal_error() {
        let state = state(
            FakeOracle::unreachable(Provider::OpenAi),
            FakeOracle::unreachable(Provider::Azure),
        );
        let body = json!({"text": "Jeg heter Ole.", "nativeLanguage": "polsk"});
        let (status, body) = post(state, "/api/v1/analyze", body.to_string()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["kind"], "oracle_unavailable");
        assert!(body["message"].as_str().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn malformed_oracle_output_is_internal_error() {
        let state = state(
            FakeOracle::replying(Provider::OpenAi, "Beklager, jeg forstod ikke."),
            FakeOracle::unreachable(Provider::Azure),
        );
        let body = json!({"text": "hei", "nativeLanguage": "thai"});
        let (status, body) = post(state, "/api/v1/split", body.to_string()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["kind"], "malformed_response");
    }

    #[tokio::test]
    async fn missing_configuration_is_internal_error() {
        let state = state(
            FakeOracle::replying(Provider::OpenAi, "{}").unconfigured(),
            FakeOracle::unreachable(Provider::Azure),
        );
        let body = json!({"sentence": "a", "correctSentence": "b", "nativeLanguage": "c"});
        let (status, body) = post(state, "/api/v1/check", body.to_string()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["kind"], "configuration");
    }

    #[tokio::test]
    async fn check_flattens_outcome() {
        let state = state(
            FakeOracle::replying(
                Provider::OpenAi,
                r#"{"er_riktig": true, "forklaring": "Riktig!", "forklaring_morsmaal": "Dobrze!"}"#,
            ),
            FakeOracle::unreachable(Provider::Azure),
        );
        let body = json!({
            "sentence": "Hun går til skolen.",
            "correctSentence": "Hun går til skolen.",
            "nativeLanguage": "polsk",
        });
        let (status, body) = post(state, "/api/v1/check", body.to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isCorrect"], true);
        assert_eq!(body["explanationMotherTongue"], "Dobrze!");
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn lists_languages() {
        let state = state(
            FakeOracle::unreachable(Provider::OpenAi),
            FakeOracle::unreachable(Provider::Azure),
        );
        let response = app(state)
            .oneshot(Request::get("/api/v1/languages").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.as_array().unwrap().len(), 15);
    }

    #[tokio::test]
    async fn unreachable_endpoint_surfaces_transport_error() {
        let config = crate::Config {
            openai_api_key: Some("sk-test".to_string()),
            openai_base_url: "http://127.0.0.1:1".to_string(),
            ..crate::Config::test_default()
        };
        let body = json!({"text": "Jeg heter Ole.", "nativeLanguage": "polsk"});
        let (status, body) =
            post(AppState::from_config(&config), "/api/v1/analyze", body.to_string()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["kind"], "oracle_unavailable");
    }
}
