//! Integration tests for the agent client against a mock backend
//!
//! Covers session creation, `run_sse` decoding, retry around both calls,
//! and the end-to-end submission path of a flow session.

use sahayak::{AgentClient, AgentConfig, AgentError, Extracted, Flow, FlowSession, RetryConfig};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Helpers
// ============================================================================

fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        base_delay: 1,
        max_delay: 5,
        ..Default::default()
    }
}

fn client_for(server: &MockServer) -> AgentClient {
    let config = AgentConfig::default()
        .with_base_url(server.uri())
        .with_retry(fast_retry());
    AgentClient::new(config).unwrap()
}

fn session_body(id: &str, app: &str) -> serde_json::Value {
    json!({"id": id, "userId": "u_999", "appName": app, "state": {}, "events": []})
}

fn sse(events: &[serde_json::Value]) -> String {
    events
        .iter()
        .map(|e| format!("data: {}\n\n", e))
        .collect::<String>()
}

fn sse_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/event-stream")
}

async fn mount_session(server: &MockServer, app: &str, id: &str) {
    Mock::given(method("POST"))
        .and(path_regex(format!(
            r"^/apps/{}/users/u_999/sessions/[0-9a-f\-]{{36}}$",
            app
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body(id, app)))
        .mount(server)
        .await;
}

// ============================================================================
// Session establishment
// ============================================================================

#[tokio::test]
async fn test_create_session_uses_echoed_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/apps/lesson_planner/users/u_999/sessions/.+$"))
        .and(header("content-type", "application/json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(session_body("canonical-id", "lesson_planner")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session = client_for(&server)
        .create_session("lesson_planner")
        .await
        .unwrap();

    assert_eq!(session.session_id, "canonical-id");
    assert_eq!(session.user_id, "u_999");
    assert_eq!(session.app_name, "lesson_planner");
}

#[tokio::test]
async fn test_create_session_non_success_carries_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .create_session("quiz_generator")
        .await
        .unwrap_err();

    match err {
        AgentError::SessionCreation { status, reason } => {
            assert_eq!(status, Some(503));
            assert_eq!(reason, "Service Unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_create_session_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .create_session("quiz_generator")
        .await
        .unwrap_err();

    assert!(matches!(err, AgentError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_create_session_unreachable_backend() {
    let config = AgentConfig::default().with_base_url("http://127.0.0.1:9");
    let err = AgentClient::new(config)
        .unwrap()
        .create_session("quiz_generator")
        .await
        .unwrap_err();

    assert!(matches!(err, AgentError::SessionCreation { status: None, .. }));
}

// ============================================================================
// run_sse
// ============================================================================

#[tokio::test]
async fn test_run_sse_returns_last_parsed_event() {
    let server = MockServer::start().await;
    let body = format!(
        "{}: keep-alive\n\ndata: {{broken\n\n",
        sse(&[json!({"step": 1}), json!({"step": 2}), json!({"step": 3})])
    );
    Mock::given(method("POST"))
        .and(path("/run_sse"))
        .and(body_partial_json(json!({
            "appName": "quiz_generator",
            "userId": "u_999",
            "sessionId": "s-1",
            "newMessage": {"role": "user", "parts": [{"text": "hello"}]},
            "streaming": false
        })))
        .respond_with(sse_response(body))
        .expect(1)
        .mount(&server)
        .await;

    let session = sahayak::Session {
        user_id: "u_999".to_string(),
        session_id: "s-1".to_string(),
        app_name: "quiz_generator".to_string(),
    };
    let result = client_for(&server).run_sse(&session, "hello").await.unwrap();

    assert_eq!(result, Some(json!({"step": 3})));
}

#[tokio::test]
async fn test_run_sse_final_event_without_blank_line() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/run_sse"))
        .respond_with(sse_response(
            "data: {\"step\": 1}\n\ndata: {\"step\": 2}".to_string(),
        ))
        .mount(&server)
        .await;

    let session = sahayak::Session {
        user_id: "u_999".to_string(),
        session_id: "s-1".to_string(),
        app_name: "lesson_planner".to_string(),
    };
    let result = client_for(&server).run_sse(&session, "hi").await.unwrap();

    assert_eq!(result, Some(json!({"step": 2})));
}

#[tokio::test]
async fn test_run_sse_non_success_is_stream_request_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/run_sse"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let session = sahayak::Session {
        user_id: "u_999".to_string(),
        session_id: "s-1".to_string(),
        app_name: "lesson_planner".to_string(),
    };
    let err = client_for(&server).run_sse(&session, "hi").await.unwrap_err();

    assert!(matches!(
        err,
        AgentError::StreamRequest {
            status: Some(500),
            ..
        }
    ));
}

// ============================================================================
// Flow sessions
// ============================================================================

#[tokio::test]
async fn test_submit_lesson_plan_end_to_end() {
    let server = MockServer::start().await;
    mount_session(&server, "lesson_planner", "lp-1").await;

    let plan = json!({"title": "Fractions", "subject": "Mathematics"});
    let answer_text = json!({"lesson_planner_agent_response": plan.clone()}).to_string();
    let body = sse(&[
        json!({"content": {"parts": [{"text": "thinking..."}]}, "partial": true}),
        json!({"content": {"role": "model", "parts": [{"text": answer_text}]}}),
    ]);
    Mock::given(method("POST"))
        .and(path("/run_sse"))
        .and(body_partial_json(json!({"sessionId": "lp-1", "appName": "lesson_planner"})))
        .respond_with(sse_response(body))
        .mount(&server)
        .await;

    let mut flow = FlowSession::new(client_for(&server), Flow::LessonPlanner);
    let submission = flow
        .submit("Create a daily lesson plan for Grade 4 Mathematics on 'Fractions'")
        .await
        .unwrap();

    assert_eq!(submission.extracted, Extracted::Structured(plan));
    assert_eq!(flow.session().unwrap().session_id, "lp-1");
    assert!(Flow::LessonPlanner
        .render(&submission.extracted)
        .starts_with("# Fractions\n\n**Subject:** Mathematics\n"));
}

#[tokio::test]
async fn test_submit_reuses_session_until_reset() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/apps/quiz_generator/users/u_999/sessions/.+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body("q-1", "quiz_generator")))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/run_sse"))
        .respond_with(sse_response(sse(&[json!({"content": {"parts": [{
            "functionResponse": {"response": {"questions": []}}
        }]}})])))
        .expect(3)
        .mount(&server)
        .await;

    let mut flow = FlowSession::new(client_for(&server), Flow::QuizGenerator);
    flow.submit("first").await.unwrap();
    let second = flow.submit("second").await.unwrap();
    assert!(second.extracted.is_structured());

    flow.reset();
    assert!(flow.session().is_none());
    flow.submit("third").await.unwrap();
}

#[tokio::test]
async fn test_submit_retries_transient_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/apps/quiz_generator/.+$"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_session(&server, "quiz_generator", "q-2").await;
    Mock::given(method("POST"))
        .and(path("/run_sse"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/run_sse"))
        .respond_with(sse_response(sse(&[json!({"content": {"parts": [{"text": "plain"}]}})])))
        .expect(1)
        .mount(&server)
        .await;

    let mut flow = FlowSession::new(client_for(&server), Flow::QuizGenerator);
    let submission = flow.submit("quiz please").await.unwrap();

    assert_eq!(
        submission.extracted,
        Extracted::Raw(json!({"content": {"parts": [{"text": "plain"}]}}))
    );
}

#[tokio::test]
async fn test_submit_surfaces_last_error_after_exhaustion() {
    let server = MockServer::start().await;
    mount_session(&server, "quiz_generator", "q-3").await;
    Mock::given(method("POST"))
        .and(path("/run_sse"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let mut flow = FlowSession::new(client_for(&server), Flow::QuizGenerator);
    let err = flow.submit("quiz please").await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert!(matches!(err, AgentError::StreamRequest { .. }));
    // the session survives a failed submission
    assert_eq!(flow.session().unwrap().session_id, "q-3");
}

#[tokio::test]
async fn test_submit_with_no_parseable_event_is_raw_null() {
    let server = MockServer::start().await;
    mount_session(&server, "lesson_planner", "lp-2").await;
    Mock::given(method("POST"))
        .and(path("/run_sse"))
        .respond_with(sse_response(": only comments\n\n".to_string()))
        .mount(&server)
        .await;

    let mut flow = FlowSession::new(client_for(&server), Flow::LessonPlanner);
    let submission = flow.submit("hello").await.unwrap();

    assert_eq!(submission.raw, None);
    assert_eq!(submission.extracted, Extracted::Raw(serde_json::Value::Null));
}
