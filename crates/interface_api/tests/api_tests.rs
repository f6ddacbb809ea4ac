//! HTTP and WebSocket tests for the API layer

use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use core_kernel::TaskId;
use domain_claims::Claim;
use engine_batch::{BatchJobManager, BatchResults, ProgressMessage, TaskState};
use interface_api::config::ServiceConfig;
use interface_api::create_router;
use interface_api::dto::batches::{BatchStatusResponse, SubmitBatchResponse};
use test_utils::*;

fn server(manager: BatchJobManager) -> TestServer {
    TestServer::new(create_router(manager, ServiceConfig::default())).unwrap()
}

fn rule_based() -> BatchJobManager {
    EngineBuilder::new().with_rule_based_scorers().build()
}

/// Request body for a claim, with `id` sent as `claim_id`
fn claim_body(claim: &Claim) -> Value {
    let mut body = serde_json::to_value(claim).unwrap();
    let object = body.as_object_mut().unwrap();
    let id = object.remove("id").unwrap();
    object.insert("claim_id".to_string(), id);
    body
}

fn batch_body(claims: &[Claim]) -> Value {
    json!({ "claims": claims.iter().map(claim_body).collect::<Vec<_>>() })
}

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_reports_scorer_count() {
        let server = server(rule_based());

        let response = server.get("/health").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["scorers"], 5);
    }

    #[tokio::test]
    async fn test_health_degraded_without_scorers() {
        let server = server(EngineBuilder::new().build());

        let body: Value = server.get("/health").await.json();

        assert_eq!(body["status"], "degraded");
    }

    #[tokio::test]
    async fn test_responses_carry_request_id() {
        let server = server(rule_based());

        let response = server.get("/health").await;

        assert!(!response.header("x-request-id").is_empty());
    }
}

mod analyze_tests {
    use super::*;

    #[tokio::test]
    async fn test_suspicious_claim_rejected() {
        let server = server(rule_based());

        let response = server
            .post("/api/analyze-claim")
            .json(&claim_body(&ClaimFixtures::suspicious()))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["claim_id"], "CLM-002");
        assert_eq!(body["decision"]["label"], "REJECT");
        assert_eq!(body["decision"]["scores"].as_object().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_clean_claim_approved() {
        let server = server(rule_based());

        let body: Value = server
            .post("/api/analyze-claim")
            .json(&claim_body(&ClaimFixtures::clean()))
            .await
            .json();

        assert_eq!(body["decision"]["label"], "APPROVE");
    }

    #[tokio::test]
    async fn test_missing_claim_id_is_generated() {
        let server = server(rule_based());

        let body: Value = server
            .post("/api/analyze-claim")
            .json(&json!({
                "claimant": "Ana Lopez",
                "narrative": "Hail damage to roof",
                "contact": "ana@example.com",
                "location": "39.7392,-104.9903"
            }))
            .await
            .json();

        assert!(body["claim_id"].as_str().unwrap().starts_with("CLM-"));
    }

    #[tokio::test]
    async fn test_blank_claimant_fails_validation() {
        let server = server(rule_based());

        let response = server
            .post("/api/analyze-claim")
            .json(&json!({ "claimant": "", "narrative": "Broken window" }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_no_scorers_is_service_unavailable() {
        let server = server(EngineBuilder::new().build());

        let response = server
            .post("/api/analyze-claim")
            .json(&claim_body(&ClaimFixtures::clean()))
            .await;

        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    }
}

mod batch_tests {
    use super::*;

    async fn submit(server: &TestServer, claims: &[Claim]) -> TaskId {
        let response = server.post("/api/batches").json(&batch_body(claims)).await;
        response.assert_status(StatusCode::ACCEPTED);
        let body: SubmitBatchResponse = response.json();
        assert_eq!(body.status, TaskState::Pending);
        assert_eq!(body.total_claims, claims.len());
        body.task_id
    }

    #[tokio::test]
    async fn test_submit_then_fetch_results() {
        let manager = rule_based();
        let server = server(manager.clone());
        let claims = vec![ClaimFixtures::suspicious(), ClaimFixtures::clean()];

        let task_id = submit(&server, &claims).await;
        manager.wait_for_completion(task_id).await.unwrap();

        let status: BatchStatusResponse = server.get(&format!("/api/batches/{}", task_id)).await.json();
        assert_eq!(status.status, TaskState::Completed);
        assert_eq!(status.progress, 100);
        assert_eq!(status.completed, 2);

        let results: BatchResults = server
            .get(&format!("/api/batches/{}/results", task_id))
            .await
            .json();
        assert!(!results.partial);
        assert_results_in_submission_order(&results, &claims);
    }

    #[tokio::test]
    async fn test_status_accepts_bare_uuid() {
        let manager = rule_based();
        let server = server(manager.clone());
        let task_id = submit(&server, &ClaimFixtures::batch(1)).await;

        let bare = serde_json::to_value(task_id).unwrap();
        let response = server
            .get(&format!("/api/batches/{}", bare.as_str().unwrap()))
            .await;

        response.assert_status_ok();
    }

    #[tokio::test]
    async fn test_invalid_batches_are_bad_requests() {
        let server = server(rule_based());
        let mut duplicated = ClaimFixtures::batch(2);
        duplicated[1].id = duplicated[0].id.clone();
        let blank_narrative = vec![ClaimBuilder::new().with_narrative("   ").build()];

        for claims in [Vec::new(), duplicated, blank_narrative] {
            let response = server.post("/api/batches").json(&batch_body(&claims)).await;
            response.assert_status(StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_oversized_batch_rejected() {
        let manager = EngineBuilder::new()
            .with_rule_based_scorers()
            .with_max_batch_size(2)
            .build();
        let server = server(manager);

        let response = server
            .post("/api/batches")
            .json(&batch_body(&ClaimFixtures::batch(3)))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_task_is_not_found() {
        let server = server(rule_based());
        let unknown = TaskId::new();

        server
            .get(&format!("/api/batches/{}", unknown))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .get(&format!("/api/batches/{}/results", unknown))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .get("/api/batches/not-a-task")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

mod stats_tests {
    use super::*;

    #[tokio::test]
    async fn test_stats_count_decisions() {
        let server = server(rule_based());
        server
            .post("/api/analyze-claim")
            .json(&claim_body(&ClaimFixtures::suspicious()))
            .await
            .assert_status_ok();

        let body: Value = server.get("/api/stats").await.json();

        assert_eq!(body["total_processed"], 1);
        assert_eq!(body["rejected"], 1);
        assert_eq!(body["recent"][0]["claim_id"], "CLM-002");
        assert_eq!(body["scorers"].as_array().unwrap().len(), 5);
        assert_eq!(body["fraud_threshold"], 0.7);
        assert_eq!(body["consensus_threshold"], 3);
    }
}

mod progress_socket_tests {
    use super::*;

    fn ws_server(manager: BatchJobManager) -> TestServer {
        TestServer::builder()
            .http_transport()
            .build(create_router(manager, ServiceConfig::default()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_socket_streams_until_completed() {
        let manager = EngineBuilder::new()
            .with_scorer(ScriptedScorer::new("steady", 0.2).delay(Duration::from_millis(40)))
            .with_pool_size(1)
            .build();
        let server = ws_server(manager.clone());
        let task_id = manager.submit(ClaimFixtures::batch(4)).await.unwrap();

        let mut socket = server
            .get_websocket(&format!("/ws/{}", task_id))
            .await
            .into_websocket()
            .await;

        let mut messages = Vec::new();
        loop {
            let message: ProgressMessage = socket.receive_json().await;
            let terminal = message.is_terminal();
            messages.push(message);
            if terminal {
                break;
            }
        }

        assert_eq!(messages[0].kind(), "connection_established");
        assert_progress_monotonic(&messages);
        assert_single_terminal_last(&messages);
        assert_eq!(messages.last().unwrap().kind(), "completed");
    }

    #[tokio::test]
    async fn test_late_socket_gets_terminal_snapshot() {
        let manager = rule_based();
        let server = ws_server(manager.clone());
        let task_id = manager.submit(ClaimFixtures::batch(2)).await.unwrap();
        manager.wait_for_completion(task_id).await.unwrap();

        let mut socket = server
            .get_websocket(&format!("/ws/{}", task_id))
            .await
            .into_websocket()
            .await;

        let first: ProgressMessage = socket.receive_json().await;
        let second: ProgressMessage = socket.receive_json().await;
        assert_eq!(first.kind(), "connection_established");
        assert_eq!(second.kind(), "completed");
        assert_eq!(second.percent(), Some(100));
    }

    #[tokio::test]
    async fn test_socket_for_unknown_task_is_not_found() {
        let server = ws_server(rule_based());

        server
            .get_websocket(&format!("/ws/{}", TaskId::new()))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
