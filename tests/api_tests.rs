// tests/api_tests.rs

mod common;

use common::{SURVEY_ID, spawn_app, test_app};
use serde_json::{Value, json};

/// Starts a session over HTTP and returns `(session_id, participant_id)`.
async fn start(client: &reqwest::Client, address: &str) -> (String, String) {
    let response = client
        .post(format!("{}/api/survey/{}/start", address, SURVEY_ID))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);

    let body: Value = response.json().await.expect("Failed to parse start json");
    (
        body["sessionId"].as_str().unwrap().to_string(),
        body["participantId"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn unknown_route_404_without_network() {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    let app = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/nothing/here")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn public_survey_lists_questions_in_order() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let body: Value = client
        .get(format!("{}/api/survey/{}", address, SURVEY_ID))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse survey json");

    assert_eq!(body["title"], "Product Feedback");
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 3);
    assert_eq!(questions[0]["position"], 0);
    assert_eq!(questions[2]["text"], "Would you recommend it?");
    // Scoring guidelines stay server-side.
    assert!(questions[0].get("qualityGuidelines").is_none());

    let missing = client
        .get(format!("{}/api/survey/{}", address, "retired-survey"))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn start_empty_survey_is_unprocessable() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/survey/{}/start", address, common::EMPTY_SURVEY_ID))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
async fn session_flow_over_http() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (sid, pid) = start(&client, &address).await;
    let session_url = format!("{}/api/survey/response/{}", address, sid);

    // 1. Answer (action defaults to answer)
    let answered: Value = client
        .post(&session_url)
        .json(&json!({ "participantId": pid, "answer": "Great tool" }))
        .send()
        .await
        .expect("Answer failed")
        .json()
        .await
        .unwrap();
    assert_eq!(answered["action"], "answered");
    assert_eq!(answered["qualityScore"], 4);
    assert_eq!(answered["improvementHint"], "Add a concrete example.");
    assert_eq!(answered["sessionData"]["currentQuestionIndex"], 1);
    assert_eq!(answered["sessionData"]["completedQuestions"], json!([0]));
    assert_eq!(answered["progress"]["current"], 2);

    // 2. Skip
    let skipped: Value = client
        .post(&session_url)
        .json(&json!({ "participantId": pid, "action": "skip" }))
        .send()
        .await
        .expect("Skip failed")
        .json()
        .await
        .unwrap();
    assert_eq!(skipped["action"], "skipped");
    assert_eq!(skipped["sessionData"]["skippedQuestions"], json!([1]));
    assert_eq!(skipped["nextQuestion"]["position"], 2);

    // 3. Navigate back
    let navigated: Value = client
        .post(&session_url)
        .json(&json!({ "participantId": pid, "action": "navigate", "targetQuestionIndex": 0 }))
        .send()
        .await
        .expect("Navigate failed")
        .json()
        .await
        .unwrap();
    assert_eq!(navigated["action"], "navigated");
    assert_eq!(navigated["previousAnswer"], "Great tool");

    // 4. Resume view
    let snapshot: Value = client
        .get(&session_url)
        .query(&[("participantId", pid.as_str())])
        .send()
        .await
        .expect("Snapshot failed")
        .json()
        .await
        .unwrap();
    assert_eq!(snapshot["sessionData"]["currentQuestionIndex"], 0);
    assert_eq!(snapshot["currentQuestion"]["position"], 0);
    assert!(snapshot["completedAt"].is_null());

    // 5. Submit, then submit again
    let submit_url = format!("{}/submit", session_url);
    let submitted = client
        .post(&submit_url)
        .json(&json!({ "participantId": pid }))
        .send()
        .await
        .expect("Submit failed");
    assert_eq!(submitted.status().as_u16(), 200);
    let submitted: Value = submitted.json().await.unwrap();
    assert_eq!(submitted["completed"], true);
    assert_eq!(submitted["answerCount"], 1);

    let again = client
        .post(&submit_url)
        .json(&json!({ "participantId": pid }))
        .send()
        .await
        .expect("Second submit failed");
    assert_eq!(again.status().as_u16(), 409);
    let err: Value = again.json().await.unwrap();
    assert_eq!(err["error"], "Survey has already been submitted");
}

#[tokio::test]
async fn session_errors_map_to_status_codes() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (sid, pid) = start(&client, &address).await;
    let session_url = format!("{}/api/survey/response/{}", address, sid);

    let wrong_participant = client
        .post(&session_url)
        .json(&json!({ "participantId": "0000000000000000", "answer": "hi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_participant.status().as_u16(), 401);

    let unknown_session = client
        .post(format!("{}/api/survey/response/{}", address, "missing"))
        .json(&json!({ "participantId": pid, "answer": "hi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown_session.status().as_u16(), 404);

    let empty_answer = client
        .post(&session_url)
        .json(&json!({ "participantId": pid, "answer": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(empty_answer.status().as_u16(), 400);

    let navigate_without_target = client
        .post(&session_url)
        .json(&json!({ "participantId": pid, "action": "navigate" }))
        .send()
        .await
        .unwrap();
    assert_eq!(navigate_without_target.status().as_u16(), 400);

    let out_of_range = client
        .post(&session_url)
        .json(&json!({ "participantId": pid, "action": "navigate", "targetQuestionIndex": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(out_of_range.status().as_u16(), 400);

    let submit_without_answers = client
        .post(format!("{}/submit", session_url))
        .json(&json!({ "participantId": pid }))
        .send()
        .await
        .unwrap();
    assert_eq!(submit_without_answers.status().as_u16(), 400);
}

#[tokio::test]
async fn message_endpoint_dispatches_intents() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (sid, pid) = start(&client, &address).await;
    let message_url = format!("{}/api/survey/response/{}/message", address, sid);

    let skipped: Value = client
        .post(&message_url)
        .json(&json!({ "participantId": pid, "message": "skip" }))
        .send()
        .await
        .expect("Message failed")
        .json()
        .await
        .unwrap();
    assert_eq!(skipped["intent"], "SKIP_QUESTION");
    assert_eq!(skipped["kind"], "skipped");
    assert_eq!(skipped["result"]["sessionData"]["currentQuestionIndex"], 1);

    let help: Value = client
        .post(&message_url)
        .json(&json!({ "participantId": pid, "message": "help" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(help["kind"], "help");
    assert_eq!(help["result"]["actions"].as_array().unwrap().len(), 6);
    assert_eq!(help["result"]["currentQuestion"]["position"], 1);
}

#[tokio::test]
async fn intent_endpoint_classifies_without_a_session() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("{}/api/survey/intent", address))
        .json(&json!({
            "message": "go to question 2",
            "context": { "currentQuestionIndex": 0, "totalQuestions": 3, "isCompleted": false }
        }))
        .send()
        .await
        .expect("Classify failed")
        .json()
        .await
        .unwrap();

    assert_eq!(body["intent"], "NAVIGATE_TO_QUESTION");
    assert_eq!(body["parameters"]["question_number"], 2);

    let empty = client
        .post(format!("{}/api/survey/intent", address))
        .json(&json!({ "message": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(empty.status().as_u16(), 400);
}
