mod common;

use axum::http::{Method, StatusCode};
use chrono::Duration;
use common::{test_app, CAREER};
use fluentpath::clock::Clock;
use serde_json::json;

#[tokio::test]
async fn careers_are_listed() {
    let app = test_app().await;
    let token = app.register("dana@example.com").await;

    let resp = app.get("/api/careers", &token).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body.as_array().unwrap().len(), 1);
    assert_eq!(resp.body[0]["slug"], CAREER);

    let resp = app.get("/api/careers/no-such-career/modules", &token).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body["error"], "NOT_FOUND");
    assert_eq!(resp.body["message"], "Career not found.");
}

#[tokio::test]
async fn fresh_student_sees_locked_modules_and_zero_progress() {
    let app = test_app().await;
    let token = app.register("erin@example.com").await;

    let modules = app.modules(&token).await;
    let titles: Vec<&str> = modules.iter().map(|m| m["title"].as_str().unwrap()).collect();
    assert_eq!(titles, ["Foundations", "Meetings", "Coming soon"]);

    let foundations = &modules[0];
    assert_eq!(foundations["total_lessons"], 2, "drafts are not counted");
    assert_eq!(foundations["completed_lessons"], 0);
    assert_eq!(foundations["completion_percentage"], 0);
    assert_eq!(foundations["is_unlocked"], true);

    let meetings = &modules[1];
    assert_eq!(meetings["prerequisites"], json!([foundations["id"]]));
    assert_eq!(meetings["is_unlocked"], false);

    let empty = &modules[2];
    assert_eq!(empty["total_lessons"], 0);
    assert_eq!(empty["completion_percentage"], 0);
    assert_eq!(empty["is_unlocked"], true);
}

#[tokio::test]
async fn completing_prerequisites_unlocks_the_next_module() {
    let app = test_app().await;
    let token = app.register("finn@example.com").await;
    let foundations = app.module_id(&token, "Foundations").await;
    let lessons = app.lesson_ids(&token, foundations).await;
    assert_eq!(lessons.len(), 2);

    let resp = app.complete(&token, foundations, lessons[0]).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["progress"]["lesson_id"], lessons[0]);
    assert_eq!(resp.body["module"]["completion_percentage"], 50);

    let modules = app.modules(&token).await;
    assert_eq!(modules[0]["completion_percentage"], 50);
    assert_eq!(modules[1]["is_unlocked"], false);

    app.complete(&token, foundations, lessons[1]).await;

    let modules = app.modules(&token).await;
    assert_eq!(modules[0]["completion_percentage"], 100);
    assert_eq!(modules[1]["is_unlocked"], true);

    let detail = app
        .get(&format!("/api/careers/{CAREER}/modules/{foundations}"), &token)
        .await;
    assert_eq!(detail.body["completion_percentage"], 100);
    assert!(detail.body["lessons"]
        .as_array()
        .unwrap()
        .iter()
        .all(|l| l["completed"] == true));
}

#[tokio::test]
async fn module_listing_is_cached_until_ttl_expires() {
    let app = test_app().await;
    let token = app.register("gail@example.com").await;
    let foundations = app.module_id(&token, "Foundations").await;
    let lessons = app.lesson_ids(&token, foundations).await;
    let me = app.get("/api/auth/me", &token).await;
    let user_id = me.body["id"].as_i64().unwrap();

    // written behind the API's back, so nothing invalidates the cache
    app.db
        .upsert_progress(user_id, lessons[0], app.clock.now(), 60, None)
        .await
        .unwrap();

    let modules = app.modules(&token).await;
    assert_eq!(modules[0]["completed_lessons"], 0);

    app.clock.advance(Duration::seconds(301));
    let modules = app.modules(&token).await;
    assert_eq!(modules[0]["completed_lessons"], 1);
}

#[tokio::test]
async fn repeated_completion_keeps_one_record() {
    let app = test_app().await;
    let token = app.register("hana@example.com").await;
    let foundations = app.module_id(&token, "Foundations").await;
    let lessons = app.lesson_ids(&token, foundations).await;

    app.complete(&token, foundations, lessons[0]).await;
    app.clock.advance(Duration::hours(1));
    let resp = app
        .call(
            Method::POST,
            &format!("/api/careers/{CAREER}/modules/{foundations}/lessons/{}/complete", lessons[0]),
            Some(&token),
            Some(json!({ "time_spent_seconds": 300, "score": 90 })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["progress"]["time_spent_seconds"], 300);
    assert_eq!(resp.body["progress"]["score"], 90);

    let overview = app.get("/api/progress", &token).await;
    assert_eq!(overview.body["lessons_completed"], 1);
    assert_eq!(overview.body["time_spent_seconds"], 300);
}

#[tokio::test]
async fn completion_input_is_validated() {
    let app = test_app().await;
    let token = app.register("ivan@example.com").await;
    let foundations = app.module_id(&token, "Foundations").await;
    let lessons = app.lesson_ids(&token, foundations).await;
    let uri = format!(
        "/api/careers/{CAREER}/modules/{foundations}/lessons/{}/complete",
        lessons[0]
    );

    for body in [
        json!({ "time_spent_seconds": -1 }),
        json!({ "time_spent_seconds": 10, "score": 101 }),
    ] {
        let resp = app.call(Method::POST, &uri, Some(&token), Some(body)).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    }

    let overview = app.get("/api/progress", &token).await;
    assert_eq!(overview.body["lessons_completed"], 0);
}

#[tokio::test]
async fn lesson_detail_has_assets_and_neighbours() {
    let app = test_app().await;
    let token = app.register("jade@example.com").await;
    let foundations = app.module_id(&token, "Foundations").await;
    let meetings = app.module_id(&token, "Meetings").await;
    let lessons = app.lesson_ids(&token, foundations).await;

    let resp = app
        .get(
            &format!("/api/careers/{CAREER}/modules/{foundations}/lessons/{}", lessons[0]),
            &token,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["title"], "Greetings");
    assert_eq!(resp.body["assets"][0]["media_type"], "audio");
    assert_eq!(resp.body["assets"][0]["duration_seconds"], 30);
    assert_eq!(resp.body["previous_lesson_id"], json!(null));
    assert_eq!(resp.body["next_lesson_id"], lessons[1]);
    assert_eq!(resp.body["progress"], json!(null));

    // lessons of another module are not reachable through this one
    let resp = app
        .get(
            &format!("/api/careers/{CAREER}/modules/{meetings}/lessons/{}", lessons[0]),
            &token,
        )
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    // the draft was inserted right after the second published lesson
    let draft = lessons[1] + 1;
    let resp = app
        .get(
            &format!("/api/careers/{CAREER}/modules/{foundations}/lessons/{draft}"),
            &token,
        )
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body["message"], "Lesson not found.");

    let resp = app.complete(&token, foundations, draft).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

async fn foundations_check(app: &common::TestApp, token: &str) -> (i64, Vec<i64>) {
    let foundations = app.module_id(token, "Foundations").await;
    let resp = app
        .get(&format!("/api/modules/{foundations}/assessments"), token)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body[0]["passing_score"], 70, "unset threshold defaults to 70");
    let id = resp.body[0]["id"].as_i64().unwrap();

    let resp = app.get(&format!("/api/assessments/{id}"), token).await;
    let questions = resp.body["questions"].as_array().unwrap();
    let ids = questions.iter().map(|q| q["id"].as_i64().unwrap()).collect();
    (id, ids)
}

#[tokio::test]
async fn assessment_questions_hide_answers() {
    let app = test_app().await;
    let token = app.register("kim@example.com").await;
    let (id, _) = foundations_check(&app, &token).await;

    let resp = app.get(&format!("/api/assessments/{id}"), &token).await;
    let questions = resp.body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 4);
    assert_eq!(questions[0]["options"], json!(["go", "went", "gone"]));
    assert_eq!(questions[1]["kind"], "text");
    assert!(questions.iter().all(|q| q.get("correct_answer").is_none()));

    let resp = app.get("/api/assessments/9999", &token).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_submission_is_rejected_without_a_result() {
    let app = test_app().await;
    let token = app.register("lee@example.com").await;
    let (id, _) = foundations_check(&app, &token).await;

    let resp = app
        .call(
            Method::POST,
            &format!("/api/assessments/{id}/submit"),
            Some(&token),
            Some(json!({ "answers": [] })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["message"], "Submit at least one answer.");

    let results = app.get(&format!("/api/assessments/{id}/results"), &token).await;
    assert_eq!(results.body, json!([]));
}

#[tokio::test]
async fn submission_is_scored_and_recorded() {
    let app = test_app().await;
    let token = app.register("max@example.com").await;
    let (id, q) = foundations_check(&app, &token).await;

    let resp = app
        .call(
            Method::POST,
            &format!("/api/assessments/{id}/submit"),
            Some(&token),
            Some(json!({
                "answers": [
                    { "question_id": q[0], "selected_answer": "went" },
                    { "question_id": q[1], "text_answer": "I have been working here for two years" },
                    { "question_id": q[2], "selected_answer": "b", "text_answer": "a" },
                    { "question_id": q[3], "selected_answer": "in" },
                ]
            })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.body["score"], 75);
    assert_eq!(resp.body["passed"], true);
    assert_eq!(resp.body["passing_score"], 70);
    assert_eq!(resp.body["correct_count"], 3);
    assert_eq!(resp.body["answered_count"], 4);
    assert_eq!(resp.body["questions"][3], json!({ "question_id": q[3], "correct": false }));

    // unknown questions count against the score
    let resp = app
        .call(
            Method::POST,
            &format!("/api/assessments/{id}/submit"),
            Some(&token),
            Some(json!({
                "answers": [
                    { "question_id": q[0], "selected_answer": "went" },
                    { "question_id": 9999, "selected_answer": "went" },
                ]
            })),
        )
        .await;
    assert_eq!(resp.body["score"], 50);
    assert_eq!(resp.body["passed"], false);

    let results = app.get(&format!("/api/assessments/{id}/results"), &token).await;
    let results = results.body.as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["score"], 50, "newest first");
    assert_eq!(results[1]["score"], 75);
}

#[tokio::test]
async fn custom_passing_score_is_respected() {
    let app = test_app().await;
    let token = app.register("nia@example.com").await;
    let meetings = app.module_id(&token, "Meetings").await;

    let resp = app
        .get(&format!("/api/modules/{meetings}/assessments"), &token)
        .await;
    assert_eq!(resp.body[0]["passing_score"], 80);
    let id = resp.body[0]["id"].as_i64().unwrap();
    let detail = app.get(&format!("/api/assessments/{id}"), &token).await;
    let q = detail.body["questions"][0]["id"].as_i64().unwrap();

    let resp = app
        .call(
            Method::POST,
            &format!("/api/assessments/{id}/submit"),
            Some(&token),
            Some(json!({ "answers": [{ "question_id": q, "selected_answer": "Hey" }] })),
        )
        .await;
    assert_eq!(resp.body["score"], 0);
    assert_eq!(resp.body["passed"], false);
    assert_eq!(resp.body["passing_score"], 80);
}

#[tokio::test]
async fn overview_combines_progress_assessments_and_streaks() {
    let app = test_app().await;
    let token = app.register("omar@example.com").await;
    let foundations = app.module_id(&token, "Foundations").await;
    let meetings = app.module_id(&token, "Meetings").await;
    let lessons = app.lesson_ids(&token, foundations).await;

    let empty = app.get("/api/progress", &token).await;
    assert_eq!(empty.body["current_streak"], 0);
    assert_eq!(empty.body["longest_streak"], 0);
    assert_eq!(empty.body["average_score"], json!(null));

    for lesson in &lessons {
        app.complete(&token, foundations, *lesson).await;
    }
    let (id, q) = foundations_check(&app, &token).await;
    app.call(
        Method::POST,
        &format!("/api/assessments/{id}/submit"),
        Some(&token),
        Some(json!({ "answers": [
            { "question_id": q[0], "selected_answer": "went" },
            { "question_id": q[2], "selected_answer": "a" },
        ] })),
    )
    .await;

    let overview = app.get("/api/progress", &token).await;
    assert_eq!(overview.status, StatusCode::OK);
    assert_eq!(overview.body["lessons_completed"], 2);
    assert_eq!(overview.body["modules_completed"], 1);
    assert_eq!(overview.body["time_spent_seconds"], 240);
    assert_eq!(overview.body["assessments_taken"], 1);
    assert_eq!(overview.body["assessments_passed"], 0);
    assert_eq!(overview.body["average_score"], 50);
    assert_eq!(overview.body["current_streak"], 1);
    assert_eq!(overview.body["longest_streak"], 1);

    app.clock.advance(Duration::days(1));
    let meeting_lessons = app.lesson_ids(&token, meetings).await;
    app.complete(&token, meetings, meeting_lessons[0]).await;

    let overview = app.get("/api/progress", &token).await;
    assert_eq!(overview.body["modules_completed"], 2);
    assert_eq!(overview.body["current_streak"], 2);
    assert_eq!(overview.body["longest_streak"], 2);

    // a day without activity resets the current streak only
    app.clock.advance(Duration::days(1));
    let overview = app.get("/api/progress", &token).await;
    assert_eq!(overview.body["current_streak"], 0);
    assert_eq!(overview.body["longest_streak"], 2);
}

#[tokio::test]
async fn module_progress_handles_empty_modules() {
    let app = test_app().await;
    let token = app.register("pia@example.com").await;
    let foundations = app.module_id(&token, "Foundations").await;
    let empty = app.module_id(&token, "Coming soon").await;
    let lessons = app.lesson_ids(&token, foundations).await;
    app.complete(&token, foundations, lessons[1]).await;

    let resp = app.get(&format!("/api/progress/{foundations}"), &token).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["total_lessons"], 2);
    assert_eq!(resp.body["completed_lessons"], 1);
    assert_eq!(resp.body["completion_percentage"], 50);
    assert_eq!(resp.body["time_spent_seconds"], 120);

    let resp = app.get(&format!("/api/progress/{empty}"), &token).await;
    assert_eq!(resp.body["total_lessons"], 0);
    assert_eq!(resp.body["completion_percentage"], 0);

    let resp = app.get("/api/progress/9999", &token).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}
