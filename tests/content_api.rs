#[macro_use]
mod common;

use actix_web::test;
use common::{bearer, file, state_with, test_state};
use vidtube_server::Settings;
use serde_json::{json, Value};

/// Publishes a video as `$token`; evaluates to the created video JSON.
macro_rules! publish {
    ($app:expr, $token:expr, $title:expr) => {{
        let resp = test::TestRequest::post()
            .uri("/api/v1/videos")
            .insert_header(bearer(&$token))
            .set_json(json!({
                "title": $title,
                "description": "a video",
                "videoFile": file("clip.mp4", "video/mp4"),
                "thumbnail": file("thumb.png", "image/png")
            }))
            .send_request(&$app)
            .await;
        assert_eq!(resp.status(), 201);
        let body: Value = test::read_body_json(resp).await;
        body["data"].clone()
    }};
}

#[actix_web::test]
async fn test_tweet_ownership() {
    let (state, _media) = test_state();
    let app = test_app!(state);
    let (ana_id, ana, _) = signed_in!(app, "ana");
    let (_, bob, _) = signed_in!(app, "bob");

    let resp = test::TestRequest::post()
        .uri("/api/v1/tweets")
        .insert_header(bearer(&ana))
        .set_json(json!({ "content": "first!" }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    let tweet_id = body["data"]["id"].as_str().unwrap().to_string();

    let resp = test::TestRequest::patch()
        .uri(&format!("/api/v1/tweets/{}", tweet_id))
        .insert_header(bearer(&bob))
        .set_json(json!({ "content": "hijacked" }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 403);

    let resp = test::TestRequest::delete()
        .uri(&format!("/api/v1/tweets/{}", tweet_id))
        .insert_header(bearer(&bob))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 403);

    let resp = test::TestRequest::patch()
        .uri(&format!("/api/v1/tweets/{}", tweet_id))
        .insert_header(bearer(&ana))
        .set_json(json!({ "content": "edited" }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 200);

    let resp = test::TestRequest::get()
        .uri(&format!("/api/v1/tweets/user/{}", ana_id))
        .insert_header(bearer(&bob))
        .send_request(&app)
        .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"][0]["content"], "edited");

    let resp = test::TestRequest::delete()
        .uri(&format!("/api/v1/tweets/{}", tweet_id))
        .insert_header(bearer(&ana))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn test_comment_ownership_and_listing() {
    let (state, _media) = test_state();
    let app = test_app!(state);
    let (_, ana, _) = signed_in!(app, "ana");
    let (_, bob, _) = signed_in!(app, "bob");
    let video = publish!(app, ana, "Intro");
    let video_id = video["id"].as_str().unwrap().to_string();

    let resp = test::TestRequest::post()
        .uri(&format!("/api/v1/comments/{}", video_id))
        .insert_header(bearer(&bob))
        .set_json(json!({ "content": "nice" }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    let comment_id = body["data"]["id"].as_str().unwrap().to_string();

    let resp = test::TestRequest::patch()
        .uri(&format!("/api/v1/comments/c/{}", comment_id))
        .insert_header(bearer(&ana))
        .set_json(json!({ "content": "edited by ana" }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 403);

    let resp = test::TestRequest::get()
        .uri(&format!("/api/v1/comments/{}?page=1&limit=5", video_id))
        .insert_header(bearer(&ana))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["totalDocs"], 1);
    assert_eq!(body["data"]["limit"], 5);
    assert_eq!(body["data"]["docs"][0]["content"], "nice");
    assert_eq!(body["data"]["docs"][0]["commentedBy"]["username"], "bob");

    let resp = test::TestRequest::delete()
        .uri(&format!("/api/v1/comments/c/{}", comment_id))
        .insert_header(bearer(&bob))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn test_comment_on_missing_video() {
    let (state, _media) = test_state();
    let app = test_app!(state);
    let (_, ana, _) = signed_in!(app, "ana");

    let resp = test::TestRequest::post()
        .uri(&format!("/api/v1/comments/{}", uuid::Uuid::new_v4()))
        .insert_header(bearer(&ana))
        .set_json(json!({ "content": "hello?" }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 404);

    let resp = test::TestRequest::post()
        .uri("/api/v1/comments/not-a-uuid")
        .insert_header(bearer(&ana))
        .set_json(json!({ "content": "hello?" }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_video_lifecycle() {
    let (state, media) = test_state();
    let app = test_app!(state);
    let (_, ana, _) = signed_in!(app, "ana");
    let (_, bob, _) = signed_in!(app, "bob");

    let video = publish!(app, ana, "Intro");
    let video_id = video["id"].as_str().unwrap().to_string();
    assert_eq!(video["duration"], 42.0);
    assert_eq!(video["isPublished"], true);
    assert!(video.get("videoPublicId").is_none());

    // toggling publish is owner-only and flips state
    let resp = test::TestRequest::patch()
        .uri(&format!("/api/v1/videos/toggle/publish/{}", video_id))
        .insert_header(bearer(&bob))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 403);

    for expected in [false, true] {
        let resp = test::TestRequest::patch()
            .uri(&format!("/api/v1/videos/toggle/publish/{}", video_id))
            .insert_header(bearer(&ana))
            .send_request(&app)
            .await;
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["isPublished"], expected);
    }

    let resp = test::TestRequest::patch()
        .uri(&format!("/api/v1/videos/{}", video_id))
        .insert_header(bearer(&bob))
        .set_json(json!({ "title": "Mine now" }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 403);

    let resp = test::TestRequest::patch()
        .uri(&format!("/api/v1/videos/{}", video_id))
        .insert_header(bearer(&ana))
        .set_json(json!({ "title": "Intro v2" }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["title"], "Intro v2");
    assert_eq!(body["data"]["description"], "a video");

    let resp = test::TestRequest::delete()
        .uri(&format!("/api/v1/videos/{}", video_id))
        .insert_header(bearer(&bob))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 403);
    assert!(media.deleted().is_empty());

    let resp = test::TestRequest::delete()
        .uri(&format!("/api/v1/videos/{}", video_id))
        .insert_header(bearer(&ana))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 200);
    assert_eq!(media.deleted().len(), 2);

    let resp = test::TestRequest::get()
        .uri(&format!("/api/v1/videos/{}", video_id))
        .insert_header(bearer(&ana))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_viewing_counts_and_records_history() {
    let (state, _media) = test_state();
    let app = test_app!(state);
    let (_, ana, _) = signed_in!(app, "ana");
    let (_, bob, _) = signed_in!(app, "bob");
    let video = publish!(app, ana, "Intro");
    let video_id = video["id"].as_str().unwrap().to_string();

    for views in 1..=2 {
        let resp = test::TestRequest::get()
            .uri(&format!("/api/v1/videos/{}", video_id))
            .insert_header(bearer(&bob))
            .send_request(&app)
            .await;
        assert_eq!(resp.status(), 200);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["views"], views);
        assert_eq!(body["data"]["owner"]["username"], "ana");
    }

    let resp = test::TestRequest::get()
        .uri("/api/v1/users/history")
        .insert_header(bearer(&bob))
        .send_request(&app)
        .await;
    let body: Value = test::read_body_json(resp).await;
    let history = body["data"].as_array().unwrap();
    assert!(!history.is_empty());
    assert_eq!(history[0]["id"], video_id.as_str());
}

#[actix_web::test]
async fn test_video_listing_paginates() {
    let (state, _media) = test_state();
    let app = test_app!(state);
    let (ana_id, ana, _) = signed_in!(app, "ana");
    let (_, bob, _) = signed_in!(app, "bob");
    for title in ["one", "two", "three"] {
        publish!(app, ana, title);
    }
    publish!(app, bob, "bob's");

    let resp = test::TestRequest::get()
        .uri(&format!("/api/v1/videos?page=2&limit=2&userId={}", ana_id))
        .insert_header(bearer(&bob))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    let page = &body["data"];
    assert_eq!(page["totalDocs"], 3);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["page"], 2);
    assert_eq!(page["hasPrevPage"], true);
    assert_eq!(page["hasNextPage"], false);
    assert_eq!(page["docs"].as_array().unwrap().len(), 1);

    let resp = test::TestRequest::get()
        .uri("/api/v1/videos?userId=bogus")
        .insert_header(bearer(&bob))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_like_toggles() {
    let (state, _media) = test_state();
    let app = test_app!(state);
    let (_, ana, _) = signed_in!(app, "ana");
    let (_, bob, _) = signed_in!(app, "bob");
    let video = publish!(app, ana, "Intro");
    let video_id = video["id"].as_str().unwrap().to_string();

    // ana's like does not count as bob's
    let resp = test::TestRequest::post()
        .uri(&format!("/api/v1/likes/toggle/video/{}", video_id))
        .insert_header(bearer(&ana))
        .send_request(&app)
        .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["isLiked"], true);

    for expected in [true, false, true] {
        let resp = test::TestRequest::post()
            .uri(&format!("/api/v1/likes/toggle/video/{}", video_id))
            .insert_header(bearer(&bob))
            .send_request(&app)
            .await;
        assert_eq!(resp.status(), 200);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["isLiked"], expected);
    }

    let resp = test::TestRequest::get()
        .uri("/api/v1/likes/videos")
        .insert_header(bearer(&bob))
        .send_request(&app)
        .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"][0]["id"], video_id.as_str());

    let resp = test::TestRequest::post()
        .uri(&format!("/api/v1/likes/toggle/tweet/{}", uuid::Uuid::new_v4()))
        .insert_header(bearer(&bob))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_subscriptions_and_channel_profile() {
    let (state, _media) = test_state();
    let app = test_app!(state);
    let (ana_id, ana, _) = signed_in!(app, "ana");
    let (bob_id, bob, _) = signed_in!(app, "bob");

    let resp = test::TestRequest::post()
        .uri(&format!("/api/v1/subscriptions/channel/{}", ana_id))
        .insert_header(bearer(&ana))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 400);

    let resp = test::TestRequest::post()
        .uri(&format!("/api/v1/subscriptions/channel/{}", ana_id))
        .insert_header(bearer(&bob))
        .send_request(&app)
        .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["subscribed"], true);

    let resp = test::TestRequest::get()
        .uri("/api/v1/users/channel/ana")
        .insert_header(bearer(&bob))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["subscribersCount"], 1);
    assert_eq!(body["data"]["channelsSubscribedToCount"], 0);
    assert_eq!(body["data"]["isSubscribed"], true);

    let resp = test::TestRequest::get()
        .uri(&format!("/api/v1/subscriptions/channel/{}", ana_id))
        .insert_header(bearer(&ana))
        .send_request(&app)
        .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"][0]["id"], bob_id.as_str());

    let resp = test::TestRequest::get()
        .uri(&format!("/api/v1/subscriptions/subscriber/{}", bob_id))
        .insert_header(bearer(&ana))
        .send_request(&app)
        .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"][0]["username"], "ana");

    let resp = test::TestRequest::post()
        .uri(&format!("/api/v1/subscriptions/channel/{}", ana_id))
        .insert_header(bearer(&bob))
        .send_request(&app)
        .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["subscribed"], false);
}

#[actix_web::test]
async fn test_profile_updates() {
    let (state, media) = test_state();
    let app = test_app!(state);
    let (_, ana, _) = signed_in!(app, "ana");
    signed_in!(app, "bob");

    let resp = test::TestRequest::patch()
        .uri("/api/v1/users/update-account")
        .insert_header(bearer(&ana))
        .set_json(json!({ "email": "bob@example.com" }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 409);

    let resp = test::TestRequest::patch()
        .uri("/api/v1/users/update-account")
        .insert_header(bearer(&ana))
        .set_json(json!({ "fullName": "Ana Lima" }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["fullName"], "Ana Lima");

    let resp = test::TestRequest::patch()
        .uri("/api/v1/users/avatar")
        .insert_header(bearer(&ana))
        .set_json(json!({ "avatar": file("new.png", "image/png") }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_ne!(body["data"]["avatar"]["publicId"], "ana/0");
    assert_eq!(media.deleted(), vec!["ana/0".to_string()]);

    let resp = test::TestRequest::patch()
        .uri("/api/v1/users/cover-image")
        .insert_header(bearer(&ana))
        .set_json(json!({}))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 400);
}

fn large_file(name: &str, content_type: &str, bytes: usize) -> Value {
    json!({ "fileName": name, "contentType": content_type, "data": "A".repeat(bytes) })
}

#[actix_web::test]
async fn test_publish_accepts_uploads_over_two_mebibytes() {
    let (state, _media) = test_state();
    let app = test_app!(state);
    let (_, ana, _) = signed_in!(app, "ana");

    let resp = test::TestRequest::post()
        .uri("/api/v1/videos")
        .insert_header(bearer(&ana))
        .set_json(json!({
            "title": "Long take",
            "description": "three mebibytes of base64",
            "videoFile": large_file("long.mp4", "video/mp4", 3 * 1024 * 1024),
            "thumbnail": file("thumb.png", "image/png")
        }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["title"], "Long take");
}

#[actix_web::test]
async fn test_body_over_configured_limit_is_rejected() {
    let mut config = Settings::new_for_test().unwrap();
    config.server.max_body_bytes = 64 * 1024;
    let (state, media) = state_with(config);
    let app = test_app!(state);
    let (_, ana, _) = signed_in!(app, "ana");

    let resp = test::TestRequest::post()
        .uri("/api/v1/videos")
        .insert_header(bearer(&ana))
        .set_json(json!({
            "title": "Too big",
            "videoFile": large_file("big.mp4", "video/mp4", 128 * 1024),
            "thumbnail": file("thumb.png", "image/png")
        }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 413);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["status"], 413);
    assert!(media.deleted().is_empty());
}

#[actix_web::test]
async fn test_unpublished_video_hidden_from_comments_and_likes() {
    let (state, _media) = test_state();
    let app = test_app!(state);
    let (_, ana, _) = signed_in!(app, "ana");
    let (_, bob, _) = signed_in!(app, "bob");

    let video = publish!(app, ana, "Draft");
    let video_id = video["id"].as_str().unwrap().to_string();

    let resp = test::TestRequest::post()
        .uri(&format!("/api/v1/comments/{}", video_id))
        .insert_header(bearer(&bob))
        .set_json(json!({ "content": "early" }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    let comment_id = body["data"]["id"].as_str().unwrap().to_string();

    let resp = test::TestRequest::patch()
        .uri(&format!("/api/v1/videos/toggle/publish/{}", video_id))
        .insert_header(bearer(&ana))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 200);

    let hidden = [
        test::TestRequest::get().uri(&format!("/api/v1/comments/{}", video_id)),
        test::TestRequest::post()
            .uri(&format!("/api/v1/comments/{}", video_id))
            .set_json(json!({ "content": "still here?" })),
        test::TestRequest::post().uri(&format!("/api/v1/likes/toggle/video/{}", video_id)),
        test::TestRequest::post().uri(&format!("/api/v1/likes/toggle/comment/{}", comment_id)),
    ];
    for req in hidden {
        let resp = req.insert_header(bearer(&bob)).send_request(&app).await;
        assert_eq!(resp.status(), 404);
    }

    // the owner still reaches everything
    let resp = test::TestRequest::get()
        .uri(&format!("/api/v1/comments/{}", video_id))
        .insert_header(bearer(&ana))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["docs"].as_array().unwrap().len(), 1);

    let resp = test::TestRequest::post()
        .uri(&format!("/api/v1/likes/toggle/video/{}", video_id))
        .insert_header(bearer(&ana))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn test_account_email_cannot_take_another_username() {
    let (state, _media) = test_state();
    let app = test_app!(state);
    let (_, ana, _) = signed_in!(app, "ana");
    signed_in!(app, "carl@home");

    let resp = test::TestRequest::patch()
        .uri("/api/v1/users/update-account")
        .insert_header(bearer(&ana))
        .set_json(json!({ "email": "carl@home" }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 409);

    let resp = test::TestRequest::post()
        .uri("/api/v1/users/login")
        .set_json(json!({ "username": "carl@home", "password": "password123" }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["user"]["username"], "carl@home");
}
