use crate::e2e::helpers;

use helpers::{TestContext, DEFAULT_PASSWORD, USERS};
use hyper::StatusCode;
use serde_json::json;
use test_context::test_context;

fn refresh_body(token: &str) -> serde_json::Value {
    json!({ "refreshToken": token })
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_login_and_set_token_cookies(ctx: &TestContext) {
    ctx.fixtures.create_user("alice", DEFAULT_PASSWORD).await.unwrap();

    let response = ctx
        .client
        .post(
            &format!("{USERS}/login"),
            &json!({ "username": "alice", "password": DEFAULT_PASSWORD }),
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);

    let body = response.body.as_ref().unwrap();
    assert_eq!(body["statusCode"], 200);
    assert_eq!(body["message"], "User logged in successfully!");

    let data = response.data();
    let access = data["accessToken"].as_str().unwrap();
    let refresh = data["refreshToken"].as_str().unwrap();
    assert_ne!(access, refresh);
    assert_eq!(data["user"]["username"], "alice");
    assert!(data["user"].get("password").is_none());
    assert!(data["user"].get("refreshToken").is_none());

    for name in ["accessToken", "refreshToken"] {
        let cookie = response.cookie(name);
        assert!(cookie.has_attribute("httponly"), "{} is not HttpOnly", name);
        assert!(cookie.has_attribute("secure"), "{} is not Secure", name);
    }
    assert_eq!(response.cookie("accessToken").value, access);
    assert_eq!(response.cookie("refreshToken").value, refresh);

    // The session now holds the issued refresh token
    assert_eq!(
        ctx.fixtures.stored_refresh_token("alice").await.as_deref(),
        Some(refresh)
    );
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_login_by_email(ctx: &TestContext) {
    ctx.fixtures.create_user("bob", DEFAULT_PASSWORD).await.unwrap();

    let response = ctx
        .client
        .post(
            &format!("{USERS}/login"),
            &json!({ "email": "BOB@example.com", "password": DEFAULT_PASSWORD }),
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(response.data()["user"]["email"], "bob@example.com");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_invalid_login(ctx: &TestContext) {
    ctx.fixtures.create_user("carol", DEFAULT_PASSWORD).await.unwrap();
    let login = format!("{USERS}/login");

    let response = ctx
        .client
        .post(&login, &json!({ "username": "carol", "password": "wrong" }))
        .await
        .unwrap();
    response
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_error_message("Invalid user credentials!");
    assert!(response.cookies.is_empty());

    let response = ctx
        .client
        .post(&login, &json!({ "username": "nobody", "password": "x" }))
        .await
        .unwrap();
    response
        .assert_status(StatusCode::NOT_FOUND)
        .assert_error_message("User does not exist!");

    let response = ctx
        .client
        .post(&login, &json!({ "password": "x" }))
        .await
        .unwrap();
    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("Username or email is required!");

    // A failed login does not start a session
    assert_eq!(ctx.fixtures.stored_refresh_token("carol").await, None);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_rotate_refresh_token_and_reject_replay(ctx: &TestContext) {
    let session = ctx.signed_in_user("dave").await;
    let refresh_path = format!("{USERS}/refresh-token");

    // R1 -> R2
    let response = ctx
        .client
        .post(&refresh_path, &refresh_body(&session.refresh_token))
        .await
        .unwrap();
    response.assert_status(StatusCode::OK);
    assert_eq!(response.body.as_ref().unwrap()["message"], "Access token refreshed!");

    let rotated = response.data();
    let second_refresh = rotated["refreshToken"].as_str().unwrap().to_string();
    assert_ne!(second_refresh, session.refresh_token);
    assert_ne!(rotated["accessToken"].as_str().unwrap(), session.access_token);
    assert_eq!(response.cookie("refreshToken").value, second_refresh);
    assert_eq!(
        ctx.fixtures.stored_refresh_token("dave").await.as_deref(),
        Some(second_refresh.as_str())
    );

    // Replaying R1 is detected
    let response = ctx
        .client
        .post(&refresh_path, &refresh_body(&session.refresh_token))
        .await
        .unwrap();
    response
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_error_message("Refresh token is expired or used");
    assert!(response.cookies.is_empty());
    assert_eq!(
        ctx.fixtures.stored_refresh_token("dave").await.as_deref(),
        Some(second_refresh.as_str())
    );

    // R2 is still the live token
    let response = ctx
        .client
        .post(&refresh_path, &refresh_body(&second_refresh))
        .await
        .unwrap();
    response.assert_status(StatusCode::OK);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_refresh_from_cookie(ctx: &TestContext) {
    let session = ctx.signed_in_user("erin").await;

    let response = ctx
        .client
        .post_with_cookie(
            &format!("{USERS}/refresh-token"),
            &format!("refreshToken={}", session.refresh_token),
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let new_refresh = response.data()["refreshToken"].as_str().unwrap().to_string();
    assert_eq!(response.cookie("refreshToken").value, new_refresh);
    assert_eq!(
        ctx.fixtures.stored_refresh_token("erin").await,
        Some(new_refresh)
    );
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_missing_or_invalid_refresh_token(ctx: &TestContext) {
    let refresh_path = format!("{USERS}/refresh-token");

    let response = ctx.client.post_empty(&refresh_path).await.unwrap();
    response
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_error_message("Unauthorized request");

    let response = ctx
        .client
        .post(&refresh_path, &refresh_body("not-a-jwt"))
        .await
        .unwrap();
    response
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_error_message("Invalid refresh token");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_not_accept_access_token_as_refresh_token(ctx: &TestContext) {
    let session = ctx.signed_in_user("frank").await;

    let response = ctx
        .client
        .post(
            &format!("{USERS}/refresh-token"),
            &refresh_body(&session.access_token),
        )
        .await
        .unwrap();

    response
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_error_message("Invalid refresh token");

    // The real session is untouched
    assert_eq!(
        ctx.fixtures.stored_refresh_token("frank").await,
        Some(session.refresh_token)
    );
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_not_accept_refresh_token_as_access_token(ctx: &TestContext) {
    let session = ctx.signed_in_user("grace").await;

    let response = ctx
        .client
        .get_with_auth(&format!("{USERS}/current-user"), &session.refresh_token)
        .await
        .unwrap();

    response
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_error_message("Invalid access token");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_let_only_one_concurrent_refresh_win(ctx: &TestContext) {
    let session = ctx.signed_in_user("heidi").await;
    let refresh_path = format!("{USERS}/refresh-token");
    let body = refresh_body(&session.refresh_token);

    let attempts = (0..5).map(|_| ctx.client.post(&refresh_path, &body));
    let results = futures::future::join_all(attempts).await;

    let statuses: Vec<StatusCode> = results.into_iter().map(|r| r.unwrap().status).collect();
    let winners = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    assert_eq!(winners, 1, "statuses: {:?}", statuses);
    assert!(statuses
        .iter()
        .all(|s| *s == StatusCode::OK || *s == StatusCode::UNAUTHORIZED));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_logout_and_revoke_session(ctx: &TestContext) {
    let session = ctx.signed_in_user("ivan").await;

    let response = ctx
        .client
        .post_empty_with_auth(&format!("{USERS}/logout"), &session.access_token)
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(
        response.body.as_ref().unwrap()["message"],
        "User logged out successfully!"
    );
    assert!(response.cookie("accessToken").is_removal());
    assert!(response.cookie("refreshToken").is_removal());
    assert_eq!(ctx.fixtures.stored_refresh_token("ivan").await, None);

    // The refresh token from before logout is dead
    let response = ctx
        .client
        .post(
            &format!("{USERS}/refresh-token"),
            &refresh_body(&session.refresh_token),
        )
        .await
        .unwrap();
    response
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_error_message("Refresh token is expired or used");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_require_access_token_for_logout(ctx: &TestContext) {
    let response = ctx
        .client
        .post_empty(&format!("{USERS}/logout"))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::UNAUTHORIZED)
        .assert_error_message("Unauthorized request");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_accept_access_token_from_cookie(ctx: &TestContext) {
    let session = ctx.signed_in_user("judy").await;

    let response = ctx
        .client
        .get_with_cookie(
            &format!("{USERS}/current-user"),
            &format!("accessToken={}", session.access_token),
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(response.data()["username"], "judy");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_change_password_and_end_session(ctx: &TestContext) {
    let session = ctx.signed_in_user("mallory").await;
    let path = format!("{USERS}/change-password");

    let response = ctx
        .client
        .post_with_auth(
            &path,
            &json!({ "oldPassword": "wrong", "newPassword": "n3w-password" }),
            &session.access_token,
        )
        .await
        .unwrap();
    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("Invalid old password");

    let response = ctx
        .client
        .post_with_auth(
            &path,
            &json!({ "oldPassword": DEFAULT_PASSWORD, "newPassword": "n3w-password" }),
            &session.access_token,
        )
        .await
        .unwrap();
    response.assert_status(StatusCode::OK);
    assert!(response.cookie("refreshToken").is_removal());

    // Old refresh token no longer works
    let response = ctx
        .client
        .post(
            &format!("{USERS}/refresh-token"),
            &refresh_body(&session.refresh_token),
        )
        .await
        .unwrap();
    response.assert_status(StatusCode::UNAUTHORIZED);

    // Only the new password logs in
    let response = ctx
        .client
        .post(
            &format!("{USERS}/login"),
            &json!({ "username": "mallory", "password": DEFAULT_PASSWORD }),
        )
        .await
        .unwrap();
    response.assert_status(StatusCode::UNAUTHORIZED);

    ctx.login("mallory", "n3w-password").await;
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_malformed_login_body(ctx: &TestContext) {
    let response = ctx
        .client
        .post(
            &format!("{USERS}/login"),
            &json!({ "username": 42 }),
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::BAD_REQUEST);
    let body = response.body.as_ref().unwrap();
    assert_eq!(body["statusCode"], 400);
    assert_eq!(body["success"], false);
}
