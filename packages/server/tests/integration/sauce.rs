use serde_json::json;

use crate::common::{TestApp, image_bytes, routes, sauce_payload};

mod creation {
    use super::*;

    #[tokio::test]
    async fn create_returns_the_record() {
        let app = TestApp::spawn().await;
        let token = app.token_for(1, "alice");

        let res = app
            .post_multipart(
                routes::SAUCES,
                &sauce_payload("Habanero Sunrise"),
                Some(("sunrise.png", image_bytes())),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["name"], "Habanero Sunrise");
        assert_eq!(res.body["user_id"], 1);
        assert_eq!(res.body["likes"], 0);
        assert_eq!(res.body["dislikes"], 0);
        assert_eq!(res.body["users_liked"], json!([]));
        assert_eq!(res.body["users_disliked"], json!([]));
        assert!(
            res.body["image_url"]
                .as_str()
                .unwrap()
                .contains("/images/"),
        );
        assert!(res.body["created_at"].is_string());
    }

    #[tokio::test]
    async fn fetch_by_id_returns_identical_fields() {
        let app = TestApp::spawn().await;
        let token = app.token_for(1, "alice");
        let (id, image_url) = app.create_sauce(&token, "Ghost Note").await;

        let res = app.get_with_token(&routes::sauce(id), &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["id"], id);
        assert_eq!(res.body["name"], "Ghost Note");
        assert_eq!(res.body["manufacturer"], "Pepper Works");
        assert_eq!(res.body["main_pepper"], "Habanero");
        assert_eq!(res.body["heat"], 7);
        assert_eq!(res.body["image_url"], image_url.as_str());
    }

    #[tokio::test]
    async fn uploaded_image_is_served() {
        let app = TestApp::spawn().await;
        let token = app.token_for(1, "alice");
        let (_, image_url) = app.create_sauce(&token, "Served Hot").await;

        let res = app.get_absolute(&image_url).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.text.as_bytes(), image_bytes().as_slice());
    }

    #[tokio::test]
    async fn create_requires_a_token() {
        let app = TestApp::spawn().await;

        let res = app
            .post_multipart_without_token(
                routes::SAUCES,
                &sauce_payload("No Auth"),
                Some(("x.png", image_bytes())),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn create_without_image_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.token_for(1, "alice");

        let res = app
            .post_multipart(routes::SAUCES, &sauce_payload("No Image"), None, &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn create_with_invalid_heat_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.token_for(1, "alice");

        let mut payload = sauce_payload("Too Hot");
        payload["heat"] = json!(11);

        let res = app
            .post_multipart(
                routes::SAUCES,
                &payload,
                Some(("x.png", image_bytes())),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn client_supplied_owner_is_ignored() {
        let app = TestApp::spawn().await;
        let token = app.token_for(1, "alice");

        let mut payload = sauce_payload("Spoofed Owner");
        payload["user_id"] = json!(999);

        let res = app
            .post_multipart(
                routes::SAUCES,
                &payload,
                Some(("x.png", image_bytes())),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["user_id"], 1);
    }
}

mod retrieval {
    use super::*;

    #[tokio::test]
    async fn list_returns_all_sauces() {
        let app = TestApp::spawn().await;
        let token = app.token_for(1, "alice");
        app.create_sauce(&token, "First").await;
        app.create_sauce(&token, "Second").await;

        let res = app.get_with_token(routes::SAUCES, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn get_missing_sauce_is_404() {
        let app = TestApp::spawn().await;
        let token = app.token_for(1, "alice");

        let res = app.get_with_token(&routes::sauce(4242), &token).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn list_requires_a_token() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::SAUCES).await;

        assert_eq!(res.status, 401);
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn owner_updates_fields_with_json_body() {
        let app = TestApp::spawn().await;
        let token = app.token_for(1, "alice");
        let (id, image_url) = app.create_sauce(&token, "Before").await;

        let res = app
            .put_json_with_token(&routes::sauce(id), &sauce_payload("After"), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "After");
        // No new image supplied, so the reference must be untouched.
        assert_eq!(res.body["image_url"], image_url.as_str());
        assert_eq!(app.get_absolute(&image_url).await.status, 200);
    }

    #[tokio::test]
    async fn owner_replaces_the_image() {
        let app = TestApp::spawn().await;
        let token = app.token_for(1, "alice");
        let (id, old_image_url) = app.create_sauce(&token, "Repaint").await;

        let res = app
            .put_multipart(
                &routes::sauce(id),
                &sauce_payload("Repaint"),
                Some(("new.png", b"newer image bytes".to_vec())),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let new_image_url = res.body["image_url"].as_str().unwrap().to_string();
        assert_ne!(new_image_url, old_image_url);

        // New file served, old file released.
        assert_eq!(app.get_absolute(&new_image_url).await.status, 200);
        assert_eq!(app.get_absolute(&old_image_url).await.status, 404);
    }

    #[tokio::test]
    async fn non_owner_update_is_denied_without_effects() {
        let app = TestApp::spawn().await;
        let owner = app.token_for(1, "alice");
        let intruder = app.token_for(2, "bob");
        let (id, image_url) = app.create_sauce(&owner, "Mine").await;

        let res = app
            .put_json_with_token(&routes::sauce(id), &sauce_payload("Stolen"), &intruder)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");

        let unchanged = app.get_with_token(&routes::sauce(id), &owner).await;
        assert_eq!(unchanged.body["name"], "Mine");
        assert_eq!(app.get_absolute(&image_url).await.status, 200);
    }

    #[tokio::test]
    async fn update_missing_sauce_is_404() {
        let app = TestApp::spawn().await;
        let token = app.token_for(1, "alice");

        let res = app
            .put_json_with_token(&routes::sauce(4242), &sauce_payload("Ghost"), &token)
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn votes_survive_an_update() {
        let app = TestApp::spawn().await;
        let owner = app.token_for(1, "alice");
        let voter = app.token_for(2, "bob");
        let (id, _) = app.create_sauce(&owner, "Voted On").await;

        let vote = app
            .post_json_with_token(&routes::sauce_like(id), &json!({ "like": 1 }), &voter)
            .await;
        assert_eq!(vote.status, 200, "{}", vote.text);

        let res = app
            .put_json_with_token(&routes::sauce(id), &sauce_payload("Renamed"), &owner)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["likes"], 1);
        assert_eq!(res.body["users_liked"], json!([2]));
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn non_owner_delete_is_denied_without_effects() {
        let app = TestApp::spawn().await;
        let owner = app.token_for(1, "alice");
        let intruder = app.token_for(2, "bob");
        let (id, image_url) = app.create_sauce(&owner, "Keep Out").await;

        let res = app.delete_with_token(&routes::sauce(id), &intruder).await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");

        // Record and image both still present.
        assert_eq!(app.get_with_token(&routes::sauce(id), &owner).await.status, 200);
        assert_eq!(app.get_absolute(&image_url).await.status, 200);
    }

    #[tokio::test]
    async fn owner_delete_removes_record_and_image() {
        let app = TestApp::spawn().await;
        let token = app.token_for(1, "alice");
        let (id, image_url) = app.create_sauce(&token, "Short Lived").await;

        let res = app.delete_with_token(&routes::sauce(id), &token).await;
        assert_eq!(res.status, 204);

        assert_eq!(app.get_with_token(&routes::sauce(id), &token).await.status, 404);
        assert_eq!(app.get_absolute(&image_url).await.status, 404);
    }

    #[tokio::test]
    async fn delete_missing_sauce_is_404() {
        let app = TestApp::spawn().await;
        let token = app.token_for(1, "alice");

        let res = app.delete_with_token(&routes::sauce(4242), &token).await;

        assert_eq!(res.status, 404);
    }
}
