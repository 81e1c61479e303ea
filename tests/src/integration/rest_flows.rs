//! HTTP flows across users, chats, polls and the message board.

use super::harness::TestServer;
use serde_json::json;

#[tokio::test]
async fn test_user_account_lifecycle() {
    let server = TestServer::start().await;

    let user = server.signup("ada").await;
    assert_eq!(user["username"], "ada");
    assert!(user["_id"].is_string());
    assert!(user.get("passwordHash").is_none());

    let (status, body) = server
        .post("/user/login", json!({"username": "ada", "password": "correct horse"}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["_id"], user["_id"]);

    let (status, body) = server
        .patch(
            "/user/updateBiography",
            json!({"username": "ada", "biography": "Counts things"}),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["biography"], "Counts things");

    let (status, _) = server
        .patch(
            "/user/resetPassword",
            json!({"username": "ada", "password": "battery staple"}),
        )
        .await;
    assert_eq!(status, 200);

    let (status, _) = server
        .post("/user/login", json!({"username": "ada", "password": "correct horse"}))
        .await;
    assert_eq!(status, 401);
    let (status, _) = server
        .post("/user/login", json!({"username": "ada", "password": "battery staple"}))
        .await;
    assert_eq!(status, 200);

    let (status, _) = server.delete("/user/deleteUser/ada").await;
    assert_eq!(status, 200);
    let (status, body) = server.get("/user/getUser/ada").await;
    assert_eq!(status, 404);
    assert_eq!(body, "User not found");

    server.stop().await;
}

#[tokio::test]
async fn test_duplicate_signup_conflicts() {
    let server = TestServer::start().await;
    server.signup("ada").await;

    let (status, _) = server
        .post("/user/signup", json!({"username": "ada", "password": "other"}))
        .await;
    assert_eq!(status, 409);

    let (_, users) = server.get("/user/getUsers").await;
    assert_eq!(users.as_array().unwrap().len(), 1);

    server.stop().await;
}

#[tokio::test]
async fn test_chat_conversation_with_poll() {
    let server = TestServer::start().await;
    server.signup("ada").await;
    server.signup("bob").await;
    let chat_id = server.create_chat("ada", "bob").await;

    let (status, chat) = server
        .post(
            &format!("/chat/{}/addMessage", chat_id),
            json!({
                "msg": "Friday lunch?",
                "msgFrom": "ada",
                "type": "poll",
                "poll": {
                    "question": "Where?",
                    "options": [{"optionText": "Noodles"}, {"optionText": "Tacos"}]
                }
            }),
        )
        .await;
    assert_eq!(status, 200, "{}", chat);
    let poll = &chat["messages"][0];
    assert_eq!(poll["type"], "poll");
    assert_eq!(poll["user"]["username"], "ada");
    let message_id = poll["_id"].as_str().unwrap().to_string();

    for (voter, option) in [("ada", 0), ("bob", 1), ("ada", 1)] {
        let (status, body) = server
            .patch(
                "/messaging/voteOnPoll",
                json!({
                    "chatID": chat_id,
                    "messageID": message_id,
                    "optionIndex": option,
                    "username": voter
                }),
            )
            .await;
        assert_eq!(status, 200, "{}", body);
    }

    let (_, chat) = server.get(&format!("/chat/{}", chat_id)).await;
    let votes = &chat["messages"][0]["poll"]["votes"];
    assert_eq!(votes, &json!({"ada": 1, "bob": 1}));

    let (_, chats) = server.get("/chat/getChatsByUser/bob").await;
    assert_eq!(chats.as_array().unwrap().len(), 1);
    let (_, chats) = server.get("/chat/getChatsByUser/cy").await;
    assert!(chats.as_array().unwrap().is_empty());

    server.stop().await;
}

#[tokio::test]
async fn test_chat_moderation() {
    let server = TestServer::start().await;
    for name in ["ada", "bob", "cy"] {
        server.signup(name).await;
    }
    let chat_id = server.create_chat("ada", "bob").await;

    let (status, chat) = server
        .post(
            &format!("/chat/{}/addParticipant", chat_id),
            json!({"username": "cy"}),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(chat["participants"], json!(["ada", "bob", "cy"]));

    let (_, chat) = server
        .post(
            &format!("/chat/{}/addMessage", chat_id),
            json!({"msg": "spam", "msgFrom": "cy", "type": "direct"}),
        )
        .await;
    let message_id = chat["messages"][0]["_id"].as_str().unwrap().to_string();

    // A plain user cannot change roles
    let (status, _) = server
        .patch(
            &format!("/chat/{}/changeUserRole", chat_id),
            json!({"username": "bob", "role": "moderator", "actingUser": "bob"}),
        )
        .await;
    assert_eq!(status, 403);

    let (status, chat) = server
        .patch(
            &format!("/chat/{}/changeUserRole", chat_id),
            json!({"username": "bob", "role": "moderator", "actingUser": "ada"}),
        )
        .await;
    assert_eq!(status, 200);
    assert!(chat["permissions"]
        .as_array()
        .unwrap()
        .contains(&json!({"user": "bob", "role": "moderator"})));

    let (status, chat) = server
        .delete(&format!(
            "/chat/{}/message/{}?actingUser=bob",
            chat_id, message_id
        ))
        .await;
    assert_eq!(status, 200);
    assert!(chat["messages"].as_array().unwrap().is_empty());

    server.stop().await;
}

#[tokio::test]
async fn test_message_board() {
    let server = TestServer::start().await;
    server.signup("ada").await;

    for (text, at) in [
        ("second", "2024-05-01T09:05:00Z"),
        ("first", "2024-05-01T09:00:00Z"),
    ] {
        let (status, _) = server
            .post(
                "/messaging/addMessage",
                json!({"messageToAdd": {
                    "msg": text,
                    "msgFrom": "ada",
                    "msgDateTime": at
                }}),
            )
            .await;
        assert_eq!(status, 200);
    }

    let (status, messages) = server.get("/messaging/getMessages").await;
    assert_eq!(status, 200);
    let texts: Vec<_> = messages
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["msg"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(texts, vec!["first", "second"]);

    server.stop().await;
}

#[tokio::test]
async fn test_data_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agora.json");

    let server = TestServer::with_data_file(&path).await;
    server.signup("ada").await;
    let (status, _) = server
        .post(
            "/whiteboard/addWhiteboard",
            json!({
                "owner": "ada",
                "title": "Plan",
                "content": "data:image/png;base64,AAAA",
                "uniqueLink": "plan",
                "accessType": "read-only"
            }),
        )
        .await;
    assert_eq!(status, 201);
    server.stop().await;

    let server = TestServer::with_data_file(&path).await;
    let (status, body) = server.get("/user/getUser/ada").await;
    assert_eq!(status, 200);
    assert_eq!(body["username"], "ada");
    let (status, body) = server.get("/whiteboard/plan").await;
    assert_eq!(status, 200);
    assert_eq!(body["accessType"], "read-only");

    server.stop().await;
}

#[tokio::test]
async fn test_health_and_cors() {
    let server = TestServer::start().await;

    let (status, body) = server.get("/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");

    let response = reqwest::Client::new()
        .get(server.url("/messaging/getMessages"))
        .header("origin", "http://localhost:3000")
        .send()
        .await
        .unwrap();
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://localhost:3000"
    );
    assert!(response.headers().contains_key("x-request-id"));

    server.stop().await;
}
