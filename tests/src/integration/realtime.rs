//! WebSocket flows: rooms, fan-out from REST, whiteboards and calls.

use super::harness::TestServer;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn test_chat_updates_follow_room_membership() {
    let server = TestServer::start().await;
    server.signup("ada").await;
    server.signup("bob").await;
    let chat_id = server.create_chat("ada", "bob").await;

    let mut member = server.connect().await;
    let mut outsider = server.connect().await;
    member.join_chat(&chat_id).await;

    let (status, _) = server
        .post(
            &format!("/chat/{}/addMessage", chat_id),
            json!({"msg": "anyone there?", "msgFrom": "bob", "type": "direct"}),
        )
        .await;
    assert_eq!(status, 200);

    let update = member.next_named("chatUpdate").await;
    assert_eq!(update["data"]["type"], "newMessage");
    assert_eq!(update["data"]["chat"]["_id"], chat_id.as_str());
    assert_eq!(
        update["data"]["chat"]["messages"][0]["msg"],
        "anyone there?"
    );
    let notice = member.next_named("chatUpdate").await;
    assert_eq!(notice["data"]["type"], "notification");

    // Outside the room only the notification arrives.
    let notice = outsider.next_named("chatUpdate").await;
    assert_eq!(notice["data"]["type"], "notification");
    assert_eq!(notice["data"]["chat"]["participants"], json!(["ada", "bob"]));
    outsider.assert_silent().await;

    member.emit("leaveChat", json!(chat_id)).await;
    assert_eq!(member.next_named("left").await["data"], chat_id.as_str());

    server
        .post(
            &format!("/chat/{}/addMessage", chat_id),
            json!({"msg": "hello?", "msgFrom": "bob", "type": "direct"}),
        )
        .await;
    let notice = member.next_named("chatUpdate").await;
    assert_eq!(notice["data"]["type"], "notification");
    member.assert_silent().await;

    server.stop().await;
}

#[tokio::test]
async fn test_broadcasts_reach_every_connection() {
    let server = TestServer::start().await;
    server.signup("ada").await;

    let mut first = server.connect().await;
    let mut second = server.connect().await;

    server
        .post(
            "/messaging/addMessage",
            json!({"messageToAdd": {
                "msg": "hello board",
                "msgFrom": "ada",
                "msgDateTime": "2024-05-01T09:00:00Z"
            }}),
        )
        .await;

    for client in [&mut first, &mut second] {
        let event = client.next_named("messageUpdate").await;
        assert_eq!(event["data"]["msg"]["msg"], "hello board");
    }

    server.signup("bob").await;
    for client in [&mut first, &mut second] {
        let event = client.next_named("userUpdate").await;
        assert_eq!(event["data"]["type"], "created");
        assert_eq!(event["data"]["user"]["username"], "bob");
    }

    server.stop().await;
}

#[tokio::test]
async fn test_whiteboard_collaboration() {
    let server = TestServer::start().await;
    let red = json!([[{"hex": "#ff0000", "x": 0, "y": 0}]]);
    let blue = json!([[{"hex": "#0000ff", "x": 0, "y": 0}]]);

    for (link, access) in [("shared", "editable"), ("locked", "read-only")] {
        let (status, _) = server
            .post(
                "/whiteboard/addWhiteboard",
                json!({
                    "owner": "ada",
                    "title": link,
                    "content": red,
                    "uniqueLink": link,
                    "accessType": access
                }),
            )
            .await;
        assert_eq!(status, 201);
    }

    let mut artist = server.connect().await;
    let mut viewer = server.connect().await;
    for client in [&mut artist, &mut viewer] {
        client.emit("joinWhiteboard", json!("shared")).await;
        let snapshot = client.next_named("whiteboardContent").await;
        assert_eq!(snapshot["data"], red);
    }

    artist
        .emit("updateWhiteboard", json!(["shared", blue]))
        .await;
    let relayed = viewer.next_named("whiteboardContent").await;
    assert_eq!(relayed["data"], blue);
    artist.assert_silent().await;

    let (_, board) = server.get("/whiteboard/shared").await;
    assert_eq!(board["content"], blue);

    artist
        .emit("updateWhiteboard", json!(["locked", blue]))
        .await;
    let error = artist.next_named("whiteboardError").await;
    assert_eq!(error["data"], "Failed to update whiteboard");

    artist.emit("joinWhiteboard", json!("missing")).await;
    let error = artist.next_named("whiteboardError").await;
    assert_eq!(error["data"], "Failed to join whiteboard");

    server.stop().await;
}

#[tokio::test]
async fn test_call_signaling() {
    let server = TestServer::start().await;
    let mut caller = server.connect().await;
    let mut callee = server.connect().await;
    let caller_id = caller.socket_id().to_string();
    let callee_id = callee.socket_id().to_string();
    assert_ne!(caller_id, callee_id);

    caller
        .emit(
            "callUser",
            json!({
                "userToCall": callee_id,
                "signalData": {"sdp": "offer"},
                "from": caller_id,
                "name": "Ada"
            }),
        )
        .await;

    let ring = callee.next_named("callUser").await;
    assert_eq!(ring["data"]["from"], caller_id.as_str());
    assert_eq!(ring["data"]["name"], "Ada");
    assert_eq!(ring["data"]["signal"], json!({"sdp": "offer"}));

    callee
        .emit(
            "answerCall",
            json!({"to": caller_id, "signal": {"sdp": "answer"}}),
        )
        .await;
    let accepted = caller.next_named("callAccepted").await;
    assert_eq!(accepted["data"], json!({"sdp": "answer"}));

    server.stop().await;
}

#[tokio::test]
async fn test_invalid_frames_get_error_replies() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;

    client.emit("noSuchEvent", json!(1)).await;
    let reply = client.next_event().await;
    assert_eq!(reply["event"], "error");

    // Still usable afterwards.
    client.join_chat("lobby").await;

    server.stop().await;
}

#[tokio::test]
async fn test_disconnect_releases_socket_id() {
    let server = TestServer::start().await;
    server.signup("ada").await;

    let client = server.connect().await;
    let socket_id = client.socket_id().to_string();
    let (status, user) = server
        .patch(
            "/user/updateSocketId",
            json!({"username": "ada", "socketId": socket_id}),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(user["socketId"], socket_id.as_str());

    client.close().await;

    let released = async {
        loop {
            let (_, user) = server.get("/user/getUser/ada").await;
            if user.get("socketId").is_none() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(2), released)
        .await
        .expect("socket id was not released");

    server.stop().await;
}
