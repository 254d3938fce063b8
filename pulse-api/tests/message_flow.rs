//! End-to-end message board flow against a live server

use pulse_api::{app, AppState};
use pulse_core::{MessageStatus, NewMessage};
use pulse_inbox::{InboxClient, SUBMIT_ERROR};
use pulse_services::{CacheEventKind, MessageForm, MessageQuery, MessageStore, Settlement};
use std::sync::Arc;
use tokio::net::TcpListener;

async fn spawn_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app(AppState::new(MessageStore::in_memory().unwrap()));
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_submit_then_list_is_refetched() {
    let base = spawn_server().await;
    let query = MessageQuery::new(Arc::new(InboxClient::with_base_url(&base)));

    let initial = query.list().await;
    assert!(initial.is_success());
    assert_eq!(initial.data, Some(vec![]));

    let mut events = query.cache().subscribe();
    let mut form = MessageForm::with_values("0812345", "pulsa 10k");
    let settlement = query.mutation().send(&mut form).await.unwrap();

    let created = match settlement {
        Settlement::Success(message) => message,
        Settlement::Failure(e) => panic!("submit failed: {}", e),
    };
    assert_eq!(created.id, Some(1));
    assert_eq!(created.status, MessageStatus::Pending);
    assert_eq!(form, MessageForm::new());

    // Optimistic write, then the refetch triggered by invalidation
    let mut kinds = Vec::new();
    while let Ok(event) = events.try_recv() {
        kinds.push(event.kind);
    }
    assert_eq!(
        kinds,
        vec![
            CacheEventKind::DataChanged,
            CacheEventKind::FetchStarted,
            CacheEventKind::DataChanged,
        ]
    );

    assert_eq!(query.messages(), vec![created]);
}

#[tokio::test]
async fn test_rejected_submit_rolls_back() {
    let base = spawn_server().await;
    let client = InboxClient::with_base_url(&base);
    client
        .submit(&NewMessage::new("0812", "first"))
        .await
        .unwrap();

    let query = MessageQuery::new(Arc::new(client));
    query.list().await;
    let before = query.messages();
    assert_eq!(before.len(), 1);

    // Blank bodies are rejected by the server
    let settlement = query
        .mutation()
        .submit(NewMessage::new("0812", "   "))
        .await;

    assert_eq!(
        settlement.error().map(|e| e.user_message()),
        Some(SUBMIT_ERROR)
    );
    assert_eq!(query.messages(), before);
}
