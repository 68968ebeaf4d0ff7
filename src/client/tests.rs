use super::handle::ClientHandle;
use tokio::sync::mpsc;
use tungstenite::protocol::Message as WsMessage;

#[test]
fn test_client_handles_have_distinct_ids() {
    let (tx, _) = mpsc::unbounded_channel::<WsMessage>();
    let a = ClientHandle::new(tx.clone());
    let b = ClientHandle::new(tx);
    assert_ne!(a.id(), b.id());
    assert_ne!(a, b);
    assert!(a.id().to_string().starts_with("client-"));
}

#[test]
fn test_clone_keeps_identity() {
    let (tx, _) = mpsc::unbounded_channel::<WsMessage>();
    let a = ClientHandle::new(tx);
    let b = a.clone();
    assert_eq!(a, b);
    assert_eq!(a.downgrade(), b.downgrade());
}

#[test]
fn test_weak_handle_does_not_keep_connection_alive() {
    let (tx, _rx) = mpsc::unbounded_channel::<WsMessage>();
    let client = ClientHandle::new(tx);
    let weak = client.downgrade();
    assert!(weak.upgrade().is_some());

    drop(client);
    assert!(weak.upgrade().is_none());
}
