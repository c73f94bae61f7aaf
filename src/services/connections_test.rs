use super::*;
use crate::services::persistence::WriteOp;
use crate::state::test_helpers;

async fn two_people(state: &AppState) -> (Uuid, Uuid) {
    let a = test_helpers::seed_person(state, 0.0, 0.0).await;
    let b = test_helpers::seed_person(state, 300.0, 0.0).await;
    (a, b)
}

#[tokio::test]
async fn create_connection_adds_one_directed_edge() {
    let state = test_helpers::test_app_state();
    let (a, b) = two_people(&state).await;
    let conn = create_connection(&state, a, b).await.unwrap();

    assert_eq!(conn.from_person_id, a);
    assert_eq!(conn.to_person_id, b);
    let chart = state.chart.read().await;
    assert_eq!(chart.doc.connections_len(), 1);
    assert_eq!(chart.pending.op(&EntityKey::connection(conn.id)), Some(WriteOp::Upsert));
}

#[tokio::test]
async fn duplicate_in_either_direction_is_rejected() {
    let state = test_helpers::test_app_state();
    let (a, b) = two_people(&state).await;
    create_connection(&state, a, b).await.unwrap();

    let same = create_connection(&state, a, b).await.unwrap_err();
    let reverse = create_connection(&state, b, a).await.unwrap_err();
    assert_eq!(same.error_code(), "E_CONNECTION_INVALID");
    assert!(matches!(reverse, ConnectionError::Rejected(DocError::DuplicateConnection { .. })));
    assert_eq!(state.chart.read().await.doc.connections_len(), 1);
}

#[tokio::test]
async fn self_connection_is_rejected() {
    let state = test_helpers::test_app_state();
    let (a, _) = two_people(&state).await;
    let err = create_connection(&state, a, a).await.unwrap_err();
    assert!(matches!(err, ConnectionError::Rejected(DocError::SelfConnection(_))));
    assert!(state.chart.read().await.pending.is_empty());
}

#[tokio::test]
async fn unknown_endpoint_is_person_not_found() {
    let state = test_helpers::test_app_state();
    let (a, _) = two_people(&state).await;
    let err = create_connection(&state, a, Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.error_code(), "E_PERSON_NOT_FOUND");
}

#[tokio::test]
async fn delete_connection_removes_and_marks_delete() {
    let state = test_helpers::test_app_state();
    let (a, b) = two_people(&state).await;
    let conn = create_connection(&state, a, b).await.unwrap();

    delete_connection(&state, conn.id).await.unwrap();
    let chart = state.chart.read().await;
    assert_eq!(chart.doc.connections_len(), 0);
    assert_eq!(chart.pending.op(&EntityKey::connection(conn.id)), Some(WriteOp::Delete));
}

#[tokio::test]
async fn delete_then_reconnect_is_allowed() {
    let state = test_helpers::test_app_state();
    let (a, b) = two_people(&state).await;
    let conn = create_connection(&state, a, b).await.unwrap();
    delete_connection(&state, conn.id).await.unwrap();
    assert!(create_connection(&state, b, a).await.is_ok());
}

#[tokio::test]
async fn delete_missing_connection_is_not_found() {
    let state = test_helpers::test_app_state();
    let err = delete_connection(&state, Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.error_code(), "E_CONNECTION_NOT_FOUND");
}

#[tokio::test]
async fn list_connections_in_creation_order() {
    let state = test_helpers::test_app_state();
    let (a, b) = two_people(&state).await;
    let c = test_helpers::seed_person(&state, 600.0, 0.0).await;
    let first = create_connection(&state, a, b).await.unwrap();
    let second = create_connection(&state, b, c).await.unwrap();

    let listed = list_connections(&state).await;
    assert_eq!(listed.len(), 2);
    if first.created_at != second.created_at {
        assert_eq!(listed[0].id, first.id);
    }
}
