mod common;

use chrono::{Duration, Utc};
use uuid::Uuid;

use common::Fixture;
use eventark_core::domain::{AnonymousMessage, PartyDetails};
use eventark_core::error::AppError;
use eventark_core::ports::{ChildKind, RegistryRepository};

fn seed_children(fx: &Fixture) -> (PartyDetails, AnonymousMessage) {
    let party = PartyDetails {
        id: Uuid::new_v4(),
        owner_id: fx.owner.id,
        title: Some("After party".to_string()),
        date: Some(Utc::now() + Duration::days(7)),
        address: "12 Marina Road".to_string(),
        information: None,
    };
    fx.store.insert_party_details(fx.event.id, party.clone()).unwrap();

    let message = AnonymousMessage {
        id: Uuid::new_v4(),
        event_id: fx.event.id,
        message: "Happy birthday!".to_string(),
        created_at: Utc::now(),
    };
    fx.store.insert_message(message.clone()).unwrap();

    (party, message)
}

#[tokio::test]
async fn test_event_cascade_removes_every_child() {
    let fx = Fixture::new();
    seed_children(&fx);

    let report = fx.state.cascade.delete_event(fx.event.id, fx.owner.id).await.unwrap();

    assert_eq!(report.items_deleted, 1);
    assert_eq!(report.party_details_deleted, 1);
    assert_eq!(report.messages_deleted, 1);
    assert_eq!(fx.store.child_counts().unwrap(), (0, 0, 0));
    assert!(fx.store.get_event(fx.event.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_failed_cascade_leaves_everything_in_place() {
    let fx = Fixture::new();
    seed_children(&fx);
    fx.store.inject_delete_failure(ChildKind::AnonymousMessage);

    let result = fx.state.cascade.delete_event(fx.event.id, fx.owner.id).await;

    assert!(matches!(result, Err(AppError::CascadeFailure(_))));
    assert_eq!(fx.store.child_counts().unwrap(), (1, 1, 1));
    let event = fx.store.get_event(fx.event.id).await.unwrap().unwrap();
    assert_eq!(event.wish_list, vec![fx.item.id]);
    assert!(event.party_details.is_some());
    assert_eq!(event.messages.len(), 1);
}

#[tokio::test]
async fn test_cascade_requires_ownership() {
    let fx = Fixture::new();

    let result = fx.state.cascade.delete_event(fx.event.id, Uuid::new_v4()).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert!(fx.store.get_event(fx.event.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_child_delete_pulls_back_reference() {
    let fx = Fixture::new();
    let (party, message) = seed_children(&fx);

    let deletion = fx
        .state
        .cascade
        .delete_child(ChildKind::AnonymousMessage, message.id, fx.owner.id)
        .await
        .unwrap();
    assert!(deletion.deleted);
    assert_eq!(deletion.parents_unlinked, 1);

    fx.state
        .cascade
        .delete_child(ChildKind::PartyDetails, party.id, fx.owner.id)
        .await
        .unwrap();

    let event = fx.store.get_event(fx.event.id).await.unwrap().unwrap();
    assert!(event.messages.is_empty());
    assert!(event.party_details.is_none());
    assert_eq!(event.wish_list, vec![fx.item.id]);
}

#[tokio::test]
async fn test_repeat_delete_repairs_dangling_reference() {
    let fx = Fixture::new();

    // Simulate a run that removed the item but stopped before unlinking it.
    assert!(fx
        .store
        .delete_child(ChildKind::WishListItem, fx.item.id, fx.owner.id)
        .await
        .unwrap());
    let event = fx.store.get_event(fx.event.id).await.unwrap().unwrap();
    assert_eq!(event.wish_list, vec![fx.item.id]);

    let deletion = fx
        .state
        .cascade
        .delete_child(ChildKind::WishListItem, fx.item.id, fx.owner.id)
        .await
        .unwrap();
    assert!(!deletion.deleted);
    assert_eq!(deletion.parents_unlinked, 1);

    let event = fx.store.get_event(fx.event.id).await.unwrap().unwrap();
    assert!(event.wish_list.is_empty());

    // Nothing left to do.
    let again = fx
        .state
        .cascade
        .delete_child(ChildKind::WishListItem, fx.item.id, fx.owner.id)
        .await;
    assert!(matches!(again, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_child_of_another_owner_is_untouched() {
    let fx = Fixture::new();

    let result = fx
        .state
        .cascade
        .delete_child(ChildKind::WishListItem, fx.item.id, Uuid::new_v4())
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert!(fx.store.get_item(fx.item.id).await.unwrap().is_some());
    let event = fx.store.get_event(fx.event.id).await.unwrap().unwrap();
    assert_eq!(event.wish_list, vec![fx.item.id]);
}
