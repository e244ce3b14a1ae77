//! Favorite store tests: idempotence, live projection, denormalized
//! snapshots.

mod helpers;

use harmonia_player::db::favorites::FavoriteStore;
use helpers::{memory_pool, scanned_track};

#[tokio::test]
async fn add_is_idempotent() {
    let pool = memory_pool().await;
    let store = FavoriteStore::new(pool).await.unwrap();

    store.add(&scanned_track(7)).await.unwrap();
    store.add(&scanned_track(7)).await.unwrap();

    let entries = store.entries().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, 7);
    assert_eq!(store.ids_snapshot().len(), 1);
}

#[tokio::test]
async fn add_replaces_the_denormalized_snapshot() {
    let pool = memory_pool().await;
    let store = FavoriteStore::new(pool).await.unwrap();

    let mut track = scanned_track(7);
    store.add(&track).await.unwrap();

    track.title = "Remastered".to_string();
    store.add(&track).await.unwrap();

    let entries = store.entries().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title, "Remastered");
}

#[tokio::test]
async fn removing_an_absent_id_is_a_no_op() {
    let pool = memory_pool().await;
    let store = FavoriteStore::new(pool).await.unwrap();

    store.add(&scanned_track(1)).await.unwrap();
    store.remove(99).await.unwrap();

    assert_eq!(store.ids_snapshot().into_iter().collect::<Vec<_>>(), vec![1]);
}

#[tokio::test]
async fn id_projection_emits_after_every_commit() {
    let pool = memory_pool().await;
    let store = FavoriteStore::new(pool).await.unwrap();
    let mut ids = store.ids();
    assert!(ids.borrow().is_empty());

    store.add(&scanned_track(3)).await.unwrap();
    ids.changed().await.unwrap();
    assert!(ids.borrow().contains(&3));

    store.remove(3).await.unwrap();
    ids.changed().await.unwrap();
    assert!(ids.borrow().is_empty());
}

#[tokio::test]
async fn entries_keep_favoriting_order_and_display_data() {
    let pool = memory_pool().await;
    let store = FavoriteStore::new(pool).await.unwrap();

    store.add(&scanned_track(5)).await.unwrap();
    store.add(&scanned_track(2)).await.unwrap();
    store.add(&scanned_track(9)).await.unwrap();

    // Displayable without a catalog rescan
    let entries = store.entries().await.unwrap();
    assert_eq!(entries.iter().map(|e| e.id).collect::<Vec<_>>(), vec![5, 2, 9]);
    assert_eq!(entries[0].title, "Track 5");
    assert_eq!(entries[0].artist, "Artist 5");
    assert_eq!(entries[0].duration_display(), "03:00");
}

#[tokio::test]
async fn a_fresh_store_loads_the_persisted_set() {
    let pool = memory_pool().await;
    let store = FavoriteStore::new(pool.clone()).await.unwrap();
    store.add(&scanned_track(4)).await.unwrap();

    let reloaded = FavoriteStore::new(pool).await.unwrap();
    assert!(reloaded.ids_snapshot().contains(&4));
}

#[tokio::test]
async fn clear_drops_every_favorite() {
    let pool = memory_pool().await;
    let store = FavoriteStore::new(pool).await.unwrap();

    store.add(&scanned_track(1)).await.unwrap();
    store.add(&scanned_track(2)).await.unwrap();
    store.clear().await.unwrap();

    assert!(store.ids_snapshot().is_empty());
    assert!(store.entries().await.unwrap().is_empty());
}
