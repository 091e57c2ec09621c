// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore storage tests.
//!
//! These require the Firestore emulator:
//! `gcloud emulators firestore start --host-port=localhost:8080`
//! and `FIRESTORE_EMULATOR_HOST=localhost:8080`.

use chrono::{NaiveDate, Utc};
use challenge_tracker::db::{new_document_id, Db};
use challenge_tracker::models::{Category, Challenge, Completion, User};
use challenge_tracker::services::CompletionLedger;

mod common;

fn sample_challenge(user_id: &str) -> Challenge {
    Challenge {
        id: new_document_id().unwrap(),
        user_id: user_id.to_string(),
        name: "Emulator".to_string(),
        goal: "Persist".to_string(),
        description: None,
        category: Category::Productivity,
        color: "#336699".to_string(),
        created_at: Utc::now(),
        active: true,
        completed_at: None,
        deadline: None,
        current_streak: 0,
        longest_streak: 0,
        last_completed_date: None,
    }
}

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[tokio::test]
async fn test_user_insert_is_create_only() {
    require_emulator!();
    let db = common::test_firestore().await;
    let external_id = format!("fs_user_{}", new_document_id().unwrap());

    let first = User::new(&external_id, "first@example.com", Utc::now());
    assert!(db.insert_user(&first).await.unwrap());

    let second = User::new(&external_id, "second@example.com", Utc::now());
    assert!(!db.insert_user(&second).await.unwrap());

    let stored = db.get_user(&external_id).await.unwrap().unwrap();
    assert_eq!(stored.email, "first@example.com");
}

#[tokio::test]
async fn test_completion_natural_key_conflict() {
    require_emulator!();
    let db = common::test_firestore().await;
    let user_id = format!("fs_user_{}", new_document_id().unwrap());
    let challenge = sample_challenge(&user_id);
    db.set_challenge(&challenge).await.unwrap();

    let completion = Completion::new(&challenge.id, &user_id, day("2024-03-01"), None, Utc::now());
    assert!(db.insert_completion(&completion).await.unwrap());

    let duplicate = Completion::new(
        &challenge.id,
        &user_id,
        day("2024-03-01"),
        Some("again".to_string()),
        Utc::now(),
    );
    assert_eq!(duplicate.id, completion.id);
    assert!(!db.insert_completion(&duplicate).await.unwrap());

    let stored = db.get_completion(&completion.id).await.unwrap().unwrap();
    assert_eq!(stored.note, None);

    db.delete_challenge_cascade(&challenge.id).await.unwrap();
}

#[tokio::test]
async fn test_cascade_delete_removes_completions() {
    require_emulator!();
    let db = common::test_firestore().await;
    let user_id = format!("fs_user_{}", new_document_id().unwrap());
    let challenge = sample_challenge(&user_id);
    db.set_challenge(&challenge).await.unwrap();

    for date in ["2024-03-02", "2024-03-01", "2024-03-03"] {
        let completion = Completion::new(&challenge.id, &user_id, day(date), None, Utc::now());
        assert!(db.insert_completion(&completion).await.unwrap());
    }

    let listed = db
        .get_completions_for_challenge(&challenge.id, &user_id)
        .await
        .unwrap();
    let dates: Vec<_> = listed.iter().map(|c| c.date).collect();
    assert_eq!(
        dates,
        vec![day("2024-03-01"), day("2024-03-02"), day("2024-03-03")]
    );

    let removed = db.delete_challenge_cascade(&challenge.id).await.unwrap();
    assert_eq!(removed, 3);

    assert!(db.get_challenge(&challenge.id).await.unwrap().is_none());
    assert!(db.get_completions_for_user(&user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_marks_keep_streaks_consistent() {
    require_emulator!();
    let db = Db::Firestore(common::test_firestore().await);
    let user_id = format!("fs_user_{}", new_document_id().unwrap());
    let challenge = sample_challenge(&user_id);
    db.set_challenge(&challenge).await.unwrap();

    let ledger = CompletionLedger::new(db.clone());
    let handles: Vec<_> = [3, 1, 5, 2, 4]
        .into_iter()
        .map(|day| {
            let ledger = ledger.clone();
            let challenge_id = challenge.id.clone();
            let user_id = user_id.clone();
            let date = NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
            tokio::spawn(async move { ledger.mark_done(&challenge_id, &user_id, date, None).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = db.get_challenge(&challenge.id).await.unwrap().unwrap();
    assert_eq!(stored.current_streak, 5);
    assert_eq!(stored.longest_streak, 5);
    assert_eq!(stored.last_completed_date, Some(day("2024-03-05")));
    assert_eq!(stored.name, challenge.name);

    db.delete_challenge_cascade(&challenge.id).await.unwrap();
}
