mod common;

use chrono::Duration;
use common::{operator, setup, t0};
use mailing_list::AppError;
use mailing_list::database::mailing;
use mailing_list::store::{CreateMailingDto, CreateTagDto, UpdateMailingDto};

fn text(body: &str) -> CreateMailingDto {
    CreateMailingDto {
        message_text: body.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn missing_stop_date_defaults_to_thirty_days_after_start() {
    let t = setup().await;
    let start = t0() + Duration::hours(3);

    let created = t
        .store
        .create_mailing(CreateMailingDto {
            start_date: Some(start),
            ..text("Spring sale")
        })
        .await
        .unwrap();

    assert_eq!(created.stop_date, Some(start + Duration::days(30)));
    assert_eq!(
        t.store.get_mailing(created.id).await.unwrap().stop_date,
        Some(mailing::default_stop_date(start))
    );
    assert!(!created.is_started);
    assert!(!created.is_completed);
}

#[tokio::test]
async fn resaving_keeps_the_stop_date() {
    let t = setup().await;
    let start = t0() + Duration::hours(1);
    let created = t
        .store
        .create_mailing(CreateMailingDto {
            start_date: Some(start),
            ..text("Weekly digest")
        })
        .await
        .unwrap();
    let stop = created.stop_date;

    for _ in 0..3 {
        t.clock.advance(Duration::minutes(1));
        let saved = t
            .store
            .update_mailing(created.id, UpdateMailingDto::default())
            .await
            .unwrap();
        assert_eq!(saved.stop_date, stop);
    }

    let moved = t
        .store
        .update_mailing(
            created.id,
            UpdateMailingDto {
                start_date: Some(start + Duration::days(2)),
                is_started: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.stop_date, stop);
    assert!(moved.is_started);
    assert_eq!(moved.changed_date, t0() + Duration::minutes(3));
}

#[tokio::test]
async fn explicit_stop_date_is_kept() {
    let t = setup().await;
    let stop = t0() + Duration::days(2);
    let created = t
        .store
        .create_mailing(CreateMailingDto {
            stop_date: Some(stop),
            ..text("Flash sale")
        })
        .await
        .unwrap();

    assert_eq!(created.start_date, t0());
    assert_eq!(created.stop_date, Some(stop));
}

#[tokio::test]
async fn start_date_in_the_past_is_rejected() {
    let t = setup().await;
    let err = t
        .store
        .create_mailing(CreateMailingDto {
            start_date: Some(t0() - Duration::seconds(1)),
            ..text("Too late")
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation { field: "start_date", .. }), "{err:?}");
    assert!(t.store.list_mailings().await.unwrap().is_empty());
}

#[tokio::test]
async fn stop_date_in_the_past_is_rejected() {
    let t = setup().await;
    let err = t
        .store
        .create_mailing(CreateMailingDto {
            stop_date: Some(t0() - Duration::days(1)),
            ..text("Already over")
        })
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("stop_date"));
}

#[tokio::test]
async fn default_start_date_follows_the_clock() {
    let t = setup().await;
    t.clock.advance(Duration::days(10));

    let created = t.store.create_mailing(text("Later")).await.unwrap();
    assert_eq!(created.start_date, t0() + Duration::days(10));
    assert_eq!(created.created_date, t0() + Duration::days(10));
}

#[tokio::test]
async fn update_rejects_past_start_date() {
    let t = setup().await;
    let created = t.store.create_mailing(text("Hello")).await.unwrap();
    t.clock.advance(Duration::hours(1));

    let err = t
        .store
        .update_mailing(
            created.id,
            UpdateMailingDto {
                start_date: Some(t0()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("start_date"));

    let completed = t
        .store
        .update_mailing(
            created.id,
            UpdateMailingDto {
                is_completed: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(completed.is_completed);
    assert_eq!(completed.start_date, t0());
}

#[tokio::test]
async fn unknown_references_are_rejected() {
    let t = setup().await;
    let err = t
        .store
        .create_mailing(CreateMailingDto {
            operator_id: Some(99),
            ..text("Orphan")
        })
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("operator"));

    let err = t
        .store
        .create_mailing(CreateMailingDto {
            tag_id: Some(99),
            ..text("Orphan")
        })
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("tag"));
}

#[tokio::test]
async fn mailings_list_by_start_date() {
    let t = setup().await;
    for hours in [5, 1, 3] {
        t.store
            .create_mailing(CreateMailingDto {
                start_date: Some(t0() + Duration::hours(hours)),
                ..text(&format!("in {hours}h"))
            })
            .await
            .unwrap();
    }

    let texts: Vec<String> = t
        .store
        .list_mailings()
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.message_text)
        .collect();
    assert_eq!(texts, ["in 1h", "in 3h", "in 5h"]);
}

#[tokio::test]
async fn deleting_operator_or_tag_clears_mailing_references() {
    let t = setup().await;
    let amy = operator(&t.store, "Amy").await;
    let tag = t
        .store
        .create_tag(CreateTagDto {
            name: "promo".to_string(),
        })
        .await
        .unwrap();
    let created = t
        .store
        .create_mailing(CreateMailingDto {
            operator_id: Some(amy.id),
            tag_id: Some(tag.id),
            ..text("Promo")
        })
        .await
        .unwrap();

    t.clock.advance(Duration::minutes(1));
    t.store.delete_operator(amy.id).await.unwrap();
    let after_operator = t.store.get_mailing(created.id).await.unwrap();
    assert_eq!(after_operator.operator_id, None);
    assert_eq!(after_operator.tag_id, Some(tag.id));
    assert_eq!(after_operator.changed_date, t0() + Duration::minutes(1));

    t.store.delete_tag(tag.id).await.unwrap();
    let after_tag = t.store.get_mailing(created.id).await.unwrap();
    assert_eq!(after_tag.tag_id, None);
    assert_eq!(after_tag.stop_date, created.stop_date);
}
