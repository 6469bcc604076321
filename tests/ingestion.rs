//! End-to-end ingestion cycles against a mocked feed server and a real
//! SQLite file.

mod common;

use std::time::Duration;

use common::{alert, item, mount_feed, mount_status, rss, TestContext, TestItem};
use ticker_news::ingest::CycleReport;
use ticker_news::models::{FeedConfig, NewsFilter, MAX_TITLE_LEN};
use ticker_news::services::Scheduler;
use tokio_test::assert_ok;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

fn apple_and_microsoft() -> String {
    rss(&[
        item(
            "Apple Reports Strong Q4 Earnings",
            "https://x/1",
            Some("AAPL stock rises"),
        ),
        item("Microsoft Azure Growth", "https://x/2", None),
    ])
}

#[tokio::test]
async fn stores_only_entries_matching_active_alerts() {
    let ctx = TestContext::new().await;
    assert_ok!(ctx.repository.create_alert(alert("AAPL", None, true)).await);
    mount_feed(&ctx.feeds, "/markets", apple_and_microsoft()).await;

    let coordinator = ctx.coordinator(vec![ctx.feed("Markets", "/markets")]);
    let report = coordinator.run_cycle().await;

    assert_eq!(report.committed, 1);
    assert_eq!(report.feeds_processed, 1);

    let (items, total) = ctx.repository.list_news(NewsFilter::default()).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(items[0].link, "https://x/1");
    assert_eq!(items[0].source, "Markets");
    assert_eq!(items[0].description.as_deref(), Some("AAPL stock rises"));
    assert!(items[0].keywords_matched.split(',').any(|k| k == "AAPL"));
    assert!(items[0].is_relevant);
}

#[tokio::test]
async fn second_cycle_over_unchanged_feed_commits_nothing() {
    let ctx = TestContext::new().await;
    assert_ok!(ctx.repository.create_alert(alert("AAPL", None, true)).await);
    mount_feed(&ctx.feeds, "/markets", apple_and_microsoft()).await;

    let coordinator = ctx.coordinator(vec![ctx.feed("Markets", "/markets")]);
    assert_eq!(coordinator.run_cycle().await.committed, 1);

    let second = coordinator.run_cycle().await;
    assert_eq!(second.committed, 0);
    assert_eq!(second.feeds_failed, 0);

    let (_, total) = ctx.repository.list_news(NewsFilter::default()).await.unwrap();
    assert_eq!(total, 1);
}

#[tokio::test]
async fn message_words_act_as_keywords() {
    let ctx = TestContext::new().await;
    assert_ok!(
        ctx.repository
            .create_alert(alert("TSLA", Some("Tesla earnings report"), true))
            .await
    );
    mount_feed(
        &ctx.feeds,
        "/markets",
        rss(&[
            item("Quarterly earnings beat across the board", "https://x/10", None),
            item("Price alert fatigue sets in", "https://x/11", None),
            item("Fed holds rates", "https://x/12", None),
        ]),
    )
    .await;

    let coordinator = ctx.coordinator(vec![ctx.feed("Markets", "/markets")]);
    let report = coordinator.run_cycle().await;

    assert_eq!(report.committed, 1);
    let (items, _) = ctx.repository.list_news(NewsFilter::default()).await.unwrap();
    assert_eq!(items[0].link, "https://x/10");
    assert_eq!(items[0].keywords_matched, "EARNINGS");
}

#[tokio::test]
async fn inactive_alerts_do_not_drive_ingestion() {
    let ctx = TestContext::new().await;
    assert_ok!(ctx.repository.create_alert(alert("AAPL", None, false)).await);
    Mock::given(method("GET"))
        .and(path("/markets"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(apple_and_microsoft(), "application/rss+xml"),
        )
        .expect(0)
        .mount(&ctx.feeds)
        .await;

    let coordinator = ctx.coordinator(vec![ctx.feed("Markets", "/markets")]);
    let report = coordinator.run_cycle().await;

    assert_eq!(report.committed, 0);
    assert_eq!(report.feeds_processed, 0);
}

#[tokio::test]
async fn failing_feeds_do_not_stop_the_cycle() {
    let ctx = TestContext::new().await;
    assert_ok!(ctx.repository.create_alert(alert("AAPL", None, true)).await);

    mount_status(&ctx.feeds, "/broken", 500).await;
    mount_feed(
        &ctx.feeds,
        "/first",
        rss(&[item("AAPL hits record", "https://x/20", None)]),
    )
    .await;
    mount_feed(&ctx.feeds, "/garbage", "this is not a feed".to_string()).await;
    mount_feed(
        &ctx.feeds,
        "/second",
        rss(&[item("Analysts upgrade AAPL", "https://x/21", None)]),
    )
    .await;

    let coordinator = ctx.coordinator(vec![
        ctx.feed("Broken", "/broken"),
        ctx.feed("First", "/first"),
        FeedConfig::new("Unreachable", "http://127.0.0.1:9/rss"),
        ctx.feed("Garbage", "/garbage"),
        ctx.feed("Second", "/second"),
    ]);
    let report = coordinator.run_cycle().await;

    assert_eq!(report.committed, 2);
    assert_eq!(report.feeds_processed, 2);
    assert_eq!(report.feeds_failed, 3);
}

#[tokio::test]
async fn disabled_feeds_are_never_fetched() {
    let ctx = TestContext::new().await;
    assert_ok!(ctx.repository.create_alert(alert("AAPL", None, true)).await);
    Mock::given(method("GET"))
        .and(path("/paused"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(apple_and_microsoft(), "application/rss+xml"),
        )
        .expect(0)
        .mount(&ctx.feeds)
        .await;

    let mut paused = ctx.feed("Paused", "/paused");
    paused.enabled = false;

    let report = ctx.coordinator(vec![paused]).run_cycle().await;
    assert_eq!(report.committed, 0);
}

#[tokio::test]
async fn long_titles_are_truncated_in_storage() {
    let ctx = TestContext::new().await;
    assert_ok!(ctx.repository.create_alert(alert("AAPL", None, true)).await);
    let title = format!("AAPL {}", "x".repeat(MAX_TITLE_LEN + 100));
    mount_feed(
        &ctx.feeds,
        "/markets",
        rss(&[item(&title, "https://x/30", None)]),
    )
    .await;

    let report = ctx
        .coordinator(vec![ctx.feed("Markets", "/markets")])
        .run_cycle()
        .await;
    assert_eq!(report.committed, 1);

    let (items, _) = ctx.repository.list_news(NewsFilter::default()).await.unwrap();
    assert_eq!(items[0].title.chars().count(), MAX_TITLE_LEN);
}

#[tokio::test]
async fn entries_missing_title_or_link_are_ignored() {
    let ctx = TestContext::new().await;
    assert_ok!(ctx.repository.create_alert(alert("AAPL", None, true)).await);
    mount_feed(
        &ctx.feeds,
        "/markets",
        rss(&[
            TestItem {
                title: None,
                link: Some("https://x/40"),
                description: Some("AAPL without a title"),
            },
            TestItem {
                title: Some("AAPL without a link"),
                link: None,
                description: None,
            },
            item("AAPL with everything", "https://x/41", None),
        ]),
    )
    .await;

    let report = ctx
        .coordinator(vec![ctx.feed("Markets", "/markets")])
        .run_cycle()
        .await;

    assert_eq!(report.committed, 1);
    assert_eq!(report.feeds_failed, 0);
}

#[tokio::test]
async fn duplicate_links_within_a_feed_are_skipped() {
    let ctx = TestContext::new().await;
    assert_ok!(ctx.repository.create_alert(alert("AAPL", None, true)).await);
    mount_feed(
        &ctx.feeds,
        "/markets",
        rss(&[
            item("AAPL morning update", "https://x/50", None),
            item("AAPL morning update (repost)", "https://x/50", None),
            item("AAPL closing bell", "https://x/51", None),
        ]),
    )
    .await;

    let report = ctx
        .coordinator(vec![ctx.feed("Markets", "/markets")])
        .run_cycle()
        .await;

    assert_eq!(report.committed, 2);
    assert_eq!(report.duplicates_skipped, 1);
    assert_eq!(report.feeds_failed, 0);
}

#[tokio::test]
async fn a_link_seen_in_an_earlier_feed_is_not_stored_twice() {
    let ctx = TestContext::new().await;
    assert_ok!(ctx.repository.create_alert(alert("AAPL", None, true)).await);
    let body = rss(&[item("AAPL syndicated story", "https://x/60", None)]);
    mount_feed(&ctx.feeds, "/one", body.clone()).await;
    mount_feed(&ctx.feeds, "/two", body).await;

    let report = ctx
        .coordinator(vec![ctx.feed("One", "/one"), ctx.feed("Two", "/two")])
        .run_cycle()
        .await;

    assert_eq!(report.committed, 1);
    let (items, _) = ctx.repository.list_news(NewsFilter::default()).await.unwrap();
    assert_eq!(items[0].source, "One");
}

#[tokio::test]
async fn overlapping_cycles_are_serialised() {
    let ctx = TestContext::new().await;
    assert_ok!(ctx.repository.create_alert(alert("AAPL", None, true)).await);
    mount_feed(&ctx.feeds, "/markets", apple_and_microsoft()).await;

    let coordinator = ctx.coordinator(vec![ctx.feed("Markets", "/markets")]);
    let (first, second) = tokio::join!(coordinator.run_cycle(), coordinator.run_cycle());

    assert_eq!(first.committed + second.committed, 1);
    assert_eq!(first.duplicates_skipped + second.duplicates_skipped, 0);
}

#[tokio::test]
async fn a_failed_commit_discards_only_that_feed() {
    let ctx = TestContext::new().await;
    assert_ok!(ctx.repository.create_alert(alert("AAPL", None, true)).await);
    ctx.raw_connection()
        .execute_batch(
            "CREATE TRIGGER reject_bad_feed BEFORE INSERT ON news_items
             WHEN NEW.source = 'Bad'
             BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
        )
        .unwrap();

    mount_feed(
        &ctx.feeds,
        "/bad",
        rss(&[
            item("AAPL first", "https://x/b1", None),
            item("AAPL second", "https://x/b2", None),
        ]),
    )
    .await;
    mount_feed(
        &ctx.feeds,
        "/good",
        rss(&[item("AAPL holds gains", "https://x/g1", None)]),
    )
    .await;

    let report = ctx
        .coordinator(vec![ctx.feed("Bad", "/bad"), ctx.feed("Good", "/good")])
        .run_cycle()
        .await;

    assert_eq!(report.committed, 1);
    assert_eq!(report.feeds_processed, 1);
    assert_eq!(report.feeds_failed, 1);
    assert_eq!(report.duplicates_skipped, 0);

    let (items, total) = ctx.repository.list_news(NewsFilter::default()).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(items[0].link, "https://x/g1");
    assert!(!ctx.repository.news_link_exists("https://x/b1").await.unwrap());
}

#[tokio::test]
async fn unreadable_alerts_end_the_cycle_before_fetching() {
    let ctx = TestContext::new().await;
    assert_ok!(ctx.repository.create_alert(alert("AAPL", None, true)).await);
    ctx.raw_connection().execute_batch("DROP TABLE alerts;").unwrap();
    Mock::given(method("GET"))
        .and(path("/markets"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(apple_and_microsoft(), "application/rss+xml"),
        )
        .expect(0)
        .mount(&ctx.feeds)
        .await;

    let report = ctx
        .coordinator(vec![ctx.feed("Markets", "/markets")])
        .run_cycle()
        .await;

    assert_eq!(report, CycleReport::default());
}

#[tokio::test]
async fn manual_trigger_runs_the_cycle_on_its_own_task() {
    let ctx = TestContext::new().await;
    assert_ok!(ctx.repository.create_alert(alert("AAPL", None, true)).await);
    mount_feed(&ctx.feeds, "/markets", apple_and_microsoft()).await;

    let coordinator = ctx.coordinator(vec![ctx.feed("Markets", "/markets")]);
    let scheduler = Scheduler::new(coordinator, Duration::from_secs(3600));

    let report = scheduler.trigger().await.unwrap().expect("cycle completed");
    assert_eq!(report.committed, 1);
    assert_eq!(report.feeds_processed, 1);
}

#[tokio::test]
async fn scheduler_loop_ingests_on_startup() {
    let ctx = TestContext::new().await;
    assert_ok!(ctx.repository.create_alert(alert("AAPL", None, true)).await);
    mount_feed(&ctx.feeds, "/markets", apple_and_microsoft()).await;

    let coordinator = ctx.coordinator(vec![ctx.feed("Markets", "/markets")]);
    let handle = Scheduler::new(coordinator, Duration::from_secs(3600)).start();

    let mut total = 0;
    for _ in 0..50 {
        let (_, count) = ctx.repository.list_news(NewsFilter::default()).await.unwrap();
        total = count;
        if total > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    handle.abort();

    assert_eq!(total, 1);
}
