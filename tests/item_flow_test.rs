mod common;

use add_basket_items::config::Timings;
use add_basket_items::infrastructure::Rect;
use add_basket_items::models::selector::{
    BACK_BUTTON, INCREMENT_BUTTON, SEARCH_BOX, SEARCH_SUBMIT_BUTTON,
};
use add_basket_items::models::{LogSink, Platform, ProgressStatus, RequestedItem};
use add_basket_items::workflow::{FailureReason, ItemCtx, ItemFlow, ItemOutcome, Phase};
use common::{Call, FakeDriver, RecordingSink, ADD_ID, PRODUCT_ID, SEARCH_BOX_ID, SUBMIT_ID};

fn flow() -> ItemFlow {
    ItemFlow::with_timings(Timings::default())
}

fn ctx(name: &str, quantity: u32, platform: Platform) -> ItemCtx {
    let item = RequestedItem::new(name, quantity).unwrap();
    ItemCtx::new(1, 1, &item, platform, 25.0)
}

#[tokio::test(start_paused = true)]
async fn happy_path_walks_every_phase() {
    let driver = FakeDriver::happy_path(Platform::Ios, &["melk"]);
    let sink = RecordingSink::default();

    let report = flow().run(&driver, &ctx("melk", 1, Platform::Ios), &sink).await;

    assert_eq!(report.outcome, ItemOutcome::Added);
    assert_eq!(
        report.trace,
        [
            Phase::Idle,
            Phase::Searching,
            Phase::Submitting,
            Phase::SelectingProduct,
            Phase::AddingToCart,
            Phase::Done
        ]
    );
    assert_eq!(driver.submitted_queries(), ["melk"]);
    assert_eq!(driver.clicks_on(ADD_ID), 1);
    assert_eq!(driver.backs(), 1);

    let statuses: Vec<_> = sink.events().iter().map(|e| e.status).collect();
    assert_eq!(
        statuses,
        [
            ProgressStatus::Searching,
            ProgressStatus::SelectingProduct,
            ProgressStatus::AddingToBasket
        ]
    );
    assert!(sink
        .events()
        .iter()
        .all(|e| e.current_item.as_deref() == Some("melk")));
}

#[tokio::test(start_paused = true)]
async fn typing_is_one_character_at_a_time() {
    let driver = FakeDriver::happy_path(Platform::Android, &["kaas"]);

    flow()
        .run(&driver, &ctx("kaas", 1, Platform::Android), &LogSink)
        .await;

    let single_chars: Vec<_> = driver
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::SendKeys(id, text) if id == SEARCH_BOX_ID && text.chars().count() == 1 => {
                Some(text)
            }
            _ => None,
        })
        .filter(|t| t.chars().all(|c| c.is_alphabetic()))
        .collect();
    assert_eq!(single_chars, ["k", "a", "a", "s"]);
    assert!(driver.calls().contains(&Call::Clear(SEARCH_BOX_ID.to_string())));
}

#[tokio::test(start_paused = true)]
async fn quantity_means_that_many_taps() {
    let driver = FakeDriver::happy_path(Platform::Android, &["kaas"]);

    let report = flow()
        .run(&driver, &ctx("kaas", 3, Platform::Android), &LogSink)
        .await;

    assert!(report.is_added());
    assert_eq!(report.tap_attempts, 3);
    assert_eq!(driver.clicks_on(ADD_ID), 3);
}

#[tokio::test(start_paused = true)]
async fn increment_control_is_preferred_for_repeats() {
    let driver = FakeDriver::happy_path(Platform::Ios, &["melk"]);
    driver.register(&INCREMENT_BUTTON, "plus");

    let report = flow()
        .run(&driver, &ctx("melk", 2, Platform::Ios), &LogSink)
        .await;

    assert_eq!(report.tap_attempts, 2);
    assert_eq!(driver.clicks_on(ADD_ID), 1);
    assert_eq!(driver.clicks_on("plus"), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_repeats_fall_back_to_coordinates_and_keep_counting() {
    let driver = FakeDriver::happy_path(Platform::Android, &["melk"]);
    // 第一次点击之后按钮变成了数量控件，原生点击不再可用
    driver.limit_clicks(ADD_ID, 1);

    let report = flow()
        .run(&driver, &ctx("melk", 3, Platform::Android), &LogSink)
        .await;

    assert!(report.is_added());
    assert_eq!(report.tap_attempts, 3);
    assert_eq!(driver.clicks_on(ADD_ID), 1);
    assert_eq!(driver.executes("mobile: clickGesture"), 2);
}

#[tokio::test(start_paused = true)]
async fn missing_search_box_fails_the_item() {
    let driver = FakeDriver::new(Platform::Android);

    let report = flow()
        .run(&driver, &ctx("brood", 1, Platform::Android), &LogSink)
        .await;

    assert_eq!(
        report.outcome,
        ItemOutcome::Failed(FailureReason::SearchBoxNotFound)
    );
    assert_eq!(report.trace.last(), Some(&Phase::Failed));
    assert!(!report.session_suspect);
    // 失败后也会返回
    assert_eq!(driver.backs(), 1);
}

#[tokio::test(start_paused = true)]
async fn unknown_product_fails_after_search() {
    let driver = FakeDriver::happy_path(Platform::Ios, &["melk"]);

    let report = flow()
        .run(&driver, &ctx("appels", 1, Platform::Ios), &LogSink)
        .await;

    assert_eq!(report.outcome, ItemOutcome::Failed(FailureReason::ProductNotFound));
    assert_eq!(driver.submitted_queries(), ["appels"]);
    assert_eq!(driver.clicks_on(ADD_ID), 0);
}

#[tokio::test(start_paused = true)]
async fn add_button_found_by_scanning_labels() {
    let driver = FakeDriver::new(Platform::Android);
    driver.register(&SEARCH_BOX, SEARCH_BOX_ID);
    driver.register_gated(&add_basket_items::models::selector::FIRST_PRODUCT, "product");
    driver.set_catalog(&["melk"]);
    driver.add_scannable_button("btn-fav", &[("text", "Bewaar als favoriet")]);
    driver.add_scannable_button("btn-add", &[("text", "Voeg toe"), ("content-desc", "mandje")]);

    let report = flow()
        .run(&driver, &ctx("melk", 1, Platform::Android), &LogSink)
        .await;

    assert!(report.is_added());
    assert_eq!(driver.clicks_on("btn-add"), 1);
    assert_eq!(driver.clicks_on("btn-fav"), 0);
}

#[tokio::test(start_paused = true)]
async fn favourite_button_alone_is_never_tapped() {
    let driver = FakeDriver::new(Platform::Ios);
    driver.register(&SEARCH_BOX, SEARCH_BOX_ID);
    driver.register_gated(&add_basket_items::models::selector::FIRST_PRODUCT, "product");
    driver.set_catalog(&["melk"]);
    driver.add_scannable_button("btn-fav", &[("name", "Bewaar als favoriet"), ("label", "Add")]);

    let report = flow()
        .run(&driver, &ctx("melk", 1, Platform::Ios), &LogSink)
        .await;

    assert_eq!(
        report.outcome,
        ItemOutcome::Failed(FailureReason::AddButtonNotFound)
    );
    assert_eq!(driver.clicks_on("btn-fav"), 0);
}

#[tokio::test(start_paused = true)]
async fn back_navigation_falls_back_per_platform() {
    let android = FakeDriver::happy_path(Platform::Android, &["melk"]);
    android.fail_back(true);
    flow()
        .run(&android, &ctx("melk", 1, Platform::Android), &LogSink)
        .await;
    assert!(android.calls().contains(&Call::Keycode(4)));

    let ios = FakeDriver::happy_path(Platform::Ios, &["melk"]);
    ios.fail_back(true);
    ios.register(&BACK_BUTTON, "nav-back");
    let report = flow().run(&ios, &ctx("melk", 1, Platform::Ios), &LogSink).await;
    assert!(report.is_added());
    assert_eq!(ios.clicks_on("nav-back"), 1);
}

#[tokio::test(start_paused = true)]
async fn dead_driver_marks_session_suspect() {
    let driver = FakeDriver::happy_path(Platform::Android, &["melk"]);
    driver.set_transport_down(true);

    let report = flow()
        .run(&driver, &ctx("melk", 1, Platform::Android), &LogSink)
        .await;

    assert_eq!(
        report.outcome,
        ItemOutcome::Failed(FailureReason::SearchBoxNotFound)
    );
    assert!(report.session_suspect);
}

#[tokio::test(start_paused = true)]
async fn coordinate_repeat_uses_position_after_scroll() {
    let driver = FakeDriver::happy_path(Platform::Android, &["melk"]);
    driver.limit_clicks(ADD_ID, 1);
    driver.move_on_scroll(
        ADD_ID,
        Rect {
            x: 10.0,
            y: 500.0,
            width: 100.0,
            height: 40.0,
        },
    );

    let report = flow()
        .run(&driver, &ctx("melk", 2, Platform::Android), &LogSink)
        .await;

    assert!(report.is_added());
    assert_eq!(report.tap_attempts, 2);
    let taps = driver.execute_args("mobile: clickGesture");
    assert_eq!(taps.len(), 1);
    assert_eq!(taps[0]["x"].as_f64(), Some(60.0));
    assert_eq!(taps[0]["y"].as_f64(), Some(520.0));
}

#[tokio::test(start_paused = true)]
async fn product_tap_falls_through_to_touch_gesture() {
    let driver = FakeDriver::happy_path(Platform::Ios, &["melk"]);
    driver.limit_clicks(PRODUCT_ID, 0);
    driver.fail_execute(true);

    let report = flow()
        .run(&driver, &ctx("melk", 1, Platform::Ios), &LogSink)
        .await;

    assert_eq!(report.outcome, ItemOutcome::Added);
    assert_eq!(driver.executes("mobile: tap"), 1);
    assert_eq!(
        driver.calls().iter().filter(|c| **c == Call::Actions).count(),
        1
    );
    assert_eq!(driver.clicks_on(ADD_ID), 1);
}

#[tokio::test(start_paused = true)]
async fn product_tap_fails_when_every_tier_fails() {
    let driver = FakeDriver::happy_path(Platform::Android, &["melk"]);
    driver.limit_clicks(PRODUCT_ID, 0);
    driver.fail_execute(true);
    driver.fail_actions(true);

    let report = flow()
        .run(&driver, &ctx("melk", 1, Platform::Android), &LogSink)
        .await;

    assert_eq!(
        report.outcome,
        ItemOutcome::Failed(FailureReason::ProductTapFailed)
    );
    assert_eq!(report.trace.last(), Some(&Phase::Failed));
    assert!(driver.calls().contains(&Call::Actions));
    assert_eq!(driver.clicks_on(ADD_ID), 0);
    assert_eq!(driver.backs(), 1);
}

#[tokio::test(start_paused = true)]
async fn add_button_tap_fails_when_every_tier_fails() {
    let driver = FakeDriver::happy_path(Platform::Ios, &["melk"]);
    driver.limit_clicks(ADD_ID, 0);
    driver.fail_execute(true);
    driver.fail_actions(true);

    let report = flow()
        .run(&driver, &ctx("melk", 3, Platform::Ios), &LogSink)
        .await;

    assert_eq!(
        report.outcome,
        ItemOutcome::Failed(FailureReason::AddButtonTapFailed)
    );
    assert_eq!(report.tap_attempts, 1);
    assert_eq!(driver.backs(), 1);
}

#[tokio::test(start_paused = true)]
async fn search_button_submits_when_enter_key_fails() {
    let driver = FakeDriver::happy_path(Platform::Android, &["kaas"]);
    driver.register(&SEARCH_SUBMIT_BUTTON, SUBMIT_ID);
    driver.fail_enter(true);

    let report = flow()
        .run(&driver, &ctx("kaas", 1, Platform::Android), &LogSink)
        .await;

    assert_eq!(report.outcome, ItemOutcome::Added);
    assert!(report.trace.contains(&Phase::SelectingProduct));
    assert!(driver.submitted_queries().is_empty());
    assert_eq!(driver.clicks_on(SUBMIT_ID), 1);
    assert_eq!(driver.clicks_on(ADD_ID), 1);
}

#[tokio::test(start_paused = true)]
async fn failing_scroll_never_fails_the_item() {
    let android = FakeDriver::happy_path(Platform::Android, &["melk"]);
    android.fail_execute(true);
    let report = flow()
        .run(&android, &ctx("melk", 1, Platform::Android), &LogSink)
        .await;
    assert!(report.is_added());
    // 每个元素先尝试 toVisible，再按位置做手势滚动
    assert_eq!(android.executes("mobile: scroll"), 3);
    assert_eq!(android.executes("mobile: scrollGesture"), 3);

    let ios = FakeDriver::happy_path(Platform::Ios, &["melk"]);
    ios.fail_execute(true);
    let report = flow().run(&ios, &ctx("melk", 1, Platform::Ios), &LogSink).await;
    assert!(report.is_added());
    assert_eq!(ios.executes("mobile: scroll"), 6);
}
