//! End-to-end tests wiring the scheduler to the simulated host.
//!
//! Time is paused, so every run is deterministic and instantaneous.

use std::sync::Arc;
use std::time::Duration;

use autoresume_adapter_virtual_dom::{DemoConfig, NodeId, SimulatedHost, VirtualDocument};
use autoresume_app::ports::{Document, MonotonicClock};
use autoresume_app::scheduler::{Scheduler, SchedulerHandle};
use autoresume_domain::layout::HostLayout;
use autoresume_domain::settings::AutomationSettings;
use autoresume_domain::state::SessionPhase;
use tokio::task::JoinHandle;

const CONTROL: &str = ".cursor-auto-resume-btn";

struct Harness {
    document: Arc<VirtualDocument>,
    handle: SchedulerHandle,
    scheduler: JoinHandle<()>,
    host: JoinHandle<()>,
}

impl Harness {
    fn start(demo: DemoConfig, settings: AutomationSettings) -> Self {
        let document = Arc::new(VirtualDocument::new());
        let host = SimulatedHost::start(Arc::clone(&document), demo);
        let (scheduler, handle) = Scheduler::new(
            Arc::clone(&document),
            MonotonicClock::new(),
            settings,
            HostLayout::default(),
        )
        .unwrap();
        Self {
            document,
            handle,
            scheduler: tokio::spawn(scheduler.run()),
            host,
        }
    }

    fn count(&self, selector: &str) -> usize {
        self.document.find(selector).unwrap().len()
    }

    fn control(&self) -> NodeId {
        let controls = self.document.find(CONTROL).unwrap();
        assert_eq!(controls.len(), 1, "expected exactly one control");
        controls[0]
    }

    async fn stop(self) {
        self.handle.shutdown().await.unwrap();
        self.scheduler.await.unwrap();
        self.host.abort();
    }
}

fn demo(notice_interval_ms: u64) -> DemoConfig {
    DemoConfig {
        startup_delay_ms: 500,
        rerender_interval_ms: 2_000,
        notice_interval_ms,
        history_limit: 20,
    }
}

async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn should_inject_control_once_composer_renders() {
    let harness = Harness::start(demo(0), AutomationSettings::default());

    sleep_ms(200).await;
    assert_eq!(harness.count(CONTROL), 0);

    sleep_ms(1_500).await;
    let control = harness.control();
    let bar = harness.document.find(".composer-button-area").unwrap()[0];
    assert!(harness.document.contains(&bar, &control));
    assert_eq!(
        harness.document.attribute(&control, "title").as_deref(),
        Some("Auto-resume is ON - Click to disable")
    );

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn should_keep_single_control_across_rerenders() {
    let harness = Harness::start(demo(0), AutomationSettings::default());

    for _ in 0..4 {
        sleep_ms(2_000).await;
        harness.control();
    }
    assert!(harness.handle.status().await.unwrap().control_present);

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn should_resolve_notices_within_cooldown() {
    let harness = Harness::start(demo(1_000), AutomationSettings::default());

    sleep_ms(10_500).await;

    let clicks = harness.handle.status().await.unwrap().clicks;
    let remaining = u64::try_from(harness.count(".notice")).unwrap();
    assert!((1..=4).contains(&clicks), "clicks = {clicks}");
    assert_eq!(remaining + clicks, 10);

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn should_stop_clicking_once_session_expires() {
    let settings = AutomationSettings {
        max_duration_ms: Some(2_500),
        ..AutomationSettings::default()
    };
    let harness = Harness::start(demo(1_000), settings);

    sleep_ms(10_500).await;

    let status = harness.handle.status().await.unwrap();
    assert_eq!(status.phase, SessionPhase::Expired);
    assert_eq!(status.clicks, 1);
    assert_eq!(harness.count(".notice"), 9);
    assert!(!harness.handle.reset_session().await.unwrap());

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn should_pause_when_control_is_clicked() {
    let harness = Harness::start(demo(0), AutomationSettings::default());
    sleep_ms(1_000).await;

    harness.document.click(&harness.control()).unwrap();
    sleep_ms(10).await;

    assert!(!harness.handle.status().await.unwrap().active);
    assert_eq!(
        harness.document.attribute(&harness.control(), "title").as_deref(),
        Some("Auto-resume is OFF - Click to enable")
    );

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn should_leave_notices_alone_while_paused() {
    let settings = AutomationSettings {
        start_active: false,
        ..AutomationSettings::default()
    };
    let harness = Harness::start(demo(1_000), settings);

    sleep_ms(5_500).await;
    assert_eq!(harness.count(".notice"), 5);
    assert_eq!(harness.handle.status().await.unwrap().clicks, 0);

    assert!(harness.handle.toggle().await.unwrap());
    sleep_ms(1_200).await;
    assert_eq!(harness.handle.status().await.unwrap().clicks, 1);

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn should_remove_control_on_shutdown() {
    let harness = Harness::start(demo(0), AutomationSettings::default());
    sleep_ms(1_000).await;
    assert_eq!(harness.count(CONTROL), 1);

    let document = Arc::clone(&harness.document);
    harness.stop().await;

    assert!(document.find(CONTROL).unwrap().is_empty());
}
