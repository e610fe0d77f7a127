//! Probe and publisher behavior against the simulated platform

use mockloc_core::fix::{build_fix, DEFAULT_ACCURACY_M};
use mockloc_core::model::{PublisherMode, Waypoint};
use mockloc_core::probe;
use mockloc_core::publisher::MockPublisher;
use mockloc_core::units::MetersPerSecond;
use mockloc_core::LocationPlatform;
use mockloc_core::StartError;
use mockloc_platform::SimulatedPlatform;
use std::sync::Arc;
use std::time::Duration;

fn fix() -> mockloc_core::Fix {
    build_fix(Waypoint::new(28.61, 77.20), MetersPerSecond(10.0), DEFAULT_ACCURACY_M)
}

// ==================== Capability probe ====================

#[tokio::test(start_paused = true)]
async fn test_probe_succeeds_first_attempt() {
    let platform = SimulatedPlatform::new();
    let ok = probe::try_enable_managed_mock(&platform, 3, Duration::from_millis(250)).await;
    assert!(ok);
    assert!(platform.mock_mode_enabled());
}

#[tokio::test(start_paused = true)]
async fn test_probe_retries_through_transient_denials() {
    let platform = SimulatedPlatform::new().deny_managed_attempts(2);
    let ok = probe::try_enable_managed_mock(&platform, 3, Duration::from_millis(250)).await;
    assert!(ok, "third attempt should succeed");
    assert!(platform.mock_mode_enabled());
}

#[tokio::test(start_paused = true)]
async fn test_probe_gives_up_after_exhausting_retries() {
    let platform = SimulatedPlatform::new().deny_managed_attempts(3);
    let ok = probe::try_enable_managed_mock(&platform, 3, Duration::from_millis(250)).await;
    assert!(!ok);
    assert!(!platform.mock_mode_enabled());
}

#[test]
fn test_authorization_hint_degrades_to_false_on_error() {
    assert!(probe::is_mock_authorized(&SimulatedPlatform::new()));
    assert!(!probe::is_mock_authorized(
        &SimulatedPlatform::new().deny_authorization()
    ));
    assert!(!probe::is_mock_authorized(
        &SimulatedPlatform::new().authorization_unavailable()
    ));
}

// ==================== Mode selection ====================

#[tokio::test(start_paused = true)]
async fn test_select_mode_prefers_managed_channel() {
    let platform = Arc::new(SimulatedPlatform::new());
    let publisher = MockPublisher::new(platform.clone());

    let mode = publisher.select_mode().await.unwrap();
    assert_eq!(mode, PublisherMode::Managed);
    assert!(platform.mock_mode_enabled());
    assert!(!platform.test_provider_registered());
}

#[tokio::test(start_paused = true)]
async fn test_select_mode_falls_back_to_test_provider() {
    let platform = Arc::new(SimulatedPlatform::new().deny_managed_attempts(3));
    let publisher = MockPublisher::new(platform.clone());

    let mode = publisher.select_mode().await.unwrap();
    assert_eq!(mode, PublisherMode::TestProvider);
    assert!(!platform.mock_mode_enabled());
    assert!(platform.test_provider_registered());
}

#[tokio::test(start_paused = true)]
async fn test_select_mode_replaces_stale_test_provider() {
    // A registration left over from a crashed run must not wedge the
    // fallback path: remove-then-add yields a clean registration.
    let platform = Arc::new(SimulatedPlatform::new().deny_managed_attempts(3));
    platform.add_test_provider().unwrap();

    let publisher = MockPublisher::new(platform.clone());
    let mode = publisher.select_mode().await.unwrap();
    assert_eq!(mode, PublisherMode::TestProvider);
    assert!(platform.test_provider_registered());
}

#[tokio::test(start_paused = true)]
async fn test_select_mode_fails_when_both_channels_refused() {
    let platform = Arc::new(
        SimulatedPlatform::new()
            .deny_managed_attempts(3)
            .deny_test_provider(),
    );
    let publisher = MockPublisher::new(platform.clone());

    let err = publisher.select_mode().await.unwrap_err();
    assert_eq!(err, StartError::NoMockCapability);
}

// ==================== Publishing ====================

#[tokio::test(start_paused = true)]
async fn test_publish_managed_reaches_platform() {
    let platform = Arc::new(SimulatedPlatform::new());
    let publisher = MockPublisher::new(platform.clone());
    let mode = publisher.select_mode().await.unwrap();

    let f = fix();
    publisher.publish(mode, f.clone()).await;

    let injected = platform.injected_fixes();
    assert_eq!(injected.len(), 1);
    assert_eq!(injected[0].channel, PublisherMode::Managed);
    assert_eq!(injected[0].fix, f);
}

#[tokio::test(start_paused = true)]
async fn test_publish_test_provider_reaches_platform() {
    let platform = Arc::new(SimulatedPlatform::new().deny_managed_attempts(3));
    let publisher = MockPublisher::new(platform.clone());
    let mode = publisher.select_mode().await.unwrap();

    publisher.publish(mode, fix()).await;

    let injected = platform.injected_fixes();
    assert_eq!(injected.len(), 1);
    assert_eq!(injected[0].channel, PublisherMode::TestProvider);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_fix_is_swallowed() {
    let platform = Arc::new(SimulatedPlatform::new().deny_managed_push());
    let publisher = MockPublisher::new(platform.clone());
    let mode = publisher.select_mode().await.unwrap();
    assert_eq!(mode, PublisherMode::Managed);

    // Must not panic or error; the rejection is logged and ignored.
    publisher.publish(mode, fix()).await;
    assert!(platform.injected_fixes().is_empty());
}

// ==================== Teardown ====================

#[tokio::test(start_paused = true)]
async fn test_teardown_disables_managed_mode() {
    let platform = Arc::new(SimulatedPlatform::new());
    let publisher = MockPublisher::new(platform.clone());
    let mode = publisher.select_mode().await.unwrap();

    publisher.teardown(mode).await;
    assert!(!platform.mock_mode_enabled());
}

#[tokio::test(start_paused = true)]
async fn test_teardown_removes_test_provider() {
    let platform = Arc::new(SimulatedPlatform::new().deny_managed_attempts(3));
    let publisher = MockPublisher::new(platform.clone());
    let mode = publisher.select_mode().await.unwrap();

    publisher.teardown(mode).await;
    assert!(!platform.test_provider_registered());
}

#[tokio::test(start_paused = true)]
async fn test_teardown_is_idempotent() {
    for deny_managed in [0u32, 3u32] {
        let platform = Arc::new(SimulatedPlatform::new().deny_managed_attempts(deny_managed));
        let publisher = MockPublisher::new(platform.clone());
        let mode = publisher.select_mode().await.unwrap();

        publisher.teardown(mode).await;
        publisher.teardown(mode).await;

        assert!(!platform.mock_mode_enabled());
        assert!(!platform.test_provider_registered());
    }
}
