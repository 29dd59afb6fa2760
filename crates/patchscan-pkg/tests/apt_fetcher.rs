mod common;

use std::sync::Arc;

use common::*;
use patchscan_pkg::{AptFetcher, FetchError, FetcherConfig, HostRunner, UpdateFetcher};

const LOCK_HELD: &str = "/var/lib/dpkg/lock\n";

fn fetcher(executor: &Arc<MockExecutor>, config: &FetcherConfig) -> AptFetcher {
    AptFetcher::new(HostRunner::new(executor.clone(), config), config)
}

fn fast_polling() -> FetcherConfig {
    FetcherConfig {
        lock_poll_interval_ms: 1,
        ..FetcherConfig::default()
    }
}

#[tokio::test]
async fn test_refresh_then_lock_wait_then_simulation() {
    let executor = Arc::new(MockExecutor::new().ok("upgrade --dry-run", APT_SIMULATION));

    fetcher(&executor, &fast_polling()).updates().await.unwrap();

    let calls = executor.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls[0].contains("apt-get update -qq"));
    assert!(calls[0].contains("DEBIAN_FRONTEND=noninteractive"));
    assert!(calls[1].contains("/proc/locks"));
    assert!(calls[2].contains("apt-get upgrade --dry-run"));
}

#[tokio::test]
async fn test_waits_until_lock_released() {
    let executor = Arc::new(
        MockExecutor::new()
            .ok("/proc/locks", LOCK_HELD)
            .ok("/proc/locks", LOCK_HELD)
            .ok("/proc/locks", "")
            .ok("upgrade --dry-run", APT_SIMULATION),
    );

    let list = fetcher(&executor, &fast_polling()).updates().await.unwrap();

    assert_eq!(list.available.len(), 1);
    assert_eq!(executor.count("/proc/locks"), 3);
}

#[tokio::test]
async fn test_bounded_lock_wait() {
    let executor = Arc::new(MockExecutor::new().ok("/proc/locks", LOCK_HELD));
    let config = FetcherConfig {
        lock_timeout_secs: Some(0),
        ..fast_polling()
    };

    let result = fetcher(&executor, &config).updates().await;

    assert!(matches!(result, Err(FetchError::LockTimeout(_))));
    assert_eq!(executor.count("upgrade --dry-run"), 0);
}

#[tokio::test]
async fn test_refresh_failure_is_not_fatal() {
    let executor = Arc::new(
        MockExecutor::new()
            .on("apt-get update", 100, "", "W: Failed to fetch")
            .ok("upgrade --dry-run", APT_NOTHING),
    );

    let list = fetcher(&executor, &fast_polling()).updates().await.unwrap();

    assert!(list.available.is_empty());
}

#[tokio::test]
async fn test_sudo_applies_to_refresh_not_simulation() {
    let executor = Arc::new(MockExecutor::new().ok("upgrade --dry-run", APT_NOTHING));
    let config = FetcherConfig {
        use_sudo: true,
        ..fast_polling()
    };

    fetcher(&executor, &config).updates().await.unwrap();

    let calls = executor.calls();
    assert!(calls[0].starts_with("sudo "));
    assert!(calls[1].starts_with("sudo "));
    assert!(!calls[2].starts_with("sudo "));
}

#[tokio::test]
async fn test_patches_never_run_commands() {
    let executor = Arc::new(MockExecutor::new());

    let patches = fetcher(&executor, &fast_polling()).patches().await.unwrap();

    assert!(patches.is_empty());
    assert!(executor.calls().is_empty());
}
