use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration as StdDuration,
};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use spotlite::config::AuthConfig;
use spotlite::management::{
    AuthError, CredentialManager, FileStore, KEY_ACCESS_TOKEN, KEY_EXPIRES_AT, KEY_REFRESH_TOKEN,
    MemoryStore, PreferenceStore, StoreError, TokenEndpoint,
};
use spotlite::types::TokenResponse;
use tokio::sync::Semaphore;

// Token endpoint double. Refreshes block on `gate` until the test releases
// them, so overlapping callers can be lined up deterministically.
struct Inner {
    refresh_calls: AtomicUsize,
    exchange_calls: AtomicUsize,
    gate: Semaphore,
    refresh_result: Mutex<Result<TokenResponse, AuthError>>,
    exchange_result: Mutex<Result<TokenResponse, AuthError>>,
}

#[derive(Clone)]
struct FakeEndpoint {
    inner: Arc<Inner>,
}

impl FakeEndpoint {
    fn new(gated: bool) -> Self {
        let permits = if gated { 0 } else { Semaphore::MAX_PERMITS };
        Self {
            inner: Arc::new(Inner {
                refresh_calls: AtomicUsize::new(0),
                exchange_calls: AtomicUsize::new(0),
                gate: Semaphore::new(permits),
                refresh_result: Mutex::new(Ok(token("fresh", Some("refresh-2")))),
                exchange_result: Mutex::new(Ok(token("signed-in", Some("refresh-1")))),
            }),
        }
    }

    fn refresh_answers(&self, result: Result<TokenResponse, AuthError>) {
        *self.inner.refresh_result.lock().unwrap() = result;
    }

    fn exchange_answers(&self, result: Result<TokenResponse, AuthError>) {
        *self.inner.exchange_result.lock().unwrap() = result;
    }

    fn release(&self) {
        self.inner.gate.add_permits(1);
    }

    fn refresh_calls(&self) -> usize {
        self.inner.refresh_calls.load(Ordering::SeqCst)
    }

    fn exchange_calls(&self) -> usize {
        self.inner.exchange_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenEndpoint for FakeEndpoint {
    async fn exchange_code(&self, _code: &str) -> Result<TokenResponse, AuthError> {
        self.inner.exchange_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.exchange_result.lock().unwrap().clone()
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<TokenResponse, AuthError> {
        self.inner.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.gate.acquire().await.unwrap().forget();
        self.inner.refresh_result.lock().unwrap().clone()
    }
}

fn token(access_token: &str, refresh_token: Option<&str>) -> TokenResponse {
    TokenResponse {
        access_token: access_token.to_string(),
        refresh_token: refresh_token.map(str::to_string),
        expires_in: 3600,
        scope: None,
        token_type: Some("Bearer".to_string()),
    }
}

fn config() -> AuthConfig {
    AuthConfig {
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        redirect_uri: "http://127.0.0.1:8888/callback".to_string(),
        scope: "user-read-private".to_string(),
        authorize_url: "https://accounts.spotify.com/authorize".to_string(),
        token_url: "https://accounts.spotify.com/api/token".to_string(),
    }
}

fn store_expiring_in(expires_in: Duration) -> MemoryStore {
    let store = MemoryStore::new();
    store.set(KEY_ACCESS_TOKEN, "stale");
    store.set(KEY_REFRESH_TOKEN, "refresh-1");
    store.set(KEY_EXPIRES_AT, &(Utc::now() + expires_in).to_rfc3339());
    store
}

fn manager(
    store: MemoryStore,
    gated: bool,
) -> (Arc<CredentialManager<MemoryStore, FakeEndpoint>>, FakeEndpoint) {
    let endpoint = FakeEndpoint::new(gated);
    let manager = CredentialManager::new(config(), store, endpoint.clone())
        .with_refresh_margin(Duration::seconds(300));
    (Arc::new(manager), endpoint)
}

// Yields to spawned tasks until `condition` holds.
async fn wait_until(condition: impl Fn() -> bool) {
    tokio::time::timeout(StdDuration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(StdDuration::from_millis(2)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn test_concurrent_callers_share_one_refresh() {
    let (manager, endpoint) = manager(store_expiring_in(Duration::minutes(-1)), true);

    let tasks: Vec<_> = (0..5)
        .map(|_| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.with_valid_token().await })
        })
        .collect();

    wait_until(|| endpoint.refresh_calls() == 1 && manager.pending_waiters() == 4).await;
    assert!(manager.is_refreshing());
    endpoint.release();

    for task in tasks {
        assert_eq!(task.await.unwrap(), Ok("fresh".to_string()));
    }
    assert_eq!(endpoint.refresh_calls(), 1);
    assert!(!manager.is_refreshing());
    assert_eq!(manager.pending_waiters(), 0);
}

#[tokio::test]
async fn test_waiters_are_served_in_arrival_order() {
    let (manager, endpoint) = manager(store_expiring_in(Duration::minutes(-1)), true);
    let served = Arc::new(Mutex::new(Vec::new()));

    let driver = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.with_valid_token().await })
    };
    wait_until(|| endpoint.refresh_calls() == 1).await;

    // queue the waiters one by one so their arrival order is known
    let mut waiters = Vec::new();
    for id in 0..4 {
        let waiter = Arc::clone(&manager);
        let served = Arc::clone(&served);
        waiters.push(tokio::spawn(async move {
            let token = waiter.with_valid_token().await;
            served.lock().unwrap().push(id);
            token
        }));
        wait_until(|| manager.pending_waiters() == id + 1).await;
    }
    endpoint.release();

    assert_eq!(driver.await.unwrap(), Ok("fresh".to_string()));
    for waiter in waiters {
        assert_eq!(waiter.await.unwrap(), Ok("fresh".to_string()));
    }
    assert_eq!(*served.lock().unwrap(), vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn test_expired_token_is_refreshed_before_use() {
    let (manager, endpoint) = manager(store_expiring_in(Duration::minutes(-1)), false);

    assert_eq!(manager.with_valid_token().await, Ok("fresh".to_string()));

    let credential = manager.credential().unwrap();
    assert_eq!(credential.access_token, "fresh");
    assert_eq!(credential.refresh_token.as_deref(), Some("refresh-2"));
    assert!(credential.expires_at.unwrap() > Utc::now() + Duration::minutes(50));
    assert_eq!(endpoint.refresh_calls(), 1);
}

#[tokio::test]
async fn test_token_inside_margin_is_refreshed() {
    let (manager, endpoint) = manager(store_expiring_in(Duration::minutes(2)), false);

    assert_eq!(manager.with_valid_token().await, Ok("fresh".to_string()));
    assert_eq!(endpoint.refresh_calls(), 1);
}

#[tokio::test]
async fn test_fresh_token_is_returned_without_network() {
    let (manager, endpoint) = manager(store_expiring_in(Duration::hours(1)), false);

    assert_eq!(manager.with_valid_token().await, Ok("stale".to_string()));
    assert_eq!(manager.refresh_if_needed().await, Ok(false));
    assert_eq!(endpoint.refresh_calls(), 0);
}

#[tokio::test]
async fn test_refresh_if_needed_reports_refresh() {
    let (manager, endpoint) = manager(store_expiring_in(Duration::minutes(-5)), false);

    assert_eq!(manager.refresh_if_needed().await, Ok(true));
    assert_eq!(manager.refresh_if_needed().await, Ok(false));
    assert_eq!(endpoint.refresh_calls(), 1);
}

#[tokio::test]
async fn test_missing_refresh_token_is_reported() {
    let store = store_expiring_in(Duration::minutes(-1));
    store.remove(KEY_REFRESH_TOKEN);
    let (manager, endpoint) = manager(store, false);

    assert_eq!(
        manager.with_valid_token().await,
        Err(AuthError::MissingRefreshToken)
    );
    assert!(!manager.is_refreshing());
    assert_eq!(endpoint.refresh_calls(), 0);
}

#[tokio::test]
async fn test_sign_out_clears_credential() {
    let (manager, _endpoint) = manager(store_expiring_in(Duration::hours(1)), false);
    assert!(manager.is_signed_in());

    manager.sign_out();
    manager.sign_out();

    assert!(!manager.is_signed_in());
    assert!(manager.credential().is_none());
    assert_eq!(manager.with_valid_token().await, Err(AuthError::SignedOut));
}

#[tokio::test]
async fn test_failed_refresh_fails_every_waiter_and_keeps_credential() {
    let (manager, endpoint) = manager(store_expiring_in(Duration::minutes(-1)), true);
    let rejected = AuthError::Rejected {
        status: 400,
        body: "{\"error\":\"invalid_grant\"}".to_string(),
    };
    endpoint.refresh_answers(Err(rejected.clone()));

    let tasks: Vec<_> = (0..3)
        .map(|_| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.with_valid_token().await })
        })
        .collect();
    wait_until(|| endpoint.refresh_calls() == 1 && manager.pending_waiters() == 2).await;
    endpoint.release();

    for task in tasks {
        assert_eq!(task.await.unwrap(), Err(rejected.clone()));
    }
    assert_eq!(manager.credential().unwrap().access_token, "stale");
    assert!(!manager.is_refreshing());

    // the next call tries again
    endpoint.refresh_answers(Ok(token("fresh", None)));
    endpoint.release();
    assert_eq!(manager.with_valid_token().await, Ok("fresh".to_string()));
    assert_eq!(endpoint.refresh_calls(), 2);
}

#[tokio::test]
async fn test_sign_out_during_refresh_discards_result() {
    let (manager, endpoint) = manager(store_expiring_in(Duration::minutes(-1)), true);

    let driver = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.with_valid_token().await })
    };
    wait_until(|| endpoint.refresh_calls() == 1).await;

    manager.sign_out();
    endpoint.release();

    assert_eq!(driver.await.unwrap(), Err(AuthError::Superseded));
    assert!(!manager.is_signed_in());
}

#[tokio::test]
async fn test_abandoned_refresh_releases_waiters() {
    let (manager, endpoint) = manager(store_expiring_in(Duration::minutes(-1)), true);

    let driver = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.with_valid_token().await })
    };
    wait_until(|| endpoint.refresh_calls() == 1).await;
    let waiter = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.with_valid_token().await })
    };
    wait_until(|| manager.pending_waiters() == 1).await;

    driver.abort();
    assert_eq!(waiter.await.unwrap(), Err(AuthError::Cancelled));
    assert!(!manager.is_refreshing());
}

#[tokio::test]
async fn test_refresh_without_new_refresh_token_keeps_old_one() {
    let (manager, endpoint) = manager(store_expiring_in(Duration::minutes(-1)), false);
    endpoint.refresh_answers(Ok(token("fresh", None)));

    manager.with_valid_token().await.unwrap();

    assert_eq!(
        manager.credential().unwrap().refresh_token.as_deref(),
        Some("refresh-1")
    );
}

#[tokio::test]
async fn test_exchange_code_signs_in() {
    let (manager, endpoint) = manager(MemoryStore::new(), false);
    assert!(!manager.is_signed_in());

    manager.exchange_code_for_token("auth-code").await.unwrap();

    assert!(manager.is_signed_in());
    assert_eq!(manager.with_valid_token().await, Ok("signed-in".to_string()));
    assert_eq!(endpoint.exchange_calls(), 1);
    assert_eq!(endpoint.refresh_calls(), 0);
}

#[tokio::test]
async fn test_failed_exchange_keeps_previous_state() {
    let (manager, endpoint) = manager(MemoryStore::new(), false);
    endpoint.exchange_answers(Err(AuthError::Transport("offline".to_string())));

    assert_eq!(
        manager.exchange_code_for_token("auth-code").await,
        Err(AuthError::Transport("offline".to_string()))
    );
    assert!(!manager.is_signed_in());
}

#[tokio::test]
async fn test_credential_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preferences.json");

    let endpoint = FakeEndpoint::new(false);
    let store = FileStore::load(&path).await.unwrap();
    let manager = CredentialManager::new(config(), store, endpoint.clone());
    manager.exchange_code_for_token("auth-code").await.unwrap();
    drop(manager);

    let store = FileStore::load(&path).await.unwrap();
    let manager = CredentialManager::new(config(), store, endpoint);
    let credential = manager.credential().unwrap();
    assert_eq!(credential.access_token, "signed-in");
    assert_eq!(credential.refresh_token.as_deref(), Some("refresh-1"));
    assert!(credential.expires_at.is_some());
}

#[tokio::test]
async fn test_sign_out_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preferences.json");

    let endpoint = FakeEndpoint::new(false);
    let manager = CredentialManager::new(
        config(),
        FileStore::load(&path).await.unwrap(),
        endpoint.clone(),
    );
    manager.exchange_code_for_token("auth-code").await.unwrap();
    manager.sign_out();
    manager.persist().await.unwrap();
    drop(manager);

    let manager = CredentialManager::new(config(), FileStore::load(&path).await.unwrap(), endpoint);
    assert!(!manager.is_signed_in());
}

// Store whose flushes block on `gate`, counting how often it was written.
struct SlowDisk {
    memory: MemoryStore,
    flushes: AtomicUsize,
    gate: Semaphore,
}

impl Default for SlowDisk {
    fn default() -> Self {
        Self {
            memory: MemoryStore::new(),
            flushes: AtomicUsize::new(0),
            gate: Semaphore::new(0),
        }
    }
}

#[derive(Clone, Default)]
struct SlowDiskStore {
    disk: Arc<SlowDisk>,
}

impl SlowDiskStore {
    fn flushes(&self) -> usize {
        self.disk.flushes.load(Ordering::SeqCst)
    }

    fn finish_write(&self) {
        self.disk.gate.add_permits(1);
    }
}

#[async_trait]
impl PreferenceStore for SlowDiskStore {
    fn get(&self, key: &str) -> Option<String> {
        self.disk.memory.get(key)
    }

    fn set(&self, key: &str, value: &str) {
        self.disk.memory.set(key, value);
    }

    fn remove(&self, key: &str) {
        self.disk.memory.remove(key);
    }

    async fn flush(&self) -> Result<(), StoreError> {
        self.disk.flushes.fetch_add(1, Ordering::SeqCst);
        self.disk.gate.acquire().await.unwrap().forget();
        Ok(())
    }
}

#[tokio::test]
async fn test_refreshed_token_is_usable_while_it_is_written() {
    let store = SlowDiskStore::default();
    store.set(KEY_ACCESS_TOKEN, "stale");
    store.set(KEY_REFRESH_TOKEN, "refresh-1");
    store.set(KEY_EXPIRES_AT, &(Utc::now() - Duration::minutes(1)).to_rfc3339());
    let endpoint = FakeEndpoint::new(false);
    let manager = Arc::new(CredentialManager::new(config(), store.clone(), endpoint.clone()));

    let driver = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.with_valid_token().await })
    };
    wait_until(|| store.flushes() == 1).await;

    // the write is still pending, yet other callers are not held up
    assert!(!manager.is_refreshing());
    let token = tokio::time::timeout(StdDuration::from_secs(1), manager.with_valid_token())
        .await
        .expect("token request blocked on the pending write");
    assert_eq!(token, Ok("fresh".to_string()));

    store.finish_write();
    assert_eq!(driver.await.unwrap(), Ok("fresh".to_string()));
    // all three keys went out in one write
    assert_eq!(store.flushes(), 1);
    assert_eq!(endpoint.refresh_calls(), 1);
}
