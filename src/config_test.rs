use std::sync::Mutex;

use super::*;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// # Safety
/// Callers hold `ENV_LOCK` so no other test touches the environment.
unsafe fn clear_signdesk_env() {
    unsafe {
        std::env::remove_var("SIGNDESK_API_URL");
        std::env::remove_var("SIGNDESK_SESSION_FILE");
        std::env::remove_var("SIGNDESK_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("SIGNDESK_CONNECT_TIMEOUT_SECS");
    }
}

#[test]
fn from_env_defaults() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe { clear_signdesk_env() };

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.api_url, DEFAULT_API_URL);
    assert_eq!(cfg.session_file, PathBuf::from(DEFAULT_SESSION_FILE));
    assert_eq!(cfg.timeouts, HttpTimeouts::default());
}

#[test]
fn from_env_parses_overrides() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_signdesk_env();
        std::env::set_var("SIGNDESK_API_URL", "https://sign.example.test/");
        std::env::set_var("SIGNDESK_SESSION_FILE", "/tmp/sd.json");
        std::env::set_var("SIGNDESK_REQUEST_TIMEOUT_SECS", "42");
        std::env::set_var("SIGNDESK_CONNECT_TIMEOUT_SECS", "7");
    }

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.api_url, "https://sign.example.test");
    assert_eq!(cfg.session_file, PathBuf::from("/tmp/sd.json"));
    assert_eq!(cfg.timeouts, HttpTimeouts { request_secs: 42, connect_secs: 7 });

    unsafe { clear_signdesk_env() };
}

#[test]
fn from_env_ignores_unparseable_timeouts() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_signdesk_env();
        std::env::set_var("SIGNDESK_REQUEST_TIMEOUT_SECS", "soon");
        std::env::set_var("SIGNDESK_CONNECT_TIMEOUT_SECS", "0");
    }

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.timeouts, HttpTimeouts::default());

    unsafe { clear_signdesk_env() };
}

#[test]
fn from_env_rejects_non_http_url() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_signdesk_env();
        std::env::set_var("SIGNDESK_API_URL", "ftp://files.example.test");
    }

    let err = ClientConfig::from_env().unwrap_err().to_string();
    assert!(err.contains("invalid API URL"));

    unsafe { clear_signdesk_env() };
}

#[test]
fn explicit_url_replaces_invalid_env_url() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_signdesk_env();
        std::env::set_var("SIGNDESK_API_URL", "not a url");
        std::env::set_var("SIGNDESK_REQUEST_TIMEOUT_SECS", "12");
    }

    let cfg = ClientConfig::from_env_with_api_url(Some("https://override.example.test/")).unwrap();
    assert_eq!(cfg.api_url, "https://override.example.test");
    assert_eq!(cfg.timeouts.request_secs, 12);
    assert!(ClientConfig::from_env_with_api_url(None).is_err());
    assert!(ClientConfig::from_env_with_api_url(Some("ftp://x")).is_err());

    unsafe { clear_signdesk_env() };
}

#[test]
fn new_trims_trailing_slashes() {
    let cfg = ClientConfig::new("http://localhost:5000//");
    assert_eq!(cfg.api_url, "http://localhost:5000");
}
