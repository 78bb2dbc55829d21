//! HTTP readiness polling and the browser hand-off.

use std::time::Duration;

use crate::launch::activity_log::ActivityLog;
use crate::launch::config::LaunchConfig;
use crate::launch::retry::poll_until;

/// Poll the front-end until it answers, then open the default browser on
/// it. Returns false (without panicking) when the attempt budget runs out;
/// the caller decides that is fatal.
pub fn wait_ready(log: &ActivityLog, config: &LaunchConfig) -> bool {
    log.info("Waiting for the web interface to become available...");
    let ready = wait_ready_with(
        &config.ready_probe_url(),
        config.ready_attempts,
        config.ready_interval(),
        config.ready_request_timeout(),
        config.ready_min_body_bytes,
        || {
            log.info("Web interface is ready. Opening browser...");
            if let Err(e) = open::that(config.webui_url()) {
                // The services are up either way; a browser that refuses to
                // open is not worth failing the session over.
                log.warn(&format!("Could not open the browser: {e}"));
            }
        },
    );
    if !ready {
        log.error("Web interface did not become available in time.");
    }
    ready
}

/// Core poll loop with the success side effect injected, so tests can count
/// browser opens without a browser.
fn wait_ready_with(
    url: &str,
    max_attempts: u32,
    interval: Duration,
    request_timeout: Duration,
    min_body_bytes: usize,
    on_ready: impl FnOnce(),
) -> bool {
    let ready = poll_until(max_attempts, interval, || {
        probe(url, request_timeout, min_body_bytes)
    });
    if ready {
        on_ready();
    }
    ready
}

/// One GET attempt. Ready means status 200 and a body of at least
/// `min_body_bytes`; a half-started proxy can answer 200 with an empty
/// placeholder page.
fn probe(url: &str, timeout: Duration, min_body_bytes: usize) -> bool {
    let response = match ureq::get(url).timeout(timeout).call() {
        Ok(r) => r,
        Err(_) => return false,
    };
    if response.status() != 200 {
        return false;
    }
    match response.into_string() {
        Ok(body) => body.len() >= min_body_bytes,
        Err(_) => false,
    }
}
