//! Readiness of the third-party verification script.
//!
//! The script announces nothing reliable, so readiness is polled on a fixed interval.
//! A script that does signal its load can wake the poll early through [`Notify`].
//! Polling stops on success, after the attempt limit, or on cancellation.

use core::future::pending;
use core::time::Duration;
use std::rc::Rc;

use anyhow::Error;
use html::{DOM, NodeId};
use log::{debug, trace};
use serde::Serialize;
use tokio::sync::{Notify, watch};
use tokio::time::{Instant, MissedTickBehavior, interval_at};

pub trait VerificationScript {
    /// Whether the script's global entry point exists yet.
    fn is_loaded(&self) -> bool;

    /// Signalled by scripts that report their own load.
    fn loaded_notify(&self) -> Option<Rc<Notify>> {
        None
    }

    /// Render the challenge into `placeholder`. The script later adds the token input.
    fn render(&self, dom: &mut DOM, placeholder: NodeId, site_key: &str) -> Result<(), Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    Ready,
    TimedOut { attempts: u32 },
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` polls until ready or cancelled.
    pub limit: Option<u32>,
}

async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            // Sender gone: nobody can cancel any more.
            pending::<()>().await;
        }
    }
}

async fn notified(notify: Option<&Notify>) {
    match notify {
        Some(notify) => notify.notified().await,
        None => pending().await,
    }
}

/// Poll `script` until it is loaded.
pub async fn wait_until_ready(
    script: &dyn VerificationScript,
    policy: PollPolicy,
    mut cancel: watch::Receiver<bool>,
) -> Readiness {
    let notify = script.loaded_notify();
    let period = policy.interval.max(Duration::from_millis(1));
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut attempts = 0_u32;
    loop {
        tokio::select! {
            biased;
            () = cancelled(&mut cancel) => {
                debug!("widget: readiness poll cancelled after {attempts} attempt(s)");
                return Readiness::Cancelled;
            }
            () = notified(notify.as_deref()) => trace!("widget: script signalled load"),
            _ = ticker.tick() => {}
        }
        if script.is_loaded() {
            debug!("widget: script ready after {attempts} poll(s)");
            return Readiness::Ready;
        }
        attempts = attempts.saturating_add(1);
        if policy.limit.is_some_and(|limit| attempts >= limit) {
            return Readiness::TimedOut { attempts };
        }
    }
}
