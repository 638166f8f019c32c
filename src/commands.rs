//! Command Implementations
//!
//! Workloads behind the `notifly` subcommands. Each takes a center and returns
//! a serializable report so the binary only has to print it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::Serialize;

use crate::notifications::{NotificationCenter, NotiflyError, Topic};
use crate::pool::PoolStats;

/// Topic the ping responder listens on
pub const PING_TOPIC: Topic = 1;
/// Topic the ping responder answers on
pub const PONG_TOPIC: Topic = 2;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StressReport {
    pub topics: usize,
    pub observers_per_topic: usize,
    pub posts_per_topic: usize,
    pub async_dispatch: bool,
    pub expected_calls: u64,
    pub delivered_calls: u64,
    pub elapsed_ms: f64,
    pub calls_per_second: f64,
    pub pool: PoolReport,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PoolReport {
    pub workers: usize,
    pub executed: u64,
    pub panicked: u64,
}

impl From<PoolStats> for PoolReport {
    fn from(stats: PoolStats) -> Self {
        Self {
            workers: stats.workers,
            executed: stats.executed,
            panicked: stats.panicked,
        }
    }
}

/// Register `observers` counting observers on each of `topics` topics, post
/// `posts` times to every topic and wait until everything is delivered.
pub fn run_stress(
    center: &NotificationCenter,
    topics: usize,
    observers: usize,
    posts: usize,
    async_dispatch: bool,
) -> Result<StressReport> {
    let delivered = Arc::new(AtomicU64::new(0));
    let topic_ids: Vec<Topic> = (0..topics)
        .map(|t| Topic::try_from(t).context("Too many topics"))
        .collect::<Result<_>>()?;

    let mut registered = Vec::with_capacity(topics * observers);
    for &topic in &topic_ids {
        for _ in 0..observers {
            let delivered = Arc::clone(&delivered);
            let id = center
                .add_observer(topic, move |_sequence: u64| {
                    delivered.fetch_add(1, Ordering::Relaxed);
                })
                .with_context(|| format!("Failed to register observer on topic {}", topic))?;
            registered.push(id);
        }
    }
    debug!("Registered {} stress observers", registered.len());

    let started = Instant::now();
    for sequence in 0..posts as u64 {
        for &topic in &topic_ids {
            let result = if async_dispatch {
                center.post_notification_async(topic, (sequence,))
            } else {
                center.post_notification(topic, (sequence,))
            };
            match result {
                Ok(_) => {}
                // no observers requested on this topic
                Err(NotiflyError::NotificationNotFound(_)) if observers == 0 => {}
                Err(e) => return Err(e).context("Stress post failed"),
            }
        }
    }
    center.wait_for_async_tasks();
    let elapsed = started.elapsed();

    for &topic in &topic_ids {
        center.remove_all_observers(topic);
    }

    let delivered_calls = delivered.load(Ordering::Relaxed);
    let elapsed_secs = elapsed.as_secs_f64();
    let report = StressReport {
        topics,
        observers_per_topic: observers,
        posts_per_topic: posts,
        async_dispatch,
        expected_calls: (topics * observers * posts) as u64,
        delivered_calls,
        elapsed_ms: elapsed_secs * 1000.0,
        calls_per_second: if elapsed_secs > 0.0 {
            delivered_calls as f64 / elapsed_secs
        } else {
            0.0
        },
        pool: center.pool_stats().into(),
    };

    info!(
        "Stress run delivered {}/{} calls in {:.1}ms",
        report.delivered_calls, report.expected_calls, report.elapsed_ms
    );
    Ok(report)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PingReport {
    pub sent: usize,
    pub received: usize,
    pub timeouts: usize,
    pub min_ms: Option<f64>,
    pub avg_ms: Option<f64>,
    pub max_ms: Option<f64>,
}

/// Round trip `count` requests through `post_and_wait` against a responder
/// that echoes the sequence number on [`PONG_TOPIC`] after `delay`.
pub fn run_ping(center: &Arc<NotificationCenter>, count: usize, timeout: Duration, delay: Duration) -> Result<PingReport> {
    let responder: Weak<NotificationCenter> = Arc::downgrade(center);
    let responder_id = center
        .add_observer(PING_TOPIC, move |sequence: u64| {
            let responder = responder.clone();
            // answer from another thread so the request side is already waiting
            thread::spawn(move || {
                thread::sleep(delay);
                if let Some(center) = responder.upgrade() {
                    if let Err(e) = center.post_notification(PONG_TOPIC, (sequence,)) {
                        debug!("Late pong {} dropped: {}", sequence, e);
                    }
                }
            });
        })
        .context("Failed to register ping responder")?;

    let mut latencies = Vec::with_capacity(count);
    let mut timeouts = 0;
    for sequence in 0..count as u64 {
        let started = Instant::now();
        match center.post_and_wait::<(u64,), (u64,)>(PING_TOPIC, PONG_TOPIC, timeout, (sequence,)) {
            Ok((reply,)) => {
                if reply != sequence {
                    warn!("Ping {} answered with {}", sequence, reply);
                }
                latencies.push(started.elapsed().as_secs_f64() * 1000.0);
            }
            Err(NotiflyError::Timeout { .. }) => timeouts += 1,
            Err(e) => {
                let _ = center.remove_observer(responder_id);
                return Err(e).context("Ping failed");
            }
        }
    }

    center
        .remove_observer(responder_id)
        .context("Failed to remove ping responder")?;

    let report = PingReport {
        sent: count,
        received: latencies.len(),
        timeouts,
        min_ms: latencies.iter().copied().reduce(f64::min),
        avg_ms: if latencies.is_empty() {
            None
        } else {
            Some(latencies.iter().sum::<f64>() / latencies.len() as f64)
        },
        max_ms: latencies.iter().copied().reduce(f64::max),
    };
    info!("Ping: {}/{} answered, {} timeouts", report.received, report.sent, report.timeouts);
    Ok(report)
}
