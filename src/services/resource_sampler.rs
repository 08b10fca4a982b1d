//! Host CPU, memory and network sampling.
//!
//! [`ResourceSampler`] turns raw counters from a [`MetricsSource`] into
//! whole-percent [`ResourceSnapshot`]s; [`ResourceMonitor`] drives it from a
//! background thread and hands each snapshot to a callback.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use log::debug;

use crate::types::resources::{clamp_percent, ResourceSnapshot};
use crate::types::settings::ResourceSettings;

/// One read of the raw host counters. `None` marks a metric that could not
/// be read this time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawMetrics {
    /// Global CPU utilization in percent.
    pub cpu: Option<f32>,
    /// Used and total physical memory in bytes.
    pub memory: Option<(u64, u64)>,
    /// Cumulative bytes received plus transmitted over all interfaces.
    pub network_bytes: Option<u64>,
}

/// Where raw counters come from.
pub trait MetricsSource: Send {
    fn read(&mut self) -> RawMetrics;
}

/// [`MetricsSource`] backed by `sysinfo`.
pub struct SystemMetrics {
    sys: sysinfo::System,
    networks: sysinfo::Networks,
}

impl SystemMetrics {
    pub fn new() -> Self {
        use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};

        let mut sys = System::new_with_specifics(
            RefreshKind::nothing()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::everything()),
        );
        // CPU usage is a delta between refreshes; prime the first one.
        sys.refresh_cpu_all();
        Self {
            sys,
            networks: sysinfo::Networks::new_with_refreshed_list(),
        }
    }
}

impl Default for SystemMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSource for SystemMetrics {
    fn read(&mut self) -> RawMetrics {
        self.sys.refresh_cpu_all();
        self.sys.refresh_memory();
        self.networks.refresh(true);

        let cpu = self.sys.global_cpu_usage();
        let total = self.sys.total_memory();
        let network_bytes = self.networks.iter().fold(0u64, |acc, (_name, net)| {
            acc.saturating_add(net.total_received())
                .saturating_add(net.total_transmitted())
        });

        RawMetrics {
            cpu: cpu.is_finite().then_some(cpu),
            memory: (total > 0).then(|| (self.sys.used_memory(), total)),
            network_bytes: Some(network_bytes),
        }
    }
}

/// Converts raw counters into percentage snapshots.
pub struct ResourceSampler {
    source: Box<dyn MetricsSource>,
    cpu_window: usize,
    bandwidth_ceiling: f64,
    cpu_readings: VecDeque<f32>,
    last_network: Option<(u64, Instant)>,
    last: ResourceSnapshot,
}

impl ResourceSampler {
    pub fn new(source: Box<dyn MetricsSource>, settings: &ResourceSettings) -> Self {
        Self {
            source,
            cpu_window: settings.cpu_average_window.max(1),
            bandwidth_ceiling: settings.bandwidth_ceiling_bytes_per_sec.max(1) as f64,
            cpu_readings: VecDeque::new(),
            last_network: None,
            last: ResourceSnapshot::default(),
        }
    }

    pub fn last(&self) -> ResourceSnapshot {
        self.last
    }

    pub fn sample(&mut self) -> ResourceSnapshot {
        self.sample_at(Instant::now())
    }

    /// Take one sample. Unreadable metrics repeat their last value.
    pub fn sample_at(&mut self, now: Instant) -> ResourceSnapshot {
        let raw = self.source.read();

        let cpu = match raw.cpu {
            Some(reading) => {
                self.cpu_readings.push_back(reading);
                while self.cpu_readings.len() > self.cpu_window {
                    self.cpu_readings.pop_front();
                }
                let sum: f64 = self.cpu_readings.iter().map(|&r| f64::from(r)).sum();
                clamp_percent(sum / self.cpu_readings.len() as f64)
            }
            None => self.last.cpu,
        };

        let ram = match raw.memory {
            Some((used, total)) if total > 0 => clamp_percent(used as f64 * 100.0 / total as f64),
            _ => self.last.ram,
        };

        let network = match raw.network_bytes {
            Some(bytes) => {
                let pct = match self.last_network {
                    None => 0,
                    Some((prev, at)) => {
                        let elapsed = now.saturating_duration_since(at).as_secs_f64();
                        if elapsed > 0.0 {
                            let rate = bytes.saturating_sub(prev) as f64 / elapsed;
                            clamp_percent(rate / self.bandwidth_ceiling * 100.0)
                        } else {
                            self.last.network
                        }
                    }
                };
                self.last_network = Some((bytes, now));
                pct
            }
            None => self.last.network,
        };

        self.last = ResourceSnapshot { cpu, ram, network };
        self.last
    }
}

/// Runs a [`ResourceSampler`] on a background thread.
pub struct ResourceMonitor {
    running: Arc<AtomicBool>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl ResourceMonitor {
    /// Create a new (stopped) monitor.
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            thread: Mutex::new(None),
        }
    }

    /// Start sampling every `interval`, handing each snapshot to `on_sample`.
    ///
    /// If the monitor is already running, this is a no-op.
    pub fn start<F>(&self, mut sampler: ResourceSampler, interval: Duration, mut on_sample: F) -> io::Result<()>
    where
        F: FnMut(ResourceSnapshot) + Send + 'static,
    {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(());
        }

        let running = Arc::clone(&self.running);
        let interval = interval.max(Duration::from_millis(100));
        let spawned = std::thread::Builder::new()
            .name("resource-sampler".to_string())
            .spawn(move || {
                let slice = Duration::from_millis(50);
                while running.load(Ordering::SeqCst) {
                    on_sample(sampler.sample());

                    let deadline = Instant::now() + interval;
                    while running.load(Ordering::SeqCst) {
                        let now = Instant::now();
                        if now >= deadline {
                            break;
                        }
                        std::thread::sleep(slice.min(deadline - now));
                    }
                }
                debug!("resource sampler stopped");
            });

        match spawned {
            Ok(handle) => {
                *lock_handle(&self.thread) = Some(handle);
                Ok(())
            }
            Err(err) => {
                self.running.store(false, Ordering::SeqCst);
                Err(err)
            }
        }
    }

    /// Stop the sampling thread and wait for it to exit.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = lock_handle(&self.thread).take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

fn lock_handle(m: &Mutex<Option<JoinHandle<()>>>) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl Default for ResourceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ResourceMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
