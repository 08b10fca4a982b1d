//! Unit tests for resource sampling against scripted counters.

use std::collections::VecDeque;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use xiavion::services::resource_sampler::{MetricsSource, RawMetrics, ResourceMonitor, ResourceSampler};
use xiavion::types::resources::ResourceSnapshot;
use xiavion::types::settings::ResourceSettings;

const GB: u64 = 1024 * 1024 * 1024;

/// Replays a fixed list of readings, then repeats the last one.
struct Scripted {
    readings: VecDeque<RawMetrics>,
    last: RawMetrics,
}

impl Scripted {
    fn new(readings: Vec<RawMetrics>) -> Box<Self> {
        Box::new(Self {
            readings: readings.into(),
            last: RawMetrics::default(),
        })
    }
}

impl MetricsSource for Scripted {
    fn read(&mut self) -> RawMetrics {
        if let Some(next) = self.readings.pop_front() {
            self.last = next;
        }
        self.last
    }
}

fn reading(cpu: f32, used_gb: u64, net: u64) -> RawMetrics {
    RawMetrics {
        cpu: Some(cpu),
        memory: Some((used_gb * GB, 16 * GB)),
        network_bytes: Some(net),
    }
}

fn settings() -> ResourceSettings {
    ResourceSettings {
        cpu_average_window: 3,
        bandwidth_ceiling_bytes_per_sec: 1_000_000,
        ..ResourceSettings::default()
    }
}

#[test]
fn test_first_sample_reports_zero_network() {
    let mut sampler = ResourceSampler::new(Scripted::new(vec![reading(20.0, 4, 5_000_000)]), &settings());
    let snap = sampler.sample_at(Instant::now());
    assert_eq!(snap, ResourceSnapshot { cpu: 20, ram: 25, network: 0 });
}

#[test]
fn test_cpu_is_a_moving_average() {
    let source = Scripted::new(vec![
        reading(10.0, 4, 0),
        reading(20.0, 4, 0),
        reading(30.0, 4, 0),
        reading(70.0, 4, 0),
    ]);
    let mut sampler = ResourceSampler::new(source, &settings());
    let t0 = Instant::now();
    let cpus: Vec<u8> = (0..4)
        .map(|i| sampler.sample_at(t0 + Duration::from_secs(i)).cpu)
        .collect();
    // Window of three: the 10% reading falls out on the fourth sample.
    assert_eq!(cpus, vec![10, 15, 20, 40]);
}

#[test]
fn test_network_is_rate_over_ceiling() {
    let source = Scripted::new(vec![reading(0.0, 1, 1_000_000), reading(0.0, 1, 2_000_000)]);
    let mut sampler = ResourceSampler::new(source, &settings());
    let t0 = Instant::now();
    sampler.sample_at(t0);
    // 1 MB over 2 s against a 1 MB/s ceiling.
    let snap = sampler.sample_at(t0 + Duration::from_secs(2));
    assert_eq!(snap.network, 50);
}

#[test]
fn test_network_is_clamped_to_100() {
    let source = Scripted::new(vec![reading(0.0, 1, 0), reading(0.0, 1, 50_000_000)]);
    let mut sampler = ResourceSampler::new(source, &settings());
    let t0 = Instant::now();
    sampler.sample_at(t0);
    assert_eq!(sampler.sample_at(t0 + Duration::from_secs(1)).network, 100);
}

#[test]
fn test_unreadable_metrics_keep_last_value() {
    let source = Scripted::new(vec![
        reading(40.0, 8, 0),
        RawMetrics { cpu: None, memory: None, network_bytes: None },
    ]);
    let mut sampler = ResourceSampler::new(source, &settings());
    let t0 = Instant::now();
    let first = sampler.sample_at(t0);
    let second = sampler.sample_at(t0 + Duration::from_secs(1));
    assert_eq!(first, second);
    assert_eq!(sampler.last(), first);
}

#[test]
fn test_values_stay_in_percent_range() {
    let source = Scripted::new(vec![RawMetrics {
        cpu: Some(250.0),
        memory: Some((20 * GB, 16 * GB)),
        network_bytes: Some(0),
    }]);
    let mut sampler = ResourceSampler::new(source, &settings());
    let snap = sampler.sample_at(Instant::now());
    assert_eq!(snap.cpu, 100);
    assert_eq!(snap.ram, 100);
}

#[test]
fn test_monitor_delivers_snapshots_until_stopped() {
    let (tx, rx) = mpsc::channel();
    let monitor = ResourceMonitor::new();
    let sampler = ResourceSampler::new(Scripted::new(vec![reading(5.0, 2, 0)]), &settings());
    monitor
        .start(sampler, Duration::from_millis(100), move |snap| {
            let _ = tx.send(snap);
        })
        .unwrap();
    assert!(monitor.is_running());

    let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(first.cpu, 5);
    assert_eq!(first.ram, 13);

    monitor.stop();
    assert!(!monitor.is_running());
    while rx.try_recv().is_ok() {}
    std::thread::sleep(Duration::from_millis(250));
    assert!(rx.try_recv().is_err());
}
