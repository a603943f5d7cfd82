use crate::application::agent::metrics::{AgentMetrics, Reading};
use crate::application::agent::registry::*;
use crate::application::system::shutdown::ShutdownSignal;
use anyhow::{Context, Result, anyhow};
use sysinfo::{Pid, System};
use tokio::time::{self, Duration};
use tracing::{debug, info, warn};

/// A source of gauge readings. Reads are blocking and run off the async
/// workers.
pub trait StatsProvider: Send + 'static {
    fn name(&self) -> &'static str;
    fn read(&mut self) -> Result<Vec<Reading>>;
}

/// Stats of the agent process itself.
pub struct ProcessStats {
    system: System,
    pid: Pid,
}

impl ProcessStats {
    pub fn new() -> Result<Self> {
        let pid = sysinfo::get_current_pid().map_err(|e| anyhow!("current pid: {}", e))?;
        Ok(Self {
            system: System::new(),
            pid,
        })
    }
}

impl StatsProvider for ProcessStats {
    fn name(&self) -> &'static str {
        "process"
    }

    fn read(&mut self) -> Result<Vec<Reading>> {
        self.system.refresh_process(self.pid);
        let process = self
            .system
            .process(self.pid)
            .with_context(|| format!("process {} not visible", self.pid))?;
        let disk = process.disk_usage();

        Ok(vec![
            Reading::new(PROCESS_RESIDENT_MEMORY, process.memory() as f64),
            Reading::new(PROCESS_VIRTUAL_MEMORY, process.virtual_memory() as f64),
            Reading::new(PROCESS_CPU_USAGE, process.cpu_usage() as f64),
            Reading::new(PROCESS_RUN_TIME, process.run_time() as f64),
            Reading::new(PROCESS_DISK_READ, disk.total_read_bytes as f64),
            Reading::new(PROCESS_DISK_WRITTEN, disk.total_written_bytes as f64),
        ])
    }
}

/// Host-wide memory, CPU and load stats.
pub struct HostStats {
    system: System,
}

impl HostStats {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for HostStats {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsProvider for HostStats {
    fn name(&self) -> &'static str {
        "host"
    }

    fn read(&mut self) -> Result<Vec<Reading>> {
        self.system.refresh_memory();
        self.system.refresh_cpu();

        let first_cpu = self
            .system
            .cpus()
            .first()
            .map(|cpu| cpu.cpu_usage() as f64)
            .unwrap_or_default();

        Ok(vec![
            Reading::new(TOTAL_MEMORY, self.system.total_memory() as f64),
            Reading::new(FREE_MEMORY, self.system.free_memory() as f64),
            Reading::new(USED_MEMORY, self.system.used_memory() as f64),
            Reading::new(AVAILABLE_MEMORY, self.system.available_memory() as f64),
            Reading::new(TOTAL_SWAP, self.system.total_swap() as f64),
            Reading::new(FREE_SWAP, self.system.free_swap() as f64),
            Reading::new(CPU_UTILIZATION_1, first_cpu),
            Reading::new(
                GLOBAL_CPU_UTILIZATION,
                self.system.global_cpu_info().cpu_usage() as f64,
            ),
            Reading::new(LOAD_AVERAGE_1, System::load_average().one),
            Reading::new(HOST_UPTIME, System::uptime() as f64),
        ])
    }
}

/// Polls one provider on a fixed period and records what it reads.
///
/// A failed read is logged and the sampler keeps going.
pub struct Sampler<P: StatsProvider> {
    provider: Option<P>,
    metrics: AgentMetrics,
    period: Duration,
    shutdown: ShutdownSignal,
}

impl<P: StatsProvider> Sampler<P> {
    pub fn new(provider: P, metrics: AgentMetrics, period: Duration, shutdown: ShutdownSignal) -> Self {
        Self {
            provider: Some(provider),
            metrics,
            period,
            shutdown,
        }
    }

    /// Reads the provider once and records the result.
    pub async fn sample(&mut self) -> Result<usize> {
        let mut provider = self
            .provider
            .take()
            .context("provider lost by a previous sample")?;

        let (provider, readings) = tokio::task::spawn_blocking(move || {
            let readings = provider.read();
            (provider, readings)
        })
        .await
        .context("sampler task panicked")?;
        self.provider = Some(provider);

        Ok(self.metrics.record(&readings?).await)
    }

    pub async fn run(mut self) {
        let name = self.provider.as_ref().map(|p| p.name()).unwrap_or("unknown");
        info!("Sampler[{}] started. Interval: {:?}", name, self.period);

        let shutdown = self.shutdown.clone();
        let mut interval = time::interval(self.period);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.sample().await {
                        Ok(applied) => debug!("Sampler[{}]: recorded {} readings", name, applied),
                        Err(e) => {
                            warn!("Sampler[{}]: read failed: {:#}", name, e);
                            if self.provider.is_none() {
                                return;
                            }
                        }
                    }
                }
                _ = shutdown.wait() => {
                    info!("Sampler[{}] stopped.", name);
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::MetricValue;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedStats {
        reads: Arc<AtomicUsize>,
        fail: bool,
    }

    impl StatsProvider for FixedStats {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn read(&mut self) -> Result<Vec<Reading>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("stats unavailable");
            }
            Ok(vec![Reading::new(TOTAL_MEMORY, 42.0)])
        }
    }

    #[tokio::test]
    async fn test_sample_records_readings() {
        let metrics = AgentMetrics::new();
        let reads = Arc::new(AtomicUsize::new(0));
        let mut sampler = Sampler::new(
            FixedStats {
                reads: reads.clone(),
                fail: false,
            },
            metrics.clone(),
            Duration::from_secs(1),
            ShutdownSignal::new(),
        );

        assert_eq!(sampler.sample().await.unwrap(), 1);
        assert_eq!(metrics.get(TOTAL_MEMORY).await, Some(MetricValue::Gauge(42.0)));
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_read_keeps_provider_and_running() {
        let metrics = AgentMetrics::new();
        let reads = Arc::new(AtomicUsize::new(0));
        let shutdown = ShutdownSignal::new();
        let sampler = Sampler::new(
            FixedStats {
                reads: reads.clone(),
                fail: true,
            },
            metrics,
            Duration::from_millis(10),
            shutdown.clone(),
        );

        let handle = tokio::spawn(sampler.run());
        tokio::time::sleep(Duration::from_millis(60)).await;
        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sampler should stop on shutdown")
            .unwrap();
        assert!(reads.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_host_stats_report_memory() {
        let readings = HostStats::new().read().unwrap();
        let total = readings.iter().find(|r| r.name == TOTAL_MEMORY).unwrap();
        assert!(total.value > 0.0);
        assert_eq!(readings.len(), 10);
    }

    #[tokio::test]
    async fn test_process_stats_see_current_process() {
        let readings = ProcessStats::new().unwrap().read().unwrap();
        let resident = readings
            .iter()
            .find(|r| r.name == PROCESS_RESIDENT_MEMORY)
            .unwrap();
        assert!(resident.value > 0.0);
    }
}
