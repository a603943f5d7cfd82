// Metric collection agent
pub mod agent;

// Periodic snapshot of the server's repository
pub mod snapshot_scheduler;

// Server orchestrator and shutdown handling
pub mod system;
