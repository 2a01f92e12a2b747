//! Configuration models for the scheduler, probes and metric sink.

pub mod monitor;
pub mod scheduler;

pub use monitor::{
    load_dotenv, parse_bool, parse_seconds, parse_targets, HttpConfig, Iperf3Config, IperfConfig,
    MonitorConfig, PingConfig, SinkConfig, SpeedtestConfig,
};
pub use scheduler::SchedulerConfig;
