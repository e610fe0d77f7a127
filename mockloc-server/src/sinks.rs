//! Fix sink implementations
//!
//! Sinks forward every injected fix to an external destination (UDP,
//! NDJSON file) so consumers outside the process can observe what the
//! platform received. Sink failures are logged and never interrupt the
//! simulation.

use crate::state::{AppState, SinkConfig, SinkType};
use anyhow::Result;
use mockloc_core::Fix;
use std::collections::HashMap;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

/// Trait for output sinks
pub trait FixSink: Send {
    fn send(&mut self, fix: &Fix) -> Result<()>;
}

/// UDP sink (one JSON datagram per fix)
pub struct UdpSink {
    socket: std::net::UdpSocket,
    addr: std::net::SocketAddr,
}

impl UdpSink {
    pub fn new(host: &str, port: u16) -> Result<Self> {
        let socket = std::net::UdpSocket::bind("0.0.0.0:0")?;
        socket.set_nonblocking(true)?;
        let addr = format!("{}:{}", host, port).parse()?;
        Ok(Self { socket, addr })
    }
}

impl FixSink for UdpSink {
    fn send(&mut self, fix: &Fix) -> Result<()> {
        let json = serde_json::to_string(fix)?;
        self.socket.send_to(json.as_bytes(), self.addr)?;
        Ok(())
    }
}

/// File sink (NDJSON, append-only)
pub struct FileSink {
    file: std::fs::File,
}

impl FileSink {
    pub fn new(path: &str) -> Result<Self> {
        use std::fs::OpenOptions;
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }
}

impl FixSink for FileSink {
    fn send(&mut self, fix: &Fix) -> Result<()> {
        use std::io::Write;
        let json = serde_json::to_string(fix)?;
        writeln!(self.file, "{}", json)?;
        Ok(())
    }
}

/// Create a sink from configuration
pub fn create_sink(config: &SinkConfig) -> Result<Box<dyn FixSink>> {
    match &config.sink_type {
        SinkType::Udp { host, port } => Ok(Box::new(UdpSink::new(host, *port)?)),
        SinkType::File { path } => Ok(Box::new(FileSink::new(path)?)),
    }
}

/// Forward fixes from the controller's broadcast channel to every
/// configured sink. Sinks are instantiated lazily and dropped when
/// their configuration is deleted.
pub async fn run_forwarder(state: AppState) {
    let mut rx = state.controller.subscribe_fixes();
    let mut active: HashMap<String, Box<dyn FixSink>> = HashMap::new();
    info!("fix forwarder started");

    loop {
        let fix = match rx.recv().await {
            Ok(fix) => fix,
            Err(RecvError::Lagged(n)) => {
                warn!("fix forwarder lagged by {} fixes", n);
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        let configs = state.sinks.read().await.clone();
        active.retain(|id, _| configs.iter().any(|c| &c.id == id));

        for config in &configs {
            if !active.contains_key(&config.id) {
                match create_sink(config) {
                    Ok(sink) => {
                        active.insert(config.id.clone(), sink);
                    }
                    Err(e) => {
                        warn!("failed to create sink {}: {e:#}", config.id);
                        continue;
                    }
                }
            }
            if let Some(sink) = active.get_mut(&config.id) {
                if let Err(e) = sink.send(&fix) {
                    warn!("sink {} error: {e:#}", config.id);
                }
            }
        }
    }

    info!("fix forwarder ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockloc_core::fix::{build_fix, DEFAULT_ACCURACY_M};
    use mockloc_core::model::Waypoint;
    use mockloc_core::units::MetersPerSecond;

    #[test]
    fn test_file_sink_appends_ndjson() {
        let path = std::env::temp_dir()
            .join(format!("mockloc-sink-{}.ndjson", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let mut sink = FileSink::new(path.to_str().unwrap()).unwrap();
        let fix = build_fix(Waypoint::new(1.0, 2.0), MetersPerSecond(3.0), DEFAULT_ACCURACY_M);
        sink.send(&fix).unwrap();
        sink.send(&fix).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: Fix = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.lat, 1.0);
        assert_eq!(parsed.lng, 2.0);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_udp_sink_sends_datagram() {
        let receiver = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = receiver.local_addr().unwrap().port();
        receiver
            .set_read_timeout(Some(std::time::Duration::from_secs(5)))
            .unwrap();

        let mut sink = UdpSink::new("127.0.0.1", port).unwrap();
        let fix = build_fix(Waypoint::new(-10.5, 40.25), MetersPerSecond(1.0), DEFAULT_ACCURACY_M);
        sink.send(&fix).unwrap();

        let mut buf = [0u8; 2048];
        let (len, _) = receiver.recv_from(&mut buf).unwrap();
        let parsed: Fix = serde_json::from_slice(&buf[..len]).unwrap();
        assert_eq!(parsed.lat, -10.5);
        assert_eq!(parsed.lng, 40.25);
    }
}
