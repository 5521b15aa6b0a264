//! TCP admission gate.
//!
//! Every inbound socket is reported as a connection attempt. Rejected peers
//! get the kick message and are closed. Accepted peers must send their first
//! bytes within the handshake timeout; that counts as handshake completion and
//! the connection is then relayed to the upstream service.

use admission_control::{ConnectionEvents, ConnectionVerdict};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, info, warn};

const FIRST_READ_BUFFER: usize = 4096;

pub struct AdmissionGate {
    events: Arc<dyn ConnectionEvents>,
    upstream: SocketAddr,
    handshake_timeout: Duration,
}

impl AdmissionGate {
    pub fn new(
        events: Arc<dyn ConnectionEvents>,
        upstream: SocketAddr,
        handshake_timeout: Duration,
    ) -> Self {
        Self {
            events,
            upstream,
            handshake_timeout,
        }
    }

    /// Accept connections until the shutdown signal changes.
    pub async fn run(self: Arc<Self>, listener: TcpListener, mut shutdown: watch::Receiver<bool>) {
        if let Ok(addr) = listener.local_addr() {
            info!(listen = %addr, upstream = %self.upstream, "admission gate listening");
        }

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((socket, peer)) => {
                        let gate = Arc::clone(&self);
                        tokio::spawn(async move { gate.handle(socket, peer).await });
                    }
                    Err(e) => warn!(error = %e, "accept failed"),
                },
                _ = shutdown.changed() => {
                    debug!("Shutdown signal received, gate stops accepting");
                    break;
                }
            }
        }
    }

    async fn handle(&self, mut socket: TcpStream, peer: SocketAddr) {
        let ip = peer.ip();

        match self.events.on_connection_attempt(ip) {
            ConnectionVerdict::Reject { reason, message } => {
                debug!(address = %ip, reason = %reason, "connection rejected");
                let _ = socket.write_all(format!("{message}\n").as_bytes()).await;
                let _ = socket.shutdown().await;
            }
            ConnectionVerdict::Accept => {
                self.serve(socket, ip).await;
                self.events.on_disconnected(ip);
            }
        }
    }

    async fn serve(&self, mut socket: TcpStream, ip: IpAddr) {
        let mut first = vec![0u8; FIRST_READ_BUFFER];
        let n = match tokio::time::timeout(self.handshake_timeout, socket.read(&mut first)).await {
            Ok(Ok(0)) => return,
            Ok(Ok(n)) => n,
            Ok(Err(e)) => {
                debug!(address = %ip, error = %e, "read failed before handshake");
                return;
            }
            Err(_) => {
                debug!(address = %ip, "no handshake before timeout, closing");
                return;
            }
        };
        self.events.on_handshake_completed(ip);

        let mut upstream = match TcpStream::connect(self.upstream).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(upstream = %self.upstream, error = %e, "upstream unreachable");
                return;
            }
        };

        if let Err(e) = upstream.write_all(&first[..n]).await {
            debug!(address = %ip, error = %e, "upstream write failed");
            return;
        }
        if let Err(e) = tokio::io::copy_bidirectional(&mut socket, &mut upstream).await {
            debug!(address = %ip, error = %e, "relay ended with error");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use admission_control::test_utils::ManualTimeSource;
    use admission_control::{AdmissionConfig, AdmissionService};

    async fn echo_upstream() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(async move {
                    let (mut reader, mut writer) = socket.split();
                    let _ = tokio::io::copy(&mut reader, &mut writer).await;
                });
            }
        });
        addr
    }

    async fn start_gate(
        config: AdmissionConfig,
        clock: Arc<ManualTimeSource>,
    ) -> (SocketAddr, Arc<AdmissionService>, watch::Sender<bool>) {
        let service = Arc::new(AdmissionService::new(config, clock, None));
        let upstream = echo_upstream().await;
        let gate = Arc::new(AdmissionGate::new(
            Arc::clone(&service) as Arc<dyn ConnectionEvents>,
            upstream,
            service.config().handshake_timeout(),
        ));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(gate.run(listener, shutdown_rx));
        (addr, service, shutdown_tx)
    }

    fn clock() -> Arc<ManualTimeSource> {
        Arc::new(ManualTimeSource::new(1_000_000))
    }

    async fn eventually(mut check: impl FnMut() -> bool) -> bool {
        for _ in 0..200 {
            if check() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_accepted_connection_is_relayed() {
        let (addr, service, _shutdown) = start_gate(AdmissionConfig::default(), clock()).await;

        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(b"hello").await.unwrap();
        let mut buf = [0u8; 5];
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hello");
        assert_eq!(service.counters().handshakes_completed, 1);

        drop(client);
        let ip: IpAddr = "127.0.0.1".parse().unwrap();
        assert!(
            eventually(|| service
                .state_of(&ip)
                .is_some_and(|s| s.active_connections == 0))
            .await
        );
    }

    #[tokio::test]
    async fn test_rejected_peer_receives_kick_message() {
        let config = AdmissionConfig {
            max_concurrent: 1,
            kick_message: "go away".to_string(),
            ..AdmissionConfig::default()
        };
        let (addr, _service, _shutdown) = start_gate(config, clock()).await;

        let mut held = TcpStream::connect(addr).await.unwrap();
        held.write_all(b"hi").await.unwrap();
        let mut buf = [0u8; 2];
        held.read_exact(&mut buf).await.unwrap();

        let mut rejected = TcpStream::connect(addr).await.unwrap();
        let mut reply = String::new();
        rejected.read_to_string(&mut reply).await.unwrap();
        assert_eq!(reply, "go away\n");
    }

    #[tokio::test]
    async fn test_silent_peer_is_closed_after_timeout() {
        let config = AdmissionConfig {
            handshake_timeout_ms: 100,
            ..AdmissionConfig::default()
        };
        let (addr, service, _shutdown) = start_gate(config, clock()).await;

        let mut client = TcpStream::connect(addr).await.unwrap();
        let mut buf = [0u8; 8];
        let n = tokio::time::timeout(Duration::from_secs(2), client.read(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(n, 0);

        let ip: IpAddr = "127.0.0.1".parse().unwrap();
        assert!(
            eventually(|| service
                .state_of(&ip)
                .is_some_and(|s| s.active_connections == 0 && s.pending_handshakes == 1))
            .await
        );
        assert_eq!(service.counters().handshakes_completed, 0);
    }

    #[tokio::test]
    async fn test_banned_peer_is_readmitted_after_ban() {
        let config = AdmissionConfig {
            max_attempts_per_window: 1,
            kick_message: "banned".to_string(),
            ..AdmissionConfig::default()
        };
        let clock = clock();
        let (addr, service, _shutdown) = start_gate(config, Arc::clone(&clock)).await;
        let ip: IpAddr = "127.0.0.1".parse().unwrap();

        let mut first = TcpStream::connect(addr).await.unwrap();
        first.write_all(b"a").await.unwrap();
        let mut buf = [0u8; 1];
        first.read_exact(&mut buf).await.unwrap();
        drop(first);
        assert!(
            eventually(|| service
                .state_of(&ip)
                .is_some_and(|s| s.active_connections == 0))
            .await
        );

        let mut over_limit = TcpStream::connect(addr).await.unwrap();
        let mut reply = String::new();
        over_limit.read_to_string(&mut reply).await.unwrap();
        assert_eq!(reply, "banned\n");

        clock.advance(service.config().ban_ms + service.config().window_ms);

        let mut readmitted = TcpStream::connect(addr).await.unwrap();
        readmitted.write_all(b"b").await.unwrap();
        readmitted.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"b");
    }
}
