//! End-to-end admission flows through the public ports.

use admission_control::adapters::{FileConfigProvider, StaticConfigProvider};
use admission_control::test_utils::{ManualTimeSource, RecordingAlertSender};
use admission_control::{
    AdmissionConfig, AdmissionService, AlertSender, ConfigProvider, ConnectionEvents,
    ConnectionVerdict, DenyReason, MaintenanceApi, TimeSource,
};
use proptest::prelude::*;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

const START: u64 = 1_700_000_000_000;

fn peer(n: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(192, 0, 2, n))
}

fn build(
    config: AdmissionConfig,
    sender: Option<Arc<RecordingAlertSender>>,
) -> (Arc<ManualTimeSource>, AdmissionService) {
    let clock = Arc::new(ManualTimeSource::new(START));
    let provider = StaticConfigProvider::new(config);
    let service = AdmissionService::from_provider(
        &provider,
        Arc::clone(&clock) as Arc<dyn TimeSource>,
        sender.map(|s| s as Arc<dyn AlertSender>),
    );
    (clock, service)
}

#[test]
fn well_behaved_client_is_never_banned() {
    let (clock, service) = build(AdmissionConfig::default(), None);
    let ip = peer(1);

    for _ in 0..50 {
        assert_eq!(service.on_connection_attempt(ip), ConnectionVerdict::Accept);
        clock.advance(100);
        service.on_handshake_completed(ip);
        clock.advance(1_500);
        service.check_handshakes();
        service.on_disconnected(ip);
    }

    assert_eq!(service.stats().active_bans, 0);
    let state = service.state_of(&ip).unwrap();
    assert_eq!(state.incomplete_in_window, 0);
    assert_eq!(state.active_connections, 0);
}

#[test]
fn flooding_client_is_banned_then_readmitted() {
    let (clock, service) = build(
        AdmissionConfig {
            max_concurrent: 50,
            ..AdmissionConfig::default()
        },
        None,
    );
    let ip = peer(2);
    let bystander = peer(3);

    let verdicts: Vec<_> = (0..8).map(|_| service.on_connection_attempt(ip)).collect();
    assert!(verdicts[..4].iter().all(ConnectionVerdict::is_accepted));
    assert!(matches!(
        verdicts[5],
        ConnectionVerdict::Reject {
            reason: DenyReason::Banned,
            ..
        }
    ));

    // other addresses are unaffected
    assert!(service.on_connection_attempt(bystander).is_accepted());

    clock.advance(59_999);
    assert!(!service.on_connection_attempt(ip).is_accepted());
    clock.advance(1);
    assert!(service.on_connection_attempt(ip).is_accepted());
}

#[test]
fn silent_connections_escalate_to_ban() {
    let (clock, service) = build(
        AdmissionConfig {
            max_concurrent: 10,
            max_attempts_per_window: 10,
            ..AdmissionConfig::default()
        },
        None,
    );
    let ip = peer(4);

    for _ in 0..4 {
        assert!(service.on_connection_attempt(ip).is_accepted());
    }
    clock.advance(800);
    service.check_handshakes();

    match service.on_connection_attempt(ip) {
        ConnectionVerdict::Reject { reason, .. } => assert_eq!(reason, DenyReason::Banned),
        ConnectionVerdict::Accept => panic!("expected ban after incomplete handshakes"),
    }
}

#[test]
fn idle_state_is_swept() {
    let (clock, service) = build(AdmissionConfig::default(), None);
    for n in 10..20 {
        service.on_connection_attempt(peer(n));
    }
    assert_eq!(service.stats().tracked_addresses, 10);

    clock.advance(120_001);
    service.sweep_stale();
    assert_eq!(service.stats().tracked_addresses, 0);
}

#[tokio::test]
async fn attack_raises_single_alert_per_cooldown() {
    let sender = Arc::new(RecordingAlertSender::new());
    let (clock, service) = build(
        AdmissionConfig {
            attack_block_threshold: 5,
            ..AdmissionConfig::default()
        },
        Some(Arc::clone(&sender)),
    );

    for round in 0..3 {
        for n in 0..10 {
            service.on_connection_attempt(peer(100 + n));
            service.on_connection_attempt(peer(100 + n));
            service.on_connection_attempt(peer(100 + n));
        }
        clock.advance(10_000);
        service.flush_metrics();
        if round == 0 {
            assert!(sender.wait_for_sends(1, Duration::from_secs(2)).await);
        }
    }

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(sender.sent_count(), 1);
}

#[test]
fn file_config_drives_thresholds() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yml");
    std::fs::write(&path, "max_concurrent: 1\nkick_message: go away\n").unwrap();

    let provider = FileConfigProvider::load_or_create(&path);
    assert_eq!(provider.admission_config().max_concurrent, 1);

    let service = AdmissionService::from_provider(
        &provider,
        Arc::new(ManualTimeSource::new(START)),
        None,
    );
    let ip = peer(5);
    assert!(service.on_connection_attempt(ip).is_accepted());
    assert_eq!(
        service.on_connection_attempt(ip),
        ConnectionVerdict::Reject {
            reason: DenyReason::Ban(admission_control::BanReason::MaxConcurrent),
            message: "go away".to_string(),
        }
    );
}

#[derive(Clone, Debug)]
enum Event {
    Attempt(u8),
    Disconnect(u8),
    Handshake(u8),
    Tick(u16),
}

fn event() -> impl Strategy<Value = Event> {
    prop_oneof![
        (0u8..4).prop_map(Event::Attempt),
        (0u8..4).prop_map(Event::Disconnect),
        (0u8..4).prop_map(Event::Handshake),
        (0u16..2_000).prop_map(Event::Tick),
    ]
}

proptest! {
    #[test]
    fn active_connections_never_underflow(events in proptest::collection::vec(event(), 1..200)) {
        let (clock, service) = build(AdmissionConfig::default(), None);
        let mut open = [0u32; 4];

        for event in events {
            match event {
                Event::Attempt(n) => {
                    if service.on_connection_attempt(peer(n)).is_accepted() {
                        open[n as usize] += 1;
                    }
                }
                Event::Disconnect(n) => {
                    service.on_disconnected(peer(n));
                    open[n as usize] = open[n as usize].saturating_sub(1);
                }
                Event::Handshake(n) => service.on_handshake_completed(peer(n)),
                Event::Tick(ms) => {
                    clock.advance(u64::from(ms));
                    service.check_handshakes();
                }
            }

            for n in 0..4u8 {
                if let Some(state) = service.state_of(&peer(n)) {
                    prop_assert!(state.active_connections <= open[n as usize]);
                    prop_assert!(state.active_connections <= service.config().max_concurrent);
                }
            }
        }
    }
}
