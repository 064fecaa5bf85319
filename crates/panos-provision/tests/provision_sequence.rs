//! Ordering and fidelity contract for the full provisioning sequence.
//!
//! The device evaluates rulebases first-match and resolves object
//! references by name, so the wire order of create calls is part of the
//! program's meaning. These tests pin that order against a recording
//! session fake.

use async_trait::async_trait;
use mockall::mock;
use panos_core::{PanDeviceError, Result};
use panos_provision::{network, policy, provision};
use panos_xapi::DeviceSession;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Create { xpath: String, element: String },
    Commit { sync: bool },
}

/// Session fake recording every call in invocation order. With
/// `fail_on_create`, the create at that index records its attempt and then
/// fails.
#[derive(Default)]
struct RecordingSession {
    calls: Mutex<Vec<Call>>,
    fail_on_create: Option<usize>,
}

impl RecordingSession {
    fn new() -> Self {
        Self::default()
    }

    fn failing_at(index: usize) -> Self {
        Self {
            fail_on_create: Some(index),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeviceSession for RecordingSession {
    async fn create(&self, xpath: &str, element: &str) -> Result<()> {
        let mut calls = self.calls.lock().unwrap();
        let index = calls
            .iter()
            .filter(|call| matches!(call, Call::Create { .. }))
            .count();
        calls.push(Call::Create {
            xpath: xpath.to_string(),
            element: element.to_string(),
        });

        if self.fail_on_create == Some(index) {
            return Err(PanDeviceError::new("simulated device failure"));
        }
        Ok(())
    }

    async fn commit(&self, sync: bool) -> Result<()> {
        self.calls.lock().unwrap().push(Call::Commit { sync });
        Ok(())
    }
}

fn entry_name(call: &Call) -> &str {
    let Call::Create { xpath, .. } = call else {
        panic!("expected a create call, got {call:?}");
    };
    let marker = "entry[@name='";
    let start = xpath.rfind(marker).expect("xpath carries an entry name") + marker.len();
    let rest = &xpath[start..];
    &rest[..rest.find('\'').expect("unterminated entry name")]
}

fn element_of(call: &Call) -> &str {
    let Call::Create { element, .. } = call else {
        panic!("expected a create call, got {call:?}");
    };
    element
}

#[tokio::test]
async fn full_run_submits_every_record_in_order_then_commits_once() {
    let session = RecordingSession::new();
    provision(&session).await.unwrap();

    let calls = session.calls();
    assert_eq!(calls.len(), 22, "21 creates plus one commit");
    assert_eq!(calls[21], Call::Commit { sync: true });

    let order: Vec<_> = calls[..21].iter().map(entry_name).collect();
    assert_eq!(
        order,
        [
            "ethernet1/1",
            "ethernet1/2",
            "ethernet1/3",
            "untrust",
            "web",
            "db",
            "default",
            "default",
            "web-srv",
            "db-srv",
            "service-tcp-221",
            "service-tcp-222",
            "Allow ping",
            "SSH inbound",
            "Web inbound",
            "Web to DB",
            "Allow outbound",
            "Web SSH",
            "DB SSH",
            "WordPress NAT",
            "Outgoing traffic",
        ]
    );
}

#[tokio::test]
async fn interfaces_carry_the_fixed_addresses() {
    let session = RecordingSession::new();
    network::configure(&session).await.unwrap();

    let calls = session.calls();
    assert_eq!(
        element_of(&calls[0]),
        r#"<layer3><ip><entry name="192.168.55.20/24"/></ip></layer3>"#
    );
    assert_eq!(
        element_of(&calls[1]),
        r#"<layer3><ip><entry name="192.168.45.20/24"/></ip></layer3>"#
    );
    assert_eq!(
        element_of(&calls[2]),
        r#"<layer3><ip><entry name="192.168.35.20/24"/></ip></layer3>"#
    );
}

#[tokio::test]
async fn zones_bind_exactly_one_interface_each() {
    let session = RecordingSession::new();
    network::configure(&session).await.unwrap();

    let calls = session.calls();
    assert_eq!(
        element_of(&calls[3]),
        "<network><layer3><member>ethernet1/1</member></layer3></network>"
    );
    assert_eq!(
        element_of(&calls[4]),
        "<network><layer3><member>ethernet1/2</member></layer3></network>"
    );
    assert_eq!(
        element_of(&calls[5]),
        "<network><layer3><member>ethernet1/3</member></layer3></network>"
    );
}

#[tokio::test]
async fn router_owns_all_interfaces_and_the_default_route() {
    let session = RecordingSession::new();
    network::configure(&session).await.unwrap();

    let calls = session.calls();
    assert_eq!(calls.len(), 8);
    assert_eq!(
        element_of(&calls[6]),
        "<interface><member>ethernet1/1</member><member>ethernet1/2</member><member>ethernet1/3</member></interface>"
    );

    // The route is created inside the router's entry, never on its own.
    let Call::Create { xpath, element } = &calls[7] else {
        panic!("expected the route create");
    };
    assert!(xpath.contains("/network/virtual-router/entry[@name='default']/routing-table/ip/static-route/entry[@name='default']"));
    assert_eq!(
        element,
        "<destination>0.0.0.0/0</destination><nexthop><ip-address>192.168.55.2</ip-address></nexthop>"
    );
}

#[tokio::test]
async fn policy_step_submits_objects_before_rules() {
    let session = RecordingSession::new();
    policy::configure(&session).await.unwrap();

    let calls = session.calls();
    assert_eq!(calls.len(), 13, "2 addresses, 2 services, 9 rules");
    assert_eq!(element_of(&calls[0]), "<ip-netmask>192.168.45.5</ip-netmask>");
    assert_eq!(element_of(&calls[1]), "<ip-netmask>192.168.35.5</ip-netmask>");
    assert_eq!(
        element_of(&calls[2]),
        "<protocol><tcp><port>221</port></tcp></protocol>"
    );
    assert_eq!(
        element_of(&calls[3]),
        "<protocol><tcp><port>222</port></tcp></protocol>"
    );
    assert_eq!(entry_name(&calls[4]), "Allow ping");
}

#[tokio::test]
async fn nat_rules_carry_the_fixed_translations() {
    let session = RecordingSession::new();
    policy::configure(&session).await.unwrap();

    let calls = session.calls();
    let web_ssh = element_of(&calls[9]);
    assert!(web_ssh.contains("<service>service-tcp-221</service>"));
    assert!(web_ssh.contains("<interface>ethernet1/2</interface>"));
    assert!(web_ssh.contains(
        "<translated-address>web-srv</translated-address><translated-port>22</translated-port>"
    ));

    let db_ssh = element_of(&calls[10]);
    assert!(db_ssh.contains("<service>service-tcp-222</service>"));
    assert!(db_ssh.contains("<interface>ethernet1/3</interface>"));
    assert!(db_ssh.contains(
        "<translated-address>db-srv</translated-address><translated-port>22</translated-port>"
    ));

    let wordpress = element_of(&calls[11]);
    assert!(wordpress.contains("<service>service-http</service>"));
    assert!(wordpress.contains("<translated-address>web-srv</translated-address>"));
    assert!(!wordpress.contains("translated-port"));

    let outgoing = element_of(&calls[12]);
    assert!(outgoing.contains("<from><member>web</member><member>db</member></from>"));
    assert!(outgoing.contains("<interface>ethernet1/1</interface>"));
    assert!(!outgoing.contains("destination-translation"));
}

#[tokio::test]
async fn a_failed_create_stops_the_sequence_before_commit() {
    // Index 5 is the `db` zone, mid-way through the network step.
    let session = RecordingSession::failing_at(5);
    let err = provision(&session).await.unwrap_err();
    assert_eq!(err.to_string(), "simulated device failure");

    let calls = session.calls();
    assert_eq!(calls.len(), 6, "nothing past the failed create");
    assert_eq!(entry_name(&calls[5]), "db");
    assert!(!calls.iter().any(|call| matches!(call, Call::Commit { .. })));
}

#[tokio::test]
async fn a_failed_rule_create_skips_the_remaining_rules() {
    // Index 13 is `SSH inbound`, the second security rule.
    let session = RecordingSession::failing_at(13);
    provision(&session).await.unwrap_err();

    let calls = session.calls();
    assert_eq!(calls.len(), 14);
    assert_eq!(entry_name(&calls[13]), "SSH inbound");
    assert!(!calls.iter().any(|call| matches!(call, Call::Commit { .. })));
}

mock! {
    Session {}

    #[async_trait]
    impl DeviceSession for Session {
        async fn create(&self, xpath: &str, element: &str) -> Result<()>;
        async fn commit(&self, sync: bool) -> Result<()>;
    }
}

#[tokio::test]
async fn first_failure_short_circuits_everything() {
    let mut session = MockSession::new();
    session
        .expect_create()
        .times(1)
        .returning(|_, _| Err(PanDeviceError::new("ethernet1/1 is already in use")));
    session.expect_commit().times(0);

    let err = provision(&session).await.unwrap_err();
    assert_eq!(err.to_string(), "ethernet1/1 is already in use");
}

#[tokio::test]
async fn commit_rejection_surfaces_after_all_creates() {
    let mut session = MockSession::new();
    session.expect_create().times(21).returning(|_, _| Ok(()));
    session
        .expect_commit()
        .times(1)
        .returning(|_| Err(PanDeviceError::new("commit job 7 failed: FAIL")));

    let err = provision(&session).await.unwrap_err();
    assert_eq!(err.to_string(), "commit job 7 failed: FAIL");
}
