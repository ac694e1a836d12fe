mod common;

use std::sync::Arc;
use std::time::Duration;

use resilient_client::config::ConnectivityConfig;
use resilient_client::connectivity::{
    connectivity_channel, ConnectivityMonitor, HostEvent, HttpProbe, SignalSource,
};
use resilient_client::http::RequestOptions;
use resilient_client::{ErrorClass, ResilientClient, Shutdown};
use tokio::sync::mpsc;
use url::Url;

#[tokio::test]
async fn test_probe_marks_false_online_as_offline() {
    let addr = common::closed_port().await;
    let probe = HttpProbe::new(
        common::direct_transport(),
        Url::parse(&format!("http://{addr}/ping")).unwrap(),
        Duration::from_millis(500),
    );

    let (writer, reader) = connectivity_channel();
    let monitor =
        ConnectivityMonitor::new(writer, &ConnectivityConfig::default()).with_probe(Arc::new(probe));
    let mut events = reader.subscribe();
    let (_host_tx, host_rx) = mpsc::unbounded_channel::<HostEvent>();
    let shutdown = Shutdown::new();
    let task = tokio::spawn(monitor.run(host_rx, shutdown.subscribe()));

    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(!event.is_online);
    assert_eq!(event.source, SignalSource::Probe);

    // The gated client now refuses without touching the network.
    let client = ResilientClient::builder()
        .transport(common::direct_transport())
        .connectivity(reader.clone())
        .build()
        .unwrap();
    let err = client
        .request(&format!("http://{addr}/"), RequestOptions::get(), None)
        .await
        .unwrap_err();
    assert_eq!(err.class, ErrorClass::Network);
    assert_eq!(err.attempts, 0);

    shutdown.trigger();
    task.await.unwrap();
}

#[tokio::test]
async fn test_probe_success_records_rtt() {
    let addr = common::start_mock_backend(204, "").await;
    let probe = HttpProbe::new(
        common::direct_transport(),
        Url::parse(&format!("http://{addr}/ping")).unwrap(),
        Duration::from_secs(2),
    );

    let (writer, reader) = connectivity_channel();
    writer.set_online(false, SignalSource::Host);
    let monitor =
        ConnectivityMonitor::new(writer, &ConnectivityConfig::default()).with_probe(Arc::new(probe));
    let mut events = reader.subscribe();
    let (_host_tx, host_rx) = mpsc::unbounded_channel::<HostEvent>();
    let shutdown = Shutdown::new();
    let task = tokio::spawn(monitor.run(host_rx, shutdown.subscribe()));

    let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(event.is_online);
    assert!(reader.snapshot().hints.rtt_ms.is_some());

    shutdown.trigger();
    task.await.unwrap();
}
