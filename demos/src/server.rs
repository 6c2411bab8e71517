//! Minimal standalone server: binds a port, prints its public key PEM so a
//! `net-client` instance can be pointed at it, then logs driver events until
//! interrupted with Ctrl+C.
//!
//! Usage: net-server <bind-port>

use std::time::Duration;

use protocol::crypto::RsaKeyPair;
use protocol::{ConnectionFailureReason, DriverConfig, DriverEvent, Endpoint};

fn main() {
	runtime::init_logger(log::LevelFilter::Info);

	let port: u16 = std::env::args().nth(1).and_then(|s| s.parse().ok()).unwrap_or(27015);

	let keypair = RsaKeyPair::generate().expect("failed to generate server keypair");
	let pem = keypair.public_to_pem().expect("failed to encode server public key");

	let mut config = DriverConfig::default();
	config.bind = Some(Endpoint::v4(std::net::Ipv4Addr::UNSPECIFIED, port));

	let driver = protocol::driver::ServerDriver::start(config, keypair).expect("failed to start server driver");

	println!("listening on port {port}");
	println!("server public key:\n{pem}");

	let signal = runtime::ShutdownSignal::install().expect("failed to install Ctrl+C handler");

	while !signal.requested() {
		while let Ok(event) = driver.events().recv_timeout(Duration::from_millis(200)) {
			log_event(&event);
		}
		let evicted = driver.tick();
		if evicted > 0 {
			log::info!("evicted {evicted} timed-out connection(s)");
		}
	}

	log::info!("shutting down ({} active connections)", driver.connection_count());
	driver.stop();
}

fn log_event(event: &DriverEvent) {
	match event {
		DriverEvent::ConnectionCreated { connection_id } => log::info!("connection {connection_id} established"),
		DriverEvent::ConnectionTerminated { connection_id, reason } => log::info!("connection {connection_id} terminated: {}", reason_text(*reason)),
		DriverEvent::HeartbeatReceived { connection_id, .. } => log::debug!("heartbeat from connection {connection_id}"),
		other => log::debug!("{other:?}"),
	}
}

fn reason_text(reason: ConnectionFailureReason) -> &'static str {
	match reason {
		ConnectionFailureReason::Unknown => "unknown",
		ConnectionFailureReason::TimedOut => "timed out",
		ConnectionFailureReason::ServerFull => "server full",
	}
}
