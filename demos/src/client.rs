//! Minimal standalone client: connects to a `net-server` instance, sends a
//! heartbeat on an interval, and logs driver events until interrupted with
//! Ctrl+C.
//!
//! Usage: net-client <server-addr> <server-pubkey-pem-file>

use std::time::Duration;

use protocol::crypto::RsaKeyPair;
use protocol::{ConnectionFailureReason, DriverConfig, DriverEvent, Endpoint};

fn main() {
	runtime::init_logger(log::LevelFilter::Info);

	let mut args = std::env::args().skip(1);
	let server_addr = args.next().expect("usage: net-client <server-addr> <server-pubkey-pem-file>");
	let pem_path = args.next().expect("usage: net-client <server-addr> <server-pubkey-pem-file>");

	let server_endpoint: Endpoint = server_addr.parse().expect("invalid server address");
	let pem = std::fs::read_to_string(&pem_path).expect("failed to read server public key file");
	let server_public_key = RsaKeyPair::public_from_pem(&pem).expect("failed to parse server public key");

	let client_keypair = RsaKeyPair::generate().expect("failed to generate client keypair");
	let config = DriverConfig::default();

	let driver = protocol::driver::ClientDriver::start(config, client_keypair, server_endpoint).expect("failed to start client driver");
	driver.connect(&server_public_key).expect("failed to send connect");

	let signal = runtime::ShutdownSignal::install().expect("failed to install Ctrl+C handler");

	// Polled well under `heartbeat_interval` so the driver's own `heartbeat_waiting`/bound
	// check (not this loop) decides whether a heartbeat actually goes on the wire.
	while !signal.requested() {
		while let Ok(event) = driver.events().recv_timeout(Duration::from_millis(50)) {
			log_event(&event);
		}

		if driver.is_connected() {
			if let Err(err) = driver.send_heartbeat() {
				log::error!("failed to send heartbeat: {err}");
			}
		}
	}

	driver.stop();
}

fn log_event(event: &DriverEvent) {
	match event {
		DriverEvent::ConnectSuccess { .. } => log::info!("connected to server"),
		DriverEvent::ConnectFailed { reason, .. } => log::error!("connect failed: {}", reason_text(*reason)),
		DriverEvent::ConnectionTerminated { reason, .. } => log::warn!("connection terminated: {}", reason_text(*reason)),
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
