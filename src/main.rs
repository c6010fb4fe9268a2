/* 3rd party libraries */
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossbeam_channel as cbc;
use log::{error, info};

/* Library crate */
use elevsync::assign;
use elevsync::config::{Cli, Config};
use elevsync::hardware::null_hardware;
use elevsync::sync::{self, NodeEvent};
use elevsync::transport::UdpBroadcastTransport;
use elevsync::worldview::Worldview;

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let config = match Config::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("failed to load configuration: {e}");
            std::process::exit(1);
        }
    };
    info!("starting node {} on port {} ({} floors)", config.id, config.port, config.num_floors);

    let worldview = Arc::new(Worldview::new(config.id, config.num_floors));

    let transport = match UdpBroadcastTransport::bind(config.port) {
        Ok(transport) => Arc::new(transport),
        Err(e) => {
            error!("failed to bind UDP socket on port {}: {e}", config.port);
            std::process::exit(1);
        }
    };

    let handles = sync::spawn(
        worldview.clone(),
        transport,
        Duration::from_millis(config.broadcast_interval_ms),
        Duration::from_millis(config.node_timeout_ms),
    );

    // Hardware driving is out of scope; a null driver lets the assignment
    // loop below run against a real worldview without a physical elevator
    // attached.
    let (_hardware_port, _hardware_senders) = null_hardware();

    let assignment_tick = cbc::tick(Duration::from_millis(250));

    loop {
        cbc::select! {
            recv(handles.node_event_rx) -> event => {
                match event {
                    Ok(NodeEvent::PeerLost(id)) => info!("peer {id} lost"),
                    Ok(NodeEvent::PeerReappeared(id)) => info!("peer {id} reappeared"),
                    Err(_) => { error!("sync loop node event channel closed"); std::process::exit(1); }
                }
            }
            recv(assignment_tick) -> _ => {
                let (behavior, direction) = assign::decide(&worldview);
                info!("assignment decision: behavior={behavior:?} direction={direction:?}");
            }
        }
    }
}
