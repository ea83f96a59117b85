//! Sequential processing of advertisements delivered by the background scan.

use nuki_shared::beacon::Beacon;
use nuki_shared::constants::BEACON_SIZE;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::adapter::Advertisement;
use crate::bridge::Bridge;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Classified {
    PairingCandidate,
    Beacon(Beacon),
    Ignore,
}

/// Decide what an advertisement asks of the bridge. Pairing takes precedence
/// over beacons.
pub(crate) fn classify(advertisement: &Advertisement, pairing_enabled: bool, known: bool) -> Classified {
    if pairing_enabled && !known && advertisement.is_pairing_candidate() {
        return Classified::PairingCandidate;
    }
    if advertisement.manufacturer_data.len() == BEACON_SIZE {
        match Beacon::decode(&advertisement.manufacturer_data) {
            Ok(beacon) => return Classified::Beacon(beacon),
            Err(e) => trace!(address = %advertisement.address, error = %e, "Not a beacon"),
        }
    }
    Classified::Ignore
}

pub(crate) async fn run(bridge: Bridge, mut rx: mpsc::Receiver<Advertisement>) {
    debug!("Advertisement monitor started");
    loop {
        let advertisement = tokio::select! {
            _ = bridge.shutdown_requested() => break,
            received = rx.recv() => match received {
                Some(advertisement) => advertisement,
                None => break,
            },
        };

        if process(&bridge, &advertisement).await {
            // Whatever queued up before the scan stopped is stale now.
            let mut dropped = 0;
            while rx.try_recv().is_ok() {
                dropped += 1;
            }
            if dropped > 0 {
                trace!(dropped, "Discarded queued advertisements");
            }
        }
    }
    debug!("Advertisement monitor stopped");
}

/// Returns whether the radio was used.
async fn process(bridge: &Bridge, advertisement: &Advertisement) -> bool {
    let known = bridge.is_known_address(&advertisement.address).await;
    match classify(advertisement, bridge.is_pairing_enabled(), known) {
        Classified::PairingCandidate => {
            match bridge.pair_candidate(&advertisement.address).await {
                Ok(nuki_id) => info!(nuki_id, lock = %advertisement.address, "New lock registered"),
                Err(e) => warn!(lock = %advertisement.address, error = %e, "Pairing failed"),
            }
            true
        }
        Classified::Beacon(beacon) => match bridge.handle_beacon(&beacon).await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(nuki_id = beacon.nuki_id, error = %e, "State fetch after beacon failed");
                true
            }
        },
        Classified::Ignore => false,
    }
}
