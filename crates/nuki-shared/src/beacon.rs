use serde::Serialize;

use crate::constants::{BEACON_CLEAN_TX_POWER, BEACON_SIZE, BEACON_TYPE};
use crate::error::BeaconError;

/// Manufacturer-data broadcast a lock uses to signal state changes.
///
/// Big-endian layout: `company (2) | type (1) | length (1) | uuid (16) |
/// nuki id (4) | tx power (i8)`. A transmit power other than the calibrated
/// -60 dBm means the lock has state the bridge has not fetched yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Beacon {
    pub company: [u8; 2],
    pub length: u8,
    pub uuid: [u8; 16],
    pub nuki_id: u32,
    pub tx_power: i8,
    pub dirty: bool,
}

impl Beacon {
    pub fn decode(data: &[u8]) -> Result<Self, BeaconError> {
        if data.len() != BEACON_SIZE {
            return Err(BeaconError::WrongSize(data.len()));
        }
        let kind = data[2];
        if kind != BEACON_TYPE {
            return Err(BeaconError::NotABeacon(kind));
        }
        let tx_power = data[24] as i8;
        Ok(Self {
            company: [data[0], data[1]],
            length: data[3],
            uuid: data[4..20].try_into().map_err(|_| BeaconError::WrongSize(data.len()))?,
            nuki_id: u32::from_be_bytes([data[20], data[21], data[22], data[23]]),
            tx_power,
            dirty: tx_power != BEACON_CLEAN_TX_POWER,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NUKI_UUID: [u8; 16] = [
        0xA9, 0x2E, 0xE2, 0x00, 0x55, 0x01, 0x11, 0xE4, 0x91, 0x6C, 0x08, 0x00, 0x20, 0x0C, 0x9A,
        0x66,
    ];

    fn advertisement(kind: u8, nuki_id: u32, tx_power: i8) -> Vec<u8> {
        let mut data = vec![0x4C, 0x00, kind, 0x15];
        data.extend_from_slice(&NUKI_UUID);
        data.extend_from_slice(&nuki_id.to_be_bytes());
        data.push(tx_power as u8);
        data
    }

    #[test]
    fn test_clean_beacon() {
        let beacon = Beacon::decode(&advertisement(0x02, 12345, -60)).unwrap();
        assert_eq!(beacon.nuki_id, 12345);
        assert_eq!(beacon.uuid, NUKI_UUID);
        assert!(!beacon.dirty);
    }

    #[test]
    fn test_dirty_beacon() {
        let beacon = Beacon::decode(&advertisement(0x02, 12345, -50)).unwrap();
        assert_eq!(beacon.tx_power, -50);
        assert!(beacon.dirty);
    }

    #[test]
    fn test_wrong_type_is_not_a_beacon() {
        assert_eq!(
            Beacon::decode(&advertisement(0x03, 12345, -60)),
            Err(BeaconError::NotABeacon(0x03))
        );
    }

    #[test]
    fn test_wrong_size() {
        let mut data = advertisement(0x02, 1, -60);
        data.push(0);
        assert_eq!(Beacon::decode(&data), Err(BeaconError::WrongSize(26)));
    }
}
