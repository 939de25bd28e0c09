//! Advertising-data helpers for stacks that hand over raw AD payloads.

use heapless::{String, Vec};

use crate::ble::transport::AdvertisedDevice;
use crate::ble::Address;
use crate::config::ADV_DATA_CAPACITY;

const AD_INCOMPLETE_16BIT_UUIDS: u8 = 0x02;
const AD_COMPLETE_16BIT_UUIDS: u8 = 0x03;
const AD_SHORTENED_LOCAL_NAME: u8 = 0x08;
const AD_COMPLETE_LOCAL_NAME: u8 = 0x09;

/// Iterator over `(ad_type, payload)` structures.  Stops at the first
/// zero-length or truncated structure.
struct AdStructures<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for AdStructures<'a> {
    type Item = (u8, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let i = self.pos;
        let len = *self.data.get(i)? as usize;
        if len == 0 || i + len >= self.data.len() {
            return None;
        }
        self.pos = i + len + 1;
        Some((self.data[i + 1], &self.data[i + 2..i + 1 + len]))
    }
}

fn ad_structures(data: &[u8]) -> AdStructures<'_> {
    AdStructures { data, pos: 0 }
}

fn is_uuid16_list(ad_type: u8) -> bool {
    ad_type == AD_INCOMPLETE_16BIT_UUIDS || ad_type == AD_COMPLETE_16BIT_UUIDS
}

/// Whether the advertisement carries a 16-bit service UUID list.
pub fn has_service_uuids(data: &[u8]) -> bool {
    ad_structures(data).any(|(ad_type, _)| is_uuid16_list(ad_type))
}

/// Check if raw advertisement data lists the 16-bit service `uuid`.
pub fn advertises_service(data: &[u8], uuid: u16) -> bool {
    let uuid_le = uuid.to_le_bytes();
    ad_structures(data)
        .filter(|(ad_type, _)| is_uuid16_list(*ad_type))
        .any(|(_, uuids)| uuids.chunks_exact(2).any(|chunk| chunk == uuid_le))
}

/// Extract complete/shortened local name, truncated to 32 characters.
pub fn local_name(data: &[u8]) -> Option<String<32>> {
    let (_, name_bytes) = ad_structures(data).find(|(ad_type, _)| {
        *ad_type == AD_SHORTENED_LOCAL_NAME || *ad_type == AD_COMPLETE_LOCAL_NAME
    })?;

    let mut name = String::new();
    for &b in name_bytes {
        if name.push(b as char).is_err() {
            break;
        }
    }
    Some(name)
}

/// A scan result described by its raw advertising payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawAdvertisement {
    address: Address,
    connectable: bool,
    data: Vec<u8, ADV_DATA_CAPACITY>,
}

impl RawAdvertisement {
    /// `data` is the advertisement followed by any scan response; bytes
    /// past the capacity are dropped.
    pub fn new(address: Address, connectable: bool, data: &[u8]) -> Self {
        let mut buf = Vec::new();
        let keep = data.len().min(ADV_DATA_CAPACITY);
        // Cannot fail: `keep` never exceeds the capacity.
        let _ = buf.extend_from_slice(&data[..keep]);
        Self {
            address,
            connectable,
            data: buf,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn name(&self) -> Option<String<32>> {
        local_name(&self.data)
    }
}

impl AdvertisedDevice for RawAdvertisement {
    fn address(&self) -> Address {
        self.address
    }

    fn is_connectable(&self) -> bool {
        self.connectable
    }

    fn has_service_uuid(&self) -> bool {
        has_service_uuids(&self.data)
    }

    fn is_advertising_service(&self, uuid: u16) -> bool {
        advertises_service(&self.data, uuid)
    }
}
