//! USB driver for the Lunatone DALI bridge
//!
//! Discovery and setup follow the bridge's expectations: find the device by
//! vendor/product id, reset it, detach a bound kernel driver, claim
//! interface 0 and locate the IN/OUT endpoints from the active
//! configuration. The device exposes one endpoint per direction; their
//! transfer type decides whether reads/writes go through bulk or interrupt
//! transfers.

use super::{Transport, TransportError};
use rusb::{DeviceHandle, Direction, GlobalContext, TransferType};
use std::time::Duration;
use tracing::{debug, info};

/// Lunatone DALI USB vendor id
pub const DALI_USB_VENDOR: u16 = 0x17B5;
/// Lunatone DALI USB product id
pub const DALI_USB_PRODUCT: u16 = 0x0020;

const INTERFACE: u8 = 0;

#[derive(Debug, Clone, Copy)]
struct Endpoint {
    address: u8,
    transfer: TransferType,
    max_packet_size: usize,
}

/// Bridge driver backed by libusb
pub struct UsbTransport {
    handle: DeviceHandle<GlobalContext>,
    ep_read: Endpoint,
    ep_write: Endpoint,
}

impl UsbTransport {
    /// Open the first bridge matching the default Lunatone ids
    pub fn open_default() -> Result<Self, TransportError> {
        Self::open(DALI_USB_VENDOR, DALI_USB_PRODUCT)
    }

    /// Open the first bridge matching `vendor`/`product`
    pub fn open(vendor: u16, product: u16) -> Result<Self, TransportError> {
        debug!("Looking for DALI interface {:04x}:{:04x}", vendor, product);

        let device = rusb::devices()?
            .iter()
            .find(|dev| {
                dev.device_descriptor()
                    .map(|desc| desc.vendor_id() == vendor && desc.product_id() == product)
                    .unwrap_or(false)
            })
            .ok_or(TransportError::DeviceNotFound)?;

        info!(
            "DALI interface found on bus {:03} address {:03}",
            device.bus_number(),
            device.address()
        );

        let mut handle = device.open()?;
        handle.reset()?;

        // Take the interface over from a bound kernel driver, where the
        // platform supports asking
        match handle.set_auto_detach_kernel_driver(true) {
            Ok(()) | Err(rusb::Error::NotSupported) => {}
            Err(e) => return Err(e.into()),
        }
        handle.claim_interface(INTERFACE)?;

        let config = device.active_config_descriptor()?;
        let mut ep_read = None;
        let mut ep_write = None;
        for interface in config.interfaces() {
            for descriptor in interface.descriptors() {
                for endpoint in descriptor.endpoint_descriptors() {
                    let found = Endpoint {
                        address: endpoint.address(),
                        transfer: endpoint.transfer_type(),
                        max_packet_size: endpoint.max_packet_size() as usize,
                    };
                    match endpoint.direction() {
                        Direction::In if ep_read.is_none() => ep_read = Some(found),
                        Direction::Out if ep_write.is_none() => ep_write = Some(found),
                        _ => {}
                    }
                }
            }
        }

        let (ep_read, ep_write) = match (ep_read, ep_write) {
            (Some(r), Some(w)) => (r, w),
            _ => return Err(TransportError::EndpointDiscovery),
        };

        debug!(
            "Endpoints: read 0x{:02X} ({:?}), write 0x{:02X} ({:?})",
            ep_read.address, ep_read.transfer, ep_write.address, ep_write.transfer
        );

        Ok(Self {
            handle,
            ep_read,
            ep_write,
        })
    }
}

fn map_usb_error(e: rusb::Error) -> TransportError {
    match e {
        rusb::Error::Timeout => TransportError::Timeout,
        rusb::Error::NoDevice => TransportError::Disconnected,
        other => TransportError::Usb(other),
    }
}

impl Transport for UsbTransport {
    fn read(&self, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        let mut buf = vec![0u8; self.ep_read.max_packet_size];
        let n = match self.ep_read.transfer {
            TransferType::Interrupt => {
                self.handle
                    .read_interrupt(self.ep_read.address, &mut buf, timeout)
            }
            _ => self.handle.read_bulk(self.ep_read.address, &mut buf, timeout),
        }
        .map_err(map_usb_error)?;
        buf.truncate(n);
        Ok(buf)
    }

    fn write(&self, data: &[u8]) -> Result<usize, TransportError> {
        let timeout = Duration::from_millis(1000);
        let n = match self.ep_write.transfer {
            TransferType::Interrupt => {
                self.handle
                    .write_interrupt(self.ep_write.address, data, timeout)
            }
            _ => self.handle.write_bulk(self.ep_write.address, data, timeout),
        }
        .map_err(map_usb_error)?;
        Ok(n)
    }
}

impl Drop for UsbTransport {
    fn drop(&mut self) {
        let _ = self.handle.release_interface(INTERFACE);
    }
}
