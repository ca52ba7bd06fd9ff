// ezsign/src/transport/rcs380/mod.rs

//! RC-S380 (NFC Port-100) transport: raw USB bulk I/O, the framed command
//! protocol, ISO 14443-3 Type A activation, and ISO-DEP block exchange.

pub mod frame;
pub mod iso_dep;
mod usb;

use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::constants::{PORT100_ACK, PORT100_CMD_PREFIX_HOST};
use crate::protocol::Apdu;
use crate::transport::traits::NfcTransport;
use crate::utils::bytes_to_hex;
use crate::{Error, Result};

use frame::Scan;
use iso_dep::{IsoDepLink, RfExchange};
use usb::UsbBus;

// Port-100 command codes
const CMD_IN_SET_RF: u8 = 0x00;
const CMD_IN_SET_PROTOCOL: u8 = 0x02;
const CMD_IN_COMM_RF: u8 = 0x04;
const CMD_SWITCH_RF: u8 = 0x06;
const CMD_GET_FIRMWARE_VERSION: u8 = 0x20;
const CMD_SET_COMMAND_TYPE: u8 = 0x2A;

const COMMAND_DEADLINE: Duration = Duration::from_secs(5);
const READ_SLICE: Duration = Duration::from_millis(500);
const DRAIN_TIMEOUT: Duration = Duration::from_millis(100);

const CARD_SEARCH_ATTEMPTS: u32 = 100;
const CARD_SEARCH_BACKOFF: Duration = Duration::from_millis(200);
const ACTIVATION_TIMEOUT_MS: u64 = 30;

// InSetProtocol defaults for a 106 kbps Type A initiator, as parameter
// number / value pairs.
#[rustfmt::skip]
const PROTOCOL_DEFAULTS: [u8; 38] = [
    0x00, 0x18, 0x01, 0x01, 0x02, 0x01, 0x03, 0x00,
    0x04, 0x00, 0x05, 0x00, 0x06, 0x00, 0x07, 0x08,
    0x08, 0x00, 0x09, 0x00, 0x0A, 0x00, 0x0B, 0x00,
    0x0C, 0x00, 0x0E, 0x04, 0x0F, 0x00, 0x10, 0x00,
    0x11, 0x00, 0x12, 0x00, 0x13, 0x06,
];

/// Command layer over one claimed USB connection.
struct Port100 {
    bus: UsbBus,
}

impl Port100 {
    /// Send one framed command and collect its response body, tolerating
    /// stale bytes and ACKs in the inbound stream.
    fn send_command(&mut self, cmd_code: u8, cmd_data: &[u8]) -> Result<Vec<u8>> {
        let mut payload = Vec::with_capacity(2 + cmd_data.len());
        payload.push(PORT100_CMD_PREFIX_HOST);
        payload.push(cmd_code);
        payload.extend_from_slice(cmd_data);
        self.bus.write(&frame::build_frame(&payload))?;

        let mut buffer: Vec<u8> = Vec::new();
        let deadline = Instant::now() + COMMAND_DEADLINE;
        while Instant::now() < deadline {
            match self.bus.read(READ_SLICE) {
                Ok(chunk) => buffer.extend_from_slice(&chunk),
                // Keep waiting until the aggregate deadline
                Err(Error::Timeout) => {}
                Err(e) => return Err(e),
            }
            if let Scan::Response(body) = frame::extract_response(&mut buffer, cmd_code)? {
                return Ok(body);
            }
        }
        Err(Error::Timeout)
    }

    fn set_command_type(&mut self, command_type: u8) -> Result<()> {
        let data = self.send_command(CMD_SET_COMMAND_TYPE, &[command_type])?;
        check_status("SetCommandType", &data)
    }

    fn firmware_version(&mut self) -> Result<(u8, u8)> {
        let data = self.send_command(CMD_GET_FIRMWARE_VERSION, &[])?;
        if data.len() < 2 {
            return Err(Error::InvalidLength {
                expected: 2,
                actual: data.len(),
            });
        }
        // Wire order is minor, major
        Ok((data[1], data[0]))
    }

    fn switch_rf(&mut self, on: bool) -> Result<()> {
        let data = self.send_command(CMD_SWITCH_RF, &[on as u8])?;
        check_status("SwitchRF", &data)
    }

    fn in_set_rf(&mut self, settings: &[u8]) -> Result<()> {
        let data = self.send_command(CMD_IN_SET_RF, settings)?;
        check_status("InSetRF", &data)
    }

    fn in_set_protocol(&mut self, pairs: &[u8]) -> Result<()> {
        if pairs.is_empty() {
            return Ok(());
        }
        let data = self.send_command(CMD_IN_SET_PROTOCOL, pairs)?;
        check_status("InSetProtocol", &data)
    }

    /// Exchange raw bytes with the card in the field. The leading 32-bit
    /// error word of the response must be zero; card bytes start at
    /// offset 5.
    fn in_comm_rf(&mut self, data: &[u8], timeout_ms: u64) -> Result<Vec<u8>> {
        // The command timeout travels in units of 1/10 ms
        let timeout = ((timeout_ms + 1) * 10).min(0xFFFF) as u16;
        let mut cmd = Vec::with_capacity(2 + data.len());
        cmd.extend_from_slice(&timeout.to_le_bytes());
        cmd.extend_from_slice(data);

        let result = self.send_command(CMD_IN_COMM_RF, &cmd)?;
        if result.len() >= 4 {
            let status = u32::from_le_bytes([result[0], result[1], result[2], result[3]]);
            if status != 0 {
                return Err(Error::CommRf(status));
            }
        }
        if result.len() > 5 {
            Ok(result[5..].to_vec())
        } else {
            Ok(Vec::new())
        }
    }

    /// Run the ISO 14443-3 Type A activation sequence once.
    ///
    /// `Ok(false)` means no (usable) target answered and the caller may
    /// retry; errors are protocol violations from a present card.
    fn activate_card(&mut self) -> Result<bool> {
        // 106 kbps Type A, initiator side
        self.in_set_rf(&[0x02, 0x03, 0x0F, 0x03])?;
        self.in_set_protocol(&PROTOCOL_DEFAULTS)?;
        self.in_set_protocol(&[0x00, 0x06, 0x01, 0x00, 0x02, 0x00, 0x05, 0x01, 0x07, 0x07])?;

        // REQA
        let sens_res = match self.in_comm_rf(&[0x26], ACTIVATION_TIMEOUT_MS) {
            Ok(r) => r,
            Err(Error::CommRf(_)) | Err(Error::Timeout) => return Ok(false),
            Err(e) => return Err(e),
        };
        if sens_res.len() != 2 {
            return Ok(false);
        }
        debug!("SENS_RES {}", bytes_to_hex(&sens_res));

        self.in_set_protocol(&[0x07, 0x08, 0x04, 0x01])?;

        // Cascade anticollision until the UID is complete
        let mut sak = 0u8;
        for sel_cmd in [0x93u8, 0x95, 0x97] {
            self.in_set_protocol(&[0x01, 0x00, 0x02, 0x00])?;
            let sdd_res = match self.in_comm_rf(&[sel_cmd, 0x20], ACTIVATION_TIMEOUT_MS) {
                Ok(r) => r,
                Err(Error::CommRf(_)) | Err(Error::Timeout) => return Ok(false),
                Err(e) => return Err(e),
            };
            if sdd_res.len() < 5 {
                return Ok(false);
            }

            self.in_set_protocol(&[0x01, 0x01, 0x02, 0x01])?;
            let mut sel_req = vec![sel_cmd, 0x70];
            sel_req.extend_from_slice(&sdd_res);
            let sel_res = match self.in_comm_rf(&sel_req, ACTIVATION_TIMEOUT_MS) {
                Ok(r) => r,
                Err(Error::CommRf(_)) | Err(Error::Timeout) => return Ok(false),
                Err(e) => return Err(e),
            };
            if sel_res.is_empty() {
                return Ok(false);
            }
            sak = sel_res[0];
            if sak & 0x04 == 0 {
                break;
            }
        }

        if sak & 0x20 == 0 {
            return Err(Error::Activation(
                "card does not support ISO 14443-4".into(),
            ));
        }

        // RATS with FSD=256, CID=0
        let ats = self.in_comm_rf(&[0xE0, 0x80], ACTIVATION_TIMEOUT_MS)?;
        if ats.is_empty() {
            return Err(Error::Activation("RATS failed".into()));
        }
        debug!("ATS {}", bytes_to_hex(&ats));
        if ats.len() >= 2 {
            const FSC: [u16; 9] = [16, 24, 32, 40, 48, 64, 96, 128, 256];
            let fsci = (ats[1] & 0x0F) as usize;
            if let Some(fsc) = FSC.get(fsci) {
                debug!("card FSC {} bytes (FSCI={})", fsc, fsci);
            }
        }

        Ok(true)
    }
}

impl RfExchange for Port100 {
    fn exchange(&mut self, data: &[u8], timeout_ms: u64) -> Result<Vec<u8>> {
        self.in_comm_rf(data, timeout_ms)
    }
}

fn check_status(name: &'static str, data: &[u8]) -> Result<()> {
    match data.first() {
        Some(&status) if status != 0 => Err(Error::CommandFailed { name, status }),
        _ => Ok(()),
    }
}

/// RC-S380 transport over raw USB.
#[derive(Default)]
pub struct Rcs380Transport {
    port: Option<Port100>,
    link: IsoDepLink,
}

impl Rcs380Transport {
    /// Transport with no USB connection yet; `open` claims the reader.
    pub fn new() -> Self {
        Self::default()
    }
}

impl NfcTransport for Rcs380Transport {
    fn open(&mut self) -> Result<()> {
        let mut port = Port100 {
            bus: UsbBus::open()?,
        };

        // An ACK aborts whatever the reader was doing; short reads then
        // drain stale frames left from a previous run.
        port.bus.write(&PORT100_ACK)?;
        loop {
            match port.bus.read(DRAIN_TIMEOUT) {
                Ok(_) => continue,
                Err(Error::Timeout) => break,
                Err(e) => return Err(e),
            }
        }

        port.set_command_type(1)?;
        let (major, minor) = port.firmware_version()?;
        info!("RC-S380 firmware v{}.{:02}", major, minor);
        port.switch_rf(false)?;

        info!("waiting for card...");
        for attempt in 0..CARD_SEARCH_ATTEMPTS {
            port.switch_rf(true)?;
            match port.activate_card() {
                Ok(true) => {
                    self.link.reset();
                    self.port = Some(port);
                    return Ok(());
                }
                Ok(false) => {}
                Err(e) => debug!("activation attempt {} failed: {}", attempt + 1, e),
            }
            port.switch_rf(false)?;
            thread::sleep(CARD_SEARCH_BACKOFF);
        }

        Err(Error::NoCard)
    }

    fn close(&mut self) {
        if let Some(mut port) = self.port.take() {
            let _ = port.switch_rf(false);
            port.bus.close();
        }
    }

    fn send_apdu(&mut self, apdu: &Apdu) -> Result<Vec<u8>> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        self.link.exchange_apdu(port, apdu)
    }
}

impl Drop for Rcs380Transport {
    fn drop(&mut self) {
        self.close();
    }
}
