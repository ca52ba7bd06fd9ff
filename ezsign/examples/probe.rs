//! Probe example: find a reader, activate a tag, and print its descriptor.
//!
//! Usage:
//!   cargo run --example probe

use ezsign::session::EzSignCard;
use ezsign::utils::bytes_to_hex;
use ezsign::{Error, Result};

fn main() -> Result<()> {
    env_logger::init();

    match EzSignCard::new().connect() {
        Ok(session) => {
            let info = session.device_info();
            println!("Serial:     {}", info.serial_number);
            println!("Screen:     {}x{}", info.width, info.height);
            println!("Colors:     {}", info.num_colors());
            println!("Rotated:    {}", info.rotated());
            println!("FB size:    {} bytes in {} blocks", info.fb_total_bytes(), info.num_blocks());
            if !info.c1.is_empty() {
                println!("C1:         {}", bytes_to_hex(&info.c1));
            }
            println!("Descriptor: {}", bytes_to_hex(&info.raw));
            Ok(())
        }
        Err(Error::DeviceNotFound) => {
            println!("No RC-S380 found on the USB bus");
            Ok(())
        }
        Err(e) => Err(e),
    }
}
