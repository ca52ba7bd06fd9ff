use std::time::Duration;

use ezsign::session::EzSignCard;

#[test]
#[ignore = "requires RC-S380 hardware and a tag on the antenna"]
fn connect_and_read_descriptor() {
    let session = EzSignCard::new().connect().expect("connect");
    let info = session.device_info();
    println!(
        "card {} {}x{} {} colors",
        info.serial_number,
        info.width,
        info.height,
        info.num_colors()
    );
    assert!(info.width > 0 && info.height > 0);
    assert!(matches!(info.bits_per_pixel, 1 | 2));
}

#[test]
#[ignore = "requires RC-S380 hardware and a tag on the antenna; rewrites the panel"]
fn clear_and_refresh() {
    let mut session = EzSignCard::new().connect().expect("connect");
    session.clear().expect("upload");
    session
        .refresh(Duration::from_secs(30), Duration::from_millis(500))
        .expect("refresh");
}
