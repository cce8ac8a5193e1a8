//! Link layout taken from the firmware's linker script

use core::ptr::addr_of;

use memprot_core::LinkLayout;

extern "C" {
    static _iram_text_end: u8;
    static _rtc_text_end: u8;
    static _data_start: u8;
    static _rtc_dummy_end: u8;
    static _rtc_slow_reserved_size: u8;
}

/// Section boundaries of the running image.
///
/// `_rtc_slow_reserved_size` is an absolute symbol whose address is the
/// reserved byte count.
pub fn link_layout() -> LinkLayout {
    // SAFETY: only the addresses of the linker symbols are taken, never
    // their contents.
    unsafe {
        LinkLayout {
            iram_text_end: addr_of!(_iram_text_end) as u32,
            rtc_text_end: addr_of!(_rtc_text_end) as u32,
            dram_data_start: addr_of!(_data_start) as u32,
            rtc_dummy_end: addr_of!(_rtc_dummy_end) as u32,
            rtc_slow_reserved: addr_of!(_rtc_slow_reserved_size) as u32,
        }
    }
}
