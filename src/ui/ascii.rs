/// ESC as a byte; starts every terminal control sequence.
pub const ESC_BYTE: u8 = 0x1B;

/// Builds a Control Sequence Introducer string at compile time.
#[macro_export]
macro_rules! csi {
    ($suffix:literal) => {
        concat!("\x1B[", $suffix)
    };
}
