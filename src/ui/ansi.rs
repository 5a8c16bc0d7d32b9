// Terminal styling used by tables and prompts.

pub const STYLE_RESET: &str = crate::csi!("0m");
pub const STYLE_BOLD: &str = crate::csi!("1m");
/// Secondary text such as item descriptions.
pub const FG_LIGHT_GRAY: &str = crate::csi!("37m");
