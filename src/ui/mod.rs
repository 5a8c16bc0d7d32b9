pub mod ansi;
pub mod ascii;
pub mod display;
pub mod table_printer;
pub mod width_util;
