pub mod hexadecimal;
pub mod numeric;
