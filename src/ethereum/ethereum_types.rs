pub mod bytes;
pub mod numeric;
