
#[cfg(feature = "derive")]
mod parse_good;
