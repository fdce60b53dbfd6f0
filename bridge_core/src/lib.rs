pub mod dumps;
pub mod entities;
pub mod error;
pub mod logging;
pub mod props;
pub mod scripting;
pub mod storage;

#[cfg(test)]
pub mod testing;
