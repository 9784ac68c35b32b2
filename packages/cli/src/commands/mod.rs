pub mod init;
pub mod tag;

pub use init::{init, InitArgs};
pub use tag::{tag, TagArgs};
