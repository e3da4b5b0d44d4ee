pub mod check;
pub mod convert;
pub mod init;
pub mod inspect;

pub use check::{check, CheckArgs};
pub use convert::{convert, ConvertArgs};
pub use init::{init, InitArgs};
pub use inspect::{inspect, InspectArgs};
