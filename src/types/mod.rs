//! Core types used across the kit.

mod amount;
mod flow;
mod grant;
mod resource;
mod wallet;

pub use amount::*;
pub use flow::*;
pub use grant::*;
pub use resource::*;
pub use wallet::*;
