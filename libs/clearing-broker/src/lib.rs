#![no_std]

mod broker;
mod events;
pub mod fee_growth;
mod lock;
mod pool;
pub mod tick_bitmap;

#[cfg(any(test, feature = "testutils"))]
pub mod testutils;

pub use broker::*;
pub use lock::PoolGuard;
pub use pool::*;
