use crate::Pool;
use clearing_types::Error;
use core::ops::{Deref, DerefMut};

/// Exclusive scope over one pool.
///
/// Acquiring fails with `PoolLocked` while another scope on the same pool is
/// open. The scope is released when the guard drops, on success and on error
/// paths alike.
pub struct PoolGuard<'a, P: Pool + ?Sized> {
    pool: &'a mut P,
}

impl<'a, P: Pool + ?Sized> PoolGuard<'a, P> {
    pub fn acquire(pool: &'a mut P) -> Result<Self, Error> {
        pool.lock()?;
        Ok(Self { pool })
    }
}

impl<P: Pool + ?Sized> Deref for PoolGuard<'_, P> {
    type Target = P;

    fn deref(&self) -> &P {
        self.pool
    }
}

impl<P: Pool + ?Sized> DerefMut for PoolGuard<'_, P> {
    fn deref_mut(&mut self) -> &mut P {
        self.pool
    }
}

impl<P: Pool + ?Sized> Drop for PoolGuard<'_, P> {
    fn drop(&mut self) {
        self.pool.unlock();
    }
}
