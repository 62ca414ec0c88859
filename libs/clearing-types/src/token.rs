use crate::Error;
use soroban_sdk::Address;

/// Mapping between the logical base/quote roles and a pool's token0/token1.
///
/// Pools order their pair by address, so which role lands on token0 is fixed
/// by the pair itself and never changes for a given pool.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenRoles {
    pub base: Address,
    pub quote: Address,
    /// True if the base token sorts first and is the pool's token0
    pub is_base_token0: bool,
}

impl TokenRoles {
    pub fn new(base: Address, quote: Address) -> Result<Self, Error> {
        if base == quote {
            return Err(Error::InvalidTokenOrder);
        }
        let is_base_token0 = base < quote;
        Ok(Self {
            base,
            quote,
            is_base_token0,
        })
    }

    /// Resolve roles for a pool given the caller's base token
    pub fn for_pool(base: &Address, token0: &Address, token1: &Address) -> Result<Self, Error> {
        if base == token0 {
            Self::new(token0.clone(), token1.clone())
        } else if base == token1 {
            Self::new(token1.clone(), token0.clone())
        } else {
            Err(Error::TokenNotInPool)
        }
    }

    pub fn token0(&self) -> &Address {
        if self.is_base_token0 {
            &self.base
        } else {
            &self.quote
        }
    }

    pub fn token1(&self) -> &Address {
        if self.is_base_token0 {
            &self.quote
        } else {
            &self.base
        }
    }

    /// Reorder pool amounts (token0, token1) into (base, quote)
    pub fn to_base_quote<T>(&self, amount0: T, amount1: T) -> (T, T) {
        if self.is_base_token0 {
            (amount0, amount1)
        } else {
            (amount1, amount0)
        }
    }

    /// Reorder (base, quote) amounts into pool order (token0, token1)
    pub fn to_token_amounts<T>(&self, base: T, quote: T) -> (T, T) {
        // The permutation is its own inverse
        self.to_base_quote(base, quote)
    }

    /// Pool swap direction for a base/quote direction
    pub fn zero_for_one(&self, is_base_to_quote: bool) -> bool {
        is_base_to_quote == self.is_base_token0
    }
}
