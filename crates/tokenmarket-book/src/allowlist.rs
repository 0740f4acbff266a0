//! Registry of settlement tokens accepted as payment.

use std::collections::BTreeSet;

use tokenmarket_types::Address;

/// Set of allowlisted stable tokens.
///
/// Authorization is the caller's job; the registry only keeps set semantics.
#[derive(Debug, Clone, Default)]
pub struct AllowlistRegistry {
    tokens: BTreeSet<Address>,
}

impl AllowlistRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or remove `token`. Returns `false` when membership already matched.
    pub fn set_allowed(&mut self, token: Address, allowed: bool) -> bool {
        if allowed {
            self.tokens.insert(token)
        } else {
            self.tokens.remove(&token)
        }
    }

    #[must_use]
    pub fn is_allowed(&self, token: &Address) -> bool {
        self.tokens.contains(token)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.tokens.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl FromIterator<Address> for AllowlistRegistry {
    fn from_iter<I: IntoIterator<Item = Address>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}
