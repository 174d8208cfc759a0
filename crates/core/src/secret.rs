// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Secrets behind lease and request tokens
//!
//! A secret is the whole capability: any caller presenting it can release,
//! refresh or promote the row it owns. Secrets never contain `.`, which
//! separates secret and slot in a rendered [`LeaseToken`](crate::LeaseToken).

use crate::lease::RequestToken;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Mints the secrets a semaphore writes into the store
pub trait SecretGen: Clone + Send + Sync + 'static {
    /// Secret shared by every slot one acquire attempt tries
    fn lease_secret(&self) -> String;

    /// Write request whose secret also owns the promoted exclusive lease
    fn request_token(&self) -> RequestToken;
}

/// 128 random bits, hex encoded
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomSecrets;

impl SecretGen for RandomSecrets {
    fn lease_secret(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    fn request_token(&self) -> RequestToken {
        RequestToken::new(format!("w{}", uuid::Uuid::new_v4().simple()))
    }
}

/// Readable, guessable secrets for tests: `<holder>/l<n>` and `<holder>/w<n>`
///
/// Clones share one counter, so two semaphores built from the same source
/// never collide.
#[derive(Clone, Debug)]
pub struct SequentialSecrets {
    holder: String,
    issued: Arc<AtomicU64>,
}

impl SequentialSecrets {
    pub fn new(holder: impl Into<String>) -> Self {
        Self {
            holder: holder.into().replace('.', "_"),
            issued: Arc::new(AtomicU64::new(0)),
        }
    }

    fn mint(&self, tag: char) -> String {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}/{}{}", self.holder, tag, n)
    }
}

impl SecretGen for SequentialSecrets {
    fn lease_secret(&self) -> String {
        self.mint('l')
    }

    fn request_token(&self) -> RequestToken {
        RequestToken::new(self.mint('w'))
    }
}

#[cfg(test)]
#[path = "secret_tests.rs"]
mod tests;
