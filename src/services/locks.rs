// src/services/locks.rs

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Um mutex por conta: cada operação do funil faz leitura-decisão-escrita de
/// conta + lead inteira dentro dele.
#[derive(Clone, Default)]
pub struct AccountLocks {
    slots: Arc<Mutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, account_id: Uuid) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().await;
            // Descarta mutexes que ninguém mais segura
            slots.retain(|id, slot| *id == account_id || Arc::strong_count(slot) > 1);
            slots.entry(account_id).or_default().clone()
        };
        slot.lock_owned().await
    }
}
