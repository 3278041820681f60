//! Persisted wallet session.
//!
//! Only the connected address is stored; signing material never touches
//! disk through this layer.

use citysecrets_shared::constants::SESSION_ADDRESS_KEY;
use citysecrets_shared::Address;

use crate::database::Database;
use crate::error::{Result, StoreError};

impl Database {
    pub fn save_session_address(&self, address: Address) -> Result<()> {
        self.set_item(SESSION_ADDRESS_KEY, &address.to_checksum(None))
    }

    /// The address persisted by the last successful connect, if any.
    pub fn load_session_address(&self) -> Result<Option<Address>> {
        self.get_item(SESSION_ADDRESS_KEY)?
            .map(|raw| {
                raw.parse::<Address>()
                    .map_err(|_| StoreError::InvalidAddress(raw))
            })
            .transpose()
    }

    pub fn clear_session_address(&self) -> Result<()> {
        self.remove_item(SESSION_ADDRESS_KEY)?;
        Ok(())
    }
}
