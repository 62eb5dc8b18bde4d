pub mod graph;
pub mod oauth;
pub mod traits;

pub use graph::{CreatedEvent, GraphClient, NewEvent, OrganizerProfile, ScheduleQuery};
pub use traits::CalendarBackend;

/// Thin wrapper around the OS keyring for credential storage.
pub mod keyring_store {
    const SERVICE: &str = "meetbook";

    pub fn get(key: &str) -> Result<Option<String>, keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn set(key: &str, value: &str) -> Result<(), keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        entry.set_password(value)
    }

    pub fn delete(key: &str) -> Result<(), keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
