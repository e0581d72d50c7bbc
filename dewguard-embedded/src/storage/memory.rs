use alloc::vec::Vec;

use super::ConfigStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Option<Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self { data: None }
    }
}

impl ConfigStore for MemoryStore {
    type Error = ();

    fn read(&mut self) -> Result<Option<Vec<u8>>, Self::Error> {
        Ok(self.data.clone())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.data = Some(data.to_vec());
        Ok(())
    }
}
