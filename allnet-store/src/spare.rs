//! Spare key pool: `~/.allnet/own_spare_keys/<ts>`, a flat directory of
//! unassigned, freshly generated RSA private keys consumed by
//! `create_contact` (spec §4.7; `keys.c`'s spare-key consumption rule).

use std::fs;
use std::path::{Path, PathBuf};

use rand::{CryptoRng, RngCore};
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;

use crate::error::StoreError;
use crate::pem;

pub struct SparePool {
    dir: PathBuf,
}

impl SparePool {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Generates a fresh key of `bits` size and deposits it in the pool,
    /// timestamp-named like a keyset directory.
    pub fn generate<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        bits: usize,
        timestamp: u64,
    ) -> Result<(), StoreError> {
        let key = RsaPrivateKey::new(rng, bits).map_err(|_| StoreError::MalformedKey)?;
        let pem = pem::write_private_key(&key)?;
        fs::write(self.dir.join(timestamp.to_string()), pem)?;
        Ok(())
    }

    /// Consumes the first spare key found whose modulus size (in bits)
    /// matches `bits` exactly, removing it from the pool and returning it.
    /// `create_contact` falls back to generating a fresh key when this
    /// returns `None` (`keys.c`: consume-by-size-then-generate).
    pub fn take(&self, bits: usize) -> Result<Option<RsaPrivateKey>, StoreError> {
        let mut entries: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .collect();
        entries.sort();

        for path in entries {
            if let Some(key) = self.try_take_at(&path, bits)? {
                return Ok(Some(key));
            }
        }
        Ok(None)
    }

    fn try_take_at(&self, path: &Path, bits: usize) -> Result<Option<RsaPrivateKey>, StoreError> {
        let text = fs::read_to_string(path)?;
        let key = match pem::read_private_key(&text) {
            Ok(key) => key,
            Err(_) => return Ok(None),
        };
        if key.size() * 8 != bits {
            return Ok(None);
        }
        fs::remove_file(path)?;
        Ok(Some(key))
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(fs::read_dir(&self.dir)?.count())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn generate_then_take_round_trips_by_size() {
        let dir = tempfile::tempdir().unwrap();
        let pool = SparePool::open(dir.path()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        pool.generate(&mut rng, 1024, 100).unwrap();

        assert_eq!(pool.len().unwrap(), 1);
        let taken = pool.take(1024).unwrap();
        assert!(taken.is_some());
        assert!(pool.is_empty().unwrap());
    }

    #[test]
    fn take_skips_wrong_size() {
        let dir = tempfile::tempdir().unwrap();
        let pool = SparePool::open(dir.path()).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        pool.generate(&mut rng, 1024, 200).unwrap();

        assert!(pool.take(2048).unwrap().is_none());
        assert_eq!(pool.len().unwrap(), 1);
    }

    #[test]
    fn take_on_empty_pool_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let pool = SparePool::open(dir.path()).unwrap();
        assert!(pool.take(1024).unwrap().is_none());
    }
}
