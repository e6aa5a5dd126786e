//! Contact/keyset directory: `~/.allnet/contacts/<ts>/{name, my_key,
//! contact_pubkey?, local?, remote?}` (spec §4.7/§6). A contact may have
//! several keysets over time; each keyset id here is the directory's
//! timestamp name.

use std::fs;
use std::path::PathBuf;

use allnet_proto::Address;
use rand::{CryptoRng, RngCore};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::address_file;
use crate::error::StoreError;
use crate::pem;
use crate::spare::SparePool;

/// Identifies one keyset directory by its timestamp name.
pub type KeysetId = u64;

pub struct Keyset {
    pub name: String,
    pub my_key: RsaPrivateKey,
    pub contact_pubkey: Option<RsaPublicKey>,
    pub local: Option<Address>,
    pub remote: Option<Address>,
}

/// An explicit handle onto the on-disk contact/keyset directory, per
/// spec §9's redesign note ("explicit `ContactStore` handle threaded
/// through callers" in place of a lazily-initialized global table).
pub struct ContactStore {
    contacts_dir: PathBuf,
    spares: SparePool,
}

impl ContactStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        let contacts_dir = root.join("contacts");
        fs::create_dir_all(&contacts_dir)?;
        let spares = SparePool::open(root.join("own_spare_keys"))?;
        Ok(Self {
            contacts_dir,
            spares,
        })
    }

    /// Every distinct contact display name that has at least one keyset.
    pub fn all_contacts(&self) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = self
            .all_keysets()?
            .into_iter()
            .map(|(_, ks)| ks.name)
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    pub fn num_contacts(&self) -> Result<usize, StoreError> {
        Ok(self.all_contacts()?.len())
    }

    /// Every keyset on disk, skipping any directory that fails to parse
    /// (`StoreCorruption`: skip that keyset, continue — spec §7).
    pub fn all_keysets(&self) -> Result<Vec<(KeysetId, Keyset)>, StoreError> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.contacts_dir)? {
            let entry = entry?;
            let path = entry.path();
            let id: KeysetId = match path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.parse().ok())
            {
                Some(id) => id,
                None => continue,
            };
            if let Ok(ks) = self.read_keyset(&path) {
                out.push((id, ks));
            }
        }
        out.sort_by_key(|(id, _)| *id);
        Ok(out)
    }

    /// All keysets belonging to `contact`.
    pub fn all_keys(&self, contact: &str) -> Result<Vec<(KeysetId, Keyset)>, StoreError> {
        Ok(self
            .all_keysets()?
            .into_iter()
            .filter(|(_, ks)| ks.name == contact)
            .collect())
    }

    fn read_keyset(&self, dir: &std::path::Path) -> Result<Keyset, StoreError> {
        let name = fs::read_to_string(dir.join("name"))?.trim().to_string();
        let my_key = pem::read_private_key(&fs::read_to_string(dir.join("my_key"))?)?;
        let contact_pubkey = match fs::read_to_string(dir.join("contact_pubkey")) {
            Ok(text) => Some(pem::read_public_key(&text)?),
            Err(_) => None,
        };
        let local = match fs::read_to_string(dir.join("local")) {
            Ok(text) => Some(address_file::parse_address(&text)?),
            Err(_) => None,
        };
        let remote = match fs::read_to_string(dir.join("remote")) {
            Ok(text) => Some(address_file::parse_address(&text)?),
            Err(_) => None,
        };
        Ok(Keyset {
            name,
            my_key,
            contact_pubkey,
            local,
            remote,
        })
    }

    /// Creates (or fills in) a keyset for `name`. Refuses if a contact by
    /// that name already has a public key on some keyset; if a keyset
    /// exists without one, fills it in instead of creating a new
    /// directory (spec §4.7). Uses a spare key of `bits` size if the pool
    /// has one, otherwise generates a fresh one.
    pub fn create_contact<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        name: &str,
        bits: usize,
        pubkey: Option<RsaPublicKey>,
        local: Option<Address>,
        remote: Option<Address>,
        timestamp: u64,
    ) -> Result<KeysetId, StoreError> {
        let existing = self.all_keys(name)?;
        if existing.iter().any(|(_, ks)| ks.contact_pubkey.is_some()) {
            return Err(StoreError::ContactAlreadyHasKey(name.to_string()));
        }
        if let Some((id, _)) = existing.into_iter().find(|(_, ks)| ks.contact_pubkey.is_none()) {
            if let Some(pubkey) = &pubkey {
                let dir = self.contacts_dir.join(id.to_string());
                fs::write(dir.join("contact_pubkey"), pem::write_public_key(pubkey)?)?;
            }
            return Ok(id);
        }

        let my_key = match self.spares.take(bits)? {
            Some(key) => key,
            None => RsaPrivateKey::new(rng, bits).map_err(|_| StoreError::MalformedKey)?,
        };

        let dir = self.contacts_dir.join(timestamp.to_string());
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("name"), name)?;
        fs::write(dir.join("my_key"), pem::write_private_key(&my_key)?)?;
        if let Some(pubkey) = &pubkey {
            fs::write(dir.join("contact_pubkey"), pem::write_public_key(pubkey)?)?;
        }
        if let Some(local) = &local {
            fs::write(dir.join("local"), address_file::format_address(local))?;
        }
        if let Some(remote) = &remote {
            fs::write(dir.join("remote"), address_file::format_address(remote))?;
        }
        Ok(timestamp)
    }

    pub fn get_my_privkey(&self, ks: KeysetId) -> Result<RsaPrivateKey, StoreError> {
        let dir = self.contacts_dir.join(ks.to_string());
        pem::read_private_key(&fs::read_to_string(dir.join("my_key"))?)
    }

    pub fn get_contact_pubkey(&self, ks: KeysetId) -> Result<Option<RsaPublicKey>, StoreError> {
        let dir = self.contacts_dir.join(ks.to_string());
        match fs::read_to_string(dir.join("contact_pubkey")) {
            Ok(text) => Ok(Some(pem::read_public_key(&text)?)),
            Err(_) => Ok(None),
        }
    }

    pub fn get_local(&self, ks: KeysetId) -> Result<Option<Address>, StoreError> {
        let dir = self.contacts_dir.join(ks.to_string());
        match fs::read_to_string(dir.join("local")) {
            Ok(text) => Ok(Some(address_file::parse_address(&text)?)),
            Err(_) => Ok(None),
        }
    }

    pub fn get_remote(&self, ks: KeysetId) -> Result<Option<Address>, StoreError> {
        let dir = self.contacts_dir.join(ks.to_string());
        match fs::read_to_string(dir.join("remote")) {
            Ok(text) => Ok(Some(address_file::parse_address(&text)?)),
            Err(_) => Ok(None),
        }
    }
}
