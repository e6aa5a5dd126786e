//! Broadcast-key directories (spec §3/§4.7/§6): `~/.allnet/own_bc_keys/
//! <ahra>` holds a keypair we generated and publish under that AHRA;
//! `~/.allnet/other_bc_keys/<ahra>` caches a peer's broadcast public key
//! once we've verified it binds to the claimed AHRA.

use std::fs;
use std::path::PathBuf;

use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::ahra::{verify_bc_key, Ahra};
use crate::error::StoreError;
use crate::pem;

pub struct BcKeyStore {
    own_dir: PathBuf,
    other_dir: PathBuf,
}

impl BcKeyStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        let own_dir = root.join("own_bc_keys");
        let other_dir = root.join("other_bc_keys");
        fs::create_dir_all(&own_dir)?;
        fs::create_dir_all(&other_dir)?;
        Ok(Self { own_dir, other_dir })
    }

    /// Publishes our own broadcast keypair under its AHRA's formatted text.
    pub fn save_own(&self, ahra: &Ahra, key: &RsaPrivateKey) -> Result<(), StoreError> {
        fs::write(self.own_dir.join(ahra.format()), pem::write_private_key(key)?)?;
        Ok(())
    }

    pub fn load_own(&self, ahra_text: &str) -> Result<RsaPrivateKey, StoreError> {
        pem::read_private_key(&fs::read_to_string(self.own_dir.join(ahra_text))?)
    }

    /// Every AHRA we currently publish a broadcast keypair for.
    pub fn own_ahras(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.own_dir)? {
            if let Ok(name) = entry?.file_name().into_string() {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn save_other(&self, ahra_text: &str, key: &RsaPublicKey) -> Result<(), StoreError> {
        fs::write(self.other_dir.join(ahra_text), pem::write_public_key(key)?)?;
        Ok(())
    }

    pub fn load_other(&self, ahra_text: &str) -> Result<RsaPublicKey, StoreError> {
        pem::read_public_key(&fs::read_to_string(self.other_dir.join(ahra_text))?)
    }

    /// `verify_bc_key(ahra, key_bytes, default_lang, default_bits, save?)`
    /// (spec §4.7): fills in a missing language or bitstring-width tag in
    /// `ahra_text` with the caller's defaults, re-derives the position
    /// list against `pubkey` and checks every position matches, and
    /// caches the key under `other_bc_keys/` when `save` is set and the
    /// key verified.
    pub fn verify_and_maybe_save(
        &self,
        ahra_text: &str,
        pubkey: &RsaPublicKey,
        default_lang: &str,
        default_bits: usize,
        save: bool,
    ) -> Result<bool, StoreError> {
        let mut ahra = Ahra::parse(ahra_text)?;
        if ahra.lang.is_none() {
            ahra.lang = Some(default_lang.to_string());
        }
        if ahra.bitstring_bits.is_none() {
            ahra.bitstring_bits = Some(default_bits);
        }
        let ok = verify_bc_key(&ahra, pubkey);
        if ok && save {
            self.save_other(ahra_text, pubkey)?;
        }
        Ok(ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ahra::generate_key;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn own_key_round_trips_by_ahra() {
        let dir = tempfile::tempdir().unwrap();
        let store = BcKeyStore::open(dir.path()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let (priv_key, ahra) = generate_key(&mut rng, 1024, "hello world", "en", 8, 2);

        store.save_own(&ahra, &priv_key).unwrap();
        assert_eq!(store.own_ahras().unwrap(), vec![ahra.format()]);
        let loaded = store.load_own(&ahra.format()).unwrap();
        assert_eq!(loaded.to_public_key_der_bytes(), priv_key.to_public_key_der_bytes());
    }

    #[test]
    fn verify_and_save_caches_a_valid_key_and_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = BcKeyStore::open(dir.path()).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let (priv_key, ahra) = generate_key(&mut rng, 1024, "hello world", "en", 8, 2);
        let pub_key = RsaPublicKey::from(&priv_key);
        let bare = ahra.canonical().format();

        let ok = store
            .verify_and_maybe_save(&bare, &pub_key, "en", 8, true)
            .unwrap();
        assert!(ok);
        assert!(store.load_other(&bare).is_ok());
    }

    #[test]
    fn verify_without_save_does_not_cache() {
        let dir = tempfile::tempdir().unwrap();
        let store = BcKeyStore::open(dir.path()).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let (priv_key, ahra) = generate_key(&mut rng, 1024, "hi", "en", 8, 2);
        let pub_key = RsaPublicKey::from(&priv_key);

        let ok = store
            .verify_and_maybe_save(&ahra.format(), &pub_key, "en", 8, false)
            .unwrap();
        assert!(ok);
        assert!(store.load_other(&ahra.format()).is_err());
    }

    #[test]
    fn wrong_key_fails_verification() {
        let dir = tempfile::tempdir().unwrap();
        let store = BcKeyStore::open(dir.path()).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        let (_priv_key, ahra) = generate_key(&mut rng, 1024, "hi there", "en", 8, 2);
        let other_priv = rsa::RsaPrivateKey::new(&mut rng, 1024).unwrap();
        let other_pub = RsaPublicKey::from(&other_priv);

        let ok = store
            .verify_and_maybe_save(&ahra.format(), &other_pub, "en", 8, true)
            .unwrap();
        assert!(!ok);
    }

    trait PublicDer {
        fn to_public_key_der_bytes(&self) -> Vec<u8>;
    }
    impl PublicDer for RsaPrivateKey {
        fn to_public_key_der_bytes(&self) -> Vec<u8> {
            use pkcs8::EncodePublicKey;
            RsaPublicKey::from(self)
                .to_public_key_der()
                .unwrap()
                .as_bytes()
                .to_vec()
        }
    }
}
