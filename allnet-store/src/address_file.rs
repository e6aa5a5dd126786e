//! Codec for the `local`/`remote` address files in a keyset directory
//! (spec §6): `"<nbits> <hex_byte>[:<hex_byte>]*\n"`.

use allnet_proto::Address;

use crate::error::StoreError;

pub fn format_address(addr: &Address) -> String {
    let bytes = addr.bytes();
    let nbytes = (addr.nbits() as usize).div_ceil(8).max(1);
    let hex: Vec<String> = bytes[..nbytes].iter().map(|b| format!("{:02x}", b)).collect();
    format!("{} {}\n", addr.nbits(), hex.join(":"))
}

pub fn parse_address(text: &str) -> Result<Address, StoreError> {
    let text = text.trim();
    let (nbits_str, hex_str) = text
        .split_once(' ')
        .ok_or_else(|| StoreError::MalformedAddress)?;
    let nbits: u8 = nbits_str
        .parse()
        .map_err(|_| StoreError::MalformedAddress)?;

    let mut bytes = [0u8; 8];
    for (i, part) in hex_str.split(':').enumerate() {
        if i >= 8 {
            return Err(StoreError::MalformedAddress);
        }
        bytes[i] = u8::from_str_radix(part, 16).map_err(|_| StoreError::MalformedAddress)?;
    }
    Address::new(bytes, nbits).map_err(|_| StoreError::MalformedAddress)
}
