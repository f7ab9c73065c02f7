//! Legacy P2PKH address rendering for the found-key record.

use sha2::{Digest, Sha256};

/// Base58check with the mainnet P2PKH version byte.
pub fn p2pkh_address(hash: &[u8; 20]) -> String {
    let mut data = Vec::with_capacity(25);
    data.push(0x00);
    data.extend_from_slice(hash);

    let checksum = Sha256::digest(Sha256::digest(&data));
    data.extend_from_slice(&checksum[..4]);

    bs58::encode(data).into_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_addresses() {
        // hash160 of the compressed pubkeys for private keys 1 and 2.
        let h1: [u8; 20] = hex::decode("751e76e8199196d454941c45d1b3a323f1433bd6")
            .unwrap()
            .try_into()
            .unwrap();
        assert_eq!(p2pkh_address(&h1), "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH");

        let h2: [u8; 20] = hex::decode("06afd46bcdfd22ef94ac122aa11f241244a37ecc")
            .unwrap()
            .try_into()
            .unwrap();
        assert_eq!(p2pkh_address(&h2), "1cMh228HTCiwS8ZsaakH8A8wze1JR5ZsP");
    }

    #[test]
    fn test_puzzle_target_roundtrip() {
        assert_eq!(
            p2pkh_address(&crate::puzzle::TARGET_H160),
            crate::puzzle::TARGET_ADDRESS
        );
    }
}
