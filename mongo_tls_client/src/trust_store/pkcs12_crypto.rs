//! Integrity and privacy algorithms for PKCS#12 archives written by current `keytool` and
//! OpenSSL: HMAC-SHA-2 MACs keyed through the RFC 7292 KDF, and PBES2 (PBKDF2 with AES-CBC)
//! encrypted bags. The SHA-1 era algorithms are left to `p12`.

use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};
use yasna::models::ObjectIdentifier;

use crate::SecureClientError;

const OID_PBES2: &[u64] = &[1, 2, 840, 113_549, 1, 5, 13];
const OID_PBKDF2: &[u64] = &[1, 2, 840, 113_549, 1, 5, 12];

/// Diversifier selecting MAC key material in the RFC 7292 KDF.
const KDF_ID_MAC: u8 = 3;

/// Password as a null terminated BMPString, the form the PKCS#12 KDF consumes.
pub(crate) fn bmp_password(password: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(password.len() * 2 + 2);
    for unit in password.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    bytes.extend_from_slice(&[0, 0]);
    bytes
}

/// Hash behind a PKCS#12 integrity MAC.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MacDigest {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl MacDigest {
    pub(crate) fn from_oid(oid: &ObjectIdentifier) -> Option<Self> {
        match oid.components().as_slice() {
            [1, 3, 14, 3, 2, 26] => Some(MacDigest::Sha1),
            [2, 16, 840, 1, 101, 3, 4, 2, 1] => Some(MacDigest::Sha256),
            [2, 16, 840, 1, 101, 3, 4, 2, 2] => Some(MacDigest::Sha384),
            [2, 16, 840, 1, 101, 3, 4, 2, 3] => Some(MacDigest::Sha512),
            _ => None,
        }
    }

    /// Checks `expected` against the HMAC of `data`. `password` is the BMPString form.
    pub(crate) fn verify(
        self,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        data: &[u8],
        expected: &[u8],
    ) -> bool {
        match self {
            MacDigest::Sha1 => {
                let key = pkcs12_kdf::<Sha1>(password, salt, iterations, KDF_ID_MAC, 20, 64);
                hmac_matches::<Hmac<Sha1>>(&key, data, expected)
            }
            MacDigest::Sha256 => {
                let key = pkcs12_kdf::<Sha256>(password, salt, iterations, KDF_ID_MAC, 32, 64);
                hmac_matches::<Hmac<Sha256>>(&key, data, expected)
            }
            MacDigest::Sha384 => {
                let key = pkcs12_kdf::<Sha384>(password, salt, iterations, KDF_ID_MAC, 48, 128);
                hmac_matches::<Hmac<Sha384>>(&key, data, expected)
            }
            MacDigest::Sha512 => {
                let key = pkcs12_kdf::<Sha512>(password, salt, iterations, KDF_ID_MAC, 64, 128);
                hmac_matches::<Hmac<Sha512>>(&key, data, expected)
            }
        }
    }
}

fn hmac_matches<M: Mac + hmac::digest::KeyInit>(key: &[u8], data: &[u8], expected: &[u8]) -> bool {
    match <M as Mac>::new_from_slice(key) {
        Ok(mut mac) => {
            mac.update(data);
            mac.verify_slice(expected).is_ok()
        }
        Err(_) => false,
    }
}

/// RFC 7292 appendix B.2 key derivation. `block_len` is the hash's input block size.
fn pkcs12_kdf<D: Digest>(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    id: u8,
    size: usize,
    block_len: usize,
) -> Vec<u8> {
    let fill = |source: &[u8]| -> Vec<u8> {
        let len = block_len * source.len().div_ceil(block_len);
        source.iter().cycle().take(len).copied().collect()
    };
    let diversifier = vec![id; block_len];
    let mut input = fill(salt);
    input.extend(fill(password));

    let mut output = Vec::with_capacity(size);
    loop {
        let mut block = D::new()
            .chain_update(&diversifier)
            .chain_update(&input)
            .finalize()
            .to_vec();
        for _ in 1..iterations {
            block = D::digest(&block).to_vec();
        }
        output.extend_from_slice(&block);
        if output.len() >= size {
            break;
        }

        // Every block_len chunk of the input becomes (chunk + B + 1) mod 2^(8 * block_len).
        let b: Vec<u8> = block.iter().cycle().take(block_len).copied().collect();
        for chunk in input.chunks_mut(block_len) {
            let mut carry = 1u16;
            for (byte, addend) in chunk.iter_mut().rev().zip(b.iter().rev()) {
                let sum = u16::from(*byte) + u16::from(*addend) + carry;
                *byte = sum as u8;
                carry = sum >> 8;
            }
        }
    }
    output.truncate(size);
    output
}

pub(crate) fn is_pbes2(oid: &ObjectIdentifier) -> bool {
    oid.components().as_slice() == OID_PBES2
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Prf {
    HmacSha1,
    HmacSha256,
    HmacSha384,
    HmacSha512,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BagCipher {
    Aes128Cbc,
    Aes192Cbc,
    Aes256Cbc,
}

impl BagCipher {
    fn key_len(self) -> usize {
        match self {
            BagCipher::Aes128Cbc => 16,
            BagCipher::Aes192Cbc => 24,
            BagCipher::Aes256Cbc => 32,
        }
    }
}

#[derive(Debug)]
struct Pbes2Params {
    salt: Vec<u8>,
    iterations: u32,
    key_len: Option<u32>,
    prf: Prf,
    cipher: BagCipher,
    iv: Vec<u8>,
}

struct RawPbes2Params {
    kdf: ObjectIdentifier,
    salt: Vec<u8>,
    iterations: u32,
    key_len: Option<u32>,
    prf: Option<ObjectIdentifier>,
    cipher: ObjectIdentifier,
    iv: Vec<u8>,
}

fn parse_pbes2_params(der: &[u8]) -> Result<Pbes2Params, SecureClientError> {
    let raw = yasna::parse_der(der, |r| {
        r.read_sequence(|r| {
            let (kdf, salt, iterations, key_len, prf) = r.next().read_sequence(|r| {
                let kdf = r.next().read_oid()?;
                let (salt, iterations, key_len, prf) = r.next().read_sequence(|r| {
                    let salt = r.next().read_bytes()?;
                    let iterations = r.next().read_u32()?;
                    let key_len = r.read_optional(|r| r.read_u32())?;
                    let prf = r.read_optional(|r| {
                        r.read_sequence(|r| {
                            let oid = r.next().read_oid()?;
                            r.read_optional(|r| r.read_null())?;
                            Ok(oid)
                        })
                    })?;
                    Ok((salt, iterations, key_len, prf))
                })?;
                Ok((kdf, salt, iterations, key_len, prf))
            })?;
            let (cipher, iv) = r.next().read_sequence(|r| {
                let cipher = r.next().read_oid()?;
                let iv = r.next().read_bytes()?;
                Ok((cipher, iv))
            })?;
            Ok(RawPbes2Params {
                kdf,
                salt,
                iterations,
                key_len,
                prf,
                cipher,
                iv,
            })
        })
    })
    .map_err(|e| SecureClientError::FormatError(format!("Invalid PBES2 parameters: {}", e)))?;

    if raw.kdf.components().as_slice() != OID_PBKDF2 {
        return Err(SecureClientError::FormatError(format!(
            "Unsupported PBES2 key derivation `{}`",
            raw.kdf
        )));
    }

    // hmacWithSHA1 is the default when the PRF is omitted.
    let prf = match raw.prf.as_ref().map(|oid| oid.components().as_slice()) {
        None | Some([1, 2, 840, 113_549, 2, 7]) => Prf::HmacSha1,
        Some([1, 2, 840, 113_549, 2, 9]) => Prf::HmacSha256,
        Some([1, 2, 840, 113_549, 2, 10]) => Prf::HmacSha384,
        Some([1, 2, 840, 113_549, 2, 11]) => Prf::HmacSha512,
        Some(_) => {
            return Err(SecureClientError::FormatError(format!(
                "Unsupported PBKDF2 PRF {:?}",
                raw.prf
            )))
        }
    };

    let cipher = match raw.cipher.components().as_slice() {
        [2, 16, 840, 1, 101, 3, 4, 1, 2] => BagCipher::Aes128Cbc,
        [2, 16, 840, 1, 101, 3, 4, 1, 22] => BagCipher::Aes192Cbc,
        [2, 16, 840, 1, 101, 3, 4, 1, 42] => BagCipher::Aes256Cbc,
        _ => {
            return Err(SecureClientError::FormatError(format!(
                "Unsupported PBES2 cipher `{}`",
                raw.cipher
            )))
        }
    };

    Ok(Pbes2Params {
        salt: raw.salt,
        iterations: raw.iterations,
        key_len: raw.key_len,
        prf,
        cipher,
        iv: raw.iv,
    })
}

/// Decrypts a PBES2 protected bag. `Ok(None)` means the ciphertext does not decrypt under
/// `password`.
pub(crate) fn pbes2_decrypt(
    params_der: &[u8],
    password: &str,
    ciphertext: &[u8],
) -> Result<Option<Vec<u8>>, SecureClientError> {
    let params = parse_pbes2_params(params_der)?;
    tracing::trace!(
        prf = ?params.prf,
        cipher = ?params.cipher,
        iterations = params.iterations,
        "Decrypting PBES2 bag"
    );

    let key_len = params.cipher.key_len();
    if params.key_len.is_some_and(|len| len as usize != key_len) {
        return Err(SecureClientError::FormatError(format!(
            "PBKDF2 key length {:?} does not fit {:?}",
            params.key_len, params.cipher
        )));
    }

    let mut key = vec![0u8; key_len];
    let password = password.as_bytes();
    let (salt, rounds) = (params.salt.as_slice(), params.iterations);
    match params.prf {
        Prf::HmacSha1 => pbkdf2::pbkdf2::<Hmac<Sha1>>(password, salt, rounds, &mut key),
        Prf::HmacSha256 => pbkdf2::pbkdf2::<Hmac<Sha256>>(password, salt, rounds, &mut key),
        Prf::HmacSha384 => pbkdf2::pbkdf2::<Hmac<Sha384>>(password, salt, rounds, &mut key),
        Prf::HmacSha512 => pbkdf2::pbkdf2::<Hmac<Sha512>>(password, salt, rounds, &mut key),
    }
    .map_err(|e| SecureClientError::FormatError(format!("PBKDF2 failed: {}", e)))?;

    let decrypted = match params.cipher {
        BagCipher::Aes128Cbc => cbc::Decryptor::<aes::Aes128>::new_from_slices(&key, &params.iv)
            .map(|c| c.decrypt_padded_vec_mut::<Pkcs7>(ciphertext)),
        BagCipher::Aes192Cbc => cbc::Decryptor::<aes::Aes192>::new_from_slices(&key, &params.iv)
            .map(|c| c.decrypt_padded_vec_mut::<Pkcs7>(ciphertext)),
        BagCipher::Aes256Cbc => cbc::Decryptor::<aes::Aes256>::new_from_slices(&key, &params.iv)
            .map(|c| c.decrypt_padded_vec_mut::<Pkcs7>(ciphertext)),
    };

    match decrypted {
        Ok(Ok(plaintext)) => Ok(Some(plaintext)),
        Ok(Err(_)) => Ok(None),
        Err(_) => Err(SecureClientError::FormatError(format!(
            "PBES2 IV of {} bytes does not fit {:?}",
            params.iv.len(),
            params.cipher
        ))),
    }
}
