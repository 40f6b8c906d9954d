//! Request signing and payload encryption for the card detection upstream.
//!
//! The upstream mandates MD5 signatures and DES-ECB with PKCS#7 padding. Ciphertext travels
//! as lowercase hex.

use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter, Result as FmtResult},
};

use des::{
    Des,
    cipher::{BlockDecrypt, BlockEncrypt, KeyInit, generic_array::GenericArray},
};
use md5::{Digest, Md5};
use thiserror::Error;
use zeroize::Zeroizing;

const BLOCK_SIZE: usize = 8;

/// A single value in the canonical parameter map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    Number(i64),
    List(Vec<String>),
}

impl Display for ParamValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{number}"),
            Self::List(items) => {
                f.write_str("[")?;

                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(",")?;
                    }

                    write!(f, "\"{item}\"")?;
                }

                f.write_str("]")
            }
        }
    }
}

/// Parameters to sign, kept in ascending key order.
pub type SignParams = BTreeMap<String, ParamValue>;

#[derive(Debug, Error, PartialEq)]
pub enum CryptoError {
    #[error("app secret is empty")]
    EmptySecret,

    #[error("decode hex failed")]
    Hex(#[from] hex::FromHexError),

    #[error("cipher text length is not multiple of block size")]
    BlockLength,

    #[error("invalid padding")]
    Padding,

    #[error("plaintext is not valid UTF-8")]
    Utf8,
}

/// Signs and encrypts payloads with the configured app secret.
#[derive(Clone)]
pub struct CardCrypto {
    secret: Zeroizing<String>,
}

impl std::fmt::Debug for CardCrypto {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("CardCrypto").finish_non_exhaustive()
    }
}

impl CardCrypto {
    #[must_use]
    pub fn new(secret: Zeroizing<String>) -> Self {
        Self { secret }
    }

    /// The exact string fed to MD5 for `params`.
    #[must_use]
    pub fn canonical_string(&self, params: &SignParams) -> String {
        let mut canonical = String::with_capacity(self.secret.len() * 2 + params.len() * 16);

        canonical.push_str(&self.secret);

        for (key, value) in params.iter().filter(|(key, _)| key.as_str() != "sign") {
            canonical.push_str(key);
            canonical.push_str(&value.to_string());
        }

        canonical.push_str(&self.secret);
        canonical
    }

    /// Lowercase hex MD5 signature of `params`. A `sign` key, if present, is ignored.
    #[must_use]
    pub fn sign(&self, params: &SignParams) -> String {
        hex::encode(Md5::digest(self.canonical_string(params).as_bytes()))
    }

    #[must_use]
    pub fn verify_sign(&self, params: &SignParams, expected: &str) -> bool {
        self.sign(params) == expected
    }

    /// Encrypt `plaintext` and return lowercase hex.
    ///
    /// # Errors
    ///
    /// Returns an error when the app secret is empty.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let cipher = self.cipher()?;
        let mut buffer = pkcs7_pad(plaintext.as_bytes());

        for chunk in buffer.chunks_exact_mut(BLOCK_SIZE) {
            cipher.encrypt_block(GenericArray::from_mut_slice(chunk));
        }

        Ok(hex::encode(buffer))
    }

    /// Decrypt lowercase or uppercase hex produced by the upstream.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed hex, a length that is not a whole number of blocks,
    /// inconsistent padding, or a plaintext that is not UTF-8.
    ///
    /// ECB carries no integrity check. Tampering with the final block is caught by the padding
    /// check, but a tampered earlier block decrypts to garbage that only the UTF-8 check or the
    /// caller's JSON parse can reject.
    pub fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError> {
        let cipher = self.cipher()?;
        let mut buffer = hex::decode(ciphertext)?;

        if buffer.is_empty() || buffer.len() % BLOCK_SIZE != 0 {
            return Err(CryptoError::BlockLength);
        }

        for chunk in buffer.chunks_exact_mut(BLOCK_SIZE) {
            cipher.decrypt_block(GenericArray::from_mut_slice(chunk));
        }

        let unpadded = pkcs7_unpad(&buffer)?;

        String::from_utf8(unpadded.to_vec()).map_err(|_| CryptoError::Utf8)
    }

    fn cipher(&self) -> Result<Des, CryptoError> {
        let key = des_key(self.secret.as_bytes()).ok_or(CryptoError::EmptySecret)?;

        Ok(Des::new(GenericArray::from_slice(&key)))
    }
}

/// First eight bytes of `secret`, cycling when it is shorter.
fn des_key(secret: &[u8]) -> Option<[u8; BLOCK_SIZE]> {
    if secret.is_empty() {
        return None;
    }

    let mut key = [0_u8; BLOCK_SIZE];

    for (slot, byte) in key.iter_mut().zip(secret.iter().cycle()) {
        *slot = *byte;
    }

    Some(key)
}

fn pkcs7_pad(data: &[u8]) -> Vec<u8> {
    let padding = BLOCK_SIZE - data.len() % BLOCK_SIZE;
    let mut padded = Vec::with_capacity(data.len() + padding);

    padded.extend_from_slice(data);
    // padding is in 1..=8
    padded.resize(data.len() + padding, padding as u8);
    padded
}

fn pkcs7_unpad(data: &[u8]) -> Result<&[u8], CryptoError> {
    let Some(&last) = data.last() else {
        return Err(CryptoError::Padding);
    };

    let padding = usize::from(last);

    if padding == 0 || padding > BLOCK_SIZE || padding > data.len() {
        return Err(CryptoError::Padding);
    }

    let (body, tail) = data.split_at(data.len() - padding);

    if tail.iter().any(|&byte| byte != last) {
        return Err(CryptoError::Padding);
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card_detection::CardResult;

    fn crypto(secret: &str) -> CardCrypto {
        CardCrypto::new(Zeroizing::new(secret.to_string()))
    }

    fn text(value: &str) -> ParamValue {
        ParamValue::Text(value.to_string())
    }

    #[test]
    fn canonical_string_sorts_keys_and_formats_lists() {
        let mut params = SignParams::new();
        params.insert("timestamp".into(), text("1700000000"));
        params.insert("regionName".into(), text("美国"));
        params.insert("regionId".into(), ParamValue::Number(2));
        params.insert("productMark".into(), text("iTunes"));
        params.insert(
            "cards".into(),
            ParamValue::List(vec!["X123123123123123".to_string()]),
        );

        let canonical = crypto("S").canonical_string(&params);

        assert_eq!(
            canonical,
            "Scards[\"X123123123123123\"]productMarkiTunesregionId2regionName美国timestamp1700000000S"
        );
    }

    #[test]
    fn sign_ignores_insertion_order_and_sign_key() {
        let mut first = SignParams::new();
        first.insert("cardNo".into(), text("ABC"));
        first.insert("productMark".into(), text("nike"));
        first.insert("pinCode".into(), text("123456"));

        let mut second = SignParams::new();
        second.insert("pinCode".into(), text("123456"));
        second.insert("sign".into(), text("stale"));
        second.insert("productMark".into(), text("nike"));
        second.insert("cardNo".into(), text("ABC"));

        let crypto = crypto("secret");

        assert_eq!(crypto.sign(&first), crypto.sign(&second));
        assert!(crypto.verify_sign(&second, &crypto.sign(&first)));
    }

    #[test]
    fn sign_is_md5_of_canonical_string() {
        let params = SignParams::new();

        // MD5("SS")
        assert_eq!(
            crypto("S").sign(&params),
            hex::encode(Md5::digest(b"SS"))
        );
    }

    #[test]
    fn list_formatting_handles_empty_and_multiple_items() {
        assert_eq!(ParamValue::List(vec![]).to_string(), "[]");
        assert_eq!(
            ParamValue::List(vec!["a".into(), "b".into()]).to_string(),
            "[\"a\",\"b\"]"
        );
    }

    #[test]
    fn des_round_trip() -> Result<(), CryptoError> {
        let crypto = crypto("short");

        for plaintext in ["", "a", "exactly8", "{\"cardNo\":\"X1\",\"status\":2}", "美国"] {
            let ciphertext = crypto.encrypt(plaintext)?;

            assert_eq!(ciphertext.len() % 16, 0);
            assert_eq!(ciphertext, ciphertext.to_lowercase());
            assert_eq!(crypto.decrypt(&ciphertext)?, plaintext);
        }

        Ok(())
    }

    #[test]
    fn key_uses_first_eight_bytes_of_secret() -> Result<(), CryptoError> {
        let long = crypto("12345678-tail-ignored");
        let exact = crypto("12345678");

        assert_eq!(long.encrypt("payload")?, exact.encrypt("payload")?);

        Ok(())
    }

    #[test]
    fn short_secret_is_repeated() {
        assert_eq!(des_key(b"abc"), Some(*b"abcabcab"));
        assert_eq!(des_key(b""), None);
    }

    const CARD_RESULT: &str = r#"{"cardNo":"X123123123123123","status":2,"pinCode":"123456","message":"ok","checkTime":1700000000,"regionName":"US","regionID":2}"#;

    fn hex_substitutions(ciphertext: &str) -> impl Iterator<Item = (usize, String)> + '_ {
        ciphertext.char_indices().flat_map(move |(index, current)| {
            "0123456789abcdef"
                .chars()
                .filter(move |digit| *digit != current)
                .map(move |digit| {
                    let mut corrupted = ciphertext.to_string();
                    corrupted.replace_range(index..=index, digit.encode_utf8(&mut [0; 4]));
                    (index, corrupted)
                })
        })
    }

    #[test]
    fn tampered_final_block_fails_the_padding_check() -> Result<(), CryptoError> {
        let crypto = crypto("S");
        let ciphertext = crypto.encrypt(CARD_RESULT)?;
        let final_block = ciphertext.len() - 2 * BLOCK_SIZE;

        let tampered = hex_substitutions(&ciphertext).filter(|(index, _)| *index >= final_block);

        for (index, corrupted) in tampered {
            assert_eq!(crypto.decrypt(&corrupted), Err(CryptoError::Padding), "index {index}");
        }

        Ok(())
    }

    #[test]
    fn tampered_earlier_blocks_never_yield_a_card_result() -> Result<(), CryptoError> {
        let crypto = crypto("S");
        let ciphertext = crypto.encrypt(CARD_RESULT)?;
        let final_block = ciphertext.len() - 2 * BLOCK_SIZE;

        let tampered = hex_substitutions(&ciphertext).filter(|(index, _)| *index < final_block);

        for (index, corrupted) in tampered {
            match crypto.decrypt(&corrupted) {
                Err(error) => assert_eq!(error, CryptoError::Utf8, "index {index}"),
                Ok(plaintext) => {
                    assert_ne!(plaintext, CARD_RESULT, "index {index}");
                    assert!(
                        serde_json::from_str::<CardResult>(&plaintext).is_err(),
                        "index {index} parsed {plaintext:?}"
                    );
                }
            }
        }

        Ok(())
    }

    #[test]
    fn non_hex_ciphertext_is_rejected() {
        assert!(matches!(crypto("S").decrypt("zz11223344556677"), Err(CryptoError::Hex(_))));
    }

    #[test]
    fn rejects_partial_blocks() {
        assert_eq!(crypto("S").decrypt("00112233"), Err(CryptoError::BlockLength));
        assert_eq!(crypto("S").decrypt(""), Err(CryptoError::BlockLength));
    }

    #[test]
    fn unpad_validates_every_padding_byte() {
        assert_eq!(pkcs7_unpad(&[1, 2, 3, 4, 5, 3, 3, 3]), Ok(&[1, 2, 3, 4, 5][..]));
        assert_eq!(pkcs7_unpad(&[1, 2, 3, 4, 5, 2, 3, 3]), Err(CryptoError::Padding));
        assert_eq!(pkcs7_unpad(&[1, 2, 3, 4, 5, 6, 7, 0]), Err(CryptoError::Padding));
        assert_eq!(pkcs7_unpad(&[9; 8]), Err(CryptoError::Padding));
        assert_eq!(pkcs7_unpad(&[8; 8]), Ok(&[][..]));
    }

    #[test]
    fn pad_always_adds_a_block_fragment() {
        assert_eq!(pkcs7_pad(b""), vec![8; 8]);
        assert_eq!(pkcs7_pad(b"1234567"), b"1234567\x01".to_vec());
        assert_eq!(pkcs7_pad(b"12345678").len(), 16);
    }
}
