//! Standard security handler: password authentication and decryption.
//!
//! Supports the password-based standard handler in its RC4 (revisions 2/3),
//! crypt-filter (revision 4, RC4 or AES-128) and AES-256 (revisions 5/6)
//! forms. Authentication tries the supplied password as the user password,
//! then as the owner password; the empty password therefore opens
//! owner-restricted documents, while a document demanding an unknown user
//! password fails with an inspectable encryption error.
//!
//! Decryption order matters: object strings and stream payloads are
//! decrypted before any filter decoding or text processing.

use crate::error::{Error, Result};
use crate::parser::object::{Dict, Object};
use aes::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use md5::{Digest, Md5};
use sha2::{Sha256, Sha384, Sha512};

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
#[cfg(test)]
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;

/// Standard padding string, appended to short passwords (Algorithm 2).
pub(crate) const PASSWORD_PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01,
    0x08, 0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53,
    0x69, 0x7A,
];

/// Salt mixed into per-object AES-128 keys.
const AES_SALT: &[u8; 4] = b"sAlT";

/// Per-object decryption interface, held by the document after
/// authentication succeeds.
pub trait SecurityHandler: Send + Sync {
    /// Decrypt a string payload of object `(number, generation)`.
    fn decrypt_string(&self, number: u32, generation: u16, data: &[u8]) -> Vec<u8>;

    /// Decrypt a stream payload of object `(number, generation)`.
    fn decrypt_stream(&self, number: u32, generation: u16, data: &[u8]) -> Vec<u8>;
}

impl std::fmt::Debug for dyn SecurityHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecurityHandler")
    }
}

/// Build the security handler described by the trailer's `/Encrypt`
/// dictionary, authenticating `password` (empty string by default).
///
/// Returns `Ok(None)` for unencrypted documents. Unsupported schemes and
/// failed authentication both map to the `unsupported-encryption` error
/// category so batch callers can skip the file.
pub fn create_security_handler(
    encrypt: &Dict,
    doc_id: &[u8],
    password: &str,
) -> Result<Box<dyn SecurityHandler>> {
    let filter = encrypt
        .get("Filter")
        .and_then(Object::as_name)
        .unwrap_or("");
    if filter != "Standard" {
        return Err(Error::UnsupportedEncryption(format!(
            "security filter '{filter}'"
        )));
    }

    let v = encrypt.get("V").and_then(Object::as_i64).unwrap_or(0);
    let r = encrypt.get("R").and_then(Object::as_i64).unwrap_or(0);

    match (v, r) {
        (1, 2) | (2, 2) | (2, 3) => Rc4Handler::new(encrypt, doc_id, password)
            .map(|h| Box::new(h) as Box<dyn SecurityHandler>),
        (4, 4) => CryptFilterHandler::new(encrypt, doc_id, password)
            .map(|h| Box::new(h) as Box<dyn SecurityHandler>),
        (5, 5) | (5, 6) => Aes256Handler::new(encrypt, password)
            .map(|h| Box::new(h) as Box<dyn SecurityHandler>),
        (v, r) => Err(Error::UnsupportedEncryption(format!("V={v} R={r}"))),
    }
}

// ==================== Shared helpers ====================

fn get_bytes<'a>(dict: &'a Dict, key: &str) -> Result<&'a [u8]> {
    dict.get(key)
        .and_then(Object::as_string_bytes)
        .ok_or_else(|| Error::UnsupportedEncryption(format!("missing /{key} entry")))
}

fn get_p(dict: &Dict) -> u32 {
    let p = dict.get("P").and_then(Object::as_i64).unwrap_or(-1);
    (p & 0xFFFF_FFFF) as u32
}

fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut padded = [0u8; 32];
    let n = password.len().min(32);
    padded[..n].copy_from_slice(&password[..n]);
    padded[n..].copy_from_slice(&PASSWORD_PADDING[..32 - n]);
    padded
}

/// File key derivation for revisions 2-4 (Algorithm 2).
fn derive_file_key_rc4(
    padded_password: &[u8; 32],
    o_value: &[u8],
    p: u32,
    doc_id: &[u8],
    revision: i64,
    key_len: usize,
    encrypt_metadata: bool,
) -> Vec<u8> {
    let mut hasher = Md5::new();
    hasher.update(padded_password);
    hasher.update(&o_value[..o_value.len().min(32)]);
    hasher.update(p.to_le_bytes());
    hasher.update(doc_id);
    if revision >= 4 && !encrypt_metadata {
        hasher.update([0xFF, 0xFF, 0xFF, 0xFF]);
    }
    let mut hash = hasher.finalize().to_vec();

    if revision >= 3 {
        for _ in 0..50 {
            hash = Md5::digest(&hash[..key_len]).to_vec();
        }
    }
    hash.truncate(key_len);
    hash
}

/// Expected /U value for a candidate file key (Algorithms 4 and 5).
fn compute_u_value(file_key: &[u8], doc_id: &[u8], revision: i64) -> Vec<u8> {
    if revision == 2 {
        return Arcfour::new(file_key).process(&PASSWORD_PADDING);
    }
    let mut hasher = Md5::new();
    hasher.update(PASSWORD_PADDING);
    hasher.update(doc_id);
    let mut value = Arcfour::new(file_key).process(&hasher.finalize());
    for i in 1..=19u8 {
        let step_key: Vec<u8> = file_key.iter().map(|b| b ^ i).collect();
        value = Arcfour::new(&step_key).process(&value);
    }
    value
}

/// Recover the padded user password from /O with the owner password
/// (Algorithm 7). The result feeds straight into user authentication.
fn recover_user_password(
    owner_password: &[u8],
    o_value: &[u8],
    revision: i64,
    key_len: usize,
) -> [u8; 32] {
    let padded = pad_password(owner_password);
    let mut hash = Md5::digest(padded).to_vec();
    if revision >= 3 {
        for _ in 0..50 {
            hash = Md5::digest(&hash).to_vec();
        }
    }
    let rc4_key = &hash[..key_len];

    let mut data = o_value[..o_value.len().min(32)].to_vec();
    if revision == 2 {
        data = Arcfour::new(rc4_key).process(&data);
    } else {
        for i in (0..20u8).rev() {
            let step_key: Vec<u8> = rc4_key.iter().map(|b| b ^ i).collect();
            data = Arcfour::new(&step_key).process(&data);
        }
    }
    let mut out = [0u8; 32];
    let n = data.len().min(32);
    out[..n].copy_from_slice(&data[..n]);
    out
}

/// Authenticate `password` against /U and /O, returning the file key.
fn authenticate_rc4(
    encrypt: &Dict,
    doc_id: &[u8],
    password: &str,
    revision: i64,
    key_len: usize,
    encrypt_metadata: bool,
) -> Result<Vec<u8>> {
    let o_value = get_bytes(encrypt, "O")?.to_vec();
    let u_value = get_bytes(encrypt, "U")?.to_vec();
    let p = get_p(encrypt);

    let check = |padded: &[u8; 32]| -> Option<Vec<u8>> {
        let key = derive_file_key_rc4(
            padded,
            &o_value,
            p,
            doc_id,
            revision,
            key_len,
            encrypt_metadata,
        );
        let expected = compute_u_value(&key, doc_id, revision);
        let matches = if revision == 2 {
            expected == u_value
        } else {
            expected.len() >= 16 && u_value.len() >= 16 && expected[..16] == u_value[..16]
        };
        matches.then_some(key)
    };

    // User password path.
    if let Some(key) = check(&pad_password(password.as_bytes())) {
        return Ok(key);
    }
    // Owner password path: recover the user password from /O.
    let recovered = recover_user_password(password.as_bytes(), &o_value, revision, key_len);
    if let Some(key) = check(&recovered) {
        return Ok(key);
    }
    Err(Error::InvalidPassword)
}

/// Per-object key for RC4 and AES-128 (Algorithm 1).
fn object_key(file_key: &[u8], number: u32, generation: u16, aes: bool) -> Vec<u8> {
    let mut hasher = Md5::new();
    hasher.update(file_key);
    hasher.update(&number.to_le_bytes()[..3]);
    hasher.update(&generation.to_le_bytes()[..2]);
    if aes {
        hasher.update(AES_SALT);
    }
    let digest = hasher.finalize();
    let len = (file_key.len() + 5).min(16);
    digest[..len].to_vec()
}

fn aes_cbc_decrypt_128(key: &[u8], data: &[u8]) -> Vec<u8> {
    if data.len() < 16 || (data.len() - 16) % 16 != 0 {
        return Vec::new();
    }
    let (iv, body) = data.split_at(16);
    let mut buf = body.to_vec();
    match Aes128CbcDec::new_from_slices(key, iv) {
        Ok(dec) => match dec.decrypt_padded_mut::<NoPadding>(&mut buf) {
            Ok(_) => strip_pkcs7(buf),
            Err(_) => Vec::new(),
        },
        Err(_) => Vec::new(),
    }
}

fn aes_cbc_decrypt_256(key: &[u8], iv: &[u8], data: &[u8]) -> Vec<u8> {
    if data.is_empty() || data.len() % 16 != 0 {
        return Vec::new();
    }
    let mut buf = data.to_vec();
    match Aes256CbcDec::new_from_slices(key, iv) {
        Ok(dec) => match dec.decrypt_padded_mut::<NoPadding>(&mut buf) {
            Ok(_) => buf,
            Err(_) => Vec::new(),
        },
        Err(_) => Vec::new(),
    }
}

/// Remove PKCS#7 padding; malformed padding passes the data through
/// untouched rather than discarding the payload.
fn strip_pkcs7(mut data: Vec<u8>) -> Vec<u8> {
    match data.last().copied() {
        Some(pad) if pad >= 1 && pad as usize <= 16 && pad as usize <= data.len() => {
            let start = data.len() - pad as usize;
            if data[start..].iter().all(|&b| b == pad) {
                data.truncate(start);
            }
            data
        }
        _ => data,
    }
}

fn aes_cbc_encrypt_128(key: &[u8], iv: &[u8], data: &[u8]) -> Vec<u8> {
    let mut buf = data.to_vec();
    let len = buf.len();
    match Aes128CbcEnc::new_from_slices(key, iv) {
        Ok(enc) => match enc.encrypt_padded_mut::<NoPadding>(&mut buf, len) {
            Ok(_) => buf,
            Err(_) => Vec::new(),
        },
        Err(_) => Vec::new(),
    }
}

// ==================== RC4 handler (revisions 2/3) ====================

struct Rc4Handler {
    file_key: Vec<u8>,
}

impl Rc4Handler {
    fn new(encrypt: &Dict, doc_id: &[u8], password: &str) -> Result<Self> {
        let revision = encrypt.get("R").and_then(Object::as_i64).unwrap_or(2);
        let key_len = if revision == 2 {
            5
        } else {
            let bits = encrypt.get("Length").and_then(Object::as_i64).unwrap_or(40);
            ((bits / 8).clamp(5, 16)) as usize
        };
        let file_key = authenticate_rc4(encrypt, doc_id, password, revision, key_len, true)?;
        Ok(Self { file_key })
    }

    fn decrypt(&self, number: u32, generation: u16, data: &[u8]) -> Vec<u8> {
        let key = object_key(&self.file_key, number, generation, false);
        Arcfour::new(&key).process(data)
    }
}

impl SecurityHandler for Rc4Handler {
    fn decrypt_string(&self, number: u32, generation: u16, data: &[u8]) -> Vec<u8> {
        self.decrypt(number, generation, data)
    }

    fn decrypt_stream(&self, number: u32, generation: u16, data: &[u8]) -> Vec<u8> {
        self.decrypt(number, generation, data)
    }
}

// ==================== Crypt-filter handler (revision 4) ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CryptMethod {
    Identity,
    Rc4,
    Aes128,
}

struct CryptFilterHandler {
    file_key: Vec<u8>,
    string_method: CryptMethod,
    stream_method: CryptMethod,
}

impl CryptFilterHandler {
    fn new(encrypt: &Dict, doc_id: &[u8], password: &str) -> Result<Self> {
        let bits = encrypt.get("Length").and_then(Object::as_i64).unwrap_or(128);
        let key_len = ((bits / 8).clamp(5, 16)) as usize;
        let encrypt_metadata = encrypt
            .get("EncryptMetadata")
            .and_then(Object::as_bool)
            .unwrap_or(true);

        let string_method = Self::method_for(encrypt, "StrF")?;
        let stream_method = Self::method_for(encrypt, "StmF")?;

        let file_key = authenticate_rc4(encrypt, doc_id, password, 4, key_len, encrypt_metadata)?;
        Ok(Self {
            file_key,
            string_method,
            stream_method,
        })
    }

    fn method_for(encrypt: &Dict, selector: &str) -> Result<CryptMethod> {
        let filter_name = encrypt
            .get(selector)
            .and_then(Object::as_name)
            .unwrap_or("Identity");
        if filter_name == "Identity" {
            return Ok(CryptMethod::Identity);
        }
        let cf = encrypt
            .get("CF")
            .and_then(Object::as_dict)
            .ok_or_else(|| Error::UnsupportedEncryption("missing /CF dictionary".into()))?;
        let filter = cf
            .get(filter_name)
            .and_then(Object::as_dict)
            .ok_or_else(|| {
                Error::UnsupportedEncryption(format!("missing crypt filter '{filter_name}'"))
            })?;
        match filter.get("CFM").and_then(Object::as_name).unwrap_or("None") {
            "Identity" => Ok(CryptMethod::Identity),
            "V2" => Ok(CryptMethod::Rc4),
            "AESV2" => Ok(CryptMethod::Aes128),
            other => Err(Error::UnsupportedEncryption(format!(
                "crypt method '{other}'"
            ))),
        }
    }

    fn decrypt(&self, method: CryptMethod, number: u32, generation: u16, data: &[u8]) -> Vec<u8> {
        match method {
            CryptMethod::Identity => data.to_vec(),
            CryptMethod::Rc4 => {
                let key = object_key(&self.file_key, number, generation, false);
                Arcfour::new(&key).process(data)
            }
            CryptMethod::Aes128 => {
                let key = object_key(&self.file_key, number, generation, true);
                aes_cbc_decrypt_128(&key, data)
            }
        }
    }
}

impl SecurityHandler for CryptFilterHandler {
    fn decrypt_string(&self, number: u32, generation: u16, data: &[u8]) -> Vec<u8> {
        self.decrypt(self.string_method, number, generation, data)
    }

    fn decrypt_stream(&self, number: u32, generation: u16, data: &[u8]) -> Vec<u8> {
        self.decrypt(self.stream_method, number, generation, data)
    }
}

// ==================== AES-256 handler (revisions 5/6) ====================

struct Aes256Handler {
    file_key: Vec<u8>,
}

impl Aes256Handler {
    fn new(encrypt: &Dict, password: &str) -> Result<Self> {
        let revision = encrypt.get("R").and_then(Object::as_i64).unwrap_or(6);
        let o_value = get_bytes(encrypt, "O")?.to_vec();
        let u_value = get_bytes(encrypt, "U")?.to_vec();
        if u_value.len() < 48 || o_value.len() < 48 {
            return Err(Error::UnsupportedEncryption(
                "short /U or /O entry for AES-256".into(),
            ));
        }
        let password = password.as_bytes();

        // User password: hash against the validation salt in U[32..40].
        let user_hash = Self::password_hash(revision, password, &u_value[32..40], b"");
        if user_hash == u_value[..32] {
            let ue = get_bytes(encrypt, "UE")?;
            let intermediate = Self::password_hash(revision, password, &u_value[40..48], b"");
            let file_key = aes_cbc_decrypt_256(&intermediate, &[0u8; 16], ue);
            return Self::from_key(file_key);
        }

        // Owner password: salts live in O, with the whole U as extra data.
        let owner_hash = Self::password_hash(revision, password, &o_value[32..40], &u_value[..48]);
        if owner_hash == o_value[..32] {
            let oe = get_bytes(encrypt, "OE")?;
            let intermediate =
                Self::password_hash(revision, password, &o_value[40..48], &u_value[..48]);
            let file_key = aes_cbc_decrypt_256(&intermediate, &[0u8; 16], oe);
            return Self::from_key(file_key);
        }

        Err(Error::InvalidPassword)
    }

    fn from_key(file_key: Vec<u8>) -> Result<Self> {
        if file_key.len() != 32 {
            return Err(Error::UnsupportedEncryption(
                "AES-256 file key recovery failed".into(),
            ));
        }
        Ok(Self { file_key })
    }

    fn password_hash(revision: i64, password: &[u8], salt: &[u8], extra: &[u8]) -> Vec<u8> {
        if revision == 5 {
            let mut hasher = Sha256::new();
            hasher.update(password);
            hasher.update(salt);
            hasher.update(extra);
            return hasher.finalize().to_vec();
        }
        Self::hash_r6(password, salt, extra)
    }

    /// Iterated hash for revision 6 (Algorithm 2.B).
    fn hash_r6(password: &[u8], salt: &[u8], extra: &[u8]) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(password);
        hasher.update(salt);
        hasher.update(extra);
        let mut k = hasher.finalize().to_vec();

        let mut round = 0u32;
        loop {
            let mut block = Vec::with_capacity(64 * (password.len() + k.len() + extra.len()));
            for _ in 0..64 {
                block.extend_from_slice(password);
                block.extend_from_slice(&k);
                block.extend_from_slice(extra);
            }
            let e = aes_cbc_encrypt_128(&k[..16], &k[16..32], &block);
            let selector: u32 = e[..16].iter().map(|&b| b as u32).sum::<u32>() % 3;
            k = match selector {
                0 => Sha256::digest(&e).to_vec(),
                1 => Sha384::digest(&e).to_vec(),
                _ => Sha512::digest(&e).to_vec(),
            };
            round += 1;
            if round >= 64 && (*e.last().unwrap_or(&0) as u32) <= round - 32 {
                break;
            }
        }
        k.truncate(32);
        k
    }
}

impl SecurityHandler for Aes256Handler {
    fn decrypt_string(&self, _number: u32, _generation: u16, data: &[u8]) -> Vec<u8> {
        if data.len() < 16 {
            return Vec::new();
        }
        let (iv, body) = data.split_at(16);
        strip_pkcs7(aes_cbc_decrypt_256(&self.file_key, iv, body))
    }

    fn decrypt_stream(&self, number: u32, generation: u16, data: &[u8]) -> Vec<u8> {
        self.decrypt_string(number, generation, data)
    }
}

// ==================== RC4 primitive ====================

/// RC4 keystream cipher.
///
/// Implemented in-module: per-object keys vary from 5 to 16 bytes, which
/// fixed-key-size cipher types cannot express.
pub struct Arcfour {
    state: [u8; 256],
    i: u8,
    j: u8,
}

impl Arcfour {
    pub fn new(key: &[u8]) -> Self {
        let mut state = [0u8; 256];
        for (i, slot) in state.iter_mut().enumerate() {
            *slot = i as u8;
        }
        let mut j = 0u8;
        for i in 0..256usize {
            j = j
                .wrapping_add(state[i])
                .wrapping_add(key[i % key.len()]);
            state.swap(i, j as usize);
        }
        Self { state, i: 0, j: 0 }
    }

    /// Encrypt or decrypt `data` (the cipher is symmetric).
    pub fn process(&mut self, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len());
        for &byte in data {
            self.i = self.i.wrapping_add(1);
            self.j = self.j.wrapping_add(self.state[self.i as usize]);
            self.state.swap(self.i as usize, self.j as usize);
            let idx = self.state[self.i as usize].wrapping_add(self.state[self.j as usize]);
            out.push(byte ^ self.state[idx as usize]);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aes_cbc_encrypt_256(key: &[u8], iv: &[u8], data: &[u8]) -> Vec<u8> {
        let mut buf = data.to_vec();
        let len = buf.len();
        let enc = Aes256CbcEnc::new_from_slices(key, iv).unwrap();
        enc.encrypt_padded_mut::<NoPadding>(&mut buf, len).unwrap();
        buf
    }

    fn pkcs7_pad(data: &[u8]) -> Vec<u8> {
        let pad = 16 - data.len() % 16;
        let mut out = data.to_vec();
        out.extend(std::iter::repeat(pad as u8).take(pad));
        out
    }

    // ==================== Forward construction helpers ====================

    /// Build /O for revisions 2-4 (Algorithm 3).
    fn compute_o_value(owner_pw: &[u8], user_pw: &[u8], revision: i64, key_len: usize) -> Vec<u8> {
        let padded_owner = pad_password(owner_pw);
        let mut hash = Md5::digest(padded_owner).to_vec();
        if revision >= 3 {
            for _ in 0..50 {
                hash = Md5::digest(&hash).to_vec();
            }
        }
        let rc4_key = &hash[..key_len];
        let mut data = pad_password(user_pw).to_vec();
        if revision == 2 {
            data = Arcfour::new(rc4_key).process(&data);
        } else {
            for i in 0..20u8 {
                let step_key: Vec<u8> = rc4_key.iter().map(|b| b ^ i).collect();
                data = Arcfour::new(&step_key).process(&data);
            }
        }
        data
    }

    fn build_rc4_encrypt_dict(
        user_pw: &str,
        owner_pw: &str,
        revision: i64,
        key_bits: i64,
        doc_id: &[u8],
    ) -> Dict {
        let key_len = if revision == 2 { 5 } else { (key_bits / 8) as usize };
        let v = if revision == 2 { 1 } else { 2 };
        let p: i64 = -44;
        let o = compute_o_value(owner_pw.as_bytes(), user_pw.as_bytes(), revision, key_len);
        let file_key = derive_file_key_rc4(
            &pad_password(user_pw.as_bytes()),
            &o,
            (p & 0xFFFF_FFFF) as u32,
            doc_id,
            revision,
            key_len,
            true,
        );
        let u = compute_u_value(&file_key, doc_id, revision);

        let mut dict = Dict::new();
        dict.insert("Filter".into(), Object::Name("Standard".into()));
        dict.insert("V".into(), Object::Integer(v));
        dict.insert("R".into(), Object::Integer(revision));
        dict.insert("Length".into(), Object::Integer(key_bits));
        dict.insert("P".into(), Object::Integer(p));
        dict.insert("O".into(), Object::String(o));
        dict.insert("U".into(), Object::String(u));
        dict
    }

    // ==================== RC4 primitive ====================

    #[test]
    fn test_arcfour_symmetric() {
        let key = b"secret-key";
        let plain = b"attack at dawn";
        let cipher = Arcfour::new(key).process(plain);
        assert_ne!(cipher, plain);
        assert_eq!(Arcfour::new(key).process(&cipher), plain);
    }

    #[test]
    fn test_arcfour_known_vector() {
        // Classic RC4 test vector: key "Key", plaintext "Plaintext".
        let cipher = Arcfour::new(b"Key").process(b"Plaintext");
        assert_eq!(
            cipher,
            vec![0xBB, 0xF3, 0x16, 0xE8, 0xD9, 0x40, 0xAF, 0x0A, 0xD3]
        );
    }

    // ==================== Revision 2/3 ====================

    #[test]
    fn test_empty_user_password_opens_owner_restricted_file() {
        let doc_id = b"0123456789abcdef";
        let dict = build_rc4_encrypt_dict("", "owner-secret", 2, 40, doc_id);
        let handler = create_security_handler(&dict, doc_id, "").unwrap();

        // Round-trip one string through a per-object key.
        let plain = b"confidential paragraph";
        let file_key = authenticate_rc4(&dict, doc_id, "", 2, 5, true).unwrap();
        let key = object_key(&file_key, 7, 0, false);
        let cipher = Arcfour::new(&key).process(plain);
        assert_eq!(handler.decrypt_string(7, 0, &cipher), plain);
    }

    #[test]
    fn test_owner_password_authenticates() {
        let doc_id = b"0123456789abcdef";
        let dict = build_rc4_encrypt_dict("user-pw", "owner-secret", 2, 40, doc_id);
        assert!(create_security_handler(&dict, doc_id, "owner-secret").is_ok());
    }

    #[test]
    fn test_unknown_user_password_fails_with_encryption_category() {
        let doc_id = b"0123456789abcdef";
        let dict = build_rc4_encrypt_dict("user-pw", "owner-secret", 2, 40, doc_id);
        let err = create_security_handler(&dict, doc_id, "").unwrap_err();
        assert_eq!(err.category(), "unsupported-encryption");
        let err = create_security_handler(&dict, doc_id, "wrong-guess").unwrap_err();
        assert_eq!(err.category(), "unsupported-encryption");
    }

    #[test]
    fn test_revision3_128bit_roundtrip() {
        let doc_id = b"fedcba9876543210";
        let dict = build_rc4_encrypt_dict("", "owner", 3, 128, doc_id);
        let handler = create_security_handler(&dict, doc_id, "").unwrap();

        let plain = b"longer document body text for the 128-bit case";
        let file_key = authenticate_rc4(&dict, doc_id, "", 3, 16, true).unwrap();
        let key = object_key(&file_key, 12, 0, false);
        let cipher = Arcfour::new(&key).process(plain);
        assert_eq!(handler.decrypt_stream(12, 0, &cipher), plain);
    }

    #[test]
    fn test_correct_user_password_authenticates() {
        let doc_id = b"0123456789abcdef";
        let dict = build_rc4_encrypt_dict("user-pw", "owner", 3, 128, doc_id);
        assert!(create_security_handler(&dict, doc_id, "user-pw").is_ok());
    }

    // ==================== Revision 4 (AES-128) ====================

    fn build_aesv2_encrypt_dict(user_pw: &str, owner_pw: &str, doc_id: &[u8]) -> Dict {
        let mut dict = build_rc4_encrypt_dict(user_pw, owner_pw, 4, 128, doc_id);
        dict.insert("V".into(), Object::Integer(4));
        let mut stdcf = Dict::new();
        stdcf.insert("CFM".into(), Object::Name("AESV2".into()));
        let mut cf = Dict::new();
        cf.insert("StdCF".into(), Object::Dict(stdcf));
        dict.insert("CF".into(), Object::Dict(cf));
        dict.insert("StmF".into(), Object::Name("StdCF".into()));
        dict.insert("StrF".into(), Object::Name("StdCF".into()));
        dict
    }

    #[test]
    fn test_aes128_crypt_filter_roundtrip() {
        let doc_id = b"aes-doc-id-bytes";
        let dict = build_aesv2_encrypt_dict("", "owner", doc_id);
        let handler = create_security_handler(&dict, doc_id, "").unwrap();

        let plain = b"AES encrypted stream content";
        let file_key = authenticate_rc4(&dict, doc_id, "", 4, 16, true).unwrap();
        let key = object_key(&file_key, 3, 0, true);
        let iv = [7u8; 16];
        let mut cipher = iv.to_vec();
        cipher.extend(aes_cbc_encrypt_128(&key, &iv, &pkcs7_pad(plain)));
        assert_eq!(handler.decrypt_stream(3, 0, &cipher), plain);
    }

    #[test]
    fn test_identity_string_filter_passes_through() {
        let doc_id = b"aes-doc-id-bytes";
        let mut dict = build_aesv2_encrypt_dict("", "owner", doc_id);
        dict.insert("StrF".into(), Object::Name("Identity".into()));
        let handler = create_security_handler(&dict, doc_id, "").unwrap();
        assert_eq!(handler.decrypt_string(1, 0, b"as-is"), b"as-is");
    }

    // ==================== Revision 6 (AES-256) ====================

    #[test]
    fn test_aes256_r6_user_password_roundtrip() {
        let file_key: Vec<u8> = (0u8..32).collect();
        let validation_salt = [1u8; 8];
        let key_salt = [2u8; 8];

        let mut u = Aes256Handler::hash_r6(b"", &validation_salt, b"");
        u.extend_from_slice(&validation_salt);
        u.extend_from_slice(&key_salt);
        let intermediate = Aes256Handler::hash_r6(b"", &key_salt, b"");
        let ue = aes_cbc_encrypt_256(&intermediate, &[0u8; 16], &file_key);

        let mut dict = Dict::new();
        dict.insert("Filter".into(), Object::Name("Standard".into()));
        dict.insert("V".into(), Object::Integer(5));
        dict.insert("R".into(), Object::Integer(6));
        dict.insert("O".into(), Object::String(vec![0u8; 48]));
        dict.insert("OE".into(), Object::String(vec![0u8; 32]));
        dict.insert("U".into(), Object::String(u));
        dict.insert("UE".into(), Object::String(ue));
        dict.insert("P".into(), Object::Integer(-4));

        let handler = create_security_handler(&dict, b"", "").unwrap();

        let plain = b"top half of an encrypted page";
        let iv = [9u8; 16];
        let mut cipher = iv.to_vec();
        cipher.extend(aes_cbc_encrypt_256(&file_key, &iv, &pkcs7_pad(plain)));
        assert_eq!(handler.decrypt_stream(1, 0, &cipher), plain);
    }

    #[test]
    fn test_aes256_wrong_password_rejected() {
        let validation_salt = [1u8; 8];
        let key_salt = [2u8; 8];
        let mut u = Aes256Handler::hash_r6(b"right", &validation_salt, b"");
        u.extend_from_slice(&validation_salt);
        u.extend_from_slice(&key_salt);

        let mut dict = Dict::new();
        dict.insert("Filter".into(), Object::Name("Standard".into()));
        dict.insert("V".into(), Object::Integer(5));
        dict.insert("R".into(), Object::Integer(6));
        dict.insert("O".into(), Object::String(vec![0u8; 48]));
        dict.insert("OE".into(), Object::String(vec![0u8; 32]));
        dict.insert("U".into(), Object::String(u));
        dict.insert("UE".into(), Object::String(vec![0u8; 32]));
        dict.insert("P".into(), Object::Integer(-4));

        let err = create_security_handler(&dict, b"", "wrong").unwrap_err();
        assert_eq!(err.category(), "unsupported-encryption");
    }

    // ==================== Scheme detection ====================

    #[test]
    fn test_non_standard_filter_unsupported() {
        let mut dict = Dict::new();
        dict.insert("Filter".into(), Object::Name("Custom.PKI".into()));
        let err = create_security_handler(&dict, b"", "").unwrap_err();
        assert!(matches!(err, Error::UnsupportedEncryption(_)));
        assert!(err.to_string().contains("Custom.PKI"));
    }

    #[test]
    fn test_unknown_revision_unsupported() {
        let mut dict = Dict::new();
        dict.insert("Filter".into(), Object::Name("Standard".into()));
        dict.insert("V".into(), Object::Integer(9));
        dict.insert("R".into(), Object::Integer(9));
        let err = create_security_handler(&dict, b"", "").unwrap_err();
        assert_eq!(err.category(), "unsupported-encryption");
        assert!(err.to_string().contains("V=9"));
    }

    #[test]
    fn test_pkcs7_stripping() {
        assert_eq!(strip_pkcs7(vec![b'a', b'b', 2, 2]), vec![b'a', b'b']);
        // Invalid padding passes through untouched.
        assert_eq!(strip_pkcs7(vec![b'a', b'b', 9, 2]), vec![b'a', b'b', 9, 2]);
    }
}
