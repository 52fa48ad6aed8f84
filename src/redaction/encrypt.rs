//! PDF output encryption (standard security handler, revision 3, RC4-128).
//!
//! Redacted PDFs are encrypted with an empty user password, so any reader
//! opens them, but the permission flags deny modification. Encryption runs
//! after verification: the verifier sees the exact content streams that get
//! encrypted here.

use lopdf::{Dictionary, Object, ObjectId};
use rc4::consts::U16;
use rc4::{Key, KeyInit, Rc4, StreamCipher};

use crate::error::{RedactError, Result};

/// Standard padding string applied to passwords (PDF 32000-1, 7.6.3.3).
const PAD: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01,
    0x08, 0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53,
    0x69, 0x7A,
];

const KEY_LEN: usize = 16;

/// What a reader may do with an encrypted document.
///
/// Bit positions follow the standard security handler's P entry.
#[derive(Debug, Clone, Copy)]
pub struct PdfPermissions {
    pub can_print: bool,
    pub can_modify: bool,
    pub can_copy: bool,
    pub can_annotate: bool,
    pub can_fill_forms: bool,
    pub can_extract_accessible: bool,
    pub can_assemble: bool,
    pub can_print_high_quality: bool,
}

impl PdfPermissions {
    /// The policy applied to redacted output: view, print, and copy only.
    ///
    /// Accessible extraction stays on so screen readers keep working;
    /// everything that would alter the document is denied.
    pub fn redacted_output() -> Self {
        Self {
            can_print: true,
            can_modify: false,
            can_copy: true,
            can_annotate: false,
            can_fill_forms: false,
            can_extract_accessible: true,
            can_assemble: false,
            can_print_high_quality: false,
        }
    }

    /// Encodes the flags as the signed 32-bit P entry.
    pub fn to_p_value(self) -> i32 {
        let mut p: u32 = 0xFFFF_F0C0;
        if self.can_print {
            p |= 1 << 2;
        }
        if self.can_modify {
            p |= 1 << 3;
        }
        if self.can_copy {
            p |= 1 << 4;
        }
        if self.can_annotate {
            p |= 1 << 5;
        }
        if self.can_fill_forms {
            p |= 1 << 8;
        }
        if self.can_extract_accessible {
            p |= 1 << 9;
        }
        if self.can_assemble {
            p |= 1 << 10;
        }
        if self.can_print_high_quality {
            p |= 1 << 11;
        }
        p as i32
    }
}

fn rc4_apply(key: &[u8; KEY_LEN], data: &mut [u8]) {
    let mut cipher = Rc4::<U16>::new(Key::<U16>::from_slice(key));
    cipher.apply_keystream(data);
}

/// Pads or truncates a password to the fixed 32-byte form.
fn pad_password(password: &str) -> [u8; 32] {
    let bytes = password.as_bytes();
    let take = bytes.len().min(32);
    let mut padded = [0u8; 32];
    padded[..take].copy_from_slice(&bytes[..take]);
    padded[take..].copy_from_slice(&PAD[..32 - take]);
    padded
}

/// Computes the O entry from the owner password (revision 3).
///
/// An empty owner password falls back to the user password, which for our
/// outputs is itself empty.
fn compute_owner_value(owner_password: &str, user_password: &str) -> [u8; 32] {
    let basis = if owner_password.is_empty() {
        user_password
    } else {
        owner_password
    };

    let mut digest = md5::compute(pad_password(basis)).0;
    for _ in 0..50 {
        digest = md5::compute(digest).0;
    }
    let rc4_key = digest;

    let mut value = pad_password(user_password);
    rc4_apply(&rc4_key, &mut value);
    for i in 1u8..=19 {
        let mut pass_key = [0u8; KEY_LEN];
        for (k, r) in pass_key.iter_mut().zip(rc4_key.iter()) {
            *k = r ^ i;
        }
        rc4_apply(&pass_key, &mut value);
    }
    value
}

/// Derives the file encryption key (revision 3, 128-bit).
fn compute_file_key(user_password: &str, owner_value: &[u8; 32], p: i32, doc_id: &[u8]) -> [u8; KEY_LEN] {
    let mut ctx = md5::Context::new();
    ctx.consume(pad_password(user_password));
    ctx.consume(owner_value);
    ctx.consume((p as u32).to_le_bytes());
    ctx.consume(doc_id);
    let mut digest = ctx.compute().0;
    for _ in 0..50 {
        digest = md5::compute(digest).0;
    }
    digest
}

/// Computes the U entry (revision 3).
fn compute_user_value(file_key: &[u8; KEY_LEN], doc_id: &[u8]) -> [u8; 32] {
    let mut ctx = md5::Context::new();
    ctx.consume(PAD);
    ctx.consume(doc_id);
    let mut block = ctx.compute().0;

    rc4_apply(file_key, &mut block);
    for i in 1u8..=19 {
        let mut pass_key = [0u8; KEY_LEN];
        for (k, f) in pass_key.iter_mut().zip(file_key.iter()) {
            *k = f ^ i;
        }
        rc4_apply(&pass_key, &mut block);
    }

    let mut value = [0u8; 32];
    value[..16].copy_from_slice(&block);
    value
}

/// Derives the RC4 key for one object.
fn object_key(file_key: &[u8; KEY_LEN], id: ObjectId) -> [u8; KEY_LEN] {
    let (num, gen) = id;
    let mut ctx = md5::Context::new();
    ctx.consume(file_key);
    ctx.consume(&num.to_le_bytes()[..3]);
    ctx.consume(&gen.to_le_bytes()[..2]);
    ctx.compute().0
}

/// Encrypts every string and stream payload reachable from an object.
fn encrypt_object(object: &mut Object, key: &[u8; KEY_LEN]) {
    match object {
        Object::String(bytes, _) => rc4_apply(key, bytes),
        Object::Array(items) => {
            for item in items {
                encrypt_object(item, key);
            }
        }
        Object::Dictionary(dict) => encrypt_dictionary(dict, key),
        Object::Stream(stream) => {
            encrypt_dictionary(&mut stream.dict, key);
            rc4_apply(key, &mut stream.content);
        }
        _ => {}
    }
}

fn encrypt_dictionary(dict: &mut Dictionary, key: &[u8; KEY_LEN]) {
    let keys: Vec<Vec<u8>> = dict.iter().map(|(k, _)| k.clone()).collect();
    for k in keys {
        if let Ok(value) = dict.get_mut(&k) {
            encrypt_object(value, key);
        }
    }
}

/// Encrypts a serialized PDF with an empty user password and restrictive
/// permissions, returning the re-serialized document.
pub(crate) fn encrypt_pdf(plain: &[u8], owner_password: &str) -> Result<Vec<u8>> {
    let mut doc = lopdf::Document::load_mem(plain).map_err(|e| RedactError::Application {
        reason: format!("re-parsing redacted pdf failed: {e}"),
    })?;

    let doc_id = md5::compute(plain).0;
    let permissions = PdfPermissions::redacted_output();
    let p = permissions.to_p_value();

    let owner_value = compute_owner_value(owner_password, "");
    let file_key = compute_file_key("", &owner_value, p, &doc_id);
    let user_value = compute_user_value(&file_key, &doc_id);

    let ids: Vec<ObjectId> = doc.objects.keys().copied().collect();
    for id in ids {
        let key = object_key(&file_key, id);
        if let Some(object) = doc.objects.get_mut(&id) {
            encrypt_object(object, &key);
        }
    }

    let mut encrypt_dict = Dictionary::new();
    encrypt_dict.set("Filter", Object::Name(b"Standard".to_vec()));
    encrypt_dict.set("V", Object::Integer(2));
    encrypt_dict.set("R", Object::Integer(3));
    encrypt_dict.set("Length", Object::Integer(128));
    encrypt_dict.set("P", Object::Integer(p as i64));
    encrypt_dict.set(
        "O",
        Object::String(owner_value.to_vec(), lopdf::StringFormat::Hexadecimal),
    );
    encrypt_dict.set(
        "U",
        Object::String(user_value.to_vec(), lopdf::StringFormat::Hexadecimal),
    );
    let encrypt_id = doc.add_object(Object::Dictionary(encrypt_dict));

    let id_string = Object::String(doc_id.to_vec(), lopdf::StringFormat::Hexadecimal);
    doc.trailer.set(
        "ID",
        Object::Array(vec![id_string.clone(), id_string]),
    );
    doc.trailer.set("Encrypt", Object::Reference(encrypt_id));

    let mut out = Vec::new();
    doc.save_to(&mut out).map_err(|e| RedactError::Application {
        reason: format!("encrypted pdf serialization failed: {e}"),
    })?;
    Ok(out)
}
