mod common;

use common::{
    CfbBuilder, FLAG_ENCRYPTED, FLAG_WHICH_TBL_STM, hello_world_streams, hi_word_document, put_u32,
    set_flags,
};
use docbin::ole::doc::crypto::word95::Word95Key;
use docbin::ole::doc::{LoadOptions, Package};
use docbin::{Error, extract_text};

/// Encrypt a Word 95 stream, choosing a `lKey` under which every byte survives the cipher.
fn word95_encrypt(mut plain: Vec<u8>, password: &str) -> Vec<u8> {
    set_flags(&mut plain, FLAG_ENCRYPTED);
    for high in 1u32..=0xFFFF {
        let verifier = Word95Key::derive(password, high << 16).unwrap().verifier();
        let l_key = (high << 16) | u32::from(verifier);
        put_u32(&mut plain, 0x0E, l_key);

        let key = Word95Key::derive(password, l_key).unwrap();
        let mut cipher = plain.clone();
        key.apply(&mut cipher);
        let mut round_trip = cipher.clone();
        key.apply(&mut round_trip);
        if round_trip == plain {
            return cipher;
        }
    }
    panic!("no usable lKey");
}

fn word95_file(password: &str) -> Vec<u8> {
    CfbBuilder::new()
        .stream("WordDocument", word95_encrypt(hi_word_document(), password))
        .build()
}

#[test]
fn test_word95_decrypts_with_password() {
    let file = word95_file("secret");
    assert_eq!(extract_text(file, Some("secret")).unwrap(), "Hi");
}

#[test]
fn test_word95_requires_password() {
    let file = word95_file("secret");
    assert!(matches!(extract_text(file, None), Err(Error::PasswordRequired)));
}

#[test]
fn test_word95_wrong_password() {
    let file = word95_file("secret");
    assert!(matches!(
        extract_text(file, Some("Secret")),
        Err(Error::InvalidPassword)
    ));
}

#[cfg(feature = "encryption")]
mod word97 {
    use super::*;
    use docbin::ole::doc::crypto::RC4_HEADER_LEN;
    use docbin::ole::doc::crypto::word97::Word97Key;

    const DOC_ID: [u8; 16] = *b"docbin-test-id!!";
    const SALT: [u8; 16] = [0x5A; 16];

    /// Hello World under `1Table`, RC4-encrypted with `password`.
    fn word97_file(password: &str) -> Vec<u8> {
        let (mut doc, clear_table) = hello_world_streams(true);
        set_flags(&mut doc, FLAG_ENCRYPTED | FLAG_WHICH_TBL_STM);

        // Shift the table behind the encryption header
        let key = Word97Key::derive(password, &DOC_ID).unwrap();
        let (salt, salt_hash) = key.seal_verifier(&SALT);
        let mut header = vec![0u8; RC4_HEADER_LEN];
        header[0..2].copy_from_slice(&1u16.to_le_bytes());
        header[2..4].copy_from_slice(&1u16.to_le_bytes());
        header[4..20].copy_from_slice(&DOC_ID);
        header[20..36].copy_from_slice(&salt);
        header[36..52].copy_from_slice(&salt_hash);

        let mut table = header.clone();
        table.extend_from_slice(&clear_table);
        for offset in [0x1A2usize, 0x102, 0xFA] {
            let fc = u32::from_le_bytes(doc[offset..offset + 4].try_into().unwrap());
            let lcb = u32::from_le_bytes(doc[offset + 4..offset + 8].try_into().unwrap());
            if lcb != 0 {
                put_u32(&mut doc, offset, fc + RC4_HEADER_LEN as u32);
            }
        }

        let clear_fib = doc[..0x44].to_vec();
        key.apply(&mut doc);
        doc[..0x44].copy_from_slice(&clear_fib);
        key.apply(&mut table);
        table[..RC4_HEADER_LEN].copy_from_slice(&header);

        CfbBuilder::new()
            .stream("WordDocument", doc)
            .stream("1Table", table)
            .build()
    }

    #[test]
    fn test_word97_decrypts_with_password() {
        let file = word97_file("Password1");
        let package = Package::from_bytes(file).unwrap();
        let doc = package
            .document_with(&LoadOptions::default().with_password("Password1"))
            .unwrap();

        assert_eq!(doc.text(), "Hello World");
        assert!(doc.paragraphs().next().unwrap().runs()[0].properties().bold);
    }

    #[test]
    fn test_word97_single_altered_byte_fails() {
        let file = word97_file("Password1");
        assert!(matches!(
            extract_text(file, Some("Password2")),
            Err(Error::InvalidPassword)
        ));
    }

    #[test]
    fn test_word97_requires_password() {
        let file = word97_file("Password1");
        assert!(matches!(extract_text(file, None), Err(Error::PasswordRequired)));
    }

    #[test]
    fn test_cryptoapi_header_is_unsupported() {
        let (mut doc, mut table) = hello_world_streams(false);
        set_flags(&mut doc, FLAG_ENCRYPTED);
        table.splice(0..0, [2u8, 0, 2, 0]);
        let file = CfbBuilder::new()
            .stream("WordDocument", doc)
            .stream("0Table", table)
            .build();

        assert!(matches!(
            extract_text(file, Some("x")),
            Err(Error::Unsupported(_))
        ));
    }
}
