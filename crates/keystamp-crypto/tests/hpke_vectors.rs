//! RFC 9180 Appendix A.3.1 test vector
//!
//! DHKEM(P-256, HKDF-SHA256), HKDF-SHA256, AES-128-GCM, base mode. The
//! ephemeral and recipient key pairs are derived from the published `ikmE`
//! and `ikmR`, so every intermediate value is checked byte for byte.

use keystamp_crypto::hpke::{AeadId, CipherSuite, KdfId, KemId};

fn hex(s: &str) -> Vec<u8> {
    hex::decode(s).unwrap()
}

const INFO: &str = "4f6465206f6e2061204772656369616e2055726e";
const IKM_E: &str = "4270e54ffd08d79d5928020af4686d8f6b7d35dbe470265f1f5aa22816ce860e";
const IKM_R: &str = "668b37171f1072f3cf12ea8a236a45df23fc13b82af3609ad1e354f6ef817550";
const SK_RM: &str = "f3ce7fdae57e1a310d87f1ebbde6f328be0a99cdbcadf4d6589cf29de4b8ffd2";
const PK_RM: &str = "04fe8c19ce0905191ebc298a9245792531f26f0cece2460639e8bc39cb7f706a826a779b4cf969b8a0e539c7f62fb3d30ad6aa8f80e30f1d128aafd68a2ce72ea0";
const ENC: &str = "04a92719c6195d5085104f469a8b9814d5838ff72b60501e2c4466e5e67b325ac98536d7b61a1af4b78e5b7f951c0900be863c403ce65c9bfcb9382657222d18c4";
const PT: &str = "4265617574792069732074727574682c20747275746820626561757479";

// (sequence number, aad, ciphertext)
const ENCRYPTIONS: [(u64, &str, &str); 2] = [
    (
        0,
        "436f756e742d30",
        "5ad590bb8baa577f8619db35a36311226a896e7342a6d836d8b7bcd2f20b6c7f9076ac232e3ab2523f39513434",
    ),
    (
        1,
        "436f756e742d31",
        "fa6f037b47fc21826b610172ca9637e82d6e5801eb31cbd3748271affd4ecb06646e0329cbdf3c3cd655b28e82",
    ),
];

fn suite() -> CipherSuite {
    CipherSuite::new(KemId::DhKemP256, KdfId::HkdfSha256, AeadId::Aes128Gcm)
}

#[test]
fn recipient_key_pair_from_ikm() {
    let pair = suite().kem().derive_key_pair(&hex(IKM_R)).unwrap();
    assert_eq!(pair.private_key.as_bytes(), hex(SK_RM));
    assert_eq!(pair.public_key.as_bytes(), hex(PK_RM));
}

#[test]
fn sender_produces_published_ciphertexts() {
    let suite = suite();
    let recipient = suite.kem().derive_key_pair(&hex(IKM_R)).unwrap();

    let mut sender = suite
        .create_sender_context_with_ephemeral_ikm(&recipient.public_key, &hex(INFO), &hex(IKM_E))
        .unwrap();
    assert_eq!(sender.enc(), hex(ENC));

    for (seq, aad, ct) in ENCRYPTIONS {
        assert_eq!(sender.seq(), seq);
        assert_eq!(sender.seal(&hex(PT), &hex(aad)).unwrap(), hex(ct));
    }
}

#[test]
fn recipient_opens_published_ciphertexts() {
    let suite = suite();
    let recipient = suite.kem().derive_key_pair(&hex(IKM_R)).unwrap();

    let mut context =
        suite.create_recipient_context(&recipient.private_key, &hex(ENC), &hex(INFO)).unwrap();

    for (seq, aad, ct) in ENCRYPTIONS {
        assert_eq!(context.seq(), seq);
        assert_eq!(context.open(&hex(ct), &hex(aad)).unwrap(), hex(PT));
    }
}

#[test]
fn out_of_order_open_fails_without_advancing() {
    let suite = suite();
    let recipient = suite.kem().derive_key_pair(&hex(IKM_R)).unwrap();
    let mut context =
        suite.create_recipient_context(&recipient.private_key, &hex(ENC), &hex(INFO)).unwrap();

    let (_, aad, ct) = ENCRYPTIONS[1];
    assert!(context.open(&hex(ct), &hex(aad)).is_err());
    assert_eq!(context.seq(), 0);

    let (_, aad, ct) = ENCRYPTIONS[0];
    assert_eq!(context.open(&hex(ct), &hex(aad)).unwrap(), hex(PT));
}

#[test]
fn imported_raw_private_key_decapsulates() {
    let suite = suite();
    let private_key = suite.kem().deserialize_private_key(&hex(SK_RM)).unwrap();

    let (_, aad, ct) = ENCRYPTIONS[0];
    let plaintext = suite.open(&private_key, &hex(ENC), &hex(INFO), &hex(aad), &hex(ct)).unwrap();
    assert_eq!(plaintext, hex(PT));
}
