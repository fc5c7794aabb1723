use crate::sha256::Hash;
use crate::util::Saveable;
use ecdsa::{
    signature::{rand_core::OsRng, SignerMut, Verifier},
    Signature as ECDSASignature, SigningKey, VerifyingKey,
};
use k256::Secp256k1;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Signature(pub ECDSASignature<Secp256k1>);

impl Signature {
    pub fn sign_output(output_hash: &Hash, private_key: &mut PrivateKey) -> Self {
        let signature = private_key.0.sign(&output_hash.as_bytes());
        Signature(signature)
    }

    pub fn verify(&self, output_hash: &Hash, public_key: &PublicKey) -> bool {
        public_key
            .0
            .verify(&output_hash.as_bytes(), &self.0)
            .is_ok()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PublicKey(pub VerifyingKey<Secp256k1>);

impl Saveable for PublicKey {
    fn load<I: Read>(reader: I) -> std::io::Result<Self> {
        use spki::DecodePublicKey;
        let mut reader = std::io::BufReader::new(reader);
        let mut pem = String::new();
        reader.read_to_string(&mut pem)?;
        let key = VerifyingKey::<Secp256k1>::from_public_key_pem(&pem)
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidData, "invalid PEM"))?;
        Ok(PublicKey(key))
    }

    fn save<O: Write>(&self, writer: O) -> std::io::Result<()> {
        use spki::EncodePublicKey;
        let mut writer = std::io::BufWriter::new(writer);
        let pem = self
            .0
            .to_public_key_pem(Default::default())
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidData, "invalid key"))?;
        writer.write_all(pem.as_bytes())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PrivateKey(#[serde(with = "signkey_serde")] pub SigningKey<Secp256k1>);

impl PrivateKey {
    pub fn new_key() -> Self {
        Self(SigningKey::random(&mut OsRng))
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(*self.0.verifying_key())
    }
}

impl Default for PrivateKey {
    fn default() -> Self {
        Self::new_key()
    }
}

impl Saveable for PrivateKey {
    fn load<I: Read>(reader: I) -> std::io::Result<Self> {
        let mut reader = std::io::BufReader::new(reader);
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let signing_key = SigningKey::from_slice(&bytes)
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidData, "invalid key"))?;
        Ok(PrivateKey(signing_key))
    }

    fn save<O: Write>(&self, writer: O) -> std::io::Result<()> {
        let mut writer = std::io::BufWriter::new(writer);
        writer.write_all(&self.0.to_bytes())
    }
}

mod signkey_serde {
    use serde::Deserialize;

    pub fn serialize<S>(
        key: &super::SigningKey<super::Secp256k1>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&key.to_bytes())
    }

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<super::SigningKey<super::Secp256k1>, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        super::SigningKey::from_slice(&bytes).map_err(serde::de::Error::custom)
    }
}
