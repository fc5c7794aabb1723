use crate::crypto::PublicKey;
use crate::types::{Block, Transaction, TransactionOutput};
use serde::{Deserialize, Serialize};
use std::io::{Error as IoError, ErrorKind, Read, Write};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Inbound messages above this size are refused before the receive buffer
/// is allocated, so a malicious peer cannot force an unbounded allocation
/// just by lying about a length prefix.
const MAX_MESSAGE_LENGTH: u64 = 64 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub enum Message {
    // Request: fetch all UTXOs belonging to a public key
    FetchUTXOs(PublicKey),
    // Response: list of UTXOs belonging to the public key, true if marked
    UTXOs(Vec<(TransactionOutput, bool)>),

    // Request: submit a transaction to the network
    SubmitTransaction(Transaction),
    // Broadcast: a new transaction
    NewTransaction(Transaction),

    // Request: ask the node to prepare an optimal template paying the public key
    FetchTemplate(PublicKey),
    // Response: a mining template
    Template(Block),

    // Request: ask whether a held template is still valid
    ValidateTemplate(Block),
    // Response: validity of the template
    TemplateValidity(bool),

    // Request: submit a mined block built from a template
    SubmitTemplate(Block),

    // Request: ask for the peers a node is connected to
    DiscoverNodes,
    // Response: list of peer addresses
    NodeList(Vec<String>),

    // Request: ask how many blocks ahead of `height` the node is
    AskDifference(u64),
    // Response: height difference
    Difference(i32),

    // Request: fetch the block at a given height
    FetchBlock(usize),

    // Broadcast: a new block
    NewBlock(Block),
}

impl Message {
    pub fn encode(&self) -> Result<Vec<u8>, IoError> {
        let mut bytes = Vec::new();
        ciborium::into_writer(self, &mut bytes)
            .map_err(|e| IoError::new(ErrorKind::InvalidData, e.to_string()))?;
        Ok(bytes)
    }

    pub fn decode(data: &[u8]) -> Result<Self, IoError> {
        ciborium::from_reader(data).map_err(|e| IoError::new(ErrorKind::InvalidData, e.to_string()))
    }

    pub fn send(&self, stream: &mut impl Write) -> Result<(), IoError> {
        let bytes = self.encode()?;
        let length = bytes.len() as u64;
        stream.write_all(&length.to_be_bytes())?;
        stream.write_all(&bytes)?;
        Ok(())
    }

    pub fn receive(stream: &mut impl Read) -> Result<Self, IoError> {
        let mut length_bytes = [0u8; 8];
        stream.read_exact(&mut length_bytes)?;
        let length = u64::from_be_bytes(length_bytes);
        if length > MAX_MESSAGE_LENGTH {
            return Err(IoError::new(
                ErrorKind::InvalidData,
                format!("message length {length} exceeds maximum {MAX_MESSAGE_LENGTH}"),
            ));
        }

        let mut data = vec![0u8; length as usize];
        stream.read_exact(&mut data)?;
        Self::decode(&data)
    }

    pub async fn send_async(&self, stream: &mut (impl AsyncWrite + Unpin)) -> Result<(), IoError> {
        let bytes = self.encode()?;
        let length = bytes.len() as u64;
        stream.write_all(&length.to_be_bytes()).await?;
        stream.write_all(&bytes).await?;
        Ok(())
    }

    pub async fn receive_async(stream: &mut (impl AsyncRead + Unpin)) -> Result<Self, IoError> {
        let mut length_bytes = [0u8; 8];
        stream.read_exact(&mut length_bytes).await?;
        let length = u64::from_be_bytes(length_bytes);
        if length > MAX_MESSAGE_LENGTH {
            return Err(IoError::new(
                ErrorKind::InvalidData,
                format!("message length {length} exceeds maximum {MAX_MESSAGE_LENGTH}"),
            ));
        }

        let mut data = vec![0u8; length as usize];
        stream.read_exact(&mut data).await?;
        Self::decode(&data)
    }
}
