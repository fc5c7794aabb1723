use crate::config;
use crate::error::{BtcError, Result};
use crate::sha256::Hash;
use crate::types::transaction::{Transaction, TransactionOutput};
use crate::util::{MerkleRoot, Saveable};
use crate::U256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Error as IoError, ErrorKind as IoErrorKind};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(header: BlockHeader, transactions: Vec<Transaction>) -> Self {
        Self {
            header,
            transactions,
        }
    }

    pub fn hash(&self) -> Hash {
        Hash::hash(self)
    }

    /// Validates every non-coinbase transaction and the coinbase subsidy,
    /// against the UTXO set as it exists before this block is applied.
    pub fn verify_transactions(
        &self,
        predicted_block_height: u64,
        utxos: &HashMap<Hash, (bool, TransactionOutput)>,
    ) -> Result<()> {
        if self.transactions.is_empty() {
            return Err(BtcError::invalid_block("block has no transactions"));
        }

        self.verify_coinbase_transaction(predicted_block_height, utxos)?;

        let mut spent: HashMap<Hash, TransactionOutput> = HashMap::new();

        for transaction in self.transactions.iter().skip(1) {
            let input_value: u64 = transaction
                .inputs
                .iter()
                .map(|input| {
                    let Some(prev_output) = utxos.get(&input.prev_transaction_output_hash) else {
                        return Err(BtcError::invalid_transaction(
                            "referenced UTXO does not exist",
                        ));
                    };

                    if spent.contains_key(&input.prev_transaction_output_hash) {
                        return Err(BtcError::invalid_transaction(
                            "UTXO spent twice within this block",
                        ));
                    }

                    if !input
                        .signature
                        .verify(&input.prev_transaction_output_hash, &prev_output.1.pubkey)
                    {
                        return Err(BtcError::InvalidSignature);
                    }

                    spent.insert(input.prev_transaction_output_hash, prev_output.1.clone());
                    Ok(prev_output.1.value)
                })
                .collect::<Result<Vec<_>>>()?
                .iter()
                .sum();

            let output_value: u64 = transaction.outputs.iter().map(|output| output.value).sum();

            if input_value < output_value {
                return Err(BtcError::invalid_transaction(
                    "input sum is lower than output sum",
                ));
            }
        }

        Ok(())
    }

    fn verify_coinbase_transaction(
        &self,
        predicted_block_height: u64,
        utxos: &HashMap<Hash, (bool, TransactionOutput)>,
    ) -> Result<()> {
        let Some(coinbase_transaction) = self.transactions.first() else {
            return Err(BtcError::invalid_block("block has no coinbase transaction"));
        };

        if !coinbase_transaction.inputs.is_empty() {
            return Err(BtcError::invalid_transaction(
                "coinbase transaction must have no inputs",
            ));
        }
        if coinbase_transaction.outputs.is_empty() {
            return Err(BtcError::invalid_transaction(
                "coinbase transaction must have at least one output",
            ));
        }

        let miner_fees = self.calculate_miner_fees(utxos)?;
        let block_reward = self.calculate_block_reward(predicted_block_height);
        let total_coinbase_outputs: u64 = coinbase_transaction
            .outputs
            .iter()
            .map(|output| output.value)
            .sum();

        if total_coinbase_outputs != block_reward + miner_fees {
            return Err(BtcError::invalid_transaction(
                "coinbase output sum does not match reward plus fees",
            ));
        }

        Ok(())
    }

    fn calculate_block_reward(&self, predicted_block_height: u64) -> u64 {
        let halvings = predicted_block_height / config::halving_interval();
        (config::initial_reward() * 10u64.pow(8)) >> halvings
    }

    /// Sums `Σ inputs.value - Σ outputs.value` over every non-coinbase
    /// transaction, rejecting a block that spends or produces the same
    /// UTXO hash twice.
    pub fn calculate_miner_fees(
        &self,
        utxos: &HashMap<Hash, (bool, TransactionOutput)>,
    ) -> Result<u64> {
        let mut inputs: HashMap<Hash, TransactionOutput> = HashMap::new();
        let mut outputs: HashMap<Hash, TransactionOutput> = HashMap::new();

        for transaction in self.transactions.iter().skip(1) {
            for input in &transaction.inputs {
                let Some(prev_output) = utxos.get(&input.prev_transaction_output_hash) else {
                    return Err(BtcError::invalid_transaction(
                        "referenced UTXO does not exist",
                    ));
                };

                if inputs.contains_key(&input.prev_transaction_output_hash) {
                    return Err(BtcError::invalid_transaction(
                        "UTXO spent twice within this block",
                    ));
                }

                inputs.insert(input.prev_transaction_output_hash, prev_output.1.clone());
            }

            for output in &transaction.outputs {
                let hash = output.hash();
                if outputs.contains_key(&hash) {
                    return Err(BtcError::invalid_transaction(
                        "duplicate output produced within this block",
                    ));
                }

                outputs.insert(hash, output.clone());
            }
        }

        let input_value: u64 = inputs.values().map(|input| input.value).sum();
        let output_value: u64 = outputs.values().map(|output| output.value).sum();

        Ok(input_value - output_value)
    }
}

impl Saveable for Block {
    fn load<I: std::io::Read>(reader: I) -> std::io::Result<Self> {
        ciborium::de::from_reader(reader)
            .map_err(|_| IoError::new(IoErrorKind::InvalidData, "Failed to deserialize block"))
    }
    fn save<O: std::io::Write>(&self, writer: O) -> std::io::Result<()> {
        ciborium::ser::into_writer(self, writer)
            .map_err(|_| IoError::new(IoErrorKind::InvalidData, "Failed to serialize block"))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct BlockHeader {
    pub timestamp: DateTime<Utc>,
    pub nonce: u64,
    pub prev_block_hash: Hash,
    pub merkle_root: MerkleRoot,
    pub target: U256,
}

impl BlockHeader {
    pub fn new(
        timestamp: DateTime<Utc>,
        nonce: u64,
        prev_block_hash: Hash,
        merkle_root: MerkleRoot,
        target: U256,
    ) -> Self {
        Self {
            timestamp,
            nonce,
            prev_block_hash,
            merkle_root,
            target,
        }
    }

    pub fn hash(&self) -> Hash {
        Hash::hash(self)
    }

    /// Tries up to `steps` nonce increments looking for a hash that
    /// satisfies `target`. Returns `true` as soon as one is found, `false`
    /// if the burst is exhausted first (the caller should yield and retry).
    /// Nonce wraparound resets the nonce and refreshes the timestamp, which
    /// also changes the header hash.
    pub fn mine(&mut self, steps: usize) -> bool {
        if self.hash().matches_target(self.target) {
            return true;
        }

        for _ in 0..steps {
            match self.nonce.checked_add(1) {
                Some(nonce) => self.nonce = nonce,
                None => {
                    self.nonce = 0;
                    self.timestamp = Utc::now();
                }
            }

            if self.hash().matches_target(self.target) {
                return true;
            }
        }

        false
    }
}
