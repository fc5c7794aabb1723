use super::{Block, Transaction, TransactionOutput};
use crate::config;
use crate::error::{BtcError, Result};
use crate::sha256::Hash;
use crate::util::{MerkleRoot, Saveable};
use crate::U256;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::io::{Error as IoError, ErrorKind as IoErrorKind, Read, Result as IoResult, Write};
use tracing::debug;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Blockchain {
    utxos: HashMap<Hash, (bool, TransactionOutput)>,
    target: U256,
    blocks: Vec<Block>,
    #[serde(default)]
    mempool: Vec<(DateTime<Utc>, Transaction)>,
}

impl Blockchain {
    pub fn new() -> Self {
        Blockchain {
            utxos: HashMap::new(),
            blocks: vec![],
            target: config::min_target(),
            mempool: vec![],
        }
    }

    pub fn utxos(&self) -> &HashMap<Hash, (bool, TransactionOutput)> {
        &self.utxos
    }

    pub fn target(&self) -> U256 {
        self.target
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn block_height(&self) -> u64 {
        self.blocks.len() as u64
    }

    pub fn mempool(&self) -> &[(DateTime<Utc>, Transaction)] {
        &self.mempool
    }

    /// Rebuilds the UTXO set from scratch by replaying every block. Safe to
    /// call repeatedly: the result depends only on `blocks`.
    pub fn rebuild_utxos(&mut self) {
        self.utxos.clear();
        for block in &self.blocks {
            for transaction in &block.transactions {
                for input in &transaction.inputs {
                    self.utxos.remove(&input.prev_transaction_output_hash);
                }

                for output in transaction.outputs.iter() {
                    self.utxos.insert(output.hash(), (false, output.clone()));
                }
            }
        }
    }

    /// Adds a transaction to the mempool after validation.
    ///
    /// Implements first-fit replace-by-fee: if a referenced UTXO is already
    /// marked by another mempool transaction, that transaction is evicted
    /// and its reservations released before this one is admitted.
    pub fn add_to_mempool(&mut self, transaction: Transaction) -> Result<()> {
        let mut known_inputs: HashSet<Hash> = HashSet::new();
        for input in &transaction.inputs {
            if !self.utxos.contains_key(&input.prev_transaction_output_hash) {
                return Err(BtcError::invalid_transaction(
                    "referenced UTXO does not exist",
                ));
            }
            if known_inputs.contains(&input.prev_transaction_output_hash) {
                return Err(BtcError::invalid_transaction(
                    "duplicate input within transaction",
                ));
            }
            known_inputs.insert(input.prev_transaction_output_hash);
        }

        for input in &transaction.inputs {
            if let Some((true, _)) = self.utxos.get(&input.prev_transaction_output_hash) {
                // This UTXO is already reserved - find the mempool transaction
                // whose output it is, and displace it.
                let referencing_transaction =
                    self.mempool.iter().enumerate().find(|(_, (_, tx))| {
                        tx.outputs
                            .iter()
                            .any(|output| output.hash() == input.prev_transaction_output_hash)
                    });

                if let Some((idx, (_, referencing_transaction))) = referencing_transaction {
                    for input in &referencing_transaction.inputs {
                        self.utxos
                            .entry(input.prev_transaction_output_hash)
                            .and_modify(|(marked, _)| {
                                *marked = false;
                            });
                    }
                    self.mempool.remove(idx);
                } else {
                    self.utxos
                        .entry(input.prev_transaction_output_hash)
                        .and_modify(|(marked, _)| {
                            *marked = false;
                        });
                }
            }
        }

        let all_inputs = transaction
            .inputs
            .iter()
            .map(|input| {
                self.utxos
                    .get(&input.prev_transaction_output_hash)
                    .expect("input existence was validated above")
                    .1
                    .value
            })
            .sum::<u64>();
        let all_outputs = transaction.outputs.iter().map(|output| output.value).sum::<u64>();

        if all_inputs < all_outputs {
            debug!("rejecting mempool transaction: inputs are lower than outputs");
            return Err(BtcError::invalid_transaction(
                "input sum is lower than output sum",
            ));
        }

        for input in &transaction.inputs {
            self.utxos
                .entry(input.prev_transaction_output_hash)
                .and_modify(|(marked, _)| {
                    *marked = true;
                });
        }

        self.mempool.push((Utc::now(), transaction));

        // Highest fee first. Recomputed on every insertion; fine at this scale.
        self.mempool.sort_by_key(|(_, tx)| {
            let all_inputs = tx
                .inputs
                .iter()
                .map(|input| {
                    self.utxos
                        .get(&input.prev_transaction_output_hash)
                        .unwrap()
                        .1
                        .value
                })
                .sum::<u64>();
            let all_outputs = tx.outputs.iter().map(|output| output.value).sum::<u64>();
            std::cmp::Reverse(all_inputs - all_outputs)
        });
        Ok(())
    }

    /// Tries to append `block`. Returns an error, leaving state unchanged,
    /// if the block fails any consensus check.
    pub fn add_block(&mut self, block: Block) -> Result<()> {
        if self.blocks.is_empty() {
            // Genesis is taken on trust: only the prev-hash linkage is checked.
            if block.header.prev_block_hash != Hash::zero() {
                return Err(BtcError::invalid_block("genesis block must link to the zero hash"));
            }
        } else {
            let last_block = self.blocks.last().unwrap();
            if block.header.prev_block_hash != last_block.hash() {
                return Err(BtcError::invalid_block("prev_block_hash does not match the chain tip"));
            }
            if !block.header.hash().matches_target(block.header.target) {
                return Err(BtcError::invalid_block("block hash does not satisfy its target"));
            }

            let calculated_merkle_root = MerkleRoot::calculate(&block.transactions);
            if calculated_merkle_root != block.header.merkle_root {
                return Err(BtcError::InvalidMerkleRoot);
            }

            if block.header.timestamp <= last_block.header.timestamp {
                return Err(BtcError::invalid_block("timestamp does not advance past the chain tip"));
            }

            block.verify_transactions(self.block_height(), &self.utxos)?;
        }

        let block_transactions: HashSet<_> =
            block.transactions.iter().map(|tx| tx.hash()).collect();
        self.mempool
            .retain(|(_, tx)| !block_transactions.contains(&tx.hash()));
        self.blocks.push(block);
        self.try_adjust_target();
        Ok(())
    }

    /// Recomputes `target` every `DIFFICULTY_UPDATE_INTERVAL` blocks so that
    /// the observed time over the interval tracks `IDEAL_BLOCK_TIME`,
    /// clamped to at most a 4x swing and never above `MIN_TARGET`.
    pub fn try_adjust_target(&mut self) {
        if self.blocks.is_empty() {
            return;
        }

        let interval = config::difficulty_update_interval() as usize;
        if self.blocks.len() % interval != 0 {
            return;
        }

        let start_time = self.blocks[self.blocks.len() - interval].header.timestamp;
        let end_time = self.blocks.last().unwrap().header.timestamp;
        let time_diff = end_time - start_time;
        let time_diff_seconds = time_diff.num_seconds();

        let target_seconds = config::ideal_block_time() * config::difficulty_update_interval();

        let new_target = BigDecimal::parse_bytes(self.target.to_string().as_bytes(), 10)
            .expect("target formats as a base-10 integer")
            * (BigDecimal::from(time_diff_seconds) / BigDecimal::from(target_seconds));

        let new_target_str = new_target
            .to_string()
            .split('.')
            .next()
            .expect("BigDecimal::to_string always contains a decimal point")
            .to_owned();
        let new_target: U256 =
            U256::from_str_radix(&new_target_str, 10).expect("retarget result fits in 256 bits");

        let new_target = if new_target < self.target / 4 {
            self.target / 4
        } else if new_target > self.target * 4 {
            self.target * 4
        } else {
            new_target
        };

        self.target = new_target.min(config::min_target());
    }

    /// Evicts mempool entries older than `MAX_MEMPOOL_TRANSACTION_AGE`,
    /// unmarking the UTXOs they had reserved.
    pub fn cleanup_mempool(&mut self) {
        let now = Utc::now();
        let mut utxo_hashes_to_unmark: Vec<Hash> = vec![];
        let max_age = chrono::Duration::seconds(config::max_mempool_transaction_age() as i64);
        self.mempool.retain(|(timestamp, transaction)| {
            if now - *timestamp > max_age {
                utxo_hashes_to_unmark.extend(
                    transaction
                        .inputs
                        .iter()
                        .map(|input| input.prev_transaction_output_hash),
                );
                false
            } else {
                true
            }
        });
        for hash in utxo_hashes_to_unmark {
            self.utxos.entry(hash).and_modify(|(marked, _)| {
                *marked = false;
            });
        }
    }

    pub fn calculate_block_reward(&self) -> u64 {
        let halvings = self.block_height() / config::halving_interval();
        (config::initial_reward() * 10u64.pow(8)) >> halvings
    }
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Saveable for Blockchain {
    fn load<I: Read>(reader: I) -> IoResult<Self> {
        ciborium::de::from_reader(reader)
            .map_err(|_| IoError::new(IoErrorKind::InvalidData, "Failed to deserialize Blockchain"))
    }

    fn save<O: Write>(&self, writer: O) -> IoResult<()> {
        ciborium::ser::into_writer(self, writer)
            .map_err(|_| IoError::new(IoErrorKind::InvalidData, "Failed to serialize Blockchain"))
    }
}
