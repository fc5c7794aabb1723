#[cfg(test)]
mod transaction_tests {
    use crate::types::{Transaction, TransactionInput, TransactionOutput};
    use crate::crypto::PrivateKey;
    use crate::sha256::Hash;
    use uuid::Uuid;

    fn create_test_output(value: u64, private_key: &mut PrivateKey) -> TransactionOutput {
        TransactionOutput {
            value,
            unique_id: Uuid::new_v4(),
            pubkey: private_key.public_key(),
        }
    }

    fn create_test_input(output_hash: &Hash, private_key: &mut PrivateKey) -> TransactionInput {
        use crate::crypto::Signature;
        TransactionInput {
            prev_transaction_output_hash: *output_hash,
            signature: Signature::sign_output(output_hash, private_key),
        }
    }

    #[test]
    fn test_transaction_creation() {
        let mut private_key = PrivateKey::new_key();
        let output = create_test_output(1000, &mut private_key);
        let output_hash = output.hash();

        let transaction = Transaction::new(
            vec![],
            vec![output.clone()],
        );

        assert_eq!(transaction.outputs.len(), 1);
        assert_eq!(transaction.outputs[0].value, 1000);
        assert_eq!(transaction.outputs[0].hash(), output_hash);
    }

    #[test]
    fn test_transaction_hashing() {
        let mut private_key = PrivateKey::new_key();
        let output = create_test_output(1000, &mut private_key);

        let tx = Transaction::new(vec![], vec![output.clone()]);

        // Same transaction should produce same hash
        assert_eq!(tx.hash(), tx.hash());
    }
    
    #[test]
    fn test_transaction_different_hashes() {
        let mut private_key = PrivateKey::new_key();
        let output1 = create_test_output(1000, &mut private_key);
        let output2 = create_test_output(1000, &mut private_key);

        let tx1 = Transaction::new(vec![], vec![output1]);
        let tx2 = Transaction::new(vec![], vec![output2]);

        // Different transactions should produce different hashes
        // (due to unique IDs in outputs)
        assert_ne!(tx1.hash(), tx2.hash());
    }

    #[test]
    fn test_transaction_output_hashing() {
        let mut private_key = PrivateKey::new_key();
        let output = create_test_output(1000, &mut private_key);

        let hash1 = output.hash();
        let hash2 = output.hash();

        // Same output should always produce same hash
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_transaction_output_value() {
        let mut private_key = PrivateKey::new_key();
        let output = create_test_output(5000, &mut private_key);

        assert_eq!(output.value, 5000);
    }

    #[test]
    fn test_transaction_with_inputs() {
        let mut private_key = PrivateKey::new_key();
        let output = create_test_output(1000, &mut private_key);
        let output_hash = output.hash();

        let input = create_test_input(&output_hash, &mut private_key);

        let transaction = Transaction::new(
            vec![input],
            vec![create_test_output(800, &mut private_key)],
        );

        assert_eq!(transaction.inputs.len(), 1);
        assert_eq!(transaction.outputs.len(), 1);
    }
}

#[cfg(test)]
mod block_tests {
    use crate::types::{Block, BlockHeader, Transaction, TransactionOutput};
    use crate::crypto::PrivateKey;
    use crate::util::MerkleRoot;
    use chrono::Utc;
    use crate::config;
    use uuid::Uuid;
    
    fn create_test_output(value: u64, private_key: &mut PrivateKey) -> TransactionOutput {
        TransactionOutput {
            value,
            unique_id: Uuid::new_v4(),
            pubkey: private_key.public_key(),
        }
    }

    #[test]
    fn test_block_creation() {
        let mut private_key = PrivateKey::new_key();
        let output = create_test_output(1000, &mut private_key);
        let transaction = Transaction::new(vec![], vec![output]);

        let block = Block::new(
            BlockHeader::new(
                Utc::now(),
                0,
                crate::sha256::Hash::zero(),
                MerkleRoot::calculate(&vec![transaction.clone()]),
                config::min_target(),
            ),
            vec![transaction],
        );

        assert_eq!(block.transactions.len(), 1);
    }

    #[test]
    fn test_block_hashing() {
        let mut private_key = PrivateKey::new_key();
        let output = create_test_output(1000, &mut private_key);
        let transaction = Transaction::new(vec![], vec![output]);

        let block = Block::new(
            BlockHeader::new(
                Utc::now(),
                0,
                crate::sha256::Hash::zero(),
                MerkleRoot::calculate(&vec![transaction.clone()]),
                config::min_target(),
            ),
            vec![transaction],
        );

        // Same block should produce same hash
        assert_eq!(block.hash(), block.hash());
    }

    #[test]
    fn test_block_header_hash() {
        let mut private_key = PrivateKey::new_key();
        let output = create_test_output(1000, &mut private_key);
        let transaction = Transaction::new(vec![], vec![output]);

        let header = BlockHeader::new(
            Utc::now(),
            42,
            crate::sha256::Hash::zero(),
            MerkleRoot::calculate(&vec![transaction.clone()]),
            config::min_target(),
        );

        // Header hash should not be zero
        let hash = header.hash();
        assert_ne!(hash, crate::sha256::Hash::zero());
    }

    #[test]
    fn test_block_header_different_nonces_different_hash() {
        let mut private_key = PrivateKey::new_key();
        let output = create_test_output(1000, &mut private_key);
        let transaction = Transaction::new(vec![], vec![output]);

        let header1 = BlockHeader::new(
            Utc::now(),
            0,
            crate::sha256::Hash::zero(),
            MerkleRoot::calculate(&vec![transaction.clone()]),
            config::min_target(),
        );

        let header2 = BlockHeader::new(
            Utc::now(),
            1,  // Different nonce
            crate::sha256::Hash::zero(),
            MerkleRoot::calculate(&vec![transaction.clone()]),
            config::min_target(),
        );

        // Different nonces should produce different hashes
        assert_ne!(header1.hash(), header2.hash());
    }
}

#[cfg(test)]
mod blockchain_tests {
    use crate::types::{Blockchain, Block, BlockHeader, Transaction, TransactionOutput};
    use crate::crypto::PrivateKey;
    use crate::util::MerkleRoot;
    use crate::{config, U256};
    use chrono::Utc;
    use uuid::Uuid;

    fn create_test_output(value: u64, private_key: &mut PrivateKey) -> TransactionOutput {
        TransactionOutput {
            value,
            unique_id: Uuid::new_v4(),
            pubkey: private_key.public_key(),
        }
    }

    #[test]
    fn test_blockchain_initialization() {
        let blockchain = Blockchain::new();
        
        assert_eq!(blockchain.blocks().count(), 0);
        assert_eq!(blockchain.utxos().len(), 0);
        assert_eq!(blockchain.block_height(), 0);
    }

    #[test]
    fn test_blockchain_add_genesis_block() {
        let mut blockchain = Blockchain::new();
        let mut private_key = PrivateKey::new_key();
        
        let output = create_test_output(config::initial_reward() * 100_000_000, &mut private_key);
        let transaction = Transaction::new(vec![], vec![output]);
        
        let block = Block::new(
            BlockHeader::new(
                Utc::now(),
                0,
                crate::sha256::Hash::zero(),
                MerkleRoot::calculate(&vec![transaction.clone()]),
                config::min_target(),
            ),
            vec![transaction],
        );

        let result = blockchain.add_block(block);
        assert!(result.is_ok());
        assert_eq!(blockchain.block_height(), 1);
    }

    #[test]
    fn test_calculate_block_reward() {
        let blockchain = Blockchain::new();
        
        // At height 0, reward should be initial_reward
        blockchain.calculate_block_reward();
        assert_eq!(blockchain.block_height(), 0);
        
        // Test that reward calculation exists
        let reward = blockchain.calculate_block_reward();
        assert!(reward > 0);
    }

    #[test]
    fn test_blockchain_target() {
        let blockchain = Blockchain::new();
        let target = blockchain.target();

        // Target should not be zero
        assert_ne!(target, U256::from(0));
    }

    #[test]
    fn test_add_block_rejects_unsatisfied_pow() {
        let mut blockchain = Blockchain::new();
        let mut private_key = PrivateKey::new_key();

        let output = create_test_output(config::initial_reward() * 100_000_000, &mut private_key);
        let transaction = Transaction::new(vec![], vec![output]);

        // An all-zero target is only satisfied by a header whose hash is
        // also all zeros, which is unreachable by mining.
        let block = Block::new(
            BlockHeader::new(
                Utc::now(),
                0,
                crate::sha256::Hash::zero(),
                MerkleRoot::calculate(&vec![transaction.clone()]),
                U256::from(0),
            ),
            vec![transaction],
        );

        // Genesis only checks the prev-hash link, so seed a real genesis
        // first to exercise the non-genesis PoW check.
        let genesis_output = create_test_output(config::initial_reward() * 100_000_000, &mut private_key);
        let genesis_tx = Transaction::new(vec![], vec![genesis_output]);
        let genesis = Block::new(
            BlockHeader::new(
                Utc::now(),
                0,
                crate::sha256::Hash::zero(),
                MerkleRoot::calculate(&vec![genesis_tx.clone()]),
                config::min_target(),
            ),
            vec![genesis_tx],
        );
        blockchain.add_block(genesis).unwrap();

        let mut second = block;
        second.header.prev_block_hash = blockchain.blocks().last().unwrap().hash();
        let result = blockchain.add_block(second);
        assert!(result.is_err());
        assert_eq!(blockchain.block_height(), 1);
    }

    #[test]
    fn test_mempool_orders_by_descending_fee() {
        let (mut blockchain, miner_key) = (Blockchain::new(), PrivateKey::new_key());
        let mut miner_key = miner_key;

        // Seed the UTXO set directly with two spendable outputs, avoiding a
        // full genesis round-trip.
        let output_a = create_test_output(1_000, &mut miner_key);
        let output_b = create_test_output(1_000, &mut miner_key);
        let hash_a = output_a.hash();
        let hash_b = output_b.hash();

        let genesis_tx = Transaction::new(vec![], vec![output_a, output_b]);
        let genesis = Block::new(
            BlockHeader::new(
                Utc::now(),
                0,
                crate::sha256::Hash::zero(),
                MerkleRoot::calculate(&vec![genesis_tx.clone()]),
                config::min_target(),
            ),
            vec![genesis_tx],
        );
        blockchain.add_block(genesis).unwrap();
        blockchain.rebuild_utxos();

        let low_fee_input = crate::types::TransactionInput {
            prev_transaction_output_hash: hash_a,
            signature: crate::crypto::Signature::sign_output(&hash_a, &mut miner_key),
        };
        let low_fee_tx = Transaction::new(
            vec![low_fee_input],
            vec![create_test_output(995, &mut miner_key)], // fee = 5
        );

        let high_fee_input = crate::types::TransactionInput {
            prev_transaction_output_hash: hash_b,
            signature: crate::crypto::Signature::sign_output(&hash_b, &mut miner_key),
        };
        let high_fee_tx = Transaction::new(
            vec![high_fee_input],
            vec![create_test_output(900, &mut miner_key)], // fee = 100
        );

        blockchain.add_to_mempool(low_fee_tx.clone()).unwrap();
        blockchain.add_to_mempool(high_fee_tx.clone()).unwrap();

        let ordered: Vec<_> = blockchain.mempool().iter().map(|(_, tx)| tx.hash()).collect();
        assert_eq!(ordered[0], high_fee_tx.hash());
        assert_eq!(ordered[1], low_fee_tx.hash());
    }

    #[test]
    fn test_mempool_displaces_conflicting_transaction() {
        let mut blockchain = Blockchain::new();
        let mut miner_key = PrivateKey::new_key();

        let output = create_test_output(1_000, &mut miner_key);
        let hash = output.hash();
        let genesis_tx = Transaction::new(vec![], vec![output]);
        let genesis = Block::new(
            BlockHeader::new(
                Utc::now(),
                0,
                crate::sha256::Hash::zero(),
                MerkleRoot::calculate(&vec![genesis_tx.clone()]),
                config::min_target(),
            ),
            vec![genesis_tx],
        );
        blockchain.add_block(genesis).unwrap();
        blockchain.rebuild_utxos();

        let first_spend = Transaction::new(
            vec![crate::types::TransactionInput {
                prev_transaction_output_hash: hash,
                signature: crate::crypto::Signature::sign_output(&hash, &mut miner_key),
            }],
            vec![create_test_output(900, &mut miner_key)],
        );
        blockchain.add_to_mempool(first_spend.clone()).unwrap();
        assert_eq!(blockchain.mempool().len(), 1);

        // A second transaction spending the same UTXO with a higher fee
        // should evict the first.
        let second_spend = Transaction::new(
            vec![crate::types::TransactionInput {
                prev_transaction_output_hash: hash,
                signature: crate::crypto::Signature::sign_output(&hash, &mut miner_key),
            }],
            vec![create_test_output(800, &mut miner_key)],
        );
        blockchain.add_to_mempool(second_spend.clone()).unwrap();

        assert_eq!(blockchain.mempool().len(), 1);
        assert_eq!(blockchain.mempool()[0].1.hash(), second_spend.hash());
        assert_ne!(blockchain.mempool()[0].1.hash(), first_spend.hash());
    }

    fn mine_block(mut block: Block) -> Block {
        if !block.header.hash().matches_target(block.header.target) {
            for nonce in 0..=2_000_000u64 {
                block.header.nonce = nonce;
                if block.header.hash().matches_target(block.header.target) {
                    break;
                }
            }
        }
        block
    }

    #[test]
    fn test_try_adjust_target_tightens_when_blocks_come_in_faster_than_ideal() {
        let mut blockchain = Blockchain::new();
        let mut miner_key = PrivateKey::new_key();
        let interval = config::difficulty_update_interval();
        let target_seconds = config::ideal_block_time() * interval;

        let genesis_output = create_test_output(config::initial_reward() * 100_000_000, &mut miner_key);
        let genesis_tx = Transaction::new(vec![], vec![genesis_output]);
        let genesis = mine_block(Block::new(
            BlockHeader::new(
                Utc::now() - chrono::Duration::seconds(target_seconds as i64 * 2),
                0,
                crate::sha256::Hash::zero(),
                MerkleRoot::calculate(&vec![genesis_tx.clone()]),
                config::min_target(),
            ),
            vec![genesis_tx],
        ));
        blockchain.add_block(genesis).unwrap();
        let initial_target = blockchain.target();

        // Space every remaining block in the interval half a second apart so
        // the whole interval completes in far less than `target_seconds`,
        // which should tighten (shrink) the target.
        for i in 1..interval {
            let prev_hash = blockchain.blocks().last().unwrap().hash();
            let prev_timestamp = blockchain.blocks().last().unwrap().header.timestamp;
            let coinbase_output =
                create_test_output(config::initial_reward() * 100_000_000, &mut miner_key);
            let coinbase_tx = Transaction::new(vec![], vec![coinbase_output]);
            let block = mine_block(Block::new(
                BlockHeader::new(
                    prev_timestamp + chrono::Duration::milliseconds(500),
                    0,
                    prev_hash,
                    MerkleRoot::calculate(&vec![coinbase_tx.clone()]),
                    blockchain.target(),
                ),
                vec![coinbase_tx],
            ));
            blockchain.add_block(block).unwrap();
            let _ = i;
        }

        assert_eq!(blockchain.block_height(), interval);
        assert!(
            blockchain.target() < initial_target,
            "target should have tightened: {} vs initial {}",
            blockchain.target(),
            initial_target
        );
        // Never tightens by more than the 4x clamp in a single adjustment.
        assert!(blockchain.target() >= initial_target / 4);
    }
}

