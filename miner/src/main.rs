use anyhow::{anyhow, Result};
use btclib::config::BlockchainConfig;
use btclib::network::Message;
use btclib::{crypto::PublicKey, types::Block, util::Saveable};
use clap::Parser;
use std::sync::atomic::Ordering;
use std::{
    sync::{atomic::AtomicBool, Arc},
    thread,
    time::Duration,
};
use tokio::{net::TcpStream, sync::Mutex, time::interval};
use tracing::{debug, error, info, warn};

const ATOMIC_ORDERING: Ordering = Ordering::Relaxed;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long)]
    node_address: Option<String>,
    #[arg(short, long)]
    public_key_file: Option<String>,
}

struct Miner {
    public_key: PublicKey,
    stream: Mutex<TcpStream>,
    current_template: Arc<std::sync::Mutex<Option<Block>>>,
    mining: Arc<AtomicBool>,
    mined_block_sender: flume::Sender<Block>,
    mined_block_receiver: flume::Receiver<Block>,
    mining_batch_size: usize,
    template_fetch_interval_secs: u64,
}

impl Miner {
    async fn new(
        address: String,
        public_key: PublicKey,
        mining_batch_size: usize,
        template_fetch_interval_secs: u64,
    ) -> Result<Self> {
        let stream = TcpStream::connect(&address).await?;
        let (mined_block_sender, mined_block_receiver) = flume::unbounded();

        Ok(Self {
            public_key,
            stream: Mutex::new(stream),
            current_template: Arc::new(std::sync::Mutex::new(None)),
            mining: Arc::new(AtomicBool::new(false)),
            mined_block_sender,
            mined_block_receiver,
            mining_batch_size,
            template_fetch_interval_secs,
        })
    }

    async fn run(&self) -> Result<()> {
        let _ = self.spawn_mining_thread();
        let mut poll_interval = interval(Duration::from_secs(self.template_fetch_interval_secs));

        loop {
            let receiver_clone = self.mined_block_receiver.clone();

            tokio::select! {
                _ = poll_interval.tick() => self.fetch_and_validate_template().await?,
                Ok(mined_block) = receiver_clone.recv_async() => self.submit_block(mined_block).await?,
            }
        }
    }

    /// Dedicated OS thread for the proof-of-work search, so a long mining
    /// burst never blocks the async network loop. Mines in bursts of
    /// `mining_batch_size` nonces, yielding between bursts to pick up
    /// fresh templates.
    fn spawn_mining_thread(&self) -> thread::JoinHandle<()> {
        let template = self.current_template.clone();
        let mining = self.mining.clone();
        let sender = self.mined_block_sender.clone();
        let batch_size = self.mining_batch_size;

        thread::spawn(move || loop {
            let candidate = template.lock().unwrap().clone();
            let Some(mut block) = candidate else {
                thread::sleep(Duration::from_millis(50));
                continue;
            };

            debug!("mining block with target: {}", block.header.target);

            if block.header.mine(batch_size) {
                info!("block mined: {}", block.hash());
                if sender.send(block).is_err() {
                    error!("failed to send mined block to submit loop");
                }
                mining.store(false, ATOMIC_ORDERING);
            }
        })
    }

    async fn fetch_and_validate_template(&self) -> Result<()> {
        if !self.mining.load(ATOMIC_ORDERING) {
            self.fetch_template().await?;
        } else {
            self.validate_template().await?;
        }

        Ok(())
    }

    async fn fetch_template(&self) -> Result<()> {
        debug!("fetching template");
        let message = Message::FetchTemplate(self.public_key.clone());

        let mut stream_lock = self.stream.lock().await;
        message.send_async(&mut *stream_lock).await?;
        let response = Message::receive_async(&mut *stream_lock).await?;
        drop(stream_lock);

        match response {
            Message::Template(template) => {
                info!("received template with target: {}", template.header.target);
                *self.current_template.lock().unwrap() = Some(template);
                self.mining.store(true, ATOMIC_ORDERING);
                Ok(())
            }
            m => Err(anyhow!(
                "unexpected message received when fetching template: {m:?}"
            )),
        }
    }

    async fn validate_template(&self) -> Result<()> {
        let template = self.current_template.lock().unwrap().clone();
        let Some(template) = template else {
            return Ok(());
        };

        let message = Message::ValidateTemplate(template);

        let mut stream_lock = self.stream.lock().await;
        message.send_async(&mut *stream_lock).await?;
        let response = Message::receive_async(&mut *stream_lock).await?;
        drop(stream_lock);

        match response {
            Message::TemplateValidity(valid) => {
                if !valid {
                    warn!("template no longer valid, will fetch a new one");
                    self.mining.store(false, ATOMIC_ORDERING);
                    *self.current_template.lock().unwrap() = None;
                } else {
                    debug!("template is still valid");
                }
                Ok(())
            }
            m => Err(anyhow!(
                "unexpected message received when validating template: {m:?}"
            )),
        }
    }

    async fn submit_block(&self, block: Block) -> Result<()> {
        info!("submitting mined block");
        let message = Message::SubmitTemplate(block);

        let mut stream_lock = self.stream.lock().await;
        message.send_async(&mut *stream_lock).await?;

        self.mining.store(false, ATOMIC_ORDERING);
        *self.current_template.lock().unwrap() = None;

        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = BlockchainConfig::global();

    let node_address = cli.node_address.unwrap_or_else(|| config.mining.node_address.clone());
    let public_key_file = cli
        .public_key_file
        .unwrap_or_else(|| config.mining.public_key_file.clone());

    let public_key = PublicKey::load_from_file(&public_key_file)
        .map_err(|e| anyhow!("error reading public key from {public_key_file}: {e}"))?;

    info!("connecting to node at {node_address}");
    let miner = Miner::new(
        node_address,
        public_key,
        config.mining.mining_batch_size,
        config.mining.template_fetch_interval_secs,
    )
    .await?;
    miner.run().await
}
