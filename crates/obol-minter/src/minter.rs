//! The block producer loop.

use crate::traits::{AssembleOutcome, BlockAssembler, NewBlockProcessor, SyncStatus, Wallet};
use obol_chain::{ChainState, Clock};
use obol_consensus::{
    ConsensusParams, EraFlags, MAX_FUTURE_BLOCK_TIME, MAX_FUTURE_BLOCK_TIME_PREV9,
};
use obol_validator::ValidatorRegistry;
use parking_lot::RwLock;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Warning shown while the wallet is locked.
const WARN_WALLET_LOCKED: &str = "Info: Minting suspended due to locked wallet.";
/// Warning shown during initial sync.
const WARN_SYNCING: &str = "Info: Minting suspended while synchronizing.";
/// Warning shown after a block-creation failure.
const WARN_BLOCK_CREATION: &str = "Info: Minting suspended due to block creation failure.";

/// Pause between polls while the wallet is locked or the node syncs.
const PAUSED_POLL: Duration = Duration::from_secs(10);

/// User-visible minter warning slot.
#[derive(Clone, Default)]
pub struct MintWarning(Arc<RwLock<String>>);

impl MintWarning {
    /// Current warning, empty when minting runs normally.
    pub fn get(&self) -> String {
        self.0.read().clone()
    }

    fn set(&self, message: &str) {
        *self.0.write() = message.to_string();
    }
}

/// Per-slot timeout: half a second plus thirty milliseconds per square
/// root of the wallet's UTXO count, so heavy wallets poll less often.
pub fn pos_timeout(utxo_count: usize) -> Duration {
    Duration::from_millis(500 + 30 * (utxo_count as f64).sqrt() as u64)
}

/// The proof-of-stake minter.
pub struct Minter {
    params: ConsensusParams,
    chain: Arc<RwLock<ChainState>>,
    registry: Arc<ValidatorRegistry>,
    wallet: Arc<dyn Wallet>,
    assembler: Arc<dyn BlockAssembler>,
    processor: Arc<dyn NewBlockProcessor>,
    sync: Arc<dyn SyncStatus>,
    clock: Arc<dyn Clock>,
    shutdown: CancellationToken,
    warning: MintWarning,
}

impl Minter {
    /// Create a minter over the given collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        params: ConsensusParams,
        chain: Arc<RwLock<ChainState>>,
        registry: Arc<ValidatorRegistry>,
        wallet: Arc<dyn Wallet>,
        assembler: Arc<dyn BlockAssembler>,
        processor: Arc<dyn NewBlockProcessor>,
        sync: Arc<dyn SyncStatus>,
        clock: Arc<dyn Clock>,
        shutdown: CancellationToken,
    ) -> Self {
        Minter {
            params,
            chain,
            registry,
            wallet,
            assembler,
            processor,
            sync,
            clock,
            shutdown,
            warning: MintWarning::default(),
        }
    }

    /// Handle on the user-visible warning slot.
    pub fn warning(&self) -> MintWarning {
        self.warning.clone()
    }

    /// Sleep that returns `false` when shutdown is requested.
    async fn idle(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.shutdown.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }

    /// Run the producer loop until shutdown.
    pub async fn run(self) {
        let slot_timeout = pos_timeout(self.wallet.utxo_count());
        info!(
            timeout_ms = slot_timeout.as_millis() as u64,
            utxos = self.wallet.utxo_count(),
            "stake minter started"
        );
        // the upstream client drew the selection random from a
        // non-deterministic RNG; this node derives it from the chain so
        // the producer schedule is agreed, which operators migrating
        // from the reference client should be aware of
        warn!("validator selection is chain-seeded on this node");

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            let mut paused = false;
            while self.wallet.is_locked() {
                self.warning.set(WARN_WALLET_LOCKED);
                paused = true;
                if !self.idle(PAUSED_POLL).await {
                    return;
                }
            }
            while self.sync.is_syncing() {
                self.warning.set(WARN_SYNCING);
                paused = true;
                if !self.idle(PAUSED_POLL).await {
                    return;
                }
            }
            if paused {
                self.warning.set("");
            }

            let Some((prev_hash, prev_time, median_time)) = ({
                let chain = self.chain.read();
                chain.tip_id().map(|tip| {
                    let index = chain.arena.get(tip);
                    (index.block_hash, index.time, chain.median_time_past(tip))
                })
            }) else {
                if !self.idle(Duration::from_secs(1)).await {
                    return;
                }
                continue;
            };

            // slot check: is our validator the selected producer?
            let mint_script = self.wallet.mint_script();
            let ours = self.registry.find_by_script(&mint_script);
            let now = self.clock.adjusted_time();
            let selected = self.registry.select_next_validator(&prev_hash, now);
            let our_turn = match (&ours, &selected) {
                (Some(ours), Some(selected)) => ours.id == selected.id,
                _ => false,
            };
            if !our_turn {
                if !self.idle(slot_timeout).await {
                    return;
                }
                continue;
            }
            debug!(slot = now, "selected as validator for this slot");

            match self.assembler.create_candidate(&mint_script) {
                AssembleOutcome::TryLater => {
                    if !self.idle(slot_timeout).await {
                        return;
                    }
                }
                AssembleOutcome::Failed(reason) => {
                    self.warning.set(WARN_BLOCK_CREATION);
                    error!(%reason, "block creation failed");
                    if let Some(ours) = &ours {
                        self.registry.update_reputation(&ours.id, false);
                    }
                    if !self.idle(PAUSED_POLL).await {
                        return;
                    }
                }
                AssembleOutcome::Candidate(template) => {
                    let mut block = template.block;
                    let Some(coinstake_time) = block.coinstake().map(|tx| tx.time) else {
                        warn!("assembler returned a candidate without a coinstake");
                        continue;
                    };
                    // the coinstake must land after the median past and
                    // within the allowed drift behind the previous block
                    let earliest = (median_time + 1)
                        .max(i64::from(prev_time) - max_future_drift(&self.params, prev_time));
                    if i64::from(coinstake_time) < earliest {
                        debug!(coinstake_time, earliest, "stale coinstake, retrying");
                        if !self.idle(slot_timeout).await {
                            return;
                        }
                        continue;
                    }
                    // block time equals the coinstake time
                    block.header.time = coinstake_time;

                    if !self.wallet.sign_block(&mut block) {
                        error!("failed to sign proof-of-stake block");
                        continue;
                    }
                    let hash = block.header.hash();
                    info!(block = %hash, "proof-of-stake block found");

                    match self.processor.submit(Arc::new(block)) {
                        Ok(()) => {
                            if let Some(ours) = &ours {
                                self.registry.update_reputation(&ours.id, true);
                            }
                            // rest after a successful block so the next
                            // slot is not raced immediately
                            let rest: u64 = 60 + rand::thread_rng().gen_range(0..4);
                            if !self.idle(Duration::from_secs(rest)).await {
                                return;
                            }
                        }
                        Err(err) => {
                            warn!(%err, "minted block rejected");
                        }
                    }
                    if !self.idle(slot_timeout).await {
                        return;
                    }
                }
            }
        }
        info!("stake minter stopped");
    }
}

/// Allowed drift of a coinstake behind the previous block's timestamp.
fn max_future_drift(params: &ConsensusParams, prev_time: u32) -> i64 {
    let eras = EraFlags::at(params, None, prev_time);
    if eras.contains(obol_consensus::Era::V09) {
        MAX_FUTURE_BLOCK_TIME
    } else {
        MAX_FUTURE_BLOCK_TIME_PREV9
    }
}
