//! Protocol era predicates.
//!
//! Each kernel protocol revision activates at a fixed switch time per
//! network; v0.6, v14 and v15 were supermajority hardforks and
//! additionally require a height threshold on the previous block.
//! Regtest enables every era unconditionally.
//!
//! The individual predicates are kept for boundary-exact call sites;
//! validation computes an [`EraFlags`] bitset once per block and
//! threads it through, so downstream code never re-derives era truth.

use crate::params::ConsensusParams;
use obol_chain::{BlockId, BlockIndex, BlockIndexArena};
use std::fmt;

/// Protocol switch time of the v0.3 kernel protocol.
pub const PROTOCOL_V03_SWITCH_TIME: u32 = 1_363_800_000;
pub const PROTOCOL_V03_TEST_SWITCH_TIME: u32 = 1_359_781_000;
/// Protocol switch time of the v0.4 kernel protocol.
pub const PROTOCOL_V04_SWITCH_TIME: u32 = 1_399_300_000;
pub const PROTOCOL_V04_TEST_SWITCH_TIME: u32 = 1_395_700_000;
/// Protocol switch time of the v0.5 kernel protocol.
pub const PROTOCOL_V05_SWITCH_TIME: u32 = 1_461_700_000;
pub const PROTOCOL_V05_TEST_SWITCH_TIME: u32 = 1_447_700_000;
/// Protocol switch time of the v0.6 kernel protocol.
/// Supermajority hardfork: the actual fork happens later than the
/// switch time, once the height threshold is crossed.
pub const PROTOCOL_V06_SWITCH_TIME: u32 = 1_513_050_000; // Tue 12 Dec 03:40:00 UTC 2017
pub const PROTOCOL_V06_TEST_SWITCH_TIME: u32 = 1_508_198_400; // Tue 17 Oct 00:00:00 UTC 2017
/// Protocol switch time of the v0.7 kernel protocol.
pub const PROTOCOL_V07_SWITCH_TIME: u32 = 1_552_392_000; // Tue 12 Mar 12:00:00 UTC 2019
pub const PROTOCOL_V07_TEST_SWITCH_TIME: u32 = 1_541_505_600; // Tue 06 Nov 12:00:00 UTC 2018
/// Protocol switch time of the v0.9 kernel protocol.
pub const PROTOCOL_V09_SWITCH_TIME: u32 = 1_591_617_600; // Mon  8 Jun 12:00:00 UTC 2020
pub const PROTOCOL_V09_TEST_SWITCH_TIME: u32 = 1_581_940_800; // Mon 17 Feb 12:00:00 UTC 2020
/// Protocol switch time of the v10 kernel protocol.
pub const PROTOCOL_V10_SWITCH_TIME: u32 = 1_635_768_000; // Mon  1 Nov 12:00:00 UTC 2021
pub const PROTOCOL_V10_TEST_SWITCH_TIME: u32 = 1_625_140_800; // Thu  1 Jul 12:00:00 UTC 2021
/// Protocol switch time of the v12 kernel protocol.
pub const PROTOCOL_V12_SWITCH_TIME: u32 = 1_700_276_331; // Sat 18 Nov 02:58:51 UTC 2023
pub const PROTOCOL_V12_TEST_SWITCH_TIME: u32 = 1_671_060_214; // Wed 14 Dec 11:23:34 UTC 2022
/// Protocol switch time of the v14 kernel protocol.
pub const PROTOCOL_V14_SWITCH_TIME: u32 = 1_717_416_000; // Mon  3 Jun 12:00:00 UTC 2024
pub const PROTOCOL_V14_TEST_SWITCH_TIME: u32 = 1_710_720_000; // Mon 18 Mar 00:00:00 UTC 2024
/// Protocol switch time of the v15 kernel protocol.
pub const PROTOCOL_V15_SWITCH_TIME: u32 = 1_741_780_800; // Wed 12 Mar 12:00:00 UTC 2025
pub const PROTOCOL_V15_TEST_SWITCH_TIME: u32 = 1_734_004_800; // Thu 12 Dec 12:00:00 UTC 2024

/// v0.6 hardfork height thresholds (mainnet, testnet).
const V06_FORK_HEIGHT: u32 = 339_678;
const V06_TEST_FORK_HEIGHT: u32 = 301_251;
/// v14 hardfork height thresholds (mainnet, testnet).
const V14_FORK_HEIGHT: u32 = 770_395;
const V14_TEST_FORK_HEIGHT: u32 = 573_706;
/// v15 hardfork height thresholds (mainnet, testnet).
const V15_FORK_HEIGHT: u32 = 801_330;
const V15_TEST_FORK_HEIGHT: u32 = 612_775;

fn switch_time(params: &ConsensusParams, main: u32, test: u32) -> u32 {
    if params.is_mainnet() {
        main
    } else {
        test
    }
}

/// Whether a coinstake with the given timestamp is subject to the v0.3
/// protocol.
pub fn is_protocol_v03(params: &ConsensusParams, time_coinstake: u32) -> bool {
    params.is_regtest()
        || time_coinstake
            >= switch_time(params, PROTOCOL_V03_SWITCH_TIME, PROTOCOL_V03_TEST_SWITCH_TIME)
}

/// Whether a block with the given timestamp is subject to the v0.4
/// protocol.
pub fn is_protocol_v04(params: &ConsensusParams, time_block: u32) -> bool {
    params.is_regtest()
        || time_block >= switch_time(params, PROTOCOL_V04_SWITCH_TIME, PROTOCOL_V04_TEST_SWITCH_TIME)
}

/// Whether a transaction with the given timestamp is subject to the
/// v0.5 protocol.
pub fn is_protocol_v05(params: &ConsensusParams, time_tx: u32) -> bool {
    params.is_regtest()
        || time_tx >= switch_time(params, PROTOCOL_V05_SWITCH_TIME, PROTOCOL_V05_TEST_SWITCH_TIME)
}

/// Whether a block building on `prev` is subject to the v0.6 protocol.
/// Tested against the previous block index, which is always available.
pub fn is_protocol_v06(params: &ConsensusParams, prev: &BlockIndex) -> bool {
    if params.is_regtest() {
        return true;
    }
    if prev.time < switch_time(params, PROTOCOL_V06_SWITCH_TIME, PROTOCOL_V06_TEST_SWITCH_TIME) {
        return false;
    }
    // soft-forking proof-of-stake is dangerous with a low supermajority:
    // only coindays of upgraded nodes get destroyed after the fork
    let threshold = if params.is_mainnet() {
        V06_FORK_HEIGHT
    } else {
        V06_TEST_FORK_HEIGHT
    };
    prev.height > threshold
}

/// Whether a transaction with the given timestamp is subject to the
/// v0.7 protocol.
pub fn is_protocol_v07(params: &ConsensusParams, time_tx: u32) -> bool {
    params.is_regtest()
        || time_tx >= switch_time(params, PROTOCOL_V07_SWITCH_TIME, PROTOCOL_V07_TEST_SWITCH_TIME)
}

/// Whether the given timestamp is subject to the v0.9 protocol.
pub fn is_protocol_v09(params: &ConsensusParams, time: u32) -> bool {
    params.is_regtest()
        || time >= switch_time(params, PROTOCOL_V09_SWITCH_TIME, PROTOCOL_V09_TEST_SWITCH_TIME)
}

/// Whether the given timestamp is subject to the v10 protocol.
pub fn is_protocol_v10(params: &ConsensusParams, time: u32) -> bool {
    params.is_regtest()
        || time >= switch_time(params, PROTOCOL_V10_SWITCH_TIME, PROTOCOL_V10_TEST_SWITCH_TIME)
}

/// Whether a block building on `prev` is subject to the v12 protocol.
pub fn is_protocol_v12(params: &ConsensusParams, prev: &BlockIndex) -> bool {
    params.is_regtest()
        || prev.time >= switch_time(params, PROTOCOL_V12_SWITCH_TIME, PROTOCOL_V12_TEST_SWITCH_TIME)
}

/// Whether a block building on `prev` is subject to the v14 protocol.
pub fn is_protocol_v14(params: &ConsensusParams, prev: &BlockIndex) -> bool {
    if params.is_regtest() {
        return true;
    }
    if prev.time < switch_time(params, PROTOCOL_V14_SWITCH_TIME, PROTOCOL_V14_TEST_SWITCH_TIME) {
        return false;
    }
    let threshold = if params.is_mainnet() {
        V14_FORK_HEIGHT
    } else {
        V14_TEST_FORK_HEIGHT
    };
    prev.height > threshold
}

/// Whether a block building on `prev` is subject to the v15 protocol.
pub fn is_protocol_v15(params: &ConsensusParams, prev: &BlockIndex) -> bool {
    if params.is_regtest() {
        return true;
    }
    if prev.time < switch_time(params, PROTOCOL_V15_SWITCH_TIME, PROTOCOL_V15_TEST_SWITCH_TIME) {
        return false;
    }
    let threshold = if params.is_mainnet() {
        V15_FORK_HEIGHT
    } else {
        V15_TEST_FORK_HEIGHT
    };
    prev.height > threshold
}

/// A kernel protocol era.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Era {
    V03 = 0,
    V04 = 1,
    V05 = 2,
    V06 = 3,
    V07 = 4,
    V09 = 5,
    V10 = 6,
    V12 = 7,
    V14 = 8,
    V15 = 9,
}

impl Era {
    const ALL: [Era; 10] = [
        Era::V03,
        Era::V04,
        Era::V05,
        Era::V06,
        Era::V07,
        Era::V09,
        Era::V10,
        Era::V12,
        Era::V14,
        Era::V15,
    ];

    fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

/// The set of active eras for one block, computed once and threaded
/// through validation.
///
/// Time-keyed eras use the block's timestamp; under v0.3+ the
/// coinstake and block timestamps are equal, so one bitset per block
/// is exact for every downstream check.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct EraFlags(u32);

impl EraFlags {
    /// Compute the era set for a block with timestamp `time` building
    /// on `prev` (`None` for genesis).
    pub fn at(params: &ConsensusParams, prev: Option<&BlockIndex>, time: u32) -> Self {
        let mut flags = 0u32;
        let mut set = |era: Era, active: bool| {
            if active {
                flags |= era.bit();
            }
        };
        set(Era::V03, is_protocol_v03(params, time));
        set(Era::V04, is_protocol_v04(params, time));
        set(Era::V05, is_protocol_v05(params, time));
        set(Era::V07, is_protocol_v07(params, time));
        set(Era::V09, is_protocol_v09(params, time));
        set(Era::V10, is_protocol_v10(params, time));
        let regtest = params.is_regtest();
        set(
            Era::V06,
            prev.map(|p| is_protocol_v06(params, p)).unwrap_or(regtest),
        );
        set(
            Era::V12,
            prev.map(|p| is_protocol_v12(params, p)).unwrap_or(regtest),
        );
        set(
            Era::V14,
            prev.map(|p| is_protocol_v14(params, p)).unwrap_or(regtest),
        );
        set(
            Era::V15,
            prev.map(|p| is_protocol_v15(params, p)).unwrap_or(regtest),
        );
        EraFlags(flags)
    }

    /// Whether the given era is active.
    pub fn contains(self, era: Era) -> bool {
        self.0 & era.bit() != 0
    }
}

impl fmt::Debug for EraFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active: Vec<&str> = Era::ALL
            .iter()
            .filter(|era| self.contains(**era))
            .map(|era| match era {
                Era::V03 => "V03",
                Era::V04 => "V04",
                Era::V05 => "V05",
                Era::V06 => "V06",
                Era::V07 => "V07",
                Era::V09 => "V09",
                Era::V10 => "V10",
                Era::V12 => "V12",
                Era::V14 => "V14",
                Era::V15 => "V15",
            })
            .collect();
        write!(f, "EraFlags[{}]", active.join(","))
    }
}

/// Count how many of the last `to_check` proof-of-stake ancestors have
/// at least `min_version`, stopping early at `required`.
pub fn how_super_majority(
    arena: &BlockIndexArena,
    start: Option<BlockId>,
    min_version: i32,
    required: u32,
    to_check: u32,
) -> u32 {
    let mut found = 0u32;
    let mut checked = 0u32;
    let mut cursor = start;
    while let Some(id) = cursor {
        if checked >= to_check || found >= required {
            break;
        }
        let index = arena.get(id);
        cursor = index.prev;
        if !index.is_proof_of_stake() {
            continue;
        }
        if index.version >= min_version {
            found += 1;
        }
        checked += 1;
    }
    found
}

/// Whether at least `required` of the last `to_check` proof-of-stake
/// ancestors have `min_version`.
pub fn is_super_majority(
    arena: &BlockIndexArena,
    start: Option<BlockId>,
    min_version: i32,
    required: u32,
    to_check: u32,
) -> bool {
    how_super_majority(arena, start, min_version, required, to_check) >= required
}
