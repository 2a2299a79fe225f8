//! Branching simulation engine.
//!
//! One engine owns one pool and one ruleset. Every cycle advances all lines
//! by one tick, lets each line buy (and sacrifice) as far as its queues
//! allow, forks lines whose queues hold alternatives and prunes the pool on
//! a schedule. The first tick on which some line meets the win condition
//! ends the run.

pub mod batch;
pub mod prune;
pub mod result;

pub use prune::DominancePruner;
pub use result::{PhaseTimes, RunResult, SearchStats};

use crate::core::balance::{POOL_BLOCK_LINES, PRUNE_CYCLE_LIMIT, PRUNE_GROWTH_LIMIT};
use crate::core::item::Item;
use crate::core::ruleset::Ruleset;
use crate::error::{Error, SimError};
use crate::policy::{PurchasePolicy, SacrificePolicy};
use crate::pool::{SortKey, StatePool};
use crate::telemetry::{HostProbe, PruneStatus, RunStart, TelemetrySink};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Pool growth and prune cadence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineLimits {
    /// Lines reserved each time the pool runs out of room.
    pub block_lines: usize,
    /// Growth cycles tolerated between prunes.
    pub prune_cycle_limit: u32,
    /// Growth factor over the post-prune size that forces a prune.
    pub prune_growth_limit: f64,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            block_lines: POOL_BLOCK_LINES,
            prune_cycle_limit: PRUNE_CYCLE_LIMIT,
            prune_growth_limit: PRUNE_GROWTH_LIMIT,
        }
    }
}

/// Where the engine is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Advancing,
    Pruning,
    Terminated,
}

/// A line meeting the win condition, after winners were ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Winner {
    pub line: usize,
    pub count: usize,
    pub overflowed: bool,
}

/// Counters reported with each prune status.
#[derive(Debug, Clone, Copy)]
struct StatusMark {
    at: Instant,
    tick: u64,
    phases: PhaseTimes,
    added: usize,
    removed: usize,
}

pub struct SimulationEngine<'a> {
    rules: Ruleset,
    purchase_policy: &'a dyn PurchasePolicy,
    sacrifice_policy: &'a dyn SacrificePolicy,
    limits: EngineLimits,
    pruner: DominancePruner,
    pool: StatePool,
    tick: u64,
    phase: EnginePhase,
    phases: PhaseTimes,
    cycles_since_prune: u32,
    lines_after_prune: usize,
    prunes: u64,
    status: StatusMark,
    max_currency: f64,
}

impl<'a> SimulationEngine<'a> {
    /// Validate the ruleset, create the initial line and buy its first tier 1.
    pub fn new(
        rules: Ruleset,
        purchase_policy: &'a dyn PurchasePolicy,
        sacrifice_policy: &'a dyn SacrificePolicy,
    ) -> Result<Self, Error> {
        Self::with_limits(rules, purchase_policy, sacrifice_policy, EngineLimits::default())
    }

    pub fn with_limits(
        rules: Ruleset,
        purchase_policy: &'a dyn PurchasePolicy,
        sacrifice_policy: &'a dyn SacrificePolicy,
        limits: EngineLimits,
    ) -> Result<Self, Error> {
        rules.validate()?;
        let mut pool = StatePool::with_block(rules.tiers, limits.block_lines, limits.block_lines);
        let line = pool.push_line(rules.start_currency, &rules.base_costs, &rules.base_multipliers);

        let mut engine = Self {
            max_currency: rules.start_currency,
            rules,
            purchase_policy,
            sacrifice_policy,
            limits,
            pruner: DominancePruner::new(),
            pool,
            tick: 0,
            phase: EnginePhase::Advancing,
            phases: PhaseTimes::default(),
            cycles_since_prune: 0,
            lines_after_prune: 0,
            prunes: 0,
            status: StatusMark {
                at: Instant::now(),
                tick: 0,
                phases: PhaseTimes::default(),
                added: 0,
                removed: 0,
            },
        };
        engine.refresh_purchase_queue(line);
        engine.refresh_sacrifice_queue(line);
        engine.apply_purchase(line, Item::Tier(1))?;
        Ok(engine)
    }

    pub fn rules(&self) -> &Ruleset {
        &self.rules
    }

    pub fn pool(&self) -> &StatePool {
        &self.pool
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    fn sacrifice_active(&self) -> bool {
        self.rules.sacrifice_enabled && self.sacrifice_policy.is_active()
    }

    fn refresh_purchase_queue(&mut self, line: usize) {
        let queue = self
            .purchase_policy
            .next_purchases(&self.pool.view(line), &self.rules);
        self.pool.set_purchase_queue(line, queue);
    }

    fn refresh_sacrifice_queue(&mut self, line: usize) {
        let queue = self
            .sacrifice_policy
            .next_sacrifices(&self.pool.view(line), &self.rules);
        self.pool.set_sacrifice_queue(line, queue);
    }

    // ── Clock ──────────────────────────────────────────────────────────

    /// Advance every line by one tick.
    ///
    /// On overflow no line is modified and the clock does not move.
    pub fn tick(&mut self) -> Result<(), SimError> {
        let started = Instant::now();
        let advanced = batch::checked_tick(self.pool.tick_columns(), self.rules.tick_duration);
        self.phases.tick += started.elapsed();
        if !advanced {
            return Err(SimError::NumericOverflow { tick: self.tick + 1 });
        }
        self.tick += 1;
        Ok(())
    }

    // ── Purchases ──────────────────────────────────────────────────────

    fn can_buy(&self, line: usize) -> bool {
        self.pool
            .purchase_queue(line)
            .head()
            .is_some_and(|item| self.pool.cost(line, item) <= self.pool.currency(line))
    }

    /// Buy one unit of `item` on `line` and ask the policy for a new queue.
    pub fn apply_purchase(&mut self, line: usize, item: Item) -> Result<(), SimError> {
        let price = self.pool.cost(line, item);
        let currency = self.pool.currency(line) - price;
        if currency < 0.0 {
            return Err(SimError::InvariantViolation {
                line,
                item,
                currency,
            });
        }
        self.pool.set_currency(line, currency);

        let count = {
            let count = self.pool.purchase_count_mut(line, item);
            *count += 1;
            *count
        };
        let slot = item.index();
        match item {
            Item::RateBoost => {
                *self.pool.cost_mut(line, item) *= self.rules.cost_growth[slot];
                *self.pool.multiplier_mut(line, item) *= self.rules.rate_multiplier_growth;
            }
            Item::Tier(tier) => {
                *self.pool.tier_amount_mut(line, tier) += 1.0;
                if count % self.rules.milestone_every == 0 {
                    *self.pool.cost_mut(line, item) *= self.rules.cost_growth[slot];
                    *self.pool.multiplier_mut(line, item) *= self.rules.milestone_multiplier;
                } else if count == 1 {
                    let bonus = self.rules.first_purchase_bonus[slot];
                    if bonus != 1.0 {
                        for multiplier in self.pool.tier_multipliers_mut(line) {
                            *multiplier *= bonus;
                        }
                    }
                }
            }
        }

        self.pool
            .history_mut(line)
            .record_purchase(item, price, self.tick);
        self.refresh_purchase_queue(line);
        Ok(())
    }

    /// Let every line buy while its head purchase is affordable.
    ///
    /// A line whose queue holds alternatives is cloned before buying; the
    /// clone keeps the queue without its head and is visited later in the
    /// same pass. Returns how many lines were added.
    pub fn apply_purchases(&mut self) -> Result<usize, SimError> {
        let started = Instant::now();
        let before = self.pool.len();
        let affordable = batch::affordable_lines(&self.pool.snapshot_columns());
        if affordable.iter().any(|&can| can) {
            let mut line = 0;
            while line < self.pool.len() {
                if line >= before || affordable[line] {
                    while self.can_buy(line) {
                        let queue = self.pool.purchase_queue(line);
                        let Some(item) = queue.head() else { break };
                        if queue.has_alternative() {
                            let fork = self.pool.clone_line(line);
                            self.pool.set_purchase_queue(fork, queue.without_head());
                        }
                        self.apply_purchase(line, item)?;
                    }
                }
                line += 1;
            }
        }
        self.phases.buy += started.elapsed();
        Ok(self.pool.len() - before)
    }

    // ── Sacrifices ─────────────────────────────────────────────────────

    /// Sacrifice tier 1 for `boost` on `line` and ask the policy for a new queue.
    pub fn apply_sacrifice(&mut self, line: usize, boost: f64) {
        let first = self.pool.tier_amount(line, 1);
        *self.pool.sacrificed_mut(line) += first;
        *self.pool.multiplier_mut(line, self.rules.top_tier()) *= boost;
        for tier in 1..self.rules.tiers as u8 {
            *self.pool.tier_amount_mut(line, tier) = 0.0;
        }
        self.pool.history_mut(line).record_sacrifice(boost, self.tick);
        self.refresh_sacrifice_queue(line);
    }

    /// Let every line whose predicted boost meets its head threshold sacrifice.
    ///
    /// When a larger threshold remains queued, a clone keeps waiting for it.
    /// Returns how many lines were added.
    pub fn apply_sacrifices(&mut self) -> usize {
        if !self.sacrifice_active() {
            return 0;
        }
        let started = Instant::now();
        let before = self.pool.len();
        let boosts = batch::sacrifice_boosts(&self.pool.snapshot_columns());
        for (line, boost) in boosts.into_iter().enumerate() {
            let Some(boost) = boost else { continue };
            if let Some(rest) = self.pool.sacrifice_queue(line).deferred(boost) {
                let fork = self.pool.clone_line(line);
                self.pool.set_sacrifice_queue(fork, rest);
            }
            self.apply_sacrifice(line, boost);
        }
        self.phases.sacrifice += started.elapsed();
        self.pool.len() - before
    }

    // ── Pruning ────────────────────────────────────────────────────────

    /// Prune now. Returns how many lines were removed.
    pub fn prune(&mut self) -> usize {
        self.phase = EnginePhase::Pruning;
        let started = Instant::now();
        let removed = self.pruner.prune(&mut self.pool);
        self.phases.prune += started.elapsed();
        self.lines_after_prune = self.pool.len();
        self.cycles_since_prune = 0;
        self.prunes += 1;
        self.status.removed += removed;
        self.phase = EnginePhase::Advancing;
        removed
    }

    /// Prune if the pool grew enough, or for long enough, since the last prune.
    fn maybe_prune(&mut self, grew: bool, telemetry: &mut dyn TelemetrySink) -> bool {
        if !grew {
            return false;
        }
        let limit = self.lines_after_prune as f64 * self.limits.prune_growth_limit;
        if self.cycles_since_prune < self.limits.prune_cycle_limit
            && (self.pool.len() as f64) <= limit
        {
            self.cycles_since_prune += 1;
            return false;
        }
        self.prune();
        self.report_status(telemetry);
        true
    }

    fn report_status(&mut self, telemetry: &mut dyn TelemetrySink) {
        let now = Instant::now();
        let wall = now.duration_since(self.status.at).as_secs_f64();
        let game = (self.tick - self.status.tick) as f64 * self.rules.tick_duration;
        let status = PruneStatus {
            ticks: self.tick,
            game_time: self.tick as f64 * self.rules.tick_duration,
            lines_added: self.status.added,
            lines_removed: self.status.removed,
            live_lines: self.pool.len(),
            phases: self.phases.since(&self.status.phases),
            speed: if wall > 0.0 { game / wall } else { 0.0 },
        };
        telemetry.prune_status(&status);

        let snapshot = self.pool.snapshot_columns();
        let max_currency = snapshot.currency.iter().copied().fold(0.0, f64::max);
        if max_currency > self.max_currency {
            self.max_currency = max_currency;
            telemetry.progress(max_currency);
        }

        self.status = StatusMark {
            at: now,
            tick: self.tick,
            phases: self.phases,
            added: 0,
            removed: 0,
        };
    }

    // ── Termination ────────────────────────────────────────────────────

    fn is_winner(&self, line: usize) -> bool {
        self.pool.purchase_count(line, self.rules.top_tier()) >= self.rules.win_threshold
    }

    /// Check the win condition on every line.
    ///
    /// When some line wins, lines are ordered by tier 1 amount (largest
    /// first) and the first winner in that order is returned.
    pub fn detect_winner(&mut self) -> Option<Winner> {
        let count = (0..self.pool.len())
            .filter(|&line| self.is_winner(line))
            .count();
        if count == 0 {
            return None;
        }
        self.pool.reorder(SortKey::Tier(1), true);
        let line = (0..self.pool.len()).find(|&line| self.is_winner(line))?;
        Some(Winner {
            line,
            count,
            overflowed: false,
        })
    }

    /// Overflow path: apply one tick line by line without the finiteness
    /// check, order lines by tier 1 amount and take every line whose
    /// currency left the representable range as a winner.
    pub fn overflow_winner(&mut self) -> Result<Winner, SimError> {
        let started = Instant::now();
        batch::unchecked_tick(self.pool.tick_columns(), self.rules.tick_duration);
        self.tick += 1;
        self.pool.reorder(SortKey::Tier(1), true);
        let winners: Vec<usize> = (0..self.pool.len())
            .filter(|&line| !self.pool.currency(line).is_finite())
            .collect();
        self.phases.tick += started.elapsed();
        match winners.first() {
            Some(&line) => Ok(Winner {
                line,
                count: winners.len(),
                overflowed: true,
            }),
            None => Err(SimError::NumericOverflow { tick: self.tick }),
        }
    }

    /// One cycle: tick, buy, sacrifice, maybe prune, then look for winners.
    pub fn cycle(&mut self, telemetry: &mut dyn TelemetrySink) -> Result<Option<Winner>, SimError> {
        self.phase = EnginePhase::Advancing;
        match self.tick() {
            Ok(()) => {}
            Err(SimError::NumericOverflow { tick }) => {
                debug!(tick, lines = self.pool.len(), "Tick overflowed, scanning for overflow winners");
                return self.overflow_winner().map(Some);
            }
            Err(err) => return Err(err),
        }
        let added = self.apply_purchases()? + self.apply_sacrifices();
        self.status.added += added;
        self.maybe_prune(added > 0, telemetry);
        Ok(self.detect_winner())
    }

    /// Run until some line wins.
    pub fn run(
        mut self,
        telemetry: &mut dyn TelemetrySink,
        host: &dyn HostProbe,
    ) -> Result<RunResult, SimError> {
        let scenario = self.rules.scenario;
        telemetry.run_started(&RunStart {
            scenario: &scenario,
            purchase_policy: self.purchase_policy.name(),
            sacrifice_policy: self.sacrifice_policy.name(),
            target_currency: self.rules.target_currency(),
        });
        info!(
            scenario = %scenario,
            tiers = self.rules.tiers,
            win_threshold = self.rules.win_threshold,
            "Simulation started"
        );

        let started = Instant::now();
        self.status.at = started;
        let mut peak_memory_mb = host.peak_memory_mb();
        let mut sampled_at = self.prunes;
        let winner = loop {
            if let Some(winner) = self.cycle(telemetry)? {
                break winner;
            }
            // one memory sample per prune
            if self.prunes != sampled_at {
                sampled_at = self.prunes;
                peak_memory_mb = peak_memory_mb.max(host.peak_memory_mb());
            }
        };
        let elapsed = started.elapsed();
        self.phase = EnginePhase::Terminated;
        self.report_status(telemetry);
        peak_memory_mb = peak_memory_mb.max(host.peak_memory_mb());

        if winner.overflowed {
            warn!(tick = self.tick, winners = winner.count, "Run ended on numeric overflow");
        }
        let result = self.into_result(winner, elapsed, peak_memory_mb, host.cpu_brand());
        telemetry.run_finished(&result);
        Ok(result)
    }

    fn into_result(
        self,
        winner: Winner,
        elapsed: Duration,
        peak_memory_mb: f64,
        cpu: String,
    ) -> RunResult {
        RunResult {
            scenario: self.rules.scenario,
            tick_duration: self.rules.tick_duration,
            ticks: self.tick,
            sacrifice_enabled: self.sacrifice_active(),
            purchase_policy: self.purchase_policy.name().to_string(),
            sacrifice_policy: self.sacrifice_policy.name().to_string(),
            sacrifice_step: self.sacrifice_policy.step(),
            winners: winner.count,
            overflowed: winner.overflowed,
            winner: self.pool.snapshot(winner.line),
            stats: SearchStats {
                states_created: self.pool.created(),
                elapsed,
                phases: self.phases,
                peak_memory_mb,
                cpu,
            },
        }
    }
}
