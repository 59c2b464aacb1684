use std::io::BufRead;
use std::time::Instant;

use log::{debug, info, warn};
use thiserror::Error;

use crate::optical_network::connections::ConnectionLedger;
use crate::optical_network::fragmentation::mean_fragmentation;
use crate::optical_network::ops::{self, Outcome, Request, RsaConfig};
use crate::optical_network::spectrum::SlotLedger;
use crate::optical_network::topology::{Topology, TopologyError};

#[derive(Error, Debug)]
pub enum TraceError {
    // a request naming an unknown node is a contract violation, the run aborts
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error("failed reading request trace: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
    Add,
    Expand,
    Reduce,
    Delete,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SimStats {
    pub requests: usize,
    pub add_times: usize,
    pub expand_times: usize,
    pub reduce_times: usize,
    pub delete_times: usize,
    pub blocks: usize,
    pub undefined: usize,
}

impl SimStats {
    // undefined requests do not count towards the offered load
    pub fn block_rate(&self) -> f64 {
        let effective = self.requests - self.undefined;
        if effective == 0 {
            return 0.0;
        }
        self.blocks as f64 / effective as f64
    }
}

// closed-trace simulator: one request at a time, in arrival order,
// every mutation fully applied or fully absent before the next line
pub struct Simulation<'a> {
    topology: &'a Topology,
    slots: SlotLedger,
    connections: ConnectionLedger,
    config: RsaConfig,
    stats: SimStats,
    interval: SimStats,
}

impl<'a> Simulation<'a> {
    pub fn new(topology: &'a Topology, slots_per_link: usize, config: RsaConfig) -> Self {
        Self {
            topology,
            slots: SlotLedger::new(topology.links_len(), slots_per_link),
            connections: ConnectionLedger::new(),
            config,
            stats: SimStats::default(),
            interval: SimStats::default(),
        }
    }

    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    pub fn slots(&self) -> &SlotLedger {
        &self.slots
    }

    pub fn connections(&self) -> &ConnectionLedger {
        &self.connections
    }

    // sign and pair history pick the operation
    pub fn classify(&self, request: &Request) -> RequestKind {
        let known = self.connections.has_pair(request.src, request.dst);
        if request.capacity == 0.0 {
            RequestKind::Delete
        } else if request.capacity < 0.0 {
            RequestKind::Reduce
        } else if known {
            RequestKind::Expand
        } else {
            RequestKind::Add
        }
    }

    fn count(&mut self, kind: RequestKind, outcome: Outcome) {
        for stats in [&mut self.stats, &mut self.interval] {
            match (kind, outcome) {
                (RequestKind::Add, _) => stats.add_times += 1,
                (RequestKind::Expand, _) => stats.expand_times += 1,
                (RequestKind::Reduce, Outcome::Provisioned) => stats.reduce_times += 1,
                (RequestKind::Delete, Outcome::Provisioned) => stats.delete_times += 1,
                _ => {}
            }
            // a blocked expand is not a block yet, the add fallback decides
            if outcome == Outcome::Blocked && kind != RequestKind::Expand {
                stats.blocks += 1;
            }
            if outcome == Outcome::Undefined {
                stats.undefined += 1;
            }
        }
    }

    // run one request to completion, including the expand-to-add fallback
    // returns the classified kind alongside the final outcome
    pub fn dispatch(&mut self, request: &Request) -> (RequestKind, Outcome) {
        self.stats.requests += 1;
        self.interval.requests += 1;
        let kind = self.classify(request);
        let mut outcome = match kind {
            RequestKind::Add => {
                ops::add(self.topology, &mut self.slots, &mut self.connections, request)
            }
            RequestKind::Expand => {
                ops::expand(&mut self.slots, &mut self.connections, request, &self.config)
            }
            RequestKind::Reduce => ops::reduce(
                self.topology,
                &mut self.slots,
                &mut self.connections,
                request,
                &self.config,
            ),
            RequestKind::Delete => ops::delete(&mut self.slots, &mut self.connections, request),
        };
        self.count(kind, outcome);

        // a full expand failure falls back to a fresh lightpath
        if kind == RequestKind::Expand && outcome == Outcome::Blocked {
            outcome = ops::add(self.topology, &mut self.slots, &mut self.connections, request);
            self.count(RequestKind::Add, outcome);
        }
        (kind, outcome)
    }

    fn report_interval(&mut self, elapsed_secs: f64) {
        let s = &self.stats;
        info!(
            "after {} requests: add={} expand={} reduce={} delete={}",
            s.requests, s.add_times, s.expand_times, s.reduce_times, s.delete_times
        );
        let i = &self.interval;
        info!(
            "last {} requests: add={} expand={} reduce={} delete={} ({elapsed_secs:.6}s)",
            i.requests, i.add_times, i.expand_times, i.reduce_times, i.delete_times
        );
        info!(
            "block rate {:.4}, active connections {}, mean fragmentation {:.4}",
            s.block_rate(),
            self.connections.active_count(),
            mean_fragmentation(&self.slots)
        );
        self.interval = SimStats::default();
    }

    // trace line format: source destination capacity
    // malformed lines are warned about and skipped, unknown nodes abort
    pub fn run_trace<R: BufRead>(
        &mut self,
        reader: R,
        report_every: usize,
    ) -> Result<SimStats, TraceError> {
        let mut timer = Instant::now();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            let parsed = (|| {
                let src = fields.next()?;
                let dst = fields.next()?;
                let capacity: f64 = fields.next()?.parse().ok()?;
                Some((src, dst, capacity))
            })();
            let Some((src, dst, capacity)) = parsed else {
                warn!("trace line {}: malformed, skipped: {line:?}", line_no + 1);
                continue;
            };
            let request = Request {
                src: self.topology.node(src)?,
                dst: self.topology.node(dst)?,
                capacity,
            };
            let (kind, outcome) = self.dispatch(&request);
            debug!(
                "request {}: {kind:?} {src}->{dst} cap={capacity} -> {outcome:?}",
                self.stats.requests
            );
            if report_every > 0 && self.stats.requests % report_every == 0 {
                self.report_interval(timer.elapsed().as_secs_f64());
                timer = Instant::now();
            }
        }
        Ok(self.stats)
    }
}
