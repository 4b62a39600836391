/*
 * Copyright © 2025, United States Government, as represented by the Administrator of 
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License"); 
 * you may not use this file except in compliance with the License. You may obtain a copy 
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

//! the periodic driver that merges scope observations, controller commands and backend data into the
//! [`PilotStore`], and (if we are master) tells the backend about what changed locally.
//!
//! Each pass works on a detached snapshot of the store. Commands are applied to that snapshot and never to the
//! live map, so the final publish can't overwrite an optimistic edit made while the pass was running. A flight
//! that received a command keeps its optimistic ACDM times for the rest of that pass, i.e. backend data fetched in
//! the same pass (which might not reflect the command yet) does not revert them. From the next pass on the backend
//! is authoritative again.

use std::{collections::{HashMap,HashSet}, sync::Arc, sync::atomic::{AtomicBool,AtomicU64,Ordering}, time::Duration};
use tokio::{task::{JoinHandle,JoinSet}, time::{Instant,MissedTickBehavior,interval_at}};
use tracing::{debug,error,info,warn};

use crate::{
    arbiter::MasterArbiter,
    backend::{Backend,HttpBackend},
    command::{BackendRequest,CommandEffect,apply_optimistic},
    config::{VacdmConfig,validate_cycle_seconds},
    datetime::AcdmTime,
    delta::{Delta,encode_delta},
    errors::{Result,VacdmError,op_failed},
    pilot::{Pilot,PilotSlots},
    scope::consolidate_scope_updates,
    store::{PilotMap,PilotStore},
};

/// the loop wakes up once per second, passes run every `update_cycle_seconds` wake ups
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// what happened during one reconciliation pass
#[derive(Debug,Clone,Default,PartialEq)]
pub struct PassReport {
    pub commands_applied: usize,
    pub commands_dropped: usize,
    pub scope_updates: usize,
    pub backend_pilots: Option<usize>, // None if the backend could not be read
    pub removed: usize,
    pub integrity_errors: usize,
    pub created: usize,
    pub patched: usize,
    pub published: bool,
}

pub struct Reconciler {
    store: Arc<PilotStore>,
    arbiter: Arc<MasterArbiter>,
    backend: Arc<dyn Backend>,
    update_cycle_seconds: AtomicU64,
}

impl Reconciler {
    pub fn new (store: Arc<PilotStore>, arbiter: Arc<MasterArbiter>, backend: Arc<dyn Backend>, update_cycle_seconds: u64)->Result<Self> {
        let update_cycle_seconds = AtomicU64::new( validate_cycle_seconds( update_cycle_seconds)?);
        Ok( Reconciler { store, arbiter, backend, update_cycle_seconds })
    }

    pub fn from_config (config: &VacdmConfig, store: Arc<PilotStore>, arbiter: Arc<MasterArbiter>, backend: Arc<dyn Backend>)->Result<Self> {
        Reconciler::new( store, arbiter, backend, config.update_cycle_seconds)
    }

    pub fn store (&self)->&Arc<PilotStore> { &self.store }
    pub fn arbiter (&self)->&Arc<MasterArbiter> { &self.arbiter }
    pub fn backend (&self)->&Arc<dyn Backend> { &self.backend }

    pub fn update_cycle_seconds (&self)->u64 { self.update_cycle_seconds.load( Ordering::Relaxed) }

    /// change the pass frequency. Out of range values are rejected and leave the current cycle untouched
    pub fn set_update_cycle_seconds (&self, secs: u64)->Result<String> {
        let secs = validate_cycle_seconds( secs)?;
        self.update_cycle_seconds.store( secs, Ordering::Relaxed);

        let msg = if secs == 1 { "vACDM updating every second".to_string() } else { format!("vACDM updating every {} seconds", secs) };
        info!("{}", msg);
        Ok(msg)
    }

    /// one complete reconciliation pass. Backend failures are logged and degrade to "no data", nothing in here
    /// aborts the pass
    pub async fn run_pass (&self)->PassReport {
        let mut report = PassReport::default();
        let mut snapshot = self.store.snapshot();
        let is_master = self.arbiter.is_master();

        let mut writes = JoinSet::new();
        let commanded = self.apply_commands( &mut snapshot.pilots, is_master, &mut writes, &mut report);

        self.apply_scope_updates( &mut snapshot.pilots, &mut report);

        self.consolidate_with_backend( &mut snapshot.pilots, &commanded, &mut report).await;

        // command writes have to be out before we transmit deltas for the same flights
        while let Some(res) = writes.join_next().await {
            if let Err(e) = res { warn!("command write task failed: {}", e); }
        }

        if is_master {
            if self.arbiter.is_master() && self.store.generation() == snapshot.generation {
                self.transmit_deltas( &snapshot.pilots, &mut report).await;
            } else {
                debug!("role changed during pass, skipping transmission");
            }
        }

        report.published = self.store.publish( snapshot);
        debug!("reconciliation pass: {:?}", report);
        report
    }

    /* #region pass steps ***************************************************************************************/

    fn apply_commands (&self, pilots: &mut PilotMap, is_master: bool, writes: &mut JoinSet<()>, report: &mut PassReport)->HashSet<String> {
        let mut commanded: HashSet<String> = HashSet::new();
        let mut requests: HashMap<String,Vec<BackendRequest>> = HashMap::new();
        let now = AcdmTime::now();

        for cmd in self.store.drain_commands() {
            let Some(slots) = pilots.get_mut( &cmd.callsign).filter( |_| is_master) else {
                debug!("dropping command {} (unknown flight or not master)", cmd);
                report.commands_dropped += 1;
                continue;
            };

            let request = BackendRequest::for_command( &slots.consolidated, &cmd);
            match apply_optimistic( &mut slots.consolidated, &cmd.kind, now) {
                CommandEffect::Applied => { commanded.insert( cmd.callsign.clone()); }
                CommandEffect::RemovePilot => {
                    pilots.remove( &cmd.callsign);
                    commanded.remove( &cmd.callsign);
                }
            }
            info!("sending command {}", cmd);
            requests.entry( cmd.callsign).or_default().push( request);
            report.commands_applied += 1;
        }

        // one task per flight so that writes for the same flight stay in order
        for (callsign,reqs) in requests {
            let backend = self.backend.clone();
            writes.spawn( async move {
                for req in reqs {
                    if let Err(e) = req.send( backend.as_ref(), &callsign).await {
                        warn!("failed to send command for {}: {}", callsign, e);
                    }
                }
            });
        }

        commanded
    }

    fn apply_scope_updates (&self, pilots: &mut PilotMap, report: &mut PassReport) {
        let updates = consolidate_scope_updates( self.store.drain_scope_updates(), &self.store.active_airports());

        for update in updates {
            let pilot = update.pilot;
            report.scope_updates += 1;

            if let Some(slots) = pilots.get_mut( &pilot.callsign) {
                debug!("updated scope data of {}", pilot.callsign);
                slots.scope = pilot;
            } else {
                debug!("added {}", pilot.callsign);
                pilots.insert( pilot.callsign.clone(), PilotSlots::new_from_scope( pilot));
            }
        }
    }

    async fn consolidate_with_backend (&self, pilots: &mut PilotMap, commanded: &HashSet<String>, report: &mut PassReport) {
        let airports = self.store.active_airports();
        let mut fetched = match self.backend.get_pilots( &airports).await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!("failed to retrieve backend pilots: {}", e);
                return
            }
        };
        report.backend_pilots = Some( fetched.len());

        pilots.retain( |callsign, slots| {
            // flights the backend flagged as inactive in the previous pass go once they disappear
            let mut remove = slots.server.inactive;

            if let Some(idx) = fetched.iter().position( |p| p.callsign == *callsign) {
                slots.server = fetched.swap_remove( idx);
                remove = false;

                if let Err(e) = consolidate_slots( slots, commanded.contains( callsign)) {
                    error!("{}", e);
                    report.integrity_errors += 1;
                }
            }

            if remove {
                debug!("removing inactive flight {}", callsign);
                report.removed += 1;
            }
            !remove
        });
    }

    async fn transmit_deltas (&self, pilots: &PilotMap, report: &mut PassReport) {
        let mut callsigns: Vec<&String> = pilots.keys().collect();
        callsigns.sort();

        for callsign in callsigns {
            let Some(slots) = pilots.get( callsign) else { continue };

            match encode_delta( slots) {
                Delta::Create(record) => {
                    match self.backend.post_pilot( &record).await {
                        Ok(()) => report.created += 1,
                        Err(e) => warn!("failed to post {}: {}", callsign, e),
                    }
                }
                Delta::Update(patch) => {
                    match self.backend.patch_pilot( callsign, &patch).await {
                        Ok(()) => report.patched += 1,
                        Err(e) => warn!("failed to patch {}: {}", callsign, e),
                    }
                }
                Delta::NoOp => {}
            }
        }
    }

    /* #endregion pass steps */
}

/// merge server and scope slot into the consolidated view. With `keep_acdm` set the times and TOBT state commands
/// can change are left alone (they already carry an optimistic edit), everything else still comes from the server. A scope/server callsign mismatch leaves the consolidated
/// slot untouched
pub fn consolidate_slots (slots: &mut PilotSlots, keep_acdm: bool)->Result<()> {
    if slots.scope.callsign != slots.server.callsign {
        return Err( VacdmError::IntegrityError( format!("callsign mismatch during consolidation: {}, {}", slots.scope.callsign, slots.server.callsign)))
    }

    let consolidated: &mut Pilot = &mut slots.consolidated;
    if keep_acdm {
        consolidated.merge_server_status( &slots.server);
    } else {
        consolidated.merge_server_fields( &slots.server);
    }
    consolidated.merge_scope_fields( &slots.scope);
    debug!("consolidated {}", slots.server.callsign);
    Ok(())
}

/* #region loop *********************************************************************************************/

/// the `counter`-th wake up runs a pass iff it is a multiple of the cycle length
#[inline]
pub fn is_pass_due (counter: u64, update_cycle_seconds: u64)->bool {
    update_cycle_seconds > 0 && counter % update_cycle_seconds == 0
}

/// the background task that drives a [`Reconciler`]. Stopping does not abort a running pass, the task just won't
/// start a new one
pub struct ReconciliationLoop {
    stop: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl ReconciliationLoop {
    /// spawn the loop task. This has to be called from within a tokio runtime
    pub fn start (reconciler: Arc<Reconciler>)->Self {
        let stop = Arc::new( AtomicBool::new(false));
        let task = tokio::spawn( run_loop( reconciler, stop.clone()));
        info!("reconciliation loop started");
        ReconciliationLoop { stop, task: Some(task) }
    }

    pub fn stop (&self) {
        self.stop.store( true, Ordering::Release);
    }

    pub fn is_stopped (&self)->bool { self.stop.load( Ordering::Acquire) }

    /// set the stop flag and wait for the loop task to terminate
    pub async fn shutdown (mut self)->Result<()> {
        self.stop();
        if let Some(task) = self.task.take() {
            task.await.map_err( |e| op_failed!("reconciliation loop terminated abnormally: {}", e))?;
        }
        info!("reconciliation loop stopped");
        Ok(())
    }
}

impl Drop for ReconciliationLoop {
    /// a dropped loop stops at its next wake up
    fn drop (&mut self) {
        self.stop();
    }
}

async fn run_loop (reconciler: Arc<Reconciler>, stop: Arc<AtomicBool>) {
    let mut interval = interval_at( Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
    interval.set_missed_tick_behavior( MissedTickBehavior::Delay);
    let mut counter: u64 = 1;

    loop {
        interval.tick().await;

        if stop.load( Ordering::Acquire) { break }
        if reconciler.store().is_paused() { continue }

        let due = is_pass_due( counter, reconciler.update_cycle_seconds());
        counter += 1;
        if due {
            reconciler.run_pass().await;
        }
    }
}

/* #endregion loop */

/// re-address the live backend. The store is paused while the connection is replaced and the API version re-checked
pub async fn change_server_url (store: &PilotStore, backend: &HttpBackend, url: &str)->Result<()> {
    store.pause();
    let result = match backend.change_server_address( url) {
        Ok(()) => backend.check_api().await,
        Err(e) => Err(e),
    };
    store.resume();

    if let Err(e) = &result {
        warn!("backend at {} not usable: {}", url, e);
    }
    result
}
