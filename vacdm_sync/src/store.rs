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

use std::{collections::HashMap, sync::{Mutex,MutexGuard,RwLock}, sync::atomic::{AtomicBool,AtomicU64,Ordering}};
use chrono::{DateTime,Utc};
use tracing::{debug,info,warn};

use crate::{
    command::Command,
    datetime::utc_now,
    pilot::{Pilot,PilotSlots,ScopeFlightplanUpdate},
    queue::{CommandQueue,ScopeIngestQueue},
    scope::ScopeObservation,
};

pub type PilotMap = HashMap<String,PilotSlots>;

/// a detached copy of the pilot map together with the store generation it was taken from
#[derive(Debug,Clone,Default)]
pub struct Snapshot {
    pub generation: u64,
    pub pilots: PilotMap,
}

/// the thread safe home of all tracked flights and the queues that feed them.
/// Each shared resource has its own lock, and no lock is ever held across backend calls.
/// The generation is bumped by every [`PilotStore::clear_all`] so that snapshots taken before can't be published
/// back afterwards
#[derive(Debug,Default)]
pub struct PilotStore {
    pilots: Mutex<PilotMap>,
    active_airports: RwLock<Vec<String>>,
    scope_updates: ScopeIngestQueue,
    commands: CommandQueue,
    paused: AtomicBool,
    generation: AtomicU64,
}

impl PilotStore {
    pub fn new ()->Self {
        PilotStore::default()
    }

    fn lock_pilots (&self)->MutexGuard<'_,PilotMap> {
        self.pilots.lock().unwrap_or_else( |poisoned| poisoned.into_inner())
    }

    /* #region queries ******************************************************************************************/

    /// false for unknown callsigns and for everything while the store is paused
    pub fn exists (&self, callsign: &str)->bool {
        !self.is_paused() && self.lock_pilots().contains_key( callsign)
    }

    /// the consolidated view of a flight
    pub fn get (&self, callsign: &str)->Option<Pilot> {
        self.lock_pilots().get( callsign).map( |slots| slots.consolidated.clone())
    }

    pub fn slots (&self, callsign: &str)->Option<PilotSlots> {
        self.lock_pilots().get( callsign).cloned()
    }

    /// callsigns of all tracked flights, sorted
    pub fn list (&self)->Vec<String> {
        let mut list: Vec<String> = self.lock_pilots().keys().cloned().collect();
        list.sort();
        list
    }

    pub fn len (&self)->usize { self.lock_pilots().len() }
    pub fn is_empty (&self)->bool { self.lock_pilots().is_empty() }

    pub fn generation (&self)->u64 { self.generation.load( Ordering::Acquire) }

    /* #endregion queries */

    /* #region active airports **********************************************************************************/

    pub fn set_active_airports<I,S> (&self, airports: I) where I: IntoIterator<Item=S>, S: AsRef<str> {
        let mut list: Vec<String> = airports.into_iter().map( |a| crate::scope::normalized_icao( a.as_ref())).filter( |a| !a.is_empty()).collect();
        list.sort();
        list.dedup();
        info!("active airports: {:?}", list);

        match self.active_airports.write() {
            Ok(mut airports) => *airports = list,
            Err(poisoned) => *poisoned.into_inner() = list,
        }
    }

    pub fn active_airports (&self)->Vec<String> {
        match self.active_airports.read() {
            Ok(airports) => airports.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /* #endregion active airports */

    /* #region pause/clear **************************************************************************************/

    pub fn pause (&self) {
        self.paused.store( true, Ordering::Release);
        debug!("pilot store paused");
    }

    pub fn resume (&self) {
        self.paused.store( false, Ordering::Release);
        debug!("pilot store resumed");
    }

    pub fn is_paused (&self)->bool { self.paused.load( Ordering::Acquire) }

    /// drop all flights and everything queued for them. Queues are cleared while holding the pilot lock so that
    /// a concurrent publish either happens before or gets discarded
    pub fn clear_all (&self) {
        let mut pilots = self.lock_pilots();
        pilots.clear();
        self.scope_updates.clear();
        self.commands.clear();
        self.generation.fetch_add( 1, Ordering::AcqRel);
        info!("cleared all pilot data");
    }

    /* #endregion pause/clear */

    /* #region snapshot/publish *********************************************************************************/

    pub fn snapshot (&self)->Snapshot {
        let pilots = self.lock_pilots();
        Snapshot { generation: self.generation(), pilots: pilots.clone() }
    }

    /// replace the pilot map with the (processed) snapshot. Returns false if the store was cleared since the snapshot was taken
    pub fn publish (&self, snapshot: Snapshot)->bool {
        let mut pilots = self.lock_pilots();
        if snapshot.generation != self.generation() {
            warn!("discarding stale pilot snapshot (generation {} != {})", snapshot.generation, self.generation());
            false
        } else {
            *pilots = snapshot.pilots;
            true
        }
    }

    /* #endregion snapshot/publish */

    /* #region queues *******************************************************************************************/

    pub fn queue_scope_update (&self, update: ScopeFlightplanUpdate) {
        self.scope_updates.push( update);
    }

    /// convert and queue a scope observation. Returns false if the observation was rejected
    pub fn queue_observation (&self, obs: &ScopeObservation)->bool {
        self.queue_observation_at( obs, utc_now())
    }

    pub fn queue_observation_at (&self, obs: &ScopeObservation, issued: DateTime<Utc>)->bool {
        match obs.to_pilot( issued) {
            Some(pilot) => {
                self.queue_scope_update( ScopeFlightplanUpdate { issued, pilot });
                true
            }
            None => false
        }
    }

    pub fn queue_command (&self, cmd: Command) {
        debug!("queued command {}", cmd);
        self.commands.push( cmd);
    }

    pub fn drain_scope_updates (&self)->Vec<ScopeFlightplanUpdate> { self.scope_updates.drain() }
    pub fn drain_commands (&self)->Vec<Command> { self.commands.drain() }

    pub fn pending_scope_updates (&self)->usize { self.scope_updates.len() }
    pub fn pending_commands (&self)->usize { self.commands.len() }

    /* #endregion queues */
}
