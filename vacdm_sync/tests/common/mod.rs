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

#![allow(unused)]

use std::sync::{Arc, Mutex, atomic::{AtomicBool,AtomicUsize,Ordering}};
use async_trait::async_trait;
use chrono::NaiveDate;

use vacdm_sync::{
    AcdmTime, Backend, MasterArbiter, Pilot, PilotSlots, PilotStore, Reconciler, VacdmError, Result,
    datetime::utc_today,
    wire::{NewPilotRecord,PilotPatch,ServerConfig},
};

/// a backend write as seen by the [`MockBackend`]
#[derive(Debug,Clone,PartialEq)]
pub enum Call {
    Post(NewPilotRecord),
    Patch(String,PilotPatch),
    Delete(String),
}

/// in-memory backend that serves a fixed pilot list and records all writes
#[derive(Default)]
pub struct MockBackend {
    pub pilots: Mutex<Vec<Pilot>>,
    pub calls: Mutex<Vec<Call>>,
    pub fail_reads: AtomicBool,
    pub reads: AtomicUsize,
}

impl MockBackend {
    pub fn with_pilots (pilots: Vec<Pilot>)->Self {
        MockBackend { pilots: Mutex::new(pilots), ..MockBackend::default() }
    }

    pub fn set_pilots (&self, pilots: Vec<Pilot>) {
        *self.pilots.lock().unwrap() = pilots;
    }

    pub fn calls (&self)->Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record (&self, call: Call)->Result<()> {
        self.calls.lock().unwrap().push( call);
        Ok(())
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn check_api (&self)->Result<()> { Ok(()) }

    async fn server_config (&self)->Result<ServerConfig> {
        Ok( ServerConfig { server_name: "mock".to_string(), allow_sim_session: true, allow_obs_master: false })
    }

    async fn get_pilots (&self, airports: &[String])->Result<Vec<Pilot>> {
        self.reads.fetch_add( 1, Ordering::Relaxed);
        if self.fail_reads.load( Ordering::Relaxed) {
            return Err( VacdmError::OpFailedError( "backend down".to_string()))
        }
        let pilots = self.pilots.lock().unwrap();
        Ok( pilots.iter().filter( |p| airports.is_empty() || airports.contains( &p.origin)).cloned().collect() )
    }

    async fn post_pilot (&self, record: &NewPilotRecord)->Result<()> { self.record( Call::Post( record.clone())) }

    async fn patch_pilot (&self, callsign: &str, patch: &PilotPatch)->Result<()> { self.record( Call::Patch( callsign.to_string(), patch.clone())) }

    async fn delete_pilot (&self, callsign: &str)->Result<()> { self.record( Call::Delete( callsign.to_string())) }
}

pub struct Setup {
    pub store: Arc<PilotStore>,
    pub arbiter: Arc<MasterArbiter>,
    pub backend: Arc<MockBackend>,
    pub reconciler: Reconciler,
}

pub fn setup (master: bool, backend: MockBackend)->Setup {
    let store = Arc::new( PilotStore::new());
    store.set_active_airports( ["EDDF"]);
    let arbiter = Arc::new( MasterArbiter::new( store.clone(), master));
    let backend = Arc::new( backend);
    let reconciler = Reconciler::new( store.clone(), arbiter.clone(), backend.clone(), 1).unwrap();

    Setup { store, arbiter, backend, reconciler }
}

/// today at the given UTC time
pub fn today_at (hour: u32, minute: u32)->AcdmTime {
    AcdmTime::at( utc_today(), hour, minute).unwrap()
}

pub fn departure (callsign: &str)->Pilot {
    Pilot {
        callsign: callsign.to_string(),
        latitude: 50.0333, longitude: 8.5706,
        origin: "EDDF".to_string(), destination: "LOWW".to_string(),
        runway: "25C".to_string(), sid: "TOBAK7L".to_string(),
        eobt: today_at(12,0), tobt: today_at(12,0),
        ..Pilot::default()
    }
}

/// a flight the backend already knows, with all three views in agreement
pub fn known_slots (pilot: Pilot)->PilotSlots {
    PilotSlots { consolidated: pilot.clone(), scope: pilot.clone(), server: pilot }
}

pub fn seed (store: &PilotStore, slots: Vec<PilotSlots>) {
    let mut snapshot = store.snapshot();
    for s in slots {
        snapshot.pilots.insert( s.consolidated.callsign.clone(), s);
    }
    assert!( store.publish( snapshot));
}
