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

use std::sync::{Arc, Mutex, atomic::{AtomicBool,Ordering}};
use serde::{Serialize,Deserialize};
use tracing::{info,warn};

use crate::{errors::{Result,VacdmError}, store::PilotStore, wire::ServerConfig};

pub const NOT_CONNECTED_MSG: &str = "You are not logged in to the VATSIM network";
pub const OBSERVER_NOT_ALLOWED_MSG: &str = "You are logged in as Observer and Server does not allow Observers to be Master";
pub const SWEATBOX_NOT_ALLOWED_MSG: &str = "You are logged in on a Sweatbox Server and Server does not allow Sweatbox connections";

/// the network connection of the local user, as reported by the host
#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq,Eq,Default)]
#[serde(default)]
pub struct ConnectionInfo {
    pub connected: bool,
    pub observer: bool,
    pub sweatbox: bool,
}

impl ConnectionInfo {
    /// the reason why this connection can't be master under the given server config, None if it can
    pub fn master_refusal (&self, server: &ServerConfig)->Option<&'static str> {
        if !self.connected {
            Some(NOT_CONNECTED_MSG)
        } else if self.observer && !server.allow_obs_master {
            Some(OBSERVER_NOT_ALLOWED_MSG)
        } else if self.sweatbox && !server.allow_sim_session {
            Some(SWEATBOX_NOT_ALLOWED_MSG)
        } else {
            None
        }
    }
}

/// the single writer flag. Only the master pushes changes to the backend, and every role change invalidates
/// all locally cached pilot state
#[derive(Debug)]
pub struct MasterArbiter {
    store: Arc<PilotStore>,
    master: AtomicBool,
    switch_lock: Mutex<()>, // serializes role changes with their store clear
}

impl MasterArbiter {
    pub fn new (store: Arc<PilotStore>, initial: bool)->Self {
        MasterArbiter { store, master: AtomicBool::new(initial), switch_lock: Mutex::new(()) }
    }

    pub fn is_master (&self)->bool { self.master.load( Ordering::Acquire) }

    /// promote to master if the connection is eligible under the backend's config. Returns true if the role changed,
    /// a `NotEligible` error with the user facing reason otherwise (the role is not touched)
    pub fn request_master (&self, conn: &ConnectionInfo, server: &ServerConfig)->Result<bool> {
        if let Some(reason) = conn.master_refusal( server) {
            warn!("cannot upgrade to master: {}", reason);
            return Err( VacdmError::NotEligible( reason.to_string()))
        }
        Ok( self.set_master( true))
    }

    /// returns true if the role actually changed (and hence the store was cleared).
    /// This does not check eligibility, use [`MasterArbiter::request_master`] for user requests
    pub fn set_master (&self, master: bool)->bool {
        let _guard = self.switch_lock.lock().unwrap_or_else( |poisoned| poisoned.into_inner());

        if self.master.swap( master, Ordering::AcqRel) != master {
            info!("switched to {}", role_name(master));
            self.store.clear_all();
            true
        } else {
            false
        }
    }
}

pub fn role_name (master: bool)->&'static str {
    if master { "master" } else { "slave" }
}
