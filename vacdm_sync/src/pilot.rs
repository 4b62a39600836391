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

use std::fmt;
use chrono::{DateTime,Utc};
use serde::{Serialize,Deserialize};

use crate::datetime::AcdmTime;

/// TOBT confirmation state as reported by the backend
#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq,Eq,Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TobtState {
    Guess,
    Flightplan,
    Confirmed,
    Now,
    Manual,
    #[default]
    #[serde(other)]
    Unknown,
}

impl TobtState {
    pub fn is_confirmed (&self)->bool { *self == TobtState::Confirmed }
}

#[derive(Serialize,Deserialize,Debug,Clone,PartialEq,Eq)]
pub struct EcfmpMeasure {
    pub ident: String,
    pub value: i64,
}

/// one view of a tracked flight. Each flight is held as three of these (see [`PilotSlots`])
#[derive(Debug,Clone,PartialEq,Default)]
pub struct Pilot {
    pub callsign: String,
    pub last_update: AcdmTime,
    pub inactive: bool,

    // position
    pub latitude: f64,
    pub longitude: f64,
    pub true_altitude: i32,
    pub distance_from_origin: f64,
    pub taxizone_is_taxiout: bool,

    // flightplan and clearance
    pub origin: String,
    pub destination: String,
    pub runway: String,
    pub sid: String,

    // ACDM procedure
    pub eobt: AcdmTime,
    pub tobt: AcdmTime,
    pub tobt_state: TobtState,
    pub ctot: AcdmTime,
    pub ttot: AcdmTime,
    pub tsat: AcdmTime,
    pub exot: Option<i64>, // minutes, None if not set
    pub asat: AcdmTime,
    pub aobt: AcdmTime,
    pub atot: AcdmTime,
    pub asrt: AcdmTime,
    pub aort: AcdmTime,

    pub measures: Vec<EcfmpMeasure>,
    pub has_booking: bool,
}

impl Pilot {
    pub fn is_blank (&self)->bool { self.callsign.is_empty() }

    /// copy the fields the backend is authoritative for
    pub fn merge_server_fields (&mut self, server: &Pilot) {
        self.merge_server_status( server);
        self.last_update = server.last_update;

        self.tobt = server.tobt;
        self.tobt_state = server.tobt_state;
        self.ttot = server.ttot;
        self.tsat = server.tsat;
        self.exot = server.exot;
        self.asat = server.asat;
        self.aobt = server.aobt;
        self.atot = server.atot;
        self.asrt = server.asrt;
        self.aort = server.aort;
    }

    /// the backend owned fields no controller command changes
    pub fn merge_server_status (&mut self, server: &Pilot) {
        self.inactive = server.inactive;
        self.eobt = server.eobt;
        self.ctot = server.ctot;

        self.measures = server.measures.clone();
        self.has_booking = server.has_booking;
        self.taxizone_is_taxiout = server.taxizone_is_taxiout;
    }

    /// copy the fields the local flightplan/aircraft feed is authoritative for
    pub fn merge_scope_fields (&mut self, scope: &Pilot) {
        self.latitude = scope.latitude;
        self.longitude = scope.longitude;

        self.origin = scope.origin.clone();
        self.destination = scope.destination.clone();
        self.runway = scope.runway.clone();
        self.sid = scope.sid.clone();
    }
}

impl fmt::Display for Pilot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "Pilot( cs: \"{}\", {}->{}, rwy: {}, sid: {}", self.callsign, self.origin, self.destination, self.runway, self.sid)?;
        write!( f, ", eobt: {}, tobt: {} ({:?}), tsat: {}", self.eobt, self.tobt, self.tobt_state, self.tsat)?;
        if self.inactive { write!( f, ", inactive")?; }
        write!( f, ")")
    }
}

/// the three competing views of one flight
#[derive(Debug,Clone,PartialEq,Default)]
pub struct PilotSlots {
    /// the merged view the UI reads and commands mutate
    pub consolidated: Pilot,
    /// last state observed from the local flightplan feed
    pub scope: Pilot,
    /// last state returned by the backend
    pub server: Pilot,
}

impl PilotSlots {
    /// a flight we see for the first time. The backend does not know it yet, hence the blank server slot
    pub fn new_from_scope (pilot: Pilot)->Self {
        PilotSlots { consolidated: pilot.clone(), scope: pilot, server: Pilot::default() }
    }

    pub fn callsign (&self)->&str { self.scope.callsign.as_str() }
}

/// a timestamped observation from the scope feed, waiting to be merged in the next reconciliation pass
#[derive(Debug,Clone)]
pub struct ScopeFlightplanUpdate {
    pub issued: DateTime<Utc>,
    pub pilot: Pilot,
}
