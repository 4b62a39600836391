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

use std::collections::HashMap;
use chrono::{DateTime,Utc};
use serde::{Serialize,Deserialize};
use tracing::debug;

use crate::{datetime::AcdmTime, pilot::{Pilot,ScopeFlightplanUpdate}};

/// observations further away from their origin are not departures we sequence
pub const MAX_DISTANCE_FROM_ORIGIN_NM: f64 = 10.0;

/// what the scope (flightplan/radar) collaborator reports for one active flight
#[derive(Serialize,Deserialize,Debug,Clone,Default)]
#[serde(default)]
pub struct ScopeObservation {
    pub callsign: String,
    pub latitude: f64,
    pub longitude: f64,
    pub true_altitude: i32,
    pub is_valid: bool,
    pub distance_from_origin: f64, // nm
    pub origin: String,
    pub destination: String,
    pub runway: String,
    pub suggested_runway: String,
    pub sid: String,
    pub suggested_sid: String,
    pub eobt: String, // raw flightplan HHMM
}

impl ScopeObservation {
    pub fn is_departure_candidate (&self)->bool {
        self.is_valid && self.distance_from_origin <= MAX_DISTANCE_FROM_ORIGIN_NM
    }

    /// the scope slot value for this observation, or None if this is not something we track.
    /// Assigned runway/SID take precedence over the suggested ones. An EOBT we can't read becomes `now`
    pub fn to_pilot (&self, now: DateTime<Utc>)->Option<Pilot> {
        if !self.is_departure_candidate() { return None }

        let eobt = AcdmTime::from_hhmm( &self.eobt, now.date_naive()).unwrap_or_else( || AcdmTime::new( now));

        Some( Pilot {
            callsign: self.callsign.clone(),
            last_update: AcdmTime::new( now),
            latitude: self.latitude,
            longitude: self.longitude,
            true_altitude: self.true_altitude,
            distance_from_origin: self.distance_from_origin,
            origin: normalized_icao( &self.origin),
            destination: normalized_icao( &self.destination),
            runway: non_empty_or( &self.runway, &self.suggested_runway),
            sid: non_empty_or( &self.sid, &self.suggested_sid),
            eobt,
            tobt: eobt,
            ..Pilot::default()
        })
    }
}

/// ICAO codes as the active airport set holds them
pub fn normalized_icao (icao: &str)->String {
    icao.trim().to_uppercase()
}

fn non_empty_or (primary: &str, fallback: &str)->String {
    if primary.trim().is_empty() { fallback.to_string() } else { primary.to_string() }
}

/// drop updates for flights that do not depart from an active airport, then collapse updates per callsign
/// to the one issued last. The result keeps the order in which callsigns first appeared
pub fn consolidate_scope_updates (updates: Vec<ScopeFlightplanUpdate>, active_airports: &[String])->Vec<ScopeFlightplanUpdate> {
    let mut result: Vec<ScopeFlightplanUpdate> = Vec::with_capacity( updates.len());
    let mut index: HashMap<String,usize> = HashMap::new();

    for update in updates {
        let origin = normalized_icao( &update.pilot.origin);
        if !active_airports.iter().any( |a| *a == origin) {
            debug!("ignoring scope update for {} (origin {} not active)", update.pilot.callsign, update.pilot.origin);
            continue;
        }

        match index.get( &update.pilot.callsign) {
            Some(&i) => {
                if update.issued > result[i].issued {
                    debug!("newer scope update for {}", update.pilot.callsign);
                    result[i] = update;
                } else {
                    debug!("skipped old scope update for {}", update.pilot.callsign);
                }
            }
            None => {
                index.insert( update.pilot.callsign.clone(), result.len());
                result.push( update);
            }
        }
    }

    result
}
