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

//! the JSON model of the backend REST API (`/api/v1/..`)

use serde::{Serialize,Deserialize};

use crate::{datetime::AcdmTime, pilot::{Pilot,TobtState,EcfmpMeasure}};

/* #region GET responses ****************************************************************************************/

#[derive(Serialize,Deserialize,Debug,Clone,Default)]
pub struct VersionInfo {
    pub major: i64,
    #[serde(default)]
    pub minor: i64,
    #[serde(default)]
    pub patch: i64,
}

#[derive(Serialize,Deserialize,Debug,Clone,Default,PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    pub server_name: String,
    pub allow_sim_session: bool,
    pub allow_obs_master: bool,
}

#[derive(Serialize,Deserialize,Debug,Clone,Default,PartialEq)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Serialize,Deserialize,Debug,Clone,Default,PartialEq)]
pub struct Flightplan {
    pub departure: String,
    pub arrival: String,
}

#[derive(Serialize,Deserialize,Debug,Clone,Default,PartialEq)]
pub struct Clearance {
    pub dep_rwy: String,
    pub sid: String,
}

#[derive(Serialize,Deserialize,Debug,Clone,Default)]
#[serde(default)]
pub struct Vacdm {
    pub eobt: AcdmTime,
    pub tobt: AcdmTime,
    pub tobt_state: TobtState,
    pub ctot: AcdmTime,
    pub ttot: AcdmTime,
    pub tsat: AcdmTime,
    pub exot: Option<i64>, // minutes
    pub asat: AcdmTime,
    pub aobt: AcdmTime,
    pub atot: AcdmTime,
    pub asrt: AcdmTime,
    pub aort: AcdmTime,
    #[serde(rename = "taxizoneIsTaxiout")]
    pub taxizone_is_taxiout: bool,
}

/// a pilot as returned by `GET /api/v1/pilots`
#[derive(Serialize,Deserialize,Debug,Clone,Default)]
#[serde(rename_all = "camelCase")]
pub struct PilotRecord {
    pub callsign: String,
    #[serde(default)]
    pub inactive: bool,
    #[serde(default)]
    pub updated_at: AcdmTime,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub flightplan: Flightplan,
    #[serde(default)]
    pub clearance: Clearance,
    #[serde(default)]
    pub vacdm: Vacdm,
    #[serde(default)]
    pub measures: Vec<EcfmpMeasure>,
    #[serde(default)]
    pub has_booking: bool,
}

impl From<PilotRecord> for Pilot {
    fn from (r: PilotRecord)->Self {
        Pilot {
            callsign: r.callsign,
            last_update: r.updated_at,
            inactive: r.inactive,

            latitude: r.position.lat,
            longitude: r.position.lon,
            taxizone_is_taxiout: r.vacdm.taxizone_is_taxiout,

            origin: r.flightplan.departure,
            destination: r.flightplan.arrival,
            runway: r.clearance.dep_rwy,
            sid: r.clearance.sid,

            eobt: r.vacdm.eobt,
            tobt: r.vacdm.tobt,
            tobt_state: r.vacdm.tobt_state,
            ctot: r.vacdm.ctot,
            ttot: r.vacdm.ttot,
            tsat: r.vacdm.tsat,
            exot: r.vacdm.exot,
            asat: r.vacdm.asat,
            aobt: r.vacdm.aobt,
            atot: r.vacdm.atot,
            asrt: r.vacdm.asrt,
            aort: r.vacdm.aort,

            measures: r.measures,
            has_booking: r.has_booking,

            ..Pilot::default()
        }
    }
}

/* #endregion GET responses */

/* #region POST body ********************************************************************************************/

#[derive(Serialize,Deserialize,Debug,Clone,Default,PartialEq)]
pub struct InitialVacdm {
    pub eobt: AcdmTime,
    pub tobt: AcdmTime,
}

/// the body of `POST /api/v1/pilots`, i.e. what the backend initially learns about a flight
#[derive(Serialize,Deserialize,Debug,Clone,Default,PartialEq)]
pub struct NewPilotRecord {
    pub callsign: String,
    pub inactive: bool,
    pub position: Position,
    pub flightplan: Flightplan,
    pub vacdm: InitialVacdm,
    pub clearance: Clearance,
}

impl NewPilotRecord {
    /// scope owned fields come from `scope`, the initial ACDM times from `consolidated`
    pub fn new (scope: &Pilot, consolidated: &Pilot)->Self {
        NewPilotRecord {
            callsign: scope.callsign.clone(),
            inactive: false,
            position: Position { lat: scope.latitude, lon: scope.longitude },
            flightplan: Flightplan { departure: scope.origin.clone(), arrival: scope.destination.clone() },
            vacdm: InitialVacdm { eobt: consolidated.eobt, tobt: consolidated.tobt },
            clearance: Clearance { dep_rwy: scope.runway.clone(), sid: scope.sid.clone() },
        }
    }
}

/* #endregion POST body */

/* #region PATCH body *******************************************************************************************/

// sparse types - whatever is None is not sent and hence not touched by the backend

#[derive(Serialize,Deserialize,Debug,Clone,Default,PartialEq)]
pub struct PositionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
}

#[derive(Serialize,Deserialize,Debug,Clone,Default,PartialEq)]
pub struct FlightplanPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival: Option<String>,
}

#[derive(Serialize,Deserialize,Debug,Clone,Default,PartialEq)]
pub struct ClearancePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dep_rwy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
}

#[derive(Serialize,Deserialize,Debug,Clone,Default,PartialEq)]
pub struct VacdmPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tobt: Option<AcdmTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tobt_state: Option<TobtState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tsat: Option<AcdmTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttot: Option<AcdmTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exot: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asat: Option<AcdmTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asrt: Option<AcdmTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aobt: Option<AcdmTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aort: Option<AcdmTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atot: Option<AcdmTime>,
}

/// the body of `PATCH /api/v1/pilots/{callsign}`
#[derive(Serialize,Deserialize,Debug,Clone,Default,PartialEq)]
pub struct PilotPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callsign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flightplan: Option<FlightplanPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clearance: Option<ClearancePatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vacdm: Option<VacdmPatch>,
}

impl PilotPatch {
    /// a patch that only touches ACDM times
    pub fn vacdm (callsign: &str, vacdm: VacdmPatch)->Self {
        PilotPatch { callsign: Some(callsign.to_string()), vacdm: Some(vacdm), ..PilotPatch::default() }
    }

    /// true if there is nothing the backend would change
    pub fn is_empty (&self)->bool {
        self.position.is_none() && self.flightplan.is_none() && self.clearance.is_none() && self.vacdm.is_none()
    }
}

/* #endregion PATCH body */
