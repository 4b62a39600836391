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

//! what has to be sent to the backend for a flight, based on the difference between what the scope reports
//! and what the backend last returned

use crate::{
    pilot::PilotSlots,
    wire::{ClearancePatch,FlightplanPatch,NewPilotRecord,PilotPatch,PositionPatch},
};

#[derive(Debug,Clone,PartialEq)]
pub enum Delta {
    /// the backend does not know this flight yet
    Create(NewPilotRecord),
    /// only the groups that changed
    Update(PilotPatch),
    NoOp,
}

pub fn encode_delta (slots: &PilotSlots)->Delta {
    let scope = &slots.scope;
    let server = &slots.server;

    if scope.callsign.is_empty() {
        return Delta::NoOp
    }
    if server.callsign.is_empty() {
        return Delta::Create( NewPilotRecord::new( scope, &slots.consolidated))
    }

    let mut patch = PilotPatch::default();

    if scope.latitude != server.latitude || scope.longitude != server.longitude {
        patch.position = Some( PositionPatch {
            lat: (scope.latitude != server.latitude).then_some( scope.latitude),
            lon: (scope.longitude != server.longitude).then_some( scope.longitude),
        });
    }

    if scope.origin != server.origin || scope.destination != server.destination {
        patch.flightplan = Some( FlightplanPatch {
            departure: changed( &scope.origin, &server.origin),
            arrival: changed( &scope.destination, &server.destination),
        });
    }

    if scope.runway != server.runway || scope.sid != server.sid {
        patch.clearance = Some( ClearancePatch {
            dep_rwy: changed( &scope.runway, &server.runway),
            sid: changed( &scope.sid, &server.sid),
        });
    }

    if patch.is_empty() { Delta::NoOp } else { Delta::Update(patch) }
}

fn changed (scope: &str, server: &str)->Option<String> {
    if scope != server { Some(scope.to_string()) } else { None }
}
