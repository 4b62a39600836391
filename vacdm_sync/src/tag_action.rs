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

use std::str::FromStr;
use tracing::debug;

use crate::{
    arbiter::MasterArbiter,
    command::{Command,CommandKind},
    datetime::{AcdmTime,parse_manual_tobt},
    errors::{Result,VacdmError,invalid_input},
    pilot::Pilot,
    store::PilotStore,
};

/// the controller actions we turn into commands. Ground state changes that come with some of them are the
/// business of the host
#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash)]
pub enum TagAction {
    ExotNewValue,
    TobtNow,
    TobtManual,
    TobtConfirm,
    AsatNow,
    AsatNowAndStartup,
    StartupRequest,
    OffblockRequest,
    AobtNowAndState,
    ResetTobt,
    ResetAsat,
    ResetAsrt,
    ResetTobtConfirm,
    ResetAort,
    ResetAobt,
    ResetPilot,
}

impl TagAction {
    /// map registered action names. Menu actions have no command and map to None
    pub fn from_name (name: &str)->Option<Self> {
        let action = match name {
            "EXOTModify" | "EXOTNewValue" => TagAction::ExotNewValue,
            "TOBTNow" => TagAction::TobtNow,
            "TOBTManual" => TagAction::TobtManual,
            "TOBTConfirm" => TagAction::TobtConfirm,
            "ASATNow" => TagAction::AsatNow,
            "ASATNowAndStartup" => TagAction::AsatNowAndStartup,
            "StartupRequest" => TagAction::StartupRequest,
            "OffblockRequest" => TagAction::OffblockRequest,
            "AOBTNowAndState" => TagAction::AobtNowAndState,
            "ResetTOBT" => TagAction::ResetTobt,
            "ResetASAT" => TagAction::ResetAsat,
            "ResetASRT" => TagAction::ResetAsrt,
            "ResetTOBTConfirm" => TagAction::ResetTobtConfirm,
            "ResetAORT" => TagAction::ResetAort,
            "ResetAOBT" => TagAction::ResetAobt,
            "ResetPilot" => TagAction::ResetPilot,
            _ => return None
        };
        Some(action)
    }

    pub fn requires_input (&self)->bool {
        matches!( self, TagAction::ExotNewValue | TagAction::TobtManual)
    }
}

impl FromStr for TagAction {
    type Err = VacdmError;

    fn from_str (s: &str)->Result<Self> {
        TagAction::from_name( s).ok_or_else( || invalid_input!("unknown tag action '{}'", s))
    }
}

/// the commands a tag action on `pilot` (its consolidated view) translates into. An empty result is not an error,
/// it just means there is nothing to change
pub fn commands_for (action: TagAction, pilot: &Pilot, input: &str, now: AcdmTime)->Result<Vec<Command>> {
    let cs = pilot.callsign.as_str();
    let single = |kind: CommandKind|->Result<Vec<Command>> { Ok( vec![ Command::new( cs, kind)]) };

    match action {
        TagAction::ExotNewValue => {
            let minutes: i64 = input.trim().parse().map_err( |_| invalid_input!("EXOT has to be a number of minutes, got '{}'", input))?;
            if pilot.exot == Some(minutes) { Ok( Vec::new()) } else { single( CommandKind::UpdateExot{ minutes }) }
        }
        TagAction::TobtNow => single( CommandKind::UpdateTobt( now)),
        TagAction::TobtManual => {
            let date = now.date().map( |d| d.date_naive()).unwrap_or_else( crate::datetime::utc_today);
            match parse_manual_tobt( input, date)? {
                Some(tobt) => single( CommandKind::UpdateTobtConfirmed( tobt)),
                None => Ok( Vec::new())
            }
        }
        TagAction::TobtConfirm => single( CommandKind::UpdateTobtConfirmed( pilot.tobt)),
        TagAction::AsatNow | TagAction::AsatNowAndStartup => {
            let mut cmds = vec![ Command::new( cs, CommandKind::UpdateAsat( now))];
            if pilot.asrt.is_unset() { cmds.push( Command::new( cs, CommandKind::UpdateAsrt( now))); }
            Ok(cmds)
        }
        TagAction::StartupRequest => single( CommandKind::UpdateAsrt( now)),
        TagAction::OffblockRequest => single( CommandKind::UpdateAort( now)),
        TagAction::AobtNowAndState => {
            let mut cmds = Vec::with_capacity(2);
            if pilot.aort.is_unset() { cmds.push( Command::new( cs, CommandKind::UpdateAort( now))); }
            cmds.push( Command::new( cs, CommandKind::UpdateAobt( now)));
            Ok(cmds)
        }
        TagAction::ResetTobt => single( CommandKind::ResetTobt),
        TagAction::ResetAsat => single( CommandKind::ResetAsat),
        TagAction::ResetAsrt => single( CommandKind::ResetAsrt),
        TagAction::ResetTobtConfirm => single( CommandKind::ResetTobtConfirmed),
        TagAction::ResetAort => single( CommandKind::ResetAort),
        TagAction::ResetAobt => single( CommandKind::ResetAobt),
        TagAction::ResetPilot => single( CommandKind::ResetPilot),
    }
}

/// turn a tag action into queued commands. Actions on unknown flights or while we are not master are dropped
/// silently. Returns the number of queued commands
pub fn handle_tag_action (store: &PilotStore, arbiter: &MasterArbiter, action: TagAction, callsign: &str, input: &str)->Result<usize> {
    if !arbiter.is_master() || !store.exists( callsign) {
        debug!("ignoring {:?} for {}", action, callsign);
        return Ok(0)
    }
    let Some(pilot) = store.get( callsign) else { return Ok(0) };

    let cmds = commands_for( action, &pilot, input, AcdmTime::now())?;
    let n = cmds.len();
    for cmd in cmds {
        store.queue_command( cmd);
    }
    Ok(n)
}
