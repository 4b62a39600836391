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

//! controller issued field updates. Each [`Command`] is applied twice: optimistically to the consolidated view
//! (so that the UI reflects it before the backend confirms) and as a backend write. Both are derived from the same
//! [`CommandKind`].

use std::fmt;

use crate::{
    backend::Backend,
    datetime::AcdmTime,
    errors::Result,
    pilot::{Pilot,TobtState},
    wire::{PilotPatch,VacdmPatch},
};

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum CommandKind {
    UpdateExot { minutes: i64 },
    UpdateTobt(AcdmTime),
    UpdateTobtConfirmed(AcdmTime),
    UpdateAsat(AcdmTime),
    UpdateAsrt(AcdmTime),
    UpdateAobt(AcdmTime),
    UpdateAort(AcdmTime),
    ResetTobt,
    ResetAsat,
    ResetAsrt,
    ResetAort,
    ResetAobt,
    ResetTobtConfirmed,
    ResetPilot,
}

impl CommandKind {
    pub fn label (&self)->&'static str {
        match self {
            CommandKind::UpdateExot{..} => "EXOT",
            CommandKind::UpdateTobt(_) => "TOBT",
            CommandKind::UpdateTobtConfirmed(_) => "TOBT confirmed",
            CommandKind::UpdateAsat(_) => "ASAT",
            CommandKind::UpdateAsrt(_) => "ASRT",
            CommandKind::UpdateAobt(_) => "AOBT",
            CommandKind::UpdateAort(_) => "AORT",
            CommandKind::ResetTobt => "TOBT reset",
            CommandKind::ResetAsat => "ASAT reset",
            CommandKind::ResetAsrt => "ASRT reset",
            CommandKind::ResetAort => "AORT reset",
            CommandKind::ResetAobt => "AOBT reset",
            CommandKind::ResetTobtConfirmed => "TOBT confirmed reset",
            CommandKind::ResetPilot => "pilot reset",
        }
    }
}

#[derive(Debug,Clone,PartialEq)]
pub struct Command {
    pub callsign: String,
    pub kind: CommandKind,
}

impl Command {
    pub fn new (callsign: impl ToString, kind: CommandKind)->Self {
        Command { callsign: callsign.to_string(), kind }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "{} {}", self.kind.label(), self.callsign)?;
        match self.kind {
            CommandKind::UpdateExot{minutes} => write!( f, ": {} min", minutes),
            CommandKind::UpdateTobt(t) | CommandKind::UpdateTobtConfirmed(t) | CommandKind::UpdateAsat(t) |
            CommandKind::UpdateAsrt(t) | CommandKind::UpdateAobt(t) | CommandKind::UpdateAort(t) => write!( f, ": {}", t),
            _ => Ok(())
        }
    }
}

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum CommandEffect {
    Applied,
    RemovePilot,
}

/// the TSAT rule: a TOBT change must not keep a TSAT that was computed for an earlier TOBT
fn resets_tsat (kind: &CommandKind, tsat: AcdmTime)->bool {
    match kind {
        CommandKind::UpdateTobt(tobt) => *tobt >= tsat,
        CommandKind::UpdateTobtConfirmed(tobt) => tobt.is_unset() || *tobt >= tsat,
        _ => false
    }
}

/// apply command to the consolidated view of a flight
pub fn apply_optimistic (pilot: &mut Pilot, kind: &CommandKind, now: AcdmTime)->CommandEffect {
    pilot.last_update = now;

    match *kind {
        CommandKind::UpdateExot{minutes} => {
            pilot.exot = Some(minutes);
            pilot.tsat = AcdmTime::UNSET;
            pilot.ttot = AcdmTime::UNSET;
            pilot.asat = AcdmTime::UNSET;
            pilot.aobt = AcdmTime::UNSET;
            pilot.atot = AcdmTime::UNSET;
        }
        CommandKind::UpdateTobt(tobt) | CommandKind::UpdateTobtConfirmed(tobt) => {
            if resets_tsat( kind, pilot.tsat) { pilot.tsat = AcdmTime::UNSET; }
            pilot.tobt = tobt;
            if let CommandKind::UpdateTobtConfirmed(_) = kind { pilot.tobt_state = TobtState::Confirmed; }

            pilot.ttot = AcdmTime::UNSET;
            pilot.exot = None;
            pilot.asat = AcdmTime::UNSET;
            pilot.aobt = AcdmTime::UNSET;
            pilot.atot = AcdmTime::UNSET;
        }
        CommandKind::UpdateAsat(t) => pilot.asat = t,
        CommandKind::UpdateAsrt(t) => pilot.asrt = t,
        CommandKind::UpdateAobt(t) => pilot.aobt = t,
        CommandKind::UpdateAort(t) => pilot.aort = t,
        CommandKind::ResetTobt => {
            pilot.tobt = AcdmTime::UNSET;
            pilot.tsat = AcdmTime::UNSET;
            pilot.ttot = AcdmTime::UNSET;
            pilot.exot = None;
            pilot.asat = AcdmTime::UNSET;
            pilot.asrt = AcdmTime::UNSET;
            pilot.aobt = AcdmTime::UNSET;
            pilot.aort = AcdmTime::UNSET;
            pilot.atot = AcdmTime::UNSET;
        }
        CommandKind::ResetAsat => pilot.asat = AcdmTime::UNSET,
        CommandKind::ResetAsrt => pilot.asrt = AcdmTime::UNSET,
        CommandKind::ResetAort => pilot.aort = AcdmTime::UNSET,
        CommandKind::ResetAobt => pilot.aobt = AcdmTime::UNSET,
        CommandKind::ResetTobtConfirmed => pilot.tobt_state = TobtState::Guess,
        CommandKind::ResetPilot => return CommandEffect::RemovePilot,
    }

    CommandEffect::Applied
}

/// the backend write that corresponds to a command
#[derive(Debug,Clone,PartialEq)]
pub enum BackendRequest {
    Patch(PilotPatch),
    Delete,
}

impl BackendRequest {
    /// Note that this has to be computed from the consolidated state /before/ the command is applied
    pub fn for_command (pilot: &Pilot, cmd: &Command)->Self {
        let unset = Some(AcdmTime::UNSET);

        let vacdm = match cmd.kind {
            CommandKind::UpdateExot{minutes} => VacdmPatch {
                exot: Some(minutes), tsat: unset, ttot: unset, asat: unset, aobt: unset, atot: unset,
                ..VacdmPatch::default()
            },
            CommandKind::UpdateTobt(tobt) | CommandKind::UpdateTobtConfirmed(tobt) => VacdmPatch {
                tobt: Some(tobt),
                tsat: if resets_tsat( &cmd.kind, pilot.tsat) { unset } else { None },
                // the backend confirms a plain TOBT update, the confirmed variant leaves its state alone
                tobt_state: if let CommandKind::UpdateTobt(_) = cmd.kind { Some(TobtState::Confirmed) } else { None },
                ttot: unset, asat: unset, aobt: unset, atot: unset,
                ..VacdmPatch::default()
            },
            CommandKind::UpdateAsat(t) => VacdmPatch { asat: Some(t), ..VacdmPatch::default() },
            CommandKind::UpdateAsrt(t) => VacdmPatch { asrt: Some(t), ..VacdmPatch::default() },
            CommandKind::UpdateAobt(t) => VacdmPatch { aobt: Some(t), ..VacdmPatch::default() },
            CommandKind::UpdateAort(t) => VacdmPatch { aort: Some(t), ..VacdmPatch::default() },
            CommandKind::ResetTobt => VacdmPatch {
                tobt: unset, tobt_state: Some(pilot.tobt_state),
                tsat: unset, ttot: unset, asat: unset, asrt: unset, aobt: unset, atot: unset, aort: unset,
                ..VacdmPatch::default()
            },
            CommandKind::ResetAsat => VacdmPatch { asat: unset, ..VacdmPatch::default() },
            CommandKind::ResetAsrt => VacdmPatch { asrt: unset, ..VacdmPatch::default() },
            CommandKind::ResetAort => VacdmPatch { aort: unset, ..VacdmPatch::default() },
            CommandKind::ResetAobt => VacdmPatch { aobt: unset, ..VacdmPatch::default() },
            CommandKind::ResetTobtConfirmed => VacdmPatch {
                tobt: Some(pilot.tobt), tobt_state: Some(TobtState::Guess),
                ..VacdmPatch::default()
            },
            CommandKind::ResetPilot => return BackendRequest::Delete,
        };

        BackendRequest::Patch( PilotPatch::vacdm( &cmd.callsign, vacdm))
    }

    pub async fn send (&self, backend: &dyn Backend, callsign: &str)->Result<()> {
        match self {
            BackendRequest::Patch(patch) => backend.patch_pilot( callsign, patch).await,
            BackendRequest::Delete => backend.delete_pilot( callsign).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t (hour: u32, minute: u32)->AcdmTime {
        AcdmTime::at( NaiveDate::from_ymd_opt( 2024, 5, 17).unwrap(), hour, minute).unwrap()
    }

    fn scheduled_pilot()->Pilot {
        Pilot {
            callsign: "DLH123".to_string(),
            eobt: t(12,0), tobt: t(12,0), tsat: t(12,10), ttot: t(12,25), exot: Some(12),
            asat: t(12,5), asrt: t(12,1), aobt: t(12,11), aort: t(12,9), atot: t(12,30),
            tobt_state: TobtState::Confirmed,
            ..Pilot::default()
        }
    }

    #[test]
    fn test_tobt_before_tsat_keeps_tsat() {
        let mut p = scheduled_pilot();
        let cmd = Command::new( "DLH123", CommandKind::UpdateTobt( t(12,5)));
        let req = BackendRequest::for_command( &p, &cmd);

        assert_eq!( apply_optimistic( &mut p, &cmd.kind, t(11,0)), CommandEffect::Applied);
        assert_eq!( p.tobt, t(12,5));
        assert_eq!( p.tsat, t(12,10));
        assert!( p.ttot.is_unset() && p.asat.is_unset() && p.aobt.is_unset() && p.atot.is_unset());
        assert_eq!( p.exot, None);
        assert_eq!( p.asrt, t(12,1)); // not part of the cascade
        assert_eq!( p.last_update, t(11,0));

        let BackendRequest::Patch(patch) = req else { panic!("expected patch") };
        let vacdm = patch.vacdm.unwrap();
        assert_eq!( vacdm.tobt, Some(t(12,5)));
        assert_eq!( vacdm.tsat, None);
        assert_eq!( vacdm.tobt_state, Some(TobtState::Confirmed));
    }

    #[test]
    fn test_tobt_at_or_after_tsat_resets_tsat() {
        for tobt in [t(12,10), t(12,30)] {
            let mut p = scheduled_pilot();
            apply_optimistic( &mut p, &CommandKind::UpdateTobt(tobt), AcdmTime::now());
            assert!( p.tsat.is_unset());
        }

        let mut p = Pilot{ tsat: AcdmTime::UNSET, ..scheduled_pilot() };
        apply_optimistic( &mut p, &CommandKind::UpdateTobt( t(8,0)), AcdmTime::now());
        assert!( p.tsat.is_unset());
    }

    #[test]
    fn test_confirmed_tobt() {
        let mut p = Pilot{ tobt_state: TobtState::Guess, ..scheduled_pilot() };
        let cmd = Command::new( "DLH123", CommandKind::UpdateTobtConfirmed( AcdmTime::UNSET));
        let req = BackendRequest::for_command( &p, &cmd);

        apply_optimistic( &mut p, &cmd.kind, AcdmTime::now());
        assert!( p.tobt.is_unset());
        assert!( p.tsat.is_unset()); // unset value always resets TSAT for the confirmed variant
        assert_eq!( p.tobt_state, TobtState::Confirmed);

        let BackendRequest::Patch(patch) = req else { panic!("expected patch") };
        let vacdm = patch.vacdm.unwrap();
        assert_eq!( vacdm.tobt_state, None);
        assert_eq!( vacdm.tsat, Some(AcdmTime::UNSET));
    }

    #[test]
    fn test_tobt_wire_bodies() {
        let p = scheduled_pilot();
        let body = |kind: CommandKind| {
            match BackendRequest::for_command( &p, &Command::new( "DLH123", kind)) {
                BackendRequest::Patch(patch) => serde_json::to_value( &patch).unwrap(),
                BackendRequest::Delete => panic!("expected patch"),
            }
        };
        let unset = crate::datetime::UNSET_ISO_STRING;

        assert_eq!( body( CommandKind::UpdateTobt( t(12,30))), serde_json::json!({
            "callsign": "DLH123",
            "vacdm": {
                "tobt": "2024-05-17T12:30:00Z", "tobt_state": "CONFIRMED",
                "tsat": unset, "ttot": unset, "asat": unset, "aobt": unset, "atot": unset
            }
        }));

        assert_eq!( body( CommandKind::UpdateTobtConfirmed( t(12,5))), serde_json::json!({
            "callsign": "DLH123",
            "vacdm": {
                "tobt": "2024-05-17T12:05:00Z",
                "ttot": unset, "asat": unset, "aobt": unset, "atot": unset
            }
        }));
    }

    #[test]
    fn test_exot_cascade() {
        let mut p = scheduled_pilot();
        apply_optimistic( &mut p, &CommandKind::UpdateExot{ minutes: 7 }, AcdmTime::now());
        assert_eq!( p.exot, Some(7));
        assert!( p.tsat.is_unset() && p.ttot.is_unset() && p.asat.is_unset() && p.aobt.is_unset() && p.atot.is_unset());
        assert_eq!( p.tobt, t(12,0));
    }

    #[test]
    fn test_reset_tobt() {
        let mut p = scheduled_pilot();
        let cmd = Command::new( "DLH123", CommandKind::ResetTobt);
        let req = BackendRequest::for_command( &p, &cmd);
        apply_optimistic( &mut p, &cmd.kind, AcdmTime::now());

        for v in [p.tobt, p.tsat, p.ttot, p.asat, p.asrt, p.aobt, p.aort, p.atot] {
            assert!( v.is_unset());
        }
        assert_eq!( p.exot, None);
        assert_eq!( p.eobt, t(12,0));

        let json = serde_json::to_value( match req { BackendRequest::Patch(p) => p, _ => panic!("expected patch") }).unwrap();
        assert_eq!( json["vacdm"]["tobt_state"], "CONFIRMED");
        assert_eq!( json["vacdm"]["aort"], crate::datetime::UNSET_ISO_STRING);
    }

    #[test]
    fn test_reset_tobt_confirmed() {
        let mut p = scheduled_pilot();
        apply_optimistic( &mut p, &CommandKind::ResetTobtConfirmed, AcdmTime::now());
        assert_eq!( p.tobt_state, TobtState::Guess);
        assert_eq!( p.tobt, t(12,0));
        assert_eq!( p.tsat, t(12,10));
    }

    #[test]
    fn test_reset_pilot() {
        let mut p = scheduled_pilot();
        let cmd = Command::new( "DLH123", CommandKind::ResetPilot);
        assert_eq!( BackendRequest::for_command( &p, &cmd), BackendRequest::Delete);
        assert_eq!( apply_optimistic( &mut p, &cmd.kind, AcdmTime::now()), CommandEffect::RemovePilot);
    }
}
