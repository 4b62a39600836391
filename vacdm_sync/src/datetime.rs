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

//! ACDM timestamps and their wire encoding.
//! All ACDM times are UTC with seconds resolution. The backend does not use `null` for times that are not
//! set but a fixed instant just before the epoch, which is what [`AcdmTime::UNSET`] encodes to.

use std::fmt;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound, Utc};
use serde::{Serialize,Deserialize,Serializer,Deserializer,de::{Error as DeError}};
use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::{Result,invalid_input,op_failed};

/// what we send for times that are not set
pub const UNSET_ISO_STRING: &str = "1969-12-31T23:59:59.999Z";

pub const INVALID_HHMM_MSG: &str = "Invalid time format. Expected: HHMM (24 hours)";

lazy_static! {
    static ref EOBT_RE: Regex = Regex::new( r"^\d{1,4}$").unwrap();
    static ref MANUAL_HHMM_RE: Regex = Regex::new( r"^([01]\d|2[0-3])([0-5]\d)$").unwrap();
}

/// this should be used wherever we need wall clock time
#[inline]
pub fn utc_now()->DateTime<Utc> {
    Utc::now()
}

#[inline]
pub fn utc_today()->NaiveDate {
    utc_now().date_naive()
}

/// an optional UTC instant with seconds resolution.
/// Note that the derived ordering puts `UNSET` before any set time, i.e. `t >= AcdmTime::UNSET` holds for all `t`,
/// which is the sentinel semantics the reset cascades depend on
#[derive(Debug,Clone,Copy,PartialEq,Eq,PartialOrd,Ord,Hash,Default)]
pub struct AcdmTime(Option<DateTime<Utc>>);

impl AcdmTime {
    pub const UNSET: AcdmTime = AcdmTime(None);

    /// instants before the epoch are treated as the unset sentinel
    pub fn new (dt: DateTime<Utc>)->Self {
        if dt.timestamp_millis() < 0 {
            AcdmTime::UNSET
        } else {
            AcdmTime( Some( dt.trunc_subsecs(0)))
        }
    }

    pub fn now ()->Self { AcdmTime::new( utc_now()) }

    pub fn at (date: NaiveDate, hour: u32, minute: u32)->Option<Self> {
        NaiveTime::from_hms_opt( hour, minute, 0)
            .map( |t| AcdmTime::new( NaiveDateTime::new( date, t).and_utc()))
    }

    pub fn is_unset (&self)->bool { self.0.is_none() }
    pub fn is_set (&self)->bool { self.0.is_some() }

    pub fn date (&self)->Option<DateTime<Utc>> { self.0 }

    /// convert a flightplan style HHMM string (1-4 digits, left padded with zeros) into a time on the given date
    pub fn from_hhmm (hhmm: &str, date: NaiveDate)->Option<Self> {
        let hhmm = hhmm.trim();
        if !EOBT_RE.is_match( hhmm) { return None }

        let padded = format!("{:0>4}", hhmm);
        let hour: u32 = padded[0..2].parse().ok()?;
        let minute: u32 = padded[2..4].parse().ok()?;
        AcdmTime::at( date, hour, minute)
    }

    pub fn to_iso_string (&self)->String {
        match self.0 {
            Some(dt) => dt.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            None => UNSET_ISO_STRING.to_string()
        }
    }

    pub fn parse_iso (s: &str)->Result<Self> {
        if let Ok(dt) = DateTime::parse_from_rfc3339( s) {
            return Ok( AcdmTime::new( dt.to_utc()))
        }
        // some backends drop the zone designator
        NaiveDateTime::parse_from_str( s, "%Y-%m-%dT%H:%M:%S%.f")
            .map( |ndt| AcdmTime::new( ndt.and_utc()))
            .map_err( |e| op_failed!("invalid timestamp '{}': {}", s, e))
    }
}

impl From<DateTime<Utc>> for AcdmTime {
    fn from (dt: DateTime<Utc>)->Self { AcdmTime::new(dt) }
}

impl fmt::Display for AcdmTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(dt) => write!( f, "{}", dt.format("%Y-%m-%dT%H:%M:%SZ")),
            None => write!( f, "unset")
        }
    }
}

impl Serialize for AcdmTime {
    fn serialize<S: Serializer> (&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str( &self.to_iso_string())
    }
}

impl<'de> Deserialize<'de> for AcdmTime {
    fn deserialize<D: Deserializer<'de>> (deserializer: D) -> std::result::Result<AcdmTime, D::Error> {
        let s = String::deserialize( deserializer)?;
        AcdmTime::parse_iso( &s).map_err( |e| DeError::custom( e.to_string()))
    }
}

/// parse controller entered TOBT. Empty input means "no change" and yields `Ok(None)`
pub fn parse_manual_tobt (input: &str, date: NaiveDate)->Result<Option<AcdmTime>> {
    let input = input.trim();
    if input.is_empty() { return Ok(None) }

    if let Some(caps) = MANUAL_HHMM_RE.captures( input) {
        let hour: u32 = caps[1].parse().map_err( |_| invalid_input!("{}", INVALID_HHMM_MSG))?;
        let minute: u32 = caps[2].parse().map_err( |_| invalid_input!("{}", INVALID_HHMM_MSG))?;
        Ok( AcdmTime::at( date, hour, minute))
    } else {
        Err( invalid_input!("{}", INVALID_HHMM_MSG))
    }
}
