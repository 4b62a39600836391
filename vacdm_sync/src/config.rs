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

use std::{fs, path::Path, time::Duration};
use serde::{Serialize,Deserialize,Serializer,Deserializer};
use parse_duration::parse;

use crate::errors::{Result,config_error};

pub const DEFAULT_SERVER_URL: &str = "https://app.vacdm.net";

pub const MIN_UPDATE_CYCLE_SECONDS: u64 = 1;
pub const MAX_UPDATE_CYCLE_SECONDS: u64 = 10;
pub const DEFAULT_UPDATE_CYCLE_SECONDS: u64 = 5;

/// the vacdm.ron configuration. Every field has a default so partial configs are fine
#[derive(Deserialize,Serialize,Debug,Clone)]
#[serde(default)]
pub struct VacdmConfig {
    pub server_url: String,
    pub update_cycle_seconds: u64,
    pub auth_token: Option<String>, // passed through as bearer token

    #[serde(deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub connect_timeout: Duration,
    #[serde(deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub request_timeout: Duration,
    pub accept_invalid_certs: bool,

    pub airports: Vec<String>, // initially active departure airports (ICAO)
    pub master: bool,
}

impl Default for VacdmConfig {
    fn default()->Self {
        VacdmConfig {
            server_url: DEFAULT_SERVER_URL.to_string(),
            update_cycle_seconds: DEFAULT_UPDATE_CYCLE_SECONDS,
            auth_token: None,
            connect_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(5),
            accept_invalid_certs: false,
            airports: Vec::new(),
            master: false,
        }
    }
}

impl VacdmConfig {
    pub fn from_path<P: AsRef<Path>> (path: P)->Result<Self> {
        let input = fs::read_to_string( path)?;
        Self::from_ron_str( &input)
    }

    pub fn from_ron_str (input: &str)->Result<Self> {
        let config: VacdmConfig = ron::from_str( input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate (&self)->Result<()> {
        validate_cycle_seconds( self.update_cycle_seconds)?;
        if self.server_url.trim().is_empty() {
            return Err( config_error!("empty server_url"))
        }
        Ok(())
    }
}

pub fn validate_cycle_seconds (secs: u64)->Result<u64> {
    if secs < MIN_UPDATE_CYCLE_SECONDS || secs > MAX_UPDATE_CYCLE_SECONDS {
        Err( config_error!("could not set update rate {} (must be within {}..{} seconds)", secs, MIN_UPDATE_CYCLE_SECONDS, MAX_UPDATE_CYCLE_SECONDS))
    } else {
        Ok(secs)
    }
}

fn deserialize_duration <'a,D>(deserializer: D) -> std::result::Result<Duration,D::Error> where D: Deserializer<'a> {
    String::deserialize(deserializer).and_then( |string| {
        parse(string.as_str())
            .map_err( |e| serde::de::Error::custom(format!("{:?}",e)))
    })
}

fn serialize_duration<S: Serializer> (dur: &Duration, s: S) -> std::result::Result<S::Ok, S::Error>  {
    let dfm = format!("{:?}", dur);
    s.serialize_str(&dfm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config() {
        let config = VacdmConfig::from_ron_str( r#"( update_cycle_seconds: 3, airports: ["EDDF","EDDM"], connect_timeout: "1500ms" )"#).unwrap();
        assert_eq!( config.update_cycle_seconds, 3);
        assert_eq!( config.airports, vec!["EDDF".to_string(), "EDDM".to_string()]);
        assert_eq!( config.connect_timeout, Duration::from_millis(1500));
        assert_eq!( config.server_url, DEFAULT_SERVER_URL);
        assert!( !config.master);
    }

    #[test]
    fn test_cycle_bounds() {
        assert!( VacdmConfig::from_ron_str( "( update_cycle_seconds: 0 )").is_err());
        assert!( VacdmConfig::from_ron_str( "( update_cycle_seconds: 11 )").is_err());
        assert!( validate_cycle_seconds( 1).is_ok());
        assert!( validate_cycle_seconds( 10).is_ok());
    }
}
