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

use std::sync::{Mutex,RwLock};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use reqwest::{Client, RequestBuilder, header::{HeaderMap,HeaderValue,ACCEPT,AUTHORIZATION,CONTENT_TYPE}};
use tracing::{debug,info,warn};

use crate::{
    config::VacdmConfig,
    errors::{Result,VacdmError,op_failed},
    pilot::Pilot,
    wire::{NewPilotRecord,PilotPatch,PilotRecord,ServerConfig,VersionInfo},
};

/// the backend API major version we can talk to
pub const SUPPORTED_API_MAJOR: i64 = 1;

pub const VERSION_PATH: &str = "/api/v1/version";
pub const CONFIG_PATH: &str = "/api/v1/config";
pub const PILOTS_PATH: &str = "/api/v1/pilots";

pub fn pilot_path (callsign: &str)->String { format!("{}/{}", PILOTS_PATH, callsign) }

/// the remote coordination backend as seen by the reconciliation engine.
/// Implementations own no pilot state - whatever `get_pilots` returns replaces our server view.
#[async_trait]
pub trait Backend: Send + Sync {
    /// check that we can talk to this backend (API version)
    async fn check_api (&self)->Result<()>;
    async fn server_config (&self)->Result<ServerConfig>;

    /// pilots departing from any of the given airports (all pilots if `airports` is empty)
    async fn get_pilots (&self, airports: &[String])->Result<Vec<Pilot>>;

    async fn post_pilot (&self, record: &NewPilotRecord)->Result<()>;
    async fn patch_pilot (&self, callsign: &str, patch: &PilotPatch)->Result<()>;
    async fn delete_pilot (&self, callsign: &str)->Result<()>;
}

#[derive(Debug,Default)]
struct ApiStatus {
    checked: bool,
    valid: bool,
    error_message: String,
}

struct Connection {
    base_url: String,
    client: Client,
}

/// the live REST client for the backend.
/// The connection is replaced as a whole if the server URL changes, which also invalidates a previous version check.
/// Writes are refused until the API version was checked successfully.
pub struct HttpBackend {
    config: VacdmConfig,
    connection: RwLock<Connection>,
    status: Mutex<ApiStatus>,
}

impl HttpBackend {
    pub fn new (config: &VacdmConfig)->Result<Self> {
        let client = build_client( config)?;
        let base_url = normalized_url( &config.server_url);

        Ok( HttpBackend {
            config: config.clone(),
            connection: RwLock::new( Connection{ base_url, client }),
            status: Mutex::new( ApiStatus::default()),
        })
    }

    pub fn base_url (&self)->String {
        self.connection.read().map( |c| c.base_url.clone()).unwrap_or_default()
    }

    pub fn change_server_address (&self, url: &str)->Result<()> {
        let client = build_client( &self.config)?;
        let base_url = normalized_url( url);
        {
            let mut conn = self.connection.write().map_err( |_| op_failed!("connection lock poisoned"))?;
            *conn = Connection{ base_url, client };
        }
        self.set_status( ApiStatus::default());
        info!("changed backend URL to {}", url);
        Ok(())
    }

    /// the user facing reason for a failed version check (empty if none)
    pub fn error_message (&self)->String {
        self.status.lock().map( |s| s.error_message.clone()).unwrap_or_default()
    }

    pub fn is_api_valid (&self)->bool {
        self.status.lock().map( |s| s.checked && s.valid).unwrap_or(false)
    }

    fn set_status (&self, status: ApiStatus) {
        if let Ok(mut s) = self.status.lock() { *s = status; }
    }

    fn target (&self, path_and_query: &str)->Result<(Client,String)> {
        let conn = self.connection.read().map_err( |_| op_failed!("connection lock poisoned"))?;
        Ok( (conn.client.clone(), format!("{}{}", conn.base_url, path_and_query)) )
    }

    async fn get_json<T: DeserializeOwned> (&self, path_and_query: &str)->Result<T> {
        let (client,url) = self.target( path_and_query)?;
        let response = client.get( &url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err( VacdmError::StatusError{ status, url })
        }

        let body = response.text().await?;
        serde_json::from_str( &body).map_err( |e| {
            warn!("malformed response from {}: {} - body: {}", url, e, body);
            VacdmError::from(e)
        })
    }

    fn ensure_writable (&self)->Result<()> {
        if self.is_api_valid() { Ok(()) } else { Err( op_failed!("backend API not validated, write refused")) }
    }

    async fn send_write (&self, req: RequestBuilder, url: String)->Result<()> {
        let response = req.send().await?;
        let status = response.status();
        if status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!("{} response: {}", url, body);
            Ok(())
        } else {
            Err( VacdmError::StatusError{ status, url })
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn check_api (&self)->Result<()> {
        {
            let status = self.status.lock().map_err( |_| op_failed!("status lock poisoned"))?;
            if status.checked {
                return if status.valid { Ok(()) } else { Err( VacdmError::IncompatibleBackend( status.error_message.clone())) }
            }
        }

        // transport failures leave the API unchecked so that we retry next time
        let (client,url) = self.target( VERSION_PATH)?;
        let response = client.get( &url).send().await?;
        let http_status = response.status();
        if !http_status.is_success() {
            return Err( VacdmError::StatusError{ status: http_status, url })
        }
        let body = response.text().await?;
        info!("received API version: {}", body);

        let status = match serde_json::from_str::<VersionInfo>( &body) {
            Ok(version) if version.major == SUPPORTED_API_MAJOR => {
                ApiStatus{ checked: true, valid: true, error_message: String::new() }
            }
            Ok(version) => {
                ApiStatus{ checked: true, valid: false, 
                           error_message: format!("Backend-version {} is incompatible (expected {}). Please update.", version.major, SUPPORTED_API_MAJOR) }
            }
            Err(e) => {
                warn!("failed to parse version response: {}", e);
                ApiStatus{ checked: true, valid: false, error_message: format!("Invalid backend-version response: {}", body) }
            }
        };

        let result = if status.valid { Ok(()) } else { Err( VacdmError::IncompatibleBackend( status.error_message.clone())) };
        self.set_status( status);
        result
    }

    async fn server_config (&self)->Result<ServerConfig> {
        if !self.is_api_valid() {
            return Ok( ServerConfig::default())
        }
        let config: ServerConfig = self.get_json( CONFIG_PATH).await?;
        info!("received server configuration: {:?}", config);
        Ok(config)
    }

    async fn get_pilots (&self, airports: &[String])->Result<Vec<Pilot>> {
        let path = if airports.is_empty() {
            PILOTS_PATH.to_string()
        } else {
            format!("{}?airports={}", PILOTS_PATH, airports.join(","))
        };
        debug!("GET {}", path);

        let records: Vec<serde_json::Value> = self.get_json( &path).await?;
        debug!("received {} pilot records", records.len());
        Ok( pilots_from_records( records))
    }

    async fn post_pilot (&self, record: &NewPilotRecord)->Result<()> {
        self.ensure_writable()?;
        let (client,url) = self.target( PILOTS_PATH)?;
        debug!("posting {} with message: {}", record.callsign, serde_json::to_string( record)?);
        self.send_write( client.post( &url).json( record), url).await
    }

    async fn patch_pilot (&self, callsign: &str, patch: &PilotPatch)->Result<()> {
        self.ensure_writable()?;
        let (client,url) = self.target( &pilot_path( callsign))?;
        debug!("patching {} with message: {}", callsign, serde_json::to_string( patch)?);
        self.send_write( client.patch( &url).json( patch), url).await
    }

    async fn delete_pilot (&self, callsign: &str)->Result<()> {
        self.ensure_writable()?;
        let (client,url) = self.target( &pilot_path( callsign))?;
        debug!("deleting {}", callsign);
        self.send_write( client.delete( &url), url).await
    }
}

/// convert backend pilot records one by one. Records that don't parse are logged and skipped so that they can't
/// keep the remaining flights from being consolidated
pub fn pilots_from_records (records: Vec<serde_json::Value>)->Vec<Pilot> {
    records.into_iter().filter_map( |value| {
        match serde_json::from_value::<PilotRecord>( value.clone()) {
            Ok(record) => Some( Pilot::from( record)),
            Err(e) => {
                warn!("skipping malformed pilot record: {} - record: {}", e, value);
                None
            }
        }
    }).collect()
}

fn normalized_url (url: &str)->String {
    url.trim().trim_end_matches('/').to_string()
}

fn build_client (config: &VacdmConfig)->Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert( ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert( CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if let Some(token) = &config.auth_token {
        let mut value = HeaderValue::from_str( &format!("Bearer {}", token))?;
        value.set_sensitive(true);
        headers.insert( AUTHORIZATION, value);
    }

    let client = Client::builder()
        .default_headers( headers)
        .connect_timeout( config.connect_timeout)
        .timeout( config.request_timeout)
        .danger_accept_invalid_certs( config.accept_invalid_certs)
        .build()?;
    Ok(client)
}
