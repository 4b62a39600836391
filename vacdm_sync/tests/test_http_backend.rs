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

use std::{collections::HashMap, net::SocketAddr, sync::{Arc,Mutex}};
use axum::{
    Json, Router,
    extract::{Path,Query,State},
    http::{HeaderMap,StatusCode,header::AUTHORIZATION},
    routing::get,
};
use serde_json::{Value,json};
use tokio::net::TcpListener;

use vacdm_sync::{
    AcdmTime, Backend, HttpBackend, TobtState, VacdmConfig, VacdmError,
    datetime::UNSET_ISO_STRING,
    reconciler::change_server_url,
    store::PilotStore,
    wire::{NewPilotRecord,PilotPatch,VacdmPatch},
};

/// what the test server received
#[derive(Debug,Clone)]
struct Request {
    method: &'static str,
    path: String,
    query: HashMap<String,String>,
    auth: Option<String>,
    body: Value,
}

#[derive(Clone)]
struct ServerState {
    major: i64,
    pilots: Value,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl ServerState {
    fn record (&self, method: &'static str, path: String, query: HashMap<String,String>, headers: &HeaderMap, body: Value) {
        let auth = headers.get( AUTHORIZATION).and_then( |v| v.to_str().ok()).map( |s| s.to_string());
        self.requests.lock().unwrap().push( Request { method, path, query, auth, body });
    }

    fn requests (&self, method: &str)->Vec<Request> {
        self.requests.lock().unwrap().iter().filter( |r| r.method == method).cloned().collect()
    }
}

fn pilots_response()->Value {
    json!([{
        "callsign": "DLH123",
        "inactive": false,
        "updatedAt": "2024-05-17T11:58:03.120Z",
        "position": { "lat": 50.0333, "lon": 8.5706 },
        "flightplan": { "departure": "EDDF", "arrival": "LOWW" },
        "clearance": { "dep_rwy": "25C", "sid": "TOBAK7L" },
        "vacdm": {
            "eobt": "2024-05-17T12:00:00.000Z",
            "tobt": "2024-05-17T12:05:00.000Z",
            "tobt_state": "CONFIRMED",
            "ctot": UNSET_ISO_STRING,
            "ttot": "2024-05-17T12:27:00.000Z",
            "tsat": "2024-05-17T12:10:00.000Z",
            "exot": 12,
            "asat": UNSET_ISO_STRING,
            "aobt": UNSET_ISO_STRING,
            "atot": UNSET_ISO_STRING,
            "asrt": UNSET_ISO_STRING,
            "aort": UNSET_ISO_STRING,
            "taxizoneIsTaxiout": true,
            "delay": 0
        },
        "measures": [ { "ident": "EDDF-MDI", "value": 120 } ],
        "hasBooking": true
    }])
}

async fn spawn_server (major: i64)->(String, ServerState) {
    spawn_server_with_pilots( major, pilots_response()).await
}

async fn spawn_server_with_pilots (major: i64, pilots: Value)->(String, ServerState) {
    let state = ServerState { major, pilots, requests: Arc::new( Mutex::new( Vec::new())) };

    let router = Router::new()
        .route( "/api/v1/version", get( |State(s): State<ServerState>| async move {
            Json( json!({ "major": s.major, "minor": 3, "patch": 1 }))
        }))
        .route( "/api/v1/config", get( || async {
            Json( json!({ "serverName": "test server", "allowSimSession": true, "allowObsMaster": false }))
        }))
        .route( "/api/v1/pilots",
            get( |State(s): State<ServerState>, Query(q): Query<HashMap<String,String>>, h: HeaderMap| async move {
                s.record( "GET", "/api/v1/pilots".to_string(), q, &h, Value::Null);
                Json( s.pilots.clone())
            })
            .post( |State(s): State<ServerState>, h: HeaderMap, Json(body): Json<Value>| async move {
                s.record( "POST", "/api/v1/pilots".to_string(), HashMap::new(), &h, body);
                StatusCode::CREATED
            })
        )
        .route( "/api/v1/pilots/{callsign}",
            axum::routing::patch( |State(s): State<ServerState>, Path(cs): Path<String>, h: HeaderMap, Json(body): Json<Value>| async move {
                s.record( "PATCH", format!("/api/v1/pilots/{cs}"), HashMap::new(), &h, body);
                StatusCode::OK
            })
            .delete( |State(s): State<ServerState>, Path(cs): Path<String>, h: HeaderMap| async move {
                s.record( "DELETE", format!("/api/v1/pilots/{cs}"), HashMap::new(), &h, Value::Null);
                StatusCode::NO_CONTENT
            })
        )
        .with_state( state.clone());

    let listener = TcpListener::bind( "127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn( async move { axum::serve( listener, router).await.unwrap() });

    (format!("http://{addr}/"), state)
}

fn backend_for (url: &str)->HttpBackend {
    let config = VacdmConfig { server_url: url.to_string(), auth_token: Some("s3cr3t".to_string()), ..VacdmConfig::default() };
    HttpBackend::new( &config).unwrap()
}

#[tokio::test]
async fn test_version_and_config() {
    let (url,_state) = spawn_server(1).await;
    let backend = backend_for( &url);

    assert!( !backend.is_api_valid());
    assert_eq!( backend.server_config().await.unwrap().server_name, ""); // not asked before the version check

    backend.check_api().await.unwrap();
    assert!( backend.is_api_valid());
    assert!( backend.error_message().is_empty());

    let config = backend.server_config().await.unwrap();
    assert_eq!( config.server_name, "test server");
    assert!( config.allow_sim_session);
    assert!( !config.allow_obs_master);
}

#[tokio::test]
async fn test_incompatible_backend_refuses_writes() {
    let (url,state) = spawn_server(2).await;
    let backend = backend_for( &url);

    let res = backend.check_api().await;
    assert!( matches!( res, Err(VacdmError::IncompatibleBackend(_))));
    assert!( backend.error_message().contains("incompatible"));

    let res = backend.delete_pilot("DLH123").await;
    assert!( matches!( res, Err(VacdmError::OpFailedError(_))));
    assert!( state.requests("DELETE").is_empty());
}

#[tokio::test]
async fn test_get_pilots() {
    let (url,state) = spawn_server(1).await;
    let backend = backend_for( &url);

    let pilots = backend.get_pilots( &["EDDF".to_string(), "EDDM".to_string()]).await.unwrap();
    assert_eq!( pilots.len(), 1);

    let p = &pilots[0];
    assert_eq!( p.callsign, "DLH123");
    assert_eq!( p.tobt.to_iso_string(), "2024-05-17T12:05:00Z");
    assert_eq!( p.tobt_state, TobtState::Confirmed);
    assert_eq!( p.last_update.to_iso_string(), "2024-05-17T11:58:03Z");
    assert!( p.ctot.is_unset() && p.asat.is_unset());
    assert_eq!( p.exot, Some(12));
    assert_eq!( p.runway, "25C");
    assert_eq!( p.measures[0].value, 120);
    assert!( p.has_booking && p.taxizone_is_taxiout);

    let gets = state.requests("GET");
    assert_eq!( gets[0].query.get("airports").map( String::as_str), Some("EDDF,EDDM"));
    assert_eq!( gets[0].auth.as_deref(), Some("Bearer s3cr3t"));
}

#[tokio::test]
async fn test_malformed_pilot_does_not_hide_others() {
    let mut pilots = pilots_response();
    if let Some(list) = pilots.as_array_mut() {
        list.push( json!({ "callsign": "AUA2", "flightplan": { "departure": "EDDF", "arrival": "LOWW" }, "vacdm": { "tobt": null } }));
        list.push( json!({ "callsign": "BAW1", "vacdm": { "tsat": "half past twelve" } }));
    }
    let (url,_state) = spawn_server_with_pilots( 1, pilots).await;
    let backend = backend_for( &url);

    let pilots = backend.get_pilots( &["EDDF".to_string()]).await.unwrap();
    assert_eq!( pilots.len(), 1);
    assert_eq!( pilots[0].callsign, "DLH123");
    assert_eq!( pilots[0].tsat.to_iso_string(), "2024-05-17T12:10:00Z");
}

#[tokio::test]
async fn test_writes() {
    let (url,state) = spawn_server(1).await;
    let backend = backend_for( &url);
    backend.check_api().await.unwrap();

    let record = NewPilotRecord { callsign: "DLH123".to_string(), ..NewPilotRecord::default() };
    backend.post_pilot( &record).await.unwrap();

    let tobt = AcdmTime::parse_iso("2024-05-17T12:30:00Z").unwrap();
    let patch = PilotPatch::vacdm( "DLH123", VacdmPatch { tobt: Some(tobt), tsat: Some(AcdmTime::UNSET), ..VacdmPatch::default() });
    backend.patch_pilot( "DLH123", &patch).await.unwrap();

    backend.delete_pilot( "DLH123").await.unwrap();

    let posts = state.requests("POST");
    assert_eq!( posts[0].body["callsign"], "DLH123");
    assert_eq!( posts[0].body["inactive"], false);
    assert_eq!( posts[0].body["vacdm"]["tobt"], UNSET_ISO_STRING);

    let patches = state.requests("PATCH");
    assert_eq!( patches[0].path, "/api/v1/pilots/DLH123");
    assert_eq!( patches[0].body, json!({
        "callsign": "DLH123",
        "vacdm": { "tobt": "2024-05-17T12:30:00Z", "tsat": UNSET_ISO_STRING }
    }));

    assert_eq!( state.requests("DELETE")[0].path, "/api/v1/pilots/DLH123");
}

#[tokio::test]
async fn test_change_server_url() {
    let (url_a,_) = spawn_server(1).await;
    let (url_b,_) = spawn_server(2).await;
    let store = PilotStore::new();
    let backend = backend_for( &url_a);
    backend.check_api().await.unwrap();

    assert!( change_server_url( &store, &backend, &url_b).await.is_err());
    assert!( !backend.is_api_valid());
    assert!( !store.is_paused());
    assert_eq!( backend.base_url(), url_b.trim_end_matches('/'));

    change_server_url( &store, &backend, &url_a).await.unwrap();
    assert!( backend.is_api_valid());
}

#[tokio::test]
async fn test_unreachable_backend() {
    let listener = TcpListener::bind( "127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop( listener);

    let backend = backend_for( &format!("http://{addr}"));
    assert!( matches!( backend.get_pilots( &[]).await, Err(VacdmError::HttpError(_))));
    assert!( backend.check_api().await.is_err());
    assert!( !backend.is_api_valid());
}
