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

//! departure sequencing (ACDM) data synchronization between a local flightplan feed, a shared vACDM backend
//! and controller issued commands.
//!
//! Each tracked flight is held as a [`PilotSlots`] record (scope, server and consolidated view) in a
//! [`PilotStore`]. A [`ReconciliationLoop`] periodically runs [`Reconciler::run_pass`], which merges queued scope
//! observations and commands, reads the backend and - if the [`MasterArbiter`] says we are master - writes back
//! whatever changed locally.

pub mod errors;
pub mod datetime;
pub mod config;
pub mod pilot;
pub mod wire;
pub mod backend;
pub mod queue;
pub mod scope;
pub mod command;
pub mod tag_action;
pub mod store;
pub mod arbiter;
pub mod delta;
pub mod reconciler;

pub use errors::{Result,VacdmError};
pub use datetime::AcdmTime;
pub use config::VacdmConfig;
pub use pilot::{Pilot,PilotSlots,ScopeFlightplanUpdate,TobtState};
pub use backend::{Backend,HttpBackend};
pub use scope::ScopeObservation;
pub use command::{Command,CommandKind};
pub use tag_action::TagAction;
pub use store::PilotStore;
pub use arbiter::{ConnectionInfo,MasterArbiter};
pub use delta::{Delta,encode_delta};
pub use reconciler::{PassReport,Reconciler,ReconciliationLoop};
