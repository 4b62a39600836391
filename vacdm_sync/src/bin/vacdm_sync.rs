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

use std::{fs, path::PathBuf, sync::Arc};
use anyhow::{Context,Result};
use clap::{Parser,Subcommand};
use tracing::{info,warn};
use tracing_subscriber::EnvFilter;

use vacdm_sync::{
    Backend, ConnectionInfo, HttpBackend, MasterArbiter, PilotStore, Reconciler, ReconciliationLoop, ScopeObservation, VacdmConfig,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = "synchronize ACDM departure data with a vACDM backend")]
struct Args {
    /// path of the RON config file (defaults are used if not set)
    #[arg(short,long)]
    config: Option<PathBuf>,

    /// overrides the backend URL of the config
    #[arg(short,long)]
    url: Option<String>,

    /// start as master (the only client that writes to the backend)
    #[arg(short,long)]
    master: bool,

    /// we are connected as observer (only matters for --master)
    #[arg(long)]
    observer: bool,

    /// we are connected to a sweatbox server (only matters for --master)
    #[arg(long)]
    sweatbox: bool,

    /// active departure airports (ICAO), overrides the config
    #[arg(short,long, num_args=1..)]
    airports: Vec<String>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// check backend API version and print the server config
    Check,
    /// print the backend pilots for the active airports
    Pilots,
    /// run the reconciliation loop until Ctrl-C
    Run {
        /// pass length in seconds (1..10)
        #[arg(long)]
        cycle: Option<u64>,

        /// RON file with a list of scope observations to queue at start
        #[arg(long)]
        observations: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main()->Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter( EnvFilter::try_from_default_env().unwrap_or_else( |_| EnvFilter::new("info")))  // use RUST_LOG to override
        .init();

    let args = Args::parse();
    let config = load_config( &args)?;
    let backend = Arc::new( HttpBackend::new( &config)?);

    match &args.cmd {
        Cmd::Check => {
            match backend.check_api().await {
                Ok(()) => println!("backend API at {} is compatible", backend.base_url()),
                Err(e) => println!("backend API at {} not usable: {}", backend.base_url(), e),
            }
            let server_config = backend.server_config().await?;
            println!("{server_config:#?}");
        }
        Cmd::Pilots => {
            for pilot in backend.get_pilots( &config.airports).await? {
                println!("{pilot}");
            }
        }
        Cmd::Run { cycle, observations } => {
            let cycle = cycle.unwrap_or( config.update_cycle_seconds);
            let conn = ConnectionInfo { connected: true, observer: args.observer, sweatbox: args.sweatbox };
            run( config, backend, conn, cycle, observations.as_ref()).await?;
        }
    }

    Ok(())
}

fn load_config (args: &Args)->Result<VacdmConfig> {
    let mut config = match &args.config {
        Some(path) => VacdmConfig::from_path( path).with_context( || format!("failed to load config {:?}", path))?,
        None => VacdmConfig::default(),
    };

    if let Some(url) = &args.url { config.server_url = url.clone(); }
    if args.master { config.master = true; }
    if !args.airports.is_empty() { config.airports = args.airports.clone(); }

    config.validate()?;
    Ok(config)
}

async fn run (config: VacdmConfig, backend: Arc<HttpBackend>, conn: ConnectionInfo, cycle: u64, observations: Option<&PathBuf>)->Result<()> {
    if let Err(e) = backend.check_api().await {
        warn!("backend not validated, running without write access: {}", e);
    }

    let store = Arc::new( PilotStore::new());
    store.set_active_airports( &config.airports);
    let arbiter = Arc::new( MasterArbiter::new( store.clone(), false));
    if config.master {
        let server_config = backend.server_config().await?;
        if let Err(e) = arbiter.request_master( &conn, &server_config) {
            warn!("running as slave: {}", e);
        }
    }

    if let Some(path) = observations {
        let input = fs::read_to_string( path)?;
        let observations: Vec<ScopeObservation> = ron::from_str( &input)?;
        let n = observations.iter().filter( |obs| store.queue_observation( obs)).count();
        info!("queued {} of {} scope observations", n, observations.len());
    }

    let reconciler = Arc::new( Reconciler::new( store.clone(), arbiter.clone(), backend, cycle)?);
    let reconciliation_loop = ReconciliationLoop::start( reconciler);
    info!("running as {}, Ctrl-C to terminate", vacdm_sync::arbiter::role_name( arbiter.is_master()));

    tokio::signal::ctrl_c().await?;
    reconciliation_loop.shutdown().await?;
    info!("{} pilots tracked at shutdown", store.len());
    Ok(())
}
