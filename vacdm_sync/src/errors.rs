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

use thiserror::Error;

pub type Result<T> = std::result::Result<T,VacdmError>;

#[derive(Error,Debug)]
pub enum VacdmError {

    #[error("IO error {0}")]
    IOError( #[from] std::io::Error),

    #[error("http error {0}")]
    HttpError( #[from] reqwest::Error),

    #[error("http status {status} for {url}")]
    StatusError { status: reqwest::StatusCode, url: String },

    #[error("header error {0}")]
    InvalidHeaderError( #[from] reqwest::header::InvalidHeaderValue),

    #[error("json error {0}")]
    JsonError( #[from] serde_json::Error),

    #[error("config parse error {0}")]
    RonError( #[from] ron::error::SpannedError),

    #[error("config error {0}")]
    ConfigError(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotEligible(String),

    #[error("data integrity violation {0}")]
    IntegrityError(String),

    #[error("incompatible backend {0}")]
    IncompatibleBackend(String),

    #[error("operation failed {0}")]
    OpFailedError(String)
}

macro_rules! op_failed {
    ($fmt:literal $(, $arg:expr )* ) => {
        $crate::errors::VacdmError::OpFailedError( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use op_failed;

macro_rules! invalid_input {
    ($fmt:literal $(, $arg:expr )* ) => {
        $crate::errors::VacdmError::InvalidInput( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use invalid_input;

macro_rules! config_error {
    ($fmt:literal $(, $arg:expr )* ) => {
        $crate::errors::VacdmError::ConfigError( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use config_error;
