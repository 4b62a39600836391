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

use std::sync::Mutex;

use crate::{command::Command, pilot::ScopeFlightplanUpdate};

/// a mutex guarded buffer that producers push to at any time and the reconciliation pass drains as a whole.
/// Critical sections are limited to moving items in or out
#[derive(Debug)]
pub struct DrainQueue<T> {
    items: Mutex<Vec<T>>
}

impl<T> DrainQueue<T> {
    pub fn new()->Self {
        DrainQueue { items: Mutex::new( Vec::new()) }
    }

    pub fn push (&self, item: T) {
        self.lock().push( item);
    }

    /// take all queued items, leaving the queue empty
    pub fn drain (&self)->Vec<T> {
        std::mem::take( &mut *self.lock())
    }

    pub fn clear (&self) {
        self.lock().clear();
    }

    pub fn len (&self)->usize { self.lock().len() }

    pub fn is_empty (&self)->bool { self.lock().is_empty() }

    fn lock (&self)->std::sync::MutexGuard<'_,Vec<T>> {
        self.items.lock().unwrap_or_else( |poisoned| poisoned.into_inner())
    }
}

impl<T> Default for DrainQueue<T> {
    fn default()->Self { DrainQueue::new() }
}

pub type ScopeIngestQueue = DrainQueue<ScopeFlightplanUpdate>;
pub type CommandQueue = DrainQueue<Command>;
