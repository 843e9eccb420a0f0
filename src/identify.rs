/*
 * SPDX-FileCopyrightText: Copyright (c) 2023 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
 * SPDX-License-Identifier: MIT
 *
 * Permission is hereby granted, free of charge, to any person obtaining a
 * copy of this software and associated documentation files (the "Software"),
 * to deal in the Software without restriction, including without limitation
 * the rights to use, copy, modify, merge, publish, distribute, sublicense,
 * and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in
 * all copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL
 * THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
 * FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
 * DEALINGS IN THE SOFTWARE.
 */
use tracing::{debug, info, warn};

use crate::{
    dell, hpe, supermicro, ConsoleClient, ConsoleError, ConsoleVersion, Probe, ProbeOutcome,
    Target, Transport,
};

/// The order consoles are probed in. The iDRAC probes only look for files, so they go
/// first; the login probes post credentials and have side effects on the console.
pub fn default_probes() -> Vec<Box<dyn Probe>> {
    vec![
        Box::new(dell::LibraryProbe::idrac7()),
        Box::new(dell::LibraryProbe::idrac6()),
        Box::new(hpe::LoginProbe),
        Box::new(supermicro::LoginProbe),
    ]
}

impl<T: Transport> ConsoleClient<T> {
    /// Work out which remote console `target` runs.
    ///
    /// A target that already has a version is not probed, its version is checked and
    /// returned. Otherwise probes run in order and the first match wins: its session (if
    /// any) is applied to the target and `target.version` is set. A probe that fails at the
    /// transport level is skipped. If nothing matches, `target.version` stays negative.
    pub fn identify(&self, target: &mut Target) -> Result<ConsoleVersion, ConsoleError> {
        if target.is_resolved() {
            return ConsoleVersion::try_from(target.version);
        }

        info!("Detecting version of {}...", target.host);
        for probe in &self.probes {
            let version = probe.version();
            match probe.probe(&self.transport, target) {
                Ok(ProbeOutcome::Matched(grant)) => {
                    if let Some(grant) = grant {
                        target.apply_grant(grant);
                    }
                    target.version = version.number();
                    info!("{} is {version}", target.host);
                    return Ok(version);
                }
                Ok(ProbeOutcome::NoMatch) => debug!("{} is not {version}", target.host),
                Err(e) => warn!("{version} probe of {} inconclusive: {e}", target.host),
            }
        }
        Err(ConsoleError::UnknownConsole {
            host: target.host.clone(),
        })
    }
}
