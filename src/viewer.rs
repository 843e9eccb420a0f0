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
use tracing::info;

use crate::{supermicro, ConsoleClient, ConsoleError, ConsoleVersion, Target, Transport};

impl<T: Transport> ConsoleClient<T> {
    /// Returns a JNLP viewer descriptor filled out with the details needed to connect to
    /// `target`, identifying the console first if its version is unknown.
    ///
    /// iDRAC and iLO viewers are rendered from the template table. SuperMicro consoles
    /// generate their own, which is downloaded using the session from identification.
    pub fn viewer(&self, target: &mut Target) -> Result<String, ConsoleError> {
        let version = self.identify(target)?;
        match version {
            ConsoleVersion::Idrac6 | ConsoleVersion::Idrac7 => {
                info!("Found iDRAC version {}", version.number());
                self.templates.render(version, target)
            }
            ConsoleVersion::Ilo => {
                info!("Found iLO");
                self.templates.render(version, target)
            }
            ConsoleVersion::Supermicro => {
                info!("Found SuperMicro, downloading viewer");
                supermicro::download_viewer(&self.transport, target)
            }
        }
    }
}
