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
use reqwest::StatusCode;

use crate::{ConsoleError, ConsoleVersion, Probe, ProbeOutcome, Target, Transport};

// Client libraries that only ship with one iDRAC generation
const IDRAC7_LIBRARY: &str = "software/avctKVMIOMac64.jar";
const IDRAC6_LIBRARY: &str = "software/jpcsc.jar";

/// Detects an iDRAC generation by the presence of a viewer library only that generation
/// serves. Needs no credentials.
#[derive(Debug, Clone)]
pub struct LibraryProbe {
    version: ConsoleVersion,
    path: &'static str,
}

impl LibraryProbe {
    pub fn idrac7() -> Self {
        LibraryProbe {
            version: ConsoleVersion::Idrac7,
            path: IDRAC7_LIBRARY,
        }
    }

    pub fn idrac6() -> Self {
        LibraryProbe {
            version: ConsoleVersion::Idrac6,
            path: IDRAC6_LIBRARY,
        }
    }
}

impl Probe for LibraryProbe {
    fn version(&self) -> ConsoleVersion {
        self.version
    }

    fn probe(
        &self,
        transport: &dyn Transport,
        target: &Target,
    ) -> Result<ProbeOutcome, ConsoleError> {
        let response = transport.head(&target.url(self.path))?;
        if response.status == StatusCode::OK {
            Ok(ProbeOutcome::Matched(None))
        } else {
            Ok(ProbeOutcome::NoMatch)
        }
    }
}
