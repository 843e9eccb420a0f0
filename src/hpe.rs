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
use std::fmt;

use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{ConsoleError, ConsoleVersion, Probe, ProbeOutcome, SessionGrant, Target, Transport};

const LOGIN_PATH: &str = "json/login_session";
pub const SESSION_KEY_COOKIE: &str = "sessionKey";

#[derive(Serialize)]
struct LoginRequest<'a> {
    method: &'static str,
    user_login: &'a str,
    password: &'a str,
}

// Keeps the password out of error messages
impl fmt::Debug for LoginRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("method", &self.method)
            .field("user_login", &self.user_login)
            .finish_non_exhaustive()
    }
}

/// Logs in through the iLO JSON API. A 200 means this is an iLO, and the `sessionKey`
/// cookie it hands out is what the viewer authenticates with.
#[derive(Debug, Clone, Default)]
pub struct LoginProbe;

impl Probe for LoginProbe {
    fn version(&self) -> ConsoleVersion {
        ConsoleVersion::Ilo
    }

    fn probe(
        &self,
        transport: &dyn Transport,
        target: &Target,
    ) -> Result<ProbeOutcome, ConsoleError> {
        let url = target.url(LOGIN_PATH);
        let login = LoginRequest {
            method: "login",
            user_login: &target.username,
            password: &target.password,
        };
        let body = serde_json::to_string(&login).map_err(|e| ConsoleError::JsonSerializeError {
            url: url.clone(),
            object_debug: format!("{login:?}"),
            source: e,
        })?;

        let response = transport.post(&url, "application/json", body)?;
        if response.status != StatusCode::OK {
            return Ok(ProbeOutcome::NoMatch);
        }
        for c in &response.cookies {
            debug!("iLO login set cookie {}", c.name);
        }
        match response.cookie(SESSION_KEY_COOKIE) {
            Some(key) => Ok(ProbeOutcome::Matched(Some(SessionGrant::SessionKey(
                key.to_string(),
            )))),
            None => {
                // Still an iLO as far as we can tell, but the viewer will have no session.
                warn!("iLO login at {url} set no {SESSION_KEY_COOKIE} cookie");
                Ok(ProbeOutcome::Matched(None))
            }
        }
    }
}
