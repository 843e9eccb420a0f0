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
use reqwest::{
    header::{HeaderMap, HeaderValue, COOKIE, REFERER},
    StatusCode,
};
use tracing::{debug, warn};

use crate::{ConsoleError, ConsoleVersion, Probe, ProbeOutcome, SessionGrant, Target, Transport};

const LOGIN_PATH: &str = "cgi/login.cgi";
const JNLP_PATH: &str = "cgi/url_redirect.cgi?url_name=ikvm&url_type=jwsk";
pub const SID_COOKIE: &str = "SID";
// Some SuperMicro interfaces answer 500 when the Referer is missing. Any value will do.
const REFERER_PLACEHOLDER: &str = "127.0.0.1";

/// Logs in through the SuperMicro web UI form. If we can post to the login CGI it is
/// probably a SuperMicro, and the `SID` cookie becomes the credential for the viewer.
#[derive(Debug, Clone, Default)]
pub struct LoginProbe;

impl Probe for LoginProbe {
    fn version(&self) -> ConsoleVersion {
        ConsoleVersion::Supermicro
    }

    fn probe(
        &self,
        transport: &dyn Transport,
        target: &Target,
    ) -> Result<ProbeOutcome, ConsoleError> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("name", &target.username)
            .append_pair("pwd", &target.password)
            .finish();
        let response = transport.post(
            &target.url(LOGIN_PATH),
            "application/x-www-form-urlencoded",
            body,
        )?;
        if response.status != StatusCode::OK {
            return Ok(ProbeOutcome::NoMatch);
        }
        match response.cookie(SID_COOKIE) {
            Some(sid) => Ok(ProbeOutcome::Matched(Some(SessionGrant::Sid(
                sid.to_string(),
            )))),
            None => {
                warn!("SuperMicro login at {} set no {SID_COOKIE} cookie", target.host);
                Ok(ProbeOutcome::Matched(None))
            }
        }
    }
}

/// SuperMicro consoles generate the JNLP themselves. Fetch it with the session cookie
/// negotiated at login and return it untouched. A body that is not UTF-8 is an error, it is
/// never repaired.
pub fn download_viewer(transport: &dyn Transport, target: &Target) -> Result<String, ConsoleError> {
    let url = target.url(JNLP_PATH);
    let mut headers = HeaderMap::new();
    match &target.session.cookie {
        Some(cookie) => {
            let value =
                HeaderValue::from_str(cookie).map_err(|_| ConsoleError::InvalidHeader {
                    name: COOKIE.to_string(),
                })?;
            headers.insert(COOKIE, value);
        }
        None => debug!("No {SID_COOKIE} for {}, requesting viewer without one", target.host),
    }
    headers.insert(REFERER, HeaderValue::from_static(REFERER_PLACEHOLDER));

    let response = transport.get(&url, headers)?;
    if response.status != StatusCode::OK {
        return Err(ConsoleError::HTTPErrorCode {
            url,
            status_code: response.status,
        });
    }
    String::from_utf8(response.body).map_err(|e| ConsoleError::InvalidBody { url, source: e })
}
