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

use tracing::info;

mod dell;
mod error;
mod hpe;
mod identify;
mod network;
mod supermicro;
mod templates;
mod viewer;

pub use error::ConsoleError;
pub use identify::default_probes;
pub use network::{
    ConsoleClientPool, ConsoleClientPoolBuilder, Cookie, HttpResponse, HttpTransport, Transport,
};
pub use templates::Templates;

/// Version of a target whose remote console has not been identified yet.
pub const UNKNOWN_VERSION: i32 = -1;

/// The remote console families we know how to talk to. The discriminant is the version
/// number used on the command line and in the viewer template table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConsoleVersion {
    /// SuperMicro IPMI web UI (ATEN iKVM). The viewer is downloaded, not rendered.
    Supermicro = 1,
    /// HP iLO, JSON login API
    Ilo = 2,
    Idrac6 = 6,
    Idrac7 = 7,
}

impl ConsoleVersion {
    pub const ALL: [ConsoleVersion; 4] = [
        ConsoleVersion::Supermicro,
        ConsoleVersion::Ilo,
        ConsoleVersion::Idrac6,
        ConsoleVersion::Idrac7,
    ];

    pub fn number(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for ConsoleVersion {
    type Error = ConsoleError;

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        ConsoleVersion::ALL
            .into_iter()
            .find(|c| c.number() == v)
            .ok_or(ConsoleError::UnsupportedVersion(v))
    }
}

impl fmt::Display for ConsoleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Session negotiated with one remote console. Lives on the [`Target`] it was negotiated
/// for, never shared between hosts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// iLO `sessionKey`. Empty until a login hands one out.
    pub token: String,
    /// Value of the `Cookie` header sent when downloading a SuperMicro viewer, e.g.
    /// `SID=abc123`
    pub cookie: Option<String>,
    /// True once `username` and `password` hold a session identifier instead of the
    /// credentials the caller supplied. See [`Target::adopt_session_credential`].
    pub derived_credential: bool,
}

/// Session material handed out by a successful vendor login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionGrant {
    /// iLO `sessionKey` cookie value
    SessionKey(String),
    /// SuperMicro `SID` cookie value
    Sid(String),
}

/// One remote console we want a viewer for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Hostname or IP address of the BMC
    pub host: String,
    /// HTTPS port. If absent 443 is used.
    pub port: Option<u16>,
    pub username: String,
    pub password: String,
    /// One of the [`ConsoleVersion`] numbers once identified, negative while unknown.
    pub version: i32,
    pub session: Session,
}

impl Default for Target {
    fn default() -> Self {
        Target {
            host: "".to_string(),
            port: None,
            username: "".to_string(),
            password: "".to_string(),
            version: UNKNOWN_VERSION,
            session: Session::default(),
        }
    }
}

impl Target {
    pub fn new(host: &str, username: &str, password: &str) -> Self {
        Target {
            host: host.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            ..Default::default()
        }
    }

    /// Skip identification and use this version number as is.
    pub fn with_version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    pub fn is_resolved(&self) -> bool {
        self.version >= 0
    }

    /// `https://` URL of `path` (no leading slash) on this console.
    pub fn url(&self, path: &str) -> String {
        match self.port {
            Some(p) => format!("https://{}:{}/{}", self.host, p, path),
            None => format!("https://{}/{}", self.host, path),
        }
    }

    /// Replace both `username` and `password` with a SuperMicro session identifier.
    ///
    /// The ATEN iKVM viewer authenticates with the `SID` cookie value in place of the
    /// user's credentials, so the downloaded descriptor (and anything rendered from the
    /// target afterwards) must carry the SID in both fields. The original credentials are
    /// gone after this call and `session.derived_credential` is set.
    pub fn adopt_session_credential(&mut self, sid: &str) {
        info!("Setting username/password of {} to SID session cookie", self.host);
        self.session.cookie = Some(format!("{}={}", supermicro::SID_COOKIE, sid));
        self.username = sid.to_string();
        self.password = sid.to_string();
        self.session.derived_credential = true;
    }

    pub(crate) fn apply_grant(&mut self, grant: SessionGrant) {
        match grant {
            SessionGrant::SessionKey(key) => self.session.token = key,
            SessionGrant::Sid(sid) => self.adopt_session_credential(&sid),
        }
    }
}

/// What a single [`Probe`] found out about a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    NoMatch,
    /// The console answered like this probe's vendor. A login probe may also hand out a
    /// session; `None` means it matched without one.
    Matched(Option<SessionGrant>),
}

/// A single vendor fingerprint. Probes are tried in order by
/// [`ConsoleClient::identify`] and must not mutate the target themselves.
pub trait Probe: Send + Sync {
    /// The version this probe resolves to when it matches.
    fn version(&self) -> ConsoleVersion;

    /// Issue the probe request(s). A transport error means the probe was inconclusive, the
    /// caller moves on to the next probe.
    fn probe(
        &self,
        transport: &dyn Transport,
        target: &Target,
    ) -> Result<ProbeOutcome, ConsoleError>;
}

/// Identifies remote consoles and produces JNLP viewer descriptors for them.
///
/// The client holds no per-target state, so one client can serve many targets, including
/// from several threads at once.
pub struct ConsoleClient<T: Transport> {
    transport: T,
    templates: Templates,
    probes: Vec<Box<dyn Probe>>,
}

impl<T: Transport> ConsoleClient<T> {
    /// A client using the standard probe order, see [`default_probes`].
    pub fn new(transport: T, templates: Templates) -> Self {
        Self::with_probes(transport, templates, default_probes())
    }

    pub fn with_probes(transport: T, templates: Templates, probes: Vec<Box<dyn Probe>>) -> Self {
        ConsoleClient {
            transport,
            templates,
            probes,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn templates(&self) -> &Templates {
        &self.templates
    }
}
