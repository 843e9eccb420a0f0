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
/// Identification and viewer generation against a scripted fake console. The fake answers
/// by method and URL and records every request, so tests can check both the outcome and
/// exactly which calls were made.
use std::{
    collections::HashMap,
    sync::{Mutex, Once},
};

use libdrac::{
    ConsoleClient, ConsoleError, ConsoleVersion, HttpResponse, Target, Templates, Transport,
    UNKNOWN_VERSION,
};
use reqwest::{header::HeaderMap, StatusCode};

const VIEWER7: &str = include_str!("../src/templates/viewer7.jnlp");

const IDRAC7_PROBE: &str = "/software/avctKVMIOMac64.jar";
const IDRAC6_PROBE: &str = "/software/jpcsc.jar";
const ILO_LOGIN: &str = "/json/login_session";
const SMC_LOGIN: &str = "/cgi/login.cgi";
const SMC_VIEWER: &str = "/cgi/url_redirect.cgi?url_name=ikvm&url_type=jwsk";

static SETUP: Once = Once::new();

fn setup_logging() {
    SETUP.call_once(|| {
        use tracing_subscriber::fmt::Layer;
        use tracing_subscriber::prelude::*;
        use tracing_subscriber::{filter::LevelFilter, EnvFilter};
        tracing_subscriber::registry()
            .with(
                EnvFilter::builder()
                    .with_default_directive(LevelFilter::DEBUG.into())
                    .from_env_lossy(),
            )
            .with(Layer::default().compact().with_test_writer().with_ansi(false))
            .init();
    });
}

enum Reply {
    Respond(HttpResponse),
    // Connection refused, timeout, etc.
    Fail,
}

#[derive(Default)]
struct FakeConsole {
    routes: HashMap<(&'static str, String), Reply>,
    calls: Mutex<Vec<String>>,
    get_headers: Mutex<Vec<HeaderMap>>,
}

impl FakeConsole {
    fn new() -> Self {
        setup_logging();
        FakeConsole::default()
    }

    fn on(mut self, method: &'static str, host: &str, path: &str, response: HttpResponse) -> Self {
        self.routes.insert(
            (method, format!("https://{host}{path}")),
            Reply::Respond(response),
        );
        self
    }

    fn failing(mut self, method: &'static str, host: &str, path: &str) -> Self {
        self.routes
            .insert((method, format!("https://{host}{path}")), Reply::Fail);
        self
    }

    fn reply(&self, method: &'static str, url: &str) -> Result<HttpResponse, ConsoleError> {
        self.calls.lock().unwrap().push(format!("{method} {url}"));
        match self.routes.get(&(method, url.to_string())) {
            Some(Reply::Respond(r)) => Ok(r.clone()),
            Some(Reply::Fail) => Err(network_error(url)),
            None => Ok(HttpResponse::new(StatusCode::NOT_FOUND)),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

// A genuine reqwest error without touching the network
fn network_error(url: &str) -> ConsoleError {
    let source = reqwest::blocking::Client::new()
        .get("not a url")
        .build()
        .unwrap_err();
    ConsoleError::NetworkError {
        url: url.to_string(),
        source,
    }
}

impl Transport for FakeConsole {
    fn head(&self, url: &str) -> Result<HttpResponse, ConsoleError> {
        self.reply("HEAD", url)
    }

    fn post(
        &self,
        url: &str,
        _content_type: &'static str,
        _body: String,
    ) -> Result<HttpResponse, ConsoleError> {
        self.reply("POST", url)
    }

    fn get(&self, url: &str, headers: HeaderMap) -> Result<HttpResponse, ConsoleError> {
        self.get_headers.lock().unwrap().push(headers);
        self.reply("GET", url)
    }
}

fn ok() -> HttpResponse {
    HttpResponse::new(StatusCode::OK)
}

fn client(console: FakeConsole) -> Result<ConsoleClient<FakeConsole>, anyhow::Error> {
    Ok(ConsoleClient::new(console, Templates::builtin()?))
}

#[test]
fn test_end_to_end_idrac7() -> Result<(), anyhow::Error> {
    let client = client(FakeConsole::new().on("HEAD", "h", IDRAC7_PROBE, ok()))?;
    let mut target = Target::new("h", "u", "p");
    assert_eq!(target.version, UNKNOWN_VERSION);

    let jnlp = client.viewer(&mut target)?;

    let expected = VIEWER7
        .replace("{{ host }}", "h")
        .replace("{{ port }}", "443")
        .replace("{{ username }}", "u")
        .replace("{{ password }}", "p");
    assert_eq!(jnlp, expected);
    assert!(jnlp.contains("<argument>user=u</argument>"));
    assert!(jnlp.contains("<argument>passwd=p</argument>"));
    assert_eq!(target.version, 7);
    Ok(())
}

#[test]
fn test_idrac7_probed_before_idrac6() -> Result<(), anyhow::Error> {
    let client = client(
        FakeConsole::new()
            .on("HEAD", "h", IDRAC7_PROBE, ok())
            .on("HEAD", "h", IDRAC6_PROBE, ok()),
    )?;
    let mut target = Target::new("h", "u", "p");
    assert_eq!(client.identify(&mut target)?, ConsoleVersion::Idrac7);
    assert_eq!(
        client.transport().calls(),
        vec![format!("HEAD https://h{IDRAC7_PROBE}")]
    );
    Ok(())
}

#[test]
fn test_idrac6_after_idrac7_miss() -> Result<(), anyhow::Error> {
    let client = client(FakeConsole::new().on("HEAD", "h", IDRAC6_PROBE, ok()))?;
    let mut target = Target::new("h", "u", "p");
    assert_eq!(client.identify(&mut target)?, ConsoleVersion::Idrac6);
    assert_eq!(client.transport().calls().len(), 2);
    Ok(())
}

#[test]
fn test_ilo_probed_before_supermicro() -> Result<(), anyhow::Error> {
    let client = client(
        FakeConsole::new()
            .on("POST", "h", ILO_LOGIN, ok().with_cookie("sessionKey", "ilo-key"))
            .on("POST", "h", SMC_LOGIN, ok().with_cookie("SID", "abc123")),
    )?;
    let mut target = Target::new("h", "admin", "secret");
    assert_eq!(client.identify(&mut target)?, ConsoleVersion::Ilo);
    assert_eq!(
        client.transport().calls(),
        vec![
            format!("HEAD https://h{IDRAC7_PROBE}"),
            format!("HEAD https://h{IDRAC6_PROBE}"),
            format!("POST https://h{ILO_LOGIN}"),
        ]
    );
    // the SuperMicro login never ran, so the credentials are the caller's
    assert_eq!(target.username, "admin");
    assert_eq!(target.password, "secret");
    assert_eq!(target.session.token, "ilo-key");
    assert!(target.session.cookie.is_none());
    assert!(!target.session.derived_credential);
    Ok(())
}

#[test]
fn test_viewer_points_at_target_port() -> Result<(), anyhow::Error> {
    let client = client(FakeConsole::new().on("HEAD", "h:8443", IDRAC7_PROBE, ok()))?;
    let mut target = Target::new("h", "u", "p");
    target.port = Some(8443);
    let jnlp = client.viewer(&mut target)?;
    assert!(jnlp.contains(r#"<jnlp codebase="https://h:8443" spec="1.0+">"#));
    assert!(!jnlp.contains(":443"));
    Ok(())
}

#[test]
fn test_ilo_without_session_key() -> Result<(), anyhow::Error> {
    let client = client(FakeConsole::new().on("POST", "h", ILO_LOGIN, ok()))?;
    let mut target = Target::new("h", "u", "p");
    assert_eq!(client.identify(&mut target)?, ConsoleVersion::Ilo);
    assert_eq!(target.version, 2);
    assert_eq!(target.session.token, "");
    assert!(target.session.cookie.is_none());
    Ok(())
}

#[test]
fn test_ilo_viewer_carries_session_key() -> Result<(), anyhow::Error> {
    let client = client(FakeConsole::new().on(
        "POST",
        "ilo",
        ILO_LOGIN,
        ok().with_cookie("sessionKey", "a1b2c3"),
    ))?;
    let mut target = Target::new("ilo", "admin", "secret");
    let jnlp = client.viewer(&mut target)?;
    assert_eq!(target.session.token, "a1b2c3");
    assert!(jnlp.contains(r#"<param name="RCINFO1" value="a1b2c3"/>"#));
    Ok(())
}

#[test]
fn test_supermicro_sid_replaces_credentials() -> Result<(), anyhow::Error> {
    let client = client(
        FakeConsole::new()
            .on("POST", "smc", SMC_LOGIN, ok().with_cookie("SID", "abc123"))
            .on("GET", "smc", SMC_VIEWER, ok().with_body("<jnlp>downloaded</jnlp>")),
    )?;
    let mut target = Target::new("smc", "ADMIN", "ADMIN");

    assert_eq!(client.identify(&mut target)?, ConsoleVersion::Supermicro);
    assert_eq!(target.username, "abc123");
    assert_eq!(target.password, "abc123");
    assert_eq!(target.session.cookie.as_deref(), Some("SID=abc123"));
    assert!(target.session.derived_credential);

    let jnlp = client.viewer(&mut target)?;
    assert_eq!(jnlp, "<jnlp>downloaded</jnlp>");
    let headers = client.transport().get_headers.lock().unwrap();
    assert_eq!(headers[0]["cookie"], "SID=abc123");
    assert_eq!(headers[0]["referer"], "127.0.0.1");
    Ok(())
}

#[test]
fn test_unknown_console() -> Result<(), anyhow::Error> {
    let client = client(
        FakeConsole::new()
            .failing("HEAD", "h", IDRAC7_PROBE)
            .on(
                "HEAD",
                "h",
                IDRAC6_PROBE,
                HttpResponse::new(StatusCode::FORBIDDEN),
            )
            .failing("POST", "h", ILO_LOGIN)
            .on(
                "POST",
                "h",
                SMC_LOGIN,
                HttpResponse::new(StatusCode::UNAUTHORIZED).with_cookie("SID", "nope"),
            ),
    )?;
    let mut target = Target::new("h", "u", "p");
    let err = client.viewer(&mut target).unwrap_err();
    assert!(matches!(err, ConsoleError::UnknownConsole { .. }));
    assert!(target.version < 0);
    assert_eq!(target.username, "u");
    // every probe was tried exactly once
    assert_eq!(client.transport().calls().len(), 4);
    Ok(())
}

#[test]
fn test_preset_versions_skip_probing() -> Result<(), anyhow::Error> {
    let client = client(FakeConsole::new().on("GET", "h", SMC_VIEWER, ok().with_body("smc")))?;
    for version in ConsoleVersion::ALL {
        let mut target = Target::new("h", "u", "p").with_version(version.number());
        let jnlp = client.viewer(&mut target)?;
        assert!(!jnlp.is_empty(), "{version}");
    }
    // only the SuperMicro download went out
    assert_eq!(
        client.transport().calls(),
        vec![format!("GET https://h{SMC_VIEWER}")]
    );
    Ok(())
}

#[test]
fn test_preset_version_without_template() -> Result<(), anyhow::Error> {
    let client = ConsoleClient::new(FakeConsole::new(), Templates::empty());
    for version in [
        ConsoleVersion::Ilo,
        ConsoleVersion::Idrac6,
        ConsoleVersion::Idrac7,
    ] {
        let mut target = Target::new("h", "u", "p").with_version(version.number());
        let err = client.viewer(&mut target).unwrap_err();
        assert!(
            matches!(err, ConsoleError::MissingTemplate(v) if v == version),
            "{version}: {err}"
        );
    }

    let mut target = Target::new("h", "u", "p").with_version(5);
    assert!(matches!(
        client.viewer(&mut target),
        Err(ConsoleError::UnsupportedVersion(5))
    ));
    assert!(client.transport().calls().is_empty());
    Ok(())
}

#[test]
fn test_supermicro_download_failure() -> Result<(), anyhow::Error> {
    let unreachable = client(FakeConsole::new().failing("GET", "h", SMC_VIEWER))?;
    let mut target = Target::new("h", "u", "p").with_version(1);
    let err = unreachable.viewer(&mut target).unwrap_err();
    assert!(matches!(err, ConsoleError::NetworkError { .. }));

    let not_found = client(FakeConsole::new())?;
    let err = not_found.viewer(&mut target).unwrap_err();
    assert!(matches!(
        err,
        ConsoleError::HTTPErrorCode { status_code, .. } if status_code == StatusCode::NOT_FOUND
    ));
    Ok(())
}

#[test]
fn test_render_twice_probes_once() -> Result<(), anyhow::Error> {
    let client = client(FakeConsole::new().on("HEAD", "h", IDRAC7_PROBE, ok()))?;
    let mut target = Target::new("h", "u", "p");
    let first = client.viewer(&mut target)?;
    let calls_after_first = client.transport().calls().len();
    let second = client.viewer(&mut target)?;
    assert_eq!(first, second);
    assert_eq!(calls_after_first, 1);
    assert_eq!(client.transport().calls().len(), 1);
    Ok(())
}

#[test]
fn test_sessions_stay_with_their_target() -> Result<(), anyhow::Error> {
    let client = client(
        FakeConsole::new()
            .on("POST", "ilo-a", ILO_LOGIN, ok().with_cookie("sessionKey", "key-a"))
            .on("POST", "smc-b", SMC_LOGIN, ok().with_cookie("SID", "sid-b")),
    )?;
    let mut a = Target::new("ilo-a", "admin", "pw-a");
    let mut b = Target::new("smc-b", "ADMIN", "pw-b");

    let (version_a, version_b) = std::thread::scope(|s| {
        let ha = s.spawn(|| client.identify(&mut a));
        let hb = s.spawn(|| client.identify(&mut b));
        (ha.join().unwrap(), hb.join().unwrap())
    });
    assert_eq!(version_a?, ConsoleVersion::Ilo);
    assert_eq!(version_b?, ConsoleVersion::Supermicro);

    assert_eq!(a.session.token, "key-a");
    assert!(a.session.cookie.is_none());
    assert_eq!(a.password, "pw-a");
    assert_eq!(b.session.token, "");
    assert_eq!(b.session.cookie.as_deref(), Some("SID=sid-b"));
    assert_eq!(b.password, "sid-b");
    Ok(())
}
