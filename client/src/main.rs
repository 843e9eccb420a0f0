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

/* JNLP viewer generator for Dell iDRAC, HP iLO and SuperMicro remote consoles
 *
 * USAGE: ./drac-client -H 10.153.145.103 -U root -P calvin -o viewer.jnlp
 * -H: Hostname or IP address of the console, optionally with :port. HTTPS only.
 * Run with no params for help.
 * Run with `-v` for more output.
 */

use std::{path::Path, time::Duration};

use anyhow::{anyhow, Context};
use libdrac::{ConsoleClientPool, Target, Templates};
use tracing::info;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt::Layer;
use tracing_subscriber::prelude::*;

fn main() -> Result<(), anyhow::Error> {
    let args: Vec<String> = std::env::args().collect();
    let mut opts = getopts::Options::new();

    opts.optflag("h", "help", "Print this help");
    opts.optflag("v", "verbose", "Log at DEBUG level. Default is INFO");
    opts.optopt(
        "H",
        "hostname",
        "Required. Hostname or IP address of the remote console, optionally HOST:PORT",
        "HOST",
    );
    opts.optopt("U", "username", "Console username", "USER");
    opts.optopt("P", "password", "Console password", "PASS");
    opts.optopt(
        "V",
        "version",
        "Skip detection and assume this console version:
                1 SuperMicro
                2 iLO
                6 iDRAC6
                7 iDRAC7",
        "VERSION",
    );
    opts.optopt("t", "timeout", "Per request timeout in seconds. Default 5", "SECS");
    opts.optopt(
        "T",
        "templates",
        "Directory with viewer<version>.jnlp files overriding the built-in templates",
        "DIR",
    );
    opts.optopt("o", "output", "Write the viewer here instead of stdout", "FILE");
    opts.optflag("", "strict-tls", "Reject self signed and other invalid certificates");

    let args_given = opts.parse(&args[1..])?;
    if args_given.opt_present("h") || !args_given.opt_present("H") {
        eprintln!(
            "{}",
            opts.usage("drac-client -H host -U user -P pass [-o viewer.jnlp]")
        );
        return Ok(());
    }

    let log_level = if args_given.opt_present("v") {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let env_filter = EnvFilter::from_default_env()
        .add_directive(log_level.into())
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);
    // stdout is reserved for the viewer
    tracing_subscriber::registry()
        .with(Layer::default().compact().with_writer(std::io::stderr))
        .with(env_filter)
        .init();

    let address = args_given
        .opt_str("H")
        .ok_or_else(|| anyhow!("-H is required"))?;
    let (host, port) = split_host_port(&address)?;
    let mut target = Target::new(
        &host,
        &args_given.opt_str("U").unwrap_or_default(),
        &args_given.opt_str("P").unwrap_or_default(),
    );
    target.port = port;
    if let Some(v) = args_given.opt_str("V") {
        let version: i32 = v.parse().with_context(|| format!("Invalid version '{v}'"))?;
        target = target.with_version(version);
    }

    let mut builder = ConsoleClientPool::builder();
    if let Some(t) = args_given.opt_str("t") {
        let secs: u64 = t.parse().with_context(|| format!("Invalid timeout '{t}'"))?;
        builder = builder.timeout(Duration::from_secs(secs));
    }
    if args_given.opt_present("strict-tls") {
        builder = builder.reject_invalid_certs();
    }
    let templates = match args_given.opt_str("T") {
        Some(dir) => Templates::from_dir(Path::new(&dir))?,
        None => Templates::builtin()?,
    };
    let client = builder.build()?.create_client(templates);

    let jnlp = client.viewer(&mut target)?;
    match args_given.opt_str("o") {
        Some(path) => {
            std::fs::write(&path, &jnlp).with_context(|| format!("Writing {path}"))?;
            info!("Viewer for {} written to {path}", target.host);
        }
        None => print!("{jnlp}"),
    }
    Ok(())
}

/// "bmc:8443" -> ("bmc", Some(8443)). Bracketed IPv6 is accepted, bare IPv6 is taken as a
/// host without port.
fn split_host_port(address: &str) -> Result<(String, Option<u16>), anyhow::Error> {
    if let Some(rest) = address.strip_prefix('[') {
        let (host, tail) = rest
            .split_once(']')
            .ok_or_else(|| anyhow!("Unterminated '[' in host '{address}'"))?;
        let port = match tail.strip_prefix(':') {
            Some(p) => Some(p.parse().with_context(|| format!("Invalid port '{p}'"))?),
            None => None,
        };
        return Ok((format!("[{host}]"), port));
    }
    match address.split_once(':') {
        Some((host, p)) if !p.contains(':') => {
            let port = p.parse().with_context(|| format!("Invalid port '{p}'"))?;
            Ok((host.to_string(), Some(port)))
        }
        _ => Ok((address.to_string(), None)),
    }
}
