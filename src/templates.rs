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
use std::path::Path;

use minijinja::{context, AutoEscape, Environment, ErrorKind, UndefinedBehavior};
use tracing::debug;

use crate::{ConsoleError, ConsoleVersion, Target};

const DEFAULT_HTTPS_PORT: u16 = 443;

const BUILTIN: [(ConsoleVersion, &str); 4] = [
    (
        ConsoleVersion::Supermicro,
        include_str!("templates/viewer1.jnlp"),
    ),
    (ConsoleVersion::Ilo, include_str!("templates/viewer2.jnlp")),
    (ConsoleVersion::Idrac6, include_str!("templates/viewer6.jnlp")),
    (ConsoleVersion::Idrac7, include_str!("templates/viewer7.jnlp")),
];

/// JNLP viewer templates keyed by console version.
///
/// Templates see `host`, `port` (443 unless the target sets one), `username`, `password`
/// and `session_key`. Referencing anything
/// else is an error, as is a template that does not parse. Both are caught when the
/// template is added, not when a viewer is rendered.
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    /// A table with no templates at all
    pub fn empty() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_name: &str| AutoEscape::None);
        Templates { env }
    }

    /// The templates shipped with this crate
    pub fn builtin() -> Result<Self, ConsoleError> {
        let mut t = Templates::empty();
        for (version, source) in BUILTIN {
            t.insert(version, source.to_string())?;
        }
        Ok(t)
    }

    /// Built-in templates, overridden by any `viewer<version>.jnlp` file in `dir`
    pub fn from_dir(dir: &Path) -> Result<Self, ConsoleError> {
        let mut t = Templates::builtin()?;
        for version in ConsoleVersion::ALL {
            let path = dir.join(template_name(version));
            if !path.is_file() {
                continue;
            }
            debug!("Loading {version} viewer template from {}", path.display());
            let source =
                std::fs::read_to_string(&path).map_err(|e| ConsoleError::TemplateReadError {
                    path: path.display().to_string(),
                    source: e,
                })?;
            t.insert(version, source)?;
        }
        Ok(t)
    }

    /// Adds or replaces the template for `version`
    pub fn insert(&mut self, version: ConsoleVersion, source: String) -> Result<(), ConsoleError> {
        let name = template_name(version);
        self.env
            .add_template_owned(name.clone(), source)
            .map_err(|e| ConsoleError::TemplateError { name, source: e })
    }

    pub fn remove(&mut self, version: ConsoleVersion) {
        self.env.remove_template(&template_name(version));
    }

    pub fn contains(&self, version: ConsoleVersion) -> bool {
        self.env.get_template(&template_name(version)).is_ok()
    }

    /// Fill in the template for `version` with the target's host, credentials and session
    pub fn render(&self, version: ConsoleVersion, target: &Target) -> Result<String, ConsoleError> {
        let name = template_name(version);
        let template = self.env.get_template(&name).map_err(|e| match e.kind() {
            ErrorKind::TemplateNotFound => ConsoleError::MissingTemplate(version),
            _ => ConsoleError::TemplateError {
                name: name.clone(),
                source: e,
            },
        })?;
        template
            .render(context! {
                host => &target.host,
                port => target.port.unwrap_or(DEFAULT_HTTPS_PORT),
                username => &target.username,
                password => &target.password,
                session_key => &target.session.token,
            })
            .map_err(|e| ConsoleError::TemplateError { name, source: e })
    }
}

fn template_name(version: ConsoleVersion) -> String {
    format!("viewer{}.jnlp", version.number())
}
