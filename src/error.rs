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

use crate::ConsoleVersion;

#[derive(thiserror::Error, Debug)]
pub enum ConsoleError {
    #[error("Could not build HTTP client. {0}")]
    HttpClientError(reqwest::Error),

    #[error("Network error talking to remote console at {url}. {source}")]
    NetworkError { url: String, source: reqwest::Error },

    #[error("HTTP {status_code} at {url}. See debug logs for details.")]
    HTTPErrorCode {
        url: String,
        status_code: StatusCode,
    },

    #[error("Could not serialize request body for {url}. Obj: {object_debug}. {source}")]
    JsonSerializeError {
        url: String,
        object_debug: String,
        source: serde_json::Error,
    },

    #[error("Invalid value for HTTP header {name}")]
    InvalidHeader { name: String },

    #[error("Response from {url} is not valid UTF-8. {source}")]
    InvalidBody {
        url: String,
        source: std::string::FromUtf8Error,
    },

    #[error("Unable to detect remote console version of {host}")]
    UnknownConsole { host: String },

    #[error("No support for remote console version {0}")]
    UnsupportedVersion(i32),

    #[error("No viewer template for {0}")]
    MissingTemplate(ConsoleVersion),

    /// Templates ship with the crate (or are provided by the operator), so a template that
    /// does not parse or render is a packaging problem and not something to retry.
    #[error("Viewer template {name} is broken: {source}")]
    TemplateError {
        name: String,
        source: minijinja::Error,
    },

    #[error("Could not read viewer template {path}: {source}")]
    TemplateReadError {
        path: String,
        source: std::io::Error,
    },
}
