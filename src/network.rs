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
use std::time::Duration;

use reqwest::{
    blocking::Client as HttpClient, blocking::ClientBuilder as HttpClientBuilder,
    blocking::RequestBuilder, header::HeaderMap, header::HeaderValue, header::CONTENT_TYPE,
    StatusCode,
};
use tracing::debug;

use crate::{ConsoleClient, ConsoleError, Templates};

// Probes against a host that isn't the console we're looking for should fail fast
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub struct ConsoleClientPoolBuilder {
    timeout: Duration,
    accept_invalid_certs: bool,
}

impl ConsoleClientPoolBuilder {
    /// Prevents the client from accepting self signed certificates
    /// and other invalid certificates.
    ///
    /// By default self signed certificates will be accepted, since BMCs usually
    /// use those.
    pub fn reject_invalid_certs(mut self) -> ConsoleClientPoolBuilder {
        self.accept_invalid_certs = false;
        self
    }

    /// Overwrites the connect and read timeout applied to every request
    pub fn timeout(mut self, timeout: Duration) -> ConsoleClientPoolBuilder {
        self.timeout = timeout;
        self
    }

    pub fn build(&self) -> Result<ConsoleClientPool, ConsoleError> {
        let http_client = HttpClientBuilder::new()
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .connect_timeout(self.timeout)
            .timeout(self.timeout)
            .build()
            .map_err(ConsoleError::HttpClientError)?;
        Ok(ConsoleClientPool { http_client })
    }
}

/// Shared HTTP connection pool. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ConsoleClientPool {
    http_client: HttpClient,
}

impl ConsoleClientPool {
    /// Returns Builder for configuring the HTTP connection pool
    pub fn builder() -> ConsoleClientPoolBuilder {
        ConsoleClientPoolBuilder {
            timeout: DEFAULT_TIMEOUT,
            // BMCs often have a self-signed cert, so usually this has to be true
            accept_invalid_certs: true,
        }
    }

    pub fn transport(&self) -> HttpTransport {
        HttpTransport::new(self.http_client.clone())
    }

    /// Creates a client that identifies consoles and renders viewers using `templates`
    pub fn create_client(&self, templates: Templates) -> ConsoleClient<HttpTransport> {
        ConsoleClient::new(self.transport(), templates)
    }
}

/// A cookie set by the remote console
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub cookies: Vec<Cookie>,
    /// Raw body bytes, exactly as received
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: StatusCode) -> Self {
        HttpResponse {
            status,
            cookies: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.push(Cookie {
            name: name.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Value of the last non-empty cookie called `name`
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .rev()
            .find(|c| c.name == name && !c.value.is_empty())
            .map(|c| c.value.as_str())
    }
}

/// The HTTP calls identification and viewer download need. Every call is attempted
/// exactly once.
pub trait Transport: Send + Sync {
    fn head(&self, url: &str) -> Result<HttpResponse, ConsoleError>;

    fn post(
        &self,
        url: &str,
        content_type: &'static str,
        body: String,
    ) -> Result<HttpResponse, ConsoleError>;

    fn get(&self, url: &str, headers: HeaderMap) -> Result<HttpResponse, ConsoleError>;
}

/// [`Transport`] over a shared `reqwest` blocking client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: HttpClient,
}

impl HttpTransport {
    pub fn new(http_client: HttpClient) -> Self {
        Self { http_client }
    }

    // All the HTTP requests happen from here.
    fn send(&self, url: &str, req_b: RequestBuilder) -> Result<HttpResponse, ConsoleError> {
        let response = req_b.send().map_err(|e| ConsoleError::NetworkError {
            url: url.to_string(),
            source: e,
        })?;
        let status = response.status();
        let cookies: Vec<Cookie> = response
            .cookies()
            .map(|c| Cookie {
                name: c.name().to_string(),
                value: c.value().to_string(),
            })
            .collect();
        let body = response
            .bytes()
            .map_err(|e| ConsoleError::NetworkError {
                url: url.to_string(),
                source: e,
            })?
            .to_vec();
        debug!("RX {status} {} cookies, {} bytes", cookies.len(), body.len());
        Ok(HttpResponse {
            status,
            cookies,
            body,
        })
    }
}

impl Transport for HttpTransport {
    fn head(&self, url: &str) -> Result<HttpResponse, ConsoleError> {
        debug!("TX HEAD {url}");
        self.send(url, self.http_client.head(url))
    }

    fn post(
        &self,
        url: &str,
        content_type: &'static str,
        body: String,
    ) -> Result<HttpResponse, ConsoleError> {
        // body carries credentials, don't log it
        debug!("TX POST {url} {content_type}");
        let content_type =
            HeaderValue::from_str(content_type).map_err(|_| ConsoleError::InvalidHeader {
                name: CONTENT_TYPE.to_string(),
            })?;
        let req_b = self
            .http_client
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .body(body);
        self.send(url, req_b)
    }

    fn get(&self, url: &str, headers: HeaderMap) -> Result<HttpResponse, ConsoleError> {
        debug!("TX GET {url}");
        self.send(url, self.http_client.get(url).headers(headers))
    }
}
