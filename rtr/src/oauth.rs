/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! OAuth2 client-credentials token fetch.

use crate::config::Settings;
use reqwest::header::ACCEPT;
use reqwest::redirect::Policy;
use reqwest::Certificate;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;
use url::Url;

const TOKEN_PATH: &str = "/oauth/token";

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Failed to read ca cert file: {source}")]
    ReadCaCert {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to load caCert: {0}")]
    InvalidCaCert(#[source] reqwest::Error),

    #[error("invalid oauth token url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error(transparent)]
    Request(#[from] reqwest::Error),

    #[error("oauth server responded with status {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Token {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

pub struct TokenFetcher {
    http: reqwest::Client,
    token_url: Url,
    client_id: String,
    client_secret: String,
}

impl TokenFetcher {
    pub fn new(settings: &Settings) -> Result<Self, OAuthError> {
        let mut builder = reqwest::Client::builder()
            .danger_accept_invalid_certs(settings.skip_tls_verification)
            .redirect(Policy::none());

        if let Some(path) = &settings.ca_certs {
            let pem = std::fs::read(path).map_err(|source| OAuthError::ReadCaCert {
                path: path.clone(),
                source,
            })?;
            let certificate = Certificate::from_pem(&pem).map_err(OAuthError::InvalidCaCert)?;
            builder = builder.add_root_certificate(certificate);
        }

        let base = settings.oauth_url.as_str().trim_end_matches('/');
        Ok(Self {
            http: builder.build()?,
            token_url: Url::parse(&format!("{base}{TOKEN_PATH}"))?,
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
        })
    }

    pub async fn fetch_token(&self) -> Result<Token, OAuthError> {
        debug!(
            component = "oauth",
            token_url = self.token_url.as_str(),
            "fetching client credentials token"
        );

        let response = self
            .http
            .post(self.token_url.clone())
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header(ACCEPT, "application/json")
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OAuthError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}
