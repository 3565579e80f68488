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

use crate::cli::ApiArgs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: json5::Error,
    },
}

/// Defaults for the connection flags, read from a json5 file.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub(crate) api: Option<String>,
    #[serde(default)]
    pub(crate) client_id: Option<String>,
    #[serde(default)]
    pub(crate) client_secret: Option<String>,
    #[serde(default)]
    pub(crate) oauth_url: Option<String>,
    #[serde(default)]
    pub(crate) skip_tls_verification: Option<bool>,
    #[serde(default)]
    pub(crate) ca_certs: Option<PathBuf>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        json5::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Validated connection settings for one command run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api: String,
    pub client_id: String,
    pub client_secret: String,
    pub oauth_url: Url,
    pub skip_tls_verification: bool,
    pub ca_certs: Option<PathBuf>,
}

impl Settings {
    /// Merges flags over the optional config file and validates the result.
    ///
    /// Every problem found is returned, in the order the flags are documented.
    pub fn resolve(args: &ApiArgs) -> Result<Self, Vec<String>> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path).map_err(|err| vec![err.to_string()])?,
            None => FileConfig::default(),
        };

        let pick = |flag: &Option<String>, fallback: Option<String>| {
            flag.clone()
                .or(fallback)
                .filter(|value| !value.is_empty())
        };
        let api = pick(&args.api, file.api);
        let client_id = pick(&args.client_id, file.client_id);
        let client_secret = pick(&args.client_secret, file.client_secret);
        let oauth_url = pick(&args.oauth_url, file.oauth_url);

        let mut issues = Vec::new();
        if api.is_none() {
            issues.push("Must provide an API endpoint for the routing-api component.".to_string());
        }
        if client_id.is_none() {
            issues.push("Must provide the id of an OAuth client.".to_string());
        }
        if client_secret.is_none() {
            issues.push("Must provide an OAuth secret.".to_string());
        }
        let oauth_url = match oauth_url.as_deref().map(Url::parse) {
            None => {
                issues.push("Must provide an URL to the OAuth client.".to_string());
                None
            }
            Some(Err(_)) => {
                issues.push("Invalid OAuth client URL".to_string());
                None
            }
            Some(Ok(url)) => Some(url),
        };

        match (api, client_id, client_secret, oauth_url) {
            (Some(api), Some(client_id), Some(client_secret), Some(oauth_url))
                if issues.is_empty() =>
            {
                Ok(Self {
                    api,
                    client_id,
                    client_secret,
                    oauth_url,
                    skip_tls_verification: args.skip_tls_verification
                        || file.skip_tls_verification.unwrap_or(false),
                    ca_certs: args.ca_certs.clone().or(file.ca_certs),
                })
            }
            _ => Err(issues),
        }
    }
}
