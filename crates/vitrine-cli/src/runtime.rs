// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use vitrine_app::{DeleteTarget, Profile, ProfilePayload, SaveOutcome, SaveRequest};
use vitrine_client::{BridgeError, Client};
use vitrine_tui::AppRuntime;

/// Runs the UI against the live backend.
pub struct HttpRuntime {
    client: Client,
}

impl HttpRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl AppRuntime for HttpRuntime {
    fn load_profiles(&mut self) -> Result<Vec<Profile>> {
        let admin_path = self.client.admin_path().to_owned();
        let page = self.client.bootstrap().with_context(|| {
            format!(
                "load admin page {}{admin_path}",
                self.client.base_url().as_str().trim_end_matches('/')
            )
        })?;
        if page.csrf_token.is_none() {
            tracing::warn!(path = %admin_path, "admin page has no anti-forgery field");
        }
        Ok(page.profiles)
    }

    fn load_profile(&mut self, identifiant: &str) -> Result<ProfilePayload, BridgeError> {
        self.client.load_data(identifiant)
    }

    fn save(&mut self, request: &SaveRequest) -> Result<SaveOutcome, BridgeError> {
        self.client.save(request)
    }

    fn delete(&mut self, target: &DeleteTarget) -> Result<(), BridgeError> {
        self.client.delete(target)
    }
}
