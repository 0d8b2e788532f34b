//! Flow descriptors and the wire payload sent when enabling them.
//!
//! A flow is either a sync (scheduled record pull) or an action (on-demand
//! invocation). Descriptors arrive from the integration listing; the backend
//! owns durable state, so a descriptor only mirrors it for the lifetime of a
//! toggle session.
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend-assigned flow identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct FlowId(pub u64);

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    Sync,
    Action,
}

impl FlowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowKind::Sync => "sync",
            FlowKind::Action => "action",
        }
    }
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncType {
    #[serde(alias = "incremental")]
    Incremental,
    #[serde(alias = "full")]
    Full,
}

/// A model referenced by a flow. Fields are kept opaque and serialized
/// verbatim into `model_schema`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FlowModel {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<serde_json::Value>,
}

/// Normalized description of a sync or action as listed for an integration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FlowDescriptor {
    #[serde(default, rename = "id", skip_serializing_if = "Option::is_none")]
    identity: Option<FlowId>,
    #[serde(rename = "type")]
    pub kind: FlowKind,
    pub name: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default, rename = "providerConfigKey")]
    pub provider_config_key: String,
    #[serde(default)]
    pub enabled: bool,
    /// Cadence expression such as `every hour`; empty for actions.
    #[serde(default)]
    pub runs: String,
    #[serde(default)]
    pub track_deletes: bool,
    /// Unset for actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_type: Option<SyncType>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub models: Vec<FlowModel>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub input: Option<serde_json::Value>,
    #[serde(default)]
    pub returns: Vec<String>,
    #[serde(default)]
    pub endpoints: Vec<serde_json::Value>,
    #[serde(default)]
    pub output: Option<serde_json::Value>,
    #[serde(default)]
    pub pre_built: bool,
    #[serde(default)]
    pub is_public: bool,
    /// Deployed script version; absent for templates never deployed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl FlowDescriptor {
    pub fn new(kind: FlowKind, name: impl Into<String>) -> Self {
        Self {
            identity: None,
            kind,
            name: name.into(),
            provider: String::new(),
            provider_config_key: String::new(),
            enabled: false,
            runs: String::new(),
            track_deletes: false,
            sync_type: None,
            description: String::new(),
            models: Vec::new(),
            scopes: Vec::new(),
            input: None,
            returns: Vec::new(),
            endpoints: Vec::new(),
            output: None,
            pre_built: false,
            is_public: false,
            version: None,
        }
    }

    pub fn identity(&self) -> Option<FlowId> {
        self.identity
    }

    /// Record the backend identity. Once set it can only be confirmed, never
    /// replaced or cleared.
    pub fn assign_identity(&mut self, id: FlowId) -> Result<()> {
        match self.identity {
            None => {
                self.identity = Some(id);
                Ok(())
            }
            Some(existing) if existing == id => Ok(()),
            Some(existing) => Err(anyhow!(
                "flow {} already has identity {existing}, refusing {id}",
                self.name
            )),
        }
    }

    /// Overlay the live status of an already-configured flow with the same
    /// kind and name. Returns true when a live record was found.
    pub fn apply_live_state(&mut self, listing: &FlowListing) -> Result<bool> {
        let Some(live) = listing.find(self.kind, &self.name) else {
            return Ok(false);
        };
        if let Some(id) = live.id {
            self.assign_identity(id)?;
        }
        self.enabled = live.enabled;
        Ok(true)
    }

    /// Build the payload used by both create and re-enable requests.
    pub fn to_payload(&self, raw_name: Option<&str>) -> FlowPayload {
        let public_route = raw_name
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.provider)
            .to_string();
        FlowPayload {
            id: self.identity,
            provider: self.provider.clone(),
            provider_config_key: self.provider_config_key.clone(),
            kind: self.kind,
            name: self.name.clone(),
            runs: self.runs.clone(),
            auto_start: !self.runs.trim().is_empty(),
            track_deletes: self.track_deletes,
            sync_type: self.sync_type,
            models: self.models.iter().map(|model| model.name.clone()).collect(),
            scopes: self.scopes.clone(),
            input: self.input.clone(),
            returns: self.returns.clone(),
            metadata: FlowMetadata {
                description: self.description.clone(),
                scopes: self.scopes.clone(),
            },
            endpoints: self.endpoints.clone(),
            output: self.output.clone(),
            pre_built: self.pre_built,
            is_public: self.is_public,
            model_schema: serde_json::to_string(&self.models).unwrap_or_else(|_| "[]".into()),
            public_route,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowMetadata {
    pub description: String,
    pub scopes: Vec<String>,
}

/// Full flow definition as the backend expects it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<FlowId>,
    pub provider: String,
    #[serde(rename = "providerConfigKey")]
    pub provider_config_key: String,
    #[serde(rename = "type")]
    pub kind: FlowKind,
    pub name: String,
    pub runs: String,
    pub auto_start: bool,
    pub track_deletes: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_type: Option<SyncType>,
    pub models: Vec<String>,
    pub scopes: Vec<String>,
    pub input: Option<serde_json::Value>,
    pub returns: Vec<String>,
    pub metadata: FlowMetadata,
    pub endpoints: Vec<serde_json::Value>,
    pub output: Option<serde_json::Value>,
    pub pre_built: bool,
    pub is_public: bool,
    pub model_schema: String,
    pub public_route: String,
}

/// Live record of a flow already configured for an integration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LiveFlow {
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub id: Option<FlowId>,
}

/// Currently-configured syncs and actions of an integration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct FlowListing {
    #[serde(default)]
    pub syncs: Vec<LiveFlow>,
    #[serde(default)]
    pub actions: Vec<LiveFlow>,
}

impl FlowListing {
    pub fn find(&self, kind: FlowKind, name: &str) -> Option<&LiveFlow> {
        let flows = match kind {
            FlowKind::Sync => &self.syncs,
            FlowKind::Action => &self.actions,
        };
        flows.iter().find(|flow| flow.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contacts_sync() -> FlowDescriptor {
        let mut flow = FlowDescriptor::new(FlowKind::Sync, "contacts");
        flow.provider = "hubspot".to_string();
        flow.provider_config_key = "hubspot-prod".to_string();
        flow.runs = "every hour".to_string();
        flow.sync_type = Some(SyncType::Incremental);
        flow.description = "Fetch contacts".to_string();
        flow.scopes = vec!["crm.objects.contacts.read".to_string()];
        flow.models = vec![FlowModel {
            name: "Contact".to_string(),
            fields: vec![serde_json::json!({ "name": "id", "type": "string" })],
        }];
        flow
    }

    #[test]
    fn payload_derives_auto_start_route_and_schema() {
        let flow = contacts_sync();
        let payload = flow.to_payload(None);

        assert!(payload.auto_start);
        assert_eq!(payload.public_route, "hubspot");
        assert_eq!(payload.models, vec!["Contact".to_string()]);
        assert_eq!(payload.metadata.description, "Fetch contacts");
        assert_eq!(payload.metadata.scopes, flow.scopes);
        let schema: Vec<FlowModel> =
            serde_json::from_str(&payload.model_schema).expect("parse model schema");
        assert_eq!(schema, flow.models);
        assert!(payload.id.is_none());

        let json = serde_json::to_value(&payload).expect("serialize payload");
        assert!(json.get("id").is_none());
        assert_eq!(json["type"], "sync");
        assert_eq!(json["providerConfigKey"], "hubspot-prod");
        assert_eq!(json["sync_type"], "INCREMENTAL");
    }

    #[test]
    fn action_payload_omits_sync_type() {
        let flow: FlowDescriptor =
            serde_json::from_str(r#"{"type": "action", "name": "create-contact"}"#)
                .expect("parse descriptor");

        let json = serde_json::to_value(flow.to_payload(None)).expect("serialize payload");

        assert!(json.get("sync_type").is_none());
        assert_eq!(json["auto_start"], false);
    }

    #[test]
    fn sync_type_accepts_lowercase_listing_values() {
        let flow: FlowDescriptor = serde_json::from_str(
            r#"{"type": "sync", "name": "contacts", "sync_type": "full"}"#,
        )
        .expect("parse descriptor");
        assert_eq!(flow.sync_type, Some(SyncType::Full));
    }

    #[test]
    fn payload_prefers_raw_name_and_skips_auto_start_without_cadence() {
        let mut flow = contacts_sync();
        flow.runs = String::new();
        flow.assign_identity(FlowId(7)).expect("assign identity");

        let payload = flow.to_payload(Some("hubspot-custom"));

        assert!(!payload.auto_start);
        assert_eq!(payload.public_route, "hubspot-custom");
        assert_eq!(payload.id, Some(FlowId(7)));
    }

    #[test]
    fn identity_is_set_once() {
        let mut flow = contacts_sync();
        flow.assign_identity(FlowId(3)).expect("first assignment");
        flow.assign_identity(FlowId(3)).expect("same id is accepted");
        assert!(flow.assign_identity(FlowId(4)).is_err());
        assert_eq!(flow.identity(), Some(FlowId(3)));
    }

    #[test]
    fn live_listing_overrides_enabled_and_adopts_id() {
        let mut flow = contacts_sync();
        flow.enabled = false;
        let listing = FlowListing {
            syncs: vec![LiveFlow {
                name: "contacts".to_string(),
                enabled: true,
                id: Some(FlowId(42)),
            }],
            actions: vec![LiveFlow {
                name: "contacts".to_string(),
                enabled: false,
                id: None,
            }],
        };

        assert!(flow.apply_live_state(&listing).expect("apply live state"));
        assert!(flow.enabled);
        assert_eq!(flow.identity(), Some(FlowId(42)));
    }

    #[test]
    fn live_listing_without_match_leaves_descriptor_alone() {
        let mut flow = contacts_sync();
        flow.enabled = true;
        let listing = FlowListing::default();

        assert!(!flow.apply_live_state(&listing).expect("apply live state"));
        assert!(flow.enabled);
        assert!(flow.identity().is_none());
    }

    #[test]
    fn descriptor_reads_listing_json() {
        let flow: FlowDescriptor = serde_json::from_str(
            r#"{"id": 9, "type": "action", "name": "create-contact", "enabled": true}"#,
        )
        .expect("parse descriptor");
        assert_eq!(flow.kind, FlowKind::Action);
        assert_eq!(flow.identity(), Some(FlowId(9)));
        assert!(flow.enabled);
        assert_eq!(flow.sync_type, None);
    }
}
