//! One script run.

use serde_json::{Value, json};
use skein_approval::PermissionBroker;
use skein_capabilities::{CapabilityCall, CapabilityError};
use skein_core::ScriptId;
use skein_sandbox::SandboxContext;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::RuntimeResult;
use crate::metadata::ScriptMetadata;

/// A prepared script execution: its sandbox plus the broker that gates
/// its capability calls.
pub struct Execution {
    script: ScriptMetadata,
    sandbox: SandboxContext,
    broker: Arc<PermissionBroker>,
}

impl Execution {
    pub(crate) fn new(
        script: ScriptMetadata,
        sandbox: SandboxContext,
        broker: Arc<PermissionBroker>,
    ) -> Self {
        Self {
            script,
            sandbox,
            broker,
        }
    }

    /// The script being run.
    #[must_use]
    pub fn script(&self) -> &ScriptMetadata {
        &self.script
    }

    /// The script's ID.
    #[must_use]
    pub fn id(&self) -> ScriptId {
        self.script.id
    }

    /// The script's global namespace.
    #[must_use]
    pub fn sandbox(&self) -> &SandboxContext {
        &self.sandbox
    }

    /// Mutable access for global assignments.
    pub fn sandbox_mut(&mut self) -> &mut SandboxContext {
        &mut self.sandbox
    }

    /// Call a granted capability by its full name (`GM_setValue`, `GM.getValue`).
    ///
    /// If the capability names a resource for these arguments, the call waits
    /// on the permission broker first and only runs on [`Decision::Allow`].
    ///
    /// [`Decision::Allow`]: skein_approval::Decision::Allow
    ///
    /// # Errors
    ///
    /// - [`CapabilityError::NotGranted`] if the script did not declare `name`
    /// - [`CapabilityError::NotCallable`] if the binding is a value
    /// - [`CapabilityError::Denied`] if confirmation was refused or timed out
    /// - whatever the capability itself returns
    pub async fn invoke(&self, name: &str, args: Value) -> RuntimeResult<Value> {
        let binding = self
            .sandbox
            .bindings()
            .get(name)
            .ok_or_else(|| CapabilityError::NotGranted {
                grant: name.to_owned(),
            })?;
        let grant = binding.grant().to_owned();
        let capability = binding
            .implementation()
            .as_function()
            .map(Arc::clone)
            .ok_or_else(|| CapabilityError::NotCallable {
                grant: grant.clone(),
            })?;

        if let Some(resource) = capability.resource_key(&args) {
            let detail = json!({ "script_name": self.script.name, "args": args.clone() });
            let decision = self
                .broker
                .request_confirm(self.script.id, &grant, &resource, detail)
                .await;
            if !decision.is_allowed() {
                info!(
                    script_id = %self.script.id,
                    grant = %grant,
                    resource = %resource,
                    %decision,
                    "capability call refused"
                );
                return Err(CapabilityError::Denied { grant, resource }.into());
            }
        }

        debug!(script_id = %self.script.id, grant = %grant, "invoking capability");
        let call = CapabilityCall::new(self.script.id, grant, args);
        Ok(capability.invoke(call).await?)
    }
}

impl fmt::Debug for Execution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Execution")
            .field("script_id", &self.script.id)
            .field("name", &self.script.name)
            .finish_non_exhaustive()
    }
}
