//! Instance operations.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::{debug, info};
use triton_cloudapi::types::{
    AddNicOptions, CreateMachineOptions, Image, ListMachinesOptions, Machine, Network, Nic,
    Package, Snapshot, validate_tags,
};
use triton_cloudapi::{Error, Result};

use super::{Lookup, TritonApi, merge_candidates};
use crate::fanout::fan_out;
use crate::resolver::ResourceKind;
use crate::shortid::{is_uuid, normalize_short_id};
use crate::wait::{PollWaiter, WaitOptions};

/// Power actions with a target state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceAction {
    /// Boot a stopped instance.
    Start,
    /// Shut down a running instance.
    Stop,
    /// Restart a running instance.
    Reboot,
}

impl InstanceAction {
    /// State the instance settles in once the action completes.
    #[must_use]
    pub const fn target_state(self) -> &'static str {
        match self {
            Self::Start | Self::Reboot => "running",
            Self::Stop => "stopped",
        }
    }

    const fn verb(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Reboot => "reboot",
        }
    }
}

/// A 410 on an instance GET carries the tombstone.
fn gone_to_deleted(id: &str, err: Error) -> Error {
    if matches!(err, Error::InstanceDeleted { .. }) || !err.is_gone() {
        return err;
    }
    Error::InstanceDeleted {
        id: id.to_string(),
        body: err.body().cloned(),
    }
}

impl Lookup for Machine {
    const KIND: ResourceKind = ResourceKind::Instance;

    async fn get_by_id(api: &TritonApi, id: &str) -> Result<Self> {
        api.cloudapi
            .get_machine(id)
            .await
            .map_err(|e| gone_to_deleted(id, e))
    }

    async fn list_candidates(api: &TritonApi, query: &str) -> Result<Vec<Self>> {
        let by_name = ListMachinesOptions {
            name: Some(query.to_string()),
            ..ListMachinesOptions::default()
        };
        let mut candidates = api.cloudapi.list_machines(&by_name).await?;
        if !normalize_short_id(query).is_empty() {
            let all = api
                .cloudapi
                .list_machines(&ListMachinesOptions::default())
                .await?;
            merge_candidates(&mut candidates, all);
        }
        Ok(candidates)
    }
}

fn tags_contain(live: &BTreeMap<String, Value>, wanted: &Map<String, Value>) -> bool {
    wanted.iter().all(|(k, v)| live.get(k) == Some(v))
}

fn tags_equal(live: &BTreeMap<String, Value>, wanted: &Map<String, Value>) -> bool {
    live.len() == wanted.len() && tags_contain(live, wanted)
}

impl TritonApi {
    /// Resolves an instance identifier.
    pub async fn get_instance(&self, ident: &str) -> Result<Machine> {
        self.get_instance_with_fields(ident, &[]).await
    }

    /// Resolves an instance and makes sure `fields` are present.
    ///
    /// List endpoints omit some fields (`dns_names`, ...). When the record
    /// came from a listing and lacks one of `fields`, the instance is
    /// fetched again by id.
    pub async fn get_instance_with_fields(&self, ident: &str, fields: &[&str]) -> Result<Machine> {
        let machine: Machine = self.resolve(ident).await?;
        if !is_uuid(ident) && fields.iter().any(|f| !machine.has_field(f)) {
            debug!(id = %machine.id, ?fields, "refetching instance for missing fields");
            return Machine::get_by_id(self, &machine.id).await;
        }
        Ok(machine)
    }

    /// Polls the instance until `done` holds.
    async fn wait_for_instance<P>(
        &self,
        id: &str,
        what: &str,
        wait: WaitOptions,
        done: P,
    ) -> Result<Machine>
    where
        P: FnMut(&Machine) -> bool,
    {
        PollWaiter::new(wait)
            .wait(
                what,
                move || async move { Machine::get_by_id(self, id).await },
                done,
            )
            .await
    }

    /// Starts, stops or reboots an instance, optionally waiting for the
    /// action's target state.
    pub async fn instance_action(
        &self,
        ident: &str,
        action: InstanceAction,
        wait: Option<WaitOptions>,
    ) -> Result<Machine> {
        let machine = self.get_instance(ident).await?;
        let id = machine.id.as_str();
        match action {
            InstanceAction::Start => self.cloudapi.start_machine(id).await?,
            InstanceAction::Stop => self.cloudapi.stop_machine(id).await?,
            InstanceAction::Reboot => self.cloudapi.reboot_machine(id).await?,
        }
        info!(id, action = action.verb(), "instance action requested");
        let Some(wait) = wait else {
            return Ok(machine);
        };
        let target = action.target_state();
        self.wait_for_instance(
            id,
            &format!("instance {id} to be {target}"),
            wait,
            |m| m.state == target,
        )
        .await
    }

    /// Starts an instance.
    pub async fn start_instance(&self, ident: &str, wait: Option<WaitOptions>) -> Result<Machine> {
        self.instance_action(ident, InstanceAction::Start, wait).await
    }

    /// Stops an instance.
    pub async fn stop_instance(&self, ident: &str, wait: Option<WaitOptions>) -> Result<Machine> {
        self.instance_action(ident, InstanceAction::Stop, wait).await
    }

    /// Reboots an instance.
    pub async fn reboot_instance(&self, ident: &str, wait: Option<WaitOptions>) -> Result<Machine> {
        self.instance_action(ident, InstanceAction::Reboot, wait).await
    }

    /// Applies `action` to every instance concurrently.
    pub async fn instances_action(
        &self,
        idents: &[String],
        action: InstanceAction,
        wait: Option<WaitOptions>,
    ) -> Result<Vec<Machine>> {
        fan_out(
            idents
                .iter()
                .map(|ident| self.instance_action(ident, action, wait)),
        )
        .await
    }

    /// Deletes an instance. With `wait`, returns once it reads as deleted
    /// or is gone.
    pub async fn delete_instance(&self, ident: &str, wait: Option<WaitOptions>) -> Result<Machine> {
        let machine = self.get_instance(ident).await?;
        let id = machine.id.as_str();
        self.cloudapi.delete_machine(id).await?;
        info!(id, "instance delete requested");
        if let Some(wait) = wait {
            PollWaiter::new(wait)
                .wait(
                    &format!("instance {id} to be deleted"),
                    move || async move {
                        match self.cloudapi.get_machine(id).await {
                            Ok(m) => Ok(Some(m)),
                            Err(e) if e.is_gone() || e.is_not_found() => Ok(None),
                            Err(e) => Err(e),
                        }
                    },
                    |m: &Option<Machine>| m.as_ref().is_none_or(|m| m.state == "deleted"),
                )
                .await?;
        }
        Ok(machine)
    }

    /// Deletes every instance concurrently.
    pub async fn delete_instances(
        &self,
        idents: &[String],
        wait: Option<WaitOptions>,
    ) -> Result<Vec<Machine>> {
        fan_out(idents.iter().map(|ident| self.delete_instance(ident, wait))).await
    }

    /// Provisions an instance.
    ///
    /// `options.image`, `options.package` and `options.networks` hold
    /// identifiers and are resolved to ids first. With `wait`, returns once
    /// the instance is running; a `failed` state ends the wait with an
    /// error.
    pub async fn create_instance(
        &self,
        options: &CreateMachineOptions,
        wait: Option<WaitOptions>,
    ) -> Result<Machine> {
        let tags: Map<String, Value> = options.tags.clone().into_iter().collect();
        validate_tags(&tags)?;

        let image: Image = self.resolve(&options.image).await?;
        let package: Package = self.resolve(&options.package).await?;
        let mut networks = None;
        if let Some(idents) = &options.networks {
            let mut ids = Vec::with_capacity(idents.len());
            for ident in idents {
                ids.push(self.resolve::<Network>(ident).await?.id);
            }
            networks = Some(ids);
        }
        let resolved = CreateMachineOptions {
            image: image.id,
            package: package.id,
            networks,
            ..options.clone()
        };

        let machine = self.cloudapi.create_machine(&resolved).await?;
        info!(id = %machine.id, name = %machine.name, "instance provisioning started");
        let Some(wait) = wait else {
            return Ok(machine);
        };
        let id = machine.id.as_str();
        PollWaiter::new(wait)
            .wait(
                &format!("instance {id} to be running"),
                move || async move {
                    let m = Machine::get_by_id(self, id).await?;
                    if m.state == "failed" {
                        return Err(Error::internal(format!("provisioning of instance {id} failed")));
                    }
                    Ok(m)
                },
                |m| m.state == "running",
            )
            .await
    }

    /// Renames an instance.
    pub async fn rename_instance(
        &self,
        ident: &str,
        name: &str,
        wait: Option<WaitOptions>,
    ) -> Result<Machine> {
        let machine = self.get_instance(ident).await?;
        let id = machine.id.as_str();
        self.cloudapi.rename_machine(id, name).await?;
        info!(id, name, "instance rename requested");
        let Some(wait) = wait else {
            return Ok(machine);
        };
        self.wait_for_instance(id, &format!("instance {id} to be named {name}"), wait, |m| {
            m.name == name
        })
        .await
    }

    /// Resizes an instance to another package.
    pub async fn resize_instance(&self, ident: &str, package: &str) -> Result<Machine> {
        let machine = self.get_instance(ident).await?;
        let package: Package = self.resolve(package).await?;
        self.cloudapi.resize_machine(&machine.id, &package.id).await?;
        info!(id = %machine.id, package = %package.name, "instance resize requested");
        Ok(machine)
    }

    /// Turns the instance firewall on or off.
    pub async fn set_instance_firewall(
        &self,
        ident: &str,
        enabled: bool,
        wait: Option<WaitOptions>,
    ) -> Result<Machine> {
        let machine = self.get_instance(ident).await?;
        let id = machine.id.as_str();
        if enabled {
            self.cloudapi.enable_machine_firewall(id).await?;
        } else {
            self.cloudapi.disable_machine_firewall(id).await?;
        }
        info!(id, enabled, "instance firewall change requested");
        let Some(wait) = wait else {
            return Ok(machine);
        };
        self.wait_for_instance(id, &format!("firewall of instance {id}"), wait, |m| {
            m.firewall_enabled == enabled
        })
        .await
    }

    /// Turns deletion protection on or off.
    pub async fn set_instance_deletion_protection(
        &self,
        ident: &str,
        enabled: bool,
        wait: Option<WaitOptions>,
    ) -> Result<Machine> {
        let machine = self.get_instance(ident).await?;
        let id = machine.id.as_str();
        if enabled {
            self.cloudapi.enable_machine_deletion_protection(id).await?;
        } else {
            self.cloudapi.disable_machine_deletion_protection(id).await?;
        }
        info!(id, enabled, "instance deletion protection change requested");
        let Some(wait) = wait else {
            return Ok(machine);
        };
        self.wait_for_instance(
            id,
            &format!("deletion protection of instance {id}"),
            wait,
            |m| m.deletion_protection == enabled,
        )
        .await
    }

    /// Polls the tag set of instance `id` until `done` holds.
    async fn wait_for_tags<P>(
        &self,
        id: &str,
        wait: Option<WaitOptions>,
        done: P,
    ) -> Result<BTreeMap<String, Value>>
    where
        P: FnMut(&BTreeMap<String, Value>) -> bool,
    {
        let Some(wait) = wait else {
            return self.cloudapi.list_machine_tags(id).await;
        };
        PollWaiter::new(wait)
            .wait(
                &format!("tags of instance {id}"),
                move || async move { self.cloudapi.list_machine_tags(id).await },
                done,
            )
            .await
    }

    /// Adds or updates tags, keeping the others.
    pub async fn set_instance_tags(
        &self,
        ident: &str,
        tags: &Map<String, Value>,
        wait: Option<WaitOptions>,
    ) -> Result<BTreeMap<String, Value>> {
        validate_tags(tags)?;
        let machine = self.get_instance(ident).await?;
        self.cloudapi.add_machine_tags(&machine.id, tags).await?;
        info!(id = %machine.id, count = tags.len(), "instance tags set");
        self.wait_for_tags(&machine.id, wait, |live| tags_contain(live, tags))
            .await
    }

    /// Replaces the whole tag set.
    pub async fn replace_instance_tags(
        &self,
        ident: &str,
        tags: &Map<String, Value>,
        wait: Option<WaitOptions>,
    ) -> Result<BTreeMap<String, Value>> {
        validate_tags(tags)?;
        let machine = self.get_instance(ident).await?;
        self.cloudapi.replace_machine_tags(&machine.id, tags).await?;
        info!(id = %machine.id, count = tags.len(), "instance tags replaced");
        self.wait_for_tags(&machine.id, wait, |live| tags_equal(live, tags))
            .await
    }

    /// Deletes the named tags.
    pub async fn delete_instance_tags(
        &self,
        ident: &str,
        keys: &[String],
        wait: Option<WaitOptions>,
    ) -> Result<BTreeMap<String, Value>> {
        let machine = self.get_instance(ident).await?;
        let id = machine.id.as_str();
        fan_out(keys.iter().map(|key| self.cloudapi.delete_machine_tag(id, key))).await?;
        info!(id, ?keys, "instance tags deleted");
        self.wait_for_tags(id, wait, |live| keys.iter().all(|k| !live.contains_key(k)))
            .await
    }

    /// Deletes every tag.
    pub async fn delete_all_instance_tags(
        &self,
        ident: &str,
        wait: Option<WaitOptions>,
    ) -> Result<BTreeMap<String, Value>> {
        let machine = self.get_instance(ident).await?;
        self.cloudapi.delete_machine_tags(&machine.id).await?;
        info!(id = %machine.id, "all instance tags deleted");
        self.wait_for_tags(&machine.id, wait, BTreeMap::is_empty).await
    }

    /// Lists the snapshots of an instance.
    pub async fn list_instance_snapshots(&self, ident: &str) -> Result<Vec<Snapshot>> {
        let machine = self.get_instance(ident).await?;
        self.cloudapi.list_machine_snapshots(&machine.id).await
    }

    /// Snapshots an instance. With `wait`, returns once the snapshot is
    /// `created`; a `failed` snapshot is an error.
    pub async fn create_instance_snapshot(
        &self,
        ident: &str,
        name: Option<&str>,
        wait: Option<WaitOptions>,
    ) -> Result<Snapshot> {
        let machine = self.get_instance(ident).await?;
        let id = machine.id.as_str();
        let snapshot = self.cloudapi.create_machine_snapshot(id, name).await?;
        info!(id, snapshot = %snapshot.name, "instance snapshot requested");
        let Some(wait) = wait else {
            return Ok(snapshot);
        };
        let snap = snapshot.name.as_str();
        PollWaiter::new(wait)
            .wait(
                &format!("snapshot {snap} of instance {id}"),
                move || async move {
                    let s = self.cloudapi.get_machine_snapshot(id, snap).await?;
                    if s.state == "failed" {
                        return Err(Error::internal(format!(
                            "snapshot {snap} of instance {id} failed"
                        )));
                    }
                    Ok(s)
                },
                |s| s.state == "created",
            )
            .await
    }

    /// Deletes a snapshot, optionally waiting until it is gone.
    pub async fn delete_instance_snapshot(
        &self,
        ident: &str,
        name: &str,
        wait: Option<WaitOptions>,
    ) -> Result<()> {
        let machine = self.get_instance(ident).await?;
        let id = machine.id.as_str();
        self.cloudapi.delete_machine_snapshot(id, name).await?;
        info!(id, snapshot = name, "instance snapshot delete requested");
        if let Some(wait) = wait {
            PollWaiter::new(wait)
                .wait(
                    &format!("snapshot {name} of instance {id} to be deleted"),
                    move || async move {
                        match self.cloudapi.get_machine_snapshot(id, name).await {
                            Ok(s) => Ok(Some(s)),
                            Err(e) if e.is_not_found() => Ok(None),
                            Err(e) => Err(e),
                        }
                    },
                    |s: &Option<Snapshot>| s.as_ref().is_none_or(|s| s.state == "deleted"),
                )
                .await?;
        }
        Ok(())
    }

    /// Boots an instance from one of its snapshots.
    pub async fn start_instance_from_snapshot(
        &self,
        ident: &str,
        snapshot: &str,
        wait: Option<WaitOptions>,
    ) -> Result<Machine> {
        let machine = self.get_instance(ident).await?;
        let id = machine.id.as_str();
        self.cloudapi.start_machine_from_snapshot(id, snapshot).await?;
        info!(id, snapshot, "instance start from snapshot requested");
        let Some(wait) = wait else {
            return Ok(machine);
        };
        self.wait_for_instance(id, &format!("instance {id} to be running"), wait, |m| {
            m.state == "running"
        })
        .await
    }

    /// Adds a NIC on `network` (an identifier).
    ///
    /// Returns `None` when the server redirected instead of returning the
    /// NIC; nothing is awaited in that case.
    pub async fn add_instance_nic(
        &self,
        ident: &str,
        network: &str,
        wait: Option<WaitOptions>,
    ) -> Result<Option<Nic>> {
        let machine = self.get_instance(ident).await?;
        let network: Network = self.resolve(network).await?;
        let id = machine.id.as_str();
        let options = AddNicOptions {
            network: Value::String(network.id.clone()),
        };
        let Some(nic) = self.cloudapi.add_nic(id, &options).await? else {
            info!(id, network = %network.id, "NIC add redirected, nothing to wait for");
            return Ok(None);
        };
        info!(id, mac = %nic.mac, "NIC add requested");
        let Some(wait) = wait else {
            return Ok(Some(nic));
        };
        let mac = nic.mac.as_str();
        let nic = PollWaiter::new(wait)
            .wait(
                &format!("NIC {mac} of instance {id}"),
                move || async move { self.cloudapi.get_nic(id, mac).await },
                |n| n.state.as_deref() == Some("running"),
            )
            .await?;
        Ok(Some(nic))
    }

    /// Removes a NIC, optionally waiting until it is gone.
    pub async fn remove_instance_nic(
        &self,
        ident: &str,
        mac: &str,
        wait: Option<WaitOptions>,
    ) -> Result<()> {
        let machine = self.get_instance(ident).await?;
        let id = machine.id.as_str();
        self.cloudapi.remove_nic(id, mac).await?;
        info!(id, mac, "NIC removal requested");
        if let Some(wait) = wait {
            PollWaiter::new(wait)
                .wait(
                    &format!("NIC {mac} of instance {id} to be removed"),
                    move || async move {
                        match self.cloudapi.get_nic(id, mac).await {
                            Ok(_) => Ok(false),
                            Err(e) if e.is_not_found() => Ok(true),
                            Err(e) => Err(e),
                        }
                    },
                    |gone| *gone,
                )
                .await?;
        }
        Ok(())
    }
}
