//! Instance command implementation.

use std::collections::BTreeMap;
use std::io::Write;

use triton_api::{InstanceAction, TritonApi};
use triton_cloudapi::types::{CreateMachineOptions, ListMachinesOptions, Machine};

use super::parse_pairs;
use crate::cli::{
    CreateInstanceArgs, InstanceCommands, ListInstancesArgs, NicCommands, SnapshotCommands,
    TagCommands, WaitArgs,
};
use crate::error::CliError;
use crate::output::{Message, OutputFormat, short_id};

/// Instance command executor.
pub struct InstanceCommand<'a> {
    api: &'a TritonApi,
}

impl<'a> InstanceCommand<'a> {
    /// Create a new instance command.
    #[must_use]
    pub const fn new(api: &'a TritonApi) -> Self {
        Self { api }
    }

    /// Execute an instance subcommand.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &InstanceCommands,
    ) -> Result<(), CliError> {
        match command {
            InstanceCommands::List(args) => {
                let machines = self.api.cloudapi().list_machines(&list_options(args)).await?;
                format.write(writer, &machines)?;
            }
            InstanceCommands::Get { ident } => {
                let machine = self.api.get_instance_with_fields(ident, &["dns_names"]).await?;
                format.write(writer, &machine)?;
            }
            InstanceCommands::Create(args) => {
                let options = create_options(args)?;
                let machine = self.api.create_instance(&options, args.wait.options()).await?;
                let verb = if args.wait.wait { "Created" } else { "Creating" };
                report(writer, format, &machine, verb)?;
            }
            InstanceCommands::Start { idents, wait } => {
                self.power(writer, format, idents, InstanceAction::Start, *wait)
                    .await?;
            }
            InstanceCommands::Stop { idents, wait } => {
                self.power(writer, format, idents, InstanceAction::Stop, *wait)
                    .await?;
            }
            InstanceCommands::Reboot { idents, wait } => {
                self.power(writer, format, idents, InstanceAction::Reboot, *wait)
                    .await?;
            }
            InstanceCommands::Delete { idents, wait } => {
                let machines = self.api.delete_instances(idents, wait.options()).await?;
                let verb = if wait.wait { "Deleted" } else { "Deleting" };
                for m in &machines {
                    report(writer, format, m, verb)?;
                }
            }
            InstanceCommands::Rename { ident, name, wait } => {
                let m = self.api.rename_instance(ident, name, wait.options()).await?;
                format.write(
                    writer,
                    &Message::success(format!("Renamed instance {} to \"{name}\"", short_id(&m.id))),
                )?;
            }
            InstanceCommands::Resize { ident, package } => {
                let m = self.api.resize_instance(ident, package).await?;
                format.write(
                    writer,
                    &Message::success(format!("Resizing instance {} to {package}", label(&m))),
                )?;
            }
            InstanceCommands::EnableFirewall { ident, wait } => {
                let m = self.api.set_instance_firewall(ident, true, wait.options()).await?;
                report(writer, format, &m, "Enabled firewall for")?;
            }
            InstanceCommands::DisableFirewall { ident, wait } => {
                let m = self.api.set_instance_firewall(ident, false, wait.options()).await?;
                report(writer, format, &m, "Disabled firewall for")?;
            }
            InstanceCommands::EnableDeletionProtection { ident, wait } => {
                let m = self
                    .api
                    .set_instance_deletion_protection(ident, true, wait.options())
                    .await?;
                report(writer, format, &m, "Enabled deletion protection for")?;
            }
            InstanceCommands::DisableDeletionProtection { ident, wait } => {
                let m = self
                    .api
                    .set_instance_deletion_protection(ident, false, wait.options())
                    .await?;
                report(writer, format, &m, "Disabled deletion protection for")?;
            }
            InstanceCommands::Tag { command } => self.tag(writer, format, command).await?,
            InstanceCommands::Snapshot { command } => {
                self.snapshot(writer, format, command).await?;
            }
            InstanceCommands::Nic { command } => self.nic(writer, format, command).await?,
        }
        Ok(())
    }

    async fn power<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        idents: &[String],
        action: InstanceAction,
        wait: WaitArgs,
    ) -> Result<(), CliError> {
        let machines = self
            .api
            .instances_action(idents, action, wait.options())
            .await?;
        let verb = match (action, wait.wait) {
            (InstanceAction::Start, true) => "Started",
            (InstanceAction::Start, false) => "Starting",
            (InstanceAction::Stop, true) => "Stopped",
            (InstanceAction::Stop, false) => "Stopping",
            (InstanceAction::Reboot, true) => "Rebooted",
            (InstanceAction::Reboot, false) => "Rebooting",
        };
        for m in &machines {
            report(writer, format, m, verb)?;
        }
        Ok(())
    }

    async fn tag<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &TagCommands,
    ) -> Result<(), CliError> {
        let tags: BTreeMap<String, serde_json::Value> = match command {
            TagCommands::List { ident } => {
                let m = self.api.get_instance(ident).await?;
                self.api.cloudapi().list_machine_tags(&m.id).await?
            }
            TagCommands::Set { ident, tags, wait } => {
                self.api
                    .set_instance_tags(ident, &parse_pairs(tags)?, wait.options())
                    .await?
            }
            TagCommands::Replace { ident, tags, wait } => {
                self.api
                    .replace_instance_tags(ident, &parse_pairs(tags)?, wait.options())
                    .await?
            }
            TagCommands::Delete {
                ident,
                keys,
                all,
                wait,
            } => {
                if *all {
                    self.api
                        .delete_all_instance_tags(ident, wait.options())
                        .await?
                } else {
                    self.api
                        .delete_instance_tags(ident, keys, wait.options())
                        .await?
                }
            }
        };
        format.write(writer, &tags)
    }

    async fn snapshot<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &SnapshotCommands,
    ) -> Result<(), CliError> {
        match command {
            SnapshotCommands::List { ident } => {
                let snapshots = self.api.list_instance_snapshots(ident).await?;
                format.write(writer, &snapshots)?;
            }
            SnapshotCommands::Create { ident, name, wait } => {
                let snap = self
                    .api
                    .create_instance_snapshot(ident, name.as_deref(), wait.options())
                    .await?;
                if format.is_json() {
                    format.write(writer, &snap)?;
                } else {
                    format.write(
                        writer,
                        &Message::success(format!("Snapshot \"{}\" is {}", snap.name, snap.state)),
                    )?;
                }
            }
            SnapshotCommands::Delete { ident, name, wait } => {
                self.api
                    .delete_instance_snapshot(ident, name, wait.options())
                    .await?;
                format.write(writer, &Message::success(format!("Deleted snapshot \"{name}\"")))?;
            }
            SnapshotCommands::Boot { ident, name, wait } => {
                let m = self
                    .api
                    .start_instance_from_snapshot(ident, name, wait.options())
                    .await?;
                report(writer, format, &m, &format!("Booted snapshot \"{name}\" of"))?;
            }
        }
        Ok(())
    }

    async fn nic<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &NicCommands,
    ) -> Result<(), CliError> {
        match command {
            NicCommands::List { ident } => {
                let m = self.api.get_instance(ident).await?;
                let nics = self.api.cloudapi().list_nics(&m.id).await?;
                format.write(writer, &nics)?;
            }
            NicCommands::Add {
                ident,
                network,
                wait,
            } => match self.api.add_instance_nic(ident, network, wait.options()).await? {
                Some(nic) => format.write(writer, &nic)?,
                None => format.write(
                    writer,
                    &Message::info(format!("Instance {ident} already has a NIC on {network}")),
                )?,
            },
            NicCommands::Remove { ident, mac, wait } => {
                self.api
                    .remove_instance_nic(ident, mac, wait.options())
                    .await?;
                format.write(writer, &Message::success(format!("Removed NIC {mac}")))?;
            }
        }
        Ok(())
    }
}

/// One line per affected instance in table mode, the record in JSON mode.
fn report<W: Write>(
    writer: &mut W,
    format: &OutputFormat,
    machine: &Machine,
    verb: &str,
) -> Result<(), CliError> {
    if format.is_json() {
        return format.write(writer, machine);
    }
    format.write(writer, &Message::success(format!("{verb} instance {}", label(machine))))
}

/// `name (shortid)`.
fn label(machine: &Machine) -> String {
    format!("{} ({})", machine.name, short_id(&machine.id))
}

fn list_options(args: &ListInstancesArgs) -> ListMachinesOptions {
    ListMachinesOptions {
        name: args.name.clone(),
        state: args.state.clone(),
        image: args.image.clone(),
        limit: args.limit,
        ..ListMachinesOptions::default()
    }
}

/// Translates `instance create` arguments; identifiers stay unresolved.
fn create_options(args: &CreateInstanceArgs) -> Result<CreateMachineOptions, CliError> {
    Ok(CreateMachineOptions {
        name: args.name.clone(),
        image: args.image.clone(),
        package: args.package.clone(),
        networks: (!args.networks.is_empty()).then(|| args.networks.clone()),
        tags: parse_pairs(&args.tags)?.into_iter().collect(),
        metadata: parse_pairs(&args.metadata)?.into_iter().collect(),
        firewall_enabled: args.firewall.then_some(true),
        deletion_protection: args.deletion_protection.then_some(true),
        ..CreateMachineOptions::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_options_from_args() {
        let args = CreateInstanceArgs {
            image: "base-64@18.4.0".into(),
            package: "g4-highcpu-1G".into(),
            name: Some("web".into()),
            tags: vec!["env=prod".into(), "tier=2".into()],
            metadata: vec!["user-script=echo hi".into()],
            firewall: true,
            ..CreateInstanceArgs::default()
        };
        let options = create_options(&args).expect("options");
        assert_eq!(options.image, "base-64@18.4.0");
        assert_eq!(options.networks, None);
        assert_eq!(options.tags.get("tier"), Some(&json!(2)));
        assert_eq!(options.metadata.get("user-script"), Some(&json!("echo hi")));
        assert_eq!(options.firewall_enabled, Some(true));
        assert_eq!(options.deletion_protection, None);
    }

    #[test]
    fn list_options_from_args() {
        let args = ListInstancesArgs {
            state: Some("running".into()),
            limit: Some(5),
            ..ListInstancesArgs::default()
        };
        let options = list_options(&args);
        assert_eq!(options.state.as_deref(), Some("running"));
        assert_eq!(options.limit, Some(5));
        assert!(options.name.is_none());
    }

    #[test]
    fn label_uses_short_id() {
        let m = Machine {
            id: "b4f0b46c-1111-4000-8000-000000000001".into(),
            name: "web".into(),
            ..Machine::default()
        };
        assert_eq!(label(&m), "web (b4f0b46c)");
    }
}
