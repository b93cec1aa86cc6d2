use std::collections::BTreeMap;

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use reqwest::Method;
use serde_json::{Map, Value, json};
use tracing::{debug, trace};

use super::{CloudApi, to_body};
use crate::error::{Error, Result};
use crate::query::QueryParams;
use crate::types::{
    AddNicOptions, AuditEntry, CreateDiskOptions, CreateMachineOptions, Disk, DiskSize,
    ListMachinesOptions, Machine, Nic, Snapshot,
};
use crate::wire::RequestOptions;

/// Page size used when the caller gives no limit (CloudAPI's maximum).
pub const DEFAULT_PAGE_SIZE: u64 = 1000;

/// Header carrying the total match count on `ListMachines`.
pub const RESOURCE_COUNT_HEADER: &str = "x-resource-count";

/// Lazily fetched pages of `ListMachines`, in server order.
pub type MachinePages<'a> = BoxStream<'a, Result<Vec<Machine>>>;

impl CloudApi {
    /// Streams `ListMachines` one page at a time.
    ///
    /// Successive requests advance `offset` until a page is shorter than the
    /// page size or empty. A caller-supplied `limit` means one request only.
    pub fn list_machines_pages(&self, options: &ListMachinesOptions) -> MachinePages<'_> {
        let filter = options.filter_query();
        let single_shot = options.limit.is_some();
        let limit = options.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let path = self.path(&["machines"]);
        let api = self;

        stream::try_unfold(Some(options.offset.unwrap_or(0)), move |state| {
            let mut query = filter.clone();
            let path = path.clone();
            async move {
                let Some(offset) = state else {
                    return Ok(None);
                };
                query
                    .insert("limit", limit.to_string())
                    .insert("offset", offset.to_string());
                let page: Vec<Machine> = api.get_json(&path, query).await?;
                trace!(offset, count = page.len(), "machine page");
                if page.is_empty() {
                    return Ok(None);
                }
                let fetched = page.len() as u64;
                let next = (!single_shot && fetched >= limit).then_some(offset + fetched);
                Ok(Some((page, next)))
            }
        })
        .boxed()
    }

    /// `ListMachines`, driven to completion.
    pub async fn list_machines(&self, options: &ListMachinesOptions) -> Result<Vec<Machine>> {
        let machines: Vec<Machine> = self.list_machines_pages(options).try_concat().await?;
        debug!(count = machines.len(), "listed machines");
        Ok(machines)
    }

    /// `HEAD /:account/machines`: number of matching instances.
    pub async fn count_machines(&self, options: &ListMachinesOptions) -> Result<u64> {
        let resp = self
            .request(
                Method::HEAD,
                &self.path(&["machines"]),
                RequestOptions::query(options.filter_query()),
            )
            .await?;
        resp.header(RESOURCE_COUNT_HEADER)
            .and_then(|v| v.trim().parse().ok())
            .ok_or_else(|| {
                Error::internal(format!("response has no valid {RESOURCE_COUNT_HEADER} header"))
            })
    }

    /// `GET /:account/machines/:id`. A 410 comes back as an error carrying
    /// the tombstone body.
    pub async fn get_machine(&self, id: &str) -> Result<Machine> {
        self.get_json(&self.path(&["machines", id]), QueryParams::new())
            .await
    }

    /// `POST /:account/machines`.
    pub async fn create_machine(&self, options: &CreateMachineOptions) -> Result<Machine> {
        self.send_json(
            Method::POST,
            &self.path(&["machines"]),
            QueryParams::new(),
            Some(options.to_body()),
        )
        .await
    }

    /// `DELETE /:account/machines/:id`.
    pub async fn delete_machine(&self, id: &str) -> Result<()> {
        self.send_empty(
            Method::DELETE,
            &self.path(&["machines", id]),
            QueryParams::new(),
            None,
        )
        .await
    }

    /// `POST /:account/machines/:id` with `{"action": <action>, ...params}`.
    pub async fn machine_action(&self, id: &str, action: &str, params: Map<String, Value>) -> Result<()> {
        let mut body = params;
        body.insert("action".to_string(), Value::String(action.to_string()));
        self.send_empty(
            Method::POST,
            &self.path(&["machines", id]),
            QueryParams::new(),
            Some(Value::Object(body)),
        )
        .await
    }

    /// Starts a stopped instance.
    pub async fn start_machine(&self, id: &str) -> Result<()> {
        self.machine_action(id, "start", Map::new()).await
    }

    /// Stops a running instance.
    pub async fn stop_machine(&self, id: &str) -> Result<()> {
        self.machine_action(id, "stop", Map::new()).await
    }

    /// Reboots an instance.
    pub async fn reboot_machine(&self, id: &str) -> Result<()> {
        self.machine_action(id, "reboot", Map::new()).await
    }

    /// Resizes an instance to `package`.
    pub async fn resize_machine(&self, id: &str, package: &str) -> Result<()> {
        let mut params = Map::new();
        params.insert("package".to_string(), Value::String(package.to_string()));
        self.machine_action(id, "resize", params).await
    }

    /// Renames an instance.
    pub async fn rename_machine(&self, id: &str, name: &str) -> Result<()> {
        let mut params = Map::new();
        params.insert("name".to_string(), Value::String(name.to_string()));
        self.machine_action(id, "rename", params).await
    }

    /// Enables the instance firewall.
    pub async fn enable_machine_firewall(&self, id: &str) -> Result<()> {
        self.machine_action(id, "enable_firewall", Map::new()).await
    }

    /// Disables the instance firewall.
    pub async fn disable_machine_firewall(&self, id: &str) -> Result<()> {
        self.machine_action(id, "disable_firewall", Map::new()).await
    }

    /// Turns deletion protection on.
    pub async fn enable_machine_deletion_protection(&self, id: &str) -> Result<()> {
        self.machine_action(id, "enable_deletion_protection", Map::new())
            .await
    }

    /// Turns deletion protection off.
    pub async fn disable_machine_deletion_protection(&self, id: &str) -> Result<()> {
        self.machine_action(id, "disable_deletion_protection", Map::new())
            .await
    }

    /// `POST /:account/machines/:id/snapshots/:name`: boots from a snapshot.
    pub async fn start_machine_from_snapshot(&self, id: &str, snapshot: &str) -> Result<()> {
        self.send_empty(
            Method::POST,
            &self.path(&["machines", id, "snapshots", snapshot]),
            QueryParams::new(),
            None,
        )
        .await
    }

    /// `GET /:account/machines/:id/audit`.
    pub async fn machine_audit(&self, id: &str) -> Result<Vec<AuditEntry>> {
        self.get_json(&self.path(&["machines", id, "audit"]), QueryParams::new())
            .await
    }

    // Snapshots

    /// `GET /:account/machines/:id/snapshots`.
    pub async fn list_machine_snapshots(&self, id: &str) -> Result<Vec<Snapshot>> {
        self.get_json(&self.path(&["machines", id, "snapshots"]), QueryParams::new())
            .await
    }

    /// `GET /:account/machines/:id/snapshots/:name`.
    pub async fn get_machine_snapshot(&self, id: &str, name: &str) -> Result<Snapshot> {
        self.get_json(
            &self.path(&["machines", id, "snapshots", name]),
            QueryParams::new(),
        )
        .await
    }

    /// `POST /:account/machines/:id/snapshots`.
    pub async fn create_machine_snapshot(&self, id: &str, name: Option<&str>) -> Result<Snapshot> {
        let body = name.map_or_else(|| json!({}), |n| json!({ "name": n }));
        self.send_json(
            Method::POST,
            &self.path(&["machines", id, "snapshots"]),
            QueryParams::new(),
            Some(body),
        )
        .await
    }

    /// `DELETE /:account/machines/:id/snapshots/:name`.
    pub async fn delete_machine_snapshot(&self, id: &str, name: &str) -> Result<()> {
        self.send_empty(
            Method::DELETE,
            &self.path(&["machines", id, "snapshots", name]),
            QueryParams::new(),
            None,
        )
        .await
    }

    // Tags

    /// `GET /:account/machines/:id/tags`.
    pub async fn list_machine_tags(&self, id: &str) -> Result<BTreeMap<String, Value>> {
        let tags: Option<BTreeMap<String, Value>> = self
            .get_json(&self.path(&["machines", id, "tags"]), QueryParams::new())
            .await?;
        Ok(tags.unwrap_or_default())
    }

    /// `GET /:account/machines/:id/tags/:key`.
    pub async fn get_machine_tag(&self, id: &str, key: &str) -> Result<Value> {
        self.get_json(&self.path(&["machines", id, "tags", key]), QueryParams::new())
            .await
    }

    /// `POST /:account/machines/:id/tags`: adds or updates tags.
    pub async fn add_machine_tags(
        &self,
        id: &str,
        tags: &Map<String, Value>,
    ) -> Result<BTreeMap<String, Value>> {
        let out: Option<BTreeMap<String, Value>> = self
            .send_json(
                Method::POST,
                &self.path(&["machines", id, "tags"]),
                QueryParams::new(),
                Some(Value::Object(tags.clone())),
            )
            .await?;
        Ok(out.unwrap_or_default())
    }

    /// `PUT /:account/machines/:id/tags`: replaces all tags.
    pub async fn replace_machine_tags(
        &self,
        id: &str,
        tags: &Map<String, Value>,
    ) -> Result<BTreeMap<String, Value>> {
        let out: Option<BTreeMap<String, Value>> = self
            .send_json(
                Method::PUT,
                &self.path(&["machines", id, "tags"]),
                QueryParams::new(),
                Some(Value::Object(tags.clone())),
            )
            .await?;
        Ok(out.unwrap_or_default())
    }

    /// `DELETE /:account/machines/:id/tags/:key`.
    pub async fn delete_machine_tag(&self, id: &str, key: &str) -> Result<()> {
        self.send_empty(
            Method::DELETE,
            &self.path(&["machines", id, "tags", key]),
            QueryParams::new(),
            None,
        )
        .await
    }

    /// `DELETE /:account/machines/:id/tags`.
    pub async fn delete_machine_tags(&self, id: &str) -> Result<()> {
        self.send_empty(
            Method::DELETE,
            &self.path(&["machines", id, "tags"]),
            QueryParams::new(),
            None,
        )
        .await
    }

    // Metadata

    /// `GET /:account/machines/:id/metadata`.
    pub async fn list_machine_metadata(
        &self,
        id: &str,
        credentials: bool,
    ) -> Result<BTreeMap<String, Value>> {
        let mut q = QueryParams::new();
        if credentials {
            q.insert("credentials", "true");
        }
        let out: Option<BTreeMap<String, Value>> = self
            .get_json(&self.path(&["machines", id, "metadata"]), q)
            .await?;
        Ok(out.unwrap_or_default())
    }

    /// `GET /:account/machines/:id/metadata/:key`.
    pub async fn get_machine_metadata(&self, id: &str, key: &str) -> Result<Value> {
        self.get_json(
            &self.path(&["machines", id, "metadata", key]),
            QueryParams::new(),
        )
        .await
    }

    /// `POST /:account/machines/:id/metadata`.
    pub async fn add_machine_metadata(
        &self,
        id: &str,
        metadata: &Map<String, Value>,
    ) -> Result<BTreeMap<String, Value>> {
        let out: Option<BTreeMap<String, Value>> = self
            .send_json(
                Method::POST,
                &self.path(&["machines", id, "metadata"]),
                QueryParams::new(),
                Some(Value::Object(metadata.clone())),
            )
            .await?;
        Ok(out.unwrap_or_default())
    }

    /// `DELETE /:account/machines/:id/metadata/:key`.
    pub async fn delete_machine_metadata(&self, id: &str, key: &str) -> Result<()> {
        self.send_empty(
            Method::DELETE,
            &self.path(&["machines", id, "metadata", key]),
            QueryParams::new(),
            None,
        )
        .await
    }

    /// `DELETE /:account/machines/:id/metadata`.
    pub async fn delete_all_machine_metadata(&self, id: &str) -> Result<()> {
        self.send_empty(
            Method::DELETE,
            &self.path(&["machines", id, "metadata"]),
            QueryParams::new(),
            None,
        )
        .await
    }

    // NICs

    /// `GET /:account/machines/:id/nics`.
    pub async fn list_nics(&self, id: &str) -> Result<Vec<Nic>> {
        self.get_json(&self.path(&["machines", id, "nics"]), QueryParams::new())
            .await
    }

    /// `GET /:account/machines/:id/nics/:mac`.
    pub async fn get_nic(&self, id: &str, mac: &str) -> Result<Nic> {
        self.get_json(
            &self.path(&["machines", id, "nics", &mac_path(mac)]),
            QueryParams::new(),
        )
        .await
    }

    /// `POST /:account/machines/:id/nics`.
    ///
    /// Returns `None` when the server answers 302: the instance already has
    /// a NIC on that network.
    pub async fn add_nic(&self, id: &str, options: &AddNicOptions) -> Result<Option<Nic>> {
        let resp = self
            .request(
                Method::POST,
                &self.path(&["machines", id, "nics"]),
                RequestOptions::body(to_body(options)?),
            )
            .await?;
        if resp.status == 302 {
            debug!(machine = id, "NIC already present on network");
            return Ok(None);
        }
        resp.json().map(Some)
    }

    /// `DELETE /:account/machines/:id/nics/:mac`.
    pub async fn remove_nic(&self, id: &str, mac: &str) -> Result<()> {
        self.send_empty(
            Method::DELETE,
            &self.path(&["machines", id, "nics", &mac_path(mac)]),
            QueryParams::new(),
            None,
        )
        .await
    }

    // Disks

    /// `GET /:account/machines/:id/disks`.
    pub async fn list_machine_disks(&self, id: &str) -> Result<Vec<Disk>> {
        self.get_json(&self.path(&["machines", id, "disks"]), QueryParams::new())
            .await
    }

    /// `GET /:account/machines/:id/disks/:disk`.
    pub async fn get_machine_disk(&self, id: &str, disk: &str) -> Result<Disk> {
        self.get_json(&self.path(&["machines", id, "disks", disk]), QueryParams::new())
            .await
    }

    /// `POST /:account/machines/:id/disks`.
    pub async fn create_machine_disk(&self, id: &str, options: &CreateDiskOptions) -> Result<Disk> {
        self.send_json(
            Method::POST,
            &self.path(&["machines", id, "disks"]),
            QueryParams::new(),
            Some(to_body(options)?),
        )
        .await
    }

    /// `POST /:account/machines/:id/disks/:disk`: resizes a disk.
    pub async fn resize_machine_disk(
        &self,
        id: &str,
        disk: &str,
        size: u64,
        allow_shrink: bool,
    ) -> Result<Disk> {
        let mut body = json!({ "size": DiskSize::Mebibytes(size) });
        if allow_shrink {
            body["dangerous_allow_shrink"] = Value::Bool(true);
        }
        self.send_json(
            Method::POST,
            &self.path(&["machines", id, "disks", disk]),
            QueryParams::new(),
            Some(body),
        )
        .await
    }

    /// `DELETE /:account/machines/:id/disks/:disk`.
    pub async fn delete_machine_disk(&self, id: &str, disk: &str) -> Result<()> {
        self.send_empty(
            Method::DELETE,
            &self.path(&["machines", id, "disks", disk]),
            QueryParams::new(),
            None,
        )
        .await
    }
}

/// NIC paths use the MAC without separators.
fn mac_path(mac: &str) -> String {
    mac.chars().filter(|c| *c != ':' && *c != '-').collect()
}
