use async_trait::async_trait;
use chrono::Utc;
use futures_util::future::join_all;
use pve_api::{NodeListItem, PveClient, QemuListItem};
use rackview_model::{Device, DeviceStatus, InfrastructureSnapshot, VirtualMachine, VmStatus};
use rackview_store::{SessionStore, SessionTicket, Stored};
use tracing::{info, warn};

use crate::enrichment::{self, UNKNOWN};
use crate::topology::{self, DEFAULT_RACK_ID};
use crate::{FetchError, FetchRequest, InventorySource, Result};

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Proxmox VE cluster inventory.
///
/// Nodes and VMs come from the API; racks and auxiliary devices come from
/// [`topology`]. Per-node and per-VM enrichment runs concurrently and never
/// fails the fetch.
pub struct ProxmoxSource {
    session: SessionStore,
    http: reqwest::Client,
}

impl ProxmoxSource {
    pub fn new(session: SessionStore, http: reqwest::Client) -> Self {
        Self { session, http }
    }

    /// Cached ticket if still valid, otherwise a fresh login.
    ///
    /// Without a password, a ticket that outlived its validity window means
    /// the session expired; no ticket at all means none was ever established.
    async fn ticket(&self, client: &PveClient, request: &FetchRequest<'_>) -> Result<SessionTicket> {
        if let Some(ticket) = self.session.cached_ticket() {
            return Ok(ticket);
        }

        let Some(password) = request.password else {
            if let Stored::Present(_) = self.session.inspect_ticket() {
                info!("proxmox: cached ticket expired");
                if let Err(e) = self.session.purge_ticket() {
                    warn!(error = %e, "failed to purge expired session ticket");
                }
                return Err(FetchError::SessionExpired);
            }
            return Err(FetchError::AuthenticationRequired);
        };
        let issued = client
            .create_ticket(&request.params.username, password)
            .await
            .map_err(login_error)?;

        let ticket = SessionTicket::new(issued.ticket, issued.csrf_token, Utc::now());
        if let Err(e) = self.session.save_ticket(&ticket) {
            warn!(error = %e, "failed to cache session ticket");
        }
        info!(username = %request.params.username, "proxmox: authenticated");
        Ok(ticket)
    }

    async fn node(&self, client: &PveClient, item: &NodeListItem) -> Device {
        let spec = match enrichment::node_spec(client, &item.node).await {
            Ok(spec) => spec,
            Err(e) => {
                warn!(node = %item.node, error = %e, "proxmox: node details unavailable");
                enrichment::unknown_node_spec()
            }
        };

        let status = if item.status == "online" {
            DeviceStatus::Online
        } else {
            DeviceStatus::Offline
        };

        let mut device = Device::node(node_id(&item.node), &item.node, spec)
            .with_status(status)
            .with_description(format!("Proxmox node {}", item.node))
            .in_rack(DEFAULT_RACK_ID);
        device.ip_address = item.ip.clone();
        device
    }

    /// VMs of one node. A failed listing contributes nothing.
    async fn node_vms(&self, client: &PveClient, node: &str) -> Vec<VirtualMachine> {
        let listed = match client.list_qemu(node).await {
            Ok(listed) => listed,
            Err(e) => {
                warn!(node, error = %e, "proxmox: failed to list vms");
                return Vec::new();
            }
        };

        join_all(listed.into_iter().map(|item| self.vm(client, node, item))).await
    }

    async fn vm(&self, client: &PveClient, node: &str, item: QemuListItem) -> VirtualMachine {
        let vmid = item.vmid;
        let status = vm_status(&item.status);

        let details = enrichment::vm_details(client, node, vmid);
        let address = async {
            // The guest agent only answers for running guests.
            if status == VmStatus::Running {
                Some(enrichment::vm_address(client, node, vmid).await)
            } else {
                None
            }
        };
        let (details, address) = futures_util::join!(details, address);

        let details = details.unwrap_or_else(|e| {
            warn!(node, vmid, error = %e, "proxmox: vm config unavailable");
            enrichment::VmDetails {
                os: UNKNOWN.into(),
                disk_gb: 0.0,
            }
        });
        let ip_address = match address {
            Some(Ok(ip)) => ip,
            Some(Err(e)) => {
                warn!(node, vmid, error = %e, "proxmox: vm address unavailable");
                UNKNOWN.into()
            }
            None => UNKNOWN.into(),
        };

        VirtualMachine {
            id: format!("vm-{vmid}"),
            name: item.name.unwrap_or_else(|| format!("VM {vmid}")),
            status,
            os: details.os,
            ip_address,
            cpu_cores: item.cpus.unwrap_or(1),
            memory: item.maxmem.unwrap_or(0) / BYTES_PER_MB,
            disk: details.disk_gb,
            node_id: node_id(node),
        }
    }
}

#[async_trait]
impl InventorySource for ProxmoxSource {
    async fn fetch(&self, request: &FetchRequest<'_>) -> Result<InfrastructureSnapshot> {
        let client = PveClient::with_http(&request.params.url, self.http.clone());
        let ticket = self.ticket(&client, request).await?;
        let client = client.with_ticket(ticket.ticket);

        let listed = match client.list_nodes().await {
            Ok(listed) => listed,
            Err(e) => {
                let err = listing_error(e);
                if err == FetchError::SessionExpired
                    && let Err(e) = self.session.purge_ticket()
                {
                    warn!(error = %e, "failed to purge expired session ticket");
                }
                return Err(err);
            }
        };

        let (nodes, vms) = futures_util::join!(
            join_all(listed.iter().map(|item| self.node(&client, item))),
            join_all(listed.iter().map(|item| self.node_vms(&client, &item.node))),
        );
        let vms: Vec<VirtualMachine> = vms.into_iter().flatten().collect();

        info!(nodes = nodes.len(), vms = vms.len(), "proxmox: inventory fetched");

        Ok(InfrastructureSnapshot {
            nodes,
            racks: topology::default_racks(),
            storage: topology::default_storage(),
            network: topology::default_network(),
            ups: topology::default_ups(),
            vms,
        })
    }
}

pub fn node_id(node: &str) -> String {
    format!("node-{node}")
}

fn vm_status(status: &str) -> VmStatus {
    match status {
        "running" => VmStatus::Running,
        "paused" | "suspended" => VmStatus::Paused,
        _ => VmStatus::Stopped,
    }
}

fn login_error(err: pve_api::Error) -> FetchError {
    if err.is_malformed() {
        return FetchError::MalformedResponse(err.to_string());
    }
    match err {
        pve_api::Error::Api { status, .. } => FetchError::AuthenticationFailed(status.to_string()),
        other => FetchError::NetworkUnreachable(other.to_string()),
    }
}

fn listing_error(err: pve_api::Error) -> FetchError {
    if err.is_unauthorized() {
        return FetchError::SessionExpired;
    }
    if err.is_malformed() {
        return FetchError::MalformedResponse(err.to_string());
    }
    match err {
        pve_api::Error::Api { endpoint, status, .. } => FetchError::UnexpectedStatus {
            endpoint,
            status: status.as_u16(),
        },
        pve_api::Error::MissingTicket => FetchError::AuthenticationRequired,
        other => FetchError::NetworkUnreachable(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vm_states_map_to_run_states() {
        assert_eq!(vm_status("running"), VmStatus::Running);
        assert_eq!(vm_status("paused"), VmStatus::Paused);
        assert_eq!(vm_status("stopped"), VmStatus::Stopped);
        assert_eq!(vm_status("prelaunch"), VmStatus::Stopped);
    }

    #[test]
    fn listing_errors_classify_by_status() {
        let err = |status: u16| pve_api::Error::Api {
            endpoint: "list nodes",
            status: reqwest::StatusCode::from_u16(status).unwrap(),
            body: String::new(),
        };

        assert_eq!(listing_error(err(401)), FetchError::SessionExpired);
        assert_eq!(listing_error(err(403)), FetchError::SessionExpired);
        assert_eq!(
            listing_error(err(500)),
            FetchError::UnexpectedStatus {
                endpoint: "list nodes",
                status: 500
            }
        );
        assert_eq!(
            listing_error(pve_api::Error::MissingData { endpoint: "list nodes" }),
            FetchError::MalformedResponse("proxmox api list nodes returned no data".into())
        );
        assert!(matches!(login_error(err(401)), FetchError::AuthenticationFailed(_)));
    }
}
