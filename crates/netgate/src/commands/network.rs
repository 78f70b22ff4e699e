//! Interface, NAT and static route command handlers.

use tabled::Tabled;

use netgate_api::NetgateClient;
use netgate_core::{InterfaceConfig, InterfaceDraft, IpMode, NatConfig, RouteDraft, StaticRoute};

use crate::cli::{
    GlobalOpts, InterfacesArgs, InterfacesCommand, NatArgs, NatCommand, RouteFields, RoutesArgs,
    RoutesCommand,
};
use crate::error::CliError;
use crate::output;

use super::util::{self, or_dash};

// ── Interfaces ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct InterfaceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Gateway")]
    gateway: String,
    #[tabled(rename = "DNS")]
    dns: String,
    #[tabled(rename = "MTU")]
    mtu: String,
    #[tabled(rename = "VLAN")]
    vlan: String,
    #[tabled(rename = "Up")]
    up: String,
}

impl InterfaceRow {
    fn new(i: &InterfaceConfig, color: bool) -> Self {
        let address = match (i.ip_address, i.subnet_mask) {
            (Some(ip), Some(mask)) => format!("{ip}/{mask}"),
            (Some(ip), None) => ip.to_string(),
            _ => "-".into(),
        };
        let dns = [i.dns_primary, i.dns_secondary]
            .into_iter()
            .flatten()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(",");
        Self {
            name: i.interface_name.clone(),
            mode: i.ip_mode.to_string(),
            address,
            gateway: or_dash(i.gateway),
            dns: if dns.is_empty() { "-".into() } else { dns },
            mtu: or_dash(i.mtu),
            vlan: or_dash(i.vlan_id),
            up: output::yes_no(i.admin_enabled, color),
        }
    }
}

pub async fn handle_interfaces(
    client: &NetgateClient,
    args: InterfacesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        InterfacesCommand::List => {
            let color = output::should_color(&global.color);
            let list = client.list_interfaces().await?;
            let out = output::render_list(
                &global.output,
                &list,
                |i| InterfaceRow::new(i, color),
                |i| i.interface_name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        InterfacesCommand::Set {
            name,
            dhcp,
            address,
            netmask,
            gateway,
            dns1,
            dns2,
            mtu,
            vlan,
            down,
            from_file,
        } => {
            let draft = match from_file {
                Some(path) => {
                    let mut draft: InterfaceDraft = util::read_json_file(&path)?;
                    draft.interface_name = name;
                    draft
                }
                None => InterfaceDraft {
                    interface_name: name,
                    ip_mode: if dhcp { IpMode::Dhcp } else { IpMode::Static },
                    ip_address: address,
                    subnet_mask: netmask,
                    gateway,
                    dns_primary: dns1,
                    dns_secondary: dns2,
                    admin_enabled: !down,
                    mtu,
                    vlan_id: vlan,
                },
            };
            let saved = client.save_interface(&draft).await?;
            output::print_status(
                &format!("Interface {} saved", saved.interface_name),
                global.quiet,
            );
            Ok(())
        }

        InterfacesCommand::Delete { name } => {
            if !util::confirm(&format!("Remove configuration for {name}?"), global.yes)? {
                return Ok(());
            }
            let resp = client.delete_interface(&name).await?;
            output::print_status(&resp.message, global.quiet);
            Ok(())
        }
    }
}

// ── NAT ─────────────────────────────────────────────────────────────

fn nat_detail(n: &NatConfig) -> String {
    if n.enabled {
        format!("Masquerading {} -> {}", n.lan, n.wan)
    } else {
        "NAT disabled".into()
    }
}

pub async fn handle_nat(
    client: &NetgateClient,
    args: NatArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let nat = match args.command {
        NatCommand::Show => client.nat().await?,
        NatCommand::Enable { wan, lan } => {
            client
                .set_nat(&NatConfig {
                    enabled: true,
                    wan,
                    lan,
                })
                .await?
        }
        NatCommand::Disable => {
            let current = client.nat().await?;
            client
                .set_nat(&NatConfig {
                    enabled: false,
                    ..current
                })
                .await?
        }
    };
    let out = output::render_single(&global.output, &nat, nat_detail, |n| {
        n.enabled.to_string()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Static routes ───────────────────────────────────────────────────

#[derive(Tabled)]
struct RouteRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Destination")]
    destination: String,
    #[tabled(rename = "Gateway")]
    gateway: String,
    #[tabled(rename = "Metric")]
    metric: u32,
    #[tabled(rename = "Interface")]
    interface: String,
    #[tabled(rename = "Failover")]
    failover: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
}

impl RouteRow {
    fn new(r: &StaticRoute, color: bool) -> Self {
        Self {
            id: r.id.to_string(),
            destination: format!("{}/{}", r.destination, r.mask),
            gateway: r.gateway.to_string(),
            metric: r.metric,
            interface: or_dash(r.interface_name.as_deref()),
            failover: output::yes_no(r.failover, color),
            enabled: output::yes_no(r.enabled, color),
        }
    }
}

impl From<RouteFields> for RouteDraft {
    fn from(f: RouteFields) -> Self {
        Self {
            destination: f.destination,
            mask: f.mask,
            gateway: f.gateway,
            metric: f.metric,
            enabled: !f.disabled,
            interface_name: f.interface,
            mode: f.mode.into(),
            failover: f.failover,
        }
    }
}

fn print_route(route: &StaticRoute, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        std::slice::from_ref(route),
        |r| RouteRow::new(r, color),
        |r| r.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle_routes(
    client: &NetgateClient,
    args: RoutesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        RoutesCommand::List => {
            let color = output::should_color(&global.color);
            let routes = client.list_routes().await?;
            let out = output::render_list(
                &global.output,
                &routes,
                |r| RouteRow::new(r, color),
                |r| r.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RoutesCommand::Create { fields } => {
            let route = client.create_route(&fields.into()).await?;
            output::print_status("Route created", global.quiet);
            print_route(&route, global)
        }

        RoutesCommand::Update { id, fields } => {
            let route = client
                .update_route(&util::entity_id(&id), &fields.into())
                .await?;
            output::print_status("Route updated", global.quiet);
            print_route(&route, global)
        }

        RoutesCommand::Delete { id } => {
            if !util::confirm(&format!("Delete route {id}?"), global.yes)? {
                return Ok(());
            }
            let resp = client.delete_route(&util::entity_id(&id)).await?;
            output::print_status(&resp.message, global.quiet);
            Ok(())
        }
    }
}
